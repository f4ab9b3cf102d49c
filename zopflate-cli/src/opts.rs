/*!
# Zopflate CLI: Settings.
*/

use crate::error::CliError;
use std::{
	num::NonZeroUsize,
	path::PathBuf,
};
use zopflate::Options;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Container Format.
///
/// Which framing [`crate::jobs::exec`] wraps each compressed file in.
/// Matches the three container writers spec.md §6 describes, plus a raw
/// mode for callers who just want a bare RFC 1951 stream.
pub(super) enum ContainerKind {
	/// # Raw DEFLATE (No Framing).
	Raw,
	/// # RFC 1950 Zlib.
	Zlib,
	/// # RFC 1952 Gzip.
	Gzip,
}

impl ContainerKind {
	/// # Output File Extension.
	pub(super) const fn suffix(self) -> &'static str {
		match self {
			Self::Raw => ".deflate",
			Self::Zlib => ".zz",
			Self::Gzip => ".gz",
		}
	}
}

#[derive(Debug, Clone)]
/// # CLI Settings.
///
/// Everything [`crate::menu::parse`] gathers from argv before handing off
/// to [`crate::jobs::exec`]/`exec_pretty`.
pub(super) struct Settings {
	/// # Compression Options (Passed Straight Through to the Library).
	pub(super) options: Options,
	/// # Container Format.
	pub(super) container: ContainerKind,
	/// # Worker Thread Count.
	pub(super) threads: NonZeroUsize,
	/// # Show a Progress Bar?
	pub(super) progress: bool,
	/// # Follow Symlinks While Crawling Directories?
	pub(super) symlinks: bool,
	/// # Root Paths to Crawl.
	pub(super) paths: Vec<PathBuf>,
	/// # Path Lists to Read (One Path Per Line, or STDIN if `-`).
	pub(super) lists: Vec<String>,
}

impl Settings {
	/// # New (Defaults).
	pub(super) fn new() -> Self {
		Self {
			options: Options::default(),
			container: ContainerKind::Gzip,
			threads: std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
			progress: false,
			symlinks: true,
			paths: Vec::new(),
			lists: Vec::new(),
		}
	}

	/// # Set Iterations.
	///
	/// ## Errors
	///
	/// Returns [`CliError`] if `raw` does not parse to a value in
	/// `1..=2_147_483_647`.
	pub(super) fn set_iterations(&mut self, raw: &str) -> Result<(), CliError> {
		let n: u32 = raw.parse().ok()
			.filter(|&n| n >= 1)
			.ok_or(CliError::Iterations)?;
		self.options.numiterations = n;
		Ok(())
	}

	/// # Set Pass Count.
	///
	/// ## Errors
	///
	/// Returns [`CliError`] if `raw` does not parse to a `u16`.
	pub(super) fn set_pass(&mut self, raw: &str) -> Result<(), CliError> {
		self.options.pass = raw.parse().map_err(|_| CliError::Pass)?;
		Ok(())
	}

	/// # Set Threads.
	///
	/// ## Errors
	///
	/// Returns [`CliError`] if `raw` does not parse to a non-zero `usize`.
	pub(super) fn set_threads(&mut self, raw: &str) -> Result<(), CliError> {
		self.threads = raw.parse::<NonZeroUsize>().map_err(|_| CliError::Threads)?;
		Ok(())
	}
}
