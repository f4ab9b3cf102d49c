/*!
# Zopflate CLI: Errors.
*/

use argyle::ArgyleError;
use std::{
	error::Error,
	fmt,
};
use zopflate::CompressError;

#[derive(Debug, Clone)]
/// # CLI Error.
pub(super) enum CliError {
	/// # Argyle Passthrough.
	Argue(ArgyleError),
	/// # A `zopflate` Library Error.
	Compress(CompressError),
	/// # Invalid `--iterations` Value.
	Iterations,
	/// # Killed Early (CTRL+C).
	Killed,
	/// # A `-l`/`--list` File Could Not Be Read.
	ListFile,
	/// # No Qualifying Files Were Found.
	NoFiles,
	/// # An Output Path Collided With an Input Path.
	OutputCollision,
	/// # Invalid `--pass` Value.
	Pass,
	/// # Progress Overflowed `u32`.
	ProgressOverflow,
	/// # Invalid `-j`/`--threads` Value.
	Threads,
}

impl AsRef<str> for CliError {
	#[inline]
	fn as_ref(&self) -> &str { self.as_str() }
}

impl Error for CliError {}

impl fmt::Display for CliError {
	#[inline]
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Compress(e) => write!(f, "{e}"),
			other => f.write_str(other.as_str()),
		}
	}
}

impl From<ArgyleError> for CliError {
	#[inline]
	fn from(err: ArgyleError) -> Self { Self::Argue(err) }
}

impl From<CompressError> for CliError {
	#[inline]
	fn from(err: CompressError) -> Self { Self::Compress(err) }
}

impl CliError {
	/// # As Str.
	pub(super) fn as_str(&self) -> &str {
		match self {
			Self::Argue(e) => e.as_str(),
			Self::Compress(_) => "compression failed",
			Self::Iterations => "The number of lz77 iterations must be between 1..=2_147_483_647.",
			Self::Killed => "The process was aborted early.",
			Self::ListFile => "The list file could not be read.",
			Self::NoFiles => "No qualifying files were found.",
			Self::OutputCollision => "Refusing to overwrite an input file with its own compressed output.",
			Self::Pass => "The pass count must fit a u16.",
			Self::ProgressOverflow => "Progress can only be displayed for up to 4,294,967,295 files. Try again with fewer paths or without -p/--progress.",
			Self::Threads => "The thread count must be a positive integer.",
		}
	}
}
