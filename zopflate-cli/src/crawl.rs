/*!
# Zopflate CLI: Path Crawling.
*/

use crate::error::CliError;
use dowser::Dowser;
use std::path::PathBuf;

/// # Crawl!
///
/// Resolve `paths` and `lists` (file-path lists, or STDIN when the value is
/// `"-"`) into a flat, sorted, de-duplicated list of regular files.
/// Directories are expanded recursively; everything else found along the
/// way is compressed regardless of extension, since unlike the image-
/// specific teacher this crate has no notion of "the wrong kind of file".
///
/// ## Errors
///
/// Returns [`CliError::NoFiles`] if the search comes up empty.
pub(super) fn crawl(paths: &[PathBuf], lists: &[String], symlinks: bool) -> Result<Vec<PathBuf>, CliError> {
	let mut raw = Dowser::default();
	if ! symlinks { raw = raw.without_symlinks(); }

	for list in lists {
		raw.read_paths_from_file(list).map_err(|_| CliError::ListFile)?;
	}
	for path in paths { raw = raw.with_path(path); }

	let mut out: Vec<PathBuf> = raw.collect();
	if out.is_empty() { return Err(CliError::NoFiles); }

	out.sort();
	out.dedup();
	Ok(out)
}
