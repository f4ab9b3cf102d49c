/*!
# Zopflate CLI: Argument Parsing.
*/

use argyle::{Argue, ArgyleError, FLAG_HELP, FLAG_VERSION};
use crate::{
	error::CliError,
	opts::{ContainerKind, Settings},
};
use std::{
	ffi::OsStr,
	os::unix::ffi::OsStrExt,
};

/// # Parse a UTF-8 Option Value.
fn as_str(raw: &[u8], err: CliError) -> Result<&str, CliError> {
	std::str::from_utf8(raw).map_err(|_| err)
}

/// # Parse Arguments.
///
/// ## Errors
///
/// Returns [`CliError`] if argument parsing fails outright, an option
/// value is malformed, or no paths/lists were supplied at all.
pub(super) fn parse() -> Result<Settings, CliError> {
	let args = match Argue::new(FLAG_HELP | FLAG_VERSION) {
		Ok(args) => args,
		Err(ArgyleError::WantsVersion) => {
			println!("Zopflate v{}", env!("CARGO_PKG_VERSION"));
			std::process::exit(0);
		},
		Err(ArgyleError::WantsHelp) => {
			helper();
			std::process::exit(0);
		},
		Err(e) => return Err(e.into()),
	};

	let mut settings = Settings::new();

	if args.switch2(b"-p", b"--progress") { settings.progress = true; }
	if args.switch(b"--no-symlinks") { settings.symlinks = false; }
	if args.switch(b"--zlib") { settings.container = ContainerKind::Zlib; }
	if args.switch(b"--raw") { settings.container = ContainerKind::Raw; }
	// `--gzip` is the default; the flag exists so a caller can be explicit
	// without needing to know that.
	if args.switch(b"--gzip") { settings.container = ContainerKind::Gzip; }

	if let Some(raw) = args.option2(b"-z", b"--iterations") {
		settings.set_iterations(as_str(raw, CliError::Iterations)?)?;
	}
	if let Some(raw) = args.option(b"--pass") {
		settings.set_pass(as_str(raw, CliError::Pass)?)?;
	}
	if let Some(raw) = args.option2(b"-j", b"--threads") {
		settings.set_threads(as_str(raw, CliError::Threads)?)?;
	}

	if args.switch(b"--single-block") {
		settings.options.blocksplittingmax = 1;
	}
	if args.switch(b"--no-split-last") {
		settings.options.noblocksplittinglast = true;
	}
	if args.switch(b"--try-all") {
		settings.options.tryall = true;
	}

	if let Some(raw) = args.option2(b"-l", b"--list") {
		settings.lists.push(as_str(raw, CliError::ListFile)?.to_owned());
	}

	for raw in args.args() { settings.paths.push(OsStr::from_bytes(raw).into()); }

	if settings.paths.is_empty() && settings.lists.is_empty() {
		return Err(CliError::NoFiles);
	}

	Ok(settings)
}

#[cold]
/// # Print Help.
fn helper() {
	println!(
		"\x1b[38;5;199mZopflate\x1b[0;38;5;69m v{}\x1b[0m
Maximum-ratio, exhaustive-search DEFLATE/zlib/gzip compression.

USAGE:
    zopflate [FLAGS] [OPTIONS] <PATH(S)>...

FLAGS:
    -h, --help           Print help information and exit.
        --gzip            Wrap output in a gzip container. (default)
        --zlib            Wrap output in a zlib container instead.
        --raw             Emit a bare DEFLATE stream (no container).
        --no-symlinks     Do not follow symlinks while crawling directories.
        --no-split-last   Disable the split-last block re-partitioning pass.
        --single-block    Force a single dynamic-Huffman block per master block.
        --try-all         Try all Huffman/RNG flag combinations per block.
    -p, --progress        Show progress while compressing.
    -V, --version         Print version information and exit.

OPTIONS:
    -j, --threads <NUM>      Worker thread count. [default: number of logical cores]
    -l, --list <FILE>        Read (absolute) file paths from this list, or STDIN if '-'.
        --pass <NUM>         Split-last re-run count. [default: 1]
    -z, --iterations <NUM>   LZ77 optimizer iterations per block. [default: 15]

ARGS:
    <PATH(S)...>    One or more files or directories to compress.
",
		env!("CARGO_PKG_VERSION"),
	);
}
