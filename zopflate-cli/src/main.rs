/*!
# Zopflate CLI

A thin binary front-end for the `zopflate` library: argument parsing,
directory crawling, parallel dispatch, progress reporting, and atomic
output writing. None of this lives in the library itself — spec.md's
Non-goals explicitly keep CLI parsing and directory walking out of the
core's scope — but a real repo still ships a consumer of its own library,
and this crate plays that role the same way the teacher's own CLI crate
sits on top of its image-encoding libraries.
*/

#![warn(clippy::filetype_is_file)]
#![warn(clippy::integer_division)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::nursery)]
#![warn(clippy::pedantic)]
#![warn(clippy::perf)]
#![warn(clippy::suboptimal_flops)]
#![warn(clippy::unneeded_field_pattern)]
#![warn(macro_use_extern_crate)]
#![warn(missing_copy_implementations)]
#![warn(missing_debug_implementations)]
#![warn(non_ascii_idents)]
#![warn(trivial_casts)]
#![warn(trivial_numeric_casts)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_extern_crates)]
#![warn(unused_import_braces)]

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]

mod crawl;
mod error;
mod jobs;
mod menu;
mod opts;

use error::CliError;
use fyi_msg::Msg;

fn main() {
	match run() {
		Ok(()) => {},
		Err(CliError::Killed) => { std::process::exit(1); },
		Err(e) => {
			Msg::error(e.to_string()).eprint();
			std::process::exit(1);
		},
	}
}

/// # Actual Entrypoint.
///
/// ## Errors
///
/// Returns a [`CliError`] describing whatever went wrong: bad arguments,
/// no qualifying files, or an interrupted run.
fn run() -> Result<(), CliError> {
	let settings = menu::parse()?;
	let files = crawl::crawl(&settings.paths, &settings.lists, settings.symlinks)?;
	jobs::exec(&settings, &files)
}
