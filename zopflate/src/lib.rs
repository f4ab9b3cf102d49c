/*!
# Zopflate

A maximum-ratio, exhaustive-search DEFLATE/zlib/gzip/zip compressor.

This library reimplements the iterative LZ77/Huffman optimizer popularized by
Google's `zopfli`, generalized into an embeddable Rust API: callers drive
compression through [`Options`] rather than a fixed CLI-flag surface, and get
back raw DEFLATE streams or fully framed zlib/gzip/zip containers.

Compression here is slow by design — it trades CPU time for the smallest
achievable DEFLATE stream, via repeated forward/backward shortest-path
searches over the LZ77 token graph. It is not a streaming codec and does not
decompress; see the crate's `Non-goals` in the project documentation.
*/

#![deny(unsafe_code)]

#![warn(
	clippy::filetype_is_file,
	clippy::integer_division,
	clippy::needless_borrow,
	clippy::nursery,
	clippy::pedantic,
	clippy::perf,
	clippy::suboptimal_flops,
	clippy::unneeded_field_pattern,
	macro_use_extern_crate,
	missing_copy_implementations,
	missing_debug_implementations,
	missing_docs,
	non_ascii_idents,
	trivial_casts,
	trivial_numeric_casts,
	unreachable_pub,
	unused_crate_dependencies,
	unused_extern_crates,
	unused_import_braces,
)]

#![allow(
	clippy::module_name_repetitions,
	clippy::redundant_pub_crate,
)]

mod container;
mod deflate;
mod engine;
mod error;
mod options;
mod progress;
mod restore;

pub use container::{
	gzip_compress,
	zip_compress,
	zlib_compress,
	ZipEntry,
};
pub use deflate::{
	calculate_block_size,
	calculate_block_size_auto_type,
	deflate,
	deflate_resumable,
	deflate_with_progress,
	BlockSizeKind,
};
pub use error::CompressError;
pub use options::{
	Options,
	RandomKind,
	DEFAULT_CACHE_FANOUT,
	DEFAULT_MASTER_BLOCK_SIZE,
	DEFAULT_MAX_CHAIN_HITS,
};
pub use progress::{
	NullProgress,
	Progress,
	ProgressEvent,
};
pub use restore::{
	RestoreMode,
	RestorePoint,
	RESTORE_MAGIC,
};
