/*!
# Zopflate: Surfaced Errors.

The engine's internal `ZopfliError` (see `engine::error`) exists purely to
tag *bugs* — invariants that should never fail and, if they do, are never
an environmental condition. This module is the other half: the small,
closed set of conditions a caller can actually hit and must be told about.
*/

use std::fmt;

#[derive(Debug, Clone, Eq, PartialEq)]
/// # Compress Error.
///
/// Every condition the embedding API can surface to a caller. Internal
/// invariant violations are not represented here — they are `Fatal` and
/// unwind instead (see the crate's error-handling design notes).
pub enum CompressError {
	/// # An Option Value is Out of Range.
	InvalidOption(&'static str),
	/// # Allocation Failed for the Hash Index, Cache, or LZ77 Store.
	OutOfMemory,
	/// # A Restore-Point File's Magic Bytes Did Not Match.
	RestorePointMagic,
	/// # A Restore-Point File's CRC-32 Did Not Match the Input Range.
	RestorePointChecksum,
	/// # A Restore-Point File Was Written by a Different Pointer Width.
	RestorePointWidth,
	/// # An I/O Failure Bubbled Up From a Container Writer or Restore File.
	Io(String),
	/// # A Generic Escape Hatch for Anything Else.
	Other(String),
}

impl fmt::Display for CompressError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::InvalidOption(why) => write!(f, "invalid option: {why}"),
			Self::OutOfMemory => f.write_str("allocation failed"),
			Self::RestorePointMagic => f.write_str("restore point: magic bytes did not match"),
			Self::RestorePointChecksum => f.write_str("restore point: checksum did not match the input range"),
			Self::RestorePointWidth => f.write_str("restore point: written by a different pointer width"),
			Self::Io(msg) => write!(f, "i/o error: {msg}"),
			Self::Other(msg) => f.write_str(msg),
		}
	}
}

impl std::error::Error for CompressError {}

impl From<std::io::Error> for CompressError {
	fn from(err: std::io::Error) -> Self { Self::Io(err.to_string()) }
}

#[cfg(debug_assertions)]
impl From<crate::engine::ZopfliError> for CompressError {
	fn from(err: crate::engine::ZopfliError) -> Self { Self::Other(err.to_string()) }
}

#[cfg(not(debug_assertions))]
impl From<crate::engine::ZopfliError> for CompressError {
	fn from(_err: crate::engine::ZopfliError) -> Self { Self::OutOfMemory }
}
