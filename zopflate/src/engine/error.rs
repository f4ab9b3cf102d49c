/*!
# Zopflate: Errors.
*/

#[cfg(debug_assertions)]
use std::fmt;



#[cfg(not(debug_assertions))]
/// # Error (Release).
///
/// This library uses `Result` return types like conditionally-panicking
/// assertions — internal invariant violations, not environmental
/// conditions. (They shouldn't actually be reachable, but, well, bugs
/// happen.)
///
/// When debug assertions are _disabled_ the details are dropped; the
/// caller-facing `CompressError::Fatal` is all that's needed at that point.
pub(crate) type ZopfliError = ();



#[cfg(debug_assertions)]
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Error (Debug).
///
/// When debug assertions are _enabled_, internal sanity checks record the
/// file and line where they failed, allowing the eventual panic (or
/// `CompressError::Fatal` conversion) to carry a useful message.
pub(crate) struct ZopfliError {
	/// # Source File.
	file: &'static str,

	/// # Source Line.
	line: u32,
}

#[cfg(debug_assertions)]
impl ZopfliError {
	#[cfg(debug_assertions)]
	/// # New Error.
	pub(crate) const fn new(file: &'static str, line: u32) -> Self {
		Self { file, line }
	}
}

#[cfg(debug_assertions)]
impl fmt::Display for ZopfliError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_fmt(format_args!(
			"internal invariant failed at {}:{}",
			self.file,
			self.line,
		))
	}
}

#[cfg(debug_assertions)]
impl std::error::Error for ZopfliError {}



#[cfg(debug_assertions)]
/// # Error Macro (Debug).
///
/// The debug version of this macro records the file and line number to aid
/// further investigation.
macro_rules! zopfli_error { () => (ZopfliError::new(file!(), line!())); }

#[cfg(not(debug_assertions))]
/// # Error Macro (Release).
///
/// The non-debug version simply returns a `()`.
macro_rules! zopfli_error { () => (()); }

/// # Expose the macro to the rest of the module.
pub(super) use zopfli_error;
