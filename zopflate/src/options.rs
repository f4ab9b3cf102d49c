/*!
# Zopflate: Options.

Every knob from the caller-controlled option table. This replaces the
single `ZOPFLI_ITERATIONS` static the engine used when it only ever had one
caller; a library meant to be embedded by framing layers other than a PNG
re-encoder needs the whole set to be explicit, validated, and `Copy`.
*/

use crate::CompressError;

/// # Default Master Block Size (1,000,000 Bytes).
///
/// This is also the hard ceiling for the engine's per-call scratch arrays
/// (`MatchCache`, `SqueezeCache`, `SplitCache` — see `engine::ZOPFLI_MASTER_BLOCK_SIZE`,
/// which is defined in terms of this constant), so it cannot be raised
/// without growing every worker's fixed allocation in lockstep; 1,000,000 is
/// the teacher's own `flapfli` constant and keeps each worker within the
/// ≈40 MiB budget the crate's concurrency model notes call for. A caller
/// that wants larger master blocks should increase `Options::numthreads`
/// and let more workers run concurrently rather than growing this value.
pub const DEFAULT_MASTER_BLOCK_SIZE: usize = 1_000_000;

/// # Default Chain-Hit Limit.
pub const DEFAULT_MAX_CHAIN_HITS: u16 = 8192;

/// # Default Cache Fanout (`K`).
pub const DEFAULT_CACHE_FANOUT: u8 = 8;

#[derive(Debug, Clone, Copy)]
/// # RNG Generator Choice.
///
/// Two reproducible pseudo-random generators are offered for
/// [`Options::ranstatew`]/[`Options::ranstatez`]-seeded perturbation during
/// iterative refinement. Both are deterministic given the same seed.
pub enum RandomKind {
	/// # Lehmer-Style Generator.
	///
	/// The engine's original multiply-with-carry generator, seeded by a
	/// pair of 16-bit words.
	Lehmer,
	/// # Complementary-Multiply-With-Carry Generator.
	///
	/// An alternative generator (Marsaglia) selectable via the `cmwc`
	/// option; seeded the same way as [`RandomKind::Lehmer`] but mixes the
	/// state differently.
	Cmwc,
}

#[derive(Debug, Clone, Copy)]
/// # Compression Options.
///
/// All fields are orthogonal caller-controlled knobs. Use
/// [`Options::validate`] before passing an instance into the embedding API;
/// the core itself does not re-check for performance reasons, trusting
/// that the caller already rejected bad values (a `Surfaced` error, per the
/// error-handling design — invalid options never reach the hot path).
pub struct Options {
	/// # Iteration Cap.
	///
	/// Upper bound on iterative-refinement passes per block.
	pub numiterations: u32,

	/// # Fail-Iteration Cap.
	///
	/// Early-exit once this many iterations pass with no improvement.
	pub maxfailiterations: u32,

	/// # Enable Block Splitting (Split-First).
	pub blocksplitting: bool,

	/// # Disable Split-Last.
	///
	/// The engine's historical `blocksplittinglast` toggle is deliberately
	/// not exposed; this is the one authoritative disable switch.
	pub noblocksplittinglast: bool,

	/// # Maximum Split Count.
	///
	/// Zero means unlimited.
	pub blocksplittingmax: u16,

	/// # Samples per `find_minimum` Recursion Level.
	pub findminimumrec: u16,

	/// # Length-Score Distance Threshold.
	pub lengthscoremax: u16,

	/// # Enable Lazy Matching.
	pub lazymatching: bool,

	/// # Expand Huffman Header Search to 32 Variants.
	pub optimizehuffmanheader: bool,

	/// # Use Brotli-Style Histogram Smoothing.
	pub usebrotli: bool,

	/// # Reverse Package-Merge Tie-Break.
	pub revcounts: bool,

	/// # Split-Last Re-Run Count.
	pub pass: u16,

	/// # RNG Seed Word One.
	pub ranstatew: u16,

	/// # RNG Seed Word Two.
	pub ranstatez: u16,

	/// # RNG Generator Choice.
	pub cmwc: RandomKind,

	/// # Stat-Blend Importance (α/β).
	pub statimportance: f64,

	/// # Try All 16 Flag Combinations Per Block.
	pub tryall: bool,

	/// # Worker Thread Count.
	///
	/// Zero means "run inline, no pool".
	pub numthreads: u16,

	/// # Master Block Size.
	///
	/// Generalizes the engine's historical fixed one-million-byte PNG
	/// chunk size into a caller-tunable cap.
	pub master_block_size: usize,

	/// # Hash Chain Search Limit.
	pub max_chain_hits: u16,

	/// # Longest-Match Cache Fanout (`K`).
	pub cache_fanout: u8,
}

impl Default for Options {
	fn default() -> Self {
		Self {
			numiterations: 15,
			maxfailiterations: 5,
			blocksplitting: true,
			noblocksplittinglast: false,
			blocksplittingmax: 15,
			findminimumrec: 9,
			lengthscoremax: 1024,
			lazymatching: true,
			optimizehuffmanheader: false,
			usebrotli: false,
			revcounts: false,
			pass: 1,
			ranstatew: 1,
			ranstatez: 2,
			cmwc: RandomKind::Lehmer,
			statimportance: 1.0,
			tryall: false,
			numthreads: 0,
			master_block_size: DEFAULT_MASTER_BLOCK_SIZE,
			max_chain_hits: DEFAULT_MAX_CHAIN_HITS,
			cache_fanout: DEFAULT_CACHE_FANOUT,
		}
	}
}

impl Options {
	/// # Validate.
	///
	/// Reject caller-supplied option combinations that would otherwise
	/// trip an internal assertion deep inside the optimizer. This is the
	/// one `Surfaced` check the embedding API performs before calling into
	/// the core at all.
	///
	/// ## Errors
	///
	/// Returns [`CompressError::InvalidOption`] describing the first
	/// offending field.
	pub fn validate(&self) -> Result<(), CompressError> {
		if self.numiterations == 0 {
			return Err(CompressError::InvalidOption("numiterations must be at least 1"));
		}
		if self.findminimumrec < 2 {
			return Err(CompressError::InvalidOption("findminimumrec must be at least 2"));
		}
		if self.master_block_size == 0 {
			return Err(CompressError::InvalidOption("master_block_size must be non-zero"));
		}
		if self.master_block_size > DEFAULT_MASTER_BLOCK_SIZE {
			return Err(CompressError::InvalidOption("master_block_size cannot exceed the compiled-in maximum"));
		}
		if self.cache_fanout == 0 {
			return Err(CompressError::InvalidOption("cache_fanout must be at least 1"));
		}
		if !(self.statimportance.is_finite() && self.statimportance > 0.0) {
			return Err(CompressError::InvalidOption("statimportance must be a positive, finite number"));
		}
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_default_is_valid() {
		assert!(Options::default().validate().is_ok());
	}

	#[test]
	fn t_rejects_zero_iterations() {
		let mut opts = Options::default();
		opts.numiterations = 0;
		assert!(opts.validate().is_err());
	}

	#[test]
	fn t_rejects_zero_master_block() {
		let mut opts = Options::default();
		opts.master_block_size = 0;
		assert!(opts.validate().is_err());
	}

	#[test]
	fn t_rejects_oversized_master_block() {
		let mut opts = Options::default();
		opts.master_block_size = DEFAULT_MASTER_BLOCK_SIZE + 1;
		assert!(opts.validate().is_err());
	}
}
