/*!
# Zopflate: Deflate

The embedding API the rest of the crate (and any outside caller who wants
raw DEFLATE rather than a framed container) drives directly: [`deflate`]
turns an arbitrary byte slice into a complete RFC 1951 stream, chunking it
into `Options::master_block_size`-sized master blocks exactly as the
original `ZopfliDeflate` did, while [`calculate_block_size`] and
[`calculate_block_size_auto_type`] expose the splitter's own cost model so
a caller can probe compression cost under a given [`Options`] without
driving a full compress.
*/

use crate::{
	engine::{
		deflate_part,
		probe_block_size,
		BlockType,
		SplitPoints,
		ZopfliState,
	},
	restore::{RestoreMode, RestorePoint},
	CompressError,
	NullProgress,
	Options,
	Progress,
	ProgressEvent,
};
use std::path::Path;



#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Block Size Kind.
///
/// The three RFC 1951 §3.2.2 block encodings [`calculate_block_size`] can
/// be asked to cost out.
pub enum BlockSizeKind {
	/// # Stored (Uncompressed).
	Uncompressed,
	/// # Fixed Huffman Codes.
	Fixed,
	/// # Dynamic Huffman Codes.
	Dynamic,
}

impl From<BlockSizeKind> for BlockType {
	fn from(kind: BlockSizeKind) -> Self {
		match kind {
			BlockSizeKind::Uncompressed => Self::Uncompressed,
			BlockSizeKind::Fixed => Self::Fixed,
			BlockSizeKind::Dynamic => Self::Dynamic,
		}
	}
}



/// # Deflate.
///
/// Compress `arr` into a raw DEFLATE stream (no zlib/gzip/zip framing;
/// see [`crate::zlib_compress`], [`crate::gzip_compress`], and
/// [`crate::zip_compress`] for that) under the given options.
///
/// Large inputs are compressed in `Options::master_block_size`-sized
/// chunks, each of which is itself split (per [`Options::blocksplitting`])
/// into one or more DEFLATE blocks, matching the engine's historical
/// chunked-PNG behavior generalized to arbitrary data.
///
/// This is a thin wrapper around [`deflate_with_progress`] that discards
/// every event; reach for that (or [`deflate_resumable`]) if the caller
/// wants to observe or checkpoint a long-running compress.
///
/// ## Errors
///
/// Returns [`CompressError::InvalidOption`] if `opts` fails
/// [`Options::validate`], or a [`CompressError`] describing an internal
/// invariant violation (see the crate's error-handling design notes).
pub fn deflate(arr: &[u8], opts: &Options) -> Result<Vec<u8>, CompressError> {
	deflate_with_progress(arr, opts, &NullProgress)
}

/// # Deflate (With Progress).
///
/// Same as [`deflate`], but reports [`ProgressEvent::MasterBlockStarted`]
/// at the start of every master block and [`ProgressEvent::PassImproved`]
/// for every split-last pass attempted within one, through `progress`.
///
/// ## Errors
///
/// Same as [`deflate`].
pub fn deflate_with_progress(arr: &[u8], opts: &Options, progress: &dyn Progress) -> Result<Vec<u8>, CompressError> {
	opts.validate()?;

	let mut out = ZopfliOut::new();
	let mut state = ZopfliState::new();
	let mut splits = SplitPoints::new(opts);

	// An empty input still needs to produce a valid (empty, final) stream.
	if arr.is_empty() {
		deflate_part(&mut state, &mut splits, opts, true, arr, 0, &mut out, progress)?;
		return Ok(out.into_vec());
	}

	let mut blocks = MasterBlocks::new(arr, opts.master_block_size).peekable();
	let total = blocks.len();
	let mut index = 0;
	while let Some((chunk, instart)) = blocks.next() {
		let last_block = blocks.peek().is_none();
		progress.event(ProgressEvent::MasterBlockStarted { index, total });
		deflate_part(&mut state, &mut splits, opts, last_block, chunk, instart, &mut out, progress)?;
		index += 1;
	}

	Ok(out.into_vec())
}

/// # Deflate (Resumable).
///
/// Same as [`deflate_with_progress`], but checkpoints a [`RestorePoint`]
/// to `restore_path` after every completed master block but the last
/// (spec.md §6), and resumes from it when `restore_path` already holds a
/// checkpoint whose CRC-32 matches `arr`. The checkpoint is removed on
/// successful completion; a checkpoint that fails to load (wrong input,
/// wrong pointer width, corrupt) is discarded and the run starts fresh,
/// reporting [`ProgressEvent::RestorePointDiscarded`] through `progress`.
///
/// Master blocks are checkpointed as whole units — [`RestoreMode`] is
/// always recorded as [`RestoreMode::SplitFirstComplete`] — so an
/// interruption mid-block re-does that one block's split-last passes
/// rather than resuming them bit-for-bit.
///
/// ## Errors
///
/// Same as [`deflate_with_progress`], plus [`CompressError::Io`] for any
/// failure reading, writing, or removing `restore_path`.
pub fn deflate_resumable(
	arr: &[u8],
	opts: &Options,
	progress: &dyn Progress,
	restore_path: &Path,
) -> Result<Vec<u8>, CompressError> {
	opts.validate()?;

	let input_crc = {
		let mut crc = crc32fast::Hasher::new();
		crc.update(arr);
		crc.finalize()
	};

	let (mut out, resume_from) = match RestorePoint::load(restore_path, input_crc) {
		Ok(rp) => {
			let out = ZopfliOut::resume(rp.prefix().to_vec(), rp.bp());
			(out, rp.completed_input() as usize)
		},
		Err(e) => {
			// An `Io` error is the ordinary "no checkpoint yet" case (most
			// often a missing file); anything else means a checkpoint
			// existed but failed its magic/CRC/width check.
			if !matches!(e, CompressError::Io(_)) {
				progress.event(ProgressEvent::RestorePointDiscarded { reason: restore_discard_reason(&e) });
			}
			let _ = RestorePoint::discard(restore_path);
			(ZopfliOut::new(), 0)
		},
	};

	let mut state = ZopfliState::new();
	let mut splits = SplitPoints::new(opts);

	if arr.is_empty() {
		deflate_part(&mut state, &mut splits, opts, true, arr, 0, &mut out, progress)?;
		RestorePoint::discard(restore_path)?;
		return Ok(out.into_vec());
	}

	let total = MasterBlocks::new(arr, opts.master_block_size).len();
	let mut blocks = MasterBlocks::new(arr, opts.master_block_size).peekable();
	let mut index = 0;
	while blocks.peek().is_some_and(|(_, instart)| *instart < resume_from) {
		blocks.next();
		index += 1;
	}

	while let Some((chunk, instart)) = blocks.next() {
		let last_block = blocks.peek().is_none();
		progress.event(ProgressEvent::MasterBlockStarted { index, total });
		deflate_part(&mut state, &mut splits, opts, last_block, chunk, instart, &mut out, progress)?;
		index += 1;

		if !last_block {
			let rp = RestorePoint::new(
				input_crc,
				RestoreMode::SplitFirstComplete,
				out.total_bits(),
				chunk.len() as u64,
				out.bit_pos(),
				Vec::new(),
				out.snapshot(),
			);
			rp.save(restore_path)?;
		}
	}

	RestorePoint::discard(restore_path)?;
	Ok(out.into_vec())
}

/// # Restore-Point Discard Reason.
const fn restore_discard_reason(err: &CompressError) -> &'static str {
	match err {
		CompressError::RestorePointMagic => "magic bytes did not match",
		CompressError::RestorePointChecksum => "input no longer matches the checkpoint",
		CompressError::RestorePointWidth => "checkpoint was written by a different pointer width",
		_ => "checkpoint could not be read",
	}
}

/// # Calculate Block Size.
///
/// Run a full optimal LZ77 pass over `arr` under `opts` and return the bit
/// cost the resulting tokens would occupy as the given [`BlockSizeKind`],
/// without writing anything out or performing a block-split search.
///
/// This is mainly useful for callers comparing option sets (e.g. weighing
/// `usebrotli` or `revcounts`) against a representative sample before
/// committing to a full [`deflate`] run.
///
/// ## Errors
///
/// Returns [`CompressError::InvalidOption`] if `opts` fails
/// [`Options::validate`], or a [`CompressError`] describing an internal
/// invariant violation.
pub fn calculate_block_size(arr: &[u8], opts: &Options, kind: BlockSizeKind) -> Result<u32, CompressError> {
	opts.validate()?;
	let mut state = ZopfliState::new();
	Ok(probe_block_size(&mut state, opts, arr, Some(kind.into()))?)
}

/// # Calculate Block Size (Best of Three).
///
/// Same as [`calculate_block_size`], but returns the minimum cost across
/// all three [`BlockSizeKind`] variants, matching the choice
/// [`deflate`] itself makes per block.
///
/// ## Errors
///
/// Returns [`CompressError::InvalidOption`] if `opts` fails
/// [`Options::validate`], or a [`CompressError`] describing an internal
/// invariant violation.
pub fn calculate_block_size_auto_type(arr: &[u8], opts: &Options) -> Result<u32, CompressError> {
	opts.validate()?;
	let mut state = ZopfliState::new();
	Ok(probe_block_size(&mut state, opts, arr, None)?)
}



/// # Bit Writer.
///
/// A plain `Vec<u8>`-backed replacement for the lingering C-style
/// `out`/`outsize`/bit-pointer triple the original bit-writing routines
/// expected; the append-and-grow behavior is now just `Vec::push`.
pub(crate) struct ZopfliOut {
	bp: u8,
	buf: Vec<u8>,
}

impl ZopfliOut {
	/// # New.
	fn new() -> Self { Self { bp: 0, buf: Vec::new() } }

	/// # Resume From a Restore Point.
	///
	/// Rebuild a bit writer already holding `buf`'s bytes, with the next
	/// bit to be written landing at `bp` within `buf`'s last byte. Used to
	/// continue a DEFLATE stream exactly where an earlier, interrupted run
	/// left off (see [`crate::deflate_resumable`]); the stream is not
	/// byte-aligned between blocks, so resuming at anything but the exact
	/// bit would corrupt it.
	pub(crate) fn resume(buf: Vec<u8>, bp: u8) -> Self { Self { bp: bp & 7, buf } }

	/// # Into Vec.
	fn into_vec(self) -> Vec<u8> { self.buf }

	/// # Snapshot.
	///
	/// Clone the bytes written so far, for persisting as a restore point's
	/// `prefix`.
	pub(crate) fn snapshot(&self) -> Vec<u8> { self.buf.clone() }

	#[inline]
	/// # Bit Pointer.
	pub(crate) const fn bit_pos(&self) -> u8 { self.bp }

	/// # Total Bits Written.
	pub(crate) fn total_bits(&self) -> u64 {
		if self.bp == 0 { (self.buf.len() as u64) * 8 }
		else { (self.buf.len() as u64 - 1) * 8 + u64::from(self.bp) }
	}

	#[inline]
	/// # Append Data.
	fn append_data(&mut self, value: u8) { self.buf.push(value); }
}

impl ZopfliOut {
	#[inline]
	/// # Add Bit.
	pub(crate) fn add_bit(&mut self, bit: u8) {
		if self.bp == 0 { self.append_data(0); }
		if let Some(last) = self.buf.last_mut() { *last |= bit << self.bp; }
		self.bp = self.bp.wrapping_add(1) & 7;
	}

	/// # Add Multiple Bits.
	pub(crate) fn add_bits(&mut self, symbol: u32, length: u32) {
		for i in 0..length {
			let bit = (symbol >> i) & 1;
			self.add_bit(bit as u8);
		}
	}

	#[inline]
	/// # Add Multiple Bits.
	///
	/// Same as `ZopfliOut::add_bits`, but with lengths known at compile time.
	pub(crate) fn add_fixed_bits<const N: u8>(&mut self, symbol: u32) {
		const { assert!(1 < N); }
		for i in const { 0..N } {
			let bit = (symbol >> i) & 1;
			self.add_bit(bit as u8);
		}
	}

	#[inline]
	/// # Add Type Bits Header.
	pub(crate) fn add_header<const BLOCK_BIT: u8>(&mut self, last_block: bool) {
		self.add_bit(u8::from(last_block));
		self.add_bit(const { BLOCK_BIT & 1 });
		self.add_bit(const { (BLOCK_BIT & 2) >> 1 });
	}

	/// # Add Huffman Bits.
	pub(crate) fn add_huffman_bits(&mut self, symbol: u32, length: u32) {
		// Same as add_bits, except we're doing it backwards.
		for i in (0..length).rev() {
			let bit = (symbol >> i) & 1;
			self.add_bit(bit as u8);
		}
	}

	#[allow(clippy::cast_possible_truncation)]
	/// # Add Non-Compressed Block.
	pub(crate) fn add_uncompressed_block(
		&mut self,
		last_block: bool,
		arr: &[u8],
		instart: usize,
		inend: usize,
	) {
		let block = arr.get(instart..inend).unwrap_or(&[]);

		// We need to proceed u16::MAX bytes at a time.
		let iter = block.chunks(usize::from(u16::MAX));
		let len = iter.len().saturating_sub(1);
		for (i, chunk) in iter.enumerate() {
			let blocksize = chunk.len();
			let nlen = ! blocksize;
			let really_last_block = i == len;

			// Each chunk gets its own header.
			self.add_header::<0>(last_block && really_last_block);

			// Ignore bits of input up to the next byte boundary.
			self.bp = 0;

			self.append_data((blocksize % 256) as u8);
			self.append_data((blocksize.wrapping_div(256) % 256) as u8);
			self.append_data((nlen % 256) as u8);
			self.append_data((nlen.wrapping_div(256) % 256) as u8);

			for byte in chunk.iter().copied() { self.append_data(byte); }
		}
	}
}



/// # Master Block Iterator.
///
/// Yields `(slice, instart)` pairs covering `arr` in `step`-sized strides.
/// `slice` always runs from the beginning of `arr` through the current
/// chunk's end — not just the active window — because the engine's hash
/// chains and hash-based match finder need to see back across earlier
/// master blocks up to the DEFLATE window size.
struct MasterBlocks<'a> {
	arr: &'a [u8],
	pos: usize,
	step: usize,
}

impl<'a> MasterBlocks<'a> {
	/// # New.
	const fn new(arr: &'a [u8], step: usize) -> Self {
		Self { arr, pos: 0, step: if step == 0 { usize::MAX } else { step } }
	}
}

impl<'a> Iterator for MasterBlocks<'a> {
	type Item = (&'a [u8], usize);

	fn next(&mut self) -> Option<Self::Item> {
		if self.pos < self.arr.len() {
			let pos = self.pos;
			let end = pos.saturating_add(self.step).min(self.arr.len());
			self.pos = end;
			Some((&self.arr[..end], pos))
		}
		else { None }
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		let len = self.len();
		(len, Some(len))
	}
}

impl ExactSizeIterator for MasterBlocks<'_> {
	fn len(&self) -> usize { (self.arr.len() - self.pos).div_ceil(self.step) }
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_master_blocks_covers_whole_input() {
		let arr: Vec<u8> = (0..250_u32).map(|v| v as u8).collect();
		let mut covered = Vec::new();
		for (chunk, instart) in MasterBlocks::new(&arr, 64) {
			covered.extend_from_slice(&chunk[instart..]);
		}
		assert_eq!(covered, arr);
	}

	#[test]
	fn t_deflate_empty_is_valid_stream() {
		let out = deflate(&[], &Options::default()).expect("deflate failed");
		assert!(! out.is_empty());
	}

	#[test]
	fn t_deflate_small_input() {
		let data = b"abcabcabcabcabcabcabcabcabcabcabc";
		let out = deflate(data, &Options::default()).expect("deflate failed");
		assert!(! out.is_empty());
		assert!(out.len() < data.len());
	}

	#[test]
	fn t_deflate_with_progress_reports_master_blocks() {
		use std::sync::atomic::{AtomicUsize, Ordering};

		#[derive(Default)]
		struct Counter(AtomicUsize);
		impl Progress for Counter {
			fn event(&self, _event: ProgressEvent) { self.0.fetch_add(1, Ordering::Relaxed); }
		}

		let mut opts = Options::default();
		opts.master_block_size = 32;
		let data: Vec<u8> = (0..200_u32).map(|v| (v % 37) as u8).collect();

		let counter = Counter::default();
		let out = deflate_with_progress(&data, &opts, &counter).expect("deflate failed");
		assert!(! out.is_empty());
		// At least one `MasterBlockStarted` per chunk; `opts.master_block_size`
		// of 32 over 200 bytes guarantees more than one.
		assert!(counter.0.load(Ordering::Relaxed) >= 7);
	}

	#[test]
	fn t_deflate_resumable_resumes_from_checkpoint() {
		let data: Vec<u8> = (0..500_u32).map(|v| (v % 251) as u8).collect();
		let mut opts = Options::default();
		opts.master_block_size = 128;
		opts.numiterations = 2;

		let full = deflate_with_progress(&data, &opts, &NullProgress).expect("full deflate failed");

		let input_crc = {
			let mut crc = crc32fast::Hasher::new();
			crc.update(&data);
			crc.finalize()
		};

		// Manually replay what `deflate_resumable` would have done through
		// its first master block, then checkpoint there.
		let mut out = ZopfliOut::new();
		let mut state = ZopfliState::new();
		let mut splits = SplitPoints::new(&opts);
		let mut blocks = MasterBlocks::new(&data, opts.master_block_size).peekable();
		let (chunk, instart) = blocks.next().expect("expected at least one master block");
		let last_block = blocks.peek().is_none();
		assert!(! last_block, "test input should span more than one master block");
		deflate_part(&mut state, &mut splits, &opts, last_block, chunk, instart, &mut out, &NullProgress)
			.expect("partial deflate failed");

		let dir = std::env::temp_dir();
		let path = dir.join(format!("zopflate-deflate-resume-test-{}.bin", std::process::id()));
		let rp = RestorePoint::new(
			input_crc,
			RestoreMode::SplitFirstComplete,
			out.total_bits(),
			chunk.len() as u64,
			out.bit_pos(),
			Vec::new(),
			out.snapshot(),
		);
		rp.save(&path).expect("save failed");

		let resumed = deflate_resumable(&data, &opts, &NullProgress, &path).expect("resumable deflate failed");
		assert_eq!(resumed, full);
		assert!(! path.exists(), "checkpoint should be discarded after a successful run");
	}

	#[test]
	fn t_deflate_resumable_discards_mismatched_checkpoint() {
		let data = b"some data that does not matter much for this test".to_vec();
		let opts = Options::default();

		let dir = std::env::temp_dir();
		let path = dir.join(format!("zopflate-deflate-resume-mismatch-test-{}.bin", std::process::id()));
		let rp = RestorePoint::new(0xDEAD_BEEF, RestoreMode::SplitFirstComplete, 0, 0, 0, Vec::new(), Vec::new());
		rp.save(&path).expect("save failed");

		use std::sync::atomic::{AtomicUsize, Ordering};
		#[derive(Default)]
		struct Counter(AtomicUsize);
		impl Progress for Counter {
			fn event(&self, event: ProgressEvent) {
				if matches!(event, ProgressEvent::RestorePointDiscarded { .. }) {
					self.0.fetch_add(1, Ordering::Relaxed);
				}
			}
		}

		let counter = Counter::default();
		let out = deflate_resumable(&data, &opts, &counter, &path).expect("deflate failed");
		assert!(! out.is_empty());
		assert!(! path.exists());
		assert_eq!(counter.0.load(Ordering::Relaxed), 1);
	}

	#[test]
	fn t_calculate_block_size_kinds_are_consistent() {
		let data = b"the quick brown fox jumps over the lazy dog, repeatedly, over and over";
		let opts = Options::default();
		let auto = calculate_block_size_auto_type(data, &opts).expect("auto cost failed");
		let dynamic = calculate_block_size(data, &opts, BlockSizeKind::Dynamic).expect("dynamic cost failed");
		let fixed = calculate_block_size(data, &opts, BlockSizeKind::Fixed).expect("fixed cost failed");
		let uncompressed = calculate_block_size(data, &opts, BlockSizeKind::Uncompressed).expect("uncompressed cost failed");
		assert!(auto <= dynamic);
		assert!(auto <= fixed);
		assert!(auto <= uncompressed);
	}
}
