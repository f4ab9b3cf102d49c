/*!
# Zopflate: Restore Points.

A persisted binary checkpoint letting a subsequent invocation resume work
an earlier one was interrupted partway through, per spec.md §6. The format
is intentionally simple: a fixed ASCII magic, a CRC-32 over the input range
being compressed (so a restore point can't silently be applied to the
wrong input), three pointer-width markers (so a file written on a 32-bit
host is never misread on a 64-bit one or vice versa), a mode byte, a total-
cost accumulator, the current split-point array, and an opaque "finished
prefix" blob — here, the already-emitted output bytes for every master
block completed before the interruption, since [`crate::deflate`] emits
master blocks strictly in order and each one's bits are final once
written.

A restore point is written after every completed master block and removed
on successful final emission; loading one whose magic, CRC, or width
markers don't match is a [`CompressError`], and the caller is expected to
discard it and start fresh rather than treat the mismatch as fatal.
*/

use crate::CompressError;
use std::{
	mem::size_of,
	path::Path,
};

/// # Restore-Point Magic Bytes.
pub const RESTORE_MAGIC: [u8; 8] = *b"ZPFLRSTR";

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
/// # Restore-Point Mode.
///
/// Tracks which phase of spec.md §4.6.5's per-master-block state machine
/// the checkpoint was taken in.
pub enum RestoreMode {
	/// # Split-First Completed.
	///
	/// The initial per-block split and optimization pass finished; no
	/// split-last re-runs have been attempted yet.
	SplitFirstComplete,
	/// # Mid Split-Last Pass.
	///
	/// `n` split-last passes (1-based) have been attempted so far.
	SplitLastPass(u16),
}

impl RestoreMode {
	/// # To Byte.
	const fn to_byte(self) -> u8 {
		match self {
			Self::SplitFirstComplete => 1,
			Self::SplitLastPass(n) => {
				// Saturate rather than wrap; passes beyond 254 are not a
				// realistic scenario, but overflowing this byte would
				// silently corrupt the mode on load.
				if n > 253 { 255 } else { 1 + n as u8 }
			},
		}
	}

	/// # From Byte.
	const fn from_byte(byte: u8) -> Option<Self> {
		match byte {
			0 => None,
			1 => Some(Self::SplitFirstComplete),
			n => Some(Self::SplitLastPass(n as u16 - 1)),
		}
	}
}

#[derive(Debug, Clone)]
/// # Restore Point.
///
/// An in-memory representation of the checkpoint file described in
/// spec.md §6. Build one with [`RestorePoint::new`] as master blocks
/// finish, persist it with [`RestorePoint::save`], and recover it with
/// [`RestorePoint::load`] at the start of a new run.
pub struct RestorePoint {
	/// # CRC-32 of the Full Input Range Being Compressed.
	input_crc: u32,
	/// # Checkpoint Mode.
	mode: RestoreMode,
	/// # Accumulated Bit Cost So Far.
	total_cost: u64,
	/// # Input Bytes Already Consumed.
	///
	/// How far into the original input the finished master blocks reach;
	/// resuming restarts [`crate::deflate`]'s master-block loop from this
	/// offset rather than from zero.
	completed_input: u64,
	/// # Bit Pointer Into the Last Byte of `prefix`.
	///
	/// DEFLATE blocks are not byte-aligned, so a checkpoint taken between
	/// master blocks may land mid-byte; this records where the next bit
	/// belongs (`0..=7`) so resuming can continue the bitstream exactly
	/// rather than padding it (padding would corrupt the stream — there is
	/// no in-band way to skip inserted bits except at the very end).
	bp: u8,
	/// # Split Points Chosen So Far (Absolute Input Positions).
	splits: Vec<u32>,
	/// # Already-Emitted Output Bytes for Every Finished Master Block.
	prefix: Vec<u8>,
}

impl RestorePoint {
	#[must_use]
	/// # New.
	pub fn new(
		input_crc: u32,
		mode: RestoreMode,
		total_cost: u64,
		completed_input: u64,
		bp: u8,
		splits: Vec<u32>,
		prefix: Vec<u8>,
	) -> Self {
		Self { input_crc, mode, total_cost, completed_input, bp: bp & 7, splits, prefix }
	}

	#[must_use]
	/// # Input CRC-32.
	pub const fn input_crc(&self) -> u32 { self.input_crc }

	#[must_use]
	/// # Mode.
	pub const fn mode(&self) -> RestoreMode { self.mode }

	#[must_use]
	/// # Total Cost So Far (Bits).
	pub const fn total_cost(&self) -> u64 { self.total_cost }

	#[must_use]
	/// # Input Bytes Already Consumed.
	pub const fn completed_input(&self) -> u64 { self.completed_input }

	#[must_use]
	/// # Bit Pointer Into the Last Byte of `prefix`.
	pub const fn bp(&self) -> u8 { self.bp }

	#[must_use]
	/// # Split Points So Far.
	pub fn splits(&self) -> &[u32] { &self.splits }

	#[must_use]
	/// # Finished-Prefix Bytes.
	pub fn prefix(&self) -> &[u8] { &self.prefix }

	/// # Serialize.
	///
	/// Layout: `magic(8) | usize_width(1) | u32_width(1) | u64_width(1) |
	/// input_crc(4, LE) | mode(1) | total_cost(8, LE) | completed_input(8, LE) |
	/// bp(1) | splits_len(4, LE) | splits(4*n, LE) | prefix_len(8, LE) |
	/// prefix(m)`.
	fn serialize(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(
			RESTORE_MAGIC.len() + 3 + 4 + 1 + 8 + 8 + 1 + 4 + self.splits.len() * 4 + 8 + self.prefix.len()
		);
		out.extend_from_slice(&RESTORE_MAGIC);
		out.push(size_of::<usize>() as u8);
		out.push(size_of::<u32>() as u8);
		out.push(size_of::<u64>() as u8);
		out.extend_from_slice(&self.input_crc.to_le_bytes());
		out.push(self.mode.to_byte());
		out.extend_from_slice(&self.total_cost.to_le_bytes());
		out.extend_from_slice(&self.completed_input.to_le_bytes());
		out.push(self.bp);
		out.extend_from_slice(&(self.splits.len() as u32).to_le_bytes());
		for &s in &self.splits { out.extend_from_slice(&s.to_le_bytes()); }
		out.extend_from_slice(&(self.prefix.len() as u64).to_le_bytes());
		out.extend_from_slice(&self.prefix);
		out
	}

	/// # Deserialize.
	///
	/// ## Errors
	///
	/// Returns [`CompressError::RestorePointMagic`] if the magic bytes
	/// don't match, [`CompressError::RestorePointWidth`] if the file was
	/// written by a different pointer width, or
	/// [`CompressError::RestorePointChecksum`] if `expected_crc` (the CRC
	/// of the input range the caller is about to (re)compress) doesn't
	/// match the checkpoint's recorded input CRC.
	fn deserialize(bytes: &[u8], expected_crc: u32) -> Result<Self, CompressError> {
		if bytes.len() < RESTORE_MAGIC.len() + 3 || bytes[..RESTORE_MAGIC.len()] != RESTORE_MAGIC {
			return Err(CompressError::RestorePointMagic);
		}
		let mut cursor = RESTORE_MAGIC.len();

		let widths = (bytes[cursor], bytes[cursor + 1], bytes[cursor + 2]);
		cursor += 3;
		if widths != (size_of::<usize>() as u8, size_of::<u32>() as u8, size_of::<u64>() as u8) {
			return Err(CompressError::RestorePointWidth);
		}

		let take = |cursor: &mut usize, n: usize| -> Result<&[u8], CompressError> {
			let slice = bytes.get(*cursor..*cursor + n).ok_or(CompressError::RestorePointMagic)?;
			*cursor += n;
			Ok(slice)
		};

		let input_crc = u32::from_le_bytes(take(&mut cursor, 4)?.try_into().unwrap());
		if input_crc != expected_crc { return Err(CompressError::RestorePointChecksum); }

		let mode_byte = take(&mut cursor, 1)?[0];
		let mode = RestoreMode::from_byte(mode_byte).ok_or(CompressError::RestorePointMagic)?;

		let total_cost = u64::from_le_bytes(take(&mut cursor, 8)?.try_into().unwrap());
		let completed_input = u64::from_le_bytes(take(&mut cursor, 8)?.try_into().unwrap());
		let bp = take(&mut cursor, 1)?[0];
		if bp > 7 { return Err(CompressError::RestorePointMagic); }

		// `splits_len`/`prefix_len` are untrusted file contents; reject them
		// outright if they claim more data than the file could possibly hold
		// rather than pre-allocating a capacity an attacker controls.
		let splits_len = u32::from_le_bytes(take(&mut cursor, 4)?.try_into().unwrap()) as usize;
		if splits_len > bytes.len().saturating_sub(cursor) / 4 {
			return Err(CompressError::RestorePointMagic);
		}
		let mut splits = Vec::with_capacity(splits_len);
		for _ in 0..splits_len {
			splits.push(u32::from_le_bytes(take(&mut cursor, 4)?.try_into().unwrap()));
		}

		let prefix_len = u64::from_le_bytes(take(&mut cursor, 8)?.try_into().unwrap()) as usize;
		if prefix_len > bytes.len().saturating_sub(cursor) {
			return Err(CompressError::RestorePointMagic);
		}
		let prefix = take(&mut cursor, prefix_len)?.to_vec();

		Ok(Self { input_crc, mode, total_cost, completed_input, bp, splits, prefix })
	}

	/// # Save.
	///
	/// Writes the checkpoint atomically (via `write_atomic`, so a reader
	/// never observes a half-written file) to `path`.
	///
	/// ## Errors
	///
	/// Returns [`CompressError::Io`] on any filesystem failure.
	pub fn save(&self, path: &Path) -> Result<(), CompressError> {
		write_atomic::write_file(path, &self.serialize())?;
		Ok(())
	}

	/// # Load.
	///
	/// Reads and validates a checkpoint previously written by
	/// [`RestorePoint::save`]. `expected_crc` should be the CRC-32 of the
	/// exact input range the caller is about to compress; a mismatch means
	/// the file belongs to different input and must be discarded.
	///
	/// ## Errors
	///
	/// See [`RestorePoint::deserialize`]. Returns [`CompressError::Io`] if
	/// the file cannot be read at all (including "does not exist").
	pub fn load(path: &Path, expected_crc: u32) -> Result<Self, CompressError> {
		let bytes = std::fs::read(path)?;
		Self::deserialize(&bytes, expected_crc)
	}

	/// # Discard.
	///
	/// Removes the checkpoint file. Called after a successful final
	/// emission; a missing file is not an error.
	///
	/// ## Errors
	///
	/// Returns [`CompressError::Io`] for any failure other than the file
	/// already being gone.
	pub fn discard(path: &Path) -> Result<(), CompressError> {
		match std::fs::remove_file(path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(e.into()),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_roundtrip() {
		let rp = RestorePoint::new(
			0xDEAD_BEEF,
			RestoreMode::SplitLastPass(2),
			12_345,
			32_768,
			5,
			vec![0, 16_384, 32_768],
			vec![1, 2, 3, 4, 5],
		);
		let bytes = rp.serialize();
		let back = RestorePoint::deserialize(&bytes, 0xDEAD_BEEF).expect("deserialize failed");
		assert_eq!(back.input_crc(), rp.input_crc());
		assert_eq!(back.mode(), rp.mode());
		assert_eq!(back.total_cost(), rp.total_cost());
		assert_eq!(back.completed_input(), rp.completed_input());
		assert_eq!(back.bp(), rp.bp());
		assert_eq!(back.splits(), rp.splits());
		assert_eq!(back.prefix(), rp.prefix());
	}

	#[test]
	fn t_bad_magic_is_rejected() {
		let mut bytes = RestorePoint::new(1, RestoreMode::SplitFirstComplete, 0, 0, 0, vec![], vec![]).serialize();
		bytes[0] ^= 0xFF;
		assert_eq!(RestorePoint::deserialize(&bytes, 1), Err(CompressError::RestorePointMagic));
	}

	#[test]
	fn t_mismatched_crc_is_rejected() {
		let bytes = RestorePoint::new(1, RestoreMode::SplitFirstComplete, 0, 0, 0, vec![], vec![]).serialize();
		assert_eq!(RestorePoint::deserialize(&bytes, 2), Err(CompressError::RestorePointChecksum));
	}

	#[test]
	fn t_mismatched_width_is_rejected() {
		let mut bytes = RestorePoint::new(1, RestoreMode::SplitFirstComplete, 0, 0, 0, vec![], vec![]).serialize();
		bytes[RESTORE_MAGIC.len()] = 255; // Bogus usize width.
		assert_eq!(RestorePoint::deserialize(&bytes, 1), Err(CompressError::RestorePointWidth));
	}

	#[test]
	fn t_mode_byte_roundtrip() {
		assert_eq!(RestoreMode::from_byte(RestoreMode::SplitFirstComplete.to_byte()), Some(RestoreMode::SplitFirstComplete));
		for n in [0_u16, 1, 5, 200] {
			assert_eq!(RestoreMode::from_byte(RestoreMode::SplitLastPass(n).to_byte()), Some(RestoreMode::SplitLastPass(n)));
		}
	}

	#[test]
	fn t_bogus_bp_is_rejected() {
		let mut bytes = RestorePoint::new(1, RestoreMode::SplitFirstComplete, 0, 0, 0, vec![], vec![]).serialize();
		let bp_pos = RESTORE_MAGIC.len() + 3 + 4 + 1 + 8 + 8;
		bytes[bp_pos] = 200;
		assert_eq!(RestorePoint::deserialize(&bytes, 1), Err(CompressError::RestorePointMagic));
	}

	#[test]
	fn t_bogus_splits_len_is_rejected_not_allocated() {
		let mut bytes = RestorePoint::new(1, RestoreMode::SplitFirstComplete, 0, 0, 0, vec![], vec![]).serialize();
		let splits_len_pos = RESTORE_MAGIC.len() + 3 + 4 + 1 + 8 + 8 + 1;
		bytes[splits_len_pos..splits_len_pos + 4].copy_from_slice(&u32::MAX.to_le_bytes());
		assert_eq!(RestorePoint::deserialize(&bytes, 1), Err(CompressError::RestorePointMagic));
	}

	#[test]
	fn t_save_load_discard_cycle() {
		let dir = std::env::temp_dir();
		let path = dir.join(format!("zopflate-restore-test-{}.bin", std::process::id()));
		let rp = RestorePoint::new(7, RestoreMode::SplitFirstComplete, 42, 1024, 3, vec![100], vec![9, 9, 9]);
		rp.save(&path).expect("save failed");
		let loaded = RestorePoint::load(&path, 7).expect("load failed");
		assert_eq!(loaded.total_cost(), 42);
		assert_eq!(loaded.completed_input(), 1024);
		assert_eq!(loaded.bp(), 3);
		RestorePoint::discard(&path).expect("discard failed");
		assert!(! path.exists());
		// Discarding twice is not an error.
		RestorePoint::discard(&path).expect("second discard failed");
	}
}
