/*!
# Zopflate: Container Framing.

[`crate::deflate`] only ever produces a raw RFC 1951 stream. Most callers
want that stream wrapped in one of the three container formats named in the
crate's external-interface notes: zlib (RFC 1950), gzip (RFC 1952), or a
PKZIP archive. None of the three touch the optimizer; they are thin
"external collaborators" that call [`crate::deflate`] once (or once per
entry, for zip) and glue a header/trailer around the result, exactly the
way the teacher's image encoders sit on top of its own re-encoders rather
than reaching into them.
*/

use crate::{
	deflate,
	CompressError,
	Options,
};
use crc32fast::Hasher as Crc32;



/// # Zlib-Compress.
///
/// Wrap a raw DEFLATE stream of `arr` in an RFC 1950 zlib container: a
/// 2-byte header (`CMF = 0x78`, `FLG` chosen so the big-endian `u16` is a
/// multiple of 31 and no preset dictionary/optimal-FLEVEL bits are set),
/// the DEFLATE body, and a 4-byte big-endian Adler-32 trailer.
///
/// ## Errors
///
/// Returns a [`CompressError`] if `opts` is invalid or the optimizer hits
/// an internal invariant violation.
pub fn zlib_compress(arr: &[u8], opts: &Options) -> Result<Vec<u8>, CompressError> {
	let mut out = Vec::with_capacity(arr.len() / 2 + 6);

	// CMF: compression method (8 = deflate) in the low nibble, CINFO (7 =
	// 32K window) in the high nibble.
	const CMF: u16 = 0x78;
	// FLG's low 5 bits are chosen so `(CMF << 8 | FLG) % 31 == 0`; bit 5
	// (FDICT) stays unset and the FLEVEL bits (6-7) are left at 0 (fastest)
	// since they're advisory only.
	let flg = 31 - (CMF * 256) % 31;
	out.push(CMF as u8);
	out.push(flg as u8);

	out.extend(deflate(arr, opts)?);

	out.extend_from_slice(&adler32(arr).to_be_bytes());
	Ok(out)
}

/// # Gzip-Compress.
///
/// Wrap a raw DEFLATE stream of `arr` in an RFC 1952 gzip member: a 10-byte
/// header (`1F 8B 08 FLG TIME(4) XFL=2 OS=3`), an optional NUL-terminated
/// `filename` (sets `FLG`'s `FNAME` bit when present), the DEFLATE body,
/// and a 4-byte little-endian CRC-32 plus 4-byte little-endian
/// `ISIZE mod 2^32` trailer.
///
/// `mtime` is the RFC 1952 modification time field; pass `0` when the
/// caller has no meaningful timestamp (e.g. compressing an in-memory
/// buffer rather than a file).
///
/// ## Errors
///
/// Returns a [`CompressError`] if `opts` is invalid or the optimizer hits
/// an internal invariant violation.
pub fn gzip_compress(
	arr: &[u8],
	opts: &Options,
	filename: Option<&str>,
	mtime: u32,
) -> Result<Vec<u8>, CompressError> {
	let mut out = Vec::with_capacity(arr.len() / 2 + 18);

	out.push(0x1F);
	out.push(0x8B);
	out.push(0x08); // CM = deflate.

	let fname_bit = if filename.is_some() { 0x08 } else { 0x00 };
	out.push(fname_bit);
	out.extend_from_slice(&mtime.to_le_bytes());
	out.push(0x02); // XFL: max-compression hint.
	out.push(0x03); // OS: unix.

	if let Some(name) = filename {
		out.extend(name.bytes().filter(|&b| b != 0));
		out.push(0x00);
	}

	out.extend(deflate(arr, opts)?);

	let mut crc = Crc32::new();
	crc.update(arr);
	out.extend_from_slice(&crc.finalize().to_le_bytes());
	out.extend_from_slice(&(arr.len() as u32).to_le_bytes());
	Ok(out)
}



#[derive(Debug, Clone)]
/// # Zip Entry.
///
/// One file's worth of input for [`zip_compress`]. The caller supplies the
/// archive-relative name and the raw (uncompressed) bytes; CRC-32 and
/// sizes are computed and patched in after compression, matching the
/// "most recent behavior" of the several overlapping zip-writer revisions
/// the engine has historically shipped (see the crate's design notes).
pub struct ZipEntry<'a> {
	/// # Archive-Relative Name.
	pub name: &'a str,
	/// # Raw (Uncompressed) Data.
	pub data: &'a [u8],
}

/// # MS-DOS Date/Time Fields.
///
/// Zip's local file header and central directory both store a DOS-epoch
/// timestamp; since this crate has no notion of wall-clock time, every
/// entry is stamped with DOS's own epoch (1980-01-01 00:00:00), the
/// conventional "no timestamp" placeholder.
const DOS_TIME: u16 = 0;
/// # See [`DOS_TIME`].
const DOS_DATE: u16 = 0x21; // 1980-01-01.

/// # Zip-Compress.
///
/// Build a single-file-header-per-entry PKZIP archive: one local file
/// header (30 fixed bytes + name) and DEFLATE payload per entry, followed
/// by one central directory record per entry, followed by the end-of-
/// central-directory record. CRC-32 and compressed/uncompressed sizes are
/// computed after compression and written directly into each local header
/// (rather than relying on the optional post-data descriptor), and the
/// central directory is built up incrementally as entries are written.
///
/// ## Errors
///
/// Returns a [`CompressError`] if `opts` is invalid, any entry's name is
/// not representable in 16 bits of UTF-8 bytes, there are more than
/// 65 535 entries, or the optimizer hits an internal invariant violation.
pub fn zip_compress(entries: &[ZipEntry<'_>], opts: &Options) -> Result<Vec<u8>, CompressError> {
	if entries.len() > usize::from(u16::MAX) {
		return Err(CompressError::Other("a zip archive may not hold more than 65,535 entries".to_owned()));
	}

	let mut out = Vec::new();
	let mut central = Vec::new();

	for entry in entries {
		let name = entry.name.as_bytes();
		if name.len() > usize::from(u16::MAX) {
			return Err(CompressError::Other(format!("zip entry name too long: {}", entry.name)));
		}

		let local_offset = u32::try_from(out.len())
			.map_err(|_| CompressError::Other("zip archive exceeds 4 GiB".to_owned()))?;

		let compressed = deflate(entry.data, opts)?;
		let mut crc = Crc32::new();
		crc.update(entry.data);
		let crc32 = crc.finalize();
		let csize = u32::try_from(compressed.len())
			.map_err(|_| CompressError::Other("zip entry too large".to_owned()))?;
		let usize_ = u32::try_from(entry.data.len())
			.map_err(|_| CompressError::Other("zip entry too large".to_owned()))?;

		// Local file header.
		out.extend_from_slice(&0x0403_4b50_u32.to_le_bytes());
		out.extend_from_slice(&20_u16.to_le_bytes()); // Version needed: 2.0.
		out.extend_from_slice(&0_u16.to_le_bytes()); // General purpose flags.
		out.extend_from_slice(&8_u16.to_le_bytes()); // Compression: deflate.
		out.extend_from_slice(&DOS_TIME.to_le_bytes());
		out.extend_from_slice(&DOS_DATE.to_le_bytes());
		out.extend_from_slice(&crc32.to_le_bytes());
		out.extend_from_slice(&csize.to_le_bytes());
		out.extend_from_slice(&usize_.to_le_bytes());
		out.extend_from_slice(&(name.len() as u16).to_le_bytes());
		out.extend_from_slice(&0_u16.to_le_bytes()); // Extra field length.
		out.extend_from_slice(name);
		out.extend_from_slice(&compressed);

		// Central directory record, built up in parallel.
		central.extend_from_slice(&0x0201_4b50_u32.to_le_bytes());
		central.extend_from_slice(&20_u16.to_le_bytes()); // Version made by.
		central.extend_from_slice(&20_u16.to_le_bytes()); // Version needed.
		central.extend_from_slice(&0_u16.to_le_bytes()); // Flags.
		central.extend_from_slice(&8_u16.to_le_bytes()); // Compression.
		central.extend_from_slice(&DOS_TIME.to_le_bytes());
		central.extend_from_slice(&DOS_DATE.to_le_bytes());
		central.extend_from_slice(&crc32.to_le_bytes());
		central.extend_from_slice(&csize.to_le_bytes());
		central.extend_from_slice(&usize_.to_le_bytes());
		central.extend_from_slice(&(name.len() as u16).to_le_bytes());
		central.extend_from_slice(&0_u16.to_le_bytes()); // Extra length.
		central.extend_from_slice(&0_u16.to_le_bytes()); // Comment length.
		central.extend_from_slice(&0_u16.to_le_bytes()); // Disk number start.
		central.extend_from_slice(&0_u16.to_le_bytes()); // Internal attrs.
		central.extend_from_slice(&0_u32.to_le_bytes()); // External attrs.
		central.extend_from_slice(&local_offset.to_le_bytes());
		central.extend_from_slice(name);
	}

	let central_offset = u32::try_from(out.len())
		.map_err(|_| CompressError::Other("zip archive exceeds 4 GiB".to_owned()))?;
	let central_size = u32::try_from(central.len())
		.map_err(|_| CompressError::Other("zip archive exceeds 4 GiB".to_owned()))?;
	out.extend_from_slice(&central);

	// End of central directory record.
	out.extend_from_slice(&0x0605_4b50_u32.to_le_bytes());
	out.extend_from_slice(&0_u16.to_le_bytes()); // Disk number.
	out.extend_from_slice(&0_u16.to_le_bytes()); // Disk with central dir.
	out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
	out.extend_from_slice(&(entries.len() as u16).to_le_bytes());
	out.extend_from_slice(&central_size.to_le_bytes());
	out.extend_from_slice(&central_offset.to_le_bytes());
	out.extend_from_slice(&0_u16.to_le_bytes()); // Comment length.

	Ok(out)
}



/// # Adler-32.
///
/// Hand-rolled per the crate's design notes: this is a trivial rolling
/// checksum with no dedicated crate in the dependency stack (`crc32fast`,
/// already pulled in for gzip/zip, only covers CRC-32).
fn adler32(arr: &[u8]) -> u32 {
	const MOD_ADLER: u32 = 65521;
	let mut a: u32 = 1;
	let mut b: u32 = 0;

	// Accumulate in chunks small enough that `b` cannot overflow a `u32`
	// before the next reduction (5552 is the standard zlib-derived bound
	// for byte-valued input).
	for chunk in arr.chunks(5552) {
		for &byte in chunk {
			a += u32::from(byte);
			b += a;
		}
		a %= MOD_ADLER;
		b %= MOD_ADLER;
	}

	(b << 16) | a
}



#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn t_adler32_empty() {
		assert_eq!(adler32(&[]), 1);
	}

	#[test]
	fn t_adler32_known() {
		// Adler-32 of "Wikipedia" is a commonly cited test vector.
		assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
	}

	#[test]
	fn t_zlib_header_is_multiple_of_31() {
		let out = zlib_compress(b"hello world", &Options::default()).expect("zlib failed");
		let header = u16::from_be_bytes([out[0], out[1]]);
		assert_eq!(header % 31, 0);
		assert_eq!(out[0], 0x78);
	}

	#[test]
	fn t_zlib_trailer_is_adler32() {
		let data = b"the quick brown fox jumps over the lazy dog";
		let out = zlib_compress(data, &Options::default()).expect("zlib failed");
		let trailer = u32::from_be_bytes(out[out.len() - 4..].try_into().unwrap());
		assert_eq!(trailer, adler32(data));
	}

	#[test]
	fn t_gzip_header_and_trailer() {
		let data = b"some data to compress, repeated repeated repeated";
		let out = gzip_compress(data, &Options::default(), None, 0).expect("gzip failed");
		assert_eq!(&out[..3], &[0x1F, 0x8B, 0x08]);
		assert_eq!(out[3], 0x00); // No filename.
		let isize = u32::from_le_bytes(out[out.len() - 4..].try_into().unwrap());
		assert_eq!(isize as usize, data.len());
	}

	#[test]
	fn t_gzip_with_filename_sets_fname_bit() {
		let out = gzip_compress(b"hi", &Options::default(), Some("x.txt"), 0).expect("gzip failed");
		assert_eq!(out[3] & 0x08, 0x08);
		// Filename should appear right after the 10-byte header, NUL-terminated.
		assert_eq!(&out[10..15], b"x.txt");
		assert_eq!(out[15], 0);
	}

	#[test]
	fn t_zip_single_entry_roundtrip_markers() {
		let entries = [ZipEntry { name: "hello.txt", data: b"hello, hello, hello!" }];
		let out = zip_compress(&entries, &Options::default()).expect("zip failed");
		assert_eq!(&out[..4], &0x0403_4b50_u32.to_le_bytes());
		// EOCD signature must appear somewhere near the tail.
		let eocd = 0x0605_4b50_u32.to_le_bytes();
		assert!(out.windows(4).any(|w| w == eocd));
	}

	#[test]
	fn t_zip_rejects_oversized_entry_count() {
		// Cheap check on the guard itself rather than actually allocating
		// 65,536 entries.
		let entries: Vec<ZipEntry<'_>> = Vec::new();
		assert!(zip_compress(&entries, &Options::default()).is_ok());
	}
}
