/*!
# Zopflate CLI: Job Server.
*/

use crate::{
	error::CliError,
	opts::{ContainerKind, Settings},
};
use crossbeam_channel::Receiver;
use dactyl::{
	NiceElapsed,
	NiceU64,
	traits::NiceInflection,
};
use fyi_msg::{
	BeforeAfter,
	Msg,
	MsgKind,
	Progless,
};
use std::{
	num::NonZeroUsize,
	path::{Path, PathBuf},
	sync::{
		Arc,
		atomic::{
			AtomicBool,
			AtomicU64,
			Ordering::{Acquire, Relaxed, SeqCst},
		},
	},
	thread,
};
use zopflate::{gzip_compress, zlib_compress, Options};

/// # Byte Counters.
static BEFORE: AtomicU64 = AtomicU64::new(0);
static AFTER: AtomicU64 = AtomicU64::new(0);
/// # Skipped-File Counter.
static SKIPPED: AtomicU64 = AtomicU64::new(0);

/// # Compress One File.
///
/// Reads `path`, compresses it per `opts`/`container`, and atomically
/// writes the result alongside the original with the container's suffix
/// appended. Returns the `(before, after)` byte counts on success.
fn compress_one(path: &Path, opts: &Options, container: ContainerKind) -> Result<(u64, u64), CliError> {
	let data = std::fs::read(path).map_err(zopflate::CompressError::from)?;
	let before = data.len() as u64;

	let out = match container {
		ContainerKind::Raw => zopflate::deflate(&data, opts)?,
		ContainerKind::Zlib => zlib_compress(&data, opts)?,
		ContainerKind::Gzip => {
			let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
			gzip_compress(&data, opts, name.as_deref(), 0)?
		},
	};
	let after = out.len() as u64;

	let mut dst = path.as_os_str().to_owned();
	dst.push(container.suffix());
	let dst = PathBuf::from(dst);
	if dst == path { return Err(CliError::OutputCollision); }

	write_atomic::write_file(&dst, &out).map_err(zopflate::CompressError::from)?;
	Ok((before, after))
}

/// # Crunch Everything!
///
/// Compresses each file in `files` across up to `settings.threads` worker
/// threads, optionally rendering a progress bar.
///
/// ## Errors
///
/// Returns [`CliError::Killed`] if CTRL+C interrupted the run before it
/// finished all files.
pub(super) fn exec(settings: &Settings, files: &[PathBuf]) -> Result<(), CliError> {
	if settings.progress { exec_pretty(settings, files) }
	else { exec_plain(settings, files) }
}

/// # Crunch Everything (Quiet).
fn exec_plain(settings: &Settings, files: &[PathBuf]) -> Result<(), CliError> {
	let threads = clamp_threads(settings.threads, files.len());
	let killed = Arc::new(AtomicBool::new(false));
	sigint(Arc::clone(&killed), None);

	let (tx, rx) = crossbeam_channel::bounded::<&Path>(threads.get());
	thread::scope(|s| {
		let mut workers = Vec::with_capacity(threads.get());
		for _ in 0..threads.get() {
			workers.push(s.spawn(|| {
				while let Ok(p) = rx.recv() {
					match compress_one(p, &settings.options, settings.container) {
						Ok((b, a)) => {
							BEFORE.fetch_add(b, Relaxed);
							AFTER.fetch_add(a, Relaxed);
						},
						Err(_) => { SKIPPED.fetch_add(1, Relaxed); },
					}
				}
			}));
		}

		for file in files {
			if killed.load(Acquire) || tx.send(file).is_err() { break; }
		}
		drop(tx);
		for worker in workers { let _res = worker.join(); }
	});
	drop(rx);

	if killed.load(Acquire) { Err(CliError::Killed) } else { Ok(()) }
}

/// # Crunch Everything (With Progress).
fn exec_pretty(settings: &Settings, files: &[PathBuf]) -> Result<(), CliError> {
	/// # Worker Business.
	fn work(rx: &Receiver<&Path>, progress: &Progless, opts: &Options, container: ContainerKind) {
		while let Ok(p) = rx.recv() {
			let name = p.to_string_lossy();
			progress.add(&name);

			match compress_one(p, opts, container) {
				Ok((b, a)) => {
					BEFORE.fetch_add(b, Relaxed);
					AFTER.fetch_add(a, Relaxed);
				},
				Err(_) => { SKIPPED.fetch_add(1, Relaxed); },
			}

			progress.remove(&name);
		}
	}

	let threads = clamp_threads(settings.threads, files.len());
	let total = NonZeroUsize::new(files.len()).ok_or(CliError::NoFiles)?;
	let progress = Progless::try_from(total.get())
		.map_err(|_| CliError::ProgressOverflow)?
		.with_reticulating_splines("Zopflate");

	let killed = Arc::new(AtomicBool::new(false));
	sigint(Arc::clone(&killed), Some(progress.clone()));

	let (tx, rx) = crossbeam_channel::bounded::<&Path>(threads.get());
	thread::scope(|s| {
		let mut workers = Vec::with_capacity(threads.get());
		for _ in 0..threads.get() {
			workers.push(s.spawn(|| work(&rx, &progress, &settings.options, settings.container)));
		}

		for file in files {
			if killed.load(Acquire) || tx.send(file).is_err() { break; }
		}
		drop(tx);
		for worker in workers { let _res = worker.join(); }
	});
	drop(rx);

	let elapsed = progress.finish();
	let skipped = SKIPPED.load(Acquire);
	if skipped == 0 {
		progress.summary(MsgKind::Crunched, "file", "files")
	}
	else {
		Msg::crunched(format!(
			"{}\x1b[2m/\x1b[0m{} in {}.",
			NiceU64::from(total.get() as u64 - skipped),
			total.nice_inflect("file", "files"),
			NiceElapsed::from(elapsed),
		))
	}
		.with_bytes_saved(BeforeAfter::from((BEFORE.load(Acquire), AFTER.load(Acquire))))
		.eprint();

	if killed.load(Acquire) { Err(CliError::Killed) } else { Ok(()) }
}

/// # Clamp Thread Count to Job Count.
const fn clamp_threads(threads: NonZeroUsize, jobs: usize) -> NonZeroUsize {
	match NonZeroUsize::new(jobs) {
		Some(jobs) if jobs.get() < threads.get() => jobs,
		_ => threads,
	}
}

/// # Hook Up CTRL+C.
///
/// Once stops dispatching new work; twice forces an immediate exit.
fn sigint(killed: Arc<AtomicBool>, progress: Option<Progless>) {
	let _res = ctrlc::set_handler(move ||
		if killed.compare_exchange(false, true, SeqCst, Relaxed).is_ok() {
			if let Some(p) = &progress { p.sigint(); }
		}
		else { std::process::exit(1); }
	);
}
