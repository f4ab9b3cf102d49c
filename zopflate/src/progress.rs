/*!
# Zopflate: Progress Events.

spec.md's Non-goals rule out a streaming API and speed tuning, not
observability — and a compressor that can spend minutes per master block is
exactly the kind of thing a caller wants coarse progress out of. The
engine's hot loops stay entirely log-free (formatting a string per LZ77
token would be disastrous for throughput); instead [`deflate`](crate::deflate)
reports only block- and pass-granularity milestones through this small
caller-supplied sink, the same shape of contract the teacher's image
encoders use to hand per-file results to its CLI's progress bar rather than
printing anything themselves.
*/

#[derive(Debug, Clone, Copy)]
/// # Progress Event.
///
/// One coarse milestone from a [`crate::deflate`] run. Events are emitted
/// at master-block and iterative-refinement granularity only; no event
/// exists per LZ77 token or per bit written.
pub enum ProgressEvent {
	/// # A Master Block Started.
	///
	/// `index` is zero-based; `total` is the number of master blocks the
	/// input was chunked into.
	MasterBlockStarted {
		/// # Zero-Based Master Block Index.
		index: usize,
		/// # Total Master Block Count.
		total: usize,
	},
	/// # A Split-Last Pass Improved (or Failed to Improve) Total Cost.
	///
	/// Reported once per pass attempted within a single master block's
	/// `SPLIT_LAST`/`REOPTIMIZE` cycle (spec.md §4.6.5).
	PassImproved {
		/// # One-Based Pass Number.
		pass: u16,
		/// # Total Cost (Bits) Before This Pass.
		before: u64,
		/// # Total Cost (Bits) After This Pass.
		after: u64,
		/// # Whether `after` Was Actually Kept.
		///
		/// A pass that does not strictly decrease cost is discarded; the
		/// previous pass's partition and tokens are kept (spec.md §8's
		/// *monotone pass improvement* property).
		improved: bool,
	},
	/// # A Restore Point Was Discarded.
	///
	/// Reported by [`crate::restore`] when a loaded restore-point file
	/// fails its magic/CRC/width check and the core falls through to a
	/// fresh run.
	RestorePointDiscarded {
		/// # Why It Was Discarded.
		reason: &'static str,
	},
}

/// # Progress Sink.
///
/// Implement this to receive [`ProgressEvent`]s from a [`crate::deflate`]
/// run. The default [`NullProgress`] sink discards everything; a CLI or
/// other embedding layer swaps in its own implementation to drive a
/// progress bar or log line.
///
/// Implementations must not block or panic; events are emitted from
/// whichever thread happens to be running the affected master block (see
/// the crate's concurrency model notes), so a sink that needs ordering or
/// mutation should synchronize internally.
pub trait Progress {
	/// # Report an Event.
	fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Copy, Default)]
/// # Null Progress Sink.
///
/// Discards every event. This is the default used by [`crate::deflate`]
/// when no sink is supplied.
pub struct NullProgress;

impl Progress for NullProgress {
	#[inline]
	fn event(&self, _event: ProgressEvent) {}
}

impl<T: Progress + ?Sized> Progress for &T {
	#[inline]
	fn event(&self, event: ProgressEvent) { (**self).event(event); }
}

#[cfg(test)]
mod test {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[derive(Default)]
	struct Counter(AtomicUsize);

	impl Progress for Counter {
		fn event(&self, _event: ProgressEvent) { self.0.fetch_add(1, Ordering::Relaxed); }
	}

	#[test]
	fn t_null_progress_is_a_noop() {
		let sink = NullProgress;
		sink.event(ProgressEvent::MasterBlockStarted { index: 0, total: 1 });
	}

	#[test]
	fn t_counter_sink_counts() {
		let counter = Counter::default();
		counter.event(ProgressEvent::MasterBlockStarted { index: 0, total: 3 });
		counter.event(ProgressEvent::PassImproved { pass: 1, before: 100, after: 90, improved: true });
		assert_eq!(counter.0.load(Ordering::Relaxed), 2);
	}
}
