//! Draining already-queued async work
//!
//! Draining is a cooperative yield to the tokio scheduler. On a current-thread
//! runtime (the `#[tokio::test]` default) a yielding task resumes only after the
//! tasks that were already runnable have been polled, so one round is enough for
//! continuations that complete without yielding. Tasks that yield themselves
//! advance one step per round.

/// Yield `rounds` times (at least once) to the current async runtime.
///
/// Never advances virtual time and never fires scheduled entries.
pub async fn flush_pending(rounds: u32) {
    for _ in 0..rounds.max(1) {
        tokio::task::yield_now().await;
    }
}
