use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::backoff::Backoff;
use super::poller::Poller;
use crate::render::LogSink;
use crate::transport::Backend;

/// Poller shared between the polling loop and interactive callers.
pub type SharedPoller<B, S> = Arc<Mutex<Poller<B, S>>>;

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollingSummary {
    pub cycles: u64,
    pub updates: u64,
    pub failures: u64,
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Poll until `cancel` fires, adapting the cadence with `backoff`.
///
/// Cycles never overlap: the next one is scheduled only after the previous
/// completed. A cycle that fails or panics is logged and followed by the
/// slow interval; it never ends the loop.
pub async fn run_polling<B, S>(
    poller: SharedPoller<B, S>,
    mut backoff: Backoff,
    cancel: CancellationToken,
) -> PollingSummary
where
    B: Backend,
    S: LogSink,
{
    let mut summary = PollingSummary::default();

    info!(
        event = "core.poll.loop_started",
        fast_ms = backoff.fast().as_millis() as u64,
        slow_ms = backoff.slow().as_millis() as u64,
        burst_length = backoff.burst_length()
    );

    loop {
        let cycle = async { poller.lock().await.poll().await };
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            outcome = AssertUnwindSafe(cycle).catch_unwind() => outcome,
        };

        summary.cycles += 1;
        let next = match outcome {
            Ok(Ok(updated)) => {
                if updated {
                    summary.updates += 1;
                }
                backoff.next_interval(updated)
            }
            Ok(Err(e)) => {
                summary.failures += 1;
                error!(event = "core.poll.cycle_failed", error = %e);
                backoff.after_failure()
            }
            Err(payload) => {
                summary.failures += 1;
                error!(
                    event = "core.poll.cycle_panicked",
                    message = %panic_message(payload.as_ref())
                );
                backoff.after_failure()
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(next) => {}
        }
    }

    info!(
        event = "core.poll.loop_stopped",
        cycles = summary.cycles,
        updates = summary.updates,
        failures = summary.failures
    );

    summary
}
