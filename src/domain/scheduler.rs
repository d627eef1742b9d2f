//! Fixed-interval scheduling loop with cooperative shutdown.
//!
//! The loop wakes every `poll` to check whether the next run is due. A run
//! blocks the loop until it finishes; the next run is due one `interval`
//! after the previous one finished. The first run is one `interval` after
//! start. Shutdown is observed between polls, never in the middle of a run.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub poll: Duration,
}

impl Default for Schedule {
    fn default() -> Self {
        Schedule {
            interval: Duration::from_secs(5 * 60),
            poll: Duration::from_secs(1),
        }
    }
}

/// Runs `job` on `schedule` until `shutdown` resolves. Returns the number of
/// completed runs.
pub async fn run_scheduled<F, Fut, S>(schedule: Schedule, mut job: F, shutdown: S) -> usize
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut next_run = Instant::now() + schedule.interval;
    let mut runs = 0;

    info!(
        interval_secs = schedule.interval.as_secs(),
        "scheduler started"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!(runs, "shutdown requested, scheduler stopping");
                break;
            }
            _ = tokio::time::sleep(schedule.poll) => {}
        }

        if Instant::now() >= next_run {
            job().await;
            runs += 1;
            next_run = Instant::now() + schedule.interval;
        }
    }

    runs
}
