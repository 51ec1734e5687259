//! Unauthenticated demo endpoints for showing how different deployments
//! (bare host, container, orchestrated cluster) react to a failing process.
//!
//! None of these protect the process. `/crash` kills it, `/burn` pins a core
//! for a fixed window, `/oom` grows memory until something outside kills it.

use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
};
use tracing::{debug, error, warn};

use crate::{AppError, AppState};

pub const BURN_WINDOW: Duration = Duration::from_secs(10);
const BURN_MODULUS: u64 = 9_999_991;

pub const HOARD_CHUNK_BYTES: usize = 10_000_000;
pub const HOARD_INTERVAL: Duration = Duration::from_millis(100);

pub async fn healthz() -> &'static str {
    "ok\n"
}

/// Which replica answered.
pub async fn whoami(State(state): State<AppState>) -> String {
    format!("mode={} host={}\n", state.config.run_mode, state.config.hostname)
}

/// Exit immediately with status 1. No response is ever written.
pub async fn crash(State(state): State<AppState>) -> Response {
    error!("Crash requested, terminating process");
    if state.config.crash_signals_parent {
        signal_parent();
    }
    std::process::exit(1)
}

/// Under a pre-fork supervisor the handling process is a worker; terminating
/// the parent as well takes the whole service down.
#[cfg(unix)]
fn signal_parent() {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::getppid;

    let parent = getppid();
    // 0: no parent visible (we are PID 1 in a container). 1: init, never signal it.
    if parent.as_raw() <= 1 {
        warn!("Parent pid {} is not a supervisor, not signalling it", parent);
        return;
    }
    if let Err(e) = kill(parent, Signal::SIGTERM) {
        warn!("Failed to send SIGTERM to parent {}: {}", parent, e);
    }
}

#[cfg(not(unix))]
fn signal_parent() {
    warn!("Signalling the parent process is only supported on unix");
}

/// One step of the busy-loop recurrence.
pub fn burn_step(x: u64) -> u64 {
    (x * 3 + 7) % BURN_MODULUS
}

/// Spin on [`burn_step`] until `window` has elapsed and return the accumulator.
pub fn burn_cpu(window: Duration) -> u64 {
    let deadline = Instant::now() + window;
    let mut x = 0;
    while Instant::now() < deadline {
        x = burn_step(x);
    }
    x
}

/// Runs on a blocking thread that is not cancelled if the client goes away.
pub async fn burn() -> Result<String, AppError> {
    warn!("Burning one CPU core for {:?}", BURN_WINDOW);
    let x = tokio::task::spawn_blocking(|| burn_cpu(BURN_WINDOW)).await?;
    Ok(format!("CPU burn complete: {x}\n"))
}

/// Memory that is only ever added to.
#[derive(Debug, Default)]
pub struct Hoard {
    chunks: Vec<String>,
}

impl Hoard {
    pub fn grow(&mut self, chunk_bytes: usize) {
        // repeat() writes every byte, so the pages are actually resident
        self.chunks.push("X".repeat(chunk_bytes));
    }

    pub fn bytes(&self) -> usize {
        self.chunks.iter().map(String::len).sum()
    }
}

async fn hoard_forever(chunk_bytes: usize, interval: Duration) {
    let mut hoard = Hoard::default();
    loop {
        hoard.grow(chunk_bytes);
        debug!(bytes = hoard.bytes(), "Hoard grew");
        tokio::time::sleep(interval).await;
    }
}

/// Never returns. The hoarding task is detached so it keeps growing even
/// after the client disconnects.
pub async fn oom() -> (StatusCode, &'static str) {
    error!(
        "Memory exhaustion requested, adding {} bytes every {:?} until killed",
        HOARD_CHUNK_BYTES, HOARD_INTERVAL
    );
    let task = tokio::spawn(hoard_forever(HOARD_CHUNK_BYTES, HOARD_INTERVAL));
    if let Err(e) = task.await {
        error!("Memory hoard stopped: {}", e);
    }
    (StatusCode::INTERNAL_SERVER_ERROR, "memory hoard stopped\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recurrence_is_fixed() {
        assert_eq!(burn_step(0), 7);
        assert_eq!(burn_step(7), 28);
        assert_eq!(burn_step(BURN_MODULUS - 1), (3 * (BURN_MODULUS - 1) + 7) % BURN_MODULUS);
    }

    #[test]
    fn zero_window_does_no_work() {
        assert_eq!(burn_cpu(Duration::ZERO), 0);
    }

    #[test]
    fn burn_runs_for_its_window() {
        let started = Instant::now();
        let x = burn_cpu(Duration::from_millis(50));
        assert!(started.elapsed() >= Duration::from_millis(50));
        assert!(x < BURN_MODULUS);
    }

    #[test]
    fn hoard_only_grows() {
        let mut hoard = Hoard::default();
        assert_eq!(hoard.bytes(), 0);
        for _ in 0..3 {
            hoard.grow(1024);
        }
        assert_eq!(hoard.bytes(), 3 * 1024);
    }
}
