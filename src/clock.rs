use crate::schedule;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::debug;

pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Source of the current minute of the day.
pub trait Clock: Send + 'static {
    fn minute_of_day(&self) -> u32;
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn minute_of_day(&self) -> u32 {
        schedule::now_minutes()
    }
}

impl<F> Clock for F
where
    F: Fn() -> u32 + Send + 'static,
{
    fn minute_of_day(&self) -> u32 {
        self()
    }
}

/// Owned handle to a recurring "refresh now" timer.
///
/// Once [`ClockTicker::stop`] returns (or the handle is dropped) the callback
/// is never invoked again.
pub struct ClockTicker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ClockTicker {
    /// Tick once a minute from the system clock.
    pub fn start<F>(on_tick: F) -> Self
    where
        F: FnMut(u32) + Send + 'static,
    {
        Self::with_clock(TICK_INTERVAL, SystemClock, on_tick)
    }

    pub fn with_clock<C, F>(interval: Duration, clock: C, mut on_tick: F) -> Self
    where
        C: Clock,
        F: FnMut(u32) + Send + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::spawn(move || {
            // Deadlines sit on a fixed grid so waits don't accumulate drift
            let mut deadline = Instant::now() + interval;
            loop {
                let wait = deadline.saturating_duration_since(Instant::now());
                match stop_rx.recv_timeout(wait) {
                    Err(RecvTimeoutError::Timeout) => {
                        let now = clock.minute_of_day();
                        debug!(now_minutes = now, "Clock tick");
                        on_tick(now);
                        deadline += interval;
                    }
                    // Stop requested or handle gone
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Cancel the timer and wait for the ticker thread to exit.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Clock ticker thread panicked");
            }
        }
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_ticks_read_the_clock_each_time() {
        let reads = Arc::new(AtomicU32::new(0));
        let clock_reads = Arc::clone(&reads);
        let clock = move || 600 + clock_reads.fetch_add(1, Ordering::SeqCst);

        let (tx, rx) = mpsc::channel();
        let mut ticker = ClockTicker::with_clock(Duration::from_millis(10), clock, move |now| {
            let _ = tx.send(now);
        });

        let first = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        let second = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        ticker.stop();

        assert_eq!(first, 600);
        assert_eq!(second, 601);
    }

    #[test]
    fn test_no_tick_after_stop() {
        let count = Arc::new(AtomicU32::new(0));
        let ticks = Arc::clone(&count);
        let mut ticker = ClockTicker::with_clock(Duration::from_millis(5), || 0u32, move |_| {
            ticks.fetch_add(1, Ordering::SeqCst);
        });

        thread::sleep(Duration::from_millis(30));
        ticker.stop();
        assert!(!ticker.is_running());

        let after_stop = count.load(Ordering::SeqCst);
        thread::sleep(Duration::from_millis(30));
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
    }

    #[test]
    fn test_drop_stops_before_first_tick() {
        let count = Arc::new(AtomicU32::new(0));
        let ticks = Arc::clone(&count);
        let ticker = ClockTicker::with_clock(Duration::from_secs(60), || 0u32, move |_| {
            ticks.fetch_add(1, Ordering::SeqCst);
        });
        drop(ticker);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
