use crate::api::LineSource;
use crate::error::FetchError;
use crate::line::BusLine;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

pub type FetchResult = Result<Vec<BusLine>, FetchError>;

/// An in-flight read of the line table.
///
/// The result is handed to `deliver` only if the fetch was not cancelled
/// before it arrived. Dropping the handle cancels it.
pub struct PendingFetch {
    generation: u64,
    cancelled: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl PendingFetch {
    pub fn spawn<F>(source: Arc<dyn LineSource>, generation: u64, deliver: F) -> Self
    where
        F: FnOnce(u64, FetchResult) + Send + 'static,
    {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);

        let handle = thread::spawn(move || {
            let result = source.fetch_lines();
            if flag.load(Ordering::Acquire) {
                warn!(generation, "Discarding result of cancelled fetch");
                return;
            }
            deliver(generation, result);
        });

        Self {
            generation,
            cancelled,
            handle: Some(handle),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cancel(&self) {
        debug!(generation = self.generation, "Cancelling fetch");
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Block until the worker exits. Used by one-shot commands.
    pub fn wait(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(generation = self.generation, "Fetch thread panicked");
            }
        }
    }
}

impl Drop for PendingFetch {
    fn drop(&mut self) {
        // Only a handle that still owns its worker can cancel it
        if self.handle.is_some() {
            self.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    struct SlowSource {
        release: std::sync::Mutex<mpsc::Receiver<()>>,
    }

    impl LineSource for SlowSource {
        fn fetch_lines(&self) -> Result<Vec<BusLine>, FetchError> {
            let _ = self.release.lock().map(|rx| rx.recv_timeout(Duration::from_secs(2)));
            Ok(vec![BusLine::new("1", "10", "A → B")])
        }
    }

    fn slow_source() -> (Arc<dyn LineSource>, mpsc::Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let source = SlowSource {
            release: std::sync::Mutex::new(rx),
        };
        (Arc::new(source), tx)
    }

    #[test]
    fn test_delivers_when_not_cancelled() {
        let (source, release) = slow_source();
        let (tx, rx) = mpsc::channel();
        let fetch = PendingFetch::spawn(source, 3, move |generation, result| {
            let _ = tx.send((generation, result));
        });
        release.send(()).unwrap();

        let (generation, result) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(generation, 3);
        assert_eq!(result.unwrap().len(), 1);
        fetch.wait();
    }

    #[test]
    fn test_late_result_after_cancel_is_discarded() {
        let (source, release) = slow_source();
        let (tx, rx) = mpsc::channel();
        let fetch = PendingFetch::spawn(source, 1, move |generation, result| {
            let _ = tx.send((generation, result));
        });

        fetch.cancel();
        assert!(fetch.is_cancelled());
        release.send(()).unwrap();
        fetch.wait();

        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_drop_cancels() {
        let (source, release) = slow_source();
        let (tx, rx) = mpsc::channel();
        let fetch = PendingFetch::spawn(source, 1, move |generation, result| {
            let _ = tx.send((generation, result));
        });

        drop(fetch);
        release.send(()).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
