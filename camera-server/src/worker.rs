use crate::error::{Error, Result};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// A background thread that runs until its job returns or it is told to stop.
///
/// The job gets the kill flag and is expected to poll it.
pub enum Worker {
    Worker {
        worker: Option<JoinHandle<Result<()>>>,
        kill_flag: Arc<AtomicBool>,
    },
    Done,
}

impl Worker {
    pub fn spawn<F: FnOnce(Arc<AtomicBool>) -> Result<()> + Send + 'static>(work: F) -> Worker {
        let kill_flag = Arc::new(AtomicBool::new(false));
        let worker_kill_flag = kill_flag.clone();
        let worker = std::thread::spawn(move || work(worker_kill_flag));
        Worker::Worker {
            worker: Some(worker),
            kill_flag,
        }
    }

    pub fn is_finished(&self) -> bool {
        match self {
            Worker::Worker { worker, .. } => worker.as_ref().map_or(true, |w| w.is_finished()),
            Worker::Done => true,
        }
    }

    /// Stops the worker and waits for it. Returns the job's error, once; later
    /// joins return `Ok`.
    pub fn join(&mut self) -> Result<()> {
        let res = match self {
            Worker::Worker { worker, kill_flag } => {
                kill_flag.store(true, Ordering::Release);
                match worker.take() {
                    Some(handle) => handle.join().unwrap_or(Err(Error::WorkerPanicked)),
                    None => Ok(()),
                }
            }
            Worker::Done => Ok(()),
        };
        *self = Worker::Done;
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn join_stops_a_polling_job() {
        let mut worker = Worker::spawn(|kill_flag| {
            while !kill_flag.load(Ordering::Acquire) {
                std::thread::sleep(Duration::from_millis(1));
            }
            Ok(())
        });
        assert!(!worker.is_finished());
        assert!(worker.join().is_ok());
        assert!(worker.is_finished());
        assert!(worker.join().is_ok());
    }

    #[test]
    fn job_error_is_reported_once() {
        let mut worker = Worker::spawn(|_| Err(Error::WorkerPanicked));
        assert!(matches!(worker.join(), Err(Error::WorkerPanicked)));
        assert!(worker.join().is_ok());
    }
}
