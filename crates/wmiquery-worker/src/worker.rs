//! A dedicated OS thread that owns a provider.
//!
//! The provider is built on the worker thread by an init closure and is only
//! ever borrowed by jobs running there, so it does not need to be `Send`.
//! Jobs arrive over an unbounded tokio channel and execute strictly in
//! submission order. Each job answers through its own `oneshot`.

use crate::error::WorkerError;
use std::fmt::Display;
use std::sync::mpsc as std_mpsc;
use std::thread::{JoinHandle, ThreadId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

type Job<P> = Box<dyn FnOnce(&P) + Send>;

pub struct AffinityWorker<P: 'static> {
    jobs: Option<mpsc::UnboundedSender<Job<P>>>,
    thread: Option<JoinHandle<()>>,
    thread_id: ThreadId,
}

impl<P: 'static> AffinityWorker<P> {
    /// Start the worker thread and build the provider on it.
    ///
    /// Returns once `init` has finished. An init failure is reported as
    /// [`WorkerError::Init`] and the thread is joined.
    pub fn spawn<F, E>(name: impl Into<String>, init: F) -> Result<Self, WorkerError>
    where
        F: FnOnce() -> Result<P, E> + Send + 'static,
        E: Display,
    {
        let name = name.into();
        let (jobs_tx, jobs_rx) = mpsc::unbounded_channel::<Job<P>>();
        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<(), String>>();

        let thread = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let provider = match init() {
                    Ok(p) => p,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e.to_string()));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(()));
                worker_main(provider, jobs_rx);
            })
            .map_err(WorkerError::Spawn)?;

        let thread_id = thread.thread().id();
        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!(thread = %name, "affinity worker started");
                Ok(Self {
                    jobs: Some(jobs_tx),
                    thread: Some(thread),
                    thread_id,
                })
            }
            Ok(Err(msg)) => {
                error!(thread = %name, error = %msg, "provider initialisation failed");
                let _ = thread.join();
                Err(WorkerError::Init(msg))
            }
            // init panicked
            Err(_) => {
                let _ = thread.join();
                Err(WorkerError::Gone)
            }
        }
    }

    /// Id of the thread every job runs on.
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    fn submit<T, F>(&self, f: F) -> Result<oneshot::Receiver<T>, WorkerError>
    where
        F: FnOnce(&P) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job<P> = Box::new(move |provider| {
            let _ = tx.send(f(provider));
        });
        self.jobs
            .as_ref()
            .ok_or(WorkerError::Gone)?
            .send(job)
            .map_err(|_| WorkerError::Gone)?;
        Ok(rx)
    }

    /// Run `f` on the worker thread and block until it returns.
    ///
    /// Must not be called from inside an async runtime; use
    /// [`run_async`](Self::run_async) there.
    pub fn run<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        F: FnOnce(&P) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(f)?.blocking_recv().map_err(|_| WorkerError::Gone)
    }

    /// Run `f` on the worker thread and await its result.
    pub async fn run_async<T, F>(&self, f: F) -> Result<T, WorkerError>
    where
        F: FnOnce(&P) -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(f)?.await.map_err(|_| WorkerError::Gone)
    }
}

fn worker_main<P>(provider: P, mut jobs: mpsc::UnboundedReceiver<Job<P>>) {
    while let Some(job) = jobs.blocking_recv() {
        job(&provider);
    }
    debug!("job queue closed, releasing provider");
}

impl<P: 'static> Drop for AffinityWorker<P> {
    fn drop(&mut self) {
        // Closing the queue ends worker_main once pending jobs are drained.
        self.jobs.take();
        if let Some(handle) = self.thread.take() {
            let _ = handle.join();
        }
    }
}

impl<P: 'static> std::fmt::Debug for AffinityWorker<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AffinityWorker")
            .field("thread_id", &self.thread_id)
            .field("running", &self.jobs.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    /// Neither `Send` nor `Sync`: only usable on the thread that built it.
    struct Apartment {
        log: Rc<RefCell<Vec<u32>>>,
    }

    fn apartment() -> Result<Apartment, String> {
        Ok(Apartment {
            log: Rc::new(RefCell::new(Vec::new())),
        })
    }

    #[test]
    fn jobs_run_on_the_named_thread() {
        let worker = AffinityWorker::spawn("sta-test", apartment).unwrap();
        let (name, id) = worker
            .run(|_| {
                let current = std::thread::current();
                (current.name().map(str::to_string), current.id())
            })
            .unwrap();
        assert_eq!(name.as_deref(), Some("sta-test"));
        assert_eq!(id, worker.thread_id());
        assert_ne!(id, std::thread::current().id());
    }

    #[test]
    fn jobs_are_serialized_in_submission_order() {
        let worker = Arc::new(AffinityWorker::spawn("sta-order", apartment).unwrap());
        for i in 0..5 {
            worker.run(move |a| a.log.borrow_mut().push(i)).unwrap();
        }
        let seen = worker.run(|a| a.log.borrow().clone()).unwrap();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn concurrent_callers_never_overlap() {
        let worker = Arc::new(AffinityWorker::spawn("sta-busy", apartment).unwrap());
        let active = Arc::new(Mutex::new(0u32));
        let peak = Arc::new(Mutex::new(0u32));

        let callers: Vec<_> = (0..4)
            .map(|_| {
                let worker = Arc::clone(&worker);
                let active = Arc::clone(&active);
                let peak = Arc::clone(&peak);
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        let active = Arc::clone(&active);
                        let peak = Arc::clone(&peak);
                        worker
                            .run(move |_| {
                                let now = {
                                    let mut n = active.lock().unwrap();
                                    *n += 1;
                                    *n
                                };
                                let mut p = peak.lock().unwrap();
                                *p = (*p).max(now);
                                drop(p);
                                *active.lock().unwrap() -= 1;
                            })
                            .unwrap();
                    }
                })
            })
            .collect();
        for c in callers {
            c.join().unwrap();
        }
        assert_eq!(*peak.lock().unwrap(), 1);
    }

    #[test]
    fn init_failure_is_reported() {
        let err = AffinityWorker::<Apartment>::spawn("sta-fail", || {
            Err::<Apartment, _>("CoInitializeEx returned 0x80010106")
        })
        .unwrap_err();
        match err {
            WorkerError::Init(msg) => assert!(msg.contains("0x80010106")),
            other => panic!("expected Init, got {other:?}"),
        }
    }

    #[test]
    fn panicking_job_reports_gone() {
        let worker = AffinityWorker::spawn("sta-panic", apartment).unwrap();
        let err = worker.run(|_| -> u32 { panic!("provider crashed") }).unwrap_err();
        assert!(matches!(err, WorkerError::Gone));
        assert!(matches!(worker.run(|_| ()), Err(WorkerError::Gone)));
    }

    #[tokio::test]
    async fn run_async_awaits_the_worker() {
        let worker = AffinityWorker::spawn("sta-async", apartment).unwrap();
        let n = worker
            .run_async(|a| {
                a.log.borrow_mut().push(7);
                a.log.borrow().len()
            })
            .await
            .unwrap();
        assert_eq!(n, 1);
    }
}
