//! In-process background analysis jobs.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use chrono::{DateTime, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::QueueOptions;
use crate::error::{Error, Result};

/// Identifier handed out by [`JobQueue::submit`].
pub type JobId = u64;

/// Function run by the workers for each job: analyze the file at the path,
/// reporting `(pages_done, page_count)` as it goes.
pub type Analyzer = Arc<dyn Fn(&Path, &mut dyn FnMut(u32, u32)) -> Result<String> + Send + Sync>;

/// Polling view of a job.
///
/// Serializes as `{"state": "PROGRESS", "progress": 0.5}`. A finished
/// success reports `"progress": 1.0`.
#[derive(Debug, Clone, PartialEq)]
pub enum JobStatus {
    /// Queued, not yet picked up by a worker
    Pending,
    /// Running; `current` is the fraction of pages analyzed
    Progress { current: f64 },
    /// Finished with a report
    Success,
    /// Finished with an error
    Failure { error: String },
}

impl Serialize for JobStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match self {
            JobStatus::Pending => map.serialize_entry("state", "PENDING")?,
            JobStatus::Progress { current } => {
                map.serialize_entry("state", "PROGRESS")?;
                map.serialize_entry("progress", current)?;
            }
            JobStatus::Success => {
                map.serialize_entry("state", "SUCCESS")?;
                map.serialize_entry("progress", &1.0)?;
            }
            JobStatus::Failure { error } => {
                map.serialize_entry("state", "FAILURE")?;
                map.serialize_entry("error", error)?;
            }
        }
        map.end()
    }
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failure { .. })
    }
}

/// Snapshot of a job's bookkeeping.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: JobId,
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

struct JobRecord {
    info: JobInfo,
    report: Option<String>,
}

#[derive(Default)]
struct State {
    jobs: HashMap<JobId, JobRecord>,
    finished: VecDeque<JobId>,
}

struct Shared {
    state: Mutex<State>,
    done: Condvar,
    keep_finished: usize,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_progress(&self, id: JobId, current: f64) {
        if let Some(record) = self.lock().jobs.get_mut(&id) {
            record.info.status = JobStatus::Progress { current };
        }
    }

    fn finish(&self, id: JobId, outcome: std::result::Result<String, String>) {
        let mut state = self.lock();
        if let Some(record) = state.jobs.get_mut(&id) {
            record.info.finished_at = Some(Utc::now());
            match outcome {
                Ok(report) => {
                    log::info!("Job {} finished: {}", id, record.info.path.display());
                    record.info.status = JobStatus::Success;
                    record.report = Some(report);
                }
                Err(error) => {
                    log::warn!("Job {} failed: {}", id, error);
                    record.info.status = JobStatus::Failure { error };
                }
            }
            state.finished.push_back(id);
        }
        while state.finished.len() > self.keep_finished {
            if let Some(old) = state.finished.pop_front() {
                state.jobs.remove(&old);
                log::debug!("Evicted finished job {}", old);
            }
        }
        drop(state);
        self.done.notify_all();
    }
}

struct Task {
    id: JobId,
    path: PathBuf,
}

/// Fixed pool of worker threads analyzing submitted files.
///
/// # Example
///
/// ```no_run
/// use pdfratio::job::{JobQueue, QueueOptions};
///
/// let queue = JobQueue::new(QueueOptions::new().with_workers(2));
/// let id = queue.submit("document.pdf")?;
/// let report = queue.wait(id)?;
/// # Ok::<(), pdfratio::Error>(())
/// ```
pub struct JobQueue {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
    shared: Arc<Shared>,
    next_id: AtomicU64,
}

impl JobQueue {
    /// Start a queue running [`crate::analyze_with_progress`].
    pub fn new(options: QueueOptions) -> Self {
        Self::with_analyzer(options, |path: &Path, progress: &mut dyn FnMut(u32, u32)| {
            crate::analyze_with_progress(path, progress)
        })
    }

    /// Start a queue running a custom analyzer.
    pub fn with_analyzer<F>(options: QueueOptions, analyzer: F) -> Self
    where
        F: Fn(&Path, &mut dyn FnMut(u32, u32)) -> Result<String> + Send + Sync + 'static,
    {
        let analyzer: Analyzer = Arc::new(analyzer);
        let shared = Arc::new(Shared {
            state: Mutex::new(State::default()),
            done: Condvar::new(),
            keep_finished: options.keep_finished,
        });
        let (sender, receiver) = unbounded();

        let workers = (0..options.workers.max(1))
            .map(|n| {
                let receiver = receiver.clone();
                let shared = Arc::clone(&shared);
                let analyzer = Arc::clone(&analyzer);
                thread::spawn(move || run_worker(n, receiver, shared, analyzer))
            })
            .collect();

        log::info!("Job queue started with {} workers", options.workers.max(1));

        Self {
            sender: Some(sender),
            workers,
            shared,
            next_id: AtomicU64::new(1),
        }
    }

    /// Queue a file for analysis.
    pub fn submit<P: AsRef<Path>>(&self, path: P) -> Result<JobId> {
        let path = path.as_ref().to_path_buf();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        self.shared.lock().jobs.insert(
            id,
            JobRecord {
                info: JobInfo {
                    id,
                    path: path.clone(),
                    status: JobStatus::Pending,
                    submitted_at: Utc::now(),
                    finished_at: None,
                },
                report: None,
            },
        );

        let sent = match &self.sender {
            Some(sender) => sender.send(Task { id, path }).is_ok(),
            None => false,
        };
        if !sent {
            self.shared.lock().jobs.remove(&id);
            return Err(Error::Job("job queue is shut down".into()));
        }

        log::debug!("Submitted job {}", id);
        Ok(id)
    }

    /// Current status of a job.
    pub fn status(&self, id: JobId) -> Result<JobStatus> {
        Ok(self.info(id)?.status)
    }

    /// Full bookkeeping snapshot of a job.
    pub fn info(&self, id: JobId) -> Result<JobInfo> {
        self.shared
            .lock()
            .jobs
            .get(&id)
            .map(|record| record.info.clone())
            .ok_or_else(|| unknown(id))
    }

    /// The report of a finished job, or `None` while it is still running.
    ///
    /// A failed job yields [`Error::Job`] carrying its error message.
    pub fn result(&self, id: JobId) -> Result<Option<String>> {
        let state = self.shared.lock();
        let record = state.jobs.get(&id).ok_or_else(|| unknown(id))?;
        outcome(record)
    }

    /// Block until a job finishes and return its report.
    pub fn wait(&self, id: JobId) -> Result<String> {
        let mut state = self.shared.lock();
        loop {
            let record = state.jobs.get(&id).ok_or_else(|| unknown(id))?;
            if let Some(report) = outcome(record)? {
                return Ok(report);
            }
            state = self
                .shared
                .done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl Drop for JobQueue {
    fn drop(&mut self) {
        self.sender.take();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::warn!("Job worker exited abnormally");
            }
        }
        log::debug!("Job queue stopped");
    }
}

fn unknown(id: JobId) -> Error {
    Error::Job(format!("unknown job {}", id))
}

fn outcome(record: &JobRecord) -> Result<Option<String>> {
    match &record.info.status {
        JobStatus::Success => Ok(record.report.clone()),
        JobStatus::Failure { error } => Err(Error::Job(error.clone())),
        JobStatus::Pending | JobStatus::Progress { .. } => Ok(None),
    }
}

fn run_worker(n: usize, receiver: Receiver<Task>, shared: Arc<Shared>, analyzer: Analyzer) {
    log::debug!("Worker {} started", n);
    for Task { id, path } in receiver.iter() {
        log::info!("Worker {} running job {}: {}", n, id, path.display());
        shared.set_progress(id, 0.0);

        let mut progress = |done: u32, total: u32| {
            if total > 0 {
                shared.set_progress(id, f64::from(done) / f64::from(total));
            }
        };
        let result = panic::catch_unwind(AssertUnwindSafe(|| analyzer(&path, &mut progress)));

        let outcome = match result {
            Ok(Ok(report)) => Ok(report),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(format!("analysis panicked: {}", panic_message(&*payload))),
        };
        shared.finish(id, outcome);
    }
    log::debug!("Worker {} stopped", n);
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
