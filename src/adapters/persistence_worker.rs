//! Background thread that saves and loads value tables.
//!
//! Jobs are queued on a channel and run one at a time in submission order.
//! A save clones the table under its lock and encodes the clone after the
//! lock is released. A load replaces the table only once the whole file has
//! decoded, so a failed load leaves the in-memory table untouched.

use std::{
    fmt,
    path::{Path, PathBuf},
    thread::{self, JoinHandle},
};

use crossbeam::channel::{self, Receiver, Sender};
use log::{info, warn};

use crate::{
    Result,
    error::Error,
    ports::TableRepository,
    q_learning::SharedQTable,
};

enum Job {
    Save { table: SharedQTable, path: PathBuf },
    Load { table: SharedQTable, path: PathBuf },
}

/// Result of one persistence job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobReport {
    Saved { path: PathBuf, states: usize },
    Loaded { path: PathBuf, states: usize },
    /// Nothing stored at `path`; the table was left as is.
    NotFound { path: PathBuf },
    Failed { path: PathBuf, message: String },
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        !matches!(self, JobReport::Failed { .. })
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobReport::Saved { path, states } => {
                write!(f, "saved {states} states to {}", path.display())
            }
            JobReport::Loaded { path, states } => {
                write!(f, "loaded {states} states from {}", path.display())
            }
            JobReport::NotFound { path } => write!(f, "no table at {}", path.display()),
            JobReport::Failed { path, message } => {
                write!(f, "persistence failed for {}: {message}", path.display())
            }
        }
    }
}

/// Handle to the persistence thread.
///
/// Dropping the handle closes the queue and waits for pending jobs.
pub struct PersistenceWorker {
    jobs: Option<Sender<Job>>,
    reports: Receiver<JobReport>,
    handle: Option<JoinHandle<()>>,
}

impl PersistenceWorker {
    /// Start the worker thread around `repository`.
    pub fn spawn<R>(repository: R) -> Result<Self>
    where
        R: TableRepository + Send + 'static,
    {
        let (job_sender, job_receiver) = channel::unbounded::<Job>();
        let (report_sender, report_receiver) = channel::unbounded();

        let handle = thread::Builder::new()
            .name("table-persistence".to_string())
            .spawn(move || {
                for job in job_receiver {
                    let report = run_job(&repository, job);
                    if report_sender.send(report).is_err() {
                        break;
                    }
                }
            })
            .map_err(|source| Error::Io {
                operation: "spawn persistence thread".to_string(),
                source,
            })?;

        Ok(Self {
            jobs: Some(job_sender),
            reports: report_receiver,
            handle: Some(handle),
        })
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.jobs
            .as_ref()
            .ok_or(Error::WorkerUnavailable)?
            .send(job)
            .map_err(|_| Error::WorkerUnavailable)
    }

    /// Queue a save of `table` to `path`.
    pub fn save(&self, table: &SharedQTable, path: impl Into<PathBuf>) -> Result<()> {
        self.submit(Job::Save {
            table: table.clone(),
            path: path.into(),
        })
    }

    /// Queue a load from `path` into `table`.
    pub fn load(&self, table: &SharedQTable, path: impl Into<PathBuf>) -> Result<()> {
        self.submit(Job::Load {
            table: table.clone(),
            path: path.into(),
        })
    }

    /// Block until the next job finishes.
    pub fn recv_report(&self) -> Result<JobReport> {
        self.reports.recv().map_err(|_| Error::WorkerUnavailable)
    }

    /// Next finished job, if any, without blocking.
    pub fn try_report(&self) -> Option<JobReport> {
        self.reports.try_recv().ok()
    }

    /// Stop accepting jobs, wait for queued ones, and return their reports.
    pub fn shutdown(mut self) -> Result<Vec<JobReport>> {
        self.finish()?;
        Ok(self.reports.try_iter().collect())
    }

    fn finish(&mut self) -> Result<()> {
        self.jobs.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| Error::WorkerUnavailable),
            None => Ok(()),
        }
    }
}

impl Drop for PersistenceWorker {
    fn drop(&mut self) {
        if self.finish().is_err() {
            warn!("persistence thread panicked");
        }
    }
}

fn run_job<R: TableRepository>(repository: &R, job: Job) -> JobReport {
    match job {
        Job::Save { table, path } => match save(repository, &table, &path) {
            Ok(states) => JobReport::Saved { path, states },
            Err(e) => failed(path, e),
        },
        Job::Load { table, path } => match load(repository, &table, &path) {
            Ok(Some(states)) => JobReport::Loaded { path, states },
            Ok(None) => {
                info!("no saved table at {}", path.display());
                JobReport::NotFound { path }
            }
            Err(e) => failed(path, e),
        },
    }
}

fn failed(path: PathBuf, error: Error) -> JobReport {
    warn!("{}: {error}", path.display());
    JobReport::Failed {
        path,
        message: error.to_string(),
    }
}

fn save<R: TableRepository>(
    repository: &R,
    table: &SharedQTable,
    path: &Path,
) -> Result<usize> {
    let snapshot = table.snapshot()?;
    repository.save(&snapshot, path)?;
    Ok(snapshot.len())
}

fn load<R: TableRepository>(
    repository: &R,
    table: &SharedQTable,
    path: &Path,
) -> Result<Option<usize>> {
    let Some(loaded) = repository.load(path)? else {
        return Ok(None);
    };
    let mut current = table.lock()?;
    if loaded.board_size() != current.board_size() {
        return Err(Error::CorruptTable {
            reason: format!(
                "stored table is for size {}, in-memory table for size {}",
                loaded.board_size(),
                current.board_size()
            ),
        });
    }
    let states = loaded.len();
    *current = loaded;
    Ok(Some(states))
}
