//! Local worker pool: one master process and N worker processes.

use std::process::{Child, Command, Stdio};

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::{PoolError, PoolJob, PoolOutcome, WorkerPool};
use log::{info, warn};

/// Host workers use to reach the master when none is configured.
pub const DEFAULT_MASTER_HOST: &str = "localhost";

/// Launches the master and its workers as local child processes.
///
/// The master and every worker run in fresh copies of the job's template
/// directory. The master is started with `/h :<port>` and each worker with
/// `/h <host>:<port>`. Workers are killed and reaped once the master exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessWorkerPool {
    host: String,
}

impl Default for ProcessWorkerPool {
    fn default() -> Self {
        Self::new(DEFAULT_MASTER_HOST)
    }
}

impl ProcessWorkerPool {
    /// Pool whose workers connect to the master at `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Directory for the worker with zero-based `index`.
    #[must_use]
    pub fn worker_dir(worker_root: &Utf8Path, index: usize) -> Utf8PathBuf {
        worker_root.join(format!("worker_{index}"))
    }
}

fn prepare(template: &Utf8Path, target: &Utf8Path) -> Result<(), PoolError> {
    chance_verify_fs::reset_dir_from_template(template, target).map_err(|source| {
        PoolError::PrepareDir {
            path: target.to_path_buf(),
            source,
        }
    })
}

fn spawn(
    job: &PoolJob,
    role: &str,
    working_dir: &Utf8Path,
    address: &str,
    quiet: bool,
) -> Result<Child, PoolError> {
    let mut command = Command::new(job.executable.as_std_path());
    command
        .arg(&job.config_file)
        .arg("/h")
        .arg(address)
        .current_dir(working_dir.as_std_path());
    if quiet {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }
    command.spawn().map_err(|source| PoolError::Spawn {
        role: role.to_owned(),
        working_dir: working_dir.to_path_buf(),
        source,
    })
}

fn reap(role: &str, mut child: Child) {
    if let Err(err) = child.kill() {
        warn!("failed to stop {role}: {err}");
    }
    if let Err(err) = child.wait() {
        warn!("failed to reap {role}: {err}");
    }
}

impl WorkerPool for ProcessWorkerPool {
    fn run(&self, job: &PoolJob) -> Result<PoolOutcome, PoolError> {
        prepare(&job.template_dir, &job.master_dir)?;
        let requested = job.workers.get();
        let mut worker_dirs = Vec::with_capacity(requested);
        for index in 0..requested {
            let dir = Self::worker_dir(&job.worker_root, index);
            prepare(&job.template_dir, &dir)?;
            worker_dirs.push(dir);
        }

        info!(
            "starting master in {} on port {} with {requested} worker(s)",
            job.master_dir, job.port
        );
        let mut master = spawn(
            job,
            "master",
            &job.master_dir,
            &format!(":{}", job.port),
            false,
        )?;

        let worker_address = format!("{}:{}", self.host, job.port);
        let mut workers = Vec::with_capacity(requested);
        for (index, dir) in worker_dirs.iter().enumerate() {
            let role = format!("worker {index}");
            match spawn(job, &role, dir, &worker_address, true) {
                Ok(child) => workers.push((role, child)),
                Err(err) => warn!("{err}"),
            }
        }
        if workers.is_empty() {
            reap("master", master);
            return Err(PoolError::NoWorkers { requested });
        }
        let workers_launched = workers.len();

        let waited = master.wait();
        for (role, child) in workers {
            reap(&role, child);
        }
        let status = waited.map_err(|source| PoolError::Wait { source })?;
        if !status.success() {
            warn!("pool master exited with {status}");
        }
        Ok(PoolOutcome {
            master_dir: job.master_dir.clone(),
            workers_launched,
            master_exit_code: status.code(),
        })
    }
}
