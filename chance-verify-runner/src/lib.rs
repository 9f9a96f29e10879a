//! Process-backed collaborators: the solver, the worker pool and the
//! lookup of the solver executable for the running platform.

#![forbid(unsafe_code)]

mod pool;
mod resolve;
mod solver;

#[cfg(all(test, unix))]
mod test_scripts;

pub use pool::{DEFAULT_MASTER_HOST, ProcessWorkerPool};
pub use resolve::{ExecutableResolver, PlatformFamily, ResolveError};
pub use solver::ProcessSolver;
