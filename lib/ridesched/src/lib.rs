use std::fmt;
use std::path::Path;
use fnv::{FnvHashMap, FnvHashSet};

pub mod data;
pub mod feasibility;
pub mod mip;
pub mod encoder;
pub mod solver;
pub mod routes;
pub mod verify;
pub mod simulate;
pub mod pipeline;

pub type Map<K, V> = FnvHashMap<K, V>;
pub type Set<T> = FnvHashSet<T>;

pub use solver::SolveStatus;

/// Terminal failures of a run after the instance has been loaded.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The solver finished but has no assignment to offer.
    NoSolution(SolveStatus),
    /// The solver layer itself failed.
    Solver(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::NoSolution(status) => write!(f, "no solution available (solver status {:?})", status),
            Error::Solver(msg) => write!(f, "solver error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}


mod logging_setup {
    use super::*;
    use anyhow::Result;
    use tracing_subscriber::{EnvFilter, fmt, registry, prelude::*};
    use tracing_appender::{non_blocking, non_blocking::WorkerGuard};
    use std::fs::OpenOptions;

    fn build_and_set_global_subscriber<P>(logfile: Option<P>, is_test : bool) -> Result<Option<WorkerGuard>> where
        P : AsRef<Path>
    {
        let stderr_log = fmt::layer().with_writer(std::io::stderr);
        let env_filter = EnvFilter::from_default_env();
        let r = registry().with(stderr_log).with(env_filter);

        let flush_guard = match logfile {
            Some(p) => {
                let logfile = OpenOptions::new()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(p)?;
                let (writer, _guard) = non_blocking::NonBlockingBuilder::default()
                    .lossy(false)
                    .finish(logfile);
                let json = fmt::layer()
                    .json()
                    .with_span_list(true)
                    .with_current_span(false)
                    .with_writer(writer);

                let r = r.with(json);
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                Some(_guard)
            },
            None => {
                if is_test { r.try_init().ok(); }
                else { r.try_init()?; }
                None
            }
        };
        return Ok(flush_guard)
    }

    /// Installs the global subscriber: `RUST_LOG`-filtered events on stderr, plus a JSON
    /// copy in `logfile` if given.  Keep the returned guard alive until exit.
    pub fn init_logging(logfile: Option<impl AsRef<Path>>) -> Result<Option<WorkerGuard>> {
        return build_and_set_global_subscriber(logfile, false);
    }

    #[allow(dead_code)]
    pub(crate) fn init_test_logging(logfile: Option<impl AsRef<Path>>) -> Option<WorkerGuard> {
        return build_and_set_global_subscriber(logfile, true).ok().flatten();
    }
}
pub use logging_setup::*;
