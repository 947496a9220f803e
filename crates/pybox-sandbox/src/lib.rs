//! Isolated execution of vetted Python snippets
//!
//! Every snippet runs in its own short-lived interpreter process with a
//! hard wall-clock deadline. The isolation here is process-level only:
//! `python -I`, a fresh temp file per run, and a forceful kill at the
//! deadline. No namespaces, no cgroups -- the import denylist upstream is
//! what keeps dangerous capabilities out of reach, and the timeout is what
//! keeps the host from being starved. Neither alone is sufficient.

mod runner;

pub use runner::{RunOutput, Sandbox, SandboxConfig};

/// Internal failures while staging or supervising a run.
///
/// These never reach the caller as errors: [`Sandbox::run`] folds them into
/// the `stderr` field of the result so the response shape stays uniform.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("failed to stage snippet artifact: {0}")]
    Stage(std::io::Error),

    #[error("failed to spawn interpreter '{python}': {source}")]
    Spawn {
        python: String,
        source: std::io::Error,
    },

    #[error("failed waiting for interpreter: {0}")]
    Wait(std::io::Error),
}

pub type Result<T> = std::result::Result<T, SandboxError>;
