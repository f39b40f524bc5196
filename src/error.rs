//! Error kinds, mirroring the `enum error` in `barnes-hut/common.h` plus the
//! `ENOMEM`/`BHE_EARLY_EXIT` returns scattered through the original `main.c`.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("arena exhausted")]
    OutOfMemory,

    #[error("bad option: {0}")]
    BadOption(String),

    #[error("early exit")]
    EarlyExit,

    #[error("visualization error: {0}")]
    RenderError(String),

    #[error("failed to spawn worker thread: {0}")]
    ThreadSpawnFailed(#[source] std::io::Error),
}

impl Error {
    /// Process exit code for this error, per the CLI contract in the spec's
    /// external-interfaces section.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::OutOfMemory => 12,      // ENOMEM
            Error::BadOption(_) => 22,     // EINVAL
            Error::EarlyExit => 0,
            Error::RenderError(_) => 1,
            Error::ThreadSpawnFailed(_) => 1,
        }
    }
}
