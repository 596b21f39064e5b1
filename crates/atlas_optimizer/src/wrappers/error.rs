use std::io;

#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    #[error("{solver} cannot solve this problem: assertion {assertion} failed")]
    Assertion {
        solver: &'static str,
        assertion: &'static str,
    },
    #[error("executable does not exist: {0}")]
    ExecutableMissing(String),
    #[error("SIGKILL received: manual intervention or oom-killer [OUT-OF-MEMORY]")]
    OutOfMemory,
    #[error("solver terminated with unknown status: {0}")]
    Unknown(String),
    #[error("cannot encode problem: {0}")]
    Encode(String),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Failure to read a solver result payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid protobuf result: {0}")]
    Protobuf(#[from] prost::DecodeError),
    #[error("invalid json result: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read result file: {0}")]
    Io(#[from] io::Error),
    #[error("result references unknown job {0}")]
    UnknownJob(i64),
    #[error("result has more routes than vehicles ({0})")]
    UnknownVehicle(usize),
}
