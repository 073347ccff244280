//! Error type shared by the search engine, the aggregation protocol and the
//! solution file I/O.

use std::time::Duration;

use crate::board::MAX_BOARD_SIZE;

/// Which half of the count-then-payload exchange a receive was waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Count,
    Payload,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Count => f.write_str("count"),
            Phase::Payload => f.write_str("payload"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueensError {
    #[error("board size {size} is too large: {size}! does not fit in 64 bits (max {max})")]
    BoardTooLarge { size: usize, max: usize },

    #[error("worker count must be at least 1, got {0}")]
    InvalidWorkerCount(usize),

    #[error("rank {rank} is out of range for {workers} workers")]
    InvalidRank { rank: usize, workers: usize },

    #[error("timed out after {timeout:?} waiting for {phase} from rank {rank}")]
    RecvTimeout {
        rank: usize,
        phase: Phase,
        timeout: Duration,
    },

    #[error("protocol violation from rank {rank}: {reason}")]
    ProtocolViolation { rank: usize, reason: String },

    #[error("rank {rank} disconnected before sending its results")]
    WorkerDisconnected { rank: usize },

    #[error("rank {rank} was never released to start")]
    StartAborted { rank: usize },

    #[error("worker thread for rank {rank} panicked")]
    WorkerPanicked { rank: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed solution file at line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl QueensError {
    /// Process exit code for this error class.
    ///
    /// 2 is left to clap for usage errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            QueensError::BoardTooLarge { .. }
            | QueensError::InvalidWorkerCount(_)
            | QueensError::InvalidRank { .. } => 3,
            QueensError::RecvTimeout { .. }
            | QueensError::ProtocolViolation { .. }
            | QueensError::WorkerDisconnected { .. }
            | QueensError::StartAborted { .. }
            | QueensError::WorkerPanicked { .. } => 4,
            QueensError::Io(_) | QueensError::Parse { .. } => 5,
        }
    }

    pub(crate) fn board_too_large(size: usize) -> Self {
        QueensError::BoardTooLarge {
            size,
            max: MAX_BOARD_SIZE,
        }
    }

    pub(crate) fn protocol(rank: usize, reason: impl Into<String>) -> Self {
        QueensError::ProtocolViolation {
            rank,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout this crate.
pub type Result<T> = std::result::Result<T, QueensError>;
