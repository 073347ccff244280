//! Configuration for a distributed search run.

use std::path::PathBuf;
use std::time::Duration;

use crate::board::validate_board_size;
use crate::error::{QueensError, Result};

/// Default time the coordinator waits for any single message.
pub const DEFAULT_RECV_TIMEOUT: Duration = Duration::from_secs(300);

/// Configuration for a search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Board size N.
    pub board_size: usize,
    /// Number of worker ranks, the coordinator included.
    pub workers: usize,
    /// How long the coordinator waits for each count or payload message.
    pub recv_timeout: Duration,
    /// Directory receiving `solution<N>.txt`.
    pub output_dir: PathBuf,
    /// Whether the solution file is written at all.
    pub write_output: bool,
}

impl SearchConfig {
    /// Creates a config for `board_size` with one worker per logical CPU.
    pub fn new(board_size: usize) -> Self {
        Self {
            board_size,
            workers: num_cpus::get().max(1),
            recv_timeout: DEFAULT_RECV_TIMEOUT,
            output_dir: PathBuf::from("."),
            write_output: true,
        }
    }

    /// Set the number of worker ranks.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the per-message receive timeout.
    pub fn with_recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = timeout;
        self
    }

    /// Set the directory for the solution file.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Enable or disable writing the solution file.
    pub fn with_output(mut self, enabled: bool) -> Self {
        self.write_output = enabled;
        self
    }

    /// Checks the board size and worker count before anything is spawned.
    pub fn validate(&self) -> Result<()> {
        validate_board_size(self.board_size)?;
        if self.workers == 0 {
            return Err(QueensError::InvalidWorkerCount(self.workers));
        }
        Ok(())
    }
}
