//! Result channels between workers and the coordinator.
//!
//! Each rank owns a dedicated channel to the coordinator. That lets the
//! coordinator drain ranks strictly in order no matter which worker finishes
//! first: it simply blocks on rank 0's receiver, then rank 1's, and so on.
//!
//! A worker reports in two messages: a [`WorkerMessage::Count`] and, only if
//! that count is non-zero, a [`WorkerMessage::Payload`] holding
//! `count * board_size` columns.

use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};

use crate::error::{Phase, QueensError, Result};
use crate::solver::SolutionBatch;

/// Message sent from a worker to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerMessage {
    /// Number of solutions the worker found.
    Count { rank: usize, count: usize },
    /// Flattened placements, in discovery order.
    Payload { rank: usize, columns: Vec<u8> },
}

impl WorkerMessage {
    pub fn rank(&self) -> usize {
        match self {
            WorkerMessage::Count { rank, .. } | WorkerMessage::Payload { rank, .. } => *rank,
        }
    }
}

/// Channel endpoint held by a worker.
#[derive(Debug, Clone)]
pub struct WorkerChannel {
    pub rank: usize,
    pub to_coordinator: Sender<WorkerMessage>,
}

impl WorkerChannel {
    /// Sends the count, then the payload if there is anything to send.
    ///
    /// A send only fails when the coordinator has already gone away, in which
    /// case nobody is left to report to.
    pub fn send_batch(&self, batch: SolutionBatch) -> Result<()> {
        let count = batch.len();
        self.send(WorkerMessage::Count {
            rank: self.rank,
            count,
        })?;
        if count > 0 {
            self.send(WorkerMessage::Payload {
                rank: self.rank,
                columns: batch.into_columns(),
            })?;
        }
        Ok(())
    }

    fn send(&self, message: WorkerMessage) -> Result<()> {
        self.to_coordinator
            .send(message)
            .map_err(|_| QueensError::WorkerDisconnected { rank: self.rank })
    }
}

/// Receiving side of every rank's channel, indexed by rank.
#[derive(Debug)]
pub struct CoordinatorChannels {
    pub from_workers: Vec<Receiver<WorkerMessage>>,
}

impl CoordinatorChannels {
    pub fn workers(&self) -> usize {
        self.from_workers.len()
    }

    /// Blocks until rank `rank` sends its next message, or `timeout` elapses.
    pub fn recv(&self, rank: usize, phase: Phase, timeout: Duration) -> Result<WorkerMessage> {
        let receiver = self
            .from_workers
            .get(rank)
            .ok_or(QueensError::InvalidRank {
                rank,
                workers: self.from_workers.len(),
            })?;

        match receiver.recv_timeout(timeout) {
            Ok(message) => Ok(message),
            Err(RecvTimeoutError::Timeout) => Err(QueensError::RecvTimeout {
                rank,
                phase,
                timeout,
            }),
            Err(RecvTimeoutError::Disconnected) => Err(QueensError::WorkerDisconnected { rank }),
        }
    }
}

/// Creates one result channel per rank.
pub fn create_channels(workers: usize) -> (CoordinatorChannels, Vec<WorkerChannel>) {
    let mut from_workers = Vec::with_capacity(workers);
    let mut worker_channels = Vec::with_capacity(workers);

    for rank in 0..workers {
        // unbounded so a worker never blocks on the coordinator, including
        // rank 0 which sends to itself before it starts draining
        let (tx, rx) = unbounded();
        from_workers.push(rx);
        worker_channels.push(WorkerChannel {
            rank,
            to_coordinator: tx,
        });
    }

    (CoordinatorChannels { from_workers }, worker_channels)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_millis(50);

    #[test]
    fn test_create_channels() {
        let (coordinator, workers) = create_channels(3);
        assert_eq!(coordinator.workers(), 3);
        let ranks: Vec<usize> = workers.iter().map(|w| w.rank).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn test_send_batch_sends_count_then_payload() {
        let (coordinator, workers) = create_channels(2);
        let mut batch = SolutionBatch::new(4);
        batch.push(&[1, 3, 0, 2]);
        workers[1].send_batch(batch).unwrap();

        let count = coordinator.recv(1, Phase::Count, SHORT).unwrap();
        assert_eq!(count, WorkerMessage::Count { rank: 1, count: 1 });
        let payload = coordinator.recv(1, Phase::Payload, SHORT).unwrap();
        assert_eq!(
            payload,
            WorkerMessage::Payload {
                rank: 1,
                columns: vec![1, 3, 0, 2]
            }
        );
    }

    #[test]
    fn test_empty_batch_sends_only_count() {
        let (coordinator, workers) = create_channels(1);
        workers[0].send_batch(SolutionBatch::new(4)).unwrap();

        let count = coordinator.recv(0, Phase::Count, SHORT).unwrap();
        assert_eq!(count, WorkerMessage::Count { rank: 0, count: 0 });
        assert!(matches!(
            coordinator.recv(0, Phase::Payload, SHORT),
            Err(QueensError::RecvTimeout { rank: 0, .. })
        ));
    }

    #[test]
    fn test_dropped_worker_reports_disconnect() {
        let (coordinator, workers) = create_channels(2);
        drop(workers);
        assert!(matches!(
            coordinator.recv(1, Phase::Count, SHORT),
            Err(QueensError::WorkerDisconnected { rank: 1 })
        ));
    }

    #[test]
    fn test_send_after_coordinator_dropped() {
        let (coordinator, workers) = create_channels(1);
        drop(coordinator);
        assert!(matches!(
            workers[0].send_batch(SolutionBatch::new(4)),
            Err(QueensError::WorkerDisconnected { rank: 0 })
        ));
    }
}
