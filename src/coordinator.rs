//! Distributed search run: rank threads, result collection and the solution
//! file.
//!
//! # Flow
//!
//! 1. The coordinator opens the solution file, then one thread per rank is
//!    started; the calling thread becomes rank 0 and holds the
//!    [`Role::Coordinator`] role.
//! 2. All ranks meet at a barrier, then search their own work range with no
//!    further synchronization.
//! 3. Every rank, rank 0 included, reports through its own channel: a count,
//!    then a payload only when the count is non-zero.
//! 4. The coordinator drains ranks `0..W` strictly in order, so the output
//!    order depends only on N and W, never on which rank finished first.
//! 5. The coordinator joins every rank thread and fills the solution file.

use std::path::PathBuf;
use std::sync::{Arc, Barrier};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use crate::board::Placement;
use crate::channel::{create_channels, CoordinatorChannels, WorkerChannel, WorkerMessage};
use crate::config::SearchConfig;
use crate::error::{Phase, QueensError, Result};
use crate::partition::{partition, WorkRange};
use crate::persistence::{self, SolutionWriter};
use crate::solver::{search_range, SolutionBatch};

/// What a rank does besides searching its range.
#[derive(Debug)]
pub enum Role {
    /// Collects every rank's batch.
    Coordinator(CoordinatorChannels),
    /// Searches and reports, nothing else.
    Worker,
}

/// Per-rank statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    pub rank: usize,
    pub range: WorkRange,
    pub candidates_evaluated: u64,
    pub solutions: usize,
}

/// Everything the coordinator learned from one run.
#[derive(Debug)]
pub struct RunReport {
    pub board_size: usize,
    pub workers: usize,
    /// Solutions in rank order, then discovery order within each rank.
    pub solutions: Vec<Placement>,
    pub worker_stats: Vec<WorkerStats>,
    pub elapsed: Duration,
    pub output_path: Option<PathBuf>,
}

impl RunReport {
    pub fn total_solutions(&self) -> usize {
        self.solutions.len()
    }

    pub fn candidates_evaluated(&self) -> u64 {
        self.worker_stats.iter().map(|s| s.candidates_evaluated).sum()
    }
}

/// Batches collected from every rank, in rank order.
#[derive(Debug, Default)]
pub struct Aggregation {
    pub batches: Vec<SolutionBatch>,
}

impl Aggregation {
    pub fn total(&self) -> usize {
        self.batches.iter().map(SolutionBatch::len).sum()
    }

    /// Every placement, rank by rank.
    pub fn placements(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.batches.iter().flat_map(|batch| batch.placements())
    }
}

/// One rank of the run.
struct Rank {
    rank: usize,
    workers: usize,
    board_size: usize,
    /// Released once every rank thread exists; closed without a signal if
    /// spawning failed. The coordinator has none.
    start_gate: Option<Receiver<()>>,
    barrier: Arc<Barrier>,
    channel: WorkerChannel,
    role: Role,
}

/// What a rank hands back when it is done.
struct RankRun {
    stats: WorkerStats,
    /// Set only for the coordinator.
    aggregation: Option<Aggregation>,
    started: Instant,
}

impl Rank {
    /// Waits at the start barrier, searches, reports, and, for the
    /// coordinator, collects every rank's results.
    fn run(self, timeout: Duration) -> Result<RankRun> {
        if let Some(gate) = &self.start_gate {
            gate.recv()
                .map_err(|_| QueensError::StartAborted { rank: self.rank })?;
        }

        debug!(rank = self.rank, "waiting at start barrier");
        self.barrier.wait();
        let started = Instant::now();

        let stats = self.search_and_report()?;

        let aggregation = match &self.role {
            Role::Coordinator(channels) => Some(aggregate(channels, self.board_size, timeout)?),
            Role::Worker => None,
        };

        Ok(RankRun {
            stats,
            aggregation,
            started,
        })
    }

    fn search_and_report(&self) -> Result<WorkerStats> {
        let range = partition(self.board_size, self.workers, self.rank)?;
        info!(
            rank = self.rank,
            start = range.start,
            end = range.end,
            "started calculations"
        );

        let outcome = search_range(self.board_size, range);
        let stats = WorkerStats {
            rank: self.rank,
            range,
            candidates_evaluated: outcome.candidates_evaluated,
            solutions: outcome.batch.len(),
        };

        self.channel.send_batch(outcome.batch)?;
        debug!(rank = self.rank, solutions = stats.solutions, "results sent");
        Ok(stats)
    }
}

/// Runs the whole distributed search described by `config`.
pub fn run_search(config: &SearchConfig) -> Result<RunReport> {
    config.validate()?;

    // the coordinator owns the file; opening it first means a bad output
    // directory fails the run before any candidate is searched
    let output = if config.write_output {
        let path = persistence::solution_path(&config.output_dir, config.board_size);
        Some(SolutionWriter::create(&path)?)
    } else {
        None
    };

    let workers = config.workers;
    let barrier = Arc::new(Barrier::new(workers));
    let (coordinator_channels, mut worker_channels) = create_channels(workers);
    let (gate_tx, gate_rx) = unbounded::<()>();

    // rank 0 stays on this thread
    let own_channel = worker_channels.remove(0);
    let mut handles: Vec<(usize, JoinHandle<Result<WorkerStats>>)> =
        Vec::with_capacity(workers - 1);

    for channel in worker_channels {
        let rank = channel.rank;
        let worker = Rank {
            rank,
            workers,
            board_size: config.board_size,
            start_gate: Some(gate_rx.clone()),
            barrier: Arc::clone(&barrier),
            channel,
            role: Role::Worker,
        };
        let timeout = config.recv_timeout;
        // on failure gate_tx is dropped unsent, so spawned ranks exit instead
        // of waiting at the barrier
        let handle = thread::Builder::new()
            .name(format!("queens-rank-{rank}"))
            .spawn(move || worker.run(timeout).map(|run| run.stats))?;
        handles.push((rank, handle));
    }

    for _ in &handles {
        // cannot fail: gate_rx is still alive
        let _ = gate_tx.send(());
    }
    drop(gate_rx);

    let coordinator = Rank {
        rank: 0,
        workers,
        board_size: config.board_size,
        start_gate: None,
        barrier,
        channel: own_channel,
        role: Role::Coordinator(coordinator_channels),
    };

    let RankRun {
        stats: own_stats,
        aggregation,
        started,
    } = coordinator.run(config.recv_timeout)?;
    let aggregation = aggregation.unwrap_or_default();

    let mut worker_stats = Vec::with_capacity(workers);
    worker_stats.push(own_stats);
    for (rank, handle) in handles {
        let stats = handle
            .join()
            .map_err(|_| QueensError::WorkerPanicked { rank })??;
        worker_stats.push(stats);
    }

    let output_path = match output {
        Some(writer) => {
            let path = writer.path().to_path_buf();
            let written = writer.write_all(aggregation.placements())?;
            info!(path = %path.display(), solutions = written, "solution file written");
            Some(path)
        }
        None => None,
    };

    let elapsed = started.elapsed();
    let solutions: Vec<Placement> = aggregation.placements().map(<[u8]>::to_vec).collect();

    info!(
        board_size = config.board_size,
        workers,
        total = solutions.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "search finished"
    );

    Ok(RunReport {
        board_size: config.board_size,
        workers,
        solutions,
        worker_stats,
        elapsed,
        output_path,
    })
}

/// Collects every rank's count and payload, strictly in rank order.
///
/// A rank reporting zero solutions sends no payload, and the coordinator moves
/// straight on to the next rank.
pub fn aggregate(
    channels: &CoordinatorChannels,
    board_size: usize,
    timeout: Duration,
) -> Result<Aggregation> {
    let mut aggregation = Aggregation {
        batches: Vec::with_capacity(channels.workers()),
    };
    let mut seen: FxHashSet<Placement> = FxHashSet::default();

    for rank in 0..channels.workers() {
        debug!(rank, "waiting for count");
        let count = match expect_from(rank, channels.recv(rank, Phase::Count, timeout)?)? {
            WorkerMessage::Count { count, .. } => count,
            WorkerMessage::Payload { .. } => {
                return Err(QueensError::protocol(rank, "payload arrived before count"));
            }
        };
        debug!(rank, count, "received count");

        let batch = if count == 0 {
            SolutionBatch::new(board_size)
        } else {
            debug!(rank, "waiting for payload");
            let columns = match expect_from(rank, channels.recv(rank, Phase::Payload, timeout)?)? {
                WorkerMessage::Payload { columns, .. } => columns,
                WorkerMessage::Count { .. } => {
                    return Err(QueensError::protocol(rank, "second count instead of payload"));
                }
            };
            receive_batch(rank, board_size, count, columns)?
        };

        for placement in batch.placements() {
            if !seen.insert(placement.to_vec()) {
                return Err(QueensError::protocol(
                    rank,
                    format!("placement {placement:?} reported twice"),
                ));
            }
        }

        aggregation.batches.push(batch);
    }

    Ok(aggregation)
}

/// Rejects a message on rank `rank`'s channel that carries another rank's tag.
fn expect_from(rank: usize, message: WorkerMessage) -> Result<WorkerMessage> {
    if message.rank() != rank {
        return Err(QueensError::protocol(
            rank,
            format!("message tagged with rank {}", message.rank()),
        ));
    }
    Ok(message)
}

/// Checks a received payload against its declared count.
fn receive_batch(
    rank: usize,
    board_size: usize,
    count: usize,
    columns: Vec<u8>,
) -> Result<SolutionBatch> {
    let received = columns.len();
    if let Some(&column) = columns.iter().find(|&&c| c as usize >= board_size) {
        return Err(QueensError::protocol(
            rank,
            format!("column {column} outside a {board_size}-wide board"),
        ));
    }
    SolutionBatch::from_parts(board_size, count, columns).ok_or_else(|| {
        QueensError::protocol(
            rank,
            format!(
                "declared {count} solutions of {board_size} columns, received {received} values"
            ),
        )
    })
}
