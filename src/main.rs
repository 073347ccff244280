//! N-Queens Solver
//!
//! Places N queens on an N×N board so that no two attack each other, by
//! testing every permutation of columns. The permutation space is split
//! across worker threads; rank 0 collects the results, writes
//! `solution<N>.txt` and prints the elapsed time and the solution count.
//!
//! ```bash
//! RUST_LOG=debug nqueens 8 --workers 4
//! nqueens 8 --count     # solutions in an existing solution8.txt
//! nqueens 8 --verify    # re-check every line of solution8.txt
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use nqueens::config::DEFAULT_RECV_TIMEOUT;
use nqueens::persistence;
use nqueens::{run_search, Result, RunReport, SearchConfig};

/// Enumerates all solutions of the N-queens puzzle across parallel workers.
#[derive(Parser)]
#[command(name = "nqueens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board size N.
    board_size: usize,

    /// Number of worker ranks, coordinator included (defaults to the number
    /// of logical CPUs).
    #[arg(short, long, env = "NQUEENS_WORKERS")]
    workers: Option<usize>,

    /// Directory for the solution file.
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Seconds the coordinator waits for any single result message.
    #[arg(long, default_value_t = DEFAULT_RECV_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Skip writing the solution file.
    #[arg(long)]
    no_output: bool,

    /// Print the number of solutions in an existing solution file instead
    /// of searching.
    #[arg(long, conflicts_with = "verify")]
    count: bool,

    /// Check every solution in an existing solution file instead of
    /// searching.
    #[arg(long)]
    verify: bool,
}

impl Cli {
    fn to_config(&self) -> SearchConfig {
        let mut config = SearchConfig::new(self.board_size)
            .with_recv_timeout(Duration::from_secs(self.timeout_secs))
            .with_output_dir(&self.output_dir)
            .with_output(!self.no_output);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        config
    }

    fn solution_path(&self) -> PathBuf {
        persistence::solution_path(&self.output_dir, self.board_size)
    }
}

fn main() -> ExitCode {
    // logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = if cli.count {
        run_count(&cli)
    } else if cli.verify {
        run_verify(&cli)
    } else {
        run_solver(&cli)
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

/// Runs the distributed search and prints the report.
fn run_solver(cli: &Cli) -> Result<()> {
    let report = run_search(&cli.to_config())?;
    log_worker_stats(&report);
    println!("{}\n", format_report(&report));
    Ok(())
}

/// Prints the count of solutions in an existing solution file.
fn run_count(cli: &Cli) -> Result<()> {
    let count = persistence::count(&cli.solution_path())?;
    println!("{count} solutions");
    Ok(())
}

/// Re-checks every solution in an existing solution file.
fn run_verify(cli: &Cli) -> Result<()> {
    let path = cli.solution_path();
    let count = persistence::verify(&path, cli.board_size)?;
    println!("{count} solutions in {}, all valid", path.display());
    Ok(())
}

fn log_worker_stats(report: &RunReport) {
    for stats in &report.worker_stats {
        debug!(
            rank = stats.rank,
            start = stats.range.start,
            end = stats.range.end,
            candidates = stats.candidates_evaluated,
            solutions = stats.solutions,
            "rank summary"
        );
    }
    debug!(
        board_size = report.board_size,
        workers = report.workers,
        candidates = report.candidates_evaluated(),
        "run summary"
    );
}

/// Formats the elapsed time and total solution count.
fn format_report(report: &RunReport) -> String {
    let seconds = report.elapsed.as_secs_f64();
    format!(
        "Program executed in {:.3} ms ({:.2} sec ~ {:.2} min)\nTotal number of solutions found: {}",
        seconds * 1000.0,
        seconds,
        seconds / 60.0,
        report.total_solutions()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_requires_exactly_one_board_size() {
        assert!(Cli::try_parse_from(["nqueens"]).is_err());
        assert!(Cli::try_parse_from(["nqueens", "8", "9"]).is_err());
        assert!(Cli::try_parse_from(["nqueens", "eight"]).is_err());

        let cli = Cli::try_parse_from(["nqueens", "8", "--workers", "3", "--no-output"]).unwrap();
        let config = cli.to_config();
        assert_eq!(config.board_size, 8);
        assert_eq!(config.workers, 3);
        assert!(!config.write_output);
    }

    #[test]
    fn test_cli_file_modes() {
        let cli = Cli::try_parse_from(["nqueens", "6", "--count", "-o", "out"]).unwrap();
        assert!(cli.count && !cli.verify);
        assert_eq!(cli.solution_path(), PathBuf::from("out/solution6.txt"));

        assert!(Cli::try_parse_from(["nqueens", "6", "--count", "--verify"]).is_err());
    }

    #[test]
    fn test_verify_and_count_read_a_finished_run() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let args = ["nqueens", "6", "--workers", "2", "--output-dir", output_dir];

        run_solver(&Cli::try_parse_from(args).unwrap()).unwrap();

        let mut verify_args = args.to_vec();
        verify_args.push("--verify");
        run_verify(&Cli::try_parse_from(&verify_args).unwrap()).unwrap();

        let mut count_args = args.to_vec();
        count_args.push("--count");
        run_count(&Cli::try_parse_from(&count_args).unwrap()).unwrap();
        assert_eq!(persistence::count(&dir.path().join("solution6.txt")).unwrap(), 4);
    }

    #[test]
    fn test_count_without_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["nqueens", "6", "--count", "-o", output_dir]).unwrap();
        assert_eq!(run_count(&cli).unwrap_err().exit_code(), 5);
    }

    #[test]
    fn test_report_snapshot() {
        let report = RunReport {
            board_size: 4,
            workers: 2,
            solutions: vec![vec![1, 3, 0, 2], vec![2, 0, 3, 1]],
            worker_stats: Vec::new(),
            elapsed: Duration::from_millis(3000),
            output_path: None,
        };

        insta::assert_snapshot!(format_report(&report), @r"
        Program executed in 3000.000 ms (3.00 sec ~ 0.05 min)
        Total number of solutions found: 2
        ");
    }
}
