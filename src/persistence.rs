//! Solution file I/O.
//!
//! Text format of `solution<N>.txt`: one line per solution, each holding N
//! absolute cell indices (`row * N + column`), every index followed by `;`.
//!
//! ```text
//! 1;7;8;14;
//! 2;4;11;13;
//! ```

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use rustc_hash::FxHashSet;

use crate::board::{cell_coords, format_solution_line, Placement};
use crate::error::{QueensError, Result};
use crate::validator::is_valid;

/// Path of the solution file for a board size inside `dir`.
pub fn solution_path(dir: &Path, board_size: usize) -> PathBuf {
    dir.join(format!("solution{board_size}.txt"))
}

/// Removes a solution file left by a previous run.
///
/// Returns whether a file was actually removed. A missing file is not an
/// error.
pub fn remove_previous(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), "removed previous solution file");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no previous solution file to remove");
            Ok(false)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unable to remove previous solution file");
            Err(e.into())
        }
    }
}

/// Solution file opened at the start of a run and filled once every rank
/// has reported.
///
/// Creating it up front means an unwritable output directory fails the run
/// before any candidate is searched.
#[derive(Debug)]
pub struct SolutionWriter {
    path: PathBuf,
    file: BufWriter<File>,
}

impl SolutionWriter {
    /// Removes any previous file at `path` and creates an empty one.
    pub fn create(path: &Path) -> Result<Self> {
        remove_previous(path)?;
        let file = File::create(path).map_err(|e| {
            warn!(path = %path.display(), error = %e, "unable to create solution file");
            e
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes every solution, one line each, and flushes the file.
    pub fn write_all<'a>(mut self, solutions: impl IntoIterator<Item = &'a [u8]>) -> Result<usize> {
        let mut written = 0;
        for placement in solutions {
            writeln!(self.file, "{}", format_solution_line(placement))?;
            written += 1;
        }
        self.file.flush()?;
        Ok(written)
    }
}

/// Loads all solutions from a solution file written for `board_size`.
pub fn load(path: &Path, board_size: usize) -> Result<Vec<Placement>> {
    let reader = BufReader::new(File::open(path)?);
    let mut solutions = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line?;
        solutions.push(parse_line(&line, board_size, line_index + 1)?);
    }

    Ok(solutions)
}

/// Returns the number of solutions in a file without decoding them.
pub fn count(path: &Path) -> Result<usize> {
    let reader = BufReader::new(File::open(path)?);
    let mut lines = 0;
    for line in reader.lines() {
        line?;
        lines += 1;
    }
    Ok(lines)
}

/// Loads a solution file and checks that every line is a distinct,
/// conflict-free placement. Returns the number of solutions.
pub fn verify(path: &Path, board_size: usize) -> Result<usize> {
    let solutions = load(path, board_size)?;
    let mut seen: FxHashSet<&[u8]> = FxHashSet::default();

    for (line_index, placement) in solutions.iter().enumerate() {
        let reason = if !is_permutation(placement) {
            "two queens share a column"
        } else if !is_valid(placement) {
            "two queens share a diagonal"
        } else if !seen.insert(placement.as_slice()) {
            "solution listed twice"
        } else {
            continue;
        };
        return Err(QueensError::Parse {
            line: line_index + 1,
            reason: reason.to_string(),
        });
    }

    Ok(solutions.len())
}

fn is_permutation(placement: &[u8]) -> bool {
    let mut used = vec![false; placement.len()];
    placement
        .iter()
        .all(|&column| !std::mem::replace(&mut used[column as usize], true))
}

/// Parses one line back into a placement, checking that row `r` holds a
/// cell of row `r`.
fn parse_line(line: &str, board_size: usize, line_number: usize) -> Result<Placement> {
    let parse_error = |reason: String| QueensError::Parse {
        line: line_number,
        reason,
    };

    if board_size == 0 {
        // the empty board's single solution is an empty line
        return if line.is_empty() {
            Ok(Vec::new())
        } else {
            Err(parse_error(format!("expected an empty line, found {line:?}")))
        };
    }

    let body = line
        .strip_suffix(';')
        .ok_or_else(|| parse_error("missing trailing ';'".to_string()))?;

    let mut placement = Vec::with_capacity(board_size);
    for (row, field) in body.split(';').enumerate() {
        let cell: usize = field
            .parse()
            .map_err(|_| parse_error(format!("invalid cell index {field:?}")))?;
        let (cell_row, column) = cell_coords(board_size, cell);
        if cell_row != row {
            return Err(parse_error(format!(
                "cell {cell} is not on row {row} of a {board_size}x{board_size} board"
            )));
        }
        placement.push(column as u8);
    }

    if placement.len() != board_size {
        return Err(parse_error(format!(
            "expected {board_size} cells, found {}",
            placement.len()
        )));
    }

    Ok(placement)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solution_path_embeds_board_size() {
        let path = solution_path(Path::new("out"), 8);
        assert_eq!(path, PathBuf::from("out/solution8.txt"));
    }

    fn save<'a>(path: &Path, solutions: impl IntoIterator<Item = &'a [u8]>) -> Result<usize> {
        SolutionWriter::create(path)?.write_all(solutions)
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 4);
        let solutions = vec![&[1u8, 3, 0, 2][..], &[2, 0, 3, 1][..]];

        assert_eq!(save(&path, solutions).unwrap(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap(), "1;7;8;14;\n2;4;11;13;\n");
        assert_eq!(load(&path, 4).unwrap(), vec![vec![1, 3, 0, 2], vec![2, 0, 3, 1]]);
        assert_eq!(count(&path).unwrap(), 2);
    }

    #[test]
    fn test_save_empty_creates_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 3);
        assert_eq!(save(&path, std::iter::empty()).unwrap(), 0);
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
        assert_eq!(count(&path).unwrap(), 0);
    }

    #[test]
    fn test_empty_board_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 0);
        save(&path, [&[][..]]).unwrap();
        assert_eq!(load(&path, 0).unwrap(), vec![Vec::<u8>::new()]);
    }

    #[test]
    fn test_create_truncates_before_anything_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 4);
        fs::write(&path, "stale\n").unwrap();

        let writer = SolutionWriter::create(&path).unwrap();
        assert_eq!(writer.path(), path.as_path());
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn test_create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(&dir.path().join("missing"), 4);
        let err = SolutionWriter::create(&path).unwrap_err();
        assert!(matches!(err, QueensError::Io(ref e) if e.kind() == ErrorKind::NotFound));
    }

    #[test]
    fn test_verify_accepts_written_solutions() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 4);
        save(&path, [&[1u8, 3, 0, 2][..], &[2, 0, 3, 1][..]]).unwrap();
        assert_eq!(verify(&path, 4).unwrap(), 2);
    }

    #[test]
    fn test_verify_rejects_bad_solutions() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 4);

        // main diagonal
        fs::write(&path, "1;7;8;14;\n0;5;10;15;\n").unwrap();
        assert!(matches!(verify(&path, 4), Err(QueensError::Parse { line: 2, .. })));

        // column 1 used twice
        fs::write(&path, "1;5;8;14;\n").unwrap();
        assert!(matches!(verify(&path, 4), Err(QueensError::Parse { line: 1, .. })));

        fs::write(&path, "1;7;8;14;\n1;7;8;14;\n").unwrap();
        assert!(matches!(verify(&path, 4), Err(QueensError::Parse { line: 2, .. })));
    }

    #[test]
    fn test_remove_previous() {
        let dir = tempfile::tempdir().unwrap();
        let path = solution_path(dir.path(), 5);
        assert!(!remove_previous(&path).unwrap());

        fs::write(&path, "stale\n").unwrap();
        assert!(remove_previous(&path).unwrap());
        assert!(!path.exists());
    }

    #[test]
    fn test_parse_line_rejects_malformed_input() {
        assert!(parse_line("1;7;8;14", 4, 1).is_err());
        assert!(parse_line("1;7;8;", 4, 1).is_err());
        assert!(parse_line("1;x;8;14;", 4, 1).is_err());
        // 9 sits on row 2, not row 1
        let err = parse_line("1;9;8;14;", 4, 7).unwrap_err();
        assert!(matches!(err, QueensError::Parse { line: 7, .. }));
    }
}
