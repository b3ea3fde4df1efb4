//! Solve history and the analytics computed from it. The solver itself never
//! persists anything; callers hand a [`SolveLog`] to [`record_solve`] after a
//! successful solve.

use crate::{moves::Move, solver::Solution};
use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs::{self, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

/// Solves by this identity are never recorded.
pub const ANONYMOUS: &str = "anonymous";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Could not access the solve history: {0}")]
    Io(#[from] io::Error),
    #[error("Malformed solve record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("Could not encode a solve record: {0}")]
    Encode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveRecord {
    pub id: u64,
    pub identity: String,
    /// The 54 input stickers, in `U L F R B D` order.
    pub start_state: Vec<String>,
    pub solution_steps: Vec<Move>,
    pub solve_time: f64,
    pub moves_count: usize,
    /// Seconds since the unix epoch.
    pub created_at: u64,
}

/// A solve about to be recorded. The log assigns the id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSolve {
    pub identity: String,
    pub start_state: Vec<String>,
    pub solution_steps: Vec<Move>,
    pub solve_time: f64,
    pub moves_count: usize,
}

impl NewSolve {
    fn into_record(self, id: u64) -> SolveRecord {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_secs());
        SolveRecord {
            id,
            identity: self.identity,
            start_state: self.start_state,
            solution_steps: self.solution_steps,
            solve_time: self.solve_time,
            moves_count: self.moves_count,
            created_at,
        }
    }
}

pub trait SolveLog {
    /// # Errors
    ///
    /// Fails if the record cannot be stored.
    fn log_solve(&mut self, solve: NewSolve) -> Result<SolveRecord, HistoryError>;

    /// Every record, oldest first.
    ///
    /// # Errors
    ///
    /// Fails if the records cannot be read.
    fn all(&self) -> Result<Vec<SolveRecord>, HistoryError>;

    /// Returns whether a record was deleted.
    ///
    /// # Errors
    ///
    /// Fails if the log cannot be rewritten.
    fn delete_solve(&mut self, id: u64) -> Result<bool, HistoryError>;

    /// The latest `limit` solves of one identity, newest first.
    ///
    /// # Errors
    ///
    /// Fails if the records cannot be read.
    fn user_solves(&self, identity: &str, limit: usize) -> Result<Vec<SolveRecord>, HistoryError> {
        Ok(self
            .all()?
            .into_iter()
            .filter(|record| record.identity == identity)
            .sorted_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)))
            .take(limit)
            .collect())
    }
}

/// Record a successful solve unless it belongs to the anonymous identity.
///
/// # Errors
///
/// Fails if the log cannot store the record.
pub fn record_solve<S: AsRef<str>>(
    log: &mut dyn SolveLog,
    identity: &str,
    stickers: &[S],
    solution: &Solution,
) -> Result<Option<SolveRecord>, HistoryError> {
    if identity == ANONYMOUS {
        debug!("Not recording an anonymous solve");
        return Ok(None);
    }
    let record = log.log_solve(NewSolve {
        identity: identity.to_owned(),
        start_state: stickers.iter().map(|s| s.as_ref().to_owned()).collect(),
        solution_steps: solution.moves.clone(),
        solve_time: solution.elapsed_seconds,
        moves_count: solution.move_count,
    })?;
    Ok(Some(record))
}

#[derive(Debug)]
pub struct MemoryLog {
    records: Vec<SolveRecord>,
    next_id: u64,
}

impl Default for MemoryLog {
    fn default() -> Self {
        Self {
            records: vec![],
            next_id: 1,
        }
    }
}

impl MemoryLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SolveLog for MemoryLog {
    fn log_solve(&mut self, solve: NewSolve) -> Result<SolveRecord, HistoryError> {
        let record = solve.into_record(self.next_id);
        self.next_id += 1;
        self.records.push(record.clone());
        Ok(record)
    }

    fn all(&self) -> Result<Vec<SolveRecord>, HistoryError> {
        Ok(self.records.clone())
    }

    fn delete_solve(&mut self, id: u64) -> Result<bool, HistoryError> {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        Ok(self.records.len() != before)
    }
}

/// A history file with one JSON record per line. New solves are appended;
/// deletes rewrite the file.
#[derive(Debug)]
pub struct JsonLinesLog {
    path: PathBuf,
    next_id: u64,
}

impl JsonLinesLog {
    /// Open the log at `path`. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Fails if an existing file cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        let next_id = read_records(&path)?
            .iter()
            .map(|record| record.id)
            .max()
            .map_or(1, |max| max + 1);
        Ok(Self { path, next_id })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_records(path: &Path) -> Result<Vec<SolveRecord>, HistoryError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(e.into()),
    };
    let mut records = vec![];
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(
            serde_json::from_str(&line)
                .map_err(|source| HistoryError::Parse { line: i + 1, source })?,
        );
    }
    Ok(records)
}

fn encode_record(record: &SolveRecord) -> Result<String, HistoryError> {
    serde_json::to_string(record).map_err(HistoryError::Encode)
}

impl SolveLog for JsonLinesLog {
    fn log_solve(&mut self, solve: NewSolve) -> Result<SolveRecord, HistoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let record = solve.into_record(self.next_id);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", encode_record(&record)?)?;
        self.next_id += 1;
        debug!("Recorded solve {} for {}", record.id, record.identity);
        Ok(record)
    }

    fn all(&self) -> Result<Vec<SolveRecord>, HistoryError> {
        read_records(&self.path)
    }

    fn delete_solve(&mut self, id: u64) -> Result<bool, HistoryError> {
        let records = read_records(&self.path)?;
        let kept = records.iter().filter(|record| record.id != id).collect_vec();
        if kept.len() == records.len() {
            return Ok(false);
        }
        let mut contents = String::new();
        for record in kept {
            contents.push_str(&encode_record(record)?);
            contents.push('\n');
        }
        fs::write(&self.path, contents)?;
        info!("Deleted solve {id}");
        Ok(true)
    }
}

/// Aggregates shown on a solve dashboard.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SolveStats {
    pub count: usize,
    pub average_moves: f64,
    pub average_time: f64,
    pub best_moves: Option<usize>,
    pub fastest_time: Option<f64>,
}

impl SolveStats {
    #[must_use]
    pub fn from_records(records: &[SolveRecord]) -> Self {
        if records.is_empty() {
            return Self::default();
        }
        let count = records.len();
        let total_moves: usize = records.iter().map(|record| record.moves_count).sum();
        let total_time: f64 = records.iter().map(|record| record.solve_time).sum();
        Self {
            count,
            average_moves: total_moves as f64 / count as f64,
            average_time: total_time / count as f64,
            best_moves: records.iter().map(|record| record.moves_count).min(),
            fastest_time: records
                .iter()
                .map(|record| record.solve_time)
                .min_by(f64::total_cmp),
        }
    }
}

/// What the history knows about one identity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub identity: String,
    /// When the identity's first solve was recorded, in seconds since the
    /// unix epoch.
    pub joined_at: u64,
    pub stats: SolveStats,
}

/// The profile of `identity`, or `None` if it has no recorded solves.
#[must_use]
pub fn user_profile(records: &[SolveRecord], identity: &str) -> Option<UserProfile> {
    let own = records
        .iter()
        .filter(|record| record.identity == identity)
        .cloned()
        .collect_vec();
    Some(UserProfile {
        identity: identity.to_owned(),
        joined_at: own.iter().map(|record| record.created_at).min()?,
        stats: SolveStats::from_records(&own),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub identity: String,
    pub solves: usize,
    pub average_moves: f64,
}

/// Identities ranked by average solution length, fewest moves first. Ties go
/// to the identity with more solves, then alphabetically.
#[must_use]
pub fn leaderboard(records: &[SolveRecord], limit: usize) -> Vec<LeaderboardEntry> {
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    for record in records {
        let (solves, moves) = totals.entry(&record.identity).or_default();
        *solves += 1;
        *moves += record.moves_count;
    }
    totals
        .into_iter()
        .map(|(identity, (solves, moves))| LeaderboardEntry {
            identity: identity.to_owned(),
            solves,
            average_moves: moves as f64 / solves as f64,
        })
        .sorted_by(|a, b| {
            a.average_moves
                .total_cmp(&b.average_moves)
                .then(b.solves.cmp(&a.solves))
                .then_with(|| a.identity.cmp(&b.identity))
        })
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::parse_moves;

    fn solution(moves: &str, elapsed_seconds: f64) -> Solution {
        let moves = parse_moves(moves).unwrap();
        Solution {
            move_count: moves.len(),
            moves,
            elapsed_seconds,
        }
    }

    fn stickers() -> Vec<String> {
        vec!["W".to_owned(); 54]
    }

    fn fill(log: &mut dyn SolveLog) {
        record_solve(log, "alice", &stickers(), &solution("R U", 0.5)).unwrap();
        record_solve(log, "bob", &stickers(), &solution("R U F", 0.25)).unwrap();
        record_solve(log, "alice", &stickers(), &solution("R U F L", 1.5)).unwrap();
        record_solve(log, "bob", &stickers(), &solution("R", 0.75)).unwrap();
    }

    #[test]
    fn anonymous_solves_are_not_recorded() {
        let mut log = MemoryLog::new();
        let recorded = record_solve(&mut log, ANONYMOUS, &stickers(), &solution("U'", 0.1));
        assert_eq!(recorded.unwrap(), None);
        assert!(log.all().unwrap().is_empty());
    }

    #[test]
    fn user_solves_newest_first_with_limit() {
        let mut log = MemoryLog::new();
        fill(&mut log);
        let alice = log.user_solves("alice", 10).unwrap();
        assert_eq!(alice.iter().map(|r| r.moves_count).collect_vec(), [4, 2]);
        assert_eq!(log.user_solves("bob", 1).unwrap()[0].moves_count, 1);
        assert!(log.user_solves("carol", 10).unwrap().is_empty());
    }

    #[test]
    fn delete_removes_one_record() {
        let mut log = MemoryLog::new();
        fill(&mut log);
        assert!(log.delete_solve(2).unwrap());
        assert!(!log.delete_solve(2).unwrap());
        assert_eq!(log.all().unwrap().iter().map(|r| r.id).collect_vec(), [1, 3, 4]);
    }

    #[test]
    fn deleted_ids_are_not_handed_out_again() {
        fn record(log: &mut MemoryLog, moves: &str) -> u64 {
            record_solve(log, "alice", &stickers(), &solution(moves, 0.1))
                .unwrap()
                .unwrap()
                .id
        }

        let mut log = MemoryLog::new();
        let a = record(&mut log, "R");
        let b = record(&mut log, "U");
        assert!(log.delete_solve(b).unwrap());
        let c = record(&mut log, "F");
        assert_eq!((a, b, c), (1, 2, 3));
        assert!(!log.delete_solve(b).unwrap());
        assert_eq!(log.all().unwrap().len(), 2);
    }

    #[test]
    fn json_lines_log_persists_across_opens() {
        let dir = std::env::temp_dir().join(format!("twophase-history-{}", std::process::id()));
        let path = dir.join("solves.jsonl");
        let _ = fs::remove_dir_all(&dir);

        let mut log = JsonLinesLog::open(&path).unwrap();
        assert!(log.all().unwrap().is_empty());
        fill(&mut log);
        assert!(log.delete_solve(1).unwrap());

        let mut reopened = JsonLinesLog::open(&path).unwrap();
        let record = record_solve(&mut reopened, "carol", &stickers(), &solution("F2", 0.1))
            .unwrap()
            .unwrap();
        assert_eq!(record.id, 5);
        let all = reopened.all().unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[3].solution_steps, parse_moves("F2").unwrap());

        fs::write(&path, "{not json}\n").unwrap();
        assert!(matches!(
            JsonLinesLog::open(&path),
            Err(HistoryError::Parse { line: 1, .. })
        ));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn stats_and_leaderboard() {
        let mut log = MemoryLog::new();
        fill(&mut log);
        let records = log.all().unwrap();

        let stats = SolveStats::from_records(&records);
        assert_eq!(stats.count, 4);
        assert!((stats.average_moves - 2.5).abs() < 1e-9);
        assert!((stats.average_time - 0.75).abs() < 1e-9);
        assert_eq!(stats.best_moves, Some(1));
        assert_eq!(stats.fastest_time, Some(0.25));
        assert_eq!(SolveStats::from_records(&[]), SolveStats::default());

        let board = leaderboard(&records, 10);
        assert_eq!(board.iter().map(|e| e.identity.as_str()).collect_vec(), ["bob", "alice"]);
        assert!((board[0].average_moves - 2.0).abs() < 1e-9);
        assert_eq!(leaderboard(&records, 1).len(), 1);
    }

    #[test]
    fn profiles_come_from_the_history() {
        let mut log = MemoryLog::new();
        fill(&mut log);
        let records = log.all().unwrap();

        let alice = user_profile(&records, "alice").unwrap();
        assert_eq!(alice.identity, "alice");
        assert_eq!(alice.stats.count, 2);
        assert_eq!(alice.stats.best_moves, Some(2));
        assert_eq!(alice.joined_at, records[0].created_at);
        assert_eq!(user_profile(&records, "carol"), None);
    }
}
