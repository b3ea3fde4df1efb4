use crate::{
    config::SolverConfig,
    cube::{CubeState, InvalidConfiguration},
    facelet::{self, FaceletError, ValidationError},
    moves::{Move, format_moves},
    search::{SearchError, TwoPhaseSearch},
    tables::Tables,
};
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::{
    sync::{Arc, atomic::AtomicBool},
    time::Instant,
};
use thiserror::Error;

/// A solved cube, in the shape handed back to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub moves: Vec<Move>,
    pub move_count: usize,
    pub elapsed_seconds: f64,
}

impl Solution {
    #[must_use]
    pub fn notation(&self) -> String {
        format_moves(&self.moves)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SolveError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidConfiguration(#[from] InvalidConfiguration),
    #[error("Internal solver error: {0}")]
    Internal(#[from] SearchError),
}

/// Who is at fault for a failed solve.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The input does not describe a solvable cube.
    ClientError,
    /// The input was fine but the solver could not finish.
    InternalError,
}

impl SolveError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            SolveError::Validation(_) | SolveError::InvalidConfiguration(_) => {
                ErrorKind::ClientError
            }
            SolveError::Internal(_) => ErrorKind::InternalError,
        }
    }
}

impl From<FaceletError> for SolveError {
    fn from(e: FaceletError) -> Self {
        match e {
            FaceletError::Validation(e) => SolveError::Validation(e),
            FaceletError::InvalidConfiguration(e) => SolveError::InvalidConfiguration(e),
        }
    }
}

/// Solves cubes against a shared set of tables. Cheap to clone; every solve
/// gets its own search frame, so one `Solver` can serve many threads.
#[derive(Debug, Clone)]
pub struct Solver {
    tables: Arc<Tables>,
    config: SolverConfig,
}

impl Solver {
    #[must_use]
    pub fn new(tables: Arc<Tables>, config: SolverConfig) -> Self {
        Self { tables, config }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[must_use]
    pub fn tables(&self) -> &Arc<Tables> {
        &self.tables
    }

    /// Solve a cube given as 54 sticker colors in U, L, F, R, B, D face order.
    ///
    /// # Errors
    ///
    /// Client errors for stickers that do not describe a reachable cube,
    /// internal errors if the search gives up.
    pub fn solve<S: AsRef<str>>(&self, stickers: &[S]) -> Result<Solution, SolveError> {
        let started = Instant::now();
        let state = facelet::parse(stickers)?;
        self.run(&state, None, started)
    }

    /// # Errors
    ///
    /// See [`Solver::solve`].
    pub fn solve_state(&self, state: &CubeState) -> Result<Solution, SolveError> {
        self.solve_state_with_cancel(state, None)
    }

    /// Like [`Solver::solve_state`], but gives up with
    /// [`SearchError::Cancelled`] once `cancel` is raised.
    ///
    /// # Errors
    ///
    /// See [`Solver::solve`].
    pub fn solve_state_with_cancel(
        &self,
        state: &CubeState,
        cancel: Option<&AtomicBool>,
    ) -> Result<Solution, SolveError> {
        let started = Instant::now();
        state.verify()?;
        self.run(state, cancel, started)
    }

    fn run(
        &self,
        state: &CubeState,
        cancel: Option<&AtomicBool>,
        started: Instant,
    ) -> Result<Solution, SolveError> {
        let outcome = TwoPhaseSearch::new(&self.tables, &self.config)
            .search(state, cancel)
            .inspect_err(|e| match e {
                SearchError::Cancelled => debug!("{e}"),
                _ => error!("{e} for {}", facelet::to_facelet_string(state)),
            })?;

        Ok(Solution {
            move_count: outcome.moves.len(),
            moves: outcome.moves,
            elapsed_seconds: started.elapsed().as_secs_f64(),
        })
    }
}
