use crate::{
    canonical::{CANONICAL_FSM, CanonicalFsmState},
    config::{SearchStrategy, SolverConfig},
    coord::{Phase1Coords, Phase2Coords},
    cube::CubeState,
    moves::{DOMINO_MOVES, Move},
    start, success,
    tables::Tables,
    working,
};
use log::{Level, debug, info, log_enabled};
use std::{
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};
use thiserror::Error;

/// How often, in expanded nodes, the deadlines and the cancellation flag are
/// checked.
const CHECK_INTERVAL: u64 = 1024;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("No phase 1 solution within {max_depth} moves")]
    PhaseOneExhausted { max_depth: usize },
    #[error("No solution within {max_length} moves before the search ended")]
    NoSolutionFound { max_length: usize },
    #[error("The search was cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub moves: Vec<Move>,
    /// Length of the phase 1 prefix of `moves`.
    pub phase1_length: usize,
    pub nodes_visited: u64,
    pub phase1_solutions: u64,
    pub attempts: u64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Found,
    Stop,
}

/// Everything one solve mutates. Lives for exactly one call to
/// [`TwoPhaseSearch::search`].
struct SearchFrame<'a> {
    start: CubeState,
    cancel: Option<&'a AtomicBool>,
    started: Instant,
    /// When the first solution was found. Refinement time counts from here.
    refining_since: Option<Instant>,
    moves: Vec<Move>,
    best: Option<(Vec<Move>, usize)>,
    /// Total move budget, tightened to one less than the best solution.
    max_length: usize,
    nodes_visited: u64,
    phase1_solutions: u64,
    attempts: u64,
    cancelled: bool,
}

pub struct TwoPhaseSearch<'a> {
    tables: &'a Tables,
    config: &'a SolverConfig,
}

impl<'a> TwoPhaseSearch<'a> {
    #[must_use]
    pub fn new(tables: &'a Tables, config: &'a SolverConfig) -> Self {
        Self { tables, config }
    }

    fn phase1_heuristic(&self, coords: Phase1Coords) -> usize {
        let tables = self.tables;
        usize::from(
            tables
                .slice_twist
                .distance(coords.slice, coords.twist)
                .max(tables.slice_flip.distance(coords.slice, coords.flip)),
        )
    }

    fn phase2_heuristic(&self, coords: Phase2Coords) -> usize {
        let tables = self.tables;
        usize::from(
            tables
                .corner_slice_perm
                .distance(coords.corner_perm, coords.slice_edge_perm)
                .max(
                    tables
                        .ud_edge_slice_perm
                        .distance(coords.ud_edge_perm, coords.slice_edge_perm),
                ),
        )
    }

    /// Counts a node and reports whether the search must stop now.
    fn expand(&self, frame: &mut SearchFrame) -> bool {
        frame.nodes_visited += 1;
        if frame.nodes_visited % CHECK_INTERVAL != 0 {
            return false;
        }
        if frame.cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed)) {
            frame.cancelled = true;
            return true;
        }
        match frame.refining_since {
            Some(since) => since.elapsed() >= self.config.timeout(),
            None => self
                .config
                .hard_timeout()
                .is_some_and(|hard_timeout| frame.started.elapsed() >= hard_timeout),
        }
    }

    fn phase1(
        &self,
        frame: &mut SearchFrame,
        coords: Phase1Coords,
        fsm_state: CanonicalFsmState,
        togo: usize,
    ) -> Flow {
        if togo == 0 {
            // A path ending in a domino move repeats a shorter phase 1
            // solution.
            if coords.is_goal() && frame.moves.last().is_none_or(|last| !last.is_domino()) {
                return self.phase2_start(frame, fsm_state);
            }
            return Flow::Continue;
        }

        let tables = self.tables;
        for move_ in Move::ALL {
            let Some(next_fsm_state) = CANONICAL_FSM.next_state(fsm_state, move_.face()) else {
                continue;
            };
            let next = Phase1Coords {
                twist: tables.twist.apply(coords.twist, move_),
                flip: tables.flip.apply(coords.flip, move_),
                slice: tables.slice.apply(coords.slice, move_),
            };
            if self.phase1_heuristic(next) >= togo {
                continue;
            }

            if self.expand(frame) {
                return Flow::Stop;
            }
            frame.moves.push(move_);
            let flow = self.phase1(frame, next, next_fsm_state, togo - 1);
            frame.moves.pop();
            if flow == Flow::Stop {
                return flow;
            }
        }
        Flow::Continue
    }

    /// Run phase 2 from the end of the current phase 1 path.
    fn phase2_start(&self, frame: &mut SearchFrame, fsm_state: CanonicalFsmState) -> Flow {
        frame.phase1_solutions += 1;
        let depth1 = frame.moves.len();
        if depth1 > frame.max_length {
            return Flow::Continue;
        }

        let state = frame.start.apply_moves(&frame.moves);
        let coords = Phase2Coords::from_state(&state);
        let budget = (frame.max_length - depth1).min(self.config.max_phase2_depth);
        frame.attempts += 1;

        for depth2 in self.phase2_heuristic(coords)..=budget {
            match self.phase2(frame, coords, fsm_state, depth2) {
                Flow::Continue => {}
                Flow::Found => return self.after_solution(frame, depth1),
                Flow::Stop => return Flow::Stop,
            }
        }

        if frame.best.is_some() && self.attempts_exhausted(frame) {
            return Flow::Stop;
        }
        Flow::Continue
    }

    fn phase2(
        &self,
        frame: &mut SearchFrame,
        coords: Phase2Coords,
        fsm_state: CanonicalFsmState,
        togo: usize,
    ) -> Flow {
        if togo == 0 {
            return if coords.is_goal() {
                Flow::Found
            } else {
                Flow::Continue
            };
        }

        let tables = self.tables;
        for move_ in DOMINO_MOVES {
            let Some(next_fsm_state) = CANONICAL_FSM.next_state(fsm_state, move_.face()) else {
                continue;
            };
            let next = Phase2Coords {
                corner_perm: tables.corner_perm.apply(coords.corner_perm, move_),
                ud_edge_perm: tables.ud_edge_perm.apply(coords.ud_edge_perm, move_),
                slice_edge_perm: tables.slice_edge_perm.apply(coords.slice_edge_perm, move_),
            };
            if self.phase2_heuristic(next) >= togo {
                continue;
            }

            if self.expand(frame) {
                return Flow::Stop;
            }
            frame.moves.push(move_);
            let flow = self.phase2(frame, next, next_fsm_state, togo - 1);
            // A found solution stays on the move stack for the caller to take.
            if flow != Flow::Found {
                frame.moves.pop();
            }
            if flow != Flow::Continue {
                return flow;
            }
        }
        Flow::Continue
    }

    /// Take the solution left on the move stack, tighten the budget and
    /// decide whether to keep refining.
    fn after_solution(&self, frame: &mut SearchFrame, depth1: usize) -> Flow {
        let length = frame.moves.len();
        debug!(
            working!("Found a {} move solution ({} + {}) after {} nodes"),
            length,
            depth1,
            length - depth1,
            frame.nodes_visited
        );
        frame.best = Some((frame.moves.clone(), depth1));
        frame.moves.truncate(depth1);
        frame.max_length = length.saturating_sub(1);
        let refining_since = *frame.refining_since.get_or_insert_with(Instant::now);

        // FirstSolution still finishes the current phase 1 depth. A later path
        // at this depth may need no phase 2 moves at all.
        let stop = length <= depth1
            || refining_since.elapsed() >= self.config.timeout()
            || self.attempts_exhausted(frame);
        if stop { Flow::Stop } else { Flow::Continue }
    }

    fn attempts_exhausted(&self, frame: &SearchFrame) -> bool {
        self.config
            .max_attempts
            .is_some_and(|max_attempts| frame.attempts >= max_attempts)
    }

    /// Find a move sequence that solves `start`.
    ///
    /// Phase 1 deepens from its heuristic lower bound. Every phase 1 path that
    /// reaches the domino subgroup is handed to phase 2 with whatever remains
    /// of the move budget. The budget is tightened after each solution. With
    /// [`SearchStrategy::Shortest`] the search goes on until no shorter
    /// solution is possible or a limit is hit. [`SearchStrategy::FirstSolution`]
    /// stops after the phase 1 depth that produced the first solution.
    ///
    /// # Errors
    ///
    /// Fails if no solution fits in the configured limits, or if `cancel` is
    /// raised before any solution is found.
    pub fn search(
        &self,
        start: &CubeState,
        cancel: Option<&AtomicBool>,
    ) -> Result<SearchOutcome, SearchError> {
        info!(start!("Searching for a two-phase solution"));
        if cancel.is_some_and(|cancel| cancel.load(Ordering::Relaxed)) {
            return Err(SearchError::Cancelled);
        }
        let mut frame = SearchFrame {
            start: *start,
            cancel,
            started: Instant::now(),
            refining_since: None,
            moves: Vec::with_capacity(self.config.max_length),
            best: None,
            max_length: self.config.max_length,
            nodes_visited: 0,
            phase1_solutions: 0,
            attempts: 0,
            cancelled: false,
        };

        let coords = Phase1Coords::from_state(start);
        let mut phase1_completed = true;
        for depth1 in self.phase1_heuristic(coords)..=self.config.max_phase1_depth {
            if depth1 > frame.max_length {
                phase1_completed = false;
                break;
            }
            debug!(working!("Searching phase 1 depth {}..."), depth1);
            let depth_start = Instant::now();
            let flow = self.phase1(&mut frame, coords, CanonicalFsmState::default(), depth1);
            if log_enabled!(Level::Debug) {
                debug!(
                    working!("Traversed {} nodes in {:.3}s"),
                    frame.nodes_visited,
                    depth_start.elapsed().as_secs_f64()
                );
            }
            if flow == Flow::Stop {
                phase1_completed = false;
                break;
            }
            if self.config.strategy == SearchStrategy::FirstSolution && frame.best.is_some() {
                break;
            }
        }

        let Some((moves, phase1_length)) = frame.best else {
            return Err(if frame.cancelled {
                SearchError::Cancelled
            } else if phase1_completed && frame.phase1_solutions == 0 {
                SearchError::PhaseOneExhausted {
                    max_depth: self.config.max_phase1_depth,
                }
            } else {
                SearchError::NoSolutionFound {
                    max_length: self.config.max_length,
                }
            });
        };

        info!(
            success!("Found a {} move solution in {:.3}s after {} nodes"),
            moves.len(),
            frame.started.elapsed().as_secs_f64(),
            frame.nodes_visited
        );
        Ok(SearchOutcome {
            moves,
            phase1_length,
            nodes_visited: frame.nodes_visited,
            phase1_solutions: frame.phase1_solutions,
            attempts: frame.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        moves::{invert_moves, parse_moves, random_moves},
        tables::TEST_TABLES,
    };

    fn search(config: &SolverConfig, state: &CubeState) -> Result<SearchOutcome, SearchError> {
        TwoPhaseSearch::new(&TEST_TABLES, config).search(state, None)
    }

    #[test_log::test]
    fn solved_cube_needs_no_moves() {
        let outcome = search(&SolverConfig::default(), &CubeState::SOLVED).unwrap();
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.phase1_length, 0);
    }

    #[test_log::test]
    fn phase1_ends_on_a_quarter_turn_of_a_side_face() {
        let config = SolverConfig::default().with_strategy(SearchStrategy::FirstSolution);
        let mut rng = fastrand::Rng::with_seed(21);
        for _ in 0..5 {
            let scramble = random_moves(&mut rng, 25);
            let state = CubeState::SOLVED.apply_moves(&scramble);
            let outcome = search(&config, &state).unwrap();
            assert!(state.apply_moves(&outcome.moves).is_solved());
            if outcome.phase1_length > 0 {
                assert!(!outcome.moves[outcome.phase1_length - 1].is_domino());
            }
            assert!(outcome.moves[outcome.phase1_length..].iter().all(|m| m.is_domino()));
        }
    }

    #[test_log::test]
    fn solutions_are_canonical_across_the_phase_boundary() {
        let config = SolverConfig::default().with_strategy(SearchStrategy::FirstSolution);
        let state = CubeState::SOLVED.apply_moves(&parse_moves("R U F' L2 D B R' F2").unwrap());
        let outcome = search(&config, &state).unwrap();
        let fsm_state = outcome
            .moves
            .iter()
            .try_fold(CanonicalFsmState::default(), |fsm, m| {
                CANONICAL_FSM.next_state(fsm, m.face())
            });
        assert!(fsm_state.is_some());
    }

    #[test_log::test]
    fn first_solution_undoes_single_moves() {
        let config = SolverConfig::default().with_strategy(SearchStrategy::FirstSolution);
        for move_ in Move::ALL {
            let outcome = search(&config, &CubeState::SOLVED.apply(move_)).unwrap();
            assert_eq!(outcome.moves, [move_.inverse()], "scramble {move_}");
        }
    }

    #[test_log::test]
    fn shortest_strategy_finds_short_scrambles_exactly() {
        let scramble = parse_moves("R U2 F'").unwrap();
        let state = CubeState::SOLVED.apply_moves(&scramble);
        let outcome = search(&SolverConfig::default().with_timeout(60.0), &state).unwrap();
        assert_eq!(outcome.moves, invert_moves(&scramble));
    }

    #[test_log::test]
    fn tiny_budgets_fail_without_panicking() {
        let state = CubeState::SOLVED.apply_moves(&parse_moves("R U F").unwrap());
        assert_eq!(
            search(&SolverConfig::default().with_max_length(2), &state),
            Err(SearchError::NoSolutionFound { max_length: 2 })
        );

        let config = SolverConfig {
            max_phase1_depth: 0,
            ..SolverConfig::default()
        };
        assert_eq!(
            search(&config, &state),
            Err(SearchError::PhaseOneExhausted { max_depth: 0 })
        );
    }

    #[test_log::test]
    fn raised_cancel_flag_stops_the_search() {
        let cancel = AtomicBool::new(true);
        let state = CubeState::random(&mut fastrand::Rng::with_seed(9));
        let result = TwoPhaseSearch::new(&TEST_TABLES, &SolverConfig::default())
            .search(&state, Some(&cancel));
        assert_eq!(result, Err(SearchError::Cancelled));
    }
}
