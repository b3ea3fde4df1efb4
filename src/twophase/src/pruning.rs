//! Exact distance tables over pairs of coordinates, used as admissible
//! heuristics during search.

use crate::{
    coord::{Coord, CoordKind},
    move_table::MoveTable,
    moves::Move,
    working,
};
use log::debug;

pub const UNVISITED: u8 = u8::MAX;

/// Breadth first distances from index 0 over a space of `size` states.
/// `neighbors` must call its callback with every successor of a state.
/// States that are never reached stay `UNVISITED`.
pub fn bfs_distances(
    size: usize,
    mut neighbors: impl FnMut(usize, &mut dyn FnMut(usize)),
) -> Box<[u8]> {
    let mut distances = vec![UNVISITED; size].into_boxed_slice();
    distances[0] = 0;
    let mut frontier = vec![0];
    let mut visited = 1;
    let mut depth = 0;
    while !frontier.is_empty() && visited < size {
        depth += 1;
        let mut next = vec![];
        for &index in &frontier {
            neighbors(index, &mut |neighbor| {
                if distances[neighbor] == UNVISITED {
                    distances[neighbor] = depth;
                    next.push(neighbor);
                }
            });
        }
        visited += next.len();
        debug!(working!("Depth {} reached {} of {} entries"), depth, visited, size);
        frontier = next;
    }
    distances
}

/// Distances to the goal for every pair `(a, b)` of two coordinates, stored at
/// `a * size_b + b`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruningTable {
    kinds: (CoordKind, CoordKind),
    distances: Box<[u8]>,
}

impl PruningTable {
    #[must_use]
    pub fn generate(first: &MoveTable, second: &MoveTable, moves: &[Move]) -> Self {
        let kinds = (first.kind(), second.kind());
        let size_b = kinds.1.size();
        let distances = bfs_distances(kinds.0.size() * size_b, |index, visit| {
            let a = (index / size_b) as Coord;
            let b = (index % size_b) as Coord;
            for &move_ in moves {
                let a = first.apply(a, move_) as usize;
                let b = second.apply(b, move_) as usize;
                visit(a * size_b + b);
            }
        });
        Self { kinds, distances }
    }

    pub(crate) fn from_raw(kinds: (CoordKind, CoordKind), distances: Box<[u8]>) -> Option<Self> {
        (distances.len() == kinds.0.size() * kinds.1.size()).then_some(Self { kinds, distances })
    }

    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.distances
    }

    /// Lower bound on the moves needed to bring both coordinates to zero.
    #[inline]
    #[must_use]
    pub fn distance(&self, a: Coord, b: Coord) -> u8 {
        self.distances[a as usize * self.kinds.1.size() + b as usize]
    }

    /// The largest distance in the table.
    #[must_use]
    pub fn depth(&self) -> u8 {
        self.distances
            .iter()
            .copied()
            .filter(|&d| d != UNVISITED)
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        coord::Phase1Coords,
        cube::CubeState,
        moves::{DOMINO_MOVES, random_moves},
    };
    use std::collections::{HashMap, VecDeque};

    // Two counters modulo 7 and 5, moved by +1, -1 and +2 on both at once.
    fn synthetic_step(index: usize, visit: &mut dyn FnMut(usize)) {
        let (a, b) = (index / 5, index % 5);
        for delta in [1, 6, 2] {
            visit((a + delta) % 7 * 5 + (b + delta) % 5);
        }
    }

    #[test_log::test]
    fn matches_brute_force_on_a_synthetic_space() {
        let distances = bfs_distances(35, synthetic_step);

        let mut brute = HashMap::from([(0, 0)]);
        let mut queue = VecDeque::from([0]);
        while let Some(index) = queue.pop_front() {
            let depth = brute[&index];
            synthetic_step(index, &mut |next| {
                brute.entry(next).or_insert_with(|| {
                    queue.push_back(next);
                    depth + 1
                });
            });
        }

        for (index, &distance) in distances.iter().enumerate() {
            assert_eq!(brute.get(&index).copied().unwrap_or(UNVISITED), distance);
        }
    }

    #[test_log::test]
    fn unreachable_entries_stay_unvisited() {
        // Only even indices are reachable.
        let distances = bfs_distances(10, |index, visit| visit((index + 2) % 10));
        let expected = [0, UNVISITED, 1, UNVISITED, 2, UNVISITED, 3, UNVISITED, 4, UNVISITED];
        assert_eq!(*distances, expected);
    }

    #[test_log::test]
    fn phase1_distances_are_lower_bounds() {
        let slice = MoveTable::generate(CoordKind::Slice);
        let twist = MoveTable::generate(CoordKind::Twist);
        let table = PruningTable::generate(&slice, &twist, &Move::ALL);
        assert_eq!(table.distance(0, 0), 0);
        assert!(table.as_slice().iter().all(|&d| d != UNVISITED));

        let mut rng = fastrand::Rng::with_seed(5);
        for length in 0..12 {
            let moves = random_moves(&mut rng, length);
            let coords = Phase1Coords::from_state(&CubeState::SOLVED.apply_moves(&moves));
            assert!(usize::from(table.distance(coords.slice, coords.twist)) <= length);
        }
    }

    #[test_log::test]
    fn phase2_half_turn_is_one_move_away() {
        let corners = MoveTable::generate(CoordKind::CornerPerm);
        let slice = MoveTable::generate(CoordKind::SliceEdgePerm);
        let table = PruningTable::generate(&corners, &slice, &DOMINO_MOVES);
        let r2 = "R2".parse().unwrap();
        assert_eq!(table.distance(corners.apply(0, r2), slice.apply(0, r2)), 1);
        assert!(table.distance(corners.apply(0, r2), 0) > 1);
        assert!(table.as_slice().iter().all(|&d| d != UNVISITED));
    }
}
