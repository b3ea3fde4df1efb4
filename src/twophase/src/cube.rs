//! Cubie-level cube state and the move algebra acting on it.

use crate::moves::Move;
use thiserror::Error;

/// Corner positions and pieces, named by the faces they touch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Corner {
    URF,
    UFL,
    ULB,
    UBR,
    DFR,
    DLF,
    DBL,
    DRB,
}

impl Corner {
    pub const ALL: [Self; 8] = {
        use Corner::*;
        [URF, UFL, ULB, UBR, DFR, DLF, DBL, DRB]
    };
}

/// Edge positions and pieces. The last four are the middle slice edges.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Edge {
    UR,
    UF,
    UL,
    UB,
    DR,
    DF,
    DL,
    DB,
    FR,
    FL,
    BL,
    BR,
}

impl Edge {
    pub const ALL: [Self; 12] = {
        use Edge::*;
        [UR, UF, UL, UB, DR, DF, DL, DB, FR, FL, BL, BR]
    };

    #[must_use]
    pub const fn is_slice(self) -> bool {
        self as u8 >= Edge::FR as u8
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidConfiguration {
    #[error("Corner {0:?} appears more than once")]
    DuplicateCorner(Corner),
    #[error("Edge {0:?} appears more than once")]
    DuplicateEdge(Edge),
    #[error("Corner orientation {0} is out of range")]
    CornerOrientationRange(u8),
    #[error("Edge orientation {0} is out of range")]
    EdgeOrientationRange(u8),
    #[error("The stickers at corner position {0:?} do not form a corner piece")]
    UnknownCorner(Corner),
    #[error("The stickers at edge position {0:?} do not form an edge piece")]
    UnknownEdge(Edge),
    #[error("Corner twists do not sum to a multiple of 3; a corner is twisted")]
    CornerTwist,
    #[error("Edge flips do not sum to an even number; an edge is flipped")]
    EdgeFlip,
    #[error("Corner and edge permutation parities differ; two pieces are swapped")]
    Parity,
}

/// The permutation and orientation of all cubies.
///
/// Entry `i` of a permutation is the piece sitting at position `i`; entry `i`
/// of an orientation is the twist (or flip) of that piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeState {
    cp: [Corner; 8],
    co: [u8; 8],
    ep: [Edge; 12],
    eo: [u8; 12],
}

impl Default for CubeState {
    fn default() -> Self {
        Self::SOLVED
    }
}

impl CubeState {
    pub const SOLVED: Self = Self {
        cp: Corner::ALL,
        co: [0; 8],
        ep: Edge::ALL,
        eo: [0; 12],
    };

    /// Build a state and check every validity law.
    ///
    /// # Errors
    ///
    /// Fails if the parts are not a physically reachable cube.
    pub fn from_parts(
        cp: [Corner; 8],
        co: [u8; 8],
        ep: [Edge; 12],
        eo: [u8; 12],
    ) -> Result<Self, InvalidConfiguration> {
        let state = Self { cp, co, ep, eo };
        state.verify()?;
        Ok(state)
    }

    /// Build a state without checking the validity laws. Used for coordinate
    /// representatives, which need not be reachable.
    pub(crate) const fn from_parts_unchecked(
        cp: [Corner; 8],
        co: [u8; 8],
        ep: [Edge; 12],
        eo: [u8; 12],
    ) -> Self {
        Self { cp, co, ep, eo }
    }

    #[must_use]
    pub fn corner_permutation(&self) -> &[Corner; 8] {
        &self.cp
    }

    #[must_use]
    pub fn corner_orientation(&self) -> &[u8; 8] {
        &self.co
    }

    #[must_use]
    pub fn edge_permutation(&self) -> &[Edge; 12] {
        &self.ep
    }

    #[must_use]
    pub fn edge_orientation(&self) -> &[u8; 12] {
        &self.eo
    }

    #[must_use]
    pub fn is_solved(&self) -> bool {
        *self == Self::SOLVED
    }

    /// Check the three laws of the cube: orientation sums, and equal
    /// permutation parity. Permutations must also be bijections.
    ///
    /// # Errors
    ///
    /// Returns the first law that is broken.
    pub fn verify(&self) -> Result<(), InvalidConfiguration> {
        let mut seen_corners = [false; 8];
        for corner in self.cp {
            if std::mem::replace(&mut seen_corners[corner as usize], true) {
                return Err(InvalidConfiguration::DuplicateCorner(corner));
            }
        }
        let mut seen_edges = [false; 12];
        for edge in self.ep {
            if std::mem::replace(&mut seen_edges[edge as usize], true) {
                return Err(InvalidConfiguration::DuplicateEdge(edge));
            }
        }
        if let Some(&twist) = self.co.iter().find(|&&twist| twist > 2) {
            return Err(InvalidConfiguration::CornerOrientationRange(twist));
        }
        if let Some(&flip) = self.eo.iter().find(|&&flip| flip > 1) {
            return Err(InvalidConfiguration::EdgeOrientationRange(flip));
        }
        if self.co.iter().map(|&twist| u32::from(twist)).sum::<u32>() % 3 != 0 {
            return Err(InvalidConfiguration::CornerTwist);
        }
        if self.eo.iter().map(|&flip| u32::from(flip)).sum::<u32>() % 2 != 0 {
            return Err(InvalidConfiguration::EdgeFlip);
        }
        if self.corner_parity() != self.edge_parity() {
            return Err(InvalidConfiguration::Parity);
        }
        Ok(())
    }

    /// Whether the corner permutation is odd.
    #[must_use]
    pub fn corner_parity(&self) -> bool {
        permutation_parity(&self.cp.map(|corner| corner as u8))
    }

    /// Whether the edge permutation is odd.
    #[must_use]
    pub fn edge_parity(&self) -> bool {
        permutation_parity(&self.ep.map(|edge| edge as u8))
    }

    /// Compose `self` followed by `other`. Applying a move is multiplication
    /// by that move's state.
    #[must_use]
    pub const fn multiply(&self, other: &Self) -> Self {
        let mut out = Self::SOLVED;
        let mut i = 0;
        while i < 8 {
            let from = other.cp[i] as usize;
            out.cp[i] = self.cp[from];
            out.co[i] = (self.co[from] + other.co[i]) % 3;
            i += 1;
        }
        let mut i = 0;
        while i < 12 {
            let from = other.ep[i] as usize;
            out.ep[i] = self.ep[from];
            out.eo[i] = (self.eo[from] + other.eo[i]) % 2;
            i += 1;
        }
        out
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut out = Self::SOLVED;
        for (i, &corner) in self.cp.iter().enumerate() {
            out.cp[corner as usize] = Corner::ALL[i];
            out.co[corner as usize] = (3 - self.co[i]) % 3;
        }
        for (i, &edge) in self.ep.iter().enumerate() {
            out.ep[edge as usize] = Edge::ALL[i];
            out.eo[edge as usize] = self.eo[i];
        }
        out
    }

    #[must_use]
    pub fn apply(&self, move_: Move) -> Self {
        self.multiply(&MOVE_STATES[move_.index()])
    }

    #[must_use]
    pub fn apply_moves(&self, moves: &[Move]) -> Self {
        moves.iter().fold(*self, |state, &move_| state.apply(move_))
    }

    /// A uniformly random reachable state.
    #[must_use]
    pub fn random(rng: &mut fastrand::Rng) -> Self {
        let mut state = Self::SOLVED;
        rng.shuffle(&mut state.cp);
        rng.shuffle(&mut state.ep);
        if state.corner_parity() != state.edge_parity() {
            state.ep.swap(10, 11);
        }
        for i in 0..7 {
            state.co[i] = rng.u8(..3);
        }
        state.co[7] = (3 - state.co[..7].iter().sum::<u8>() % 3) % 3;
        for i in 0..11 {
            state.eo[i] = rng.u8(..2);
        }
        state.eo[11] = state.eo[..11].iter().sum::<u8>() % 2;
        state
    }
}

fn permutation_parity(perm: &[u8]) -> bool {
    let mut inversions = 0;
    for i in 0..perm.len() {
        for j in (i + 1)..perm.len() {
            if perm[j] < perm[i] {
                inversions += 1;
            }
        }
    }
    inversions % 2 == 1
}

/// Clockwise quarter turns of each face, in `Face` order.
const FACE_TURNS: [CubeState; 6] = {
    use Corner::*;
    use Edge::*;
    [
        // U
        CubeState::from_parts_unchecked(
            [UBR, URF, UFL, ULB, DFR, DLF, DBL, DRB],
            [0; 8],
            [UB, UR, UF, UL, DR, DF, DL, DB, FR, FL, BL, BR],
            [0; 12],
        ),
        // D
        CubeState::from_parts_unchecked(
            [URF, UFL, ULB, UBR, DLF, DBL, DRB, DFR],
            [0; 8],
            [UR, UF, UL, UB, DF, DL, DB, DR, FR, FL, BL, BR],
            [0; 12],
        ),
        // L
        CubeState::from_parts_unchecked(
            [URF, ULB, DBL, UBR, DFR, UFL, DLF, DRB],
            [0, 1, 2, 0, 0, 2, 1, 0],
            [UR, UF, BL, UB, DR, DF, FL, DB, FR, UL, DL, BR],
            [0; 12],
        ),
        // R
        CubeState::from_parts_unchecked(
            [DFR, UFL, ULB, URF, DRB, DLF, DBL, UBR],
            [2, 0, 0, 1, 1, 0, 0, 2],
            [FR, UF, UL, UB, BR, DF, DL, DB, DR, FL, BL, UR],
            [0; 12],
        ),
        // F
        CubeState::from_parts_unchecked(
            [UFL, DLF, ULB, UBR, URF, DFR, DBL, DRB],
            [1, 2, 0, 0, 2, 1, 0, 0],
            [UR, FL, UL, UB, DR, FR, DL, DB, UF, DF, BL, BR],
            [0, 1, 0, 0, 0, 1, 0, 0, 1, 1, 0, 0],
        ),
        // B
        CubeState::from_parts_unchecked(
            [URF, UFL, UBR, DRB, DFR, DLF, ULB, DBL],
            [0, 0, 1, 2, 0, 0, 2, 1],
            [UR, UF, UL, BR, DR, DF, DL, BL, FR, FL, UB, DB],
            [0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 1, 1],
        ),
    ]
};

/// Every move as a cube state, indexed by `Move::index`.
pub(crate) const MOVE_STATES: [CubeState; 18] = {
    let mut out = [CubeState::SOLVED; 18];
    let mut face = 0;
    while face < FACE_TURNS.len() {
        let mut state = FACE_TURNS[face];
        let mut turn = 0;
        while turn < 3 {
            out[face * 3 + turn] = state;
            state = state.multiply(&FACE_TURNS[face]);
            turn += 1;
        }
        face += 1;
    }
    out
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Face, Turn, parse_moves};

    #[test]
    fn move_then_inverse_is_identity() {
        let mut rng = fastrand::Rng::with_seed(0x5eed);
        let states = [CubeState::SOLVED, CubeState::random(&mut rng), CubeState::random(&mut rng)];
        for state in states {
            for move_ in Move::ALL {
                assert_eq!(state.apply(move_).apply(move_.inverse()), state, "{move_}");
            }
        }
    }

    #[test]
    fn quarter_turns_have_order_four() {
        for face in Face::ALL {
            let move_ = Move::new(face, Turn::Clockwise);
            let mut state = CubeState::SOLVED;
            for i in 1..=4 {
                state = state.apply(move_);
                assert_eq!(state.is_solved(), i == 4);
            }
        }
    }

    #[test]
    fn every_move_is_valid() {
        for state in MOVE_STATES {
            state.verify().unwrap();
        }
    }

    #[test]
    fn sexy_move_has_order_six() {
        let sexy = parse_moves("R U R' U'").unwrap();
        let mut state = CubeState::SOLVED;
        for _ in 0..5 {
            state = state.apply_moves(&sexy);
            assert!(!state.is_solved());
        }
        assert!(state.apply_moves(&sexy).is_solved());
    }

    #[test]
    fn inverse_composes_to_identity() {
        let mut rng = fastrand::Rng::with_seed(42);
        for _ in 0..20 {
            let state = CubeState::random(&mut rng);
            state.verify().unwrap();
            assert!(state.multiply(&state.inverse()).is_solved());
            assert!(state.inverse().multiply(&state).is_solved());
        }
    }

    #[test]
    fn rejects_broken_cubes() {
        let mut twisted = CubeState::SOLVED;
        twisted.co[0] = 1;
        assert_eq!(twisted.verify(), Err(InvalidConfiguration::CornerTwist));

        let mut flipped = CubeState::SOLVED;
        flipped.eo[3] = 1;
        assert_eq!(flipped.verify(), Err(InvalidConfiguration::EdgeFlip));

        let mut swapped = CubeState::SOLVED;
        swapped.ep.swap(0, 1);
        assert_eq!(swapped.verify(), Err(InvalidConfiguration::Parity));

        let mut duplicated = CubeState::SOLVED;
        duplicated.cp[1] = Corner::URF;
        assert_eq!(
            duplicated.verify(),
            Err(InvalidConfiguration::DuplicateCorner(Corner::URF))
        );

        // Swapping two corners and two edges keeps the parities equal
        let mut double_swap = CubeState::SOLVED;
        double_swap.cp.swap(0, 1);
        double_swap.ep.swap(0, 1);
        assert_eq!(double_swap.verify(), Ok(()));
    }
}
