//! Integer coordinates projecting a cube state onto the part one search phase
//! cares about. Every coordinate is zero on the solved cube.

use crate::{
    FACT_UNTIL_12,
    cube::{Corner, CubeState, Edge},
    moves::{DOMINO_MOVES, Move},
};

pub type Coord = u16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum CoordKind {
    /// Orientation of the first seven corners, base 3.
    Twist,
    /// Orientation of the first eleven edges, base 2.
    Flip,
    /// Which four positions hold the middle slice edges, ignoring order.
    Slice,
    /// Permutation of all eight corners.
    CornerPerm,
    /// Permutation of the eight U and D layer edges. Only meaningful inside
    /// the domino subgroup.
    UdEdgePerm,
    /// Permutation of the four slice edges among the slice positions. Only
    /// meaningful inside the domino subgroup.
    SliceEdgePerm,
}

impl CoordKind {
    pub const ALL: [Self; 6] = [
        CoordKind::Twist,
        CoordKind::Flip,
        CoordKind::Slice,
        CoordKind::CornerPerm,
        CoordKind::UdEdgePerm,
        CoordKind::SliceEdgePerm,
    ];

    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            CoordKind::Twist => 2187,
            CoordKind::Flip => 2048,
            CoordKind::Slice => 495,
            CoordKind::CornerPerm | CoordKind::UdEdgePerm => 40320,
            CoordKind::SliceEdgePerm => 24,
        }
    }

    /// The moves that keep this coordinate well defined.
    #[must_use]
    pub const fn moves(self) -> &'static [Move] {
        match self {
            CoordKind::Twist | CoordKind::Flip | CoordKind::Slice | CoordKind::CornerPerm => {
                &Move::ALL
            }
            CoordKind::UdEdgePerm | CoordKind::SliceEdgePerm => &DOMINO_MOVES,
        }
    }

    #[must_use]
    pub fn encode(self, state: &CubeState) -> Coord {
        match self {
            CoordKind::Twist => state.corner_orientation()[..7]
                .iter()
                .fold(0, |acc, &twist| acc * 3 + Coord::from(twist)),
            CoordKind::Flip => state.edge_orientation()[..11]
                .iter()
                .fold(0, |acc, &flip| acc * 2 + Coord::from(flip)),
            CoordKind::Slice => encode_slice(state.edge_permutation()),
            CoordKind::CornerPerm => rank_permutation(&state.corner_permutation().map(|c| c as u8)),
            CoordKind::UdEdgePerm => {
                let ep = state.edge_permutation();
                rank_permutation(&std::array::from_fn::<u8, 8, _>(|i| ep[i] as u8))
            }
            CoordKind::SliceEdgePerm => {
                let ep = state.edge_permutation();
                rank_permutation(&std::array::from_fn::<u8, 4, _>(|i| ep[i + 8] as u8))
            }
        }
    }

    /// A representative state with the given coordinate and every other
    /// aspect solved. Representatives need not be reachable cubes.
    #[must_use]
    pub fn decode(self, coord: Coord) -> CubeState {
        let solved = CubeState::SOLVED;
        let mut cp = *solved.corner_permutation();
        let mut co = *solved.corner_orientation();
        let mut ep = *solved.edge_permutation();
        let mut eo = *solved.edge_orientation();
        match self {
            CoordKind::Twist => {
                let mut rest = coord;
                for twist in co[..7].iter_mut().rev() {
                    *twist = (rest % 3) as u8;
                    rest /= 3;
                }
                co[7] = (3 - co[..7].iter().sum::<u8>() % 3) % 3;
            }
            CoordKind::Flip => {
                let mut rest = coord;
                for flip in eo[..11].iter_mut().rev() {
                    *flip = (rest % 2) as u8;
                    rest /= 2;
                }
                eo[11] = eo[..11].iter().sum::<u8>() % 2;
            }
            CoordKind::Slice => ep = decode_slice(coord),
            CoordKind::CornerPerm => {
                let mut perm = [0; 8];
                unrank_permutation(coord, &mut perm);
                cp = perm.map(|i| Corner::ALL[i as usize]);
            }
            CoordKind::UdEdgePerm => {
                let mut perm = [0; 8];
                unrank_permutation(coord, &mut perm);
                for (edge, i) in ep.iter_mut().zip(perm) {
                    *edge = Edge::ALL[i as usize];
                }
            }
            CoordKind::SliceEdgePerm => {
                let mut perm = [0; 4];
                unrank_permutation(coord, &mut perm);
                for (edge, i) in ep[8..].iter_mut().zip(perm) {
                    *edge = Edge::ALL[i as usize + 8];
                }
            }
        }
        CubeState::from_parts_unchecked(cp, co, ep, eo)
    }
}

/// Binomial coefficients `C(n, k)` for `n, k < 12`.
const CHOOSE: [[u16; 12]; 12] = {
    let mut table = [[0; 12]; 12];
    let mut n = 0;
    while n < 12 {
        table[n][0] = 1;
        let mut k = 1;
        while k <= n {
            table[n][k] = table[n - 1][k - 1] + if k < n { table[n - 1][k] } else { 0 };
            k += 1;
        }
        n += 1;
    }
    table
};

const fn choose(n: usize, k: usize) -> u16 {
    if k > n { 0 } else { CHOOSE[n][k] }
}

/// Combination index of the positions holding slice edges, scanning from the
/// last position. The solved slice (positions 8 to 11) maps to zero.
fn encode_slice(ep: &[Edge; 12]) -> Coord {
    let mut coord = 0;
    let mut found = 0;
    for j in (0..12).rev() {
        if ep[j].is_slice() {
            coord += choose(11 - j, found + 1);
            found += 1;
        }
    }
    coord
}

fn decode_slice(coord: Coord) -> [Edge; 12] {
    let mut ep = [None; 12];
    let mut rest = coord;
    let mut remaining = 4;
    for (j, slot) in ep.iter_mut().enumerate() {
        if remaining == 0 {
            break;
        }
        let c = choose(11 - j, remaining);
        if rest >= c {
            *slot = Some(Edge::ALL[8 + 4 - remaining]);
            rest -= c;
            remaining -= 1;
        }
    }
    let mut others = Edge::ALL[..8].iter().copied();
    ep.map(|slot| slot.or_else(|| others.next()).unwrap_or(Edge::UR))
}

/// Lehmer rank of a permutation of `0..n`, so the identity has rank zero.
pub(crate) fn rank_permutation(perm: &[u8]) -> Coord {
    let n = perm.len();
    let mut rank = 0;
    for i in 0..n {
        let smaller_after = perm[i + 1..].iter().filter(|&&p| p < perm[i]).count();
        rank += smaller_after as u32 * FACT_UNTIL_12[n - 1 - i];
    }
    rank as Coord
}

/// Inverse of `rank_permutation`, writing a permutation of `0..perm.len()`.
pub(crate) fn unrank_permutation(rank: Coord, perm: &mut [u8]) {
    let n = perm.len();
    let mut available = [0_u8; 12];
    for (i, slot) in available.iter_mut().enumerate().take(n) {
        *slot = i as u8;
    }
    let mut available_len = n;
    let mut rest = u32::from(rank);
    for i in 0..n {
        let fact = FACT_UNTIL_12[n - 1 - i];
        let index = (rest / fact) as usize;
        rest %= fact;
        perm[i] = available[index];
        available.copy_within(index + 1..available_len, index);
        available_len -= 1;
    }
}

/// The phase 1 coordinates of a state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Phase1Coords {
    pub twist: Coord,
    pub flip: Coord,
    pub slice: Coord,
}

impl Phase1Coords {
    #[must_use]
    pub fn from_state(state: &CubeState) -> Self {
        Self {
            twist: CoordKind::Twist.encode(state),
            flip: CoordKind::Flip.encode(state),
            slice: CoordKind::Slice.encode(state),
        }
    }

    /// Whether the state is in the domino subgroup.
    #[must_use]
    pub fn is_goal(self) -> bool {
        self == Self::default()
    }
}

/// The phase 2 coordinates of a state inside the domino subgroup.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Phase2Coords {
    pub corner_perm: Coord,
    pub ud_edge_perm: Coord,
    pub slice_edge_perm: Coord,
}

impl Phase2Coords {
    #[must_use]
    pub fn from_state(state: &CubeState) -> Self {
        Self {
            corner_perm: CoordKind::CornerPerm.encode(state),
            ud_edge_perm: CoordKind::UdEdgePerm.encode(state),
            slice_edge_perm: CoordKind::SliceEdgePerm.encode(state),
        }
    }

    #[must_use]
    pub fn is_goal(self) -> bool {
        self == Self::default()
    }
}
