//! Coordinate transition tables: `apply(coord, move)` without touching a cube.

use crate::{
    coord::{Coord, CoordKind},
    moves::Move,
};

const NO_SLOT: u8 = u8::MAX;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTable {
    kind: CoordKind,
    // Move index to column, `NO_SLOT` for moves the coordinate does not
    // support.
    slots: [u8; Move::COUNT],
    data: Box<[Coord]>,
}

impl MoveTable {
    /// Build the table by decoding each coordinate to a representative,
    /// applying every supported move, and re-encoding.
    #[must_use]
    pub fn generate(kind: CoordKind) -> Self {
        let moves = kind.moves();
        let mut data = Vec::with_capacity(kind.size() * moves.len());
        for coord in 0..kind.size() {
            let state = kind.decode(coord as Coord);
            data.extend(moves.iter().map(|&move_| kind.encode(&state.apply(move_))));
        }
        Self {
            kind,
            slots: slots_for(moves),
            data: data.into_boxed_slice(),
        }
    }

    /// Rebuild a table from its flattened transitions.
    pub(crate) fn from_raw(kind: CoordKind, data: Box<[Coord]>) -> Option<Self> {
        (data.len() == kind.size() * kind.moves().len()).then(|| Self {
            kind,
            slots: slots_for(kind.moves()),
            data,
        })
    }

    pub(crate) fn as_slice(&self) -> &[Coord] {
        &self.data
    }

    #[must_use]
    pub fn kind(&self) -> CoordKind {
        self.kind
    }

    /// # Panics
    ///
    /// Panics if `move_` is not one of the moves this coordinate supports.
    #[inline]
    #[must_use]
    pub fn apply(&self, coord: Coord, move_: Move) -> Coord {
        let slot = self.slots[move_.index()];
        assert_ne!(slot, NO_SLOT, "{move_} is not a {:?} move", self.kind);
        self.data[coord as usize * self.kind.moves().len() + slot as usize]
    }
}

fn slots_for(moves: &[Move]) -> [u8; Move::COUNT] {
    let mut slots = [NO_SLOT; Move::COUNT];
    for (slot, move_) in moves.iter().enumerate() {
        slots[move_.index()] = slot as u8;
    }
    slots
}
