//! Canonical move sequence filter. A sequence is canonical when it never turns
//! the same face twice in a row and, for two consecutive turns of opposite
//! faces, the lower face comes first. The automaton is built the same way as
//! for general puzzles, with faces as move classes that commute when they
//! share an axis.

use crate::moves::Face;
use std::{collections::HashMap, sync::LazyLock};

const NUM_MOVE_CLASSES: usize = Face::ALL.len();

// Bit N is indexed by the face with discriminant N.
#[derive(Copy, Clone, Eq, Hash, PartialEq)]
struct MoveClassMask(u8);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CanonicalFsmState(usize);

const ILLEGAL: CanonicalFsmState = CanonicalFsmState(usize::MAX);

#[derive(Debug)]
pub struct CanonicalFsm {
    next_state_lookup: Vec<[CanonicalFsmState; NUM_MOVE_CLASSES]>,
}

pub static CANONICAL_FSM: LazyLock<CanonicalFsm> = LazyLock::new(CanonicalFsm::new);

impl CanonicalFsm {
    #[must_use]
    pub fn new() -> Self {
        let mut commutes = [MoveClassMask(0); NUM_MOVE_CLASSES];
        for face_1 in Face::ALL {
            for face_2 in Face::ALL {
                if face_1.axis() == face_2.axis() {
                    commutes[face_1 as usize].0 |= 1 << face_2 as usize;
                }
            }
        }

        let mut next_state_lookup = vec![];
        let mut mask_to_state = HashMap::from([(MoveClassMask(0), CanonicalFsmState(0))]);
        // Indexed by state ordinal: the faces turned since the last turn that
        // does not commute with them.
        let mut state_to_mask = vec![MoveClassMask(0)];

        let mut queue_index = 0;
        while queue_index < state_to_mask.len() {
            let mut next_state = [ILLEGAL; NUM_MOVE_CLASSES];
            let dequeue_mask = state_to_mask[queue_index];
            queue_index += 1;

            for move_class in 0..NUM_MOVE_CLASSES {
                // A greater commuting face already turned, or this face itself.
                let skip = (dequeue_mask.0 & commutes[move_class].0) >> (move_class + 1) != 0
                    || (dequeue_mask.0 >> move_class) & 1 != 0;
                if skip {
                    continue;
                }

                let mut next_bits = (dequeue_mask.0 & commutes[move_class].0) | (1 << move_class);
                for i in 0..NUM_MOVE_CLASSES {
                    if (next_bits >> i) & 1 != 0 {
                        for j in (i + 1)..NUM_MOVE_CLASSES {
                            if (next_bits >> j) & 1 != 0 && commutes[i] == commutes[j] {
                                next_bits &= !(1 << i);
                            }
                        }
                    }
                }

                let next_mask = MoveClassMask(next_bits);
                next_state[move_class] = *mask_to_state.entry(next_mask).or_insert_with(|| {
                    state_to_mask.push(next_mask);
                    CanonicalFsmState(state_to_mask.len() - 1)
                });
            }
            next_state_lookup.push(next_state);
        }

        Self { next_state_lookup }
    }

    /// The state after turning `face`, or `None` if that turn would make the
    /// sequence non-canonical.
    #[must_use]
    pub fn next_state(&self, current: CanonicalFsmState, face: Face) -> Option<CanonicalFsmState> {
        match self.next_state_lookup[current.0][face as usize] {
            ILLEGAL => None,
            state => Some(state),
        }
    }
}

impl Default for CanonicalFsm {
    fn default() -> Self {
        Self::new()
    }
}
