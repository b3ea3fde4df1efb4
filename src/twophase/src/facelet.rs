//! Conversion between sticker colors and cubie states.
//!
//! Two facelet orders are in use. Callers hand over stickers face by face in
//! `U L F R B D` order. Internally, and in the common solver string format,
//! faces are laid out `U R F D L B`. Both are row-major, 9 stickers a face.

use crate::{
    cube::{Corner, CubeState, Edge, InvalidConfiguration},
    moves::Face,
};
use std::{collections::HashMap, hash::Hash};
use thiserror::Error;

pub const STICKER_COUNT: usize = 54;

/// Face blocks in the order stickers are accepted.
pub const INPUT_FACE_ORDER: [Face; 6] = [Face::U, Face::L, Face::F, Face::R, Face::B, Face::D];

/// Face blocks in the internal facelet order.
pub const FACELET_FACE_ORDER: [Face; 6] = [Face::U, Face::R, Face::F, Face::D, Face::L, Face::B];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Cube state must contain exactly 54 stickers, got {0}")]
    StickerCount(usize),
    #[error("The six center stickers must have six distinct colors")]
    CenterColors,
    #[error("Sticker color `{0}` does not match any center")]
    UnknownColor(String),
    #[error("Color `{color}` appears {count} times; every color must appear exactly 9 times")]
    ColorCount { color: String, count: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FaceletError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    InvalidConfiguration(#[from] InvalidConfiguration),
}

/// Facelet indices of each corner position, starting with its U or D
/// sticker and going clockwise.
const CORNER_FACELETS: [[usize; 3]; 8] = [
    [8, 9, 20],
    [6, 18, 38],
    [0, 36, 47],
    [2, 45, 11],
    [29, 26, 15],
    [27, 44, 24],
    [33, 53, 42],
    [35, 17, 51],
];

const EDGE_FACELETS: [[usize; 2]; 12] = [
    [5, 10],
    [7, 19],
    [3, 37],
    [1, 46],
    [32, 16],
    [28, 25],
    [30, 43],
    [34, 52],
    [23, 12],
    [21, 41],
    [50, 39],
    [48, 14],
];

const CORNER_COLORS: [[Face; 3]; 8] = {
    use Face::*;
    [
        [U, R, F],
        [U, F, L],
        [U, L, B],
        [U, B, R],
        [D, F, R],
        [D, L, F],
        [D, B, L],
        [D, R, B],
    ]
};

const EDGE_COLORS: [[Face; 2]; 12] = {
    use Face::*;
    [
        [U, R],
        [U, F],
        [U, L],
        [U, B],
        [D, R],
        [D, F],
        [D, L],
        [D, B],
        [F, R],
        [F, L],
        [B, L],
        [B, R],
    ]
};

/// Map arbitrary sticker colors, given in `U L F R B D` order, onto the faces
/// of their centers, in internal facelet order.
///
/// # Errors
///
/// Fails on the wrong sticker count, repeated center colors, a color without
/// a center, or a color that does not appear exactly nine times.
pub fn faces_from_stickers<S: AsRef<str>>(
    stickers: &[S],
) -> Result<[Face; STICKER_COUNT], ValidationError> {
    if stickers.len() != STICKER_COUNT {
        return Err(ValidationError::StickerCount(stickers.len()));
    }
    let stickers = stickers.iter().map(AsRef::as_ref).collect::<Vec<&str>>();
    faces_from_colors(&stickers, |sticker| sticker.to_owned())
}

/// Parse a facelet string in internal `U R F D L B` order where every sticker
/// is already a face letter, like `UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB`.
///
/// # Errors
///
/// Fails on the same conditions as `faces_from_stickers`, and when a
/// character is not a face letter.
pub fn faces_from_facelet_string(s: &str) -> Result<[Face; STICKER_COUNT], ValidationError> {
    let chars = s.chars().filter(|c| !c.is_whitespace()).collect::<Vec<_>>();
    if chars.len() != STICKER_COUNT {
        return Err(ValidationError::StickerCount(chars.len()));
    }
    let mut faces = [Face::U; STICKER_COUNT];
    for (face, &c) in faces.iter_mut().zip(&chars) {
        *face = Face::from_letter(c).ok_or_else(|| ValidationError::UnknownColor(c.to_string()))?;
    }
    check_faces(&faces)?;
    Ok(faces)
}

fn faces_from_colors<C: Copy + Eq + Hash>(
    stickers: &[C],
    describe: impl Fn(C) -> String,
) -> Result<[Face; STICKER_COUNT], ValidationError> {
    let mut color_to_face = HashMap::with_capacity(6);
    for (block, face) in INPUT_FACE_ORDER.into_iter().enumerate() {
        if color_to_face.insert(stickers[block * 9 + 4], face).is_some() {
            return Err(ValidationError::CenterColors);
        }
    }

    let mut faces = [Face::U; STICKER_COUNT];
    for (block, face) in INPUT_FACE_ORDER.into_iter().enumerate() {
        let target = facelet_block(face) * 9;
        for i in 0..9 {
            let color = stickers[block * 9 + i];
            faces[target + i] = *color_to_face
                .get(&color)
                .ok_or_else(|| ValidationError::UnknownColor(describe(color)))?;
        }
    }

    let mut counts = [0; 6];
    for &face in &faces {
        counts[face as usize] += 1;
    }
    if let Some((color, &count)) = color_to_face
        .iter()
        .map(|(&color, &face)| (color, &counts[face as usize]))
        .find(|&(_, &count)| count != 9)
    {
        return Err(ValidationError::ColorCount {
            color: describe(color),
            count,
        });
    }
    Ok(faces)
}

fn check_faces(faces: &[Face; STICKER_COUNT]) -> Result<(), ValidationError> {
    for (block, face) in FACELET_FACE_ORDER.into_iter().enumerate() {
        if faces[block * 9 + 4] != face {
            return Err(ValidationError::CenterColors);
        }
    }
    let mut counts = [0; 6];
    for &face in faces {
        counts[face as usize] += 1;
    }
    if let Some(face) = Face::ALL.into_iter().find(|&face| counts[face as usize] != 9) {
        return Err(ValidationError::ColorCount {
            color: face.to_string(),
            count: counts[face as usize],
        });
    }
    Ok(())
}

const fn facelet_block(face: Face) -> usize {
    match face {
        Face::U => 0,
        Face::R => 1,
        Face::F => 2,
        Face::D => 3,
        Face::L => 4,
        Face::B => 5,
    }
}

/// Rebuild the cubies from facelets in internal order and check that the
/// result is a reachable cube.
///
/// # Errors
///
/// Fails when stickers do not form real pieces, a piece appears twice, or a
/// law of the cube is broken.
pub fn cube_from_faces(faces: &[Face; STICKER_COUNT]) -> Result<CubeState, InvalidConfiguration> {
    let mut cp = [Corner::URF; 8];
    let mut co = [0; 8];
    for (i, facelets) in CORNER_FACELETS.iter().enumerate() {
        let position = Corner::ALL[i];
        let ori = (0..3)
            .find(|&ori| matches!(faces[facelets[ori]], Face::U | Face::D))
            .ok_or(InvalidConfiguration::UnknownCorner(position))?;
        let colors = [
            faces[facelets[ori]],
            faces[facelets[(ori + 1) % 3]],
            faces[facelets[(ori + 2) % 3]],
        ];
        let piece = CORNER_COLORS
            .iter()
            .position(|&corner_colors| corner_colors == colors)
            .ok_or(InvalidConfiguration::UnknownCorner(position))?;
        cp[i] = Corner::ALL[piece];
        co[i] = ori as u8;
    }

    let mut ep = [Edge::UR; 12];
    let mut eo = [0; 12];
    for (i, facelets) in EDGE_FACELETS.iter().enumerate() {
        let colors = [faces[facelets[0]], faces[facelets[1]]];
        let (piece, flip) = EDGE_COLORS
            .iter()
            .enumerate()
            .find_map(|(j, &[a, b])| {
                if colors == [a, b] {
                    Some((j, 0))
                } else if colors == [b, a] {
                    Some((j, 1))
                } else {
                    None
                }
            })
            .ok_or(InvalidConfiguration::UnknownEdge(Edge::ALL[i]))?;
        ep[i] = Edge::ALL[piece];
        eo[i] = flip;
    }

    CubeState::from_parts(cp, co, ep, eo)
}

/// Parse 54 sticker colors in `U L F R B D` order into a verified state.
///
/// # Errors
///
/// See `faces_from_stickers` and `cube_from_faces`.
pub fn parse<S: AsRef<str>>(stickers: &[S]) -> Result<CubeState, FaceletError> {
    let faces = faces_from_stickers(stickers)?;
    Ok(cube_from_faces(&faces)?)
}

/// Facelets of a state in internal `U R F D L B` order.
#[must_use]
pub fn to_faces(state: &CubeState) -> [Face; STICKER_COUNT] {
    let mut faces = [Face::U; STICKER_COUNT];
    for (block, face) in FACELET_FACE_ORDER.into_iter().enumerate() {
        faces[block * 9 + 4] = face;
    }
    for (i, facelets) in CORNER_FACELETS.iter().enumerate() {
        let piece = state.corner_permutation()[i] as usize;
        let ori = state.corner_orientation()[i] as usize;
        for n in 0..3 {
            faces[facelets[(n + ori) % 3]] = CORNER_COLORS[piece][n];
        }
    }
    for (i, facelets) in EDGE_FACELETS.iter().enumerate() {
        let piece = state.edge_permutation()[i] as usize;
        let ori = state.edge_orientation()[i] as usize;
        for n in 0..2 {
            faces[facelets[(n + ori) % 2]] = EDGE_COLORS[piece][n];
        }
    }
    faces
}

/// The facelet string of a state in internal `U R F D L B` order.
#[must_use]
pub fn to_facelet_string(state: &CubeState) -> String {
    to_faces(state).iter().map(|face| face.letter()).collect()
}

/// The stickers of a state as face letters, in the `U L F R B D` input order.
#[must_use]
pub fn to_stickers(state: &CubeState) -> [Face; STICKER_COUNT] {
    let faces = to_faces(state);
    let mut stickers = [Face::U; STICKER_COUNT];
    for (block, face) in INPUT_FACE_ORDER.into_iter().enumerate() {
        let source = facelet_block(face) * 9;
        stickers[block * 9..block * 9 + 9].copy_from_slice(&faces[source..source + 9]);
    }
    stickers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::{Move, parse_moves};

    /// Scrambles and the resulting facelet strings in `U R F D L B` order.
    const SCRAMBLES: [[&str; 2]; 8] = [
        ["", "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"],
        ["U", "UUUUUUUUUBBBRRRRRRRRRFFFFFFDDDDDDDDDFFFLLLLLLLLLBBBBBB"],
        [
            "U2 R2 L D2 L F2 B2 U' D' F U R' L2 U2 D L F' B2 D R2",
            "FLLLULFRFRUURRRBBBLDDFFUBRUDFRDDUFLDUFUFLDLBRBDRBBULBD",
        ],
        [
            "L U' R2 F B2 R2 L U' D2 R2 F B' U R' U2 R2 D2 F2 U2 L'",
            "BLBLUFFFFDULURFRRULDLBFRDBUFDFBDDDBRDUUFLULRRUDRLBRBLB",
        ],
        [
            "R L2 U2 D2 R2 U2 R' D2 R' F' R L2 B R2 L' F' B2 U' D' F B2 U R' L2",
            "DUULUFBDDRRFURDBFLRBBUFBLBLULURDLLBDFUUFLRBDFRFRLBDFRD",
        ],
        [
            "R2 D' B2 U' D' R2 U' L2 U' L2 B' R' F D F' B U2 L'",
            "BUDFUDRFDBRFURBFDRDULRFBUBURDLFDLRDDULFULBBRFLRLLBLBFU",
        ],
        [
            "L D2 R' L' D2 F' R' L' F B2 U' D F B' R' U2 L",
            "FRFDUDULRUBDFRBFFRLDBLFRDULRRDLDUBLULFBBLFDBBRDURBUFUL",
        ],
        [
            "U2 D2 L2 F' B L2 B2 U2 F' R L2 F' B2 U2 D F' U' D2 R U2 D F2",
            "LBDLULDDURDRRRFRURBFFRFBFRDLDBDDBDFBBULRLFFBUFLUUBUULL",
        ],
    ];

    #[test]
    fn scrambles_produce_known_facelets() {
        for [scramble, facelets] in SCRAMBLES {
            let state = CubeState::SOLVED.apply_moves(&parse_moves(scramble).unwrap());
            assert_eq!(to_facelet_string(&state), facelets, "{scramble}");
        }
    }

    #[test]
    fn facelets_round_trip_through_cubies() {
        for [scramble, facelets] in SCRAMBLES {
            let faces = faces_from_facelet_string(facelets).unwrap();
            let state = cube_from_faces(&faces).unwrap();
            let expected = CubeState::SOLVED.apply_moves(&parse_moves(scramble).unwrap());
            assert_eq!(state, expected, "{scramble}");
        }
    }

    #[test]
    fn parses_arbitrary_colors_in_input_order() {
        let colors = |face: Face| match face {
            Face::U => "White",
            Face::D => "Yellow",
            Face::L => "Orange",
            Face::R => "Red",
            Face::F => "Green",
            Face::B => "Blue",
        };
        let state = CubeState::SOLVED.apply_moves(&parse_moves("R U F' L2 D B").unwrap());
        let stickers = to_stickers(&state).map(colors);
        assert_eq!(parse(&stickers).unwrap(), state);
    }

    #[test]
    fn single_u_turn_in_input_order() {
        let state = CubeState::SOLVED.apply(Move::ALL[0]);
        let stickers: String = to_stickers(&state).iter().map(|face| face.letter()).collect();
        assert_eq!(
            stickers,
            "UUUUUUUUUFFFLLLLLLRRRFFFFFFBBBRRRRRRLLLBBBBBBDDDDDDDDD"
        );
    }

    #[test]
    fn rejects_bad_shapes() {
        let solved = to_stickers(&CubeState::SOLVED).map(|face| face.to_string());

        assert_eq!(
            parse(&solved[..53]),
            Err(FaceletError::Validation(ValidationError::StickerCount(53)))
        );

        let mut same_centers = solved.clone();
        same_centers[13] = "U".to_owned();
        assert_eq!(
            parse(&same_centers),
            Err(FaceletError::Validation(ValidationError::CenterColors))
        );

        let mut stray = solved.clone();
        stray[0] = "Purple".to_owned();
        assert_eq!(
            parse(&stray),
            Err(FaceletError::Validation(ValidationError::UnknownColor(
                "Purple".to_owned()
            )))
        );

        let mut too_many = solved.clone();
        too_many[0] = "D".to_owned();
        assert!(matches!(
            parse(&too_many),
            Err(FaceletError::Validation(ValidationError::ColorCount { .. }))
        ));
    }

    #[test]
    fn rejects_unreachable_cubes() {
        let solved = to_faces(&CubeState::SOLVED);

        // Twist the URF corner in place
        let mut twisted = solved;
        let [a, b, c] = CORNER_FACELETS[0];
        (twisted[a], twisted[b], twisted[c]) = (solved[c], solved[a], solved[b]);
        assert_eq!(
            cube_from_faces(&twisted),
            Err(InvalidConfiguration::CornerTwist)
        );

        // Flip the UR edge in place
        let mut flipped = solved;
        let [a, b] = EDGE_FACELETS[0];
        flipped.swap(a, b);
        assert_eq!(cube_from_faces(&flipped), Err(InvalidConfiguration::EdgeFlip));

        // Swap the UR and UF edges
        let mut swapped = solved;
        let ([a1, b1], [a2, b2]) = (EDGE_FACELETS[0], EDGE_FACELETS[1]);
        swapped.swap(a1, a2);
        swapped.swap(b1, b2);
        assert_eq!(cube_from_faces(&swapped), Err(InvalidConfiguration::Parity));

        // A corner showing two U stickers cannot exist
        let mut impossible = solved;
        impossible.swap(CORNER_FACELETS[0][1], CORNER_FACELETS[1][0]);
        assert!(matches!(
            cube_from_faces(&impossible),
            Err(InvalidConfiguration::UnknownCorner(_))
        ));
    }
}
