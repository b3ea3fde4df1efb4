//! Face turns and move sequences in standard notation.

use itertools::Itertools;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// The six faces, in move enumeration order. Opposite faces are adjacent so
/// that `face as u8 / 2` is the axis.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Face {
    U,
    D,
    L,
    R,
    F,
    B,
}

impl Face {
    pub const ALL: [Self; 6] = {
        use Face::*;
        let v = [U, D, L, R, F, B];

        let mut i = 0;
        while i < v.len() {
            assert!(i == v[i] as usize);
            i += 1;
        }

        v
    };

    #[must_use]
    pub const fn axis(self) -> u8 {
        self as u8 / 2
    }

    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Face::U => 'U',
            Face::D => 'D',
            Face::L => 'L',
            Face::R => 'R',
            Face::F => 'F',
            Face::B => 'B',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'U' => Some(Face::U),
            'D' => Some(Face::D),
            'L' => Some(Face::L),
            'R' => Some(Face::R),
            'F' => Some(Face::F),
            'B' => Some(Face::B),
            _ => None,
        }
    }
}

impl FromStr for Face {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next().and_then(Face::from_letter), chars.next()) {
            (Some(face), None) => Ok(face),
            _ => Err(ParseMoveError::UnknownMove(s.to_owned())),
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Quarter turns clockwise, seen from the turned face.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Turn {
    Clockwise = 1,
    Half = 2,
    CounterClockwise = 3,
}

impl Turn {
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Turn::Clockwise => Turn::CounterClockwise,
            Turn::Half => Turn::Half,
            Turn::CounterClockwise => Turn::Clockwise,
        }
    }

    const fn suffix(self) -> &'static str {
        match self {
            Turn::Clockwise => "",
            Turn::Half => "2",
            Turn::CounterClockwise => "'",
        }
    }
}

/// One of the 18 face turns. The index is `face * 3 + quarter_turns - 1`,
/// which gives the enumeration order `U U2 U' D D2 D' L ... B'`.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Move(u8);

impl Move {
    pub const COUNT: usize = 18;

    pub const ALL: [Self; 18] = {
        let mut out = [Move(0); 18];
        let mut i = 0;
        while i < out.len() {
            out[i] = Move(i as u8);
            i += 1;
        }
        out
    };

    #[must_use]
    pub const fn new(face: Face, turn: Turn) -> Self {
        Move(face as u8 * 3 + turn as u8 - 1)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[must_use]
    pub const fn face(self) -> Face {
        Face::ALL[self.0 as usize / 3]
    }

    #[must_use]
    pub const fn turn(self) -> Turn {
        match self.0 % 3 {
            0 => Turn::Clockwise,
            1 => Turn::Half,
            _ => Turn::CounterClockwise,
        }
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        Move::new(self.face(), self.turn().inverse())
    }

    /// Whether the move keeps the cube inside the domino subgroup
    /// `<U, D, L2, R2, F2, B2>`.
    #[must_use]
    pub const fn is_domino(self) -> bool {
        matches!(self.face(), Face::U | Face::D) || matches!(self.turn(), Turn::Half)
    }
}

/// The ten moves of phase 2, in enumeration order.
pub const DOMINO_MOVES: [Move; 10] = {
    let mut out = [Move(0); 10];
    let mut i = 0;
    let mut j = 0;
    while i < Move::ALL.len() {
        if Move::ALL[i].is_domino() {
            out[j] = Move::ALL[i];
            j += 1;
        }
        i += 1;
    }
    assert!(j == out.len());
    out
};

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.face(), self.turn().suffix())
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseMoveError {
    #[error("Unknown move `{0}`")]
    UnknownMove(String),
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let face = chars
            .next()
            .and_then(Face::from_letter)
            .ok_or_else(|| ParseMoveError::UnknownMove(s.to_owned()))?;
        let turn = match chars.as_str() {
            "" | "1" => Turn::Clockwise,
            "2" | "2'" => Turn::Half,
            "'" | "3" => Turn::CounterClockwise,
            _ => return Err(ParseMoveError::UnknownMove(s.to_owned())),
        };
        Ok(Move::new(face, turn))
    }
}

impl Serialize for Move {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Move {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Parse a whitespace separated sequence such as `"R U2 F'"`.
///
/// # Errors
///
/// Fails on the first token that is not a face turn.
pub fn parse_moves(s: &str) -> Result<Vec<Move>, ParseMoveError> {
    s.split_whitespace().map(str::parse).collect()
}

#[must_use]
pub fn format_moves(moves: &[Move]) -> String {
    moves.iter().join(" ")
}

#[must_use]
pub fn invert_moves(moves: &[Move]) -> Vec<Move> {
    moves.iter().rev().map(|move_| move_.inverse()).collect()
}

/// A random move sequence that never turns the same face twice in a row.
#[must_use]
pub fn random_moves(rng: &mut fastrand::Rng, length: usize) -> Vec<Move> {
    let mut moves: Vec<Move> = Vec::with_capacity(length);
    while moves.len() < length {
        let move_ = Move::ALL[rng.usize(..Move::COUNT)];
        if moves.last().is_some_and(|last| last.face() == move_.face()) {
            continue;
        }
        moves.push(move_);
    }
    moves
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_order() {
        let names = Move::ALL.iter().map(ToString::to_string).collect_vec();
        assert_eq!(
            names,
            [
                "U", "U2", "U'", "D", "D2", "D'", "L", "L2", "L'", "R", "R2", "R'", "F", "F2",
                "F'", "B", "B2", "B'"
            ]
        );
    }

    #[test]
    fn domino_moves() {
        assert_eq!(
            format_moves(&DOMINO_MOVES),
            "U U2 U' D D2 D' L2 R2 F2 B2"
        );
    }

    #[test]
    fn parse_and_invert() {
        let moves = parse_moves("R U2 F' B3 L1").unwrap();
        assert_eq!(format_moves(&moves), "R U2 F' B' L");
        assert_eq!(format_moves(&invert_moves(&moves)), "L' B F U2 R'");
        assert!(parse_moves("R X").is_err());
        assert!(parse_moves("R4").is_err());
        assert!(parse_moves("").unwrap().is_empty());
    }

    #[test]
    fn inverse_is_an_involution() {
        for move_ in Move::ALL {
            assert_eq!(move_.inverse().inverse(), move_);
            assert_eq!(move_.inverse().face(), move_.face());
        }
    }

    #[test]
    fn random_moves_alternate_faces() {
        let mut rng = fastrand::Rng::with_seed(7);
        let moves = random_moves(&mut rng, 200);
        assert_eq!(moves.len(), 200);
        assert!(moves.windows(2).all(|w| w[0].face() != w[1].face()));
    }

    #[test]
    fn serde_uses_notation() {
        let moves = parse_moves("U R2 F'").unwrap();
        let json = serde_json::to_string(&moves).unwrap();
        assert_eq!(json, r#"["U","R2","F'"]"#);
        let back: Vec<Move> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, moves);
    }
}
