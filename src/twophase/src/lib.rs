#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::too_many_lines)]

pub(crate) mod canonical;
pub mod config;
pub mod coord;
pub mod cube;
pub mod facelet;
pub mod history;
pub mod move_table;
pub mod moves;
pub mod pruning;
pub mod search;
pub mod solver;
pub mod tables;

pub use config::{SearchStrategy, SolverConfig};
pub use cube::CubeState;
pub use moves::Move;
pub use solver::{Solution, SolveError, Solver};
pub use tables::Tables;

#[macro_export]
macro_rules! start {
    ($msg:expr) => {
        concat!("⏳ ", $msg)
    };
}

#[macro_export]
macro_rules! working {
    ($msg:expr) => {
        concat!("🛠  ", $msg)
    };
}

#[macro_export]
macro_rules! success {
    ($msg:expr) => {
        concat!("✅ ", $msg)
    };
}

const FACT_UNTIL_12: [u32; 13] = {
    let mut arr = [0; 13];
    arr[0] = 1;
    let mut i = 1;
    while i < arr.len() {
        arr[i] = arr[i - 1] * i as u32;
        i += 1;
    }
    arr
};
