//! The full set of move and pruning tables, with a binary file cache so they
//! are only computed once per machine.

use crate::{
    coord::{Coord, CoordKind},
    move_table::MoveTable,
    moves::{DOMINO_MOVES, Move},
    pruning::PruningTable,
    start, success, working,
};
use log::{debug, info, warn};
use std::{
    fs, io,
    path::{Path, PathBuf},
    thread,
    time::Instant,
};
use thiserror::Error;

const MAGIC: &[u8; 4] = b"TWPH";
const FORMAT_VERSION: u32 = 1;

#[derive(Error, Debug)]
pub enum TableCacheError {
    #[error("Could not access the table cache: {0}")]
    Io(#[from] io::Error),
    #[error("The table cache is not a table file")]
    BadMagic,
    #[error("The table cache has format version {found} but {expected} is required")]
    VersionMismatch { found: u32, expected: u32 },
    #[error("The table cache is truncated or has the wrong table sizes")]
    Corrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tables {
    pub twist: MoveTable,
    pub flip: MoveTable,
    pub slice: MoveTable,
    pub corner_perm: MoveTable,
    pub ud_edge_perm: MoveTable,
    pub slice_edge_perm: MoveTable,
    pub slice_twist: PruningTable,
    pub slice_flip: PruningTable,
    pub corner_slice_perm: PruningTable,
    pub ud_edge_slice_perm: PruningTable,
}

fn join<T>(handle: thread::ScopedJoinHandle<'_, T>) -> T {
    handle
        .join()
        .unwrap_or_else(|e| std::panic::resume_unwind(e))
}

impl Tables {
    /// Compute every table from scratch. Independent tables are built on
    /// separate threads.
    #[must_use]
    pub fn generate() -> Self {
        info!(start!("Generating move and pruning tables"));
        let started = Instant::now();

        let [twist, flip, slice, corner_perm, ud_edge_perm, slice_edge_perm] =
            thread::scope(|s| {
                CoordKind::ALL
                    .map(|kind| s.spawn(move || MoveTable::generate(kind)))
                    .map(join)
            });
        debug!(working!("Move tables done in {:.3}s"), started.elapsed().as_secs_f64());

        let (slice_twist, slice_flip, corner_slice_perm, ud_edge_slice_perm) =
            thread::scope(|s| {
                let slice_twist = s.spawn(|| PruningTable::generate(&slice, &twist, &Move::ALL));
                let slice_flip = s.spawn(|| PruningTable::generate(&slice, &flip, &Move::ALL));
                let corner_slice_perm = s.spawn(|| {
                    PruningTable::generate(&corner_perm, &slice_edge_perm, &DOMINO_MOVES)
                });
                let ud_edge_slice_perm = s.spawn(|| {
                    PruningTable::generate(&ud_edge_perm, &slice_edge_perm, &DOMINO_MOVES)
                });
                (
                    join(slice_twist),
                    join(slice_flip),
                    join(corner_slice_perm),
                    join(ud_edge_slice_perm),
                )
            });

        info!(
            success!("Generated tables in {:.3}s"),
            started.elapsed().as_secs_f64()
        );

        Self {
            twist,
            flip,
            slice,
            corner_perm,
            ud_edge_perm,
            slice_edge_perm,
            slice_twist,
            slice_flip,
            corner_slice_perm,
            ud_edge_slice_perm,
        }
    }

    fn move_tables(&self) -> [&MoveTable; 6] {
        [
            &self.twist,
            &self.flip,
            &self.slice,
            &self.corner_perm,
            &self.ud_edge_perm,
            &self.slice_edge_perm,
        ]
    }

    fn pruning_tables(&self) -> [&PruningTable; 4] {
        [
            &self.slice_twist,
            &self.slice_flip,
            &self.corner_slice_perm,
            &self.ud_edge_slice_perm,
        ]
    }

    /// Serialize into the cache format: magic, version, then each table as a
    /// little endian length followed by little endian entries.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut stream = Vec::new();
        stream.extend_from_slice(MAGIC);
        stream.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        for table in self.move_tables() {
            let data = table.as_slice();
            stream.extend_from_slice(&(data.len() as u32).to_le_bytes());
            for coord in data {
                stream.extend_from_slice(&coord.to_le_bytes());
            }
        }
        for table in self.pruning_tables() {
            let data = table.as_slice();
            stream.extend_from_slice(&(data.len() as u32).to_le_bytes());
            stream.extend_from_slice(data);
        }

        stream
    }

    /// # Errors
    ///
    /// Fails if the data was not produced by `encode` of this format version.
    pub fn decode(mut data: &[u8]) -> Result<Self, TableCacheError> {
        let (magic, new_data) = data.split_first_chunk::<4>().ok_or(TableCacheError::BadMagic)?;
        data = new_data;
        if magic != MAGIC {
            return Err(TableCacheError::BadMagic);
        }
        let (version, new_data) = data.split_first_chunk::<4>().ok_or(TableCacheError::Corrupt)?;
        data = new_data;
        let version = u32::from_le_bytes(*version);
        if version != FORMAT_VERSION {
            return Err(TableCacheError::VersionMismatch {
                found: version,
                expected: FORMAT_VERSION,
            });
        }

        let mut take_moves = |kind: CoordKind| -> Result<MoveTable, TableCacheError> {
            let chunk = take_chunk(&mut data, size_of::<Coord>())?;
            let coords = chunk
                .chunks_exact(size_of::<Coord>())
                .map(|bytes| Coord::from_le_bytes([bytes[0], bytes[1]]))
                .collect();
            MoveTable::from_raw(kind, coords).ok_or(TableCacheError::Corrupt)
        };
        let twist = take_moves(CoordKind::Twist)?;
        let flip = take_moves(CoordKind::Flip)?;
        let slice = take_moves(CoordKind::Slice)?;
        let corner_perm = take_moves(CoordKind::CornerPerm)?;
        let ud_edge_perm = take_moves(CoordKind::UdEdgePerm)?;
        let slice_edge_perm = take_moves(CoordKind::SliceEdgePerm)?;

        let mut take_pruning =
            |kinds: (CoordKind, CoordKind)| -> Result<PruningTable, TableCacheError> {
                let chunk = take_chunk(&mut data, 1)?;
                PruningTable::from_raw(kinds, chunk.into()).ok_or(TableCacheError::Corrupt)
            };
        let slice_twist = take_pruning((CoordKind::Slice, CoordKind::Twist))?;
        let slice_flip = take_pruning((CoordKind::Slice, CoordKind::Flip))?;
        let corner_slice_perm = take_pruning((CoordKind::CornerPerm, CoordKind::SliceEdgePerm))?;
        let ud_edge_slice_perm = take_pruning((CoordKind::UdEdgePerm, CoordKind::SliceEdgePerm))?;

        if !data.is_empty() {
            return Err(TableCacheError::Corrupt);
        }

        Ok(Self {
            twist,
            flip,
            slice,
            corner_perm,
            ud_edge_perm,
            slice_edge_perm,
            slice_twist,
            slice_flip,
            corner_slice_perm,
            ud_edge_slice_perm,
        })
    }

    /// # Errors
    ///
    /// Fails if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), TableCacheError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        // Readers must never see a partial file.
        let partial = path.with_extension("partial");
        fs::write(&partial, self.encode())?;
        fs::rename(&partial, path)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid table cache.
    pub fn load(path: &Path) -> Result<Self, TableCacheError> {
        Self::decode(&fs::read(path)?)
    }

    /// Load the tables from `cache`, regenerating and rewriting the cache if it
    /// is missing or unusable. A `None` cache always regenerates.
    #[must_use]
    pub fn load_or_generate(cache: Option<&Path>) -> Self {
        let Some(path) = cache else {
            return Self::generate();
        };

        match Self::load(path) {
            Ok(tables) => {
                info!(success!("Loaded tables from {}"), path.display());
                return tables;
            }
            Err(TableCacheError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No table cache at {}", path.display());
            }
            Err(e) => warn!("Ignoring table cache at {}: {e}", path.display()),
        }

        let tables = Self::generate();
        match tables.save(path) {
            Ok(()) => info!(success!("Saved tables to {}"), path.display()),
            Err(e) => warn!("Failed to save tables to {}: {e}", path.display()),
        }
        tables
    }
}

/// `<cache dir>/twophase/tables.bin`, if the platform has a cache directory.
#[must_use]
pub fn default_cache_path() -> Option<PathBuf> {
    let mut cache = dirs::cache_dir()?;
    cache.push("twophase");
    cache.push("tables.bin");
    Some(cache)
}

fn take_chunk<'a>(data: &mut &'a [u8], width: usize) -> Result<&'a [u8], TableCacheError> {
    let (len, rest) = data.split_first_chunk::<4>().ok_or(TableCacheError::Corrupt)?;
    let len = u32::from_le_bytes(*len) as usize * width;
    if rest.len() < len {
        return Err(TableCacheError::Corrupt);
    }
    let (chunk, rest) = rest.split_at(len);
    *data = rest;
    Ok(chunk)
}

/// Built once per test binary.
#[cfg(test)]
pub(crate) static TEST_TABLES: std::sync::LazyLock<Tables> =
    std::sync::LazyLock::new(Tables::generate);
