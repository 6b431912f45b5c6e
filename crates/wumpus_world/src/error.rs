//! Construction-time error types.

use std::fmt;

use crate::tile::GridPos;

/// Precondition violations rejected while decoding a raw map.
///
/// Nothing in the running simulation produces these; terminal game
/// outcomes are data on the outcome record, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapError {
    EmptyMap,
    RaggedRows { row: usize, expected: usize, found: usize },
    UnknownCode { pos: GridPos, code: u8 },
    MissingStart,
    DuplicateStart { first: GridPos, second: GridPos },
    ChainedWormholes { from: GridPos, via: GridPos },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::EmptyMap => write!(f, "map has no rows or no columns"),
            MapError::RaggedRows {
                row,
                expected,
                found,
            } => write!(
                f,
                "row {row} has {found} columns, expected {expected}"
            ),
            MapError::UnknownCode { pos, code } => write!(
                f,
                "unknown cell code {code} at ({}, {})",
                pos.x, pos.y
            ),
            MapError::MissingStart => write!(f, "map has no start cell"),
            MapError::DuplicateStart { first, second } => write!(
                f,
                "multiple start cells: ({}, {}) and ({}, {})",
                first.x, first.y, second.x, second.y
            ),
            MapError::ChainedWormholes { from, via } => write!(
                f,
                "wormhole at ({}, {}) redirects into another wormhole at ({}, {}); \
                 chained wormholes are unsupported",
                from.x, from.y, via.x, via.y
            ),
        }
    }
}

impl std::error::Error for MapError {}
