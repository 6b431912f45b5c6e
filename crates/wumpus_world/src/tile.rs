//! Tile types: grid coordinates, directions, tile kinds, and belief state.

use serde::{Deserialize, Serialize};

/// Grid coordinate. `x` is the row, `y` the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: usize,
    pub y: usize,
}

impl GridPos {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Arena index of a tile inside a [`crate::grid::Grid`].
pub type TileId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Link iteration order. Ties broken by "first found" follow this order.
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn index(self) -> usize {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }
}

/// What a tile is. Immutable after map construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    Start,
    Empty,
    WormholeA,
    WormholeB,
    Pit,
    Creature,
}

impl TileKind {
    pub fn is_wormhole(self) -> bool {
        matches!(self, TileKind::WormholeA | TileKind::WormholeB)
    }
}

/// Three-level danger classification of a tile.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CostTier {
    Safe,
    Suspect,
    Danger,
}

impl CostTier {
    pub fn value(self) -> u8 {
        match self {
            CostTier::Safe => 1,
            CostTier::Suspect => 2,
            CostTier::Danger => 3,
        }
    }
}

/// One grid cell: identity, sensed cues, and the engine's mutable beliefs.
///
/// Neighbor links are arena indices resolved once at grid-build time.
/// Duplicate links are possible on small tori; wormhole tiles keep all
/// links unset because traversal redirects through them instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub pos: GridPos,
    pub kind: TileKind,
    pub breezy: bool,
    pub lair_marked: bool,
    pub visited: bool,
    pub cost: CostTier,
    pub breeze_evidence: u32,
    pub lair_evidence: u32,
    pub creature_likelihood: Option<u32>,
    pub links: [Option<TileId>; 4],
}

impl Tile {
    pub fn new(pos: GridPos, kind: TileKind) -> Self {
        Self {
            pos,
            kind,
            breezy: false,
            lair_marked: false,
            visited: false,
            cost: CostTier::Safe,
            breeze_evidence: 0,
            lair_evidence: 0,
            creature_likelihood: None,
            links: [None; 4],
        }
    }

    pub fn is_safe(&self) -> bool {
        self.cost == CostTier::Safe
    }

    pub fn link(&self, direction: Direction) -> Option<TileId> {
        self.links[direction.index()]
    }

    /// All resolved neighbor links in [`Direction::ALL`] order.
    /// Duplicates are preserved, matching the raw link table.
    pub fn neighbor_ids(&self) -> Vec<TileId> {
        self.links.iter().flatten().copied().collect()
    }
}
