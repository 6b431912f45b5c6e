//! The toroidal tile grid: arena storage, neighbor-graph construction with
//! wormhole redirection, radius-two neighborhoods, predicate queries, and
//! the safe-unvisited registry.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::tile::{CostTier, Direction, GridPos, Tile, TileId, TileKind};

/// Fixed `rows x cols` torus of tiles.
///
/// Tiles live in a flat arena indexed row-major; neighbor links are arena
/// indices, so the cyclic wraparound graph needs no shared ownership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    safe_unvisited: BTreeSet<GridPos>,
    linked: bool,
}

impl Grid {
    /// Builds a grid from pre-constructed tiles in row-major order.
    ///
    /// Panics if `tiles.len() != rows * cols` or a tile's position does not
    /// match its slot; both are programming errors, not map input errors.
    pub fn from_tiles(rows: usize, cols: usize, tiles: Vec<Tile>) -> Self {
        assert_eq!(
            tiles.len(),
            rows * cols,
            "tile arena does not match grid dimensions"
        );
        for (id, tile) in tiles.iter().enumerate() {
            assert_eq!(
                tile.pos,
                GridPos::new(id / cols, id % cols),
                "tile position does not match its arena slot"
            );
        }
        Self {
            rows,
            cols,
            tiles,
            safe_unvisited: BTreeSet::new(),
            linked: false,
        }
    }

    /// Convenience constructor from tile kinds alone.
    pub fn from_kinds(rows: usize, cols: usize, kinds: &[TileKind]) -> Self {
        let tiles = kinds
            .iter()
            .enumerate()
            .map(|(id, &kind)| Tile::new(GridPos::new(id / cols, id % cols), kind))
            .collect();
        Self::from_tiles(rows, cols, tiles)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Arena index for a coordinate. Out-of-range coordinates are a
    /// programming error.
    pub fn id_of(&self, pos: GridPos) -> TileId {
        assert!(
            pos.x < self.rows && pos.y < self.cols,
            "coordinate ({}, {}) outside {}x{} grid",
            pos.x,
            pos.y,
            self.rows,
            self.cols
        );
        pos.x * self.cols + pos.y
    }

    pub fn at(&self, pos: GridPos) -> &Tile {
        &self.tiles[self.id_of(pos)]
    }

    pub fn at_mut(&mut self, pos: GridPos) -> &mut Tile {
        let id = self.id_of(pos);
        &mut self.tiles[id]
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id]
    }

    pub fn tile_mut(&mut self, id: TileId) -> &mut Tile {
        &mut self.tiles[id]
    }

    /// Raw geometric neighbor with toroidal wraparound, no redirection.
    fn wrap_neighbor(&self, pos: GridPos, direction: Direction) -> GridPos {
        match direction {
            Direction::North => GridPos::new(
                if pos.x == 0 { self.rows - 1 } else { pos.x - 1 },
                pos.y,
            ),
            Direction::East => GridPos::new(pos.x, (pos.y + 1) % self.cols),
            Direction::South => GridPos::new((pos.x + 1) % self.rows, pos.y),
            Direction::West => GridPos::new(
                pos.x,
                if pos.y == 0 { self.cols - 1 } else { pos.y - 1 },
            ),
        }
    }

    fn redirect(kind: TileKind, direction: Direction) -> Direction {
        match kind {
            // A-type: north<->west, south<->east in the wormhole's frame.
            TileKind::WormholeA => match direction {
                Direction::North => Direction::West,
                Direction::East => Direction::South,
                Direction::South => Direction::East,
                Direction::West => Direction::North,
            },
            // B-type: north<->east, south<->west.
            TileKind::WormholeB => match direction {
                Direction::North => Direction::East,
                Direction::East => Direction::North,
                Direction::South => Direction::West,
                Direction::West => Direction::South,
            },
            _ => direction,
        }
    }

    /// Resolves the traversal neighbor in `direction`, applying at most one
    /// wormhole redirection hop. A redirected lookup landing on another
    /// wormhole makes the map unsupported input.
    fn resolve_neighbor(&self, pos: GridPos, direction: Direction) -> Result<TileId, MapError> {
        let raw = self.wrap_neighbor(pos, direction);
        let raw_kind = self.at(raw).kind;
        if !raw_kind.is_wormhole() {
            return Ok(self.id_of(raw));
        }
        let target = self.wrap_neighbor(raw, Self::redirect(raw_kind, direction));
        if self.at(target).kind.is_wormhole() {
            return Err(MapError::ChainedWormholes {
                from: raw,
                via: target,
            });
        }
        Ok(self.id_of(target))
    }

    /// Resolves all four directional links of every non-wormhole tile.
    ///
    /// Must run after all tiles are placed and before any neighbor query.
    /// Idempotent: a second call is a no-op.
    pub fn build_neighbor_graph(&mut self) -> Result<(), MapError> {
        if self.linked {
            return Ok(());
        }
        for id in 0..self.tiles.len() {
            if self.tiles[id].kind.is_wormhole() {
                continue;
            }
            let pos = self.tiles[id].pos;
            for direction in Direction::ALL {
                let neighbor = self.resolve_neighbor(pos, direction)?;
                self.tiles[id].links[direction.index()] = Some(neighbor);
            }
        }
        self.linked = true;
        Ok(())
    }

    /// Distinct tiles within two neighbor hops of `id`, excluding `id`
    /// itself, in discovery order. Up to 12 entries; wraparound and
    /// wormhole redirection can collapse paths to fewer. A one-hop
    /// neighbor that wraps back onto `id` is skipped together with its
    /// expansion.
    pub fn radius_two(&self, id: TileId) -> Vec<TileId> {
        let mut reachable: Vec<TileId> = Vec::new();
        for one_hop in self.tiles[id].neighbor_ids() {
            if one_hop == id {
                continue;
            }
            if !reachable.contains(&one_hop) {
                reachable.push(one_hop);
            }
            for two_hop in self.tiles[one_hop].neighbor_ids() {
                if two_hop != id && !reachable.contains(&two_hop) {
                    reachable.push(two_hop);
                }
            }
        }
        reachable
    }

    /// All tiles satisfying `predicate`, in row-major arena order.
    pub fn query(&self, predicate: impl Fn(&Tile) -> bool) -> Vec<TileId> {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| predicate(tile))
            .map(|(id, _)| id)
            .collect()
    }

    /// Unvisited tiles that have at least one visited neighbor: the
    /// exploration frontier. Wormhole tiles never appear (they hold no
    /// links).
    pub fn frontier(&self) -> Vec<TileId> {
        self.query(|tile| {
            !tile.visited
                && tile
                    .neighbor_ids()
                    .iter()
                    .any(|&n| self.tiles[n].visited)
        })
    }

    pub fn register_safe_unvisited(&mut self, pos: GridPos) {
        self.safe_unvisited.insert(pos);
    }

    pub fn unregister_safe_unvisited(&mut self, pos: GridPos) {
        self.safe_unvisited.remove(&pos);
    }

    /// Snapshot of the registry in key order.
    pub fn safe_unvisited(&self) -> Vec<GridPos> {
        self.safe_unvisited.iter().copied().collect()
    }

    /// Removes and returns the first registry entry in key order.
    pub fn pop_safe_unvisited(&mut self) -> Option<GridPos> {
        self.safe_unvisited.pop_first()
    }

    /// Checks the registry cache against its defining predicate:
    /// membership iff `!visited && cost == Safe`. Test support.
    pub fn registry_consistent(&self) -> bool {
        self.tiles.iter().all(|tile| {
            let should_hold = !tile.visited && tile.cost == CostTier::Safe;
            let holds = self.safe_unvisited.contains(&tile.pos);
            // Safe-but-undiscovered tiles are legitimately absent; the
            // registry must never hold a visited or unsafe tile.
            !holds || should_hold
        })
    }
}
