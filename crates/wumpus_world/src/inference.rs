//! Incremental hazard inference over the grid: per-tile belief updates,
//! evidence propagation, neighbor-consensus resolution, and creature
//! likelihood scoring.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::tile::{CostTier, TileId, TileKind};

/// Likelihood contributed by each corroborating lair-affected neighbor.
pub const LIKELIHOOD_PER_LAIR_NEIGHBOR: u32 = 10;

/// Minimum creature likelihood before a tile is reported as the likely
/// creature location: three corroborating lair-affected visited neighbors.
pub const CREATURE_CONFIDENCE_THRESHOLD: u32 = 30;

/// The agent's belief engine. All belief state lives on the tiles; the
/// engine itself only carries the per-run neutralization flag, so every
/// simulation run owns an independent instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceEngine {
    creature_neutralized: bool,
}

impl InferenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn creature_neutralized(&self) -> bool {
        self.creature_neutralized
    }

    /// Evaluates the currently occupied tile. A no-op when the tile is
    /// already visited: beliefs freeze on first evaluation.
    pub fn evaluate_tile(&mut self, grid: &mut Grid, id: TileId) {
        if grid.tile(id).visited {
            return;
        }
        self.assign_own_cost(grid, id);
        self.propagate_evidence(grid, id);
        self.resolve_consensus(grid);
        self.score_creature_candidates(grid);
    }

    /// Step 1 and 2: cost from the tile's own kind and sensed cues, then
    /// mark visited. Visiting always evicts the tile from the registry,
    /// which only ever holds unvisited tiles.
    fn assign_own_cost(&self, grid: &mut Grid, id: TileId) {
        let tile = grid.tile(id);
        let pos = tile.pos;
        let cost = if tile.kind == TileKind::Pit
            || (tile.kind == TileKind::Creature && !self.creature_neutralized)
        {
            CostTier::Danger
        } else if tile.breezy || (tile.lair_marked && !self.creature_neutralized) {
            CostTier::Suspect
        } else {
            CostTier::Safe
        };
        let tile = grid.tile_mut(id);
        tile.cost = cost;
        tile.visited = true;
        grid.unregister_safe_unvisited(pos);
    }

    /// Step 3: push evidence outward. Breeze taints the 1-hop neighbors,
    /// lair scent taints the radius-two neighborhood; a cue-free tile
    /// instead promotes its safe unvisited neighbors into the registry.
    fn propagate_evidence(&self, grid: &mut Grid, id: TileId) {
        let breezy = grid.tile(id).breezy;
        let lair_marked = grid.tile(id).lair_marked;

        if breezy {
            for neighbor in grid.tile(id).neighbor_ids() {
                grid.tile_mut(neighbor).breeze_evidence += 1;
                Self::suspect_if_unvisited(grid, neighbor);
            }
        }

        if lair_marked {
            for neighbor in grid.radius_two(id) {
                grid.tile_mut(neighbor).lair_evidence += 1;
                Self::suspect_if_unvisited(grid, neighbor);
            }
        }

        if !breezy && !lair_marked {
            for neighbor in grid.tile(id).neighbor_ids() {
                let tile = grid.tile(neighbor);
                if !tile.visited && tile.is_safe() {
                    grid.register_safe_unvisited(tile.pos);
                }
            }
        }
    }

    fn suspect_if_unvisited(grid: &mut Grid, id: TileId) {
        let tile = grid.tile(id);
        if !tile.visited {
            let pos = tile.pos;
            grid.tile_mut(id).cost = CostTier::Suspect;
            grid.unregister_safe_unvisited(pos);
        }
    }

    /// Steps 4 and 5: recompute every unvisited non-wormhole tile with
    /// visited neighbors from neighbor consensus, then reverse danger
    /// verdicts that rest on mutually inconsistent evidence.
    fn resolve_consensus(&self, grid: &mut Grid) {
        let unknowns = grid.query(|tile| !tile.visited && !tile.kind.is_wormhole());
        for unknown in unknowns {
            let visited_neighbors: Vec<TileId> = grid
                .tile(unknown)
                .neighbor_ids()
                .into_iter()
                .filter(|&n| grid.tile(n).visited)
                .collect();
            if visited_neighbors.is_empty() {
                continue;
            }

            let pos = grid.tile(unknown).pos;
            if visited_neighbors.iter().any(|&n| grid.tile(n).is_safe()) {
                // A safe visited neighbor would have sensed any adjacent
                // hazard: the unknown tile cannot be dangerous.
                grid.tile_mut(unknown).cost = CostTier::Safe;
                grid.register_safe_unvisited(pos);
            } else {
                grid.tile_mut(unknown).cost = CostTier::Danger;
                grid.unregister_safe_unvisited(pos);
                self.override_inconsistent_danger(grid, unknown, &visited_neighbors);
            }
        }
    }

    /// Step 5: a tile surrounded by more than two suspect neighbors whose
    /// cues mix breeze and lair scent is only truly dangerous when a
    /// single hazard type accounts for every suspect neighbor. Otherwise
    /// no one hazard explains the evidence and the tile must be safe.
    fn override_inconsistent_danger(
        &self,
        grid: &mut Grid,
        unknown: TileId,
        visited_neighbors: &[TileId],
    ) {
        let suspects: Vec<TileId> = visited_neighbors
            .iter()
            .copied()
            .filter(|&n| grid.tile(n).cost == CostTier::Suspect)
            .collect();
        let lair_count = suspects.iter().filter(|&&n| grid.tile(n).lair_marked).count();
        let breezy_count = suspects.iter().filter(|&&n| grid.tile(n).breezy).count();

        if suspects.len() <= 2 || lair_count == 0 || breezy_count == 0 {
            return;
        }

        let fully_lair = lair_count == suspects.len();
        let fully_breezy = breezy_count == suspects.len();
        if fully_lair != fully_breezy {
            // Exactly one partition explains all suspect neighbors; the
            // danger verdict stands.
            return;
        }

        let pos = grid.tile(unknown).pos;
        grid.tile_mut(unknown).cost = CostTier::Safe;
        grid.register_safe_unvisited(pos);
    }

    /// Step 6: score candidate creature tiles. A non-safe tile whose
    /// visited neighbors all carry the lair cue scores ten per neighbor.
    fn score_creature_candidates(&self, grid: &mut Grid) {
        let candidates = grid.query(|tile| !tile.is_safe());
        for candidate in candidates {
            let visited_neighbors: Vec<TileId> = grid
                .tile(candidate)
                .neighbor_ids()
                .into_iter()
                .filter(|&n| grid.tile(n).visited)
                .collect();
            let lair_count = visited_neighbors
                .iter()
                .filter(|&&n| grid.tile(n).lair_marked)
                .count();
            if lair_count == visited_neighbors.len() {
                grid.tile_mut(candidate).creature_likelihood =
                    Some(LIKELIHOOD_PER_LAIR_NEIGHBOR * lair_count as u32);
            }
        }
    }

    /// Highest-scoring creature candidate, if its score clears the
    /// confidence threshold. Ties resolve to the first in arena order.
    pub fn likely_creature_cell(&self, grid: &Grid) -> Option<TileId> {
        let mut best: Option<(TileId, u32)> = None;
        for id in grid.query(|tile| tile.creature_likelihood.is_some()) {
            let Some(score) = grid.tile(id).creature_likelihood else {
                continue;
            };
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((id, score)),
            }
        }
        best.and_then(|(id, score)| (score >= CREATURE_CONFIDENCE_THRESHOLD).then_some(id))
    }

    /// Retires danger signals attributable to the creature after it has
    /// been eliminated: the creature tile and its non-breezy neighbors
    /// become safe. Breeze evidence belongs to pits and is untouched.
    pub fn neutralize(&mut self, grid: &mut Grid, id: TileId) {
        self.creature_neutralized = true;
        Self::force_safe(grid, id);
        for neighbor in grid.tile(id).neighbor_ids() {
            if grid.tile(neighbor).breezy {
                continue;
            }
            Self::force_safe(grid, neighbor);
        }
    }

    fn force_safe(grid: &mut Grid, id: TileId) {
        let tile = grid.tile_mut(id);
        tile.cost = CostTier::Safe;
        if !tile.visited {
            let pos = tile.pos;
            grid.register_safe_unvisited(pos);
        }
    }

    /// True when the exploration frontier exists but holds no safe tile:
    /// every reachable safe tile has been visited.
    pub fn all_safe_tiles_visited(&self, grid: &Grid) -> bool {
        let frontier = grid.frontier();
        !frontier.is_empty() && !frontier.iter().any(|&id| grid.tile(id).is_safe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{GridPos, TileKind};

    fn linked_grid(rows: usize, cols: usize, kinds: &[TileKind]) -> Grid {
        let mut grid = Grid::from_kinds(rows, cols, kinds);
        grid.build_neighbor_graph().unwrap();
        grid
    }

    fn empty_kinds(n: usize) -> Vec<TileKind> {
        vec![TileKind::Empty; n]
    }

    #[test]
    fn evaluate_is_idempotent() {
        let mut kinds = empty_kinds(25);
        kinds[12] = TileKind::Start;
        let mut grid = linked_grid(5, 5, &kinds);
        grid.at_mut(GridPos::new(2, 2)).breezy = true;

        let mut engine = InferenceEngine::new();
        let start = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, start);
        let snapshot = grid.clone();
        engine.evaluate_tile(&mut grid, start);
        assert_eq!(grid, snapshot);
    }

    #[test]
    fn breeze_taints_one_hop_neighbors() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        grid.at_mut(GridPos::new(2, 2)).breezy = true;

        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);

        assert_eq!(grid.at(GridPos::new(2, 2)).cost, CostTier::Suspect);
        for pos in [
            GridPos::new(1, 2),
            GridPos::new(2, 3),
            GridPos::new(3, 2),
            GridPos::new(2, 1),
        ] {
            assert_eq!(grid.at(pos).breeze_evidence, 1);
            // Step 3 marks them suspect; the consensus pass then hardens
            // them to danger because their only visited neighbor is the
            // breezy tile itself.
            assert_eq!(grid.at(pos).cost, CostTier::Danger);
        }
        // Two hops away is untouched by breeze.
        assert_eq!(grid.at(GridPos::new(0, 2)).breeze_evidence, 0);
        assert!(grid.safe_unvisited().is_empty());
    }

    #[test]
    fn lair_scent_taints_radius_two() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        grid.at_mut(GridPos::new(2, 2)).lair_marked = true;

        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);

        assert_eq!(grid.at(GridPos::new(0, 2)).lair_evidence, 1);
        assert_eq!(grid.at(GridPos::new(1, 1)).lair_evidence, 1);
        assert_eq!(grid.at(GridPos::new(0, 2)).cost, CostTier::Suspect);
        // Beyond two hops is untouched.
        assert_eq!(grid.at(GridPos::new(0, 0)).lair_evidence, 0);
    }

    #[test]
    fn quiet_tile_registers_safe_neighbors() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);

        let registered = grid.safe_unvisited();
        for pos in [
            GridPos::new(1, 2),
            GridPos::new(2, 1),
            GridPos::new(2, 3),
            GridPos::new(3, 2),
        ] {
            assert!(registered.contains(&pos));
        }
        assert!(!registered.contains(&GridPos::new(2, 2)));
    }

    #[test]
    fn visiting_evicts_tile_from_registry() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);
        assert!(grid.safe_unvisited().contains(&GridPos::new(2, 3)));

        let east = grid.id_of(GridPos::new(2, 3));
        engine.evaluate_tile(&mut grid, east);
        assert!(!grid.safe_unvisited().contains(&GridPos::new(2, 3)));
        assert!(grid.registry_consistent());
    }

    #[test]
    fn consensus_forces_safe_next_to_safe_visited_neighbor() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        // Suspect (1, 2) by hand, then evaluate the quiet tile (2, 2):
        // the consensus pass must clear the suspicion.
        grid.at_mut(GridPos::new(1, 2)).cost = CostTier::Suspect;

        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);

        assert_eq!(grid.at(GridPos::new(1, 2)).cost, CostTier::Safe);
        assert!(grid.safe_unvisited().contains(&GridPos::new(1, 2)));
    }

    #[test]
    fn consensus_forces_danger_without_safe_neighbors() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        grid.at_mut(GridPos::new(2, 2)).breezy = true;

        let mut engine = InferenceEngine::new();
        let center = grid.id_of(GridPos::new(2, 2));
        engine.evaluate_tile(&mut grid, center);

        // (1, 2)'s only visited neighbor is the breezy suspect tile.
        assert_eq!(grid.at(GridPos::new(1, 2)).cost, CostTier::Danger);
        assert!(!grid.safe_unvisited().contains(&GridPos::new(1, 2)));
    }

    #[test]
    fn creature_score_needs_three_corroborating_neighbors() {
        let mut grid = linked_grid(5, 5, &empty_kinds(25));
        let candidate = GridPos::new(2, 2);

        // Two visited lair-affected neighbors: score 20, below threshold.
        for pos in [GridPos::new(1, 2), GridPos::new(2, 1)] {
            let tile = grid.at_mut(pos);
            tile.visited = true;
            tile.lair_marked = true;
            tile.cost = CostTier::Suspect;
        }
        grid.at_mut(candidate).cost = CostTier::Suspect;

        let engine = InferenceEngine::new();
        engine.score_creature_candidates(&mut grid);
        assert_eq!(grid.at(candidate).creature_likelihood, Some(20));
        assert_eq!(engine.likely_creature_cell(&grid), None);

        // A third corroborating neighbor crosses the threshold.
        let tile = grid.at_mut(GridPos::new(3, 2));
        tile.visited = true;
        tile.lair_marked = true;
        tile.cost = CostTier::Suspect;
        engine.score_creature_candidates(&mut grid);
        assert_eq!(grid.at(candidate).creature_likelihood, Some(30));
        assert_eq!(
            engine.likely_creature_cell(&grid),
            Some(grid.id_of(candidate))
        );
    }

    #[test]
    fn neutralize_clears_creature_and_non_breezy_neighbors() {
        let mut kinds = empty_kinds(25);
        kinds[12] = TileKind::Creature;
        let mut grid = linked_grid(5, 5, &kinds);
        let creature = grid.id_of(GridPos::new(2, 2));
        grid.tile_mut(creature).cost = CostTier::Danger;
        for pos in [GridPos::new(1, 2), GridPos::new(2, 1), GridPos::new(3, 2)] {
            grid.at_mut(pos).cost = CostTier::Suspect;
        }
        // One neighbor also borders a pit: its breeze must survive.
        let breezy = grid.at_mut(GridPos::new(2, 3));
        breezy.breezy = true;
        breezy.cost = CostTier::Suspect;

        let mut engine = InferenceEngine::new();
        engine.neutralize(&mut grid, creature);

        assert!(engine.creature_neutralized());
        assert_eq!(grid.at(GridPos::new(2, 2)).cost, CostTier::Safe);
        assert!(grid.safe_unvisited().contains(&GridPos::new(2, 2)));
        for pos in [GridPos::new(1, 2), GridPos::new(2, 1), GridPos::new(3, 2)] {
            assert_eq!(grid.at(pos).cost, CostTier::Safe);
            assert!(grid.safe_unvisited().contains(&pos));
        }
        assert_eq!(grid.at(GridPos::new(2, 3)).cost, CostTier::Suspect);
        assert!(!grid.safe_unvisited().contains(&GridPos::new(2, 3)));
    }

    #[test]
    fn all_safe_tiles_visited_tracks_frontier() {
        let mut grid = linked_grid(3, 3, &empty_kinds(9));
        let engine = InferenceEngine::new();
        // No frontier at all: not "all visited".
        assert!(!engine.all_safe_tiles_visited(&grid));

        grid.at_mut(GridPos::new(1, 1)).visited = true;
        // Frontier of safe tiles remains.
        assert!(!engine.all_safe_tiles_visited(&grid));

        for pos in [
            GridPos::new(0, 1),
            GridPos::new(1, 0),
            GridPos::new(1, 2),
            GridPos::new(2, 1),
        ] {
            grid.at_mut(pos).cost = CostTier::Suspect;
        }
        assert!(engine.all_safe_tiles_visited(&grid));
    }
}
