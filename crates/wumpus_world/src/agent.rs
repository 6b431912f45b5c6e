//! The exploring agent: elimination attempts, the tiered move policy, and
//! path search over the visited subgraph.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::inference::InferenceEngine;
use crate::simulation::SimEvent;
use crate::tile::{CostTier, TileId, TileKind};

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationCause {
    CreatureCollision,
    PitCollision,
    CreatureNeutralized,
    Surrender,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Termination {
    pub won: bool,
    pub cause: TerminationCause,
}

/// Per-run agent state. Bound to one grid; never shared across runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    current: TileId,
    start: TileId,
    arrows: u32,
    moves: u64,
    visited_record: Vec<TileId>,
    termination: Option<Termination>,
    stalled: bool,
}

impl Agent {
    pub fn new(start: TileId) -> Self {
        Self {
            current: start,
            start,
            arrows: 1,
            moves: 0,
            visited_record: Vec::new(),
            termination: None,
            stalled: false,
        }
    }

    pub fn current(&self) -> TileId {
        self.current
    }

    pub fn start(&self) -> TileId {
        self.start
    }

    pub fn at_start(&self) -> bool {
        self.current == self.start
    }

    pub fn arrows(&self) -> u32 {
        self.arrows
    }

    pub fn moves(&self) -> u64 {
        self.moves
    }

    /// Distinct tiles moved onto, in first-visit order. The start tile
    /// only appears if the agent later walks back onto it.
    pub fn visited_record(&self) -> &[TileId] {
        &self.visited_record
    }

    pub fn termination(&self) -> Option<Termination> {
        self.termination
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_some()
    }

    /// Pre-move hazard elimination. Fires when a likely creature tile is
    /// known, an arrow remains, and the tile borders the agent. The arrow
    /// is spent regardless of the outcome; only a hit ends the run.
    ///
    /// Returns true when the run terminated here (creature neutralized).
    pub fn try_eliminate(
        &mut self,
        grid: &mut Grid,
        engine: &mut InferenceEngine,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        if self.arrows == 0 {
            return false;
        }
        let Some(target) = engine.likely_creature_cell(grid) else {
            return false;
        };
        if !grid.tile(self.current).neighbor_ids().contains(&target) {
            return false;
        }

        self.arrows = 0;
        let hit = grid.tile(target).kind == TileKind::Creature;
        events.push(SimEvent::EliminationAttempted {
            target: grid.tile(target).pos,
            hit,
        });
        if hit {
            engine.neutralize(grid, target);
            self.terminate(true, TerminationCause::CreatureNeutralized, events);
            return true;
        }
        false
    }

    /// One movement turn: evaluate the current tile, then apply the move
    /// policy rules in strict precedence.
    pub fn take_turn(
        &mut self,
        grid: &mut Grid,
        engine: &mut InferenceEngine,
        events: &mut Vec<SimEvent>,
    ) {
        engine.evaluate_tile(grid, self.current);
        events.push(SimEvent::TileEvaluated {
            tile: grid.tile(self.current).pos,
        });

        let moves_before = self.moves;

        if !self.step_to_safe_neighbor(grid, events)
            && !self.pursue_registry_target(grid, events)
            && !self.pursue_creature(grid, engine, events)
            && !self.risk_least_suspect_neighbor(grid, events)
        {
            self.terminate(false, TerminationCause::Surrender, events);
        }

        // A turn that moved nothing and ended nothing left the whole
        // simulation state unchanged; a second such turn in a row is a
        // fixpoint, so the run can never progress again.
        if self.termination.is_none() {
            if self.moves == moves_before {
                if self.stalled {
                    self.terminate(false, TerminationCause::Surrender, events);
                } else {
                    self.stalled = true;
                }
            } else {
                self.stalled = false;
            }
        }
    }

    /// Rule 1: first unvisited neighbor currently believed safe, in link
    /// order.
    fn step_to_safe_neighbor(&mut self, grid: &mut Grid, events: &mut Vec<SimEvent>) -> bool {
        let dest = grid.tile(self.current).neighbor_ids().into_iter().find(|&n| {
            let tile = grid.tile(n);
            !tile.visited && tile.cost <= CostTier::Safe
        });
        match dest {
            Some(dest) => {
                self.move_to(grid, dest, events);
                true
            }
            None => false,
        }
    }

    /// Rule 2: pop a safe-unvisited registry entry, walk the visited
    /// subgraph to one of its visited neighbors, then step onto it.
    fn pursue_registry_target(&mut self, grid: &mut Grid, events: &mut Vec<SimEvent>) -> bool {
        let Some(target_pos) = grid.pop_safe_unvisited() else {
            return false;
        };
        let target = grid.id_of(target_pos);
        let Some(via) = grid
            .tile(target)
            .neighbor_ids()
            .into_iter()
            .find(|&n| grid.tile(n).visited)
        else {
            // Keep the entry around for later turns rather than losing
            // a still-safe tile from the registry.
            grid.register_safe_unvisited(target_pos);
            return false;
        };
        let Some(path) = visited_path(grid, self.current, via) else {
            grid.register_safe_unvisited(target_pos);
            return false;
        };
        for step in path {
            self.move_to(grid, step, events);
            if self.termination.is_some() {
                return true;
            }
        }
        self.move_to(grid, target, events);
        true
    }

    /// Rule 3: approach the likely creature's vicinity through visited
    /// territory, stopping one cell short of the path's end. A length-1
    /// path yields no move this turn.
    fn pursue_creature(
        &mut self,
        grid: &mut Grid,
        engine: &InferenceEngine,
        events: &mut Vec<SimEvent>,
    ) -> bool {
        let Some(creature) = engine.likely_creature_cell(grid) else {
            return false;
        };
        let Some(via) = grid
            .tile(creature)
            .neighbor_ids()
            .into_iter()
            .find(|&n| grid.tile(n).visited)
        else {
            return false;
        };
        let Some(path) = visited_path(grid, self.current, via) else {
            return false;
        };
        if path.is_empty() {
            // Already standing on the creature's visited neighbor.
            return false;
        }
        let last = path.len() - 1;
        for &step in &path[..last] {
            self.move_to(grid, step, events);
            if self.termination.is_some() {
                return true;
            }
        }
        true
    }

    /// Rule 4: least-evidence unvisited neighbor, first found on ties.
    fn risk_least_suspect_neighbor(&mut self, grid: &mut Grid, events: &mut Vec<SimEvent>) -> bool {
        let mut best: Option<(TileId, u32)> = None;
        for neighbor in grid.tile(self.current).neighbor_ids() {
            let tile = grid.tile(neighbor);
            if tile.visited {
                continue;
            }
            let risk = tile.breeze_evidence + tile.lair_evidence;
            if best.map_or(true, |(_, lowest)| risk < lowest) {
                best = Some((neighbor, risk));
            }
        }
        match best {
            Some((dest, _)) => {
                self.move_to(grid, dest, events);
                true
            }
            None => false,
        }
    }

    /// Executes one physical step: position, visit record, move counter,
    /// and the terminal hazard check.
    fn move_to(&mut self, grid: &Grid, dest: TileId, events: &mut Vec<SimEvent>) {
        let from = grid.tile(self.current).pos;
        self.current = dest;
        if !self.visited_record.contains(&dest) {
            self.visited_record.push(dest);
        }
        self.moves += 1;
        events.push(SimEvent::AgentMoved {
            from,
            to: grid.tile(dest).pos,
        });

        match grid.tile(dest).kind {
            TileKind::Creature => {
                self.terminate(false, TerminationCause::CreatureCollision, events);
            }
            TileKind::Pit => {
                self.terminate(false, TerminationCause::PitCollision, events);
            }
            _ => {}
        }
    }

    fn terminate(&mut self, won: bool, cause: TerminationCause, events: &mut Vec<SimEvent>) {
        self.termination = Some(Termination { won, cause });
        events.push(SimEvent::Terminated { cause });
    }
}

/// Depth-first path search restricted to visited tiles.
///
/// Expansion is last-discovered-first, so the result is a valid path
/// through visited territory but not necessarily the shortest one. The
/// returned sequence excludes `source` and includes `dest`; equal
/// endpoints yield an empty path, and `None` means `dest` is not
/// reachable through visited tiles.
pub fn visited_path(grid: &Grid, source: TileId, dest: TileId) -> Option<Vec<TileId>> {
    if source == dest {
        return Some(Vec::new());
    }

    let mut discovered: BTreeSet<TileId> = BTreeSet::new();
    let mut predecessor: BTreeMap<TileId, TileId> = BTreeMap::new();
    let mut stack = vec![source];
    discovered.insert(source);

    while let Some(current) = stack.pop() {
        if current == dest {
            break;
        }
        for neighbor in grid.tile(current).neighbor_ids() {
            if grid.tile(neighbor).visited && discovered.insert(neighbor) {
                predecessor.insert(neighbor, current);
                stack.push(neighbor);
            }
        }
    }

    let mut path = Vec::new();
    let mut cursor = dest;
    while cursor != source {
        path.push(cursor);
        cursor = *predecessor.get(&cursor)?;
    }
    path.reverse();
    Some(path)
}
