//! Per-run simulation driver: raw-map decoding, hazard-flag seeding, the
//! turn loop, the event journal, and the outcome record handed to callers.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::agent::{Agent, TerminationCause};
use crate::error::MapError;
use crate::grid::Grid;
use crate::inference::InferenceEngine;
use crate::tile::{GridPos, TileKind};

pub const DEFAULT_ROWS: usize = 7;
pub const DEFAULT_COLS: usize = 10;

/// Journal entry recorded while a run executes. Serializable so a batch
/// harness can dump a run's history alongside its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum SimEvent {
    TileEvaluated { tile: GridPos },
    EliminationAttempted { target: GridPos, hit: bool },
    AgentMoved { from: GridPos, to: GridPos },
    Terminated { cause: TerminationCause },
}

/// The record produced when a run terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutcome {
    pub won: bool,
    pub cause: TerminationCause,
    pub moves: u64,
    pub distinct_visited: u64,
    /// `distinct_visited / moves`, or 0 when the agent never moved.
    pub move_ratio: f64,
    pub duration_secs: f64,
}

/// One independent simulation run: a fresh grid, inference engine, and
/// agent. Nothing is shared across runs, so batch callers may execute
/// many `Simulation` values in parallel.
#[derive(Debug)]
pub struct Simulation {
    grid: Grid,
    engine: InferenceEngine,
    agent: Agent,
    journal: Vec<SimEvent>,
}

impl Simulation {
    /// Decodes a raw integer-code map and prepares a run.
    ///
    /// Codes: `0` start, `1` empty, `2` wormhole-A, `3` wormhole-B,
    /// `4` pit, `5` creature. Exactly one start cell is required.
    pub fn from_raw_map(raw: &[Vec<u8>]) -> Result<Self, MapError> {
        let rows = raw.len();
        if rows == 0 || raw[0].is_empty() {
            return Err(MapError::EmptyMap);
        }
        let cols = raw[0].len();

        let mut kinds = Vec::with_capacity(rows * cols);
        let mut start: Option<GridPos> = None;
        for (x, row) in raw.iter().enumerate() {
            if row.len() != cols {
                return Err(MapError::RaggedRows {
                    row: x,
                    expected: cols,
                    found: row.len(),
                });
            }
            for (y, &code) in row.iter().enumerate() {
                let pos = GridPos::new(x, y);
                let kind = match code {
                    0 => {
                        if let Some(first) = start {
                            return Err(MapError::DuplicateStart { first, second: pos });
                        }
                        start = Some(pos);
                        TileKind::Start
                    }
                    1 => TileKind::Empty,
                    2 => TileKind::WormholeA,
                    3 => TileKind::WormholeB,
                    4 => TileKind::Pit,
                    5 => TileKind::Creature,
                    _ => return Err(MapError::UnknownCode { pos, code }),
                };
                kinds.push(kind);
            }
        }
        let Some(start) = start else {
            return Err(MapError::MissingStart);
        };

        let mut grid = Grid::from_kinds(rows, cols, &kinds);
        grid.build_neighbor_graph()?;
        seed_hazard_flags(&mut grid);

        let start_id = grid.id_of(start);
        Ok(Self {
            grid,
            engine: InferenceEngine::new(),
            agent: Agent::new(start_id),
            journal: Vec::new(),
        })
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn journal(&self) -> &[SimEvent] {
        &self.journal
    }

    /// Executes one turn: an elimination attempt first, movement only if
    /// no elimination ended the run.
    pub fn step_turn(&mut self) {
        if !self
            .agent
            .try_eliminate(&mut self.grid, &mut self.engine, &mut self.journal)
        {
            self.agent
                .take_turn(&mut self.grid, &mut self.engine, &mut self.journal);
        }
    }

    /// Drives turns until a terminal condition fires and returns the
    /// outcome record. The journal stays on the simulation for
    /// post-mortem inspection.
    pub fn run(&mut self) -> SimulationOutcome {
        let started = Instant::now();
        let termination = loop {
            if let Some(termination) = self.agent.termination() {
                break termination;
            }
            self.step_turn();
        };

        let moves = self.agent.moves();
        let distinct_visited = self.agent.visited_record().len() as u64;
        let move_ratio = if moves == 0 {
            0.0
        } else {
            distinct_visited as f64 / moves as f64
        };
        SimulationOutcome {
            won: termination.won,
            cause: termination.cause,
            moves,
            distinct_visited,
            move_ratio,
            duration_secs: started.elapsed().as_secs_f64(),
        }
    }
}

/// Runs one full simulation over a raw map.
pub fn run_simulation(raw: &[Vec<u8>]) -> Result<SimulationOutcome, MapError> {
    let mut simulation = Simulation::from_raw_map(raw)?;
    Ok(simulation.run())
}

/// Seeds sensed hazard cues after tile placement: lair scent on every
/// neighbor of each creature tile unless that neighbor is a pit, then
/// breeze on every neighbor of each pit tile unless that neighbor is the
/// creature. The pass order and the two exclusions are part of the setup
/// contract.
fn seed_hazard_flags(grid: &mut Grid) {
    for creature in grid.query(|tile| tile.kind == TileKind::Creature) {
        for neighbor in grid.tile(creature).neighbor_ids() {
            if grid.tile(neighbor).kind != TileKind::Pit {
                grid.tile_mut(neighbor).lair_marked = true;
            }
        }
    }
    for pit in grid.query(|tile| tile.kind == TileKind::Pit) {
        for neighbor in grid.tile(pit).neighbor_ids() {
            if grid.tile(neighbor).kind != TileKind::Creature {
                grid.tile_mut(neighbor).breezy = true;
            }
        }
    }
}
