//! Wumpus World: an autonomous agent exploring a partially observable
//! hazard grid on a torus.
//!
//! Module map:
//! - `tile`: coordinates, directions, tile kinds, and belief state
//! - `grid`: the toroidal arena, neighbor graph, queries, and the
//!   safe-unvisited registry
//! - `inference`: the belief update protocol and creature scoring
//! - `agent`: the tiered move policy and visited-subgraph path search
//! - `simulation`: map decoding, hazard seeding, the run driver
//! - `error`: construction-time map errors

pub mod agent;
pub mod error;
pub mod grid;
pub mod inference;
pub mod simulation;
pub mod tile;

pub use agent::{visited_path, Agent, Termination, TerminationCause};
pub use error::MapError;
pub use grid::Grid;
pub use inference::{
    InferenceEngine, CREATURE_CONFIDENCE_THRESHOLD, LIKELIHOOD_PER_LAIR_NEIGHBOR,
};
pub use simulation::{
    run_simulation, SimEvent, Simulation, SimulationOutcome, DEFAULT_COLS, DEFAULT_ROWS,
};
pub use tile::{CostTier, Direction, GridPos, Tile, TileId, TileKind};
