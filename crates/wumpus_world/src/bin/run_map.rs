//! Runs a single simulation over the default-size sample map and prints
//! the outcome record as JSON.

use wumpus_world::{run_simulation, MapError};

fn sample_map() -> Vec<Vec<u8>> {
    vec![
        vec![0, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        vec![1, 1, 1, 2, 1, 1, 1, 1, 4, 1],
        vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        vec![1, 4, 1, 1, 1, 5, 1, 1, 1, 1],
        vec![1, 1, 1, 1, 1, 1, 1, 1, 1, 1],
        vec![1, 1, 1, 1, 1, 1, 1, 3, 1, 1],
        vec![1, 1, 4, 1, 1, 1, 1, 1, 1, 1],
    ]
}

fn main() -> Result<(), MapError> {
    let outcome = run_simulation(&sample_map())?;
    match serde_json::to_string_pretty(&outcome) {
        Ok(rendered) => println!("{rendered}"),
        Err(err) => eprintln!("failed to render outcome: {err}"),
    }
    Ok(())
}
