//! # Rail World Entry Point
//!
//! Runs the headless driver from the library's `run()` function.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- [config.json]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    match rail_world::run(config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
