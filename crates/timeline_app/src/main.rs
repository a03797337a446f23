mod config;
mod logging;
mod runner;

use std::path::PathBuf;

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let config = config::load(&path)?;
    logging::initialize(config.log_destination, config.log_level.into());
    runner::run(&config)
}
