use mosaic_config::{load_dashboard_settings, load_dashboard_settings_from};
use mosaic_core::{Dashboard, RegistrySnapshot, TileRegistry};
use std::path::PathBuf;
use tokio::io::BufReader;

mod command;
mod console;

use console::{run_session, Console};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Optional first argument: explicit path to dashboard.toml
    let settings = match std::env::args().nth(1) {
        Some(path) => load_dashboard_settings_from(&PathBuf::from(path))?,
        None => load_dashboard_settings()?,
    };
    log::info!(
        "Snapshot: {} | tick: {:?}",
        settings.snapshot_path.display(),
        settings.tick
    );

    let (w, h) = settings.default_tile_size;
    let mut registry = TileRegistry::new().with_default_size(w, h);
    registry.restore(RegistrySnapshot::load_or_default(&settings.snapshot_path)?);

    let mut console = Console::new(Dashboard::new(registry), settings.snapshot_path.clone());
    println!(
        "mosaic: {} tiles loaded, type 'help' for commands",
        console.dashboard.registry.len()
    );

    let stdin = BufReader::new(tokio::io::stdin());
    run_session(&mut console, stdin, tokio::io::stdout(), settings.tick).await?;

    log::info!("Shutting down");
    Ok(())
}
