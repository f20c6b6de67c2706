//! StemDeck Player - synchronized playback of separated stems
//!
//! Terminal front end for `stemdeck-core`:
//! 1. Loads the YAML config and starts the audio output
//! 2. Opens a separation output folder (or resumes a recent track)
//! 3. Reads transport/mix commands and separation events from stdin
//!
//! Set `RUST_LOG=debug` for verbose output.

mod app;
mod audio;
mod cli;
mod commands;

use anyhow::{Context, Result};
use stemdeck_core::config::{default_config_path, default_recent_path, PlayerConfig};

use app::App;
use cli::{Args, USAGE};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", USAGE);
        return Ok(());
    }
    if args.list_devices {
        return audio::print_devices();
    }

    log::info!("stemdeck-player {} starting up", env!("CARGO_PKG_VERSION"));

    let config_path = args.config.clone().unwrap_or_else(default_config_path);
    let recent_path = config_path
        .parent()
        .map(|dir| dir.join(stemdeck_core::config::RECENT_FILE))
        .unwrap_or_else(default_recent_path);
    let config = PlayerConfig::load(&config_path);

    let output = audio::start_output(&config.audio)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .thread_name("stemdeck-control")
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let mut app = App::new(config, config_path, recent_path, output);

        if let Some(input) = args.input {
            app.set_input(input);
        }
        let opened = match (&args.output_dir, &args.resume) {
            (Some(dir), _) => app.open(dir, None).await,
            (None, Some(input)) => app.resume(input).await,
            (None, None) => {
                println!("No track loaded. Use 'open <dir>' or pipe separation events.");
                Ok(())
            }
        };
        if let Err(e) = opened {
            eprintln!("Error: {:#}", e);
        }

        let result = app.run().await;
        app.shutdown()?;
        result
    })?;

    println!("StemDeck Player stopped.");
    Ok(())
}
