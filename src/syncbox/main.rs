use clap::Parser;
use commands::{LightsOptions, WaitOptions, handle_detect, handle_lights, handle_wait};
use syncbox::SyncResult;

mod commands;

#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
enum Cli {
    /// Auto-detect a connected sync box and report its port
    #[command(name = "detect", alias = "d")]
    Detect,

    /// Wait for one trigger symbol and print its timestamp
    #[command(name = "wait", alias = "w")]
    Wait(WaitOptions),

    /// Set the response lights
    #[command(name = "lights", alias = "l")]
    Lights(LightsOptions),
}

fn main() -> SyncResult<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let cli = Cli::parse();

    match cli {
        Cli::Detect => handle_detect()?,
        Cli::Wait(opts) => handle_wait(opts)?,
        Cli::Lights(opts) => handle_lights(opts)?,
    }

    Ok(())
}
