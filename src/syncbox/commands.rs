use std::time::Duration;

use clap::Parser;
use syncbox::{ControlCommand, DeviceSpec, SyncDevice, SyncResult};

#[derive(Parser, Debug, Clone)]
pub(crate) struct WaitOptions {
    /// Device port, or "autodetect"
    #[clap(short, long, default_value = "autodetect")]
    device: DeviceSpec,

    /// Symbol the box is expected to send
    #[clap(short, long)]
    symbol: char,

    /// Give up after this many milliseconds; waits forever when omitted
    #[clap(short, long)]
    timeout: Option<u64>,
}

#[derive(Parser, Debug, Clone)]
pub(crate) struct LightsOptions {
    /// Device port, or "autodetect"
    #[clap(short, long, default_value = "autodetect")]
    device: DeviceSpec,

    /// Light bit pattern; 0 turns all lights off
    #[clap(short, long, default_value_t = 0)]
    pattern: u8,
}

pub(crate) fn handle_detect() -> SyncResult<()> {
    let mut device = SyncDevice::open(&DeviceSpec::AutoDetect)?;
    println!("Sync box found on {}", device.port_name());
    device.close()?;

    Ok(())
}

pub(crate) fn handle_wait(opts: WaitOptions) -> SyncResult<()> {
    let mut device = SyncDevice::open(&opts.device)?;
    let timeout = opts.timeout.map(Duration::from_millis);

    device.start()?;
    let (symbol, timestamp) = device.await_response(opts.symbol, timeout)?;
    println!(
        "Got '{}' at {:.3} ms on {}",
        symbol,
        timestamp,
        device.port_name()
    );
    device.stop()?;
    device.close()?;

    Ok(())
}

pub(crate) fn handle_lights(opts: LightsOptions) -> SyncResult<()> {
    let mut device = SyncDevice::open(&opts.device)?;
    device.send_command(ControlCommand::Lights(opts.pattern))?;
    device.close()?;

    Ok(())
}
