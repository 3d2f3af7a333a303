use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("failed to open device port '{port}': {cause}")]
    DeviceOpen { port: String, cause: String },

    #[error("could not auto-detect a sync box; please specify a device port")]
    DeviceNotFound,

    #[error("cannot auto-detect a sync box on this platform; please specify a device port")]
    UnsupportedPlatform,

    #[error("start() must be called before awaiting a response")]
    NotStarted,

    #[error("the sync box connection is already closed")]
    DeviceClosed,

    #[error("no response matched '{symbol}' within {timeout:?}")]
    ResponseTimeout { symbol: char, timeout: Duration },

    #[error("communication error: {0}")]
    Communication(String),
}

pub type SyncResult<T> = std::result::Result<T, SyncError>;
