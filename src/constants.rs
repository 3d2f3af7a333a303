/// Baudrate for the NNL SyncBox.
pub(crate) const SYNCBOX_BAUD: u32 = 57600;

pub(crate) const SERIAL_TIMEOUT_MS: u64 = 1;
