pub(crate) mod serialport;

use crate::error::SyncResult;

pub(crate) trait SyncTransport {
    /// Read a single byte without blocking. `Ok(None)` means no data was
    /// pending on the port.
    fn read_byte(&mut self) -> SyncResult<Option<u8>>;

    /// Send raw bytes to the device
    fn send(&mut self, bytes: &[u8]) -> SyncResult<()>;

    /// Discard anything buffered in both directions
    fn flush_buffers(&mut self) -> SyncResult<()>;
}
