use tracing::trace;

use super::SyncTransport;
use crate::constants::{SERIAL_TIMEOUT_MS, SYNCBOX_BAUD};
use crate::error::{SyncError, SyncResult};
use std::io::{Read, Write};

/// Serial port transport layer
pub(crate) struct SerialPortTransport {
    pub serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortTransport {
    /// Open `port` at the fixed SyncBox baudrate. Framing is the library
    /// default (8 data bits, no parity, 1 stop bit).
    pub fn open(port: &str) -> SyncResult<SerialPortTransport> {
        let serial_port = serialport::new(port, SYNCBOX_BAUD)
            .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()
            .map_err(|e| SyncError::DeviceOpen {
                port: port.to_owned(),
                cause: format!("{}", e),
            })?;

        Ok(SerialPortTransport { serial_port })
    }
}

impl SyncTransport for SerialPortTransport {
    fn read_byte(&mut self) -> SyncResult<Option<u8>> {
        let mut buffer = [0u8; 1];

        let bytes_read = self
            .serial_port
            .read(&mut buffer)
            // Timeout error is fine, there was just nothing to read
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| SyncError::Communication(format!("{:?}", e)))?;

        if bytes_read == 0 {
            return Ok(None);
        }

        trace!("Received byte {:#04x}", buffer[0]);
        Ok(Some(buffer[0]))
    }

    fn send(&mut self, bytes: &[u8]) -> SyncResult<()> {
        self.serial_port
            .write_all(bytes)
            .map_err(|e| SyncError::Communication(format!("{:?}", e)))?;
        trace!("Sent bytes {:?}", bytes);
        Ok(())
    }

    fn flush_buffers(&mut self) -> SyncResult<()> {
        self.serial_port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| {
                SyncError::Communication(format!("Failed to discard port buffers, {}", e))
            })?;

        Ok(())
    }
}
