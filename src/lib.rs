use std::time::{Duration, Instant};

pub use clock::{Clock, MonotonicClock};
use error::SyncError;
pub use error::SyncResult;
pub use protocol::ControlCommand;
use tracing::{debug, trace};
use transport::SyncTransport;
use transport::serialport::SerialPortTransport;

pub mod clock;
pub(crate) mod constants;
pub(crate) mod detect;
pub mod error;
pub mod protocol;
pub(crate) mod transport;

/// Which serial device to bind to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSpec {
    /// Probe the platform's serial device names and adopt the first port
    /// that opens. On some systems this can hang the session, so prefer an
    /// explicit port when the device name is known.
    AutoDetect,
    /// An explicit device port, e.g. `/dev/ttyUSB0` or `COM3`.
    Port(String),
}

impl std::str::FromStr for DeviceSpec {
    type Err = std::convert::Infallible;

    /// An empty string and `"autodetect"` both mean auto-detection, so
    /// experiment config values pass through unchanged.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "autodetect" => Ok(DeviceSpec::AutoDetect),
            port => Ok(DeviceSpec::Port(port.to_owned())),
        }
    }
}

/// Handle to one SyncBox on one serial port.
///
/// The box emits a byte whenever a button is pressed or a scanner trigger
/// pulse arrives. The driver is put in sending mode with [`start`], after
/// which [`await_response`] blocks until the expected symbol arrives and
/// returns it with a clock timestamp. [`close`] releases the port and is
/// terminal; the host session should register it in its cleanup hooks
/// exactly once.
///
/// [`start`]: SyncDevice::start
/// [`await_response`]: SyncDevice::await_response
/// [`close`]: SyncDevice::close
pub struct SyncDevice {
    transport: Option<Box<dyn SyncTransport>>,
    port_name: String,
    sending: bool,
    last_expected: Option<char>,
    clock: Box<dyn Clock>,
}

impl SyncDevice {
    /// Open the device named by `spec` at the fixed 57600 baudrate.
    ///
    /// With [`DeviceSpec::Port`] a single open attempt is made and a failure
    /// is fatal, naming the port. With [`DeviceSpec::AutoDetect`] every
    /// platform candidate is tried in order and only an exhausted list is an
    /// error.
    pub fn open(spec: &DeviceSpec) -> SyncResult<SyncDevice> {
        let (port_name, transport) = match spec {
            DeviceSpec::Port(port) => {
                let transport = SerialPortTransport::open(port)?;
                (port.clone(), transport)
            }
            DeviceSpec::AutoDetect => {
                detect::scan(detect::candidate_ports()?, SerialPortTransport::open)?
            }
        };
        debug!("Opened sync box on {}", port_name);

        Ok(SyncDevice {
            transport: Some(Box::new(transport)),
            port_name,
            sending: false,
            last_expected: None,
            clock: Box::new(MonotonicClock::new()),
        })
    }

    /// Replace the default clock with the host's, so returned timestamps
    /// share a timebase with the host's stimulus log.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> SyncDevice {
        self.clock = clock;
        self
    }

    /// The port this device is bound to.
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// The expected symbol from the most recent [`await_response`] call.
    ///
    /// [`await_response`]: SyncDevice::await_response
    pub fn last_expected(&self) -> Option<char> {
        self.last_expected
    }

    /// Turn on sending mode. Idempotent: a second call while already
    /// sending does nothing.
    ///
    /// Only the port buffers are discarded here; the hardware start byte is
    /// not transmitted (see [`protocol`]).
    pub fn start(&mut self) -> SyncResult<()> {
        let transport = self.transport.as_mut().ok_or(SyncError::DeviceClosed)?;
        if self.sending {
            return Ok(());
        }
        transport.flush_buffers()?;
        self.sending = true;
        Ok(())
    }

    /// Turn off sending mode. Idempotent, symmetric to [`start`].
    ///
    /// [`start`]: SyncDevice::start
    pub fn stop(&mut self) -> SyncResult<()> {
        let transport = self.transport.as_mut().ok_or(SyncError::DeviceClosed)?;
        if !self.sending {
            return Ok(());
        }
        transport.flush_buffers()?;
        self.sending = false;
        Ok(())
    }

    /// Block until the box sends `expected`, then return it together with a
    /// clock reading taken at the moment of the match.
    ///
    /// The port is polled one byte at a time; bytes other than `expected`
    /// are consumed and discarded. With `timeout` of `None` there is no
    /// upper bound on the wait — a silent device blocks the calling thread
    /// forever, so pass a deadline unless exact legacy behavior is needed.
    ///
    /// Requires sending mode: fails with [`SyncError::NotStarted`] before
    /// any port I/O if [`start`] has not been called.
    ///
    /// [`start`]: SyncDevice::start
    pub fn await_response(
        &mut self,
        expected: char,
        timeout: Option<Duration>,
    ) -> SyncResult<(char, f64)> {
        if self.transport.is_none() {
            return Err(SyncError::DeviceClosed);
        }
        if !self.sending {
            return Err(SyncError::NotStarted);
        }
        self.last_expected = Some(expected);

        let deadline = timeout.map(|t| (Instant::now() + t, t));
        loop {
            if let Some((at, t)) = deadline {
                if Instant::now() >= at {
                    return Err(SyncError::ResponseTimeout {
                        symbol: expected,
                        timeout: t,
                    });
                }
            }

            let byte = match self.transport.as_mut() {
                Some(transport) => transport.read_byte()?,
                None => return Err(SyncError::DeviceClosed),
            };
            if let Some(byte) = byte {
                let received = char::from(byte);
                trace!("Expected <{}>, got <{}>", expected, received);
                if received == expected {
                    let timestamp = self.clock.now_ms();
                    return Ok((received, timestamp));
                }
            }
        }
    }

    /// Transmit a single control byte to the box. This is the only path
    /// that writes to the device; nothing in the driver sends these
    /// implicitly.
    pub fn send_command(&mut self, command: ControlCommand) -> SyncResult<()> {
        let transport = self.transport.as_mut().ok_or(SyncError::DeviceClosed)?;
        transport.send(&[command.byte()])
    }

    /// Release the serial port. Valid from any state, started or not, but
    /// terminal: every later call on this device, including a second
    /// `close`, fails with [`SyncError::DeviceClosed`].
    pub fn close(&mut self) -> SyncResult<()> {
        if self.transport.take().is_none() {
            return Err(SyncError::DeviceClosed);
        }
        self.sending = false;
        debug!("Closed sync box on {}", self.port_name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeState {
        incoming: VecDeque<u8>,
        reads: usize,
        sent: Vec<u8>,
        flushes: usize,
    }

    struct FakeTransport(Rc<RefCell<FakeState>>);

    impl SyncTransport for FakeTransport {
        fn read_byte(&mut self) -> SyncResult<Option<u8>> {
            let mut state = self.0.borrow_mut();
            state.reads += 1;
            Ok(state.incoming.pop_front())
        }

        fn send(&mut self, bytes: &[u8]) -> SyncResult<()> {
            self.0.borrow_mut().sent.extend_from_slice(bytes);
            Ok(())
        }

        fn flush_buffers(&mut self) -> SyncResult<()> {
            self.0.borrow_mut().flushes += 1;
            Ok(())
        }
    }

    /// Reports the number of reads performed so far, pinning down when the
    /// timestamp was taken relative to port I/O.
    struct ReadCountClock(Rc<RefCell<FakeState>>);

    impl Clock for ReadCountClock {
        fn now_ms(&self) -> f64 {
            self.0.borrow().reads as f64
        }
    }

    fn fake_device(incoming: &[u8]) -> (SyncDevice, Rc<RefCell<FakeState>>) {
        let state = Rc::new(RefCell::new(FakeState {
            incoming: incoming.iter().copied().collect(),
            ..FakeState::default()
        }));
        let device = SyncDevice {
            transport: Some(Box::new(FakeTransport(Rc::clone(&state)))),
            port_name: "fake0".to_string(),
            sending: false,
            last_expected: None,
            clock: Box::new(ReadCountClock(Rc::clone(&state))),
        };
        (device, state)
    }

    #[test]
    fn start_is_idempotent() {
        let (mut device, state) = fake_device(b"");

        device.start().unwrap();
        device.start().unwrap();

        assert!(device.is_sending());
        // Buffers were only flushed for the first call
        assert_eq!(state.borrow().flushes, 1);
    }

    #[test]
    fn stop_before_start_is_a_noop() {
        let (mut device, state) = fake_device(b"");

        device.stop().unwrap();

        assert!(!device.is_sending());
        assert_eq!(state.borrow().flushes, 0);
    }

    #[test]
    fn stop_leaves_sending_mode() {
        let (mut device, state) = fake_device(b"");

        device.start().unwrap();
        device.stop().unwrap();
        device.stop().unwrap();

        assert!(!device.is_sending());
        assert_eq!(state.borrow().flushes, 2);
    }

    #[test]
    fn start_transmits_nothing() {
        let (mut device, state) = fake_device(b"");

        device.start().unwrap();
        device.stop().unwrap();

        assert!(state.borrow().sent.is_empty());
    }

    #[test]
    fn await_response_requires_sending_mode() {
        let (mut device, state) = fake_device(b"y");

        let result = device.await_response('y', None);

        assert!(matches!(result, Err(SyncError::NotStarted)));
        // Failed precondition must not touch the port
        assert_eq!(state.borrow().reads, 0);
    }

    #[test]
    fn await_response_consumes_bytes_until_match() {
        let (mut device, state) = fake_device(b"xxy");

        device.start().unwrap();
        let (symbol, timestamp) = device.await_response('y', None).unwrap();

        assert_eq!(symbol, 'y');
        assert_eq!(state.borrow().reads, 3);
        // Clock was read after the matching third read
        assert_eq!(timestamp, 3.0);
        assert_eq!(device.last_expected(), Some('y'));
    }

    #[test]
    fn await_response_times_out_on_a_silent_port() {
        let (mut device, _state) = fake_device(b"");

        device.start().unwrap();
        let result = device.await_response('y', Some(Duration::from_millis(5)));

        assert!(matches!(
            result,
            Err(SyncError::ResponseTimeout { symbol: 'y', .. })
        ));
    }

    #[test]
    fn await_response_times_out_when_only_other_symbols_arrive() {
        let (mut device, state) = fake_device(b"ab");

        device.start().unwrap();
        let result = device.await_response('z', Some(Duration::from_millis(5)));

        assert!(matches!(result, Err(SyncError::ResponseTimeout { .. })));
        // The mismatched bytes were still consumed
        assert!(state.borrow().incoming.is_empty());
    }

    #[test]
    fn send_command_writes_the_encoded_byte() {
        let (mut device, state) = fake_device(b"");

        device.send_command(ControlCommand::Lights(0b0000_0011)).unwrap();

        assert_eq!(state.borrow().sent, vec![0x63]);
    }

    #[test]
    fn close_is_terminal() {
        let (mut device, _state) = fake_device(b"");

        // Closing a never-started device succeeds
        device.close().unwrap();
        assert!(!device.is_sending());

        assert!(matches!(device.close(), Err(SyncError::DeviceClosed)));
        assert!(matches!(device.start(), Err(SyncError::DeviceClosed)));
        assert!(matches!(device.stop(), Err(SyncError::DeviceClosed)));
        assert!(matches!(
            device.await_response('y', None),
            Err(SyncError::DeviceClosed)
        ));
        assert!(matches!(
            device.send_command(ControlCommand::StopSending),
            Err(SyncError::DeviceClosed)
        ));
    }

    #[test]
    fn close_while_sending_releases_the_port() {
        let (mut device, _state) = fake_device(b"");

        device.start().unwrap();
        device.close().unwrap();

        assert!(!device.is_sending());
        assert!(matches!(device.close(), Err(SyncError::DeviceClosed)));
    }

    #[test]
    fn device_spec_parses_autodetect_sentinels() {
        assert_eq!("".parse::<DeviceSpec>().unwrap(), DeviceSpec::AutoDetect);
        assert_eq!(
            "autodetect".parse::<DeviceSpec>().unwrap(),
            DeviceSpec::AutoDetect
        );
        assert_eq!(
            "/dev/ttyUSB0".parse::<DeviceSpec>().unwrap(),
            DeviceSpec::Port("/dev/ttyUSB0".to_string())
        );
    }
}
