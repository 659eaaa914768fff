//! FreeWili device handle.
//!
//! [`FreeWili`] owns one serial port and exposes the board's command set:
//! IO and PWM control, binary passthrough to the SPI, I2C, radio and UART
//! buses, script and bitstream execution, file transfer in both directions,
//! and identification through the firmware banner.
//!
//! Every operation runs inside a session: the port is opened on demand and,
//! unless [`FreeWili::set_stay_open`] was called, closed again before the
//! operation returns.
//!
//! ## Example
//!
//! ```rust,no_run
//! use freewili::{IoLevel, host};
//!
//! fn main() -> freewili::Result<()> {
//!     #[cfg(feature = "native")]
//!     {
//!         let mut board = host::find_device(0)?;
//!         board.set_stay_open(true);
//!
//!         board.set_io(25, IoLevel::High)?;
//!         let io = board.get_all_io()?;
//!         println!("IO bitmap: {io:#010x}");
//!
//!         let found = board.poll_i2c()?;
//!         println!("I2C devices: {found:02x?}");
//!
//!         board.close()?;
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::thread;

use log::{debug, info, warn};

use crate::device::{AppInfo, DeviceDescriptor, parse_banner};
use crate::error::{Error, Result};
use crate::port::Port;
use crate::protocol::{
    Capabilities, Command, FileTransferRequest, I2cScan, IoLevel, Passthrough, ProtocolOptions,
    ScanState, TransferReport, hex,
};
use crate::session::{BaudRestore, ChannelState, Session};

/// Opening the port at this baud rate reboots the RP2040 into its UF2
/// bootloader.
pub const BOOTLOADER_BAUD: u32 = 1200;

/// Handle to one FreeWili processor.
///
/// Generic over the port type `P`, so the protocol can run over a real
/// serial port or a scripted test double.
pub struct FreeWili<P: Port> {
    descriptor: DeviceDescriptor,
    port: P,
    state: ChannelState,
    options: ProtocolOptions,
    capabilities: Capabilities,
}

impl<P: Port> FreeWili<P> {
    /// Wrap a (closed) port.
    pub fn new(descriptor: DeviceDescriptor, port: P) -> Self {
        Self {
            descriptor,
            port,
            state: ChannelState::default(),
            options: ProtocolOptions::default(),
            capabilities: Capabilities::default(),
        }
    }

    /// Replace the framing and timing options.
    #[must_use]
    pub fn with_options(mut self, options: ProtocolOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the firmware capabilities.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Descriptor of this device.
    pub fn descriptor(&self) -> &DeviceDescriptor {
        &self.descriptor
    }

    /// Firmware identity known so far.
    pub fn app_info(&self) -> AppInfo {
        self.descriptor.app_info()
    }

    /// Framing and timing options.
    pub fn options(&self) -> &ProtocolOptions {
        &self.options
    }

    /// Firmware capabilities.
    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    /// Channel bookkeeping.
    pub fn channel_state(&self) -> ChannelState {
        self.state
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Whether the transport is currently open.
    pub fn is_open(&self) -> bool {
        self.port.is_open()
    }

    /// Whether the transport stays open between operations.
    pub fn stay_open(&self) -> bool {
        self.state.stay_open()
    }

    /// Keep the transport open between operations until [`close`](Self::close).
    pub fn set_stay_open(&mut self, stay_open: bool) {
        self.state.set_stay_open(stay_open);
    }

    /// Close the transport. Safe to call on a closed handle.
    pub fn close(&mut self) -> Result<()> {
        self.state.reset();
        self.port.close()
    }

    fn session(&mut self, menu_enabled: bool) -> Result<Session<'_, P>> {
        Session::begin(&mut self.port, &mut self.state, &self.options, menu_enabled)
    }

    /// Session that always resends the menu frame, so the firmware prints
    /// its banner again.
    fn fresh_session(&mut self, menu_enabled: bool) -> Result<Session<'_, P>> {
        Session::begin_fresh(&mut self.port, &mut self.state, &self.options, menu_enabled)
    }

    /// Drive an IO pin high or low.
    pub fn set_io(&mut self, pin: u32, level: IoLevel) -> Result<()> {
        debug!("Setting IO {pin} {level}");
        self.session(false)?.send(&Command::SetIo { pin, level })
    }

    /// Start PWM on an IO pin. `duty` is a percentage.
    pub fn generate_pwm(&mut self, pin: u32, freq: u32, duty: u32) -> Result<()> {
        if duty > 100 {
            return Err(Error::InvalidArgument(format!("duty cycle {duty} is above 100%")));
        }
        debug!("PWM on IO {pin}: {freq} Hz, {duty}%");
        self.session(false)?.send(&Command::Pwm { pin, freq, duty })
    }

    /// Read the state of every IO pin as a bitmap.
    pub fn get_all_io(&mut self) -> Result<u32> {
        const REPLY_LEN: usize = 9;

        let mut session = self.session(false)?;
        session.send(&Command::GetAllIo)?;
        let reply = session.read_up_to(REPLY_LEN)?;
        if reply.len() < REPLY_LEN {
            return Err(Error::Timeout(format!(
                "IO bitmap: got {} of {REPLY_LEN} bytes",
                reply.len()
            )));
        }
        let text = String::from_utf8_lossy(&reply);
        u32::from_str_radix(text.trim(), 16)
            .map_err(|e| Error::MalformedReply(format!("IO bitmap {:?}: {e}", text.trim())))
    }

    /// Exchange `data` with a passthrough bus, one segment at a time.
    ///
    /// Returns every byte decoded from the per-segment reply lines, in order.
    pub fn passthrough(&mut self, bus: Passthrough, data: &[u8]) -> Result<Vec<u8>> {
        self.options.validate()?;
        if data.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.session(false)?;
        let segment_size = session.options().segment_size;
        let mut received = Vec::with_capacity(data.len());
        for segment in hex::segments(data, segment_size) {
            session.send(&Command::Segment { bus, data: segment })?;
            let line = session.read_line()?;
            received.extend(hex::decode_line(&line));
        }
        Ok(received)
    }

    /// SPI transceive.
    pub fn read_write_spi(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.passthrough(Passthrough::Spi, data)
    }

    /// Write `data` to `register` of the I2C device at `address`.
    pub fn write_i2c(&mut self, address: u8, register: u8, data: &[u8]) -> Result<Vec<u8>> {
        let mut frame = Vec::with_capacity(data.len() + 2);
        frame.push(address);
        frame.push(register);
        frame.extend_from_slice(data);
        self.passthrough(Passthrough::I2c, &frame)
    }

    /// Read `size` bytes from `register` of the I2C device at `address`.
    pub fn read_i2c(&mut self, address: u8, register: u8, size: u8) -> Result<Vec<u8>> {
        self.passthrough(Passthrough::I2c, &[address, register, size])
    }

    /// Scan the I2C bus and return the responding addresses.
    pub fn poll_i2c(&mut self) -> Result<Vec<u8>> {
        let mut scan = I2cScan::new(self.capabilities.i2c_scan);
        let mut session = self.session(false)?;
        session.send(&Command::PollI2c)?;
        while scan.state() != ScanState::Done {
            let line = session.read_line()?;
            scan.feed(&line);
        }
        let found = scan.into_addresses();
        debug!("I2C scan found {} device(s)", found.len());
        Ok(found)
    }

    /// Send data over the radio.
    pub fn write_radio(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.passthrough(Passthrough::RadioWrite, data)
    }

    /// Read data from the radio.
    pub fn read_radio(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.passthrough(Passthrough::RadioRead, data)
    }

    /// Write data to the UART.
    pub fn write_uart(&mut self, data: &[u8]) -> Result<Vec<u8>> {
        self.passthrough(Passthrough::Uart, data)
    }

    /// Run a script stored on the device and return its output.
    pub fn run_script(&mut self, name: &str) -> Result<String> {
        check_file_name(name)?;
        info!("Running script {name}");
        let mut session = self.session(false)?;
        session.send(&Command::RunScript { name })?;
        let output = session.read_to_quiet()?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Load an FPGA bitstream stored on the device and return its status text.
    pub fn load_bitstream(&mut self, name: &str) -> Result<String> {
        check_file_name(name)?;
        info!("Loading bitstream {name}");
        let mut session = self.session(false)?;
        session.send(&Command::LoadBitstream { name })?;
        let output = session.read_to_quiet()?;
        Ok(String::from_utf8_lossy(&output).into_owned())
    }

    /// Upload a local file to the device as `target_name`.
    ///
    /// `progress` is called with `(sent, total)` after every chunk.
    pub fn send_file<F>(
        &mut self,
        source: &Path,
        target_name: &str,
        progress: F,
    ) -> Result<TransferReport>
    where
        F: FnMut(usize, usize),
    {
        let data = fs::read(source).map_err(|e| Error::FileAccess {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.send_data(&data, target_name, progress)
    }

    /// Stream `data` to the device as `target_name`.
    pub fn send_data<F>(
        &mut self,
        data: &[u8],
        target_name: &str,
        mut progress: F,
    ) -> Result<TransferReport>
    where
        F: FnMut(usize, usize),
    {
        self.options.validate()?;
        let request = FileTransferRequest::new(target_name, data)?;
        let with_checksum = self.capabilities.download_checksum;
        info!(
            "Sending {} bytes to {} (checksum {})",
            request.size(),
            request.name(),
            request.checksum()
        );

        let mut session = self.session(false)?;
        let options = session.options().clone();
        session.port().clear_buffers()?;
        session.send(&request.header(with_checksum))?;
        thread::sleep(options.settle_delay);

        let total = data.len();
        let mut sent = 0;
        for chunk in data.chunks(options.transfer_chunk_size) {
            let written = std::io::Write::write(session.port(), chunk)?;
            if written < chunk.len() {
                return Err(Error::TransferAborted {
                    offset: sent,
                    written,
                    expected: chunk.len(),
                });
            }
            sent += written;
            progress(sent, total);
        }
        std::io::Write::flush(session.port())?;

        thread::sleep(options.completion_delay);
        let reply = session.drain()?;
        let device_reply = String::from_utf8_lossy(&reply).trim().to_string();
        debug!("Transfer of {} complete: {device_reply:?}", request.name());

        Ok(TransferReport {
            target: request.name().to_string(),
            size: request.size(),
            checksum: request.checksum(),
            device_reply,
        })
    }

    /// Download `name` from the device.
    ///
    /// The device sends the file without a length prefix, so this returns
    /// whatever arrived once the upload delay has passed.
    pub fn get_file(&mut self, name: &str) -> Result<Vec<u8>> {
        check_file_name(name)?;
        let mut session = self.session(false)?;
        let upload_delay = session.options().upload_delay;

        let stale = session.drain()?;
        if !stale.is_empty() {
            debug!("Discarded {} stale byte(s)", stale.len());
        }
        session.send(&Command::GetFile { name })?;
        thread::sleep(upload_delay);
        let data = session.drain()?;
        info!("Received {} bytes of {name}", data.len());
        Ok(data)
    }

    /// Reboot the processor into the UF2 bootloader.
    ///
    /// The original baud rate is restored afterwards, also on failure.
    pub fn reset_to_bootloader(&mut self) -> Result<()> {
        info!("Resetting {} to the UF2 bootloader", self.port.name());
        self.close()?;

        let hold = self.options.bootloader_hold;
        let mut guard = BaudRestore::new(&mut self.port);
        guard.port().set_baud_rate(BOOTLOADER_BAUD)?;
        guard.port().open()?;
        thread::sleep(hold);
        guard.port().close()
    }

    /// Ask the firmware for its banner and classify the processor.
    ///
    /// On success the descriptor is replaced by a reclassified one; an
    /// unrecognized banner never downgrades an earlier classification.
    pub fn query_app_info(&mut self) -> Result<AppInfo> {
        let banner = {
            let mut session = self.fresh_session(true)?;
            let options = session.options().clone();
            session.wait_for_data(options.banner_timeout)?;
            thread::sleep(options.banner_settle);
            session.drain()?
        };

        let observed = parse_banner(&String::from_utf8_lossy(&banner));
        if !observed.is_classified() {
            warn!("Unrecognized banner from {}", self.descriptor.port());
        }
        self.descriptor = self.descriptor.reclassified(observed);
        Ok(observed)
    }
}

impl<P: Port> fmt::Display for FreeWili<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FreeWili {}", self.descriptor)
    }
}

impl<P: Port> fmt::Debug for FreeWili<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FreeWili")
            .field("descriptor", &self.descriptor)
            .field("port", &self.port.name())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

fn check_file_name(name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['\r', '\n']) {
        return Err(Error::InvalidArgument(format!("invalid file name {name:?}")));
    }
    Ok(())
}

// Native-specific convenience functions
#[cfg(feature = "native")]
mod native_impl {
    use super::{DeviceDescriptor, FreeWili};
    use crate::port::NativePort;

    impl FreeWili<NativePort> {
        /// Create a handle for the port named in `descriptor`. The port is
        /// opened on first use.
        pub fn from_descriptor(descriptor: DeviceDescriptor) -> Self {
            let port = NativePort::with_name(descriptor.port());
            Self::new(descriptor, port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use crate::port::mock::MockPort;
    use crate::protocol::I2cScanPolicy;

    const INIT: &[u8] = b"\x02\r\n";

    fn board() -> (FreeWili<MockPort>, MockPort) {
        let _ = env_logger::builder().is_test(true).try_init();
        let port = MockPort::new("/dev/ttyACM0");
        let handle = port.clone();
        let board = FreeWili::new(DeviceDescriptor::new("/dev/ttyACM0"), port)
            .with_options(ProtocolOptions::default().without_delays());
        (board, handle)
    }

    fn after_init(frames: &[u8]) -> Vec<u8> {
        [INIT, frames].concat()
    }

    #[test]
    fn test_set_io_frame() {
        let (mut board, port) = board();
        board.set_io(3, IoLevel::High).unwrap();
        assert_eq!(port.written(), after_init(b"h\n3\n"));
        assert!(!board.is_open());
    }

    #[test]
    fn test_crlf_line_ending() {
        let (board, port) = board();
        let mut board = board.with_options(
            ProtocolOptions::default()
                .without_delays()
                .with_line_ending(crate::protocol::LineEnding::CrLf),
        );
        board.set_io(7, IoLevel::Low).unwrap();
        assert_eq!(port.written(), b"\x02\r\nl\r\n7\r\n");
    }

    #[test]
    fn test_pwm() {
        let (mut board, port) = board();
        board.generate_pwm(3, 1000, 50).unwrap();
        assert_eq!(port.written(), after_init(b"o\n3 1000 50\n"));

        let err = board.generate_pwm(3, 1000, 101).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn test_get_all_io() {
        let (mut board, port) = board();
        port.reply_to(b"g\n", b"0000801F\n");
        assert_eq!(board.get_all_io().unwrap(), 0x801F);
    }

    #[test]
    fn test_get_all_io_short_reply_is_timeout() {
        let (mut board, port) = board();
        port.reply_to(b"g\n", b"0001");
        let err = board.get_all_io().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(!board.is_open());
    }

    #[test]
    fn test_get_all_io_garbage_is_malformed() {
        let (mut board, port) = board();
        port.reply_to(b"g\n", b"zzzzzzzz\n");
        let err = board.get_all_io().unwrap_err();
        assert!(matches!(err, Error::MalformedReply(_)));
    }

    #[test]
    fn test_spi_segments() {
        let (mut board, port) = board();
        let data: Vec<u8> = (1..=10).collect();
        port.reply_to(b"s\n01 02 03 04 05 06 07 08\n", b"A1 A2 A3 A4 A5 A6 A7 A8\r\n");
        port.reply_to(b"s\n09 0A\n", b"B1 B2\r\n");

        let reply = board.read_write_spi(&data).unwrap();
        assert_eq!(
            reply,
            vec![0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8, 0xB1, 0xB2]
        );
        assert_eq!(
            port.written(),
            after_init(b"s\n01 02 03 04 05 06 07 08\ns\n09 0A\n")
        );
    }

    #[test]
    fn test_segment_size_option() {
        let (board, port) = board();
        let mut board = board.with_options(
            ProtocolOptions::default()
                .without_delays()
                .with_segment_size(2),
        );
        board.write_uart(&[1, 2, 3]).unwrap();
        assert_eq!(port.written(), after_init(b"u\n01 02\nu\n03\n"));
    }

    #[test]
    fn test_zero_segment_size_rejected() {
        let (board, port) = board();
        let mut board = board.with_options(
            ProtocolOptions::default()
                .without_delays()
                .with_segment_size(0),
        );
        let err = board.write_radio(&[1]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(port.written().is_empty());
    }

    #[test]
    fn test_empty_passthrough_sends_nothing() {
        let (mut board, port) = board();
        assert!(board.read_radio(&[]).unwrap().is_empty());
        assert!(port.written().is_empty());
        assert_eq!(port.state().opens, 0);
    }

    #[test]
    fn test_i2c_wrappers() {
        let (mut board, port) = board();
        board.write_i2c(0x48, 0x01, &[0xAA, 0xBB]).unwrap();
        board.read_i2c(0x48, 0x00, 2).unwrap();
        let expected = [INIT, b"i\n48 01 AA BB\n", INIT, b"i\n48 00 02\n"].concat();
        assert_eq!(port.written(), expected);
    }

    #[test]
    fn test_poll_i2c_base_offset() {
        let (mut board, port) = board();
        port.reply_to(b"p\n", b"header\n10 00 01 00\n");
        assert_eq!(board.poll_i2c().unwrap(), vec![0x11]);
    }

    #[test]
    fn test_poll_i2c_literal_value() {
        let (board, port) = board();
        let mut board = board.with_capabilities(Capabilities {
            i2c_scan: I2cScanPolicy::LiteralValue,
            ..Capabilities::default()
        });
        port.reply_to(b"p\n", b"header\n10 00 01 00\n");
        assert_eq!(board.poll_i2c().unwrap(), vec![0x01]);
    }

    #[test]
    fn test_run_script_collects_output() {
        let (mut board, port) = board();
        port.reply_to(b"w\ngo.wasm\n", b"Running go.wasm\r\ndone\r\n");
        let output = board.run_script("go.wasm").unwrap();
        assert_eq!(output, "Running go.wasm\r\ndone\r\n");
    }

    #[test]
    fn test_load_bitstream() {
        let (mut board, port) = board();
        port.reply_to(b"m\ntop.bit\n", b"ok");
        assert_eq!(board.load_bitstream("top.bit").unwrap(), "ok");
        assert!(board.load_bitstream("").is_err());
    }

    #[test]
    fn test_send_data_header_precedes_payload() {
        let (mut board, port) = board();
        port.reply_to(b"0123456789", b"received\r\n");
        let mut calls = Vec::new();

        let report = board
            .send_data(b"0123456789", "TEST.TXT", |sent, total| {
                calls.push((sent, total));
            })
            .unwrap();

        assert_eq!(
            port.written(),
            after_init(b"x\nf\nTEST.TXT 10 525\n0123456789")
        );
        assert_eq!(report.size, 10);
        assert_eq!(report.checksum, 525);
        assert_eq!(report.device_reply, "received");
        assert_eq!(calls.len(), 10);
        assert_eq!(calls.last(), Some(&(10, 10)));
    }

    #[test]
    fn test_send_data_without_checksum() {
        let (board, port) = board();
        let mut board = board.with_capabilities(Capabilities {
            download_checksum: false,
            ..Capabilities::default()
        });
        board.send_data(b"abc", "A.TXT", |_, _| {}).unwrap();
        assert_eq!(port.written(), after_init(b"x\nf\nA.TXT 3\nabc"));
    }

    #[test]
    fn test_send_data_chunked() {
        let (board, _port) = board();
        let mut board = board.with_options(
            ProtocolOptions::default()
                .without_delays()
                .with_transfer_chunk_size(4),
        );
        let mut calls = Vec::new();
        board
            .send_data(b"0123456789", "TEST.TXT", |sent, total| {
                calls.push((sent, total));
            })
            .unwrap();
        assert_eq!(calls, vec![(4, 10), (8, 10), (10, 10)]);
    }

    #[test]
    fn test_send_data_aborts_on_short_chunk() {
        let (mut board, port) = board();
        // init (3) + header (20) + four payload bytes
        port.state().accept_total = Some(27);

        let err = board
            .send_data(b"0123456789", "TEST.TXT", |_, _| {})
            .unwrap_err();
        assert!(matches!(
            err,
            Error::TransferAborted {
                offset: 4,
                written: 0,
                expected: 1
            }
        ));
        assert_eq!(err.kind(), ErrorKind::Framing);
        assert!(!board.is_open());
    }

    #[test]
    fn test_send_file_reads_local_file() {
        let (mut board, port) = board();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.txt");
        fs::write(&path, b"0123456789").unwrap();

        board.send_file(&path, "TEST.TXT", |_, _| {}).unwrap();
        assert!(port.written().ends_with(b"TEST.TXT 10 525\n0123456789"));
    }

    #[test]
    fn test_send_file_missing_source() {
        let (mut board, port) = board();
        let dir = tempfile::tempdir().unwrap();
        let err = board
            .send_file(&dir.path().join("missing.txt"), "M.TXT", |_, _| {})
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FileAccess);
        assert!(port.written().is_empty());
    }

    #[test]
    fn test_send_data_rejects_bad_name() {
        let (mut board, port) = board();
        let err = board.send_data(b"x", "MY FILE.TXT", |_, _| {}).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(port.written().is_empty());
    }

    #[test]
    fn test_get_file() {
        let (mut board, port) = board();
        port.reply_to(b"x\nu\nlog.txt\n", b"line 1\nline 2\n");
        let data = board.get_file("log.txt").unwrap();
        assert_eq!(data, b"line 1\nline 2\n");
        assert_eq!(port.written(), after_init(b"x\nu\nlog.txt\n"));
    }

    #[test]
    fn test_stay_open_reuses_transport() {
        let (mut board, port) = board();
        board.set_stay_open(true);
        board.set_io(1, IoLevel::High).unwrap();
        board.set_io(1, IoLevel::Low).unwrap();
        assert!(board.is_open());
        assert_eq!(port.written(), after_init(b"h\n1\nl\n1\n"));

        board.close().unwrap();
        board.close().unwrap();
        assert!(!board.is_open());
        assert!(!board.channel_state().initialized());

        let state = port.state();
        assert_eq!(state.opens, 1);
        assert_eq!(state.closes, 1);
    }

    #[test]
    fn test_reset_to_bootloader() {
        let (mut board, port) = board();
        board.reset_to_bootloader().unwrap();

        let state = port.state();
        assert_eq!(state.baud_at_open, vec![BOOTLOADER_BAUD]);
        assert_eq!(state.baud, 115200);
        assert!(!state.open);
        assert!(state.tx.is_empty());
    }

    #[test]
    fn test_reset_to_bootloader_restores_baud_on_failure() {
        let (mut board, port) = board();
        port.state().fail_open = true;

        assert!(board.reset_to_bootloader().is_err());
        assert_eq!(port.state().baud, 115200);
    }

    #[test]
    fn test_query_app_info_classifies() {
        let (mut board, port) = board();
        port.reply_to(b"\x03\r\n", b"FreeWili\r\nMain Processor App version 47\r\n");

        assert_eq!(board.query_app_info().unwrap(), AppInfo::Main(47));
        assert_eq!(board.app_info(), AppInfo::Main(47));
        assert_eq!(port.written(), b"\x03\r\n");
    }

    #[test]
    fn test_query_app_info_never_downgrades() {
        let (mut board, port) = board();
        port.reply_to(b"\x03\r\n", b"Display Processor App version 5\r\n");
        board.query_app_info().unwrap();

        port.reply_to(b"\x03\r\n", b"garbage\r\n");
        assert_eq!(board.query_app_info().unwrap(), AppInfo::Unknown);
        assert_eq!(board.app_info(), AppInfo::Display(5));
    }

    #[test]
    fn test_query_app_info_without_banner_times_out() {
        let (mut board, _port) = board();
        let err = board.query_app_info().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert_eq!(board.app_info(), AppInfo::Unknown);
        assert!(!board.is_open());
    }

    #[test]
    fn test_menu_switch_in_stay_open_session() {
        let (mut board, port) = board();
        board.set_stay_open(true);
        port.reply_to(b"\x03\r\n", b"Main Processor App version 47\r\n");

        board.query_app_info().unwrap();
        board.set_io(2, IoLevel::High).unwrap();
        assert_eq!(port.written(), b"\x03\r\n\x02\r\nh\n2\n");
        assert_eq!(port.state().opens, 1);
    }

    #[test]
    fn test_query_app_info_twice_in_stay_open_session() {
        let (mut board, port) = board();
        board.set_stay_open(true);
        port.reply_to(b"\x03\r\n", b"Main Processor App version 47\r\n");
        port.reply_to(b"\x03\r\n", b"Main Processor App version 48\r\n");

        assert_eq!(board.query_app_info().unwrap(), AppInfo::Main(47));
        assert_eq!(board.query_app_info().unwrap(), AppInfo::Main(48));
        assert_eq!(board.app_info(), AppInfo::Main(48));

        let state = port.state();
        assert_eq!(state.tx, b"\x03\r\n\x03\r\n");
        assert_eq!(state.opens, 1);
        assert_eq!(state.clears, 2);
    }
}
