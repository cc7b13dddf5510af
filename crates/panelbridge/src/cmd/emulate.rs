//! Mainboard emulation: satisfy the panel's handshake, then report
//! status frames and react to button presses.

use std::collections::VecDeque;
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panelbridge_frame::{FrameAssembler, FrameError, FrameWriter};
use panelbridge_proto::handshake::{HandshakeEngine, Step};
use panelbridge_proto::{protocol, StatusStore};

use crate::clock::{Clock, SystemClock};
use crate::cmd::EmulateArgs;
use crate::exit::{frame_error, serial_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::port;

/// Delay between polls while waiting for the panel's first byte.
const STARTUP_POLL: Duration = Duration::from_millis(100);

const DRAIN_CHUNK: usize = 64;

pub fn run(args: EmulateArgs) -> CliResult<i32> {
    let reader =
        port::open(&args.port, args.baud).map_err(|err| serial_error("opening port", err))?;
    let writer = reader
        .try_clone()
        .map_err(|err| serial_error("cloning port handle", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let config = BridgeConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        receive_timeout: Duration::from_millis(args.receive_timeout_ms),
        retry_delay: Duration::from_millis(args.retry_delay_ms),
    };

    let mut bridge = Bridge::new(reader, writer, SystemClock, config)
        .map_err(|err| frame_error("building protocol tables", err))?;
    bridge
        .run(&running)
        .map_err(|err| frame_error("bridge loop", err))?;

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub poll_interval: Duration,
    pub receive_timeout: Duration,
    pub retry_delay: Duration,
}

/// The mainboard side of the link.
///
/// Single-threaded and poll-driven: each cycle drains available bytes,
/// advances whichever phase is active, writes pending output, and
/// sleeps the poll interval. All state is owned here; nothing is shared
/// across threads.
pub struct Bridge<R, W, C> {
    reader: R,
    writer: FrameWriter<W>,
    clock: C,
    assembler: FrameAssembler,
    engine: HandshakeEngine,
    status: StatusStore,
    inbox: VecDeque<panelbridge_frame::Frame>,
    bytes_seen: u64,
    config: BridgeConfig,
}

impl<R: Read, W: Write, C: Clock> Bridge<R, W, C> {
    pub fn new(reader: R, writer: W, clock: C, config: BridgeConfig) -> Result<Self, FrameError> {
        Ok(Self {
            reader,
            writer: FrameWriter::new(writer),
            clock,
            assembler: FrameAssembler::with_timeout(config.receive_timeout),
            engine: HandshakeEngine::standard()?,
            status: StatusStore::new()?,
            inbox: VecDeque::new(),
            bytes_seen: 0,
            config,
        })
    }

    /// Startup wait, handshake, then steady-state status reporting.
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), FrameError> {
        tracing::info!("waiting for panel to start transmitting");
        if !self.await_peer(running)? {
            return Ok(());
        }

        if !self.negotiate(running)? {
            return Ok(());
        }

        self.serve(running)
    }

    /// Block (coarsely) until the panel sends its first byte, then emit
    /// the bare start sequence. Returns false if stopped first.
    fn await_peer(&mut self, running: &AtomicBool) -> Result<bool, FrameError> {
        while running.load(Ordering::SeqCst) {
            self.pump()?;
            if self.bytes_seen > 0 {
                self.writer.write_raw(&protocol::START_SEQUENCE)?;
                tracing::info!("panel is transmitting; start sequence sent");
                return Ok(true);
            }
            self.clock.sleep(STARTUP_POLL);
        }
        Ok(false)
    }

    /// Drive handshake attempts until one succeeds. A mismatch aborts
    /// the attempt; after the retry delay the table is reset and the
    /// panel's resent opening message starts the next attempt.
    fn negotiate(&mut self, running: &AtomicBool) -> Result<bool, FrameError> {
        self.engine.reset_attempt();

        while running.load(Ordering::SeqCst) {
            self.pump()?;

            while let Some(frame) = self.inbox.pop_front() {
                match self.engine.on_frame(&frame) {
                    Step::Respond(reply) => {
                        tracing::debug!(reply = %reply, "handshake response");
                        self.writer.write_frame(&reply)?;
                    }
                    Step::Complete => return Ok(true),
                    Step::Mismatch => {
                        tracing::warn!(
                            retry_in = ?self.config.retry_delay,
                            "handshake attempt failed"
                        );
                        self.clock.sleep(self.config.retry_delay);
                        self.engine.reset_attempt();
                    }
                }
            }

            self.clock.sleep(self.config.poll_interval);
        }
        Ok(false)
    }

    /// Steady state loop: consume panel frames, keep the status current,
    /// and retransmit the periodic frames every cycle.
    fn serve(&mut self, running: &AtomicBool) -> Result<(), FrameError> {
        while running.load(Ordering::SeqCst) {
            self.cycle()?;
            self.clock.sleep(self.config.poll_interval);
        }
        Ok(())
    }

    /// One steady-state poll cycle, without the trailing sleep.
    pub fn cycle(&mut self) -> Result<(), FrameError> {
        self.pump()?;

        while let Some(frame) = self.inbox.pop_front() {
            self.status.select_by_command(&frame);
            tracing::info!(frame = %frame, "frame received from panel");
        }

        self.writer.write_frame(self.status.current())?;
        self.writer.send(&protocol::POLL_REQUEST)?;
        self.writer.send(&protocol::HEARTBEAT)?;
        Ok(())
    }

    /// Drain everything currently readable into the frame inbox and run
    /// the assembler's timeout check once.
    fn pump(&mut self) -> Result<(), FrameError> {
        let mut chunk = [0u8; DRAIN_CHUNK];
        loop {
            let n = port::read_available(&mut self.reader, &mut chunk)?;
            if n == 0 {
                break;
            }
            self.bytes_seen += n as u64;

            let now = self.clock.now();
            for &byte in &chunk[..n] {
                if let Some(frame) = self.assembler.push(byte, now) {
                    self.inbox.push_back(frame);
                }
            }
        }

        self.assembler.check_timeout(self.clock.now());
        Ok(())
    }

    pub fn status(&self) -> &StatusStore {
        &self.status
    }

    pub fn writer_mut(&mut self) -> &mut FrameWriter<W> {
        &mut self.writer
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;
    use std::time::Instant;

    use panelbridge_frame::{checksum::checksum, Frame, FrameAssembler};
    use panelbridge_proto::StatusKind;

    use super::*;
    use crate::clock::fake::FakeClock;

    /// Yields scripted bytes, then reports an empty line.
    struct ScriptReader {
        data: VecDeque<u8>,
    }

    impl ScriptReader {
        fn new(bytes: Vec<u8>) -> Self {
            Self {
                data: bytes.into(),
            }
        }
    }

    impl Read for ScriptReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.data.is_empty() {
                return Err(std::io::Error::from(ErrorKind::TimedOut));
            }
            let mut n = 0;
            while n < buf.len() {
                match self.data.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    fn wire(payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x55, 0xAA, payload.len() as u8];
        bytes.extend_from_slice(payload);
        bytes.push(checksum(&bytes));
        bytes
    }

    fn panel_handshake_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        for payload in [
            &protocol::HANDSHAKE_SYN[..],
            &protocol::ACK_FIRST[..],
            &protocol::ACK_SECOND[..],
            &protocol::VERSION_HEADER[..],
            &protocol::PANEL_IDENT[..],
            &protocol::PANEL_IDENT[..],
            &protocol::HANDSHAKE_SYN[..],
        ] {
            bytes.extend(wire(payload));
        }
        bytes
    }

    fn test_config() -> BridgeConfig {
        BridgeConfig {
            poll_interval: Duration::from_millis(25),
            receive_timeout: Duration::from_millis(5000),
            retry_delay: Duration::from_millis(3000),
        }
    }

    fn decode_all(bytes: &[u8]) -> Vec<Frame> {
        let mut asm = FrameAssembler::new();
        let now = Instant::now();
        bytes.iter().filter_map(|&b| asm.push(b, now)).collect()
    }

    fn bridge_over(
        script: Vec<u8>,
        clock: &FakeClock,
    ) -> Bridge<ScriptReader, Vec<u8>, &FakeClock> {
        Bridge::new(ScriptReader::new(script), Vec::new(), clock, test_config()).unwrap()
    }

    #[test]
    fn full_run_handshakes_and_serves() {
        let clock = FakeClock::new();
        let mut script = panel_handshake_bytes();
        script.extend(wire(&protocol::BUTTON_DAY_A));

        let mut bridge = bridge_over(script, &clock);
        let running = AtomicBool::new(true);

        assert!(bridge.await_peer(&running).unwrap());
        assert!(bridge.negotiate(&running).unwrap());
        bridge.cycle().unwrap();

        assert_eq!(bridge.status().current_kind(), StatusKind::DayA);

        let out = std::mem::take(bridge.writer_mut().get_mut());
        // Bare start sequence precedes all framed traffic.
        assert_eq!(&out[..2], &protocol::START_SEQUENCE);

        let frames = decode_all(&out[2..]);
        let expected_replies = [
            &protocol::ACK_FIRST[..],
            &protocol::ACK_SECOND[..],
            &protocol::VERSION_REQUEST[..],
            &protocol::IDENT_ACK[..],
            &protocol::IDENT_ACK[..],
            &protocol::FINAL_ACK[..],
        ];
        for (frame, payload) in frames.iter().zip(expected_replies) {
            assert_eq!(frame.payload(), payload);
        }

        // One serve cycle: day-A status, poll request, heartbeat.
        let tail = &frames[expected_replies.len()..];
        assert_eq!(tail.len(), 3);
        assert_eq!(tail[0].payload(), &protocol::STATUS_DAY_A);
        assert_eq!(tail[1].payload(), &protocol::POLL_REQUEST);
        assert_eq!(tail[2].payload(), &protocol::HEARTBEAT);
    }

    #[test]
    fn failed_attempt_retries_after_delay() {
        let clock = FakeClock::new();
        let mut script = wire(&[0xBA, 0xD1]);
        script.extend(panel_handshake_bytes());

        let mut bridge = bridge_over(script, &clock);
        let running = AtomicBool::new(true);

        assert!(bridge.await_peer(&running).unwrap());
        assert!(bridge.negotiate(&running).unwrap());

        assert!(clock
            .slept
            .borrow()
            .contains(&Duration::from_millis(3000)));
    }

    #[test]
    fn serve_sends_default_status_until_button() {
        let clock = FakeClock::new();
        let mut bridge = bridge_over(Vec::new(), &clock);

        bridge.cycle().unwrap();
        let out = std::mem::take(bridge.writer_mut().get_mut());
        let frames = decode_all(&out);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), &protocol::STATUS_DEFAULT);
        assert_eq!(bridge.status().current_kind(), StatusKind::Default);
    }

    #[test]
    fn ok_button_restores_default_status() {
        let clock = FakeClock::new();
        let mut script = wire(&protocol::BUTTON_CLOCK);
        script.extend(wire(&protocol::BUTTON_OK));

        let mut bridge = bridge_over(script, &clock);
        bridge.cycle().unwrap();

        assert_eq!(bridge.status().current_kind(), StatusKind::Default);
    }

    #[test]
    fn stop_flag_aborts_before_peer() {
        let clock = FakeClock::new();
        let mut bridge = bridge_over(Vec::new(), &clock);
        let running = AtomicBool::new(false);

        assert!(!bridge.await_peer(&running).unwrap());
        assert!(bridge.writer_mut().get_mut().is_empty());
    }

    #[test]
    fn unrecognized_frames_do_not_change_status() {
        let clock = FakeClock::new();
        let script = wire(&[0x50, 0x62, 0x01]);
        let mut bridge = bridge_over(script, &clock);

        bridge.cycle().unwrap();
        assert_eq!(bridge.status().current_kind(), StatusKind::Default);
    }
}
