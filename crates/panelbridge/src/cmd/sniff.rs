//! Two-channel listener: decode frames from both directions of the
//! link and log them with duplicate-sighting ages.

use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use panelbridge_frame::{FrameAssembler, FrameError};
use panelbridge_proto::DedupCache;

use crate::clock::{Clock, SystemClock};
use crate::cmd::SniffArgs;
use crate::exit::{frame_error, serial_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::port;

const DRAIN_CHUNK: usize = 64;

pub fn run(args: SniffArgs) -> CliResult<i32> {
    let port_a =
        port::open(&args.port_a, args.baud).map_err(|err| serial_error("opening port A", err))?;
    let port_b =
        port::open(&args.port_b, args.baud).map_err(|err| serial_error("opening port B", err))?;

    let running = Arc::new(AtomicBool::new(true));
    let flag = running.clone();
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))?;

    let receive_timeout = Duration::from_millis(args.receive_timeout_ms);
    let mut monitor = Monitor::new(
        vec![('A', port_a), ('B', port_b)],
        receive_timeout,
        args.dedup_capacity,
        Duration::from_millis(args.poll_interval_ms),
        SystemClock,
    );

    tracing::info!(port_a = %args.port_a, port_b = %args.port_b, "listening");
    monitor
        .run(&running)
        .map_err(|err| frame_error("sniff loop", err))?;

    for channel in monitor.channels() {
        let stats = channel.assembler.stats();
        tracing::info!(
            sender = %channel.tag,
            frames = stats.frames,
            checksum_failures = stats.checksum_failures,
            overflows = stats.overflows,
            timeouts = stats.timeouts,
            "channel totals"
        );
    }

    Ok(SUCCESS)
}

/// One monitored direction of the link.
pub struct Channel<R> {
    tag: char,
    reader: R,
    assembler: FrameAssembler,
}

/// Polls both channels, decoding and logging every frame. The shared
/// sighting cache only annotates repeats; it never suppresses output.
pub struct Monitor<R, C> {
    channels: Vec<Channel<R>>,
    cache: DedupCache,
    clock: C,
    poll_interval: Duration,
}

impl<R: Read, C: Clock> Monitor<R, C> {
    pub fn new(
        channels: Vec<(char, R)>,
        receive_timeout: Duration,
        dedup_capacity: usize,
        poll_interval: Duration,
        clock: C,
    ) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|(tag, reader)| Channel {
                    tag,
                    reader,
                    assembler: FrameAssembler::with_timeout(receive_timeout),
                })
                .collect(),
            cache: DedupCache::new(dedup_capacity),
            clock,
            poll_interval,
        }
    }

    pub fn run(&mut self, running: &AtomicBool) -> Result<(), FrameError> {
        while running.load(Ordering::SeqCst) {
            self.cycle()?;
            self.clock.sleep(self.poll_interval);
        }
        Ok(())
    }

    /// One poll pass over both channels. Returns the number of frames
    /// logged.
    pub fn cycle(&mut self) -> Result<usize, FrameError> {
        let mut logged = 0;
        let mut chunk = [0u8; DRAIN_CHUNK];

        for channel in &mut self.channels {
            loop {
                let n = port::read_available(&mut channel.reader, &mut chunk)?;
                if n == 0 {
                    break;
                }

                let now = self.clock.now();
                for &byte in &chunk[..n] {
                    let Some(frame) = channel.assembler.push(byte, now) else {
                        continue;
                    };

                    match self.cache.seen_or_record(channel.tag, frame.as_bytes(), now) {
                        Some(age) => {
                            tracing::info!(
                                sender = %channel.tag,
                                frame = %frame,
                                repeat_after_ms = age.as_millis() as u64,
                                "frame"
                            );
                        }
                        None => {
                            tracing::info!(sender = %channel.tag, frame = %frame, "frame");
                        }
                    }
                    logged += 1;
                }
            }

            if channel.assembler.check_timeout(self.clock.now()) {
                tracing::warn!(sender = %channel.tag, "partial frame abandoned after timeout");
            }
        }

        Ok(logged)
    }

    pub fn channels(&self) -> &[Channel<R>] {
        &self.channels
    }

    pub fn cache(&self) -> &DedupCache {
        &self.cache
    }
}
