use clap::{Args, Subcommand};

use panelbridge_frame::assembler::DEFAULT_RECEIVE_TIMEOUT;
use panelbridge_proto::{DEFAULT_DEDUP_CAPACITY, DEFAULT_RETRY_DELAY};

use crate::exit::CliResult;

pub mod emulate;
pub mod sniff;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play the mainboard side: handshake, then report status frames.
    Emulate(EmulateArgs),
    /// Observe two serial streams and log their frames.
    Sniff(SniffArgs),
    /// Show version information.
    Version,
}

pub fn run(command: Command) -> CliResult<i32> {
    match command {
        Command::Emulate(args) => emulate::run(args),
        Command::Sniff(args) => sniff::run(args),
        Command::Version => version::run(),
    }
}

#[derive(Args, Debug)]
pub struct EmulateArgs {
    /// Serial port connected to the panel.
    pub port: String,
    /// Baud rate.
    #[arg(long, default_value_t = crate::port::DEFAULT_BAUD)]
    pub baud: u32,
    /// Poll cycle delay in milliseconds.
    #[arg(long, default_value_t = 25)]
    pub poll_interval_ms: u64,
    /// Receive timeout before a partial frame is abandoned, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RECEIVE_TIMEOUT.as_millis() as u64)]
    pub receive_timeout_ms: u64,
    /// Delay before retrying a failed handshake attempt, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_millis() as u64)]
    pub retry_delay_ms: u64,
}

#[derive(Args, Debug)]
pub struct SniffArgs {
    /// Serial port for channel A.
    pub port_a: String,
    /// Serial port for channel B.
    pub port_b: String,
    /// Baud rate (both channels).
    #[arg(long, default_value_t = crate::port::DEFAULT_BAUD)]
    pub baud: u32,
    /// Poll cycle delay in milliseconds.
    #[arg(long, default_value_t = 25)]
    pub poll_interval_ms: u64,
    /// Receive timeout before a partial frame is abandoned, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_RECEIVE_TIMEOUT.as_millis() as u64)]
    pub receive_timeout_ms: u64,
    /// Capacity of the duplicate-sighting cache.
    #[arg(long, default_value_t = DEFAULT_DEDUP_CAPACITY)]
    pub dedup_capacity: usize,
}
