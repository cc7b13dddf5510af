mod clock;
mod cmd;
mod exit;
mod logging;
mod port;

use clap::Parser;

use crate::cmd::Command;
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "panelbridge", version, about = "Panel serial protocol bridge")]
struct Cli {
    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    match cmd::run(cli.command) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_emulate_subcommand() {
        let cli = Cli::try_parse_from([
            "panelbridge",
            "emulate",
            "/dev/ttyUSB0",
            "--baud",
            "115200",
            "--poll-interval-ms",
            "25",
        ])
        .expect("emulate args should parse");

        assert!(matches!(cli.command, Command::Emulate(_)));
    }

    #[test]
    fn parses_sniff_subcommand() {
        let cli = Cli::try_parse_from([
            "panelbridge",
            "sniff",
            "/dev/ttyUSB0",
            "/dev/ttyUSB1",
            "--dedup-capacity",
            "50",
        ])
        .expect("sniff args should parse");

        assert!(matches!(cli.command, Command::Sniff(_)));
    }

    #[test]
    fn emulate_timing_defaults_come_from_protocol_constants() {
        let cli = Cli::try_parse_from(["panelbridge", "emulate", "/dev/ttyUSB0"])
            .expect("bare emulate should parse");

        let Command::Emulate(args) = cli.command else {
            panic!("expected emulate subcommand");
        };
        assert_eq!(
            u128::from(args.retry_delay_ms),
            panelbridge_proto::DEFAULT_RETRY_DELAY.as_millis()
        );
        assert_eq!(
            u128::from(args.receive_timeout_ms),
            panelbridge_frame::assembler::DEFAULT_RECEIVE_TIMEOUT.as_millis()
        );
    }

    #[test]
    fn sniff_requires_both_ports() {
        let err = Cli::try_parse_from(["panelbridge", "sniff", "/dev/ttyUSB0"])
            .expect_err("missing second port should fail");
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }
}
