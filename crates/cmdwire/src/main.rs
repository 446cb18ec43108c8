mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;
use cmdwire_frame::Separators;

use crate::cmd::{Command, Context};
use crate::exit::frame_error;
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cmdwire", version, about = "Escape-safe command protocol CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", global = true)]
    log_level: LogLevel,

    /// Byte ending an argument (a single ASCII character or 0xNN).
    #[arg(long, value_name = "BYTE", default_value = ",", value_parser = parse_byte, global = true)]
    field_separator: u8,

    /// Byte ending a command.
    #[arg(long, value_name = "BYTE", default_value = ";", value_parser = parse_byte, global = true)]
    command_separator: u8,

    /// Byte marking the next byte as literal.
    #[arg(long, value_name = "BYTE", default_value = "/", value_parser = parse_byte, global = true)]
    escape_character: u8,

    #[command(subcommand)]
    command: Command,
}

fn parse_byte(input: &str) -> Result<u8, String> {
    if let Some(hex) = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        return u8::from_str_radix(hex, 16).map_err(|err| format!("invalid hex byte {input}: {err}"));
    }
    match input.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!(
            "expected a single ASCII character or 0xNN, got {input:?}"
        )),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = Separators::new(
        cli.field_separator,
        cli.command_separator,
        cli.escape_character,
    )
    .map_err(|err| frame_error("invalid separators", err))
    .and_then(|separators| cmd::run(cli.command, &Context { format, separators }));

    match result {
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
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "cmdwire",
            "send",
            "/tmp/test.sock",
            "--id",
            "5",
            "--arg",
            "a,b",
            "--arg",
            "42",
            "--ack",
            "6",
        ])
        .expect("send args should parse");

        match cli.command {
            Command::Send(args) => {
                assert_eq!(args.id, 5);
                assert_eq!(args.args, vec!["a,b", "42"]);
                assert_eq!(args.ack, Some(6));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_range_command_id() {
        let err = Cli::try_parse_from(["cmdwire", "encode", "--id", "256"])
            .expect_err("id above 255 should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn separator_flags_are_global() {
        let cli = Cli::try_parse_from([
            "cmdwire",
            "decode",
            "--field-separator",
            "|",
            "--command-separator",
            "0x0a",
        ])
        .expect("separator flags should parse after the subcommand");
        assert_eq!(cli.field_separator, b'|');
        assert_eq!(cli.command_separator, b'\n');
        assert_eq!(cli.escape_character, b'/');
    }

    #[test]
    fn parse_byte_forms() {
        assert_eq!(parse_byte(";"), Ok(b';'));
        assert_eq!(parse_byte("0x2C"), Ok(b','));
        assert!(parse_byte("ab").is_err());
        assert!(parse_byte("é").is_err());
        assert!(parse_byte("0xZZ").is_err());
    }
}
