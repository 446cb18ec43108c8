use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::BytesMut;
use clap::ValueEnum;
use cmdwire_frame::{writer, ArgumentError, Arguments, Separators};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// One command with every argument unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireCommand {
    pub command_id: u8,
    pub arguments: Vec<Vec<u8>>,
}

impl WireCommand {
    /// Drain the remaining arguments of a frame whose id has been read.
    pub fn collect(command_id: u8, args: &mut Arguments<'_>) -> Result<Self, ArgumentError> {
        let mut arguments = Vec::new();
        while args.available() {
            arguments.push(args.read_bytes()?.to_vec());
        }
        Ok(Self {
            command_id,
            arguments,
        })
    }

    /// Re-encode for the wire.
    pub fn to_wire(&self, separators: &Separators, append_newline: bool) -> Vec<u8> {
        let mut out = BytesMut::new();
        writer::put_command_id(self.command_id, &mut out);
        for arg in &self.arguments {
            writer::put_argument(arg.as_slice(), separators, &mut out);
        }
        writer::put_terminator(separators, append_newline, &mut out);
        out.to_vec()
    }
}

#[derive(Serialize)]
struct CommandOutput<'a> {
    command_id: u8,
    arguments: Vec<String>,
    argument_count: usize,
    source: &'a str,
    timestamp: String,
}

pub fn print_command(
    command: &WireCommand,
    source: &str,
    separators: &Separators,
    format: OutputFormat,
) {
    let arguments: Vec<String> = command
        .arguments
        .iter()
        .map(|arg| argument_preview(arg))
        .collect();

    match format {
        OutputFormat::Json => {
            let out = CommandOutput {
                command_id: command.command_id,
                argument_count: arguments.len(),
                arguments,
                source,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            print_table(
                vec!["ID", "ARGS", "SOURCE", "ARGUMENTS"],
                vec![
                    command.command_id.to_string(),
                    arguments.len().to_string(),
                    source.to_string(),
                    arguments.join(" | "),
                ],
            );
        }
        OutputFormat::Pretty => {
            println!(
                "id={} args={} source={} [{}]",
                command.command_id,
                arguments.len(),
                source,
                arguments.join(", ")
            );
        }
        OutputFormat::Raw => {
            print_raw(&command.to_wire(separators, false));
        }
    }
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_table(header: Vec<&str>, row: Vec<String>) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header)
        .add_row(row);
    println!("{table}");
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn argument_preview(arg: &[u8]) -> String {
    match std::str::from_utf8(arg) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", arg.len()),
    }
}

pub fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
