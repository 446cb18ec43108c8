use std::fs;
use std::io::{self, Read};

use cmdwire_frame::{FrameConfig, FrameParser, ParseState};
use tracing::warn;

use crate::cmd::{Context, DecodeArgs};
use crate::exit::{frame_error, io_error, CliResult, DATA_INVALID, SUCCESS};
use crate::output::{print_command, WireCommand};

/// Everything recovered from one input, plus what had to be skipped.
#[derive(Debug, Default, PartialEq, Eq)]
struct Decoded {
    commands: Vec<WireCommand>,
    overflows: usize,
    invalid_ids: usize,
    trailing_bytes: usize,
}

impl Decoded {
    fn is_clean(&self) -> bool {
        self.overflows == 0 && self.invalid_ids == 0 && self.trailing_bytes == 0
    }
}

pub fn run(args: DecodeArgs, ctx: &Context) -> CliResult<i32> {
    let (data, source) = match &args.input {
        Some(path) => {
            let data = fs::read(path).map_err(|err| {
                io_error(&format!("failed reading {}", path.display()), err)
            })?;
            (data, path.display().to_string())
        }
        None => {
            let mut data = Vec::new();
            io::stdin()
                .read_to_end(&mut data)
                .map_err(|err| io_error("failed reading stdin", err))?;
            (data, "stdin".to_string())
        }
    };

    let config = FrameConfig {
        separators: ctx.separators,
        buffer_capacity: args.buffer_capacity,
    };
    let decoded = decode_all(&data, &config)?;

    for command in &decoded.commands {
        print_command(command, &source, &ctx.separators, ctx.format);
    }

    if decoded.trailing_bytes > 0 {
        warn!(
            bytes = decoded.trailing_bytes,
            "input ends inside an unterminated command"
        );
    }
    if decoded.is_clean() {
        Ok(SUCCESS)
    } else {
        warn!(
            overflows = decoded.overflows,
            invalid_ids = decoded.invalid_ids,
            "some input could not be decoded"
        );
        Ok(DATA_INVALID)
    }
}

fn decode_all(data: &[u8], config: &FrameConfig) -> CliResult<Decoded> {
    let mut parser =
        FrameParser::new(config).map_err(|err| frame_error("invalid frame settings", err))?;
    let mut decoded = Decoded::default();

    for &byte in data {
        match parser.push_byte(byte) {
            Ok(ParseState::FrameComplete) => {
                let Some(mut args) = parser.arguments() else {
                    continue;
                };
                match args
                    .read_command_id()
                    .and_then(|id| WireCommand::collect(id, &mut args))
                {
                    Ok(command) => decoded.commands.push(command),
                    Err(err) => {
                        warn!(error = %err, "skipping command with invalid id");
                        decoded.invalid_ids += 1;
                    }
                }
            }
            Ok(_) => {}
            Err(_) => decoded.overflows += 1,
        }
    }

    decoded.trailing_bytes = parser.pending_len();
    Ok(decoded)
}
