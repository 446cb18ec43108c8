use serde::Serialize;

use crate::cmd::{Context, EncodeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, print_raw, print_table, OutputFormat, WireCommand};

#[derive(Serialize)]
struct EncodeOutput {
    command_id: u8,
    wire: String,
    length: usize,
}

pub fn run(args: EncodeArgs, ctx: &Context) -> CliResult<i32> {
    let command = WireCommand {
        command_id: args.id,
        arguments: args.args.into_iter().map(String::into_bytes).collect(),
    };
    let wire = command.to_wire(&ctx.separators, args.newline);

    match ctx.format {
        OutputFormat::Raw => print_raw(&wire),
        OutputFormat::Json => print_json(&EncodeOutput {
            command_id: command.command_id,
            wire: String::from_utf8_lossy(&wire).into_owned(),
            length: wire.len(),
        }),
        OutputFormat::Table => print_table(
            vec!["ID", "LENGTH", "WIRE"],
            vec![
                command.command_id.to_string(),
                wire.len().to_string(),
                String::from_utf8_lossy(&wire).escape_debug().to_string(),
            ],
        ),
        OutputFormat::Pretty => println!(
            "id={} length={} wire={}",
            command.command_id,
            wire.len(),
            String::from_utf8_lossy(&wire).escape_debug()
        ),
    }

    Ok(SUCCESS)
}
