use std::time::Duration;

use cmdwire_messenger::{Ack, Messenger, MessengerConfig};
use cmdwire_transport::{ByteStream, Clock, UnixDomainSocket};
use serde::Serialize;

use crate::cmd::{Context, SendArgs};
use crate::exit::{
    messenger_error, transport_error, CliError, CliResult, SUCCESS, TIMEOUT, USAGE,
};
use crate::output::{argument_preview, print_json, print_raw, print_table, OutputFormat, WireCommand};

#[derive(Serialize)]
struct SendOutput {
    command_id: u8,
    arguments: Vec<String>,
    bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    ack_id: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    acknowledged: Option<bool>,
}

pub fn run(args: SendArgs, ctx: &Context) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let stream = UnixDomainSocket::connect(&args.path)
        .map_err(|err| transport_error("connect failed", err))?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(|err| transport_error("connect failed", err))?;

    let config = MessengerConfig {
        ack_timeout: timeout,
        append_newline: args.newline,
        ..ctx.messenger_config()
    };
    let mut messenger = Messenger::with_config(stream, config)
        .map_err(|err| messenger_error("session setup failed", err))?;

    let command = WireCommand {
        command_id: args.id,
        arguments: args.args.into_iter().map(String::into_bytes).collect(),
    };
    let acknowledged = send(&mut messenger, &command, args.ack)
        .map_err(|err| messenger_error("send failed", err))?;

    let wire = command.to_wire(&ctx.separators, args.newline);
    let ack_state = args.ack.map(|_| acknowledged);
    match ctx.format {
        OutputFormat::Raw => print_raw(&wire),
        OutputFormat::Json => print_json(&SendOutput {
            command_id: command.command_id,
            arguments: command.arguments.iter().map(|a| argument_preview(a)).collect(),
            bytes: wire.len(),
            ack_id: args.ack,
            acknowledged: ack_state,
        }),
        OutputFormat::Table => print_table(
            vec!["ID", "BYTES", "ACK"],
            vec![
                command.command_id.to_string(),
                wire.len().to_string(),
                describe_ack(args.ack, acknowledged),
            ],
        ),
        OutputFormat::Pretty => println!(
            "sent id={} bytes={} ack={}",
            command.command_id,
            wire.len(),
            describe_ack(args.ack, acknowledged)
        ),
    }

    match args.ack {
        Some(ack_id) if !acknowledged => Err(CliError::new(
            TIMEOUT,
            format!("no acknowledgment with id {ack_id} within {timeout:?}"),
        )),
        _ => Ok(SUCCESS),
    }
}

fn send<S, C>(
    messenger: &mut Messenger<S, C>,
    command: &WireCommand,
    ack: Option<u8>,
) -> cmdwire_messenger::Result<bool>
where
    S: ByteStream,
    C: Clock,
{
    messenger.begin(command.command_id)?;
    for arg in &command.arguments {
        messenger.add_argument(arg.as_slice())?;
    }
    messenger.end(ack.map(Ack::new))
}

fn describe_ack(ack: Option<u8>, acknowledged: bool) -> String {
    match ack {
        None => "-".to_string(),
        Some(id) if acknowledged => format!("{id} ok"),
        Some(id) => format!("{id} missing"),
    }
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
