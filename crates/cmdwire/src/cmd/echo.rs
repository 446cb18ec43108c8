use crate::cmd::{serve, Context, EchoArgs};
use crate::exit::CliResult;
use crate::output::{argument_preview, WireCommand};

pub fn run(args: EchoArgs, ctx: &Context) -> CliResult<i32> {
    let config = cmdwire_messenger::MessengerConfig {
        append_newline: args.newline,
        ..ctx.messenger_config()
    };

    tracing::info!(path = %args.path.display(), "echo server listening");

    serve(
        &args.path,
        config,
        |messenger, peer| {
            messenger.on_default(move |cmd| {
                let command = WireCommand::collect(cmd.command_id(), cmd.args())?;
                tracing::info!(
                    peer = %peer,
                    command_id = command.command_id,
                    args = ?command.arguments.iter().map(|a| argument_preview(a)).collect::<Vec<_>>(),
                    "echo"
                );
                let mut reply = cmd.reply(command.command_id)?;
                for arg in &command.arguments {
                    reply = reply.arg(arg.as_slice());
                }
                reply.send()
            });
        },
        || false,
    )
}
