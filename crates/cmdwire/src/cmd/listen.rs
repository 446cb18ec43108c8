use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cmd::{serve, Context, ListenArgs};
use crate::exit::CliResult;
use crate::output::{print_command, WireCommand};

pub fn run(args: ListenArgs, ctx: &Context) -> CliResult<i32> {
    let printed = Arc::new(AtomicUsize::new(0));
    let limit = args.count;
    let ids = args.ids;
    let separators = ctx.separators;
    let format = ctx.format;

    tracing::info!(path = %args.path.display(), "listening");

    let counter = printed.clone();
    serve(
        &args.path,
        ctx.messenger_config(),
        move |messenger, peer| {
            let ids = ids.clone();
            let counter = counter.clone();
            messenger.on_default(move |cmd| {
                if limit.is_some_and(|n| counter.load(Ordering::SeqCst) >= n) {
                    return Ok(());
                }
                if !accepts(ids.as_deref(), cmd.command_id()) {
                    return Ok(());
                }
                let command = WireCommand::collect(cmd.command_id(), cmd.args())?;
                print_command(&command, &peer, &separators, format);
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        },
        || limit.is_some_and(|n| printed.load(Ordering::SeqCst) >= n),
    )
}

fn accepts(ids: Option<&[u8]>, command_id: u8) -> bool {
    ids.map_or(true, |ids| ids.contains(&command_id))
}
