//! Inbound command handlers.

use cmdwire_frame::{Arguments, BinaryArg, Fixed, Scientific, ToArgument};

use crate::error::Result;
use crate::outbox::Outbox;

/// Reacts to one inbound command.
///
/// Implemented for every `FnMut(&mut CommandContext<'_>) -> Result<()>`, so
/// closures can be attached directly with [`crate::Messenger::on`].
pub trait Handler {
    fn handle(&mut self, ctx: &mut CommandContext<'_>) -> Result<()>;
}

impl<F> Handler for F
where
    F: FnMut(&mut CommandContext<'_>) -> Result<()>,
{
    fn handle(&mut self, ctx: &mut CommandContext<'_>) -> Result<()> {
        self(ctx)
    }
}

/// What a handler sees of the command being dispatched.
///
/// The command id has already been read; [`Self::args`] continues with the
/// first argument after it. Argument views borrow the receive buffer and
/// are gone once the handler returns.
pub struct CommandContext<'a> {
    command_id: u8,
    args: Arguments<'a>,
    outbox: &'a mut Outbox,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(command_id: u8, args: Arguments<'a>, outbox: &'a mut Outbox) -> Self {
        Self {
            command_id,
            args,
            outbox,
        }
    }

    pub fn command_id(&self) -> u8 {
        self.command_id
    }

    pub fn args(&mut self) -> &mut Arguments<'a> {
        &mut self.args
    }

    /// Start a reply command.
    ///
    /// Replies are queued and written to the stream after the handler
    /// returns. A reply dropped without [`Reply::send`] is discarded.
    pub fn reply(&mut self, command_id: u8) -> Result<Reply<'_>> {
        self.outbox.begin(command_id)?;
        Ok(Reply {
            outbox: &mut *self.outbox,
            sent: false,
        })
    }
}

/// A reply under construction. See [`CommandContext::reply`].
#[must_use = "a reply is discarded unless sent"]
pub struct Reply<'a> {
    outbox: &'a mut Outbox,
    sent: bool,
}

impl Reply<'_> {
    pub fn arg<T: ToArgument + ?Sized>(self, value: &T) -> Self {
        self.outbox.put_argument(value);
        self
    }

    pub fn binary_arg<T: BinaryArg>(self, value: &T) -> Self {
        self.outbox.put_binary_argument(value);
        self
    }

    /// Float in scientific notation with `digits` fractional digits.
    pub fn sci_arg(self, value: f64, digits: u32) -> Self {
        self.arg(&Scientific(value, digits))
    }

    /// Float with a fixed number of decimals.
    pub fn precision_arg(self, value: f64, decimals: usize) -> Self {
        self.arg(&Fixed(value, decimals))
    }

    /// Terminate the reply and queue it.
    pub fn send(mut self) -> Result<()> {
        self.outbox.finish()?;
        self.sent = true;
        Ok(())
    }
}

impl Drop for Reply<'_> {
    fn drop(&mut self) {
        if !self.sent {
            self.outbox.abort();
        }
    }
}
