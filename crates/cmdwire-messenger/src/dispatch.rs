//! Frame → handler routing.

use std::collections::HashMap;

use cmdwire_frame::{FrameParser, ParseState};
use tracing::{debug, warn};

use crate::handler::{CommandContext, Handler};
use crate::outbox::Outbox;

pub(crate) type BoxedHandler = Box<dyn Handler + Send>;

/// Handlers keyed by command id, with an optional fallback for ids that
/// have none.
#[derive(Default)]
pub(crate) struct Dispatcher {
    handlers: HashMap<u8, BoxedHandler>,
    fallback: Option<BoxedHandler>,
    last_command_id: Option<u8>,
}

impl Dispatcher {
    pub(crate) fn attach(&mut self, command_id: u8, handler: BoxedHandler) {
        if self.handlers.insert(command_id, handler).is_some() {
            debug!(command_id, "replaced handler");
        }
    }

    pub(crate) fn detach(&mut self, command_id: u8) -> bool {
        self.handlers.remove(&command_id).is_some()
    }

    pub(crate) fn set_fallback(&mut self, handler: BoxedHandler) {
        self.fallback = Some(handler);
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn last_command_id(&self) -> Option<u8> {
        self.last_command_id
    }

    /// Push `bytes` through `parser`, dispatching each completed frame.
    /// Returns the number of frames a handler was run for.
    pub(crate) fn process(
        &mut self,
        parser: &mut FrameParser,
        outbox: &mut Outbox,
        bytes: &[u8],
    ) -> usize {
        let mut dispatched = 0;
        for &byte in bytes {
            // Overflow is logged and counted by the parser, which resynchronizes by itself.
            if let Ok(ParseState::FrameComplete) = parser.push_byte(byte) {
                if self.dispatch(parser, outbox) {
                    dispatched += 1;
                }
            }
        }
        dispatched
    }

    fn dispatch(&mut self, parser: &mut FrameParser, outbox: &mut Outbox) -> bool {
        let Some(mut args) = parser.arguments() else {
            return false;
        };
        let command_id = match args.read_command_id() {
            Ok(command_id) => command_id,
            Err(err) => {
                warn!(error = %err, "dropping frame with invalid command id");
                return false;
            }
        };
        self.last_command_id = Some(command_id);

        let handler = match self.handlers.get_mut(&command_id) {
            Some(handler) => handler,
            None => match self.fallback.as_mut() {
                Some(handler) => handler,
                None => {
                    debug!(command_id, "no handler attached, frame ignored");
                    return false;
                }
            },
        };

        debug!(command_id, "dispatching command");
        let mut ctx = CommandContext::new(command_id, args, outbox);
        if let Err(err) = handler.handle(&mut ctx) {
            warn!(command_id, error = %err, "handler failed");
        }
        true
    }
}
