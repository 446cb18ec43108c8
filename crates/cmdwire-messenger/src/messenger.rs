use std::fmt;
use std::time::Duration;

use bytes::{Buf, BytesMut};
use cmdwire_frame::{BinaryArg, Fixed, FrameParser, ParseState, Scientific, Separators, ToArgument};
use cmdwire_transport::{ByteStream, Clock, SystemClock};
use tracing::{debug, trace};

use crate::config::MessengerConfig;
use crate::dispatch::Dispatcher;
use crate::error::{MessengerError, Result};
use crate::handler::{CommandContext, Handler};
use crate::outbox::Outbox;

/// Acknowledgment requested when ending a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    /// Command id the peer is expected to answer with.
    pub command_id: u8,
    /// Overrides [`MessengerConfig::ack_timeout`].
    pub timeout: Option<Duration>,
}

impl Ack {
    pub fn new(command_id: u8) -> Self {
        Self {
            command_id,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// One command session over a byte stream.
///
/// Single-threaded and cooperative: nothing runs in the background. Inbound
/// bytes are processed when [`Self::feed`] is called and while
/// [`Self::wait_for_ack`] blocks. Use one `Messenger` per connection.
pub struct Messenger<S, C = SystemClock> {
    stream: S,
    clock: C,
    config: MessengerConfig,
    parser: FrameParser,
    outbox: Outbox,
    dispatcher: Dispatcher,
    /// Bytes read during an acknowledgment wait and not yet parsed.
    pending: BytesMut,
    read_buf: Vec<u8>,
}

impl<S: ByteStream> Messenger<S> {
    /// Create a session with default separators and timeouts.
    pub fn new(stream: S) -> Result<Self> {
        Self::with_config(stream, MessengerConfig::default())
    }

    pub fn with_config(stream: S, config: MessengerConfig) -> Result<Self> {
        Messenger::with_clock(stream, config, SystemClock)
    }
}

impl<S: ByteStream, C: Clock> Messenger<S, C> {
    /// Create a session that measures acknowledgment deadlines with `clock`.
    pub fn with_clock(stream: S, config: MessengerConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let parser = FrameParser::new(&config.frame)?;
        let outbox = Outbox::new(config.frame.separators, config.append_newline);
        let read_buf = vec![0u8; config.read_chunk_size];
        Ok(Self {
            stream,
            clock,
            config,
            parser,
            outbox,
            dispatcher: Dispatcher::default(),
            pending: BytesMut::new(),
            read_buf,
        })
    }

    // --- handlers ---

    /// Attach `handler` for `command_id`, replacing any previous one.
    pub fn attach<H>(&mut self, command_id: u8, handler: H)
    where
        H: Handler + Send + 'static,
    {
        self.dispatcher.attach(command_id, Box::new(handler));
    }

    /// Attach the handler for ids that have none of their own.
    pub fn attach_default<H>(&mut self, handler: H)
    where
        H: Handler + Send + 'static,
    {
        self.dispatcher.set_fallback(Box::new(handler));
    }

    /// Attach a closure for `command_id`.
    pub fn on<F>(&mut self, command_id: u8, handler: F)
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<()> + Send + 'static,
    {
        self.attach(command_id, handler);
    }

    /// Attach a closure for ids that have no handler of their own.
    pub fn on_default<F>(&mut self, handler: F)
    where
        F: FnMut(&mut CommandContext<'_>) -> Result<()> + Send + 'static,
    {
        self.attach_default(handler);
    }

    /// Remove the handler for `command_id`. Returns whether one was attached.
    pub fn detach(&mut self, command_id: u8) -> bool {
        self.dispatcher.detach(command_id)
    }

    // --- inbound ---

    /// Read everything the stream has available and dispatch every
    /// completed command. Returns the number of commands handled.
    ///
    /// Does nothing while an outbound command is being composed; the bytes
    /// stay in the stream until the next call.
    pub fn feed(&mut self) -> Result<usize> {
        if let Some(command_id) = self.outbox.in_flight() {
            trace!(command_id, "inbound processing suspended while composing");
            return Ok(0);
        }

        let mut dispatched = 0;
        if !self.pending.is_empty() {
            let pending = self.pending.split();
            dispatched += self
                .dispatcher
                .process(&mut self.parser, &mut self.outbox, &pending);
        }

        loop {
            let available = self.stream.bytes_available()?;
            if available == 0 {
                break;
            }
            let want = available.min(self.read_buf.len());
            let read = self.stream.read_up_to(&mut self.read_buf[..want])?;
            if read == 0 {
                break;
            }
            trace!(read, "read inbound chunk");
            dispatched += self.dispatcher.process(
                &mut self.parser,
                &mut self.outbox,
                &self.read_buf[..read],
            );
        }

        self.flush_outbox()?;
        Ok(dispatched)
    }

    /// Dispatch commands from `bytes` as if they had arrived on the stream.
    ///
    /// # Errors
    ///
    /// [`MessengerError::CommandInProgress`] while an outbound command is
    /// being composed; nothing is consumed.
    pub fn process(&mut self, bytes: &[u8]) -> Result<usize> {
        if let Some(command_id) = self.outbox.in_flight() {
            return Err(MessengerError::CommandInProgress(command_id));
        }
        let dispatched = self
            .dispatcher
            .process(&mut self.parser, &mut self.outbox, bytes);
        self.flush_outbox()?;
        Ok(dispatched)
    }

    // --- outbound ---

    /// Start composing a command.
    ///
    /// # Errors
    ///
    /// [`MessengerError::CommandInProgress`] if another command has not
    /// been ended or aborted.
    pub fn begin(&mut self, command_id: u8) -> Result<()> {
        self.outbox.begin(command_id)?;
        trace!(command_id, "begin command");
        Ok(())
    }

    /// Append a text argument, escaping delimiters.
    pub fn add_argument<T: ToArgument + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.outbox.ensure_in_flight()?;
        self.outbox.put_argument(value);
        Ok(())
    }

    /// Append a fixed-width little-endian binary argument.
    pub fn add_binary_argument<T: BinaryArg>(&mut self, value: &T) -> Result<()> {
        self.outbox.ensure_in_flight()?;
        self.outbox.put_binary_argument(value);
        Ok(())
    }

    /// Append a float in scientific notation with `digits` fractional digits.
    pub fn add_sci_argument(&mut self, value: f64, digits: u32) -> Result<()> {
        self.add_argument(&Scientific(value, digits))
    }

    /// Append a float with a fixed number of decimals.
    pub fn add_precision_argument(&mut self, value: f64, decimals: usize) -> Result<()> {
        self.add_argument(&Fixed(value, decimals))
    }

    /// Append pre-formatted text, e.g. `format_args!("{x}:{y}")`.
    pub fn add_formatted_argument(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        self.add_argument(&args)
    }

    /// Throw away the command being composed.
    pub fn abort(&mut self) {
        if let Some(command_id) = self.outbox.in_flight() {
            debug!(command_id, "command aborted");
        }
        self.outbox.abort();
    }

    /// Terminate the command, write it, and optionally wait for an
    /// acknowledgment.
    ///
    /// Returns `true` only when an acknowledgment was requested and the
    /// matching reply arrived in time.
    pub fn end(&mut self, ack: Option<Ack>) -> Result<bool> {
        let command_id = self.outbox.finish()?;
        self.flush_outbox()?;
        debug!(command_id, "sent command");

        match ack {
            Some(ack) => {
                let timeout = ack.timeout.unwrap_or(self.config.ack_timeout);
                self.wait_for_ack(ack.command_id, timeout)
            }
            None => Ok(false),
        }
    }

    /// Send a command with no arguments.
    pub fn send_command(&mut self, command_id: u8, ack: Option<Ack>) -> Result<bool> {
        self.begin(command_id)?;
        self.end(ack)
    }

    /// Send a command with one text argument.
    pub fn send_command_arg<T: ToArgument + ?Sized>(
        &mut self,
        command_id: u8,
        value: &T,
        ack: Option<Ack>,
    ) -> Result<bool> {
        self.begin(command_id)?;
        self.add_argument(value)?;
        self.end(ack)
    }

    /// Send a command with one binary argument.
    pub fn send_binary_command<T: BinaryArg>(
        &mut self,
        command_id: u8,
        value: &T,
        ack: Option<Ack>,
    ) -> Result<bool> {
        self.begin(command_id)?;
        self.add_binary_argument(value)?;
        self.end(ack)
    }

    // --- acknowledgment ---

    /// Block until a command arrives, then report whether its id is
    /// `command_id`.
    ///
    /// The first completed command decides: a different id fails at once
    /// rather than waiting for a later match. Commands seen here are not
    /// dispatched. Bytes after the deciding command are kept for the next
    /// [`Self::feed`]. With a zero timeout and nothing buffered this returns
    /// `false` without polling the stream.
    ///
    /// Busy-polls the stream; only transport failures are errors.
    pub fn wait_for_ack(&mut self, command_id: u8, timeout: Duration) -> Result<bool> {
        // A timeout past the clock's range never expires.
        let deadline = self.clock.now().checked_add(timeout);
        loop {
            if let Some(matched) = self.scan_pending_for_ack(command_id) {
                return Ok(matched);
            }
            if deadline.is_some_and(|deadline| self.clock.now() >= deadline) {
                debug!(command_id, ?timeout, "acknowledgment timed out");
                return Ok(false);
            }
            if !self.read_into_pending()? {
                std::hint::spin_loop();
            }
        }
    }

    /// [`Self::wait_for_ack`] that sleeps for
    /// [`MessengerConfig::poll_interval`] instead of spinning when the
    /// stream is idle.
    #[cfg(feature = "async")]
    pub async fn wait_for_ack_async(&mut self, command_id: u8, timeout: Duration) -> Result<bool> {
        // A timeout past the clock's range never expires.
        let deadline = self.clock.now().checked_add(timeout);
        loop {
            if let Some(matched) = self.scan_pending_for_ack(command_id) {
                return Ok(matched);
            }
            if deadline.is_some_and(|deadline| self.clock.now() >= deadline) {
                debug!(command_id, ?timeout, "acknowledgment timed out");
                return Ok(false);
            }
            if !self.read_into_pending()? {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }
    }

    fn read_into_pending(&mut self) -> Result<bool> {
        let available = self.stream.bytes_available()?;
        if available == 0 {
            return Ok(false);
        }
        let want = available.min(self.read_buf.len());
        let read = self.stream.read_up_to(&mut self.read_buf[..want])?;
        self.pending.extend_from_slice(&self.read_buf[..read]);
        Ok(read > 0)
    }

    /// Parse pending bytes up to the first completed frame.
    fn scan_pending_for_ack(&mut self, command_id: u8) -> Option<bool> {
        let mut decided = None;
        for (index, &byte) in self.pending.iter().enumerate() {
            if let Ok(ParseState::FrameComplete) = self.parser.push_byte(byte) {
                let received = self
                    .parser
                    .arguments()
                    .and_then(|mut args| args.read_command_id().ok());
                decided = Some((index + 1, received));
                break;
            }
        }

        match decided {
            Some((consumed, received)) => {
                self.pending.advance(consumed);
                let matched = received == Some(command_id);
                if matched {
                    debug!(command_id, "acknowledged");
                } else {
                    debug!(expected = command_id, ?received, "unexpected reply");
                }
                Some(matched)
            }
            None => {
                self.pending.clear();
                None
            }
        }
    }

    fn flush_outbox(&mut self) -> Result<()> {
        let bytes = self.outbox.take_complete();
        if bytes.is_empty() {
            return Ok(());
        }
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        trace!(len = bytes.len(), "wrote outbound bytes");
        Ok(())
    }

    // --- accessors ---

    /// Id of the most recently dispatched command.
    pub fn last_command_id(&self) -> Option<u8> {
        self.dispatcher.last_command_id()
    }

    pub fn set_append_newline(&mut self, append_newline: bool) {
        self.config.append_newline = append_newline;
        self.outbox.set_append_newline(append_newline);
    }

    pub fn is_command_in_progress(&self) -> bool {
        self.outbox.in_flight().is_some()
    }

    /// Inbound frames dropped for exceeding the receive buffer.
    pub fn overflow_count(&self) -> u64 {
        self.parser.overflow_count()
    }

    /// Acknowledgment for the configured default ack command.
    pub fn default_ack(&self) -> Ack {
        Ack::new(self.config.default_ack_command)
    }

    pub fn separators(&self) -> Separators {
        self.config.frame.separators
    }

    pub fn config(&self) -> &MessengerConfig {
        &self.config
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S, C> fmt::Debug for Messenger<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Messenger")
            .field("config", &self.config)
            .field("handlers", &self.dispatcher.handler_count())
            .field("in_flight", &self.outbox.in_flight())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
