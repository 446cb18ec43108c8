//! Outbound command staging.
//!
//! Commands are composed here and only complete commands are handed to the
//! transport, so a half-built command never reaches the wire.

use bytes::{Bytes, BytesMut};
use cmdwire_frame::{writer, BinaryArg, Separators, ToArgument};

use crate::error::{MessengerError, Result};

#[derive(Debug)]
pub(crate) struct Outbox {
    buf: BytesMut,
    separators: Separators,
    append_newline: bool,
    in_flight: Option<u8>,
    /// Start of the command being composed.
    start: usize,
}

impl Outbox {
    pub(crate) fn new(separators: Separators, append_newline: bool) -> Self {
        Self {
            buf: BytesMut::with_capacity(64),
            separators,
            append_newline,
            in_flight: None,
            start: 0,
        }
    }

    pub(crate) fn set_append_newline(&mut self, append_newline: bool) {
        self.append_newline = append_newline;
    }

    pub(crate) fn in_flight(&self) -> Option<u8> {
        self.in_flight
    }

    pub(crate) fn begin(&mut self, command_id: u8) -> Result<()> {
        if let Some(current) = self.in_flight {
            return Err(MessengerError::CommandInProgress(current));
        }
        self.start = self.buf.len();
        writer::put_command_id(command_id, &mut self.buf);
        self.in_flight = Some(command_id);
        Ok(())
    }

    pub(crate) fn ensure_in_flight(&self) -> Result<u8> {
        self.in_flight.ok_or(MessengerError::NoCommandInProgress)
    }

    /// Caller has checked that a command is in flight.
    pub(crate) fn put_argument<T: ToArgument + ?Sized>(&mut self, value: &T) {
        writer::put_argument(value, &self.separators, &mut self.buf);
    }

    /// Caller has checked that a command is in flight.
    pub(crate) fn put_binary_argument<T: BinaryArg>(&mut self, value: &T) {
        writer::put_binary_argument(value, &self.separators, &mut self.buf);
    }

    /// Terminate the command in flight and return its id.
    pub(crate) fn finish(&mut self) -> Result<u8> {
        let command_id = self.ensure_in_flight()?;
        writer::put_terminator(&self.separators, self.append_newline, &mut self.buf);
        self.in_flight = None;
        self.start = self.buf.len();
        Ok(command_id)
    }

    /// Drop the command in flight, keeping earlier complete commands.
    pub(crate) fn abort(&mut self) {
        if self.in_flight.take().is_some() {
            self.buf.truncate(self.start);
        }
    }

    /// Take every complete command staged so far.
    pub(crate) fn take_complete(&mut self) -> Bytes {
        let complete = if self.in_flight.is_some() {
            self.start
        } else {
            self.buf.len()
        };
        self.start -= complete.min(self.start);
        self.buf.split_to(complete).freeze()
    }
}
