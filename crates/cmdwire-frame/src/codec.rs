//! `tokio-util` codec for framed async transports.
//!
//! Available with the `async` feature. Decoding runs the same byte-at-a-time
//! [`FrameParser`] as the blocking path, so escape handling and overflow
//! recovery are identical: an oversize frame is dropped and decoding
//! continues with the next one.

use std::io;

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::args::BinaryArg;
use crate::config::FrameConfig;
use crate::error::{ArgumentError, Result};
use crate::escape::Separators;
use crate::format::ToArgument;
use crate::parser::{FrameParser, ParseState};
use crate::tokenizer::{ArgCursor, Arguments};
use crate::writer;

/// One complete frame, still escaped, without its command separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    raw: Vec<u8>,
    separators: Separators,
    cursor: ArgCursor,
}

impl CommandFrame {
    /// Wrap raw frame bytes received or built elsewhere.
    pub fn from_raw(raw: impl Into<Vec<u8>>, separators: Separators) -> Self {
        Self {
            raw: raw.into(),
            separators,
            cursor: ArgCursor::new(),
        }
    }

    /// Start building an outbound frame.
    pub fn builder(command_id: u8, separators: Separators) -> CommandFrameBuilder {
        CommandFrameBuilder::new(command_id, separators)
    }

    /// Escaped wire bytes, excluding the command separator.
    ///
    /// Meaningful only before [`Self::arguments`] is first used; reads
    /// unescape tokens in place.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Read the frame's arguments, command id first.
    pub fn arguments(&mut self) -> Arguments<'_> {
        Arguments::new(&mut self.raw, &mut self.cursor, self.separators)
    }

    /// Read the command id from a fresh copy, leaving the cursor untouched.
    pub fn command_id(&self) -> std::result::Result<u8, ArgumentError> {
        let mut raw = self.raw.clone();
        let mut cursor = ArgCursor::new();
        Arguments::new(&mut raw, &mut cursor, self.separators).read_command_id()
    }
}

/// Accumulates an outbound [`CommandFrame`].
#[derive(Debug)]
pub struct CommandFrameBuilder {
    raw: BytesMut,
    separators: Separators,
}

impl CommandFrameBuilder {
    fn new(command_id: u8, separators: Separators) -> Self {
        let mut raw = BytesMut::with_capacity(32);
        writer::put_command_id(command_id, &mut raw);
        Self { raw, separators }
    }

    pub fn arg<T: ToArgument + ?Sized>(mut self, value: &T) -> Self {
        writer::put_argument(value, &self.separators, &mut self.raw);
        self
    }

    pub fn binary_arg<T: BinaryArg>(mut self, value: &T) -> Self {
        writer::put_binary_argument(value, &self.separators, &mut self.raw);
        self
    }

    pub fn build(self) -> CommandFrame {
        CommandFrame::from_raw(self.raw.to_vec(), self.separators)
    }
}

/// Splits a byte stream into [`CommandFrame`]s and writes them back out.
#[derive(Debug)]
pub struct CommandCodec {
    parser: FrameParser,
    append_newline: bool,
}

impl CommandCodec {
    pub fn new(config: &FrameConfig) -> Result<Self> {
        Ok(Self {
            parser: FrameParser::new(config)?,
            append_newline: false,
        })
    }

    /// Append `\r\n` after every encoded frame.
    pub fn with_newline(mut self, append_newline: bool) -> Self {
        self.append_newline = append_newline;
        self
    }

    /// Frames dropped for exceeding the receive buffer.
    pub fn overflow_count(&self) -> u64 {
        self.parser.overflow_count()
    }
}

impl Decoder for CommandCodec {
    type Item = CommandFrame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> io::Result<Option<CommandFrame>> {
        while src.has_remaining() {
            let byte = src.get_u8();
            // Overflow is already logged by the parser, which resynchronizes by itself.
            if let Ok(ParseState::FrameComplete) = self.parser.push_byte(byte) {
                if let Some(frame) = self.parser.frame() {
                    return Ok(Some(CommandFrame::from_raw(
                        frame.to_vec(),
                        self.parser.separators(),
                    )));
                }
            }
        }
        Ok(None)
    }
}

impl Encoder<CommandFrame> for CommandCodec {
    type Error = io::Error;

    fn encode(&mut self, frame: CommandFrame, dst: &mut BytesMut) -> io::Result<()> {
        dst.reserve(frame.raw.len() + 3);
        dst.put_slice(&frame.raw);
        writer::put_terminator(&frame.separators, self.append_newline, dst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::{SinkExt, StreamExt};
    use tokio_util::codec::{FramedRead, FramedWrite};

    use super::*;

    fn codec() -> CommandCodec {
        CommandCodec::new(&FrameConfig::default()).unwrap()
    }

    #[test]
    fn decodes_frames_split_across_reads() {
        let mut codec = codec();
        let mut buf = BytesMut::from(&b"5,a/,"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert!(buf.is_empty());

        buf.extend_from_slice(b"b,42;6;");
        let mut frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.raw(), b"5,a/,b,42");
        let mut args = frame.arguments();
        assert_eq!(args.read_command_id(), Ok(5));
        assert_eq!(args.read_str(), Ok("a,b"));
        assert_eq!(args.read_i32(), Ok(42));

        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.command_id(), Ok(6));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn oversize_frame_is_skipped() {
        let config = FrameConfig {
            buffer_capacity: 6,
            ..FrameConfig::default()
        };
        let mut codec = CommandCodec::new(&config).unwrap();
        let mut buf = BytesMut::from(&b"1,toolong;2;"[..]);
        let frame = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(frame.command_id(), Ok(2));
        assert_eq!(codec.overflow_count(), 1);
    }

    #[test]
    fn encodes_built_frames() {
        let seps = Separators::default();
        let frame = CommandFrame::builder(9, seps)
            .arg("x;y")
            .binary_arg(&1u16)
            .build();
        let mut out = BytesMut::new();
        codec().with_newline(true).encode(frame, &mut out).unwrap();
        assert_eq!(&out[..], b"9,x/;y,\x01/\x00;\r\n");
    }

    #[tokio::test]
    async fn framed_round_trip() {
        let seps = Separators::default();
        let mut wire = Vec::new();
        {
            let mut sink = FramedWrite::new(&mut wire, codec());
            sink.send(CommandFrame::builder(3, seps).arg("hello").arg(&7).build())
                .await
                .unwrap();
            sink.send(CommandFrame::builder(4, seps).build()).await.unwrap();
        }
        assert_eq!(wire, b"3,hello,7;4;");

        let mut stream = FramedRead::new(&wire[..], codec());
        let mut first = stream.next().await.unwrap().unwrap();
        let mut args = first.arguments();
        assert_eq!(args.read_command_id(), Ok(3));
        assert_eq!(args.read_string(), Ok("hello".to_string()));
        assert_eq!(args.read_i16(), Ok(7));

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.command_id(), Ok(4));
        assert!(stream.next().await.is_none());
    }
}
