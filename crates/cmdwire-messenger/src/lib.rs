//! Command session over a byte stream.
//!
//! A [`Messenger`] owns one connection: it feeds inbound bytes through the
//! frame parser, dispatches each completed command to the handler attached
//! for its id, composes outbound commands, and can block until the peer
//! acknowledges a command.
//!
//! ```
//! use cmdwire_messenger::{Ack, Messenger};
//! use cmdwire_transport::MemoryStream;
//!
//! let (local, mut remote) = MemoryStream::pair();
//! let mut messenger = Messenger::new(local)?;
//!
//! messenger.begin(5)?;
//! messenger.add_argument("a,b")?;
//! messenger.add_argument(&42)?;
//! messenger.end(None)?;
//!
//! assert_eq!(remote.drain(), b"5,a/,b,42;");
//! # let _ = Ack::new(1);
//! # Ok::<(), cmdwire_messenger::MessengerError>(())
//! ```

pub mod config;
mod dispatch;
pub mod error;
pub mod handler;
pub mod messenger;
mod outbox;

pub use config::{MessengerConfig, DEFAULT_ACK_COMMAND, DEFAULT_ACK_TIMEOUT, DEFAULT_READ_CHUNK};
pub use error::{MessengerError, Result};
pub use handler::{CommandContext, Handler, Reply};
pub use messenger::{Ack, Messenger};
