//! Byte-stream transport interfaces for cmdwire.
//!
//! The protocol engine only needs three things from the link it runs over:
//! a non-blocking "how many bytes are waiting" query, a read of up to `n`
//! bytes, and a write. [`ByteStream`] captures exactly that, and [`Clock`]
//! supplies the monotonic time used for acknowledgment deadlines.
//!
//! Implementations shipped here:
//! - [`MemoryStream`] — in-process duplex loopback (tests, simulations)
//! - [`SocketStream`] — Unix domain socket stream (Linux/macOS)

pub mod clock;
pub mod error;
pub mod memory;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TransportError};
pub use memory::MemoryStream;
pub use traits::ByteStream;

#[cfg(unix)]
pub use uds::{SocketStream, UnixDomainSocket};
