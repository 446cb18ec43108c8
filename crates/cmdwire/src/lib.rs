//! Framed, escape-safe command protocol for serial-style byte streams.
//!
//! Two peers exchange commands of the form `id,arg,arg;` over any byte
//! stream, with delimiter bytes inside arguments escaped, optional binary
//! arguments, and an optional blocking wait for an acknowledgment.
//!
//! # Crate Structure
//!
//! - [`transport`] — Byte-stream and clock interfaces, in-memory and Unix socket links
//! - [`frame`] — Escape rules, incremental frame parser, argument tokenizer and codec
//! - [`messenger`] — Command builder, dispatcher, and acknowledgment wait (behind `messenger` feature)

/// Re-export transport types.
pub mod transport {
    pub use cmdwire_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use cmdwire_frame::*;
}

/// Re-export messenger types (requires `messenger` feature).
#[cfg(feature = "messenger")]
pub mod messenger {
    pub use cmdwire_messenger::*;
}
