//! Sends a ping and an addition to the `echo-server` demo and waits for
//! each reply.
//!
//! Run with:
//!   cargo run --example ack-client -- /tmp/cmdwire-echo-example.sock

use std::time::Duration;

use cmdwire::messenger::{Ack, Messenger};
use cmdwire::transport::UnixDomainSocket;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_path = std::env::args()
        .nth(1)
        .map(std::path::PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("cmdwire-echo-example.sock"));

    let stream = UnixDomainSocket::connect(&sock_path)?;
    let mut messenger = Messenger::new(stream)?;

    let ponged = messenger.send_command(1, Some(Ack::new(2)))?;
    println!("ping acknowledged: {ponged}");

    messenger.begin(3)?;
    messenger.add_argument(&1.5f32)?;
    messenger.add_argument(&2.25f32)?;
    let summed = messenger.end(Some(Ack::new(4).with_timeout(Duration::from_secs(2))))?;
    println!("sum acknowledged: {summed}");

    Ok(())
}
