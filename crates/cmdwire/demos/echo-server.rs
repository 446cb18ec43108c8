//! Small command server: answers pings and adds pairs of floats.
//!
//! Run with:
//!   cargo run --example echo-server
//!
//! In another terminal:
//!   cargo run --example ack-client -- /tmp/cmdwire-echo-example.sock

use std::thread;
use std::time::Duration;

use cmdwire::messenger::{Messenger, MessengerError};
use cmdwire::transport::UnixDomainSocket;

const PING: u8 = 1;
const PONG: u8 = 2;
const ADD: u8 = 3;
const SUM: u8 = 4;
const UNKNOWN: u8 = 0;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let sock_path = std::env::temp_dir().join("cmdwire-echo-example.sock");
    let _ = std::fs::remove_file(&sock_path);

    let listener = UnixDomainSocket::bind(&sock_path)?;
    eprintln!("Listening on {}", sock_path.display());

    let stream = listener.accept()?;
    let mut messenger = Messenger::new(stream)?;

    messenger.on(PING, |cmd| cmd.reply(PONG)?.arg("pong").send());
    messenger.on(ADD, |cmd| {
        let a = cmd.args().read_f32()?;
        let b = cmd.args().read_f32()?;
        let sum = a + b;
        if !sum.is_finite() {
            return Err(MessengerError::Handler(format!("{a} + {b} is not finite")));
        }
        eprintln!("{a} + {b}");
        cmd.reply(SUM)?.precision_arg(f64::from(sum), 3).send()
    });
    messenger.on_default(|cmd| {
        let id = cmd.command_id();
        cmd.reply(UNKNOWN)?.arg(&id).send()
    });

    loop {
        match messenger.feed() {
            Ok(0) => thread::sleep(Duration::from_millis(2)),
            Ok(n) => eprintln!("handled {n} command(s)"),
            Err(MessengerError::Transport(err)) if err.is_closed() => {
                eprintln!("Peer disconnected");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
