use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Subcommand};
use cmdwire_frame::{FrameConfig, Separators, DEFAULT_BUFFER_CAPACITY};
use cmdwire_messenger::{Messenger, MessengerConfig, MessengerError};
use cmdwire_transport::{SocketStream, UnixDomainSocket};

use crate::exit::{messenger_error, transport_error, CliError, CliResult, SUCCESS};
use crate::output::OutputFormat;

pub mod decode;
pub mod echo;
pub mod encode;
pub mod listen;
pub mod send;
pub mod version;

/// Idle sleep between polls of a connected peer.
const POLL_INTERVAL: Duration = Duration::from_millis(2);

/// Settings shared by every subcommand.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub separators: Separators,
}

impl Context {
    pub fn messenger_config(&self) -> MessengerConfig {
        MessengerConfig {
            frame: FrameConfig {
                separators: self.separators,
                ..FrameConfig::default()
            },
            ..MessengerConfig::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the wire bytes of one command.
    Encode(EncodeArgs),
    /// Decode wire bytes from stdin or a file.
    Decode(DecodeArgs),
    /// Send one command over a Unix socket.
    Send(SendArgs),
    /// Listen and print received commands.
    Listen(ListenArgs),
    /// Start an echo server.
    Echo(EchoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Encode(args) => encode::run(args, ctx),
        Command::Decode(args) => decode::run(args, ctx),
        Command::Send(args) => send::run(args, ctx),
        Command::Listen(args) => listen::run(args, ctx),
        Command::Echo(args) => echo::run(args, ctx),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct EncodeArgs {
    /// Command id (0-255).
    #[arg(long)]
    pub id: u8,
    /// Text argument; repeat for several.
    #[arg(long = "arg", value_name = "TEXT")]
    pub args: Vec<String>,
    /// Append `\r\n` after the command separator.
    #[arg(long)]
    pub newline: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Read from a file instead of stdin.
    #[arg(long, value_name = "FILE")]
    pub input: Option<PathBuf>,
    /// Receive buffer size; longer frames are reported and skipped.
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    pub buffer_capacity: usize,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Socket path to connect to.
    pub path: PathBuf,
    /// Command id (0-255).
    #[arg(long)]
    pub id: u8,
    /// Text argument; repeat for several.
    #[arg(long = "arg", value_name = "TEXT")]
    pub args: Vec<String>,
    /// Wait for a reply with this command id.
    #[arg(long, value_name = "ID")]
    pub ack: Option<u8>,
    /// Maximum time to wait for the acknowledgment (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Append `\r\n` after the command separator.
    #[arg(long)]
    pub newline: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Only print these command ids (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub ids: Option<Vec<u8>>,
    /// Exit after printing N commands.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct EchoArgs {
    /// Socket path to bind.
    pub path: PathBuf,
    /// Append `\r\n` after every reply.
    #[arg(long)]
    pub newline: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Accept peers on `path` one at a time until interrupted or `done`.
///
/// `setup` attaches handlers to each new session; it receives a short peer
/// label for output.
pub(crate) fn serve<F, D>(path: &Path, config: MessengerConfig, mut setup: F, done: D) -> CliResult<i32>
where
    F: FnMut(&mut Messenger<SocketStream>, String),
    D: Fn() -> bool,
{
    let listener = UnixDomainSocket::bind(path).map_err(|err| transport_error("bind failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut peers = 0u64;
    while running.load(Ordering::SeqCst) {
        let stream = listener
            .accept()
            .map_err(|err| transport_error("accept failed", err))?;
        peers += 1;
        tracing::debug!(peer = peers, "peer connected");

        let mut messenger = Messenger::with_config(stream, config.clone())
            .map_err(|err| messenger_error("session setup failed", err))?;
        setup(&mut messenger, format!("peer-{peers}"));

        while running.load(Ordering::SeqCst) {
            match messenger.feed() {
                Ok(0) => std::thread::sleep(POLL_INTERVAL),
                Ok(_) => {}
                Err(MessengerError::Transport(err)) if err.is_closed() => {
                    tracing::debug!(peer = peers, "peer disconnected");
                    break;
                }
                Err(err) => return Err(messenger_error("receive failed", err)),
            }
            if done() {
                return Ok(SUCCESS);
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| {
        CliError::new(
            crate::exit::INTERNAL,
            format!("signal handler setup failed: {err}"),
        )
    })
}
