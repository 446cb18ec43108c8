//! Exchange commands over an in-process duplex pipe with `tokio-util`'s
//! `Framed` and [`CommandCodec`].
//!
//! Run with:
//!   cargo run --example async-codec --features async

use cmdwire::frame::{CommandCodec, CommandFrame, FrameConfig, Separators};
use futures_util::{SinkExt, StreamExt};
use tokio_util::codec::Framed;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = FrameConfig::default();
    let (left, right) = tokio::io::duplex(1024);
    let mut client = Framed::new(left, CommandCodec::new(&config)?);
    let mut server = Framed::new(right, CommandCodec::new(&config)?);

    let seps = Separators::default();
    client
        .send(
            CommandFrame::builder(7, seps)
                .arg("semi;colon")
                .binary_arg(&0x1234_5678u32)
                .build(),
        )
        .await?;

    let Some(frame) = server.next().await else {
        return Err("pipe closed before a frame arrived".into());
    };
    let mut frame = frame?;
    eprintln!("raw frame: {:?}", String::from_utf8_lossy(frame.raw()));

    let mut args = frame.arguments();
    let id = args.read_command_id()?;
    let text = args.read_string()?;
    let number: u32 = args.read_binary()?;
    println!("id={id} text={text:?} number={number:#x}");

    server
        .send(CommandFrame::builder(8, seps).arg(&id).build())
        .await?;
    if let Some(reply) = client.next().await {
        println!("reply id={}", reply?.command_id()?);
    }

    Ok(())
}
