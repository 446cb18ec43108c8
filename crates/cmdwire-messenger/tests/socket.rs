#![cfg(unix)]

use std::path::PathBuf;
use std::time::Duration;

use cmdwire_messenger::{Ack, Messenger};
use cmdwire_transport::UnixDomainSocket;

fn temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cmdwire-msg-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn acknowledged_command_over_unix_socket() {
    let dir = temp_dir("ack");
    let sock_path = dir.join("link.sock");
    let listener = UnixDomainSocket::bind(&sock_path).expect("listener should bind");

    let server = std::thread::spawn(move || {
        let stream = listener.accept().expect("listener should accept");
        let mut server = Messenger::new(stream).expect("default config is valid");
        server.on(20, |ctx| {
            let name = ctx.args().read_string()?;
            ctx.reply(21)?.arg(&format!("hello {name}")).send()
        });
        while server.feed().expect("feed should succeed") == 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
    });

    let stream = UnixDomainSocket::connect(&sock_path).expect("client should connect");
    let mut client = Messenger::new(stream).expect("default config is valid");
    let acked = client
        .send_command_arg(
            20,
            "wire",
            Some(Ack::new(21).with_timeout(Duration::from_secs(5))),
        )
        .expect("send should succeed");
    assert!(acked);

    server.join().expect("server thread should complete");
    let _ = std::fs::remove_dir_all(&dir);
}
