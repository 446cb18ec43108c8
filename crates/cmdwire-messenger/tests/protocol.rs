use std::sync::{Arc, Mutex};
use std::time::Duration;

use cmdwire_messenger::{Ack, Messenger};
use cmdwire_transport::{ByteStream, MemoryStream};
use proptest::prelude::*;

type Frames = Arc<Mutex<Vec<(u8, Vec<Vec<u8>>)>>>;

fn capturing(stream: MemoryStream) -> (Messenger<MemoryStream>, Frames) {
    let mut messenger = Messenger::new(stream).expect("default config is valid");
    let frames: Frames = Arc::default();
    let sink = Arc::clone(&frames);
    messenger.on_default(move |ctx| {
        let mut args = Vec::new();
        while ctx.args().available() {
            args.push(ctx.args().read_bytes()?.to_vec());
        }
        sink.lock().unwrap().push((ctx.command_id(), args));
        Ok(())
    });
    (messenger, frames)
}

#[test]
fn empty_middle_argument_survives() {
    let (left, right) = MemoryStream::pair();
    let mut sender = Messenger::new(left).unwrap();
    let (mut receiver, frames) = capturing(right);

    sender.begin(4).unwrap();
    sender.add_argument("").unwrap();
    sender.add_argument("x").unwrap();
    sender.add_argument("").unwrap();
    sender.end(None).unwrap();

    assert_eq!(receiver.feed().unwrap(), 1);
    assert_eq!(
        *frames.lock().unwrap(),
        vec![(4, vec![Vec::new(), b"x".to_vec()])]
    );
}

#[test]
fn documented_exchange() {
    let (left, right) = MemoryStream::pair();
    let mut sender = Messenger::new(left).unwrap();
    let (mut receiver, frames) = capturing(right);

    sender.begin(5).unwrap();
    sender.add_argument("a,b").unwrap();
    sender.add_argument(&42).unwrap();
    sender.end(None).unwrap();

    assert_eq!(receiver.feed().unwrap(), 1);
    let frames = frames.lock().unwrap();
    assert_eq!(frames[0].0, 5);
    assert_eq!(frames[0].1, vec![b"a,b".to_vec(), b"42".to_vec()]);
}

#[test]
fn request_and_acknowledge_across_threads() {
    let (left, right) = MemoryStream::pair();
    let mut client = Messenger::new(left).unwrap();

    let server = std::thread::spawn(move || {
        let mut server = Messenger::new(right).unwrap();
        server.on(10, |ctx| {
            let a = ctx.args().read_i32()?;
            let b = ctx.args().read_i32()?;
            ctx.reply(11)?.arg(&(a + b)).send()
        });
        while server.feed().unwrap() == 0 {
            std::thread::yield_now();
        }
        server
    });

    client.begin(10).unwrap();
    client.add_argument(&2).unwrap();
    client.add_argument(&40).unwrap();
    let acked = client
        .end(Some(Ack::new(11).with_timeout(Duration::from_secs(5))))
        .unwrap();
    assert!(acked);
    let _server = server.join().unwrap();
}

#[test]
fn binary_payloads_survive_delimiters() {
    let (left, right) = MemoryStream::pair();
    let mut sender = Messenger::new(left).unwrap();
    let mut receiver = Messenger::new(right).unwrap();
    let got = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&got);
    receiver.on(3, move |ctx| {
        let value: u32 = ctx.args().read_binary()?;
        let float: f64 = ctx.args().read_binary()?;
        sink.lock().unwrap().push((value, float));
        Ok(())
    });

    // 0x2C3B2F00 contains ',', ';', '/', and a null byte.
    sender.begin(3).unwrap();
    sender.add_binary_argument(&0x2C3B_2F00u32).unwrap();
    sender.add_binary_argument(&-1.5f64).unwrap();
    sender.end(None).unwrap();

    assert_eq!(receiver.feed().unwrap(), 1);
    assert_eq!(*got.lock().unwrap(), vec![(0x2C3B_2F00, -1.5)]);
}

fn delimiter_heavy() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(
        prop_oneof![
            Just(b','),
            Just(b';'),
            Just(b'/'),
            Just(0u8),
            any::<u8>()
        ],
        0..16,
    )
}

/// Arguments as the receiver sees them: an empty final argument leaves only
/// a trailing separator, which carries no token.
fn as_received(mut args: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    if args.last().is_some_and(Vec::is_empty) {
        args.pop();
    }
    args
}

proptest! {
    #[test]
    fn arguments_round_trip(id in any::<u8>(), args in proptest::collection::vec(delimiter_heavy(), 0..4)) {
        let (left, right) = MemoryStream::pair();
        let mut sender = Messenger::new(left).unwrap();
        let (mut receiver, frames) = capturing(right);

        sender.begin(id).unwrap();
        for arg in &args {
            sender.add_argument(arg.as_slice()).unwrap();
        }
        sender.end(None).unwrap();

        prop_assert_eq!(receiver.feed().unwrap(), 1);
        let frames = frames.lock().unwrap();
        prop_assert_eq!(&frames[0], &(id, as_received(args)));
    }

    #[test]
    fn byte_at_a_time_matches_batch(
        commands in proptest::collection::vec((any::<u8>(), delimiter_heavy()), 1..6),
    ) {
        let (mut wire_in, mut wire_out) = MemoryStream::pair();
        let mut sender = Messenger::new(&mut wire_in).unwrap();
        for (id, arg) in &commands {
            sender.send_command_arg(*id, arg.as_slice(), None).unwrap();
        }
        drop(sender);
        let wire = wire_out.drain();

        let (mut batch_tx, batch_rx) = MemoryStream::pair();
        let (mut batch, batch_frames) = capturing(batch_rx);
        batch_tx.write_all(&wire).unwrap();
        batch.feed().unwrap();

        let (_single_tx, single_rx) = MemoryStream::pair();
        let (mut single, single_frames) = capturing(single_rx);
        for byte in &wire {
            single.process(std::slice::from_ref(byte)).unwrap();
        }

        let batch_frames = batch_frames.lock().unwrap();
        prop_assert_eq!(&*batch_frames, &*single_frames.lock().unwrap());
        prop_assert_eq!(batch_frames.len(), commands.len());
    }
}
