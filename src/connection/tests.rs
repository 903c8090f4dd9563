use std::collections::HashMap;

use super::{Address, BusKind, ConnectError};

#[test]
fn unix_paths() {
    assert_eq!(
        Address::parse("unix:path=/tmp/dbus-test").unwrap(),
        Address::Unix("/tmp/dbus-test".into())
    );

    assert_eq!(
        Address::parse("unix:path=/tmp/with%20space,guid=0123").unwrap(),
        Address::Unix("/tmp/with space".into())
    );

    assert_eq!(
        Address::parse("unix:abstract=/tmp/dbus-XyZ").unwrap(),
        Address::UnixAbstract(b"/tmp/dbus-XyZ".to_vec())
    );
}

#[test]
fn tcp() {
    assert_eq!(
        Address::parse("tcp:host=127.0.0.1,port=1234").unwrap(),
        Address::Tcp {
            host: "127.0.0.1".into(),
            port: 1234
        }
    );

    assert_eq!(
        Address::parse("tcp:port=80").unwrap(),
        Address::Tcp {
            host: "localhost".into(),
            port: 80
        }
    );

    assert!(matches!(
        Address::parse("tcp:host=localhost"),
        Err(ConnectError::MalformedAddress(..))
    ));

    assert!(matches!(
        Address::parse("tcp:host=localhost,port=99999"),
        Err(ConnectError::MalformedAddress(..))
    ));
}

#[test]
fn malformed() {
    for address in [
        "unix",
        "unix:path",
        "unix:",
        "unix:path=/a,abstract=b",
        "unix:path=%2",
        "unix:path=%zz",
    ] {
        assert!(
            matches!(
                Address::parse(address),
                Err(ConnectError::MalformedAddress(..))
            ),
            "{address}"
        );
    }
}

#[test]
fn unsupported() {
    match Address::parse("launchd:env=DBUS_LAUNCHD_SESSION_BUS_SOCKET") {
        Err(ConnectError::UnsupportedTransport(transport)) => assert_eq!(&*transport, "launchd"),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn alternatives() {
    let addresses =
        Address::parse_all("unix:path=/a;;tcp:port=1").collect::<Result<Vec<_>, _>>().unwrap();

    assert_eq!(
        addresses,
        [
            Address::Unix("/a".into()),
            Address::Tcp {
                host: "localhost".into(),
                port: 1
            }
        ]
    );
}

fn env<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl FnMut(&str) -> Option<String> + 'a {
    let map = pairs.iter().copied().collect::<HashMap<_, _>>();
    move |key: &str| map.get(key).map(|value| value.to_string())
}

#[test]
fn bus_addresses() {
    let vars = [("DBUS_SESSION_BUS_ADDRESS", "unix:path=/session")];
    assert_eq!(
        BusKind::Session.address_with(env(&vars)).unwrap(),
        "unix:path=/session"
    );

    let vars = [("XDG_RUNTIME_DIR", "/run/user/1000/")];
    assert_eq!(
        BusKind::Session.address_with(env(&vars)).unwrap(),
        "unix:path=/run/user/1000/bus"
    );

    assert!(matches!(
        BusKind::Session.address_with(env(&[])),
        Err(ConnectError::MissingBus(BusKind::Session))
    ));

    assert_eq!(
        BusKind::System.address_with(env(&[])).unwrap(),
        "unix:path=/var/run/dbus/system_bus_socket"
    );

    let vars = [("DBUS_SYSTEM_BUS_ADDRESS", "tcp:port=1")];
    assert_eq!(BusKind::System.address_with(env(&vars)).unwrap(), "tcp:port=1");

    assert!(matches!(
        BusKind::Starter.address_with(env(&[])),
        Err(ConnectError::MissingBus(BusKind::Starter))
    ));
}

#[cfg(feature = "tokio")]
mod buffers {
    use std::io::{self, Write};

    use crate::message::frame_length;
    use crate::proto::MessageType;
    use crate::{Message, Serial};

    use super::super::{RecvBuf, SendBuf};

    /// A writer which accepts a limited number of bytes per call and then
    /// blocks.
    struct Trickle {
        out: Vec<u8>,
        per_call: usize,
        calls: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.calls == 0 {
                return Err(io::ErrorKind::WouldBlock.into());
            }

            self.calls -= 1;
            let n = buf.len().min(self.per_call);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn send_resumes_after_would_block() {
        let mut send = SendBuf::new();
        send.extend_from_slice(b"hello world").unwrap();

        let mut out = Trickle {
            out: Vec::new(),
            per_call: 4,
            calls: 2,
        };

        let error = send.send_to(&mut out).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::WouldBlock);
        assert_eq!(send.remaining(), 3);

        out.calls = 10;
        send.send_to(&mut out).unwrap();
        assert!(send.is_empty());
        assert_eq!(out.out, b"hello world");
    }

    fn signal(serial: u32, member: &str) -> Vec<u8> {
        let mut m = Message::new_signal("/", "org.test.Demo", member).unwrap();
        m.append_argument("payload").unwrap();
        m.seal(Serial::new(serial).unwrap()).unwrap();
        m.encode().unwrap()
    }

    fn reply(serial: u32, reply_serial: u32) -> Vec<u8> {
        let mut call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob").unwrap();
        call.seal(Serial::new(reply_serial).unwrap()).unwrap();
        let mut m = Message::new_method_return(&call).unwrap();
        m.seal(Serial::new(serial).unwrap()).unwrap();
        m.encode().unwrap()
    }

    #[test]
    fn partial_frames_are_retained() {
        let bytes = signal(1, "Ping");
        let (head, tail) = bytes.split_at(bytes.len() / 2);

        let mut recv = RecvBuf::new();
        recv.recv_from(&mut &head[..]).unwrap();
        assert_eq!(recv.decode_frames().unwrap(), 0);
        assert!(recv.pop().is_none());

        recv.recv_from(&mut &tail[..]).unwrap();
        assert_eq!(recv.decode_frames().unwrap(), 1);

        let message = recv.pop().unwrap();
        assert_eq!(message.member(), Some("Ping"));
        assert_eq!(message.serial(), Serial::new(1));
        assert_eq!(frame_length(&bytes).unwrap(), Some(bytes.len()));
    }

    #[test]
    fn replies_are_taken_out_of_order() {
        let mut input = Vec::new();
        input.extend(signal(1, "First"));
        input.extend(reply(2, 7));
        input.extend(signal(3, "Second"));

        let mut recv = RecvBuf::new();
        let mut reader = &input[..];

        while recv.recv_from(&mut reader).unwrap() > 0 {}

        assert_eq!(recv.decode_frames().unwrap(), 3);
        assert!(recv.take_reply(Serial::new(8).unwrap()).is_none());

        let reply = recv.take_reply(Serial::new(7).unwrap()).unwrap();
        assert_eq!(reply.message_type(), MessageType::METHOD_RETURN);

        assert_eq!(recv.pop().unwrap().member(), Some("First"));
        assert_eq!(recv.pop().unwrap().member(), Some("Second"));
        assert!(recv.pop().is_none());
    }

    #[test]
    fn sasl_lines() {
        let mut recv = RecvBuf::new();
        let mut input: &[u8] = b"OK 1234deadbeef\r\nl\x01";
        recv.recv_from(&mut input).unwrap();

        assert_eq!(recv.take_line().unwrap(), b"OK 1234deadbeef");
        assert!(recv.take_line().is_none());
    }

    #[test]
    fn eof_reads_zero() {
        let mut recv = RecvBuf::new();
        let mut input = io::empty();
        assert_eq!(recv.recv_from(&mut input).unwrap(), 0);
        assert!(recv.take_line().is_none());
    }
}
