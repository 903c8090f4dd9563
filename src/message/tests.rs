use bstr::BStr;

use crate::argument::Argument;
use crate::proto::{Endianness, Flags, MessageType};
use crate::{Message, MessageKind, Serial, SerialAllocator, UnmarshalError};

use super::frame_length;

#[rustfmt::skip]
const LE_BLOB: [u8; 36] = [
    // yyyyuu fixed headers
    b'l',
    // reply (which is the simplest message)
    b'\x02',
    // no auto-starting
    b'\x02',
    // D-Bus version = 1
    b'\x01',
    // bytes in body = 4
    b'\x04', b'\x00', b'\x00', b'\x00',
    // serial number = 0x12345678
    b'\x78', b'\x56', b'\x34', b'\x12',
    // bytes in array of variable headers = 15
    b'\x0f', b'\0', b'\0', b'\0',
    // in reply to:
    b'\x05',
    // variant signature = u
    b'\x01', b'u', b'\0',
    // 0xabcdef12
    b'\x12', b'\xef', b'\xcd', b'\xab',
    // signature:
    b'\x08',
    // variant signature = g
    b'\x01', b'g', b'\0',
    // 1 byte, u, NUL (no alignment needed)
    b'\x01', b'u', b'\0',
    // pad to 8-byte boundary for body
    b'\0',
    // body; 0xdeadbeef
    b'\xef', b'\xbe', b'\xad', b'\xde'
];

#[rustfmt::skip]
const BE_BLOB: [u8; 36] = [
    b'B',
    b'\x02',
    b'\x02',
    b'\x01',
    b'\x00', b'\x00', b'\x00', b'\x04',
    b'\x12', b'\x34', b'\x56', b'\x78',
    b'\0', b'\0', b'\0', b'\x0f',
    b'\x05',
    b'\x01', b'u', b'\0',
    b'\xab', b'\xcd', b'\xef', b'\x12',
    b'\x08',
    b'\x01', b'g', b'\0',
    b'\x01', b'u', b'\0',
    b'\0',
    b'\xde', b'\xad', b'\xbe', b'\xef',
];

fn serial(n: u32) -> Serial {
    Serial::new(n).unwrap()
}

fn blob_message() -> Message {
    let mut call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob").unwrap();
    call.seal(serial(0xabcdef12)).unwrap();

    let mut m = Message::new_method_return(&call).unwrap();
    m.set_flags(Flags::NO_AUTO_START).unwrap();
    m.append_argument(0xdeadbeefu32).unwrap();
    m.seal(serial(0x12345678)).unwrap();
    m
}

#[test]
fn encode_blobs() {
    let m = blob_message();

    let le = m.encode_with(Endianness::LITTLE).unwrap();
    assert_eq!(BStr::new(&le), BStr::new(&LE_BLOB[..]));

    let be = m.encode_with(Endianness::BIG).unwrap();
    assert_eq!(BStr::new(&be), BStr::new(&BE_BLOB[..]));
}

#[test]
fn decode_blobs() {
    for blob in [&LE_BLOB, &BE_BLOB] {
        let m = Message::decode(&blob[..]).unwrap();

        assert_eq!(m.message_type(), MessageType::METHOD_RETURN);
        assert_eq!(m.serial(), Some(serial(0x12345678)));
        assert_eq!(m.reply_serial(), Some(serial(0xabcdef12)));
        assert_eq!(m.flags(), Flags::NO_AUTO_START);
        assert_eq!(m.signature(), "u");
        assert_eq!(m.arguments(), &[Argument::Uint32(0xdeadbeef)]);
        assert!(m.is_sealed());
        assert_eq!(m, blob_message());
    }
}

#[test]
fn frame_lengths() {
    assert_eq!(frame_length(&LE_BLOB[..4]).unwrap(), None);
    assert_eq!(frame_length(&LE_BLOB[..16]).unwrap(), Some(36));
    assert_eq!(frame_length(&BE_BLOB).unwrap(), Some(36));

    assert_eq!(
        frame_length(b"x\x02\x02\x01\x04\0\0\0\x78\x56\x34\x12\x0f\0\0\0"),
        Err(UnmarshalError::InvalidEndianness(b'x'))
    );
}

#[test]
fn decode_rejects_damage() {
    assert_eq!(
        Message::decode(&LE_BLOB[..35]),
        Err(UnmarshalError::Truncated)
    );

    let mut long = LE_BLOB.to_vec();
    long.push(0);
    assert_eq!(Message::decode(&long), Err(UnmarshalError::TrailingBytes(1)));

    let mut version = LE_BLOB;
    version[3] = 2;
    assert_eq!(
        Message::decode(&version),
        Err(UnmarshalError::UnsupportedVersion(2))
    );

    let mut zero = LE_BLOB;
    zero[8..12].copy_from_slice(&[0, 0, 0, 0]);
    assert_eq!(Message::decode(&zero), Err(UnmarshalError::ZeroSerial));

    // Renumber the REPLY_SERIAL field to an unknown code, which is skipped.
    let mut missing = LE_BLOB;
    missing[16] = 0x42;
    assert_eq!(
        Message::decode(&missing),
        Err(UnmarshalError::MissingHeader("REPLY_SERIAL"))
    );
}

#[test]
fn signal_round_trip() {
    let mut m = Message::new_signal("/org/test/Demo", "org.test.Demo", "Ping").unwrap();
    m.append_argument("hello").unwrap();
    m.append_argument(true).unwrap();
    m.set_sender(Some(":1.7")).unwrap();
    m.seal(serial(3)).unwrap();

    for endianness in [Endianness::LITTLE, Endianness::BIG] {
        let bytes = m.encode_with(endianness).unwrap();
        assert_eq!(frame_length(&bytes).unwrap(), Some(bytes.len()));

        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded, m);
        assert_eq!(decoded.path().map(|p| p.as_str()), Some("/org/test/Demo"));
        assert_eq!(decoded.interface(), Some("org.test.Demo"));
        assert_eq!(decoded.sender(), Some(":1.7"));
        assert_eq!(decoded.signature(), "sb");
    }
}

#[test]
fn error_round_trip() {
    let mut call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob").unwrap();
    call.seal(serial(9)).unwrap();

    let mut error = Message::new_error(&call, "org.test.Error.NoFrob", "cannot frob").unwrap();
    error.seal(serial(10)).unwrap();

    let decoded = Message::decode(&error.encode().unwrap()).unwrap();

    assert_eq!(
        decoded.kind(),
        &MessageKind::Error {
            error_name: "org.test.Error.NoFrob".into(),
            reply_serial: serial(9),
        }
    );

    assert_eq!(decoded.error_message(), Some("cannot frob"));
}

#[test]
fn unsealed_messages_cannot_be_encoded() {
    let m = Message::new_signal("/", "org.test.Demo", "Ping").unwrap();
    assert!(m.encode().is_err());
}

#[test]
fn signature_tracks_arguments() {
    let mut m = Message::new_signal("/", "org.test.Demo", "Ping").unwrap();
    assert_eq!(m.signature(), "");

    m.append_argument(1u8).unwrap();
    m.append_argument("two").unwrap();
    m.append_argument(3i64).unwrap();
    assert_eq!(m.signature(), "ysx");
    assert_eq!(m.arguments().len(), 3);
}

#[test]
fn sealed_messages_are_immutable() {
    let mut m = Message::new_signal("/", "org.test.Demo", "Ping").unwrap();
    m.seal(serial(1)).unwrap();

    assert!(m.append_argument(1u32).unwrap_err().is_message_sealed());
    assert!(m.set_flags(Flags::NO_REPLY_EXPECTED).unwrap_err().is_message_sealed());
    assert!(m.set_destination(Some("org.test.Other")).unwrap_err().is_message_sealed());
    assert!(m.seal(serial(2)).unwrap_err().is_message_sealed());
    assert_eq!(m.serial(), Some(serial(1)));
    assert_eq!(m.signature(), "");
}

#[test]
fn replies_need_a_sent_method_call() {
    let call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob").unwrap();
    assert!(Message::new_method_return(&call)
        .unwrap_err()
        .is_invalid_reply_target());

    let mut signal = Message::new_signal("/", "org.test.Demo", "Ping").unwrap();
    signal.seal(serial(1)).unwrap();
    assert!(Message::new_error(&signal, "org.test.Error.Failed", "no")
        .unwrap_err()
        .is_invalid_reply_target());
}

#[test]
fn invalid_names() {
    let error = Message::new_method_call("", "/a", "x.y", "Z").unwrap_err();
    assert!(error.invalid_name().is_some());

    assert!(Message::new_method_call("org.test", "no-slash", "x.y", "Z").is_err());
    assert!(Message::new_method_call("org.test", "/a", "nodots", "Z").is_err());
    assert!(Message::new_method_call("org.test", "/a", "x.y", "Not.Member").is_err());
    assert!(Message::new_signal("/", "org.test.Demo", "").is_err());

    let mut call = Message::new_method_call("org.test.Demo", "/", "org.test.Demo", "Frob").unwrap();
    call.seal(serial(1)).unwrap();
    assert!(Message::new_error(&call, "NoDots", "x").is_err());
}

#[test]
fn serials_skip_zero() {
    let serials = SerialAllocator::new();
    assert_eq!(serials.next(), serial(1));
    assert_eq!(serials.next(), serial(2));

    let serials = SerialAllocator::starting_at(serial(u32::MAX));
    assert_eq!(serials.next(), serial(u32::MAX));
    assert_eq!(serials.next(), serial(1));
}
