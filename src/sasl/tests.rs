use super::{auth_command, hex, Auth, SaslResponse};

#[test]
fn test_external_from_uid() {
    assert_eq!(hex(1000.to_string().as_bytes()), "31303030");
    assert_eq!(
        hex(u32::MAX.to_string().as_bytes()),
        "34323934393637323935"
    );
    assert_eq!(hex(0.to_string().as_bytes()), "30");
}

#[test]
fn auth_commands() {
    assert_eq!(
        auth_command(Auth::ExternalUid(1000)).as_deref(),
        Some("AUTH EXTERNAL 31303030\r\n")
    );

    assert_eq!(
        auth_command(Auth::Anonymous).as_deref(),
        Some("AUTH ANONYMOUS 746f6b696f2d646275732d656e67696e65\r\n")
    );
}

#[test]
fn responses() {
    assert_eq!(
        SaslResponse::parse(b"OK 1234deadbeef"),
        Some(SaslResponse::Ok("1234deadbeef"))
    );
    assert_eq!(
        SaslResponse::parse(b"REJECTED EXTERNAL ANONYMOUS"),
        Some(SaslResponse::Rejected("EXTERNAL ANONYMOUS"))
    );
    assert_eq!(
        SaslResponse::parse(b"ERROR"),
        Some(SaslResponse::Error(""))
    );
    assert_eq!(
        SaslResponse::parse(b"AGREE_UNIX_FD"),
        Some(SaslResponse::AgreeUnixFd)
    );
    assert_eq!(SaslResponse::parse(b"OK"), None);
    assert_eq!(SaslResponse::parse(b"OK not-hex"), None);
    assert_eq!(SaslResponse::parse(b"HELLO"), None);
}
