use crate::proto::MessageType;
use crate::Message;

use super::MatchRule;

#[test]
fn render_and_parse() {
    let rule = MatchRule::new()
        .with_message_type(MessageType::METHOD_CALL)
        .unwrap()
        .with_sender(":1.7")
        .with_interface("org.test.Demo")
        .with_member("Frob")
        .with_path("/org/test/Demo")
        .with_destination("org.test.Other");

    let rendered = rule.to_string();

    assert_eq!(
        rendered,
        "type='method_call',sender=':1.7',interface='org.test.Demo',member='Frob',path='/org/test/Demo',destination='org.test.Other'"
    );

    assert_eq!(rendered.parse::<MatchRule>().unwrap(), rule);
    assert_eq!("".parse::<MatchRule>().unwrap(), MatchRule::new());
}

#[test]
fn quotes_are_escaped() {
    let rule = MatchRule::new().with_path("/it's/a,b");
    let rendered = rule.to_string();

    assert_eq!(rendered, r"path='/it'\''s/a,b'");
    assert_eq!(rendered.parse::<MatchRule>().unwrap(), rule);

    let rule: MatchRule = r"member=Ping,sender=\'x\',path='\'".parse().unwrap();

    assert_eq!(
        rule,
        MatchRule::new()
            .with_member("Ping")
            .with_sender("'x'")
            .with_path("\\")
    );
}

#[test]
fn malformed_rules() {
    assert!("type".parse::<MatchRule>().is_err());
    assert!("type='bogus'".parse::<MatchRule>().is_err());
    assert!("bogus='x'".parse::<MatchRule>().is_err());
    assert!("member='Ping".parse::<MatchRule>().is_err());
}

#[test]
fn unnamed_types_are_rejected() {
    assert!(MatchRule::new()
        .with_message_type(MessageType::INVALID)
        .is_err());

    assert!(MatchRule::new()
        .with_message_type(MessageType::new(9))
        .is_err());

    let rule = MatchRule::new()
        .with_message_type(MessageType::SIGNAL)
        .unwrap();

    assert_eq!(rule.to_string(), "type='signal'");
}

#[test]
fn matches_messages() {
    let rule = MatchRule::signal("org.test.Demo", "Ping").with_path("/a");

    let hit = Message::new_signal("/a", "org.test.Demo", "Ping").unwrap();
    let other_path = Message::new_signal("/b", "org.test.Demo", "Ping").unwrap();
    let call = Message::new_method_call("org.test.Demo", "/a", "org.test.Demo", "Ping").unwrap();

    assert!(rule.matches(&hit));
    assert!(!rule.matches(&other_path));
    assert!(!rule.matches(&call));
    assert!(MatchRule::new().matches(&call));
}
