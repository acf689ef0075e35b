use missive::{transport::stub::StubTransport, Message, RecipientClass, Transport};

fn three_class_message() -> Message {
    Message::builder()
        .from("sender@localhost".parse().unwrap())
        .to("to1@localhost".parse().unwrap())
        .to("to2@localhost".parse().unwrap())
        .cc("cc@localhost".parse().unwrap())
        .bcc("bcc@localhost".parse().unwrap())
        .subject("Hello")
        .body("Hello World!")
        .unwrap()
}

fn boundary_of(raw: &[u8]) -> Option<String> {
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    let start = raw.find("boundary=\"")? + 10;
    let end = raw[start..].find('"')? + start;
    Some(raw[start..end].to_owned())
}

#[test]
fn one_transaction_per_recipient_class() {
    let sender = StubTransport::new_positive();
    let report = sender.send(&three_class_message()).unwrap();

    assert!(report.is_success());
    let classes: Vec<_> = report.deliveries().iter().map(|d| d.class()).collect();
    assert_eq!(
        classes,
        vec![RecipientClass::To, RecipientClass::Cc, RecipientClass::Bcc]
    );
    assert_eq!(
        report
            .deliveries()
            .iter()
            .map(|d| d.recipients())
            .collect::<Vec<_>>(),
        vec![2, 1, 1]
    );

    let messages = sender.messages();
    assert_eq!(messages.len(), 3);
    // each class envelope carries only its own recipients
    assert_eq!(
        messages[0]
            .0
            .to()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["to1@localhost", "to2@localhost"]
    );
    assert_eq!(messages[1].0.to()[0].to_string(), "cc@localhost");
    assert_eq!(messages[2].0.to()[0].to_string(), "bcc@localhost");
}

#[test]
fn empty_classes_are_skipped() {
    let message = Message::builder()
        .from("sender@localhost".parse().unwrap())
        .to("to@localhost".parse().unwrap())
        .subject("Hello")
        .body("Hello World!")
        .unwrap();

    let sender = StubTransport::new_positive();
    let report = sender.send(&message).unwrap();

    assert_eq!(report.deliveries().len(), 1);
    assert_eq!(report.deliveries()[0].class(), RecipientClass::To);
    assert_eq!(sender.messages().len(), 1);
}

#[test]
fn each_class_gets_an_independently_rendered_copy() {
    let mut message = three_class_message();
    message
        .attach_bytes("blob.bin", vec![42; 128], false)
        .unwrap();

    let sender = StubTransport::new_positive();
    sender.send(&message).unwrap();

    let messages = sender.messages();
    let boundaries: Vec<String> = messages
        .iter()
        .map(|(_, raw)| boundary_of(raw).expect("multipart message"))
        .collect();
    assert_eq!(boundaries.len(), 3);
    assert_ne!(boundaries[0], boundaries[1]);
    assert_ne!(boundaries[1], boundaries[2]);
    assert_ne!(boundaries[0], boundaries[2]);
}

#[test]
fn failing_class_does_not_block_the_others() {
    let sender = StubTransport::new_error();
    let report = sender.send(&three_class_message()).unwrap();

    // all three transactions were attempted despite every one failing
    assert_eq!(sender.messages().len(), 3);
    assert!(!report.is_success());
    assert!(report.first_error().is_some());
    assert!(report.deliveries().iter().all(|d| !d.is_ok()));
}

#[test]
fn message_without_recipients_cannot_be_built() {
    let result = Message::builder()
        .from("sender@localhost".parse().unwrap())
        .body("Hello World!");
    assert!(result.is_err());
}
