use missive::{Message, SmtpTransport, Transport};

fn test_message() -> Message {
    Message::builder()
        .from("user@localhost".parse().unwrap())
        .to("root@localhost".parse().unwrap())
        .subject("Hello")
        .body("Hello example")
        .unwrap()
}

// Requires an SMTP server listening on 127.0.0.1:2525,
// e.g. `python3 -m aiosmtpd -n -l 127.0.0.1:2525`
#[test]
#[ignore]
fn smtp_transport_simple() {
    let mailer = SmtpTransport::builder("127.0.0.1").port(2525).build();
    let report = mailer.send(&test_message()).unwrap();
    assert!(report.is_success());
}

#[test]
#[ignore]
fn smtp_transport_raw_transaction() {
    let mailer = SmtpTransport::builder("127.0.0.1").port(2525).build();
    let message = test_message();
    let envelope = message
        .envelope(missive::RecipientClass::To)
        .unwrap()
        .unwrap();
    let response = mailer.send_raw(&envelope, &message.formatted()).unwrap();
    assert!(response.is_positive());
}

#[test]
fn connection_refused_is_a_connection_error() {
    // nothing listens on this port
    let mailer = SmtpTransport::builder("127.0.0.1")
        .port(1)
        .timeout(Some(std::time::Duration::from_secs(2)))
        .build();
    let message = test_message();
    let envelope = message
        .envelope(missive::RecipientClass::To)
        .unwrap()
        .unwrap();
    let err = mailer.send_raw(&envelope, &message.formatted()).unwrap_err();
    assert!(err.is_connection());
}
