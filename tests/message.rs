use missive::Message;

fn split_at_blank_line(raw: &[u8]) -> (String, String) {
    let raw = String::from_utf8(raw.to_vec()).unwrap();
    let pos = raw.find("\r\n\r\n").expect("no blank line in message");
    (raw[..pos + 2].to_owned(), raw[pos + 4..].to_owned())
}

#[test]
fn minimal_message_renders_headers_and_body() {
    let message = Message::builder()
        .from("a@x.com".parse().unwrap())
        .to("b@x.com".parse().unwrap())
        .subject("Hi")
        .body("Hello")
        .unwrap();

    let (headers, body) = split_at_blank_line(&message.formatted());

    assert!(headers.contains("From: a@x.com\r\n"));
    assert!(headers.contains("To: b@x.com\r\n"));
    assert!(headers.contains("Subject: =?UTF-8?B?SGk=?=\r\n"));
    assert!(headers.contains("MIME-Version: 1.0\r\n"));
    assert!(headers.contains("Date: "));
    // single-part message: the content type line belongs to the header block
    assert!(headers.ends_with("Content-Type: text/plain; charset=utf-8\r\n"));
    assert_eq!(body, "Hello\r\n");
}

#[test]
fn message_with_attachment_is_multipart_mixed() {
    let mut message = Message::builder()
        .from("a@x.com".parse().unwrap())
        .to("b@x.com".parse().unwrap())
        .subject("Report")
        .body("See attachment")
        .unwrap();
    message
        .attach_bytes("data.csv", b"k,v\r\n1,2\r\n".to_vec(), false)
        .unwrap();

    let raw = String::from_utf8(message.formatted()).unwrap();
    assert!(raw.contains("Content-Type: multipart/mixed; boundary=\""));
    assert!(raw.contains("Content-Type: text/csv"));
    assert!(raw.contains("Content-Transfer-Encoding: base64"));
    assert!(raw.trim_end().ends_with("--"));
}

#[test]
fn reply_to_and_cc_headers_are_emitted() {
    let message = Message::builder()
        .from("a@x.com".parse().unwrap())
        .to("b@x.com".parse().unwrap())
        .cc("First Cc <c@x.com>".parse().unwrap())
        .cc("d@x.com".parse().unwrap())
        .reply_to("r@x.com".parse().unwrap())
        .subject("s")
        .body("body")
        .unwrap();

    let (headers, _body) = split_at_blank_line(&message.formatted());
    assert!(headers.contains("Cc: First Cc <c@x.com>,d@x.com\r\n"));
    assert!(headers.contains("Reply-To: r@x.com\r\n"));
}
