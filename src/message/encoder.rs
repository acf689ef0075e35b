//! Wire-format rendering of a [`Message`]
//!
//! Produces RFC 822 headers and an RFC 2045 body with CRLF line endings.
//! A message with attachments becomes a `multipart/mixed` envelope; without
//! attachments the body is emitted as a single part under its declared
//! content type.

use std::iter;

use chrono::Utc;

use super::Message;
use crate::{base64, message::utf8_b};

/// Length of generated multipart boundary tokens
const BOUNDARY_LENGTH: usize = 40;

/// RFC 2822 date with a numeric zone, e.g. `Mon, 02 Jan 2006 15:04:05 +0000`
const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %z";

pub(crate) fn render_headers(msg: &Message) -> String {
    let mut out = String::new();

    header(&mut out, "From", &msg.from().to_string());
    let date = msg.date().unwrap_or_else(Utc::now);
    header(&mut out, "Date", &date.format(DATE_FORMAT).to_string());
    if !msg.to().is_empty() {
        header(&mut out, "To", &msg.to().to_string());
    }
    if !msg.cc().is_empty() {
        header(&mut out, "Cc", &msg.cc().to_string());
    }
    if !msg.bcc().is_empty() {
        header(&mut out, "Bcc", &msg.bcc().to_string());
    }
    if let Some(reply_to) = msg.reply_to() {
        header(&mut out, "Reply-To", &reply_to.to_string());
    }
    header(&mut out, "Subject", &utf8_b::encode(msg.subject()));
    header(&mut out, "MIME-Version", "1.0");

    out
}

pub(crate) fn render_body(msg: &Message) -> Vec<u8> {
    if msg.attachments().is_empty() {
        let mut out = String::new();
        header(
            &mut out,
            "Content-Type",
            &format!("{}; charset=utf-8", msg.content_type().essence_str()),
        );
        out.push_str("\r\n");
        out.push_str(msg.body());
        out.push_str("\r\n");
        return out.into_bytes();
    }

    let boundary = choose_boundary(msg);
    render_multipart(msg, &boundary)
}

fn render_multipart(msg: &Message, boundary: &str) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();

    push_str(
        &mut out,
        &format!(
            "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
        ),
    );

    // Body part
    push_str(&mut out, &format!("--{boundary}\r\n"));
    push_str(
        &mut out,
        &format!(
            "Content-Type: {}; charset=utf-8\r\n\r\n",
            msg.content_type().essence_str()
        ),
    );
    push_str(&mut out, msg.body());
    push_str(&mut out, "\r\n");

    for attachment in msg.attachments() {
        push_str(&mut out, &format!("--{boundary}\r\n"));
        if attachment.is_inline() {
            push_str(&mut out, "Content-Type: message/rfc822\r\n");
            push_str(
                &mut out,
                &format!(
                    "Content-Disposition: inline; filename=\"{}\"\r\n\r\n",
                    attachment.filename()
                ),
            );
            out.extend_from_slice(attachment.content());
            push_str(&mut out, "\r\n");
        } else {
            push_str(
                &mut out,
                &format!("Content-Type: {}\r\n", attachment.content_type()),
            );
            push_str(&mut out, "Content-Transfer-Encoding: base64\r\n");
            push_str(
                &mut out,
                &format!(
                    "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
                    utf8_b::encode(attachment.filename())
                ),
            );
            push_str(&mut out, &base64::encode_wrapped(attachment.content()));
            push_str(&mut out, "\r\n");
        }
    }

    push_str(&mut out, &format!("--{boundary}--\r\n"));
    out
}

fn header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

fn push_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
}

/// Create a random MIME boundary, regenerated until it collides with
/// nothing inside the message.
fn choose_boundary(msg: &Message) -> String {
    loop {
        let boundary = make_boundary();
        if !boundary_collides(msg, &boundary) {
            return boundary;
        }
    }
}

fn make_boundary() -> String {
    iter::repeat_with(fastrand::alphanumeric)
        .take(BOUNDARY_LENGTH)
        .collect()
}

fn boundary_collides(msg: &Message, boundary: &str) -> bool {
    msg.body().contains(boundary)
        || msg
            .attachments()
            .iter()
            .any(|a| contains_bytes(a.content(), boundary.as_bytes()))
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod test {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::message::{Attachment, Message};

    fn base_message() -> Message {
        Message::builder()
            .from("Sender <sender@example.com>".parse().unwrap())
            .to("Test User <test.user@example.com>".parse().unwrap())
            .subject("Hi")
            .body("Hello")
            .unwrap()
    }

    fn rendered_boundary(body: &str) -> String {
        let start = body.find("boundary=\"").expect("no boundary parameter") + 10;
        let end = body[start..].find('"').unwrap() + start;
        body[start..end].to_owned()
    }

    #[test]
    fn headers_in_emission_order() {
        let message = Message::builder()
            .from("Sender <sender@example.com>".parse().unwrap())
            .to("Test User <test.user@example.com>".parse().unwrap())
            .date(Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap())
            .subject("Hi")
            .body("Hello")
            .unwrap();

        assert_eq!(
            render_headers(&message),
            concat!(
                "From: Sender <sender@example.com>\r\n",
                "Date: Mon, 02 Jan 2006 15:04:05 +0000\r\n",
                "To: Test User <test.user@example.com>\r\n",
                "Subject: =?UTF-8?B?SGk=?=\r\n",
                "MIME-Version: 1.0\r\n",
            )
        );
    }

    #[test]
    fn empty_cc_and_bcc_produce_no_header() {
        let headers = render_headers(&base_message());
        assert!(!headers.contains("Cc:"));
        assert!(!headers.contains("Bcc:"));
        assert!(!headers.contains("Reply-To:"));
    }

    #[test]
    fn single_part_body_has_one_content_type_and_no_boundary() {
        let body = String::from_utf8(render_body(&base_message())).unwrap();
        assert_eq!(body.matches("Content-Type").count(), 1);
        assert!(body.starts_with("Content-Type: text/plain; charset=utf-8\r\n\r\n"));
        assert!(!body.contains("boundary"));
        assert!(!body.contains("--"));
        assert!(body.ends_with("Hello\r\n"));
    }

    #[test]
    fn multipart_boundary_line_counts() {
        let mut message = base_message();
        message.attach_bytes("a.txt", b"first".to_vec(), false).unwrap();
        message.attach_bytes("b.bin", vec![0, 1, 2], false).unwrap();

        let body = String::from_utf8(render_body(&message)).unwrap();
        let boundary = rendered_boundary(&body);

        let opening = format!("--{boundary}");
        let closing = format!("--{boundary}--");
        let plain = body
            .split("\r\n")
            .filter(|line| *line == opening)
            .count();
        let closed = body
            .split("\r\n")
            .filter(|line| *line == closing)
            .count();

        // one opening line for the body part, one delimiter per attachment
        assert_eq!(plain, 3);
        assert_eq!(closed, 1);
    }

    #[test]
    fn attachment_payload_round_trips_through_base64() {
        let payload: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
        let mut message = base_message();
        message
            .attach_bytes("data.bin", payload.clone(), false)
            .unwrap();

        let body = String::from_utf8(render_body(&message)).unwrap();
        let boundary = rendered_boundary(&body);

        // part body sits between the attachment's blank line and the closing
        // boundary
        let part_start = body.find("Content-Transfer-Encoding: base64").unwrap();
        let payload_start = body[part_start..].find("\r\n\r\n").unwrap() + part_start + 4;
        let payload_end = body[payload_start..]
            .find(&format!("--{boundary}--"))
            .unwrap()
            + payload_start;
        let encoded: String = body[payload_start..payload_end]
            .split("\r\n")
            .collect();

        assert_eq!(base64::decode(encoded).unwrap(), payload);
    }

    #[test]
    fn inline_attachment_is_raw_rfc822() {
        let mut message = base_message();
        message
            .attach_bytes("fwd.eml", b"Subject: inner\r\n\r\ninner body".to_vec(), true)
            .unwrap();

        let body = String::from_utf8(render_body(&message)).unwrap();
        assert!(body.contains("Content-Type: message/rfc822\r\n"));
        assert!(body.contains("Content-Disposition: inline; filename=\"fwd.eml\"\r\n"));
        assert!(body.contains("Subject: inner\r\n\r\ninner body"));
        assert!(!body.contains("Content-Transfer-Encoding: base64"));
    }

    #[test]
    fn attachment_filename_is_b_encoded() {
        let mut message = base_message();
        message.attach_bytes("café.txt", vec![1], false).unwrap();

        let body = String::from_utf8(render_body(&message)).unwrap();
        let expected = format!(
            "Content-Disposition: attachment; filename=\"{}\"",
            utf8_b::encode("café.txt")
        );
        assert!(body.contains(&expected));
    }

    #[test]
    fn boundary_collision_is_detected() {
        let mut message = base_message();
        message
            .attach_bytes("x.bin", b"prefix TOKEN1234 suffix".to_vec(), false)
            .unwrap();

        assert!(boundary_collides(&message, "TOKEN1234"));
        assert!(!boundary_collides(&message, "absent"));

        let chosen = choose_boundary(&message);
        assert_eq!(chosen.len(), BOUNDARY_LENGTH);
        assert!(chosen.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(!boundary_collides(&message, &chosen));
    }

    #[test]
    fn body_collision_is_detected_too() {
        let message = Message::builder()
            .from("sender@example.com".parse().unwrap())
            .to("to@example.com".parse().unwrap())
            .subject("x")
            .body("text mentioning SOMEBOUNDARY here")
            .unwrap();
        assert!(boundary_collides(&message, "SOMEBOUNDARY"));
    }
}
