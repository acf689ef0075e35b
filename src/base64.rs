use ::base64::{
    engine::{general_purpose::STANDARD, Engine},
    DecodeError,
};

/// RFC 2045 requires encoded lines of at most 76 characters.
const LINE_WIDTH: usize = 76;

pub(crate) fn encode<T: AsRef<[u8]>>(input: T) -> String {
    STANDARD.encode(input)
}

pub(crate) fn decode<T: AsRef<[u8]>>(input: T) -> Result<Vec<u8>, DecodeError> {
    STANDARD.decode(input)
}

/// Encode and wrap with CRLF every 76 characters, for use as a
/// `Content-Transfer-Encoding: base64` part body.
pub(crate) fn encode_wrapped<T: AsRef<[u8]>>(input: T) -> String {
    let encoded = STANDARD.encode(input);
    let mut out = String::with_capacity(encoded.len() + 2 * (encoded.len() / LINE_WIDTH + 1));
    let mut rest = encoded.as_str();
    while rest.len() > LINE_WIDTH {
        let (line, tail) = rest.split_at(LINE_WIDTH);
        out.push_str(line);
        out.push_str("\r\n");
        rest = tail;
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod test {
    use super::{decode, encode, encode_wrapped};

    #[test]
    fn round_trip() {
        let data = b"some binary \x00\x01\x02 payload";
        assert_eq!(decode(encode(data)).unwrap(), data);
    }

    #[test]
    fn wrapped_lines_within_limit() {
        let data = vec![0xABu8; 200];
        let wrapped = encode_wrapped(&data);
        for line in wrapped.split("\r\n") {
            assert!(line.len() <= 76);
        }
        let unwrapped: String = wrapped.split("\r\n").collect();
        assert_eq!(decode(unwrapped).unwrap(), data);
    }

    #[test]
    fn wrapped_short_input_has_no_break() {
        assert!(!encode_wrapped(b"short").contains("\r\n"));
    }
}
