// RFC 2047 encoded words, B encoding only.
//
// Subject and attachment filenames are always encoded, even when pure
// ASCII: the output is deterministic and never needs line folding logic.

use crate::base64;

pub(crate) fn encode(s: &str) -> String {
    format!("=?UTF-8?B?{}?=", base64::encode(s))
}

#[cfg(test)]
pub(crate) fn decode(s: &str) -> Option<String> {
    const PREFIX: &str = "=?UTF-8?B?";
    const SUFFIX: &str = "?=";

    let s = s.trim();
    let s = s.strip_prefix(PREFIX)?;
    let s = s.strip_suffix(SUFFIX)?;
    base64::decode(s)
        .ok()
        .and_then(|v| String::from_utf8(v).ok())
}

#[cfg(test)]
mod test {
    use super::{decode, encode};

    #[test]
    fn encode_ascii() {
        assert_eq!(&encode("Hi"), "=?UTF-8?B?SGk=?=");
    }

    #[test]
    fn encode_utf8() {
        assert_eq!(
            &encode("Привет, мир!"),
            "=?UTF-8?B?0J/RgNC40LLQtdGCLCDQvNC40YAh?="
        );
    }

    #[test]
    fn round_trip() {
        for s in ["Hello", "détentes", "日本語の件名", ""] {
            assert_eq!(decode(&encode(s)).as_deref(), Some(s));
        }
    }
}
