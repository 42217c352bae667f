//! Post-processing of captured terminal output.

use crate::drain::DrainStatus;

/// Prefix bash uses for its own diagnostics ("command not found", ...).
const SHELL_ERROR_PREFIX: &str = "bash: ";

fn is_shell_error_line(line: &str) -> bool {
    line.starts_with(SHELL_ERROR_PREFIX)
}

/// Drop leading shell error lines and trailing blank lines.
///
/// Error lines that appear after the first regular line are kept.
pub fn clean_output(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();

    let start = lines
        .iter()
        .position(|line| !is_shell_error_line(line))
        .unwrap_or(lines.len());
    let end = lines
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |idx| idx + 1);

    if start >= end {
        return String::new();
    }
    lines[start..end].join("\n")
}

/// Decode captured bytes as UTF-8.
///
/// When the drain was cut short, an incomplete multi-byte sequence at the
/// very end is dropped instead of being turned into a replacement
/// character. Other invalid bytes are replaced.
pub fn decode_capture(bytes: &[u8], status: DrainStatus) -> String {
    let bytes = match status {
        DrainStatus::Complete => bytes,
        DrainStatus::Truncated => without_torn_tail(bytes),
    };
    String::from_utf8_lossy(bytes).into_owned()
}

fn without_torn_tail(bytes: &[u8]) -> &[u8] {
    // A UTF-8 sequence is at most 4 bytes, so only the tail needs checking.
    let tail_start = bytes.len().saturating_sub(4);
    for cut in tail_start..bytes.len() {
        match std::str::from_utf8(&bytes[cut..]) {
            Ok(_) => return bytes,
            Err(err) if err.error_len().is_none() => {
                let valid_end = cut + err.valid_up_to();
                if is_char_start(&bytes[valid_end..]) {
                    return &bytes[..valid_end];
                }
            }
            Err(_) => {}
        }
    }
    bytes
}

fn is_char_start(rest: &[u8]) -> bool {
    rest.first().is_some_and(|b| b & 0b1100_0000 != 0b1000_0000)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("hello\nworld", "hello\nworld")]
    #[case("hello\n\n  \n\t\n", "hello")]
    #[case("bash: foo: command not found\nhello", "hello")]
    #[case("bash: a\nbash: b\nhello\nbash: c", "hello\nbash: c")]
    #[case("bash: nope: command not found\n", "")]
    #[case("", "")]
    #[case("\n\n", "")]
    #[case("  indented\n", "  indented")]
    #[case("line\r\n\r\n", "line\r")]
    #[case("xbash: not an error\n", "xbash: not an error")]
    fn cleans(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(clean_output(input), expected);
    }

    #[test]
    fn complete_capture_is_lossy_decoded() {
        let bytes = b"ok \xff done";
        assert_eq!(
            decode_capture(bytes, DrainStatus::Complete),
            "ok \u{fffd} done"
        );
    }

    #[test]
    fn truncated_capture_drops_torn_sequence() {
        // "é" is 0xC3 0xA9; keep only the lead byte.
        let bytes = b"caf\xc3";
        assert_eq!(decode_capture(bytes, DrainStatus::Truncated), "caf");
        assert_eq!(decode_capture(bytes, DrainStatus::Complete), "caf\u{fffd}");

        // Three of four bytes of an emoji.
        let emoji = "🦀".as_bytes();
        let mut torn = b"crab ".to_vec();
        torn.extend_from_slice(&emoji[..3]);
        assert_eq!(decode_capture(&torn, DrainStatus::Truncated), "crab ");
    }

    #[test]
    fn truncated_capture_keeps_complete_text() {
        let text = "naïve 🦀";
        assert_eq!(decode_capture(text.as_bytes(), DrainStatus::Truncated), text);
    }

    proptest! {
        #[test]
        fn never_ends_with_blank_line(text in "[a-z \\n\\t]{0,60}") {
            let cleaned = clean_output(&text);
            if let Some(last) = cleaned.split('\n').last() {
                prop_assert!(cleaned.is_empty() || !last.trim().is_empty());
            }
        }

        #[test]
        fn cleaning_is_idempotent(lines in prop::collection::vec("(bash: )?[a-z ]{0,10}", 0..8)) {
            let text = lines.join("\n");
            let once = clean_output(&text);
            prop_assert_eq!(clean_output(&once), once.clone());
        }
    }
}
