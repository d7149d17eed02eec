//! Modified UTF-7 mailbox name encoding (RFC 3501 section 5.1.3).

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::GeneralPurpose;
use base64::engine::general_purpose::NO_PAD;

const ENGINE: GeneralPurpose = GeneralPurpose::new(&IMAP_MUTF7, NO_PAD);

/// Encodes a mailbox name into modified UTF-7.
#[must_use]
pub fn encode(name: &str) -> String {
    let mut output = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in name.chars() {
        if matches!(c, '\u{20}'..='\u{7e}') {
            flush_shifted(&mut output, &mut pending);
            if c == '&' {
                output.push_str("&-");
            } else {
                output.push(c);
            }
        } else {
            let mut units = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut units));
        }
    }
    flush_shifted(&mut output, &mut pending);
    output
}

fn flush_shifted(output: &mut String, pending: &mut Vec<u16>) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|u| u.to_be_bytes()).collect();
    output.push('&');
    output.push_str(&ENGINE.encode(bytes));
    output.push('-');
    pending.clear();
}

/// Decodes a modified UTF-7 mailbox name.
///
/// Returns `None` if the input is not valid modified UTF-7. Superfluous
/// shifts such as `&U,BTFw-&ZeVnLIqe-` are accepted.
#[must_use]
pub fn decode(input: &[u8]) -> Option<String> {
    let mut output = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        match input[i] {
            b'&' => {
                let start = i + 1;
                let end = start + input[start..].iter().position(|&b| b == b'-')?;
                if start == end {
                    output.push('&');
                } else {
                    let bytes = ENGINE.decode(&input[start..end]).ok()?;
                    if bytes.len() % 2 != 0 {
                        return None;
                    }
                    let units = bytes
                        .chunks_exact(2)
                        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                    for c in char::decode_utf16(units) {
                        output.push(c.ok()?);
                    }
                }
                i = end;
            }
            c @ (0x20..=0x25 | 0x27..=0x7e) => output.push(char::from(c)),
            _ => return None,
        }
        i += 1;
    }
    Some(output)
}

/// Decodes a mailbox name, falling back to lossy UTF-8 when the name is not
/// valid modified UTF-7.
///
/// Some servers send raw UTF-8 names; those are passed through.
#[must_use]
pub fn decode_lossy(input: &[u8]) -> String {
    decode(input).unwrap_or_else(|| String::from_utf8_lossy(input).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_rfc_examples() {
        assert_eq!(decode(b"").unwrap(), "");
        assert_eq!(decode(b"&-").unwrap(), "&");
        assert_eq!(
            decode(b"~peter/mail/&U,BTFw-/&ZeVnLIqe-").unwrap(),
            "~peter/mail/台北/日本語"
        );
        assert_eq!(decode(b"&Jjo-!").unwrap(), "☺!");
        assert_eq!(decode(b"&U,BTF2XlZyyKng-").unwrap(), "台北日本語");
    }

    #[test]
    fn test_decode_rejects_unterminated_shift() {
        assert_eq!(decode(b"&Jjo!"), None);
    }

    #[test]
    fn test_decode_tolerates_superfluous_shift() {
        assert_eq!(decode(b"&U,BTFw-&ZeVnLIqe-").unwrap(), "台北日本語");
    }

    #[test]
    fn test_encode() {
        assert_eq!(encode("INBOX"), "INBOX");
        assert_eq!(encode("Tom & Jerry"), "Tom &- Jerry");
        assert_eq!(encode("~peter/mail/台北/日本語"), "~peter/mail/&U,BTFw-/&ZeVnLIqe-");
        assert_eq!(encode("台北日本語"), "&U,BTF2XlZyyKng-");
    }

    #[test]
    fn test_encode_surrogate_pair() {
        let encoded = encode("mail 📧");
        assert_eq!(decode(encoded.as_bytes()).unwrap(), "mail 📧");
    }

    #[test]
    fn test_decode_lossy_passes_utf8_through() {
        assert_eq!(decode_lossy("Entwürfe".as_bytes()), "Entwürfe");
    }
}
