// ==========================================
// Cut-List Import Pipeline - source encoding normalization
// ==========================================
// Export files come from a Windows tool and are usually Windows-1250,
// but newer exports are UTF-8. Strategy: decode as Windows-1250 first;
// if the result carries no Polish diacritics but the raw bytes decode
// cleanly as UTF-8 AND that decoding does, prefer UTF-8. A UTF-8 BOM
// short-circuits the guesswork.
// ==========================================

use encoding_rs::WINDOWS_1250;

/// Which decoding won, for logging and import metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Windows1250,
}

impl SourceEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "utf-8",
            SourceEncoding::Windows1250 => "windows-1250",
        }
    }
}

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

fn has_polish_diacritics(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(
            c,
            'ą' | 'ć' | 'ę' | 'ł' | 'ń' | 'ó' | 'ś' | 'ź' | 'ż'
                | 'Ą' | 'Ć' | 'Ę' | 'Ł' | 'Ń' | 'Ó' | 'Ś' | 'Ź' | 'Ż'
        )
    })
}

/// Decode raw file bytes into text, guessing between Windows-1250 and
/// UTF-8. Total: every byte sequence yields some text.
pub fn decode_cut_list(bytes: &[u8]) -> (String, SourceEncoding) {
    if let Some(stripped) = bytes.strip_prefix(UTF8_BOM) {
        let text = String::from_utf8_lossy(stripped).into_owned();
        tracing::debug!(encoding = "utf-8", reason = "bom", "decoded cut list");
        return (text, SourceEncoding::Utf8);
    }

    let (cp1250, _, _) = WINDOWS_1250.decode(bytes);

    if !has_polish_diacritics(&cp1250) {
        // No diacritics after 1250 decoding usually means the file was
        // UTF-8 all along and its multibyte sequences got mangled.
        if let Ok(utf8) = std::str::from_utf8(bytes) {
            if has_polish_diacritics(utf8) {
                tracing::debug!(
                    encoding = "utf-8",
                    reason = "diacritic-fallback",
                    "decoded cut list"
                );
                return (utf8.to_string(), SourceEncoding::Utf8);
            }
        }
    }

    tracing::debug!(encoding = "windows-1250", "decoded cut list");
    (cp1250.into_owned(), SourceEncoding::Windows1250)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_1250_diacritics() {
        // "łączna" in Windows-1250
        let bytes = [0xB3, 0xB9, 0x63, 0x7A, 0x6E, 0x61];
        let (text, enc) = decode_cut_list(&bytes);
        assert_eq!(text, "łączna");
        assert_eq!(enc, SourceEncoding::Windows1250);
    }

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("klient: Kowalski".as_bytes());
        let (text, enc) = decode_cut_list(&bytes);
        assert_eq!(text, "klient: Kowalski");
        assert_eq!(enc, SourceEncoding::Utf8);
    }

    #[test]
    fn test_utf8_fallback_when_1250_yields_no_diacritics() {
        let bytes = "łączna liczba okien".as_bytes();
        let (text, enc) = decode_cut_list(bytes);
        assert_eq!(text, "łączna liczba okien");
        assert_eq!(enc, SourceEncoding::Utf8);
    }

    #[test]
    fn test_plain_ascii_stays_1250() {
        let (text, enc) = decode_cut_list(b"53526;19016050;10;500");
        assert_eq!(text, "53526;19016050;10;500");
        assert_eq!(enc, SourceEncoding::Windows1250);
    }

    #[test]
    fn test_total_on_arbitrary_bytes() {
        let junk: Vec<u8> = (0u8..=255).collect();
        let (text, _) = decode_cut_list(&junk);
        assert!(!text.is_empty());
    }
}
