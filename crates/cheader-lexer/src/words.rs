//! Quote-aware word scanning over raw text.
//!
//! The preprocessor works on text rather than tokens so that anything it
//! does not understand passes through untouched. [`WordScanner`] splits a
//! string into identifiers, quoted literals, numbers and single
//! characters, covering the input exactly.

use std::ops::Range;

/// Kind of a scanned text segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// A C identifier
    Ident,
    /// A string or character literal, quotes included
    Quoted,
    /// A numeric literal, suffixes included
    Number,
    /// Whitespace runs or a single other character
    Other,
}

/// Iterator over `(Segment, byte range)` pairs
pub struct WordScanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> WordScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn scan_quoted(&self, quote: u8) -> usize {
        let bytes = self.text.as_bytes();
        let mut i = self.pos + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b'\n' => return i,
                b if b == quote => return i + 1,
                _ => i += 1,
            }
        }
        bytes.len()
    }

    fn scan_number(&self) -> usize {
        let bytes = self.text.as_bytes();
        let hex = bytes[self.pos..].starts_with(b"0x") || bytes[self.pos..].starts_with(b"0X");
        let mut i = self.pos;
        while i < bytes.len() {
            let b = bytes[i];
            let exponent_sign =
                (b == b'+' || b == b'-') && !hex && i > self.pos && matches!(bytes[i - 1], b'e' | b'E');
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || exponent_sign {
                i += 1;
            } else {
                break;
            }
        }
        i
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

impl<'a> Iterator for WordScanner<'a> {
    type Item = (Segment, Range<usize>);

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.text.as_bytes();
        let start = self.pos;
        let first = *bytes.get(start)?;

        let (segment, end) = if first == b'"' || first == b'\'' {
            (Segment::Quoted, self.scan_quoted(first))
        } else if is_ident_start(first) {
            let mut end = start + 1;
            while end < bytes.len() && is_ident_continue(bytes[end]) {
                end += 1;
            }
            (Segment::Ident, end)
        } else if first.is_ascii_digit()
            || (first == b'.' && bytes.get(start + 1).is_some_and(u8::is_ascii_digit))
        {
            (Segment::Number, self.scan_number())
        } else if first.is_ascii_whitespace() {
            let mut end = start + 1;
            while end < bytes.len() && bytes[end].is_ascii_whitespace() {
                end += 1;
            }
            (Segment::Other, end)
        } else {
            let width = self.text[start..].chars().next().map_or(1, char::len_utf8);
            (Segment::Other, start + width)
        };

        self.pos = end;
        Some((segment, start..end))
    }
}

/// Scan `text` into segments
pub fn scan_words(text: &str) -> WordScanner<'_> {
    WordScanner::new(text)
}

/// Byte ranges of every identifier outside quoted literals
pub fn identifiers(text: &str) -> impl Iterator<Item = Range<usize>> + '_ {
    scan_words(text).filter_map(|(segment, range)| (segment == Segment::Ident).then_some(range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn segments(text: &str) -> Vec<(Segment, &str)> {
        scan_words(text).map(|(s, r)| (s, &text[r])).collect()
    }

    #[test]
    fn test_segments_cover_input() {
        let text = r#"f(a, "x, y", 'c') + 0x1FUL"#;
        let joined: String = segments(text).iter().map(|(_, s)| *s).collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn test_quoted_text_is_not_an_identifier() {
        let text = r#"A "B \" C" 'D' E"#;
        let idents: Vec<&str> = identifiers(text).map(|r| &text[r]).collect();
        assert_eq!(idents, vec!["A", "E"]);
    }

    #[test]
    fn test_numbers_absorb_suffixes() {
        assert_eq!(
            segments("1UL+2.5e-3f"),
            vec![
                (Segment::Number, "1UL"),
                (Segment::Other, "+"),
                (Segment::Number, "2.5e-3f"),
            ]
        );
        assert_eq!(
            segments("0x1e-1"),
            vec![
                (Segment::Number, "0x1e"),
                (Segment::Other, "-"),
                (Segment::Number, "1"),
            ]
        );
    }

    #[test]
    fn test_unterminated_quote_stops_at_newline() {
        assert_eq!(
            segments("'a\nb"),
            vec![(Segment::Quoted, "'a"), (Segment::Other, "\n"), (Segment::Ident, "b")]
        );
    }
}
