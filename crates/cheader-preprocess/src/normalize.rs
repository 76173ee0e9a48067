//! Text normalization: comment removal and line continuation joining.

/// Remove `/* */` and `//` comments outside string and character literals.
///
/// A block comment becomes a single space followed by the newlines it
/// spanned, so line numbers are unchanged. An unterminated block comment
/// is left in place.
pub fn strip_comments(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut i = 0;
    let mut copied = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote && bytes[i] != b'\n' {
                    i += if bytes[i] == b'\\' { 2 } else { 1 };
                }
                i = (i + 1).min(bytes.len());
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                out.push_str(&text[copied..i]);
                let end = text[i..].find('\n').map_or(bytes.len(), |n| i + n);
                i = end;
                copied = end;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => match text[i + 2..].find("*/") {
                Some(n) => {
                    out.push_str(&text[copied..i]);
                    let end = i + 2 + n + 2;
                    out.push(' ');
                    out.extend(text[i..end].chars().filter(|c| *c == '\n'));
                    i = end;
                    copied = end;
                }
                None => i = bytes.len(),
            },
            _ => i += 1,
        }
    }
    out.push_str(&text[copied.min(text.len())..]);
    out
}

/// Join `\`-newline continuations. The joined line is followed by one
/// empty line per continuation so later lines keep their numbers.
pub fn join_continuations(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut pending = 0;

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        match line.strip_suffix('\\') {
            Some(head) => {
                current.push_str(head);
                pending += 1;
            }
            None => {
                current.push_str(line);
                lines.push(std::mem::take(&mut current));
                lines.extend(std::iter::repeat(String::new()).take(pending));
                pending = 0;
            }
        }
    }
    if pending > 0 {
        lines.push(current);
        lines.extend(std::iter::repeat(String::new()).take(pending - 1));
    }
    lines.join("\n")
}

/// Comment removal followed by continuation joining
pub fn normalize(text: &str) -> String {
    join_continuations(&strip_comments(text))
}
