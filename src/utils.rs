// Utility functions
use std::borrow::Cow;

/// Lowercases text and turns single spaces into hyphens.
/// Runs of spaces produce runs of hyphens, matching how the job board builds query slugs.
pub fn to_kebab_case(text: &str) -> String {
    text.to_lowercase().split(' ').collect::<Vec<_>>().join("-")
}

/// Repairs backslash escapes left behind by upstream HTML text extraction
/// (`\UXXXXXXXX`, `\uXXXX`, `\xXX`, `\n`, `\t`, `\r`, `\\`).
///
/// Unknown or truncated escapes are kept verbatim. Text without a backslash is borrowed as is.
pub fn unescape_unicode(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => {
                chars.next();
                out.push('\n');
            }
            Some('t') => {
                chars.next();
                out.push('\t');
            }
            Some('r') => {
                chars.next();
                out.push('\r');
            }
            Some('\\') => {
                chars.next();
                out.push('\\');
            }
            Some(kind @ ('U' | 'u' | 'x')) => {
                let width = match kind {
                    'U' => 8,
                    'u' => 4,
                    _ => 2,
                };
                let digits: String = chars.clone().skip(1).take(width).collect();
                let decoded = (digits.len() == width)
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        for _ in 0..=width {
                            chars.next();
                        }
                        out.push(ch);
                    }
                    None => out.push('\\'),
                }
            }
            _ => out.push('\\'),
        }
    }

    Cow::Owned(out)
}
