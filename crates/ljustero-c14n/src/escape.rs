#![forbid(unsafe_code)]

//! Character escaping for canonical output.
//!
//! | context    | escaped                                  |
//! |------------|------------------------------------------|
//! | text       | `&` `<` `>` `\r`                         |
//! | attribute  | `&` `<` `"` `\t` `\n` `\r`               |
//! | PI data    | `\r`                                     |

/// Where a piece of character data ends up in the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escape {
    Text,
    Attribute,
    ProcessingInstruction,
}

impl Escape {
    fn replacement(self, ch: char) -> Option<&'static str> {
        match (self, ch) {
            (Self::Text | Self::Attribute, '&') => Some("&amp;"),
            (Self::Text | Self::Attribute, '<') => Some("&lt;"),
            (Self::Text, '>') => Some("&gt;"),
            (Self::Attribute, '"') => Some("&quot;"),
            (Self::Attribute, '\t') => Some("&#x9;"),
            (Self::Attribute, '\n') => Some("&#xA;"),
            (_, '\r') => Some("&#xD;"),
            _ => None,
        }
    }

    /// Append `s` to `out`, escaped for this context.
    pub fn write(self, s: &str, out: &mut Vec<u8>) {
        let mut buf = [0u8; 4];
        for ch in s.chars() {
            match self.replacement(ch) {
                Some(r) => out.extend_from_slice(r.as_bytes()),
                None => out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes()),
            }
        }
    }

    /// Escape `s` into a new string.
    pub fn apply(self, s: &str) -> String {
        let mut out = Vec::with_capacity(s.len());
        self.write(s, &mut out);
        String::from_utf8(out).unwrap_or_default()
    }
}
