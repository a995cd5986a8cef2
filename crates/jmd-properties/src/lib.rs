//! A small reader/writer for Java `.properties` files.
//!
//! Catalog snapshots (`moduleName=group:artifact`) and upstream module listings are stored in this
//! format. Parsing follows `java.util.Properties`: `#`/`!` comments, `=`/`:`/whitespace
//! separators, backslash line continuations and `\uXXXX` escapes. Writing is deterministic and
//! only escapes what is needed to read the file back.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyEntry {
    pub key: String,
    pub value: String,
    /// 1-based line on which the entry starts.
    pub line: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertiesFile {
    pub entries: Vec<PropertyEntry>,
}

impl PropertiesFile {
    #[must_use]
    pub fn by_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a PropertyEntry> + 'a {
        self.entries.iter().filter(move |e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct LogicalLine {
    bytes: Vec<u8>,
    first_line: usize,
}

/// Parse a `.properties` document into key/value entries, in source order.
///
/// Duplicate keys are kept; callers decide whether duplicates are an error.
#[must_use]
pub fn parse(text: &str) -> PropertiesFile {
    let bytes = text.as_bytes();
    let mut offset = 0usize;
    let mut line_no = 1usize;
    let mut entries = Vec::new();

    while offset < bytes.len() {
        let start = offset;
        let logical = read_logical_line(bytes, &mut offset, &mut line_no);
        if let Some((key, value)) = split_key_value(&logical.bytes) {
            entries.push(PropertyEntry {
                key,
                value,
                line: logical.first_line,
            });
        }

        // Always make progress, even on pathological inputs.
        if offset == start {
            offset += 1;
        }
    }

    PropertiesFile { entries }
}

fn read_logical_line(bytes: &[u8], offset: &mut usize, line_no: &mut usize) -> LogicalLine {
    let first_line = *line_no;
    let mut out = Vec::new();

    loop {
        let segment_start = *offset;
        let mut line_end = segment_start;
        while line_end < bytes.len() && bytes[line_end] != b'\n' {
            line_end += 1;
        }

        let mut content_end = line_end;
        if content_end > segment_start && bytes[content_end - 1] == b'\r' {
            content_end -= 1;
        }

        let segment = &bytes[segment_start..content_end];
        // Comment lines never continue, even if they end in a backslash.
        let is_comment = out.is_empty() && is_comment_line(segment);
        let continues = !is_comment && ends_with_unescaped_backslash(segment);
        let copy_end = if continues {
            content_end - 1
        } else {
            content_end
        };
        out.extend_from_slice(&bytes[segment_start..copy_end]);

        if line_end < bytes.len() {
            *offset = line_end + 1;
            *line_no += 1;
        } else {
            *offset = line_end;
        }

        if !continues || *offset >= bytes.len() {
            break;
        }

        while *offset < bytes.len() && is_whitespace(bytes[*offset]) {
            *offset += 1;
        }
    }

    LogicalLine {
        bytes: out,
        first_line,
    }
}

fn is_comment_line(segment: &[u8]) -> bool {
    segment
        .iter()
        .find(|b| !is_whitespace(**b))
        .is_some_and(|b| *b == b'#' || *b == b'!')
}

fn ends_with_unescaped_backslash(line: &[u8]) -> bool {
    let backslashes = line.iter().rev().take_while(|b| **b == b'\\').count();
    backslashes % 2 == 1
}

fn split_key_value(line: &[u8]) -> Option<(String, String)> {
    let mut i = 0usize;
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    if i >= line.len() || line[i] == b'#' || line[i] == b'!' {
        return None;
    }

    let key_start = i;
    while i < line.len() {
        match line[i] {
            b'\\' => i += 2,
            b'=' | b':' => break,
            b if is_whitespace(b) => break,
            _ => i += 1,
        }
    }
    let key_end = i.min(line.len());

    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }
    if i < line.len() && (line[i] == b'=' || line[i] == b':') {
        i += 1;
    }
    while i < line.len() && is_whitespace(line[i]) {
        i += 1;
    }

    let key = unescape(&line[key_start..key_end]);
    let value = unescape(&line[i.min(line.len())..]);
    Some((key, value))
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0C')
}

fn unescape(bytes: &[u8]) -> String {
    // Decode as UTF-8 first so multi-byte characters survive; escapes are pure ASCII.
    let text = String::from_utf8_lossy(bytes);
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            break;
        };
        match next {
            't' => out.push('\t'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            'f' => out.push('\x0C'),
            'u' => {
                let hex: String = chars.clone().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => {
                        out.push(decoded);
                        for _ in 0..4 {
                            chars.next();
                        }
                    }
                    _ => out.push('u'),
                }
            }
            other => out.push(other),
        }
    }

    out
}

/// Render entries as a `.properties` document: one `key=value` line per entry, newline-terminated.
///
/// The output is stable for a given input order; callers sort beforehand when they need a
/// canonical file.
#[must_use]
pub fn write<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        escape_into(&mut out, key, true);
        out.push('=');
        escape_into(&mut out, value, false);
        out.push('\n');
    }
    out
}

fn escape_into(out: &mut String, text: &str, is_key: bool) {
    for (idx, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0C' => out.push_str("\\f"),
            '=' | ':' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            '#' | '!' if is_key && idx == 0 => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_basic_entries_with_lines() {
        let text = "# comment\norg.slf4j=org.slf4j:slf4j-api\n\ncom.google.gson : com.google.code.gson:gson\n";
        let parsed = parse(text);
        assert_eq!(
            parsed.entries,
            vec![
                PropertyEntry {
                    key: "org.slf4j".into(),
                    value: "org.slf4j:slf4j-api".into(),
                    line: 2,
                },
                PropertyEntry {
                    key: "com.google.gson".into(),
                    value: "com.google.code.gson:gson".into(),
                    line: 4,
                },
            ]
        );
    }

    #[test]
    fn supports_line_continuations_and_unicode_escapes() {
        let text = "greeting=hello\\\n  world\nunicode=\\u0041\nnext=1\n";
        let parsed = parse(text);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed.entries[0].value, "helloworld");
        assert_eq!(parsed.entries[1].value, "A");
        assert_eq!(parsed.entries[1].line, 3);
        assert_eq!(parsed.entries[2].line, 4);
    }

    #[test]
    fn comment_lines_do_not_continue() {
        let parsed = parse("# trailing \\\nkey=value\n");
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed.entries[0].key, "key");
    }

    #[test]
    fn handles_crlf_and_duplicate_keys() {
        let parsed = parse("a=1\r\na=2\r\n");
        let values: Vec<_> = parsed.by_key("a").map(|e| e.value.as_str()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn write_escapes_separators_in_keys() {
        let text = write([("a=b", "x"), ("plain", " leading"), ("k", "tab\there")]);
        assert_eq!(text, "a\\=b=x\nplain=\\ leading\nk=tab\\there\n");
        let parsed = parse(&text);
        assert_eq!(parsed.entries[0].key, "a=b");
        assert_eq!(parsed.entries[1].value, " leading");
        assert_eq!(parsed.entries[2].value, "tab\there");
    }
}
