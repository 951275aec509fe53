//! Evaluation of Python string literals.
//!
//! Docstrings are reported by value, not by source text, so a literal's
//! prefix, quotes and escape sequences have to be resolved the way the
//! Python compiler resolves them. Indentation is then normalized the way
//! `inspect.cleandoc` does it.

/// Tab stop used by `str.expandtabs()`.
const TAB_SIZE: usize = 8;

/// A single string literal split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLiteral<'a> {
    /// Prefix letters (`r`, `u`, `b`, `f`, `t` in any case/combination).
    pub prefix: &'a str,
    /// Text between the opening and closing quotes.
    pub body: &'a str,
}

impl<'a> StringLiteral<'a> {
    /// Split the source text of a literal such as `r'''x'''` into parts.
    ///
    /// Returns `None` if the text is not a complete quoted literal.
    pub fn split(text: &'a str) -> Option<Self> {
        let prefix_len = text
            .char_indices()
            .find(|(_, c)| !c.is_ascii_alphabetic())
            .map(|(i, _)| i)?;
        let (prefix, quoted) = text.split_at(prefix_len);

        let quote = if quoted.starts_with("\"\"\"") {
            "\"\"\""
        } else if quoted.starts_with("'''") {
            "'''"
        } else if quoted.starts_with('"') {
            "\""
        } else if quoted.starts_with('\'') {
            "'"
        } else {
            return None;
        };

        if quoted.len() < quote.len() * 2 || !quoted.ends_with(quote) {
            return None;
        }
        let body = &quoted[quote.len()..quoted.len() - quote.len()];
        Some(Self { prefix, body })
    }

    fn has_prefix(&self, flag: char) -> bool {
        self.prefix.chars().any(|c| c.eq_ignore_ascii_case(&flag))
    }

    /// Raw literals keep backslashes verbatim.
    pub fn is_raw(&self) -> bool {
        self.has_prefix('r')
    }

    /// Bytes literals are not `str` constants.
    pub fn is_bytes(&self) -> bool {
        self.has_prefix('b')
    }

    /// f-strings (and t-strings) are not constants at all.
    pub fn is_formatted(&self) -> bool {
        self.has_prefix('f') || self.has_prefix('t')
    }

    /// The literal's `str` value, or `None` for bytes and formatted strings.
    pub fn str_value(&self) -> Option<String> {
        if self.is_bytes() || self.is_formatted() {
            return None;
        }
        let body = normalize_newlines(self.body);
        if self.is_raw() {
            Some(body)
        } else {
            Some(unescape(&body))
        }
    }
}

/// Evaluate one or more adjacent literals (implicit concatenation) to the
/// `str` constant Python would build, or `None` if any part is not a plain
/// string constant.
pub fn str_constant<'a, I>(parts: I) -> Option<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut value = String::new();
    let mut any = false;
    for part in parts {
        let literal = StringLiteral::split(part)?;
        value.push_str(&literal.str_value()?);
        any = true;
    }
    any.then_some(value)
}

fn normalize_newlines(text: &str) -> String {
    if text.contains('\r') {
        text.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        text.to_string()
    }
}

/// Resolve backslash escapes in a non-raw `str` literal body.
///
/// `\N{...}` is kept verbatim since resolving it needs the Unicode name
/// table. Unknown escapes keep their backslash, as Python does.
pub fn unescape(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0b}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(d @ '0'..='7') => {
                            digits.push(*d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' => push_hex_escape(&mut out, &mut chars, 'x', 2),
            'u' => push_hex_escape(&mut out, &mut chars, 'u', 4),
            'U' => push_hex_escape(&mut out, &mut chars, 'U', 8),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

fn push_hex_escape(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    marker: char,
    width: usize,
) {
    let mut digits = String::with_capacity(width);
    while digits.len() < width {
        match chars.peek() {
            Some(d) if d.is_ascii_hexdigit() => {
                digits.push(*d);
                chars.next();
            }
            _ => break,
        }
    }

    let decoded = (digits.len() == width)
        .then(|| u32::from_str_radix(&digits, 16).ok())
        .flatten()
        .and_then(char::from_u32);

    match decoded {
        Some(ch) => out.push(ch),
        None => {
            out.push('\\');
            out.push(marker);
            out.push_str(&digits);
        }
    }
}

/// Python's `str.isspace()`, which also covers the ASCII separators
/// U+001C..U+001F that Rust does not treat as whitespace.
fn is_py_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        match c {
            '\t' => {
                let pad = TAB_SIZE - (column % TAB_SIZE);
                out.extend(std::iter::repeat(' ').take(pad));
                column += pad;
            }
            '\r' => {
                out.push(c);
                column = 0;
            }
            _ => {
                out.push(c);
                column += 1;
            }
        }
    }
    out
}

/// Normalize docstring indentation like `inspect.cleandoc`.
///
/// The first line is stripped of leading whitespace, the common indentation
/// of the remaining non-blank lines is removed, and leading/trailing empty
/// lines are dropped.
pub fn clean_doc(doc: &str) -> String {
    let mut lines: Vec<String> = doc.split('\n').map(expand_tabs).collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter_map(|line| {
            let content = line.trim_start_matches(is_py_space).chars().count();
            (content > 0).then(|| line.chars().count() - content)
        })
        .min();

    if let Some(first) = lines.first_mut() {
        *first = first.trim_start_matches(is_py_space).to_string();
    }
    if let Some(margin) = margin {
        for line in lines.iter_mut().skip(1) {
            *line = line.chars().skip(margin).collect();
        }
    }

    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    let leading = lines.iter().take_while(|l| l.is_empty()).count();
    lines.drain(..leading);

    lines.join("\n")
}
