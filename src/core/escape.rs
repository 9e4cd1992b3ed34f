//
//  Copyright (C) 2022-2024  Chase Ruskin
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

//! Conversions of arbitrary text into literals that are safe to splice into
//! generated shell, batch and Tcl sources.

use crate::core::commands::Syntax;
use crate::util::environment::tool_env_var;

/// Trusted text produced by the generator itself.
///
/// The Tcl escapers pass markup through unchanged so fragments that are
/// already valid Tcl (lists, expressions) are not escaped twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markup(String);

impl Markup {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Markup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Key of the object that carries [Markup] through template values.
pub const MARKUP_KEY: &str = "__markup__";

impl From<Markup> for serde_json::Value {
    fn from(value: Markup) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(MARKUP_KEY.to_string(), serde_json::Value::String(value.0));
        serde_json::Value::Object(map)
    }
}

impl Markup {
    /// Recovers markup previously stored in a template value.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let map = value.as_object()?;
        match (map.len(), map.get(MARKUP_KEY)) {
            (1, Some(serde_json::Value::String(s))) => Some(Self(s.clone())),
            _ => None,
        }
    }
}

/// Text that can be written into a Tcl source.
pub trait TclText {
    /// Wraps the text in braces so Tcl reads it as one word without any
    /// substitution.
    ///
    /// Braces and backslashes are preceded by a backslash so unbalanced
    /// braces cannot end the word early. Tcl keeps those backslashes in the
    /// word's value, so `a{b` reads back as `a\{b`.
    fn tcl_escape(&self) -> String;

    /// Wraps the text in double quotes with every substitution disabled.
    ///
    /// Tcl reads the word back as exactly the original text.
    fn tcl_quote(&self) -> String;
}

impl TclText for str {
    fn tcl_escape(&self) -> String {
        let mut result = String::with_capacity(self.len() + 2);
        result.push('{');
        for c in self.chars() {
            if let '{' | '}' | '\\' = c {
                result.push('\\');
            }
            result.push(c);
        }
        result.push('}');
        result
    }

    fn tcl_quote(&self) -> String {
        let mut result = String::with_capacity(self.len() + 2);
        result.push('"');
        for c in self.chars() {
            if let '$' | '[' | '\\' | '"' = c {
                result.push('\\');
            }
            result.push(c);
        }
        result.push('"');
        result
    }
}

impl TclText for Markup {
    fn tcl_escape(&self) -> String {
        self.0.clone()
    }

    fn tcl_quote(&self) -> String {
        self.0.clone()
    }
}

pub fn tcl_escape<T: TclText + ?Sized>(text: &T) -> String {
    text.tcl_escape()
}

pub fn tcl_quote<T: TclText + ?Sized>(text: &T) -> String {
    text.tcl_quote()
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Maps every byte outside `[A-Za-z0-9_]` to `_xx_`, where `xx` is the byte
/// in lower-case hexadecimal.
pub fn ascii_escape(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for b in text.bytes() {
        match is_ident_byte(b) {
            true => result.push(b as char),
            false => result.push_str(&format!("_{:02x}_", b)),
        }
    }
    result
}

/// Decodes the `_xx_` sequences written by [ascii_escape].
pub fn ascii_unescape(text: &str) -> Vec<u8> {
    let bytes = text.as_bytes();
    let mut result = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 3 < bytes.len() && bytes[i + 3] == b'_' {
            if let (Some(hi), Some(lo)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                result.push(hi << 4 | lo);
                i += 4;
                continue;
            }
        }
        result.push(bytes[i]);
        i += 1;
    }
    result
}

fn hex_digit(d: u8) -> Option<u8> {
    match d {
        b'0'..=b'9' => Some(d - b'0'),
        b'a'..=b'f' => Some(d - b'a' + 10),
        _ => None,
    }
}

/// Joins a list of tool options into a single space-separated string.
pub fn options<S: AsRef<str>>(opts: &[S]) -> String {
    opts.iter()
        .map(|o| o.as_ref())
        .collect::<Vec<&str>>()
        .join(" ")
}

/// References the resolved path of `tool` in the given script syntax.
pub fn invoke_tool(tool: &str, syntax: Syntax) -> String {
    let env_var = tool_env_var(tool);
    match syntax {
        Syntax::Sh => format!("\"${}\"", env_var),
        Syntax::Bat => format!("%{}%", env_var),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Reads a braced Tcl word back into its value.
    ///
    /// Inside braces Tcl performs no substitution: a backslash only stops the
    /// next character from counting as a brace and stays in the value. The
    /// word must end at the brace matching the opening one.
    fn read_braced(word: &str) -> String {
        let mut chars = word.chars();
        assert_eq!(chars.next(), Some('{'), "not a braced word: {:?}", word);
        let mut result = String::new();
        let mut depth = 1;
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some('\n') => result.push(' '),
                    Some(n) => {
                        result.push(c);
                        result.push(n);
                    }
                    None => panic!("missing close-brace in {:?}", word),
                },
                '{' => {
                    depth += 1;
                    result.push(c);
                }
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        let rest: String = chars.collect();
                        assert!(rest.is_empty(), "extra characters after close-brace in {:?}", word);
                        return result;
                    }
                    result.push(c);
                }
                _ => result.push(c),
            }
        }
        panic!("missing close-brace in {:?}", word)
    }

    /// Reads a double-quoted Tcl word back into its value.
    ///
    /// A backslash substitutes the character after it. Only punctuation may
    /// follow one here since letters and digits start Tcl escape sequences
    /// (`\n`, `\x41`) that the quoter never writes.
    fn read_quoted(word: &str) -> String {
        let mut chars = word.chars();
        assert_eq!(chars.next(), Some('"'), "not a quoted word: {:?}", word);
        let mut result = String::new();
        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(n) if n.is_ascii_alphanumeric() == false && n != '\n' => result.push(n),
                    n => panic!("unexpected escape sequence \\{:?} in {:?}", n, word),
                },
                '$' | '[' => panic!("unescaped substitution in {:?}", word),
                '"' => {
                    let rest: String = chars.collect();
                    assert!(rest.is_empty(), "extra characters after close-quote in {:?}", word);
                    return result;
                }
                _ => result.push(c),
            }
        }
        panic!("missing close-quote in {:?}", word)
    }

    #[test]
    fn escape_braces() {
        assert_eq!(tcl_escape("clk"), "{clk}");
        assert_eq!(tcl_escape("a{b}c"), "{a\\{b\\}c}");
        assert_eq!(tcl_escape("back\\slash"), "{back\\\\slash}");
        assert_eq!(tcl_escape(""), "{}");
    }

    #[test]
    fn quote_substitutions() {
        assert_eq!(tcl_quote("$::env(X)"), "\"\\$::env(X)\"");
        assert_eq!(tcl_quote("[exit]"), "\"\\[exit]\"");
        assert_eq!(tcl_quote("a\"b"), "\"a\\\"b\"");
        assert_eq!(tcl_quote("plain"), "\"plain\"");
    }

    #[test]
    fn escapes_read_back() {
        let samples = [
            "",
            "plain",
            "{unbalanced",
            "close}",
            "\\",
            "trailing\\",
            "$var [cmd] \"quoted\"",
            "nested {{a} b}",
            "uni\u{e9}code",
            "\\n is not a newline",
        ];
        for s in samples {
            // braces keep their escaping backslashes in the value
            let kept: String = s
                .chars()
                .flat_map(|c| match c {
                    '{' | '}' | '\\' => vec!['\\', c],
                    _ => vec![c],
                })
                .collect();
            assert_eq!(read_braced(&tcl_escape(s)), kept);
            assert_eq!(read_quoted(&tcl_quote(s)), s);
        }
        assert_eq!(read_braced(&tcl_escape("a b $c [d]")), "a b $c [d]");
    }

    #[test]
    fn markup_is_not_escaped() {
        let m = Markup::new("[list a b]");
        assert_eq!(tcl_escape(&m), "[list a b]");
        assert_eq!(tcl_quote(&m), "[list a b]");

        let v: serde_json::Value = m.clone().into();
        assert_eq!(Markup::from_value(&v), Some(m));
        assert_eq!(Markup::from_value(&serde_json::json!("text")), None);
    }

    #[test]
    fn identifiers() {
        assert_eq!(ascii_escape("top_0"), "top_0");
        assert_eq!(ascii_escape("my-design"), "my_2d_design");
        assert_eq!(ascii_escape("a b"), "a_20_b");
        assert_eq!(ascii_escape("\u{e9}"), "_c3__a9_");
    }

    #[test]
    fn identifiers_alphabet_and_decoding() {
        let samples = ["", "sig", "bus[3]", "a.b/c", "~!@#$%^&*()", "x y\tz", "\u{e9}t\u{e9}"];
        for s in samples {
            let escaped = ascii_escape(s);
            assert!(escaped.bytes().all(is_ident_byte), "{:?}", escaped);
            assert_eq!(ascii_unescape(&escaped), s.as_bytes());
        }
    }

    #[test]
    fn identifiers_distinct() {
        let printable: Vec<String> = (0x20u8..0x7f).map(|b| (b as char).to_string()).collect();
        let mut seen = std::collections::HashSet::new();
        for s in &printable {
            assert!(seen.insert(ascii_escape(s)), "collision for {:?}", s);
        }
    }

    #[test]
    fn join_options() {
        assert_eq!(options(&["-noattr", "-norename"]), "-noattr -norename");
        assert_eq!(options::<&str>(&[]), "");
    }

    #[test]
    fn tool_reference() {
        assert_eq!(invoke_tool("docker", Syntax::Sh), "\"$DOCKER\"");
        assert_eq!(invoke_tool("docker", Syntax::Bat), "%DOCKER%");
    }
}
