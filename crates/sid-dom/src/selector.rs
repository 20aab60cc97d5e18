//! Element Query
//!
//! A compound selector engine (`tag`, `*`, `#id`, `.class`, `[attr]`,
//! `[attr="value"]`) with CSS escape handling, plus `CSS.escape`.
//! Combinators and pseudo-classes are rejected.

use std::iter::Peekable;
use std::str::Chars;

use crate::{DomError, DomResult, ElementData};

/// Simple selector for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Universal,
    Tag(String),
    Id(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl SimpleSelector {
    fn matches(&self, elem: &ElementData) -> bool {
        match self {
            SimpleSelector::Universal => true,
            SimpleSelector::Tag(tag) => elem.name.eq_ignore_ascii_case(tag),
            SimpleSelector::Id(id) => elem.get_attr("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => elem
                .get_attr("class")
                .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class)),
            SimpleSelector::Attribute { name, value } => match (elem.get_attr(name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }
}

/// Compound selector: every part must match
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    parts: Vec<SimpleSelector>,
}

impl Selector {
    /// Parse a compound selector
    pub fn parse(input: &str) -> DomResult<Self> {
        let syntax = || DomError::Syntax(input.to_string());
        let mut chars = input.trim().chars().peekable();
        let mut parts = Vec::new();

        while let Some(&c) = chars.peek() {
            match c {
                '*' => {
                    chars.next();
                    parts.push(SimpleSelector::Universal);
                }
                '#' => {
                    chars.next();
                    parts.push(SimpleSelector::Id(read_ident(&mut chars).ok_or_else(syntax)?));
                }
                '.' => {
                    chars.next();
                    parts.push(SimpleSelector::Class(read_ident(&mut chars).ok_or_else(syntax)?));
                }
                '[' => {
                    chars.next();
                    parts.push(read_attribute(&mut chars).ok_or_else(syntax)?);
                }
                c if parts.is_empty() && (is_ident_char(c) || c == '\\') => {
                    let tag = read_ident(&mut chars).ok_or_else(syntax)?;
                    parts.push(SimpleSelector::Tag(tag.to_ascii_lowercase()));
                }
                _ => return Err(syntax()),
            }
        }

        if parts.is_empty() {
            return Err(syntax());
        }
        Ok(Self { parts })
    }

    /// Check if an element matches
    pub fn matches(&self, elem: &ElementData) -> bool {
        self.parts.iter().all(|part| part.matches(elem))
    }

    pub fn parts(&self) -> &[SimpleSelector] {
        &self.parts
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

fn read_ident(chars: &mut Peekable<Chars<'_>>) -> Option<String> {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c == '\\' {
            chars.next();
            out.push(read_escape(chars));
        } else if is_ident_char(c) {
            out.push(c);
            chars.next();
        } else {
            break;
        }
    }
    (!out.is_empty()).then_some(out)
}

/// Consume an escape sequence; the backslash has already been taken
fn read_escape(chars: &mut Peekable<Chars<'_>>) -> char {
    let Some(&first) = chars.peek() else {
        return '\u{FFFD}';
    };
    if !first.is_ascii_hexdigit() {
        chars.next();
        return first;
    }

    let mut hex = String::new();
    while hex.len() < 6 {
        match chars.peek() {
            Some(&c) if c.is_ascii_hexdigit() => {
                hex.push(c);
                chars.next();
            }
            _ => break,
        }
    }
    if chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
        chars.next();
    }
    u32::from_str_radix(&hex, 16)
        .ok()
        .filter(|&cp| cp != 0)
        .and_then(char::from_u32)
        .unwrap_or('\u{FFFD}')
}

fn read_string(chars: &mut Peekable<Chars<'_>>, quote: char) -> Option<String> {
    let mut out = String::new();
    loop {
        match chars.next()? {
            c if c == quote => return Some(out),
            '\\' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                } else {
                    out.push(read_escape(chars));
                }
            }
            c => out.push(c),
        }
    }
}

fn skip_whitespace(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_ascii_whitespace()) {
        chars.next();
    }
}

fn read_attribute(chars: &mut Peekable<Chars<'_>>) -> Option<SimpleSelector> {
    skip_whitespace(chars);
    let name = read_ident(chars)?.to_ascii_lowercase();
    skip_whitespace(chars);
    match chars.next()? {
        ']' => Some(SimpleSelector::Attribute { name, value: None }),
        '=' => {
            skip_whitespace(chars);
            let value = match chars.peek()? {
                '"' | '\'' => {
                    let quote = chars.next()?;
                    read_string(chars, quote)?
                }
                _ => read_ident(chars)?,
            };
            skip_whitespace(chars);
            (chars.next()? == ']').then_some(SimpleSelector::Attribute { name, value: Some(value) })
        }
        _ => None,
    }
}

/// Escape a string for use as a CSS identifier (CSSOM `CSS.escape`)
pub fn css_escape(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    let mut out = String::with_capacity(value.len());

    for (index, &c) in chars.iter().enumerate() {
        let code = c as u32;
        if code == 0 {
            out.push('\u{FFFD}');
        } else if (0x01..=0x1F).contains(&code)
            || code == 0x7F
            || (index == 0 && c.is_ascii_digit())
            || (index == 1 && c.is_ascii_digit() && chars[0] == '-')
        {
            out.push_str(&format!("\\{code:x} "));
        } else if index == 0 && c == '-' && chars.len() == 1 {
            out.push_str("\\-");
        } else if code >= 0x80 || c == '-' || c == '_' || c.is_ascii_alphanumeric() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }

    out
}
