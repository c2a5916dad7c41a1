// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Materialization of raw token text.
//!
//! The tokenizer hands out the source text of each token untouched. Before
//! a token reaches the tree builder its text is decoded here: character
//! references are resolved where the content model allows them, NUL becomes
//! U+FFFD and attribute names are lowercased. This is pure, so it can run on
//! any thread.

use std::borrow::Cow::{self, Borrowed, Owned};
use std::char::from_u32;

use log::trace;
use string_cache::DefaultAtom;

use crate::tokenizer::{Token, TokenType};
use crate::util::str::is_all_whitespace;

mod entities;

use self::entities::{C1_REPLACEMENTS, LONGEST_LEGACY, NAMED_ENTITIES};

/// Decode the text of `token` in place and mark it `DONE`.
///
/// Tokens already marked `DONE` are left alone.
pub fn stringify(token: &mut Token) {
    if token.is_done() {
        return;
    }

    if token.is_text() {
        if !token.kind.contains(TokenType::NULL) {
            let decode =
                token.kind.intersects(TokenType::DATA | TokenType::RCDATA | TokenType::CDATA);
            let text = if decode {
                decode_char_refs(&token.text, false)
            } else {
                replace_nul(&token.text)
            };
            if let Owned(text) = text {
                token.text = text;
            }
            if is_all_whitespace(&token.text) {
                token.kind |= TokenType::WHITESPACE;
            }
        }
    } else if token.is_comment() {
        if let Owned(text) = replace_nul(&token.text) {
            token.text = text;
        }
    } else {
        for attr in token.attrs.iter_mut() {
            if attr.name.bytes().any(|b| b.is_ascii_uppercase()) {
                attr.name = DefaultAtom::from(attr.name.to_ascii_lowercase());
            }
            if let Owned(value) = decode_char_refs(&attr.value, true) {
                attr.value = value;
            }
        }
    }

    trace!("stringified {:?}", token.tag);
    token.kind |= TokenType::DONE;
}

/// Replace every NUL with U+FFFD.
pub fn replace_nul(raw: &str) -> Cow<'_, str> {
    if raw.contains('\0') {
        Owned(raw.replace('\0', "\u{fffd}"))
    } else {
        Borrowed(raw)
    }
}

/// Resolve character references in `raw`, also replacing NUL.
///
/// In attribute values a legacy reference without its semicolon is left
/// alone when an alphanumeric character or `=` follows it.
pub fn decode_char_refs(raw: &str, in_attribute: bool) -> Cow<'_, str> {
    let special = |c: char| c == '&' || c == '\0';
    if !raw.contains(special) {
        return Borrowed(raw);
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(i) = rest.find(special) {
        out.push_str(&rest[..i]);
        if rest.as_bytes()[i] == b'\0' {
            out.push('\u{fffd}');
            rest = &rest[i + 1..];
            continue;
        }

        let after = &rest[i + 1..];
        match char_ref(after, in_attribute) {
            Some((consumed, CharRef::One(c))) => {
                out.push(c);
                rest = &after[consumed..];
            },
            Some((consumed, CharRef::Named(s))) => {
                out.push_str(s);
                rest = &after[consumed..];
            },
            None => {
                out.push('&');
                rest = after;
            },
        }
    }
    out.push_str(rest);
    Owned(out)
}

enum CharRef {
    One(char),
    Named(&'static str),
}

// `s` starts right after the `&`. Returns the number of bytes consumed.
fn char_ref(s: &str, in_attribute: bool) -> Option<(usize, CharRef)> {
    match s.strip_prefix('#') {
        Some(num) => numeric_char_ref(num).map(|(n, c)| (n + 1, CharRef::One(c))),
        None => named_char_ref(s, in_attribute).map(|(n, s)| (n, CharRef::Named(s))),
    }
}

fn numeric_char_ref(s: &str) -> Option<(usize, char)> {
    let (base, start) = match s.as_bytes().first() {
        Some(b'x' | b'X') => (16, 1),
        _ => (10, 0),
    };

    let digits = s[start..]
        .bytes()
        .take_while(|b| (*b as char).is_digit(base))
        .count();
    if digits == 0 {
        return None;
    }

    let mut num: u32 = 0;
    let mut too_big = false;
    for b in s[start..start + digits].bytes() {
        if too_big {
            break;
        }
        num = num * base + (b as char).to_digit(base).unwrap_or(0);
        if num > 0x10FFFF {
            // The character is invalid; stop before the value overflows.
            too_big = true;
        }
    }

    let mut consumed = start + digits;
    if s[consumed..].starts_with(';') {
        consumed += 1;
    }

    let c = match num {
        _ if too_big => '\u{fffd}',
        0x00 | 0xD800..=0xDFFF => '\u{fffd}',
        0x80..=0x9F => C1_REPLACEMENTS[(num - 0x80) as usize]
            .or_else(|| from_u32(num))
            .unwrap_or('\u{fffd}'),
        n => from_u32(n).unwrap_or('\u{fffd}'),
    };
    Some((consumed, c))
}

fn named_char_ref(s: &str, in_attribute: bool) -> Option<(usize, &'static str)> {
    let run = s.bytes().take_while(u8::is_ascii_alphanumeric).count();
    if run == 0 {
        return None;
    }

    if s[run..].starts_with(';') {
        if let Some(&(chars, _)) = NAMED_ENTITIES.get(&s[..run]) {
            return Some((run + 1, chars));
        }
    }

    // Longest legacy name that prefixes the run.
    for len in (1..=run.min(LONGEST_LEGACY)).rev() {
        if let Some(&(chars, true)) = NAMED_ENTITIES.get(&s[..len]) {
            if in_attribute {
                if let Some(&next) = s.as_bytes().get(len) {
                    if next.is_ascii_alphanumeric() || next == b'=' {
                        return None;
                    }
                }
            }
            return Some((len, chars));
        }
    }
    None
}

#[cfg(test)]
mod test {
    use super::{decode_char_refs, stringify};
    use crate::tag::ids;
    use crate::tokenizer::{Attribute, Span, Token, TokenType};

    fn text(s: &str) -> String {
        decode_char_refs(s, false).into_owned()
    }

    fn attr(s: &str) -> String {
        decode_char_refs(s, true).into_owned()
    }

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(decode_char_refs("abc", false), super::Borrowed(_)));
    }

    #[test]
    fn named_references() {
        assert_eq!(text("a&amp;b"), "a&b");
        assert_eq!(text("&lt;&gt;&quot;"), "<>\"");
        assert_eq!(text("&hellip;"), "\u{2026}");
        assert_eq!(text("&copy 2024"), "\u{a9} 2024");
        assert_eq!(text("&notit;"), "\u{ac}it;");
        assert_eq!(text("&notin;"), "\u{2209}");
        assert_eq!(text("&hellip"), "&hellip");
        assert_eq!(text("&bogus;"), "&bogus;");
        assert_eq!(text("& x"), "& x");
        assert_eq!(text("trailing&"), "trailing&");
    }

    #[test]
    fn whole_reference_table() {
        assert_eq!(text("&check;"), "\u{2713}");
        assert_eq!(text("&NotEqualTilde;"), "\u{2242}\u{338}");
        assert_eq!(text("&fjlig;"), "fj");
        assert_eq!(text("&zwnj;&Zopf;&frac34"), "\u{200c}\u{2124}\u{be}");
        assert_eq!(attr("&CounterClockwiseContourIntegral;"), "\u{2233}");
        assert_eq!(text("&check"), "&check");
    }

    #[test]
    fn numeric_references() {
        assert_eq!(text("&#65;&#x42;&#X43"), "ABC");
        assert_eq!(text("&#x80;"), "\u{20ac}");
        assert_eq!(text("&#x81;"), "\u{81}");
        assert_eq!(text("&#0;"), "\u{fffd}");
        assert_eq!(text("&#xD800;"), "\u{fffd}");
        assert_eq!(text("&#x110000;"), "\u{fffd}");
        assert_eq!(text("&#99999999999999;"), "\u{fffd}");
        assert_eq!(text("&#;"), "&#;");
        assert_eq!(text("&#x;"), "&#x;");
    }

    #[test]
    fn attribute_rule_for_legacy_names() {
        assert_eq!(attr("?a=1&amp=2"), "?a=1&amp=2");
        assert_eq!(attr("&copyright"), "&copyright");
        assert_eq!(attr("&copy;right"), "\u{a9}right");
        assert_eq!(attr("&amp x"), "& x");
        assert_eq!(text("&copyright"), "\u{a9}right");
    }

    #[test]
    fn nul_becomes_replacement_character() {
        assert_eq!(text("a\0b"), "a\u{fffd}b");
    }

    #[test]
    fn raw_text_is_not_decoded() {
        let mut token = Token::text(
            TokenType::SCRIPT,
            "a &amp;&& b\0".to_owned(),
            Span::new(0, 12),
            1,
        );
        stringify(&mut token);
        assert_eq!(token.text, "a &amp;&& b\u{fffd}");
        assert!(token.is_done());
    }

    #[test]
    fn whitespace_is_flagged() {
        let mut token = Token::text(TokenType::DATA, " \n\t".to_owned(), Span::new(0, 3), 1);
        stringify(&mut token);
        assert!(token.is_whitespace());

        let mut token = Token::text(TokenType::DATA, "&nbsp;".to_owned(), Span::new(0, 6), 1);
        stringify(&mut token);
        assert_eq!(token.text, "\u{a0}");
        assert!(!token.is_whitespace());
    }

    #[test]
    fn attributes_are_normalized() {
        let attrs = vec![Attribute::new("HREF", "a?b=1&amp;c=2"), Attribute::new("x", "")];
        let mut token = Token::start_tag(ids::a, attrs, Span::new(0, 1), 1);
        stringify(&mut token);
        assert_eq!(&*token.attrs[0].name, "href");
        assert_eq!(token.attrs[0].value, "a?b=1&c=2");
        assert_eq!(&*token.attrs[1].name, "x");
    }

    #[test]
    fn done_tokens_are_left_alone() {
        let mut token = Token::text(TokenType::DATA, "&amp;".to_owned(), Span::new(0, 5), 1);
        token.kind |= TokenType::DONE;
        stringify(&mut token);
        assert_eq!(token.text, "&amp;");
    }

    #[test]
    fn comments_replace_nul() {
        let mut token = Token::comment("a\0&amp;".to_owned(), Span::new(0, 1), 1);
        stringify(&mut token);
        assert_eq!(token.text, "a\u{fffd}&amp;");
    }
}
