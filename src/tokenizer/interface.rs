// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::borrow::Cow;

use bitflags::bitflags;
use string_cache::DefaultAtom;

use crate::tag::{ids, Namespace, TagId};
use crate::tokenizer::states;

bitflags! {
    /// What a token is, and what has been done to it.
    ///
    /// Text tokens carry exactly one of the content-model bits (`DATA`,
    /// `RCDATA`, `RAWTEXT`, `SCRIPT`, `PLAINTEXT`, `CDATA`) or `NULL`.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TokenType: u16 {
        const OPEN = 1 << 0;
        const CLOSE = 1 << 1;
        const CLOSE_SELF = 1 << 2;
        const WHITESPACE = 1 << 3;
        const RCDATA = 1 << 4;
        const RAWTEXT = 1 << 5;
        const SCRIPT = 1 << 6;
        const PLAINTEXT = 1 << 7;
        const CDATA = 1 << 8;
        const DATA = 1 << 9;
        const COMMENT = 1 << 10;
        const NULL = 1 << 11;
        /// Set once the text has been stringified.
        const DONE = 1 << 12;

        const TEXT = Self::RCDATA.bits()
            | Self::RAWTEXT.bits()
            | Self::SCRIPT.bits()
            | Self::PLAINTEXT.bits()
            | Self::CDATA.bits()
            | Self::DATA.bits()
            | Self::NULL.bits();
    }
}

/// A half-open byte range `[begin, end)` into the decoded input.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug, Default)]
pub struct Span {
    pub begin: u64,
    pub end: u64,
}

impl Span {
    pub fn new(begin: u64, end: u64) -> Span {
        Span { begin, end }
    }

    pub fn len(&self) -> u64 {
        self.end.saturating_sub(self.begin)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An attribute of a tag token.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Attribute {
    /// The key, in source case until the token is stringified.
    pub name: DefaultAtom,
    /// Set by foreign-content adjustment, e.g. `xlink` for `xlink:href`.
    pub prefix: Option<DefaultAtom>,
    pub ns: Namespace,
    pub value: String,
    pub name_span: Span,
    /// `None` when the attribute has no `=`.
    pub value_span: Option<Span>,
}

impl Attribute {
    pub fn new(name: &str, value: &str) -> Attribute {
        Attribute {
            name: DefaultAtom::from(name),
            prefix: None,
            ns: Namespace::Undef,
            value: value.to_owned(),
            name_span: Span::default(),
            value_span: None,
        }
    }
}

/// A `DOCTYPE` record.
#[derive(PartialEq, Eq, Clone, Debug, Default)]
pub struct Doctype {
    pub name: Option<String>,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
    pub force_quirks: bool,
}

/// A lexical unit of the input.
///
/// `tag` is the element tag for start and end tags, and one of the pseudo
/// tags `_text`, `_comment`, `_doctype` or `_end_of_file` otherwise.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Token {
    pub tag: TagId,
    pub kind: TokenType,
    pub attrs: Vec<Attribute>,
    pub text: String,
    pub doctype: Option<Doctype>,
    pub span: Span,
    /// Line of the first byte of the token, starting at 1.
    pub line: u64,
}

impl Token {
    fn new(tag: TagId, kind: TokenType, span: Span, line: u64) -> Token {
        Token {
            tag,
            kind,
            attrs: vec![],
            text: String::new(),
            doctype: None,
            span,
            line,
        }
    }

    pub fn start_tag(tag: TagId, attrs: Vec<Attribute>, span: Span, line: u64) -> Token {
        Token {
            attrs,
            ..Token::new(tag, TokenType::OPEN, span, line)
        }
    }

    pub fn end_tag(tag: TagId, span: Span, line: u64) -> Token {
        Token::new(tag, TokenType::CLOSE, span, line)
    }

    pub fn text(kind: TokenType, text: String, span: Span, line: u64) -> Token {
        Token {
            text,
            ..Token::new(ids::_text, kind, span, line)
        }
    }

    pub fn comment(text: String, span: Span, line: u64) -> Token {
        Token {
            text,
            ..Token::new(ids::_comment, TokenType::COMMENT, span, line)
        }
    }

    pub fn doctype(doctype: Doctype, span: Span, line: u64) -> Token {
        Token {
            doctype: Some(doctype),
            ..Token::new(ids::_doctype, TokenType::empty(), span, line)
        }
    }

    pub fn eof(position: u64, line: u64) -> Token {
        Token::new(
            ids::_end_of_file,
            TokenType::DONE,
            Span::new(position, position),
            line,
        )
    }

    pub fn is_start_tag(&self) -> bool {
        self.kind.contains(TokenType::OPEN)
    }

    pub fn is_end_tag(&self) -> bool {
        self.kind.contains(TokenType::CLOSE)
    }

    pub fn is_self_closing(&self) -> bool {
        self.kind.contains(TokenType::CLOSE_SELF)
    }

    pub fn is_text(&self) -> bool {
        self.tag == ids::_text
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind.contains(TokenType::WHITESPACE)
    }

    pub fn is_comment(&self) -> bool {
        self.tag == ids::_comment
    }

    pub fn is_doctype(&self) -> bool {
        self.tag == ids::_doctype
    }

    pub fn is_eof(&self) -> bool {
        self.tag == ids::_end_of_file
    }

    pub fn is_done(&self) -> bool {
        self.kind.contains(TokenType::DONE)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.ns == Namespace::Undef && (*a.name).eq_ignore_ascii_case(name))
            .map(|a| &*a.value)
    }
}

/// A recoverable markup error.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ParseError {
    pub message: Cow<'static, str>,
    pub line: u64,
    /// Byte offset in the decoded input.
    pub offset: u64,
}

/// What the tokenizer should do after a start tag.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
#[must_use]
pub enum TokenSinkResult {
    /// Use the content model the tag registry declares for the tag.
    Continue,
    Data,
    Plaintext,
    RawData(states::RawKind),
}

/// Types which can receive tokens from the tokenizer.
pub trait TokenSink {
    /// Process a token.
    fn process_token(&self, token: Token) -> TokenSinkResult;

    /// Markup that was recovered from.
    fn parse_error(&self, _error: ParseError) {}

    // Signal sink that tokenization reached the end.
    fn end(&self) {}

    /// Used in the markup declaration open state. By default, this always
    /// returns false and thus all CDATA sections are tokenized as bogus
    /// comments.
    fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
        false
    }
}
