// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Start and end tags with their attributes.

use std::borrow::Cow::Borrowed;
use std::mem;

use string_cache::DefaultAtom;

use super::states::State;
use super::{Attribute, BufferQueue, Flow, FromSet, NotFromSet, Span, Token, TokenType};
use super::{TokenSink, TokenSinkResult, Tokenizer};
use crate::tag::Namespace;
use crate::util::smallcharset::SmallCharSet;
use crate::util::str::lower_ascii_letter;

const DOUBLE_QUOTED_STOPS: SmallCharSet = small_char_set!('\r' '"' '\0' '\n');
const SINGLE_QUOTED_STOPS: SmallCharSet = small_char_set!('\r' '\'' '\0' '\n');
const UNQUOTED_STOPS: SmallCharSet = small_char_set!('\r' '\t' '\n' '\x0C' ' ' '>' '\0');

#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub(super) enum TagKind {
    #[default]
    Start,
    End,
}

/// The attribute being scanned.
#[derive(Default)]
struct AttrBuilder {
    name: String,
    value: String,
    name_span: Span,
    /// Set at the `=`.
    value_span: Option<Span>,
}

/// The tag being scanned.
#[derive(Default)]
pub(super) struct TagBuilder {
    pub kind: TagKind,
    /// Lowercased.
    pub name: String,
    pub self_closing: bool,
    attrs: Vec<Attribute>,
    attr: AttrBuilder,
}

impl TagBuilder {
    pub fn start(&mut self, kind: TagKind, first: char) {
        *self = TagBuilder {
            kind,
            ..TagBuilder::default()
        };
        self.name.push(first);
    }

    pub fn clear(&mut self) {
        *self = TagBuilder::default();
    }

    pub fn push_name(&mut self, c: char) {
        self.name.push(c);
    }

    fn start_attr(&mut self, first: char, span: Span) {
        self.attr = AttrBuilder {
            name: first.to_string(),
            name_span: span,
            ..AttrBuilder::default()
        };
    }

    /// Move the attribute being scanned into the list. Returns false when
    /// it repeats an earlier name, in which case it is dropped.
    ///
    /// Names keep their source case until stringified, so duplicates
    /// compare case-insensitively.
    fn finish_attr(&mut self) -> bool {
        let attr = mem::take(&mut self.attr);
        if attr.name.is_empty() {
            return true;
        }
        if self
            .attrs
            .iter()
            .any(|a| (*a.name).eq_ignore_ascii_case(&attr.name))
        {
            return false;
        }
        self.attrs.push(Attribute {
            name: DefaultAtom::from(attr.name),
            prefix: None,
            // Foreign content adjusts namespaces in the tree builder.
            ns: Namespace::Undef,
            value: attr.value,
            name_span: attr.name_span,
            value_span: attr.value_span,
        });
        true
    }
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub(super) fn tag_open(&self, input: &BufferQueue) -> Flow {
        let Some(c) = self.next_char(input) else {
            return Flow::Suspend;
        };
        match c {
            '!' => {
                self.temp_buf.borrow_mut().clear();
                self.switch_to(State::MarkupDeclarationOpen)
            },
            '/' => self.switch_to(State::EndTagOpen),
            '?' => {
                self.char_error();
                self.comment.borrow_mut().clear();
                self.reconsume_in(State::BogusComment)
            },
            c => match lower_ascii_letter(c) {
                Some(lower) => {
                    self.tag.borrow_mut().start(TagKind::Start, lower);
                    self.switch_to(State::TagName)
                },
                None => {
                    self.char_error();
                    self.emit_char('<');
                    self.reconsume_in(State::Data)
                },
            },
        }
    }

    pub(super) fn end_tag_open(&self, input: &BufferQueue) -> Flow {
        let Some(c) = self.next_char(input) else {
            return Flow::Suspend;
        };
        if c == '>' {
            // `</>` is dropped.
            self.char_error();
            let _ = self.claim_markup();
            return self.switch_to(State::Data);
        }
        match lower_ascii_letter(c) {
            Some(lower) => {
                self.tag.borrow_mut().start(TagKind::End, lower);
                self.switch_to(State::TagName)
            },
            None => {
                self.char_error();
                self.comment.borrow_mut().clear();
                self.reconsume_in(State::BogusComment)
            },
        }
    }

    pub(super) fn tag_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => return self.switch_to(State::BeforeAttributeName),
                '/' => return self.switch_to(State::SelfClosingStartTag),
                '>' => return self.emit_tag(),
                '\0' => {
                    self.char_error();
                    self.tag.borrow_mut().push_name('\u{fffd}');
                },
                c => self.tag.borrow_mut().push_name(c.to_ascii_lowercase()),
            }
        }
    }

    pub(super) fn before_attribute_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => (),
                '/' => return self.switch_to(State::SelfClosingStartTag),
                '>' => return self.emit_tag(),
                c => return self.new_attribute(c, &['"', '\'', '<', '=']),
            }
        }
    }

    pub(super) fn attribute_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => return self.switch_to(State::AfterAttributeName),
                '/' => return self.switch_to(State::SelfClosingStartTag),
                '=' => return self.saw_equals(),
                '>' => return self.emit_tag(),
                '\0' => {
                    self.char_error();
                    self.push_attr_name('\u{fffd}');
                },
                c => {
                    if matches!(c, '"' | '\'' | '<') {
                        self.char_error();
                    }
                    self.push_attr_name(c);
                },
            }
        }
    }

    pub(super) fn after_attribute_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => (),
                '/' => return self.switch_to(State::SelfClosingStartTag),
                '=' => return self.saw_equals(),
                '>' => return self.emit_tag(),
                c => return self.new_attribute(c, &['"', '\'', '<']),
            }
        }
    }

    /// Peeks, so that the first character of an unquoted value is scanned
    /// with the rest of the run.
    pub(super) fn before_attribute_value(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.peek_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\r' | '\x0C' | ' ' => self.skip_char(input),
                '"' | '\'' => {
                    self.skip_char(input);
                    self.begin_value(input.position());
                    return self.switch_to(if c == '"' {
                        State::AttributeValueDoubleQuoted
                    } else {
                        State::AttributeValueSingleQuoted
                    });
                },
                '>' => {
                    self.skip_char(input);
                    self.char_error();
                    return self.emit_tag();
                },
                _ => {
                    self.begin_value(input.position());
                    return self.switch_to(State::AttributeValueUnquoted);
                },
            }
        }
    }

    pub(super) fn attribute_value_quoted(&self, input: &BufferQueue, quote: char) -> Flow {
        let stops = if quote == '"' {
            DOUBLE_QUOTED_STOPS
        } else {
            SINGLE_QUOTED_STOPS
        };
        loop {
            let Some(run) = self.next_run(input, stops) else {
                return Flow::Suspend;
            };
            match run {
                FromSet(c) if c == quote => {
                    self.end_value(self.cursor.get().begin);
                    return self.switch_to(State::AfterAttributeValueQuoted);
                },
                FromSet('\0') => {
                    self.char_error();
                    self.tag.borrow_mut().attr.value.push('\0');
                },
                FromSet(c) => self.tag.borrow_mut().attr.value.push(c),
                NotFromSet(text) => self.tag.borrow_mut().attr.value.push_str(&text),
            }
        }
    }

    pub(super) fn attribute_value_unquoted(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(run) = self.next_run(input, UNQUOTED_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet('\t' | '\n' | '\x0C' | ' ') => {
                    self.end_value(self.cursor.get().begin);
                    return self.switch_to(State::BeforeAttributeName);
                },
                FromSet('>') => {
                    self.end_value(self.cursor.get().begin);
                    return self.emit_tag();
                },
                FromSet('\0') => {
                    self.char_error();
                    self.tag.borrow_mut().attr.value.push('\0');
                },
                FromSet(c) => {
                    if matches!(c, '"' | '\'' | '<' | '=' | '`') {
                        self.char_error();
                    }
                    self.tag.borrow_mut().attr.value.push(c);
                },
                NotFromSet(text) => self.tag.borrow_mut().attr.value.push_str(&text),
            }
        }
    }

    pub(super) fn after_attribute_value_quoted(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('\t' | '\n' | '\x0C' | ' ') => self.switch_to(State::BeforeAttributeName),
            Some('/') => self.switch_to(State::SelfClosingStartTag),
            Some('>') => self.emit_tag(),
            Some(_) => {
                self.char_error();
                self.reconsume_in(State::BeforeAttributeName)
            },
        }
    }

    pub(super) fn self_closing_start_tag(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('>') => {
                self.tag.borrow_mut().self_closing = true;
                self.emit_tag()
            },
            Some(_) => {
                self.char_error();
                self.reconsume_in(State::BeforeAttributeName)
            },
        }
    }

    /// Start an attribute whose name begins with `c`. `suspicious`
    /// characters are kept but reported.
    fn new_attribute(&self, c: char, suspicious: &[char]) -> Flow {
        let c = if c == '\0' {
            self.char_error();
            '\u{fffd}'
        } else {
            if suspicious.contains(&c) {
                self.char_error();
            }
            c
        };
        self.finish_attribute();
        let cursor = self.cursor.get();
        self.tag
            .borrow_mut()
            .start_attr(c, Span::new(cursor.begin, cursor.end));
        self.switch_to(State::AttributeName)
    }

    fn push_attr_name(&self, c: char) {
        let end = self.cursor.get().end;
        let mut tag = self.tag.borrow_mut();
        tag.attr.name.push(c);
        tag.attr.name_span.end = end;
    }

    // The value is empty until a value state starts.
    fn saw_equals(&self) -> Flow {
        self.begin_value(self.cursor.get().end);
        self.switch_to(State::BeforeAttributeValue)
    }

    fn begin_value(&self, at: u64) {
        self.tag.borrow_mut().attr.value_span = Some(Span::new(at, at));
    }

    pub(super) fn end_value(&self, at: u64) {
        if let Some(span) = self.tag.borrow_mut().attr.value_span.as_mut() {
            span.end = at.max(span.begin);
        }
    }

    fn finish_attribute(&self) {
        let kept = self.tag.borrow_mut().finish_attr();
        if !kept {
            self.error(Borrowed("Duplicate attribute"));
        }
    }

    pub(super) fn is_appropriate_end_tag(&self) -> bool {
        let tag = self.tag.borrow();
        match *self.last_start_tag.borrow() {
            Some(ref last) => tag.kind == TagKind::End && tag.name == *last,
            None => false,
        }
    }

    /// Send the tag, then switch to the content model the tag registry
    /// declares for it unless the sink picks another.
    pub(super) fn emit_tag(&self) -> Flow {
        self.finish_attribute();

        let (kind, name, self_closing, attrs) = {
            let mut tag = self.tag.borrow_mut();
            (
                tag.kind,
                mem::take(&mut tag.name),
                mem::replace(&mut tag.self_closing, false),
                mem::take(&mut tag.attrs),
            )
        };
        let id = match self.registry.add(&name) {
            Ok(id) => id,
            Err(e) => {
                self.stop(e);
                return Flow::Continue;
            },
        };

        if kind == TagKind::End {
            if !attrs.is_empty() {
                self.error(Borrowed("Attributes on an end tag"));
            }
            if self_closing {
                self.error(Borrowed("Self-closing end tag"));
            }
        }

        let (span, line) = self.claim_markup();
        let token = match kind {
            TagKind::Start => {
                *self.last_start_tag.borrow_mut() = Some(name);
                let mut token = Token::start_tag(id, attrs, span, line);
                if self_closing {
                    token.kind |= TokenType::CLOSE_SELF;
                }
                token
            },
            TagKind::End => Token {
                attrs,
                ..Token::end_tag(id, span, line)
            },
        };

        let next = match self.send(token) {
            TokenSinkResult::Continue if kind == TagKind::Start => id.content_model().into(),
            TokenSinkResult::Continue | TokenSinkResult::Data => State::Data,
            TokenSinkResult::Plaintext => State::Plaintext,
            TokenSinkResult::RawData(raw) => raw.into(),
        };
        self.switch_to(next)
    }
}

#[cfg(test)]
mod test {
    use super::{TagBuilder, TagKind};
    use crate::tokenizer::Span;

    #[test]
    fn duplicate_attribute_is_dropped() {
        let mut tag = TagBuilder::default();
        tag.start(TagKind::Start, 'p');
        tag.start_attr('a', Span::new(3, 4));
        tag.attr.value.push('1');
        assert!(tag.finish_attr());
        tag.start_attr('A', Span::new(7, 8));
        tag.attr.value.push('2');
        assert!(!tag.finish_attr());
        assert_eq!(tag.attrs.len(), 1);
        assert_eq!(tag.attrs[0].value, "1");
        assert_eq!(tag.attrs[0].name_span, Span::new(3, 4));
    }

    #[test]
    fn finishing_without_an_attribute_keeps_the_list() {
        let mut tag = TagBuilder::default();
        tag.start(TagKind::End, 'b');
        assert!(tag.finish_attr());
        assert!(tag.attrs.is_empty());
        assert_eq!(tag.name, "b");
        assert_eq!(tag.kind, TagKind::End);
    }

    #[test]
    fn starting_a_tag_forgets_the_last_one() {
        let mut tag = TagBuilder::default();
        tag.start(TagKind::Start, 'a');
        tag.self_closing = true;
        tag.start_attr('x', Span::default());
        tag.start(TagKind::End, 'b');
        assert!(!tag.self_closing);
        assert!(tag.finish_attr());
        assert!(tag.attrs.is_empty());
    }
}
