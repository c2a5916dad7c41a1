// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! What the insertion modes consume and produce.

use crate::tag::TagId;
use crate::tendril::StrTendril;
use crate::tokenizer::states::RawKind;
use crate::tokenizer::{Attribute, Span};

/// The insertion modes of tree construction, one handler each.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Mode {
    Initial,
    BeforeHvml,
    BeforeHead,
    InHead,
    InHeadNoscript,
    AfterHead,
    InBody,
    Text,
    InTable,
    InTableText,
    InCaption,
    InColumnGroup,
    InTableBody,
    InRow,
    InCell,
    InSelect,
    InSelectInTable,
    InTemplate,
    AfterBody,
    InFrameset,
    AfterFrameset,
    AfterAfterBody,
    AfterAfterFrameset,
}

impl Mode {
    /// Modes whose `<select>` opens a select inside a table.
    pub fn is_table_part(self) -> bool {
        matches!(
            self,
            Mode::InTable | Mode::InCaption | Mode::InTableBody | Mode::InRow | Mode::InCell
        )
    }
}

/// A start or end tag after stringification.
#[derive(Clone, Debug)]
pub(crate) struct Tag {
    pub id: TagId,
    pub attrs: Vec<Attribute>,
    pub self_closing: bool,
    pub span: Span,
}

impl Tag {
    /// Same tag with the same attributes, in any order.
    pub fn same_as(&self, other: &Tag) -> bool {
        self.id == other.id
            && self.attrs.len() == other.attrs.len()
            && self.attrs.iter().all(|a| {
                other
                    .attrs
                    .iter()
                    .any(|b| a.ns == b.ns && a.name == b.name && a.value == b.value)
            })
    }

    /// A tag the markup implies but never wrote.
    pub fn implied(id: TagId, span: Span) -> Tag {
        Tag {
            id,
            attrs: vec![],
            self_closing: false,
            span,
        }
    }
}

/// A token as the insertion modes see it. Doctypes never get this far.
#[derive(Clone, Debug)]
pub(crate) enum Token {
    Start(Tag),
    End(Tag),
    Text(StrTendril),
    Null,
    Comment(StrTendril),
    Eof,
}

/// The outcome of one insertion mode handler.
pub(crate) enum Step {
    Done,
    /// Done, and the self-closing flag of the start tag was honored.
    Acked,
    /// Hand the token to another mode.
    Again(Mode, Token),
    Plaintext,
    Raw(RawKind),
}

/// Split `text` after its leading ASCII whitespace.
pub(crate) fn split_leading_ws(mut text: StrTendril) -> (StrTendril, StrTendril) {
    let n = text.bytes().take_while(u8::is_ascii_whitespace).count() as u32;
    let ws = text.subtendril(0, n);
    text.pop_front(n);
    (ws, text)
}
