// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tokenizer states.
//!
//! Public so that fragment parsing can pick the initial state from the
//! context element.

use super::interface::TokenType;
use crate::tag::ContentModel;

/// Text content models that end only at an appropriate end tag.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Debug)]
pub enum RawKind {
    Rcdata,
    Rawtext,
    ScriptData,
}

/// Every state of the machine, one handler each.
#[derive(PartialEq, Eq, PartialOrd, Ord, Copy, Clone, Hash, Debug)]
pub enum State {
    Data,
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
    TagOpen,
    EndTagOpen,
    TagName,
    RcdataLessThanSign,
    RcdataEndTagOpen,
    RcdataEndTagName,
    RawtextLessThanSign,
    RawtextEndTagOpen,
    RawtextEndTagName,
    ScriptDataLessThanSign,
    ScriptDataEndTagOpen,
    ScriptDataEndTagName,
    ScriptDataEscapeStart,
    ScriptDataEscapeStartDash,
    ScriptDataEscaped,
    ScriptDataEscapedDash,
    ScriptDataEscapedDashDash,
    ScriptDataEscapedLessThanSign,
    ScriptDataEscapedEndTagOpen,
    ScriptDataEscapedEndTagName,
    ScriptDataDoubleEscapeStart,
    ScriptDataDoubleEscaped,
    ScriptDataDoubleEscapedDash,
    ScriptDataDoubleEscapedDashDash,
    ScriptDataDoubleEscapedLessThanSign,
    ScriptDataDoubleEscapeEnd,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueDoubleQuoted,
    AttributeValueSingleQuoted,
    AttributeValueUnquoted,
    AfterAttributeValueQuoted,
    SelfClosingStartTag,
    BogusComment,
    MarkupDeclarationOpen,
    CommentStart,
    CommentStartDash,
    Comment,
    CommentEndDash,
    CommentEnd,
    CommentEndBang,
    Doctype,
    BeforeDoctypeName,
    DoctypeName,
    AfterDoctypeName,
    AfterDoctypePublicKeyword,
    BeforeDoctypePublicIdentifier,
    DoctypePublicIdentifierDoubleQuoted,
    DoctypePublicIdentifierSingleQuoted,
    AfterDoctypePublicIdentifier,
    BetweenDoctypePublicAndSystemIdentifiers,
    AfterDoctypeSystemKeyword,
    BeforeDoctypeSystemIdentifier,
    DoctypeSystemIdentifierDoubleQuoted,
    DoctypeSystemIdentifierSingleQuoted,
    AfterDoctypeSystemIdentifier,
    BogusDoctype,
    CdataSection,
    CdataSectionBracket,
    CdataSectionEnd,
    /// A fatal error stopped the tokenizer. All further input is dropped.
    ParseErrorStop,
}

impl State {
    /// The kind of text characters get while the machine is in this state.
    pub fn text_kind(self) -> TokenType {
        use self::State::*;
        match self {
            Rcdata | RcdataLessThanSign | RcdataEndTagOpen | RcdataEndTagName => TokenType::RCDATA,
            Rawtext | RawtextLessThanSign | RawtextEndTagOpen | RawtextEndTagName => {
                TokenType::RAWTEXT
            },
            ScriptData
            | ScriptDataLessThanSign
            | ScriptDataEndTagOpen
            | ScriptDataEndTagName
            | ScriptDataEscapeStart
            | ScriptDataEscapeStartDash
            | ScriptDataEscaped
            | ScriptDataEscapedDash
            | ScriptDataEscapedDashDash
            | ScriptDataEscapedLessThanSign
            | ScriptDataEscapedEndTagOpen
            | ScriptDataEscapedEndTagName
            | ScriptDataDoubleEscapeStart
            | ScriptDataDoubleEscaped
            | ScriptDataDoubleEscapedDash
            | ScriptDataDoubleEscapedDashDash
            | ScriptDataDoubleEscapedLessThanSign
            | ScriptDataDoubleEscapeEnd => TokenType::SCRIPT,
            Plaintext => TokenType::PLAINTEXT,
            CdataSection | CdataSectionBracket | CdataSectionEnd => TokenType::CDATA,
            _ => TokenType::DATA,
        }
    }
}

impl From<RawKind> for State {
    fn from(kind: RawKind) -> State {
        match kind {
            RawKind::Rcdata => State::Rcdata,
            RawKind::Rawtext => State::Rawtext,
            RawKind::ScriptData => State::ScriptData,
        }
    }
}

impl From<ContentModel> for State {
    fn from(model: ContentModel) -> State {
        match model {
            ContentModel::Data => State::Data,
            ContentModel::Rcdata => RawKind::Rcdata.into(),
            ContentModel::Rawtext => RawKind::Rawtext.into(),
            ContentModel::ScriptData => RawKind::ScriptData.into(),
            ContentModel::Plaintext => State::Plaintext,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn content_models_pick_their_text_state() {
        assert_eq!(State::from(ContentModel::Rcdata), State::Rcdata);
        assert_eq!(State::from(ContentModel::Plaintext), State::Plaintext);
        assert_eq!(State::from(ContentModel::Data), State::Data);
    }

    #[test]
    fn helper_states_keep_the_text_kind() {
        assert_eq!(State::RcdataEndTagName.text_kind(), TokenType::RCDATA);
        assert_eq!(State::ScriptDataDoubleEscapeEnd.text_kind(), TokenType::SCRIPT);
        assert_eq!(State::CdataSectionEnd.text_kind(), TokenType::CDATA);
        assert_eq!(State::TagOpen.text_kind(), TokenType::DATA);
    }
}
