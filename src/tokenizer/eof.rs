// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End of input. Each state settles what it has half built, then the
//! text states emit the end-of-file token.

use super::states::State;
use super::{Doctype, Flow, TokenSink, Tokenizer};

use log::trace;

impl<Sink: TokenSink> Tokenizer<Sink> {
    /// One step at end of input. Returns `Flow::Suspend` once the
    /// end-of-file token is out.
    pub(super) fn eof_step(&self) -> Flow {
        let state = self.state.get();
        trace!("processing EOF in state {state:?}");
        match state {
            State::Data
            | State::Rcdata
            | State::Rawtext
            | State::ScriptData
            | State::Plaintext
            | State::ParseErrorStop => self.emit_eof(),

            State::TagName
            | State::BeforeAttributeName
            | State::AttributeName
            | State::AfterAttributeName
            | State::AfterAttributeValueQuoted
            | State::SelfClosingStartTag => {
                self.eof_error();
                self.emit_tag()
            },
            State::BeforeAttributeValue => self.switch_to(State::AttributeValueUnquoted),
            State::AttributeValueDoubleQuoted
            | State::AttributeValueSingleQuoted
            | State::AttributeValueUnquoted => {
                self.eof_error();
                self.end_value(self.cursor.get().end);
                self.emit_tag()
            },

            State::TagOpen => {
                self.eof_error();
                self.emit_char('<');
                self.switch_to(State::Data)
            },
            State::EndTagOpen => {
                self.eof_error();
                self.emit_str("</");
                self.switch_to(State::Data)
            },

            State::RcdataLessThanSign => self.leave_raw("<", State::Rcdata),
            State::RawtextLessThanSign => self.leave_raw("<", State::Rawtext),
            State::ScriptDataLessThanSign => self.leave_raw("<", State::ScriptData),
            State::ScriptDataEscapedLessThanSign => self.leave_raw("<", State::ScriptDataEscaped),
            State::RcdataEndTagOpen => self.leave_raw("</", State::Rcdata),
            State::RawtextEndTagOpen => self.leave_raw("</", State::Rawtext),
            State::ScriptDataEndTagOpen => self.leave_raw("</", State::ScriptData),
            State::ScriptDataEscapedEndTagOpen => self.leave_raw("</", State::ScriptDataEscaped),
            State::RcdataEndTagName => self.leave_end_tag_name(State::Rcdata),
            State::RawtextEndTagName => self.leave_end_tag_name(State::Rawtext),
            State::ScriptDataEndTagName => self.leave_end_tag_name(State::ScriptData),
            State::ScriptDataEscapedEndTagName => {
                self.leave_end_tag_name(State::ScriptDataEscaped)
            },

            State::ScriptDataEscapeStart | State::ScriptDataEscapeStartDash => {
                self.switch_to(State::ScriptData)
            },
            State::ScriptDataEscaped
            | State::ScriptDataEscapedDash
            | State::ScriptDataEscapedDashDash
            | State::ScriptDataDoubleEscaped
            | State::ScriptDataDoubleEscapedDash
            | State::ScriptDataDoubleEscapedDashDash => {
                self.eof_error();
                self.switch_to(State::ScriptData)
            },
            State::ScriptDataDoubleEscapeStart => self.switch_to(State::ScriptDataEscaped),
            State::ScriptDataDoubleEscapedLessThanSign | State::ScriptDataDoubleEscapeEnd => {
                self.switch_to(State::ScriptDataDoubleEscaped)
            },

            State::MarkupDeclarationOpen => {
                self.char_error();
                self.switch_to(State::BogusComment)
            },
            State::BogusComment => self.emit_comment(),
            State::CommentStart
            | State::CommentStartDash
            | State::Comment
            | State::CommentEndDash
            | State::CommentEnd
            | State::CommentEndBang => {
                self.eof_error();
                self.emit_comment()
            },

            State::Doctype | State::BeforeDoctypeName => {
                self.eof_error();
                *self.doctype.borrow_mut() = Doctype::default();
                self.emit_doctype_quirks()
            },
            State::DoctypeName
            | State::AfterDoctypeName
            | State::AfterDoctypePublicKeyword
            | State::BeforeDoctypePublicIdentifier
            | State::DoctypePublicIdentifierDoubleQuoted
            | State::DoctypePublicIdentifierSingleQuoted
            | State::AfterDoctypePublicIdentifier
            | State::BetweenDoctypePublicAndSystemIdentifiers
            | State::AfterDoctypeSystemKeyword
            | State::BeforeDoctypeSystemIdentifier
            | State::DoctypeSystemIdentifierDoubleQuoted
            | State::DoctypeSystemIdentifierSingleQuoted
            | State::AfterDoctypeSystemIdentifier => {
                self.eof_error();
                self.emit_doctype_quirks()
            },
            State::BogusDoctype => self.emit_doctype(),

            State::CdataSection => {
                self.eof_error();
                self.close_cdata();
                self.switch_to(State::Data)
            },
            State::CdataSectionBracket => {
                self.emit_char(']');
                self.switch_to(State::CdataSection)
            },
            State::CdataSectionEnd => {
                self.emit_str("]]");
                self.switch_to(State::CdataSection)
            },
        }
    }

    // A `<` or `</` that never became a tag is text of `text`.
    fn leave_raw(&self, pending: &str, text: State) -> Flow {
        self.emit_str(pending);
        self.switch_to(text)
    }

    fn leave_end_tag_name(&self, text: State) -> Flow {
        self.tag.borrow_mut().clear();
        self.emit_str("</");
        self.emit_temp_buf();
        self.switch_to(text)
    }
}

#[cfg(test)]
mod test {
    use super::super::{BufferQueue, ParseError, Token, TokenSink, TokenSinkResult};
    use super::super::{TokenType, Tokenizer, TokenizerOpts};
    use crate::tag::TagRegistry;
    use crate::tendril::StrTendril;
    use std::cell::RefCell;
    use std::sync::Arc;

    #[derive(Default)]
    struct Sink {
        tokens: RefCell<Vec<Token>>,
        errors: RefCell<Vec<ParseError>>,
    }

    impl TokenSink for Sink {
        fn process_token(&self, token: Token) -> TokenSinkResult {
            self.tokens.borrow_mut().push(token);
            TokenSinkResult::Continue
        }

        fn parse_error(&self, error: ParseError) {
            self.errors.borrow_mut().push(error);
        }
    }

    fn finish(input: &str) -> (Vec<Token>, usize) {
        let tok = Tokenizer::new(
            Sink::default(),
            TokenizerOpts::default(),
            Arc::new(TagRegistry::new()),
        );
        let buffer = BufferQueue::default();
        buffer.push_back(StrTendril::from(input));
        tok.feed(&buffer).unwrap();
        tok.end().unwrap();
        let errors = tok.sink.errors.borrow().len();
        (tok.sink.tokens.take(), errors)
    }

    #[test]
    fn dangling_less_than_is_text() {
        let (tokens, errors) = finish("a<");
        assert_eq!(tokens[0].text, "a<");
        assert!(tokens[1].is_eof());
        assert_eq!(errors, 1);
    }

    #[test]
    fn partial_raw_end_tag_is_text() {
        let (tokens, errors) = finish("<title>x</tit");
        assert_eq!(tokens[1].text, "x</tit");
        assert_eq!(tokens[1].kind, TokenType::RCDATA);
        assert!(tokens[2].is_eof());
        assert_eq!(errors, 0);
    }

    #[test]
    fn unterminated_comment_is_emitted() {
        let (tokens, errors) = finish("<!--abc-");
        assert!(tokens[0].is_comment());
        assert_eq!(tokens[0].text, "abc");
        assert_eq!(errors, 1);
    }

    #[test]
    fn doctype_cut_short_forces_quirks() {
        let (tokens, errors) = finish("<!DOCTYPE hvml PUBLIC \"-//x");
        let doctype = tokens[0].doctype.as_ref().unwrap();
        assert_eq!(doctype.public_id.as_deref(), Some("-//x"));
        assert!(doctype.force_quirks);
        assert_eq!(errors, 1);

        let (tokens, _) = finish("<!DOCTYPE");
        let doctype = tokens[0].doctype.as_ref().unwrap();
        assert_eq!(doctype.name, None);
        assert!(doctype.force_quirks);
    }

    #[test]
    fn unterminated_cdata_runs_to_the_end() {
        let tok = Tokenizer::new(
            ForeignSink::default(),
            TokenizerOpts::default(),
            Arc::new(TagRegistry::new()),
        );
        let buffer = BufferQueue::default();
        buffer.push_back(StrTendril::from("<![CDATA[x]"));
        tok.feed(&buffer).unwrap();
        tok.end().unwrap();
        let tokens = tok.sink.0.tokens.take();
        assert_eq!(tokens[0].text, "x]");
        assert_eq!(tokens[0].kind, TokenType::CDATA);
        assert_eq!(tokens[0].span.end, 11);
    }

    #[derive(Default)]
    struct ForeignSink(Sink);

    impl TokenSink for ForeignSink {
        fn process_token(&self, token: Token) -> TokenSinkResult {
            self.0.process_token(token)
        }

        fn adjusted_current_node_present_but_not_in_primary_namespace(&self) -> bool {
            true
        }
    }
}
