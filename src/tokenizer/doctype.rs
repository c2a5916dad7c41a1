// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `<!DOCTYPE name PUBLIC "..." "...">` and its damaged forms. A doctype
//! that cannot be read forces quirks mode.

use super::states::State;
use super::{BufferQueue, Doctype, Flow, Token, TokenSink, Tokenizer};

/// Which identifier of the doctype is being read.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum Id {
    Public,
    System,
}

impl Id {
    fn before(self) -> State {
        match self {
            Id::Public => State::BeforeDoctypePublicIdentifier,
            Id::System => State::BeforeDoctypeSystemIdentifier,
        }
    }

    fn quoted(self, quote: char) -> State {
        match (self, quote) {
            (Id::Public, '"') => State::DoctypePublicIdentifierDoubleQuoted,
            (Id::Public, _) => State::DoctypePublicIdentifierSingleQuoted,
            (Id::System, '"') => State::DoctypeSystemIdentifierDoubleQuoted,
            (Id::System, _) => State::DoctypeSystemIdentifierSingleQuoted,
        }
    }

    fn after(self) -> State {
        match self {
            Id::Public => State::AfterDoctypePublicIdentifier,
            Id::System => State::AfterDoctypeSystemIdentifier,
        }
    }

    fn of(self, doctype: &mut Doctype) -> &mut Option<String> {
        match self {
            Id::Public => &mut doctype.public_id,
            Id::System => &mut doctype.system_id,
        }
    }
}

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub(super) fn doctype(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('\t' | '\n' | '\x0C' | ' ') => self.switch_to(State::BeforeDoctypeName),
            Some('>') => self.reconsume_in(State::BeforeDoctypeName),
            Some(_) => {
                self.char_error();
                self.reconsume_in(State::BeforeDoctypeName)
            },
        }
    }

    pub(super) fn before_doctype_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => (),
                '>' => {
                    self.char_error();
                    *self.doctype.borrow_mut() = Doctype::default();
                    return self.emit_doctype_quirks();
                },
                c => {
                    *self.doctype.borrow_mut() = Doctype::default();
                    self.push_doctype_name(c);
                    return self.switch_to(State::DoctypeName);
                },
            }
        }
    }

    pub(super) fn doctype_name(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                '\t' | '\n' | '\x0C' | ' ' => {
                    self.temp_buf.borrow_mut().clear();
                    return self.switch_to(State::AfterDoctypeName);
                },
                '>' => return self.emit_doctype(),
                c => self.push_doctype_name(c),
            }
        }
    }

    /// Looks ahead for the `PUBLIC` or `SYSTEM` keyword, in any case.
    pub(super) fn after_doctype_name(&self, input: &BufferQueue) -> Flow {
        loop {
            for (keyword, next) in [
                ("public", State::AfterDoctypePublicKeyword),
                ("system", State::AfterDoctypeSystemKeyword),
            ] {
                match self.lookahead(input, keyword, true) {
                    None => return Flow::Suspend,
                    Some(true) => return self.switch_to(next),
                    Some(false) => (),
                }
            }

            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('\t' | '\n' | '\x0C' | ' ') => (),
                Some('>') => return self.emit_doctype(),
                Some(_) => return self.bogus_doctype_quirks(),
            }
        }
    }

    pub(super) fn after_doctype_keyword(&self, input: &BufferQueue, id: Id) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('\t' | '\n' | '\x0C' | ' ') => self.switch_to(id.before()),
            Some(quote @ ('"' | '\'')) => {
                self.char_error();
                self.open_identifier(id, quote)
            },
            Some('>') => {
                self.char_error();
                self.emit_doctype_quirks()
            },
            Some(_) => self.bogus_doctype_quirks(),
        }
    }

    pub(super) fn before_doctype_identifier(&self, input: &BufferQueue, id: Id) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('\t' | '\n' | '\x0C' | ' ') => (),
                Some(quote @ ('"' | '\'')) => return self.open_identifier(id, quote),
                Some('>') => {
                    self.char_error();
                    return self.emit_doctype_quirks();
                },
                Some(_) => return self.bogus_doctype_quirks(),
            }
        }
    }

    pub(super) fn doctype_identifier(&self, input: &BufferQueue, id: Id, quote: char) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            match c {
                c if c == quote => return self.switch_to(id.after()),
                '>' => {
                    self.char_error();
                    return self.emit_doctype_quirks();
                },
                '\0' => {
                    self.char_error();
                    self.push_identifier(id, '\u{fffd}');
                },
                c => self.push_identifier(id, c),
            }
        }
    }

    pub(super) fn after_doctype_public_identifier(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('\t' | '\n' | '\x0C' | ' ') => {
                self.switch_to(State::BetweenDoctypePublicAndSystemIdentifiers)
            },
            Some('>') => self.emit_doctype(),
            Some(quote @ ('"' | '\'')) => {
                self.char_error();
                self.open_identifier(Id::System, quote)
            },
            Some(_) => self.bogus_doctype_quirks(),
        }
    }

    pub(super) fn between_doctype_identifiers(&self, input: &BufferQueue) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('\t' | '\n' | '\x0C' | ' ') => (),
                Some('>') => return self.emit_doctype(),
                Some(quote @ ('"' | '\'')) => return self.open_identifier(Id::System, quote),
                Some(_) => return self.bogus_doctype_quirks(),
            }
        }
    }

    pub(super) fn after_doctype_system_identifier(&self, input: &BufferQueue) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('\t' | '\n' | '\x0C' | ' ') => (),
                Some('>') => return self.emit_doctype(),
                // Trailing junk does not affect quirks.
                Some(_) => {
                    self.char_error();
                    return self.reconsume_in(State::BogusDoctype);
                },
            }
        }
    }

    pub(super) fn bogus_doctype(&self, input: &BufferQueue) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('>') => return self.emit_doctype(),
                Some('\0') => self.char_error(),
                Some(_) => (),
            }
        }
    }

    fn push_doctype_name(&self, c: char) {
        let c = if c == '\0' {
            self.char_error();
            '\u{fffd}'
        } else {
            c.to_ascii_lowercase()
        };
        self.doctype
            .borrow_mut()
            .name
            .get_or_insert_with(String::new)
            .push(c);
    }

    /// An identifier starts empty even when the quotes close at once.
    fn open_identifier(&self, id: Id, quote: char) -> Flow {
        *id.of(&mut self.doctype.borrow_mut()) = Some(String::new());
        self.switch_to(id.quoted(quote))
    }

    fn push_identifier(&self, id: Id, c: char) {
        id.of(&mut self.doctype.borrow_mut())
            .get_or_insert_with(String::new)
            .push(c);
    }

    fn bogus_doctype_quirks(&self) -> Flow {
        self.char_error();
        self.doctype.borrow_mut().force_quirks = true;
        self.reconsume_in(State::BogusDoctype)
    }

    pub(super) fn emit_doctype_quirks(&self) -> Flow {
        self.doctype.borrow_mut().force_quirks = true;
        self.emit_doctype()
    }

    pub(super) fn emit_doctype(&self) -> Flow {
        let (span, line) = self.claim_markup();
        let doctype = self.doctype.take();
        self.emit(Token::doctype(doctype, span, line));
        self.switch_to(State::Data)
    }
}
