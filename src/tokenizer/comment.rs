// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `<!` markup: comments, bogus comments, and the choice between them,
//! doctypes and CDATA sections.

use std::mem;

use super::states::State;
use super::{BufferQueue, Flow, FromSet, NotFromSet, Token, TokenSink, Tokenizer};
use crate::util::smallcharset::SmallCharSet;

const COMMENT_STOPS: SmallCharSet = small_char_set!('\r' '\0' '-' '\n');
const BOGUS_COMMENT_STOPS: SmallCharSet = small_char_set!('\r' '\0' '>' '\n');

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub(super) fn markup_declaration_open(&self, input: &BufferQueue) -> Flow {
        match self.lookahead(input, "--", false) {
            None => return Flow::Suspend,
            Some(true) => {
                self.comment.borrow_mut().clear();
                return self.switch_to(State::CommentStart);
            },
            Some(false) => (),
        }

        match self.lookahead(input, "doctype", true) {
            None => return Flow::Suspend,
            Some(true) => return self.switch_to(State::Doctype),
            Some(false) => (),
        }

        // CDATA sections exist only in foreign content.
        if self
            .sink
            .adjusted_current_node_present_but_not_in_primary_namespace()
        {
            match self.lookahead(input, "[CDATA[", false) {
                None => return Flow::Suspend,
                Some(true) => {
                    // The section's text token spans from its `<`.
                    self.flush_text(self.markup.get());
                    return self.switch_to(State::CdataSection);
                },
                Some(false) => (),
            }
        }

        self.char_error();
        self.comment.borrow_mut().clear();
        self.switch_to(State::BogusComment)
    }

    pub(super) fn comment_start(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => self.switch_to(State::CommentStartDash),
            Some('>') => {
                self.char_error();
                self.emit_comment()
            },
            Some(c) => self.comment_char("", c),
        }
    }

    pub(super) fn comment_start_dash(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => self.switch_to(State::CommentEnd),
            Some('>') => {
                self.char_error();
                self.emit_comment()
            },
            Some(c) => self.comment_char("-", c),
        }
    }

    pub(super) fn comment(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(run) = self.next_run(input, COMMENT_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet('-') => return self.switch_to(State::CommentEndDash),
                FromSet('\0') => {
                    self.char_error();
                    self.comment.borrow_mut().push('\0');
                },
                FromSet(c) => self.comment.borrow_mut().push(c),
                NotFromSet(text) => self.comment.borrow_mut().push_str(&text),
            }
        }
    }

    pub(super) fn comment_end_dash(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => self.switch_to(State::CommentEnd),
            Some(c) => self.comment_char("-", c),
        }
    }

    pub(super) fn comment_end(&self, input: &BufferQueue) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('>') => return self.emit_comment(),
                Some('!') => return self.switch_to(State::CommentEndBang),
                // `--->` ends the comment with a dash in it.
                Some('-') => self.comment.borrow_mut().push('-'),
                Some(_) => {
                    self.comment.borrow_mut().push_str("--");
                    return self.reconsume_in(State::Comment);
                },
            }
        }
    }

    pub(super) fn comment_end_bang(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => {
                self.comment.borrow_mut().push_str("--!");
                self.switch_to(State::CommentEndDash)
            },
            Some('>') => {
                self.char_error();
                self.emit_comment()
            },
            Some(c) => self.comment_char("--!", c),
        }
    }

    pub(super) fn bogus_comment(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(run) = self.next_run(input, BOGUS_COMMENT_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet('>') => return self.emit_comment(),
                FromSet('\0') => {
                    self.char_error();
                    self.comment.borrow_mut().push('\0');
                },
                FromSet(c) => self.comment.borrow_mut().push(c),
                NotFromSet(text) => self.comment.borrow_mut().push_str(&text),
            }
        }
    }

    /// Append `pending` dashes and `c` to the comment and go on scanning
    /// its body. NUL is kept but reported.
    fn comment_char(&self, pending: &str, c: char) -> Flow {
        if c == '\0' {
            self.char_error();
        }
        let mut comment = self.comment.borrow_mut();
        comment.push_str(pending);
        comment.push(c);
        drop(comment);
        self.switch_to(State::Comment)
    }

    pub(super) fn emit_comment(&self) -> Flow {
        let (span, line) = self.claim_markup();
        let text = mem::take(&mut *self.comment.borrow_mut());
        self.emit(Token::comment(text, span, line));
        self.switch_to(State::Data)
    }
}
