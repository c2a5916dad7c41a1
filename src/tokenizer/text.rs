// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Text content: data, RCDATA, RAWTEXT, PLAINTEXT and CDATA sections, and
//! the end tags that close raw text.

use super::states::State;
use super::tag::TagKind;
use super::{BufferQueue, Flow, FromSet, Mark, NotFromSet, TokenSink, Tokenizer};
use crate::util::smallcharset::SmallCharSet;
use crate::util::str::lower_ascii_letter;

const MARKUP_STOPS: SmallCharSet = small_char_set!('\r' '\0' '<' '\n');
const LINE_STOPS: SmallCharSet = small_char_set!('\r' '\0' '\n');
const CDATA_STOPS: SmallCharSet = small_char_set!('\r' '\0' ']' '\n');

/// A raw text state and the states that recognize its end tag.
pub(super) struct RawText {
    pub text: State,
    pub end_tag_open: State,
    pub end_tag_name: State,
}

pub(super) const RCDATA: RawText = RawText {
    text: State::Rcdata,
    end_tag_open: State::RcdataEndTagOpen,
    end_tag_name: State::RcdataEndTagName,
};

pub(super) const RAWTEXT: RawText = RawText {
    text: State::Rawtext,
    end_tag_open: State::RawtextEndTagOpen,
    end_tag_name: State::RawtextEndTagName,
};

pub(super) const SCRIPT_DATA: RawText = RawText {
    text: State::ScriptData,
    end_tag_open: State::ScriptDataEndTagOpen,
    end_tag_name: State::ScriptDataEndTagName,
};

pub(super) const SCRIPT_DATA_ESCAPED: RawText = RawText {
    text: State::ScriptDataEscaped,
    end_tag_open: State::ScriptDataEscapedEndTagOpen,
    end_tag_name: State::ScriptDataEscapedEndTagName,
};

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub(super) fn data(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(run) = self.next_run(input, MARKUP_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet('\0') => {
                    self.char_error();
                    self.emit_null();
                },
                FromSet('<') => {
                    self.mark_markup();
                    return self.switch_to(State::TagOpen);
                },
                FromSet(c) => self.emit_char(c),
                NotFromSet(text) => self.emit_str(&text),
            }
        }
    }

    /// RCDATA, RAWTEXT, script data and, without a `less_than` state,
    /// PLAINTEXT. NUL stays in the text.
    pub(super) fn raw_text(&self, input: &BufferQueue, less_than: Option<State>) -> Flow {
        let stops = if less_than.is_some() {
            MARKUP_STOPS
        } else {
            LINE_STOPS
        };
        loop {
            let Some(run) = self.next_run(input, stops) else {
                return Flow::Suspend;
            };
            match (run, less_than) {
                (FromSet('\0'), _) => {
                    self.char_error();
                    self.emit_char('\0');
                },
                (FromSet('<'), Some(next)) => {
                    self.mark_markup();
                    return self.switch_to(next);
                },
                (FromSet(c), _) => self.emit_char(c),
                (NotFromSet(text), _) => self.emit_str(&text),
            }
        }
    }

    pub(super) fn raw_less_than_sign(&self, input: &BufferQueue, raw: &RawText) -> Flow {
        let Some(c) = self.next_char(input) else {
            return Flow::Suspend;
        };
        if c == '/' {
            self.temp_buf.borrow_mut().clear();
            return self.switch_to(raw.end_tag_open);
        }
        self.emit_char('<');
        self.reconsume_in(raw.text)
    }

    pub(super) fn raw_end_tag_open(&self, input: &BufferQueue, raw: &RawText) -> Flow {
        let Some(c) = self.next_char(input) else {
            return Flow::Suspend;
        };
        match lower_ascii_letter(c) {
            Some(lower) => {
                self.tag.borrow_mut().start(TagKind::End, lower);
                self.temp_buf.borrow_mut().push_char(c);
                self.switch_to(raw.end_tag_name)
            },
            None => {
                self.emit_str("</");
                self.reconsume_in(raw.text)
            },
        }
    }

    /// The candidate closes the raw text only when it names the element
    /// that opened it. Otherwise its characters are text.
    pub(super) fn raw_end_tag_name(&self, input: &BufferQueue, raw: &RawText) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            let ends_name = matches!(c, '\t' | '\n' | '\x0C' | ' ' | '/' | '>');
            if ends_name && self.is_appropriate_end_tag() {
                self.temp_buf.borrow_mut().clear();
                return match c {
                    '/' => self.switch_to(State::SelfClosingStartTag),
                    '>' => self.emit_tag(),
                    _ => self.switch_to(State::BeforeAttributeName),
                };
            }

            let Some(lower) = lower_ascii_letter(c) else {
                self.tag.borrow_mut().clear();
                self.emit_str("</");
                self.emit_temp_buf();
                return self.reconsume_in(raw.text);
            };
            self.tag.borrow_mut().push_name(lower);
            self.temp_buf.borrow_mut().push_char(c);
        }
    }

    pub(super) fn emit_temp_buf(&self) {
        let buf = std::mem::take(&mut *self.temp_buf.borrow_mut());
        self.emit_str(&buf);
    }

    pub(super) fn cdata_section(&self, input: &BufferQueue) -> Flow {
        loop {
            let Some(run) = self.next_run(input, CDATA_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet(']') => return self.switch_to(State::CdataSectionBracket),
                FromSet('\0') => {
                    self.char_error();
                    self.emit_char('\0');
                },
                FromSet(c) => self.emit_char(c),
                NotFromSet(text) => self.emit_str(&text),
            }
        }
    }

    pub(super) fn cdata_section_bracket(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some(']') => self.switch_to(State::CdataSectionEnd),
            Some(_) => {
                self.emit_char(']');
                self.reconsume_in(State::CdataSection)
            },
        }
    }

    pub(super) fn cdata_section_end(&self, input: &BufferQueue) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some(']') => self.emit_char(']'),
                Some('>') => {
                    self.close_cdata();
                    return self.switch_to(State::Data);
                },
                Some(_) => {
                    self.emit_str("]]");
                    return self.reconsume_in(State::CdataSection);
                },
            }
        }
    }

    /// The section's text token runs through the `]]>`.
    pub(super) fn close_cdata(&self) {
        let cursor = self.cursor.get();
        self.flush_text(Mark {
            offset: cursor.end,
            line: cursor.line,
        });
    }
}
