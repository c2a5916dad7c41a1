// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Script data. Inside `<!--`, a nested `<script>` switches to double
//! escaping, where `</script>` only returns to the escaped text.

use super::states::State;
use super::{BufferQueue, Flow, FromSet, NotFromSet, TokenSink, Tokenizer};
use crate::util::smallcharset::SmallCharSet;
use crate::util::str::lower_ascii_letter;

const ESCAPED_STOPS: SmallCharSet = small_char_set!('\r' '\0' '-' '<' '\n');

/// The states of escaped or double escaped script data.
pub(super) struct Escape {
    text: State,
    dash: State,
    dash_dash: State,
    less_than: State,
    double: bool,
}

pub(super) const ESCAPED: Escape = Escape {
    text: State::ScriptDataEscaped,
    dash: State::ScriptDataEscapedDash,
    dash_dash: State::ScriptDataEscapedDashDash,
    less_than: State::ScriptDataEscapedLessThanSign,
    double: false,
};

pub(super) const DOUBLE_ESCAPED: Escape = Escape {
    text: State::ScriptDataDoubleEscaped,
    dash: State::ScriptDataDoubleEscapedDash,
    dash_dash: State::ScriptDataDoubleEscapedDashDash,
    less_than: State::ScriptDataDoubleEscapedLessThanSign,
    double: true,
};

impl<Sink: TokenSink> Tokenizer<Sink> {
    pub(super) fn script_data_less_than_sign(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('/') => {
                self.temp_buf.borrow_mut().clear();
                self.switch_to(State::ScriptDataEndTagOpen)
            },
            Some('!') => {
                self.emit_str("<!");
                self.switch_to(State::ScriptDataEscapeStart)
            },
            Some(_) => {
                self.emit_char('<');
                self.reconsume_in(State::ScriptData)
            },
        }
    }

    pub(super) fn script_data_escape_start(&self, input: &BufferQueue) -> Flow {
        self.escape_start_dash(input, State::ScriptDataEscapeStartDash)
    }

    pub(super) fn script_data_escape_start_dash(&self, input: &BufferQueue) -> Flow {
        self.escape_start_dash(input, State::ScriptDataEscapedDashDash)
    }

    // `<!-` and `<!--`: anything but a dash is plain script data again.
    fn escape_start_dash(&self, input: &BufferQueue, next: State) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => {
                self.emit_char('-');
                self.switch_to(next)
            },
            Some(_) => self.reconsume_in(State::ScriptData),
        }
    }

    pub(super) fn script_escaped(&self, input: &BufferQueue, esc: &Escape) -> Flow {
        loop {
            let Some(run) = self.next_run(input, ESCAPED_STOPS) else {
                return Flow::Suspend;
            };
            match run {
                FromSet('\0') => {
                    self.char_error();
                    self.emit_char('\0');
                },
                FromSet('-') => {
                    self.emit_char('-');
                    return self.switch_to(esc.dash);
                },
                FromSet('<') => return self.escaped_less_than(esc),
                FromSet(c) => self.emit_char(c),
                NotFromSet(text) => self.emit_str(&text),
            }
        }
    }

    pub(super) fn script_escaped_dash(&self, input: &BufferQueue, esc: &Escape) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('-') => {
                self.emit_char('-');
                self.switch_to(esc.dash_dash)
            },
            Some(c) => self.escaped_char(c, esc),
        }
    }

    pub(super) fn script_escaped_dash_dash(&self, input: &BufferQueue, esc: &Escape) -> Flow {
        loop {
            match self.next_char(input) {
                None => return Flow::Suspend,
                Some('-') => self.emit_char('-'),
                Some('>') => {
                    self.emit_char('>');
                    return self.switch_to(State::ScriptData);
                },
                Some(c) => return self.escaped_char(c, esc),
            }
        }
    }

    // What follows one or more dashes, other than another dash.
    fn escaped_char(&self, c: char, esc: &Escape) -> Flow {
        match c {
            '<' => self.escaped_less_than(esc),
            '\0' => {
                self.char_error();
                self.emit_char('\0');
                self.switch_to(esc.text)
            },
            c => {
                self.emit_char(c);
                self.switch_to(esc.text)
            },
        }
    }

    // Only an escaped `<` can start the closing end tag.
    fn escaped_less_than(&self, esc: &Escape) -> Flow {
        if esc.double {
            self.emit_char('<');
        } else {
            self.mark_markup();
        }
        self.switch_to(esc.less_than)
    }

    pub(super) fn script_escaped_less_than_sign(&self, input: &BufferQueue) -> Flow {
        let Some(c) = self.next_char(input) else {
            return Flow::Suspend;
        };
        if c == '/' {
            self.temp_buf.borrow_mut().clear();
            return self.switch_to(State::ScriptDataEscapedEndTagOpen);
        }
        self.emit_char('<');
        match lower_ascii_letter(c) {
            Some(lower) => {
                let mut temp = self.temp_buf.borrow_mut();
                temp.clear();
                temp.push_char(lower);
                drop(temp);
                self.emit_char(c);
                self.switch_to(State::ScriptDataDoubleEscapeStart)
            },
            None => self.reconsume_in(State::ScriptDataEscaped),
        }
    }

    pub(super) fn script_double_escaped_less_than_sign(&self, input: &BufferQueue) -> Flow {
        match self.next_char(input) {
            None => Flow::Suspend,
            Some('/') => {
                self.temp_buf.borrow_mut().clear();
                self.emit_char('/');
                self.switch_to(State::ScriptDataDoubleEscapeEnd)
            },
            Some(_) => self.reconsume_in(State::ScriptDataDoubleEscaped),
        }
    }

    /// A tag name after `<` or `</` in escaped script data. The name
    /// `script` moves to `on_script`, any other name to `otherwise`. The
    /// characters are text either way.
    pub(super) fn script_double_escape_boundary(
        &self,
        input: &BufferQueue,
        on_script: State,
        otherwise: State,
    ) -> Flow {
        loop {
            let Some(c) = self.next_char(input) else {
                return Flow::Suspend;
            };
            if matches!(c, '\t' | '\n' | '\x0C' | ' ' | '/' | '>') {
                let next = if &**self.temp_buf.borrow() == "script" {
                    on_script
                } else {
                    otherwise
                };
                self.emit_char(c);
                return self.switch_to(next);
            }
            match lower_ascii_letter(c) {
                Some(lower) => {
                    self.temp_buf.borrow_mut().push_char(lower);
                    self.emit_char(c);
                },
                // A non-letter ends the name without a match.
                None => return self.reconsume_in(otherwise),
            }
        }
    }
}
