// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::cell::RefCell;

use purc_hvml::stringify::stringify;
use purc_hvml::tag::ids;
use purc_hvml::tendril::StrTendril;
use purc_hvml::tokenizer::{
    BufferQueue, ParseError, Token, TokenSink, TokenSinkResult, TokenType, Tokenizer,
    TokenizerOpts,
};
use purc_hvml::TagRegistry;

// Records every token, taking content models from the tag registry.
#[derive(Default)]
struct TokenLogger {
    tokens: RefCell<Vec<Token>>,
    errors: RefCell<Vec<ParseError>>,
}

impl TokenSink for TokenLogger {
    fn process_token(&self, token: Token) -> TokenSinkResult {
        self.tokens.borrow_mut().push(token);
        TokenSinkResult::Continue
    }

    fn parse_error(&self, error: ParseError) {
        self.errors.borrow_mut().push(error);
    }
}

fn tokenize_with(chunks: &[&str], opts: TokenizerOpts) -> (Vec<Token>, Vec<ParseError>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let tok = Tokenizer::new(TokenLogger::default(), opts, TagRegistry::shared());
    let buffer = BufferQueue::new();
    for chunk in chunks {
        buffer.push_back(StrTendril::from_slice(chunk));
        tok.feed(&buffer).unwrap();
    }
    tok.end().unwrap();
    (tok.sink.tokens.take(), tok.sink.errors.take())
}

fn tokenize(input: &str) -> Vec<Token> {
    tokenize_with(&[input], TokenizerOpts::default()).0
}

#[test]
fn comments() {
    let cases = [
        ("<!--x-->", "x"),
        ("<!---->", ""),
        ("<!-- a -- b -->", " a -- b "),
        ("<?pi x?>", "?pi x?"),
        ("<!x>", "x"),
    ];
    for (input, text) in cases {
        let tokens = tokenize(input);
        assert!(tokens[0].is_comment(), "{input:?}");
        assert_eq!(tokens[0].text, text, "{input:?}");
        assert!(tokens[1].is_eof());
    }
}

#[test]
fn doctypes() {
    let tokens = tokenize("<!DOCTYPE HVML PUBLIC \"-//A//B\" 'sys'>");
    let doctype = tokens[0].doctype.as_ref().unwrap();
    assert_eq!(doctype.name.as_deref(), Some("hvml"));
    assert_eq!(doctype.public_id.as_deref(), Some("-//A//B"));
    assert_eq!(doctype.system_id.as_deref(), Some("sys"));
    assert!(!doctype.force_quirks);

    let tokens = tokenize("<!doctype>");
    let doctype = tokens[0].doctype.as_ref().unwrap();
    assert_eq!(doctype.name, None);
    assert!(doctype.force_quirks);
}

#[test]
fn attribute_quoting() {
    let tokens = tokenize("<p a=\"1\" b='2' c=3 d>");
    let values: Vec<(&str, &str)> = tokens[0]
        .attrs
        .iter()
        .map(|a| (&*a.name, &*a.value))
        .collect();
    assert_eq!(values, vec![("a", "1"), ("b", "2"), ("c", "3"), ("d", "")]);
}

#[test]
fn self_closing_flag() {
    let tokens = tokenize("<br/><p>");
    assert!(tokens[0].is_self_closing());
    assert!(!tokens[1].is_self_closing());
}

#[test]
fn script_data_escapes() {
    let tokens = tokenize("<script><!--<script>x</script>--></script>");
    assert_eq!(tokens[0].tag, ids::script);
    assert_eq!(tokens[1].text, "<!--<script>x</script>-->");
    assert!(tokens[1].kind.contains(TokenType::SCRIPT));
    assert_eq!(tokens[2].tag, ids::script);
    assert!(tokens[2].is_end_tag());
}

#[test]
fn plaintext_never_ends() {
    let tokens = tokenize("<plaintext>a</plaintext>");
    assert_eq!(tokens[1].text, "a</plaintext>");
    assert_eq!(tokens[1].kind, TokenType::PLAINTEXT);
    assert!(tokens[2].is_eof());
}

#[test]
fn lines_are_counted() {
    let tokens = tokenize("a\nb\n<p>\r\n</p>");
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].tag, ids::p);
    assert_eq!(tokens[1].line, 3);
    assert_eq!(tokens[3].line, 4);
}

#[test]
fn exact_errors_are_descriptive() {
    let opts = TokenizerOpts {
        exact_errors: true,
        ..TokenizerOpts::default()
    };
    let (_, errors) = tokenize_with(&["<p a=1 a=2>"], opts);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line, 1);
}

#[test]
fn chunking_does_not_change_tokens() {
    let input = "<!DOCTYPE hvml><hvml>\r\n<init as=\"x\">&amp;caf\u{e9}</init><!--c--></hvml>";
    let whole = tokenize(input);
    let chars: Vec<String> = input.chars().map(String::from).collect();
    let pieces: Vec<&str> = chars.iter().map(|s| s.as_str()).collect();
    let (split, _) = tokenize_with(&pieces, TokenizerOpts::default());
    assert_eq!(split, whole);
}

#[test]
fn stringified_token_stream() {
    let mut tokens = tokenize("<p TITLE=\"&lt;\">&amp; x</p>");
    for token in tokens.iter_mut() {
        stringify(token);
        assert!(token.is_done());
    }
    assert_eq!(&*tokens[0].attrs[0].name, "title");
    assert_eq!(tokens[0].attrs[0].value, "<");
    assert_eq!(tokens[1].text, "& x");
    assert!(!tokens[1].is_whitespace());
}
