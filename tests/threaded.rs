// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod util;

use std::cell::RefCell;
use std::rc::Rc;

use purc_hvml::threaded::{ThreadedOpts, ThreadedParser};
use purc_hvml::tokenizer::Token;
use purc_hvml::{Callbacks, Error, ParseOpts};

use util::{init_logging, parse, serialize, DOCUMENTS as SHARED};

const DOCUMENTS: &[&str] = &[
    "<a><b>text</b></a>",
    "<!DOCTYPE hvml><hvml target=\"html\"><head><title>t &amp; u</title></head>\
     <body><init as=\"users\">[1, 2]</init><iterate on=\"$users\"><p>$?</p></iterate></body></hvml>",
    "<b>1<i>2</b>3</i><table>x<tr><td>y</td></tr></table>",
    "<p>caf\u{e9} &lt;<style>a<b></style><script>if (a < b) {}</script><textarea>&amp;</textarea>",
    "<svg><style>a<g></g></style><![CDATA[c<d]]></svg><math><mi>x</mi></math><style><b></style>",
    "<ul><li>1<li>2</ul><select><option>a<option>b</select><!-- done --><di",
];

fn parse_threaded(input: &str, chunk: usize, workers: usize) -> purc_hvml::dom::Document {
    init_logging();
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts { workers },
        Callbacks::default(),
    );
    for piece in input.as_bytes().chunks(chunk) {
        parser.chunk(piece).unwrap();
    }
    parser.finish().unwrap()
}

#[test]
fn same_tree_as_single_threaded() {
    for input in DOCUMENTS {
        let expected = parse(input);
        for &(chunk, workers) in &[(usize::MAX, 1), (7, 2), (1, 4)] {
            let chunk = chunk.min(input.len().max(1));
            let doc = parse_threaded(input, chunk, workers);
            assert_eq!(
                serialize(&doc),
                serialize(&expected),
                "{input:?} in chunks of {chunk} with {workers} workers"
            );
            assert_eq!(*doc.errors(), *expected.errors());
        }
    }
}

#[test]
fn shared_documents_match_at_every_chunk_size() {
    for input in SHARED {
        let expected = parse(input);
        for chunk in [1, 2, 3, 5, 8, input.len().max(1)] {
            for workers in [1, 3] {
                let doc = parse_threaded(input, chunk, workers);
                assert_eq!(
                    serialize(&doc),
                    serialize(&expected),
                    "{input:?} in chunks of {chunk} with {workers} workers"
                );
            }
        }
    }
}

#[test]
fn raw_text_inside_integration_points() {
    let cases = [
        ("<svg><foreignObject><style>a<b>x</b></style>", "a<b>x</b>"),
        ("<svg><p><style><b>x</b></style>", "<b>x</b>"),
        ("<math><mi><textarea><b>x</b></textarea>", "<b>x</b>"),
    ];
    for (input, text) in cases {
        let doc = parse_threaded(input, 5, 3);
        let dump = serialize(&doc);
        assert!(dump.contains(&format!("\"{text}\"")), "{input:?}:\n{dump}");
        assert_eq!(dump, serialize(&parse(input)), "{input:?}");
    }
}

#[test]
fn tokens_reach_callbacks_in_order() {
    let input = DOCUMENTS[1];
    let record = |into: Rc<RefCell<Vec<Token>>>| Callbacks {
        after_token: Some(Box::new(move |t: &Token| into.borrow_mut().push(t.clone()))),
        ..Callbacks::default()
    };

    let single = Rc::new(RefCell::new(vec![]));
    let mut parser = purc_hvml::Parser::new(ParseOpts::default(), record(single.clone()));
    parser.begin(input.as_bytes()).unwrap();

    let threaded = Rc::new(RefCell::new(vec![]));
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts { workers: 3 },
        record(threaded.clone()),
    );
    for piece in input.as_bytes().chunks(5) {
        parser.chunk(piece).unwrap();
    }
    parser.end().unwrap();
    parser.finish().unwrap();

    assert_eq!(*threaded.borrow(), *single.borrow());
}

#[test]
fn finish_without_end() {
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts::default(),
        Callbacks::default(),
    );
    parser.chunk(b"<p>x").unwrap();
    let doc = parser.finish().unwrap();
    assert!(doc.body().is_some());
}

#[test]
fn caller_contract() {
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts::default(),
        Callbacks::default(),
    );
    parser.chunk(b"<p>").unwrap();
    assert_eq!(
        parser.set_encoding(purc_hvml::encoding::UTF_8),
        Err(Error::EncodingAfterStart)
    );
    parser.end().unwrap();
    assert_eq!(parser.chunk(b"x"), Err(Error::ReusedParser));
    assert_eq!(parser.end(), Err(Error::ReusedParser));
    parser.finish().unwrap();
}

#[test]
fn legacy_encoding() {
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts::default(),
        Callbacks::default(),
    );
    parser.set_encoding(purc_hvml::encoding::WINDOWS_1252).unwrap();
    parser.chunk(b"<p>caf").unwrap();
    parser.chunk(b"\xe9</p>").unwrap();
    let doc = parser.finish().unwrap();
    let p = doc.first_child(doc.body().unwrap()).unwrap();
    assert_eq!(&*doc.text(doc.first_child(p).unwrap()).unwrap(), "caf\u{e9}");
}

#[test]
fn dropping_the_parser_stops_it() {
    let mut parser = ThreadedParser::new(
        ParseOpts::default(),
        ThreadedOpts { workers: 2 },
        Callbacks::default(),
    );
    parser.chunk(b"<p>unfinished").unwrap();
    drop(parser);
}
