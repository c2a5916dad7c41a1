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
use std::sync::Arc;

use purc_hvml::dom::{Document, NodeId};
use purc_hvml::tag::ids;
use purc_hvml::tokenizer::ParseError;
use purc_hvml::tree_builder::{NoQuirks, Quirks};
use purc_hvml::{
    parse_document, parse_fragment, Callbacks, Error, Namespace, ParseOpts, Parser, TagRegistry,
};

use util::{
    expected, parse, parse_chunks, parse_to_string, serialize, serialize_fragment, to_markup,
    DOCUMENTS,
};

#[test]
fn formatting_elements_nest() {
    assert_eq!(
        parse_to_string("<a><b>text</b></a>"),
        expected(&["<hvml>", "  <head>", "  <body>", "    <a>", "      <b>", "        \"text\""])
    );
}

#[test]
fn paragraph_closes_open_paragraph() {
    assert_eq!(
        parse_to_string("<p>1<p>2"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <p>",
            "      \"1\"",
            "    <p>",
            "      \"2\"",
        ])
    );
}

#[test]
fn unterminated_tag_at_eof_is_kept() {
    let doc = parse("<di");
    assert_eq!(
        serialize(&doc),
        expected(&["<hvml>", "  <head>", "  <body>", "    <di>"])
    );
    assert!(!doc.errors().is_empty());
}

#[test]
fn misnested_formatting_is_adopted() {
    assert_eq!(
        parse_to_string("<b>1<i>2</b>3</i>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <b>",
            "      \"1\"",
            "      <i>",
            "        \"2\"",
            "    <i>",
            "      \"3\"",
        ])
    );
}

#[test]
fn nested_anchor_closes_the_first() {
    assert_eq!(
        parse_to_string("<a>1<a>2</a>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <a>",
            "      \"1\"",
            "    <a>",
            "      \"2\"",
        ])
    );
}

#[test]
fn tag_names_fold_case() {
    let doc = parse("<DIV>");
    let body = doc.body().unwrap();
    let div = doc.first_child(body).unwrap();
    assert_eq!(doc.tag(div), Some(ids::div));
    assert_eq!(TagRegistry::shared().get_by_name("DIV"), Some(ids::div));
}

#[test]
fn tag_split_between_chunks() {
    let split = parse_chunks(&[b"<d", b"iv>x</div>"]);
    let whole = parse("<div>x</div>");
    assert_eq!(serialize(&split), serialize(&whole));
}

#[test]
fn every_split_point_gives_the_same_tree() {
    for input in DOCUMENTS {
        let bytes = input.as_bytes();
        let whole = serialize(&parse(input));
        for i in 0..=bytes.len() {
            let (a, b) = bytes.split_at(i);
            let doc = parse_chunks(&[a, b]);
            assert_eq!(serialize(&doc), whole, "split at {i} of {input:?}");
        }

        let single: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(serialize(&parse_chunks(&single)), whole, "bytewise {input:?}");
    }
}

#[test]
fn parsing_is_deterministic() {
    for input in DOCUMENTS {
        let a = parse(input);
        let b = parse(input);
        assert_eq!(serialize(&a), serialize(&b));
        assert_eq!(*a.errors(), *b.errors());
    }
}

fn ancestors(doc: &Document, node: NodeId) -> Vec<NodeId> {
    let mut chain = vec![];
    let mut current = Some(node);
    while let Some(id) = current {
        if id == doc.document() {
            break;
        }
        chain.push(id);
        current = doc.parent(id);
    }
    chain.reverse();
    chain
}

#[test]
fn open_elements_are_the_ancestor_chain() {
    let input = "<hvml><body><div><ul><li>a<li>b</ul><p>x<b>y<i>z</b>w</i></p></div></body></hvml>";
    let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
    for byte in input.as_bytes().chunks(1) {
        parser.chunk(byte).unwrap();
        let open = parser.open_elements();
        if let Some(&current) = open.last() {
            assert_eq!(ancestors(parser.document(), current), open);
        }
    }
    parser.end().unwrap();
    assert!(parser.open_elements().is_empty());
}

#[test]
fn nodes_held_by_an_unfinished_parse_cannot_be_removed() {
    util::init_logging();
    let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
    parser.chunk(b"<div><span>x</span><p>a").unwrap();

    let doc = parser.document();
    let body = doc.body().unwrap();
    let div = doc.first_child(body).unwrap();
    let span = doc.first_child(div).unwrap();
    let p = doc.next_sibling(span).unwrap();
    assert_eq!(doc.remove(body).err(), Some(Error::NodeInUse(body)));
    assert_eq!(doc.remove(div).err(), Some(Error::NodeInUse(div)));
    assert_eq!(doc.remove(p).err(), Some(Error::NodeInUse(p)));
    doc.remove(span).unwrap().destroy();

    parser.chunk(b"b</p>c</div>d").unwrap();
    parser.end().unwrap();
    let doc = parser.document();
    assert_eq!(
        serialize(doc),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <div>",
            "      <p>",
            "        \"ab\"",
            "      \"c\"",
            "    \"d\"",
        ])
    );
    doc.remove(div).unwrap().destroy();
    assert!(!doc.is_live(p));
}

#[test]
fn well_formed_markup_round_trips() {
    let input = "<hvml target=\"html\"><head></head><body><init as=\"users\"><div class=\"a\">1</div></init><p>2<span>3</span></p><!--c--></body></hvml>";
    let doc = parse(input);
    assert_eq!(to_markup(&doc, doc.document()), input);
}

#[test]
fn hvml_vocabulary() {
    assert_eq!(
        parse_to_string(
            "<hvml target=\"html\"><body><init as=\"users\">[1, 2]</init>\
             <iterate on=\"$users\"><p>$?</p></iterate></body></hvml>"
        ),
        expected(&[
            "<hvml>",
            "  target=\"html\"",
            "  <head>",
            "  <body>",
            "    <init>",
            "      as=\"users\"",
            "      \"[1, 2]\"",
            "    <iterate>",
            "      on=\"$users\"",
            "      <p>",
            "        \"$?\"",
        ])
    );
}

#[test]
fn anchors() {
    let doc = parse("<hvml><head></head><body></body></hvml>");
    let hvml = doc.hvml().unwrap();
    assert_eq!(doc.parent(hvml), Some(doc.document()));
    assert_eq!(doc.tag(doc.head().unwrap()), Some(ids::head));
    assert_eq!(doc.tag(doc.body().unwrap()), Some(ids::body));
    assert_eq!(doc.fragment(), None);
}

#[test]
fn text_is_foster_parented() {
    assert_eq!(
        parse_to_string("<table>x<tr><td>y</td></tr></table>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    \"x\"",
            "    <table>",
            "      <tbody>",
            "        <tr>",
            "          <td>",
            "            \"y\"",
        ])
    );
}

#[test]
fn elements_are_foster_parented() {
    assert_eq!(
        parse_to_string("<table><div>a</div></table>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <div>",
            "      \"a\"",
            "    <table>",
        ])
    );
}

#[test]
fn whitespace_stays_in_tables() {
    assert_eq!(
        parse_to_string("<table> <tr></tr></table>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <table>",
            "      \" \"",
            "      <tbody>",
            "        <tr>",
        ])
    );
}

#[test]
fn implied_list_and_option_ends() {
    assert_eq!(
        parse_to_string("<ul><li>1<li>2</ul><select><option>a<option>b</select>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <ul>",
            "      <li>",
            "        \"1\"",
            "      <li>",
            "        \"2\"",
            "    <select>",
            "      <option>",
            "        \"a\"",
            "      <option>",
            "        \"b\"",
        ])
    );
}

#[test]
fn template_children() {
    assert_eq!(
        parse_to_string("<template><p>x</p></template>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "    <template>",
            "      <p>",
            "        \"x\"",
            "  <body>",
        ])
    );
}

#[test]
fn foreign_content() {
    assert_eq!(
        parse_to_string("<svg><circle r=\"1\"/><![CDATA[a<b]]></svg><math><mi>x</mi></math>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "      <svg circle>",
            "        r=\"1\"",
            "      \"a<b\"",
            "    <math math>",
            "      <math mi>",
            "        \"x\"",
        ])
    );
}

#[test]
fn markup_start_tag_leaves_foreign_content() {
    assert_eq!(
        parse_to_string("<svg><p>x</p></svg>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <svg svg>",
            "    <p>",
            "      \"x\"",
        ])
    );
}

#[test]
fn doctype_sets_quirks_mode() {
    let doc = parse("<!DOCTYPE hvml><hvml></hvml>");
    assert_eq!(doc.quirks_mode(), NoQuirks);
    assert!(doc.doctype().is_some());
    assert_eq!(
        serialize(&doc),
        expected(&["<!DOCTYPE hvml>", "<hvml>", "  <head>", "  <body>"])
    );

    assert_eq!(parse("<!DOCTYPE html><p>").quirks_mode(), Quirks);
    assert_eq!(parse("<p>").quirks_mode(), Quirks);
}

#[test]
fn doctype_can_be_dropped() {
    let mut opts = ParseOpts::default();
    opts.tree_builder.drop_doctype = true;
    let doc = parse_document(b"<!DOCTYPE hvml><hvml></hvml>", opts).unwrap();
    assert!(doc.doctype().is_none());
    assert_eq!(doc.quirks_mode(), NoQuirks);
}

#[test]
fn character_references() {
    assert_eq!(
        parse_to_string("<p title=\"a&amp;b\">x &lt; y&#65;</p><style>&amp;</style><textarea>&amp;</textarea>"),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <p>",
            "      title=\"a&b\"",
            "      \"x < yA\"",
            "    <style>",
            "      \"&amp;\"",
            "    <textarea>",
            "      \"&\"",
        ])
    );
}

#[test]
fn attribute_names_are_lowercased() {
    let doc = parse("<p CLASS=\"x\" Id=y>");
    let p = doc.first_child(doc.body().unwrap()).unwrap();
    assert_eq!(doc.get_attribute(p, "class").as_deref(), Some("x"));
    assert_eq!(doc.get_attribute(p, "id").as_deref(), Some("y"));
}

#[test]
fn newlines_are_normalized() {
    let doc = parse("<p>a\r\nb\rc</p>");
    let p = doc.first_child(doc.body().unwrap()).unwrap();
    let text = doc.first_child(p).unwrap();
    assert_eq!(&*doc.text(text).unwrap(), "a\nb\nc");
}

#[test]
fn errors_carry_their_position() {
    let seen = Rc::new(RefCell::new(vec![]));
    let sink = seen.clone();
    let callbacks = Callbacks {
        on_parse_error: Some(Box::new(move |e: &ParseError| sink.borrow_mut().push(e.clone()))),
        ..Callbacks::default()
    };
    let mut parser = Parser::new(ParseOpts::default(), callbacks);
    parser.begin(b"<hvml>\n<body>\n</p>").unwrap();

    let doc = parser.into_document();
    assert_eq!(*doc.errors(), seen.borrow()[..]);
    assert!(doc
        .errors()
        .iter()
        .any(|e| e.line == 3 && e.offset == 14));

    let body = doc.body().unwrap();
    let p = doc.last_child(body).unwrap();
    assert_eq!(doc.tag(p), Some(ids::p));
    assert_eq!(doc.first_child(p), None);
}

#[test]
fn node_hooks_see_mutations() {
    let inserted = Rc::new(RefCell::new(0));
    let removed = Rc::new(RefCell::new(0));
    let (i, r) = (inserted.clone(), removed.clone());
    let callbacks = Callbacks {
        on_node_insert: Some(Box::new(move |_| *i.borrow_mut() += 1)),
        on_node_remove: Some(Box::new(move |_| *r.borrow_mut() += 1)),
        ..Callbacks::default()
    };
    let mut parser = Parser::new(ParseOpts::default(), callbacks);
    parser.begin(b"<a><p>x</a>").unwrap();

    // hvml, head, body, a, p and the text at least.
    assert!(*inserted.borrow() >= 6);
    // The paragraph moves out of the anchor.
    assert!(*removed.borrow() >= 1);
}

#[test]
fn fragment_in_table_row() {
    let doc = parse_fragment(b"<td>x</td>", ids::tr, Namespace::Hvml, ParseOpts::default()).unwrap();
    assert_eq!(serialize_fragment(&doc), expected(&["<td>", "  \"x\""]));
}

#[test]
fn fragment_in_raw_text_context() {
    let doc = parse_fragment(
        b"a<b>&amp;</textarea>c",
        ids::textarea,
        Namespace::Hvml,
        ParseOpts::default(),
    )
    .unwrap();
    assert_eq!(serialize_fragment(&doc), expected(&["\"a<b>&c\""]));
}

#[test]
fn fragment_in_block_context() {
    let doc = parse_fragment(b"<p>a<p>b", ids::div, Namespace::Hvml, ParseOpts::default()).unwrap();
    assert_eq!(
        serialize_fragment(&doc),
        expected(&["<p>", "  \"a\"", "<p>", "  \"b\""])
    );
}

#[test]
fn reuse_is_rejected() {
    let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
    parser.chunk(b"<p>").unwrap();
    assert_eq!(parser.set_encoding(purc_hvml::encoding::UTF_8), Err(Error::EncodingAfterStart));
    parser.end().unwrap();
    assert_eq!(parser.chunk(b"x"), Err(Error::ReusedParser));
}

#[test]
fn legacy_encoding() {
    let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
    parser.set_encoding(purc_hvml::encoding::WINDOWS_1252).unwrap();
    parser.begin(b"<p>caf\xe9</p>").unwrap();
    let doc = parser.into_document();
    let p = doc.first_child(doc.body().unwrap()).unwrap();
    assert_eq!(&*doc.text(doc.first_child(p).unwrap()).unwrap(), "caf\u{e9}");
}

#[test]
fn full_registry_stops_the_parse() {
    let registry = Arc::new(TagRegistry::with_limit(0));
    let mut parser = Parser::with_registry(registry, ParseOpts::default(), Callbacks::default());
    assert_eq!(parser.chunk(b"<p>a</p><foo>b"), Err(Error::OutOfMemory(0)));
    assert_eq!(parser.end(), Err(Error::OutOfMemory(0)));

    let doc = parser.into_document();
    let p = doc.first_child(doc.body().unwrap()).unwrap();
    assert_eq!(doc.tag(p), Some(ids::p));
    assert_eq!(doc.next_sibling(p), None);
}

#[test]
fn source_spans() {
    let input = "<hvml><body><p id=\"x\">text</p></body></hvml>";
    let doc = parse(input);
    let body = doc.body().unwrap();
    let p = doc.first_child(body).unwrap();
    let span = doc.source_span(p).unwrap();
    assert_eq!(&input[span.begin as usize..span.end as usize], "<p id=\"x\">");
    let text = doc.first_child(p).unwrap();
    let span = doc.source_span(text).unwrap();
    assert_eq!(&input[span.begin as usize..span.end as usize], "text");

    let implied = parse("x");
    assert!(implied.source_span(implied.body().unwrap()).unwrap().is_empty());
}
