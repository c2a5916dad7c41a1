// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

mod util;

use std::sync::Arc;

use purc_hvml::dom::{AttrMatch, Document, NodeId};
use purc_hvml::tag::ids;
use purc_hvml::{parse_document, Error, Namespace, ParseOpts, TagRegistry};

use util::{expected, init_logging, parse, serialize, to_markup};

const USERS: &str = "<hvml><body>\
    <init as=\"users\" class=\"list main\" lang=\"en-US\">\
    <div id=\"u1\" class=\"user Admin\">a</div>\
    <div id=\"u2\" data-role=\"guest-user\">b</div>\
    </init>\
    <x-card title=\"Main\"><span class=\"user\">c</span></x-card>\
    </body></hvml>";

fn nth_child(doc: &Document, parent: NodeId, n: usize) -> NodeId {
    doc.children(parent).nth(n).expect("missing child")
}

fn ids_of(doc: &Document, nodes: &[NodeId]) -> Vec<String> {
    nodes
        .iter()
        .map(|&id| match doc.get_attribute(id, "id") {
            Some(value) => value,
            None => doc.tag_name(doc.tag(id).unwrap()).into_owned(),
        })
        .collect()
}

#[test]
fn nodes_by_tag_are_in_document_order() {
    let doc = parse(USERS);
    let divs = doc.get_nodes_by_tag_id(ids::div);
    assert_eq!(ids_of(&doc, &divs), vec!["u1", "u2"]);

    let roots = doc.get_nodes_by_tag_id(ids::hvml);
    assert_eq!(roots, vec![doc.hvml().unwrap()]);

    let init = nth_child(&doc, doc.body().unwrap(), 0);
    assert_eq!(doc.get_nodes_by_tag_id_in(init, ids::init), vec![]);
    assert_eq!(doc.get_nodes_by_tag_id_in(init, ids::div), divs);
    assert_eq!(doc.get_nodes_by_tag_id_in(doc.body().unwrap(), ids::span).len(), 1);
}

#[test]
fn nodes_by_name_include_dynamic_tags() {
    let doc = parse(USERS);
    assert_eq!(ids_of(&doc, &doc.get_nodes_by_name("X-CARD")), vec!["x-card"]);
    assert_eq!(doc.get_nodes_by_name("div").len(), 2);
    assert!(doc.get_nodes_by_name("never-seen-anywhere").is_empty());

    let card = doc.get_nodes_by_name("x-card")[0];
    assert_eq!(ids_of(&doc, &doc.get_nodes_by_name_in(card, "span")), vec!["span"]);
}

#[test]
fn a_document_without_a_root_has_no_nodes() {
    let doc = Document::new(TagRegistry::shared());
    assert!(doc.get_nodes_by_tag_id(ids::hvml).is_empty());
    assert!(doc.get_nodes_by_attribute_key(None, "id").is_empty());
}

#[test]
fn nodes_by_attribute_key() {
    let doc = parse(USERS);
    let with_class = doc.get_nodes_by_attribute_key(None, "CLASS");
    assert_eq!(ids_of(&doc, &with_class), vec!["init", "u1", "span"]);

    let init = nth_child(&doc, doc.body().unwrap(), 0);
    let scoped = doc.get_nodes_by_attribute_key(Some(init), "id");
    assert_eq!(ids_of(&doc, &scoped), vec!["u1", "u2"]);
}

#[test]
fn nodes_by_attribute_value() {
    let doc = parse(USERS);
    let find = |key: Option<&str>, value: &str, how: AttrMatch, ignore_case: bool| {
        ids_of(&doc, &doc.get_nodes_by_attribute_value(None, key, value, how, ignore_case))
    };

    assert_eq!(find(Some("id"), "u2", AttrMatch::Eq, false), vec!["u2"]);
    assert_eq!(find(None, "main", AttrMatch::Eq, false), Vec::<String>::new());
    assert_eq!(find(None, "main", AttrMatch::Eq, true), vec!["x-card"]);

    assert_eq!(find(Some("class"), "user", AttrMatch::Whitespace, false), vec!["u1", "span"]);
    assert_eq!(find(Some("class"), "admin", AttrMatch::Whitespace, false), Vec::<String>::new());
    assert_eq!(find(Some("class"), "admin", AttrMatch::Whitespace, true), vec!["u1"]);
    assert_eq!(find(None, "main", AttrMatch::Whitespace, false), vec!["init"]);

    assert_eq!(find(Some("id"), "u", AttrMatch::Begin, false), vec!["u1", "u2"]);
    assert_eq!(find(Some("data-role"), "-user", AttrMatch::End, false), vec!["u2"]);
    assert_eq!(find(None, "ST-US", AttrMatch::Contain, false), Vec::<String>::new());
    assert_eq!(find(None, "ST-US", AttrMatch::Contain, true), vec!["u2"]);

    assert_eq!(find(Some("lang"), "en", AttrMatch::Hyphen, false), vec!["init"]);
    assert_eq!(find(Some("lang"), "EN", AttrMatch::Hyphen, true), vec!["init"]);
    assert_eq!(find(Some("data-role"), "guest", AttrMatch::Hyphen, false), vec!["u2"]);
}

#[test]
fn elements_built_by_hand() {
    init_logging();
    let doc = parse("<hvml><body><p>1</p></body></hvml>");
    let body = doc.body().unwrap();
    let p = nth_child(&doc, body, 0);

    let first = doc.create_node(ids::init, Namespace::Hvml);
    doc.insert_before(p, first).unwrap();
    let last = doc.create_node(ids::span, Namespace::Hvml);
    doc.insert_after(p, last).unwrap();
    let middle = doc.create_node(ids::hr, Namespace::Hvml);
    doc.insert_after(first, middle).unwrap();
    let text = doc.create_text_node("t");
    doc.append_child(last, text).unwrap();

    assert_eq!(
        serialize(&doc),
        expected(&[
            "<hvml>",
            "  <head>",
            "  <body>",
            "    <init>",
            "    <hr>",
            "    <p>",
            "      \"1\"",
            "    <span>",
            "      \"t\"",
        ])
    );
    assert_eq!(doc.source_span(first), None);
}

#[test]
fn moving_a_node_relinks_it() {
    let doc = parse("<hvml><body><p>1</p><div>2</div></body></hvml>");
    let body = doc.body().unwrap();
    let p = nth_child(&doc, body, 0);
    let div = nth_child(&doc, body, 1);

    doc.append_child(div, p).unwrap();
    assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![div]);
    assert_eq!(doc.parent(p), Some(div));

    doc.insert_before(div, p).unwrap();
    assert_eq!(doc.children(body).collect::<Vec<_>>(), vec![p, div]);
}

#[test]
fn bad_links_are_refused() {
    let doc = parse("<hvml><body><div><p>x</p></div></body></hvml>");
    let body = doc.body().unwrap();
    let div = nth_child(&doc, body, 0);
    let p = nth_child(&doc, div, 0);
    let text = nth_child(&doc, p, 0);
    let loose = doc.create_node(ids::span, Namespace::Hvml);

    assert_eq!(doc.append_child(p, div), Err(Error::BadInsertion(div)));
    assert_eq!(doc.append_child(div, div), Err(Error::BadInsertion(div)));
    assert_eq!(doc.insert_before(div, div), Err(Error::BadInsertion(div)));
    assert_eq!(doc.append_child(text, loose), Err(Error::WrongNodeKind(text)));
    assert_eq!(doc.insert_after(loose, p), Err(Error::NotAttached(loose)));
    assert_eq!(
        doc.append_child(div, doc.document()),
        Err(Error::BadInsertion(doc.document()))
    );

    let gone = doc.create_node(ids::b, Namespace::Hvml);
    doc.append_child(p, gone).unwrap();
    doc.remove(gone).unwrap().destroy();
    assert_eq!(doc.append_child(p, gone), Err(Error::StaleNode(gone)));
    assert_eq!(doc.insert_before(gone, loose), Err(Error::StaleNode(gone)));
}

#[test]
fn appropriate_place_fosters_table_content() {
    let doc = parse("<hvml><body><div><table><tr><td>x</td></tr></table></div></body></hvml>");
    let div = nth_child(&doc, doc.body().unwrap(), 0);
    let table = nth_child(&doc, div, 0);
    let tr = doc.get_nodes_by_tag_id(ids::tr)[0];
    let td = doc.get_nodes_by_tag_id(ids::td)[0];

    let fostered = doc.create_text_node("f");
    doc.insert_to_appropriate_place(tr, fostered).unwrap();
    assert_eq!(doc.next_sibling(fostered), Some(table));
    assert_eq!(doc.parent(fostered), Some(div));

    let inside = doc.create_node(ids::b, Namespace::Hvml);
    doc.insert_to_appropriate_place(td, inside).unwrap();
    assert_eq!(doc.parent(inside), Some(td));

    // A table with no parent takes the node itself.
    let loose = doc.create_node(ids::table, Namespace::Hvml);
    let child = doc.create_node(ids::tr, Namespace::Hvml);
    doc.insert_to_appropriate_place(loose, child).unwrap();
    assert_eq!(doc.parent(child), Some(loose));
}

#[test]
fn appropriate_place_prefers_a_template() {
    let doc = parse("<hvml><body></body></hvml>");
    let body = doc.body().unwrap();
    let template = doc.create_node(ids::template, Namespace::Hvml);
    let tbody = doc.create_node(ids::tbody, Namespace::Hvml);
    doc.append_child(body, template).unwrap();
    doc.append_child(template, tbody).unwrap();

    let node = doc.create_node(ids::p, Namespace::Hvml);
    doc.insert_to_appropriate_place(tbody, node).unwrap();
    assert_eq!(doc.parent(node), Some(template));
}

#[test]
fn text_can_be_replaced() {
    let doc = parse("<hvml><body><p>old</p><!--note--></body></hvml>");
    let body = doc.body().unwrap();
    let p = nth_child(&doc, body, 0);
    let text = nth_child(&doc, p, 0);
    let comment = nth_child(&doc, body, 1);

    doc.set_text(text, "a &amp; b").unwrap();
    assert_eq!(&*doc.text(text).unwrap(), "a &amp; b");
    assert_eq!(doc.source_span(text), None);

    doc.set_text_with_char_refs(text, "a &amp; b&#x21;").unwrap();
    assert_eq!(&*doc.text(text).unwrap(), "a & b!");

    doc.set_text(comment, "changed").unwrap();
    assert_eq!(to_markup(&doc, body), "<body><p>a & b!</p><!--changed--></body>");

    assert_eq!(doc.set_text(p, "x"), Err(Error::WrongNodeKind(p)));
}

#[test]
fn attributes_can_be_edited() {
    let doc = parse("<hvml><body><init as=\"a\" Uniquely=\"1\" at=\"2\"></init></body></hvml>");
    let init = nth_child(&doc, doc.body().unwrap(), 0);

    doc.add_attribute(init, "with", "$DATA").unwrap();
    assert_eq!(doc.get_attribute(init, "with").as_deref(), Some("$DATA"));
    doc.add_attribute(init, "as", "b").unwrap();
    assert_eq!(doc.attrs(init).unwrap().len(), 5);
    assert_eq!(doc.get_attribute(init, "as").as_deref(), Some("a"));

    let removed = doc.remove_attribute_by_key(init, "UNIQUELY").unwrap().unwrap();
    assert_eq!(removed.value, "1");
    assert!(doc.remove_attribute_by_key(init, "uniquely").unwrap().is_none());

    let first = doc.remove_attribute(init, 0).unwrap().unwrap();
    assert_eq!((&*first.name, &*first.value), ("as", "a"));
    assert_eq!(doc.get_attribute(init, "as").as_deref(), Some("b"));
    assert!(doc.remove_attribute(init, 10).unwrap().is_none());

    let text = doc.create_text_node("x");
    assert_eq!(doc.add_attribute(text, "a", "b"), Err(Error::WrongNodeKind(text)));
}

#[test]
fn shallow_and_deep_clones() {
    let doc = parse("<hvml><body><div class=\"c\"><p>1</p><!--n--></div></body></hvml>");
    let div = nth_child(&doc, doc.body().unwrap(), 0);

    let shallow = doc.clone_node(div, false).unwrap();
    assert_eq!(doc.parent(shallow), None);
    assert_eq!(doc.first_child(shallow), None);
    assert_eq!(doc.get_attribute(shallow, "class").as_deref(), Some("c"));
    assert_eq!(doc.source_span(shallow), doc.source_span(div));

    let deep = doc.clone_node(div, true).unwrap();
    assert_eq!(to_markup(&doc, deep), to_markup(&doc, div));
    assert_ne!(doc.first_child(deep), doc.first_child(div));

    // The copy is independent of the original.
    doc.set_text(doc.descendants(deep).nth(2).unwrap(), "2").unwrap();
    assert_eq!(to_markup(&doc, div), "<div class=\"c\"><p>1</p><!--n--></div>");
    assert_eq!(to_markup(&doc, deep), "<div class=\"c\"><p>2</p><!--n--></div>");
}

#[test]
fn cloning_the_document_copies_its_root() {
    let doc = parse("<hvml><body><p>1</p></body></hvml>");
    let copy = doc.clone_node(doc.document(), true).unwrap();
    assert_eq!(doc.tag(copy), Some(ids::hvml));
    assert_eq!(to_markup(&doc, copy), to_markup(&doc, doc.hvml().unwrap()));

    let empty = Document::new(TagRegistry::shared());
    let root = empty.document();
    assert_eq!(empty.clone_node(root, true), Err(Error::WrongNodeKind(root)));
}

#[test]
fn import_registers_dynamic_tags_again() {
    init_logging();
    let source = parse_document(b"<x-widget><x-part>1</x-part></x-widget>", ParseOpts::default())
        .unwrap();
    let widget = source.get_nodes_by_name("x-widget")[0];

    let target = Document::new(Arc::new(TagRegistry::new()));
    let copy = target.import_node(&source, widget, true).unwrap();
    assert_eq!(target.tag_name(target.tag(copy).unwrap()), "x-widget");
    let part = target.first_child(copy).unwrap();
    assert_eq!(target.tag_name(target.tag(part).unwrap()), "x-part");
    assert_eq!(target.registry().dynamic_len(), 2);
}

#[test]
fn void_and_self_closing_elements() {
    let doc = parse("<hvml><body><br><hr/><p></p><init as=\"x\"/></body></hvml>");
    let body = doc.body().unwrap();
    let br = nth_child(&doc, body, 0);
    let hr = nth_child(&doc, body, 1);
    let p = nth_child(&doc, body, 2);
    let init = nth_child(&doc, body, 3);

    assert!(doc.is_void_element(br));
    assert!(!doc.is_self_closing(br));
    assert!(!doc.is_void_element(init));
    assert!(doc.is_self_closing(init));
    assert!(doc.is_void_element(hr));
    assert!(doc.is_self_closing(hr));
    assert!(!doc.is_void_element(p));
    assert!(!doc.is_self_closing(p));

    let copy = doc.clone_node(init, false).unwrap();
    assert!(doc.is_self_closing(copy));
}
