// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

#![allow(dead_code)]

use purc_hvml::dom::{Document, NodeData, NodeId};
use purc_hvml::{parse_document, Callbacks, Namespace, ParseOpts, Parser};

/// Inputs that every driver must agree on, whatever the chunking.
pub const DOCUMENTS: &[&str] = &[
    "<a><b>text</b></a>",
    "<p>1<p>2",
    "<b>1<i>2</b>3</i>",
    "<!DOCTYPE hvml><hvml target=\"html\"><head></head><body><init as=\"users\">[1, 2]</init></body></hvml>",
    "<ul><li>caf\u{e9}<li>&amp;&lt;&#x41;</ul><!-- note -->",
    "<table>x<tr><td>y</td></tr></table>",
    "<svg><circle r=\"1\"/><![CDATA[a<b]]></svg><math><mi>x</mi></math>",
    "<p>line\r\nbreak<textarea>\nkept &amp; decoded</textarea><style>&amp;</style>",
    "<select><option>a<option>b</select><di",
    "<svg><foreignObject><style>a<b>x</b></style></foreignObject></svg>",
    "<svg><p><style><b>x</b></style>",
    "<math><mi><textarea><b>x</b></textarea></mi></math>",
    "<math><annotation-xml><svg><desc><title>&amp;<i></title></desc></svg></annotation-xml></math>",
    "<svg><title><script>1<2</script></title><![CDATA[z]]></svg><![CDATA[z]]>",
];

/// Dump the tree in the tree-construction test format.
pub fn serialize(doc: &Document) -> String {
    let mut buf = String::new();
    for child in doc.children(doc.document()) {
        serialize_node(doc, &mut buf, 1, child);
    }
    buf
}

/// Dump the nodes of a parsed fragment.
pub fn serialize_fragment(doc: &Document) -> String {
    let mut buf = String::new();
    let root = doc.fragment().expect("not a fragment");
    for child in doc.children(root) {
        serialize_node(doc, &mut buf, 1, child);
    }
    buf
}

fn serialize_node(doc: &Document, buf: &mut String, indent: usize, id: NodeId) {
    buf.push('|');
    buf.push_str(&" ".repeat(indent));

    let data = doc.data(id).expect("stale node in tree");
    match *data {
        NodeData::Document => panic!("should not reach Document"),

        NodeData::Doctype {
            ref name,
            ref public_id,
            ref system_id,
        } => {
            buf.push_str("<!DOCTYPE ");
            buf.push_str(name);
            if !public_id.is_empty() || !system_id.is_empty() {
                buf.push_str(&format!(" \"{public_id}\" \"{system_id}\""));
            }
            buf.push_str(">\n");
        },

        NodeData::Text(ref text) => {
            buf.push('"');
            buf.push_str(text);
            buf.push_str("\"\n");
        },

        NodeData::Comment(ref text) => {
            buf.push_str("<!-- ");
            buf.push_str(text);
            buf.push_str(" -->\n");
        },

        NodeData::Element {
            tag,
            ns,
            ref attrs,
        } => {
            buf.push('<');
            match ns {
                Namespace::Svg => buf.push_str("svg "),
                Namespace::MathMl => buf.push_str("math "),
                _ => (),
            }
            buf.push_str(&doc.tag_name(tag));
            buf.push_str(">\n");

            let mut attrs: Vec<_> = attrs.iter().collect();
            attrs.sort_by(|a, b| (*a.name).cmp(&*b.name));
            for attr in attrs {
                buf.push('|');
                buf.push_str(&" ".repeat(indent + 2));
                if let Some(ref prefix) = attr.prefix {
                    buf.push_str(prefix);
                    buf.push(' ');
                }
                buf.push_str(&format!("{}=\"{}\"\n", attr.name, attr.value));
            }
        },
    }
    for child in doc.children(id) {
        serialize_node(doc, buf, indent + 2, child);
    }
}

/// Write the tree back out as markup.
pub fn to_markup(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    write_markup(doc, &mut out, id);
    out
}

fn write_markup(doc: &Document, out: &mut String, id: NodeId) {
    let data = doc.data(id).expect("stale node in tree");
    match *data {
        NodeData::Document => {
            for child in doc.children(id) {
                write_markup(doc, out, child);
            }
        },
        NodeData::Doctype { ref name, .. } => out.push_str(&format!("<!DOCTYPE {name}>")),
        NodeData::Text(ref text) => out.push_str(text),
        NodeData::Comment(ref text) => out.push_str(&format!("<!--{text}-->")),
        NodeData::Element { tag, ref attrs, .. } => {
            let name = doc.tag_name(tag);
            out.push('<');
            out.push_str(&name);
            for attr in attrs.iter() {
                out.push_str(&format!(" {}=\"{}\"", attr.name, attr.value));
            }
            out.push('>');
            for child in doc.children(id) {
                write_markup(doc, out, child);
            }
            out.push_str(&format!("</{name}>"));
        },
    }
}

/// Route `log` output through the test harness so it shows up on failure.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn parse(input: &str) -> Document {
    init_logging();
    parse_document(input.as_bytes(), ParseOpts::default()).expect("parse failed")
}

pub fn parse_to_string(input: &str) -> String {
    serialize(&parse(input))
}

/// Parse `input` fed as the given chunks.
pub fn parse_chunks(chunks: &[&[u8]]) -> Document {
    init_logging();
    let mut parser = Parser::new(ParseOpts::default(), Callbacks::default());
    for chunk in chunks {
        parser.chunk(chunk).expect("chunk failed");
    }
    parser.end().expect("end failed");
    parser.into_document()
}

/// Build the expected dump from lines written without the `|` prefix.
pub fn expected(lines: &[&str]) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str("| ");
        out.push_str(line);
        out.push('\n');
    }
    out
}
