// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Tokens seen while the adjusted current node is MathML or SVG.

use phf::phf_map;
use string_cache::DefaultAtom;

use super::interface::TreeSink;
use super::stack::{is_markup_point, is_mathml_text_point};
use super::types::{Step, Tag, Token};
use super::TreeBuilder;
use crate::tag::{ids, Namespace};
use crate::tendril::SliceExt;
use crate::util::str::is_all_whitespace;

/// SVG attributes whose lowercased name loses its camel case.
static SVG_ATTRS: phf::Map<&'static str, &'static str> = phf_map! {
    "attributename" => "attributeName",
    "attributetype" => "attributeType",
    "basefrequency" => "baseFrequency",
    "baseprofile" => "baseProfile",
    "calcmode" => "calcMode",
    "clippathunits" => "clipPathUnits",
    "diffuseconstant" => "diffuseConstant",
    "edgemode" => "edgeMode",
    "filterunits" => "filterUnits",
    "glyphref" => "glyphRef",
    "gradienttransform" => "gradientTransform",
    "gradientunits" => "gradientUnits",
    "kernelmatrix" => "kernelMatrix",
    "kernelunitlength" => "kernelUnitLength",
    "keypoints" => "keyPoints",
    "keysplines" => "keySplines",
    "keytimes" => "keyTimes",
    "lengthadjust" => "lengthAdjust",
    "limitingconeangle" => "limitingConeAngle",
    "markerheight" => "markerHeight",
    "markerunits" => "markerUnits",
    "markerwidth" => "markerWidth",
    "maskcontentunits" => "maskContentUnits",
    "maskunits" => "maskUnits",
    "numoctaves" => "numOctaves",
    "pathlength" => "pathLength",
    "patterncontentunits" => "patternContentUnits",
    "patterntransform" => "patternTransform",
    "patternunits" => "patternUnits",
    "pointsatx" => "pointsAtX",
    "pointsaty" => "pointsAtY",
    "pointsatz" => "pointsAtZ",
    "preservealpha" => "preserveAlpha",
    "preserveaspectratio" => "preserveAspectRatio",
    "primitiveunits" => "primitiveUnits",
    "refx" => "refX",
    "refy" => "refY",
    "repeatcount" => "repeatCount",
    "repeatdur" => "repeatDur",
    "requiredextensions" => "requiredExtensions",
    "requiredfeatures" => "requiredFeatures",
    "specularconstant" => "specularConstant",
    "specularexponent" => "specularExponent",
    "spreadmethod" => "spreadMethod",
    "startoffset" => "startOffset",
    "stddeviation" => "stdDeviation",
    "stitchtiles" => "stitchTiles",
    "surfacescale" => "surfaceScale",
    "systemlanguage" => "systemLanguage",
    "tablevalues" => "tableValues",
    "targetx" => "targetX",
    "targety" => "targetY",
    "textlength" => "textLength",
    "viewbox" => "viewBox",
    "viewtarget" => "viewTarget",
    "xchannelselector" => "xChannelSelector",
    "ychannelselector" => "yChannelSelector",
    "zoomandpan" => "zoomAndPan",
};

static MATHML_ATTRS: phf::Map<&'static str, &'static str> = phf_map! {
    "definitionurl" => "definitionURL",
};

/// Namespaced attributes of any foreign element: prefix, namespace and
/// local name.
static NAMESPACED_ATTRS: phf::Map<&'static str, (Option<&'static str>, Namespace, &'static str)> = phf_map! {
    "xlink:actuate" => (Some("xlink"), Namespace::XLink, "actuate"),
    "xlink:arcrole" => (Some("xlink"), Namespace::XLink, "arcrole"),
    "xlink:href" => (Some("xlink"), Namespace::XLink, "href"),
    "xlink:role" => (Some("xlink"), Namespace::XLink, "role"),
    "xlink:show" => (Some("xlink"), Namespace::XLink, "show"),
    "xlink:title" => (Some("xlink"), Namespace::XLink, "title"),
    "xlink:type" => (Some("xlink"), Namespace::XLink, "type"),
    "xml:lang" => (Some("xml"), Namespace::Xml, "lang"),
    "xml:space" => (Some("xml"), Namespace::Xml, "space"),
    "xmlns" => (None, Namespace::XmlNs, "xmlns"),
    "xmlns:xlink" => (Some("xmlns"), Namespace::XmlNs, "xlink"),
};

/// Fix up the attribute names of a tag entering namespace `ns`.
pub(crate) fn adjust_attrs(tag: &mut Tag, ns: Namespace) {
    let cased = match ns {
        Namespace::Svg => &SVG_ATTRS,
        Namespace::MathMl => &MATHML_ATTRS,
        _ => return,
    };
    for attr in &mut tag.attrs {
        if attr.ns != Namespace::Undef {
            continue;
        }
        if let Some(&local) = cased.get(&*attr.name) {
            attr.name = DefaultAtom::from(local);
        } else if let Some(&(prefix, attr_ns, local)) = NAMESPACED_ATTRS.get(&*attr.name) {
            attr.prefix = prefix.map(DefaultAtom::from);
            attr.ns = attr_ns;
            attr.name = DefaultAtom::from(local);
        }
    }
}

/// Start tags that leave foreign content.
pub(crate) fn breaks_out(tag: &Tag) -> bool {
    match tag.id {
        ids::b
        | ids::big
        | ids::blockquote
        | ids::body
        | ids::br
        | ids::center
        | ids::code
        | ids::dd
        | ids::div
        | ids::dl
        | ids::dt
        | ids::em
        | ids::embed
        | ids::h1
        | ids::h2
        | ids::h3
        | ids::h4
        | ids::h5
        | ids::h6
        | ids::head
        | ids::hr
        | ids::i
        | ids::img
        | ids::li
        | ids::listing
        | ids::menu
        | ids::meta
        | ids::nobr
        | ids::ol
        | ids::p
        | ids::pre
        | ids::ruby
        | ids::s
        | ids::small
        | ids::span
        | ids::strong
        | ids::strike
        | ids::sub
        | ids::sup
        | ids::table
        | ids::tt
        | ids::u
        | ids::ul
        | ids::var => true,
        ids::font => tag.attrs.iter().any(|attr| {
            attr.ns == Namespace::Undef && matches!(&*attr.name, "color" | "face" | "size")
        }),
        _ => false,
    }
}

impl<Handle, Sink> TreeBuilder<Handle, Sink>
where
    Handle: Clone,
    Sink: TreeSink<Handle = Handle>,
{
    /// Does `token` go to the foreign content rules rather than the
    /// current insertion mode?
    pub(super) fn is_foreign(&self, token: &Token) -> bool {
        if let Token::Eof = token {
            return false;
        }
        let Some(name) = self.adjusted_current_name() else {
            return false;
        };
        if name.ns == Namespace::Hvml {
            return false;
        }

        let text = matches!(token, Token::Text(_) | Token::Null);
        let start = match token {
            Token::Start(tag) => Some(tag.id),
            _ => None,
        };

        if is_mathml_text_point(name)
            && (text || start.is_some_and(|id| !matches!(id, ids::mglyph | ids::malignmark)))
        {
            return false;
        }
        if is_markup_point(name) && (text || start.is_some()) {
            return false;
        }
        if name.ns == Namespace::MathMl && name.tag == ids::annotation_xml && start == Some(ids::svg)
        {
            return false;
        }
        true
    }

    pub(super) fn foreign(&self, token: Token) -> Step {
        match token {
            Token::Null => {
                self.unexpected(&token);
                self.insert_text("\u{fffd}".to_tendril())
            },
            Token::Text(text) => {
                if !is_all_whitespace(&text) {
                    self.frameset_ok.set(false);
                }
                self.insert_text(text)
            },
            Token::Comment(text) => self.insert_comment(text),
            Token::Start(tag) if breaks_out(&tag) => self.break_out(Token::Start(tag)),
            Token::End(tag) if matches!(tag.id, ids::br | ids::p) => {
                self.break_out(Token::End(tag))
            },
            Token::Start(tag) => self.foreign_start(tag),
            Token::End(tag) => self.foreign_end(tag),
            Token::Eof => self.step(self.mode.get(), token),
        }
    }

    /// Enter MathML or SVG from markup content.
    pub(super) fn enter_foreign(&self, mut tag: Tag, ns: Namespace) -> Step {
        adjust_attrs(&mut tag, ns);
        self.insert_foreign(tag, ns)
    }

    fn insert_foreign(&self, tag: Tag, ns: Namespace) -> Step {
        if tag.self_closing {
            self.insert_element(ns, tag, false);
            Step::Acked
        } else {
            self.insert_element(ns, tag, true);
            Step::Done
        }
    }

    fn foreign_start(&self, mut tag: Tag) -> Step {
        let ns = self
            .adjusted_current_name()
            .map_or(Namespace::Hvml, |name| name.ns);
        adjust_attrs(&mut tag, ns);
        self.insert_foreign(tag, ns)
    }

    /// Close foreign elements up to the next markup element, then let the
    /// insertion mode see `token`.
    fn break_out(&self, token: Token) -> Step {
        self.unexpected(&token);
        loop {
            let current = self.open.borrow().current_name();
            match current {
                Some(name)
                    if name.ns != Namespace::Hvml
                        && !is_mathml_text_point(name)
                        && !is_markup_point(name) =>
                {
                    self.pop();
                },
                _ => break,
            }
        }
        self.step(self.mode.get(), token)
    }

    fn foreign_end(&self, tag: Tag) -> Step {
        let mut index = self.open.borrow().len().saturating_sub(1);
        let mut first = true;
        while index > 0 {
            let name = match self.open.borrow().get(index) {
                Some(elem) => elem.name,
                None => break,
            };
            if !first && name.ns == Namespace::Hvml {
                return self.step(self.mode.get(), Token::End(tag));
            }
            if name.tag == tag.id {
                self.pop_to(index);
                return Step::Done;
            }
            if first {
                self.unexpected(&tag);
                first = false;
            }
            index -= 1;
        }
        Step::Done
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tokenizer::{Attribute, Span};

    fn tag(id: crate::tag::TagId, attrs: &[(&str, &str)]) -> Tag {
        Tag {
            id,
            attrs: attrs.iter().map(|&(k, v)| Attribute::new(k, v)).collect(),
            self_closing: false,
            span: Span::default(),
        }
    }

    #[test]
    fn svg_attributes_regain_case() {
        let mut t = tag(ids::svg, &[("viewbox", "0 0 1 1"), ("xlink:href", "#a")]);
        adjust_attrs(&mut t, Namespace::Svg);
        assert_eq!(&*t.attrs[0].name, "viewBox");
        assert_eq!(t.attrs[0].ns, Namespace::Undef);
        assert_eq!(&*t.attrs[1].name, "href");
        assert_eq!(t.attrs[1].prefix.as_deref(), Some("xlink"));
        assert_eq!(t.attrs[1].ns, Namespace::XLink);
    }

    #[test]
    fn mathml_keeps_svg_names() {
        let mut t = tag(ids::math, &[("definitionurl", "u"), ("viewbox", "v"), ("xmlns", "x")]);
        adjust_attrs(&mut t, Namespace::MathMl);
        assert_eq!(&*t.attrs[0].name, "definitionURL");
        assert_eq!(&*t.attrs[1].name, "viewbox");
        assert_eq!(t.attrs[2].ns, Namespace::XmlNs);
        assert_eq!(t.attrs[2].prefix, None);
    }

    #[test]
    fn markup_attributes_stay_put() {
        let mut t = tag(ids::div, &[("viewbox", "v")]);
        adjust_attrs(&mut t, Namespace::Hvml);
        assert_eq!(&*t.attrs[0].name, "viewbox");
    }

    #[test]
    fn font_breaks_out_only_with_presentation_attributes() {
        assert!(breaks_out(&tag(ids::div, &[])));
        assert!(!breaks_out(&tag(ids::font, &[])));
        assert!(breaks_out(&tag(ids::font, &[("color", "red")])));
        assert!(!breaks_out(&tag(ids::font, &[("id", "f")])));
        assert!(!breaks_out(&tag(ids::mi, &[])));
    }
}
