// Copyright 2014-2017 The html5ever Project Developers. See the
// COPYRIGHT file at the top-level directory of this distribution.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The tag registry.
//!
//! Every tag name the parser sees is interned to a [`TagId`]. Well-known
//! names live in a static table with compile-time categories and content
//! models; any other name is assigned an id above [`LAST_STATIC`] the first
//! time it is registered.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

use bitflags::bitflags;
use log::{trace, warn};
use phf::phf_map;

use crate::error::{Error, Result};

/// Numeric id of an interned tag name.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct TagId(u32);

impl TagId {
    pub const fn from_u32(raw: u32) -> TagId {
        TagId(raw)
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Is this one of the compile-time tags?
    pub fn is_static(self) -> bool {
        (self.0 as usize) < STATIC_TAGS.len()
    }

    /// Pseudo tags identify token kinds that are not elements.
    pub fn is_pseudo(self) -> bool {
        self.0 <= ids::_end_of_file.0
    }

    fn static_def(self) -> Option<&'static TagDef> {
        STATIC_TAGS.get(self.0 as usize)
    }

    /// Name of a compile-time tag. Dynamic tags need the registry.
    pub fn static_name(self) -> Option<&'static str> {
        self.static_def().map(|d| d.name)
    }

    /// Categories of this tag when it appears in namespace `ns`.
    pub fn categories_in(self, ns: Namespace) -> Categories {
        match self.static_def() {
            Some(def) => def.categories_in(ns),
            None => ORDINARY,
        }
    }

    /// The content model the tokenizer switches to after a start tag.
    pub fn content_model(self) -> ContentModel {
        self.static_def()
            .map_or(ContentModel::Data, |d| d.content_model)
    }
}

impl fmt::Debug for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.static_name() {
            Some(name) => write!(f, "TagId({}, {:?})", self.0, name),
            None => write!(f, "TagId({})", self.0),
        }
    }
}

/// Element namespaces.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone, Debug, Default)]
pub enum Namespace {
    /// Attributes without a namespace.
    #[default]
    Undef,
    Hvml,
    MathMl,
    Svg,
    XLink,
    Xml,
    XmlNs,
}

impl Namespace {
    pub fn url(self) -> &'static str {
        match self {
            Namespace::Undef => "",
            Namespace::Hvml => "https://hvml.fmsoft.cn/",
            Namespace::MathMl => "http://www.w3.org/1998/Math/MathML",
            Namespace::Svg => "http://www.w3.org/2000/svg",
            Namespace::XLink => "http://www.w3.org/1999/xlink",
            Namespace::Xml => "http://www.w3.org/XML/1998/namespace",
            Namespace::XmlNs => "http://www.w3.org/2000/xmlns/",
        }
    }
}

bitflags! {
    /// Tag categories used by the scope algorithms of the tree builder.
    ///
    /// A scope flag marks a tag as a *boundary* for that kind of scope.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct Categories: u16 {
        const SPECIAL = 1 << 0;
        const SCOPE = 1 << 1;
        const SCOPE_LIST_ITEM = 1 << 2;
        const SCOPE_BUTTON = 1 << 3;
        const SCOPE_TABLE = 1 << 4;
        const SCOPE_SELECT = 1 << 5;
        const FORMATTING = 1 << 6;
    }
}

/// Which tokenizer state follows the start tag of an element.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum ContentModel {
    Data,
    Rcdata,
    Rawtext,
    ScriptData,
    Plaintext,
}

// Every element other than optgroup and option ends a select scope.
const ORDINARY: Categories = Categories::SCOPE_SELECT;
const SPECIAL: Categories = Categories::SPECIAL.union(Categories::SCOPE_SELECT);
const FORMATTING: Categories = Categories::FORMATTING.union(Categories::SCOPE_SELECT);
const SCOPING: Categories = SPECIAL
    .union(Categories::SCOPE)
    .union(Categories::SCOPE_LIST_ITEM)
    .union(Categories::SCOPE_BUTTON);
const TABLE_SCOPING: Categories = SCOPING.union(Categories::SCOPE_TABLE);
const LIST_SCOPING: Categories = SPECIAL.union(Categories::SCOPE_LIST_ITEM);
const BUTTON_SCOPING: Categories = SPECIAL.union(Categories::SCOPE_BUTTON);
const NOT_SELECT_SCOPING: Categories = Categories::empty();

struct TagDef {
    name: &'static str,
    categories: Categories,
    content_model: ContentModel,
    foreign: Option<(Namespace, Categories)>,
}

impl TagDef {
    fn categories_in(&self, ns: Namespace) -> Categories {
        match (ns, self.foreign) {
            (Namespace::Hvml, _) => self.categories,
            (ns, Some((foreign_ns, cats))) if ns == foreign_ns => cats,
            _ => ORDINARY,
        }
    }
}

macro_rules! declare_tags {
    ($( $ident:ident = $name:tt : $cats:expr, $model:ident $(, $ns:ident $fcats:expr)? ; )*) => {
        #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
        #[repr(u32)]
        enum Index {
            $( $ident, )*
        }

        /// Ids of the compile-time tags, named after the tag.
        #[allow(non_upper_case_globals)]
        pub mod ids {
            use super::{Index, TagId};
            $( pub const $ident: TagId = TagId(Index::$ident as u32); )*
        }

        static STATIC_TAGS: &[TagDef] = &[
            $( TagDef {
                name: $name,
                categories: $cats,
                content_model: ContentModel::$model,
                foreign: declare_tags!(@foreign $($ns $fcats)?),
            }, )*
        ];

        static STATIC_NAMES: phf::Map<&'static str, TagId> = phf_map! {
            $( $name => TagId(Index::$ident as u32), )*
        };
    };

    (@foreign) => { None };
    (@foreign $ns:ident $fcats:expr) => { Some((Namespace::$ns, $fcats)) };
}

declare_tags! {
    // Pseudo tags for non-element tokens and nodes.
    _undef = "-undef": NOT_SELECT_SCOPING, Data;
    _text = "-text": NOT_SELECT_SCOPING, Data;
    _comment = "!-comment": NOT_SELECT_SCOPING, Data;
    _doctype = "!doctype": NOT_SELECT_SCOPING, Data;
    _end_of_file = "-end-of-file": NOT_SELECT_SCOPING, Data;

    // HVML document structure.
    hvml = "hvml": TABLE_SCOPING, Data;
    head = "head": SPECIAL, Data;
    body = "body": SPECIAL, Data;

    // HVML verbs and data elements.
    archedata = "archedata": ORDINARY, Data;
    archetype = "archetype": ORDINARY, Data;
    back = "back": ORDINARY, Data;
    bind = "bind": ORDINARY, Data;
    call = "call": ORDINARY, Data;
    catch = "catch": ORDINARY, Data;
    choose = "choose": ORDINARY, Data;
    clear = "clear": ORDINARY, Data;
    close = "close": ORDINARY, Data;
    connect = "connect": ORDINARY, Data;
    define = "define": ORDINARY, Data;
    disconnect = "disconnect": ORDINARY, Data;
    empty = "empty": ORDINARY, Data;
    error = "error": ORDINARY, Data;
    except = "except": ORDINARY, Data;
    exit = "exit": ORDINARY, Data;
    fire = "fire": ORDINARY, Data;
    include = "include": ORDINARY, Data;
    inherit = "inherit": ORDINARY, Data;
    init = "init": ORDINARY, Data;
    iterate = "iterate": ORDINARY, Data;
    listen = "listen": ORDINARY, Data;
    load = "load": ORDINARY, Data;
    r#match = "match": ORDINARY, Data;
    observe = "observe": ORDINARY, Data;
    reduce = "reduce": ORDINARY, Data;
    remove = "remove": ORDINARY, Data;
    request = "request": ORDINARY, Data;
    r#return = "return": ORDINARY, Data;
    send = "send": ORDINARY, Data;
    set = "set": ORDINARY, Data;
    sort = "sort": ORDINARY, Data;
    test = "test": ORDINARY, Data;
    update = "update": ORDINARY, Data;

    // Markup vocabulary of the insertion modes.
    a = "a": FORMATTING, Data;
    address = "address": SPECIAL, Data;
    applet = "applet": SCOPING, Data;
    area = "area": SPECIAL, Data;
    article = "article": SPECIAL, Data;
    aside = "aside": SPECIAL, Data;
    b = "b": FORMATTING, Data;
    base = "base": SPECIAL, Data;
    basefont = "basefont": SPECIAL, Data;
    bgsound = "bgsound": SPECIAL, Data;
    big = "big": FORMATTING, Data;
    blockquote = "blockquote": SPECIAL, Data;
    br = "br": SPECIAL, Data;
    button = "button": BUTTON_SCOPING, Data;
    caption = "caption": SCOPING, Data;
    center = "center": SPECIAL, Data;
    code = "code": FORMATTING, Data;
    col = "col": SPECIAL, Data;
    colgroup = "colgroup": SPECIAL, Data;
    dd = "dd": SPECIAL, Data;
    details = "details": SPECIAL, Data;
    dialog = "dialog": ORDINARY, Data;
    dir = "dir": SPECIAL, Data;
    div = "div": SPECIAL, Data;
    dl = "dl": SPECIAL, Data;
    dt = "dt": SPECIAL, Data;
    em = "em": FORMATTING, Data;
    embed = "embed": SPECIAL, Data;
    fieldset = "fieldset": SPECIAL, Data;
    figcaption = "figcaption": SPECIAL, Data;
    figure = "figure": SPECIAL, Data;
    font = "font": FORMATTING, Data;
    footer = "footer": SPECIAL, Data;
    form = "form": SPECIAL, Data;
    frame = "frame": SPECIAL, Data;
    frameset = "frameset": SPECIAL, Data;
    h1 = "h1": SPECIAL, Data;
    h2 = "h2": SPECIAL, Data;
    h3 = "h3": SPECIAL, Data;
    h4 = "h4": SPECIAL, Data;
    h5 = "h5": SPECIAL, Data;
    h6 = "h6": SPECIAL, Data;
    header = "header": SPECIAL, Data;
    hgroup = "hgroup": SPECIAL, Data;
    hr = "hr": SPECIAL, Data;
    i = "i": FORMATTING, Data;
    iframe = "iframe": SPECIAL, Rawtext;
    image = "image": ORDINARY, Data;
    img = "img": SPECIAL, Data;
    input = "input": SPECIAL, Data;
    keygen = "keygen": SPECIAL, Data;
    label = "label": ORDINARY, Data;
    li = "li": SPECIAL, Data;
    link = "link": SPECIAL, Data;
    listing = "listing": SPECIAL, Data;
    main = "main": SPECIAL, Data;
    marquee = "marquee": SCOPING, Data;
    menu = "menu": SPECIAL, Data;
    meta = "meta": SPECIAL, Data;
    nav = "nav": SPECIAL, Data;
    nobr = "nobr": FORMATTING, Data;
    noembed = "noembed": SPECIAL, Rawtext;
    noframes = "noframes": SPECIAL, Rawtext;
    noscript = "noscript": SPECIAL, Rawtext;
    object = "object": SCOPING, Data;
    ol = "ol": LIST_SCOPING, Data;
    optgroup = "optgroup": NOT_SELECT_SCOPING, Data;
    option = "option": NOT_SELECT_SCOPING, Data;
    p = "p": SPECIAL, Data;
    param = "param": SPECIAL, Data;
    plaintext = "plaintext": SPECIAL, Plaintext;
    pre = "pre": SPECIAL, Data;
    rb = "rb": ORDINARY, Data;
    rp = "rp": ORDINARY, Data;
    rt = "rt": ORDINARY, Data;
    rtc = "rtc": ORDINARY, Data;
    ruby = "ruby": ORDINARY, Data;
    s = "s": FORMATTING, Data;
    script = "script": SPECIAL, ScriptData;
    search = "search": SPECIAL, Data;
    section = "section": SPECIAL, Data;
    select = "select": SPECIAL, Data;
    small = "small": FORMATTING, Data;
    source = "source": SPECIAL, Data;
    span = "span": ORDINARY, Data;
    strike = "strike": FORMATTING, Data;
    strong = "strong": FORMATTING, Data;
    style = "style": SPECIAL, Rawtext;
    sub = "sub": ORDINARY, Data;
    summary = "summary": SPECIAL, Data;
    sup = "sup": ORDINARY, Data;
    table = "table": TABLE_SCOPING, Data;
    tbody = "tbody": SPECIAL, Data;
    td = "td": SCOPING, Data;
    template = "template": TABLE_SCOPING, Data;
    textarea = "textarea": SPECIAL, Rcdata;
    tfoot = "tfoot": SPECIAL, Data;
    th = "th": SCOPING, Data;
    thead = "thead": SPECIAL, Data;
    title = "title": SPECIAL, Rcdata, Svg SCOPING;
    tr = "tr": SPECIAL, Data;
    track = "track": SPECIAL, Data;
    tt = "tt": FORMATTING, Data;
    u = "u": FORMATTING, Data;
    ul = "ul": LIST_SCOPING, Data;
    var = "var": ORDINARY, Data;
    wbr = "wbr": SPECIAL, Data;
    xmp = "xmp": SPECIAL, Rawtext;

    // Foreign content entry points and integration points.
    math = "math": ORDINARY, Data;
    mi = "mi": ORDINARY, Data, MathMl SCOPING;
    mo = "mo": ORDINARY, Data, MathMl SCOPING;
    mn = "mn": ORDINARY, Data, MathMl SCOPING;
    ms = "ms": ORDINARY, Data, MathMl SCOPING;
    mtext = "mtext": ORDINARY, Data, MathMl SCOPING;
    annotation_xml = "annotation-xml": ORDINARY, Data, MathMl SCOPING;
    mglyph = "mglyph": ORDINARY, Data;
    malignmark = "malignmark": ORDINARY, Data;
    svg = "svg": ORDINARY, Data;
    foreignobject = "foreignobject": ORDINARY, Data, Svg SCOPING;
    desc = "desc": ORDINARY, Data, Svg SCOPING;
}

/// The highest compile-time id. Dynamic ids start above it.
pub const LAST_STATIC: TagId = ids::desc;

/// A resolved tag.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Tag {
    pub id: TagId,
    pub name: Cow<'static, str>,
    pub categories: Categories,
    pub content_model: ContentModel,
}

impl Tag {
    pub fn categories_in(&self, ns: Namespace) -> Categories {
        self.id.categories_in(ns)
    }
}

#[derive(Default)]
struct DynamicTags {
    by_name: BTreeMap<Box<str>, TagId>,
    names: Vec<Box<str>>,
}

/// Interns tag names to ids.
///
/// The registry is shared between the tokenizer, the tree builder and any
/// consumer of the tree, so it is `Sync` and handed around as an `Arc`.
pub struct TagRegistry {
    dynamic: RwLock<DynamicTags>,
    limit: usize,
}

impl Default for TagRegistry {
    fn default() -> TagRegistry {
        TagRegistry::new()
    }
}

impl fmt::Debug for TagRegistry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TagRegistry")
            .field("dynamic", &self.dynamic_len())
            .field("limit", &self.limit)
            .finish()
    }
}

fn fold_case(name: &str) -> Cow<'_, str> {
    if name.bytes().any(|b| b.is_ascii_uppercase()) {
        Cow::Owned(name.to_ascii_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}

impl TagRegistry {
    pub fn new() -> TagRegistry {
        TagRegistry::with_limit(u32::MAX as usize - STATIC_TAGS.len())
    }

    /// A registry that refuses to hold more than `limit` dynamic tags.
    pub fn with_limit(limit: usize) -> TagRegistry {
        TagRegistry {
            dynamic: RwLock::new(DynamicTags::default()),
            limit,
        }
    }

    /// The process-wide registry.
    pub fn shared() -> Arc<TagRegistry> {
        static SHARED: OnceLock<Arc<TagRegistry>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(TagRegistry::new())).clone()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, DynamicTags> {
        // A poisoned lock still holds a consistent map: inserts are atomic.
        self.dynamic.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Intern `name`, returning the existing id if it is already known.
    pub fn add(&self, name: &str) -> Result<TagId> {
        let name = fold_case(name);
        if let Some(id) = self.lookup(&name) {
            return Ok(id);
        }

        let mut dynamic = self.dynamic.write().unwrap_or_else(|e| e.into_inner());
        if let Some(&id) = dynamic.by_name.get(&*name) {
            return Ok(id);
        }
        if dynamic.names.len() >= self.limit {
            warn!("tag registry is full, refusing {name:?}");
            return Err(Error::OutOfMemory(self.limit));
        }

        let id = TagId((STATIC_TAGS.len() + dynamic.names.len()) as u32);
        trace!("registered dynamic tag {name:?} as {}", id.0);
        let name: Box<str> = name.into_owned().into_boxed_str();
        dynamic.names.push(name.clone());
        dynamic.by_name.insert(name, id);
        Ok(id)
    }

    fn lookup(&self, folded: &str) -> Option<TagId> {
        if let Some(&id) = STATIC_NAMES.get(folded) {
            return Some(id);
        }
        self.read().by_name.get(folded).copied()
    }

    /// Find the id of a name without registering it.
    pub fn get_by_name(&self, name: &str) -> Option<TagId> {
        self.lookup(&fold_case(name))
    }

    pub fn get_by_id(&self, id: TagId) -> Option<Tag> {
        if let Some(def) = id.static_def() {
            return Some(Tag {
                id,
                name: Cow::Borrowed(def.name),
                categories: def.categories,
                content_model: def.content_model,
            });
        }

        let index = id.0 as usize - STATIC_TAGS.len();
        self.read().names.get(index).map(|name| Tag {
            id,
            name: Cow::Owned(name.to_string()),
            categories: ORDINARY,
            content_model: ContentModel::Data,
        })
    }

    /// The name of `id`, or `"-undef"` for an id this registry never issued.
    pub fn name(&self, id: TagId) -> Cow<'static, str> {
        self.get_by_id(id)
            .map_or(Cow::Borrowed(STATIC_TAGS[0].name), |t| t.name)
    }

    /// Number of dynamically registered tags.
    pub fn dynamic_len(&self) -> usize {
        self.read().names.len()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn static_names_resolve() {
        let registry = TagRegistry::new();
        assert_eq!(registry.get_by_name("div"), Some(ids::div));
        assert_eq!(registry.get_by_name("DIV"), Some(ids::div));
        assert_eq!(registry.get_by_name("Annotation-XML"), Some(ids::annotation_xml));
        assert_eq!(registry.get_by_name("match"), Some(ids::r#match));
        assert_eq!(registry.name(ids::hvml), "hvml");
    }

    #[test]
    fn static_ids_are_dense() {
        for (i, def) in STATIC_TAGS.iter().enumerate() {
            assert_eq!(STATIC_NAMES.get(def.name), Some(&TagId(i as u32)));
        }
        assert_eq!(LAST_STATIC.0 as usize, STATIC_TAGS.len() - 1);
    }

    #[test]
    fn add_is_idempotent_and_case_folded() {
        let registry = TagRegistry::new();
        let first = registry.add("My-Widget").unwrap();
        assert!(first > LAST_STATIC);
        assert_eq!(registry.add("my-widget").unwrap(), first);
        assert_eq!(registry.get_by_name("MY-WIDGET"), Some(first));
        assert_eq!(registry.name(first), "my-widget");
        assert_eq!(registry.add("div").unwrap(), ids::div);
        assert_eq!(registry.dynamic_len(), 1);
    }

    #[test]
    fn dynamic_tags_are_ordinary() {
        let registry = TagRegistry::new();
        let id = registry.add("x-foo").unwrap();
        let tag = registry.get_by_id(id).unwrap();
        assert_eq!(tag.categories, Categories::SCOPE_SELECT);
        assert_eq!(tag.content_model, ContentModel::Data);
    }

    #[test]
    fn limit_reports_out_of_memory() {
        let registry = TagRegistry::with_limit(1);
        registry.add("one").unwrap();
        assert_eq!(registry.add("two"), Err(Error::OutOfMemory(1)));
        assert!(registry.add("one").is_ok());
    }

    #[test]
    fn categories_depend_on_namespace() {
        assert!(ids::title.categories_in(Namespace::Hvml).contains(Categories::SPECIAL));
        assert!(!ids::title.categories_in(Namespace::Hvml).contains(Categories::SCOPE));
        assert!(ids::title.categories_in(Namespace::Svg).contains(Categories::SCOPE));
        assert!(ids::mi.categories_in(Namespace::MathMl).contains(Categories::SCOPE));
        assert!(!ids::mi.categories_in(Namespace::Svg).contains(Categories::SCOPE));
        assert!(ids::table.categories_in(Namespace::Hvml).contains(Categories::SCOPE_TABLE));
        assert!(!ids::option.categories_in(Namespace::Hvml).contains(Categories::SCOPE_SELECT));
    }

    #[test]
    fn content_models() {
        assert_eq!(ids::title.content_model(), ContentModel::Rcdata);
        assert_eq!(ids::style.content_model(), ContentModel::Rawtext);
        assert_eq!(ids::script.content_model(), ContentModel::ScriptData);
        assert_eq!(ids::plaintext.content_model(), ContentModel::Plaintext);
        assert_eq!(ids::div.content_model(), ContentModel::Data);
    }
}
