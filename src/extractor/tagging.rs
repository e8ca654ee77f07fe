//! Stable preorder identifiers for the elements of a parsed document.
//!
//! Element `n` is the `n`-th element met in a depth-first preorder walk
//! starting at the document's root element. The parsed tree itself is never
//! modified: identifiers only exist in the tagged serialization handed to
//! the oracle and in index sets computed here.

use std::collections::{HashMap, HashSet};

use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Scratch attribute carrying the preorder identifier.
pub const ID_ATTR: &str = "data-tributary-id";

pub(crate) const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Elements of `document` in preorder; position is the identifier.
pub fn preorder(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

/// Serializes `document` with every element carrying [`ID_ATTR`].
pub fn tagged_html(document: &Html) -> String {
    let mut out = String::from("<!DOCTYPE html>");
    let mut next_id = 0;
    write_tagged(document.root_element(), &mut next_id, &mut out);
    out
}

fn write_tagged(element: ElementRef<'_>, next_id: &mut usize, out: &mut String) {
    let value = element.value();
    let name = value.name();

    out.push('<');
    out.push_str(name);
    for (attr, v) in value.attrs() {
        if attr == ID_ATTR {
            continue;
        }
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&encode_double_quoted_attribute(v));
        out.push('"');
    }
    out.push_str(&format!(" {}=\"{}\">", ID_ATTR, next_id));
    *next_id += 1;

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw_text = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_tagged(child, next_id, out);
                }
            }
            Node::Text(text) if raw_text => out.push_str(text),
            Node::Text(text) => out.push_str(&encode_text(&**text)),
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

/// Identifiers present anywhere in an oracle-reduced fragment.
pub fn ids_in_fragment(fragment: &str) -> HashSet<usize> {
    let parsed = Html::parse_fragment(fragment);
    parsed
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| el.value().attr(ID_ATTR)?.trim().parse().ok())
        .collect()
}

/// Identifiers of every element in `document` matched by any selector.
pub fn resolve(document: &Html, selectors: &[Selector]) -> HashSet<usize> {
    if selectors.is_empty() {
        return HashSet::new();
    }

    let index: HashMap<_, usize> = preorder(document)
        .enumerate()
        .map(|(i, el)| (el.id(), i))
        .collect();

    selectors
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter_map(|el| index.get(&el.id()).copied())
        .collect()
}
