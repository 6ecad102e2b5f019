//! Article body extraction
//!
//! Finds the rich-content root for the item's kind and copies it into a
//! [`ContentTree`], dropping decorative nodes and flattening link cards on
//! the way.

use crate::tree::{ContentTree, Element, Node};
use crate::types::ContentKind;
use scraper::{ElementRef, Html, Node as HtmlNode};
use tracing::{debug, warn};

/// Text substituted when the expected root is missing (deleted or 404 content)
pub const INACCESSIBLE_PLACEHOLDER: &str = "This content is inaccessible (deleted or 404).";

/// Marker for inline SVG placeholders used by lazy-loaded images
const SVG_DATA_PREFIX: &str = "data:image/svg+xml";

/// Extract the article body from a full HTML page
///
/// Never fails: a page without the expected root yields a tree holding a
/// single placeholder paragraph.
pub fn extract_content(html: &str, kind: ContentKind) -> ContentTree {
    let document = Html::parse_document(html);
    let scope = document.root_element();

    let root = match kind {
        ContentKind::Answer => find_by_class(scope, "div", "AnswerCard")
            .and_then(|card| find_by_class(card, "div", "RichContent-inner")),
        ContentKind::Post => find_by_class(scope, "div", "Post-RichText"),
    };

    match root {
        Some(root) => {
            let mut element = shallow_copy(root);
            copy_children(root, &mut element.children);
            debug!(kind = %kind, nodes = element.children.len(), "Extracted content root");
            ContentTree::new(element)
        }
        None => {
            warn!(kind = %kind, "Content root not found, substituting placeholder");
            placeholder_tree()
        }
    }
}

fn placeholder_tree() -> ContentTree {
    ContentTree::new(Element::new("div").with_child(Node::Element(
        Element::new("p").with_child(Node::Text(INACCESSIBLE_PLACEHOLDER.to_string())),
    )))
}

fn find_by_class<'a>(scope: ElementRef<'a>, tag: &str, class: &str) -> Option<ElementRef<'a>> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag && el.value().classes().any(|c| c == class))
}

fn shallow_copy(el: ElementRef<'_>) -> Element {
    let value = el.value();
    Element {
        tag: value.name().to_ascii_lowercase(),
        attrs: value
            .attrs()
            .map(|(name, val)| (name.to_string(), val.to_string()))
            .collect(),
        children: Vec::new(),
    }
}

fn copy_children(parent: ElementRef<'_>, out: &mut Vec<Node>) {
    for child in parent.children() {
        match child.value() {
            HtmlNode::Text(text) => out.push(Node::Text(text.text.to_string())),
            HtmlNode::Element(_) => {
                if let Some(el) = ElementRef::wrap(child) {
                    copy_element(el, out);
                }
            }
            _ => {}
        }
    }
}

fn copy_element(el: ElementRef<'_>, out: &mut Vec<Node>) {
    match el.value().name() {
        "style" | "script" => return,
        "noscript" => {
            unwrap_noscript(el, out);
            return;
        }
        _ => {}
    }

    let mut element = shallow_copy(el);
    if is_svg_placeholder(&element) {
        return;
    }
    copy_children(el, &mut element.children);
    out.push(rewrite(element));
}

/// Splice `<noscript>` content into the parent
///
/// With scripting enabled the parser keeps noscript content as raw markup,
/// so it is parsed again as a fragment.
fn unwrap_noscript(el: ElementRef<'_>, out: &mut Vec<Node>) {
    for child in el.children() {
        match child.value() {
            HtmlNode::Text(text) if text.text.contains('<') => {
                let fragment = Html::parse_fragment(&text.text);
                copy_children(fragment.root_element(), out);
            }
            HtmlNode::Text(text) => out.push(Node::Text(text.text.to_string())),
            HtmlNode::Element(_) => {
                if let Some(inner) = ElementRef::wrap(child) {
                    copy_element(inner, out);
                }
            }
            _ => {}
        }
    }
}

fn is_svg_placeholder(el: &Element) -> bool {
    el.tag == "img"
        && el
            .attr("src")
            .is_some_and(|src| src.contains(SVG_DATA_PREFIX))
}

/// Link-card and mailto rewrites
fn rewrite(mut el: Element) -> Node {
    if el.tag != "a" {
        return Node::Element(el);
    }

    if el.classes().next() == Some("LinkCard") {
        let label = el
            .attr("data-text")
            .or_else(|| el.attr("href"))
            .unwrap_or_default()
            .to_string();
        return Node::Text(label);
    }

    // Bare addresses in body copy get auto-linked as mailto anchors.
    if el.attr("href").is_some_and(|href| href.starts_with("mailto")) {
        el.tag = "p".to_string();
    }

    Node::Element(el)
}
