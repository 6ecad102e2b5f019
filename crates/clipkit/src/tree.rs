//! Owned content tree
//!
//! The extractor copies the article subtree out of the parsed document into
//! this small structure so rewrite rules can rename, replace and drop nodes
//! without fighting the parser's arena.

/// A node of the content tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An element with lowercase tag name, attributes in source order, and children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add an attribute (builder style)
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    /// Add a child node (builder style)
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Value of an attribute, if present
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|(key, _)| key == name)
    }

    /// Whitespace-separated classes
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Depth-first search over descendants (excluding self)
    pub fn find_descendant<F>(&self, pred: &F) -> Option<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        for child in &self.children {
            if let Node::Element(el) = child {
                if pred(el) {
                    return Some(el);
                }
                if let Some(found) = el.find_descendant(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated text of all descendant text nodes
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(el) => collect_text(&el.children, out),
        }
    }
}

/// The isolated article body, ready for conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTree {
    pub root: Element,
}

impl ContentTree {
    pub fn new(root: Element) -> Self {
        Self { root }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Element {
        Element::new("div").with_attr("class", "outer box").with_child(Node::Element(
            Element::new("p")
                .with_child(Node::Text("Hello ".to_string()))
                .with_child(Node::Element(
                    Element::new("a")
                        .with_attr("aria-label", "back")
                        .with_child(Node::Text("world".to_string())),
                )),
        ))
    }

    #[test]
    fn test_attr_and_classes() {
        let el = sample();
        assert_eq!(el.attr("class"), Some("outer box"));
        assert!(el.has_class("box"));
        assert!(!el.has_class("out"));
        assert!(el.has_attr("class"));
        assert!(!el.has_attr("id"));
    }

    #[test]
    fn test_find_descendant() {
        let el = sample();
        let found = el.find_descendant(&|e: &Element| e.attr("aria-label") == Some("back"));
        assert_eq!(found.map(|e| e.tag.as_str()), Some("a"));
        assert!(el.find_descendant(&|e: &Element| e.tag == "img").is_none());
    }

    #[test]
    fn test_text() {
        assert_eq!(sample().text(), "Hello world");
    }
}
