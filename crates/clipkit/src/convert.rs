//! Content tree to Markdown conversion
//!
//! Every element is first classified into a [`NodeKind`]; rendering is then a
//! single match over that kind. The footnote, card and back-link rules live
//! in [`classify`], the Markdown shapes in [`render_element`].

use crate::tree::{ContentTree, Element, Node};

/// Bullet characters, cycled by list nesting depth
const BULLETS: [&str; 3] = ["*", "+", "-"];

/// `data-draft-type` values of ad and promoted link cards
const SUPPRESSED_CARD_TYPES: [&str; 2] = ["mcn-link-card", "ad-link-card"];

/// Conversion class of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// `h1`..`h6`, carrying the level
    Heading(usize),
    Paragraph,
    /// Generic block container (`div`, `section`, `figure`, ...)
    Block,
    LineBreak,
    Rule,
    Strong,
    Emphasis,
    Strikethrough,
    InlineCode,
    Preformatted,
    Blockquote,
    List { ordered: bool },
    ListItem,
    /// Reference-list entry holding a "back" anchor
    BackLinkItem,
    Image,
    Link,
    /// Inline citation such as `[1]` pointing at a reference
    FootnoteRef,
    /// Back-link opening a reference-list entry
    FootnoteBackLink,
    /// Ad or promoted link card, dropped entirely
    SuppressedCard,
    Table,
    /// Not rendered at all (`script`, `head`, ...)
    Skip,
    /// Rendered as its children only
    Inline,
}

/// Classify an element for rendering
pub fn classify(el: &Element) -> NodeKind {
    match el.tag.as_str() {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            NodeKind::Heading(el.tag[1..].parse().unwrap_or(1))
        }
        "p" => NodeKind::Paragraph,
        "div" | "section" | "article" | "main" | "header" | "footer" | "aside" | "nav"
        | "figure" | "figcaption" | "body" | "html" | "details" | "summary" | "dl" | "dt"
        | "dd" => NodeKind::Block,
        "br" => NodeKind::LineBreak,
        "hr" => NodeKind::Rule,
        "strong" | "b" => NodeKind::Strong,
        "em" | "i" => NodeKind::Emphasis,
        "del" | "s" | "strike" => NodeKind::Strikethrough,
        "code" | "kbd" | "samp" => NodeKind::InlineCode,
        "pre" => NodeKind::Preformatted,
        "blockquote" => NodeKind::Blockquote,
        "ul" => NodeKind::List { ordered: false },
        "ol" => NodeKind::List { ordered: true },
        "li" => {
            if el
                .find_descendant(&|e: &Element| e.tag == "a" && e.attr("aria-label") == Some("back"))
                .is_some()
            {
                NodeKind::BackLinkItem
            } else {
                NodeKind::ListItem
            }
        }
        "img" => NodeKind::Image,
        "a" => classify_anchor(el),
        "table" => NodeKind::Table,
        "script" | "style" | "head" | "title" | "template" | "noscript" => NodeKind::Skip,
        _ => NodeKind::Inline,
    }
}

fn classify_anchor(el: &Element) -> NodeKind {
    if el
        .attr("data-draft-type")
        .is_some_and(|t| SUPPRESSED_CARD_TYPES.contains(&t))
    {
        NodeKind::SuppressedCard
    } else if el
        .attr("aria-labelledby")
        .is_some_and(|target| target.contains("ref"))
    {
        NodeKind::FootnoteRef
    } else if el.has_attr("data-reference-link") || el.has_class("ReferenceList-backLink") {
        NodeKind::FootnoteBackLink
    } else {
        NodeKind::Link
    }
}

/// Rendering state inherited from ancestors
#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_code: bool,
    list_depth: usize,
}

/// Convert a content tree to Markdown
pub fn to_markdown(tree: &ContentTree) -> String {
    let body = render_element(&tree.root, Context::default());
    filter_excessive_newlines(&body).trim().to_string()
}

/// Convert a content tree and prefix it with a quote line naming the source
pub fn render_article(source_url: &str, tree: &ContentTree) -> String {
    format!("> {}\n\n{}\n", source_url, to_markdown(tree))
}

fn render_element(el: &Element, ctx: Context) -> String {
    let kind = classify(el);
    match kind {
        NodeKind::Skip | NodeKind::SuppressedCard => String::new(),
        NodeKind::Image => {
            let alt = el.attr("alt").unwrap_or_default();
            let src = el.attr("src").unwrap_or_default();
            format!("![{alt}]({src})\n\n")
        }
        NodeKind::LineBreak => "  \n".to_string(),
        NodeKind::Rule => "\n\n---\n\n".to_string(),
        NodeKind::Preformatted => render_pre(el),
        NodeKind::List { ordered } => render_list(el, ordered, ctx),
        NodeKind::Table => render_table(el, ctx),
        _ => {
            let child_ctx = Context {
                in_code: ctx.in_code || kind == NodeKind::InlineCode,
                ..ctx
            };
            let text = render_children(el, kind, child_ctx);
            finish(el, kind, &text, ctx)
        }
    }
}

/// Apply the kind's Markdown shape to already-rendered child text
fn finish(el: &Element, kind: NodeKind, text: &str, ctx: Context) -> String {
    match kind {
        NodeKind::Heading(level) => {
            let text = text.trim().replace('\n', " ");
            if text.is_empty() {
                String::new()
            } else {
                format!("\n\n{} {}\n\n", "#".repeat(level), text)
            }
        }
        NodeKind::Paragraph | NodeKind::Block => {
            let text = text.trim();
            if text.is_empty() {
                String::new()
            } else {
                format!("\n\n{text}\n\n")
            }
        }
        NodeKind::Strong => wrap_inline(text, "**"),
        NodeKind::Emphasis => wrap_inline(text, "*"),
        NodeKind::Strikethrough => wrap_inline(text, "~~"),
        NodeKind::InlineCode if ctx.in_code => text.to_string(),
        NodeKind::InlineCode => wrap_inline(text, "`"),
        NodeKind::Blockquote => {
            let text = text.trim();
            if text.is_empty() {
                return String::new();
            }
            let quoted = text
                .lines()
                .map(|line| {
                    if line.is_empty() {
                        ">".to_string()
                    } else {
                        format!("> {line}")
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!("\n\n{quoted}\n\n")
        }
        NodeKind::ListItem => format!("{} {}\n", BULLETS[0], text.trim()),
        NodeKind::BackLinkItem => format!("{}\n", text.trim()),
        NodeKind::Link => render_link(el, text),
        NodeKind::FootnoteRef => {
            let (_, _, core) = chomp(text);
            core.replacen('[', "[^", 1)
        }
        NodeKind::FootnoteBackLink => {
            let (_, _, core) = chomp(text);
            if core.is_empty() {
                return String::new();
            }
            format!("[^{}]: ", footnote_label(el.attr("href").unwrap_or_default()))
        }
        _ => text.to_string(),
    }
}

/// Footnote number taken from a fixed offset of the back-link target
///
/// Targets look like `#ref_1_0`; the character at index 5 is the number.
/// Shorter targets yield an empty label.
pub fn footnote_label(href: &str) -> String {
    href.chars().nth(5).map(String::from).unwrap_or_default()
}

fn render_children(el: &Element, kind: NodeKind, ctx: Context) -> String {
    let drop_blank_text = matches!(
        kind,
        NodeKind::Block | NodeKind::Blockquote | NodeKind::List { .. }
    );
    let mut out = String::new();
    for child in &el.children {
        match child {
            Node::Text(text) if drop_blank_text && text.trim().is_empty() => {}
            Node::Text(text) => out.push_str(&render_text(text, ctx)),
            Node::Element(child) => out.push_str(&render_element(child, ctx)),
        }
    }
    out
}

fn render_text(text: &str, ctx: Context) -> String {
    let collapsed = collapse_whitespace(text);
    if ctx.in_code {
        collapsed
    } else {
        escape_markdown(&collapsed)
    }
}

fn render_link(el: &Element, text: &str) -> String {
    let (prefix, suffix, core) = chomp(text);
    if core.is_empty() {
        return String::new();
    }
    let href = match el.attr("href") {
        Some(href) if !href.is_empty() => href,
        _ => return format!("{prefix}{core}{suffix}"),
    };
    match el.attr("title") {
        Some(title) if !title.is_empty() => {
            let title = title.replace('"', "\\\"");
            format!("{prefix}[{core}]({href} \"{title}\"){suffix}")
        }
        _ if unescape_markdown(core) == href => format!("{prefix}<{href}>{suffix}"),
        _ => format!("{prefix}[{core}]({href}){suffix}"),
    }
}

fn render_pre(el: &Element) -> String {
    let code = el.text();
    let code = code.trim_matches('\n');
    let language = code_language(el).unwrap_or_default();
    format!("\n\n```{language}\n{code}\n```\n\n")
}

/// Language from a `language-*` class on the `pre` or its `code` child
fn code_language(el: &Element) -> Option<String> {
    let from = |e: &Element| {
        e.classes()
            .find_map(|c| c.strip_prefix("language-"))
            .map(str::to_string)
    };
    from(el).or_else(|| {
        el.find_descendant(&|e: &Element| e.tag == "code")
            .and_then(from)
    })
}

fn render_list(el: &Element, ordered: bool, ctx: Context) -> String {
    let depth = ctx.list_depth;
    let item_ctx = Context {
        list_depth: depth + 1,
        ..ctx
    };
    let mut number: usize = el
        .attr("start")
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(1);

    let mut items = String::new();
    for child in &el.children {
        match child {
            Node::Element(li) if li.tag == "li" => {
                let kind = classify(li);
                let body = render_children(li, kind, item_ctx);
                if kind == NodeKind::BackLinkItem {
                    items.push_str(body.trim());
                    items.push('\n');
                    continue;
                }
                let bullet = if ordered {
                    let b = format!("{number}.");
                    number = number.saturating_add(1);
                    b
                } else {
                    BULLETS[depth % BULLETS.len()].to_string()
                };
                let indent = " ".repeat(bullet.chars().count() + 1);
                items.push_str(&format!(
                    "{} {}\n",
                    bullet,
                    indent_continuation(body.trim(), &indent)
                ));
            }
            Node::Element(other) => items.push_str(&render_element(other, item_ctx)),
            Node::Text(text) if text.trim().is_empty() => {}
            Node::Text(text) => items.push_str(&render_text(text, ctx)),
        }
    }

    if depth > 0 {
        format!("\n{items}")
    } else {
        format!("\n\n{items}\n\n")
    }
}

fn render_table(el: &Element, ctx: Context) -> String {
    let mut rows: Vec<&Element> = Vec::new();
    collect_rows(el, &mut rows);
    if rows.is_empty() {
        return String::new();
    }

    let mut out = String::from("\n\n");
    for (index, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .children
            .iter()
            .filter_map(|node| match node {
                Node::Element(cell) if cell.tag == "td" || cell.tag == "th" => Some(
                    render_children(cell, NodeKind::Inline, ctx)
                        .trim()
                        .replace('\n', " ")
                        .replace('|', "\\|"),
                ),
                _ => None,
            })
            .collect();
        out.push_str(&format!("| {} |\n", cells.join(" | ")));
        if index == 0 {
            let divider = vec!["---"; cells.len().max(1)].join(" | ");
            out.push_str(&format!("| {divider} |\n"));
        }
    }
    out.push('\n');
    out
}

fn collect_rows<'a>(el: &'a Element, rows: &mut Vec<&'a Element>) {
    for child in &el.children {
        if let Node::Element(child) = child {
            match child.tag.as_str() {
                "tr" => rows.push(child),
                "thead" | "tbody" | "tfoot" => collect_rows(child, rows),
                _ => {}
            }
        }
    }
}

/// Split a single boundary space off each side of inline text
///
/// `" foo"` yields `(" ", "", "foo")` so emphasis markers hug the word.
fn chomp(text: &str) -> (&'static str, &'static str, &str) {
    let prefix = if text.starts_with(' ') { " " } else { "" };
    let suffix = if text.ends_with(' ') { " " } else { "" };
    (prefix, suffix, text.trim())
}

fn wrap_inline(text: &str, marker: &str) -> String {
    let (prefix, suffix, core) = chomp(text);
    if core.is_empty() {
        return String::new();
    }
    format!("{prefix}{marker}{core}{marker}{suffix}")
}

fn indent_continuation(text: &str, indent: &str) -> String {
    let mut lines = text.lines();
    let mut out = lines.next().unwrap_or_default().to_string();
    for line in lines {
        out.push('\n');
        if !line.is_empty() {
            out.push_str(indent);
            out.push_str(line);
        }
    }
    out
}

/// Collapse runs of ASCII whitespace to a single space
fn collapse_whitespace(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if matches!(c, ' ' | '\t' | '\n' | '\r') {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            last_was_space = false;
            result.push(c);
        }
    }
    result
}

fn escape_markdown(s: &str) -> String {
    s.replace('*', "\\*").replace('_', "\\_")
}

fn unescape_markdown(s: &str) -> String {
    s.replace("\\*", "*").replace("\\_", "_")
}

/// Filter excessive newlines: keep at most 2 consecutive newlines
///
/// Lines holding only whitespace count as empty.
pub fn filter_excessive_newlines(s: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    let mut previous_blank = false;

    for line in s.split('\n') {
        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        lines.push(if blank { "" } else { line });
        previous_blank = blank;
    }

    lines.join("\n")
}
