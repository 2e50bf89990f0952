//! Small kuchiki helpers shared by the walk, bundles and page.

use anyhow::{Context, Result};
use kuchiki::NodeRef;
use kuchiki::traits::TendrilSink;

pub fn parse(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

pub fn serialize(document: &NodeRef) -> Result<String> {
    let mut output = Vec::new();
    document
        .serialize(&mut output)
        .context("Failed to serialize document")?;
    String::from_utf8(output).context("Serialized document is not valid UTF-8")
}

/// Lower-cased local name of an element node.
pub fn tag_name(node: &NodeRef) -> Option<String> {
    node.as_element()
        .map(|element| element.name.local.to_ascii_lowercase().to_string())
}

pub fn attr(node: &NodeRef, name: &str) -> Option<String> {
    node.as_element()
        .and_then(|element| element.attributes.borrow().get(name).map(str::to_string))
}

pub fn set_attr(node: &NodeRef, name: &str, value: &str) {
    if let Some(element) = node.as_element() {
        element.attributes.borrow_mut().insert(name, value.to_string());
    }
}

pub fn parent_tag(node: &NodeRef) -> Option<String> {
    node.parent().and_then(|parent| tag_name(&parent))
}

pub fn first(document: &NodeRef, selector: &str) -> Option<NodeRef> {
    document
        .select_first(selector)
        .ok()
        .map(|found| found.as_node().clone())
}

/// Build a detached element by parsing `snippet` and picking the first `tag`.
pub fn element_from_snippet(snippet: &str, tag: &str) -> Option<NodeRef> {
    let fragment = parse(snippet);
    let node = first(&fragment, tag)?;
    node.detach();
    Some(node)
}

pub fn stylesheet_link(href: &str) -> Option<NodeRef> {
    let snippet = format!(
        r#"<link rel="stylesheet" href="{}">"#,
        html_escape::encode_double_quoted_attribute(href)
    );
    element_from_snippet(&snippet, "link")
}

pub fn script_tag(src: &str) -> Option<NodeRef> {
    let snippet = format!(
        r#"<script src="{}"></script>"#,
        html_escape::encode_double_quoted_attribute(src)
    );
    element_from_snippet(&snippet, "script")
}

/// Text of the document's `<title>`, whitespace-collapsed.
pub fn title(document: &NodeRef) -> Option<String> {
    let text = first(document, "title")?.text_contents();
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    (!collapsed.is_empty()).then_some(collapsed)
}

/// `href` values of every anchor, in document order.
pub fn anchor_hrefs(document: &NodeRef) -> Vec<String> {
    match document.select("a[href]") {
        Ok(anchors) => anchors
            .filter_map(|anchor| anchor.attributes.borrow().get("href").map(str::to_string))
            .collect(),
        Err(()) => Vec::new(),
    }
}
