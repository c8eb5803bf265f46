//! 文档树小工具
//!
//! 新节点统一通过解析 HTML 片段得到，避免手工拼 QualName。

use kuchikiki::traits::TendrilSink;
use kuchikiki::NodeRef;

/// 把 HTML 片段解析成一组节点
///
/// html5ever 会把片段装进完整文档，这里按顺序收集 head 和 body
/// 下的子节点（script/link/style 会被解析器挪进 head）。
pub fn parse_snippet(snippet: &str) -> Vec<NodeRef> {
    let doc = kuchikiki::parse_html().one(format!("<html><head></head><body>{}</body></html>", snippet));
    let mut nodes = Vec::new();
    for tag in ["head", "body"] {
        if let Ok(container) = doc.select_first(tag) {
            for child in container.as_node().children() {
                nodes.push(child);
            }
        }
    }
    for node in &nodes {
        node.detach();
    }
    nodes
}

/// 把一组节点按顺序插到父节点开头
pub fn prepend_all(parent: &NodeRef, nodes: Vec<NodeRef>) {
    for node in nodes.into_iter().rev() {
        parent.prepend(node);
    }
}

/// 把一组节点按顺序追加到父节点末尾
pub fn append_all(parent: &NodeRef, nodes: Vec<NodeRef>) {
    for node in nodes {
        parent.append(node);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_snippet_keeps_order() {
        let nodes = parse_snippet(r#"<input name="a"><input name="b">"#);
        assert_eq!(nodes.len(), 2);
        let names: Vec<String> = nodes
            .iter()
            .filter_map(|n| n.as_element().map(|el| {
                el.attributes.borrow().get("name").unwrap_or("").to_string()
            }))
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_snippet_collects_head_content() {
        // script 会被解析器放进 head，也要收集到
        let nodes = parse_snippet(r#"<script src="x.js"></script>"#);
        assert_eq!(nodes.len(), 1);
    }
}
