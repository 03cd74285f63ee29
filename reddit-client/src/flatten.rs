use crate::api::{ReplyNode, COMMENT_KIND};
use pulse_core::Comment;
use std::collections::HashSet;
use tracing::debug;

/// Flattens a comment tree into a list in depth-first pre-order.
///
/// Only `t1` nodes are emitted; anything else (e.g. `more` placeholders) is
/// dropped together with whatever sits below it. Every comment therefore
/// appears after its parent. A comment id seen twice is dropped on the second
/// visit along with its subtree.
pub fn flatten_comment_tree(nodes: &[ReplyNode], post_id: &str) -> Vec<Comment> {
    let mut flattened = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&ReplyNode> = nodes.iter().rev().collect();

    while let Some(node) = stack.pop() {
        if node.kind != COMMENT_KIND {
            continue;
        }

        let data = &node.data;
        if !data.id.is_empty() && !seen.insert(data.id.as_str()) {
            debug!("Skipping repeated comment {} in post {}", data.id, post_id);
            continue;
        }

        flattened.push(Comment {
            post_id: post_id.to_string(),
            comment_id: data.id.clone(),
            parent_id: data.parent_id.clone(),
            author: data.author.clone(),
            body: data.body.clone().unwrap_or_default(),
            score: data.score,
            created_utc: data.created_utc,
        });

        if let Some(replies) = &data.replies {
            stack.extend(replies.data.children.iter().rev());
        }
    }

    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn nodes(value: serde_json::Value) -> Vec<ReplyNode> {
        serde_json::from_value(value).unwrap()
    }

    fn comment(id: &str, parent: &str, replies: serde_json::Value) -> serde_json::Value {
        json!({
            "kind": "t1",
            "data": {
                "id": id,
                "parent_id": parent,
                "author": "user",
                "body": format!("body of {}", id),
                "score": 1,
                "created_utc": 1700000000.0,
                "replies": replies
            }
        })
    }

    fn listing(children: Vec<serde_json::Value>) -> serde_json::Value {
        json!({"kind": "Listing", "data": {"children": children}})
    }

    #[test]
    fn test_preorder_traversal() {
        let tree = nodes(json!([
            comment(
                "a",
                "t3_p",
                listing(vec![
                    comment("a1", "t1_a", listing(vec![comment("a1x", "t1_a1", json!(""))])),
                    comment("a2", "t1_a", json!("")),
                ])
            ),
            comment("b", "t3_p", json!("")),
        ]));

        let flat = flatten_comment_tree(&tree, "p");
        let ids: Vec<&str> = flat.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a1", "a1x", "a2", "b"]);
        assert!(flat.iter().all(|c| c.post_id == "p"));
        assert_eq!(flat[2].body, "body of a1x");
    }

    #[test]
    fn test_parent_precedes_child() {
        let tree = nodes(json!([
            comment(
                "a",
                "t3_p",
                listing(vec![
                    comment("b", "t1_a", listing(vec![comment("c", "t1_b", json!(""))])),
                    json!({"kind": "more", "data": {"id": "m", "parent_id": "t1_a", "children": ["z"]}}),
                    comment("d", "t1_a", listing(vec![comment("e", "t1_d", json!(""))])),
                ])
            ),
            comment("f", "t3_p", listing(vec![comment("g", "t1_f", json!(""))])),
        ]));

        let flat = flatten_comment_tree(&tree, "p");
        assert_eq!(flat.len(), 7);
        for (index, comment) in flat.iter().enumerate() {
            if comment.parent_id == "t3_p" {
                continue;
            }
            let parent = comment.parent_id.strip_prefix("t1_").unwrap();
            assert!(
                flat[..index].iter().any(|c| c.comment_id == parent),
                "{} appears before its parent",
                comment.comment_id
            );
        }
    }

    #[test]
    fn test_only_placeholders_yield_nothing() {
        let tree = nodes(json!([
            {"kind": "more", "data": {"id": "m1", "children": ["x", "y"], "count": 2}},
            {"kind": "more", "data": {"id": "m2", "children": [], "count": 0}},
        ]));
        assert!(flatten_comment_tree(&tree, "p").is_empty());
        assert!(flatten_comment_tree(&[], "p").is_empty());
    }

    #[test]
    fn test_non_comment_subtree_is_not_walked() {
        let tree = nodes(json!([
            {"kind": "t3", "data": {"id": "x", "replies": listing(vec![comment("hidden", "t1_x", json!(""))])}},
        ]));
        assert!(flatten_comment_tree(&tree, "p").is_empty());
    }

    #[test]
    fn test_malformed_replies_treated_as_leaf() {
        let tree = nodes(json!([
            comment("a", "t3_p", json!({"kind": "Listing", "data": "broken"})),
            comment("b", "t3_p", json!(null)),
            comment("c", "t3_p", json!(42)),
        ]));
        let flat = flatten_comment_tree(&tree, "p");
        let ids: Vec<&str> = flat.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_repeated_ids_are_visited_once() {
        let tree = nodes(json!([
            comment("a", "t3_p", listing(vec![comment("b", "t1_a", json!(""))])),
            comment("a", "t3_p", listing(vec![comment("c", "t1_a", json!(""))])),
        ]));
        let flat = flatten_comment_tree(&tree, "p");
        let ids: Vec<&str> = flat.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_deleted_comment_fields() {
        let tree = nodes(json!([
            {"kind": "t1", "data": {"id": "gone", "parent_id": "t3_p", "author": "[deleted]", "body": "[deleted]"}},
            {"kind": "t1", "data": {"id": "nobody", "parent_id": "t3_p", "author": null, "body": null}},
        ]));
        let flat = flatten_comment_tree(&tree, "p");
        assert_eq!(flat[0].author.as_deref(), Some("[deleted]"));
        assert_eq!(flat[1].author, None);
        assert_eq!(flat[1].body, "");
        assert_eq!(flat[1].score, 0);
    }

    #[test]
    fn test_null_fields_in_nested_replies_keep_siblings() {
        let tree = nodes(json!([
            comment(
                "a",
                "t3_p",
                listing(vec![
                    comment("b", "t1_a", json!("")),
                    json!({"kind": "t1", "data": {
                        "id": "c",
                        "parent_id": "t1_a",
                        "body": "late reply",
                        "score": null,
                        "created_utc": null,
                        "replies": ""
                    }}),
                ])
            ),
        ]));
        let flat = flatten_comment_tree(&tree, "p");
        let ids: Vec<&str> = flat.iter().map(|c| c.comment_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(flat[2].score, 0);
        assert_eq!(flat[2].created_utc, 0.0);
        assert_eq!(flat[2].body, "late reply");
    }
}
