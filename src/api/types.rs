use serde::{Deserialize, Serialize};

use crate::corpus::AliasMap;

#[derive(Debug, Serialize)]
pub struct PullRequest {
    #[serde(rename = "eid")]
    pub eid: serde_json::Value,
    pub selector: String,
}

#[derive(Debug, Deserialize)]
pub struct PullResponse {
    pub result: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest {
    pub query: String,
    pub args: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub result: Vec<Vec<serde_json::Value>>,
}

/// A linkable page: its title is unique within the graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEntry {
    pub title: String,
    pub uid: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    pub uid: String,
    pub string: String,
    pub order: i64,
    #[serde(default)]
    pub children: Vec<Block>,
    #[serde(default)]
    pub open: bool,
}

/// A page pulled with its full block tree.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTree {
    pub uid: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl PageTree {
    pub fn from_pull_response(uid: String, result: &serde_json::Value) -> Self {
        // a block pulled on its own has no title; show its text instead
        let title = str_attr(result, ":node/title")
            .or_else(|| str_attr(result, ":block/string"))
            .unwrap_or_default();

        let blocks = result
            .get(":block/children")
            .and_then(|v| v.as_array())
            .map(|arr| parse_children(arr))
            .unwrap_or_default();

        Self { uid, title, blocks }
    }

    pub fn find_block(&self, uid: &str) -> Option<&Block> {
        find_in(&self.blocks, uid)
    }

    pub fn find_block_mut(&mut self, uid: &str) -> Option<&mut Block> {
        find_in_mut(&mut self.blocks, uid)
    }
}

fn find_in<'a>(blocks: &'a [Block], uid: &str) -> Option<&'a Block> {
    for block in blocks {
        if block.uid == uid {
            return Some(block);
        }
        if let Some(found) = find_in(&block.children, uid) {
            return Some(found);
        }
    }
    None
}

fn find_in_mut<'a>(blocks: &'a mut [Block], uid: &str) -> Option<&'a mut Block> {
    for block in blocks.iter_mut() {
        if block.uid == uid {
            return Some(block);
        }
        if let Some(found) = find_in_mut(&mut block.children, uid) {
            return Some(found);
        }
    }
    None
}

fn parse_children(arr: &[serde_json::Value]) -> Vec<Block> {
    let mut blocks: Vec<Block> = arr.iter().map(parse_block_from_json).collect();
    blocks.sort_by_key(|b| b.order);
    blocks
}

fn parse_block_from_json(val: &serde_json::Value) -> Block {
    let children = val
        .get(":block/children")
        .and_then(|v| v.as_array())
        .map(|arr| parse_children(arr))
        .unwrap_or_default();

    Block {
        uid: str_attr(val, ":block/uid").unwrap_or_default(),
        string: str_attr(val, ":block/string").unwrap_or_default(),
        order: val
            .get(":block/order")
            .and_then(|v| v.as_i64())
            .unwrap_or(0),
        children,
        open: val
            .get(":block/open")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
    }
}

/// Reads a pulled attribute, accepting both `:node/title` and bare `title` keys.
fn str_attr(val: &serde_json::Value, key: &str) -> Option<String> {
    let bare = key.rsplit('/').next().unwrap_or(key);
    val.get(key)
        .or_else(|| val.get(bare))
        .and_then(|v| v.as_str())
        .map(String::from)
}

/// Rows of `[title, uid]` → pages, dropping untitled entries.
pub fn parse_page_rows(rows: &[Vec<serde_json::Value>]) -> Vec<PageEntry> {
    rows.iter()
        .filter_map(|row| {
            let title = row.first()?.as_str()?;
            let uid = row.get(1)?.as_str()?;
            if title.is_empty() {
                return None;
            }
            Some(PageEntry {
                title: title.to_string(),
                uid: uid.to_string(),
            })
        })
        .collect()
}

/// Rows of `[uid, string]` → `(uid, text)` pairs in response order.
pub fn parse_block_rows(rows: &[Vec<serde_json::Value>]) -> Vec<(String, String)> {
    rows.iter()
        .filter_map(|row| {
            let uid = row.first()?.as_str()?;
            let text = row.get(1)?.as_str()?;
            Some((uid.to_string(), text.to_string()))
        })
        .collect()
}

/// Rows of `[(pull page [:node/title]), (pull block [:block/string])]` → alias map.
pub fn parse_alias_rows(rows: &[Vec<serde_json::Value>]) -> AliasMap {
    let mut map = AliasMap::new();
    for row in rows {
        let (Some(page), Some(block)) = (row.first(), row.get(1)) else {
            continue;
        };
        let (Some(title), Some(string)) = (str_attr(page, ":node/title"), str_attr(block, ":block/string"))
        else {
            continue;
        };
        for alias in parse_alias_list(&string) {
            map.insert(alias, title.clone());
        }
    }
    map
}

/// `Aliases:: NYC, Big Apple` → `["NYC", "Big Apple"]`.
pub fn parse_alias_list(string: &str) -> Vec<String> {
    string
        .strip_prefix("Aliases::")
        .unwrap_or(string)
        .split(',')
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}

/// Reads a single `(count ?x)` result, treating an empty result as zero.
pub fn parse_count(rows: &[Vec<serde_json::Value>]) -> usize {
    rows.first()
        .and_then(|row| row.first())
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as usize
}

#[derive(Debug, Serialize)]
#[serde(tag = "action")]
#[allow(clippy::enum_variant_names)]
pub enum WriteAction {
    #[serde(rename = "create-block")]
    CreateBlock {
        location: BlockLocation,
        block: NewBlock,
    },
    #[serde(rename = "update-block")]
    UpdateBlock { block: BlockUpdate },
}

#[derive(Debug, Serialize)]
pub struct BlockLocation {
    #[serde(rename = "parent-uid")]
    pub parent_uid: String,
    pub order: OrderValue,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OrderValue {
    Index(i64),
    Position(String),
}

#[derive(Debug, Serialize)]
pub struct NewBlock {
    pub string: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BlockUpdate {
    pub uid: String,
    pub string: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_response_deserializes_rows() {
        let raw = r#"{"result": [["Page A", "uid-a"], ["Page B", "uid-b"]]}"#;
        let resp: QueryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(resp.result.len(), 2);
        assert_eq!(resp.result[1][0], "Page B");
    }

    #[test]
    fn query_response_tolerates_missing_result() {
        let resp: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.result.is_empty());
    }

    #[test]
    fn page_rows_skip_untitled_and_malformed() {
        let rows = vec![
            vec![json!("Paris"), json!("p1")],
            vec![json!(""), json!("p2")],
            vec![json!("Orphan")],
            vec![json!(42), json!("p3")],
        ];
        let pages = parse_page_rows(&rows);
        assert_eq!(
            pages,
            vec![PageEntry {
                title: "Paris".into(),
                uid: "p1".into()
            }]
        );
    }

    #[test]
    fn alias_list_strips_attribute_prefix() {
        assert_eq!(
            parse_alias_list("Aliases:: NYC,  Big Apple , ,Gotham"),
            vec!["NYC", "Big Apple", "Gotham"]
        );
    }

    #[test]
    fn alias_rows_map_each_alias_to_its_page() {
        let rows = vec![
            vec![
                json!({":node/title": "New York City"}),
                json!({":block/string": "Aliases:: NYC, Big Apple"}),
            ],
            vec![
                json!({"title": "Los Angeles"}),
                json!({"string": "Aliases:: LA"}),
            ],
        ];
        let map = parse_alias_rows(&rows);
        assert_eq!(map.get("NYC"), Some("New York City"));
        assert_eq!(map.get("Big Apple"), Some("New York City"));
        assert_eq!(map.get("LA"), Some("Los Angeles"));
    }

    #[test]
    fn count_defaults_to_zero() {
        assert_eq!(parse_count(&[]), 0);
        assert_eq!(parse_count(&[vec![json!(3)]]), 3);
    }

    #[test]
    fn write_action_create_block_serializes() {
        let action = WriteAction::CreateBlock {
            location: BlockLocation {
                parent_uid: "parent".into(),
                order: OrderValue::Index(2),
            },
            block: NewBlock {
                string: "[](((abc)))".into(),
                uid: Some("child".into()),
            },
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "create-block");
        assert_eq!(json["location"]["parent-uid"], "parent");
        assert_eq!(json["location"]["order"], 2);
        assert_eq!(json["block"]["uid"], "child");
    }

    #[test]
    fn write_action_update_block_serializes() {
        let action = WriteAction::UpdateBlock {
            block: BlockUpdate {
                uid: "abc123".into(),
                string: "Updated content".into(),
            },
        };
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["action"], "update-block");
        assert_eq!(json["block"]["string"], "Updated content");
    }

    #[test]
    fn page_tree_from_pull_sorts_nested_children() {
        let pull = json!({
            ":node/title": "October 18th, 2026",
            ":block/children": [
                {":block/uid": "b2", ":block/string": "Second", ":block/order": 1},
                {
                    ":block/uid": "b1",
                    ":block/string": "First",
                    ":block/order": 0,
                    ":block/children": [
                        {":block/uid": "c2", ":block/string": "Child B", ":block/order": 1},
                        {":block/uid": "c1", ":block/string": "Child A", ":block/order": 0}
                    ]
                }
            ]
        });
        let tree = PageTree::from_pull_response("10-18-2026".into(), &pull);
        assert_eq!(tree.title, "October 18th, 2026");
        assert_eq!(tree.blocks[0].uid, "b1");
        assert_eq!(tree.blocks[0].children[0].string, "Child A");
        assert_eq!(tree.find_block("c2").unwrap().string, "Child B");
        assert!(tree.find_block("missing").is_none());
    }

    #[test]
    fn page_tree_from_block_pull_uses_block_text_as_title() {
        let pull = json!({":block/uid": "blk", ":block/string": "Zoomed in"});
        let tree = PageTree::from_pull_response("blk".into(), &pull);
        assert_eq!(tree.title, "Zoomed in");
        assert!(tree.blocks.is_empty());
    }
}
