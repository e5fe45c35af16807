pub fn all_page_titles() -> String {
    "[:find ?title ?uid :where [?e :node/title ?title] [?e :block/uid ?uid]]".into()
}

/// Blocks referencing the `Aliases` page, paired with the page they live on.
pub fn alias_blocks() -> String {
    "[:find (pull ?page [:node/title]) (pull ?block [:block/string]) \
     :where [?aliases :node/title \"Aliases\"] \
            [?block :block/refs ?aliases] \
            [?block :block/page ?page]]"
        .into()
}

/// Blocks whose string contains at least one of `tokens` (case-sensitive).
pub fn blocks_containing(tokens: &[String]) -> (String, Vec<serde_json::Value>) {
    let query = "[:find ?uid ?string :in $ [?token ...] \
                 :where [?b :block/string ?string] \
                        [?b :block/uid ?uid] \
                        [(clojure.string/includes? ?string ?token)]]"
        .into();
    let tokens = tokens
        .iter()
        .map(|t| serde_json::Value::String(t.clone()))
        .collect();
    (query, vec![serde_json::Value::Array(tokens)])
}

pub fn child_count(parent_uid: &str) -> (String, Vec<serde_json::Value>) {
    let query = "[:find (count ?c) :in $ ?uid \
                 :where [?p :block/uid ?uid] [?p :block/children ?c]]"
        .into();
    (query, vec![serde_json::Value::String(parent_uid.to_string())])
}

pub fn daily_note_uid_for_date(month: u32, day: u32, year: i32) -> String {
    format!("{:02}-{:02}-{}", month, day, year)
}

pub fn pull_page_tree(uid: &str) -> (serde_json::Value, String) {
    let eid = serde_json::Value::String(format!("[:block/uid \"{}\"]", uid));
    let selector = "[:node/title :block/uid :block/string {:block/children [:block/uid :block/string :block/order :block/open {:block/children ...}]}]".to_string();
    (eid, selector)
}
