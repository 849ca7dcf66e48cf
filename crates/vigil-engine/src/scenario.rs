//! Scenario definitions
//!
//! A scenario file is TOML with a description, tag labels and an ordered list
//! of steps:
//!
//! ```toml
//! description = "Round-trip an object through the object store"
//! tags = ["@s3", "@smoke"]
//!
//! [[steps]]
//! action = "put_object"
//! bucket = "fixtures"
//! key = "hello.txt"
//! content = "hi"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use vigil_core::DynamicValue;

/// Strip surrounding whitespace and one leading `@` from a tag label
pub fn normalize_tag(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('@').unwrap_or(tag)
}

/// On-disk form of a scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioFile {
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Tag labels, conventionally `@`-prefixed
    #[serde(default)]
    pub tags: Vec<String>,
    /// Steps executed in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// A loaded scenario; immutable once it is in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    id: String,
    tags: Vec<String>,
    description: String,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a scenario from its identifier and file contents
    pub fn new(id: impl Into<String>, file: ScenarioFile) -> Self {
        let mut tags: Vec<String> = Vec::with_capacity(file.tags.len());
        for tag in file.tags {
            if !tags.iter().any(|t| normalize_tag(t) == normalize_tag(&tag)) {
                tags.push(tag);
            }
        }
        Self {
            id: id.into(),
            tags,
            description: file.description,
            steps: file.steps,
        }
    }

    /// Scenario with tags and no steps
    pub fn tagged<I, S>(id: impl Into<String>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            id,
            ScenarioFile {
                tags: tags.into_iter().map(Into::into).collect(),
                ..ScenarioFile::default()
            },
        )
    }

    /// Path identifier, unique within a catalog
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Tag labels as written, in declaration order, without duplicates
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Human-readable description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Steps executed in order
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Whether the scenario carries `tag`, ignoring a leading `@` on either side
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = normalize_tag(tag);
        self.tags.iter().any(|t| normalize_tag(t) == wanted)
    }
}

fn default_true() -> bool {
    true
}

fn default_max_messages() -> usize {
    10
}

/// One declarative scenario step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case", deny_unknown_fields)]
pub enum Step {
    /// Write an object
    PutObject {
        /// Bucket name, qualified with the environment prefix
        bucket: String,
        /// Object key
        key: String,
        /// Content; `${var}` placeholders are expanded
        content: String,
        /// User metadata; `${var}` placeholders in values are expanded
        #[serde(default)]
        metadata: BTreeMap<String, String>,
    },
    /// Read an object, optionally checking its content
    ReadObject {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Expected content
        expect: Option<String>,
    },
    /// Read an object's size and user metadata
    HeadObject {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Expected content length in bytes
        expect_length: Option<u64>,
        /// Metadata entries the object must carry
        #[serde(default)]
        expect_metadata: BTreeMap<String, String>,
    },
    /// Check whether an object exists
    ObjectExists {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
        /// Expected existence
        #[serde(default = "default_true")]
        expect: bool,
    },
    /// List keys in a bucket
    ListObjects {
        /// Bucket name
        bucket: String,
        /// Key prefix filter
        prefix: Option<String>,
        /// Expected keys, in order
        expect: Option<Vec<String>>,
        /// Expected number of keys
        expect_count: Option<usize>,
    },
    /// Copy an object
    CopyObject {
        /// Source bucket
        source_bucket: String,
        /// Source key
        source_key: String,
        /// Destination bucket
        dest_bucket: String,
        /// Destination key
        dest_key: String,
    },
    /// Delete an object
    DeleteObject {
        /// Bucket name
        bucket: String,
        /// Object key
        key: String,
    },
    /// Delete several objects from one bucket
    DeleteObjects {
        /// Bucket name
        bucket: String,
        /// Object keys; missing keys are skipped
        keys: Vec<String>,
    },
    /// Write a table item
    PutItem {
        /// Table name, qualified with the environment prefix
        table: String,
        /// Key attribute name
        key: String,
        /// Item; must be a map containing `key`
        item: DynamicValue,
    },
    /// Fetch a table item by key
    GetItem {
        /// Table name
        table: String,
        /// Key attribute name
        key: String,
        /// Key value
        value: DynamicValue,
        /// Fields the item must contain
        expect: Option<DynamicValue>,
        /// Require that no item exists
        #[serde(default)]
        expect_missing: bool,
    },
    /// Delete a table item by key
    DeleteItem {
        /// Table name
        table: String,
        /// Key attribute name
        key: String,
        /// Key value
        value: DynamicValue,
    },
    /// Find items by attribute equality
    QueryItems {
        /// Table name
        table: String,
        /// Attribute compared
        attribute: String,
        /// Required value
        value: DynamicValue,
        /// Expected number of matches
        expect_count: Option<usize>,
    },
    /// Read every item of a table
    ScanItems {
        /// Table name
        table: String,
        /// Expected number of items
        expect_count: Option<usize>,
    },
    /// Invoke a function with a JSON payload
    InvokeFunction {
        /// Registered function name
        function: String,
        /// Payload, sent as JSON
        #[serde(default)]
        payload: DynamicValue,
        /// Fields the response must contain
        expect: Option<DynamicValue>,
    },
    /// Enqueue a message
    SendMessage {
        /// Queue name, qualified with the environment prefix
        queue: String,
        /// Message body; `${var}` placeholders are expanded
        body: String,
    },
    /// Receive messages
    ReceiveMessages {
        /// Queue name
        queue: String,
        /// Upper bound on messages received
        #[serde(default = "default_max_messages")]
        max: usize,
        /// Expected bodies, in order
        expect_bodies: Option<Vec<String>>,
        /// Expected number of messages
        expect_count: Option<usize>,
        /// Acknowledge received messages
        #[serde(default = "default_true")]
        delete: bool,
    },
    /// Publish to a topic
    Publish {
        /// Topic name, qualified with the environment prefix
        topic: String,
        /// Message; `${var}` placeholders are expanded
        message: String,
    },
    /// Run a relational query
    SqlQuery {
        /// Statement text
        statement: String,
        /// Positional parameters
        #[serde(default)]
        params: Vec<DynamicValue>,
        /// Expected number of rows
        expect_count: Option<usize>,
        /// Fields each row must contain, row by row
        expect: Option<Vec<DynamicValue>>,
    },
    /// Run a relational update
    SqlUpdate {
        /// Statement text
        statement: String,
        /// Positional parameters
        #[serde(default)]
        params: Vec<DynamicValue>,
        /// Expected affected row count
        expect_affected: Option<u64>,
    },
    /// Pause
    Sleep {
        /// Milliseconds
        ms: u64,
    },
    /// Fail the scenario
    Fail {
        /// Reported error detail
        reason: String,
    },
}

impl Step {
    /// The `action` name of this step
    pub fn action(&self) -> &'static str {
        match self {
            Step::PutObject { .. } => "put_object",
            Step::ReadObject { .. } => "read_object",
            Step::HeadObject { .. } => "head_object",
            Step::ObjectExists { .. } => "object_exists",
            Step::ListObjects { .. } => "list_objects",
            Step::CopyObject { .. } => "copy_object",
            Step::DeleteObject { .. } => "delete_object",
            Step::DeleteObjects { .. } => "delete_objects",
            Step::PutItem { .. } => "put_item",
            Step::GetItem { .. } => "get_item",
            Step::DeleteItem { .. } => "delete_item",
            Step::QueryItems { .. } => "query_items",
            Step::ScanItems { .. } => "scan_items",
            Step::InvokeFunction { .. } => "invoke_function",
            Step::SendMessage { .. } => "send_message",
            Step::ReceiveMessages { .. } => "receive_messages",
            Step::Publish { .. } => "publish",
            Step::SqlQuery { .. } => "sql_query",
            Step::SqlUpdate { .. } => "sql_update",
            Step::Sleep { .. } => "sleep",
            Step::Fail { .. } => "fail",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_scenario_file() {
        let file: ScenarioFile = toml::from_str(
            r#"
description = "orders table round trip"
tags = ["@dynamodb", "@smoke", "smoke"]

[[steps]]
action = "put_item"
table = "orders"
key = "id"
item = { id = "o-1", total = 12.5, lines = [1, 2] }

[[steps]]
action = "get_item"
table = "orders"
key = "id"
value = "o-1"
expect = { total = 12.5 }

[[steps]]
action = "sleep"
ms = 5
"#,
        )
        .unwrap();

        let scenario = Scenario::new("dynamodb/orders.toml", file);
        assert_eq!(scenario.tags(), ["@dynamodb", "@smoke"]);
        assert_eq!(scenario.steps().len(), 3);
        assert_eq!(scenario.steps()[1].action(), "get_item");
        assert!(matches!(scenario.steps()[2], Step::Sleep { ms: 5 }));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let result = toml::from_str::<ScenarioFile>("[[steps]]\naction = \"reboot\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn defaults_apply() {
        let file: ScenarioFile = toml::from_str(
            "[[steps]]\naction = \"object_exists\"\nbucket = \"b\"\nkey = \"k\"\n\n[[steps]]\naction = \"receive_messages\"\nqueue = \"q\"\n",
        )
        .unwrap();
        assert!(matches!(file.steps[0], Step::ObjectExists { expect: true, .. }));
        assert!(matches!(
            file.steps[1],
            Step::ReceiveMessages { max: 10, delete: true, .. }
        ));
    }

    #[test]
    fn tag_matching_ignores_at_prefix() {
        let scenario = Scenario::tagged("a.toml", ["@smoke"]);
        assert!(scenario.has_tag("smoke"));
        assert!(scenario.has_tag("@smoke"));
        assert!(!scenario.has_tag("s3"));
        assert_eq!(normalize_tag(" @s3 "), "s3");
    }
}
