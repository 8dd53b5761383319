use dagforge_core::NodeTypeKey;
use serde::{Deserialize, Serialize};

/// Static, advertised shape of a registered node type. Purely descriptive —
/// the scheduler never enforces `input_count`/`output_count` itself, they
/// exist for editor UIs and `list_types()` callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetadata {
    pub type_key: NodeTypeKey,
    pub display_name: String,
    pub description: String,
    pub input_count: InputCount,
    pub output_count: usize,
    pub config_schema: Option<serde_json::Value>,
}

/// How many predecessor results a node type expects to receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputCount {
    /// No predecessors — a source node; receives `initial_input` raw.
    Zero,
    /// One or more predecessors — receives the `{pred_id: result}` map.
    AtLeastOne,
}

impl NodeMetadata {
    pub fn new(type_key: NodeTypeKey, display_name: impl Into<String>) -> Self {
        Self {
            type_key,
            display_name: display_name.into(),
            description: String::new(),
            input_count: InputCount::AtLeastOne,
            output_count: 1,
            config_schema: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_input_count(mut self, count: InputCount) -> Self {
        self.input_count = count;
        self
    }

    pub fn with_config_schema(mut self, schema: serde_json::Value) -> Self {
        self.config_schema = Some(schema);
        self
    }
}
