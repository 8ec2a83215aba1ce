//! Typed results produced from model replies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A tool invocation requested by the model
///
/// `name` and `args` are always populated. When the model selected no tool
/// the action is the sentinel returned by [`Action::none`]: an empty name
/// and an empty argument map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Tool name
    pub name: String,

    /// Keyword arguments, in the order the model wrote them
    pub args: Map<String, Value>,
}

impl Action {
    /// Create an action for `name` with the given arguments
    pub fn new(name: impl Into<String>, args: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }

    /// The "no tool selected" sentinel
    pub fn none() -> Self {
        Self {
            name: String::new(),
            args: Map::new(),
        }
    }

    /// Whether this is the "no tool selected" sentinel
    pub fn is_none(&self) -> bool {
        self.name.is_empty()
    }

    /// Look up a single argument
    pub fn arg(&self, key: &str) -> Option<&Value> {
        self.args.get(key)
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::none()
    }
}

/// A goal decomposed into planning tasks
///
/// Task descriptors are opaque: they are relayed exactly as decoded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    /// Task descriptors in reply order
    pub tasks: Vec<Value>,

    /// Reserved for partial-failure reporting; empty on every success path
    #[serde(default)]
    pub error: String,
}

impl TaskList {
    /// Create a task list with no error
    pub fn new(tasks: Vec<Value>) -> Self {
        Self {
            tasks,
            error: String::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_action_none() {
        let action = Action::none();
        assert!(action.is_none());
        assert_eq!(action.name, "");
        assert!(action.args.is_empty());
        assert_eq!(action, Action::default());
    }

    #[test]
    fn test_action_arg_lookup() {
        let mut args = Map::new();
        args.insert("query".to_string(), json!("weather"));
        let action = Action::new("search", args);

        assert!(!action.is_none());
        assert_eq!(action.arg("query"), Some(&json!("weather")));
        assert!(action.arg("missing").is_none());
    }

    #[test]
    fn test_action_serializes_args_as_object() {
        let action = Action::none();
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value, json!({"name": "", "args": {}}));
    }

    #[test]
    fn test_task_list_default() {
        let list = TaskList::default();
        assert!(list.is_empty());
        assert_eq!(list.error, "");
    }

    #[test]
    fn test_task_list_deserialize_without_error() {
        let list: TaskList = serde_json::from_value(json!({"tasks": [{"id": 1}]})).unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list.error, "");
    }
}
