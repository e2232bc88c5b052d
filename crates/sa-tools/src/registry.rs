//! Tool registry — maps tool names to handlers (C3).
//!
//! Grounded on the teacher's `NodeTool`/`ToolRegistry`
//! (`crates/node-sdk/src/registry.rs`): an `async_trait` handler object
//! keyed by name in a `HashMap`, registered once at startup and looked up
//! per call. Dropped: capability-prefix derivation and the websocket node
//! protocol it served, since tools run in-process here rather than on a
//! remote node.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::types::{ToolContext, ToolDeclaration, ToolResult};

/// Implement this trait to expose a callable tool to the Agent loop.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    fn declaration(&self) -> ToolDeclaration;

    async fn call(&self, ctx: ToolContext, args: serde_json::Value) -> ToolResult;
}

#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: impl Tool) {
        let name = tool.declaration().name.clone();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Registers a tool that already lives behind an `Arc`, e.g. one handed
    /// back by a capability's `tools()` method rather than constructed fresh.
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.declaration().name.clone();
        self.tools.insert(name, tool);
    }

    pub fn get(&self, tool_name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(tool_name).cloned()
    }

    /// All declarations, sorted by name — the set the Agent offers the
    /// Model on every request (Section 4.7).
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        let mut decls: Vec<ToolDeclaration> = self.tools.values().map(|t| t.declaration()).collect();
        decls.sort_by(|a, b| a.name.cmp(&b.name));
        decls
    }

    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolError;

    struct Echo;
    #[async_trait]
    impl Tool for Echo {
        fn declaration(&self) -> ToolDeclaration {
            ToolDeclaration {
                name: "echo".into(),
                description: "returns its arguments unchanged".into(),
                input_schema: serde_json::json!({"type": "object"}),
                output_schema: None,
            }
        }

        async fn call(&self, _ctx: ToolContext, args: serde_json::Value) -> ToolResult {
            Ok(args)
        }
    }

    struct Fail;
    #[async_trait]
    impl Tool for Fail {
        fn declaration(&self) -> ToolDeclaration {
            ToolDeclaration {
                name: "fail".into(),
                description: "always fails".into(),
                input_schema: serde_json::json!({"type": "object"}),
                output_schema: None,
            }
        }

        async fn call(&self, _ctx: ToolContext, _args: serde_json::Value) -> ToolResult {
            Err(ToolError::Failed("intentional".into()))
        }
    }

    fn test_ctx(name: &str) -> ToolContext {
        ToolContext {
            call_id: "c1".into(),
            tool_name: name.into(),
            invocation_id: "inv".into(),
            request_id: "req".into(),
        }
    }

    #[test]
    fn register_and_lookup() {
        let mut reg = ToolRegistry::new();
        reg.register(Echo);
        assert!(reg.get("echo").is_some());
        assert!(reg.get("missing").is_none());
    }

    #[test]
    fn declarations_sorted_by_name() {
        let mut reg = ToolRegistry::new();
        reg.register(Fail);
        reg.register(Echo);
        let names: Vec<String> = reg.declarations().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["echo", "fail"]);
    }

    #[tokio::test]
    async fn echo_tool_returns_args() {
        let mut reg = ToolRegistry::new();
        reg.register(Echo);
        let handler = reg.get("echo").unwrap();
        let result = handler.call(test_ctx("echo"), serde_json::json!({"x": 1})).await;
        assert_eq!(result.unwrap(), serde_json::json!({"x": 1}));
    }

    #[tokio::test]
    async fn fail_tool_returns_error() {
        let mut reg = ToolRegistry::new();
        reg.register(Fail);
        let handler = reg.get("fail").unwrap();
        let result = handler.call(test_ctx("fail"), serde_json::json!({})).await;
        assert!(result.unwrap_err().to_string().contains("intentional"));
    }
}
