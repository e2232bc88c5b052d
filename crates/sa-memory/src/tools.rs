//! The four memory tools Section 4.6's `Tools()` operation exposes to the
//! Agent loop.
//!
//! Grounded on `sa_tools::AddTool`'s shape: one `Tool` struct per
//! operation, each holding the `Arc<dyn Service>` it delegates to and a
//! JSON schema naming its arguments. `ToolContext` carries no app/user
//! scoping of its own (Section 4.7 only gives it `call_id`/`tool_name`/
//! `invocation_id`/`request_id`), so these tools take `app_name`/`user_id`
//! as ordinary arguments the same way the model would supply any other
//! field.

use std::sync::Arc;

use async_trait::async_trait;
use sa_tools::{Tool, ToolContext, ToolDeclaration, ToolError, ToolResult};
use serde_json::Value;

use crate::service::Service;
use crate::types::{SearchOptions, SortBy, SortOrder};

fn require_str<'a>(args: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    args.get(field).and_then(Value::as_str).ok_or_else(|| ToolError::InvalidArgs(format!("missing or non-string field \"{field}\"")))
}

pub struct MemoryAddTool(pub Arc<dyn Service>);

#[async_trait]
impl Tool for MemoryAddTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "memory_add".into(),
            description: "Stores a fact in long-term memory for a user.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "app_name": {"type": "string"},
                    "user_id": {"type": "string"},
                    "content": {"type": "string"},
                    "session_id": {"type": "string"}
                },
                "required": ["app_name", "user_id", "content"]
            }),
            output_schema: Some(serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}})),
        }
    }

    async fn call(&self, _ctx: ToolContext, args: Value) -> ToolResult {
        let app_name = require_str(&args, "app_name")?;
        let user_id = require_str(&args, "user_id")?;
        let content = require_str(&args, "content")?;
        let session_id = args.get("session_id").and_then(Value::as_str).unwrap_or("");

        let entry = self.0.add_session_to_memory(app_name, user_id, session_id, content).await.map_err(|e| ToolError::Failed(e.to_string()))?;
        Ok(serde_json::json!({"id": entry.id}))
    }
}

pub struct MemorySearchTool(pub Arc<dyn Service>);

#[async_trait]
impl Tool for MemorySearchTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "memory_search".into(),
            description: "Searches long-term memory for entries relevant to a query.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "app_name": {"type": "string"},
                    "user_id": {"type": "string"},
                    "query": {"type": "string"},
                    "limit": {"type": "integer"}
                },
                "required": ["app_name", "user_id", "query"]
            }),
            output_schema: None,
        }
    }

    async fn call(&self, _ctx: ToolContext, args: Value) -> ToolResult {
        let app_name = require_str(&args, "app_name")?;
        let user_id = require_str(&args, "user_id")?;
        let query = require_str(&args, "query")?;
        let limit = args.get("limit").and_then(Value::as_u64).map(|n| n as usize);

        let options = SearchOptions { limit, ..Default::default() };
        let response = self.0.search_memory(app_name, user_id, query, options).await.map_err(|e| ToolError::Failed(e.to_string()))?;

        let entries: Vec<Value> = response
            .entries
            .iter()
            .map(|e| serde_json::json!({"id": e.id, "content": e.content, "score": e.score}))
            .collect();
        Ok(serde_json::json!({"entries": entries, "total_count": response.total_count}))
    }
}

pub struct MemoryLoadTool(pub Arc<dyn Service>);

#[async_trait]
impl Tool for MemoryLoadTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "memory_load".into(),
            description: "Loads the most recent memory entries for a user without a search query.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "app_name": {"type": "string"},
                    "user_id": {"type": "string"},
                    "limit": {"type": "integer"}
                },
                "required": ["app_name", "user_id"]
            }),
            output_schema: None,
        }
    }

    async fn call(&self, _ctx: ToolContext, args: Value) -> ToolResult {
        let app_name = require_str(&args, "app_name")?;
        let user_id = require_str(&args, "user_id")?;
        let limit = args.get("limit").and_then(Value::as_u64).map(|n| n as usize);

        let options = SearchOptions { limit, sort_by: Some(SortBy::Timestamp), sort_order: Some(SortOrder::Desc), ..Default::default() };
        let response = self.0.search_memory(app_name, user_id, "", options).await.map_err(|e| ToolError::Failed(e.to_string()))?;

        let entries: Vec<Value> = response.entries.iter().map(|e| serde_json::json!({"id": e.id, "content": e.content})).collect();
        Ok(serde_json::json!({"entries": entries}))
    }
}

pub struct MemoryUpdateTool(pub Arc<dyn Service>);

#[async_trait]
impl Tool for MemoryUpdateTool {
    fn declaration(&self) -> ToolDeclaration {
        ToolDeclaration {
            name: "memory_update".into(),
            description: "Replaces the content of an existing memory entry.".into(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "app_name": {"type": "string"},
                    "memory_id": {"type": "string"},
                    "content": {"type": "string"}
                },
                "required": ["app_name", "memory_id", "content"]
            }),
            output_schema: Some(serde_json::json!({"type": "object", "properties": {"id": {"type": "string"}}})),
        }
    }

    async fn call(&self, _ctx: ToolContext, args: Value) -> ToolResult {
        let app_name = require_str(&args, "app_name")?;
        let memory_id = require_str(&args, "memory_id")?;
        let content = require_str(&args, "content")?;

        let entry = self.0.update_memory(app_name, memory_id, content).await.map_err(|e| ToolError::Failed(e.to_string()))?;
        Ok(serde_json::json!({"id": entry.id}))
    }
}

pub fn memory_tools(service: Arc<dyn Service>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(MemoryAddTool(service.clone())),
        Arc::new(MemorySearchTool(service.clone())),
        Arc::new(MemoryLoadTool(service.clone())),
        Arc::new(MemoryUpdateTool(service)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::in_memory::InMemoryMemoryService;

    fn ctx() -> ToolContext {
        ToolContext { call_id: "c1".into(), tool_name: "memory_add".into(), invocation_id: "inv".into(), request_id: "req".into() }
    }

    #[tokio::test]
    async fn memory_tools_round_trip_through_add_search_load_update() {
        let service: Arc<dyn Service> = Arc::new(InMemoryMemoryService::new());
        let tools = memory_tools(service);
        assert_eq!(tools.len(), 4);
        let add = tools.iter().find(|t| t.declaration().name == "memory_add").unwrap();
        let search = tools.iter().find(|t| t.declaration().name == "memory_search").unwrap();
        let load = tools.iter().find(|t| t.declaration().name == "memory_load").unwrap();
        let update = tools.iter().find(|t| t.declaration().name == "memory_update").unwrap();

        let added = add.call(ctx(), serde_json::json!({"app_name": "app", "user_id": "u1", "content": "the launch date is June"})).await.unwrap();
        let id = added["id"].as_str().unwrap().to_string();

        let found = search.call(ctx(), serde_json::json!({"app_name": "app", "user_id": "u1", "query": "launch date"})).await.unwrap();
        assert_eq!(found["total_count"], serde_json::json!(1));

        let loaded = load.call(ctx(), serde_json::json!({"app_name": "app", "user_id": "u1"})).await.unwrap();
        assert_eq!(loaded["entries"].as_array().unwrap().len(), 1);

        let updated = update.call(ctx(), serde_json::json!({"app_name": "app", "memory_id": id, "content": "the launch date is July"})).await.unwrap();
        assert_eq!(updated["id"], serde_json::json!(id));
    }

    #[tokio::test]
    async fn memory_add_rejects_missing_content() {
        let service: Arc<dyn Service> = Arc::new(InMemoryMemoryService::new());
        let add = MemoryAddTool(service);
        let err = add.call(ctx(), serde_json::json!({"app_name": "app", "user_id": "u1"})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}
