//! Tool definitions and executor for agent tool use.
//!
//! Provides the product search tool an agent can call to answer questions
//! about the catalog. The caller's row-level security identity is fixed when
//! the executor is built from the request context; the model never chooses
//! it.

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use zava_core::{MaxRows, ResultEnvelope, RlsUserId, SearchRequest};

use crate::service::ProductSearchService;

/// Name of the product search tool.
pub const GET_PRODUCTS_BY_NAME: &str = "get_products_by_name";

/// A tool definition exposed to the agent layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name the agent calls.
    pub name: String,
    /// What the tool does, for the model.
    pub description: String,
    /// JSON schema of the tool input.
    pub input_schema: serde_json::Value,
}

/// Get the list of tools available to the agent.
#[must_use]
pub fn sales_tools() -> Vec<Tool> {
    vec![Tool {
        name: GET_PRODUCTS_BY_NAME.to_string(),
        description: "Search Zava products by name or description. Returns product name, type, category, price, image URL, and total stock across stores, ordered by product name.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "product_name": {
                    "type": "string",
                    "description": "Text to look for in product names and descriptions (case-insensitive, e.g. 'paint', 'drill')"
                },
                "max_rows": {
                    "type": "integer",
                    "description": "Maximum number of products to return (1-100, default 20)",
                    "minimum": MaxRows::MIN,
                    "maximum": MaxRows::MAX
                }
            },
            "required": ["product_name"]
        }),
    }]
}

/// Get a tool by name.
#[must_use]
pub fn get_tool_by_name(name: &str) -> Option<Tool> {
    sales_tools().into_iter().find(|t| t.name == name)
}

/// Executor for product search tools.
///
/// One executor per request context: it carries the identity every search
/// it runs is scoped to.
pub struct ToolExecutor<'a> {
    service: &'a ProductSearchService,
    identity: RlsUserId,
}

impl<'a> ToolExecutor<'a> {
    /// Create an executor that searches as `identity`.
    #[must_use]
    pub const fn new(service: &'a ProductSearchService, identity: RlsUserId) -> Self {
        Self { service, identity }
    }

    /// Execute a tool and return its result envelope as JSON text.
    ///
    /// Never fails: an unknown tool or malformed input produces an error
    /// envelope, as does any search failure.
    #[instrument(skip(self, input), fields(manager = self.identity.is_manager()))]
    pub async fn execute(&self, name: &str, input: &serde_json::Value) -> String {
        match name {
            GET_PRODUCTS_BY_NAME => match self.parse_search(input) {
                Ok(request) => self.service.search_envelope(&request).await.to_json(),
                Err(message) => ResultEnvelope::failure(message).to_json(),
            },
            _ => ResultEnvelope::failure(format!("Unknown tool: {name}")).to_json(),
        }
    }

    /// Build a search request from tool input.
    fn parse_search(&self, input: &serde_json::Value) -> Result<SearchRequest, String> {
        let product_name = input["product_name"]
            .as_str()
            .ok_or_else(|| "Missing required field: product_name".to_string())?;

        let max_rows = match &input["max_rows"] {
            serde_json::Value::Null => MaxRows::DEFAULT.get(),
            value => value
                .as_i64()
                .or_else(|| value.as_f64().map(float_to_rows))
                .ok_or_else(|| "Invalid field: max_rows must be an integer".to_string())?,
        };

        Ok(SearchRequest::new(
            product_name,
            max_rows,
            self.identity.clone(),
        ))
    }
}

/// Agents sometimes send `20.0`; truncate and saturate, clamping happens later.
#[allow(clippy::cast_possible_truncation)] // saturating float-to-int cast is intended
fn float_to_rows(value: f64) -> i64 {
    value as i64
}
