//! Tool definitions, handlers and the registry.
//!
//! A tool is a declared schema plus a local handler. Callers assemble one
//! with [`ToolBuilder`]; the result is immutable and lives in a
//! [`ToolRegistry`] that the agent loop reads from:
//! 1. to send tool definitions to the model,
//! 2. to look up the handler when the model requests a call.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::ToolError;
use crate::provider::{FunctionSpec, ToolSpec};

/// Parsed tool arguments.
pub type Arguments = Map<String, Value>;

/// A local tool implementation.
///
/// Handlers are synchronous and have no timeout of their own. They may have
/// side effects but must be callable from any thread.
pub trait ToolHandler: Send + Sync {
    fn call(&self, arguments: Arguments) -> std::result::Result<Value, ToolError>;
}

impl<F> ToolHandler for F
where
    F: Fn(Arguments) -> std::result::Result<Value, ToolError> + Send + Sync,
{
    fn call(&self, arguments: Arguments) -> std::result::Result<Value, ToolError> {
        self(arguments)
    }
}

/// The declared shape of a tool, as shown to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    name: String,
    description: String,
    properties: Map<String, Value>,
    required: Vec<String>,
}

impl ToolDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Names of required parameters, in declaration order.
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// JSON Schema of the parameters object.
    pub fn parameters(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": self.properties,
            "required": self.required,
        })
    }

    /// Convert into the wire representation.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            kind: "function".into(),
            function: FunctionSpec {
                name: self.name.clone(),
                description: Some(self.description.clone()),
                parameters: Some(self.parameters()),
            },
        }
    }
}

/// Builder for a [`ToolDefinition`], scoped to construction only.
///
/// ```
/// use edgee_core::tool::ToolBuilder;
///
/// let tool = ToolBuilder::new("get_weather", "Get the current weather for a location")
///     .param("location", "string", "The city name", true)
///     .enum_param("unit", &["celsius", "fahrenheit"], "Temperature unit", false)
///     .handler(|args| {
///         let location = args.get("location").and_then(|v| v.as_str()).unwrap_or_default();
///         Ok(serde_json::json!({ "location": location, "temperature": 22 }))
///     });
/// assert_eq!(tool.definition().required(), ["location"]);
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct ToolBuilder {
    definition: ToolDefinition,
}

impl ToolBuilder {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            definition: ToolDefinition {
                name: name.into(),
                description: description.into(),
                properties: Map::new(),
                required: Vec::new(),
            },
        }
    }

    /// Declare a parameter of JSON type `kind`. Redeclaring a name replaces it.
    pub fn param(self, name: &str, kind: &str, description: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": kind, "description": description }),
            required,
        )
    }

    /// Declare a string parameter restricted to `values`.
    pub fn enum_param(self, name: &str, values: &[&str], description: &str, required: bool) -> Self {
        self.property(
            name,
            serde_json::json!({ "type": "string", "enum": values, "description": description }),
            required,
        )
    }

    fn property(mut self, name: &str, schema: Value, required: bool) -> Self {
        let def = &mut self.definition;
        def.properties.insert(name.to_string(), schema);
        def.required.retain(|r| r != name);
        if required {
            def.required.push(name.to_string());
        }
        self
    }

    /// Finish without a handler.
    pub fn build(self) -> ToolDefinition {
        self.definition
    }

    /// Attach a closure handler.
    pub fn handler<F>(self, handler: F) -> ExecutableTool
    where
        F: Fn(Arguments) -> std::result::Result<Value, ToolError> + Send + Sync + 'static,
    {
        self.with_handler(handler)
    }

    /// Attach any [`ToolHandler`] implementation.
    pub fn with_handler(self, handler: impl ToolHandler + 'static) -> ExecutableTool {
        ExecutableTool {
            definition: self.definition,
            handler: Arc::new(handler),
        }
    }
}

/// A tool definition paired with its handler.
#[derive(Clone)]
pub struct ExecutableTool {
    definition: ToolDefinition,
    handler: Arc<dyn ToolHandler>,
}

impl ExecutableTool {
    pub fn new(definition: ToolDefinition, handler: Arc<dyn ToolHandler>) -> Self {
        Self { definition, handler }
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// A shared handle to the handler, for running it off the async runtime.
    pub fn handler(&self) -> Arc<dyn ToolHandler> {
        Arc::clone(&self.handler)
    }
}

impl std::fmt::Debug for ExecutableTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutableTool")
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

/// A registry of available tools.
///
/// Read-only while a loop runs; wrap it in an `Arc` to share it across
/// concurrent invocations.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, ExecutableTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Replaces any existing tool with the same name.
    pub fn register(&mut self, tool: ExecutableTool) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ExecutableTool> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All definitions, in registration order.
    pub fn definitions(&self) -> Vec<&ToolDefinition> {
        self.iter().map(ExecutableTool::definition).collect()
    }

    /// Wire specs for every tool, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.iter().map(|t| t.definition().to_spec()).collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutableTool> {
        self.order.iter().filter_map(|name| self.tools.get(name))
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl FromIterator<ExecutableTool> for ToolRegistry {
    fn from_iter<I: IntoIterator<Item = ExecutableTool>>(iter: I) -> Self {
        let mut registry = Self::new();
        for tool in iter {
            registry.register(tool);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_tool() -> ExecutableTool {
        ToolBuilder::new("echo", "Echoes back the input")
            .param("text", "string", "Text to echo", true)
            .handler(|args| Ok(args.get("text").cloned().unwrap_or(Value::Null)))
    }

    #[test]
    fn builder_produces_json_schema() {
        let def = ToolBuilder::new("get_weather", "Weather lookup")
            .param("location", "string", "The city name", true)
            .enum_param("unit", &["celsius", "fahrenheit"], "Unit", false)
            .build();

        let schema = def.parameters();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["location"]["type"], "string");
        assert_eq!(schema["properties"]["unit"]["enum"][1], "fahrenheit");
        assert_eq!(schema["required"], serde_json::json!(["location"]));
    }

    #[test]
    fn redeclared_param_replaces_previous() {
        let def = ToolBuilder::new("t", "d")
            .param("x", "string", "first", true)
            .param("x", "number", "second", false)
            .build();
        assert_eq!(def.parameters()["properties"]["x"]["type"], "number");
        assert!(def.required().is_empty());
    }

    #[test]
    fn builder_steps_do_not_share_state() {
        let base = ToolBuilder::new("t", "d").param("a", "string", "a", true);
        let extended = base.clone().param("b", "string", "b", true).build();
        let plain = base.build();
        assert_eq!(plain.required(), ["a"]);
        assert_eq!(extended.required(), ["a", "b"]);
    }

    #[test]
    fn spec_has_wire_shape() {
        let spec = echo_tool().definition().to_spec();
        let json = serde_json::to_value(&spec).unwrap();
        assert_eq!(json["type"], "function");
        assert_eq!(json["function"]["name"], "echo");
        assert_eq!(json["function"]["description"], "Echoes back the input");
        assert_eq!(json["function"]["parameters"]["required"][0], "text");
    }

    #[test]
    fn registry_register_and_lookup() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        assert!(registry.get("echo").is_some());
        assert!(registry.get("nonexistent").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registry_keeps_registration_order() {
        let registry: ToolRegistry = ["b", "a", "c"]
            .into_iter()
            .map(|name| ToolBuilder::new(name, "d").handler(|_| Ok(Value::Null)))
            .collect();
        assert_eq!(registry.names(), vec!["b", "a", "c"]);
        let specs = registry.specs();
        assert_eq!(specs[0].function.name, "b");
        assert_eq!(specs[2].function.name, "c");
    }

    #[test]
    fn registry_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(echo_tool());
        registry.register(ToolBuilder::new("echo", "v2").handler(|_| Ok(Value::Null)));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.names(), vec!["echo"]);
        assert_eq!(registry.get("echo").unwrap().definition().description(), "v2");
    }

    #[test]
    fn handler_is_invoked_with_arguments() {
        let tool = echo_tool();
        let mut args = Arguments::new();
        args.insert("text".into(), Value::from("hello world"));
        let result = tool.handler().call(args).unwrap();
        assert_eq!(result, "hello world");
    }
}
