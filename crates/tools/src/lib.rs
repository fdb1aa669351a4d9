//! Demo tool implementations for the Edgee SDK.
//!
//! Every tool is assembled with `ToolBuilder` and backed by a plain
//! function, the same way SDK users define their own.

pub mod calculator;
pub mod weather;

use edgee_core::tool::{ExecutableTool, ToolRegistry};

/// All demo tools, in registration order.
pub fn all() -> Vec<ExecutableTool> {
    vec![weather::tool(), calculator::tool()]
}

/// Create a registry with all demo tools.
pub fn default_registry() -> ToolRegistry {
    all().into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_demo_tools() {
        let registry = default_registry();
        assert_eq!(registry.names(), vec!["get_weather", "calculator"]);
        assert!(registry.specs().iter().all(|s| s.kind == "function"));
    }
}
