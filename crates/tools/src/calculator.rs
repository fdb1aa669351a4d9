//! `calculator` demo tool: one arithmetic operation on two numbers.

use edgee_core::error::ToolError;
use edgee_core::tool::{Arguments, ExecutableTool, ToolBuilder};
use serde_json::Value;

pub const NAME: &str = "calculator";

pub fn tool() -> ExecutableTool {
    ToolBuilder::new(NAME, "Perform a basic arithmetic operation on two numbers")
        .param("a", "number", "The first operand", true)
        .param("b", "number", "The second operand", true)
        .enum_param(
            "operation",
            &["add", "subtract", "multiply", "divide"],
            "The operation to perform",
            true,
        )
        .handler(calculate)
}

fn number(args: &Arguments, name: &str) -> Result<f64, ToolError> {
    args.get(name)
        .and_then(Value::as_f64)
        .ok_or_else(|| ToolError::failed(format!("'{name}' must be a number")))
}

fn calculate(args: Arguments) -> Result<Value, ToolError> {
    let a = number(&args, "a")?;
    let b = number(&args, "b")?;
    let operation = args
        .get("operation")
        .and_then(Value::as_str)
        .ok_or("missing 'operation' argument")?;

    let result = match operation {
        "add" => a + b,
        "subtract" => a - b,
        "multiply" => a * b,
        "divide" if b == 0.0 => return Err("division by zero".into()),
        "divide" => a / b,
        other => return Err(format!("unknown operation '{other}'").into()),
    };

    Ok(serde_json::json!({ "operation": operation, "result": result }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(args: Value) -> Result<Value, ToolError> {
        let Value::Object(map) = args else {
            panic!("arguments must be an object");
        };
        tool().handler().call(map)
    }

    #[test]
    fn basic_operations() {
        let cases = [("add", 12.0), ("subtract", 4.0), ("multiply", 32.0), ("divide", 2.0)];
        for (operation, expected) in cases {
            let out = call(json!({"a": 8, "b": 4, "operation": operation})).unwrap();
            assert_eq!(out["result"].as_f64(), Some(expected), "{operation}");
        }
    }

    #[test]
    fn division_by_zero_is_error() {
        let err = call(json!({"a": 1, "b": 0, "operation": "divide"})).unwrap_err();
        assert_eq!(err.to_string(), "Tool execution failed: division by zero");
    }

    #[test]
    fn non_numeric_operand_is_error() {
        let err = call(json!({"a": "one", "b": 2, "operation": "add"})).unwrap_err();
        assert_eq!(err.reason(), "'a' must be a number");
    }

    #[test]
    fn unknown_operation_is_error() {
        let err = call(json!({"a": 1, "b": 2, "operation": "pow"})).unwrap_err();
        assert!(err.reason().contains("pow"));
    }
}
