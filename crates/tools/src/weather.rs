//! `get_weather` demo tool.
//!
//! Returns plausible, deterministic weather for any location so the agentic
//! loop can be exercised end-to-end without a weather API.

use edgee_core::error::ToolError;
use edgee_core::tool::{Arguments, ExecutableTool, ToolBuilder};
use serde::Serialize;
use serde_json::Value;

pub const NAME: &str = "get_weather";

pub fn tool() -> ExecutableTool {
    ToolBuilder::new(NAME, "Get the current weather for a location")
        .param("location", "string", "The city name", true)
        .enum_param("unit", &["celsius", "fahrenheit"], "Temperature unit (default: celsius)", false)
        .handler(get_weather)
}

fn get_weather(args: Arguments) -> Result<Value, ToolError> {
    let location = args
        .get("location")
        .and_then(Value::as_str)
        .filter(|l| !l.trim().is_empty())
        .ok_or("missing 'location' argument")?;

    let unit = match args.get("unit").and_then(Value::as_str) {
        None | Some("celsius") => Unit::Celsius,
        Some("fahrenheit") => Unit::Fahrenheit,
        Some(other) => return Err(format!("unsupported unit '{other}'").into()),
    };

    tracing::debug!(location, "Looking up weather");
    serde_json::to_value(mock_weather(location, unit)).map_err(|e| ToolError::failed(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Unit {
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Serialize)]
struct Weather {
    location: String,
    temperature: f64,
    unit: Unit,
    condition: &'static str,
    humidity: u32,
}

const CONDITIONS: [&str; 6] = ["sunny", "partly cloudy", "overcast", "light rain", "thunderstorms", "foggy"];

/// Deterministic weather keyed on a hash of the location name.
fn mock_weather(location: &str, unit: Unit) -> Weather {
    let hash: u32 = location
        .to_lowercase()
        .bytes()
        .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));

    let celsius = f64::from(hash % 40) - 5.0;
    let temperature = match unit {
        Unit::Celsius => celsius,
        Unit::Fahrenheit => (celsius * 9.0 / 5.0 + 32.0).round(),
    };

    Weather {
        location: location.to_string(),
        temperature,
        unit,
        condition: CONDITIONS[(hash as usize / 7) % CONDITIONS.len()],
        humidity: 30 + hash % 60,
    }
}
