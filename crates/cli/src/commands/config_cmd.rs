//! `edgee config`: Show the resolved configuration.

use edgee_config::ClientConfig;

pub fn run() -> anyhow::Result<()> {
    let path = ClientConfig::config_dir().join("config.toml");
    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not found, using defaults)");
    }

    match ClientConfig::load() {
        Ok(config) => {
            if !config.has_api_key() {
                println!("  Warning: EDGEE_API_KEY is not set");
            }
            println!();
            print!("{}", render(&config)?);
        }
        Err(e) => {
            println!("  Config error: {e}");
            std::process::exit(1);
        }
    }
    Ok(())
}

/// TOML view of the configuration with the key redacted.
fn render(config: &ClientConfig) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    Ok(toml::to_string_pretty(&shown)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_redacts_key() {
        let config = ClientConfig {
            api_key: Some("sk-live-123".into()),
            ..ClientConfig::default()
        };
        let out = render(&config).unwrap();
        assert!(!out.contains("sk-live-123"));
        assert!(out.contains("[REDACTED]"));
        assert!(out.contains("base_url = \"https://api.edgee.ai\""));
    }
}
