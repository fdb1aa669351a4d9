//! `edgee tools`: List the demo tools offered to the model.

pub fn run() -> anyhow::Result<()> {
    let registry = edgee_tools::default_registry();

    println!("Available tools ({}):", registry.len());
    for definition in registry.definitions() {
        println!();
        println!("  {}: {}", definition.name(), definition.description());
        let schema = serde_json::to_string_pretty(&definition.parameters())?;
        for line in schema.lines() {
            println!("    {line}");
        }
    }
    Ok(())
}
