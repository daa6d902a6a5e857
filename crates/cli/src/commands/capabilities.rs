//! `taskrelay capabilities`: What the registry offers.

use serde_json::{Value, json};
use taskrelay_config::AppConfig;
use taskrelay_core::capability::CapabilityDescriptor;

use super::build_runtime;

fn describe(descriptor: &CapabilityDescriptor) -> Value {
    json!({
        "name": descriptor.name(),
        "description": descriptor.description(),
        "parameters": descriptor.schema().map(|s| s.to_json_schema()),
    })
}

pub async fn run(config: AppConfig, as_json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = build_runtime(&config).await?;
    let descriptors = runtime.executor.registry().list();

    if as_json {
        let listing: Vec<Value> = descriptors.iter().map(|d| describe(d)).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("📦 {} capabilities registered", descriptors.len());
    for descriptor in &descriptors {
        println!();
        println!("   {}", descriptor.name());
        if !descriptor.description().is_empty() {
            println!("   {}", descriptor.description());
        }
        match descriptor.schema() {
            Some(schema) => {
                let rendered = serde_json::to_string_pretty(&schema.to_json_schema())?;
                for line in rendered.lines() {
                    println!("      {line}");
                }
            }
            None => println!("      (no parameter schema)"),
        }
    }

    Ok(())
}
