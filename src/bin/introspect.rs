use std::fs;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::fmt;

use remote_introspect::interface::cli::{Cli, CliCommand};
use remote_introspect::model::{Schema, SchemaRegistry};
use remote_introspect::runtime::context::IntrospectionContext;
use remote_introspect::runtime::introspector::examine;

fn main() -> Result<()> {
    let format = fmt::format()
        .with_ansi(true)
        .without_time()
        .with_level(true)
        .with_target(false)
        .with_thread_names(false)
        .with_source_location(true)
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .event_format(format)
        .init();

    let args = Cli::parse();

    match args.command {
        CliCommand::Examine { schema, interface } => {
            if let Err(err) = run_examine(&schema, &interface) {
                error!("introspection failed: {}", err);
                return Err(err);
            }
        }
    }

    Ok(())
}

fn run_examine(schema_path: &str, interface_name: &str) -> Result<()> {
    let raw = fs::read_to_string(schema_path)
        .with_context(|| format!("reading schema file `{schema_path}`"))?;
    let schema: Schema = serde_json::from_str(&raw)
        .with_context(|| format!("parsing schema file `{schema_path}`"))?;
    let registry = SchemaRegistry::from_schema(schema);

    let source = registry
        .interface(interface_name)
        .with_context(|| format!("no interface named `{interface_name}` in schema"))?;

    let ctx = IntrospectionContext::new();
    let descriptor = examine(&ctx, &registry, Some(&source))
        .with_context(|| format!("introspecting `{interface_name}`"))?;

    info!(
        interface = descriptor.name(),
        methods = descriptor.methods().len(),
        "introspection complete"
    );

    println!("interface {} (id {:?})", descriptor.name(), descriptor.id());
    for method in descriptor.methods() {
        println!("  {}", method.signature_string(Some(descriptor.name())));
    }

    Ok(())
}
