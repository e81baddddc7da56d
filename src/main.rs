use anyhow::{Context, Result};
use clap::Parser;
use emod_config::config::{config_from_overrides, config_from_schema, write_default_config};
use emod_config::{util, SchemaDocument};
use tracing_subscriber::EnvFilter;

mod cli;
use cli::{Command, ConfigArgs, DefaultsArgs, GroupsArgs, RootArgs, USAGE};

fn main() -> Result<()> {
    if std::env::args_os().len() <= 1 {
        println!("{USAGE}");
        return Ok(());
    }
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Defaults(args) => run_defaults(args),
        Command::Config(args) => run_config(args),
        Command::Groups(args) => run_groups(args),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = match std::env::var("RUST_LOG") {
        Ok(directives) if !verbose => EnvFilter::new(directives),
        _ => EnvFilter::new(fallback),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run_defaults(args: DefaultsArgs) -> Result<()> {
    write_default_config(&args.schema, &args.out, !args.no_schema_node).with_context(|| {
        format!(
            "generate default config from {}",
            args.schema.display()
        )
    })?;
    println!("{}", args.out.display());
    Ok(())
}

fn run_config(args: ConfigArgs) -> Result<()> {
    let config = match &args.overrides {
        Some(overrides) => config_from_overrides(&args.schema, overrides).with_context(|| {
            format!(
                "apply overrides {} to {}",
                overrides.display(),
                args.schema.display()
            )
        })?,
        None => config_from_schema(&args.schema)
            .with_context(|| format!("generate config from {}", args.schema.display()))?,
    };
    util::write_json(&args.out, &config)
        .with_context(|| format!("write {}", args.out.display()))?;
    println!("{}", args.out.display());
    Ok(())
}

fn run_groups(args: GroupsArgs) -> Result<()> {
    let document = SchemaDocument::load(&args.schema)
        .with_context(|| format!("load schema {}", args.schema.display()))?;
    for (name, group) in document.groups() {
        println!("{name}\t{}", group.len());
    }
    Ok(())
}
