mod cli;

use anyhow::Context;
use std::io::Write;
use std::process::ExitCode;
use yaosadis::pipeline::Pipeline;
use yaosadis::resource::Resources;
use yaosadis::template::{RenderOptions, Renderer, TemplateSet};

fn main() -> ExitCode {
    use clap::Parser;
    let cli = cli::Cli::parse();

    let env_filter = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_env("YAOSADIS_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        for error in e.chain() {
            eprintln!("{error}")
        }
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let resources = Resources::load_file(&cli.info)
        .with_context(|| format!("Failed to load resources from {}", cli.info.display()))?;

    let options: RenderOptions = (&cli.render).into();
    let query = cli.query();
    let templates: TemplateSet = cli.templates.into();
    let renderer = Renderer::new(&templates, options)?;

    let inventory = Pipeline::new(&renderer).process(&resources)?;

    let mut stdout = std::io::stdout().lock();
    match query {
        cli::Query::List => serde_json::to_writer(&mut stdout, &inventory.list())?,
        cli::Query::Host(name) => serde_json::to_writer(&mut stdout, &inventory.host(&name))?,
    }
    writeln!(stdout)?;

    Ok(())
}
