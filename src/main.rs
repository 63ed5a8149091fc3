//! CLI entry point for the binding generator.
//!
//! Loads layered settings, runs the pipeline on a declaration dump or on a
//! header directory, then prints the plan or writes the pybind11 sources.

use anyhow::{Context, Result, anyhow};
use bindforge::emit::{self, EmitOptions};
use bindforge::logging::init_logging;
use bindforge::pipeline::{self, PipelineOutput};
use bindforge::{BindError, HeaderScanner, JsonSource, Settings};
use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use console::style;
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// pybind11 binding generator for large C++ libraries
#[derive(Parser)]
#[command(
    name = "bindforge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Generate pybind11 bindings from C++ declarations",
    long_about = "Resolve typedef aliases, template instantiations, base classes and ownership \
                  of a C++ library and emit ordered pybind11 registration code.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Where declarations come from
#[derive(Args)]
#[group(required = true, multiple = false)]
struct InputArgs {
    /// JSON declaration dump exported by a clang-based tool
    #[arg(long, value_name = "FILE")]
    decls: Option<PathBuf>,

    /// Header directory parsed with the built-in C++ scanner
    #[arg(long, value_name = "DIR")]
    headers: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .bindforge directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display the effective settings")]
    Config,

    /// Resolve and plan without writing anything
    #[command(about = "Print the registration plan and exclusion diagnostics")]
    Plan {
        #[command(flatten)]
        input: InputArgs,

        /// Print the full plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve, plan and write the binding sources
    #[command(about = "Generate pybind11 sources into the output directory")]
    Generate {
        #[command(flatten)]
        input: InputArgs,

        /// Output directory, replaced wholesale (defaults to bind.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        if let Some(bind) = err.downcast_ref::<BindError>() {
            eprintln!("  code: {}", bind.status_code());
            if bind.is_model_violation() {
                eprintln!("  nothing was written, the previous output is unchanged");
            }
            for suggestion in bind.recovery_suggestions() {
                eprintln!("  hint: {suggestion}");
            }
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init { force } = cli.command {
        let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
        println!("Created configuration file at: {}", path.display());
        println!("Edit this file to customize your settings.");
        return Ok(());
    }

    let settings = load_settings(cli.config.as_ref())?;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(())
        }
        Commands::Plan { input, json } => {
            init_logging(&settings.logging)?;
            let output = resolve(&input, &settings)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&output.plan)?);
            } else {
                print_summary(&output);
            }
            Ok(())
        }
        Commands::Generate { input, output } => {
            init_logging(&settings.logging)?;
            let output_dir = output.unwrap_or_else(|| settings.bind.output_dir.clone());
            let result = resolve(&input, &settings)?;
            let report = emit::emit(&result.plan, &EmitOptions::from_settings(&settings), &output_dir)
                .with_context(|| format!("Failed to generate into {}", output_dir.display()))?;

            println!(
                "Wrote {} units ({} modules, {} templates) to {}",
                report.units.len(),
                report.modules,
                report.templates,
                report.output_dir.display()
            );
            if !result.diagnostics.is_empty() {
                println!("{} exclusions, run `bindforge plan` for details", result.diagnostics.len());
            }
            Ok(())
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path)
            .map_err(|e| anyhow!("Configuration error loading from {}: {e}", path.display())),
        None => {
            if let Err(warning) = Settings::check_init() {
                eprintln!("Warning: {warning}");
                eprintln!("Using default configuration for now.");
            }
            Settings::load().map_err(|e| anyhow!("Configuration error: {e}"))
        }
    }
}

fn resolve(input: &InputArgs, settings: &Settings) -> Result<PipelineOutput> {
    let output = match (&input.decls, &input.headers) {
        (Some(path), _) => pipeline::run_with_settings(JsonSource::from_path(path)?, settings)?,
        (None, Some(dir)) => {
            let scanned = HeaderScanner::from_settings(settings)
                .with_include_dir(dir)
                .scan()?;
            pipeline::run_with_settings(scanned, settings)?
        }
        (None, None) => return Err(anyhow!("either --decls or --headers is required")),
    };
    Ok(output)
}

fn print_summary(output: &PipelineOutput) {
    let plan = &output.plan;

    println!("{}", style("Modules").cyan().bold());
    for module in &plan.modules {
        println!(
            "  {:<24} {:>4} enums {:>4} functions {:>4} types",
            module.name,
            module.enums.len(),
            module.functions.len(),
            module.types.len()
        );
    }

    println!("{}", style("Templates").cyan().bold());
    for template in &plan.templates {
        println!("  {:<40} {}", template.register_name, template.source_name);
    }

    println!("{}", style("Registration order").cyan().bold());
    for (index, ty) in plan.types.iter().enumerate() {
        println!("  {:>5}  {}", index + 1, ty.register_name());
    }

    if !plan.aliases.is_empty() {
        println!("{}", style("Aliases").cyan().bold());
        for alias in &plan.aliases {
            println!("  {} -> {}", alias.register_name, alias.owner);
        }
    }

    if !output.diagnostics.is_empty() {
        println!("{}", style("Exclusions").yellow().bold());
        for diagnostic in &output.diagnostics {
            println!("  {diagnostic}");
        }
    }

    let stats = &output.stats;
    println!(
        "\n{} declarations ingested ({} skipped, {} duplicates), {} bases resolved, {} excluded",
        stats.ingest.declarations,
        stats.ingest.skipped,
        stats.ingest.duplicates,
        stats.resolve.resolved_bases,
        stats.resolve.excluded_bases
    );
}
