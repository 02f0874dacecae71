//! Swagger Pipeline CLI
//!
//! Command-line interface for validating Swagger 2.0 documents and generating
//! API clients from them.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use swagger_pipeline::{
    parse_context_entry, report, DocumentSource, OutputMode, Overrides, Pipeline, PipelineError,
    PipelineOptions,
};
use swagger_pipeline_parser::{ReferenceResolver, SchemaValidator, Swagger2Validator};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "swagger-pipeline")]
#[command(version, about = "Validate Swagger 2.0 documents and generate API clients", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write the artifact
    #[command(after_help = "EXAMPLES:\n  \
        # Validate and write the resolved document as JSON\n  \
        swagger-pipeline build petstore.yaml --filename petstore.json\n\n  \
        # Generate a Node.js client\n  \
        swagger-pipeline build petstore.yaml \\\n    \
        --filename petstore.js \\\n    \
        --codegen node \\\n    \
        --class-name PetStore\n\n  \
        # Use a config file with custom templates\n  \
        swagger-pipeline build petstore.yaml --config pipeline.yaml --out-dir ./dist")]
    Build {
        /// Path to the Swagger document
        input: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Resolve external references and validate, without producing output
    #[command(after_help = "EXAMPLES:\n  \
        swagger-pipeline validate petstore.yaml")]
    Validate {
        /// Path to the Swagger document
        input: PathBuf,
    },

    /// Print the fully-resolved document
    #[command(after_help = "EXAMPLES:\n  \
        swagger-pipeline resolve petstore.yaml --format yaml\n  \
        swagger-pipeline resolve petstore.yaml --external-only")]
    Resolve {
        /// Path to the Swagger document
        input: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Keep internal (#/...) references
        #[arg(long)]
        external_only: bool,
    },
}

#[derive(Args, Debug, Default)]
struct ConfigArgs {
    /// Pipeline config file (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output file name
    #[arg(long)]
    filename: Option<String>,

    /// Generator kind (custom, node, angular); enables code generation
    #[arg(long, value_name = "KIND")]
    codegen: Option<String>,

    /// Module name exposed to templates
    #[arg(long)]
    module_name: Option<String>,

    /// Class name exposed to templates
    #[arg(long)]
    class_name: Option<String>,

    /// Class template path
    #[arg(long, conflicts_with = "class_template")]
    template: Option<String>,

    /// Class fragment path
    #[arg(long)]
    class_template: Option<String>,

    /// Method fragment path
    #[arg(long)]
    method_template: Option<String>,

    /// Request fragment path
    #[arg(long)]
    request_template: Option<String>,

    /// Extra template data (repeatable); values are parsed as JSON when possible
    #[arg(long = "context", value_name = "KEY=VALUE", value_parser = parse_context_entry)]
    context: Vec<(String, Value)>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

impl ConfigArgs {
    /// Options from the config file (if any) with flags layered on top,
    /// plus the directory relative template paths resolve against
    fn into_options(self) -> Result<(PipelineOptions, PathBuf)> {
        let (mut options, base_dir) = match &self.config {
            Some(path) => {
                let options = PipelineOptions::load(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?;
                let base_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from("."));
                (options, base_dir)
            }
            None => (PipelineOptions::default(), PathBuf::from(".")),
        };

        Overrides {
            filename: self.filename,
            codegen: self.codegen,
            module_name: self.module_name,
            class_name: self.class_name,
            template: self.template,
            class_template: self.class_template,
            method_template: self.method_template,
            request_template: self.request_template,
            context: self.context,
        }
        .apply(&mut options);

        Ok((options, base_dir))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        eprintln!("{} Verbose mode enabled", "→".cyan());
    }

    match cli.command {
        Commands::Build {
            input,
            config,
            out_dir,
        } => {
            build_command(&input, config, &out_dir, cli.verbose)?;
        }
        Commands::Validate { input } => {
            validate_command(&input)?;
        }
        Commands::Resolve {
            input,
            format,
            external_only,
        } => {
            resolve_command(&input, format, external_only)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn build_command(input: &Path, config: ConfigArgs, out_dir: &Path, verbose: bool) -> Result<()> {
    let (options, base_dir) = config.into_options()?;

    if verbose {
        println!("  Input: {}", input.display());
        println!("  Templates: {}", base_dir.display());
        println!("  Output: {}", out_dir.display());
    }

    let pipeline = Pipeline::new(&options, &base_dir).context("Invalid pipeline configuration")?;

    match pipeline.mode() {
        OutputMode::Json => println!("{} Validating {}", "→".cyan(), input.display()),
        OutputMode::Generated(kind) => println!(
            "{} Generating {} client from {}",
            "→".cyan(),
            kind.to_string().yellow(),
            input.display()
        ),
    }

    let artifact = match pipeline.process(DocumentSource::Path(input.to_path_buf())) {
        Ok(artifact) => artifact,
        Err(PipelineError::SchemaInvalid(result)) => {
            bail!(
                "The Swagger schema is invalid ({} errors, {} warnings)",
                result.errors.len(),
                result.warnings.len()
            );
        }
        Err(e) => return Err(e).context("Failed to process document"),
    };

    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
    let output_path = out_dir.join(&artifact.file_name);
    fs::write(&output_path, &artifact.contents)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    println!("\n{}", "✓ Build complete!".green().bold());
    println!("  {} ({} bytes)", output_path.display(), artifact.contents.len());

    Ok(())
}

fn validate_command(input: &Path) -> Result<()> {
    println!("{} Validating {}", "→".cyan(), input.display());

    let loaded = ReferenceResolver::new()
        .resolve_external(DocumentSource::Path(input.to_path_buf()))
        .context("Failed to load document")?;
    let result = Swagger2Validator::new()
        .validate(&loaded.document)
        .context("Validator failed")?;

    report::emit(&result);

    if !result.is_valid() {
        bail!(
            "The Swagger schema is invalid ({} errors, {} warnings)",
            result.errors.len(),
            result.warnings.len()
        );
    }

    if result.warnings.is_empty() {
        println!("{}", "✓ Schema is valid".green().bold());
    } else {
        println!(
            "{} Schema is valid with {} warnings",
            "⚠".yellow(),
            result.warnings.len()
        );
    }

    Ok(())
}

fn resolve_command(input: &Path, format: OutputFormat, external_only: bool) -> Result<()> {
    let resolver = ReferenceResolver::new();
    let mut loaded = resolver
        .resolve_external(DocumentSource::Path(input.to_path_buf()))
        .context("Failed to resolve external references")?;

    if !external_only {
        loaded = resolver
            .resolve_all(&loaded)
            .context("Failed to resolve internal references")?;
    }

    let text = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&loaded.document)
            .context("Failed to serialize document")?,
        OutputFormat::Yaml => {
            serde_yaml::to_string(&loaded.document).context("Failed to serialize document")?
        }
    };
    println!("{}", text);

    Ok(())
}
