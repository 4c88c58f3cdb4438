//! protoc-wrapper CLI
//!
//! Command-line front end over the Protocol Buffers compiler: extracts
//! descriptor sets from `.proto` sources and dispatches to the bundled code
//! generators.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use protoc_wrapper_common::{GeneratorKind, SourceIdentifier, WrapperConfig, WrapperError};
use protoc_wrapper_descriptor::{
    ensure_roots, normalize_root, DescriptorCollection, DescriptorSetBuilder, ProtoxResolver,
};
use protoc_wrapper_generator::{
    build_request, join_parameters, run_as_plugin, DiskOutput, GeneratorRegistry,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "protoc-wrapper")]
#[command(version, about = "Protocol Buffers descriptor sets and code generators", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase diagnostic output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress status messages
    #[arg(short, long, global = true)]
    quiet: bool,

    /// YAML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a FileDescriptorSet for the given .proto files
    #[command(after_help = "EXAMPLES:\n  \
        # Descriptor set of a file and everything it imports, to stdout\n  \
        protoc-wrapper descriptors -I=proto greeter.proto > greeter.dsc\n\n  \
        # Roots only, written to a file\n  \
        protoc-wrapper descriptors -I proto --no-include-imports -o api.dsc a.proto b.proto")]
    Descriptors(DescriptorsArgs),

    /// Run the Java message generator as a protoc plugin (stdin to stdout)
    Java {
        /// Extra generator parameters
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Run the Java gRPC generator as a protoc plugin (stdin to stdout)
    GrpcJava {
        /// Extra generator parameters
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Compile .proto files and run generators into an output directory
    #[command(after_help = "EXAMPLES:\n  \
        # Java messages and gRPC stubs\n  \
        protoc-wrapper generate \\\n    \
        --kind java,grpc-java \\\n    \
        -I src/main/proto \\\n    \
        --out target/generated-sources/grpc \\\n    \
        src/main/proto/greeter.proto\n\n  \
        # Descriptor set next to the sources\n  \
        protoc-wrapper generate --kind descriptors --out target greeter.proto")]
    Generate(GenerateArgs),
}

#[derive(Args)]
struct DescriptorsArgs {
    /// Directory to search for imports (repeatable, searched in order)
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    include: Vec<PathBuf>,

    /// Write the descriptor set to a file instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Only emit the given files, not their imports
    #[arg(long)]
    no_include_imports: bool,

    /// Keep source code info (comments, spans) in the descriptors
    #[arg(long)]
    include_source_info: bool,

    /// The .proto files to compile
    #[arg(value_name = "PROTO_FILES")]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct GenerateArgs {
    /// Generators to run, in order
    #[arg(
        short,
        long = "kind",
        value_delimiter = ',',
        required = true,
        value_parser = parse_kind
    )]
    kinds: Vec<GeneratorKind>,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    out: PathBuf,

    /// Directory to search for imports (repeatable, searched in order)
    #[arg(short = 'I', long = "include", value_name = "PATH")]
    include: Vec<PathBuf>,

    /// Generator parameter, passed to every generator (repeatable)
    #[arg(long = "opt", value_name = "FLAG")]
    opts: Vec<String>,

    /// The .proto files to generate code for
    #[arg(value_name = "PROTO_FILES")]
    files: Vec<PathBuf>,
}

fn parse_kind(s: &str) -> std::result::Result<GeneratorKind, String> {
    s.parse().map_err(|e: WrapperError| e.to_string())
}

/// Status lines on stderr; stdout is reserved for protobuf payloads
struct Console {
    quiet: bool,
}

impl Console {
    fn step(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{} {}", "→".cyan(), message);
        }
    }

    fn done(&self, message: impl std::fmt::Display) {
        if !self.quiet {
            eprintln!("{} {}", "✓".green(), message);
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "✗".red().bold(), err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default_level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Exit code of the innermost wrapper error, 1 for anything else
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<WrapperError>())
        .map(WrapperError::exit_code)
        .unwrap_or(1)
}

fn run(cli: Cli) -> Result<()> {
    let console = Console { quiet: cli.quiet };
    let config = match &cli.config {
        Some(path) => WrapperConfig::load(path).context("Failed to load configuration")?,
        None => WrapperConfig::default(),
    };
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Descriptors(args) => descriptors_command(args, &config, &console),
        Commands::Java { args } => plugin_command(GeneratorKind::JavaMessages, &args, &config),
        Commands::GrpcJava { args } => plugin_command(GeneratorKind::JavaGrpc, &args, &config),
        Commands::Generate(args) => generate_command(args, &config, &console),
    }
}

fn descriptors_command(
    args: DescriptorsArgs,
    config: &WrapperConfig,
    console: &Console,
) -> Result<()> {
    let search_paths = config.search_paths(&args.include);
    let roots = normalize_roots(&args.files, &search_paths);
    ensure_roots(&roots)?;

    console.step(format!(
        "Building descriptor set for {} file(s)",
        roots.len()
    ));

    let collection = build_collection(
        &roots,
        &search_paths,
        config.include_imports && !args.no_include_imports,
        config.include_source_info || args.include_source_info,
    )?;

    match &args.output {
        Some(path) => {
            fs::write(path, collection.encode_to_vec())
                .map_err(WrapperError::Serialization)
                .with_context(|| format!("Failed to write descriptor set to {}", path.display()))?;
            console.done(format!(
                "Wrote {} descriptor(s) to {}",
                collection.len(),
                path.display()
            ));
        }
        None => {
            collection
                .write_to(&mut io::stdout().lock())
                .context("Failed to write descriptor set to stdout")?;
            console.done(format!("Wrote {} descriptor(s)", collection.len()));
        }
    }

    Ok(())
}

fn plugin_command(kind: GeneratorKind, args: &[String], config: &WrapperConfig) -> Result<()> {
    let registry = GeneratorRegistry::from_config(config);
    let generator = registry.get(kind)?;

    run_as_plugin(
        generator,
        &mut io::stdin().lock(),
        &mut io::stdout().lock(),
        args,
    )
    .with_context(|| format!("{} plugin failed", kind))
}

fn generate_command(args: GenerateArgs, config: &WrapperConfig, console: &Console) -> Result<()> {
    let search_paths = config.search_paths(&args.include);
    let roots = normalize_roots(&args.files, &search_paths);
    ensure_roots(&roots)?;

    console.step(format!("Compiling {} file(s)", roots.len()));
    // Generators always need the full closure
    let collection = build_collection(&roots, &search_paths, true, config.include_source_info)?;
    console.done(format!(
        "Resolved {} file(s) including imports",
        collection.len()
    ));

    let request = build_request(&collection, &roots, join_parameters(&args.opts));
    let registry = GeneratorRegistry::from_config(config);
    let mut output = DiskOutput::new(&args.out).context("Failed to prepare output directory")?;

    for kind in &args.kinds {
        console.step(format!("Running {} generator", kind.to_string().yellow()));
        let generator = registry.get(*kind)?;

        match (kind, &config.descriptor_set.output_dir) {
            (GeneratorKind::Descriptors, Some(dir)) => {
                let mut descriptor_output = DiskOutput::new(dir)
                    .context("Failed to prepare descriptor set output directory")?;
                generator
                    .generate(&request, &mut descriptor_output)
                    .with_context(|| format!("{} generator failed", kind))?;
                report_written(console, descriptor_output.written());
            }
            _ => {
                let before = output.written().len();
                generator
                    .generate(&request, &mut output)
                    .with_context(|| format!("{} generator failed", kind))?;
                report_written(console, &output.written()[before..]);
            }
        }
    }

    console.done(format!(
        "Generation complete: {} file(s) in {}",
        output.written().len(),
        args.out.display()
    ));
    Ok(())
}

fn build_collection(
    roots: &[SourceIdentifier],
    search_paths: &[PathBuf],
    include_imports: bool,
    include_source_info: bool,
) -> Result<DescriptorCollection> {
    let mut resolver = ProtoxResolver::new(search_paths)
        .context("Failed to configure import resolver")?
        .include_source_info(include_source_info);

    let collection = DescriptorSetBuilder::new()
        .include_imports(include_imports)
        .build(roots, &mut resolver)
        .context("Failed to build descriptor set")?;
    Ok(collection)
}

fn normalize_roots(files: &[PathBuf], search_paths: &[PathBuf]) -> Vec<SourceIdentifier> {
    files
        .iter()
        .map(|file| {
            let root = normalize_root(file, search_paths);
            tracing::debug!(path = %file.display(), import = %root, "root file");
            root
        })
        .collect()
}

fn report_written(console: &Console, paths: &[PathBuf]) {
    for path in paths {
        console.step(format!("  {}", display_path(path)));
    }
}

fn display_path(path: &Path) -> String {
    std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}
