mod resolve;
mod services;

use clap::{Parser, Subcommand};
use factory_finder_core::{FinderConfig, StrategyKind};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "factory-finder",
    version,
    about = "Resolve factory implementations from service descriptors",
    long_about = "factory-finder resolves which implementation class serves a factory id \
                  (for example jakarta.el.ExpressionFactory) for a given classpath, the same \
                  way a container does when bootstrapping an expression engine."
)]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve the implementation serving a factory id
    #[command(
        long_about = "Builds a loader context from the given classpath and resolves the factory id \
                            through the configured discovery strategy. Prints the implementation \
                            class name, or <none> when no implementation is available."
    )]
    Resolve {
        /// Factory id, e.g. jakarta.el.ExpressionFactory
        #[arg(value_name = "FACTORY_ID")]
        factory_id: String,

        /// Deployment classpath (platform path separator)
        #[arg(long, value_name = "PATHS")]
        classpath: Option<String>,

        /// Container classpath consulted before the deployment classpath
        #[arg(long, value_name = "PATHS")]
        parent_classpath: Option<String>,

        /// Register a dynamic provider on the deployment loader (SERVICE=IMPL)
        #[arg(long = "provider", value_name = "SERVICE=IMPL", value_parser = parse_provider)]
        providers: Vec<(String, String)>,

        /// Discovery strategy (overrides the configuration)
        #[arg(long, value_name = "STRATEGY")]
        strategy: Option<StrategyKind>,

        /// Resolve against the system context instead of a deployment loader
        #[arg(long)]
        system: bool,

        /// Print cache statistics after resolving
        #[arg(long)]
        stats: bool,
    },
    /// List service descriptors visible on a classpath
    Services {
        /// Classpath to scan (platform path separator)
        #[arg(long, value_name = "PATHS")]
        classpath: Option<String>,
    },
    /// Print the effective configuration as JSON
    Config,
}

fn parse_provider(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((service, implementation))
            if !service.trim().is_empty() && !implementation.trim().is_empty() =>
        {
            Ok((service.trim().to_string(), implementation.trim().to_string()))
        }
        _ => Err(format!("expected SERVICE=IMPL, got '{}'", s)),
    }
}

/// Split a classpath string on the platform separator, dropping empty entries.
pub(crate) fn split_classpath(classpath: Option<&str>) -> Vec<PathBuf> {
    match classpath {
        Some(classpath) => std::env::split_paths(classpath)
            .filter(|p| !p.as_os_str().is_empty())
            .collect(),
        None => Vec::new(),
    }
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    let _guard = factory_finder_core::logging::init_logging("cli", cli.verbose, level);

    let config = FinderConfig::load(cli.config.as_deref())?;
    tracing::debug!("Effective configuration: {:?}", config);

    match cli.command {
        Commands::Resolve {
            factory_id,
            classpath,
            parent_classpath,
            providers,
            strategy,
            system,
            stats,
        } => resolve::run(
            config,
            resolve::ResolveArgs {
                factory_id,
                classpath: split_classpath(classpath.as_deref()),
                parent_classpath: split_classpath(parent_classpath.as_deref()),
                providers,
                strategy,
                system,
                stats,
            },
        ),
        Commands::Services { classpath } => {
            services::run(&config, split_classpath(classpath.as_deref()))
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
