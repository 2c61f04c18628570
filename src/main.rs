use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use branchver::calculator::{CalculationRequest, VersionCalculator};
use branchver::config::{self, ConfigurationResolver};
use branchver::domain::CommitId;
use branchver::git::Git2Repository;
use branchver::ui::{self, OutputFormat};

#[derive(clap::Parser)]
#[command(
    name = "branchver",
    version,
    about = "Calculate semantic versions from git history and a branching model"
)]
struct Args {
    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, help = "Branch to calculate the version for (default: HEAD)")]
    branch: Option<String>,

    #[arg(long, help = "Commit to calculate the version for (full id)")]
    commit: Option<String>,

    #[arg(short, long, default_value = ".", help = "Path inside the repository")]
    path: PathBuf,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::KeyValue, help = "Output format")]
    output: OutputFormat,

    #[arg(long, help = "Print only the value of one variable (e.g. FullSemVer)")]
    show_variable: Option<String>,

    #[arg(long, help = "Skip diffing commits; path-based ignore rules then never match")]
    no_paths: bool,

    #[arg(long, help = "Show branch types in matching order and exit")]
    list: bool,

    #[arg(short, long, help = "Log calculation details to stderr")]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(&args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "branchver=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(args: &Args) -> Result<()> {
    let config = config::load_config(args.config.as_deref(), &args.path)
        .context("Error loading config")?;
    let resolver = ConfigurationResolver::new(&config).context("Invalid configuration")?;

    if args.list {
        list_branch_types(&resolver);
        return Ok(());
    }

    let graph = open_snapshot(&args.path, !args.no_paths)?;

    let request = CalculationRequest {
        branch: args.branch.clone(),
        commit: args.commit.as_deref().map(CommitId::new),
    };
    if args.verbose {
        ui::display_status(&format!(
            "Calculating version for {}",
            request.branch.as_deref().unwrap_or("HEAD")
        ));
    }

    let variables = VersionCalculator::from_resolver(resolver).calculate(&graph, &request)?;
    print!(
        "{}",
        ui::render(&variables, args.output, args.show_variable.as_deref())?
    );
    Ok(())
}

fn open_snapshot(path: &Path, include_paths: bool) -> Result<branchver::git::InMemoryGraph> {
    let repo = Git2Repository::open(path)
        .with_context(|| format!("Not in a git repository: {}", path.display()))?;
    Ok(repo.snapshot(include_paths)?)
}

fn list_branch_types(resolver: &ConfigurationResolver) {
    let types: Vec<(String, String)> = resolver
        .classification_order()
        .filter_map(|t| resolver.for_type(t))
        .map(|c| (c.branch_type.to_string(), c.regex.as_str().to_string()))
        .collect();
    ui::display_branch_types(&types);
}
