//! `levelcert`: generate and re-validate certified puzzle levels.
//!
//! A thin adapter over `levelcert_harness`. All decisions live in the
//! library; this binary parses flags, installs logging and prints results.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use levelcert_harness::batch::{generate_batch, validate_dir, EntryOutcome};
use levelcert_harness::level_io::write_level;
use levelcert_harness::worlds::{domain_by_id, DOMAIN_IDS};
use levelcert_harness::{LevelDomain, PolicyConfig, RetryPolicy, Verifier, WorldTemplate};
use levelcert_search::Budget;

#[derive(Parser)]
#[command(name = "levelcert", version, about = "Certified procedural level generation")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate levels for consecutive seeds and write them to a directory.
    Generate {
        /// Domain identifier (see `levelcert domains`).
        #[arg(long)]
        domain: String,
        /// First seed.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Number of levels (seeds `seed..seed + count`).
        #[arg(long, default_value_t = 1)]
        count: u64,
        /// Template JSON file. Defaults to the domain's built-in template.
        #[arg(long)]
        template: Option<PathBuf>,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// File name prefix. Defaults to the domain identifier.
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// Re-validate every `*.level.json` in a directory.
    ValidateDir {
        #[arg(long)]
        domain: String,
        dir: PathBuf,
        #[command(flatten)]
        policy: PolicyArgs,
    },
    /// List the available domains.
    Domains,
}

#[derive(clap::Args)]
struct PolicyArgs {
    /// Pipeline runs per narrowing round.
    #[arg(long)]
    max_attempts: Option<u32>,
    #[arg(long)]
    narrowing_rounds: Option<u32>,
    /// Search depth ceiling.
    #[arg(long)]
    max_depth: Option<u32>,
    /// Worker threads for batch work.
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

impl PolicyArgs {
    fn policy(&self) -> RetryPolicy {
        PolicyConfig {
            max_attempts: self.max_attempts,
            narrowing_rounds: self.narrowing_rounds,
            budget: self.max_depth.map(|d| Budget::default().with_max_depth(d)),
            analyzer: None,
        }
        .build()
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            domain,
            seed,
            count,
            template,
            out,
            name,
            policy,
        } => cmd_generate(&domain, seed, count, template.as_deref(), &out, name.as_deref(), &policy),
        Command::ValidateDir { domain, dir, policy } => cmd_validate_dir(&domain, &dir, &policy),
        Command::Domains => {
            for id in DOMAIN_IDS {
                println!("{id}");
            }
            Ok(())
        }
    }
}

fn lookup(domain: &str) -> Result<Box<dyn LevelDomain>> {
    domain_by_id(domain)
        .with_context(|| format!("unknown domain `{domain}` (known: {})", DOMAIN_IDS.join(", ")))
}

fn cmd_generate(
    domain: &str,
    seed: u64,
    count: u64,
    template: Option<&Path>,
    out: &Path,
    name: Option<&str>,
    args: &PolicyArgs,
) -> Result<()> {
    let domain = lookup(domain)?;
    let template = match template {
        Some(path) => WorldTemplate::load(path).with_context(|| format!("load template {}", path.display()))?,
        None => domain.default_template(),
    };
    let policy = args.policy();
    let seeds: Vec<u64> = (seed..seed.saturating_add(count)).collect();
    let prefix = name.unwrap_or(domain.domain_id());

    let results = generate_batch(domain.as_ref(), &template, &seeds, &policy, args.workers);
    for (seed, result) in seeds.iter().zip(results) {
        let level = result.with_context(|| format!("generate seed {seed}"))?;
        let path = write_level(out, &format!("{prefix}_{seed:06}"), domain.domain_id(), &level)
            .with_context(|| format!("write level for seed {seed}"))?;
        println!(
            "{}  {}  attempts={}  depth={}",
            path.display(),
            serde_json::to_string(&level.provenance).context("serialize provenance")?,
            level.attempts_used,
            level.report.solution_depth.map_or_else(|| "-".to_string(), |d| d.to_string()),
        );
    }
    Ok(())
}

fn cmd_validate_dir(domain: &str, dir: &Path, args: &PolicyArgs) -> Result<()> {
    let domain = lookup(domain)?;
    let policy = args.policy();
    let verifier = Verifier::new(domain.as_ref(), policy.budget, policy.analyzer);
    let summary = validate_dir(dir, &verifier, args.workers)
        .with_context(|| format!("validate {}", dir.display()))?;

    for entry in &summary.entries {
        match &entry.outcome {
            EntryOutcome::Passed(report) => println!("PASS  {}  {report}", entry.file_name),
            EntryOutcome::Failed(report) => {
                println!("FAIL  {}  {report}", entry.file_name);
                for issue in &report.issues {
                    println!("      {issue}");
                }
            }
            EntryOutcome::Unreadable(detail) => println!("SKIP  {}  {detail}", entry.file_name),
        }
    }
    println!(
        "{} total, {} passed, {} failed, {} unreadable",
        summary.total, summary.passed, summary.failed, summary.unreadable
    );
    if !summary.all_passed() {
        bail!("{} of {} levels did not pass", summary.total - summary.passed, summary.total);
    }
    Ok(())
}
