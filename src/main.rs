//! SEO Wayfinder main entry point
//!
//! This is the command-line interface for the SEO Wayfinder sitemap crawler.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use seo_wayfinder::config::{load_config_or_default, Config};
use seo_wayfinder::crawler::{Coordinator, CrawlResult};
use seo_wayfinder::output::{print_summary, write_json, CrawlSummary};
use seo_wayfinder::storage::{open_storage, SqliteStorage, Storage};
use seo_wayfinder::url::extract_domain;
use seo_wayfinder::CrawlInput;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// SEO Wayfinder: a sitemap-driven SEO crawler
///
/// Walks a site's sitemap hierarchy, extracts the on-page facts an SEO audit
/// needs from every page, and checks every link it encounters.
#[derive(Parser, Debug)]
#[command(name = "seo")]
#[command(version)]
#[command(about = "A sitemap-driven SEO crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl a sitemap URL, a page URL, or a local sitemap file
    Crawl {
        /// URL or file to start from
        input: String,

        #[command(flatten)]
        options: CrawlOptions,
    },

    /// Crawl URLs read from standard input, one per line
    Paste {
        #[command(flatten)]
        options: CrawlOptions,
    },

    /// List saved projects
    List,

    /// Print the saved pages of a project as JSON
    Get {
        /// Project name
        project: String,
    },

    /// Delete a saved project, or everything with --all
    Rm {
        /// Project name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        project: Option<String>,

        /// Delete every project
        #[arg(long)]
        all: bool,
    },
}

#[derive(clap::Args, Debug)]
struct CrawlOptions {
    /// Write the extracted pages to this JSON file
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Save the extracted pages under a project (defaults to the site's host)
    #[arg(short, long, value_name = "PROJECT", num_args = 0..=1, default_missing_value = "")]
    save: Option<String>,

    /// Render pages in a headless browser before extraction
    #[arg(long)]
    render: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_config_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Failed to build default configuration".to_string(),
    })?;

    match cli.command {
        Command::Crawl { input, options } => handle_crawl(config, vec![input], options).await,
        Command::Paste { options } => {
            let inputs = read_stdin_inputs()?;
            handle_crawl(config, inputs, options).await
        }
        Command::List => handle_list(&config),
        Command::Get { project } => handle_get(&config, &project),
        Command::Rm { project, all } => handle_rm(&config, project.as_deref(), all),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("seo_wayfinder=info,warn"),
            1 => EnvFilter::new("seo_wayfinder=debug,info"),
            2 => EnvFilter::new("seo_wayfinder=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn read_stdin_inputs() -> anyhow::Result<Vec<String>> {
    let stdin = std::io::stdin();
    let mut inputs = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read standard input")?;
        let line = line.trim();
        if !line.is_empty() {
            inputs.push(line.to_string());
        }
    }

    if inputs.is_empty() {
        bail!("No URLs on standard input");
    }
    tracing::info!("Read {} inputs from standard input", inputs.len());
    Ok(inputs)
}

/// Handles crawl and paste: runs the crawl, then reports, exports, and saves
async fn handle_crawl(
    mut config: Config,
    inputs: Vec<String>,
    options: CrawlOptions,
) -> anyhow::Result<()> {
    if options.render {
        config.render.enabled = true;
    }

    let coordinator = Coordinator::new(config).context("Failed to initialize crawler")?;
    let result = match inputs.as_slice() {
        [single] => coordinator.run(single).await,
        many => coordinator.run_many(many).await,
    }
    .context("Crawl failed")?;

    let summary = CrawlSummary::from_result(&result);
    print_summary(&summary, &result);

    if let Some(path) = &options.output {
        write_json(&result, path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("\n✓ Pages written to: {}", path.display());
    }

    if let Some(project) = options.save {
        let project = if project.trim().is_empty() {
            default_project_name(&inputs)
        } else {
            project.trim().to_string()
        };
        save_result(coordinator.config(), &project, &result)?;
    }

    Ok(())
}

fn save_result(config: &Config, project: &str, result: &CrawlResult) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;
    let saved = storage
        .save_result(project, result)
        .with_context(|| format!("Failed to save project '{}'", project))?;
    println!("✓ Saved {} pages to project '{}'", saved, project);
    Ok(())
}

/// Host of the first remote input, or "paste" when there is none
fn default_project_name(inputs: &[String]) -> String {
    inputs
        .iter()
        .filter_map(|raw| match CrawlInput::parse(raw) {
            Ok(CrawlInput::Remote(url)) => extract_domain(&url),
            _ => None,
        })
        .next()
        .unwrap_or_else(|| "paste".to_string())
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.storage.database_path);
    open_storage(path).with_context(|| format!("Failed to open database {}", path.display()))
}

/// Handles list: shows every saved project
fn handle_list(config: &Config) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let projects = storage.list_projects()?;

    if projects.is_empty() {
        println!("No saved projects");
        return Ok(());
    }

    println!("Projects ({}):", projects.len());
    for project in projects {
        println!(
            "  - {} ({} pages, created {})",
            project.name, project.page_count, project.created_at
        );
    }
    Ok(())
}

/// Handles get: prints a project's pages as JSON
fn handle_get(config: &Config, project: &str) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let pages = storage
        .fetch_pages(project)
        .with_context(|| format!("Failed to load project '{}'", project))?;
    println!("{}", serde_json::to_string_pretty(&pages)?);
    Ok(())
}

/// Handles rm: deletes one project or all data
fn handle_rm(config: &Config, project: Option<&str>, all: bool) -> anyhow::Result<()> {
    let mut storage = open_database(config)?;

    if all {
        storage.clear_all()?;
        println!("✓ Deleted all projects");
        return Ok(());
    }

    let Some(project) = project else {
        bail!("Name a project to delete, or pass --all");
    };

    if storage.delete_project(project)? {
        println!("✓ Deleted project '{}'", project);
        Ok(())
    } else {
        bail!("No project named '{}'", project)
    }
}
