use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::check;
use crate::config::{load_config, AppConfig, Paths};
use crate::mapping::learner::MappingLearner;
use crate::mapping::store::MappingStore;
use crate::model::week::{parse_date, IsoWeek, WeekSelection};
use crate::providers::jira::JiraClient;
use crate::providers::tempo::{TempoClient, TempoWorklogs};
use crate::providers::unit4::session::SessionStore;
use crate::providers::unit4::Unit4Browser;
use crate::summary;
use crate::sync::reconciler::{Reconciler, SyncOptions};
use crate::sync::resolver::{AccountResolver, DeferringResolver, PromptResolver};

#[derive(Parser)]
#[command(name = "tempo-unit4", version, about = "Copy Tempo worklogs into the Unit4 timesheet")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Config file (default: ~/.tempo-unit4/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the mapping and session files (default: ~/.tempo-unit4)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Command {
    /// Replace the synced entries of one week with the current Tempo worklogs
    Sync(SyncArgs),
    /// Learn account mappings from work orders already booked in Unit4
    BuildMapping(BuildMappingArgs),
}

#[derive(Args)]
pub struct SyncArgs {
    /// ISO week as YYYYWW (default: current week)
    pub week: Option<IsoWeek>,

    /// Apply the changes (default is a dry run)
    #[arg(long)]
    pub execute: bool,

    /// Only sync days on or after this date (YYYY-MM-DD) within the week
    #[arg(long, value_parser = parse_date)]
    pub cutover: Option<NaiveDate>,

    /// Check connectivity to Jira, Tempo and Unit4, then exit
    #[arg(long, conflicts_with_all = ["execute", "cutover", "week"])]
    pub check: bool,

    /// Never ask for missing work orders; skip those worklogs instead
    #[arg(long)]
    pub no_prompt: bool,
}

#[derive(Args)]
pub struct BuildMappingArgs {
    /// Scan this many weeks ending with the current one (default: 8, at most 520)
    #[arg(
        long,
        conflicts_with_all = ["from", "to"],
        value_parser = clap::value_parser!(u32).range(1..=i64::from(WeekSelection::MAX_WINDOW))
    )]
    pub weeks: Option<u32>,

    /// First week to scan (YYYYWW)
    #[arg(long)]
    pub from: Option<IsoWeek>,

    /// Last week to scan (YYYYWW, default: current week)
    #[arg(long, requires = "from")]
    pub to: Option<IsoWeek>,
}

/// Load config and mapping, then dispatch. Both are read before any network call.
pub async fn run(cli: Cli) -> Result<ExitCode> {
    let paths = Paths::new(cli.data_dir, cli.config);
    let config = load_config(&paths.config)?;
    let store = MappingStore::load(&paths.mapping)?;
    tracing::info!(path = %store.path().display(), accounts = store.len(), "loaded mapping");

    match cli.command {
        Command::Sync(args) => handle_sync(args, &config, &paths, store).await,
        Command::BuildMapping(args) => handle_build_mapping(args, &config, &paths, store).await,
    }
}

fn timeout(config: &AppConfig) -> Duration {
    Duration::from_millis(config.sync.timeout_ms)
}

async fn open_browser(config: &AppConfig, paths: &Paths) -> Result<Unit4Browser> {
    Unit4Browser::connect(&config.unit4, &config.sync, SessionStore::new(paths.session.clone())).await
}

async fn close_browser(browser: Unit4Browser) {
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "closing the browser failed");
    }
}

async fn handle_sync(args: SyncArgs, config: &AppConfig, paths: &Paths, mut store: MappingStore) -> Result<ExitCode> {
    let jira = JiraClient::new(&config.jira, timeout(config))?;
    let tempo = TempoClient::new(&config.tempo, timeout(config))?;

    if args.check {
        let report = check::check(&jira, &tempo, &config.unit4.url, timeout(config), &store).await;
        print!("{}", summary::render_check(&report));
        return Ok(if report.all_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let week = args.week.unwrap_or_else(IsoWeek::current);
    let account_id = jira
        .myself()
        .await
        .context("Could not identify the Tempo user. Run `sync --check` to diagnose.")?;
    let source = TempoWorklogs::new(tempo, account_id);

    let interactive = args.execute && !args.no_prompt && std::io::stdin().is_terminal();
    let mut resolver: Box<dyn AccountResolver> = if interactive {
        Box::new(PromptResolver::stdio())
    } else {
        Box::new(DeferringResolver)
    };
    let options = SyncOptions {
        execute: args.execute,
        cutover: args.cutover,
        description_limit: config.sync.description_limit,
        delete_passes: config.sync.max_retries,
    };

    let mut browser = open_browser(config, paths).await?;
    let result = Reconciler::new(&source, &jira, &mut browser, &mut store, &mut *resolver)
        .sync(week, &options)
        .await;
    close_browser(browser).await;

    let report = result?;
    print!("{}", summary::render_sync(&report));
    Ok(if report.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn handle_build_mapping(
    args: BuildMappingArgs,
    config: &AppConfig,
    paths: &Paths,
    mut store: MappingStore,
) -> Result<ExitCode> {
    let selection = WeekSelection::from_args(args.weeks, args.from, args.to)?;
    let weeks = selection.weeks(IsoWeek::current())?;
    let jira = JiraClient::new(&config.jira, timeout(config))?;

    let mut browser = open_browser(config, paths).await?;
    let result = MappingLearner::new(&mut browser, &jira, &mut store)
        .learn(&weeks)
        .await;
    close_browser(browser).await;

    let report = result?;
    print!("{}", summary::render_learn(&report));
    println!("Mapping file: {}", store.path().display());
    Ok(ExitCode::SUCCESS)
}
