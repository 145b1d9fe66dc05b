//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use apidash_core::export;
use apidash_core::{
    AppContext, EditIntent, LoadReporter, LoadSummary, Notification, NotificationLevel,
};
use apidash_discovery::{ContextResolver, ProbeOutcome, Resolution, build_client, probe_repository};
use apidash_shared::{AppConfig, RepoRef, Team, ValueList, init_config, load_config};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// apidash: browse and edit the API catalog.
#[derive(Parser)]
#[command(
    name = "apidash",
    version,
    about = "Browse, audit and edit the team API catalog behind the dashboard.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Published dashboard URL to derive the repository from.
    #[arg(long, env = "APIDASH_PAGE_URL", global = true)]
    pub page_url: Option<String>,

    /// Repository owner (use together with --repo).
    #[arg(long, global = true, requires = "repo")]
    pub owner: Option<String>,

    /// Repository name (use together with --owner).
    #[arg(long, global = true, requires = "owner")]
    pub repo: Option<String>,

    /// Local document directory used when no repository is resolved.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// In local mode, write edited documents back to the data directory.
    #[arg(long, global = true)]
    pub persist: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Export format.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ExportFormat {
    Csv,
    Json,
}

/// Valid-value list selector.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub(crate) enum ListArg {
    Cmdb,
    Business,
}

impl From<ListArg> for ValueList {
    fn from(arg: ListArg) -> Self {
        match arg {
            ListArg::Cmdb => ValueList::CmdbAssignmentGroups,
            ListArg::Business => ValueList::BusinessGroups,
        }
    }
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Show the detected repository context and document store.
    Context {
        /// Also check that the repository is reachable.
        #[arg(long)]
        probe: bool,
    },

    /// List APIs, optionally filtered by team and search term.
    List {
        /// Case-insensitive search across every field.
        #[arg(short, long)]
        search: Option<String>,

        /// Only APIs owned by this team.
        #[arg(short, long)]
        team: Option<String>,

        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one API.
    Show {
        asset_id: String,
    },

    /// List teams with owners and API counts.
    Teams,

    /// Catalog totals and valid-value lists.
    Stats,

    /// Report invariant violations in the loaded documents.
    Validate {
        /// Print violations as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Export the catalog.
    Export {
        #[arg(short, long, default_value = "csv")]
        format: ExportFormat,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Add, update, move or delete APIs.
    Api {
        #[command(subcommand)]
        action: ApiAction,
    },

    /// Add or delete teams.
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },

    /// Maintain the CMDB and business-group lists.
    Values {
        #[command(subcommand)]
        action: ValuesAction,
    },

    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// API subcommands.
#[derive(Subcommand)]
pub(crate) enum ApiAction {
    /// Insert an API, or update the fields given for an existing one.
    Upsert {
        asset_id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        api_owner: Option<String>,

        #[arg(long)]
        api_owner_email: Option<String>,

        /// Owning team (must already exist).
        #[arg(long)]
        team: Option<String>,

        /// Business group; repeat or comma-separate for several.
        #[arg(short, long = "business-group", value_delimiter = ',')]
        business_groups: Vec<String>,

        /// Whether MUnit testing is exempt.
        #[arg(long)]
        munit_exempt: Option<bool>,

        /// Required coverage percentage when exempt (0-100).
        #[arg(long)]
        coverage: Option<i64>,
    },
    /// Move an API to another team.
    Reassign {
        asset_id: String,
        team: String,
    },
    /// Delete an API.
    Delete {
        asset_id: String,
    },
}

/// Team subcommands.
#[derive(Subcommand)]
pub(crate) enum TeamAction {
    /// Add a team.
    Add {
        name: String,

        #[arg(long, default_value = "")]
        team_owner: String,

        #[arg(long, default_value = "")]
        team_owner_email: String,

        #[arg(long)]
        cmdb_group: String,

        /// Business group; repeat or comma-separate for several.
        #[arg(short, long = "business-group", value_delimiter = ',', required = true)]
        business_groups: Vec<String>,
    },
    /// Delete a team that owns no APIs.
    Delete {
        name: String,
    },
}

/// Valid-value subcommands.
#[derive(Subcommand)]
pub(crate) enum ValuesAction {
    Add {
        #[arg(long)]
        list: ListArg,
        value: String,
    },
    Remove {
        #[arg(long)]
        list: ListArg,
        value: String,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

const CRATES: [&str; 5] = [
    "apidash_cli",
    "apidash_core",
    "apidash_storage",
    "apidash_discovery",
    "apidash_shared",
];

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .collect::<Vec<_>>()
        .join(",");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Context setup
// ---------------------------------------------------------------------------

/// Config file values with command-line overrides applied.
fn effective_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = load_config()?;
    if let Some(page_url) = &cli.page_url {
        config.repository.page_url = Some(page_url.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.content.local_dir = dir.display().to_string();
    }
    Ok(config)
}

fn resolve(cli: &Cli, config: &AppConfig) -> Resolution {
    let explicit = match (&cli.owner, &cli.repo) {
        (Some(owner), Some(repo)) => Some(RepoRef::new(owner, repo)),
        _ => None,
    };
    ContextResolver::from_config(&config.repository)
        .with_explicit(explicit)
        .resolve_str(config.repository.page_url.as_deref())
}

async fn open_context(cli: &Cli) -> Result<AppContext> {
    let config = effective_config(cli)?;
    let resolution = resolve(cli, &config);
    let reporter = CliProgress::new();
    let mut ctx = AppContext::bootstrap(config, resolution, &reporter).await?;
    ctx.set_persist_local(cli.persist);
    Ok(ctx)
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    if let Command::Config { action } = &cli.command {
        return match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&cli),
        };
    }
    if let Command::Context { probe } = cli.command {
        return cmd_context(&cli, probe).await;
    }

    let mut ctx = open_context(&cli).await?;
    dispatch(cli.command, &mut ctx).await
}

async fn dispatch(command: Command, ctx: &mut AppContext) -> Result<()> {
    match command {
        Command::List { search, team, json } => cmd_list(ctx, search, team, json),
        Command::Show { asset_id } => cmd_show(ctx, &asset_id),
        Command::Teams => cmd_teams(ctx),
        Command::Stats => cmd_stats(ctx),
        Command::Validate { json } => cmd_validate(ctx, json),
        Command::Export { format, out } => cmd_export(ctx, format, out),
        Command::Api { action } => {
            let intent = match action {
                ApiAction::Upsert {
                    asset_id,
                    name,
                    api_owner,
                    api_owner_email,
                    team,
                    business_groups,
                    munit_exempt,
                    coverage,
                } => {
                    let mut record = ctx
                        .catalog()
                        .find_api(&asset_id)
                        .cloned()
                        .unwrap_or_default();
                    record.asset_id = asset_id;
                    if let Some(name) = name {
                        record.api_name = name;
                    }
                    if let Some(owner) = api_owner {
                        record.api_owner = owner;
                    }
                    if let Some(email) = api_owner_email {
                        record.api_owner_email = email;
                    }
                    if let Some(team) = team {
                        record.team_name = team;
                    }
                    if !business_groups.is_empty() {
                        record.business_groups = business_groups.into_iter().collect();
                    }
                    if let Some(exempt) = munit_exempt {
                        record.munit_exempt = exempt;
                    }
                    if coverage.is_some() {
                        record.custom_coverage = coverage;
                    }
                    record.last_updated = Utc::now();
                    EditIntent::UpsertApi(record)
                }
                ApiAction::Reassign { asset_id, team } => EditIntent::ReassignApi {
                    asset_id,
                    new_team: team,
                },
                ApiAction::Delete { asset_id } => EditIntent::DeleteApi { asset_id },
            };
            apply(ctx, intent).await
        }
        Command::Team { action } => {
            let intent = match action {
                TeamAction::Add {
                    name,
                    team_owner,
                    team_owner_email,
                    cmdb_group,
                    business_groups,
                } => EditIntent::AddTeam(Team {
                    name,
                    owner: team_owner,
                    owner_email: team_owner_email,
                    cmdb_assignment_group: cmdb_group,
                    business_groups: business_groups.into_iter().collect(),
                }),
                TeamAction::Delete { name } => EditIntent::DeleteTeam { name },
            };
            apply(ctx, intent).await
        }
        Command::Values { action } => {
            let intent = match action {
                ValuesAction::Add { list, value } => EditIntent::AddValidValue {
                    list: list.into(),
                    value,
                },
                ValuesAction::Remove { list, value } => EditIntent::RemoveValidValue {
                    list: list.into(),
                    value,
                },
            };
            apply(ctx, intent).await
        }
        Command::Context { .. } | Command::Config { .. } => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Edit commands
// ---------------------------------------------------------------------------

/// Apply one edit and report the outcome. Rejected edits exit non-zero.
async fn apply(ctx: &mut AppContext, intent: EditIntent) -> Result<()> {
    let note: Notification = ctx.apply(intent).await;
    match note.level {
        NotificationLevel::Success => println!("  ✓ {note}"),
        NotificationLevel::Warning => eprintln!("  ! {note}"),
        NotificationLevel::Error => return Err(eyre!("{note}")),
    }
    if ctx.is_stale() {
        println!("  The catalog will reflect this change once the request is processed.");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

async fn cmd_context(cli: &Cli, probe: bool) -> Result<()> {
    let config = effective_config(cli)?;
    let resolution = resolve(cli, &config);

    println!();
    match &resolution.repo {
        Some(repo) => {
            println!("  Repository: {repo}");
            println!("  Detected:   {}", resolution.source);
            println!(
                "  Documents:  {}/repos/{repo}/contents/{}",
                config.repository.api_base.trim_end_matches('/'),
                config.content.remote_prefix
            );
            println!("  Changes:    {:?} sink", config.submit.sink);
        }
        None => {
            println!("  Repository: none (local mode)");
            println!("  Documents:  {}", config.content.local_dir);
        }
    }

    if probe {
        if let Some(repo) = &resolution.repo {
            let client = build_client(config.content.timeout_secs)?;
            match probe_repository(&client, &config.repository.api_base, repo).await {
                ProbeOutcome::Reachable {
                    full_name,
                    description,
                } => {
                    println!("  Reachable:  yes ({full_name})");
                    if let Some(description) = description {
                        println!("              {description}");
                    }
                }
                ProbeOutcome::Unreachable { reason } => {
                    println!("  Reachable:  no ({reason})");
                }
            }
        }
    }
    println!();
    Ok(())
}

fn cmd_list(
    ctx: &mut AppContext,
    search: Option<String>,
    team: Option<String>,
    json: bool,
) -> Result<()> {
    ctx.view.search_term = search.unwrap_or_default();
    ctx.view.team_filter = team;
    let apis = ctx.visible_apis();
    info!(count = apis.len(), "listing APIs");

    if json {
        println!("{}", serde_json::to_string_pretty(&apis)?);
        return Ok(());
    }

    if apis.is_empty() {
        println!("No APIs match.");
        return Ok(());
    }

    println!(
        "{:<32} {:<24} {:<22} {:<8} {:<8} {}",
        "ASSET ID", "NAME", "TEAM", "EXEMPT", "COVERAGE", "BUSINESS GROUPS"
    );
    for api in &apis {
        let groups: Vec<&str> = api.business_groups.iter().map(String::as_str).collect();
        println!(
            "{:<32} {:<24} {:<22} {:<8} {:<8} {}",
            api.asset_id,
            api.api_name,
            api.team_name,
            if api.munit_exempt { "yes" } else { "no" },
            api.custom_coverage
                .map(|c| format!("{c}%"))
                .unwrap_or_else(|| "-".into()),
            groups.join(", ")
        );
    }
    println!("\n{} API(s)", apis.len());
    Ok(())
}

fn cmd_show(ctx: &AppContext, asset_id: &str) -> Result<()> {
    let api = ctx
        .catalog()
        .find_api(asset_id)
        .ok_or_else(|| eyre!("no API with asset id '{asset_id}'"))?;
    println!("{}", serde_json::to_string_pretty(api)?);
    Ok(())
}

fn cmd_teams(ctx: &AppContext) -> Result<()> {
    let catalog = ctx.catalog();
    println!("{:<28} {:<24} {:<20} {}", "TEAM", "OWNER", "CMDB GROUP", "APIS");
    for summary in catalog.team_summaries() {
        let cmdb = catalog
            .team(&summary.name)
            .map(|t| t.cmdb_assignment_group.as_str())
            .unwrap_or_default();
        println!(
            "{:<28} {:<24} {:<20} {}",
            summary.name,
            if summary.owner.is_empty() { "-" } else { &summary.owner },
            if cmdb.is_empty() { "-" } else { cmdb },
            summary.api_count
        );
    }
    Ok(())
}

fn cmd_stats(ctx: &AppContext) -> Result<()> {
    let catalog = ctx.catalog();
    let stats = catalog.stats();

    println!();
    println!("  Source:          {}", ctx.store_description());
    println!("  Teams:           {}", catalog.teams().len());
    println!("  APIs:            {}", stats.total);
    println!("  MUnit required:  {}", stats.munit_required);
    println!("  MUnit exempt:    {}", stats.munit_exempt);
    println!();
    println!("  CMDB assignment groups: {}", catalog.cmdb_groups().join(", "));
    println!("  Business groups:        {}", catalog.business_groups().join(", "));
    println!();
    Ok(())
}

fn cmd_validate(ctx: &AppContext, json: bool) -> Result<()> {
    let violations = ctx.catalog().audit();
    if json {
        println!("{}", serde_json::to_string_pretty(&violations)?);
    } else if violations.is_empty() {
        println!("  ✓ No invariant violations in {}", ctx.store_description());
    } else {
        for violation in &violations {
            println!("  ✗ {violation}");
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(eyre!("{} violation(s) found", violations.len()))
    }
}

fn cmd_export(ctx: &AppContext, format: ExportFormat, out: Option<PathBuf>) -> Result<()> {
    let rendered = match format {
        ExportFormat::Csv => export::to_csv(ctx.catalog()),
        ExportFormat::Json => export::to_json(ctx.catalog())?,
    };

    match out {
        Some(path) => {
            std::fs::write(&path, rendered)
                .map_err(|e| eyre!("failed to write {}: {e}", path.display()))?;
            info!(path = %path.display(), ?format, "catalog exported");
            println!("Exported to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(cli: &Cli) -> Result<()> {
    let config = effective_config(cli)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// Catalog load progress on an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl LoadReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn document_loaded(&self, file_name: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Loaded [{current}/{total}] {file_name}"));
    }

    fn done(&self, _summary: &LoadSummary) {
        self.spinner.finish_and_clear();
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        if !self.spinner.is_finished() {
            self.spinner.finish_and_clear();
        }
    }
}
