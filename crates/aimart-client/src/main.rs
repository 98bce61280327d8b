//! `aimart-admin`: list and manage marketplace resources from a terminal

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use aimart_client::resources::{
    Deletable, Promocodes, Purchases, Sellers, Suspendable, Toggleable, Tools, Users,
};
use aimart_client::{AlwaysConfirm, ApiClient, ConfirmationGate, ListPage, Outcome, Resource};
use aimart_core::{Config, Error, Result};
use aimart_list::SortKey;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Command line interface for marketplace administration
#[derive(Parser)]
#[command(
    name = "aimart-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "List, filter and manage aimart marketplace resources"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// API base URL (overrides configuration)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Bearer token (overrides configuration)
    #[arg(long, env = "AIMART_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable structured JSON logging
    #[arg(long)]
    json: bool,

    /// Resource to operate on
    #[arg(value_enum)]
    resource: ResourceKind,

    /// What to do with it
    #[command(subcommand)]
    command: Command,
}

/// Resources the CLI knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResourceKind {
    Promocodes,
    Tools,
    Sellers,
    Users,
    Purchases,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Promocodes => Promocodes::NAME,
            Self::Tools => Tools::NAME,
            Self::Sellers => Sellers::NAME,
            Self::Users => Users::NAME,
            Self::Purchases => Purchases::NAME,
        })
    }
}

/// Available subcommands
#[derive(Subcommand)]
enum Command {
    /// Show one page of the collection
    List(ListArgs),

    /// Flip an item's active flag
    Toggle {
        /// Item id
        id: String,
    },

    /// Delete an item
    Delete {
        /// Item id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Suspend an account
    Suspend {
        /// Account id
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Reactivate a suspended account
    Activate {
        /// Account id
        id: String,
    },
}

impl Command {
    const fn name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Toggle { .. } => "toggle",
            Self::Delete { .. } => "delete",
            Self::Suspend { .. } => "suspend",
            Self::Activate { .. } => "activate",
        }
    }
}

/// Options of the `list` subcommand
#[derive(Args)]
struct ListArgs {
    /// Case-insensitive search term
    #[arg(short, long)]
    search: Option<String>,

    /// Filter as NAME=VALUE; repeat for several dimensions
    #[arg(short, long = "filter", value_name = "NAME=VALUE", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Sort key (recent, oldest, price-asc, price-desc, rating, popularity)
    #[arg(long)]
    sort: Option<SortKey>,

    /// Page to show
    #[arg(short, long, default_value_t = 1)]
    page: u32,

    /// Items per page (one of the configured page sizes)
    #[arg(short, long)]
    limit: Option<u32>,

    /// Print the page as JSON instead of a table
    #[arg(long)]
    json: bool,
}

fn parse_filter(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| format!("expected NAME=VALUE, got '{raw}'"))
}

/// Asks on the terminal
struct TerminalGate;

impl ConfirmationGate for TerminalGate {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        if std::io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if std::io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn gate(yes: bool) -> &'static dyn ConfirmationGate {
    if yes { &AlwaysConfirm } else { &TerminalGate }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    use Command as C;
    use ResourceKind as K;

    let mut config = Config::load_from(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.format = "json".to_string();
    }
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }
    if let Some(token) = cli.token {
        config.api.api_token = Some(token);
    }
    config.validate()?;
    aimart_core::init_logging(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        resource = %cli.resource,
        command = cli.command.name(),
        "aimart-admin starting"
    );

    let client = ApiClient::from_config(&config.api)?;

    match (cli.resource, cli.command) {
        (K::Promocodes, C::List(args)) => list::<Promocodes>(client, &config, &args).await,
        (K::Tools, C::List(args)) => list::<Tools>(client, &config, &args).await,
        (K::Sellers, C::List(args)) => list::<Sellers>(client, &config, &args).await,
        (K::Users, C::List(args)) => list::<Users>(client, &config, &args).await,
        (K::Purchases, C::List(args)) => list::<Purchases>(client, &config, &args).await,

        (K::Promocodes, C::Toggle { id }) => toggle::<Promocodes>(client, &config, &id).await,
        (K::Tools, C::Toggle { id }) => toggle::<Tools>(client, &config, &id).await,
        (K::Users, C::Toggle { id }) => toggle::<Users>(client, &config, &id).await,

        (K::Promocodes, C::Delete { id, yes }) => {
            delete::<Promocodes>(client, &config, &id, yes).await
        }
        (K::Tools, C::Delete { id, yes }) => delete::<Tools>(client, &config, &id, yes).await,
        (K::Users, C::Delete { id, yes }) => delete::<Users>(client, &config, &id, yes).await,

        (K::Sellers, C::Suspend { id, yes }) => {
            suspend::<Sellers>(client, &config, &id, yes).await
        }
        (K::Sellers, C::Activate { id }) => activate::<Sellers>(client, &config, &id).await,

        (resource, command) => Err(Error::validation(
            "command",
            format!("{resource} do not support '{}'", command.name()),
        )),
    }
}

async fn list<R: Resource>(client: ApiClient, config: &Config, args: &ListArgs) -> Result<()> {
    let page = ListPage::<R>::new(client, config);
    let result = async {
        if let Some(search) = &args.search {
            page.set_search(search.as_str());
        }
        for (name, value) in &args.filters {
            page.set_filter(name, value)?;
        }
        if let Some(sort) = args.sort {
            page.set_sort(sort);
        }
        if let Some(limit) = args.limit {
            page.set_page_size(limit)?;
        }

        page.refresh().await?;
        if args.page != 1 && !page.set_page(args.page) {
            return Err(Error::validation(
                "page",
                format!("page {} is out of range", args.page),
            ));
        }

        let view = page.view();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&view.list)?);
        } else {
            print_view(&view.list);
        }
        Ok::<(), Error>(())
    }
    .await;

    flush_notifications(&page);
    result
}

fn print_view<T: fmt::Display>(view: &aimart_list::ListView<T>) {
    for record in &view.records {
        println!("{record}");
    }
    let pagination = &view.pagination;
    println!(
        "-- page {}/{} ({} matching{})",
        pagination.page,
        pagination.total_pages,
        pagination.total,
        view.server_total
            .map(|t| format!(", {t} on server"))
            .unwrap_or_default()
    );
    for (name, value) in view.aggregates.iter() {
        println!("   {name}: {value:.2}");
    }
}

async fn toggle<R: Toggleable>(client: ApiClient, config: &Config, id: &str) -> Result<()> {
    let page = ListPage::<R>::new(client, config);
    let result = async {
        page.refresh().await?;
        page.toggle_status(id).await
    }
    .await;
    flush_notifications(&page);
    result.map(|_| ())
}

async fn delete<R: Deletable>(
    client: ApiClient,
    config: &Config,
    id: &str,
    yes: bool,
) -> Result<()> {
    let page = ListPage::<R>::new(client, config);
    let result = async {
        page.refresh().await?;
        page.delete(id, gate(yes)).await
    }
    .await;
    flush_notifications(&page);
    report_outcome(result)
}

async fn suspend<R: Suspendable>(
    client: ApiClient,
    config: &Config,
    id: &str,
    yes: bool,
) -> Result<()> {
    let page = ListPage::<R>::new(client, config);
    let result = page.suspend(id, gate(yes)).await;
    flush_notifications(&page);
    report_outcome(result)
}

async fn activate<R: Suspendable>(client: ApiClient, config: &Config, id: &str) -> Result<()> {
    let page = ListPage::<R>::new(client, config);
    let result = page.activate(id).await;
    flush_notifications(&page);
    result.map(|_| ())
}

fn report_outcome(result: Result<Outcome>) -> Result<()> {
    if matches!(result, Ok(Outcome::Declined)) {
        eprintln!("cancelled");
    }
    result.map(|_| ())
}

fn flush_notifications<R: Resource>(page: &ListPage<R>) {
    for notification in page.notifications().drain() {
        eprintln!("[{}] {}", notification.kind, notification.message);
    }
}
