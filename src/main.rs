use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use campaign_console::api::CampaignApi;
use campaign_console::api::http::HttpCampaignApi;
use campaign_console::api::types::{ApiError, CampaignId};
use campaign_console::auth::Credential;
use campaign_console::config::{ConfigError, ConsoleConfig};
use campaign_console::error::{ConsoleError, ErrorCode};
use campaign_console::services::console::CampaignConsole;
use campaign_console::services::poller::StatsView;
use campaign_console::state::contacts::{BulkFile, ContactField};
use campaign_console::state::template::{ButtonKind, EntryField, MessageKind, TemplateError, TemplateField};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token or set CAMPAIGN_TOKEN")]
    MissingToken,
    #[error("invalid --contact '{0}' (expected CODE:NUMBER)")]
    InvalidContact(String),
    #[error("invalid --button '{0}' (expected TEXT,ID[,TYPE])")]
    InvalidButton(String),
    #[error("invalid --option '{0}' (expected TEXT,ID)")]
    InvalidOption(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Console(#[from] ConsoleError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("failed to wait for Ctrl-C: {0}")]
    Signal(std::io::Error),
}

impl ErrorCode for CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingToken => "E_MISSING_TOKEN",
            Self::InvalidContact(_) | Self::InvalidButton(_) | Self::InvalidOption(_) => "E_BAD_ARGUMENT",
            Self::Config(_) => "E_CONFIG",
            Self::Api(e) => e.error_code(),
            Self::Console(e) => e.error_code(),
            Self::Template(_) => "E_TEMPLATE",
            Self::InvalidJson(_) => "E_JSON",
            Self::Signal(_) => "E_SIGNAL",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "campaign-console", about = "Compose, dispatch and monitor messaging campaigns")]
struct Cli {
    #[arg(long, env = "CAMPAIGN_API_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "CAMPAIGN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Token expiry as unix seconds.
    #[arg(long, env = "CAMPAIGN_TOKEN_EXPIRES_AT")]
    token_expires_at: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Ping,
    Login {
        #[arg(long, env = "CAMPAIGN_USERNAME")]
        username: String,
        #[arg(long, env = "CAMPAIGN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Campaigns,
    Campaign {
        id: CampaignId,
    },
    Stats {
        id: CampaignId,
        /// Keep polling and print every update until Ctrl-C.
        #[arg(long)]
        watch: bool,
    },
    Send {
        id: CampaignId,
        /// Spreadsheet of recipients; takes precedence over --contact.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Manual recipient as CODE:NUMBER, repeatable.
        #[arg(long = "contact")]
        contacts: Vec<String>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        kind: MessageKind,
        #[arg(long)]
        body: Option<String>,
        #[arg(long)]
        header: Option<String>,
        #[arg(long)]
        footer: Option<String>,
        /// Button as TEXT,ID[,TYPE], repeatable.
        #[arg(long = "button")]
        buttons: Vec<String>,
        /// List option as TEXT,ID, repeatable.
        #[arg(long = "option")]
        options: Vec<String>,
    },
}

struct CliContext {
    config: ConsoleConfig,
    api: Arc<dyn CampaignApi>,
    token: Option<String>,
    token_expires_at: Option<u64>,
}

impl CliContext {
    fn credential(&self) -> Result<Credential, CliError> {
        let token = self.token.clone().ok_or(CliError::MissingToken)?;
        Ok(Credential::with_expiry(token, self.token_expires_at))
    }

    /// A console with the campaign list loaded.
    async fn console(&self) -> Result<CampaignConsole, CliError> {
        let mut console = CampaignConsole::new(self.api.clone(), self.credential()?, self.config.poll_interval);
        console.refresh_campaigns().await?;
        Ok(console)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", e.error_code());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = ConsoleConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    let api: Arc<dyn CampaignApi> = Arc::new(HttpCampaignApi::new(&config)?);
    let ctx = CliContext { config, api, token: cli.token, token_expires_at: cli.token_expires_at };

    match cli.command {
        Command::Ping => print_json(&ctx.api.ping().await?),
        Command::Login { username, password } => {
            let credential = ctx.api.login(&username, &password).await?;
            print_json(&serde_json::to_value(&credential)?)
        }
        Command::Campaigns => {
            let campaigns = ctx.api.list_campaigns(&ctx.credential()?).await?;
            print_json(&serde_json::to_value(campaigns)?)
        }
        Command::Campaign { id } => {
            let campaign = ctx.api.get_campaign(&ctx.credential()?, &id).await?;
            print_json(&serde_json::to_value(campaign)?)
        }
        Command::Stats { id, watch } => run_stats(&ctx, id, watch).await,
        Command::Send { id, file, contacts } => run_send(&ctx, id, file, &contacts).await,
        Command::Create { name, kind, body, header, footer, buttons, options } => {
            let fields = [(TemplateField::Body, body), (TemplateField::Header, header), (TemplateField::Footer, footer)];
            run_create(&ctx, &name, kind, fields, &buttons, &options).await
        }
    }
}

async fn run_stats(ctx: &CliContext, id: CampaignId, watch: bool) -> Result<(), CliError> {
    if !watch {
        let stats = ctx.api.campaign_stats(&ctx.credential()?, &id).await?;
        return print_json(&serde_json::to_value(stats)?);
    }

    let mut console = ctx.console().await?;
    let mut updates = console.subscribe_stats();
    console.select(Some(id))?;

    let result = loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let view = updates.borrow_and_update().clone();
                if view.stats.is_some() || view.last_error.is_some() {
                    if let Err(e) = print_json(&view_json(&view)) {
                        break Err(e);
                    }
                }
            }
            signal = tokio::signal::ctrl_c() => {
                break signal.map_err(CliError::Signal);
            }
        }
    };
    console.shutdown();
    result
}

async fn run_send(ctx: &CliContext, id: CampaignId, file: Option<PathBuf>, contacts: &[String]) -> Result<(), CliError> {
    let mut console = ctx.console().await?;
    console.select(Some(id))?;
    console.open_compose();

    if let Some(path) = file {
        let bulk = BulkFile::load(&path).await.map_err(|source| ConsoleError::BulkFile {
            path: path.display().to_string(),
            source,
        })?;
        console.contacts_mut().set_bulk_file(Some(bulk));
    }
    for (index, raw) in contacts.iter().enumerate() {
        let (code, number) = raw
            .split_once(':')
            .ok_or_else(|| CliError::InvalidContact(raw.clone()))?;
        let set = console.contacts_mut();
        if index > 0 {
            set.add_manual_contact();
        }
        set.update_manual_contact(index, ContactField::CountryCode, code);
        set.update_manual_contact(index, ContactField::Number, number);
    }

    let receipt = console.submit().await?;
    if let Some(refresh) = receipt.refresh {
        // A failed fetch is already recorded in the stats view.
        if let Err(e) = refresh.await {
            tracing::warn!(error = %e, "stats refresh task did not complete");
        }
    }
    let output = json!({
        "campaign": receipt.campaign,
        "manual_count": receipt.manual_count,
        "response": receipt.response,
        "stats": view_json(&console.stats()),
    });
    console.shutdown();
    print_json(&output)
}

async fn run_create(
    ctx: &CliContext,
    name: &str,
    kind: MessageKind,
    fields: [(TemplateField, Option<String>); 3],
    buttons: &[String],
    options: &[String],
) -> Result<(), CliError> {
    let mut console = CampaignConsole::new(ctx.api.clone(), ctx.credential()?, ctx.config.poll_interval);
    console.open_compose();
    let builder = console.template_mut();
    builder.set_name(name);
    builder.set_variant(kind);
    for (field, value) in fields {
        if let Some(value) = value {
            builder.set_field(field, value)?;
        }
    }
    for (index, raw) in buttons.iter().enumerate() {
        let mut parts = raw.splitn(3, ',');
        let (Some(text), Some(id)) = (parts.next(), parts.next()) else {
            return Err(CliError::InvalidButton(raw.clone()));
        };
        builder.append_button();
        builder.update_button(index, EntryField::Text, text.trim());
        builder.update_button(index, EntryField::Id, id.trim());
        if let Some(kind) = parts.next() {
            let kind: ButtonKind = kind.parse().map_err(|_| CliError::InvalidButton(raw.clone()))?;
            builder.set_button_kind(index, kind);
        }
    }
    for (index, raw) in options.iter().enumerate() {
        let (text, id) = raw
            .split_once(',')
            .ok_or_else(|| CliError::InvalidOption(raw.clone()))?;
        builder.append_list_option();
        builder.update_list_option(index, EntryField::Text, text.trim());
        builder.update_list_option(index, EntryField::Id, id.trim());
    }

    let response = console.save_template().await?;
    print_json(&response)
}

fn view_json(view: &StatsView) -> Value {
    json!({
        "campaign": view.campaign(),
        "stats": view.stats,
        "last_error": view.last_error,
        "consecutive_failures": view.consecutive_failures,
        "updated_at": view.updated_at,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
