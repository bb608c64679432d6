use acdist::{ApiFactory, ReleaseUploader, SymbolUploader};
use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum, ValueHint};
use iocraft::prelude::*;
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
    time::Instant,
};
use url::Url;

use crate::{
    config::Config,
    ui::{ConfigHeader, ErrorMessage, InputPrompt, ReleaseSummary, SuccessMessage, TerminalProgress},
};

mod config;
mod logging;
mod ui;

#[derive(Parser)]
#[command(name = "acdist")]
#[command(version)]
#[command(about = "Upload builds and symbols to App Center and distribute them to testers")]
struct Cli {
    /// Log every HTTP call
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SymbolKind {
    AndroidProguard,
    Apple,
    Breakpad,
    Javascript,
    Uwp,
}

impl SymbolKind {
    fn as_wire(&self) -> &'static str {
        match self {
            SymbolKind::AndroidProguard => "AndroidProguard",
            SymbolKind::Apple => "Apple",
            SymbolKind::Breakpad => "Breakpad",
            SymbolKind::Javascript => "JavaScript",
            SymbolKind::Uwp => "UWP",
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Configure acdist interactively
    Config,
    /// Store your API token in the OS keyring
    SetApiToken { api_token: String },
    /// Upload a release and distribute it to tester groups
    Upload {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// App owner (user or organization)
        #[arg(short, long)]
        owner: Option<String>,
        /// App name
        #[arg(short, long)]
        app: Option<String>,
        /// Distribution group, may be repeated
        #[arg(short, long = "group")]
        groups: Vec<String>,
        /// Release notes
        #[arg(short, long, conflicts_with = "notes_file")]
        notes: Option<String>,
        /// Read release notes from a file
        #[arg(long, value_hint = ValueHint::FilePath)]
        notes_file: Option<PathBuf>,
        /// Notify testers of the new release
        #[arg(long)]
        notify: bool,
    },
    /// Upload a symbol or mapping file
    Symbols {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// App owner (user or organization)
        #[arg(short, long)]
        owner: Option<String>,
        /// App name
        #[arg(short, long)]
        app: Option<String>,
        #[arg(short = 't', long = "type", value_enum, default_value = "android-proguard")]
        symbol_type: SymbolKind,
        /// Version name the symbols belong to
        #[arg(long)]
        version_name: String,
        /// Version code (build number) the symbols belong to
        #[arg(long)]
        version_code: String,
    },
}

fn main() -> Result<()> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    let _rt_guard = rt.enter();
    clap_complete::CompleteEnv::with_factory(Cli::command).complete();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose)?;

    rt.block_on(async {
        match cli.command {
            Commands::Config => interactive_config(),
            Commands::SetApiToken { api_token } => config::set_api_token_keyring(api_token),
            Commands::Upload {
                file,
                owner,
                app,
                groups,
                notes,
                notes_file,
                notify,
            } => {
                let config = config::read_config()?;
                let (owner, app) = resolve_app(&config, owner, app)?;
                let notes = match notes_file {
                    Some(path) => fs::read_to_string(&path)
                        .with_context(|| format!("Unable to read {}", path.display()))?,
                    None => notes.unwrap_or_default(),
                };
                upload_release(&config, owner, app, file, groups, notes, notify).await
            }
            Commands::Symbols {
                file,
                owner,
                app,
                symbol_type,
                version_name,
                version_code,
            } => {
                let config = config::read_config()?;
                let (owner, app) = resolve_app(&config, owner, app)?;
                upload_symbols(&config, owner, app, file, symbol_type, version_name, version_code)
                    .await
            }
        }
    })
}

fn resolve_app(
    config: &Config,
    owner: Option<String>,
    app: Option<String>,
) -> Result<(String, String)> {
    let owner = owner
        .or(config.appcenter_owner_name.clone())
        .ok_or_else(|| anyhow!("An owner must be specified via --owner or configured as default"))?;
    let app = app
        .or(config.appcenter_app_name.clone())
        .ok_or_else(|| anyhow!("An app must be specified via --app or configured as default"))?;
    Ok((owner, app))
}

fn api_factory(config: &Config) -> ApiFactory {
    ApiFactory::new(
        config.appcenter_base_url.clone(),
        config.appcenter_api_token.clone(),
    )
}

async fn upload_release(
    config: &Config,
    owner: String,
    app: String,
    file: PathBuf,
    groups: Vec<String>,
    notes: String,
    notify: bool,
) -> Result<()> {
    let started = Instant::now();
    let uploader = ReleaseUploader::new(api_factory(config), owner, app);

    let release = uploader
        .upload_release(&file, &notes, groups.as_slice(), notify, &TerminalProgress)
        .await
        .with_context(|| format!("Upload of {} failed", file.display()))?;

    let elapsed = humantime::format_duration(std::time::Duration::from_secs(
        started.elapsed().as_secs(),
    ));
    element! {
        ReleaseSummary(
            release_id: release.release_id,
            release_url: release.release_url,
            destinations: groups,
            elapsed: elapsed.to_string()
        )
    }
    .print();

    Ok(())
}

async fn upload_symbols(
    config: &Config,
    owner: String,
    app: String,
    file: PathBuf,
    symbol_type: SymbolKind,
    version_name: String,
    version_code: String,
) -> Result<()> {
    let uploader = SymbolUploader::new(&api_factory(config), owner, app);

    uploader
        .upload_symbols(
            &file,
            symbol_type.as_wire(),
            &version_name,
            &version_code,
            &TerminalProgress,
        )
        .await
        .with_context(|| format!("Symbol upload of {} failed", file.display()))?;

    element!(SuccessMessage(message: format!("Symbols uploaded for {} ({})", version_name, version_code))).print();
    Ok(())
}

fn read_input(prompt: &str, default: Option<&str>, description: Option<&str>) -> Result<String> {
    element! {
        InputPrompt(
            prompt: prompt.to_string(),
            default: default.map(|s| s.to_string()),
            description: description.map(|s| s.to_string())
        )
    }
    .print();

    print!("> ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_string();

    if input.is_empty() {
        if let Some(def) = default {
            Ok(def.to_string())
        } else {
            Ok(input)
        }
    } else {
        Ok(input)
    }
}

fn optional(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

fn interactive_config() -> Result<()> {
    element!(ConfigHeader()).print();

    let current = config::read_config_file().unwrap_or_default();
    let current_base_url = current
        .appcenter_base_url
        .map(|url| url.to_string())
        .unwrap_or_else(|| acdist::DEFAULT_APPCENTER_BASE_URL.to_string());

    let appcenter_base_url = loop {
        let base_url_str = read_input(
            "App Center API URL",
            Some(current_base_url.as_str()),
            Some("The base URL of the App Center API"),
        )?;

        match Url::parse(&base_url_str) {
            Ok(url) => break url,
            Err(e) => {
                element!(ErrorMessage(message: format!("Invalid URL: {}", e))).print();
                println!();
            }
        }
    };

    let owner_name = read_input(
        "Default Owner",
        current.appcenter_owner_name.as_deref(),
        Some("Optional: the user or organization owning your apps"),
    )?;
    let app_name = read_input(
        "Default App",
        current.appcenter_app_name.as_deref(),
        Some("Optional: set a default app to avoid specifying --app every time"),
    )?;

    let api_token = read_input(
        "API Token",
        None,
        Some("Optional: your App Center API token (stored securely in OS keyring)"),
    )?;
    if !api_token.is_empty() {
        config::set_api_token_keyring(api_token)?;
    }

    config::write_config(config::ConfigFile {
        appcenter_base_url: Some(appcenter_base_url),
        appcenter_owner_name: optional(owner_name),
        appcenter_app_name: optional(app_name),
    })?;

    element!(SuccessMessage(message: "Configuration complete!".to_string())).print();

    Ok(())
}
