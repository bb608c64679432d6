use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use url::Url;

pub const KEYRING_SERVICE: &str = "acdist-api-token";
pub const KEYRING_USER: &str = "AppCenter";

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct ConfigFile {
    pub appcenter_base_url: Option<Url>,
    pub appcenter_owner_name: Option<String>,
    pub appcenter_app_name: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigEnv {
    appcenter_base_url: Option<Url>,
    appcenter_owner_name: Option<String>,
    appcenter_app_name: Option<String>,
    appcenter_api_token: Option<String>,
}

pub struct Config {
    pub appcenter_base_url: Url,
    pub appcenter_owner_name: Option<String>,
    pub appcenter_app_name: Option<String>,
    pub appcenter_api_token: String,
}

fn merge_config(
    base: ConfigFile,
    override_config: ConfigEnv,
    keyring_token: impl FnOnce() -> Result<String>,
) -> Result<Config> {
    let appcenter_base_url = match override_config
        .appcenter_base_url
        .or(base.appcenter_base_url)
    {
        Some(url) => url,
        None => Url::parse(acdist::DEFAULT_APPCENTER_BASE_URL)?,
    };

    let appcenter_api_token = match override_config.appcenter_api_token {
        Some(token) => token,
        None => keyring_token()?,
    };

    Ok(Config {
        appcenter_base_url,
        appcenter_owner_name: override_config
            .appcenter_owner_name
            .or(base.appcenter_owner_name),
        appcenter_app_name: override_config.appcenter_app_name.or(base.appcenter_app_name),
        appcenter_api_token,
    })
}

fn read_keyring_token() -> Result<String> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    let api_token = entry.get_secret().context(
        "API token not specified via APPCENTER_API_TOKEN nor present in OS keyring",
    )?;
    Ok(String::from_utf8(api_token)?)
}

fn config_file_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("com", "acdist", "acdist")
        .ok_or(anyhow!("Unable to determine home directory"))?;
    Ok(project_dirs.config_dir().join("config.toml"))
}

pub fn read_config_file() -> Result<ConfigFile> {
    let config_file = config_file_path()?;
    if let Ok(config) = fs::read_to_string(&config_file) {
        toml::from_str(&config)
            .with_context(|| format!("Failed to parse {}", config_file.display()))
    } else {
        Ok(ConfigFile::default())
    }
}

pub fn read_config() -> Result<Config> {
    let _ = dotenv();
    let env_config = envy::from_env::<ConfigEnv>().unwrap_or_default();

    merge_config(read_config_file()?, env_config, read_keyring_token)
}

pub fn write_config(config: ConfigFile) -> Result<()> {
    let config_file = config_file_path()?;
    if let Some(parent) = config_file.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_file, toml::to_string_pretty(&config)?)
        .with_context(|| format!("Failed to write {}", config_file.display()))?;
    tracing::debug!(path = %config_file.display(), "Configuration written");
    Ok(())
}

pub fn set_api_token_keyring(api_token: String) -> Result<()> {
    let entry = Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
    entry.set_secret(api_token.as_bytes())?;
    println!("API token set for use with acdist");
    Ok(())
}
