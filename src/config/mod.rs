pub mod watcher;

use crate::data::{JqlEntry, SiteDetails};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable consulted when a site has no token in the config file.
pub const API_TOKEN_ENV: &str = "JIRA_API_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub sites: Vec<SiteDetails>,
    #[serde(default)]
    pub jql: Vec<JqlEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Keep requesting pages until the server's total is reached.
    #[serde(default)]
    pub fetch_all_query_results: bool,
    #[serde(default = "default_true")]
    pub monitor_enabled: bool,
    /// Rebuild the parent/epic hierarchy instead of listing issues flat.
    #[serde(default = "default_true")]
    pub nest_subtasks: bool,
    /// Minutes between monitor polls; 0 disables polling.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_mins: u64,
}

fn default_true() -> bool {
    true
}

fn default_refresh_interval() -> u64 {
    5
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            fetch_all_query_results: false,
            monitor_enabled: true,
            nest_subtasks: true,
            refresh_interval_mins: default_refresh_interval(),
        }
    }
}

impl Config {
    /// Saved queries shown in the explorer.
    pub fn enabled_queries(&self) -> impl Iterator<Item = &JqlEntry> {
        self.jql.iter().filter(|entry| entry.enabled)
    }

    /// Saved queries watched by the new-issue monitor. Only queries shown
    /// in the explorer are watched.
    pub fn monitored_queries(&self) -> impl Iterator<Item = &JqlEntry> {
        self.enabled_queries().filter(|entry| entry.monitor_enabled)
    }

    /// Fill empty site tokens from the environment.
    fn resolve_tokens(&mut self, env_token: Option<String>) {
        let Some(token) = env_token.filter(|t| !t.trim().is_empty()) else {
            return;
        };
        for site in &mut self.sites {
            if site.api_token.trim().is_empty() {
                site.api_token = token.clone();
            }
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    let dir = directories::ProjectDirs::from("", "", "jql-explorer")
        .context("Could not determine config directory")?
        .config_dir()
        .to_path_buf();
    Ok(dir)
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn log_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("jql-explorer.log"))
}

/// Resolve the config path, falling back to the default location.
pub fn resolve_path(path: Option<&Path>) -> Result<PathBuf> {
    match path {
        Some(p) => Ok(p.to_path_buf()),
        None => default_config_path(),
    }
}

pub fn parse(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Invalid config")?;
    config.resolve_tokens(std::env::var(API_TOKEN_ENV).ok());
    Ok(config)
}

pub fn load(path: Option<&Path>) -> Result<Config> {
    let path = resolve_path(path)?;

    if !path.exists() {
        anyhow::bail!(
            "Config file not found at {}. Run `jql-explorer --init` to create one.",
            path.display()
        );
    }

    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    parse(&content).with_context(|| format!("Failed to parse config from {}", path.display()))
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    // Set file permissions to 0600 (Unix only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    use std::io::{self, Write};

    print!("{}", label);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

pub async fn init_wizard(path: Option<&Path>) -> Result<()> {
    println!("jql-explorer Configuration Wizard");
    println!("=================================\n");

    let config_path = resolve_path(path)?;
    if config_path.exists() {
        let answer = prompt(&format!(
            "Config already exists at {}. Overwrite? [y/N] ",
            config_path.display()
        ))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    let base_url = prompt("Jira site URL (e.g. https://your-team.atlassian.net): ")?;
    let email = prompt("Account email: ")?;
    let api_token = prompt(&format!(
        "API token (https://id.atlassian.com/manage-profile/security/api-tokens, \
         leave empty to use ${}): ",
        API_TOKEN_ENV
    ))?;
    let query = prompt("Default JQL [assignee = currentUser() ORDER BY updated DESC]: ")?;
    let query = if query.is_empty() {
        "assignee = currentUser() ORDER BY updated DESC".to_string()
    } else {
        query
    };

    let config = Config {
        explorer: ExplorerConfig::default(),
        sites: vec![SiteDetails {
            id: "default".to_string(),
            name: String::new(),
            base_url,
            email,
            api_token,
            epic_link_field: "customfield_10014".to_string(),
            epic_name_field: "customfield_10011".to_string(),
        }],
        jql: vec![JqlEntry {
            id: "my-issues".to_string(),
            name: "My Issues".to_string(),
            query,
            site_id: "default".to_string(),
            enabled: true,
            monitor_enabled: true,
        }],
    };

    save(&config_path, &config)?;

    println!("\nConfig saved to {}", config_path.display());
    println!("Run `jql-explorer` to open the explorer.");

    Ok(())
}
