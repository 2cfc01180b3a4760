//! The profile file and the `config` subcommand.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Args, Subcommand, ValueEnum};
use dialoguer::Editor;
use serde::{Deserialize, Serialize};

use crate::error::LabError;

const APP_NAME: &str = "lab";
const CONFIG_FILE_NAME: &str = "config.yml";
const DEFAULT_EDITOR: &str = "vim";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `config` subcommand.
#[derive(Args)]
pub struct ConfigCommandArgs {
    #[command(subcommand)]
    pub subcommand: ConfigCommand,
}

/// Available subcommands for config subcommand.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the path of the config file.
    Path,

    /// List profiles. Tokens are masked.
    #[command(alias = "ls")]
    List,

    /// Set a profile value. Creates the profile if it doesn't exist.
    Set(ConfigSetArgs),

    /// Make a profile the default one.
    Default(ConfigDefaultArgs),

    /// Edit the configuration file.
    Edit,
}

/// Arguments for `config set`.
#[derive(Args)]
pub struct ConfigSetArgs {
    /// The profile's domain, e.g. gitlab.com
    pub domain: String,

    /// The profile value to set
    pub key: ProfileKey,

    /// The new value
    pub value: String,
}

/// Arguments for `config default`.
#[derive(Args)]
pub struct ConfigDefaultArgs {
    /// The profile's domain, e.g. gitlab.com
    pub domain: String,
}

/// Settable profile values.
#[derive(Clone, Copy, Debug, PartialEq, ValueEnum)]
pub enum ProfileKey {
    Token,
    DefaultGroup,
    DefaultProject,
    DefaultAssigneeId,
}

// =============================================================================
// Domain
// =============================================================================

/// Credentials and defaults for one GitLab domain.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub token: String,
    pub default_group: String,
    pub default_project: String,
    pub default_assignee_id: u64,
}

/// Configuration structure stored in YAML format.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Profiles keyed by domain.
    pub profiles: BTreeMap<String, Profile>,

    /// Domain of the profile used when nothing else applies.
    pub default_profile: String,
}

impl Config {
    /// Get the profile for a domain.
    pub fn get_profile(&self, domain: &str) -> Result<&Profile, LabError> {
        self.profiles
            .get(domain)
            .ok_or_else(|| LabError::ProfileNotFound(domain.to_string()))
    }

    /// Add or replace the profile for a domain.
    pub fn set_profile(&mut self, domain: &str, profile: Profile) {
        self.profiles.insert(domain.to_string(), profile);
    }

    /// Set the token of a domain, creating an empty profile if needed.
    pub fn set_token(&mut self, domain: &str, token: &str) {
        self.profiles.entry(domain.to_string()).or_default().token = token.to_string();
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.profiles.contains_key(domain)
    }
}

/// The config together with the file it was loaded from.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    pub config: Config,
}

impl ConfigStore {
    /// Load configuration from the OS-specific default path.
    pub fn load_default() -> anyhow::Result<ConfigStore> {
        ConfigStore::load(default_config_path()?)
    }

    /// Load configuration from `path`, creating the directory and a default
    /// document if the file doesn't exist yet.
    pub fn load(path: impl Into<PathBuf>) -> anyhow::Result<ConfigStore> {
        let path = path.into();

        tracing::debug!(path = %path.display(), "loading config");

        let is_empty_file = fs::metadata(&path)
            .map(|metadata| metadata.is_file() && metadata.len() == 0)
            .unwrap_or(false);
        let config = if is_empty_file {
            Config::default()
        } else {
            ensure_parent_dir(&path)?;

            confy::load_path(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?
        };

        Ok(ConfigStore { path, config })
    }

    /// Save configuration to disk, replacing the whole file.
    pub fn save(&self) -> anyhow::Result<()> {
        tracing::debug!(path = %self.path.display(), "saving config");

        ensure_parent_dir(&self.path)?;

        confy::store_path(&self.path, &self.config)
            .with_context(|| format!("Failed to save configuration to {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The config file location for `os` (as in `std::env::consts::OS`). `env`
/// looks up environment variables.
///
/// - windows: `%APPDATA%/lab/config.yml`, falling back to
///   `%USERPROFILE%/Application Data/lab/config.yml`
/// - others: `$HOME/.config/lab/config.yml`
pub fn config_path_for<F>(os: &str, env: F) -> anyhow::Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| env(key).filter(|value| !value.is_empty());
    let config_dir = if os == "windows" {
        match non_empty("APPDATA") {
            Some(app_data) => PathBuf::from(app_data),
            None => match non_empty("USERPROFILE") {
                Some(user_profile) => PathBuf::from(user_profile).join("Application Data"),
                None => anyhow::bail!("Neither APPDATA nor USERPROFILE is set"),
            },
        }
    } else {
        match non_empty("HOME") {
            Some(home) => PathBuf::from(home).join(".config"),
            None => anyhow::bail!("HOME is not set"),
        }
    };

    Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// The config file location for the running OS and environment.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    config_path_for(std::env::consts::OS, |key| std::env::var(key).ok())
        .context("Failed to determine the config file location")
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `config path` subcommand.
pub fn config_path() -> anyhow::Result<()> {
    println!("{}", default_config_path()?.display());

    Ok(())
}

/// Execute the `config list` subcommand.
pub fn config_list() -> anyhow::Result<()> {
    let store = ConfigStore::load_default()?;

    print!("{}", format_profiles(&store.config));

    Ok(())
}

/// Execute the `config set` subcommand.
pub fn config_set(args: ConfigSetArgs) -> anyhow::Result<()> {
    let mut store = ConfigStore::load_default()?;

    set_profile_value(&mut store.config, &args.domain, args.key, &args.value)?;
    store.save()?;

    Ok(())
}

/// Execute the `config default` subcommand.
pub fn config_default(args: ConfigDefaultArgs) -> anyhow::Result<()> {
    let mut store = ConfigStore::load_default()?;

    store.config.get_profile(&args.domain)?;
    store.config.default_profile = args.domain;
    store.save()?;

    Ok(())
}

/// Execute the `config edit` subcommand.
pub fn config_edit() -> anyhow::Result<()> {
    let store = ConfigStore::load_default()?;
    let executable = std::env::var("EDITOR").unwrap_or_else(|_| DEFAULT_EDITOR.to_string());
    let edited_content = Editor::new()
        .executable(executable)
        .extension(".yml")
        .edit(&fs::read_to_string(store.path()).unwrap_or_default())
        .context("Failed to open editor")?;

    if let Some(content) = edited_content {
        fs::write(store.path(), content.as_bytes())
            .context("Failed to write configuration file")?;

        ConfigStore::load(store.path())
            .context("The config file may be corrupted. Please check the YAML file.")?;

        println!("Configuration saved successfully.");
    }

    Ok(())
}

// =============================================================================
// Private Helpers
// =============================================================================

fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
    }

    Ok(())
}

fn set_profile_value(
    config: &mut Config,
    domain: &str,
    key: ProfileKey,
    value: &str,
) -> anyhow::Result<()> {
    let profile = config.profiles.entry(domain.to_string()).or_default();

    match key {
        ProfileKey::Token => profile.token = value.to_string(),
        ProfileKey::DefaultGroup => profile.default_group = value.to_string(),
        ProfileKey::DefaultProject => profile.default_project = value.to_string(),
        ProfileKey::DefaultAssigneeId => {
            profile.default_assignee_id = value
                .parse()
                .with_context(|| format!("Invalid assignee id '{value}'. Expected a number"))?
        }
    }

    Ok(())
}

fn format_profiles(config: &Config) -> String {
    let mut output = String::new();

    for (domain, profile) in &config.profiles {
        let marker = if *domain == config.default_profile { " (default)" } else { "" };

        output.push_str(&format!("{domain}{marker}\n"));
        output.push_str(&format!("  token: {}\n", mask_token(&profile.token)));
        output.push_str(&format!("  default_group: {}\n", profile.default_group));
        output.push_str(&format!("  default_project: {}\n", profile.default_project));
        output.push_str(&format!(
            "  default_assignee_id: {}\n",
            profile.default_assignee_id
        ));
    }

    output
}

fn mask_token(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }

    let visible: String = token.chars().take(4).collect();

    format!("{visible}****")
}
