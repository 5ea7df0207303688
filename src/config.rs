use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::retry::RetryPolicy;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub ide: IdeConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub migration: MigrationConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IdeConfig {
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    /// Display name an automation instance must report to be considered.
    #[serde(default = "default_product_name")]
    pub product_name: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AutomationConfig {
    /// Command line of the process hosting the IDE object model.
    pub host_command: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Report scans to wait before concluding that no report will be written.
    #[serde(default = "default_report_wait_polls")]
    pub report_wait_polls: u32,
    #[serde(default = "default_report_render_delay_ms")]
    pub report_render_delay_ms: u64,
    // Caps for the waits that are unbounded by default.
    #[serde(default)]
    pub launch_max_polls: Option<u32>,
    #[serde(default)]
    pub dialog_max_polls: Option<u32>,
    #[serde(default)]
    pub report_wait_max_polls: Option<u32>,
    #[serde(default)]
    pub report_read_max_polls: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MigrationConfig {
    #[serde(default = "default_console_command")]
    pub console_command: String,
    #[serde(default = "default_migrate_command")]
    pub migrate_command: String,
    #[serde(default = "default_dialog_title_prefix")]
    pub dialog_title_prefix: String,
    #[serde(default = "default_backup_dir")]
    pub backup_dir: String,
    #[serde(default = "default_report_file")]
    pub report_file: String,
    #[serde(default = "default_manifest_file")]
    pub manifest_file: String,
    #[serde(default = "default_clean_marker")]
    pub clean_marker: String,
    #[serde(default = "default_web_app_property")]
    pub web_app_property: String,
}

fn default_executable() -> PathBuf {
    PathBuf::from(r"C:\Program Files\Microsoft Visual Studio\2022\Professional\Common7\IDE\devenv.exe")
}

fn default_product_name() -> String {
    "Microsoft Visual Studio".to_string()
}

fn default_attempts() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    1000
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_report_wait_polls() -> u32 {
    60
}

fn default_report_render_delay_ms() -> u64 {
    1500
}

fn default_console_command() -> String {
    "View.PackageManagerConsole".to_string()
}

fn default_migrate_command() -> String {
    "ClassViewContextMenus.ClassViewProject.Migratepackages.configtoPackageReference".to_string()
}

fn default_dialog_title_prefix() -> String {
    "Migrate NuGet format to PackageReference - ".to_string()
}

fn default_backup_dir() -> String {
    "MigrationBackup".to_string()
}

fn default_report_file() -> String {
    "NuGetUpgradeLog.html".to_string()
}

fn default_manifest_file() -> String {
    "packages.config".to_string()
}

fn default_clean_marker() -> String {
    "No issues were found.".to_string()
}

fn default_web_app_property() -> String {
    "WebApplication.UseIISExpress".to_string()
}

impl Default for IdeConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            product_name: default_product_name(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            report_wait_polls: default_report_wait_polls(),
            report_render_delay_ms: default_report_render_delay_ms(),
            launch_max_polls: None,
            dialog_max_polls: None,
            report_wait_max_polls: None,
            report_read_max_polls: None,
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            console_command: default_console_command(),
            migrate_command: default_migrate_command(),
            dialog_title_prefix: default_dialog_title_prefix(),
            backup_dir: default_backup_dir(),
            report_file: default_report_file(),
            manifest_file: default_manifest_file(),
            clean_marker: default_clean_marker(),
            web_app_property: default_web_app_property(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn report_render_delay(&self) -> Duration {
        Duration::from_millis(self.report_render_delay_ms)
    }
}

impl AppConfig {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        } else {
            builder = builder.add_source(config::File::with_name("pkgref-migrate").required(false));
        }

        // e.g. PKGREF_MIGRATE__IDE__EXECUTABLE
        builder = builder.add_source(
            config::Environment::with_prefix("PKGREF_MIGRATE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))
    }

    pub fn host_command(&self) -> Result<&str> {
        self.automation
            .host_command
            .as_deref()
            .map(str::trim)
            .filter(|command| !command.is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "automation.host_command is not set (PKGREF_MIGRATE__AUTOMATION__HOST_COMMAND)"
                        .to_string(),
                )
            })
    }
}
