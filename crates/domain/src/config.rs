//! Run configuration.
//!
//! [`RawSettings`] is the deserialisation target for files and environment
//! overrides: every field has a default and nothing is checked. The only way
//! to obtain a [`Settings`] is [`Settings::from_raw`], which validates every
//! field and reports all violations at once.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::AltoroError;
use crate::utils::dates::parse_date;

/// Unvalidated settings with the site's demo defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSettings {
    pub base_url: String,
    pub user: String,
    pub password: String,
    pub api_user: String,
    pub api_password: String,

    pub screenshot_dir: PathBuf,
    pub trace_dir: PathBuf,
    pub excel_path: PathBuf,
    pub log_dir: PathBuf,

    pub max_login_retries: u32,
    pub date_format: String,
    pub transaction_time_format: String,
    pub filter_start: String,
    pub filter_end: String,
    pub api_filter_start: String,
    pub api_filter_end: String,

    pub transfer_from: String,
    pub transfer_to: String,
    pub transfer_amount: Decimal,

    pub enable_humanized_behavior: bool,
    pub min_action_delay_ms: u64,
    pub max_action_delay_ms: u64,
    pub typing_speed_ms: u64,

    pub max_session_retries: u32,
    pub enable_session_monitoring: bool,
    pub session_recovery_delay_ms: u64,
    pub session_recovery_max_delay_ms: u64,

    pub api_timeout_secs: u64,
    pub api_max_attempts: u32,
    pub api_backoff_base_ms: u64,
    pub api_backoff_factor: f64,
    pub api_jitter_ms: u64,
    pub token_ttl_secs: u64,
    pub token_refresh_margin_secs: u64,

    pub webdriver_url: String,
    pub headless: bool,
}

impl Default for RawSettings {
    fn default() -> Self {
        Self {
            base_url: "https://demo.testfire.net".into(),
            user: "jsmith".into(),
            password: "demo1234".into(),
            api_user: "jsmith".into(),
            api_password: "demo1234".into(),
            screenshot_dir: "artifacts/screenshots".into(),
            trace_dir: "artifacts/traces".into(),
            excel_path: "artifacts/outputs/Altoro_Report.xlsx".into(),
            log_dir: "artifacts/logs".into(),
            max_login_retries: 3,
            date_format: "%Y-%m-%d".into(),
            transaction_time_format: "%Y-%m-%d %H:%M".into(),
            filter_start: "2025-02-01".into(),
            filter_end: "2025-04-15".into(),
            api_filter_start: "2025-02-01".into(),
            api_filter_end: "2025-04-15".into(),
            transfer_from: "800002 Savings".into(),
            transfer_to: "800003 Checking".into(),
            transfer_amount: Decimal::new(25000, 2),
            enable_humanized_behavior: false,
            min_action_delay_ms: 300,
            max_action_delay_ms: 1500,
            typing_speed_ms: 150,
            max_session_retries: 2,
            enable_session_monitoring: true,
            session_recovery_delay_ms: 2000,
            session_recovery_max_delay_ms: 8000,
            api_timeout_secs: 20,
            api_max_attempts: 4,
            api_backoff_base_ms: 1000,
            api_backoff_factor: 2.0,
            api_jitter_ms: 100,
            token_ttl_secs: 3600,
            token_refresh_margin_secs: 300,
            webdriver_url: "http://localhost:4444".into(),
            headless: true,
        }
    }
}

impl RawSettings {
    /// Overwrite one field from its textual form, as found in an
    /// `ALTORO_<FIELD>` environment variable. `field` is matched
    /// case-insensitively.
    ///
    /// # Errors
    /// Returns a violation for unknown fields and unparseable values.
    pub fn apply_override(&mut self, field: &str, value: &str) -> Result<(), FieldViolation> {
        let key = field.to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "base_url" => self.base_url = value.to_string(),
            "user" => self.user = value.to_string(),
            "password" => self.password = value.to_string(),
            "api_user" => self.api_user = value.to_string(),
            "api_password" => self.api_password = value.to_string(),
            "screenshot_dir" => self.screenshot_dir = value.into(),
            "trace_dir" => self.trace_dir = value.into(),
            "excel_path" => self.excel_path = value.into(),
            "log_dir" => self.log_dir = value.into(),
            "max_login_retries" => self.max_login_retries = parse_field(&key, value)?,
            "date_format" => self.date_format = value.to_string(),
            "transaction_time_format" => self.transaction_time_format = value.to_string(),
            "filter_start" => self.filter_start = value.to_string(),
            "filter_end" => self.filter_end = value.to_string(),
            "api_filter_start" => self.api_filter_start = value.to_string(),
            "api_filter_end" => self.api_filter_end = value.to_string(),
            "transfer_from" => self.transfer_from = value.to_string(),
            "transfer_to" => self.transfer_to = value.to_string(),
            "transfer_amount" => self.transfer_amount = parse_field(&key, value)?,
            "enable_humanized_behavior" => {
                self.enable_humanized_behavior = parse_flag(&key, value)?;
            }
            "min_action_delay_ms" => self.min_action_delay_ms = parse_field(&key, value)?,
            "max_action_delay_ms" => self.max_action_delay_ms = parse_field(&key, value)?,
            "typing_speed_ms" => self.typing_speed_ms = parse_field(&key, value)?,
            "max_session_retries" => self.max_session_retries = parse_field(&key, value)?,
            "enable_session_monitoring" => {
                self.enable_session_monitoring = parse_flag(&key, value)?;
            }
            "session_recovery_delay_ms" => {
                self.session_recovery_delay_ms = parse_field(&key, value)?;
            }
            "session_recovery_max_delay_ms" => {
                self.session_recovery_max_delay_ms = parse_field(&key, value)?;
            }
            "api_timeout_secs" => self.api_timeout_secs = parse_field(&key, value)?,
            "api_max_attempts" => self.api_max_attempts = parse_field(&key, value)?,
            "api_backoff_base_ms" => self.api_backoff_base_ms = parse_field(&key, value)?,
            "api_backoff_factor" => self.api_backoff_factor = parse_field(&key, value)?,
            "api_jitter_ms" => self.api_jitter_ms = parse_field(&key, value)?,
            "token_ttl_secs" => self.token_ttl_secs = parse_field(&key, value)?,
            "token_refresh_margin_secs" => {
                self.token_refresh_margin_secs = parse_field(&key, value)?;
            }
            "webdriver_url" => self.webdriver_url = value.to_string(),
            "headless" => self.headless = parse_flag(&key, value)?,
            _ => return Err(FieldViolation::new(field, "unknown setting")),
        }
        Ok(())
    }
}

fn parse_field<T>(field: &str, value: &str) -> Result<T, FieldViolation>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e| FieldViolation::new(field, format!("invalid value '{value}': {e}")))
}

fn parse_flag(field: &str, value: &str) -> Result<bool, FieldViolation> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(FieldViolation::new(field, format!("invalid boolean '{value}'"))),
    }
}

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every violation found while validating a [`RawSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SettingsError {
    violations: Vec<FieldViolation>,
}

impl SettingsError {
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.violations.push(FieldViolation::new(field, message));
    }
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<String> = self.violations.iter().map(ToString::to_string).collect();
        write!(f, "invalid settings: {}", joined.join("; "))
    }
}

impl std::error::Error for SettingsError {}

impl From<SettingsError> for AltoroError {
    fn from(err: SettingsError) -> Self {
        Self::Config(err.to_string())
    }
}

/// Target site and web credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteSettings {
    pub base_url: Url,
    pub username: String,
    pub password: String,
}

impl SiteSettings {
    /// Absolute URL for a site-relative path such as `login.jsp`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), path.trim_start_matches('/'))
    }
}

/// REST client credentials and resilience knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    pub username: String,
    pub password: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_factor: f64,
    pub jitter: Duration,
    pub token_ttl: Duration,
    pub token_refresh_margin: Duration,
    pub filter_start: NaiveDate,
    pub filter_end: NaiveDate,
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSettings {
    pub screenshot_dir: PathBuf,
    pub trace_dir: PathBuf,
    pub excel_path: PathBuf,
    pub log_dir: PathBuf,
}

/// Scraping knobs shared by the workflow parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeSettings {
    pub max_login_retries: u32,
    pub date_format: String,
    pub transaction_time_format: String,
    pub filter_start: NaiveDate,
    pub filter_end: NaiveDate,
}

/// The transfer scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Source account label, e.g. `800002 Savings`.
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

/// Human-like pacing for browser interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanizeSettings {
    pub enabled: bool,
    pub min_action_delay: Duration,
    pub max_action_delay: Duration,
    pub typing_speed: Duration,
}

/// Session recovery knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub max_retries: u32,
    pub monitoring_enabled: bool,
    /// Pause before the first replay; doubles per recovery.
    pub recovery_delay: Duration,
    pub max_recovery_delay: Duration,
}

/// WebDriver endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserSettings {
    pub webdriver_url: Url,
    pub headless: bool,
}

/// Validated, immutable run configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    site: SiteSettings,
    api: ApiSettings,
    paths: PathSettings,
    scrape: ScrapeSettings,
    transfer: TransferSettings,
    humanize: HumanizeSettings,
    session: SessionSettings,
    browser: BrowserSettings,
}

impl Settings {
    /// Validate `raw` eagerly.
    ///
    /// # Errors
    /// Returns a [`SettingsError`] listing every violated field.
    pub fn from_raw(raw: RawSettings) -> Result<Self, SettingsError> {
        let mut errors = SettingsError::default();

        let base_url = check_url(&mut errors, "base_url", &raw.base_url);
        let webdriver_url = check_url(&mut errors, "webdriver_url", &raw.webdriver_url);

        for (field, value) in [
            ("user", &raw.user),
            ("password", &raw.password),
            ("api_user", &raw.api_user),
            ("api_password", &raw.api_password),
        ] {
            if value.trim().is_empty() {
                errors.push(field, "must not be empty");
            }
        }

        if raw.max_login_retries < 1 {
            errors.push("max_login_retries", "must be at least 1");
        }
        if raw.api_max_attempts < 1 {
            errors.push("api_max_attempts", "must be at least 1");
        }
        if !raw.api_backoff_factor.is_finite() || raw.api_backoff_factor <= 1.0 {
            errors.push("api_backoff_factor", "must be greater than 1");
        }
        if raw.api_timeout_secs == 0 {
            errors.push("api_timeout_secs", "must be positive");
        }
        if raw.token_refresh_margin_secs >= raw.token_ttl_secs {
            errors.push("token_refresh_margin_secs", "must be shorter than token_ttl_secs");
        }
        if raw.min_action_delay_ms > raw.max_action_delay_ms {
            errors.push("min_action_delay_ms", "must not exceed max_action_delay_ms");
        }
        if raw.session_recovery_delay_ms > raw.session_recovery_max_delay_ms {
            errors.push(
                "session_recovery_delay_ms",
                "must not exceed session_recovery_max_delay_ms",
            );
        }

        let filter = check_range(
            &mut errors,
            ("filter_start", &raw.filter_start),
            ("filter_end", &raw.filter_end),
        );
        let api_filter = check_range(
            &mut errors,
            ("api_filter_start", &raw.api_filter_start),
            ("api_filter_end", &raw.api_filter_end),
        );

        if raw.transfer_amount <= Decimal::ZERO {
            errors.push("transfer_amount", "must be positive");
        }
        if raw.transfer_from.trim().is_empty() {
            errors.push("transfer_from", "must not be empty");
        }
        if raw.transfer_to.trim().is_empty() {
            errors.push("transfer_to", "must not be empty");
        }
        if raw.transfer_from.trim() == raw.transfer_to.trim() {
            errors.push("transfer_to", "must differ from transfer_from");
        }
        if raw.excel_path.as_os_str().is_empty() {
            errors.push("excel_path", "must not be empty");
        }

        match (base_url, webdriver_url, filter, api_filter) {
            (Some(base_url), Some(webdriver_url), Some(filter), Some(api_filter))
                if errors.violations.is_empty() =>
            {
                Ok(Self::assemble(raw, base_url, webdriver_url, filter, api_filter))
            }
            _ => Err(errors),
        }
    }

    fn assemble(
        raw: RawSettings,
        base_url: Url,
        webdriver_url: Url,
        filter: (NaiveDate, NaiveDate),
        api_filter: (NaiveDate, NaiveDate),
    ) -> Self {
        Self {
            site: SiteSettings { base_url, username: raw.user, password: raw.password },
            api: ApiSettings {
                username: raw.api_user,
                password: raw.api_password,
                timeout: Duration::from_secs(raw.api_timeout_secs),
                max_attempts: raw.api_max_attempts,
                backoff_base: Duration::from_millis(raw.api_backoff_base_ms),
                backoff_factor: raw.api_backoff_factor,
                jitter: Duration::from_millis(raw.api_jitter_ms),
                token_ttl: Duration::from_secs(raw.token_ttl_secs),
                token_refresh_margin: Duration::from_secs(raw.token_refresh_margin_secs),
                filter_start: api_filter.0,
                filter_end: api_filter.1,
            },
            paths: PathSettings {
                screenshot_dir: raw.screenshot_dir,
                trace_dir: raw.trace_dir,
                excel_path: raw.excel_path,
                log_dir: raw.log_dir,
            },
            scrape: ScrapeSettings {
                max_login_retries: raw.max_login_retries,
                date_format: raw.date_format,
                transaction_time_format: raw.transaction_time_format,
                filter_start: filter.0,
                filter_end: filter.1,
            },
            transfer: TransferSettings {
                from: raw.transfer_from.trim().to_string(),
                to: raw.transfer_to.trim().to_string(),
                amount: raw.transfer_amount,
            },
            humanize: HumanizeSettings {
                enabled: raw.enable_humanized_behavior,
                min_action_delay: Duration::from_millis(raw.min_action_delay_ms),
                max_action_delay: Duration::from_millis(raw.max_action_delay_ms),
                typing_speed: Duration::from_millis(raw.typing_speed_ms),
            },
            session: SessionSettings {
                max_retries: raw.max_session_retries,
                monitoring_enabled: raw.enable_session_monitoring,
                recovery_delay: Duration::from_millis(raw.session_recovery_delay_ms),
                max_recovery_delay: Duration::from_millis(raw.session_recovery_max_delay_ms),
            },
            browser: BrowserSettings { webdriver_url, headless: raw.headless },
        }
    }

    pub fn site(&self) -> &SiteSettings {
        &self.site
    }

    pub fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub fn paths(&self) -> &PathSettings {
        &self.paths
    }

    pub fn scrape(&self) -> &ScrapeSettings {
        &self.scrape
    }

    pub fn transfer(&self) -> &TransferSettings {
        &self.transfer
    }

    pub fn humanize(&self) -> &HumanizeSettings {
        &self.humanize
    }

    pub fn session(&self) -> &SessionSettings {
        &self.session
    }

    pub fn browser(&self) -> &BrowserSettings {
        &self.browser
    }

    /// Effective session recovery bound: zero when monitoring is disabled.
    pub fn session_retries(&self) -> u32 {
        if self.session.monitoring_enabled {
            self.session.max_retries
        } else {
            0
        }
    }

    /// Path for `file_name` under the screenshot directory.
    pub fn screenshot_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.paths.screenshot_dir).join(file_name)
    }
}

fn check_url(errors: &mut SettingsError, field: &str, raw: &str) -> Option<Url> {
    match Url::parse(raw.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => Some(url),
        Ok(url) => {
            errors.push(field, format!("unsupported URL '{url}', expected http(s)"));
            None
        }
        Err(e) => {
            errors.push(field, format!("invalid URL '{raw}': {e}"));
            None
        }
    }
}

fn check_range(
    errors: &mut SettingsError,
    (start_field, start): (&str, &str),
    (end_field, end): (&str, &str),
) -> Option<(NaiveDate, NaiveDate)> {
    let start_date =
        parse_date(start, "%Y-%m-%d").map_err(|e| errors.push(start_field, e.to_string())).ok();
    let end_date =
        parse_date(end, "%Y-%m-%d").map_err(|e| errors.push(end_field, e.to_string())).ok();
    let (start_date, end_date) = (start_date?, end_date?);
    if start_date > end_date {
        errors.push(start_field, format!("{start_date} is after {end_field} {end_date}"));
        return None;
    }
    Some((start_date, end_date))
}
