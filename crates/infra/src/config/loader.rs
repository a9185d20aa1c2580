//! Configuration loader
//!
//! Builds validated [`Settings`] from layered sources.
//!
//! ## Loading Strategy
//! 1. `.env` is loaded into the process environment when present
//! 2. Defaults come from [`RawSettings::default`]
//! 3. A TOML or JSON file is merged over the defaults: the path given on the
//!    command line, otherwise the first file found by
//!    [`discover_config_path`]
//! 4. `ALTORO_<FIELD>` environment variables override the file
//! 5. [`Settings::from_raw`] validates the result
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./altoro.toml`
//! 2. `./altoro.json`
//! 3. `./config/altoro.toml`

use std::path::{Path, PathBuf};

use altoro_domain::{AltoroError, RawSettings, Result, Settings};

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "ALTORO_";

/// `ALTORO_*` variables that are not settings.
const RESERVED_ENV: [&str; 1] = ["CONFIG"];

const SEARCH_PATHS: [&str; 3] = ["altoro.toml", "altoro.json", "config/altoro.toml"];

/// Load settings from `.env`, the optional file and the process
/// environment.
///
/// # Errors
/// Returns `AltoroError::Config` if the file is missing or malformed, an
/// override has an unparseable value, or validation fails.
pub fn load(path: Option<&Path>) -> Result<Settings> {
    match dotenvy::dotenv() {
        Ok(env_file) => tracing::debug!(path = %env_file.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "could not read .env"),
    }
    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => discover_config_path(),
    };
    let settings = load_with(file.as_deref(), std::env::vars())?;
    tracing::info!(base_url = %settings.site().base_url, "configuration loaded");
    Ok(settings)
}

/// [`load`] without touching the process: `vars` stands in for the
/// environment.
///
/// # Errors
/// See [`load`].
pub fn load_with<I>(file: Option<&Path>, vars: I) -> Result<Settings>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut raw = match file {
        Some(path) => load_from_file(path)?,
        None => {
            tracing::debug!("no config file, using defaults");
            RawSettings::default()
        }
    };
    apply_env_overrides(&mut raw, vars)?;
    Ok(Settings::from_raw(raw)?)
}

/// Read a settings file. Fields it leaves out keep their defaults.
///
/// # Errors
/// Returns `AltoroError::Config` if the file cannot be read or parsed.
pub fn load_from_file(path: &Path) -> Result<RawSettings> {
    if !path.exists() {
        return Err(AltoroError::Config(format!("Config file not found: {}", path.display())));
    }
    tracing::info!(path = %path.display(), "Loading configuration from file");
    let contents = std::fs::read_to_string(path)
        .map_err(|e| AltoroError::Config(format!("Failed to read config file: {e}")))?;
    parse_config(&contents, path)
}

/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `AltoroError::Config` for unknown extensions and parse failures.
fn parse_config(contents: &str, path: &Path) -> Result<RawSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| AltoroError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| AltoroError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(AltoroError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Apply every `ALTORO_<FIELD>` variable. All bad values are reported
/// together.
///
/// # Errors
/// Returns `AltoroError::Config` naming each rejected variable.
pub fn apply_env_overrides<I>(raw: &mut RawSettings, vars: I) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut problems = Vec::new();
    for (name, value) in vars {
        let Some(field) = name.strip_prefix(ENV_PREFIX) else { continue };
        if RESERVED_ENV.contains(&field) {
            continue;
        }
        match raw.apply_override(field, &value) {
            Ok(()) => tracing::debug!(variable = %name, "applied environment override"),
            Err(violation) => problems.push(format!("{name}: {}", violation.message)),
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AltoroError::Config(format!("invalid environment overrides: {}", problems.join("; "))))
    }
}

/// The first existing file among the search locations, relative to the
/// current directory.
pub fn discover_config_path() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    discover_in(&cwd)
}

fn discover_in(dir: &Path) -> Option<PathBuf> {
    SEARCH_PATHS.iter().map(|p| dir.join(p)).find(|candidate| {
        let found = candidate.is_file();
        if found {
            tracing::debug!(path = %candidate.display(), "found config file");
        }
        found
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use rust_decimal_macros::dec;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let settings = load_with(None, Vec::new()).expect("defaults are valid");
        assert_eq!(settings.site().base_url.as_str(), "https://demo.testfire.net/");
        assert_eq!(settings.transfer().amount, dec!(250.00));
        assert_eq!(settings.api().max_attempts, 4);
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("altoro.toml");
        fs::write(&path, "user = \"admin\"\napi_max_attempts = 6\n").expect("write");

        let overrides = vars(&[("ALTORO_API_MAX_ATTEMPTS", "2"), ("HOME", "/root")]);
        let settings = load_with(Some(&path), overrides).expect("load");

        assert_eq!(settings.site().username, "admin");
        assert_eq!(settings.api().max_attempts, 2);
    }

    #[test]
    fn test_bad_overrides_are_reported_together() {
        let mut raw = RawSettings::default();
        let err = apply_env_overrides(
            &mut raw,
            vars(&[
                ("ALTORO_HEADLESS", "maybe"),
                ("ALTORO_API_MAX_ATTEMPTS", "x"),
                ("ALTORO_CONFIG", "a.toml"),
            ]),
        )
        .expect_err("invalid");

        let message = err.to_string();
        assert!(message.contains("ALTORO_HEADLESS"));
        assert!(message.contains("ALTORO_API_MAX_ATTEMPTS"));
        assert!(!message.contains("ALTORO_CONFIG"));
    }

    #[test]
    fn test_discovery_prefers_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover_in(dir.path()).is_none());

        fs::write(dir.path().join("altoro.json"), "{}").expect("write");
        assert_eq!(discover_in(dir.path()), Some(dir.path().join("altoro.json")));

        fs::write(dir.path().join("altoro.toml"), "").expect("write");
        assert_eq!(discover_in(dir.path()), Some(dir.path().join("altoro.toml")));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_config("", Path::new("settings.yaml")).expect_err("yaml");
        assert!(matches!(err, AltoroError::Config(m) if m.contains("yaml")));
    }
}
