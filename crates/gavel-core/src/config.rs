use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::GavelError;

/// Top-level configuration loaded from `gavel.toml`.
///
/// Every field has a default so a partial file parses; [`GavelConfig::validate`]
/// catches the values that cannot be defaulted before the daemon starts.
///
/// # Examples
///
/// ```
/// use gavel_core::GavelConfig;
///
/// let config = GavelConfig::default();
/// assert_eq!(config.gerrit.port, 29418);
/// assert_eq!(config.watch.recheck_word, "recheck");
/// assert!(!config.watch.voting);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GavelConfig {
    /// Gerrit server connection settings.
    #[serde(default)]
    pub gerrit: GerritConfig,
    /// Which events warrant a check run, and whether to vote.
    #[serde(default)]
    pub watch: WatchPolicy,
    /// External check invocation and artifact settings.
    #[serde(default)]
    pub check: CheckConfig,
}

impl GavelConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GavelError::Io`] if the file cannot be read, or
    /// [`GavelError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use gavel_core::GavelConfig;
    /// use std::path::Path;
    ///
    /// let config = GavelConfig::from_file(Path::new("gavel.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, GavelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`GavelError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use gavel_core::GavelConfig;
    ///
    /// let toml = r#"
    /// [gerrit]
    /// host = "review.example.com"
    /// "#;
    /// let config = GavelConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.gerrit.host, "review.example.com");
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, GavelError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Check that the values with no sensible default are present.
    ///
    /// # Errors
    ///
    /// Returns [`GavelError::Config`] naming the first missing value.
    pub fn validate(&self) -> Result<(), GavelError> {
        if self.gerrit.host.is_empty() {
            return Err(GavelError::Config("gerrit.host is not set".into()));
        }
        if self.gerrit.username.is_empty() {
            return Err(GavelError::Config("gerrit.username is not set".into()));
        }
        if self.check.run_script.as_os_str().is_empty() {
            return Err(GavelError::Config("check.run_script is not set".into()));
        }
        if self.watch.projects.is_empty() {
            return Err(GavelError::Config(
                "watch.projects is empty, nothing to watch".into(),
            ));
        }
        Ok(())
    }
}

/// Gerrit server connection settings (`[gerrit]`).
///
/// # Examples
///
/// ```
/// use gavel_core::GerritConfig;
///
/// let config = GerritConfig::default();
/// assert_eq!(config.port, 29418);
/// assert!(config.key_file.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GerritConfig {
    /// Gerrit host to connect to.
    #[serde(default)]
    pub host: String,
    /// Gerrit SSH port (default: 29418).
    #[serde(default = "default_port")]
    pub port: u16,
    /// Username to connect as.
    #[serde(default)]
    pub username: String,
    /// Private key path; when unset, ssh picks its own identity.
    pub key_file: Option<PathBuf>,
}

fn default_port() -> u16 {
    29418
}

impl Default for GerritConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            username: String::new(),
            key_file: None,
        }
    }
}

/// Which events warrant action (`[watch]`).
///
/// Loaded once at startup and never mutated; owned by the event loop and
/// the filter.
///
/// # Examples
///
/// ```
/// use gavel_core::WatchPolicy;
///
/// let policy = WatchPolicy {
///     projects: vec!["demo".into()],
///     recheck_word: "recheck".into(),
///     voting: true,
/// };
/// assert!(policy.watches("demo"));
/// assert!(!policy.watches("other"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchPolicy {
    /// Projects to react to; events on any other project are ignored.
    #[serde(default)]
    pub projects: Vec<String>,
    /// A comment whose final line equals this word re-triggers the check.
    #[serde(default = "default_recheck_word")]
    pub recheck_word: String,
    /// Submit the verdict back as a Verified vote. When false the vote is
    /// computed and logged but never transmitted.
    #[serde(default)]
    pub voting: bool,
}

impl WatchPolicy {
    /// Whether `project` is on the watch list.
    pub fn watches(&self, project: &str) -> bool {
        self.projects.iter().any(|p| p == project)
    }
}

fn default_recheck_word() -> String {
    "recheck".into()
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            recheck_word: default_recheck_word(),
            voting: false,
        }
    }
}

/// External check invocation and artifact settings (`[check]`).
///
/// # Examples
///
/// ```
/// use gavel_core::CheckConfig;
///
/// let config = CheckConfig::default();
/// assert!(config.run_script.as_os_str().is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckConfig {
    /// Script spawned once per matching event.
    #[serde(default)]
    pub run_script: PathBuf,
    /// Base directory for per-run log output.
    #[serde(default)]
    pub static_dir: PathBuf,
    /// HTTP address under which `static_dir` is served, used to build the
    /// artifact link put in the review message.
    #[serde(default)]
    pub http_server: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = GavelConfig::default();
        assert_eq!(config.gerrit.port, 29418);
        assert!(config.gerrit.host.is_empty());
        assert!(config.gerrit.key_file.is_none());
        assert_eq!(config.watch.recheck_word, "recheck");
        assert!(config.watch.projects.is_empty());
        assert!(!config.watch.voting);
        assert!(config.check.http_server.is_empty());
    }

    #[test]
    fn parse_minimal_toml() {
        let toml = r#"
[gerrit]
host = "review.example.com"
username = "gavel"
"#;
        let config = GavelConfig::from_toml(toml).unwrap();
        assert_eq!(config.gerrit.host, "review.example.com");
        assert_eq!(config.gerrit.username, "gavel");
        assert_eq!(config.gerrit.port, 29418);
        assert_eq!(config.watch.recheck_word, "recheck");
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[gerrit]
host = "review.example.com"
port = 2222
username = "gavel"
key_file = "/var/lib/gavel/id_rsa"

[watch]
projects = ["demo", "infra/tools"]
recheck_word = "retest"
voting = true

[check]
run_script = "/usr/local/bin/run_tests.sh"
static_dir = "/srv/logs"
http_server = "http://logs.example.com"
"#;
        let config = GavelConfig::from_toml(toml).unwrap();
        assert_eq!(config.gerrit.port, 2222);
        assert_eq!(
            config.gerrit.key_file.as_deref(),
            Some(Path::new("/var/lib/gavel/id_rsa"))
        );
        assert_eq!(config.watch.projects, vec!["demo", "infra/tools"]);
        assert_eq!(config.watch.recheck_word, "retest");
        assert!(config.watch.voting);
        assert_eq!(config.check.http_server, "http://logs.example.com");
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = GavelConfig::from_toml("").unwrap();
        assert_eq!(config.gerrit.port, 29418);
        assert_eq!(config.watch.recheck_word, "recheck");
    }

    #[test]
    fn invalid_toml_returns_error() {
        let result = GavelConfig::from_toml("{{invalid}}");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_missing_host() {
        let config = GavelConfig::from_toml(
            r#"
[gerrit]
username = "gavel"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gerrit.host"));
    }

    #[test]
    fn validate_rejects_empty_watch_list() {
        let config = GavelConfig::from_toml(
            r#"
[gerrit]
host = "review.example.com"
username = "gavel"

[check]
run_script = "/usr/local/bin/run_tests.sh"
"#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("watch.projects"));
    }

    #[test]
    fn validate_accepts_complete_config() {
        let config = GavelConfig::from_toml(
            r#"
[gerrit]
host = "review.example.com"
username = "gavel"

[watch]
projects = ["demo"]

[check]
run_script = "/usr/local/bin/run_tests.sh"
"#,
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn watches_matches_exact_project_names() {
        let policy = WatchPolicy {
            projects: vec!["demo".into(), "infra/tools".into()],
            ..WatchPolicy::default()
        };
        assert!(policy.watches("demo"));
        assert!(policy.watches("infra/tools"));
        assert!(!policy.watches("dem"));
        assert!(!policy.watches("infra"));
    }
}
