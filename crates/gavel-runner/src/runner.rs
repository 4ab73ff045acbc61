use std::path::PathBuf;

use tokio::process::Command;
use tracing::{debug, info};

use gavel_core::{ActionResult, Change, CheckConfig, PatchSet, Result, Verdict};

/// Spawns the configured run script for one qualifying event.
///
/// The script is invoked with a scrubbed environment carrying exactly four
/// variables: `CHANGE_ID`, `LOG_DIR`, `REF_ID`, and `AUTHOR`. It inherits
/// nothing else, so a script that needs `PATH` or similar must set it
/// itself. The call blocks until the script exits; there is no timeout.
///
/// # Examples
///
/// ```
/// use gavel_core::CheckConfig;
/// use gavel_runner::ActionRunner;
///
/// let check = CheckConfig {
///     run_script: "/usr/local/bin/run_tests.sh".into(),
///     static_dir: "/srv/logs".into(),
///     http_server: "http://logs.example.com".into(),
/// };
/// let runner = ActionRunner::new(&check);
/// assert_eq!(
///     runner.artifact_url("42", "3"),
///     "http://logs.example.com/42/3/console.log"
/// );
/// ```
pub struct ActionRunner {
    run_script: PathBuf,
    static_dir: PathBuf,
    http_server: String,
}

impl ActionRunner {
    /// Build a runner from the `[check]` config section.
    pub fn new(check: &CheckConfig) -> Self {
        Self {
            run_script: check.run_script.clone(),
            static_dir: check.static_dir.clone(),
            http_server: check.http_server.clone(),
        }
    }

    /// Log directory for one (change, patchset) pair: `static_dir/<change>/<patchset>`.
    ///
    /// Deterministic, so re-running a check for the same patchset reuses
    /// the same directory.
    pub fn output_dir(&self, change_number: &str, patchset_number: &str) -> PathBuf {
        self.static_dir.join(change_number).join(patchset_number)
    }

    /// Where the run's console log will be served from. The script is
    /// expected to write `console.log` into the log directory; nothing
    /// here verifies that it did.
    pub fn artifact_url(&self, change_number: &str, patchset_number: &str) -> String {
        format!(
            "{}/{}/{}/console.log",
            self.http_server, change_number, patchset_number
        )
    }

    /// Run the check script for `change`/`patch_set` and capture its verdict.
    ///
    /// # Errors
    ///
    /// Returns [`gavel_core::GavelError::Io`] when the log directory cannot
    /// be created or the script cannot be spawned at all (missing binary,
    /// permissions). A script that starts and exits nonzero is not an
    /// error; it is a [`Verdict::Fail`].
    pub async fn run(&self, change: &Change, patch_set: &PatchSet) -> Result<ActionResult> {
        let output_dir = self.output_dir(&change.number, &patch_set.number);
        tokio::fs::create_dir_all(&output_dir).await?;

        debug!(
            script = %self.run_script.display(),
            log_dir = %output_dir.display(),
            "spawning run script"
        );
        let status = Command::new(&self.run_script)
            .env_clear()
            .env("CHANGE_ID", &change.number)
            .env("LOG_DIR", &output_dir)
            .env("REF_ID", &patch_set.ref_id)
            .env("AUTHOR", &patch_set.author.email)
            .status()
            .await?;

        // None means the script died to a signal; fold that into Fail.
        let exit_code = status.code().unwrap_or(-1);
        info!(
            script = %self.run_script.display(),
            exit_code,
            "run script exited"
        );

        Ok(ActionResult {
            exit_code,
            verdict: Verdict::from_exit_code(exit_code),
            artifact_url: self.artifact_url(&change.number, &patch_set.number),
        })
    }
}
