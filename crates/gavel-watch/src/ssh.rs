//! The real Gerrit transport: `gerrit stream-events` over ssh.
//!
//! A connection is a long-lived `ssh … gerrit stream-events` child whose
//! stdout lines are the event feed. Votes go out as one-shot
//! `gerrit review` invocations over the same settings; the ssh CLI handles
//! keys, known hosts, and keepalives.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info};

use gavel_core::{Event, GavelError, GerritConfig, Result};

use crate::connection::{Connection, Connector};

/// Builds SSH connections to a Gerrit server from the `[gerrit]` config.
#[derive(Debug, Clone)]
pub struct SshConnector {
    host: String,
    port: u16,
    username: String,
    key_file: Option<PathBuf>,
}

impl SshConnector {
    pub fn new(gerrit: &GerritConfig) -> Self {
        Self {
            host: gerrit.host.clone(),
            port: gerrit.port,
            username: gerrit.username.clone(),
            key_file: gerrit.key_file.clone(),
        }
    }

    fn ssh_command(&self) -> Command {
        let mut cmd = Command::new("ssh");
        cmd.arg("-p").arg(self.port.to_string());
        if let Some(key) = &self.key_file {
            cmd.arg("-i").arg(key);
        }
        // BatchMode keeps a bad key from hanging on a password prompt.
        cmd.arg("-o")
            .arg("BatchMode=yes")
            .arg("-o")
            .arg("ServerAliveInterval=60")
            .arg(format!("{}@{}", self.username, self.host));
        cmd
    }

    /// One-shot `gerrit version` so auth and network problems surface at
    /// connect time instead of as an immediate EOF on the stream.
    async fn probe(&self) -> Result<()> {
        let output = self
            .ssh_command()
            .arg("gerrit")
            .arg("version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GavelError::Connect(format!(
                "gerrit version probe failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Conn = SshConnection;

    async fn connect(&self) -> Result<SshConnection> {
        self.probe().await?;

        let mut child = self
            .ssh_command()
            .arg("gerrit")
            .arg("stream-events")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| GavelError::Connect("stream child has no stdout".into()))?;

        info!(host = %self.host, port = self.port, "watching gerrit event stream");
        Ok(SshConnection {
            connector: self.clone(),
            child,
            lines: BufReader::new(stdout).lines(),
        })
    }
}

/// A live `gerrit stream-events` child plus the settings needed to send
/// votes back.
pub struct SshConnection {
    connector: SshConnector,
    child: Child,
    lines: Lines<BufReader<ChildStdout>>,
}

#[async_trait]
impl Connection for SshConnection {
    async fn next_event(&mut self) -> Result<Event> {
        match self.lines.next_line().await? {
            Some(line) => {
                debug!(line = %line, "raw stream event");
                Ok(serde_json::from_str(&line)?)
            }
            None => Err(GavelError::Transport("event stream closed".into())),
        }
    }

    fn is_alive(&mut self) -> bool {
        // A dead ssh child means the stream is gone for good.
        matches!(self.child.try_wait(), Ok(None))
    }

    async fn submit_review(
        &mut self,
        project: &str,
        change_spec: &str,
        message: &str,
        vote: i32,
    ) -> Result<()> {
        let output = self
            .connector
            .ssh_command()
            .arg("gerrit")
            .arg("review")
            .arg("--project")
            .arg(project)
            // The remote side runs through a shell, so the message needs
            // quoting; everything else is a known-safe token.
            .arg("--message")
            .arg(sh_quote(message))
            .arg("--verified")
            .arg(format!("{vote:+}"))
            .arg(change_spec)
            .stdin(Stdio::null())
            .output()
            .await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(GavelError::Review(format!(
                "gerrit review exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        info!(change = change_spec, vote, "review submitted");
        Ok(())
    }
}

/// Wrap `s` in single quotes for a POSIX remote shell.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sh_quote_wraps_plain_text() {
        assert_eq!(
            sh_quote("run_tests.sh: SUCCESS: http://logs/42/3/console.log"),
            "'run_tests.sh: SUCCESS: http://logs/42/3/console.log'"
        );
    }

    #[test]
    fn sh_quote_escapes_single_quotes() {
        assert_eq!(sh_quote("it's fine"), r"'it'\''s fine'");
    }

    #[test]
    fn sh_quote_handles_empty_string() {
        assert_eq!(sh_quote(""), "''");
    }
}
