use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use gavel_core::GavelConfig;
use gavel_runner::ActionRunner;
use gavel_watch::{SshConnector, Supervisor, Watcher};

const SYSTEM_CONFIG_PATH: &str = "/etc/gavel/gavel.toml";

const CONFIG_TEMPLATE: &str = r#"# gavel configuration

[gerrit]
host = "review.example.com"
port = 29418
username = "gavel"
# key_file = "/var/lib/gavel/id_rsa"

[watch]
# Projects to react to; events on any other project are ignored.
projects = []
# A comment ending in this word (as its own final line) re-runs the check.
recheck_word = "recheck"
# Submit the verdict back as a Verified vote. Leave off for a dry run that
# only logs what it would vote.
voting = false

[check]
# Script spawned once per matching event. It receives exactly four
# environment variables (CHANGE_ID, LOG_DIR, REF_ID, AUTHOR) and is
# expected to write console.log into LOG_DIR.
run_script = "/usr/local/bin/run_tests.sh"
# Where per-run logs land, and the address they are served back under.
static_dir = "/srv/gavel/logs"
http_server = "http://logs.example.com"
"#;

#[derive(Parser)]
#[command(
    name = "gavel",
    version,
    about = "Gerrit verification bot: watches the event stream, runs your checks, votes the result back",
    long_about = "Gavel watches a Gerrit server's live event stream and runs a check\n\
                  script against every new patchset (or 'recheck' comment) on the\n\
                  projects it is told to watch, then votes the result back as a\n\
                  Verified score.\n\n\
                  Examples:\n  \
                    gavel init                  Create a gavel.toml template\n  \
                    gavel doctor                Check config, ssh, and the run script\n  \
                    gavel -f /etc/gavel/gavel.toml   Run the bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: ./gavel.toml, then /etc/gavel/gavel.toml)
    #[arg(short = 'f', long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG wins when set)
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Clone)]
enum Command {
    /// Watch the event stream and run checks (the default)
    Run,
    /// Create a default configuration file
    #[command(long_about = "Create a default configuration file.\n\n\
        Writes a commented template to the --config path (default ./gavel.toml).\n\
        Fails if the file already exists.")]
    Init,
    /// Check your gavel setup and environment
    #[command(long_about = "Check your gavel setup and environment.\n\n\
        Runs diagnostics for the config file, required settings, the ssh\n\
        binary, the run script, and the static log directory.")]
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command.clone().unwrap_or(Command::Run) {
        Command::Run => run_daemon(&cli).await,
        Command::Init => run_init(&cli),
        Command::Doctor => run_doctor(&cli),
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// `--config` path if given, otherwise `./gavel.toml`, otherwise the
/// system-wide path. `None` when nothing exists.
fn discover_config(cli: &Cli) -> Option<PathBuf> {
    if let Some(path) = &cli.config {
        return Some(path.clone());
    }
    let local = PathBuf::from("gavel.toml");
    if local.exists() {
        return Some(local);
    }
    let system = PathBuf::from(SYSTEM_CONFIG_PATH);
    if system.exists() {
        return Some(system);
    }
    None
}

fn load_config(cli: &Cli) -> Result<GavelConfig> {
    match discover_config(cli) {
        Some(path) => GavelConfig::from_file(&path)
            .into_diagnostic()
            .wrap_err(format!("loading {}", path.display())),
        None => Ok(GavelConfig::default()),
    }
}

async fn run_daemon(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    config.validate().into_diagnostic()?;

    let connector = SshConnector::new(&config.gerrit);
    let runner = ActionRunner::new(&config.check);
    let watcher = Watcher::new(Supervisor::new(connector), config.watch, runner);

    tracing::info!(
        host = %config.gerrit.host,
        port = config.gerrit.port,
        "gavel starting"
    );
    // The event loop never returns; its output type proves it.
    match watcher.run().await {}
}

fn run_init(cli: &Cli) -> Result<()> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("gavel.toml"));
    if path.exists() {
        miette::bail!("{} already exists, not overwriting", path.display());
    }
    std::fs::write(&path, CONFIG_TEMPLATE)
        .into_diagnostic()
        .wrap_err(format!("writing {}", path.display()))?;
    println!("Wrote {}. Edit it, then try 'gavel doctor'.", path.display());
    Ok(())
}

fn run_doctor(cli: &Cli) -> Result<()> {
    let mut failures = 0;
    let mut check = |ok: bool, name: &str, detail: String| {
        let symbol = if ok { "\u{2713}" } else { "\u{2717}" };
        println!("{symbol} {name}: {detail}");
        if !ok {
            failures += 1;
        }
    };

    let config = match discover_config(cli) {
        Some(path) => match GavelConfig::from_file(&path) {
            Ok(config) => {
                check(true, "config", format!("loaded {}", path.display()));
                config
            }
            Err(err) => {
                check(false, "config", format!("{}: {err}", path.display()));
                GavelConfig::default()
            }
        },
        None => {
            check(
                false,
                "config",
                "no gavel.toml found; run 'gavel init'".into(),
            );
            GavelConfig::default()
        }
    };

    check(
        !config.gerrit.host.is_empty(),
        "gerrit.host",
        if config.gerrit.host.is_empty() {
            "not set".into()
        } else {
            format!("{}:{}", config.gerrit.host, config.gerrit.port)
        },
    );
    check(
        !config.gerrit.username.is_empty(),
        "gerrit.username",
        if config.gerrit.username.is_empty() {
            "not set".into()
        } else {
            config.gerrit.username.clone()
        },
    );
    check(
        !config.watch.projects.is_empty(),
        "watch.projects",
        format!("{} project(s) watched", config.watch.projects.len()),
    );

    match find_in_path("ssh") {
        Some(path) => check(true, "ssh", format!("found at {}", path.display())),
        None => check(false, "ssh", "not found in PATH".into()),
    }

    let script = &config.check.run_script;
    if script.as_os_str().is_empty() {
        check(false, "check.run_script", "not set".into());
    } else {
        let executable = is_executable(script);
        check(
            executable,
            "check.run_script",
            if executable {
                script.display().to_string()
            } else {
                format!("{} is missing or not executable", script.display())
            },
        );
    }

    let static_dir = &config.check.static_dir;
    check(
        !static_dir.as_os_str().is_empty() && static_dir.is_dir(),
        "check.static_dir",
        if static_dir.as_os_str().is_empty() {
            "not set".into()
        } else if static_dir.is_dir() {
            static_dir.display().to_string()
        } else {
            format!("{} is not a directory", static_dir.display())
        },
    );

    if failures > 0 {
        miette::bail!("{failures} check(s) failed");
    }
    println!("All checks passed.");
    Ok(())
}

fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
