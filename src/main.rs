//! Binary entry point for the pdctl CLI.

use std::io;
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use pdctl::{
    AttachMode, ConfigError, DesiredState, FailureRecord, GceConfig, GceGateway, Lifecycle,
    Outcome, ReconcileError, Reconciler, report,
};

mod cli;

use cli::{Cli, ModeArg, StateArg};

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let exit_code = match run(cli).await {
        Ok(outcome) => {
            if report::write_outcome(io::stdout(), &outcome).is_ok() {
                0
            } else {
                1
            }
        }
        Err(err) => {
            report::write_failure(io::stdout(), &FailureRecord::new(err.to_string())).ok();
            1
        }
    };

    process::exit(exit_code);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<Outcome, CliError> {
    let desired = desired_state(&cli);
    // Validate the request before loading configuration so usage mistakes
    // are reported even when no credentials are present.
    desired.validate()?;

    let config = GceConfig::load_without_cli_args()?;
    let gateway = GceGateway::new(config)?;
    let reconciler = Reconciler::new(gateway);
    Ok(reconciler.converge(&desired).await?)
}

fn desired_state(cli: &Cli) -> DesiredState {
    DesiredState::new(&cli.name, &cli.zone)
        .size_gb(&cli.size_gb)
        .instance_name(cli.instance_name.clone())
        .mode(match cli.mode {
            ModeArg::ReadOnly => AttachMode::ReadOnly,
            ModeArg::ReadWrite => AttachMode::ReadWrite,
        })
        .lifecycle(match cli.state {
            StateArg::Present | StateArg::Active => Lifecycle::Present,
            StateArg::Absent | StateArg::Deleted => Lifecycle::Absent,
        })
        .detach_only(cli.detach_only)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args.iter().copied()).expect("arguments should parse")
    }

    #[rstest]
    #[case("present", Lifecycle::Present)]
    #[case("active", Lifecycle::Present)]
    #[case("absent", Lifecycle::Absent)]
    #[case("deleted", Lifecycle::Absent)]
    fn state_arguments_map_to_lifecycle(#[case] state: &str, #[case] expected: Lifecycle) {
        let cli = parse(&["pdctl", "--name", "pd", "--state", state]);

        assert_eq!(desired_state(&cli).lifecycle, expected);
    }

    #[test]
    fn defaults_match_the_documented_contract() {
        let cli = parse(&["pdctl", "--name", "pd"]);
        let desired = desired_state(&cli);

        assert_eq!(desired.size_gb, "10");
        assert_eq!(desired.zone, "us-central1-b");
        assert_eq!(desired.mode, AttachMode::ReadOnly);
        assert_eq!(desired.lifecycle, Lifecycle::Present);
        assert!(!desired.detach_only);
        assert_eq!(desired.instance_name, None);
    }

    #[test]
    fn mode_argument_maps_to_read_write() {
        let cli = parse(&[
            "pdctl",
            "--name",
            "pd",
            "--instance-name",
            "web1",
            "--mode",
            "read-write",
        ]);
        let desired = desired_state(&cli);

        assert_eq!(desired.mode, AttachMode::ReadWrite);
        assert_eq!(desired.instance_name.as_deref(), Some("web1"));
    }

    #[test]
    fn detach_only_without_instance_fails_validation() {
        let cli = parse(&["pdctl", "--name", "pd", "--state", "absent", "--detach-only"]);
        let err = desired_state(&cli)
            .validate()
            .expect_err("validation should fail");

        assert_eq!(err, ReconcileError::DetachRequiresInstance);
    }
}
