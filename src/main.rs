use anyhow::{Context, Result};

mod cmd;

use multitool::{MultiCommandTool, ToolConfig};

/// Environment variable naming an optional JSON/YAML config file (aliases, program name).
const CONFIG_ENV: &str = "MULTITOOL_CONFIG";

/// Multitool demo - a small git-like tool built on the `multitool` dispatcher.
///
/// Layout:
///   multitool [global options] COMMAND [command options]
///
/// Global flags:
///   -v / -vv        Increase verbosity (diagnostics on stderr)
///   -q / --quiet    Errors only
///   -h / --help     Usage plus the command index
///   -V / --version  Print version
///
/// Environment:
///   MULTITOOL_CONFIG  Path to a config file (.json / .yaml / .yml)
///   MULTITOOL_READY   Allow commands that require the readiness precondition
///
/// Examples:
///   multitool help
///   multitool help echo
///   multitool echo --upper --repeat=2 hello
///   multitool commands --json
///   MULTITOOL_READY=1 multitool publish site
fn main() -> Result<()> {
    let config = ToolConfig::from_env(CONFIG_ENV)
        .with_context(|| format!("Failed to load config named by {CONFIG_ENV}"))?
        .unwrap_or_default();

    let mut tool = MultiCommandTool::new("multitool", cmd::all_commands(), cmd::DemoPolicy::from_env())
        .context("Invalid command registry")?
        .with_about("Multitool demo - git-like command dispatch")
        .with_version(env!("CARGO_PKG_VERSION"))
        .with_config(config);

    let status = tool.main(std::env::args());
    std::process::exit(status);
}
