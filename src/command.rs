/*!
`command.rs`

The contract every subcommand implements.

A command declares its name, a one-line help text, an optional display string for
its positional arguments, and its options as `clap::Arg` values. The dispatcher only
ever talks to commands through this trait, so concrete commands are interchangeable.

Option parsing for a command:
  - no usage line (only the tool-wide parser shows one)
  - no auto-generated `--help`; `tool help <command>` covers that
  - positional arguments are collected in order, interleaved flags allowed
*/

use clap::{Arg, ArgAction, ArgMatches, ColorChoice};

use crate::error::UsageError;
use crate::tool::MultiCommandTool;

/// Id of the hidden catch-all positional added to every command parser.
pub(crate) const POSITIONAL_ID: &str = "__positional_args";

pub trait Command {
    /// Unique within a registry. Must not start with '-'.
    fn name(&self) -> &str;

    fn help_text(&self) -> &str;

    /// Display string for positional arguments, e.g. `"FILE [FILE...]"`. Not enforced.
    fn argument_names(&self) -> Option<&str> {
        None
    }

    fn options(&self) -> Vec<Arg> {
        Vec::new()
    }

    /// Consulted by the tool's policy before the command is allowed to run.
    fn requires_precondition(&self) -> bool {
        false
    }

    /// Run the command. `Ok(status)` becomes the process exit status unchanged.
    fn execute(
        &self,
        options: &ArgMatches,
        args: &[String],
        tool: &MultiCommandTool,
    ) -> anyhow::Result<i32>;

    fn name_with_arguments(&self) -> String {
        let mut usage = self.name().to_string();
        if !self.options().is_empty() {
            usage.push_str(" [options]");
        }
        if let Some(names) = self.argument_names() {
            usage.push(' ');
            usage.push_str(names);
        }
        usage
    }

    fn option_parser(&self) -> clap::Command {
        command_parser(self.name(), self.options())
    }

    /// Parse the tokens after the command name into options + positional arguments.
    fn parse_args(&self, args: &[String]) -> Result<(ArgMatches, Vec<String>), UsageError> {
        let matches = self
            .option_parser()
            .try_get_matches_from(args)
            .map_err(|e| UsageError::InvalidArguments(clap_error_message(&e)))?;
        let positional = matches
            .get_many::<String>(POSITIONAL_ID)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        Ok((matches, positional))
    }
}

/// Parser for a command scope: usage suppressed, help flag disabled.
pub fn command_parser(name: &str, options: Vec<Arg>) -> clap::Command {
    clap::Command::new(name.to_string())
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .disable_version_flag(true)
        .color(ColorChoice::Never)
        .args(options)
        .arg(
            Arg::new(POSITIONAL_ID)
                .num_args(0..)
                .action(ArgAction::Append)
                .value_parser(clap::value_parser!(String))
                .hide(true),
        )
}

/// First line of a clap error without its `error: ` prefix.
pub(crate) fn clap_error_message(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let first = rendered
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("invalid arguments");
    first.strip_prefix("error: ").unwrap_or(first).to_string()
}
