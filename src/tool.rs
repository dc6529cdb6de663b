/*!
`tool.rs`

`MultiCommandTool` turns `tool [global options] command [command options]` into a
call to one registered `Command`.

Dispatch, one pass per `main` call:
  1. split argv[1..] into (global args, command name, command args)
  2. parse global args (`--help` / `--version` end here with status 0)
  3. no command name -> usage error
  4. unknown name with a configured alias -> expand the alias
  5. `help [COMMAND]` -> print help, status 0
  6. resolve the command (unknown -> usage error)
  7. ask the policy; a refusal prints its reason and returns 0
  8. parse command args with the command's own schema
  9. execute, returning its status unchanged

Usage errors print `<prog>: error: <message>` plus a pointer to `--help` and
yield status 1.
*/

use std::path::{Path, PathBuf};

use clap::error::ErrorKind;
use clap::{Arg, ArgAction, ArgMatches, ColorChoice};
use tracing::{debug, warn};

use crate::command::{Command, clap_error_message};
use crate::config::{ToolConfig, expand_alias};
use crate::error::{RegistryError, UsageError};
use crate::help::{self, HelpStyle};
use crate::registry::{CommandRegistry, HELP_COMMAND};
use crate::utils::{OutputSink, StdioSink, derive_level, init_logging};

/// Exit status for every usage error.
pub const USAGE_ERROR_STATUS: i32 = 1;

const VERBOSE_ID: &str = "verbose";
const QUIET_ID: &str = "quiet";
const EXTRA_ID: &str = "__extra_global_args";

/* ---- Policy ---- */

/// Outcome of the policy check that runs before a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed,
    /// The reason is shown to the user; the run ends with status 0.
    Refused(String),
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Authorization::Allowed)
    }
}

/// Environment-specific decisions a concrete tool makes about its commands.
pub trait ToolPolicy {
    /// Whether `command` appears in the `--help` command index.
    fn should_show_command_help(&self, command: &dyn Command) -> bool;

    /// Whether `command` may run right now.
    fn should_execute_command(&self, command: &dyn Command) -> Authorization;
}

/// Shows and allows everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl ToolPolicy for AllowAll {
    fn should_show_command_help(&self, _command: &dyn Command) -> bool {
        true
    }

    fn should_execute_command(&self, _command: &dyn Command) -> Authorization {
        Authorization::Allowed
    }
}

/* ---- Argument partition ---- */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPartition {
    pub global_args: Vec<String>,
    pub command_name: Option<String>,
    pub command_args: Vec<String>,
}

/* ---- Dispatcher ---- */

/// A usage error plus whether the tool-wide usage line goes in front of it.
#[derive(Debug)]
struct DispatchError {
    error: UsageError,
    show_usage: bool,
}

impl DispatchError {
    fn command_scope(error: UsageError) -> Self {
        Self {
            error,
            show_usage: false,
        }
    }
}

impl From<UsageError> for DispatchError {
    fn from(error: UsageError) -> Self {
        Self {
            error,
            show_usage: true,
        }
    }
}

pub struct MultiCommandTool {
    name: String,
    about: Option<String>,
    version: Option<String>,
    global_options: Vec<Arg>,
    commands: CommandRegistry,
    policy: Box<dyn ToolPolicy>,
    config: ToolConfig,
    output: Box<dyn OutputSink>,
    prog_name: String,
    prog_path: Option<PathBuf>,
    global_matches: Option<ArgMatches>,
}

impl MultiCommandTool {
    /// `name` is the fallback program name when argv[0] gives none.
    pub fn new(
        name: impl Into<String>,
        commands: Vec<Box<dyn Command>>,
        policy: impl ToolPolicy + 'static,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        Ok(Self {
            prog_name: name.clone(),
            prog_path: None,
            name,
            about: None,
            version: None,
            global_options: Vec::new(),
            commands: CommandRegistry::new(commands)?,
            policy: Box::new(policy),
            config: ToolConfig::default(),
            output: Box::new(StdioSink),
            global_matches: None,
        })
    }

    pub fn with_about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Extra tool-wide option. Value-taking options must be passed as `--name=value`.
    ///
    /// Fails when the id, short or long flag is already taken by a built-in
    /// (`-v/--verbose`, `-q/--quiet`, `-h/--help`, `-V/--version`) or by an
    /// earlier global option.
    pub fn with_global_option(mut self, option: Arg) -> Result<Self, RegistryError> {
        if let Some(taken) = self.global_option_clash(&option) {
            return Err(RegistryError::GlobalOptionClash(taken));
        }
        self.global_options.push(option);
        Ok(self)
    }

    fn global_option_clash(&self, option: &Arg) -> Option<String> {
        let id = option.get_id().as_str();
        if [VERBOSE_ID, QUIET_ID, EXTRA_ID, "help", "version"].contains(&id)
            || self.global_options.iter().any(|o| o.get_id() == option.get_id())
        {
            return Some(id.to_string());
        }
        if let Some(short) = option.get_short()
            && (['v', 'q', 'h', 'V'].contains(&short)
                || self.global_options.iter().any(|o| o.get_short() == Some(short)))
        {
            return Some(format!("-{short}"));
        }
        if let Some(long) = option.get_long()
            && (["verbose", "quiet", "help", "version"].contains(&long)
                || self.global_options.iter().any(|o| o.get_long() == Some(long)))
        {
            return Some(format!("--{long}"));
        }
        None
    }

    pub fn with_config(mut self, config: ToolConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_output(mut self, output: impl OutputSink + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    /* ---- Read-only view handed to commands ---- */

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    pub fn command_by_name(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name)
    }

    /// Parsed global options of the current invocation.
    pub fn global_options(&self) -> Option<&ArgMatches> {
        self.global_matches.as_ref()
    }

    pub fn program_name(&self) -> &str {
        &self.prog_name
    }

    /// `argv[0]` of the current invocation, as given.
    pub fn program_path(&self) -> Option<&Path> {
        self.prog_path.as_deref()
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn output(&self) -> &dyn OutputSink {
        self.output.as_ref()
    }

    pub fn should_show_command_help(&self, command: &dyn Command) -> bool {
        self.policy.should_show_command_help(command)
    }

    pub fn should_execute_command(&self, command: &dyn Command) -> Authorization {
        self.policy.should_execute_command(command)
    }

    /* ---- Argument handling ---- */

    /// The first token not starting with '-' is the command name. Without one,
    /// everything is a global arg so `tool --help` works.
    pub fn split_args(args: &[String]) -> ArgPartition {
        match args.iter().position(|a| !a.starts_with('-')) {
            Some(idx) => ArgPartition {
                global_args: args[..idx].to_vec(),
                command_name: Some(args[idx].clone()),
                command_args: args[idx + 1..].to_vec(),
            },
            None => ArgPartition {
                global_args: args.to_vec(),
                command_name: None,
                command_args: Vec::new(),
            },
        }
    }

    fn usage_line(&self) -> String {
        format!("{} [options] COMMAND [ARGS]", self.prog_name)
    }

    /// Tool-wide parser used for parsing. It carries no epilog; `global_help`
    /// adds one only when help is actually rendered.
    pub fn global_option_parser(&self) -> clap::Command {
        let mut parser = clap::Command::new(self.prog_name.clone())
            .no_binary_name(true)
            .override_usage(self.usage_line())
            .disable_help_subcommand(true)
            .color(ColorChoice::Never)
            .arg(
                Arg::new(VERBOSE_ID)
                    .short('v')
                    .long("verbose")
                    .action(ArgAction::Count)
                    .help("Increase verbosity (-v, -vv)"),
            )
            .arg(
                Arg::new(QUIET_ID)
                    .short('q')
                    .long("quiet")
                    .action(ArgAction::SetTrue)
                    .help("Only report errors"),
            )
            .args(self.global_options.iter().cloned())
            .arg(
                Arg::new(EXTRA_ID)
                    .num_args(0..)
                    .action(ArgAction::Append)
                    .value_parser(clap::value_parser!(String))
                    .hide(true),
            );
        if let Some(about) = &self.about {
            parser = parser.about(about.clone());
        }
        match &self.version {
            Some(version) => parser.version(version.clone()),
            None => parser.disable_version_flag(true),
        }
    }

    /// Full `tool --help` text. The command index is computed here, at render
    /// time, so it sees the program name of the current invocation.
    fn global_help(&self) -> String {
        let mut parser = self.global_option_parser();
        if let Some(epilog) = self.help_epilog() {
            parser = parser.after_help(epilog);
        }
        parser.render_help().to_string()
    }

    fn help_epilog(&self) -> Option<String> {
        let visible = |c: &dyn Command| self.policy.should_show_command_help(c);
        match help::epilog(&self.prog_name, self.commands.iter(), visible) {
            Ok(mut text) => {
                let aliases = help::alias_listing(&self.config.aliases);
                if !aliases.is_empty() {
                    text.push('\n');
                    text.push_str(&aliases);
                }
                Some(text)
            }
            Err(e) => {
                warn!("help index omitted: {e}");
                None
            }
        }
    }

    /// Parse global args. `Ok(Some(status))` means help or version was printed.
    fn handle_global_args(&mut self, args: &[String]) -> Result<Option<i32>, UsageError> {
        let matches = match self.global_option_parser().try_get_matches_from(args) {
            Ok(m) => m,
            Err(e) if e.kind() == ErrorKind::DisplayHelp => {
                self.output.log(&self.global_help());
                return Ok(Some(0));
            }
            Err(e) if e.kind() == ErrorKind::DisplayVersion => {
                self.output.log(&e.to_string());
                return Ok(Some(0));
            }
            Err(e) => return Err(UsageError::InvalidArguments(clap_error_message(&e))),
        };

        let extra: Vec<String> = matches
            .get_many::<String>(EXTRA_ID)
            .map(|vals| vals.cloned().collect())
            .unwrap_or_default();
        if !extra.is_empty() {
            return Err(UsageError::ExtraGlobalArgs(extra));
        }

        init_logging(derive_level(
            matches.get_count(VERBOSE_ID),
            matches.get_flag(QUIET_ID),
        ));
        self.global_matches = Some(matches);
        Ok(None)
    }

    fn expand_alias(&self, name: &str) -> Result<Option<(String, Vec<String>)>, UsageError> {
        let Some(expansion) = self.config.alias(name) else {
            return Ok(None);
        };
        let (command, leading) = expand_alias(expansion).map_err(|reason| UsageError::InvalidAlias {
            alias: name.to_string(),
            reason,
        })?;
        debug!(alias = name, expansion, "expanding alias");
        Ok(Some((command, leading)))
    }

    /// Command for `help NAME`: a registered command, or the one an alias expands to.
    fn command_for_help(&self, name: &str) -> Result<&dyn Command, UsageError> {
        if let Some(command) = self.command_by_name(name) {
            return Ok(command);
        }
        if let Some((target, _)) = self.expand_alias(name)?
            && let Some(command) = self.command_by_name(&target)
        {
            return Ok(command);
        }
        Err(UsageError::UnknownCommand(name.to_string()))
    }

    fn show_help(&self, topic: Option<&str>) -> Result<i32, UsageError> {
        match topic {
            Some(name) => {
                let command = self.command_for_help(name)?;
                self.output
                    .log(&help::standalone_help(command, &HelpStyle::detect()));
            }
            None => self.output.log(&self.global_help()),
        }
        Ok(0)
    }

    /// Authorize, parse and execute `command`. Also the entry point for commands
    /// that run other commands.
    pub fn run_command(&self, command: &dyn Command, args: &[String]) -> Result<i32, UsageError> {
        if let Authorization::Refused(reason) = self.policy.should_execute_command(command) {
            debug!(command = command.name(), "command refused by policy");
            self.output.log(&reason);
            return Ok(0);
        }

        let (options, positional) = command.parse_args(args)?;
        debug!(command = command.name(), args = ?positional, "executing");
        match command.execute(&options, &positional, self) {
            Ok(status) => Ok(status),
            Err(e) => {
                self.output
                    .error(&format!("{}: {e:#}\n", self.prog_name));
                Ok(1)
            }
        }
    }

    fn dispatch(&mut self, args: &[String]) -> Result<i32, DispatchError> {
        let ArgPartition {
            global_args,
            command_name,
            mut command_args,
        } = Self::split_args(args);

        if let Some(status) = self.handle_global_args(&global_args)? {
            return Ok(status);
        }

        let Some(mut command_name) = command_name else {
            return Err(UsageError::NoCommand.into());
        };

        if command_name != HELP_COMMAND
            && !self.commands.contains(&command_name)
            && let Some((target, mut leading)) = self.expand_alias(&command_name)?
        {
            leading.append(&mut command_args);
            command_args = leading;
            command_name = target;
        }

        if command_name == HELP_COMMAND {
            return Ok(self.show_help(command_args.first().map(String::as_str))?);
        }

        let tool: &Self = self;
        let command = tool
            .command_by_name(&command_name)
            .ok_or_else(|| UsageError::UnknownCommand(command_name.clone()))?;
        tool.run_command(command, &command_args)
            .map_err(DispatchError::command_scope)
    }

    fn report_usage_error(&self, failure: &DispatchError) {
        let prog = &self.prog_name;
        let mut text = String::new();
        if failure.show_usage {
            text.push_str(&format!("Usage: {}\n\n", self.usage_line()));
        }
        text.push_str(&format!("{prog}: error: {}\n", failure.error));
        text.push_str(&format!("\nType \"{prog} --help\" to see usage.\n"));
        self.output.error(&text);
    }

    fn resolve_prog_name(&self, argv0: Option<&String>) -> String {
        if let Some(name) = &self.config.program_name {
            return name.clone();
        }
        argv0
            .and_then(|p| Path::new(p).file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.name.clone())
    }

    /// Run one invocation. `argv[0]` is the program path. Always returns an exit status.
    pub fn main<I, T>(&mut self, argv: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        self.prog_name = self.resolve_prog_name(argv.first());
        self.prog_path = argv.first().map(PathBuf::from);
        self.global_matches = None;
        let args = argv.get(1..).unwrap_or_default();

        match self.dispatch(args) {
            Ok(status) => status,
            Err(failure) => {
                debug!(error = %failure.error, "usage error");
                self.report_usage_error(&failure);
                USAGE_ERROR_STATUS
            }
        }
    }
}

impl std::fmt::Debug for MultiCommandTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MultiCommandTool")
            .field("name", &self.name)
            .field("prog_name", &self.prog_name)
            .field("commands", &self.commands)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::BufferSink;
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;
    use std::rc::Rc;

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        command: String,
        args: Vec<String>,
        message: Option<String>,
        verbose: Option<u8>,
    }

    type Calls = Rc<RefCell<Vec<Call>>>;

    struct Probe {
        name: &'static str,
        help: &'static str,
        with_options: bool,
        precondition: bool,
        result: fn() -> anyhow::Result<i32>,
        calls: Calls,
    }

    impl Command for Probe {
        fn name(&self) -> &str {
            self.name
        }
        fn help_text(&self) -> &str {
            self.help
        }
        fn options(&self) -> Vec<Arg> {
            if !self.with_options {
                return Vec::new();
            }
            vec![
                Arg::new("message")
                    .short('m')
                    .long("message")
                    .value_name("MESSAGE")
                    .help("Message to record"),
            ]
        }
        fn requires_precondition(&self) -> bool {
            self.precondition
        }
        fn execute(
            &self,
            options: &ArgMatches,
            args: &[String],
            tool: &MultiCommandTool,
        ) -> anyhow::Result<i32> {
            self.calls.borrow_mut().push(Call {
                command: self.name.to_string(),
                args: args.to_vec(),
                message: options.try_get_one::<String>("message").ok().flatten().cloned(),
                verbose: tool.global_options().map(|m| m.get_count(VERBOSE_ID)),
            });
            (self.result)()
        }
    }

    /// Runs the command named by its first positional through the live dispatcher.
    struct Relay;

    impl Command for Relay {
        fn name(&self) -> &str {
            "relay"
        }
        fn help_text(&self) -> &str {
            "Run another command"
        }
        fn execute(&self, _: &ArgMatches, args: &[String], tool: &MultiCommandTool) -> anyhow::Result<i32> {
            let Some((target, rest)) = args.split_first() else {
                anyhow::bail!("relay needs a command name");
            };
            let command = tool
                .command_by_name(target)
                .ok_or_else(|| anyhow::anyhow!("no such command: {target}"))?;
            Ok(tool.run_command(command, rest)?)
        }
    }

    struct RefusePrecondition;

    impl ToolPolicy for RefusePrecondition {
        fn should_show_command_help(&self, command: &dyn Command) -> bool {
            !command.name().starts_with("internal")
        }
        fn should_execute_command(&self, command: &dyn Command) -> Authorization {
            if command.requires_precondition() {
                Authorization::Refused("precondition not met".to_string())
            } else {
                Authorization::Allowed
            }
        }
    }

    struct HideAll;

    impl ToolPolicy for HideAll {
        fn should_show_command_help(&self, _: &dyn Command) -> bool {
            false
        }
        fn should_execute_command(&self, _: &dyn Command) -> Authorization {
            Authorization::Allowed
        }
    }

    fn ok0() -> anyhow::Result<i32> {
        Ok(0)
    }
    fn ok3() -> anyhow::Result<i32> {
        Ok(3)
    }
    fn boom() -> anyhow::Result<i32> {
        Err(anyhow::anyhow!("boom"))
    }

    fn probe(name: &'static str, help: &'static str, calls: &Calls) -> Probe {
        Probe {
            name,
            help,
            with_options: false,
            precondition: false,
            result: ok0,
            calls: calls.clone(),
        }
    }

    fn commands(calls: &Calls) -> Vec<Box<dyn Command>> {
        let mut commit = probe("commit", "Record changes", calls);
        commit.with_options = true;
        let mut land = probe("land", "Land local commits", calls);
        land.precondition = true;
        let mut exit3 = probe("exit3", "Exit with status 3", calls);
        exit3.result = ok3;
        let mut fail = probe("fail", "Always fails", calls);
        fail.result = boom;
        vec![
            Box::new(probe("status", "Show status", calls)),
            Box::new(commit),
            Box::new(land),
            Box::new(exit3),
            Box::new(fail),
            Box::new(probe("internal-gc", "Housekeeping", calls)),
            Box::new(Relay),
        ]
    }

    fn tool_with(policy: impl ToolPolicy + 'static) -> (MultiCommandTool, BufferSink, Calls) {
        let calls: Calls = Rc::default();
        let sink = BufferSink::new();
        let tool = MultiCommandTool::new("fallback", commands(&calls), policy)
            .unwrap()
            .with_output(sink.clone());
        (tool, sink, calls)
    }

    fn tool() -> (MultiCommandTool, BufferSink, Calls) {
        tool_with(RefusePrecondition)
    }

    fn argv(args: &[&str]) -> Vec<String> {
        std::iter::once("/usr/local/bin/tool")
            .chain(args.iter().copied())
            .map(String::from)
            .collect()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn usage_error(message: &str) -> String {
        format!(
            "Usage: tool [options] COMMAND [ARGS]\n\ntool: error: {message}\n\nType \"tool --help\" to see usage.\n"
        )
    }

    /* ---- split_args ---- */

    #[test]
    fn split_at_first_bare_token() {
        let args = strings(&["--verbose", "-q", "commit", "-m", "msg", "file"]);
        let p = MultiCommandTool::split_args(&args);
        assert_eq!(p.global_args, strings(&["--verbose", "-q"]));
        assert_eq!(p.command_name.as_deref(), Some("commit"));
        assert_eq!(p.command_args, strings(&["-m", "msg", "file"]));
    }

    #[test]
    fn split_every_prefix_position() {
        let args = strings(&["-a", "-b", "-c", "name", "x", "-y"]);
        for k in 0..3 {
            let mut v = args[..k].to_vec();
            v.extend_from_slice(&args[3..]);
            let p = MultiCommandTool::split_args(&v);
            assert_eq!(p.global_args, v[..k].to_vec());
            assert_eq!(p.command_name.as_deref(), Some("name"));
            assert_eq!(p.command_args, v[k + 1..].to_vec());
        }
    }

    #[test]
    fn split_without_command_keeps_everything_global() {
        let args = strings(&["--help", "-v"]);
        let p = MultiCommandTool::split_args(&args);
        assert_eq!(p.global_args, args);
        assert_eq!(p.command_name, None);
        assert!(p.command_args.is_empty());

        let empty = MultiCommandTool::split_args(&[]);
        assert!(empty.global_args.is_empty());
        assert_eq!(empty.command_name, None);
    }

    /* ---- dispatch scenarios ---- */

    #[test]
    fn global_flag_then_command() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["--verbose", "status"])), 0);
        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].command, "status");
        assert!(calls[0].args.is_empty());
        assert_eq!(calls[0].verbose, Some(1));
        assert!(sink.stderr().is_empty());
    }

    #[test]
    fn command_options_and_args_reach_execute() {
        let (mut tool, _, calls) = tool();
        assert_eq!(tool.main(argv(&["commit", "-m", "wip", "a.rs"])), 0);
        let calls = calls.borrow();
        assert_eq!(calls[0].message.as_deref(), Some("wip"));
        assert_eq!(calls[0].args, strings(&["a.rs"]));
    }

    #[test]
    fn help_without_topic_prints_index() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["help"])), 0);
        let out = sink.stdout();
        assert!(out.contains("Usage: tool [options] COMMAND [ARGS]"));
        assert!(out.contains("tool supports the following commands:"));
        assert!(out.contains("   commit   Record changes\n"));
        assert!(out.contains("See 'tool help COMMAND' for more information"));
        assert!(!out.contains("internal-gc"), "hidden by policy");
        let commit_at = out.find("   commit").unwrap();
        let status_at = out.find("   status").unwrap();
        assert!(commit_at < status_at, "index is sorted by name");
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn help_with_topic_prints_standalone_help() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["help", "commit"])), 0);
        let out = sink.stdout();
        assert!(out.starts_with("commit [options]   Record changes\n"));
        assert!(out.contains("Options:\n"));
        assert!(out.contains("-m, --message <MESSAGE>"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn help_for_unknown_command_is_usage_error() {
        let (mut tool, sink, _) = tool();
        assert_eq!(tool.main(argv(&["help", "bogus"])), USAGE_ERROR_STATUS);
        assert_eq!(sink.stderr(), usage_error("bogus is not a recognized command"));
        assert!(sink.stdout().is_empty());
    }

    #[test]
    fn global_help_flag_without_command() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["--help"])), 0);
        assert!(sink.stdout().contains("tool supports the following commands:"));
        assert!(sink.stdout().contains("--verbose"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn version_flag() {
        let (tool, sink, _) = tool();
        let mut tool = tool.with_version("1.2.3");
        assert_eq!(tool.main(argv(&["--version"])), 0);
        assert!(sink.stdout().contains("1.2.3"));
    }

    #[test]
    fn unknown_command() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["bogus"])), USAGE_ERROR_STATUS);
        assert_eq!(sink.stderr(), usage_error("bogus is not a recognized command"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn no_command() {
        let (mut tool, sink, _) = tool();
        assert_eq!(tool.main(argv(&["-v"])), USAGE_ERROR_STATUS);
        assert_eq!(sink.stderr(), usage_error("No command specified"));
    }

    #[test]
    fn unknown_global_flag() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["--bogus", "status"])), USAGE_ERROR_STATUS);
        let err = sink.stderr();
        assert!(err.starts_with("Usage: tool [options] COMMAND [ARGS]\n\ntool: error: "));
        assert!(err.contains("--bogus"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn stray_global_token_is_reported() {
        let (mut tool, sink, _) = tool();
        assert_eq!(tool.main(argv(&["-", "status"])), USAGE_ERROR_STATUS);
        assert_eq!(sink.stderr(), usage_error("Extra arguments before command: -"));
    }

    #[test]
    fn unknown_command_flag_has_no_usage_line() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["commit", "--bogus"])), USAGE_ERROR_STATUS);
        let err = sink.stderr();
        assert!(err.starts_with("tool: error: "), "got: {err}");
        assert!(err.contains("--bogus"));
        assert!(err.ends_with("\n\nType \"tool --help\" to see usage.\n"));
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn refusal_is_soft() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["land"])), 0);
        assert_eq!(sink.stdout(), "precondition not met\n");
        assert!(sink.stderr().is_empty());
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn refusal_happens_before_argument_parsing() {
        let (mut tool, sink, _) = tool();
        assert_eq!(tool.main(argv(&["land", "--bogus"])), 0);
        assert!(sink.stderr().is_empty());
    }

    #[test]
    fn execute_status_is_returned_verbatim() {
        let (mut tool, _, _) = tool();
        assert_eq!(tool.main(argv(&["exit3"])), 3);
    }

    #[test]
    fn execute_error_maps_to_status_one() {
        let (mut tool, sink, _) = tool();
        assert_eq!(tool.main(argv(&["fail"])), 1);
        assert_eq!(sink.stderr(), "tool: boom\n");
    }

    #[test]
    fn commands_can_run_other_commands() {
        let (mut tool, sink, calls) = tool();
        assert_eq!(tool.main(argv(&["relay", "--", "commit", "-m", "x", "f"])), 0);
        assert_eq!(calls.borrow()[0].command, "commit");
        assert_eq!(calls.borrow()[0].message.as_deref(), Some("x"));

        sink.clear();
        assert_eq!(tool.main(argv(&["relay", "land"])), 0);
        assert_eq!(sink.stdout(), "precondition not met\n");
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn empty_visible_set_still_renders_global_help() {
        let (mut tool, sink, _) = tool_with(HideAll);
        assert_eq!(tool.main(argv(&["help"])), 0);
        let out = sink.stdout();
        assert!(out.contains("Usage: tool [options] COMMAND [ARGS]"));
        assert!(!out.contains("supports the following commands"));
    }

    #[test]
    fn program_name_follows_argv0_or_config() {
        let (mut tool, sink, _) = tool_with(AllowAll);
        tool.main(vec!["./bin/other-name", "bogus"]);
        assert!(sink.stderr().contains("other-name: error: bogus is not a recognized command"));
        assert_eq!(tool.program_name(), "other-name");

        sink.clear();
        let mut tool = tool.with_config(ToolConfig {
            program_name: Some("configured".into()),
            aliases: BTreeMap::new(),
        });
        tool.main(argv(&["bogus"]));
        assert!(sink.stderr().contains("configured: error:"));

        let mut tool = tool.with_config(ToolConfig::default());
        tool.main(Vec::<String>::new());
        assert_eq!(tool.program_name(), "fallback");
    }

    #[test]
    fn custom_global_option_is_available_to_commands() {
        let (tool, _, calls) = tool();
        let mut tool = tool.with_global_option(
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Do nothing"),
        )
        .unwrap();
        assert_eq!(tool.main(argv(&["--dry-run", "status"])), 0);
        assert!(tool.global_options().unwrap().get_flag("dry-run"));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn global_option_clashes_are_rejected() {
        let clash = |option: Arg| tool().0.with_global_option(option).unwrap_err();
        assert_eq!(
            clash(Arg::new("level").short('v').action(ArgAction::SetTrue)),
            RegistryError::GlobalOptionClash("-v".into())
        );
        assert_eq!(
            clash(Arg::new("silent").long("quiet").action(ArgAction::SetTrue)),
            RegistryError::GlobalOptionClash("--quiet".into())
        );
        assert_eq!(
            clash(Arg::new("verbose").long("loud").action(ArgAction::SetTrue)),
            RegistryError::GlobalOptionClash("verbose".into())
        );

        let (tool, _, _) = tool();
        let tool = tool
            .with_global_option(Arg::new("color").long("color").action(ArgAction::SetTrue))
            .unwrap();
        let err = tool
            .with_global_option(Arg::new("colour").long("color").action(ArgAction::SetTrue))
            .unwrap_err();
        assert_eq!(err, RegistryError::GlobalOptionClash("--color".into()));
    }

    /// Counts visibility checks, which only the command index performs.
    struct CountingVisibility(Rc<Cell<usize>>);

    impl ToolPolicy for CountingVisibility {
        fn should_show_command_help(&self, _: &dyn Command) -> bool {
            self.0.set(self.0.get() + 1);
            true
        }
        fn should_execute_command(&self, _: &dyn Command) -> Authorization {
            Authorization::Allowed
        }
    }

    #[test]
    fn command_index_is_built_only_when_help_is_shown() {
        let checks = Rc::new(Cell::new(0));
        let (mut tool, sink, calls) = tool_with(CountingVisibility(checks.clone()));
        assert_eq!(tool.main(argv(&["-v", "status"])), 0);
        assert_eq!(tool.main(argv(&["bogus"])), USAGE_ERROR_STATUS);
        assert_eq!(checks.get(), 0);
        assert_eq!(calls.borrow().len(), 1);

        assert_eq!(tool.main(argv(&["--help"])), 0);
        assert!(checks.get() > 0);
        assert!(sink.stdout().contains("tool supports the following commands:"));

        checks.set(0);
        assert_eq!(tool.main(argv(&["help"])), 0);
        assert!(checks.get() > 0);
    }

    #[test]
    fn program_path_is_argv0() {
        let (mut tool, _, _) = tool();
        assert_eq!(tool.program_path(), None);
        tool.main(argv(&["status"]));
        assert_eq!(tool.program_path(), Some(Path::new("/usr/local/bin/tool")));
        assert_eq!(tool.program_name(), "tool");
    }

    /* ---- aliases ---- */

    fn aliased() -> (MultiCommandTool, BufferSink, Calls) {
        let (tool, sink, calls) = tool();
        let mut aliases = BTreeMap::new();
        aliases.insert("ci".to_string(), "commit -m \"work in progress\"".to_string());
        aliases.insert("status".to_string(), "exit3".to_string());
        aliases.insert("broken".to_string(), "commit \"oops".to_string());
        let tool = tool.with_config(ToolConfig {
            program_name: None,
            aliases,
        });
        (tool, sink, calls)
    }

    #[test]
    fn alias_expands_and_prepends_args() {
        let (mut tool, _, calls) = aliased();
        assert_eq!(tool.main(argv(&["ci", "file.rs"])), 0);
        let calls = calls.borrow();
        assert_eq!(calls[0].command, "commit");
        assert_eq!(calls[0].message.as_deref(), Some("work in progress"));
        assert_eq!(calls[0].args, strings(&["file.rs"]));
    }

    #[test]
    fn alias_never_shadows_a_command() {
        let (mut tool, _, calls) = aliased();
        assert_eq!(tool.main(argv(&["status"])), 0);
        assert_eq!(calls.borrow()[0].command, "status");
    }

    #[test]
    fn broken_alias_is_usage_error() {
        let (mut tool, sink, _) = aliased();
        assert_eq!(tool.main(argv(&["broken"])), USAGE_ERROR_STATUS);
        assert!(sink.stderr().contains("tool: error: alias 'broken' is invalid:"));
    }

    #[test]
    fn help_resolves_aliases_and_lists_them() {
        let (mut tool, sink, _) = aliased();
        assert_eq!(tool.main(argv(&["help", "ci"])), 0);
        assert!(sink.stdout().starts_with("commit [options]   Record changes\n"));

        sink.clear();
        assert_eq!(tool.main(argv(&["help"])), 0);
        assert!(sink.stdout().contains("Aliases:\n"));
        assert!(sink.stdout().contains("ci     = commit -m \"work in progress\""));
    }

    #[test]
    fn duplicate_registration_fails_at_construction() {
        let calls: Calls = Rc::default();
        let cmds: Vec<Box<dyn Command>> = vec![
            Box::new(probe("status", "a", &calls)),
            Box::new(probe("status", "b", &calls)),
        ];
        let err = MultiCommandTool::new("tool", cmds, AllowAll).unwrap_err();
        assert_eq!(err, RegistryError::DuplicateCommand("status".into()));
    }
}
