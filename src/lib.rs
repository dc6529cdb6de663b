//! Multitool - a framework for git-like tools:
//!
//! ```text
//! tool [global options] command [command options]
//! ```
//!
//! Implement [`Command`] for each subcommand, pick a [`ToolPolicy`], hand both to
//! [`MultiCommandTool`] and call [`MultiCommandTool::main`] with the process argv.
//! The dispatcher splits global from command arguments, resolves the command,
//! renders help (`tool help`, `tool help COMMAND`, `tool --help`) and reports
//! usage errors, returning an exit status in every case.
//!
//! ```no_run
//! use clap::ArgMatches;
//! use multitool::{AllowAll, Command, MultiCommandTool};
//!
//! struct Hello;
//!
//! impl Command for Hello {
//!     fn name(&self) -> &str {
//!         "hello"
//!     }
//!     fn help_text(&self) -> &str {
//!         "Say hello"
//!     }
//!     fn execute(&self, _: &ArgMatches, _: &[String], tool: &MultiCommandTool) -> anyhow::Result<i32> {
//!         tool.output().log("hello");
//!         Ok(0)
//!     }
//! }
//!
//! let mut tool = MultiCommandTool::new("hello-tool", vec![Box::new(Hello)], AllowAll).unwrap();
//! std::process::exit(tool.main(std::env::args()));
//! ```

pub mod command;
pub mod config;
pub mod error;
pub mod help;
pub mod registry;
pub mod tool;
pub mod utils;

pub use command::Command;
pub use config::ToolConfig;
pub use error::{HelpError, RegistryError, UsageError};
pub use registry::CommandRegistry;
pub use tool::{AllowAll, ArgPartition, Authorization, MultiCommandTool, ToolPolicy};
pub use utils::{BufferSink, OutputSink, StdioSink};
