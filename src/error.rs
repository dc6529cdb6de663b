//! Error taxonomy for the dispatcher.
//!
//! - `UsageError`   : user-facing misuse, reported as `<prog>: error: ...` with status 1
//! - `RegistryError`: tool-author mistakes caught while building the tool
//! - `HelpError`    : help rendering conditions (nothing to list)
//!
//! Failures returned by a command's `execute` are plain `anyhow::Error`s.

use thiserror::Error;

/// Misuse detected while dispatching. Never propagates past `MultiCommandTool::main`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("No command specified")]
    NoCommand,

    #[error("{0} is not a recognized command")]
    UnknownCommand(String),

    /// Unreachable through `split_args`, kept as a consistency check on the global parse.
    #[error("Extra arguments before command: {}", .0.join(" "))]
    ExtraGlobalArgs(Vec<String>),

    /// Message produced by the option parser (unknown flag, missing value, ...).
    #[error("{0}")]
    InvalidArguments(String),

    #[error("alias '{alias}' is invalid: {reason}")]
    InvalidAlias { alias: String, reason: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("duplicate command name: {0}")]
    DuplicateCommand(String),

    #[error("'{0}' is reserved by the dispatcher and cannot name a command")]
    ReservedName(String),

    #[error("invalid command name '{0}': names must be non-empty and must not start with '-'")]
    InvalidName(String),

    #[error("global option '{0}' is already defined")]
    GlobalOptionClash(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HelpError {
    #[error("no visible commands to list")]
    EmptyRegistry,
}
