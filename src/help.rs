/*!
help.rs

Help text for `tool help COMMAND` and the command index shown under `tool --help`.

Public API Summary:
  - HelpStyle::detect() -> HelpStyle            (terminal width from COLUMNS)
  - format_option_help(parser, &HelpStyle)      ("Options:" block, rendered by clap)
  - standalone_help(command, &HelpStyle)        (one command, with its options)
  - epilog(prog, commands, visible)             (sorted command index)
  - alias_listing(aliases)                      (configured aliases, if any)

Nothing here prints; callers hand the strings to the output sink.
*/

use std::collections::BTreeMap;

use crate::command::Command;
use crate::error::HelpError;

#[derive(Debug, Clone, Copy)]
pub struct HelpStyle {
    pub term_width: usize,
}

impl Default for HelpStyle {
    fn default() -> Self {
        Self::detect()
    }
}

impl HelpStyle {
    pub fn detect() -> Self {
        let width = std::env::var("COLUMNS")
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
            .map(|w| w.clamp(40, 220))
            .unwrap_or(80);
        HelpStyle { term_width: width }
    }

    pub fn with_width(term_width: usize) -> Self {
        HelpStyle { term_width }
    }
}

/* ---- Option block ---- */

/// `Options:` block for a command parser, rendered by clap. Empty when the
/// parser has no visible options.
pub fn format_option_help(parser: clap::Command, style: &HelpStyle) -> String {
    let mut parser = parser
        .help_template("{options}")
        .term_width(style.term_width);
    let rendered = parser.render_help().to_string();
    let body = rendered.trim_end();
    if body.trim().is_empty() {
        return String::new();
    }
    format!("Options:\n{body}\n")
}

/* ---- Per-command help ---- */

pub fn standalone_help(command: &dyn Command, style: &HelpStyle) -> String {
    let usage = command.name_with_arguments();
    let mut text = format!("{usage}   {}\n", command.help_text());
    text.push_str(&format_option_help(command.option_parser(), style));
    text
}

/* ---- Command index ---- */

/// Sorted index of the commands for which `visible` holds, framed by a header
/// naming `prog` and a pointer to `prog help COMMAND`.
pub fn epilog<'a, I, F>(prog: &str, commands: I, visible: F) -> Result<String, HelpError>
where
    I: IntoIterator<Item = &'a dyn Command>,
    F: Fn(&dyn Command) -> bool,
{
    let mut shown: Vec<&dyn Command> = commands.into_iter().filter(|c| visible(*c)).collect();
    let Some(longest) = shown.iter().map(|c| c.name().chars().count()).max() else {
        return Err(HelpError::EmptyRegistry);
    };
    shown.sort_by(|a, b| a.name().cmp(b.name()));

    let mut text = format!("{prog} supports the following commands:\n");
    for cmd in shown {
        text.push_str(&format!(
            "   {:<width$}   {}\n",
            cmd.name(),
            cmd.help_text(),
            width = longest
        ));
    }
    text.push('\n');
    text.push_str(&format!(
        "See '{prog} help COMMAND' for more information on a specific command.\n"
    ));
    Ok(text)
}

/// `Aliases:` block for configured aliases; empty when there are none.
pub fn alias_listing(aliases: &BTreeMap<String, String>) -> String {
    let Some(longest) = aliases.keys().map(|k| k.chars().count()).max() else {
        return String::new();
    };
    let mut text = String::from("Aliases:\n");
    for (name, expansion) in aliases {
        text.push_str(&format!("   {name:<longest$} = {expansion}\n"));
    }
    text
}
