/*!
`commands.rs`

Meta command: inspects the live dispatcher.

  multitool commands                 (table of visible commands)
  multitool commands --json          (machine-readable listing)
  multitool commands --run=echo -- -u hi

JSON Output Shape:
{
  "status": "ok",
  "program": "multitool",
  "count": 3,
  "commands": [
    { "name": "echo", "usage": "echo [options] [WORDS...]", "help": "...", "requires_precondition": false }
  ]
}
*/

use anyhow::{Result, anyhow, bail};
use clap::{Arg, ArgAction, ArgMatches};
use multitool::{Command, MultiCommandTool};

pub struct Commands;

impl Command for Commands {
    fn name(&self) -> &str {
        "commands"
    }

    fn help_text(&self) -> &str {
        "List available commands, or run one by name"
    }

    fn argument_names(&self) -> Option<&str> {
        Some("[-- ARGS...]")
    }

    fn options(&self) -> Vec<Arg> {
        vec![
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Output JSON instead of a table"),
            Arg::new("run")
                .long("run")
                .value_name("NAME")
                .help("Run command NAME with the remaining arguments"),
        ]
    }

    fn execute(&self, options: &ArgMatches, args: &[String], tool: &MultiCommandTool) -> Result<i32> {
        if let Some(name) = options.get_one::<String>("run") {
            if name == self.name() {
                bail!("commands cannot run itself");
            }
            let command = tool
                .command_by_name(name)
                .ok_or_else(|| anyhow!("{name} is not a recognized command"))?;
            return Ok(tool.run_command(command, args)?);
        }

        let mut visible: Vec<&dyn Command> = tool
            .commands()
            .iter()
            .filter(|c| tool.should_show_command_help(*c))
            .collect();
        visible.sort_by(|a, b| a.name().cmp(b.name()));

        if options.get_flag("json") {
            let items: Vec<serde_json::Value> = visible
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name(),
                        "usage": c.name_with_arguments(),
                        "help": c.help_text(),
                        "requires_precondition": c.requires_precondition(),
                    })
                })
                .collect();
            let out = serde_json::json!({
                "status": "ok",
                "program": tool.program_name(),
                "count": items.len(),
                "commands": items,
            });
            tool.output().log(&serde_json::to_string_pretty(&out)?);
            return Ok(0);
        }

        let width = visible
            .iter()
            .map(|c| c.name_with_arguments().chars().count())
            .max()
            .unwrap_or(0);
        let mut text = String::new();
        for c in visible {
            text.push_str(&format!(
                "{:<width$}   {}\n",
                c.name_with_arguments(),
                c.help_text()
            ));
        }
        tool.output().log(&text);
        Ok(0)
    }
}
