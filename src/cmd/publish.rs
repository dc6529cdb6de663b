/*!
`publish.rs`

Stand-in for a command that must not run until the environment is ready. The
demo policy refuses it unless `MULTITOOL_READY` is set.
*/

use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches};
use multitool::{Command, MultiCommandTool};

pub struct Publish;

impl Command for Publish {
    fn name(&self) -> &str {
        "publish"
    }

    fn help_text(&self) -> &str {
        "Publish TARGET (requires MULTITOOL_READY)"
    }

    fn argument_names(&self) -> Option<&str> {
        Some("TARGET")
    }

    fn options(&self) -> Vec<Arg> {
        vec![
            Arg::new("dry-run")
                .long("dry-run")
                .action(ArgAction::SetTrue)
                .help("Report what would be published"),
        ]
    }

    fn requires_precondition(&self) -> bool {
        true
    }

    fn execute(&self, options: &ArgMatches, args: &[String], tool: &MultiCommandTool) -> Result<i32> {
        let [target] = args else {
            bail!("publish takes exactly one TARGET, got {}", args.len());
        };
        if options.get_flag("dry-run") {
            tool.output().log(&format!("would publish {target}"));
        } else {
            tool.output().log(&format!("published {target}"));
        }
        Ok(0)
    }
}
