/*!
`echo.rs`

Prints its positional arguments, joined by spaces.

  multitool echo hello world
  multitool echo --upper --repeat=3 hi
*/

use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches};
use multitool::{Command, MultiCommandTool};

pub struct Echo;

impl Command for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn help_text(&self) -> &str {
        "Print the given words"
    }

    fn argument_names(&self) -> Option<&str> {
        Some("[WORDS...]")
    }

    fn options(&self) -> Vec<Arg> {
        vec![
            Arg::new("upper")
                .short('u')
                .long("upper")
                .action(ArgAction::SetTrue)
                .help("Uppercase the output"),
            Arg::new("repeat")
                .short('n')
                .long("repeat")
                .value_name("N")
                .value_parser(clap::value_parser!(u32).range(1..=100))
                .default_value("1")
                .help("Print the line N times"),
        ]
    }

    fn execute(&self, options: &ArgMatches, args: &[String], tool: &MultiCommandTool) -> Result<i32> {
        let mut line = args.join(" ");
        if options.get_flag("upper") {
            line = line.to_uppercase();
        }
        let repeat = options.get_one::<u32>("repeat").copied().unwrap_or(1);
        for _ in 0..repeat {
            tool.output().log(&line);
        }
        Ok(0)
    }
}
