/*!
Commands of the `multitool` demo binary.

One file per command; each exposes a unit struct implementing `multitool::Command`.

  echo.rs      (Echo: print positional args)
  commands.rs  (Commands: list commands, or run one through the dispatcher)
  publish.rs   (Publish: guarded by the readiness precondition)
  policy.rs    (DemoPolicy: MULTITOOL_READY gate)

`all_commands()` is the single place the registry is assembled.
*/

pub mod commands;
pub mod echo;
pub mod policy;
pub mod publish;

pub use commands::Commands;
pub use echo::Echo;
pub use policy::DemoPolicy;
pub use publish::Publish;

use multitool::Command;

pub fn all_commands() -> Vec<Box<dyn Command>> {
    vec![Box::new(Commands), Box::new(Echo), Box::new(Publish)]
}
