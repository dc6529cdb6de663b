//! Demo policy: every command is listed; commands that require the precondition
//! only run when `MULTITOOL_READY` is set to a non-empty value.

use multitool::{Authorization, Command, ToolPolicy};

pub const READY_ENV: &str = "MULTITOOL_READY";

#[derive(Debug, Clone, Copy)]
pub struct DemoPolicy {
    pub ready: bool,
}

impl DemoPolicy {
    pub fn from_env() -> Self {
        let ready = std::env::var(READY_ENV)
            .ok()
            .is_some_and(|v| !v.trim().is_empty());
        Self { ready }
    }
}

impl ToolPolicy for DemoPolicy {
    fn should_show_command_help(&self, _command: &dyn Command) -> bool {
        true
    }

    fn should_execute_command(&self, command: &dyn Command) -> Authorization {
        if command.requires_precondition() && !self.ready {
            return Authorization::Refused(format!(
                "{} requires {READY_ENV} to be set; skipping.",
                command.name()
            ));
        }
        Authorization::Allowed
    }
}
