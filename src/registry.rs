//! The set of commands a tool knows about.
//!
//! Built once at startup from an explicit list, validated, then only read.

use std::collections::HashMap;
use std::fmt;

use crate::command::Command;
use crate::error::RegistryError;

/// Token the dispatcher handles itself; no command may claim it.
pub const HELP_COMMAND: &str = "help";

pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Validate and index `commands`. Registration order is kept for iteration.
    pub fn new(commands: Vec<Box<dyn Command>>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(commands.len());
        for (i, cmd) in commands.iter().enumerate() {
            let name = cmd.name();
            if name.is_empty() || name.starts_with('-') {
                return Err(RegistryError::InvalidName(name.to_string()));
            }
            if name == HELP_COMMAND {
                return Err(RegistryError::ReservedName(name.to_string()));
            }
            if index.insert(name.to_string(), i).is_some() {
                return Err(RegistryError::DuplicateCommand(name.to_string()));
            }
        }
        Ok(Self { commands, index })
    }

    /// Lookup by exact name; `None` when absent.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.index
            .get(name)
            .map(|&i| -> &dyn Command { self.commands[i].as_ref() })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.iter().map(|c| -> &dyn Command { c.as_ref() })
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}
