/*!
`config.rs`

Optional per-tool configuration loaded from a JSON or YAML file.

```yaml
program_name: mytool
aliases:
  st: status
  ci: commit -m "work in progress"
```

Aliases expand git-style: the first token of the expansion is the command, the
rest are prepended to whatever followed the alias on the command line. Quoting
follows shell rules.
*/

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use shell_words::split as shell_split;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Overrides the program name derived from argv[0] in help and error text.
    pub program_name: Option<String>,
    pub aliases: BTreeMap<String, String>,
}

impl ToolConfig {
    /// Load from `path`, choosing the format by extension (`.yaml`/`.yml`, else JSON).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();

        let config: ToolConfig = if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw)
                .with_context(|| format!("failed to parse YAML config: {}", path.display()))?
        } else {
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse JSON config: {}", path.display()))?
        };
        config.validate()?;
        Ok(config)
    }

    /// Load the file named by environment variable `var`. Unset or blank -> `Ok(None)`.
    pub fn from_env(var: &str) -> Result<Option<Self>> {
        match std::env::var(var) {
            Ok(p) if !p.trim().is_empty() => Self::load(p.trim()).map(Some),
            _ => Ok(None),
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, expansion) in &self.aliases {
            if name.trim().is_empty() || name.starts_with('-') {
                bail!("invalid alias name: '{name}'");
            }
            if expansion.trim().is_empty() {
                bail!("alias '{name}' has an empty expansion");
            }
        }
        Ok(())
    }

    pub fn alias(&self, name: &str) -> Option<&str> {
        self.aliases.get(name).map(String::as_str)
    }
}

/// Split an alias expansion into `(command, leading args)`.
pub fn expand_alias(expansion: &str) -> std::result::Result<(String, Vec<String>), String> {
    let mut tokens = shell_split(expansion).map_err(|e| e.to_string())?;
    if tokens.is_empty() {
        return Err("expansion is empty".to_string());
    }
    let command = tokens.remove(0);
    if command.starts_with('-') {
        return Err(format!("expansion must start with a command, found '{command}'"));
    }
    Ok((command, tokens))
}
