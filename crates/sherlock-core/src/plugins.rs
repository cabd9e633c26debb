use std::collections::{HashMap, HashSet};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SherlockError};

/// Keys owned by the pager itself.
pub const RESERVED_KEYS: [char; 7] = ['j', 'k', 'h', 'l', 'q', '\n', '\r'];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginSpec {
    pub name: String,
    pub key: char,
    pub command: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Plugin {
    pub name: String,
    pub key: char,
    pub description: String,
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginRegistry {
    plugins: Vec<Plugin>,
}

impl PluginRegistry {
    pub fn from_specs(specs: &[PluginSpec]) -> Result<Self> {
        let mut seen_keys = HashSet::new();
        let mut plugins = Vec::with_capacity(specs.len());
        for spec in specs {
            let name = spec.name.trim();
            if name.is_empty() {
                return Err(SherlockError::Config(
                    "plugin entries need a non-empty name".to_string(),
                ));
            }
            if RESERVED_KEYS.contains(&spec.key) {
                return Err(SherlockError::Config(format!(
                    "plugin `{}` cannot bind reserved key {:?}",
                    name, spec.key
                )));
            }
            if !seen_keys.insert(spec.key) {
                return Err(SherlockError::Config(format!(
                    "plugin `{}` binds key {:?} which is already taken",
                    name, spec.key
                )));
            }
            let argv = shlex::split(&spec.command).ok_or_else(|| {
                SherlockError::Config(format!(
                    "plugin `{}` has an unparsable command {:?}",
                    name, spec.command
                ))
            })?;
            if argv.is_empty() {
                return Err(SherlockError::Config(format!(
                    "plugin `{}` has an empty command",
                    name
                )));
            }
            plugins.push(Plugin {
                name: name.to_string(),
                key: spec.key,
                description: spec.description.clone(),
                argv,
            });
        }
        Ok(Self { plugins })
    }

    pub fn find_by_key(&self, key: char) -> Option<usize> {
        self.plugins.iter().position(|p| p.key == key)
    }

    pub fn get(&self, index: usize) -> Option<&Plugin> {
        self.plugins.get(index)
    }

    pub fn plugins(&self) -> &[Plugin] {
        &self.plugins
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

/// What the user had selected when the plugin key was pressed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PluginContext {
    pub repository: PathBuf,
    pub commit_id: Option<String>,
    pub short_commit_id: Option<String>,
    pub file_path: Option<String>,
}

impl PluginContext {
    pub fn to_placeholder_map(&self) -> HashMap<String, String> {
        let mut out = HashMap::new();
        out.insert(
            "REPO".to_string(),
            self.repository.to_string_lossy().to_string(),
        );
        if let Some(v) = &self.commit_id {
            out.insert("COMMIT".to_string(), v.clone());
        }
        if let Some(v) = &self.short_commit_id {
            out.insert("SHORT_COMMIT".to_string(), v.clone());
        }
        if let Some(v) = &self.file_path {
            out.insert("FILE".to_string(), v.clone());
        }
        out
    }
}

pub fn expand_placeholders(input: &str, placeholders: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars();
    while let Some(ch) = chars.next() {
        if ch != '{' {
            out.push(ch);
            continue;
        }
        let mut key = String::new();
        let mut closed = false;
        for next in chars.by_ref() {
            if next == '}' {
                closed = true;
                break;
            }
            key.push(next);
        }
        if !closed {
            return Err(SherlockError::Parse(format!(
                "unterminated placeholder in token {:?}",
                input
            )));
        }
        let value = placeholders
            .get(&key)
            .ok_or_else(|| SherlockError::MissingPlaceholder(key.clone()))?;
        out.push_str(value);
    }
    Ok(out)
}

#[derive(Debug, Clone, Default)]
pub struct PluginRunner;

impl PluginRunner {
    /// Runs `plugin` to completion and returns its stdout lines.
    pub fn invoke(&self, plugin: &Plugin, context: &PluginContext) -> Result<Vec<String>> {
        let placeholders = context.to_placeholder_map();
        let argv = plugin
            .argv
            .iter()
            .map(|token| expand_placeholders(token, &placeholders))
            .collect::<Result<Vec<_>>>()?;
        let Some((program, args)) = argv.split_first() else {
            return Err(SherlockError::plugin(&plugin.name, "empty command"));
        };
        debug!(plugin = %plugin.name, ?argv, "invoking plugin");

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(&context.repository)
            .env("SHERLOCK_REPO", &context.repository)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(commit) = &context.commit_id {
            cmd.env("SHERLOCK_COMMIT", commit);
        }
        if let Some(file) = &context.file_path {
            cmd.env("SHERLOCK_FILE", file);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| SherlockError::plugin(&plugin.name, format!("failed to start: {e}")))?;
        let payload = serde_json::to_vec(context)
            .map_err(|e| SherlockError::plugin(&plugin.name, format!("encode context: {e}")))?;
        if let Some(mut stdin) = child.stdin.take() {
            // Plugins are free to ignore stdin and exit early.
            match stdin.write_all(&payload) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    return Err(SherlockError::io("writing plugin stdin", e));
                }
                _ => {}
            }
        }
        let output = child
            .wait_with_output()
            .map_err(|source| SherlockError::io("waiting for plugin", source))?;
        if !output.status.success() {
            return Err(SherlockError::plugin(
                &plugin.name,
                format!(
                    "exited with {:?}: {}",
                    output.status.code(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(ToString::to_string)
            .collect())
    }
}
