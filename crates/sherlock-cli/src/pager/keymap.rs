use sherlock_core::PluginRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move { columns: isize, rows: isize },
    Activate,
    Quit,
    /// Index into the plugin registry.
    Plugin(usize),
}

/// Maps single keys to commands. Built-in keys cannot be rebound.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    plugins: PluginRegistry,
}

impl Keymap {
    pub fn new(plugins: &PluginRegistry) -> Self {
        Self {
            plugins: plugins.clone(),
        }
    }

    pub fn resolve(&self, key: char) -> Option<Command> {
        match key {
            'j' => Some(Command::Move { columns: 0, rows: 1 }),
            'k' => Some(Command::Move { columns: 0, rows: -1 }),
            'h' => Some(Command::Move { columns: -1, rows: 0 }),
            'l' => Some(Command::Move { columns: 1, rows: 0 }),
            'q' => Some(Command::Quit),
            '\n' | '\r' => Some(Command::Activate),
            other => self.plugins.find_by_key(other).map(Command::Plugin),
        }
    }
}
