//! Editor commands

/// A key binding per platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub win: &'static str,
    pub mac: &'static str,
}

/// Commands the plugin registers with the editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    /// Format the selection, or the whole file when nothing is selected
    FormatSelection,
    /// Open the error log
    ShowLogs,
}

impl Command {
    pub const ALL: [Command; 2] = [Command::FormatSelection, Command::ShowLogs];

    /// Name shown in the command palette
    pub fn name(self) -> &'static str {
        match self {
            Self::FormatSelection => "Prettier: Format Selection",
            Self::ShowLogs => "Prettier Logs",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::FormatSelection => "Format the selection/all with Prettier.",
            Self::ShowLogs => "View logs of prettier errors.",
        }
    }

    pub fn key_binding(self) -> Option<KeyBinding> {
        match self {
            Self::FormatSelection => Some(KeyBinding {
                win: "Ctrl-Shift-F",
                mac: "Cmd-Shift-F",
            }),
            Self::ShowLogs => None,
        }
    }

    /// Look a command up by its palette name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.name() == name)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
