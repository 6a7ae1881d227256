//! The operator command surface.

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a group to the watch list.
    WatchGroup { url_name: String },
    /// Remove a group from the watch list, dropping its tracked events.
    UnwatchGroup { url_name: String },
    /// List the watched groups with their details.
    ListGroups,
    /// Run discovery and reconciliation now.
    Refresh,
}

impl Command {
    /// Maps a slash-command name and its argument text to a command.
    ///
    /// Returns `None` for unknown names and for commands missing their
    /// required group argument.
    pub fn parse(name: &str, text: &str) -> Option<Self> {
        let argument = text.trim();

        match name.trim_start_matches('/') {
            "watchgroup" if !argument.is_empty() => Some(Self::WatchGroup { url_name: argument.to_string() }),
            "unwatchgroup" if !argument.is_empty() => Some(Self::UnwatchGroup { url_name: argument.to_string() }),
            "listgroups" => Some(Self::ListGroups),
            "refresh" => Some(Self::Refresh),
            _ => None,
        }
    }
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_commands_parse() {
        assert_eq!(
            Command::parse("/watchgroup", " rust-enthusiasts "),
            Some(Command::WatchGroup { url_name: "rust-enthusiasts".to_string() })
        );
        assert_eq!(
            Command::parse("/unwatchgroup", "rust-enthusiasts"),
            Some(Command::UnwatchGroup { url_name: "rust-enthusiasts".to_string() })
        );
        assert_eq!(Command::parse("/listgroups", ""), Some(Command::ListGroups));
        assert_eq!(Command::parse("/refresh", ""), Some(Command::Refresh));
    }

    #[test]
    fn group_commands_require_an_argument() {
        assert_eq!(Command::parse("/watchgroup", "  "), None);
        assert_eq!(Command::parse("/unwatchgroup", ""), None);
    }

    #[test]
    fn unknown_commands_do_not_parse() {
        assert_eq!(Command::parse("/setup", ""), None);
        assert_eq!(Command::parse("/frobnicate", "xyz"), None);
    }

    #[test]
    fn leading_slash_is_optional() {
        assert_eq!(Command::parse("refresh", ""), Some(Command::Refresh));
    }
}
