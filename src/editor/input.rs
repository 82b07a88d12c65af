use super::buffer::Direction;

/// A single editing input routed to whichever surface is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditInput {
    Insert(char),
    InsertText(String),
    Newline,
    Backspace,
    Delete,
    Move(Direction),
    Home,
    End,
    WordLeft,
    WordRight,
    /// Engine-only: revert the last edit.
    Undo,
    /// Engine-only: run a toolbar action.
    Toolbar(ToolbarAction),
}

impl EditInput {
    /// Inputs that only move the cursor. Locked surfaces still accept these.
    pub const fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::Move(_) | Self::Home | Self::End | Self::WordLeft | Self::WordRight
        )
    }
}

/// Formatting actions an engine toolbar can offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Strikethrough,
    Code,
    Heading,
    Link,
    Quote,
    UnorderedList,
}

impl ToolbarAction {
    pub const ALL: [Self; 8] = [
        Self::Bold,
        Self::Italic,
        Self::Strikethrough,
        Self::Code,
        Self::Heading,
        Self::Link,
        Self::Quote,
        Self::UnorderedList,
    ];

    /// Parse the action name used in engine manifests and options.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|action| action.name() == name)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
            Self::Heading => "heading",
            Self::Link => "link",
            Self::Quote => "quote",
            Self::UnorderedList => "unordered-list",
        }
    }

    /// Short label for toolbar chrome.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bold => "B",
            Self::Italic => "I",
            Self::Strikethrough => "S",
            Self::Code => "</>",
            Self::Heading => "H",
            Self::Link => "Link",
            Self::Quote => "\"",
            Self::UnorderedList => "List",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolbar_names_round_trip() {
        for action in ToolbarAction::ALL {
            assert_eq!(ToolbarAction::from_name(action.name()), Some(action));
        }
        assert_eq!(ToolbarAction::from_name("fullscreen"), None);
    }
}
