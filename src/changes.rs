use std::{fmt, str::FromStr};

/// What to do with uncommitted changes when switching branches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocalChangesDirective {
    #[default]
    DontChange,
    Stash,
    Merge,
    Reset,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown local changes action: {0} (expected dont-change, stash, merge or reset)")]
pub struct ParseDirectiveError(String);

impl LocalChangesDirective {
    pub const ALL: [LocalChangesDirective; 4] = [
        LocalChangesDirective::DontChange,
        LocalChangesDirective::Merge,
        LocalChangesDirective::Stash,
        LocalChangesDirective::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocalChangesDirective::DontChange => "dont-change",
            LocalChangesDirective::Stash => "stash",
            LocalChangesDirective::Merge => "merge",
            LocalChangesDirective::Reset => "reset",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            LocalChangesDirective::DontChange => "Don't change",
            LocalChangesDirective::Stash => "Stash",
            LocalChangesDirective::Merge => "Merge",
            LocalChangesDirective::Reset => "Reset (discard changes)",
        }
    }
}

impl fmt::Display for LocalChangesDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

impl FromStr for LocalChangesDirective {
    type Err = ParseDirectiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dont-change" | "dontchange" | "none" => Ok(LocalChangesDirective::DontChange),
            "stash" => Ok(LocalChangesDirective::Stash),
            "merge" => Ok(LocalChangesDirective::Merge),
            "reset" => Ok(LocalChangesDirective::Reset),
            _ => Err(ParseDirectiveError(s.to_string())),
        }
    }
}

/// Whether the local changes choice is presented at all.
///
/// With dirty checking disabled the tree state is unknown, so the choice is
/// always offered. Contains-revision lookups never offer it.
pub fn is_offered(dirty: bool, contains_revision: bool, dirty_check_disabled: bool) -> bool {
    (dirty || dirty_check_disabled) && !contains_revision
}

/// A selection only counts when it was actually offered.
pub fn effective_directive(
    selected: LocalChangesDirective,
    offered: bool,
) -> LocalChangesDirective {
    if offered {
        selected
    } else {
        LocalChangesDirective::DontChange
    }
}
