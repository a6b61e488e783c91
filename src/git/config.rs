use crate::changes::{LocalChangesDirective, ParseDirectiveError};

use super::Optional;

const CHECK_DIRTY: &str = "branchout.checkDirty";
const LOCAL_CHANGES: &str = "branchout.localChanges";
const ALWAYS_PROMPT: &str = "branchout.alwaysPrompt";
const CREATE_LOCAL: &str = "branchout.createLocal";
const USE_DEFAULT_ACTION: &str = "branchout.useDefaultAction";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("invalid branchout.localChanges: {0}")]
    InvalidLocalChanges(#[from] ParseDirectiveError),
}

/// Checkout preferences, read from the `branchout` section of git config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Scan the working tree for changes before checkout. Slow on large repositories.
    pub check_dirty: bool,
    pub local_changes: LocalChangesDirective,
    pub always_prompt: bool,
    /// Default to creating a local branch when checking out a remote branch.
    pub create_local: bool,
    /// Apply `local_changes` without prompting when the tree is dirty.
    pub use_default_action: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            check_dirty: true,
            local_changes: LocalChangesDirective::DontChange,
            always_prompt: false,
            create_local: false,
            use_default_action: false,
        }
    }
}

impl Settings {
    /// Remembers `directive` as the default in the repository's own config.
    pub fn save_local_changes(
        config: &git2::Config,
        directive: LocalChangesDirective,
    ) -> Result<(), Error> {
        let mut local = config.open_level(git2::ConfigLevel::Local)?;
        local.set_str(LOCAL_CHANGES, directive.as_str())?;

        Ok(())
    }
}

fn bool_or(config: &git2::Config, name: &str, default: bool) -> Result<bool, git2::Error> {
    Ok(config.get_bool(name).optional()?.unwrap_or(default))
}

fn string(config: &git2::Config, name: &str) -> Result<Option<String>, git2::Error> {
    config.get_string(name).optional()
}

impl TryFrom<git2::Config> for Settings {
    type Error = Error;

    fn try_from(config: git2::Config) -> Result<Self, Self::Error> {
        let defaults = Settings::default();

        Ok(Self {
            check_dirty: bool_or(&config, CHECK_DIRTY, defaults.check_dirty)?,
            local_changes: string(&config, LOCAL_CHANGES)?
                .map(|value| value.parse::<LocalChangesDirective>())
                .transpose()?
                .unwrap_or(defaults.local_changes),
            always_prompt: bool_or(&config, ALWAYS_PROMPT, defaults.always_prompt)?,
            create_local: bool_or(&config, CREATE_LOCAL, defaults.create_local)?,
            use_default_action: bool_or(&config, USE_DEFAULT_ACTION, defaults.use_default_action)?,
        })
    }
}
