use std::fmt;

use inquire::{error::InquireResult, ui::RenderConfig, Select, Text};

use crate::{
    catalog::BranchRef,
    changes::LocalChangesDirective,
    plan::NewBranchChoice,
    resolver::RemoteBranchMapping,
};

pub mod ui;

fn render_config() -> RenderConfig<'static> {
    let mut config = RenderConfig::default_colored();
    config.prompt.fg = Some(inquire::ui::Color::LightCyan);
    config
}

pub fn select_branch(branches: &[BranchRef], remote: bool) -> InquireResult<String> {
    let prompt = if remote {
        "Remote branch to check out:"
    } else {
        "Branch to check out:"
    };
    let options = branches
        .iter()
        .map(|branch| branch.name().to_string())
        .collect::<Vec<_>>();

    Select::new(prompt, options)
        .with_render_config(render_config())
        .prompt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BranchOption {
    Create,
    Reset,
    DontCreate,
}

struct Labeled<'a> {
    option: BranchOption,
    mapping: &'a RemoteBranchMapping,
    exists: bool,
}

impl fmt::Display for Labeled<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.option {
            BranchOption::Create => write!(f, "Create local branch with a custom name"),
            BranchOption::Reset if self.exists => {
                write!(f, "Reset local branch '{}'", self.mapping.local_name)
            }
            BranchOption::Reset => {
                write!(f, "Create local branch '{}'", self.mapping.local_name)
            }
            BranchOption::DontCreate => write!(f, "Don't create a local branch (detached HEAD)"),
        }
    }
}

/// Asks how to treat the local side of a remote checkout. `exists` tells
/// whether the local-equivalent branch already exists.
pub fn select_new_branch(
    mapping: &RemoteBranchMapping,
    default: &NewBranchChoice,
    exists: bool,
) -> InquireResult<NewBranchChoice> {
    let options = [BranchOption::Create, BranchOption::Reset, BranchOption::DontCreate]
        .into_iter()
        .map(|option| Labeled {
            option,
            mapping,
            exists,
        })
        .collect::<Vec<_>>();
    let cursor = match default {
        NewBranchChoice::Create(_) => 0,
        NewBranchChoice::ResetExisting => 1,
        NewBranchChoice::DontCreate => 2,
    };

    let selected = Select::new("Local branch:", options)
        .with_starting_cursor(cursor)
        .with_render_config(render_config())
        .prompt()?;

    Ok(match selected.option {
        BranchOption::Create => {
            let initial = match default {
                NewBranchChoice::Create(name) => name.as_str(),
                _ => mapping.proposed_name.as_str(),
            };
            let name = Text::new("Branch name:")
                .with_initial_value(initial)
                .with_render_config(render_config())
                .prompt()?;

            NewBranchChoice::Create(name)
        }
        BranchOption::Reset => NewBranchChoice::ResetExisting,
        BranchOption::DontCreate => NewBranchChoice::DontCreate,
    })
}

pub fn select_local_changes(
    default: LocalChangesDirective,
) -> InquireResult<LocalChangesDirective> {
    let cursor = LocalChangesDirective::ALL
        .iter()
        .position(|directive| *directive == default)
        .unwrap_or_default();

    Select::new("Local changes:", LocalChangesDirective::ALL.to_vec())
        .with_starting_cursor(cursor)
        .with_render_config(render_config())
        .prompt()
}
