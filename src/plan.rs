use std::fmt;

use crate::{
    changes::{self, LocalChangesDirective},
    resolver::RemoteBranchMapping,
};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no branch selected")]
    EmptyTarget,
    #[error("custom branch name is empty, enter a valid branch name or select a predefined one")]
    CustomNameEmpty,
    #[error("\"{0}\" is not a valid branch name, enter a valid branch name or select a predefined one")]
    CustomNameInvalid(String),
}

/// The user's answer to "create a local branch?" for remote checkouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewBranchChoice {
    Create(String),
    ResetExisting,
    DontCreate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewBranchDirective {
    Create(String),
    Reset(String),
    DontCreate,
}

impl NewBranchDirective {
    pub fn name(&self) -> Option<&str> {
        match self {
            NewBranchDirective::Create(name) | NewBranchDirective::Reset(name) => Some(name.as_str()),
            NewBranchDirective::DontCreate => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub target: String,
    pub remote: bool,
    pub new_branch: NewBranchChoice,
    pub local_changes: LocalChangesDirective,
}

impl CheckoutRequest {
    pub fn local(target: impl Into<String>, local_changes: LocalChangesDirective) -> Self {
        Self {
            target: target.into(),
            remote: false,
            new_branch: NewBranchChoice::DontCreate,
            local_changes,
        }
    }

    pub fn remote(
        target: impl Into<String>,
        new_branch: NewBranchChoice,
        local_changes: LocalChangesDirective,
    ) -> Self {
        Self {
            target: target.into(),
            remote: true,
            new_branch,
            local_changes,
        }
    }
}

/// A validated checkout, ready to hand to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutPlan {
    pub target: String,
    pub remote: bool,
    pub new_branch: NewBranchDirective,
    pub local_changes: LocalChangesDirective,
    /// For `Reset`, whether the branch already exists (otherwise it is created).
    pub existing_branch: bool,
}

impl fmt::Display for CheckoutPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.new_branch {
            NewBranchDirective::Create(name) => {
                write!(f, "create '{name}' from '{}'", self.target)?
            }
            NewBranchDirective::Reset(name) if self.existing_branch => {
                write!(f, "reset '{name}' to '{}'", self.target)?
            }
            NewBranchDirective::Reset(name) => {
                write!(f, "create '{name}' from '{}'", self.target)?
            }
            NewBranchDirective::DontCreate if self.remote => {
                write!(f, "detach at '{}'", self.target)?
            }
            NewBranchDirective::DontCreate => write!(f, "switch to '{}'", self.target)?,
        }

        if self.local_changes != LocalChangesDirective::DontChange {
            write!(f, " ({} local changes)", self.local_changes.as_str())?;
        }

        Ok(())
    }
}

/// Validates `request` and turns it into a plan. Checks run in order and the
/// first failure wins. Never touches the repository.
pub fn plan(
    request: &CheckoutRequest,
    mapping: &RemoteBranchMapping,
    offered: bool,
    is_valid_name: impl Fn(&str) -> bool,
    local_branch_exists: impl Fn(&str) -> bool,
) -> Result<CheckoutPlan, PlanError> {
    let target = request.target.trim();

    if target.is_empty() {
        return Err(PlanError::EmptyTarget);
    }

    let (new_branch, existing_branch) = if request.remote {
        match &request.new_branch {
            NewBranchChoice::Create(name) => {
                let name = name.trim();

                if name.is_empty() {
                    return Err(PlanError::CustomNameEmpty);
                }

                if !is_valid_name(name) {
                    return Err(PlanError::CustomNameInvalid(name.to_string()));
                }

                (NewBranchDirective::Create(name.to_string()), false)
            }
            NewBranchChoice::ResetExisting => {
                let name = mapping.local_name.clone();
                let exists = local_branch_exists(&name);

                (NewBranchDirective::Reset(name), exists)
            }
            NewBranchChoice::DontCreate => (NewBranchDirective::DontCreate, false),
        }
    } else {
        (NewBranchDirective::DontCreate, false)
    };

    let plan = CheckoutPlan {
        target: target.to_string(),
        remote: request.remote,
        new_branch,
        local_changes: changes::effective_directive(request.local_changes, offered),
        existing_branch,
    };

    tracing::debug!(%plan, "planned checkout");

    Ok(plan)
}
