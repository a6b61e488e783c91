use crate::{
    catalog::{BranchCatalog, BranchRef, RepoQuery},
    changes::{self, LocalChangesDirective},
    git::{RunError, Settings},
    plan::{self, CheckoutPlan, CheckoutRequest, NewBranchChoice, PlanError},
    resolver::{self, RemoteBranchMapping},
};

/// Runs a finished plan against the working tree.
pub trait Executor {
    fn stash(&mut self) -> Result<(), RunError>;
    fn checkout(&mut self, plan: &CheckoutPlan) -> Result<(), RunError>;
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("repository query failed: {0}")]
    RepositoryQueryFailed(#[from] git2::Error),
    #[error("stash failed: {0}")]
    StashFailed(RunError),
    #[error("checkout failed: {0}")]
    CheckoutFailed(RunError),
}

#[derive(Debug, PartialEq, Eq)]
pub enum QuickOutcome {
    Done(CheckoutPlan),
    NeedsPrompt,
}

/// Branches to choose from, and which side (local or remote) they came from.
#[derive(Debug, PartialEq, Eq)]
pub struct Listing {
    pub remote: bool,
    pub branches: Vec<BranchRef>,
    pub selected: Option<String>,
}

/// One checkout attempt: a branch catalog, the settings it runs under and the
/// working tree state observed when it started.
pub struct Session<B> {
    catalog: BranchCatalog<B>,
    settings: Settings,
    contains: Option<String>,
    dirty: bool,
}

impl<B: RepoQuery> Session<B> {
    pub fn new(backend: B, settings: Settings, contains: Option<String>) -> Result<Self, Error> {
        let dirty = if settings.check_dirty {
            backend.is_dirty()?
        } else {
            false
        };

        tracing::debug!(dirty, check_dirty = settings.check_dirty, "started checkout session");

        Ok(Self {
            catalog: BranchCatalog::new(backend),
            settings,
            contains,
            dirty,
        })
    }

    pub fn backend(&self) -> &B {
        self.catalog.query()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn offers_local_changes(&self) -> bool {
        changes::is_offered(
            self.dirty,
            self.contains.is_some(),
            !self.settings.check_dirty,
        )
    }

    /// Whether a checkout of `target` has to ask the user before running.
    pub fn needs_prompt(&self, target: &str, remote: bool) -> bool {
        self.settings.always_prompt
            || target.trim().is_empty()
            || remote
            || (self.dirty && !self.settings.use_default_action)
    }

    pub fn candidates(&mut self, remote: bool) -> Result<Listing, Error> {
        let Some(revision) = self.contains.clone() else {
            let branches = if remote {
                self.catalog.remote_tracking()?.to_vec()
            } else {
                self.catalog.local()?.to_vec()
            };

            return Ok(Listing {
                remote,
                branches,
                selected: None,
            });
        };

        let mut remote = remote;
        let mut branches = self.catalog.containing(&revision, !remote, remote)?;

        if branches.is_empty() {
            tracing::warn!(
                revision = revision.as_str(),
                remote,
                "no branches contain revision, trying the other side"
            );

            remote = !remote;
            branches = self.catalog.containing(&revision, !remote, remote)?;
        }

        let selected = match branches.as_slice() {
            [only] => Some(only.name().to_string()),
            _ => None,
        };

        Ok(Listing {
            remote,
            branches,
            selected,
        })
    }

    pub fn mapping(&mut self, target: &str, remote: bool) -> Result<RemoteBranchMapping, Error> {
        let target = target.trim();

        if !remote || target.is_empty() {
            return Ok(RemoteBranchMapping::default());
        }

        let remotes = self.catalog.remotes()?.to_vec();
        let locals = self.catalog.local()?;

        Ok(resolver::resolve(target, &remotes, locals))
    }

    pub fn local_branch_exists(&mut self, name: &str) -> Result<bool, Error> {
        Ok(self.catalog.local_branch_exists(name)?)
    }

    pub fn default_new_branch(&self, mapping: &RemoteBranchMapping) -> NewBranchChoice {
        if self.settings.create_local {
            NewBranchChoice::Create(mapping.proposed_name.clone())
        } else {
            NewBranchChoice::ResetExisting
        }
    }

    /// Validates the user's choices into a plan. Nothing is executed.
    pub fn plan(&mut self, request: &CheckoutRequest) -> Result<CheckoutPlan, Error> {
        let mapping = self.mapping(&request.target, request.remote)?;
        let locals = self.catalog.local()?.to_vec();
        let query = self.catalog.query();

        Ok(plan::plan(
            request,
            &mapping,
            self.offers_local_changes(),
            |name| query.is_valid_branch_name(name),
            |name| crate::catalog::contains_ignore_case(&locals, name),
        )?)
    }
}

impl<B: RepoQuery + Executor> Session<B> {
    /// Applies the pre-action (if any) and then the checkout. A failed stash
    /// aborts before checkout; nothing is rolled back.
    pub fn execute(&mut self, plan: &CheckoutPlan) -> Result<(), Error> {
        if plan.local_changes == LocalChangesDirective::Stash && self.catalog.query().is_dirty()? {
            tracing::info!("stashing local changes");
            self.catalog
                .query_mut()
                .stash()
                .map_err(Error::StashFailed)?;
        }

        tracing::info!(%plan, "checking out");
        self.catalog
            .query_mut()
            .checkout(plan)
            .map_err(Error::CheckoutFailed)
    }

    /// Checks out `target` with the session defaults, unless the user has to
    /// be asked first.
    pub fn quick_checkout(&mut self, target: &str, remote: bool) -> Result<QuickOutcome, Error> {
        if self.needs_prompt(target, remote) {
            return Ok(QuickOutcome::NeedsPrompt);
        }

        let request = CheckoutRequest::local(target, self.settings.local_changes);
        let plan = self.plan(&request)?;

        self.execute(&plan)?;

        Ok(QuickOutcome::Done(plan))
    }
}
