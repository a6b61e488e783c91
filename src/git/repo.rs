use std::{path::Path, process::Command};

use git2::{build::CheckoutBuilder, BranchType, ErrorClass, StashFlags, StatusOptions};
use which::which;

use crate::{
    catalog::{Head, RepoQuery, DETACHED_HEAD},
    changes::LocalChangesDirective,
    plan::{CheckoutPlan, NewBranchDirective},
    session::Executor,
};

use super::{
    objects::{Branch, Commit, Ref, Tree},
    resolve::Pattern,
    status::Status,
    Optional,
};

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("checkout results in conflict: {0}")]
    Conflict(git2::Error),
    #[error("git error: {0}")]
    Git(git2::Error),
    #[error("branch '{0}' already exists")]
    BranchExists(String),
    #[error("git executable not found")]
    GitNotFound,
    #[error("failed to run git: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Process(String),
}

impl From<git2::Error> for RunError {
    fn from(e: git2::Error) -> Self {
        match e.code() {
            git2::ErrorCode::Conflict if e.class() == ErrorClass::Checkout => Self::Conflict(e),
            _ => Self::Git(e),
        }
    }
}

/// Arguments for `git checkout --merge` carrying out `plan`.
fn merge_args(plan: &CheckoutPlan) -> Vec<String> {
    let mut args = vec!["checkout".to_string(), "--merge".to_string()];

    if plan.remote {
        match &plan.new_branch {
            NewBranchDirective::Create(name) => args.extend(["-b".to_string(), name.clone()]),
            NewBranchDirective::Reset(name) => args.extend(["-B".to_string(), name.clone()]),
            NewBranchDirective::DontCreate => args.push("--detach".to_string()),
        }
    }

    args.push(plan.target.clone());
    args.push("--".to_string());
    args
}

/// A local branch as it was before a checkout touched it.
struct Previous {
    target: git2::Oid,
    upstream: Option<String>,
}

pub struct Repo {
    repo: git2::Repository,
}

impl From<git2::Repository> for Repo {
    fn from(repo: git2::Repository) -> Self {
        Self { repo }
    }
}

impl Repo {
    pub fn open(path: &Path) -> Result<Self, git2::Error> {
        git2::Repository::discover(path).map(Into::into)
    }

    pub fn config(&self) -> Result<git2::Config, git2::Error> {
        self.repo.config()
    }

    pub fn head(&self) -> Result<Ref<'_>, git2::Error> {
        self.repo.head().map(Into::into)
    }

    pub fn find_commit(&self, oid: git2::Oid) -> Result<Commit<'_>, git2::Error> {
        self.repo.find_commit(oid).map(Into::into)
    }

    pub fn find_ref(&self, name: &str) -> Result<Ref<'_>, git2::Error> {
        self.repo.find_reference(name).map(Into::into)
    }

    pub fn find_branch(&self, name: &str) -> Result<Branch<'_>, git2::Error> {
        self.repo
            .find_branch(name, BranchType::Local)
            .map(Into::into)
    }

    pub fn find_remote_branch(&self, name: &str) -> Result<Branch<'_>, git2::Error> {
        self.repo
            .find_branch(name, BranchType::Remote)
            .map(Into::into)
    }

    pub fn create_branch(
        &self,
        name: &str,
        Commit(commit): &Commit,
        force: bool,
    ) -> Result<Branch<'_>, git2::Error> {
        self.repo.branch(name, commit, force).map(Into::into)
    }

    pub fn resolve_revision(&self, revision: &str) -> Result<git2::Oid, git2::Error> {
        if let Ok(("", pattern)) = Pattern::parse(revision) {
            if let Some(oid) = pattern.resolve(self)? {
                return Ok(oid);
            }
        }

        Ok(self.repo.revparse_single(revision)?.peel_to_commit()?.id())
    }

    pub fn status(&self) -> Result<Status<'_>, git2::Error> {
        Ok(Status(
            self.repo.statuses(Some(
                StatusOptions::new()
                    .include_ignored(false)
                    .include_untracked(true)
                    .recurse_untracked_dirs(true)
                    .exclude_submodules(true),
            ))?,
        ))
    }

    pub fn checkout_tree(&self, Tree(tree): &Tree<'_>, force: bool) -> Result<(), git2::Error> {
        let mut cb = CheckoutBuilder::default();

        if force {
            cb.force();
        } else {
            cb.safe();
        }

        self.repo.checkout_tree(tree.as_object(), Some(&mut cb))
    }

    pub fn save_stash(&mut self, message: &str) -> Result<git2::Oid, git2::Error> {
        let signature = self.repo.signature()?;

        self.repo
            .stash_save(&signature, message, Some(StashFlags::INCLUDE_UNTRACKED))
    }

    fn contains(&self, tip: git2::Oid, oid: git2::Oid) -> Result<bool, git2::Error> {
        Ok(tip == oid || self.repo.graph_descendant_of(tip, oid)?)
    }

    /// Points `name` at the remote branch `target` and checks it out. The
    /// branch is restored when a later step fails.
    fn switch_branch(&self, name: &str, target: &str, force: bool) -> Result<(), RunError> {
        let oid = self.find_remote_branch(target)?.target()?;
        let commit = self.find_commit(oid)?;
        let (is_head, previous) = match self.find_branch(name).optional()? {
            Some(branch) => (
                branch.is_head(),
                Some(Previous {
                    target: branch.target()?,
                    upstream: branch.upstream_name()?,
                }),
            ),
            None => (false, None),
        };

        let result = self.move_branch(name, target, &commit, is_head, force);

        if let Err(e) = &result {
            tracing::warn!(branch = name, error = %e, "checkout failed, restoring branch");

            if let Err(e) = self.restore_branch(name, is_head, previous.as_ref()) {
                tracing::error!(branch = name, error = %e, "failed to restore branch");
            }
        }

        result
    }

    fn move_branch(
        &self,
        name: &str,
        target: &str,
        commit: &Commit<'_>,
        is_head: bool,
        force: bool,
    ) -> Result<(), RunError> {
        // HEAD's branch moves last, safe checkout compares against its old tip.
        if is_head {
            self.find_branch(name)?.set_upstream(Some(target))?;
            self.checkout_tree(&commit.find_tree()?, force)?;

            let mut reference = self.find_branch(name)?.into_ref();
            reference
                .0
                .set_target(commit.id(), &format!("branchout: reset to {target}"))?;

            return Ok(());
        }

        self.create_branch(name, commit, true)?
            .set_upstream(Some(target))?;
        self.checkout_tree(&commit.find_tree()?, force)?;
        self.repo.set_head(&format!("refs/heads/{name}"))?;

        Ok(())
    }

    fn restore_branch(
        &self,
        name: &str,
        is_head: bool,
        previous: Option<&Previous>,
    ) -> Result<(), git2::Error> {
        match previous {
            Some(previous) if is_head => self
                .find_branch(name)?
                .set_upstream(previous.upstream.as_deref()),
            Some(previous) => self
                .create_branch(name, &self.find_commit(previous.target)?, true)?
                .set_upstream(previous.upstream.as_deref()),
            None => match self.find_branch(name).optional()? {
                Some(mut branch) => branch.delete(),
                None => Ok(()),
            },
        }
    }

    fn checkout_with_git(&self, plan: &CheckoutPlan) -> Result<(), RunError> {
        let git = which("git").map_err(|_| RunError::GitNotFound)?;
        let dir = self.repo.workdir().unwrap_or_else(|| self.repo.path());
        let output = Command::new(git)
            .current_dir(dir)
            .args(merge_args(plan))
            .output()?;

        if !output.status.success() {
            return Err(RunError::Process(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(())
    }
}

impl RepoQuery for Repo {
    fn heads(&self, include_remote: bool, include_tags: bool) -> Result<Vec<Head>, git2::Error> {
        let mut heads = vec![];

        for reference in self.repo.references()? {
            let reference = Ref::from(reference?);

            if reference.is_symbolic() {
                continue;
            }

            let (is_remote, is_tag) = (reference.is_remote(), reference.is_tag());

            if (is_remote && !include_remote)
                || (is_tag && !include_tags)
                || !(reference.is_branch() || is_remote || is_tag)
            {
                continue;
            }

            let name = reference
                .shorthand()
                .map_err(|e| git2::Error::from_str(&e.to_string()))?;

            heads.push(Head {
                name: name.to_string(),
                is_remote,
                is_tag,
            });
        }

        Ok(heads)
    }

    fn remotes(&self) -> Result<Vec<String>, git2::Error> {
        Ok(self
            .repo
            .remotes()?
            .iter()
            .flatten()
            .map(str::to_string)
            .collect())
    }

    fn branches_containing(
        &self,
        revision: &str,
        local: bool,
        remote: bool,
    ) -> Result<Vec<String>, git2::Error> {
        let oid = self.resolve_revision(revision)?;
        let mut names = vec![];

        if local && self.repo.head_detached()? && self.contains(self.head()?.target()?, oid)? {
            names.push(DETACHED_HEAD.to_string());
        }

        let types = [(local, BranchType::Local), (remote, BranchType::Remote)];

        for (_, ty) in types.into_iter().filter(|(wanted, _)| *wanted) {
            for branch in self.repo.branches(Some(ty))? {
                let branch = Branch::from(branch?.0);
                let Some(tip) = branch.0.get().target() else {
                    continue;
                };

                if self.contains(tip, oid)? {
                    let name = branch
                        .name()
                        .map_err(|e| git2::Error::from_str(&e.to_string()))?;
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    fn is_dirty(&self) -> Result<bool, git2::Error> {
        Ok(self.status()?.is_dirty())
    }

    fn is_valid_branch_name(&self, name: &str) -> bool {
        git2::Branch::name_is_valid(name).unwrap_or(false)
    }
}

impl Executor for Repo {
    fn stash(&mut self) -> Result<(), RunError> {
        let message = {
            let head = self.head()?;
            let commit = head.find_commit()?;

            format!("branchout: {} {}", commit.id(), commit.summary())
        };

        self.save_stash(&message)?;

        Ok(())
    }

    fn checkout(&mut self, plan: &CheckoutPlan) -> Result<(), RunError> {
        if plan.local_changes == LocalChangesDirective::Merge {
            return self.checkout_with_git(plan);
        }

        let force = plan.local_changes == LocalChangesDirective::Reset;

        if !plan.remote {
            let reference = self.find_branch(&plan.target)?.into_ref();
            let commit = reference.find_commit()?;

            self.checkout_tree(&commit.find_tree()?, force)?;
            self.repo.set_head_bytes(reference.0.name_bytes())?;

            return Ok(());
        }

        if let NewBranchDirective::Create(name) = &plan.new_branch {
            if self.find_branch(name).optional()?.is_some() {
                return Err(RunError::BranchExists(name.clone()));
            }
        }

        match plan.new_branch.name() {
            Some(name) => self.switch_branch(name, &plan.target, force),
            None => {
                let oid = self.find_remote_branch(&plan.target)?.target()?;

                self.checkout_tree(&self.find_commit(oid)?.find_tree()?, force)?;
                self.repo.set_head_detached(oid)?;

                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn commit(repo: &git2::Repository, file: &str, content: &str) -> git2::Oid {
        let workdir = repo.workdir().unwrap();
        fs::write(workdir.join(file), content).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(file)).unwrap();
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let signature = repo.signature().unwrap();
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents = parent.iter().collect::<Vec<_>>();

        repo.commit(Some("HEAD"), &signature, &signature, content, &tree, &parents)
            .unwrap()
    }

    /// `main` with two commits, `old` at the first one, and `origin/dev` at the
    /// second one.
    fn fixture() -> (TempDir, Repo, git2::Oid, git2::Oid) {
        let dir = tempfile::tempdir().unwrap();
        let repo = git2::Repository::init_opts(
            dir.path(),
            git2::RepositoryInitOptions::new().initial_head("main"),
        )
        .unwrap();

        {
            let mut config = repo.config().unwrap().open_level(git2::ConfigLevel::Local).unwrap();
            config.set_str("user.name", "Test").unwrap();
            config.set_str("user.email", "test@example.com").unwrap();
        }

        let first = commit(&repo, "a.txt", "one");
        repo.branch("old", &repo.find_commit(first).unwrap(), false)
            .unwrap();
        let second = commit(&repo, "a.txt", "two");

        repo.remote("origin", "https://example.com/repo.git").unwrap();
        repo.reference("refs/remotes/origin/dev", second, true, "test")
            .unwrap();
        repo.reference("refs/tags/v1", first, true, "test").unwrap();

        (dir, Repo::from(repo), first, second)
    }

    fn plan(target: &str, remote: bool, new_branch: NewBranchDirective) -> CheckoutPlan {
        CheckoutPlan {
            target: target.to_string(),
            remote,
            new_branch,
            local_changes: LocalChangesDirective::DontChange,
            existing_branch: false,
        }
    }

    fn head_name(repo: &Repo) -> String {
        repo.head().unwrap().shorthand().unwrap().to_string()
    }

    #[test]
    fn test_heads() {
        let (_dir, repo, _, _) = fixture();

        let mut local = repo
            .heads(false, false)
            .unwrap()
            .into_iter()
            .map(|h| h.name)
            .collect::<Vec<_>>();
        local.sort();
        assert_eq!(local, vec!["main", "old"]);

        let all = repo.heads(true, true).unwrap();
        assert!(all.iter().any(|h| h.name == "origin/dev" && h.is_remote));
        assert!(all.iter().any(|h| h.name == "v1" && h.is_tag));
    }

    #[test]
    fn test_remotes() {
        let (_dir, repo, _, _) = fixture();

        assert_eq!(repo.remotes().unwrap(), vec!["origin"]);
    }

    #[test]
    fn test_branches_containing() {
        let (_dir, repo, first, second) = fixture();

        let mut names = repo
            .branches_containing(&first.to_string(), true, false)
            .unwrap();
        names.sort();
        assert_eq!(names, vec!["main", "old"]);

        let names = repo.branches_containing("main", true, false).unwrap();
        assert_eq!(names, vec!["main"]);

        let names = repo
            .branches_containing(&second.to_string(), false, true)
            .unwrap();
        assert_eq!(names, vec!["origin/dev"]);

        let mut names = repo.branches_containing("main~1", true, true).unwrap();
        names.sort();
        assert_eq!(names, vec!["main", "old", "origin/dev"]);

        assert!(repo.branches_containing("nope", true, true).is_err());
    }

    #[test]
    fn test_branches_containing_detached() {
        let (_dir, repo, first, _) = fixture();
        repo.repo.set_head_detached(first).unwrap();

        let names = repo.branches_containing("v1", true, false).unwrap();
        assert!(names.contains(&DETACHED_HEAD.to_string()));
    }

    #[test]
    fn test_is_dirty() {
        let (dir, repo, _, _) = fixture();
        assert!(!repo.is_dirty().unwrap());

        fs::write(dir.path().join("a.txt"), "changed").unwrap();
        assert!(repo.is_dirty().unwrap());
    }

    #[test]
    fn test_is_valid_branch_name() {
        let (_dir, repo, _, _) = fixture();

        assert!(repo.is_valid_branch_name("feature/x"));
        assert!(!repo.is_valid_branch_name("bad..name"));
        assert!(!repo.is_valid_branch_name("with space"));
    }

    #[test]
    fn test_checkout_local() {
        let (dir, mut repo, _, _) = fixture();

        repo.checkout(&plan("old", false, NewBranchDirective::DontCreate))
            .unwrap();

        assert_eq!(head_name(&repo), "old");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one");
    }

    #[test]
    fn test_checkout_remote_create() {
        let (_dir, mut repo, _, second) = fixture();

        repo.checkout(&plan(
            "origin/dev",
            true,
            NewBranchDirective::Create("dev".to_string()),
        ))
        .unwrap();

        assert_eq!(head_name(&repo), "dev");
        {
            let branch = repo.find_branch("dev").unwrap();
            assert_eq!(branch.target().unwrap(), second);
            assert_eq!(branch.upstream_name().unwrap().as_deref(), Some("origin/dev"));
        }

        let err = repo
            .checkout(&plan(
                "origin/dev",
                true,
                NewBranchDirective::Create("dev".to_string()),
            ))
            .unwrap_err();
        assert!(matches!(err, RunError::BranchExists(name) if name == "dev"));
    }

    #[test]
    fn test_checkout_remote_reset_current() {
        let (dir, mut repo, _, second) = fixture();

        repo.checkout(&plan("old", false, NewBranchDirective::DontCreate))
            .unwrap();
        repo.checkout(&plan(
            "origin/dev",
            true,
            NewBranchDirective::Reset("old".to_string()),
        ))
        .unwrap();

        assert_eq!(head_name(&repo), "old");
        assert_eq!(repo.find_branch("old").unwrap().target().unwrap(), second);
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "two");
    }

    #[test]
    fn test_checkout_remote_detached() {
        let (_dir, mut repo, _, second) = fixture();

        repo.checkout(&plan("origin/dev", true, NewBranchDirective::DontCreate))
            .unwrap();

        assert!(repo.repo.head_detached().unwrap());
        assert_eq!(repo.head().unwrap().target().unwrap(), second);
    }

    #[test]
    fn test_checkout_conflict() {
        let (dir, mut repo, _, _) = fixture();
        fs::write(dir.path().join("a.txt"), "local edit").unwrap();

        let err = repo
            .checkout(&plan("old", false, NewBranchDirective::DontCreate))
            .unwrap_err();

        assert!(matches!(err, RunError::Conflict(_)));
        assert_eq!(head_name(&repo), "main");
    }

    #[test]
    fn test_checkout_reset_discards() {
        let (dir, mut repo, _, _) = fixture();
        fs::write(dir.path().join("a.txt"), "local edit").unwrap();

        let mut plan = plan("old", false, NewBranchDirective::DontCreate);
        plan.local_changes = LocalChangesDirective::Reset;
        repo.checkout(&plan).unwrap();

        assert_eq!(head_name(&repo), "old");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one");
    }

    #[test]
    fn test_stash() {
        let (dir, mut repo, _, _) = fixture();
        fs::write(dir.path().join("a.txt"), "local edit").unwrap();

        repo.stash().unwrap();

        assert!(!repo.is_dirty().unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "two");
    }

    #[test]
    fn test_checkout_unknown_remote_restores_branches() {
        let (dir, mut repo, first, second) = fixture();
        repo.repo
            .reference("refs/remotes/ghost/dev", first, true, "test")
            .unwrap();

        let err = repo
            .checkout(&plan(
                "ghost/dev",
                true,
                NewBranchDirective::Create("dev".to_string()),
            ))
            .unwrap_err();
        assert!(matches!(err, RunError::Git(_)));

        assert_eq!(head_name(&repo), "main");
        assert!(repo.find_branch("dev").optional().unwrap().is_none());
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "two");
        assert!(!repo.is_dirty().unwrap());

        repo.repo
            .reference("refs/remotes/ghost/old", second, true, "test")
            .unwrap();
        assert!(repo
            .checkout(&plan(
                "ghost/old",
                true,
                NewBranchDirective::Reset("old".to_string()),
            ))
            .is_err());

        assert_eq!(head_name(&repo), "main");
        assert_eq!(repo.find_branch("old").unwrap().target().unwrap(), first);
        assert!(!repo.is_dirty().unwrap());
    }

    #[test]
    fn test_checkout_merge_keeps_local_changes() {
        if which("git").is_err() {
            return;
        }

        let (dir, mut repo, _, _) = fixture();
        let base = commit(&repo.repo, "b.txt", "base");
        repo.repo
            .branch("feature", &repo.repo.find_commit(base).unwrap(), false)
            .unwrap();
        commit(&repo.repo, "a.txt", "three");
        fs::write(dir.path().join("b.txt"), "edited").unwrap();

        let mut plan = plan("feature", false, NewBranchDirective::DontCreate);
        plan.local_changes = LocalChangesDirective::Merge;
        repo.checkout(&plan).unwrap();

        assert_eq!(head_name(&repo), "feature");
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "two");
        assert_eq!(fs::read_to_string(dir.path().join("b.txt")).unwrap(), "edited");
    }

    #[test]
    fn test_merge_args() {
        let mut plan = plan(
            "origin/dev",
            true,
            NewBranchDirective::Reset("dev".to_string()),
        );
        plan.local_changes = LocalChangesDirective::Merge;

        assert_eq!(
            merge_args(&plan),
            vec!["checkout", "--merge", "-B", "dev", "origin/dev", "--"]
        );

        plan.new_branch = NewBranchDirective::Create("dev".to_string());
        assert_eq!(
            merge_args(&plan),
            vec!["checkout", "--merge", "-b", "dev", "origin/dev", "--"]
        );

        plan.new_branch = NewBranchDirective::DontCreate;
        assert_eq!(
            merge_args(&plan),
            vec!["checkout", "--merge", "--detach", "origin/dev", "--"]
        );

        plan.remote = false;
        plan.target = "main".to_string();
        assert_eq!(merge_args(&plan), vec!["checkout", "--merge", "main", "--"]);
    }
}
