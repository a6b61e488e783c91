use std::fmt;

/// Marker `git branch --contains` reports for a detached HEAD.
pub const DETACHED_HEAD: &str = "(no branch)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Head {
    pub name: String,
    pub is_remote: bool,
    pub is_tag: bool,
}

/// Read-only view of a repository, as far as checkout decisions are concerned.
pub trait RepoQuery {
    fn heads(&self, include_remote: bool, include_tags: bool) -> Result<Vec<Head>, git2::Error>;
    fn remotes(&self) -> Result<Vec<String>, git2::Error>;
    fn branches_containing(
        &self,
        revision: &str,
        local: bool,
        remote: bool,
    ) -> Result<Vec<String>, git2::Error>;
    fn is_dirty(&self) -> Result<bool, git2::Error>;
    fn is_valid_branch_name(&self, name: &str) -> bool;
}

impl<T: RepoQuery + ?Sized> RepoQuery for &T {
    fn heads(&self, include_remote: bool, include_tags: bool) -> Result<Vec<Head>, git2::Error> {
        (**self).heads(include_remote, include_tags)
    }

    fn remotes(&self) -> Result<Vec<String>, git2::Error> {
        (**self).remotes()
    }

    fn branches_containing(
        &self,
        revision: &str,
        local: bool,
        remote: bool,
    ) -> Result<Vec<String>, git2::Error> {
        (**self).branches_containing(revision, local, remote)
    }

    fn is_dirty(&self) -> Result<bool, git2::Error> {
        (**self).is_dirty()
    }

    fn is_valid_branch_name(&self, name: &str) -> bool {
        (**self).is_valid_branch_name(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Local,
    Remote,
    /// Tags come back from `RepoQuery::heads` but are never checkout candidates;
    /// every catalog list drops them.
    Tag,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRef {
    name: String,
    kind: RefKind,
}

impl BranchRef {
    pub fn new(name: impl Into<String>, kind: RefKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RefKind {
        self.kind
    }
}

impl From<Head> for BranchRef {
    fn from(head: Head) -> Self {
        let kind = match (head.is_tag, head.is_remote) {
            (true, _) => RefKind::Tag,
            (false, true) => RefKind::Remote,
            (false, false) => RefKind::Local,
        };

        Self::new(head.name, kind)
    }
}

impl fmt::Display for BranchRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Branch lists for a single checkout session.
///
/// Local and remote-tracking lists (and the configured remotes) are fetched on
/// first use and kept for the lifetime of the catalog. Start a new catalog to
/// observe repository changes.
pub struct BranchCatalog<Q> {
    query: Q,
    local: Option<Vec<BranchRef>>,
    remote: Option<Vec<BranchRef>>,
    remotes: Option<Vec<String>>,
}

impl<Q: RepoQuery> BranchCatalog<Q> {
    pub fn new(query: Q) -> Self {
        Self {
            query,
            local: None,
            remote: None,
            remotes: None,
        }
    }

    pub fn query(&self) -> &Q {
        &self.query
    }

    pub fn query_mut(&mut self) -> &mut Q {
        &mut self.query
    }

    pub fn local(&mut self) -> Result<&[BranchRef], git2::Error> {
        if self.local.is_none() {
            let heads = self
                .query
                .heads(false, false)?
                .into_iter()
                .filter(|head| !head.is_remote && !head.is_tag)
                .map(BranchRef::from)
                .collect::<Vec<_>>();

            tracing::debug!(count = heads.len(), "fetched local branches");
            self.local = Some(heads);
        }

        Ok(self.local.as_deref().unwrap_or_default())
    }

    pub fn remote_tracking(&mut self) -> Result<&[BranchRef], git2::Error> {
        if self.remote.is_none() {
            let heads = self
                .query
                .heads(true, true)?
                .into_iter()
                .filter(|head| head.is_remote && !head.is_tag)
                .map(BranchRef::from)
                .collect::<Vec<_>>();

            tracing::debug!(count = heads.len(), "fetched remote-tracking branches");
            self.remote = Some(heads);
        }

        Ok(self.remote.as_deref().unwrap_or_default())
    }

    pub fn remotes(&mut self) -> Result<&[String], git2::Error> {
        if self.remotes.is_none() {
            self.remotes = Some(self.query.remotes()?);
        }

        Ok(self.remotes.as_deref().unwrap_or_default())
    }

    /// Branches containing `revision`. Not memoized.
    pub fn containing(
        &self,
        revision: &str,
        local: bool,
        remote: bool,
    ) -> Result<Vec<BranchRef>, git2::Error> {
        let kind = if local { RefKind::Local } else { RefKind::Remote };
        let branches = self
            .query
            .branches_containing(revision, local, remote)?
            .into_iter()
            .filter(|name| name.as_str() != DETACHED_HEAD && !name.ends_with("/HEAD"))
            .map(|name| BranchRef::new(name, kind))
            .collect::<Vec<_>>();

        tracing::debug!(revision, count = branches.len(), "fetched branches containing revision");

        Ok(branches)
    }

    pub fn local_branch_exists(&mut self, name: &str) -> Result<bool, git2::Error> {
        Ok(contains_ignore_case(self.local()?, name))
    }
}

pub fn contains_ignore_case(branches: &[BranchRef], name: &str) -> bool {
    branches
        .iter()
        .any(|branch| branch.name().eq_ignore_ascii_case(name))
}
