use std::str::Utf8Error;

use super::Optional;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("git error: {0}")]
    Git(#[from] git2::Error),
    #[error("invalid name: {0}")]
    Utf8(#[from] Utf8Error),
}

pub struct Tree<'a>(pub git2::Tree<'a>);

impl<'a> From<git2::Tree<'a>> for Tree<'a> {
    fn from(tree: git2::Tree<'a>) -> Self {
        Self(tree)
    }
}

pub struct Branch<'a>(pub git2::Branch<'a>);

impl<'a> From<git2::Branch<'a>> for Branch<'a> {
    fn from(branch: git2::Branch<'a>) -> Self {
        Self(branch)
    }
}

impl<'a> Branch<'a> {
    pub fn name(&self) -> Result<&str, Error> {
        Ok(std::str::from_utf8(self.0.name_bytes()?)?)
    }

    pub fn is_head(&self) -> bool {
        self.0.is_head()
    }

    pub fn upstream_name(&self) -> Result<Option<String>, git2::Error> {
        match self.0.upstream().optional()? {
            Some(upstream) => Ok(Some(String::from_utf8_lossy(upstream.name_bytes()?).into_owned())),
            None => Ok(None),
        }
    }

    pub fn set_upstream(&mut self, name: Option<&str>) -> Result<(), git2::Error> {
        if name.is_none() && self.upstream_name()?.is_none() {
            return Ok(());
        }

        self.0.set_upstream(name)
    }

    pub fn delete(&mut self) -> Result<(), git2::Error> {
        self.0.delete()
    }

    pub fn target(&self) -> Result<git2::Oid, git2::Error> {
        self.0.get().target().ok_or_else(|| {
            git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "missing target",
            )
        })
    }

    pub fn into_ref(self) -> Ref<'a> {
        Ref(self.0.into_reference())
    }
}

pub struct Commit<'a>(pub git2::Commit<'a>);

impl<'a> From<git2::Commit<'a>> for Commit<'a> {
    fn from(commit: git2::Commit<'a>) -> Self {
        Self(commit)
    }
}

impl<'a> Commit<'a> {
    pub fn id(&self) -> git2::Oid {
        self.0.id()
    }

    pub fn find_tree(&self) -> Result<Tree<'a>, git2::Error> {
        self.0.tree().map(Into::into)
    }

    pub fn message(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.0.message_bytes())
    }

    pub fn summary(&self) -> String {
        self.message()
            .ok()
            .and_then(|msg| msg.lines().next())
            .unwrap_or_default()
            .to_string()
    }

    pub fn parent_n(&self, n: usize) -> Result<Option<Commit<'a>>, git2::Error> {
        if n == 0 {
            return Ok(Some(Commit(self.0.clone())));
        }

        if self.0.parent_count() == 0 {
            return Ok(None);
        }

        Commit::from(self.0.parent(0)?).parent_n(n - 1)
    }
}

pub struct Ref<'a>(pub git2::Reference<'a>);

impl<'a> From<git2::Reference<'a>> for Ref<'a> {
    fn from(reference: git2::Reference<'a>) -> Self {
        Self(reference)
    }
}

impl<'a> Ref<'a> {
    pub fn shorthand(&self) -> Result<&str, Error> {
        Ok(std::str::from_utf8(self.0.shorthand_bytes())?)
    }

    pub fn find_commit(&self) -> Result<Commit<'a>, git2::Error> {
        self.0.peel_to_commit().map(Into::into)
    }

    pub fn target(&self) -> Result<git2::Oid, git2::Error> {
        self.0.target().ok_or_else(|| {
            git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "missing target",
            )
        })
    }

    pub fn is_symbolic(&self) -> bool {
        self.0.kind() == Some(git2::ReferenceType::Symbolic)
    }

    pub fn is_branch(&self) -> bool {
        self.0.is_branch()
    }

    pub fn is_remote(&self) -> bool {
        self.0.is_remote()
    }

    pub fn is_tag(&self) -> bool {
        self.0.is_tag()
    }
}
