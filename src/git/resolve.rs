use nom::{
    branch::alt,
    bytes::complete::{tag, take_till1},
    character::complete::u32,
    IResult, Parser,
};

use super::{Optional, Repo};

/// The revision shapes accepted by `--contains` without going through
/// `revparse`.
#[derive(Debug, PartialEq)]
pub enum Pattern<'a> {
    Head,
    Name(&'a str),
    Parent((usize, Box<Pattern<'a>>)),
}

fn prefix(pattern: &str) -> IResult<&str, Pattern<'_>> {
    let (input, name) = alt((
        tag("HEAD"),
        tag("@"),
        take_till1(|c| c == '@' || c == '^' || c == '~' || c == ':'),
    ))
    .parse(pattern)?;

    match name {
        "@" | "HEAD" => Ok((input, Pattern::Head)),
        _ => Ok((input, Pattern::Name(name))),
    }
}

fn parent(pattern: &str) -> IResult<&str, Pattern<'_>> {
    let (input, (prefix, _, n)) = (prefix, tag("~"), u32).parse(pattern)?;
    Ok((input, Pattern::Parent((n as usize, Box::new(prefix)))))
}

impl<'a> Pattern<'a> {
    pub fn parse(pattern: &'a str) -> IResult<&'a str, Self> {
        alt((parent, prefix)).parse(pattern)
    }

    pub fn resolve(&self, repo: &Repo) -> Result<Option<git2::Oid>, git2::Error> {
        match self {
            Pattern::Head => Ok(Some(repo.head()?.target()?)),
            Pattern::Name(name) => {
                if let Some(branch) = repo.find_branch(name).optional()? {
                    return branch.target().map(Some);
                }

                if let Some(branch) = repo.find_remote_branch(name).optional()? {
                    return branch.target().map(Some);
                }

                repo.find_ref(&format!("refs/tags/{name}"))
                    .optional()?
                    .map(|tag| tag.find_commit().map(|commit| commit.id()))
                    .transpose()
            }
            Pattern::Parent((n, pat)) => match pat.resolve(repo)? {
                Some(oid) => Ok(repo.find_commit(oid)?.parent_n(*n)?.map(|c| c.id())),
                None => Ok(None),
            },
        }
    }
}
