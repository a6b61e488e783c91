use git2::ErrorCode;

mod config;
mod objects;
mod repo;
mod resolve;
mod status;

pub use config::Settings;
pub use objects::*;
pub use repo::{Repo, RunError};
pub use status::*;

pub trait Optional<T> {
    fn optional(self) -> Result<Option<T>, git2::Error>;
}

impl<T> Optional<T> for Result<T, git2::Error> {
    fn optional(self) -> Result<Option<T>, git2::Error> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
