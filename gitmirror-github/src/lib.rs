//! gitmirror GitHub - GitHub hosting provider for gitmirror
//!
//! Implements the core `Hub` trait on top of the GitHub REST API: existence
//! checks, repository creation, forks and deletion.

mod error;
mod hub;

pub use error::{Error, Result};
pub use hub::{GitHubHub, GITHUB_DOMAIN};
