//! Repository URL normalization
//!
//! Accepts the two shapes git remotes are usually written in:
//! - `scheme://host/.../owner/name[.git]`
//! - `user@host:owner/name[.git]`
//!
//! Only the last two path segments matter, so self-hosted instances mounted
//! under a sub-path parse the same way as top-level ones.

use crate::{Error, Result};

/// User name used when rendering the SSH shorthand form
pub const SSH_USER: &str = "git";

/// Scheme used when rendering the non-SSH form
pub const DEFAULT_SCHEME: &str = "https";

/// Owner, name and form extracted from a raw repository URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    /// Host the URL points at, when it could be determined
    pub host: Option<String>,
    /// Organization or user segment
    pub owner: String,
    /// Repository name without a `.git` suffix
    pub name: String,
    /// True for the `user@host:owner/name` shorthand (or an `ssh://` URL)
    pub ssh: bool,
}

impl ParsedUrl {
    /// Parse a raw repository URL
    ///
    /// Fails with [`Error::UrlFormat`] when fewer than three `/`-separated
    /// segments remain after normalization, or when owner or name is empty.
    pub fn parse(raw: &str) -> Result<Self> {
        let input = raw.trim();

        let (path, host, ssh) = if let Some(idx) = input.find("://") {
            let scheme = &input[..idx];
            let host = url::Url::parse(input)
                .ok()
                .and_then(|u| u.host_str().map(str::to_string));
            (
                input[idx + 3..].to_string(),
                host,
                scheme.eq_ignore_ascii_case("ssh"),
            )
        } else if let Some((user_host, rest)) = input
            .split_once(':')
            .filter(|(user_host, _)| user_host.contains('@'))
        {
            // user@host:owner/name -> host/owner/name
            let host = user_host
                .rsplit_once('@')
                .map(|(_, host)| host.to_string())
                .filter(|h| !h.is_empty());
            let path = format!("{}/{}", host.as_deref().unwrap_or(""), rest);
            (path, host, true)
        } else {
            (input.to_string(), None, false)
        };

        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() < 3 {
            return Err(Error::UrlFormat(raw.to_string()));
        }

        let owner = segments[segments.len() - 2];
        let last = segments[segments.len() - 1];
        let name = last.strip_suffix(".git").unwrap_or(last);

        if owner.is_empty() || name.is_empty() {
            return Err(Error::UrlFormat(raw.to_string()));
        }

        Ok(Self {
            host,
            owner: owner.to_string(),
            name: name.to_string(),
            ssh,
        })
    }
}

/// Render a canonical clone URL
///
/// `git@host:owner/name.git` for the SSH form, `https://host/owner/name.git`
/// otherwise.
pub fn render_url(host: &str, owner: &str, name: &str, ssh: bool) -> String {
    if ssh {
        format!("{}@{}:{}/{}.git", SSH_USER, host, owner, name)
    } else {
        format!("{}://{}/{}/{}.git", DEFAULT_SCHEME, host, owner, name)
    }
}
