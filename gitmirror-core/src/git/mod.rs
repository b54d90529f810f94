//! Git operations for gitmirror
//!
//! URL normalization and the local transport used by the mirror pipeline.

mod transport;
pub mod url;

pub use transport::{Git2Repository, Git2Transport, GitTransport, LocalRepository};
pub use self::url::{render_url, ParsedUrl};
