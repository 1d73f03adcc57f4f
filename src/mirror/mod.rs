//! Local bare clones mirrored to the target with a one-shot mirror push.

mod git;
pub mod path;

pub use git::GitMirror;

use std::path::Path;

use crate::error::Result;

/// Mirror copies a source repository to a push URL through a local clone.
///
/// Transport errors are returned unmodified.
pub trait Mirror {
    fn mirror(&self, local_path: &Path, source_url: &str, push_url: &str) -> Result<()>;
}

impl<M: Mirror + ?Sized> Mirror for &M {
    fn mirror(&self, local_path: &Path, source_url: &str, push_url: &str) -> Result<()> {
        (**self).mirror(local_path, source_url, push_url)
    }
}
