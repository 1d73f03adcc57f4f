//! Reconstructs per-project repository structure from the flat legacy rows.
//!
//! A legacy project owns an unordered bag of repositories: canonical
//! repositories, their wikis (named with [`WIKI_SUFFIX`]) and forks (rows with
//! a parent). [`group_repositories`] partitions that bag into
//! [`RepositoryGroup`]s, one per canonical repository.
//!
//! Wikis are matched in one of two modes, decided once per project:
//!
//! - **mapped**: every wiki key names some canonical repository's hashed
//!   path, so each repository takes the wiki whose key equals its path.
//! - **unmapped**: at least one wiki key matches nothing, so each repository
//!   takes the oldest remaining wiki regardless of key.
//!
//! The mode applies to every wiki of the project; modes are never mixed.
//!
//! [`WIKI_SUFFIX`]: crate::types::legacy::WIKI_SUFFIX

use serde::Serialize;

use crate::error::{Error, Result};
use crate::types::legacy::Repository;

/// One target project worth of repositories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryGroup<'a> {
    /// Absent only for a wiki whose canonical repository no longer exists.
    pub project_repo: Option<&'a Repository>,
    pub wiki_repo: Option<&'a Repository>,
    pub forks: Vec<&'a Repository>,
}

impl<'a> RepositoryGroup<'a> {
    /// Repository providing the project's name and description.
    #[must_use]
    pub fn primary(&self) -> Option<&'a Repository> {
        self.project_repo.or(self.wiki_repo)
    }
}

/// Result of grouping one project's repositories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Grouping<'a> {
    pub groups: Vec<RepositoryGroup<'a>>,
    /// Wikis left without a canonical repository.
    pub unmigrated_wikis: usize,
    /// Forks whose parent is not a canonical repository of this project.
    pub orphaned_forks: usize,
}

/// Partitions a project's repositories, given in discovery order.
///
/// Fails with [`Error::UnmigratedForks`] when forks survive but no canonical
/// repository does.
pub fn group_repositories(repos: &[Repository]) -> Result<Grouping<'_>> {
    let project_repos: Vec<&Repository> = repos
        .iter()
        .filter(|r| !r.is_fork() && !r.is_wiki())
        .collect();
    let mut wikis: Vec<&Repository> = repos.iter().filter(|r| r.is_wiki()).collect();
    let forks: Vec<&Repository> = repos.iter().filter(|r| r.is_fork()).collect();

    if project_repos.is_empty() {
        if !forks.is_empty() {
            return Err(Error::UnmigratedForks { count: forks.len() });
        }

        // Orphan wikis still carry content; each becomes its own project.
        let groups = wikis
            .into_iter()
            .map(|wiki| RepositoryGroup {
                project_repo: None,
                wiki_repo: Some(wiki),
                forks: Vec::new(),
            })
            .collect();
        return Ok(Grouping {
            groups,
            ..Grouping::default()
        });
    }

    let mapped = wikis
        .iter()
        .all(|w| project_repos.iter().any(|r| r.hashed_path == w.wiki_key()));

    let mut groups = Vec::with_capacity(project_repos.len());
    let mut attached_forks = 0;

    for repo in project_repos {
        let wiki_repo = if mapped {
            wikis
                .iter()
                .position(|w| w.wiki_key() == repo.hashed_path)
                .map(|i| wikis.remove(i))
        } else if wikis.is_empty() {
            None
        } else {
            Some(wikis.remove(0))
        };

        let repo_forks: Vec<&Repository> = forks
            .iter()
            .copied()
            .filter(|f| f.parent_id == Some(repo.id))
            .collect();
        attached_forks += repo_forks.len();

        groups.push(RepositoryGroup {
            project_repo: Some(repo),
            wiki_repo,
            forks: repo_forks,
        });
    }

    Ok(Grouping {
        groups,
        unmigrated_wikis: wikis.len(),
        orphaned_forks: forks.len() - attached_forks,
    })
}
