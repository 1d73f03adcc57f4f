use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use git2::build::RepoBuilder;
use git2::{
    AutotagOption, CertificateCheckStatus, Cred, CredentialType, Direction, FetchOptions,
    ProxyOptions, PushOptions, RemoteCallbacks, Repository,
};
use tracing::{debug, info};

use super::Mirror;
use super::path::{redact_url, url_credentials};
use crate::error::{Error, Result};

const ORIGIN: &str = "origin";
const BARE_FETCH_REFSPEC: &str = "+refs/heads/*:refs/heads/*";
const FAST_FORWARD_REFSPEC: &str = "refs/heads/*:refs/heads/*";

/// Mirrors repositories through local bare clones using libgit2.
#[derive(Debug, Clone)]
pub struct GitMirror {
    remote_name: String,
}

impl GitMirror {
    #[must_use]
    pub fn new(remote_name: impl Into<String>) -> Self {
        Self {
            remote_name: remote_name.into(),
        }
    }

    /// Opens the bare clone at `local_path`, cloning it from `source_url` if absent.
    /// An existing clone only fast-forwards its branches.
    pub fn open_or_clone(&self, local_path: &Path, source_url: &str) -> Result<Repository> {
        if let Ok(repo) = Repository::open_bare(local_path) {
            debug!("Updating existing clone at {}", local_path.display());
            let mut remote = repo.find_remote(ORIGIN)?;
            remote.fetch(&[FAST_FORWARD_REFSPEC], Some(&mut fetch_options()), None)?;
            drop(remote);
            return Ok(repo);
        }

        info!("Cloning {} into {}", redact_url(source_url), local_path.display());
        fs::create_dir_all(local_path)?;

        let repo = RepoBuilder::new()
            .bare(true)
            .fetch_options(fetch_options())
            .remote_create(|repo, name, url| repo.remote_with_fetch(name, url, BARE_FETCH_REFSPEC))
            .clone(source_url, local_path)?;
        Ok(repo)
    }

    /// Disables proxying and TLS verification for the local repository.
    pub fn configure(&self, repo: &Repository) -> Result<()> {
        let mut config = repo.config()?;
        config.set_str("http.proxy", "")?;
        config.set_bool("http.sslVerify", false)?;
        Ok(())
    }

    /// Points the push remote at `push_url` and marks it as a mirror.
    pub fn ensure_remote(&self, repo: &Repository, push_url: &str) -> Result<()> {
        let name = self.remote_name.as_str();
        match repo.find_remote(name) {
            Ok(_) => repo.remote_set_url(name, push_url)?,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                repo.remote(name, push_url)?;
            }
            Err(e) => return Err(Error::Git(e)),
        }
        repo.remote_set_pushurl(name, Some(push_url))?;
        repo.config()?.set_bool(&format!("remote.{name}.mirror"), true)?;
        Ok(())
    }

    /// Pushes every local ref and deletes remote refs with no local counterpart.
    pub fn push_mirror(&self, repo: &Repository, push_url: &str) -> Result<()> {
        let local_refs = local_refs(repo)?;

        let remote_refs: Vec<String> = {
            let mut remote = repo.find_remote(&self.remote_name)?;
            let connection = remote.connect_auth(
                Direction::Push,
                Some(callbacks(push_url)),
                Some(proxy_options()),
            )?;
            let heads: Vec<String> = connection
                .list()?
                .iter()
                .map(|head| head.name().to_string())
                .filter(|name| name.starts_with("refs/") && !name.ends_with("^{}"))
                .collect();
            heads
        };

        let mut refspecs: Vec<String> = local_refs.iter().map(|r| format!("+{r}:{r}")).collect();
        refspecs.extend(
            remote_refs
                .iter()
                .filter(|r| !local_refs.contains(*r))
                .map(|r| format!(":{r}")),
        );

        if refspecs.is_empty() {
            debug!("Nothing to push for {}", repo.path().display());
            return Ok(());
        }

        let mut rejected: Vec<String> = Vec::new();
        let mut cbs = callbacks(push_url);
        cbs.push_update_reference(|refname, status| {
            if let Some(message) = status {
                rejected.push(format!("{refname}: {message}"));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(cbs).proxy_options(proxy_options());

        let mut remote = repo.find_remote(&self.remote_name)?;
        remote.push(&refspecs, Some(&mut options))?;
        drop(options);

        if !rejected.is_empty() {
            return Err(Error::Git(git2::Error::from_str(&format!(
                "push rejected: {}",
                rejected.join("; ")
            ))));
        }

        info!(
            "Mirrored {} ref(s) to {}",
            local_refs.len(),
            redact_url(push_url)
        );
        Ok(())
    }
}

impl Mirror for GitMirror {
    fn mirror(&self, local_path: &Path, source_url: &str, push_url: &str) -> Result<()> {
        let repo = self.open_or_clone(local_path, source_url)?;
        self.configure(&repo)?;
        self.ensure_remote(&repo, push_url)?;
        self.push_mirror(&repo, push_url)
    }
}

fn local_refs(repo: &Repository) -> Result<BTreeSet<String>> {
    let mut refs = BTreeSet::new();
    for reference in repo.references()? {
        let reference = reference?;
        if reference.symbolic_target().is_some() {
            continue;
        }
        if let Some(name) = reference.name() {
            if !name.starts_with("refs/remotes/") {
                refs.insert(name.to_string());
            }
        }
    }
    Ok(refs)
}

fn proxy_options<'a>() -> ProxyOptions<'a> {
    // Default proxy options leave proxying disabled.
    ProxyOptions::new()
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options
        .remote_callbacks(callbacks(""))
        .proxy_options(proxy_options())
        .download_tags(AutotagOption::All);
    options
}

fn callbacks<'a>(url: &str) -> RemoteCallbacks<'a> {
    let credentials = url_credentials(url);
    let mut callbacks = RemoteCallbacks::new();

    callbacks.credentials(move |_url, username_from_url, allowed_types| {
        if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) {
            if let Some((username, password)) = &credentials {
                return Cred::userpass_plaintext(username, password);
            }
        }
        if allowed_types.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        Cred::default()
    });

    // Source and target sit on a trusted network.
    callbacks.certificate_check(|_cert, _host| Ok(CertificateCheckStatus::CertificateOk));
    callbacks
}
