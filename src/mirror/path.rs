use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::error::{Error, Result};

/// Username sent alongside an impersonation token on git pushes.
pub const PUSH_USERNAME: &str = "gitlab-ci-token";

/// Local directory of a mirrored repository: `root/namespace/project`.
pub fn export_path(root: &Path, namespace: &str, project: &str) -> Result<PathBuf> {
    validate_segment(namespace)?;
    validate_segment(project)?;
    Ok(root.join(namespace).join(project))
}

/// Local directory of a mirrored wiki: `root/namespace/project.wiki`.
pub fn wiki_export_path(root: &Path, namespace: &str, project: &str) -> Result<PathBuf> {
    export_path(root, namespace, &format!("{project}.wiki"))
}

fn validate_segment(segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(Error::Config("Path segment cannot be empty".to_string()));
    }

    if segment.len() > 255 {
        return Err(Error::Config(
            "Path segment cannot exceed 255 characters".to_string(),
        ));
    }

    if segment == "." || segment == ".." {
        return Err(Error::Config(format!("Invalid path segment: {segment}")));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r', '/', '\\'];
    if segment.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::Config(format!(
            "Path segment contains invalid characters: {segment:?}"
        )));
    }

    Ok(())
}

/// Injects `PUSH_USERNAME:token` credentials into an HTTP clone URL.
pub fn authenticated_url(repo_url: &str, token: &str) -> Result<String> {
    let mut url = Url::parse(repo_url)
        .map_err(|e| Error::Config(format!("invalid repository url {repo_url}: {e}")))?;

    url.set_username(PUSH_USERNAME)
        .and_then(|()| url.set_password(Some(token)))
        .map_err(|()| Error::Config(format!("url cannot carry credentials: {repo_url}")))?;

    Ok(url.to_string())
}

/// Strips any password from a URL so it can be logged.
#[must_use]
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}

/// Username and password carried in a URL, if any.
#[must_use]
pub fn url_credentials(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let password = parsed.password()?;
    let username = urlencoding::decode(parsed.username()).ok()?.into_owned();
    let password = urlencoding::decode(password).ok()?.into_owned();
    Some((username, password))
}
