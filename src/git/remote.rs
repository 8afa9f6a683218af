//! Remote URL helpers used for manual pull-request instructions.

use url::Url;

/// Hosted repository coordinates extracted from a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedRepo {
    pub host: String,
    pub owner: String,
    pub name: String,
}

fn split_owner_repo(path: &str) -> Option<(String, String)> {
    let trimmed = path.trim_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let mut parts = trimmed.splitn(2, '/');
    let owner = parts.next()?.trim();
    let name = parts.next()?.trim().trim_end_matches('/');
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

/// Parse https://, ssh:// and scp-like (`git@host:owner/repo.git`) remotes.
pub fn parse_remote_url(remote: &str) -> Option<HostedRepo> {
    let remote = remote.trim();
    if remote.is_empty() {
        return None;
    }
    if let Ok(u) = Url::parse(remote) {
        if !matches!(u.scheme(), "https" | "http" | "ssh" | "git") {
            return None;
        }
        let host = u.host_str()?.to_string();
        let (owner, name) = split_owner_repo(u.path())?;
        return Some(HostedRepo { host, owner, name });
    }
    // scp-like syntax: [user@]host:path
    let (lhs, path) = remote.split_once(':')?;
    if lhs.contains('/') {
        return None;
    }
    let host = lhs.rsplit('@').next()?.to_string();
    if host.is_empty() {
        return None;
    }
    let (owner, name) = split_owner_repo(path)?;
    Some(HostedRepo { host, owner, name })
}

fn encode_ref(name: &str) -> String {
    name.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Browser URL to open a pull request by hand; only GitHub-style hosts are supported.
pub fn compare_url(remote: &str, base: &str, head: &str) -> Option<String> {
    let repo = parse_remote_url(remote)?;
    if !repo.host.contains("github") {
        return None;
    }
    Some(format!(
        "https://{}/{}/{}/compare/{}...{}?expand=1",
        repo.host,
        repo.owner,
        repo.name,
        encode_ref(base),
        encode_ref(head)
    ))
}
