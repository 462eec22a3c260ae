use thiserror::Error;

/// Longest resource name accepted (a single DNS label).
pub const MAX_NAME_LEN: usize = 63;

/// Longest DNS-1123 subdomain accepted.
pub const MAX_SUBDOMAIN_LEN: usize = 253;

/// Git hosts a component source URL may point at.
pub const SUPPORTED_GIT_HOSTS: [&str; 3] = ["github.com", "gitlab.com", "bitbucket.org"];

/// The first naming rule a value breaks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("must not be empty")]
    Empty,
    #[error("must be no more than {max} characters (got {len})")]
    TooLong { len: usize, max: usize },
    #[error("must start with a lower case alphabetical character")]
    MustStartWithLetter,
    #[error("must start and end with a lower case alphanumeric character")]
    MustBeAlphanumericAtEdges,
    #[error("must consist of lower case alphanumeric characters or '-', found '{0}'")]
    InvalidCharacter(char),
}

/// Why a URL was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("parse \"{url}\": invalid URI for request, only http and https URLs are accepted")]
    InvalidScheme { url: String },
    #[error("parse \"{url}\": URL has no host")]
    MissingHost { url: String },
    #[error(
        "source git url {url} is not from a supported vendor, its host {host} must be one of github.com, gitlab.com, bitbucket.org"
    )]
    UnsupportedVendor { url: String, host: String },
}

/// Hosting vendor recognised from a git source URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitVendor {
    GitHub,
    GitLab,
    Bitbucket,
}

impl GitVendor {
    fn from_host(host: &str) -> Option<GitVendor> {
        match host {
            "github.com" => Some(GitVendor::GitHub),
            "gitlab.com" => Some(GitVendor::GitLab),
            "bitbucket.org" => Some(GitVendor::Bitbucket),
            _ => None,
        }
    }
}

/// Validate a resource name.
/// Rules: lowercase `[a-z0-9-]`, starts with a letter, ends alphanumeric, max 63 chars.
pub fn validate_dns1123_name(name: &str) -> Result<(), NameError> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
        return Err(NameError::MustStartWithLetter);
    }
    validate_label_body(name)
}

/// Validate a DNS-1123 subdomain such as an ingress domain:
/// dot separated labels of `[a-z0-9-]`, each starting and ending alphanumeric,
/// at most 253 chars overall.
pub fn validate_dns1123_subdomain(domain: &str) -> Result<(), NameError> {
    if domain.is_empty() {
        return Err(NameError::Empty);
    }
    if domain.len() > MAX_SUBDOMAIN_LEN {
        return Err(NameError::TooLong {
            len: domain.len(),
            max: MAX_SUBDOMAIN_LEN,
        });
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(NameError::MustBeAlphanumericAtEdges);
        }
        validate_label_body(label)?;
    }
    Ok(())
}

fn validate_label_body(label: &str) -> Result<(), NameError> {
    if let Some(c) = label
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
    {
        return Err(NameError::InvalidCharacter(c));
    }
    if label.starts_with('-') || label.ends_with('-') {
        return Err(NameError::MustBeAlphanumericAtEdges);
    }
    Ok(())
}

/// Validate a component git source URL and identify its vendor.
///
/// The URL must be an absolute `http`/`https` request URI (SSH-style
/// `git@host:org/repo` forms are rejected) whose host is one of
/// [`SUPPORTED_GIT_HOSTS`]. This is a lexical check only.
pub fn validate_git_url(url: &str) -> Result<GitVendor, UrlError> {
    let host = parse_http_host(url)?;
    GitVendor::from_host(&host).ok_or_else(|| UrlError::UnsupportedVendor {
        url: url.to_string(),
        host,
    })
}

/// Validate a cluster API URL: `http`/`https` with a non-empty host.
pub fn validate_api_url(url: &str) -> Result<(), UrlError> {
    parse_http_host(url).map(|_| ())
}

/// Extract the lower-cased host of an `http(s)://` URL, without userinfo or port.
fn parse_http_host(url: &str) -> Result<String, UrlError> {
    let invalid = || UrlError::InvalidScheme {
        url: url.to_string(),
    };

    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid());
    }
    let (scheme, rest) = url.split_once("://").ok_or_else(invalid)?;
    if !(scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https")) {
        return Err(invalid());
    }

    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority
        .rsplit_once('@')
        .map_or(authority, |(_, host_port)| host_port);
    let host = if host_port.starts_with('[') {
        // IPv6 literal
        host_port
            .find(']')
            .map_or(host_port, |end| &host_port[..=end])
    } else {
        match host_port.rsplit_once(':') {
            Some((host, port)) if port.chars().all(|c| c.is_ascii_digit()) => host,
            Some(_) => return Err(invalid()),
            None => host_port,
        }
    };

    if host.is_empty() {
        return Err(UrlError::MissingHost {
            url: url.to_string(),
        });
    }
    Ok(host.to_ascii_lowercase())
}
