//! Explicit transfer destination, validated before any scp/ssh process runs.

use std::path::Path;

use serde::Serialize;

use crate::config::RemoteConfig;

/// Where the image archive is copied to.
///
/// Built from `[remote]` in tarship.toml via [`TryFrom<&RemoteConfig>`].
/// Every field is checked so that no value can be mistaken for an scp/ssh
/// option or smuggle a second destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteTarget {
    pub host: String,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub identity_file: Option<String>,
    /// Destination directory on the remote host.
    pub path: String,
    pub ssh_options: Vec<String>,
}

impl RemoteTarget {
    /// `user@host` or `host`, as passed to ssh and scp.
    pub fn destination(&self) -> String {
        match &self.user {
            Some(user) => format!("{user}@{}", self.host),
            None => self.host.clone(),
        }
    }

    /// Full remote path of an archive copied into [`path`](Self::path).
    pub fn remote_file(&self, archive: &Path) -> String {
        let file_name = archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.path.ends_with('/') {
            format!("{}{file_name}", self.path)
        } else {
            format!("{}/{file_name}", self.path)
        }
    }
}

impl TryFrom<&RemoteConfig> for RemoteTarget {
    type Error = crate::Error;

    fn try_from(config: &RemoteConfig) -> crate::Result<Self> {
        let host = config
            .host
            .as_deref()
            .ok_or(crate::Error::RemoteHostMissing)?;

        validate_host(host)?;
        if let Some(user) = &config.user {
            validate_user(user)?;
        }
        if config.port == Some(0) {
            return Err(invalid("port", "0", "must be between 1 and 65535"));
        }
        if let Some(identity) = &config.identity_file {
            validate_argument("identity_file", identity)?;
        }
        validate_remote_path(&config.path)?;
        for option in &config.ssh_options {
            validate_ssh_option(option)?;
        }

        Ok(Self {
            host: host.to_owned(),
            user: config.user.clone(),
            port: config.port,
            identity_file: config.identity_file.clone(),
            path: config.path.clone(),
            ssh_options: config.ssh_options.clone(),
        })
    }
}

fn invalid(field: &'static str, value: &str, reason: &'static str) -> crate::Error {
    crate::Error::InvalidRemote {
        field,
        value: value.to_owned(),
        reason,
    }
}

fn validate_host(host: &str) -> crate::Result<()> {
    if host.is_empty() {
        return Err(invalid("host", host, "must not be empty"));
    }
    if host.starts_with('-') {
        return Err(invalid("host", host, "must not start with '-'"));
    }
    if host.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(invalid("host", host, "must not contain whitespace"));
    }
    if host.contains(['@', ':', '/']) {
        return Err(invalid(
            "host",
            host,
            "must be a bare host name; set [remote].user and [remote].path separately",
        ));
    }
    Ok(())
}

fn validate_user(user: &str) -> crate::Result<()> {
    let mut chars = user.chars();
    let valid_first = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid_first && valid_rest {
        Ok(())
    } else {
        Err(invalid("user", user, "must match [A-Za-z_][A-Za-z0-9_.-]*"))
    }
}

fn validate_argument(field: &'static str, value: &str) -> crate::Result<()> {
    if value.is_empty() {
        return Err(invalid(field, value, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(field, value, "must not start with '-'"));
    }
    if value.chars().any(char::is_control) {
        return Err(invalid(field, value, "must not contain control characters"));
    }
    Ok(())
}

/// Legacy scp (`-O`, OpenSSH before 9.0) hands the destination path to the
/// remote shell, so anything it would expand or split on is refused.
fn validate_remote_path(path: &str) -> crate::Result<()> {
    validate_argument("path", path)?;
    if path
        .chars()
        .any(|c| c.is_whitespace() || SHELL_METACHARACTERS.contains(&c))
    {
        return Err(invalid(
            "path",
            path,
            "must not contain whitespace or shell metacharacters",
        ));
    }
    Ok(())
}

const SHELL_METACHARACTERS: &[char] = &[
    '$', '`', ';', '&', '|', '<', '>', '(', ')', '{', '}', '[', ']', '*', '?', '!', '#', '\'', '"',
    '\\',
];

fn validate_ssh_option(option: &str) -> crate::Result<()> {
    validate_argument("ssh_options", option)?;
    if !option.contains('=') {
        return Err(invalid(
            "ssh_options",
            option,
            "must be in Key=Value form, as accepted by `-o`",
        ));
    }
    Ok(())
}
