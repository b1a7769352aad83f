//! Git URL handling
//!
//! This module handles:
//! - Splitting `url#ref` install arguments
//! - Deriving a library name from a repository URL
//! - Normalizing SCP-style SSH and `file://` URLs for libgit2

use std::borrow::Cow;
use std::path::Path;

/// True for URLs that point at the local filesystem
pub fn is_local_url(url: &str) -> bool {
    url.starts_with("file://") || Path::new(url).is_absolute() || Path::new(url).exists()
}

/// Split `https://host/repo.git#v1.2.0` into URL and optional ref
pub fn split_ref(input: &str) -> (&str, Option<&str>) {
    match input.rsplit_once('#') {
        Some((url, git_ref)) if !git_ref.is_empty() => (url, Some(git_ref)),
        Some((url, _)) => (url, None),
        None => (input, None),
    }
}

/// Library name for a repository URL: the last path segment without `.git`.
///
/// Handles `https://host/owner/Servo.git`, `git@host:owner/Servo.git`,
/// `file:///srv/Servo` and plain local paths. `None` when nothing usable
/// remains.
pub fn library_name_from_url(url: &str) -> Option<String> {
    let trimmed = url.trim().trim_end_matches(&['/', '\\'][..]);
    let without_scheme = match trimmed.split_once("://") {
        // host only, no repository path
        Some((_, rest)) if !rest.contains('/') => return None,
        Some((_, rest)) => rest,
        None => trimmed,
    };
    let last = without_scheme
        .rsplit(&['/', '\\', ':'][..])
        .next()
        .unwrap_or(without_scheme);
    let name = last.strip_suffix(".git").unwrap_or(last);

    if name.is_empty() || name == "." || name == ".." {
        None
    } else {
        Some(name.to_string())
    }
}

/// Convert SCP-style SSH URLs (`git@host:path`) to `ssh://git@host/path`.
pub fn normalize_ssh_url(url: &str) -> Cow<'_, str> {
    if !url.starts_with("git@") {
        return Cow::Borrowed(url);
    }

    match url.split_once(':') {
        Some((host, path)) => {
            let path = path.trim_start_matches('/');
            Cow::Owned(format!("ssh://{host}/{path}"))
        }
        None => Cow::Borrowed(url),
    }
}

/// Make `file://relative` and `file://C:\...`-style URLs absolute for libgit2
pub fn normalize_file_url(url: &str) -> Cow<'_, str> {
    let Some(after) = url.strip_prefix("file://") else {
        return Cow::Borrowed(url);
    };

    if after.contains('\\') {
        return Cow::Owned(format!("file:///{}", after.replace('\\', "/")));
    }
    if !after.is_empty() && !after.starts_with('/') {
        return Cow::Owned(format!("file:///{after}"));
    }
    Cow::Borrowed(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ref() {
        assert_eq!(
            split_ref("https://github.com/a/Servo.git#v1.2.0"),
            ("https://github.com/a/Servo.git", Some("v1.2.0"))
        );
        assert_eq!(
            split_ref("https://github.com/a/Servo.git"),
            ("https://github.com/a/Servo.git", None)
        );
        assert_eq!(split_ref("https://h/r.git#"), ("https://h/r.git", None));
    }

    #[test]
    fn test_library_name_from_url() {
        assert_eq!(
            library_name_from_url("https://github.com/arduino-libraries/Servo.git").as_deref(),
            Some("Servo")
        );
        assert_eq!(
            library_name_from_url("git@github.com:arduino-libraries/Stepper.git").as_deref(),
            Some("Stepper")
        );
        assert_eq!(
            library_name_from_url("git@github.com:Wire").as_deref(),
            Some("Wire")
        );
        assert_eq!(
            library_name_from_url("file:///srv/repos/Servo/").as_deref(),
            Some("Servo")
        );
        assert_eq!(
            library_name_from_url("/srv/repos/digit.git").as_deref(),
            Some("digit")
        );
        assert_eq!(library_name_from_url("https://github.com/"), None);
        assert_eq!(library_name_from_url(".git"), None);
    }

    #[test]
    fn test_normalize_ssh_url() {
        assert_eq!(
            normalize_ssh_url("git@github.com:user/repo.git"),
            "ssh://git@github.com/user/repo.git"
        );
        assert_eq!(
            normalize_ssh_url("https://github.com/user/repo.git"),
            "https://github.com/user/repo.git"
        );
    }

    #[test]
    fn test_normalize_file_url() {
        assert_eq!(normalize_file_url("file:///srv/repo"), "file:///srv/repo");
        assert_eq!(normalize_file_url("file://srv/repo"), "file:///srv/repo");
        assert_eq!(
            normalize_file_url("file://C:\\repos\\lib"),
            "file:///C:/repos/lib"
        );
        assert_eq!(normalize_file_url("/srv/repo"), "/srv/repo");
    }
}
