/// Remote path helpers shared by listing, transfer and the guarded delete
use crate::remote::{RemoteError, RemoteResult};

/// System directories that are never deleted, together with everything below them
pub const PROTECTED_DIRS: [&str; 12] = [
    "/bin", "/boot", "/dev", "/etc", "/lib", "/opt", "/proc", "/root", "/sbin", "/tmp", "/usr",
    "/var",
];

/// Strip trailing separators; the empty path means the root.
pub fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Absolute path of `name` inside the (normalized) directory `dir`.
pub fn child_path(dir: &str, name: &str) -> String {
    let prefix = if dir == "/" { "" } else { dir };
    format!("{}/{}", prefix, name)
}

/// Whether deleting `path` must be refused.
///
/// The root, every protected directory and their descendants are refused.
/// The check runs on the lexically normalized path so that `//tmp`,
/// `/tmp/` or `/home/../etc` cannot slip past it, and relative paths that
/// climb above their starting directory are refused as well.
pub fn is_protected(path: &str) -> bool {
    let Some(normalized) = lexical_normalize(path) else {
        return true;
    };
    if normalized == "/" {
        return true;
    }
    PROTECTED_DIRS.iter().any(|dir| {
        normalized == *dir
            || normalized
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'))
    })
}

/// Fail with [`RemoteError::ProtectedPath`] when `path` may not be deleted.
pub fn check_removable(path: &str) -> RemoteResult<()> {
    if path.is_empty() || is_protected(path) {
        return Err(RemoteError::ProtectedPath(path.to_string()));
    }
    Ok(())
}

/// Local file a download of `remote_path` into `local_dir` is written to.
///
/// Returns `None` when the remote path has no final file name segment.
pub fn download_destination(remote_path: &str, local_dir: &str) -> Option<String> {
    let name = remote_path.rsplit('/').next().filter(|name| !name.is_empty())?;
    let dir = local_dir.trim_end_matches('/');
    Some(format!("{}/{}", dir, name))
}

/// Quote `value` for a POSIX shell command line.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Collapse repeated separators and resolve `.`/`..` without touching the
/// remote filesystem. `None` when a relative path climbs above its start.
fn lexical_normalize(path: &str) -> Option<String> {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.pop().is_none() && !absolute {
                    return None;
                }
            }
            other => parts.push(other),
        }
    }
    if absolute {
        Some(format!("/{}", parts.join("/")))
    } else {
        Some(parts.join("/"))
    }
}
