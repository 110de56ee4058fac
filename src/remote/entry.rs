/// Directory listing entries
use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::remote::child_path;

const S_IFMT: u32 = 0o170000;
const S_IFDIR: u32 = 0o040000;

/// Kind of a listed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

impl EntryKind {
    /// Derive the kind from unix mode bits; unknown modes count as files.
    pub fn from_mode(permissions: Option<u32>) -> Self {
        match permissions {
            Some(mode) if mode & S_IFMT == S_IFDIR => EntryKind::Dir,
            _ => EntryKind::File,
        }
    }
}

/// One entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub name: String,
    /// Absolute remote path
    pub path: String,
    pub size: u64,
    /// Modification time, `YYYY-MM-DD HH:MM:SS` in local time
    #[serde(rename = "mTime")]
    pub m_time: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl DirectoryEntry {
    /// Build the entry for `name` listed inside the normalized directory `dir`.
    pub fn new(
        dir: &str,
        name: &str,
        size: Option<u64>,
        mtime: Option<u32>,
        permissions: Option<u32>,
    ) -> Self {
        Self {
            name: name.to_string(),
            path: child_path(dir, name),
            size: size.unwrap_or(0),
            m_time: format_mtime(i64::from(mtime.unwrap_or(0))),
            kind: EntryKind::from_mode(permissions),
        }
    }
}

/// Format a UNIX timestamp as `YYYY-MM-DD HH:MM:SS` in the local time zone.
pub fn format_mtime(secs: i64) -> String {
    Local
        .timestamp_opt(secs, 0)
        .earliest()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn directory_mode_bits_are_recognized() {
        assert_eq!(EntryKind::from_mode(Some(0o040755)), EntryKind::Dir);
        assert_eq!(EntryKind::from_mode(Some(0o100644)), EntryKind::File);
        assert_eq!(EntryKind::from_mode(Some(0o120777)), EntryKind::File);
        assert_eq!(EntryKind::from_mode(None), EntryKind::File);
    }

    #[test]
    fn mtime_is_formatted_in_local_time() {
        let formatted = format_mtime(1_700_000_000);
        let parsed = NaiveDateTime::parse_from_str(&formatted, "%Y-%m-%d %H:%M:%S").unwrap();
        let local = Local.from_local_datetime(&parsed).earliest().unwrap();
        assert_eq!(local.timestamp(), 1_700_000_000);
    }

    #[test]
    fn entries_under_root_have_single_separator() {
        let entry = DirectoryEntry::new("/", "home", Some(4096), Some(0), Some(0o040755));
        assert_eq!(entry.path, "/home");
        assert_eq!(entry.kind, EntryKind::Dir);
        assert_eq!(entry.size, 4096);
    }

    #[test]
    fn entry_serializes_with_wire_field_names() {
        let entry = DirectoryEntry::new("/home/u", "a.txt", Some(3), Some(0), Some(0o100644));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["name"], "a.txt");
        assert_eq!(value["path"], "/home/u/a.txt");
        assert_eq!(value["size"], 3);
        assert_eq!(value["type"], "file");
        assert!(value["mTime"].is_string());
    }
}
