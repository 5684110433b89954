use crate::error::{RemoteError, Result};
use std::io::Read;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    Folder,
    File,
}

/// One line of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    /// `.` and `..` as reported by some servers.
    pub fn is_pseudo(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

/// Commands the tree walkers need from an authenticated remote session.
pub trait RemoteFs {
    /// The session's working directory, against which relative paths resolve.
    fn current_dir(&mut self) -> std::result::Result<String, RemoteError>;
    fn change_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError>;
    fn make_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError>;
    fn list(&mut self, path: &str) -> std::result::Result<Vec<Entry>, RemoteError>;
    /// Stores `reader` at `path` in binary mode, returning the bytes written.
    fn store(
        &mut self,
        path: &str,
        reader: &mut dyn Read,
    ) -> std::result::Result<u64, RemoteError>;
    fn delete_file(&mut self, path: &str) -> std::result::Result<(), RemoteError>;
    fn remove_dir(&mut self, path: &str) -> std::result::Result<(), RemoteError>;

    /// Logs out and drops the connection.
    fn close(self) -> std::result::Result<(), RemoteError>
    where
        Self: Sized;
}

/// Opens a fresh session for one high-level operation.
pub trait Connector {
    type Session: RemoteFs;

    fn open(&self) -> Result<Self::Session>;
}

/// Closes `session`; a failed logout is only logged.
pub fn release<S: RemoteFs>(session: S) {
    if let Err(e) = session.close() {
        tracing::warn!("closing remote session failed: {e}");
    }
}

/// Joins a remote base path and a relative segment with exactly one `/`.
///
/// An empty segment yields `base` unchanged; repeated separators inside the
/// segment are collapsed. A root base (`/`) is kept as the single leading slash.
pub fn join(base: &str, segment: &str) -> String {
    let segment = segment
        .split('/')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if segment.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return segment;
    }
    let trimmed = base.trim_end_matches('/');
    format!("{trimmed}/{segment}")
}
