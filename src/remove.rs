use crate::error::{DirOp, Error, Failure};
use crate::remote::{self, EntryKind, RemoteFs};
use serde::Serialize;
use tracing::{debug, error, warn};

#[derive(Debug, Default, Serialize)]
pub struct RemovalReport {
    pub files_deleted: usize,
    pub dirs_removed: usize,
    pub failures: Vec<Failure>,
}

impl RemovalReport {
    pub fn absorb(&mut self, other: RemovalReport) {
        self.files_deleted += other.files_deleted;
        self.dirs_removed += other.dirs_removed;
        self.failures.extend(other.failures);
    }

    fn fail(&mut self, op: DirOp, path: String, source: crate::error::RemoteError) {
        let err = Error::DirectoryOp {
            op,
            path: path.clone(),
            source,
        };
        error!("{err}");
        self.failures.push(Failure::new(path, err));
    }
}

/// Deletes `parent_dir/current_dir` and everything below it, children first.
///
/// Best effort: a failed delete is recorded and the walk continues, which
/// leaves the enclosing directory non-empty so its own removal fails too.
/// An empty `current_dir` removes `parent_dir` itself.
pub fn remove_tree<R: RemoteFs>(
    remote: &mut R,
    parent_dir: &str,
    current_dir: &str,
) -> RemovalReport {
    let mut report = RemovalReport::default();
    remove_dir_recursive(remote, remote::join(parent_dir, current_dir), &mut report);
    report
}

fn remove_dir_recursive<R: RemoteFs>(remote: &mut R, dir: String, report: &mut RemovalReport) {
    let entries = match remote.list(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("cannot list {dir}, treating it as empty: {e}");
            Vec::new()
        }
    };

    for entry in entries.into_iter().filter(|e| !e.is_pseudo()) {
        let path = remote::join(&dir, &entry.name);
        match entry.kind {
            EntryKind::Folder => remove_dir_recursive(remote, path, report),
            EntryKind::File => match remote.delete_file(&path) {
                Ok(()) => {
                    debug!("deleted file {path}");
                    report.files_deleted += 1;
                }
                Err(source) => report.fail(DirOp::DeleteFile, path, source),
            },
        }
    }

    match remote.remove_dir(&dir) {
        Ok(()) => {
            debug!("removed directory {dir}");
            report.dirs_removed += 1;
        }
        Err(source) => report.fail(DirOp::Remove, dir, source),
    }
}
