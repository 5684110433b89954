use crate::error::{DirOp, Error, Failure, Result};
use crate::remote::{self, Connector, RemoteFs};
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default, Serialize)]
pub struct UploadReport {
    pub remote_base: String,
    pub files_uploaded: usize,
    pub bytes_uploaded: u64,
    pub dirs_created: usize,
    pub failures: Vec<Failure>,
}

impl UploadReport {
    fn fail(&mut self, path: impl Into<String>, err: Error) {
        let path = path.into();
        error!("{err}");
        self.failures.push(Failure::new(path, err));
    }
}

/// Opens a session, mirrors `backup_dir` into
/// `<remote_backup_path>/<backup_dir name>` and closes the session.
///
/// The name is taken from the canonical path, so `.` or `set/inner/..` still
/// name the set. A directory without a name (the filesystem root) is rejected
/// before connecting.
pub fn upload_backup<C: Connector>(
    connector: &C,
    remote_backup_path: &str,
    backup_dir: &Path,
) -> Result<UploadReport> {
    let name = backup_set_name(backup_dir)?;
    let remote_base = remote::join(remote_backup_path, &name);

    let mut session = connector.open()?;
    info!("uploading {} to {remote_base}", backup_dir.display());
    let result = upload_tree(&mut session, &remote_base, backup_dir);
    remote::release(session);

    if let Ok(report) = &result {
        info!(
            "upload to {remote_base} done: {} files, {} directories, {} failures",
            report.files_uploaded,
            report.dirs_created,
            report.failures.len()
        );
    }
    result
}

fn backup_set_name(backup_dir: &Path) -> Result<String> {
    let canonical = fs::canonicalize(backup_dir).map_err(|e| Error::io(backup_dir, e))?;
    match canonical.file_name() {
        Some(name) => Ok(name.to_string_lossy().into_owned()),
        None => Err(Error::UnnamedBackupDir(canonical)),
    }
}

/// Mirrors `local_dir` under `remote_base`, creating `remote_base` first when
/// it does not exist. Only an unreadable `local_dir` aborts the walk; every
/// other failure is recorded in the report.
pub fn upload_tree<R: RemoteFs>(
    remote: &mut R,
    remote_base: &str,
    local_dir: &Path,
) -> Result<UploadReport> {
    let mut report = UploadReport {
        remote_base: remote_base.to_string(),
        ..UploadReport::default()
    };

    if remote_dir_exists(remote, remote_base) {
        debug!("remote directory {remote_base} exists");
    } else {
        info!("creating remote directory {remote_base}");
        match remote.make_dir(remote_base) {
            Ok(()) => report.dirs_created += 1,
            Err(source) => report.fail(
                remote_base,
                Error::DirectoryOp {
                    op: DirOp::Create,
                    path: remote_base.to_string(),
                    source,
                },
            ),
        }
    }

    let entries = fs::read_dir(local_dir).map_err(|e| Error::io(local_dir, e))?;
    upload_entries(remote, remote_base, local_dir, entries, String::new(), &mut report);
    Ok(report)
}

/// Checks for `path` by entering it, then returns to the previous working
/// directory so that relative paths keep resolving against it.
fn remote_dir_exists<R: RemoteFs>(remote: &mut R, path: &str) -> bool {
    let home = match remote.current_dir() {
        Ok(home) => Some(home),
        Err(e) => {
            warn!("cannot read remote working directory: {e}");
            None
        }
    };
    if remote.change_dir(path).is_err() {
        return false;
    }
    if let Some(home) = home {
        if let Err(e) = remote.change_dir(&home) {
            warn!("cannot return to remote directory {home}: {e}");
        }
    }
    true
}

fn upload_dir<R: RemoteFs>(
    remote: &mut R,
    remote_base: &str,
    local_dir: &Path,
    relative: String,
    report: &mut UploadReport,
) {
    debug!("listing {}", local_dir.display());
    match fs::read_dir(local_dir) {
        Ok(entries) => upload_entries(remote, remote_base, local_dir, entries, relative, report),
        Err(e) => {
            let target = remote::join(remote_base, &relative);
            report.fail(target, Error::io(local_dir, e));
        }
    }
}

fn upload_entries<R: RemoteFs>(
    remote: &mut R,
    remote_base: &str,
    local_dir: &Path,
    entries: fs::ReadDir,
    relative: String,
    report: &mut UploadReport,
) {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let target = remote::join(remote_base, &relative);
                report.fail(target, Error::io(local_dir, e));
                continue;
            }
        };
        let local_path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let child_relative = remote::join(&relative, &name);
        let target = remote::join(remote_base, &child_relative);

        let meta = match fs::metadata(&local_path) {
            Ok(meta) => meta,
            Err(e) => {
                report.fail(target, Error::io(&local_path, e));
                continue;
            }
        };

        if meta.is_file() {
            upload_file(remote, &local_path, &target, report);
        } else if meta.is_dir() {
            match remote.make_dir(&target) {
                Ok(()) => {
                    debug!("created directory {target}");
                    report.dirs_created += 1;
                }
                Err(source) => report.fail(
                    target.clone(),
                    Error::DirectoryOp {
                        op: DirOp::Create,
                        path: target,
                        source,
                    },
                ),
            }
            upload_dir(remote, remote_base, &local_path, child_relative, report);
        } else {
            debug!("skipping special file {}", local_path.display());
        }
    }
}

fn upload_file<R: RemoteFs>(
    remote: &mut R,
    local_path: &Path,
    target: &str,
    report: &mut UploadReport,
) {
    debug!("uploading {} to {target}", local_path.display());
    let mut file = match fs::File::open(local_path) {
        Ok(file) => file,
        Err(e) => {
            report.fail(target, Error::io(local_path, e));
            return;
        }
    };
    match remote.store(target, &mut file) {
        Ok(bytes) => {
            report.files_uploaded += 1;
            report.bytes_uploaded += bytes;
        }
        Err(source) => report.fail(
            target,
            Error::Transfer {
                path: target.to_string(),
                source,
            },
        ),
    }
}
