use crate::error::{Error, Result};
use crate::remote::{self, Connector};
use crate::remove::{RemovalReport, remove_tree};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const FULL_PREFIX: &str = "FULL-";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// One full backup, identified by its directory name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSet {
    name: String,
    created: NaiveDateTime,
}

impl BackupSet {
    pub fn new(name: impl Into<String>, created: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            created,
        }
    }

    /// Directory name of the set relative to the backup root.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created(&self) -> NaiveDateTime {
        self.created
    }

    /// Parses `FULL-YYYY-MM-DD_HH-MM`; anything else, including dates that do
    /// not exist, is not a backup set.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        let stamp = name.strip_prefix(FULL_PREFIX)?;
        let created = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).ok()?;
        Some(Self::new(name, created))
    }
}

/// Supplies the valid backup sets, oldest first.
pub trait BackupSetSource {
    fn backup_sets(&self) -> Result<Vec<BackupSet>>;
}

/// Backup sets found as `FULL-*` directories directly under `root`.
#[derive(Debug, Clone)]
pub struct LocalBackupSets {
    root: PathBuf,
}

impl LocalBackupSets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BackupSetSource for LocalBackupSets {
    fn backup_sets(&self) -> Result<Vec<BackupSet>> {
        let entries = fs::read_dir(&self.root).map_err(|e| Error::io(&self.root, e))?;

        let mut sets = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let name = entry.file_name().to_string_lossy().into_owned();
            match BackupSet::from_dir_name(&name) {
                Some(set) if is_dir => sets.push(set),
                _ => debug!("ignoring {name} in {}", self.root.display()),
            }
        }
        sets.sort_by_key(BackupSet::created);
        Ok(sets)
    }
}

impl BackupSetSource for [BackupSet] {
    fn backup_sets(&self) -> Result<Vec<BackupSet>> {
        Ok(self.to_vec())
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RetentionReport {
    pub removed_sets: Vec<String>,
    pub remaining: usize,
    pub removal: RemovalReport,
}

/// Removes the oldest remote backup sets until at most `max_stored_full`
/// remain. A non-positive maximum disables retention without connecting.
pub fn enforce_retention<C, S>(
    connector: &C,
    max_stored_full: i32,
    source: &S,
    remote_backup_path: &str,
) -> Result<RetentionReport>
where
    C: Connector,
    S: BackupSetSource + ?Sized,
{
    let Ok(max) = usize::try_from(max_stored_full) else {
        debug!("retention disabled (max_stored_full = {max_stored_full})");
        return Ok(RetentionReport::default());
    };
    if max == 0 {
        debug!("retention disabled (max_stored_full = 0)");
        return Ok(RetentionReport::default());
    }

    let mut session = connector.open()?;
    debug!("removing superfluous backup sets");

    let mut sets: VecDeque<BackupSet> = match source.backup_sets() {
        Ok(sets) => sets.into(),
        Err(e) => {
            remote::release(session);
            return Err(e);
        }
    };

    let mut report = RetentionReport::default();
    while sets.len() > max {
        let Some(oldest) = sets.pop_front() else { break };
        info!("removing backup set {}", oldest.name());
        report
            .removal
            .absorb(remove_tree(&mut session, remote_backup_path, oldest.name()));
        report.removed_sets.push(oldest.name);
    }
    report.remaining = sets.len();

    remote::release(session);
    info!(
        "removed {} superfluous backup sets, {} remain",
        report.removed_sets.len(),
        report.remaining
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryFs;
    use tempfile::TempDir;

    /// Sets one day apart, in the given order.
    fn sets(names: &[&str]) -> Vec<BackupSet> {
        let start = NaiveDateTime::parse_from_str("2024-01-01_10-00", TIMESTAMP_FORMAT).unwrap();
        names
            .iter()
            .zip(0..)
            .map(|(n, day)| BackupSet::new(*n, start + chrono::Duration::days(day)))
            .collect()
    }

    fn remote_with(names: &[&str]) -> MemoryFs {
        let mut remote = MemoryFs::new().with_dirs(&["/backups"]);
        for n in names {
            let set_dir = format!("/backups/{n}");
            let jobs_dir = format!("{set_dir}/jobs");
            remote = remote
                .with_dirs(&[set_dir.as_str(), jobs_dir.as_str()])
                .with_file(&format!("/backups/{n}/config.xml"), b"<hudson/>")
                .with_file(&format!("/backups/{n}/jobs/build.xml"), b"<build/>");
        }
        remote
    }

    struct FailingSource;

    impl BackupSetSource for FailingSource {
        fn backup_sets(&self) -> Result<Vec<BackupSet>> {
            Err(Error::io(
                "/nowhere",
                std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            ))
        }
    }

    #[test]
    fn removes_oldest_sets_beyond_maximum() {
        let names = ["set1", "set2", "set3", "set4", "set5"];
        let remote = remote_with(&names);

        let report = enforce_retention(&remote, 3, sets(&names).as_slice(), "/backups").unwrap();

        assert_eq!(report.removed_sets, vec!["set1", "set2"]);
        assert_eq!(report.remaining, 3);
        assert!(report.removal.failures.is_empty());
        assert!(!remote.exists("/backups/set1"));
        assert!(!remote.exists("/backups/set2"));
        for kept in ["set3", "set4", "set5"] {
            assert!(remote.exists(&format!("/backups/{kept}/jobs/build.xml")));
        }
        assert_eq!(remote.opens(), 1);
        assert_eq!(remote.closes(), 1);
    }

    #[test]
    fn nothing_removed_within_limit() {
        let names = ["set1", "set2"];
        let remote = remote_with(&names);

        let report = enforce_retention(&remote, 2, sets(&names).as_slice(), "/backups").unwrap();

        assert!(report.removed_sets.is_empty());
        assert_eq!(report.remaining, 2);
        assert!(remote.ops().iter().all(|o| !o.starts_with("RMD") && !o.starts_with("DELE")));
        assert_eq!(remote.closes(), 1);
    }

    #[test]
    fn non_positive_maximum_never_connects() {
        let names = ["set1", "set2", "set3"];
        let remote = remote_with(&names);

        for max in [0, -1, i32::MIN] {
            let report =
                enforce_retention(&remote, max, sets(&names).as_slice(), "/backups").unwrap();
            assert!(report.removed_sets.is_empty());
        }
        assert_eq!(remote.opens(), 0);
        assert!(remote.ops().is_empty());
    }

    #[test]
    fn partial_removal_does_not_stop_the_loop() {
        let names = ["set1", "set2", "set3"];
        let remote = remote_with(&names).fail_on("/backups/set1/config.xml");

        let report = enforce_retention(&remote, 1, sets(&names).as_slice(), "/backups").unwrap();

        assert_eq!(report.removed_sets, vec!["set1", "set2"]);
        assert!(remote.exists("/backups/set1/config.xml"));
        assert!(!remote.exists("/backups/set2"));
        assert!(remote.exists("/backups/set3"));
        assert_eq!(report.removal.failures.len(), 2);
        assert_eq!(remote.closes(), 1);
    }

    #[test]
    fn source_failure_still_closes_session() {
        let remote = remote_with(&[]);

        let err = enforce_retention(&remote, 1, &FailingSource, "/backups").unwrap_err();

        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(remote.opens(), 1);
        assert_eq!(remote.closes(), 1);
    }

    #[test]
    fn dir_name_must_be_full_with_timestamp() {
        assert!(BackupSet::from_dir_name("FULL-2024-01-15_10-30").is_some());
        assert!(BackupSet::from_dir_name("DIFF-2024-01-15_10-30").is_none());
        assert!(BackupSet::from_dir_name("FULL-2024-01-15").is_none());
        assert!(BackupSet::from_dir_name("FULL-2024-01-15_1O-30").is_none());
        assert!(BackupSet::from_dir_name("notes.txt").is_none());
    }

    #[test]
    fn impossible_dates_are_not_backup_sets() {
        assert!(BackupSet::from_dir_name("FULL-9999-99-99_99-99").is_none());
        assert!(BackupSet::from_dir_name("FULL-2024-13-45_25-61").is_none());
        assert!(BackupSet::from_dir_name("FULL-2023-02-29_10-00").is_none());
        assert!(BackupSet::from_dir_name("FULL-2024-02-29_10-00").is_some());
    }

    #[test]
    fn impossible_dates_do_not_count_towards_the_maximum() {
        let tmp = TempDir::new().unwrap();
        let names = ["FULL-2024-01-01_10-00", "FULL-2024-02-01_10-00", "FULL-9999-99-99_99-99"];
        for dir in names {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        let remote = remote_with(&names);

        let source = LocalBackupSets::new(tmp.path());
        let report = enforce_retention(&remote, 2, &source, "/backups").unwrap();

        assert!(report.removed_sets.is_empty());
        assert_eq!(report.remaining, 2);
        assert!(remote.exists("/backups/FULL-2024-01-01_10-00/config.xml"));
        assert!(remote.ops().iter().all(|o| !o.starts_with("RMD") && !o.starts_with("DELE")));
    }

    #[test]
    fn local_sets_are_sorted_oldest_first() {
        let tmp = TempDir::new().unwrap();
        for dir in [
            "FULL-2024-03-01_08-00",
            "FULL-2023-12-31_23-59",
            "DIFF-2024-03-02_08-00",
            "FULL-2024-01-15_10-30",
            "scratch",
        ] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("FULL-2025-01-01_00-00"), "not a dir").unwrap();

        let found = LocalBackupSets::new(tmp.path()).backup_sets().unwrap();

        let names: Vec<&str> = found.iter().map(BackupSet::name).collect();
        assert_eq!(
            names,
            vec!["FULL-2023-12-31_23-59", "FULL-2024-01-15_10-30", "FULL-2024-03-01_08-00"]
        );
        assert!(found.windows(2).all(|w| w[0].created() < w[1].created()));
    }

    #[test]
    fn missing_local_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let err = LocalBackupSets::new(tmp.path().join("missing")).backup_sets().unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
