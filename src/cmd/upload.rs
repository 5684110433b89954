use crate::retention::{LocalBackupSets, enforce_retention};
use crate::upload::upload_backup;
use anyhow::{Context, Result, anyhow};
use std::path::PathBuf;

pub fn run(args: &[String]) -> Result<()> {
    let mut args = args.to_vec();
    let json = super::take_flag(&mut args, "--json");
    let prune = super::take_flag(&mut args, "--prune");

    let [dir] = args.as_slice() else {
        return Err(anyhow!("Usage: ftpbackup upload [--json] [--prune] <backup_dir>"));
    };

    let cfg = super::cli_config()?;
    let backup_dir = resolve_backup_dir(dir, cfg.backup_root.as_deref());
    if !backup_dir.is_dir() {
        return Err(anyhow!("'{}' is not a directory", backup_dir.display()));
    }

    let connector = cfg.connector()?;
    let remote_path = cfg.remote_path()?;
    let report = upload_backup(&connector, remote_path, &backup_dir)
        .with_context(|| format!("upload of '{}' failed", backup_dir.display()))?;

    if json {
        super::print_json(&report);
    } else {
        println!(
            "{} -> {}: {} files ({}), {} directories created",
            backup_dir.display(),
            report.remote_base,
            report.files_uploaded,
            super::format_size(report.bytes_uploaded),
            report.dirs_created
        );
        super::print_failures(&report.failures);
    }
    super::check_failures(&report.failures)?;

    if prune {
        let root = cfg.backup_root()?;
        let retention = enforce_retention(
            &connector,
            cfg.max_stored_full,
            &LocalBackupSets::new(root),
            remote_path,
        )?;
        if json {
            super::print_json(&retention);
        } else {
            super::prune::print_summary(&retention);
        }
        super::check_failures(&retention.removal.failures)?;
    }
    Ok(())
}

/// A bare set name is looked up under the configured backup root.
fn resolve_backup_dir(arg: &str, backup_root: Option<&std::path::Path>) -> PathBuf {
    let direct = PathBuf::from(arg);
    match backup_root {
        Some(root) if !direct.exists() && direct.components().count() == 1 => root.join(arg),
        _ => direct,
    }
}
