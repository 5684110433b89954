use crate::retention::{BackupSetSource, LocalBackupSets, RetentionReport, enforce_retention};
use anyhow::{Context, Result, anyhow};

pub fn run(args: &[String]) -> Result<()> {
    let mut args = args.to_vec();
    let json = super::take_flag(&mut args, "--json");
    let dry_run = super::take_flag(&mut args, "--dry-run");
    let keep = super::take_option(&mut args, "--keep")?
        .map(|v| v.parse::<i32>().with_context(|| format!("--keep expects an integer, got '{v}'")))
        .transpose()?;
    if !args.is_empty() {
        return Err(anyhow!("Usage: ftpbackup prune [--json] [--dry-run] [--keep N]"));
    }

    let cfg = super::cli_config()?;
    let max_stored_full = keep.unwrap_or(cfg.max_stored_full);
    let source = LocalBackupSets::new(cfg.backup_root()?);

    if dry_run {
        return print_plan(&source, max_stored_full);
    }

    let connector = cfg.connector()?;
    let report = enforce_retention(&connector, max_stored_full, &source, cfg.remote_path()?)
        .with_context(|| format!("pruning backups from '{}' failed", source.root().display()))?;

    if json {
        super::print_json(&report);
    } else {
        print_summary(&report);
    }
    super::check_failures(&report.removal.failures)
}

pub fn print_summary(report: &RetentionReport) {
    if report.removed_sets.is_empty() {
        println!("Nothing to prune ({} backup sets kept)", report.remaining);
        return;
    }
    for name in &report.removed_sets {
        println!("Removed '{}'", name);
    }
    println!(
        "{} backup sets removed ({} files, {} directories), {} kept",
        report.removed_sets.len(),
        report.removal.files_deleted,
        report.removal.dirs_removed,
        report.remaining
    );
    super::print_failures(&report.removal.failures);
}

/// Lists what a prune would remove without connecting.
fn print_plan(source: &LocalBackupSets, max_stored_full: i32) -> Result<()> {
    let sets = source.backup_sets()?;
    let doomed = plan(sets.len(), max_stored_full);
    for set in &sets[..doomed] {
        println!("would remove '{}'", set.name());
    }
    println!("{} of {} backup sets would be removed", doomed, sets.len());
    Ok(())
}

fn plan(count: usize, max_stored_full: i32) -> usize {
    match usize::try_from(max_stored_full) {
        Ok(max) if max > 0 => count.saturating_sub(max),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::plan;

    #[test]
    fn plan_matches_retention_rules() {
        assert_eq!(plan(5, 3), 2);
        assert_eq!(plan(2, 3), 0);
        assert_eq!(plan(5, 0), 0);
        assert_eq!(plan(5, -2), 0);
    }
}
