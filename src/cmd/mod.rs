pub mod help;
pub mod prune;
pub mod upload;

use crate::config::AppConfig;
use crate::error::Failure;
use anyhow::{Result, anyhow};
use serde::Serialize;

pub fn cli_config() -> Result<AppConfig> {
    AppConfig::load()
}

/// Removes every occurrence of `flag` from `args`, reporting whether it was present.
pub fn take_flag(args: &mut Vec<String>, flag: &str) -> bool {
    let before = args.len();
    args.retain(|a| a != flag);
    args.len() != before
}

/// Removes `flag <value>` from `args` and returns the value.
pub fn take_option(args: &mut Vec<String>, flag: &str) -> Result<Option<String>> {
    let Some(i) = args.iter().position(|a| a == flag) else {
        return Ok(None);
    };
    if i + 1 >= args.len() {
        return Err(anyhow!("{flag} requires a value"));
    }
    let value = args.remove(i + 1);
    args.remove(i);
    Ok(Some(value))
}

pub fn print_json<T: Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".into());
    println!("{}", json);
}

pub fn print_failures(failures: &[Failure]) {
    for f in failures {
        eprintln!("  failed: {}", f.error);
    }
}

/// Turns a best-effort report into the process outcome.
pub fn check_failures(failures: &[Failure]) -> Result<()> {
    match failures.len() {
        0 => Ok(()),
        1 => Err(anyhow!("1 item failed")),
        n => Err(anyhow!("{n} items failed")),
    }
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * KB;
    const GB: u64 = 1024 * MB;
    const TB: u64 = 1024 * GB;

    if bytes >= TB {
        format!("{:.1} TB", bytes as f64 / TB as f64)
    } else if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
