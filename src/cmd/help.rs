use anyhow::Result;

const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

pub fn run() -> Result<()> {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{BOLD}{CYAN}ftpbackup{RESET} {DIM}v{version}{RESET}  {DIM}─{RESET}  Mirror backup sets to FTP and prune old ones"
    );
    println!();
    println!("{BOLD}Usage:{RESET}  {GREEN}ftpbackup{RESET} {DIM}<command> [args...]{RESET}");
    println!();
    println!("{BOLD}Commands:{RESET}");

    let commands: &[(&str, &str)] = &[
        ("upload [--prune] <dir>",  "Upload a backup directory (then prune with --prune)"),
        ("prune [--keep N]",        "Remove the oldest remote backup sets"),
        ("prune --dry-run",         "Show which sets a prune would remove"),
        ("help",                    "Show this help message"),
    ];

    for (cmd, desc) in commands {
        let (name, args) = match cmd.find(' ') {
            Some(i) => (&cmd[..i], &cmd[i..]),
            None => (*cmd, ""),
        };
        println!(
            "  {GREEN}{name}{RESET}{DIM}{args}{RESET}  {:>width$}{DIM}{desc}{RESET}",
            "",
            width = 26usize.saturating_sub(cmd.len()),
        );
    }

    println!();
    println!("{BOLD}Options:{RESET}");
    println!("  {GREEN}--json{RESET}                         Print the report as JSON");
    println!("  {GREEN}-h{RESET}, {GREEN}--help{RESET}                     Show this help message");
    println!("  {GREEN}-V{RESET}, {GREEN}--version{RESET}                  Show version");
    println!();
    println!("{BOLD}Configuration:{RESET}  {DIM}~/.config/ftpbackup/config.toml, FTPBACKUP_* env vars{RESET}");
    println!("{BOLD}Logging:{RESET}        {DIM}FTPBACKUP_LOG=debug{RESET}");

    Ok(())
}
