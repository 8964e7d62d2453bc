#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

/// One query log line as AdGuard Home writes it, with the usual extra keys.
pub fn log_line(timestamp: &str, client_ip: &str, domain: &str, elapsed_ns: u64) -> String {
    format!(
        r#"{{"T":"{}","QH":"{}","QT":"A","QC":"IN","CP":"","Answer":"","IP":"{}","Result":{{}},"Elapsed":{},"Upstream":"https://dns.example/dns-query"}}"#,
        timestamp, domain, client_ip, elapsed_ns
    )
}

/// Write `lines` as a JSONL file and return its path.
pub fn write_log(dir: &Path, filename: &str, lines: &[String]) -> PathBuf {
    let file_path = dir.join(filename);
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(&file_path, content).unwrap();
    file_path
}

/// A small day of traffic from three clients on 2024-05-01, plus one line
/// from the day before.
pub fn sample_day() -> Vec<String> {
    vec![
        log_line("2024-04-30T09:00:00+02:00", "10.0.0.5", "old.example", 1_000_000),
        log_line("2024-05-01T06:59:59+02:00", "10.0.0.5", "early.example", 2_000_000),
        log_line("2024-05-01T07:00:00+02:00", "10.0.0.5", "a.com", 1_000_000),
        log_line("2024-05-01T08:15:00+02:00", "10.0.0.5", "a.com", 3_000_000),
        log_line("2024-05-01T08:45:00+02:00", "10.0.0.7", "b.com", 4_000_000),
        log_line("2024-05-01T11:30:00+02:00", "10.0.0.5", "c.com", 2_000_000),
        log_line("2024-05-01T14:00:00+02:00", "10.0.0.9", "b.com", 1_500_000),
        log_line("2024-05-01T14:00:01+02:00", "10.0.0.9", "late.example", 1_000_000),
        log_line("2024-05-01T22:10:00+02:00", "10.0.0.7", "b.com", 6_000_000),
    ]
}

/// Names of the `.xlsx` files in `dir`, sorted.
pub fn xlsx_files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".xlsx"))
        .collect();
    names.sort();
    names
}
