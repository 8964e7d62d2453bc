use querylog_analyzer::parser::{CountProcessor, QueryLogParser};
use std::fs;
use tempfile::TempDir;

mod common;

use common::{log_line, write_log};

#[test]
fn test_line_accounting_holds_for_mixed_input() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        log_line("2024-05-01T08:00:00Z", "10.0.0.5", "a.com", 1_000_000),
        String::new(),
        "not json at all".to_string(),
        "[1, 2, 3]".to_string(),
        r#"{"T":"2024-05-01T08:00:00Z","IP":"10.0.0.5","QH":"a.com"}"#.to_string(),
        r#"{"T":"2024-05-01T08:00:00Z","IP":"10.0.0.5","QH":"a.com","Elapsed":"fast"}"#.to_string(),
        r#"{"T":"yesterday","IP":"10.0.0.5","QH":"a.com","Elapsed":1}"#.to_string(),
        log_line("2024-05-01T09:00:00.123456789+02:00", "10.0.0.6", "b.com", 2_500_000),
    ];
    let path = write_log(temp_dir.path(), "querylog.json", &lines);

    let parsed = QueryLogParser::new().parse_file(&path).unwrap();

    assert_eq!(parsed.total_lines, 8);
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.malformed_lines, 6);
    assert_eq!(parsed.records.len() + parsed.malformed_lines, parsed.total_lines);
    assert_eq!(parsed.records[1].response_ms, 2.5);
}

#[test]
fn test_bad_timestamp_line_is_counted_not_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let lines = vec![
        log_line("2024-05-01T08:00:00Z", "10.0.0.5", "a.com", 1_000_000),
        r#"{"T":"bad"}"#.to_string(),
        log_line("2024-05-01T08:05:00Z", "10.0.0.5", "b.com", 1_000_000),
    ];
    let path = write_log(temp_dir.path(), "querylog.json", &lines);

    let parsed = QueryLogParser::new().parse_file(&path).unwrap();

    assert_eq!(parsed.malformed_lines, 1);
    assert_eq!(parsed.records.len(), 2);
    assert_eq!(parsed.records[0].domain, "a.com");
    assert_eq!(parsed.records[1].domain, "b.com");
}

#[test]
fn test_parsing_same_bytes_twice_is_identical() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_log(temp_dir.path(), "querylog.json", &common::sample_day());
    let parser = QueryLogParser::new();

    let first = parser.parse_file(&path).unwrap();
    let second = parser.parse_file(&path).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_invalid_utf8_line_is_malformed() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("querylog.json");
    let mut bytes = log_line("2024-05-01T08:00:00Z", "10.0.0.5", "a.com", 1_000_000).into_bytes();
    bytes.extend_from_slice(b"\n\xff\xfe garbage\n");
    fs::write(&path, bytes).unwrap();

    let parsed = QueryLogParser::new().parse_file(&path).unwrap();

    assert_eq!(parsed.records.len(), 1);
    assert_eq!(parsed.malformed_lines, 1);
}

#[test]
fn test_missing_file_is_source_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let result = QueryLogParser::new().parse_file(&temp_dir.path().join("absent.json"));

    assert!(result.unwrap_err().is_source_unavailable());
}

#[test]
fn test_count_processor_matches_collector() {
    let temp_dir = TempDir::new().unwrap();
    let mut lines = common::sample_day();
    lines.push("{broken json line that should be skipped}".to_string());
    let path = write_log(temp_dir.path(), "querylog.json", &lines);
    let parser = QueryLogParser::new();

    let (valid, malformed) = parser.process_file(&path, CountProcessor::new()).unwrap();
    let parsed = parser.parse_file(&path).unwrap();

    assert_eq!(valid, parsed.records.len());
    assert_eq!(malformed, parsed.malformed_lines);
}
