use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{RawEntry, Record, NANOS_PER_MILLI};
use crate::timestamp_parser::TimestampParser;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Output of one pass over a query log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    pub malformed_lines: usize,
    pub total_lines: usize,
}

/// Why a line was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedLine {
    Blank,
    NotUtf8,
    /// Not JSON, not an object, or a required key is missing or mistyped
    Shape(String),
    Timestamp(String),
}

// Trait for custom JSONL processing
pub trait JsonlProcessor {
    type Output;

    fn process_record(&mut self, record: Record, line_number: usize);
    fn process_malformed(&mut self, reason: MalformedLine, line_number: usize);
    fn finalize(self, total_lines: usize) -> Self::Output;
}

pub struct QueryLogParser {}

impl Default for QueryLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLogParser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a whole query log file into records.
    pub fn parse_file(&self, file_path: &Path) -> AnalysisResult<ParsedLog> {
        let parsed = self
            .process_file(file_path, CollectorProcessor::new())
            .map_err(|e| AnalysisError::source_unavailable(file_path, e))?;

        info!(
            file = %file_path.display(),
            records = parsed.records.len(),
            malformed = parsed.malformed_lines,
            "Parsed query log"
        );
        if parsed.malformed_lines > 0 {
            warn!(
                malformed = parsed.malformed_lines,
                "Skipped malformed or non-query lines"
            );
        }

        Ok(parsed)
    }

    // Generic method that accepts any processor
    pub fn process_file<P: JsonlProcessor>(&self, file_path: &Path, processor: P) -> io::Result<P::Output> {
        let file = File::open(file_path)?;
        self.process_reader(BufReader::new(file), processor)
    }

    pub fn parse_reader<R: BufRead>(&self, reader: R) -> io::Result<ParsedLog> {
        self.process_reader(reader, CollectorProcessor::new())
    }

    /// Feed every line of `reader` to `processor`. Only I/O failures abort;
    /// bad lines are handed to the processor and skipped.
    pub fn process_reader<R: BufRead, P: JsonlProcessor>(
        &self,
        mut reader: R,
        mut processor: P,
    ) -> io::Result<P::Output> {
        let mut buf = Vec::new();
        let mut line_number = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;

            match self.parse_line_bytes(&buf) {
                Ok(record) => processor.process_record(record, line_number),
                Err(reason) => {
                    debug!(line = line_number, reason = ?reason, "Skipping malformed line");
                    processor.process_malformed(reason, line_number);
                }
            }
        }

        Ok(processor.finalize(line_number))
    }

    fn parse_line_bytes(&self, bytes: &[u8]) -> Result<Record, MalformedLine> {
        let line = std::str::from_utf8(bytes).map_err(|_| MalformedLine::NotUtf8)?;
        self.parse_line(line)
    }

    /// Decode one line into a [`Record`].
    pub fn parse_line(&self, line: &str) -> Result<Record, MalformedLine> {
        let line = line.trim();
        if line.is_empty() {
            return Err(MalformedLine::Blank);
        }

        // Decode as an object first so JSON arrays never satisfy the struct
        let object: Map<String, Value> =
            serde_json::from_str(line).map_err(|e| MalformedLine::Shape(e.to_string()))?;
        let entry = RawEntry::deserialize(Value::Object(object))
            .map_err(|e| MalformedLine::Shape(e.to_string()))?;
        let timestamp = TimestampParser::parse(&entry.timestamp)
            .map_err(|_| MalformedLine::Timestamp(entry.timestamp.clone()))?;

        Ok(Record {
            timestamp,
            client_ip: entry.client_ip,
            domain: entry.query_host,
            response_ms: entry.elapsed / NANOS_PER_MILLI,
        })
    }
}

// Default processor that collects all records into a ParsedLog
pub struct CollectorProcessor {
    records: Vec<Record>,
    malformed: usize,
}

impl Default for CollectorProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectorProcessor {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            malformed: 0,
        }
    }
}

impl JsonlProcessor for CollectorProcessor {
    type Output = ParsedLog;

    fn process_record(&mut self, record: Record, _line_number: usize) {
        self.records.push(record);
    }

    fn process_malformed(&mut self, _reason: MalformedLine, _line_number: usize) {
        self.malformed += 1;
    }

    fn finalize(self, total_lines: usize) -> Self::Output {
        ParsedLog {
            records: self.records,
            malformed_lines: self.malformed,
            total_lines,
        }
    }
}

/// Line accounting only: `(valid, malformed)`.
#[derive(Default)]
pub struct CountProcessor {
    valid: usize,
    malformed: usize,
}

impl CountProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JsonlProcessor for CountProcessor {
    type Output = (usize, usize);

    fn process_record(&mut self, _record: Record, _line_number: usize) {
        self.valid += 1;
    }

    fn process_malformed(&mut self, _reason: MalformedLine, _line_number: usize) {
        self.malformed += 1;
    }

    fn finalize(self, _total_lines: usize) -> Self::Output {
        (self.valid, self.malformed)
    }
}
