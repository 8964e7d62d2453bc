//! Aggregation Engine
//!
//! Computes the grouped statistics behind every report sheet from a
//! [`WindowedLog`]:
//!
//! - **Time blocks**: one row per non-empty three hour bucket, ascending
//! - **Scope summary**: a single row for one client, or one row per client
//!   sorted by address
//! - **Top domains**: the ten most queried domains
//!
//! All three are computed over the same scope-selected subset, so counts and
//! means always agree across sheets.
//!
//! ## Tie-breaking
//!
//! Every "most frequent" value (dominant domain, busiest hour, ranking order
//! among equal counts) resolves to the value seen first in a single
//! left-to-right pass over the records, which follow log order.

use crate::filter::WindowedLog;
use crate::models::*;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use tracing::debug;

/// Length of the domain ranking.
pub const TOP_DOMAINS_LIMIT: usize = 10;

/// Frequency counter that remembers first-seen order.
struct FirstSeenCounter<K> {
    index: HashMap<K, usize>,
    counts: Vec<(K, usize)>,
}

impl<K: Copy + Eq + Hash> FirstSeenCounter<K> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            counts: Vec::new(),
        }
    }

    fn tally(keys: impl IntoIterator<Item = K>) -> Self {
        let mut counter = Self::new();
        for key in keys {
            counter.add(key);
        }
        counter
    }

    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key, self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    /// Most frequent key; the earliest seen wins a tie.
    fn mode(&self) -> Option<K> {
        let mut best: Option<(K, usize)> = None;
        for &(key, count) in &self.counts {
            if best.map_or(true, |(_, top)| count > top) {
                best = Some((key, count));
            }
        }
        best.map(|(key, _)| key)
    }

    /// Keys by descending count, equal counts kept in first-seen order.
    fn ranked(mut self, limit: usize) -> Vec<(K, usize)> {
        // sort_by is stable
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts.truncate(limit);
        self.counts
    }
}

/// Statistics shared by every kind of summary row.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStats {
    pub count: usize,
    pub avg_response_ms: f64,
    pub most_accessed_domain: String,
    pub busiest_hour: u32,
}

impl GroupStats {
    /// `None` for an empty group, so a mode is never taken over nothing.
    pub fn compute(records: &[&WindowedRecord]) -> Option<Self> {
        if records.is_empty() {
            return None;
        }

        let total_ms: f64 = records.iter().map(|r| r.response_ms).sum();
        let domains = FirstSeenCounter::tally(records.iter().map(|r| r.domain.as_str()));
        let hours = FirstSeenCounter::tally(records.iter().map(|r| r.hour));

        Some(Self {
            count: records.len(),
            avg_response_ms: round2(total_ms / records.len() as f64),
            most_accessed_domain: domains.mode()?.to_string(),
            busiest_hour: hours.mode()?,
        })
    }
}

/// Scope-dependent summary table.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeSummary {
    Target(TargetSummary),
    Clients(Vec<ClientSummary>),
}

/// Everything the report assembler needs.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub scope: Scope,
    pub reference_date: NaiveDate,
    pub window_label: String,
    pub summary: ScopeSummary,
    pub time_blocks: Vec<BucketSummary>,
    pub top_domains: Vec<DomainCount>,
    /// The scope-selected records, in log order
    pub records: Vec<WindowedRecord>,
}

impl Aggregation {
    pub fn total_queries(&self) -> usize {
        self.records.len()
    }
}

pub struct Aggregator;

impl Aggregator {
    /// Aggregate a windowed log for `scope`.
    ///
    /// Returns `None` when a single-client scope names a client with no
    /// records in the window.
    pub fn aggregate(windowed: &WindowedLog, scope: &Scope) -> Option<Aggregation> {
        let subset: Vec<&WindowedRecord> = windowed
            .records
            .iter()
            .filter(|r| scope.includes(&r.client_ip))
            .collect();

        if subset.is_empty() {
            debug!(%scope, "No records for scope in window");
            return None;
        }

        let window_label = windowed.label();
        let summary = match scope {
            Scope::SingleEntity(target) => {
                let stats = GroupStats::compute(&subset)?;
                ScopeSummary::Target(TargetSummary {
                    client_ip: target.clone(),
                    time_range: window_label.clone(),
                    total_queries: stats.count,
                    avg_response_ms: stats.avg_response_ms,
                    most_accessed_domain: stats.most_accessed_domain,
                    busiest_hour: hour_label(stats.busiest_hour),
                })
            }
            Scope::AllEntities => ScopeSummary::Clients(Self::client_summaries(&subset)),
        };

        let aggregation = Aggregation {
            scope: scope.clone(),
            reference_date: windowed.reference_date,
            window_label,
            summary,
            time_blocks: Self::time_blocks(&subset),
            top_domains: Self::top_domains(&subset, TOP_DOMAINS_LIMIT),
            records: subset.into_iter().cloned().collect(),
        };

        debug!(
            %scope,
            records = aggregation.records.len(),
            time_blocks = aggregation.time_blocks.len(),
            "Aggregated window"
        );

        Some(aggregation)
    }

    /// One row per non-empty bucket, ascending by bucket.
    pub fn time_blocks(records: &[&WindowedRecord]) -> Vec<BucketSummary> {
        let mut buckets: BTreeMap<TimeBucket, Vec<&WindowedRecord>> = BTreeMap::new();
        for &record in records {
            buckets.entry(record.bucket()).or_default().push(record);
        }

        buckets
            .into_iter()
            .filter_map(|(bucket, group)| {
                let stats = GroupStats::compute(&group)?;
                Some(BucketSummary {
                    bucket,
                    label: bucket.label(),
                    query_count: stats.count,
                    avg_response_ms: stats.avg_response_ms,
                    top_domain: stats.most_accessed_domain,
                })
            })
            .collect()
    }

    /// One row per client address, ascending by address.
    pub fn client_summaries(records: &[&WindowedRecord]) -> Vec<ClientSummary> {
        let mut clients: BTreeMap<&str, Vec<&WindowedRecord>> = BTreeMap::new();
        for &record in records {
            clients.entry(record.client_ip.as_str()).or_default().push(record);
        }

        clients
            .into_iter()
            .filter_map(|(client_ip, group)| {
                let stats = GroupStats::compute(&group)?;
                Some(ClientSummary {
                    client_ip: client_ip.to_string(),
                    total_queries: stats.count,
                    avg_response_ms: stats.avg_response_ms,
                    most_accessed_domain: stats.most_accessed_domain,
                    busiest_hour: hour_label(stats.busiest_hour),
                })
            })
            .collect()
    }

    pub fn top_domains(records: &[&WindowedRecord], limit: usize) -> Vec<DomainCount> {
        FirstSeenCounter::tally(records.iter().map(|r| r.domain.as_str()))
            .ranked(limit)
            .into_iter()
            .map(|(domain, access_count)| DomainCount {
                domain: domain.to_string(),
                access_count,
            })
            .collect()
    }
}
