// Failure timeline data.
// Per-run failure records and the dense date x job matrix built from them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, Utc};

use crate::github::Job;

/// Failed jobs of one run, dated by the run's creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    pub jobs: Vec<Job>,
}

/// Failure counts with one row per job name and one column per day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimelineMatrix {
    /// Sorted ascending.
    pub dates: Vec<NaiveDate>,
    /// Sorted ascending.
    pub jobs: Vec<String>,
    /// `counts[job][date]`, zero where a job did not fail that day.
    pub counts: Vec<Vec<u64>>,
}

impl TimelineMatrix {
    /// Bucket every failed job by the day it started.
    /// Jobs without a start time fall back to their run's date.
    pub fn from_entries(entries: &[TimelineEntry]) -> Self {
        let mut daily: BTreeMap<(String, NaiveDate), u64> = BTreeMap::new();
        let mut dates = BTreeSet::new();
        let mut jobs = BTreeSet::new();

        for entry in entries {
            for job in &entry.jobs {
                let day = job.started_at.unwrap_or(entry.date).date_naive();
                dates.insert(day);
                jobs.insert(job.name.clone());
                *daily.entry((job.name.clone(), day)).or_insert(0) += 1;
            }
        }

        let dates: Vec<NaiveDate> = dates.into_iter().collect();
        let jobs: Vec<String> = jobs.into_iter().collect();
        let counts = jobs
            .iter()
            .map(|job| {
                dates
                    .iter()
                    .map(|day| daily.get(&(job.clone(), *day)).copied().unwrap_or(0))
                    .collect()
            })
            .collect();

        Self {
            dates,
            jobs,
            counts,
        }
    }

    pub fn max(&self) -> u64 {
        self.counts
            .iter()
            .flat_map(|row| row.iter().copied())
            .max()
            .unwrap_or(0)
    }
}
