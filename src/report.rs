//! Final simulation report

use std::fmt;
use std::path::Path;

use crate::config::{LevelConfig, SimConfig};
use crate::error::SimulatorResult;
use crate::memory::cache::{CacheLevel, LevelStats};
use crate::memory::hierarchy::Hierarchy;

/// Counters and final contents of one level
#[derive(Clone, Debug, PartialEq)]
pub struct LevelReport {
    pub stats: LevelStats,
    /// Per set, (tag, dirty) head first
    pub contents: Vec<Vec<(u64, bool)>>,
}

impl LevelReport {
    pub fn make(level: &CacheLevel) -> Self {
        let contents = level
            .sets()
            .iter()
            .map(|set| set.blocks().map(|b| (b.tag, b.dirty)).collect())
            .collect();
        Self { stats: *level.stats(), contents }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    pub config: SimConfig,
    pub trace_name: String,
    pub l1: LevelReport,
    pub l2: Option<LevelReport>,
}

impl Report {
    pub fn make(
        config: &SimConfig,
        trace_name: impl Into<String>,
        hierarchy: &Hierarchy,
    ) -> Self {
        Self {
            config: *config,
            trace_name: trace_name.into(),
            l1: LevelReport::make(hierarchy.l1()),
            l2: hierarchy.l2().map(LevelReport::make),
        }
    }

    pub fn l1_miss_rate(&self) -> f64 {
        self.l1.stats.get_miss_rate()
    }

    /// L2 misses of either kind per L2 read, 0 without reads
    pub fn l2_miss_rate(&self) -> f64 {
        match &self.l2 {
            Some(l2) if l2.stats.reads > 0 => {
                l2.stats.misses() as f64 / l2.stats.reads as f64
            }
            _ => 0.0,
        }
    }

    /// Writes reaching L2, counted as the writebacks L1 sends down
    pub fn l2_writes(&self) -> u64 {
        self.l2.as_ref().map_or(0, |_| self.l1.stats.writebacks)
    }

    /// Blocks moved between the hierarchy and main memory
    pub fn memory_traffic(&self) -> u64 {
        match &self.l2 {
            Some(l2) => l2.stats.read_misses + l2.stats.writebacks,
            None => {
                let l1 = &self.l1.stats;
                l1.read_misses + l1.write_misses + l1.writebacks
            }
        }
    }

    const CSV_HEADER: [&'static str; 21] = [
        "block_size",
        "l1_size",
        "l1_assoc",
        "l2_size",
        "l2_assoc",
        "replacement",
        "inclusion",
        "trace",
        "l1_reads",
        "l1_read_misses",
        "l1_writes",
        "l1_write_misses",
        "l1_writebacks",
        "l2_reads",
        "l2_read_misses",
        "l2_writes",
        "l2_write_misses",
        "l2_writebacks",
        "l1_miss_rate",
        "l2_miss_rate",
        "memory_traffic",
    ];

    /// Write the raw results as a single CSV row under a header
    pub fn write_csv(&self, path: impl AsRef<Path>) -> SimulatorResult<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(Self::CSV_HEADER)?;

        let l2 = self.l2.as_ref().map(|l2| l2.stats).unwrap_or_default();
        let l2_config = self.config.l2.unwrap_or(LevelConfig::make(0, 0));
        let l1 = &self.l1.stats;
        writer.write_record([
            self.config.block_size.to_string(),
            self.config.l1.size.to_string(),
            self.config.l1.associativity.to_string(),
            l2_config.size.to_string(),
            l2_config.associativity.to_string(),
            self.config.replacement.to_string(),
            self.config.inclusion.to_string(),
            self.trace_name.clone(),
            l1.reads.to_string(),
            l1.read_misses.to_string(),
            l1.writes.to_string(),
            l1.write_misses.to_string(),
            l1.writebacks.to_string(),
            l2.reads.to_string(),
            l2.read_misses.to_string(),
            l2.writes.to_string(),
            l2.write_misses.to_string(),
            l2.writebacks.to_string(),
            format!("{:.6}", self.l1_miss_rate()),
            format!("{:.6}", self.l2_miss_rate()),
            self.memory_traffic().to_string(),
        ])?;
        writer.flush()?;
        Ok(())
    }
}

fn write_contents(
    f: &mut fmt::Formatter<'_>,
    contents: &[Vec<(u64, bool)>],
) -> fmt::Result {
    for (index, set) in contents.iter().enumerate() {
        write!(f, "Set\t{}:\t", index)?;
        for (tag, dirty) in set {
            write!(f, "{:x} {}\t", tag, if *dirty { "D" } else { " " })?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = &self.config;
        let (l2_size, l2_assoc) =
            config.l2.map_or((0, 0), |l2| (l2.size, l2.associativity));

        writeln!(f, "===== Simulator configuration =====")?;
        writeln!(f, "BLOCKSIZE:\t\t{}", config.block_size)?;
        writeln!(f, "L1_SIZE:\t\t{}", config.l1.size)?;
        writeln!(f, "L1_ASSOC:\t\t{}", config.l1.associativity)?;
        writeln!(f, "L2_SIZE:\t\t{}", l2_size)?;
        writeln!(f, "L2_ASSOC:\t\t{}", l2_assoc)?;
        writeln!(f, "REPLACEMENT POLICY:\t{}", config.replacement)?;
        writeln!(f, "INCLUSION PROPERTY:\t{}", config.inclusion)?;
        writeln!(f, "trace_file:\t\t{}", self.trace_name)?;

        writeln!(f, "===== L1 contents =====")?;
        write_contents(f, &self.l1.contents)?;
        if let Some(l2) = &self.l2 {
            writeln!(f, "===== L2 contents =====")?;
            write_contents(f, &l2.contents)?;
        }

        let l1 = &self.l1.stats;
        let l2 = self.l2.as_ref().map(|l2| l2.stats).unwrap_or_default();
        writeln!(f, "===== Simulation results (raw) =====")?;
        writeln!(f, "a. number of L1 reads:\t\t{}", l1.reads)?;
        writeln!(f, "b. number of L1 read misses:\t{}", l1.read_misses)?;
        writeln!(f, "c. number of L1 writes:\t\t{}", l1.writes)?;
        writeln!(f, "d. number of L1 write misses:\t{}", l1.write_misses)?;
        writeln!(f, "e. L1 miss rate:\t\t{:.6}", self.l1_miss_rate())?;
        writeln!(f, "f. number of L1 writebacks:\t{}", l1.writebacks)?;
        writeln!(f, "g. number of L2 reads:\t\t{}", l2.reads)?;
        writeln!(f, "h. number of L2 read misses:\t{}", l2.read_misses)?;
        writeln!(f, "i. number of L2 writes:\t\t{}", self.l2_writes())?;
        writeln!(f, "j. number of L2 write misses:\t{}", l2.write_misses)?;
        if self.l2.is_some() {
            writeln!(f, "k. L2 miss rate:\t\t{:.6}", self.l2_miss_rate())?;
        } else {
            writeln!(f, "k. L2 miss rate:\t\t0")?;
        }
        writeln!(f, "l. number of L2 writebacks:\t{}", l2.writebacks)?;
        writeln!(f, "m. total memory traffic:\t{}", self.memory_traffic())
    }
}
