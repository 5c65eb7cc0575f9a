use crate::error::{BenchError, Result};
use rust_htslib::bam::HeaderView;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Half-open, 0-based genomic interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Region {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

/// A single 0-based position on a named sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Locus {
    pub chrom: String,
    pub pos: u64,
}

impl Locus {
    pub fn new(chrom: impl Into<String>, pos: u64) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}", self.chrom, self.pos)
    }
}

impl Region {
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Result<Self> {
        let chrom = chrom.into();
        if chrom.is_empty() {
            return Err(BenchError::region(
                format!(":{}-{}", start, end),
                "missing sequence name",
            ));
        }
        if start >= end {
            return Err(BenchError::region(
                format!("{}:{}-{}", chrom, start, end),
                "start must be before end",
            ));
        }
        Ok(Self { chrom, start, end })
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, locus: &Locus) -> bool {
        locus.chrom == self.chrom && locus.pos >= self.start && locus.pos < self.end
    }

    pub fn overlaps(&self, other: &Region) -> bool {
        self.chrom == other.chrom && self.start < other.end && other.start < self.end
    }

    /// Parses a samtools-style `chrom:start-end` string (1-based, inclusive).
    ///
    /// Symbolic sequence names can only be checked against a sequence dictionary,
    /// so one is required.
    pub fn parse_samtools(input: &str, dict: Option<&ContigDictionary>) -> Result<Self> {
        let dict = dict.ok_or_else(|| {
            BenchError::region(
                input,
                "a BAM header or FASTA index is needed to resolve sequence names",
            )
        })?;
        let (chrom, coords) = input
            .rsplit_once(':')
            .ok_or_else(|| BenchError::region(input, "expected chrom:start-end"))?;
        let (start, end) = coords
            .split_once('-')
            .ok_or_else(|| BenchError::region(input, "expected chrom:start-end"))?;
        let start = parse_coordinate(input, start)?;
        let end = parse_coordinate(input, end)?;
        if start == 0 {
            return Err(BenchError::region(input, "coordinates are 1-based"));
        }
        let length = dict
            .length(chrom)
            .ok_or_else(|| BenchError::region(input, format!("unknown sequence '{}'", chrom)))?;
        if end > length {
            return Err(BenchError::region(
                input,
                format!("end {} is past the end of {} ({} bp)", end, chrom, length),
            ));
        }
        Region::new(chrom, start - 1, end).map_err(|_| BenchError::region(input, "empty interval"))
    }
}

fn parse_coordinate(input: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .replace(',', "")
        .parse::<u64>()
        .map_err(|_| BenchError::region(input, format!("'{}' is not a coordinate", raw)))
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.chrom, self.start + 1, self.end)
    }
}

/// Sequence names and lengths, from a BAM header or a FASTA index.
#[derive(Debug, Clone, Default)]
pub struct ContigDictionary {
    contigs: Vec<(String, u64)>,
}

impl ContigDictionary {
    pub fn new(contigs: Vec<(String, u64)>) -> Self {
        Self { contigs }
    }

    pub fn from_header(header: &HeaderView) -> Self {
        let contigs = (0..header.target_count())
            .map(|tid| {
                let name = String::from_utf8_lossy(header.tid2name(tid)).into_owned();
                (name, header.target_len(tid).unwrap_or(0))
            })
            .collect();
        Self { contigs }
    }

    /// Reads a samtools `.fai` index (name, length, offset, ...).
    pub fn from_fai(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| BenchError::resource(path, e))?;
        let mut contigs = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            let mut fields = line.split('\t');
            let name = fields.next().unwrap_or_default();
            let length = fields
                .next()
                .and_then(|l| l.trim().parse::<u64>().ok())
                .ok_or_else(|| {
                    BenchError::parameter(format!(
                        "malformed FASTA index line in {}: {}",
                        path.display(),
                        line
                    ))
                })?;
            contigs.push((name.to_string(), length));
        }
        Ok(Self { contigs })
    }

    pub fn length(&self, name: &str) -> Option<u64> {
        self.contigs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, len)| *len)
    }

    pub fn first(&self) -> Option<&str> {
        self.contigs.first().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.contigs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contigs.is_empty()
    }
}
