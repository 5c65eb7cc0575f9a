use crate::error::{BenchError, Result};
use crate::types::{ContigDictionary, Region};
use bio::io::fasta::IndexedReader;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Random access to reference sequence.
pub trait ReferenceAccessor {
    /// Upper-cased bases of `region`. Fails when the region runs off its sequence.
    fn fetch(&mut self, region: &Region) -> Result<Vec<u8>>;
}

/// Indexed FASTA on disk (`<path>.fai` must exist).
pub struct FastaReference {
    path: PathBuf,
    reader: IndexedReader<File>,
    dictionary: ContigDictionary,
}

impl FastaReference {
    pub fn open(path: &Path) -> Result<Self> {
        let fai = PathBuf::from(format!("{}.fai", path.display()));
        if !fai.exists() {
            return Err(BenchError::resource(
                path,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!(
                        "FASTA index not found at {}. Please run 'samtools faidx {}' first",
                        fai.display(),
                        path.display()
                    ),
                ),
            ));
        }
        let reader = IndexedReader::from_file(&path).map_err(|e| BenchError::resource(path, e))?;
        let dictionary = ContigDictionary::from_fai(&fai)?;
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            dictionary,
        })
    }

    pub fn dictionary(&self) -> &ContigDictionary {
        &self.dictionary
    }
}

impl ReferenceAccessor for FastaReference {
    fn fetch(&mut self, region: &Region) -> Result<Vec<u8>> {
        let length = self.dictionary.length(&region.chrom).ok_or_else(|| {
            BenchError::region(region.to_string(), "sequence not present in the reference")
        })?;
        if region.end > length {
            return Err(BenchError::region(
                region.to_string(),
                format!("reference {} is only {} bp", region.chrom, length),
            ));
        }
        self.reader
            .fetch(&region.chrom, region.start, region.end)
            .map_err(|e| BenchError::resource(&self.path, e))?;
        let mut seq = Vec::with_capacity(region.len() as usize);
        self.reader
            .read(&mut seq)
            .map_err(|e| BenchError::resource(&self.path, e))?;
        seq.make_ascii_uppercase();
        Ok(seq)
    }
}

/// Reference held in memory, keyed by sequence name.
#[derive(Debug, Clone, Default)]
pub struct MemoryReference {
    sequences: HashMap<String, Vec<u8>>,
}

impl MemoryReference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequence(mut self, name: impl Into<String>, seq: impl Into<Vec<u8>>) -> Self {
        self.sequences.insert(name.into(), seq.into());
        self
    }

    pub fn dictionary(&self) -> ContigDictionary {
        let mut contigs: Vec<(String, u64)> = self
            .sequences
            .iter()
            .map(|(name, seq)| (name.clone(), seq.len() as u64))
            .collect();
        contigs.sort();
        ContigDictionary::new(contigs)
    }
}

impl ReferenceAccessor for MemoryReference {
    fn fetch(&mut self, region: &Region) -> Result<Vec<u8>> {
        let seq = self.sequences.get(&region.chrom).ok_or_else(|| {
            BenchError::region(region.to_string(), "sequence not present in the reference")
        })?;
        if region.end as usize > seq.len() {
            return Err(BenchError::region(
                region.to_string(),
                format!("reference {} is only {} bp", region.chrom, seq.len()),
            ));
        }
        Ok(seq[region.start as usize..region.end as usize].to_ascii_uppercase())
    }
}
