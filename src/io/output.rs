use crate::error::{BenchError, Result};
use crate::sim::{Breakpoint, IndelRecord, QualityPool, RandomModel};
use bio::io::{fasta, fastq};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes reads as FASTQ with ids `r0`, `r1`, ... and qualities drawn from `pool`.
pub fn write_fastq(
    path: &Path,
    reads: &[Vec<u8>],
    pool: &QualityPool,
    rng: &mut RandomModel,
) -> Result<()> {
    let mut writer = fastq::Writer::to_file(path).map_err(|e| BenchError::resource(path, e))?;
    for (i, seq) in reads.iter().enumerate() {
        let qual = pool.draw(rng, seq.len());
        writer
            .write(&format!("r{}", i), None, seq, &qual)
            .map_err(|e| BenchError::resource(path, e))?;
    }
    writer.flush().map_err(|e| BenchError::resource(path, e))
}

/// Writes reads as FASTA with ids `r0`, `r1`, ...
pub fn write_fasta_reads(path: &Path, reads: &[Vec<u8>]) -> Result<()> {
    let mut writer = fasta::Writer::to_file(path).map_err(|e| BenchError::resource(path, e))?;
    for (i, seq) in reads.iter().enumerate() {
        writer
            .write(&format!("r{}", i), None, seq)
            .map_err(|e| BenchError::resource(path, e))?;
    }
    writer.flush().map_err(|e| BenchError::resource(path, e))
}

pub fn write_sequence(path: &Path, id: &str, desc: Option<&str>, seq: &[u8]) -> Result<()> {
    let mut writer = fasta::Writer::to_file(path).map_err(|e| BenchError::resource(path, e))?;
    writer
        .write(id, desc, seq)
        .map_err(|e| BenchError::resource(path, e))?;
    writer.flush().map_err(|e| BenchError::resource(path, e))
}

fn write_lines<T: std::fmt::Display>(path: &Path, items: &[T]) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::resource(path, e))?;
    let mut writer = BufWriter::new(file);
    for item in items {
        writeln!(writer, "{}", item).map_err(|e| BenchError::resource(path, e))?;
    }
    writer.flush().map_err(|e| BenchError::resource(path, e))
}

/// One line per breakpoint: `chrom  pos  chrom  pos  kind`.
pub fn write_breakpoints(path: &Path, breakpoints: &[Breakpoint]) -> Result<()> {
    write_lines(path, breakpoints)
}

/// One line per indel: `position  kind  length  bases`.
pub fn write_indels(path: &Path, indels: &[IndelRecord]) -> Result<()> {
    write_lines(path, indels)
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| BenchError::resource(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|e| BenchError::resource(path, e))?;
    writeln!(writer).map_err(|e| BenchError::resource(path, e))?;
    writer.flush().map_err(|e| BenchError::resource(path, e))
}
