use crate::error::{BenchError, Result};
use crate::partition::ReadRecord;
use crate::sim::QualityPool;
use crate::types::{Locus, Region};
use log::{debug, warn};
use rust_htslib::bam::record::{Aux, CigarString};
use rust_htslib::bam::{self, Header, HeaderView, Read};
use std::path::Path;

pub fn open_reader(path: &Path) -> Result<bam::Reader> {
    bam::Reader::from_path(path).map_err(|e| BenchError::resource(path, e))
}

pub fn open_indexed(path: &Path) -> Result<bam::IndexedReader> {
    bam::IndexedReader::from_path(path).map_err(|e| BenchError::resource(path, e))
}

/// BAM writer whose header copies `template`.
pub fn open_writer(path: &Path, template: &HeaderView) -> Result<bam::Writer> {
    let header = Header::from_template(template);
    bam::Writer::from_path(path, &header, bam::Format::Bam).map_err(|e| BenchError::resource(path, e))
}

fn locus(header: &HeaderView, tid: i32, pos: i64) -> Option<Locus> {
    if tid < 0 || pos < 0 {
        return None;
    }
    let name = String::from_utf8_lossy(header.tid2name(tid as u32)).into_owned();
    Some(Locus::new(name, pos as u64))
}

/// Reference bases consumed by the mate's alignment, read from its `MC` tag.
fn mate_reference_length(record: &bam::Record) -> Option<u64> {
    match record.aux(b"MC") {
        Ok(Aux::String(cigar)) => {
            let cigar = CigarString::try_from(cigar).ok()?;
            u64::try_from(cigar.into_view(0).end_pos()).ok()
        }
        _ => None,
    }
}

/// Partitioner view of an htslib record.
pub fn to_read_record(record: &bam::Record, header: &HeaderView) -> ReadRecord {
    let read_length = record.seq_len() as u64;
    let own = if record.is_unmapped() {
        None
    } else {
        locus(header, record.tid(), record.pos())
    };
    let end = own.as_ref().map(|l| match u64::try_from(record.cigar().end_pos()) {
        Ok(end) if end > l.pos => end,
        _ => l.pos + read_length,
    });
    let mate = if record.is_paired() && !record.is_mate_unmapped() {
        locus(header, record.mtid(), record.mpos())
    } else {
        None
    };
    let mate_end = mate.as_ref().map(|l| {
        l.pos + mate_reference_length(record).unwrap_or(read_length)
    });
    ReadRecord {
        qname: record.qname().to_vec(),
        first_mate: !record.is_paired() || record.is_first_in_template(),
        sequence: record.seq().as_bytes(),
        quality: record.qual().to_vec(),
        secondary: record.is_secondary() || record.is_supplementary(),
        locus: own,
        end,
        mate_locus: mate,
        mate_end,
    }
}

/// Collects Phred+33 quality strings from reads overlapping `regions`. Each
/// region is fetched through the BAM index.
pub fn sample_qualities(path: &Path, regions: &[Region], limit: usize) -> Result<QualityPool> {
    let mut reader = open_indexed(path)?;
    let header = reader.header().clone();
    let mut strings = Vec::new();

    'regions: for region in regions {
        let Some(tid) = header.tid(region.chrom.as_bytes()) else {
            warn!("training region {} is not in {}", region, path.display());
            continue;
        };
        reader
            .fetch((tid, region.start as i64, region.end as i64))
            .map_err(|e| BenchError::resource(path, e))?;
        for result in reader.records() {
            let record = result.map_err(|e| BenchError::resource(path, e))?;
            let qual = record.qual();
            // 0xff marks a missing quality string
            if qual.is_empty() || qual[0] == 0xff {
                continue;
            }
            strings.push(qual.iter().map(|q| q.saturating_add(33)).collect());
            if strings.len() >= limit {
                break 'regions;
            }
        }
    }

    debug!("sampled {} quality strings from {}", strings.len(), path.display());
    if strings.is_empty() {
        warn!(
            "no quality strings found in {}, falling back to constant Q40",
            path.display()
        );
    }
    Ok(QualityPool::new(strings))
}
