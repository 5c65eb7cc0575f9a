use crate::error::{BenchError, Result};
use crate::types::{ContigDictionary, Region};
use niffler::get_reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One BED interval plus whatever columns follow the coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct BedLine {
    pub region: Region,
    pub extra: Vec<String>,
}

/// Reads a (possibly gzipped) BED file. Header, track and browser lines are skipped.
pub fn read_bed(path: &Path, dict: Option<&ContigDictionary>) -> Result<Vec<BedLine>> {
    let file = File::open(path).map_err(|e| BenchError::resource(path, e))?;
    let (reader, _format) = get_reader(Box::new(file)).map_err(|e| BenchError::resource(path, e))?;
    let reader = BufReader::new(reader);

    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| BenchError::resource(path, e))?;
        let trimmed = line.trim();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            continue;
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let where_ = format!("{}:{}", path.display(), idx + 1);
        if fields.len() < 3 {
            return Err(BenchError::region(where_, "BED lines need chrom, start and end"));
        }
        let start = fields[1]
            .parse::<u64>()
            .map_err(|_| BenchError::region(&where_, format!("bad start '{}'", fields[1])))?;
        let end = fields[2]
            .parse::<u64>()
            .map_err(|_| BenchError::region(&where_, format!("bad end '{}'", fields[2])))?;
        if let Some(dict) = dict {
            match dict.length(fields[0]) {
                None => {
                    return Err(BenchError::region(
                        where_,
                        format!("unknown sequence '{}'", fields[0]),
                    ))
                }
                Some(len) if end > len => {
                    return Err(BenchError::region(
                        where_,
                        format!("end {} is past the end of {} ({} bp)", end, fields[0], len),
                    ))
                }
                Some(_) => {}
            }
        }
        let region = Region::new(fields[0], start, end)
            .map_err(|_| BenchError::region(&where_, "start must be before end"))?;
        lines.push(BedLine {
            region,
            extra: fields[3..].iter().map(|s| s.to_string()).collect(),
        });
    }
    Ok(lines)
}

/// Resolves a region argument: a readable BED file, or a samtools-style
/// `chrom:start-end` string checked against `dict`.
pub fn load_regions(input: &str, dict: Option<&ContigDictionary>) -> Result<Vec<Region>> {
    let path = Path::new(input);
    let regions = if path.is_file() {
        read_bed(path, dict)?.into_iter().map(|l| l.region).collect()
    } else if input.contains(':') && input.contains('-') {
        vec![Region::parse_samtools(input, dict)?]
    } else {
        return Err(BenchError::region(
            input,
            "give a BED file or a samtools-style chrom:start-end string",
        ));
    };
    if regions.is_empty() {
        return Err(BenchError::parameter(format!("no regions found in {}", input)));
    }
    Ok(regions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_bed_with_extra_columns() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "track name=x").unwrap();
        writeln!(f, "# comment").unwrap();
        writeln!(f, "chr1\t100\t200\t0.5").unwrap();
        writeln!(f, "chr2 0 50").unwrap();
        f.flush().unwrap();

        let lines = read_bed(f.path(), None).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].region, Region::new("chr1", 100, 200).unwrap());
        assert_eq!(lines[0].extra, vec!["0.5".to_string()]);
        assert!(lines[1].extra.is_empty());
    }

    #[test]
    fn bed_is_checked_against_dictionary() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "chr3\t0\t10").unwrap();
        f.flush().unwrap();
        let dict = ContigDictionary::new(vec![("chr1".into(), 100)]);
        assert!(matches!(
            read_bed(f.path(), Some(&dict)),
            Err(BenchError::RegionParse { .. })
        ));
    }

    #[test]
    fn unparseable_region_argument_fails_fast() {
        assert!(matches!(
            load_regions("not-a-region", None),
            Err(BenchError::RegionParse { .. })
        ));
        assert!(matches!(
            load_regions("chr1:1-100", None),
            Err(BenchError::RegionParse { .. })
        ));
        let dict = ContigDictionary::new(vec![("chr1".into(), 1000)]);
        let regions = load_regions("chr1:1-100", Some(&dict)).unwrap();
        assert_eq!(regions, vec![Region::new("chr1", 0, 100).unwrap()]);
    }
}
