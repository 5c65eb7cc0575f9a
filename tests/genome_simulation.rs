use snowbench::config::{BenchmarkMode, GenomeSimulationConfig};
use snowbench::driver::{BREAKPOINT_LEDGER, INDEL_LEDGER, PAIRED_END_1, PAIRED_END_2};
use snowbench::io::{MemoryReference, ReferenceAccessor};
use snowbench::sim::genome::replay_ledger;
use snowbench::sim::{ErrorProfile, InsertSize, RandomModel, SyntheticGenomeBuilder};
use snowbench::types::Region;
use snowbench::BenchmarkDriver;
use rust_htslib::bam::{self, header::HeaderRecord, record::Cigar, record::CigarString, Header};
use std::fs;
use std::path::Path;

// A single-line FASTA with a matching samtools index.
fn write_reference(dir: &Path, name: &str, seq: &[u8]) -> std::path::PathBuf {
    let fasta = dir.join("ref.fa");
    let mut content = format!(">{}\n", name).into_bytes();
    content.extend_from_slice(seq);
    content.push(b'\n');
    fs::write(&fasta, content).unwrap();
    let offset = name.len() + 2;
    fs::write(
        dir.join("ref.fa.fai"),
        format!("{}\t{}\t{}\t{}\t{}\n", name, seq.len(), offset, seq.len(), seq.len() + 1),
    )
    .unwrap();
    fasta
}

// Coordinate-sorted, indexed BAM of 10 bp reads that all carry quality `qual`.
fn write_training_bam(dir: &Path, qual: u8) -> std::path::PathBuf {
    let path = dir.join("training.bam");
    let mut header = Header::new();
    header.push_record(
        HeaderRecord::new(b"SQ")
            .push_tag(b"SN", "chr1")
            .push_tag(b"LN", 10_000),
    );
    let mut writer = bam::Writer::from_path(&path, &header, bam::Format::Bam).unwrap();
    let cigar = CigarString(vec![Cigar::Match(10)]);
    for i in 0..20 {
        let mut record = bam::Record::new();
        record.set(format!("t{}", i).as_bytes(), Some(&cigar), b"ACGTACGTAC", &[qual; 10]);
        record.set_tid(0);
        record.set_pos(i * 40);
        record.set_bin(4681);
        record.set_mtid(-1);
        record.set_mpos(-1);
        record.set_mapq(60);
        writer.write(&record).unwrap();
    }
    drop(writer);
    bam::index::build(&path, None, bam::index::Type::Bai, 1).unwrap();
    path
}

fn simulation(reference: &Path, out: &Path) -> BenchmarkMode {
    BenchmarkMode::GenomeSimulation(GenomeSimulationConfig {
        reference: reference.to_path_buf(),
        region: Region::new("chr1", 500, 5500).unwrap(),
        break_count: 2,
        indel_count: 3,
        max_indel_length: 10,
        coverage: 2.0,
        errors: ErrorProfile::new(0.01, 0.05, 0.05),
        read_length: 50,
        insert: InsertSize::new(250.0, 50.0),
        training_bam: None,
        training_regions: Vec::new(),
        quality_sample_limit: 1000,
        output_dir: out.to_path_buf(),
        string_id: "sim".to_string(),
    })
}

#[test]
fn ledger_of_small_region_matches_requested_counts() {
    let original = RandomModel::new(7).bases(1000);
    let mut reference = MemoryReference::new().with_sequence("chr1", original.clone());
    let region = Region::new("chr1", 0, 1000).unwrap();
    let mut rng = RandomModel::new(42);
    let genome = SyntheticGenomeBuilder::new(2, 3)
        .build(&region, &mut reference, &mut rng)
        .unwrap();

    assert_eq!(genome.breakpoints().len(), 2);
    assert_eq!(genome.indels().len(), 3);
    let expected = 1000 + genome.indel_delta() + genome.rearrangement_delta();
    assert_eq!(genome.sequence().len() as isize, expected);
    assert_eq!(
        replay_ledger(&reference.fetch(&region).unwrap(), genome.breakpoints(), genome.indels()),
        genome.sequence()
    );
}

#[test]
fn fixed_seed_runs_write_identical_files() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write_reference(dir.path(), "chr1", &RandomModel::new(3).bases(6000));
    let out_a = dir.path().join("a");
    let out_b = dir.path().join("b");

    let report = BenchmarkDriver::new(Some(42))
        .run(&simulation(&reference, &out_a))
        .unwrap();
    BenchmarkDriver::new(Some(42))
        .run(&simulation(&reference, &out_b))
        .unwrap();

    assert_eq!(report.seed, 42);
    assert_eq!(report.outputs.len(), 5);
    for name in [PAIRED_END_1, PAIRED_END_2, BREAKPOINT_LEDGER, INDEL_LEDGER, "sim.sim.fa"] {
        let a = fs::read(out_a.join(name)).unwrap();
        let b = fs::read(out_b.join(name)).unwrap();
        assert!(!a.is_empty(), "{} is empty", name);
        assert_eq!(a, b, "{} differs between runs", name);
    }
    assert!(out_a.join("sim.manifest.json").exists());
}

#[test]
fn simulation_outputs_are_well_formed() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write_reference(dir.path(), "chr1", &RandomModel::new(5).bases(6000));
    let out = dir.path().join("out");
    BenchmarkDriver::new(Some(9))
        .run(&simulation(&reference, &out))
        .unwrap();

    let breakpoints = fs::read_to_string(out.join(BREAKPOINT_LEDGER)).unwrap();
    assert_eq!(breakpoints.lines().count(), 2);
    assert!(breakpoints.lines().all(|l| l.split('\t').count() == 5));
    let indels = fs::read_to_string(out.join(INDEL_LEDGER)).unwrap();
    assert_eq!(indels.lines().count(), 3);

    let mate1 = fs::read_to_string(out.join(PAIRED_END_1)).unwrap();
    let mate2 = fs::read_to_string(out.join(PAIRED_END_2)).unwrap();
    let lines1: Vec<&str> = mate1.lines().collect();
    let lines2: Vec<&str> = mate2.lines().collect();
    assert_eq!(lines1.len(), lines2.len());
    assert_eq!(lines1.len() % 4, 0);
    assert_eq!(lines1[0], "@r0");
    for record in lines1.chunks(4).chain(lines2.chunks(4)) {
        assert_eq!(record[1].len(), 50);
        assert_eq!(record[2], "+");
        assert_eq!(record[3].len(), 50);
    }

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join("sim.manifest.json")).unwrap()).unwrap();
    assert_eq!(manifest["seed"], 9);
    assert_eq!(manifest["mode"], "genome-simulation");
    assert_eq!(manifest["run"]["config"]["break_count"], 2);
}

#[test]
fn region_past_reference_end_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write_reference(dir.path(), "chr1", &RandomModel::new(5).bases(1000));
    let out = dir.path().join("out");
    let err = BenchmarkDriver::new(Some(1))
        .run(&simulation(&reference, &out))
        .unwrap_err();
    assert_eq!(err.category(), snowbench::ErrorCategory::Parameter);
}

#[test]
fn qualities_are_borrowed_from_the_training_bam() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write_reference(dir.path(), "chr1", &RandomModel::new(5).bases(6000));
    let training = write_training_bam(dir.path(), 20);
    let out = dir.path().join("out");
    let BenchmarkMode::GenomeSimulation(mut config) = simulation(&reference, &out) else {
        unreachable!()
    };
    config.training_bam = Some(training);
    config.training_regions = vec![Region::new("chr1", 0, 1000).unwrap()];
    BenchmarkDriver::new(Some(4))
        .run(&BenchmarkMode::GenomeSimulation(config))
        .unwrap();

    for mate in [PAIRED_END_1, PAIRED_END_2] {
        let text = fs::read_to_string(out.join(mate)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(!lines.is_empty());
        // Q20 is '5' in Phred+33; 10 bp strings are padded with their last value
        for record in lines.chunks(4) {
            assert_eq!(record[3], "5".repeat(record[1].len()));
        }
    }
}

#[test]
fn invalid_settings_fail_before_anything_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let reference = write_reference(dir.path(), "chr1", &RandomModel::new(5).bases(6000));
    let out = dir.path().join("out");
    let BenchmarkMode::GenomeSimulation(mut config) = simulation(&reference, &out) else {
        unreachable!()
    };
    config.read_length = 0;
    let err = BenchmarkDriver::new(Some(1))
        .run(&BenchmarkMode::GenomeSimulation(config))
        .unwrap_err();
    assert!(matches!(err, snowbench::BenchError::Parameter(_)));
    assert!(!out.join(BREAKPOINT_LEDGER).exists());
    assert!(!out.join("sim.manifest.json").exists());
}
