use epsmatch_core::seed::utils::reverse_complement;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use epsmatch_core::{Alphabet, NoopObserver, OutputFormat, Pipeline, SearchConfig, VerificationMethod};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, TempDir};

fn random_dna(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| b"ACGT"[rng.gen_range(0..4)]).collect()
}

fn write_fasta(records: &[(&str, &[u8])]) -> NamedTempFile {
    let mut f = NamedTempFile::new().expect("create temp fasta");
    for (id, seq) in records {
        writeln!(f, ">{}", id).unwrap();
        for line in seq.chunks(60) {
            f.write_all(line).unwrap();
            writeln!(f).unwrap();
        }
    }
    f
}

fn config_in(dir: &Path, file: &str) -> SearchConfig {
    SearchConfig {
        epsilon: 0.05,
        min_length: 50,
        output: dir.join(file),
        disabled_queries_output: dir.join("disabled.fasta"),
        ..Default::default()
    }
}

fn gff_lines(path: &PathBuf) -> Vec<Vec<String>> {
    std::fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(|l| l.split('\t').map(str::to_string).collect())
        .collect()
}

#[test]
fn finds_planted_matches_on_both_strands() {
    let core = random_dna(150, 42);
    let mut db = random_dna(500, 1);
    db.extend_from_slice(&core);
    db.extend(random_dna(500, 2));
    db.extend(reverse_complement(&core, Alphabet::Dna5));
    db.extend(random_dna(500, 3));

    let database = write_fasta(&[("chr1 test assembly", &db)]);
    let query = write_fasta(&[("read1", &core), ("read2", &random_dna(150, 77))]);
    let dir = TempDir::new().unwrap();

    let config = config_in(dir.path(), "matches.gff").validate().unwrap();
    let report = Pipeline::new(config)
        .run(database.path(), query.path(), &mut NoopObserver)
        .expect("run pipeline");

    assert_eq!(report.databases, 1);
    assert_eq!(report.queries, 2);
    assert_eq!(report.matches, 2);
    assert!(report.significance.is_some());
    assert!(report.disabled_output.is_none());
    assert!(!dir.path().join("disabled.fasta").exists());

    let lines = gff_lines(&report.output);
    assert_eq!(lines.len(), 2);
    let forward = lines.iter().find(|f| f[6] == "+").expect("forward match");
    assert_eq!(&forward[..6], &["chr1", "epsmatch", "eps-matches", "501", "650", "100.0000"]);
    assert!(forward[8].starts_with("read1;seq2Range=1,150;"));
    assert!(forward[8].contains("cigar=150="));

    let reverse = lines.iter().find(|f| f[6] == "-").expect("reverse match");
    assert_eq!(reverse[3], "1151");
    assert_eq!(reverse[4], "1300");
}

#[test]
fn text_output_and_verification_choice() {
    let core = random_dna(120, 5);
    let mut db = random_dna(300, 6);
    db.extend_from_slice(&core);
    db.extend(random_dna(300, 7));

    let database = write_fasta(&[("contig", &db)]);
    let query = write_fasta(&[("q", &core)]);
    let dir = TempDir::new().unwrap();

    for method in VerificationMethod::ALL {
        let config = SearchConfig {
            verification: method,
            reverse: false,
            ..config_in(dir.path(), "matches.txt")
        }
        .validate()
        .unwrap();
        assert_eq!(config.output_format(), OutputFormat::Txt);

        let report = Pipeline::new(config)
            .run(database.path(), query.path(), &mut NoopObserver)
            .unwrap();
        assert_eq!(report.matches, 1, "verification {}", method);

        let text = std::fs::read_to_string(&report.output).unwrap();
        assert!(text.starts_with("Match 1\n  database: contig [301..420] strand +\n"), "{}", text);
    }
}

#[test]
fn repetitive_query_is_disabled_and_written() {
    let core = random_dna(80, 8);
    let mut db = Vec::new();
    for i in 0..5 {
        db.extend(random_dna(250, 10 + i));
        db.extend_from_slice(&core);
    }

    let database = write_fasta(&[("chr", &db)]);
    let query = write_fasta(&[("repeat element", &core), ("unique", &random_dna(80, 99))]);
    let dir = TempDir::new().unwrap();

    let config = SearchConfig {
        disable_threshold: Some(3),
        reverse: false,
        ..config_in(dir.path(), "out.gff")
    }
    .validate()
    .unwrap();
    let report = Pipeline::new(config)
        .run(database.path(), query.path(), &mut NoopObserver)
        .unwrap();

    assert_eq!(report.disabled_queries, 1);
    assert_eq!(report.matches, 0);
    let disabled = std::fs::read_to_string(report.disabled_output.unwrap()).unwrap();
    assert!(disabled.starts_with(">repeat element\n"));
}

#[test]
fn duplicate_identifiers_do_not_abort() {
    let seq = random_dna(200, 3);
    let database = write_fasta(&[("dup first", &seq), ("dup second", &seq)]);
    let query = write_fasta(&[("q", &seq[20..120])]);
    let dir = TempDir::new().unwrap();

    let config = SearchConfig { reverse: false, ..config_in(dir.path(), "out.gff") }.validate().unwrap();
    let report = Pipeline::new(config)
        .run(database.path(), query.path(), &mut NoopObserver)
        .unwrap();
    assert_eq!(report.databases, 2);
    assert_eq!(report.matches, 2);
}

#[test]
fn protein_search_skips_reverse_and_significance() {
    let protein: &[u8] = b"MKTAYIAKQRQISFVKSHFSRQLEERLGLIEVQAPILSRVGDGTQDNLSGAEKAVQVKVKALPDAQFEVVHSLAKWKRQTLGQHDFSAGEGLYTHMKALRPDEDRLSPLHSVYVDQWDWERVMGDGERQFSTLKSTVEAIWAGIKATEAAVSEEFGLAPFLPDQIHFVHSQELLSRYPDLDAKGRERAIAKDLGAVFLVGIGGKLSDGHRHDVRAPDYDDWUAQ";
    let mut db = b"GGGGGGGGGGGGGGGGGGGGGGGGGGGGGGGG".to_vec();
    db.extend_from_slice(protein);
    let database = write_fasta(&[("prot_db", &db)]);
    let query = write_fasta(&[("prot_q", &protein[10..110])]);
    let dir = TempDir::new().unwrap();

    let config = SearchConfig { alphabet: Alphabet::Protein, ..config_in(dir.path(), "out.gff") }
        .validate()
        .unwrap();
    let report = Pipeline::new(config)
        .run(database.path(), query.path(), &mut NoopObserver)
        .unwrap();

    assert!(report.significance.is_none());
    assert_eq!(report.matches, 1);
    let lines = gff_lines(&report.output);
    assert_eq!(lines[0][6], "+");
    assert_eq!(lines[0][3], "43");
    assert!(!lines[0][8].contains("eValue"));
}

#[test]
fn missing_input_reports_path() {
    let dir = TempDir::new().unwrap();
    let query = write_fasta(&[("q", b"ACGT")]);
    let config = config_in(dir.path(), "out.gff").validate().unwrap();
    let err = Pipeline::new(config)
        .run(&dir.path().join("absent.fa"), query.path(), &mut NoopObserver)
        .unwrap_err();
    assert!(err.to_string().contains("absent.fa"));
    assert!(!dir.path().join("out.gff").exists());
}
