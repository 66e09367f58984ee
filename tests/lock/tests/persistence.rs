//! Level persistence lock tests: write, read back, re-validate a directory.

use levelcert_harness::batch::{validate_dir, EntryOutcome};
use levelcert_harness::level_io::{read_level, write_level, LevelIoError};
use levelcert_harness::reward::AnalyzerConfig;
use levelcert_harness::worlds::grid_maze::GridMaze;
use levelcert_harness::worlds::water_tanks::WaterTanks;
use levelcert_harness::{generate_valid, GeneratedLevel, LevelDomain, RetryPolicy, Verifier};
use levelcert_search::Budget;

fn generate(domain: &dyn LevelDomain, seeds: std::ops::Range<u64>) -> Vec<GeneratedLevel> {
    let policy = RetryPolicy::default();
    let template = domain.default_template();
    seeds
        .map(|seed| generate_valid(domain, &template, &policy, seed).unwrap())
        .collect()
}

fn write_all(dir: &std::path::Path, domain: &dyn LevelDomain, levels: &[GeneratedLevel]) {
    for level in levels {
        write_level(dir, &format!("lvl_{:03}", level.seed), domain.domain_id(), level).unwrap();
    }
}

#[test]
fn written_levels_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    for domain in [&GridMaze as &dyn LevelDomain, &WaterTanks] {
        for level in generate(domain, 0..3) {
            let name = format!("{}_{}", domain.domain_id(), level.seed);
            let path = write_level(dir.path(), &name, domain.domain_id(), &level).unwrap();
            let doc = read_level(&path).unwrap();
            assert_eq!(doc.world, level.world);
            assert_eq!(doc.report, level.report);
            assert_eq!(doc.provenance, level.provenance);
            assert_eq!(doc.seed, level.seed);
        }
    }
}

#[test]
fn persisted_directory_revalidates() {
    let dir = tempfile::tempdir().unwrap();
    let levels = generate(&GridMaze, 0..6);
    write_all(dir.path(), &GridMaze, &levels);

    let verifier = Verifier::new(&GridMaze, Budget::default(), AnalyzerConfig::default());
    for workers in [1, 4] {
        let summary = validate_dir(dir.path(), &verifier, workers).unwrap();
        assert_eq!(summary.total, 6);
        assert!(summary.all_passed(), "{summary:?}");
        let names: Vec<&str> = summary.entries.iter().map(|e| e.file_name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
        for (entry, level) in summary.entries.iter().zip(&levels) {
            let EntryOutcome::Passed(report) = &entry.outcome else {
                panic!("{} did not pass", entry.file_name);
            };
            assert_eq!(report, &level.report);
        }
    }
}

#[test]
fn tampered_and_foreign_files_are_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    write_all(dir.path(), &GridMaze, &generate(&GridMaze, 0..3));

    let tampered = dir.path().join("lvl_001.level.json");
    let mut value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&tampered).unwrap()).unwrap();
    value["world"]["max_steps"] = serde_json::json!(1);
    std::fs::write(&tampered, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    assert!(matches!(
        read_level(&tampered).unwrap_err(),
        LevelIoError::DigestMismatch { .. }
    ));

    std::fs::write(dir.path().join("garbage.level.json"), b"not json").unwrap();
    std::fs::write(dir.path().join("ignored.txt"), b"not a level").unwrap();

    let verifier = Verifier::new(&GridMaze, Budget::default(), AnalyzerConfig::default());
    let summary = validate_dir(dir.path(), &verifier, 2).unwrap();
    assert_eq!(summary.total, 4);
    assert_eq!(summary.passed, 2);
    assert_eq!(summary.unreadable, 2);

    // The same directory checked as another domain: every file is foreign
    // or unreadable.
    let tanks = Verifier::new(&WaterTanks, Budget::default(), AnalyzerConfig::default());
    let summary = validate_dir(dir.path(), &tanks, 2).unwrap();
    assert_eq!(summary.unreadable, 4);
}

#[test]
fn float_swapped_for_its_quantized_integer_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let levels = generate(&WaterTanks, 0..1);
    write_all(dir.path(), &WaterTanks, &levels);

    let path = dir.path().join("lvl_000.level.json");
    let mut value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let target = value["world"]["target"].as_f64().unwrap();
    #[allow(clippy::cast_possible_truncation)]
    let scaled = (target * 1e6).round() as i64;
    value["world"]["target"] = serde_json::json!(scaled);
    std::fs::write(&path, serde_json::to_vec_pretty(&value).unwrap()).unwrap();
    assert!(matches!(
        read_level(&path).unwrap_err(),
        LevelIoError::DigestMismatch { .. }
    ));
}

#[test]
fn missing_directory_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let verifier = Verifier::new(&GridMaze, Budget::default(), AnalyzerConfig::default());
    let err = validate_dir(&dir.path().join("absent"), &verifier, 1).unwrap_err();
    assert!(matches!(err, LevelIoError::Io { .. }));
}
