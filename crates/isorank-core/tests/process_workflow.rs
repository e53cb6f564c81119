use isorank::core::elements::PeriodicTable;
use isorank::engine::config::{AnalysisConfig, AnalysisConfigBuilder, ConnectivityMap};
use isorank::engine::error::EngineError;
use isorank::engine::progress::{Progress, ProgressReporter};
use isorank::engine::rank::RankError;
use isorank::engine::report::{ENERGY_TABLE_FILE, GAP_TABLE_FILE, GAPS_FILE, STATS_FILE};
use isorank::workflows::process;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::tempdir;

fn record(energy: f64, atoms: &[u8], gap: Option<f64>) -> String {
    let coords: Vec<String> = (0..atoms.len())
        .map(|i| format!("[{}.0, 0.0, {}.25]", i, i))
        .collect();
    let gap = gap.map_or("null".to_string(), |g| g.to_string());
    format!(
        r#"{{"scf_energies": [0.0, {energy}], "atomic_numbers": {atoms:?}, "atom_coords": [[{}]], "gap": {gap}}}"#,
        coords.join(", ")
    )
}

fn write_archive(path: &Path, jobs: &[(&str, String)]) {
    let body: Vec<String> = jobs
        .iter()
        .map(|(name, job)| format!("\"{name}\": {job}"))
        .collect();
    fs::write(path, format!("{{{}}}", body.join(",\n"))).unwrap();
}

/// Two archives of Si/H clusters in nested directories, one of them with a broken job.
fn seed_inputs(root: &Path) {
    let nested = root.join("batch2");
    fs::create_dir_all(&nested).unwrap();
    write_archive(
        &root.join("batch1.json"),
        &[
            ("SiH4_1", record(-100.0, &[14, 1, 1, 1, 1], Some(6.0))),
            ("Si2H6_1", record(-200.0, &[14, 14, 1, 1, 1, 1, 1, 1], Some(5.0))),
            ("SiH4_2", record(-100.5, &[1, 1, 14, 1, 1], Some(5.5))),
        ],
    );
    write_archive(
        &nested.join("batch2.json"),
        &[
            ("SiH4_3", record(-100.25, &[14, 1, 1, 1, 1], None)),
            ("broken_4", "null".to_string()),
            ("Si2H6_2", record(-199.0, &[14, 14, 1, 1, 1, 1, 1, 1], Some(4.0))),
        ],
    );
    fs::write(nested.join("notes.txt"), "not an archive").unwrap();
}

fn config(out: &Path) -> AnalysisConfigBuilder {
    AnalysisConfigBuilder::new()
        .element_symbols(vec!["Si".into(), "H".into()])
        .output_directory(out.to_path_buf())
        .write_poscars(false)
}

fn run(inputs: &[PathBuf], config: &AnalysisConfig) -> process::ProcessResult {
    process::run(inputs, config, &PeriodicTable::new(), &ProgressReporter::new()).unwrap()
}

#[test]
fn full_run_writes_ranked_tables() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_inputs(input.path());
    let cfg = config(out.path()).build(&PeriodicTable::new()).unwrap();

    let result = run(&[input.path().to_path_buf()], &cfg);

    assert_eq!(result.summary.archives_read, 2);
    assert_eq!(result.summary.skipped_count(), 1);
    assert_eq!(result.summary.nonfinite_gaps_kept, 1);
    assert_eq!(result.selections.len(), 2);

    let stats = fs::read_to_string(out.path().join(STATS_FILE)).unwrap();
    let lines: Vec<&str> = stats.lines().collect();
    assert_eq!(
        lines,
        [
            "Si\tH\tEtot, eV\tGap, ev\tshifted\tinitial ind",
            "1\t4\t-100.500000\t5.500000\tFalse\t1",
            "2\t6\t-200.000000\t5.000000\tFalse\t0",
        ]
    );
    let gaps = fs::read_to_string(out.path().join(GAPS_FILE)).unwrap();
    assert_eq!(gaps, "1\t4\t5.500000\n2\t6\t5.000000\n");

    let en = fs::read_to_string(out.path().join(ENERGY_TABLE_FILE)).unwrap();
    let en_lines: Vec<&str> = en.lines().collect();
    assert_eq!(en_lines[0], "Si\\H\t4\t5\t6");
    assert_eq!(en_lines[1], "1\t-100.500000\tnan\tnan");
    assert_eq!(en_lines[2], "2\tnan\tnan\t-200.000000");
    assert!(out.path().join(GAP_TABLE_FILE).exists());
    assert_eq!(result.written.len(), 4);
}

#[test]
fn skipping_nan_gaps_changes_the_group_not_the_winner() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_inputs(input.path());
    let cfg = config(out.path())
        .skip_nan_gap(true)
        .build(&PeriodicTable::new())
        .unwrap();

    let result = run(&[input.path().to_path_buf()], &cfg);
    assert_eq!(result.summary.nonfinite_gaps_dropped, 1);
    assert_eq!(result.groups.total_jobs(), 4);
    assert_eq!(result.selections[0].lead_energy, -100.5);
}

#[test]
fn repeated_runs_produce_identical_tables() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_inputs(input.path());
    let cfg = config(out.path())
        .isomer_count(2)
        .build(&PeriodicTable::new())
        .unwrap();
    let inputs = [input.path().to_path_buf()];

    let first = run(&inputs, &cfg);
    let tables: Vec<String> = first
        .written
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();
    let second = run(&inputs, &cfg);
    let again: Vec<String> = second
        .written
        .iter()
        .map(|p| fs::read_to_string(p).unwrap())
        .collect();

    assert_eq!(first.selections, second.selections);
    assert_eq!(tables, again);
}

#[test]
fn poscar_and_xyz_export() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_inputs(input.path());
    let cfg = config(out.path())
        .write_poscars(true)
        .write_xyz(true)
        .isomer_count(2)
        .build(&PeriodicTable::new())
        .unwrap();
    let inputs = [input.path().to_path_buf()];

    run(&inputs, &cfg);
    let poscars = out.path().join("batch1_res_POSCARS");
    let once = fs::read_to_string(&poscars).unwrap();
    assert_eq!(once.matches("Cartesian").count(), 3);
    assert!(out.path().join("batch2_res_POSCARS").exists());

    let lead = fs::read_to_string(out.path().join("SiH4_2_g0.xyz")).unwrap();
    assert_eq!(lead.lines().nth(1), Some("dE = 0.00000"));
    let next = fs::read_to_string(out.path().join("SiH4_3_g1.xyz")).unwrap();
    assert_eq!(next.lines().nth(1), Some("dE = 0.25000"));
    assert!(out.path().join("Si2H6_2_g1.xyz").exists());

    run(&inputs, &cfg);
    let twice = fs::read_to_string(&poscars).unwrap();
    assert_eq!(twice.matches("Cartesian").count(), 6);
}

#[test]
fn ternary_selection_has_no_pivot_tables() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    write_archive(
        &input.path().join("pdbio.json"),
        &[("PdBiO_1", record(-50.0, &[46, 83, 8], Some(1.0)))],
    );
    let cfg = AnalysisConfigBuilder::new()
        .element_numbers(vec![46, 83, 8])
        .output_directory(out.path().join("results"))
        .write_poscars(false)
        .build(&PeriodicTable::new())
        .unwrap();

    let result = run(&[input.path().to_path_buf()], &cfg);
    assert_eq!(result.written.len(), 2);
    assert!(out.path().join("results").join(STATS_FILE).exists());
    assert!(!out.path().join("results").join(ENERGY_TABLE_FILE).exists());
    assert!(!out.path().join("results").join(GAP_TABLE_FILE).exists());
}

#[test]
fn connectivity_offset_beyond_group_aborts_the_run() {
    let input = tempdir().unwrap();
    let out = tempdir().unwrap();
    seed_inputs(input.path());
    // (1, 4) has three isomers, (2, 6) only two.
    let mut offsets = vec![vec![0; 7]; 3];
    offsets[1][4] = 1;
    offsets[2][6] = 2;
    let cfg = config(out.path())
        .connectivity_map(Some(ConnectivityMap::new(offsets)))
        .build(&PeriodicTable::new())
        .unwrap();

    let err = process::run(
        &[input.path().to_path_buf()],
        &cfg,
        &PeriodicTable::new(),
        &ProgressReporter::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        EngineError::Ranking(RankError::EmptySelectionWindow {
            offset: 2,
            group_size: 2,
            ..
        })
    ));
}

#[test]
fn missing_input_path_is_an_error() {
    let out = tempdir().unwrap();
    let cfg = config(out.path()).build(&PeriodicTable::new()).unwrap();
    let result = process::run(
        &[out.path().join("does-not-exist")],
        &cfg,
        &PeriodicTable::new(),
        &ProgressReporter::new(),
    );
    assert!(matches!(result, Err(EngineError::Archive(_))));
}

#[test]
fn aggregate_reports_progress_per_archive() {
    let input = tempdir().unwrap();
    seed_inputs(input.path());
    let cfg = config(input.path()).build(&PeriodicTable::new()).unwrap();
    let events = Mutex::new(Vec::new());
    let reporter = ProgressReporter::with_callback(Box::new(|e: Progress| events.lock().unwrap().push(e)));

    let (groups, summary) = process::aggregate(
        &[input.path().to_path_buf()],
        &cfg,
        &PeriodicTable::new(),
        &reporter,
    )
    .unwrap();
    drop(reporter);

    assert_eq!(groups.len(), 2);
    assert_eq!(summary.jobs_accepted, 5);
    let events = events.into_inner().unwrap();
    assert!(events.contains(&Progress::ArchivesFound { total: 2 }));
    assert!(events.contains(&Progress::ArchiveProcessed {
        source: "batch2.json".to_string(),
        accepted: 2,
        skipped: 1,
    }));
}

#[test]
fn aggregate_reports_empty_and_unreadable_inputs_as_messages() {
    let input = tempdir().unwrap();
    let cfg = config(input.path()).build(&PeriodicTable::new()).unwrap();
    let collect = |inputs: &[PathBuf]| {
        let events = Mutex::new(Vec::new());
        let reporter =
            ProgressReporter::with_callback(Box::new(|e: Progress| events.lock().unwrap().push(e)));
        process::aggregate(inputs, &cfg, &PeriodicTable::new(), &reporter).unwrap();
        drop(reporter);
        events.into_inner().unwrap()
    };

    let events = collect(&[input.path().to_path_buf()]);
    assert!(events.contains(&Progress::Message("No archives matching '*.json' found".to_string())));

    fs::write(input.path().join("broken.json"), "{ not json").unwrap();
    let events = collect(&[input.path().to_path_buf()]);
    assert!(events.contains(&Progress::ArchivesFound { total: 1 }));
    assert!(events.contains(&Progress::Message(
        "broken.json: unreadable archive skipped".to_string()
    )));
}
