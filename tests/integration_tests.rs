use sortbox::cli::{RunOptions, RunReport, run_cli_with_config};
use sortbox::classifier::Method;
use sortbox::config::ConfigError;
/// Integration tests for sortbox
///
/// These tests simulate real-world usage scenarios, testing the complete
/// end-to-end functionality of the sortbox file organization utility.
///
/// Test categories:
/// 1. Basic organization workflows
/// 2. Classification through the whole pipeline
/// 3. Dry-run mode verification
/// 4. Duplicates and repeated runs
/// 5. Configuration and filtering
/// 6. Reports and edge cases
use sortbox::cli::CliError;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// A temporary inbox folder plus a config file kept outside of it, so that
/// no `.sortboxrc.toml` from the working directory leaks into a test.
struct TestFixture {
    temp_dir: TempDir,
}

impl TestFixture {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::create_dir(temp_dir.path().join("inbox")).expect("Failed to create inbox");
        TestFixture { temp_dir }
    }

    /// The folder being organized.
    fn path(&self) -> PathBuf {
        self.temp_dir.path().join("inbox")
    }

    /// Write a config file next to the inbox and return its path.
    fn config(&self, content: &str) -> PathBuf {
        let config_path = self.temp_dir.path().join("sortbox.toml");
        fs::write(&config_path, content).expect("Failed to write config");
        config_path
    }

    fn run(&self, options: RunOptions) -> Result<RunReport, CliError> {
        self.run_with_config_file(options, "")
    }

    fn run_with_config_file(&self, options: RunOptions, content: &str) -> Result<RunReport, CliError> {
        let config_path = self.config(content);
        run_cli_with_config(&options, Some(&self.path()), Some(&config_path))
    }

    fn organize(&self) -> RunReport {
        self.run(RunOptions::default()).expect("run should succeed")
    }

    fn create_file(&self, name: &str, content: &[u8]) {
        let file_path = self.path().join(name);
        let mut file = File::create(&file_path).expect("Failed to create file");
        file.write_all(content)
            .expect("Failed to write file content");
    }

    fn create_text_file(&self, name: &str, content: &str) {
        self.create_file(name, content.as_bytes());
    }

    fn create_files(&self, names: &[&str]) {
        for name in names {
            self.create_text_file(name, name);
        }
    }

    fn create_subdir(&self, name: &str) {
        fs::create_dir(self.path().join(name)).expect("Failed to create subdirectory");
    }

    fn assert_dir_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {}",
            path.display()
        );
    }

    fn assert_file_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {}",
            path.display()
        );
    }

    fn assert_file_not_exists(&self, rel_path: &str) {
        let path = self.path().join(rel_path);
        assert!(!path.exists(), "File should not exist: {}", path.display());
    }

    fn read(&self, rel_path: &str) -> String {
        fs::read_to_string(self.path().join(rel_path)).expect("Failed to read file")
    }

    /// All files below the inbox, relative to it, sorted.
    fn list_files_recursive(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        Self::walk_dir(&self.path(), &mut files);
        let root = self.path();
        let mut files: Vec<PathBuf> = files
            .into_iter()
            .filter_map(|p| p.strip_prefix(&root).ok().map(Path::to_path_buf))
            .collect();
        files.sort();
        files
    }

    fn walk_dir(dir: &Path, files: &mut Vec<PathBuf>) {
        if let Ok(entries) = fs::read_dir(dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_file() {
                    files.push(path);
                } else if path.is_dir() {
                    Self::walk_dir(&path, files);
                }
            }
        }
    }
}

fn completed(report: RunReport) -> (sortbox::Statistics, PathBuf, Option<PathBuf>) {
    match report {
        RunReport::Completed {
            statistics,
            summary_path,
            json_path,
        } => (statistics, summary_path, json_path),
        RunReport::DryRun { .. } => panic!("expected a completed run"),
    }
}

fn dry(options: RunOptions) -> RunOptions {
    RunOptions {
        dry_run: true,
        ..options
    }
}

// ============================================================================
// Test Suite 1: Basic Organization
// ============================================================================

#[test]
fn test_organize_empty_directory() {
    let fixture = TestFixture::new();

    let (stats, summary_path, _) = completed(fixture.organize());

    assert_eq!(stats.total_processed, 0);
    assert_eq!(summary_path, fixture.path().join("organized/summary.md"));
    fixture.assert_file_exists("organized/summary.md");
    let report = fixture.read("organized/summary.md");
    assert!(report.contains("**Total Files Processed:** 0"));
    assert!(!report.contains("## Category Breakdown"));
}

#[test]
fn test_organize_basic_scenario() {
    let fixture = TestFixture::new();
    fixture.create_files(&["document.pdf", "photo.jpg", "script.py", "unknown.xyz"]);

    let (stats, _, _) = completed(fixture.organize());

    assert_eq!(stats.total_processed, 4);
    assert_eq!(stats.total_moved, 4);
    assert_eq!(stats.total_skipped, 0);
    fixture.assert_file_exists("organized/Documents/document.pdf");
    fixture.assert_file_exists("organized/Images/photo.jpg");
    fixture.assert_file_exists("organized/Code/script.py");
    fixture.assert_file_exists("organized/Miscellaneous/unknown.xyz");
    fixture.assert_file_not_exists("document.pdf");
}

#[test]
fn test_organize_preserves_file_content() {
    let fixture = TestFixture::new();
    fixture.create_text_file("notes.txt", "remember the milk");

    fixture.organize();

    assert_eq!(fixture.read("organized/Documents/notes.txt"), "remember the milk");
}

#[test]
fn test_organize_preserves_modification_time() {
    let fixture = TestFixture::new();
    fixture.create_text_file("old.pdf", "old");
    let past = SystemTime::now() - Duration::from_secs(86_400 * 30);
    File::options()
        .write(true)
        .open(fixture.path().join("old.pdf"))
        .and_then(|f| f.set_modified(past))
        .expect("Failed to set mtime");

    fixture.organize();

    let moved = fs::metadata(fixture.path().join("organized/Documents/old.pdf"))
        .and_then(|m| m.modified())
        .expect("Failed to read mtime");
    let drift = moved
        .duration_since(past)
        .unwrap_or_else(|e| e.duration());
    assert!(drift < Duration::from_secs(1));
}

#[test]
fn test_subdirectories_are_left_alone() {
    let fixture = TestFixture::new();
    fixture.create_subdir("projects");
    fixture.create_files(&["a.pdf"]);

    let (stats, _, _) = completed(fixture.organize());

    assert_eq!(stats.total_processed, 1);
    fixture.assert_dir_exists("projects");
    fixture.assert_dir_exists("organized/Documents");
}

// ============================================================================
// Test Suite 2: Classification Through the Pipeline
// ============================================================================

#[test]
fn test_mixed_case_extensions() {
    let fixture = TestFixture::new();
    fixture.create_files(&["PHOTO.JPG", "Report.Pdf"]);

    fixture.organize();

    fixture.assert_file_exists("organized/Images/PHOTO.JPG");
    fixture.assert_file_exists("organized/Documents/Report.Pdf");
}

#[test]
fn test_multiple_dots_use_last_extension() {
    let fixture = TestFixture::new();
    fixture.create_files(&["photo.backup.png", "archive.tar.gz"]);

    fixture.organize();

    fixture.assert_file_exists("organized/Images/photo.backup.png");
    fixture.assert_file_exists("organized/Archives/archive.tar.gz");
}

#[test]
fn test_mime_fallback_classification() {
    let fixture = TestFixture::new();
    fixture.create_files(&["readme.md", "clip.mpeg"]);

    fixture.organize();

    fixture.assert_file_exists("organized/Documents/readme.md");
    fixture.assert_file_exists("organized/Videos/clip.mpeg");
}

#[test]
fn test_heuristics_route_ambiguous_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["homework_week3.xyz", "invoice_march.xyz", "homework.pdf"]);

    fixture.organize();

    fixture.assert_file_exists("organized/Study/homework_week3.xyz");
    fixture.assert_file_exists("organized/Work/invoice_march.xyz");
    // A known extension is confident enough on its own.
    fixture.assert_file_exists("organized/Documents/homework.pdf");
}

#[test]
fn test_no_heuristics_flag() {
    let fixture = TestFixture::new();
    fixture.create_files(&["homework_week3.xyz"]);

    fixture
        .run(RunOptions {
            no_heuristics: true,
            ..RunOptions::default()
        })
        .expect("run should succeed");

    fixture.assert_file_exists("organized/Miscellaneous/homework_week3.xyz");
}

#[test]
fn test_files_without_extension() {
    let fixture = TestFixture::new();
    fixture.create_files(&["Makefile", "LICENSE"]);

    fixture.organize();

    fixture.assert_file_exists("organized/Miscellaneous/Makefile");
    fixture.assert_file_exists("organized/Miscellaneous/LICENSE");
}

// ============================================================================
// Test Suite 3: Dry-Run Mode
// ============================================================================

#[test]
fn test_dry_run_doesnt_move_files() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.png", "lecture_notes.xyz"]);

    let report = fixture.run(dry(RunOptions::default())).expect("dry run");

    let RunReport::DryRun { planned } = report else {
        panic!("expected a dry run");
    };
    assert_eq!(planned.len(), 3);
    assert_eq!(planned[2].classification.category, "Study");
    assert_eq!(planned[2].classification.method, Method::Merged);
    assert_eq!(
        planned[0].destination,
        fixture.path().join("organized/Documents/a.pdf")
    );
    fixture.assert_file_exists("a.pdf");
    fixture.assert_file_not_exists("organized");
}

#[test]
fn test_dry_run_vs_actual_organization() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.png", "c.zip"]);

    let RunReport::DryRun { planned } = fixture.run(dry(RunOptions::default())).expect("dry run")
    else {
        panic!("expected a dry run");
    };
    fixture.organize();

    for planned_move in planned {
        assert!(
            planned_move.destination.exists(),
            "planned destination should match actual: {}",
            planned_move.destination.display()
        );
    }
}

#[test]
fn test_dry_run_empty_directory() {
    let fixture = TestFixture::new();

    let RunReport::DryRun { planned } = fixture.run(dry(RunOptions::default())).expect("dry run")
    else {
        panic!("expected a dry run");
    };
    assert!(planned.is_empty());
    fixture.assert_file_not_exists("organized");
}

// ============================================================================
// Test Suite 4: Duplicates and Repeated Runs
// ============================================================================

#[test]
fn test_duplicates_are_renamed_in_sequence() {
    let fixture = TestFixture::new();

    for _ in 0..4 {
        fixture.create_text_file("report.pdf", "again");
        fixture.organize();
    }

    fixture.assert_file_exists("organized/Documents/report.pdf");
    fixture.assert_file_exists("organized/Documents/report_1.pdf");
    fixture.assert_file_exists("organized/Documents/report_2.pdf");
    fixture.assert_file_exists("organized/Documents/report_3.pdf");
}

#[test]
fn test_duplicate_skip_strategy_reports_error() {
    let fixture = TestFixture::new();
    let config = "[duplicates]\nstrategy = \"skip\"\n";

    fixture.create_text_file("report.pdf", "first");
    fixture
        .run_with_config_file(RunOptions::default(), config)
        .expect("first run");
    fixture.create_text_file("report.pdf", "second");
    let (stats, _, _) = completed(
        fixture
            .run_with_config_file(RunOptions::default(), config)
            .expect("second run"),
    );

    assert_eq!(stats.total_skipped, 1);
    fixture.assert_file_exists("report.pdf");
    assert_eq!(fixture.read("organized/Documents/report.pdf"), "first");
    let report = fixture.read("organized/summary.md");
    assert!(report.contains("## Errors"));
    assert!(report.contains("- `report.pdf`:"));
}

#[test]
fn test_duplicate_overwrite_strategy() {
    let fixture = TestFixture::new();
    let config = "[duplicates]\nstrategy = \"overwrite\"\n";

    fixture.create_text_file("report.pdf", "first");
    fixture
        .run_with_config_file(RunOptions::default(), config)
        .expect("first run");
    fixture.create_text_file("report.pdf", "second");
    fixture
        .run_with_config_file(RunOptions::default(), config)
        .expect("second run");

    assert_eq!(fixture.read("organized/Documents/report.pdf"), "second");
    fixture.assert_file_not_exists("organized/Documents/report_1.pdf");
}

#[test]
fn test_custom_suffix_pattern() {
    let fixture = TestFixture::new();
    let config = "[duplicates]\nsuffix_pattern = \" ({n})\"\n";

    for _ in 0..2 {
        fixture.create_text_file("photo.png", "px");
        fixture
            .run_with_config_file(RunOptions::default(), config)
            .expect("run");
    }

    fixture.assert_file_exists("organized/Images/photo (1).png");
}

#[test]
fn test_organize_then_add_files_then_organize_again() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf"]);
    fixture.organize();

    fixture.create_files(&["b.png"]);
    let (stats, _, _) = completed(fixture.organize());

    assert_eq!(stats.total_processed, 1);
    assert_eq!(
        fixture.list_files_recursive(),
        vec![
            PathBuf::from("organized/Documents/a.pdf"),
            PathBuf::from("organized/Images/b.png"),
            PathBuf::from("organized/summary.md"),
        ]
    );
}

// ============================================================================
// Test Suite 5: Configuration and Filtering
// ============================================================================

#[test]
fn test_system_files_are_skipped() {
    let fixture = TestFixture::new();
    fixture.create_files(&["movie.mkv.part", "setup.crdownload", "scratch.tmp", "a.pdf"]);

    let (stats, _, _) = completed(fixture.organize());

    assert_eq!(stats.total_processed, 1);
    fixture.assert_file_exists("movie.mkv.part");
    fixture.assert_file_exists("setup.crdownload");
    fixture.assert_file_exists("scratch.tmp");
}

#[test]
fn test_hidden_files_excluded_by_default() {
    let fixture = TestFixture::new();
    fixture.create_files(&[".secret.pdf", "visible.pdf"]);

    fixture.organize();

    fixture.assert_file_exists(".secret.pdf");
    fixture.assert_file_exists("organized/Documents/visible.pdf");
}

#[test]
fn test_hidden_files_included_when_enabled() {
    let fixture = TestFixture::new();
    fixture.create_files(&[".secret.pdf"]);

    fixture
        .run_with_config_file(
            RunOptions::default(),
            "[filters]\nenable_hidden_files = true\n",
        )
        .expect("run");

    fixture.assert_file_exists("organized/Documents/.secret.pdf");
}

#[test]
fn test_organize_with_exclude_pattern() {
    let fixture = TestFixture::new();
    fixture.create_files(&["photo.png", "ubuntu.iso", "keep_me.pdf"]);

    let config = r#"
[filters]
exclude_patterns = ["*.iso"]
exclude_regex = ["^keep_"]
"#;
    fixture
        .run_with_config_file(RunOptions::default(), config)
        .expect("run");

    fixture.assert_file_exists("organized/Images/photo.png");
    fixture.assert_file_exists("ubuntu.iso");
    fixture.assert_file_exists("keep_me.pdf");
}

#[test]
fn test_custom_categories() {
    let fixture = TestFixture::new();
    fixture.create_files(&["book.epub", "song.mp3"]);

    let config = r#"
organized_folder = "sorted"

[categories]
Books = ["epub"]
Music = [".MP3"]
"#;
    fixture
        .run_with_config_file(RunOptions::default(), config)
        .expect("run");

    fixture.assert_file_exists("sorted/Books/book.epub");
    fixture.assert_file_exists("sorted/Music/song.mp3");
    fixture.assert_file_exists("sorted/summary.md");
}

#[test]
fn test_missing_config_file_is_an_error() {
    let fixture = TestFixture::new();
    let missing = fixture.path().join("nope.toml");

    let result = run_cli_with_config(&RunOptions::default(), Some(&fixture.path()), Some(&missing));

    assert!(matches!(
        result,
        Err(CliError::Config(ConfigError::ConfigNotFound(_)))
    ));
}

#[test]
fn test_invalid_config_is_rejected_before_any_move() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf"]);

    let result = fixture.run_with_config_file(
        RunOptions::default(),
        "[duplicates]\nsuffix_pattern = \"_copy\"\n",
    );

    assert!(matches!(
        result,
        Err(CliError::Config(ConfigError::Validation(_)))
    ));
    fixture.assert_file_exists("a.pdf");
    fixture.assert_file_not_exists("organized");
}

#[test]
fn test_threshold_override_is_validated() {
    let fixture = TestFixture::new();

    let result = fixture.run(RunOptions {
        threshold: Some(1.5),
        ..RunOptions::default()
    });

    assert!(matches!(
        result,
        Err(CliError::Config(ConfigError::Validation(_)))
    ));
}

#[test]
fn test_missing_folder_is_an_error() {
    let fixture = TestFixture::new();
    let config_path = fixture.config("");
    let missing = fixture.path().join("does-not-exist");

    let result = run_cli_with_config(&RunOptions::default(), Some(&missing), Some(&config_path));

    assert!(matches!(result, Err(CliError::Scan(_))));
}

// ============================================================================
// Test Suite 6: Reports
// ============================================================================

#[test]
fn test_summary_report_contents() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.pdf", "c.pdf", "d.png"]);

    fixture.organize();

    let report = fixture.read("organized/summary.md");
    assert!(report.starts_with("# Cleanup Summary"));
    assert!(report.contains("**Total Files Moved:** 4"));
    assert!(report.contains("**Files Skipped:** 0"));
    assert!(report.contains("| Documents | 3 | 75.0% |"));
    assert!(report.contains("| Images | 1 | 25.0% |"));
    assert!(report.contains("### Documents"));
    assert!(report.contains("- `a.pdf` → organized/Documents/a.pdf (File extension '.pdf' maps to Documents)"));
    assert!(!report.contains("- `c.pdf`"), "only two samples per category");
    assert!(!report.contains("## Errors"));
}

#[test]
fn test_json_report() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "homework.xyz"]);

    let (_, _, json_path) = completed(
        fixture
            .run(RunOptions {
                json: true,
                ..RunOptions::default()
            })
            .expect("run"),
    );

    let json_path = json_path.expect("json report path");
    assert_eq!(json_path, fixture.path().join("organized/summary.json"));
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(json_path).expect("read json")).expect("parse json");
    assert_eq!(value["total_processed"], 2);
    assert_eq!(value["total_moved"], 2);
    assert_eq!(value["breakdown"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_no_json_without_flag() {
    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf"]);

    let (_, _, json_path) = completed(fixture.organize());

    assert!(json_path.is_none());
    fixture.assert_file_not_exists("organized/summary.json");
}

#[cfg(unix)]
#[test]
fn test_unwritable_category_is_reported_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let fixture = TestFixture::new();
    fixture.create_files(&["a.pdf", "b.png"]);
    fs::create_dir_all(fixture.path().join("organized/Documents")).expect("mkdir");
    let documents = fixture.path().join("organized/Documents");
    fs::set_permissions(&documents, fs::Permissions::from_mode(0o555)).expect("chmod");

    // Root ignores permission bits; nothing to observe then.
    if File::create(documents.join("write_check")).is_ok() {
        let _ = fs::remove_file(documents.join("write_check"));
        fs::set_permissions(&documents, fs::Permissions::from_mode(0o755)).expect("chmod");
        return;
    }

    let result = fixture.organize();
    fs::set_permissions(&documents, fs::Permissions::from_mode(0o755)).expect("chmod");
    let (stats, _, _) = completed(result);

    assert_eq!(stats.total_processed, 2);
    assert_eq!(stats.total_moved, 1);
    assert_eq!(stats.total_skipped, 1);
    fixture.assert_file_exists("a.pdf");
    fixture.assert_file_exists("organized/Images/b.png");
    let report = fixture.read("organized/summary.md");
    assert!(report.contains("## Errors"));
    assert!(report.contains("- `a.pdf`:"));
}
