use assert_cmd::Command;
use filetime::{set_file_mtime, FileTime};
use serde_json::Value;
use std::fs;
#[cfg(unix)]
use std::os::unix::fs as unix_fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper struct to manage test directories
struct TestFixture {
    temp_dir: TempDir,
    config_dir: TempDir,
    left_dir: PathBuf,
    right_dir: PathBuf,
}

impl TestFixture {
    /// Create a new test fixture with left and right directories
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config_dir = TempDir::new().expect("Failed to create config dir");
        let left_dir = temp_dir.path().join("left");
        let right_dir = temp_dir.path().join("right");

        fs::create_dir(&left_dir).expect("Failed to create left dir");
        fs::create_dir(&right_dir).expect("Failed to create right dir");

        TestFixture {
            temp_dir,
            config_dir,
            left_dir,
            right_dir,
        }
    }

    /// Create the same file on both sides
    fn create_both<P: AsRef<Path>>(&self, path: P, content: &str) {
        self.create_file(&self.left_dir, path.as_ref(), content);
        self.create_file(&self.right_dir, path.as_ref(), content);
    }

    /// Create a file with content in the left directory
    fn create_left_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.left_dir, path, content)
    }

    /// Create a file with content in the right directory
    fn create_right_file<P: AsRef<Path>>(&self, path: P, content: &str) -> PathBuf {
        self.create_file(&self.right_dir, path, content)
    }

    /// Create a file with content in the specified base directory
    fn create_file<P: AsRef<Path>>(&self, base: &Path, path: P, content: &str) -> PathBuf {
        let file_path = base.join(path.as_ref());

        // Create parent directories if needed
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }

        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Give every entry on both sides the same modification time
    fn pin_mtimes(&self) {
        pin_tree(&self.left_dir);
        pin_tree(&self.right_dir);
    }

    fn left(&self) -> &Path {
        &self.left_dir
    }

    fn right(&self) -> &Path {
        &self.right_dir
    }

    fn path_str(path: &Path) -> &str {
        path.to_str().expect("non-utf8 temp path")
    }

    /// Run the binary against left and right with extra leading arguments
    fn run(&self, args: &[&str]) -> std::process::Output {
        let mut all: Vec<&str> = args.to_vec();
        all.push(Self::path_str(self.left()));
        all.push(Self::path_str(self.right()));
        run_cli(&self.config_dir, &all)
    }
}

fn pinned() -> FileTime {
    FileTime::from_unix_time(1_600_000_000, 0)
}

fn pin_tree(root: &Path) {
    for entry in fs::read_dir(root).expect("read_dir") {
        let path = entry.expect("dir entry").path();
        let meta = fs::symlink_metadata(&path).expect("metadata");
        if meta.file_type().is_symlink() {
            filetime::set_symlink_file_times(&path, pinned(), pinned()).expect("set link times");
            continue;
        }
        if meta.is_dir() {
            pin_tree(&path);
        }
        set_file_mtime(&path, pinned()).expect("Failed to set mtime");
    }
    set_file_mtime(root, pinned()).expect("Failed to set mtime");
}

/// Helper to run the CLI binary with an isolated config directory
fn run_cli(config_dir: &TempDir, args: &[&str]) -> std::process::Output {
    Command::cargo_bin("dircmp")
        .expect("dircmp binary")
        .args(args)
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env("HOME", config_dir.path())
        .env("APPDATA", config_dir.path())
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute command")
}

fn scenario() -> TestFixture {
    let fixture = TestFixture::new();
    fixture.create_both("file1", "0123456789");
    fixture.create_both("sub/file2", "nested file content");
    fixture.pin_mtimes();
    fixture
}

#[test]
fn test_identical_trees_exit_zero() {
    let fixture = scenario();
    let output = fixture.run(&[]);

    assert_eq!(output.status.code(), Some(0));
    assert!(output.stdout.is_empty(), "unexpected output: {:?}", output);
}

#[test]
fn test_content_change_exit_one() {
    let fixture = scenario();
    fixture.create_right_file("sub/file2", "nested FILE content");
    fixture.pin_mtimes();

    let output = fixture.run(&[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_extra_entry_exit_one() {
    let fixture = scenario();
    fixture.create_right_file("sub/extra", "extra");
    fixture.pin_mtimes();

    let output = fixture.run(&[]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_missing_directory_exit_two() {
    let fixture = TestFixture::new();
    let missing = fixture.temp_dir.path().join("missing");

    let output = run_cli(
        &fixture.config_dir,
        &[
            TestFixture::path_str(fixture.left()),
            TestFixture::path_str(&missing),
        ],
    );
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_usage_errors() {
    let fixture = TestFixture::new();

    let output = run_cli(&fixture.config_dir, &[TestFixture::path_str(fixture.left())]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Usage"));

    let output = fixture.run(&["-x"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_debug_trace_does_not_change_result() {
    let fixture = scenario();

    let output = fixture.run(&["-d"]);
    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Compare:"), "missing trace: {}", stdout);
    assert!(stdout.contains("file2"));

    fixture.create_right_file("file1", "9876543210");
    fixture.pin_mtimes();
    assert_eq!(fixture.run(&[]).status.code(), Some(1));
    let traced = fixture.run(&["-d"]);
    assert_eq!(traced.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&traced.stdout).contains("Content test fail"));
}

#[test]
fn test_json_report() {
    let fixture = scenario();
    fixture.create_right_file("file1", "0123456780");
    fixture.pin_mtimes();

    let output = fixture.run(&["--json"]);
    assert_eq!(output.status.code(), Some(1));

    let report: Value = serde_json::from_slice(&output.stdout).expect("invalid json output");
    assert_eq!(report["result"], "not_equivalent");
    assert_eq!(report["exit_code"], 1);
    assert_eq!(report["mismatch"]["detail"]["check"], "content");
    assert!(report["mismatch"]["right"]
        .as_str()
        .expect("right path")
        .ends_with("file1"));
}

#[test]
fn test_json_report_with_debug_keeps_stdout_clean() {
    let fixture = scenario();

    let output = fixture.run(&["-d", "--json"]);
    assert_eq!(output.status.code(), Some(0));

    let report: Value = serde_json::from_slice(&output.stdout).expect("invalid json output");
    assert_eq!(report["result"], "equivalent");
    assert!(String::from_utf8_lossy(&output.stderr).contains("Compare:"));
}

#[test]
fn test_strict_names_flag() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.txt", "same");
    fixture.create_right_file("b.txt", "same");
    fixture.pin_mtimes();

    // Count-only check passes the listing, then the right child is missing
    assert_eq!(fixture.run(&[]).status.code(), Some(2));
    assert_eq!(fixture.run(&["--strict-names"]).status.code(), Some(1));
}

#[test]
fn test_config_file_enables_strict_names() {
    let fixture = TestFixture::new();
    fixture.create_left_file("a.txt", "same");
    fixture.create_right_file("b.txt", "same");
    fixture.pin_mtimes();

    let config_path = fixture.config_dir.path().join("custom.toml");
    fs::write(&config_path, "strict_names = true\n").expect("write config");

    let output = fixture.run(&["--config", TestFixture::path_str(&config_path)]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_bad_config_exit_two() {
    let fixture = scenario();
    let config_path = fixture.config_dir.path().join("broken.toml");
    fs::write(&config_path, "strict_names = maybe\n").expect("write config");

    let output = fixture.run(&["-c", TestFixture::path_str(&config_path)]);
    assert_eq!(output.status.code(), Some(2));
}

#[cfg(unix)]
#[test]
fn test_follow_symlinks_flag() {
    let fixture = TestFixture::new();
    let outside = fixture.temp_dir.path().join("outside.txt");
    fs::write(&outside, "shared content").expect("write target");
    set_file_mtime(&outside, pinned()).expect("set mtime");
    unix_fs::symlink(&outside, fixture.left().join("data")).expect("symlink");
    fixture.create_right_file("data", "shared content");
    fixture.pin_mtimes();

    assert_eq!(fixture.run(&[]).status.code(), Some(1));
    assert_eq!(fixture.run(&["-f"]).status.code(), Some(0));
}
