use std::path::Path;
use std::process::Command;

/// Fixture tree shared by the tests.
const BASIC: &str = "tests/fixtures/basic";

fn xcite_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_xcite"))
}

/// Copy a fixture tree into a fresh temporary directory, so resolving in
/// place never touches the checked-in fixtures.
fn copy_fixture(fixture: &str) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    copy_dir(Path::new(fixture), dir.path());
    dir
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let dest = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &dest);
        } else {
            std::fs::copy(entry.path(), dest).unwrap();
        }
    }
}

#[test]
fn resolve_in_place_matches_expected() {
    let dir = copy_fixture(BASIC);

    let out = xcite_cmd()
        .args(["resolve", "cite.txt", "--source-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));

    let resolved = std::fs::read_to_string(dir.path().join("cite.txt")).unwrap();
    let expected = std::fs::read_to_string(dir.path().join("resolved.txt")).unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn relative_citation_resolves_from_citing_dir() {
    let dir = copy_fixture(BASIC);
    let output_dir = dir.path().join("out");

    let out = xcite_cmd()
        .args(["resolve", "guide/relative.txt", "--source-dir"])
        .arg(dir.path())
        .arg("--output-dir")
        .arg(&output_dir)
        .output()
        .unwrap();
    assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));

    let resolved = std::fs::read_to_string(output_dir.join("guide/relative.txt")).unwrap();
    let expected = std::fs::read_to_string(dir.path().join("guide/expected.txt")).unwrap();
    assert_eq!(resolved, expected);
    // The input is untouched when writing elsewhere.
    let input = std::fs::read_to_string(dir.path().join("guide/relative.txt")).unwrap();
    assert_eq!(input, "Quoted: [snippet.txt:2]\n");
}

#[test]
fn quote_prints_pattern_match() {
    let out = xcite_cmd()
        .args(["quote", "[file.txt%// To be included]", "--base"])
        .arg(Path::new(BASIC).join("cite.txt"))
        .output()
        .unwrap();
    assert!(out.status.success(), "quote failed: {}", String::from_utf8_lossy(&out.stderr));

    let expected = std::fs::read_to_string(Path::new(BASIC).join("resolved.txt")).unwrap();
    assert_eq!(String::from_utf8_lossy(&out.stdout), expected);
}

#[test]
fn quote_keeps_missing_target() {
    let dir = tempfile::tempdir().unwrap();
    let out = xcite_cmd()
        .args(["quote", "[does-not-exist.txt]", "--base"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout), "[does-not-exist.txt]\n");
}

#[test]
fn strict_quote_fails_on_missing_target() {
    let dir = tempfile::tempdir().unwrap();
    let out = xcite_cmd()
        .args(["quote", "[does-not-exist.txt]", "--strict", "--base"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unresolved Citation"));
}

#[test]
fn failing_file_is_reported_and_others_resolve() {
    let dir = copy_fixture(BASIC);
    std::fs::write(dir.path().join("bad.txt"), "[file.txt:99]\n").unwrap();

    let out = xcite_cmd()
        .args(["resolve", "bad.txt", "cite.txt", "--format", "json", "--source-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["failed"], 1);
    assert_eq!(report["resolved"], 1);
    assert_eq!(report["files"][0]["file"], "bad.txt");
    assert!(report["files"][0]["error"].as_str().unwrap().contains("line 99 out of range"));
    assert_eq!(report["files"][1]["citations"], 1);

    let resolved = std::fs::read_to_string(dir.path().join("cite.txt")).unwrap();
    assert_eq!(resolved, "This text comes from file.txt.\n");
}

#[test]
fn resolve_without_files_walks_source_dir() {
    let dir = copy_fixture(BASIC);
    let output_dir = dir.path().join("out");

    let out = xcite_cmd()
        .args(["resolve", "--source-dir"])
        .arg(dir.path())
        .arg("--output-dir")
        .arg(&output_dir)
        .output()
        .unwrap();
    assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("All 6 files resolved"), "unexpected report: {stdout}");
    let cite = std::fs::read_to_string(output_dir.join("cite.txt")).unwrap();
    assert_eq!(cite, "This text comes from file.txt.\n");
}

#[test]
fn repeated_resolve_skips_previous_output() {
    let dir = copy_fixture(BASIC);

    for _ in 0..2 {
        let out = xcite_cmd()
            .current_dir(dir.path())
            .args(["resolve", "--output-dir", "build"])
            .output()
            .unwrap();
        assert!(out.status.success(), "resolve failed: {}", String::from_utf8_lossy(&out.stderr));
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("All 6 files resolved"), "unexpected report: {stdout}");
        assert!(!stdout.contains("build/"), "output was re-resolved: {stdout}");
    }

    assert!(dir.path().join("build/cite.txt").exists());
    assert!(!dir.path().join("build/build").exists());
}

#[test]
fn list_prints_marker_locations() {
    let out = xcite_cmd().args(["list", "--source-dir", BASIC]).output().unwrap();
    assert!(out.status.success());

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("cite.txt:1: [file.txt%// To be included]"));
    assert!(stdout.contains("relative.txt:1: [snippet.txt:2]"));
}
