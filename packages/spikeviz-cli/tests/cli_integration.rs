use assert_cmd::Command;
use predicates::prelude::*;

fn spikeviz() -> Command {
    Command::cargo_bin("spikeviz").unwrap()
}

// =============================================================================
// GENERAL
// =============================================================================

#[test]
fn test_no_args_shows_help() {
    spikeviz()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[test]
fn test_version_flag() {
    spikeviz()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("spikeviz"));
}

#[test]
fn test_help_flag() {
    spikeviz()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("raster"))
        .stdout(predicate::str::contains("activity"));
}

// =============================================================================
// COLORMAPS SUBCOMMAND
// =============================================================================

#[test]
fn test_colormaps_subcommand() {
    spikeviz()
        .arg("colormaps")
        .assert()
        .success()
        .stdout(predicate::str::contains("RdBu"))
        .stdout(predicate::str::contains("viridis"));
}

#[test]
fn test_colormaps_json() {
    let output = spikeviz().arg("colormaps").arg("--json").assert().success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let names: Vec<&str> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert!(names.contains(&"RdBu"));
    assert!(names.contains(&"coolwarm"));
    assert_eq!(names.iter().filter(|n| n.eq_ignore_ascii_case("gray")).count(), 1);
    assert!(!names.contains(&"grey"));
}

// =============================================================================
// INFO SUBCOMMAND
// =============================================================================

#[test]
fn test_info_subcommand() {
    spikeviz()
        .arg("info")
        .env_remove("SPIKEVIZ_FFMPEG")
        .assert()
        .success()
        .stdout(predicate::str::contains("spikeviz CLI"))
        .stdout(predicate::str::contains("Writers:"));
}

#[test]
fn test_info_json_with_missing_ffmpeg() {
    let output = spikeviz()
        .arg("info")
        .arg("--json")
        .arg("--ffmpeg")
        .arg("/definitely/not/here/ffmpeg")
        .assert()
        .success();

    let stdout = String::from_utf8(output.get_output().stdout.clone()).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["ffmpeg_found"], false);
    assert!(parsed["ffmpeg_path"].is_null());
    assert!(parsed.get("cli_version").is_some());
}

// =============================================================================
// ARGUMENT ERRORS
// =============================================================================

#[test]
fn test_raster_missing_input_arg() {
    spikeviz()
        .arg("raster")
        .arg("--output")
        .arg("out.png")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--input"));
}

#[test]
fn test_invalid_size() {
    spikeviz()
        .args(["raster", "--input", "in.json", "--output", "out.png", "--size", "big"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("WIDTHxHEIGHT"));
}

#[test]
fn test_invalid_dt() {
    spikeviz()
        .args(["cube", "--input", "in.json", "--output", "out.gif", "--dt", "0.5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing unit"));
}

#[test]
fn test_nonexistent_input_file() {
    spikeviz()
        .args(["cube", "--input", "/nonexistent/cube.json", "--output", "out.gif"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Error"));
}
