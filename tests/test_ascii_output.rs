//! Integration tests for ASCII output and the command line tool.

use std::fs;
use std::process::Command;
use strata::{render_ascii, write_ascii, GenerationParams, GeneratorKind, Grid, StrataResult};
use tempfile::tempdir;

#[test]
fn test_write_ascii_matches_grid() -> StrataResult<()> {
    let grid = GeneratorKind::Bsp.generate(12345, &GenerationParams::new("fantasy").with_size(40, 30))?;
    let dir = tempdir()?;
    let path = dir.path().join("dungeon.txt");
    write_ascii(&grid, &path)?;

    let written = fs::read_to_string(&path)?;
    assert_eq!(written, render_ascii(&grid));
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines.len(), 30);
    assert!(lines.iter().all(|line| line.chars().count() == 40));
    assert_eq!(written.matches('^').count(), 1);
    assert_eq!(written.matches('v').count(), 1);
    Ok(())
}

#[test]
fn test_json_round_trip() -> StrataResult<()> {
    let grid = GeneratorKind::Forest.generate(8, &GenerationParams::new("fantasy").with_size(50, 40))?;
    let json = serde_json::to_string(&grid)?;
    let restored: Grid = serde_json::from_str(&json)?;
    assert_eq!(restored, grid);
    Ok(())
}

#[test]
fn test_cli_writes_output_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cave.txt");
    let status = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["--algorithm", "cellular", "--width", "50", "--height", "30", "--seed", "4"])
        .arg("--output")
        .arg(&path)
        .status()
        .unwrap();
    assert!(status.success());

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written.lines().count(), 30);
    let expected = GeneratorKind::Cellular
        .generate(4, &GenerationParams::default().with_size(50, 30))
        .unwrap();
    assert_eq!(written, render_ascii(&expected));
}

#[test]
fn test_cli_reads_params_file_and_stitches_levels() {
    let dir = tempdir().unwrap();
    let params_path = dir.path().join("params.json");
    fs::write(&params_path, r#"{"genreId": "horror", "custom": {"width": 41, "height": 31}}"#).unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["--algorithm", "maze", "--levels", "3", "--seed", "9"])
        .arg("--params")
        .arg(&params_path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let text = String::from_utf8(output.stdout).unwrap();
    let levels: Vec<&str> = text.split("\n\n").collect();
    assert_eq!(levels.len(), 3);
    assert!(levels.iter().all(|level| level.lines().count() == 31));
}

#[test]
fn test_cli_fails_on_bad_dimensions() {
    let status = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["--algorithm", "composite", "--width", "30", "--height", "20"])
        .status()
        .unwrap();
    assert!(!status.success());

    let status = Command::new(env!("CARGO_BIN_EXE_strata"))
        .args(["--algorithm", "hexes"])
        .status()
        .unwrap();
    assert!(!status.success());
}
