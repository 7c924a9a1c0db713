use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn renders_a_small_png() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("cardioid.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", out.to_str().unwrap()])
        .args(&["--size", "64x48", "--center", "-0.5,0", "--zoom", "3"])
        .args(&["--iterations", "50", "--threads", "2"])
        .assert()
        .success();
    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

#[test]
fn renders_a_ppm_by_extension() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("cardioid.ppm");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", out.to_str().unwrap(), "-s", "16x16", "-z", "3", "-i", "20"])
        .args(&["-c", "-0.5,0"])
        .assert()
        .success();
    let bytes = fs::read(&out).unwrap();
    assert!(bytes.starts_with(b"P6"));
    assert!(bytes.len() > 16 * 16 * 3);
}

#[test]
fn rejects_a_bad_size() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "never.png", "--size", "wide"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not parse output image size"));
}

#[test]
fn rejects_a_non_positive_zoom() {
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", "never.png", "--zoom", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Zoom must be a positive number"));
}

#[test]
fn reports_unwritable_output() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("missing").join("x.png");
    Command::cargo_bin("mandelbrot")
        .unwrap()
        .args(&["-o", out.to_str().unwrap(), "-s", "8x8", "-i", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not save"));
}
