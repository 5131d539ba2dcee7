//! Shape lifecycle misuse terminates the process with a diagnostic.
//!
//! Each case re-runs this test binary as a child selected through
//! `PALISADE_CRASH_CASE`.

use palisade_core::Entity;
use palisade_geometry::{Aabb, Sphere, Vec3};
use std::process::Command;

const CASE_ENV: &str = "PALISADE_CRASH_CASE";
const SURVIVED: &str = "process survived the violation";

fn selected(case: &str) -> bool {
    std::env::var(CASE_ENV).map_or(false, |value| value == case)
}

fn assert_terminates(case: &str, diagnostic: &str) {
    let exe = std::env::current_exe().unwrap();
    let output = Command::new(exe)
        .args(["--exact", case, "--nocapture", "--test-threads=1"])
        .env(CASE_ENV, case)
        .output()
        .unwrap();
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&output.stderr));

    assert!(!output.status.success(), "{case} exited normally:\n{text}");
    assert!(text.contains(diagnostic), "{case} output lacks diagnostic:\n{text}");
    assert!(!text.contains(SURVIVED), "{case} kept running:\n{text}");
}

#[test]
fn crash_case_box_initialized_twice() {
    if !selected("crash_case_box_initialized_twice") {
        return;
    }
    let mut shape = Aabb::new();
    shape.initialize_bounds(0.0, 0.0, 1.0, 1.0).unwrap();
    let _ = shape.initialize_bounds(0.0, 0.0, 1.0, 1.0);
    eprintln!("{SURVIVED}");
}

#[test]
fn crash_case_sphere_read_after_destroy() {
    if !selected("crash_case_sphere_read_after_destroy") {
        return;
    }
    let mut shape = Sphere::new();
    shape.initialize_shape(Vec3::ZERO, 1.0).unwrap();
    shape.destroy().unwrap();
    let _ = shape.radius();
    eprintln!("{SURVIVED}");
}

#[test]
fn test_box_initialized_twice_terminates() {
    assert_terminates(
        "crash_case_box_initialized_twice",
        "Aabb lifecycle error: initialize_bounds: called while object is already initialized",
    );
}

#[test]
fn test_sphere_read_after_destroy_terminates() {
    assert_terminates(
        "crash_case_sphere_read_after_destroy",
        "Sphere lifecycle error: radius: called while object is not initialized",
    );
}
