use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;

fn juliet() -> Command {
    let mut cmd = Command::cargo_bin("juliet").unwrap();
    cmd.env_remove("JULIET_TIMEOUT_SECS")
        .env_remove("JULIET_PARALLEL")
        .env("JULIET_LOG", "warn");
    cmd
}

#[test]
fn report_on_missing_database_is_a_setup_error() {
    let dir = tempfile::tempdir().unwrap();
    juliet()
        .current_dir(dir.path())
        .args(["report", "all"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("database file doesn't exist"));
}

#[test]
fn unknown_category_is_rejected_by_the_parser() {
    juliet()
        .args(["report", "heap-overflows"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("heap-overflows"));
}

#[test]
fn missing_emulator_binary_fails_before_any_work() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("collect.db");
    juliet()
        .args(["run", "/nonexistent/qte-qemu", "/nonexistent/libqte.so", "/bin/sh", "/bin/sh"])
        .args(["--testsuite", "qte", "--corpus"])
        .arg(dir.path())
        .arg("--database")
        .arg(&db)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("qte binary doesn't exist"));
    assert!(!db.exists());
}

#[cfg(unix)]
fn link(root: &Path, rel: &str, target: &str) {
    let p = root.join(rel);
    std::fs::create_dir_all(p.parent().unwrap()).unwrap();
    std::os::unix::fs::symlink(target, p).unwrap();
}

#[cfg(unix)]
#[test]
fn native_run_then_report() {
    let corpus = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let db = out.path().join("collect.db");
    let class = "CWE416_Use_After_Free";
    for i in 0..4 {
        link(
            corpus.path(),
            &format!("asan_tests/{class}/good/{class}__malloc_{i:02}.out"),
            "/bin/true",
        );
        link(
            corpus.path(),
            &format!("asan_tests/{class}/bad/{class}__malloc_{i:02}.out"),
            "/bin/false",
        );
    }

    juliet()
        .args(["run", "qte-qemu", "libqte.so", "qasan-qemu", "libqasan.so"])
        .args(["--testsuite", "asan", "--jobs", "2", "--corpus"])
        .arg(corpus.path())
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stderr(predicate::str::contains("4 good, 4 bad"));

    let output = juliet()
        .args(["report", "CWE416", "--format", "json", "--database"])
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let s = &v["summaries"][0];
    assert_eq!(s["tool"], "asan");
    assert_eq!(s["total"], 8);
    assert_eq!(s["tp"], 4);
    assert_eq!(s["tn"], 4);
    assert_eq!(s["ratios"]["sensitivity"], 1.0);

    // Second run finds every row already stored.
    juliet()
        .args(["run", "qte-qemu", "libqte.so", "qasan-qemu", "libqasan.so"])
        .args(["--testsuite", "asan", "--corpus"])
        .arg(corpus.path())
        .arg("--database")
        .arg(&db)
        .assert()
        .success()
        .stderr(predicate::str::contains("0 new, 8 duplicates skipped"));

    juliet()
        .args(["report", "all", "--debug", "yes", "--database"])
        .arg(&db)
        .assert()
        .success()
        .stdout(predicate::str::contains("ASAN / CWE416_Use_After_Free"))
        .stderr(predicate::str::contains("Executing query :"));
}
