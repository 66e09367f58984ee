//! Spawning fixture binaries for cross-process determinism tests.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Path of a fixture binary built alongside the calling test binary.
///
/// Test binaries live in `target/<profile>/deps/`; fixture binaries live one
/// directory up.
///
/// # Panics
///
/// Panics if the current executable path cannot be resolved.
#[must_use]
pub fn binary_path(name: &str) -> PathBuf {
    let mut path = std::env::current_exe()
        .expect("can resolve test binary path")
        .parent()
        .expect("binary dir exists")
        .parent()
        .expect("deps parent exists")
        .to_path_buf();
    path.push(name);
    path
}

/// The workspace root (two levels above this crate's manifest).
///
/// # Panics
///
/// Panics if the manifest directory has fewer than two ancestors.
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("tests/ exists")
        .parent()
        .expect("workspace root exists")
        .to_path_buf()
}

/// Run fixture `name` in `work_dir` with locale variables cleared and
/// `env_overrides` applied. Returns stdout.
///
/// # Panics
///
/// Panics if the binary cannot be spawned, exits non-zero, or prints
/// non-UTF-8 output.
#[must_use]
pub fn run_variant(name: &str, work_dir: &Path, env_overrides: &[(&str, &str)]) -> String {
    let bin = binary_path(name);

    let mut command = Command::new(&bin);
    command
        .current_dir(work_dir)
        .env_remove("LC_ALL")
        .env_remove("LC_COLLATE")
        .env_remove("LANG")
        .env_remove("LANGUAGE");
    for &(key, val) in env_overrides {
        command.env(key, val);
    }

    let output = command.output().unwrap_or_else(|e| {
        panic!(
            "failed to spawn {} (work_dir={}, overrides={env_overrides:?}): {e}",
            bin.display(),
            work_dir.display()
        )
    });
    assert!(
        output.status.success(),
        "{name} exited with {}: stderr={}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout is valid UTF-8")
}

/// Assert that `name` prints identical output under four environment
/// variants: baseline, another working directory, a non-C locale and a
/// different timezone.
///
/// Returns the baseline output for further checks.
///
/// # Panics
///
/// Panics if any variant differs from the baseline.
#[must_use]
pub fn assert_env_invariant(name: &str) -> String {
    let root = workspace_root();
    let baseline = run_variant(name, &root, &[]);

    let alt_cwd = std::env::temp_dir();
    let variants: [(&Path, &[(&str, &str)]); 3] = [
        (alt_cwd.as_path(), &[]),
        (root.as_path(), &[("LANG", "tr_TR.UTF-8"), ("LC_ALL", "tr_TR.UTF-8")]),
        (root.as_path(), &[("TZ", "Pacific/Kiritimati")]),
    ];
    for (dir, overrides) in variants {
        let output = run_variant(name, dir, overrides);
        assert_eq!(
            baseline,
            output,
            "{name} output differs (cwd={}, overrides={overrides:?})",
            dir.display()
        );
    }
    baseline
}
