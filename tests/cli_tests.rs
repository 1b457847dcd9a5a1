#[cfg(test)]
mod cli_integration_tests {
    use std::fs;
    use std::path::Path;
    use assert_cmd::Command;
    use tempfile::{tempdir, TempDir};

    /// `addons` pointed at `dir`, isolated from the user's config and environment.
    fn addons(dir: &Path) -> Command {
        let config = dir.join("config.toml");
        if !config.exists() {
            fs::write(&config, "").unwrap();
        }
        let mut cmd = Command::cargo_bin("addons").unwrap();
        cmd.env_remove("ADDONS_BASE_DIR")
            .env_remove("ADDONS_INSTALL_LOCATION")
            .env_remove("ADDONS_STATE_PATH")
            .env_remove("RUST_LOG")
            .arg("--base-dir")
            .arg(dir)
            .arg("--config")
            .arg(&config);
        cmd
    }

    /// Two installed units, `owner/b` depending on `owner/a`.
    fn installed_pair() -> TempDir {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("owner").join("a")).unwrap();
        fs::create_dir_all(dir.path().join("owner").join("b")).unwrap();
        fs::write(
            dir.path().join(".state"),
            r#"{"owner/a": {"hash": "1111111111", "deps": []},
                "owner/b": {"hash": "2222222222", "deps": ["owner/a"]}}"#,
        )
        .unwrap();
        dir
    }

    fn stdout_of(cmd: &mut Command) -> String {
        let output = cmd.assert().success().get_output().stdout.clone();
        String::from_utf8_lossy(&output).to_string()
    }

    #[test]
    fn test_list_empty() {
        let dir = tempdir().unwrap();
        let out = stdout_of(addons(dir.path()).arg("list"));
        assert!(out.contains("No add-ons installed"));
    }

    #[test]
    fn test_list_installed() {
        let dir = installed_pair();
        let out = stdout_of(addons(dir.path()).arg("list"));
        assert!(out.contains("owner/a"));
        assert!(out.contains("hash: 22222222"));
        assert!(out.contains("deps: owner/a"));
    }

    #[test]
    fn test_list_corrupt_manifest_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".state"), "[oops").unwrap();
        let output = addons(dir.path()).arg("list").assert().failure().get_output().stderr.clone();
        assert!(String::from_utf8_lossy(&output).contains("corrupt"));
    }

    #[test]
    fn test_remove_cascades_with_yes() {
        let dir = installed_pair();
        let out = stdout_of(addons(dir.path()).args(["remove", "owner/a", "--yes"]));
        assert!(out.contains("owner/b"));
        assert!(!dir.path().join("owner").exists());
        assert_eq!(fs::read_to_string(dir.path().join(".state")).unwrap().trim(), "{}");
    }

    #[test]
    fn test_remove_declined() {
        let dir = installed_pair();
        let out = stdout_of(addons(dir.path()).args(["remove", "owner/a"]).write_stdin("n\n"));
        assert!(out.contains("Aborted"));
        assert!(dir.path().join("owner").join("a").exists());
        assert!(dir.path().join("owner").join("b").exists());
    }

    #[test]
    fn test_remove_confirmed_on_stdin() {
        let dir = installed_pair();
        addons(dir.path())
            .args(["remove", "owner/b"])
            .write_stdin("yes\n")
            .assert()
            .success();
        assert!(dir.path().join("owner").join("a").exists());
        assert!(!dir.path().join("owner").join("b").exists());
    }

    #[test]
    fn test_remove_without_cascade_via_env_paths() {
        let dir = tempdir().unwrap();
        let units = dir.path().join("units");
        fs::create_dir_all(units.join("owner").join("a")).unwrap();
        fs::write(
            dir.path().join("installed.json"),
            r#"{"owner/a": {"hash": "1", "deps": []}, "owner/b": {"hash": "2", "deps": ["owner/a"]}}"#,
        )
        .unwrap();

        addons(dir.path())
            .env("ADDONS_INSTALL_LOCATION", "units")
            .env("ADDONS_STATE_PATH", "installed.json")
            .args(["remove", "owner/a", "--no-cascade", "--yes"])
            .assert()
            .success();

        let state = fs::read_to_string(dir.path().join("installed.json")).unwrap();
        assert!(state.contains("\"owner/b\": {"));
        assert!(!state.contains("\"owner/a\": {"));
        assert!(!units.join("owner").exists());
    }

    #[test]
    fn test_remove_not_installed_fails() {
        let dir = tempdir().unwrap();
        addons(dir.path())
            .args(["remove", "ghost/unit", "--yes"])
            .assert()
            .failure();
    }

    #[test]
    fn test_remove_all_when_empty() {
        let dir = tempdir().unwrap();
        let out = stdout_of(addons(dir.path()).arg("remove"));
        assert!(out.contains("No add-ons installed"));
    }

    #[test]
    fn test_install_invalid_reference() {
        let dir = tempdir().unwrap();
        let output = addons(dir.path())
            .args(["install", "not-a-reference"])
            .assert()
            .failure()
            .get_output()
            .stderr
            .clone();
        assert!(String::from_utf8_lossy(&output).contains("Invalid add-on reference"));
    }

    #[test]
    fn test_install_unreachable_repository() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nowhere").join("owner").join("repo");
        let output = addons(dir.path())
            .arg("install")
            .arg(format!("file://{}", missing.display()))
            .assert()
            .failure()
            .get_output()
            .stderr
            .clone();
        let stderr = String::from_utf8_lossy(&output);
        assert!(stderr.contains("owner/repo"));
        assert!(!dir.path().join(".state").exists());
    }

    #[test]
    fn test_which() {
        let dir = installed_pair();
        let out = stdout_of(addons(dir.path()).args(["which", "https://github.com/owner/a"]));
        assert!(out.contains("Found add-on at"));
        let out = stdout_of(addons(dir.path()).args(["which", "owner/zzz"]));
        assert!(out.contains("not installed"));
    }
}
