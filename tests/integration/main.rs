//! Integration tests for imagemill

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use tempfile::TempDir;

    const HASH: &str = "9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08";

    fn imagemill() -> Command {
        cargo_bin_cmd!("imagemill")
    }

    /// Workspace with a two-version table, an empty context and no config
    fn workspace() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("buildinfo.json"),
            format!(
                r#"{{
                    "1.1.0": {{ "sha256": "{HASH}", "tags": ["stable", "1.1"] }},
                    "1.0.0": {{ "sha256": "{HASH}", "tags": ["1.0.0"] }}
                }}"#
            ),
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("docker")).unwrap();
        std::fs::write(dir.path().join("docker/Dockerfile"), "FROM scratch\n").unwrap();
        dir
    }

    fn in_workspace(dir: &TempDir) -> Command {
        let mut cmd = imagemill();
        cmd.current_dir(dir.path())
            .env_remove("IMAGEMILL_CONFIG")
            .args(["--no-local", "--config"])
            .arg(dir.path().join("absent.toml"));
        cmd
    }

    #[test]
    fn help_displays() {
        imagemill()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("--only-stable-latest"))
            .stdout(predicate::str::contains("--push-tags"));
    }

    #[test]
    fn version_displays() {
        imagemill()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("imagemill"));
    }

    #[test]
    fn dry_run_default_builds_all_regular() {
        let dir = workspace();
        in_workspace(&dir)
            .arg("--dry-run")
            .assert()
            .success()
            .stdout(predicate::str::contains("ronsonm/factorio:stable"))
            .stdout(predicate::str::contains("ronsonm/factorio:1.0.0"))
            .stdout(predicate::str::contains("rootless").not());
    }

    #[test]
    fn dry_run_rootless_only_stable() {
        let dir = workspace();
        in_workspace(&dir)
            .args(["--dry-run", "--rootless"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ronsonm/factorio:stable-rootless"))
            .stdout(predicate::str::contains("ronsonm/factorio:1.1-rootless"))
            .stdout(predicate::str::contains("1.0.0").not());
    }

    #[test]
    fn dry_run_both_only_stable_latest() {
        let dir = workspace();
        in_workspace(&dir)
            .args(["--dry-run", "--both", "--only-stable-latest"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ronsonm/factorio:stable "))
            .stdout(predicate::str::contains("ronsonm/factorio:stable-rootless"))
            .stdout(predicate::str::contains("1.0.0").not());
    }

    #[test]
    fn missing_buildinfo_fails() {
        let dir = TempDir::new().unwrap();
        in_workspace(&dir)
            .arg("--dry-run")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Build info file not found"));
    }

    #[test]
    fn malformed_buildinfo_fails_before_building() {
        let dir = workspace();
        std::fs::write(
            dir.path().join("buildinfo.json"),
            r#"{ "1.1.0": { "tags": ["stable"] } }"#,
        )
        .unwrap();
        in_workspace(&dir)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("missing \"sha256\""));
    }

    #[test]
    fn push_without_credentials_fails() {
        let dir = workspace();
        in_workspace(&dir)
            .env_remove("DOCKER_USERNAME")
            .env_remove("DOCKER_PASSWORD")
            .arg("--push-tags")
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "Registry username and password need to be given",
            ));
    }

    #[test]
    fn missing_context_fails() {
        let dir = workspace();
        in_workspace(&dir)
            .args(["--context", "nowhere"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Build context directory not found"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_build_tool_exits_nonzero() {
        let dir = workspace();
        std::fs::write(
            dir.path().join("imagemill.toml"),
            "[general]\ndocker_binary = \"false\"\n",
        )
        .unwrap();
        imagemill()
            .current_dir(dir.path())
            .env_remove("IMAGEMILL_CONFIG")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Build of regular image failed"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_builder_creation_exits_nonzero() {
        let dir = workspace();
        std::fs::write(
            dir.path().join("imagemill.toml"),
            "[general]\ndocker_binary = \"false\"\n",
        )
        .unwrap();
        imagemill()
            .current_dir(dir.path())
            .env_remove("IMAGEMILL_CONFIG")
            .arg("--multiarch")
            .assert()
            .code(1)
            .stderr(predicate::str::contains(
                "Creating builder ronsonm-multiarch failed",
            ))
            .stderr(predicate::str::contains("Build of").not());
    }

    #[cfg(unix)]
    #[test]
    fn failing_login_exits_before_building() {
        let dir = workspace();
        std::fs::write(
            dir.path().join("imagemill.toml"),
            "[general]\ndocker_binary = \"false\"\n",
        )
        .unwrap();
        imagemill()
            .current_dir(dir.path())
            .env_remove("IMAGEMILL_CONFIG")
            .env("DOCKER_USERNAME", "factorio")
            .env("DOCKER_PASSWORD", "secret")
            .arg("--push-tags")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Docker login failed"))
            .stderr(predicate::str::contains("Build of").not());
    }

    #[test]
    fn positional_arguments_rejected() {
        imagemill().arg("1.1.0").assert().failure();
    }
}
