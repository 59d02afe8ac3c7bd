//! Integration tests for Strider

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::path::Path;
    use tempfile::TempDir;

    /// Isolated state and config directories for one test
    struct Sandbox {
        dir: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
            }
        }

        /// Write a config pointing the worker at `origin`
        fn with_worker(self, origin: &str, version: &str, manifest: &[&str]) -> Self {
            let manifest: Vec<String> = manifest.iter().map(|m| format!("\"{}\"", m)).collect();
            let content = format!(
                "[worker]\nversion = \"{}\"\norigin = \"{}\"\nmanifest = [{}]\nallowed_hosts = []\n",
                version,
                origin,
                manifest.join(", ")
            );
            std::fs::write(self.config_path(), content).unwrap();
            self
        }

        fn config_path(&self) -> std::path::PathBuf {
            self.dir.path().join("config.toml")
        }

        fn state_dir(&self) -> std::path::PathBuf {
            self.dir.path().join("state")
        }

        fn strider(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("strider");
            cmd.current_dir(self.dir.path())
                .env("STRIDER_CONFIG", self.config_path())
                .env("STRIDER_STATE_DIR", self.state_dir())
                .arg("--no-local");
            cmd
        }
    }

    /// Serve every GET with `asset:<path>`; paths under /missing answer 404
    fn serve_assets() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let origin = format!("http://{}", listener.local_addr().unwrap());

        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                if reader.read_line(&mut request_line).is_err() {
                    continue;
                }
                loop {
                    let mut line = String::new();
                    match reader.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) if line == "\r\n" => break,
                        Ok(_) => {}
                    }
                }

                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = if path.starts_with("/missing") {
                    ("404 Not Found", "not found".to_string())
                } else {
                    ("200 OK", format!("asset:{}", path))
                };
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });

        origin
    }

    fn installed_sandbox(version: &str) -> (Sandbox, String) {
        let origin = serve_assets();
        let sandbox = Sandbox::new().with_worker(&origin, version, &["/", "/static/js/bundle.js"]);
        sandbox
            .strider()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains(format!("Activated {}", version)));
        (sandbox, origin)
    }

    fn exists(path: &Path) -> bool {
        path.exists()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("strider")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("Offline asset cache worker"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("strider")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("strider"));
    }

    #[test]
    fn config_path_honors_env() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_defaults() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[worker]"))
            .stdout(predicate::str::contains("gowalking-v1"));
    }

    #[test]
    fn config_init_writes_file() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["config", "init"])
            .assert()
            .success();
        assert!(exists(&sandbox.config_path()));
    }

    #[test]
    fn activate_without_install_fails() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .arg("activate")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No worker registered"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn install_seeds_and_activates() {
        let (sandbox, _) = installed_sandbox("gowalking-v1");

        sandbox
            .strider()
            .args(["caches", "list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"gowalking-v1\""))
            .stdout(predicate::str::contains("\"active\""));

        assert!(exists(&sandbox.state_dir().join("registration.json")));
        assert!(exists(&sandbox.state_dir().join("journal.log")));
    }

    #[test]
    fn install_failure_reports_hint() {
        let origin = serve_assets();
        let sandbox = Sandbox::new().with_worker(&origin, "gowalking-v1", &["/", "/missing.js"]);

        sandbox
            .strider()
            .arg("install")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Installation failed"))
            .stderr(predicate::str::contains("Hint:"));

        sandbox
            .strider()
            .args(["caches", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::is_empty());
    }

    #[test]
    fn install_no_activate_then_activate() {
        let origin = serve_assets();
        let sandbox = Sandbox::new().with_worker(&origin, "gowalking-v1", &["/"]);

        sandbox
            .strider()
            .args(["install", "--no-activate"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Waiting to activate"));

        sandbox
            .strider()
            .arg("activate")
            .assert()
            .success()
            .stdout(predicate::str::contains("Activated gowalking-v1"));
    }

    #[test]
    fn new_version_purges_old_cache() {
        let (sandbox, origin) = installed_sandbox("gowalking-v1");
        let sandbox = sandbox.with_worker(&origin, "gowalking-v2", &["/"]);

        sandbox
            .strider()
            .arg("install")
            .assert()
            .success()
            .stdout(predicate::str::contains("Deleted stale cache gowalking-v1"));

        sandbox
            .strider()
            .args(["caches", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("gowalking-v2\n"));
    }

    #[test]
    fn clear_stale_keeps_waiting_version() {
        let (sandbox, origin) = installed_sandbox("gowalking-v1");
        let sandbox = sandbox.with_worker(&origin, "gowalking-v2", &["/"]);
        sandbox
            .strider()
            .args(["install", "--no-activate"])
            .assert()
            .success();

        sandbox
            .strider()
            .args(["caches", "clear", "--stale"])
            .assert()
            .success();
        sandbox
            .strider()
            .args(["caches", "list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("gowalking-v1\ngowalking-v2\n"));

        sandbox.strider().arg("activate").assert().success();
        sandbox
            .strider()
            .args(["fetch", "/friends", "--navigate", "--offline", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"body\": \"asset:/\""));
    }

    #[test]
    fn offline_fetch_serves_cached_asset() {
        let (sandbox, _) = installed_sandbox("gowalking-v1");

        sandbox
            .strider()
            .args(["fetch", "/static/js/bundle.js", "--offline", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::diff("asset:/static/js/bundle.js"));
    }

    #[test]
    fn offline_navigation_falls_back_to_root() {
        let (sandbox, _) = installed_sandbox("gowalking-v1");

        sandbox
            .strider()
            .args(["fetch", "/friends", "--navigate", "--offline", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"source\": \"fallback\""))
            .stdout(predicate::str::contains("\"body\": \"asset:/\""));
    }

    #[test]
    fn offline_subresource_gets_503() {
        let (sandbox, _) = installed_sandbox("gowalking-v1");

        sandbox
            .strider()
            .args(["fetch", "/static/img/logo.png", "--offline", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"status\": 503"))
            .stdout(predicate::str::contains("\"body\": \"Offline\""));
    }

    #[test]
    fn online_fetch_caches_new_asset() {
        let (sandbox, _) = installed_sandbox("gowalking-v1");

        sandbox
            .strider()
            .args(["fetch", "/static/css/extra.css", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"source\": \"network\""));

        sandbox
            .strider()
            .args(["fetch", "/static/css/extra.css", "--offline", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"source\": \"cache\""));
    }

    #[test]
    fn push_shows_notification() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["push", "5km walked!", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("5km walked!"))
            .stdout(predicate::str::contains("\"explore\""))
            .stdout(predicate::str::contains("\"close\""));
    }

    #[test]
    fn push_without_body_uses_default() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["push", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Time for a walk!"));
    }

    #[test]
    fn click_explore_opens_map() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["click", "explore"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Opened http://localhost:3000/map"));
    }

    #[test]
    fn click_close_dismisses() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .args(["click", "close"])
            .assert()
            .success()
            .stdout(predicate::str::contains("dismissed"));
    }

    #[test]
    fn status_without_registration() {
        let sandbox = Sandbox::new();
        sandbox
            .strider()
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("No worker registered"));
    }
}
