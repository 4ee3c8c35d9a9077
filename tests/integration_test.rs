use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Matcher, Mock, Server, ServerGuard};
use predicates::prelude::*;
use tempfile::tempdir;

const REPO_JSON: &str = r#"{
    "stargazers_count": 1540,
    "forks_count": 12,
    "open_issues_count": 3,
    "description": "Enterprise S3 Migration Made Simple",
    "updated_at": "2025-03-01T10:00:00Z",
    "default_branch": "main"
}"#;

fn site_cmd() -> Command {
    Command::new(cargo::cargo_bin!("s3ms-site"))
}

/// Mocks for every endpoint `stats` touches. The repository endpoint is hit
/// twice per uncached run: once for its info, once for the default branch.
fn mock_live_api(server: &mut ServerGuard) -> Vec<Mock> {
    let url = server.url();
    vec![
        server
            .mock("GET", "/repos/owner/repo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(REPO_JSON)
            .expect(2)
            .create(),
        server
            .mock("GET", "/repos/owner/repo/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{
                    "tag_name": "v1.1.0",
                    "name": "S3 Migration Scheduler 1.1.0",
                    "body": "",
                    "published_at": "2025-02-10T08:30:00Z",
                    "html_url": "https://github.com/owner/repo/releases/tag/v1.1.0",
                    "assets": [
                        {{
                            "name": "S3.Migration.Scheduler-1.1.0-win-x64.exe",
                            "size": 89478485,
                            "download_count": 900,
                            "browser_download_url": "{url}/download/win.exe"
                        }},
                        {{
                            "name": "S3.Migration.Scheduler-1.1.0.AppImage",
                            "size": 120000000,
                            "download_count": 300,
                            "browser_download_url": "{url}/download/app.AppImage"
                        }}
                    ]
                }}"#
            ))
            .expect(1)
            .create(),
        server
            .mock("GET", "/repos/owner/repo/contributors")
            .match_query(Matcher::UrlEncoded("per_page".into(), "1".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(
                "link",
                &format!(
                    r#"<{url}/repos/owner/repo/contributors?per_page=1&page=2>; rel="next", <{url}/repos/owner/repo/contributors?per_page=1&page=4>; rel="last""#
                ),
            )
            .with_body(r#"[{"login": "someone"}]"#)
            .expect(1)
            .create(),
        server
            .mock("GET", "/repos/owner/repo/commits")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("sha".into(), "main".into()),
                Matcher::UrlEncoded("per_page".into(), "1".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_header(
                "link",
                &format!(
                    r#"<{url}/repos/owner/repo/commits?sha=main&per_page=1&page=2>; rel="next", <{url}/repos/owner/repo/commits?sha=main&per_page=1&page=1260>; rel="last""#
                ),
            )
            .with_body(r#"[{"sha": "abc"}]"#)
            .expect(1)
            .create(),
        server
            .mock("GET", "/v2/repositories/ns/image")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"pull_count": 10432, "star_count": 7, "last_updated": "2025-03-02T00:00:00Z"}"#,
            )
            .expect(1)
            .create(),
    ]
}

#[test]
fn test_end_to_end_stats_and_cache() {
    let mut server = Server::new();
    let url = server.url();
    let mocks = mock_live_api(&mut server);

    let cache_dir = tempdir().unwrap();
    let args = [
        "--repo",
        "owner/repo",
        "--image",
        "ns/image",
        "--api-url",
        url.as_str(),
        "--registry-url",
        url.as_str(),
    ];

    site_cmd()
        .arg("stats")
        .args(args)
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"github-stars\s+1\.5K\n").unwrap())
        .stdout(predicate::str::is_match(r"total-downloads\s+1\.2K\n").unwrap())
        .stdout(predicate::str::is_match(r"contributors-count\s+4\n").unwrap())
        .stdout(predicate::str::is_match(r"commits-count\s+1\.3K\n").unwrap())
        .stdout(predicate::str::is_match(r"docker-pulls\s+10\.4K\n").unwrap())
        .stdout(predicate::str::is_match(r"release-date\s+2025-02-10\n").unwrap())
        .stdout(predicate::str::contains(
            "Latest stable release with bug fixes and improvements.",
        ))
        .stdout(predicate::str::contains(format!("{}/download/app.AppImage", url)));

    let entry = cache_dir.path().join("github_commits.json");
    let raw = std::fs::read_to_string(&entry).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["data"], 1260);
    assert!(value["timestamp"].is_i64());

    // Second run is served entirely from the cache
    site_cmd()
        .arg("stats")
        .arg("--json")
        .args(args)
        .arg("--cache-dir")
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""commits-count": "1.3K""#));

    for mock in &mocks {
        mock.assert();
    }

    site_cmd()
        .args(["cache", "show", "--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"github_repo_info\s+\d+s\s+fresh").unwrap())
        .stdout(predicate::str::contains("docker_repo_info"));

    site_cmd()
        .args(["cache", "clear", "-y", "--cache-dir"])
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 5 cached entries."));

    assert!(!entry.exists());
}

#[test]
fn test_stats_falls_back_when_api_unavailable() {
    let mut server = Server::new();
    let url = server.url();
    let _not_found = server
        .mock("GET", Matcher::Any)
        .with_status(404)
        .create();

    site_cmd()
        .args([
            "stats",
            "--no-cache",
            "--repo",
            "owner/repo",
            "--image",
            "ns/image",
            "--api-url",
            url.as_str(),
            "--registry-url",
            url.as_str(),
            "--user-agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
            "--platform",
            "Linux x86_64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r"github-stars\s+0\n").unwrap())
        .stdout(predicate::str::is_match(r"detected-platform-text\s+Linux \(x64\)\n").unwrap())
        .stdout(predicate::str::contains("S3.Migration.Scheduler-1.1.0.AppImage"))
        .stdout(predicate::str::is_match(r"contributors-count\s+1\n").unwrap())
        .stdout(predicate::str::is_match(r"commits-count\s+50\n").unwrap())
        .stdout(predicate::str::is_match(r"latest-version\s+v1\.0\.0\n").unwrap())
        .stdout(predicate::str::contains(
            "https://github.com/owner/repo/releases",
        ))
        .stderr(predicate::str::contains("showing fallback values"));
}

#[test]
fn test_downloads_lists_assets() {
    let mut server = Server::new();
    let url = server.url();
    let _mocks = mock_live_api(&mut server);
    let cache_dir = tempdir().unwrap();

    site_cmd()
        .args([
            "downloads",
            "--pattern",
            "*.appimage",
            "--repo",
            "owner/repo",
            "--api-url",
            url.as_str(),
            "--cache-dir",
        ])
        .arg(cache_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Version v1.1.0 released 2025-02-10"))
        .stdout(predicate::str::contains(
            "S3.Migration.Scheduler-1.1.0-win-x64.exe (85.3 MB, 900 downloads)",
        ))
        .stdout(predicate::str::contains("Selected:"))
        .stdout(predicate::str::contains("Total downloads: 1.2K"));
}

#[test]
fn test_detect_linux() {
    site_cmd()
        .args([
            "detect",
            "--user-agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36",
            "--platform",
            "Linux x86_64",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detected platform: Linux (x64)"))
        .stdout(predicate::str::contains("S3.Migration.Scheduler-1.1.0.AppImage"));
}

#[test]
fn test_detect_unknown_platform() {
    site_cmd()
        .args(["detect", "--user-agent", "curl/8.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Could not detect the platform."))
        .stdout(predicate::str::contains("/releases/latest"));
}

#[test]
fn test_invalid_repo_fails() {
    site_cmd()
        .args(["stats", "--no-cache", "--repo", "not-a-repo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid repository setting"));
}
