use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use url::Url;

use regpin_core::commands::{PinCommand, PinOptions};
use regpin_core::nix_path::HintFile;
use regpin_core::store::{GcRootStore, StorePathResolver};

const LOCK: &str = r#"{
    "nodes": {
        "nixpkgs": {
            "locked": {
                "type": "github",
                "owner": "NixOS",
                "repo": "nixpkgs",
                "rev": "abc123",
                "narHash": "sha256-xyz"
            }
        }
    }
}"#;

/// Resolver returning a fixed store path.
struct FixedResolver {
    path: PathBuf,
}

impl FixedResolver {
    fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StorePathResolver for FixedResolver {
    fn resolve(&self, _url: &Url, _nar_hash: &str, _name: &str) -> anyhow::Result<PathBuf> {
        Ok(self.path.clone())
    }
}

/// Resolver recording every invocation before answering.
struct RecordingResolver(Arc<Mutex<Vec<String>>>);

impl StorePathResolver for RecordingResolver {
    fn resolve(&self, url: &Url, nar_hash: &str, name: &str) -> anyhow::Result<PathBuf> {
        self.0
            .lock()
            .unwrap()
            .push(format!("{url} {nar_hash} {name}"));
        Ok(PathBuf::from("/nix/store/abc-nixpkgs"))
    }
}

/// Resolver that always fails, as an unreachable network would.
struct FailingResolver;

impl StorePathResolver for FailingResolver {
    fn resolve(&self, _url: &Url, _nar_hash: &str, _name: &str) -> anyhow::Result<PathBuf> {
        anyhow::bail!("download failed")
    }
}

struct Fixture {
    temp: TempDir,
    lock_file: PathBuf,
    registry_file: PathBuf,
    hint_path: PathBuf,
    gcroots_dir: PathBuf,
}

impl Fixture {
    fn new(lock_content: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let lock_file = temp.path().join("flake.lock");
        std::fs::write(&lock_file, lock_content).unwrap();

        Self {
            lock_file,
            registry_file: temp.path().join("registry.json"),
            hint_path: temp.path().join(".nix-path"),
            gcroots_dir: temp.path().join("gcroots"),
            temp,
        }
    }

    fn command(
        &self,
        resolver: Box<dyn StorePathResolver>,
        search_path: Option<&str>,
    ) -> PinCommand {
        PinCommand::new(
            HintFile::new(self.hint_path.clone()),
            GcRootStore::new(self.gcroots_dir.clone()),
            resolver,
            search_path.map(str::to_string),
        )
    }

    fn options(&self) -> PinOptions {
        PinOptions::new(self.registry_file.clone()).with_lock_file(self.lock_file.clone())
    }

    fn registry_json(&self) -> serde_json::Value {
        let bytes = std::fs::read(&self.registry_file).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[test]
fn pin_writes_the_expected_registry() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);

    let report = cmd.execute(&fixture.options()).unwrap();

    assert_eq!(report.entry_name, "nixpkgs");
    assert_eq!(
        fixture.registry_json(),
        serde_json::json!({
            "version": 2,
            "flakes": [{
                "from": {"type": "indirect", "id": "nixpkgs"},
                "to": {
                    "type": "github",
                    "owner": "NixOS",
                    "repo": "nixpkgs",
                    "rev": "abc123",
                    "narHash": "sha256-xyz"
                }
            }]
        })
    );
}

#[test]
fn rerun_is_idempotent() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);

    cmd.execute(&fixture.options()).unwrap();
    let first = std::fs::read(&fixture.registry_file).unwrap();

    cmd.execute(&fixture.options()).unwrap();
    let second = std::fs::read(&fixture.registry_file).unwrap();

    assert_eq!(first, second);
}

#[test]
fn pin_replaces_a_prior_entry_and_preserves_the_rest() {
    let fixture = Fixture::new(LOCK);
    std::fs::write(
        &fixture.registry_file,
        serde_json::json!({
            "version": 2,
            "flakes": [
                {"from": {"type": "indirect", "id": "nixpkgs"},
                 "to": {"type": "github", "owner": "NixOS", "repo": "nixpkgs", "rev": "old"}},
                {"from": {"type": "indirect", "id": "home-manager"},
                 "to": {"type": "github", "owner": "nix-community", "repo": "home-manager", "rev": "hm"}}
            ]
        })
        .to_string(),
    )
    .unwrap();

    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);
    cmd.execute(&fixture.options()).unwrap();

    let registry = fixture.registry_json();
    let flakes = registry["flakes"].as_array().unwrap();
    assert_eq!(flakes.len(), 2);
    assert_eq!(flakes[0]["from"]["id"], "home-manager");
    assert_eq!(flakes[1]["from"]["id"], "nixpkgs");
    assert_eq!(flakes[1]["to"]["rev"], "abc123");
}

#[test]
fn missing_entry_fails_and_writes_nothing() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let err = cmd
        .execute(&fixture.options().with_entry_name("unknown"))
        .unwrap_err();

    assert!(err.to_string().contains("no entry named 'unknown'"));
    assert!(!fixture.registry_file.exists());
    assert!(!fixture.hint_path.exists());
}

#[test]
fn malformed_lock_file_fails() {
    let fixture = Fixture::new("{broken");
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let err = cmd.execute(&fixture.options()).unwrap_err();

    assert!(err.to_string().contains("unable to open lock file"));
    assert!(!fixture.registry_file.exists());
}

#[test]
fn unwritable_registry_fails_after_a_clean_lockfile_read() {
    let fixture = Fixture::new(LOCK);
    let blocker = fixture.temp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();

    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);
    let options = PinOptions::new(blocker.join("registry.json"))
        .with_lock_file(fixture.lock_file.clone());

    let err = cmd.execute(&options).unwrap_err();

    assert!(err.to_string().contains("unable to write registry file"));
    assert!(!fixture.hint_path.exists());
}

#[test]
fn successful_prefetch_writes_gc_root_and_hint() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);

    let report = cmd.execute(&fixture.options()).unwrap();

    assert_eq!(report.warnings, Vec::<String>::new());
    assert_eq!(
        report.store_path.as_deref(),
        Some(Path::new("/nix/store/abc-nixpkgs"))
    );
    assert_eq!(report.hint_file.as_deref(), Some(fixture.hint_path.as_path()));

    let root = fixture.gcroots_dir.join("regpin-nixpkgs");
    assert_eq!(
        std::fs::read_link(root).unwrap(),
        Path::new("/nix/store/abc-nixpkgs")
    );

    let hint = std::fs::read_to_string(&fixture.hint_path).unwrap();
    assert_eq!(hint, "export NIX_PATH=\"nixpkgs=/nix/store/abc-nixpkgs\"\n");
}

#[test]
fn hint_merges_the_existing_search_path() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(
        Box::new(FixedResolver::new("/nix/store/new-nixpkgs")),
        Some("foo=/x:nixpkgs=/nix/store/old:bar=/y"),
    );

    cmd.execute(&fixture.options()).unwrap();

    let hint = std::fs::read_to_string(&fixture.hint_path).unwrap();
    assert_eq!(
        hint,
        "export NIX_PATH=\"foo=/x:nixpkgs=/nix/store/new-nixpkgs:bar=/y\"\n"
    );
}

#[test]
fn prefetch_resolves_the_canonical_archive_url() {
    let fixture = Fixture::new(LOCK);
    let seen = Arc::new(Mutex::new(Vec::new()));

    let cmd = fixture.command(Box::new(RecordingResolver(seen.clone())), None);
    cmd.execute(&fixture.options()).unwrap();

    assert_eq!(
        seen.lock().unwrap().as_slice(),
        ["https://github.com/NixOS/nixpkgs/archive/abc123.zip sha256-xyz nixpkgs"]
    );
}

#[test]
fn failed_prefetch_is_nonfatal() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let report = cmd.execute(&fixture.options()).unwrap();

    assert!(fixture.registry_file.exists());
    assert!(report.store_path.is_none());
    assert!(!fixture.hint_path.exists());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("unable to download nixpkgs"));
}

#[test]
fn non_github_entry_skips_the_store_step() {
    let lock = r#"{
        "nodes": {
            "nixpkgs": {
                "locked": {"type": "git", "url": "https://example.com/repo.git", "rev": "abc"}
            }
        }
    }"#;
    let fixture = Fixture::new(lock);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let report = cmd.execute(&fixture.options()).unwrap();

    assert!(fixture.registry_file.exists());
    assert!(report.warnings.is_empty());
    assert!(report.store_path.is_none());
    assert!(!fixture.hint_path.exists());
}

#[test]
fn non_default_entry_skips_the_store_step() {
    let lock = r#"{
        "nodes": {
            "home-manager": {
                "locked": {
                    "type": "github",
                    "owner": "nix-community",
                    "repo": "home-manager",
                    "rev": "hm1",
                    "narHash": "sha256-hm"
                }
            }
        }
    }"#;
    let fixture = Fixture::new(lock);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let report = cmd
        .execute(&fixture.options().with_entry_name("home-manager"))
        .unwrap();

    assert!(report.warnings.is_empty());
    assert!(!fixture.hint_path.exists());
}

#[test]
fn prefetch_disabled_skips_the_store_step() {
    let fixture = Fixture::new(LOCK);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let report = cmd
        .execute(&fixture.options().with_prefetch(false))
        .unwrap();

    assert!(fixture.registry_file.exists());
    assert!(report.warnings.is_empty());
    assert!(!fixture.hint_path.exists());
}

#[test]
fn github_entry_missing_hash_warns_instead_of_fetching() {
    let lock = r#"{
        "nodes": {
            "nixpkgs": {
                "locked": {"type": "github", "owner": "NixOS", "repo": "nixpkgs", "rev": "abc"}
            }
        }
    }"#;
    let fixture = Fixture::new(lock);
    let cmd = fixture.command(Box::new(FailingResolver), None);

    let report = cmd.execute(&fixture.options()).unwrap();

    assert!(fixture.registry_file.exists());
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("missing owner, repo, rev, or narHash"));
}

#[test]
fn gc_root_failure_still_writes_the_hint() {
    let fixture = Fixture::new(LOCK);
    // A regular file where the gcroots directory should go.
    std::fs::write(&fixture.gcroots_dir, "").unwrap();

    let cmd = fixture.command(Box::new(FixedResolver::new("/nix/store/abc-nixpkgs")), None);
    let report = cmd.execute(&fixture.options()).unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("gcroots"));
    assert!(fixture.hint_path.exists());
}
