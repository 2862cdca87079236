//! Configuration validation + resolution tests against real files.
//!
//! Covers:
//! - JSON and TOML config files parsed and validated
//! - Resolution order (CLI > AIF_CONFIG > AIF_CONFIG_DIR)
//! - Snapshot hashing tracks file content

use aif_config::resolve::{resolve_config, ConfigSource, ENV_CONFIG_DIR, ENV_CONFIG_PATH};
use aif_config::{load_config, validate_engine_config, EngineConfig, LearningRule, ValidationError};
use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

struct EnvGuard {
    keys: Vec<String>,
    saved: Vec<Option<String>>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        let mut saved = Vec::with_capacity(keys.len());
        for key in keys {
            saved.push(env::var(key).ok());
        }
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            saved,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (idx, key) in self.keys.iter().enumerate() {
            match self.saved.get(idx).and_then(|v| v.as_ref()) {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .expect("env lock poisoned");
    f()
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("write config");
    path
}

#[test]
fn json_and_toml_describe_the_same_config() {
    let dir = TempDir::new().unwrap();
    let json = write(
        dir.path(),
        "a.json",
        r#"{"inferenceIterations": 2, "actionTemperature": 0.25, "learning_rule": "dirichlet"}"#,
    );
    let toml = write(
        dir.path(),
        "b.toml",
        "inference_iterations = 2\naction_temperature = 0.25\nlearning_rule = \"dirichlet\"\n",
    );

    let from_json = EngineConfig::from_file(&json).unwrap();
    let from_toml = EngineConfig::from_file(&toml).unwrap();
    assert_eq!(from_json, from_toml);
    assert_eq!(from_json.learning_rule, LearningRule::Dirichlet);
    assert!(validate_engine_config(&from_json).is_ok());
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "engine.json", "{ not json");
    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ValidationError::ParseError(_)));
    assert_eq!(err.code(), 61);
}

#[test]
fn cli_path_beats_environment() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let cli = write(dir.path(), "cli.json", r#"{"seed": 1}"#);
        let env_file = write(dir.path(), "env.json", r#"{"seed": 2}"#);
        env::set_var(ENV_CONFIG_PATH, &env_file);

        let resolved = resolve_config(Some(&cli));
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path.as_deref(), Some(cli.as_path()));

        let loaded = load_config(Some(&cli)).unwrap();
        assert_eq!(loaded.config.seed, Some(1));
    });
}

#[test]
fn env_path_then_env_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(&[ENV_CONFIG_PATH, ENV_CONFIG_DIR]);
        let dir = TempDir::new().unwrap();
        let conf_dir = dir.path().join("conf");
        fs::create_dir_all(&conf_dir).unwrap();
        write(&conf_dir, "engine.toml", "seed = 3\n");

        env::remove_var(ENV_CONFIG_PATH);
        env::set_var(ENV_CONFIG_DIR, &conf_dir);
        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.source, ConfigSource::Environment);
        assert_eq!(loaded.config.seed, Some(3));

        let direct = write(dir.path(), "direct.json", r#"{"seed": 4}"#);
        env::set_var(ENV_CONFIG_PATH, &direct);
        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.config.seed, Some(4));
    });
}

#[test]
fn snapshot_hash_tracks_content() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.json", r#"{"seed": 5}"#);
    let b = write(dir.path(), "b.json", r#"{ "seed": 5 }"#);

    let la = load_config(Some(&a)).unwrap();
    let lb = load_config(Some(&b)).unwrap();
    // Same effective config, different bytes on disk.
    assert!(la.snapshot.matches(&lb.snapshot));
    assert_ne!(la.snapshot.file_hash, lb.snapshot.file_hash);
}
