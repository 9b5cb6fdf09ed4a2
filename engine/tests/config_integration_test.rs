//! Integration tests for configuration loading
//!
//! Exercises file creation, round-tripping and validation against real files
//! in temporary directories.

use std::fs;
use tempfile::TempDir;

use forkcast_engine::config::Config;
use forkcast_engine::telemetry::LogFormat;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_create_default_writes_loadable_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let created = Config::create_default(&path).unwrap();
    assert!(path.exists());
    assert_eq!(created.llm.provider, "gemini");
    assert_eq!(created.core.user_id, "user_demo_001");

    // The file keeps the unexpanded home-relative data directory
    let contents = fs::read_to_string(&path).unwrap();
    assert!(contents.contains("data_dir = \"~/.forkcast\""));
    assert!(contents.contains("[llm.classifier]"));

    let loaded = Config::load_from_path(&path).unwrap();
    assert_eq!(loaded.core.data_dir, created.core.data_dir);
    assert_eq!(loaded.llm.generator.max_output_tokens, 2048);
}

#[test]
fn test_full_file_overrides_every_section() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");
    let catalog = dir.path().join("menu.toml");
    let path = write_config(
        &dir,
        &format!(
            r#"
[core]
log_level = "debug"
log_format = "json"
data_dir = "{}"
user_id = "alice"

[catalog]
path = "{}"

[llm]
provider = "ollama"
request_timeout_secs = 15

[llm.ollama]
base_url = "http://gpu-box:11434"
model = "qwen2.5:7b"

[llm.classifier]
temperature = 0.0
max_output_tokens = 256

[llm.generator]
temperature = 1.2
max_output_tokens = 4096

[session]
max_transcript_tokens = 4000
"#,
            data_dir.display(),
            catalog.display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();
    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.core.log_format, LogFormat::Json);
    assert_eq!(config.core.user_id, "alice");
    assert_eq!(config.catalog_path(), catalog);
    assert_eq!(config.llm.provider, "ollama");
    assert_eq!(config.llm.request_timeout_secs, 15);
    assert_eq!(config.llm.ollama.model, "qwen2.5:7b");
    assert_eq!(config.llm.classifier.temperature, 0.0);
    assert_eq!(config.llm.generator.max_output_tokens, 4096);
    assert_eq!(config.session.max_transcript_tokens, 4000);

    // Validation creates the data directory
    assert!(data_dir.is_dir());
}

#[test]
fn test_invalid_files_are_rejected() {
    let dir = TempDir::new().unwrap();
    let data_dir = dir.path().join("data");

    let cases = [
        ("log_level = \"loud\"", ""),
        ("", "provider = \"openai\""),
        ("", "request_timeout_secs = 0"),
        ("user_id = \"bad/user\"", ""),
    ];

    for (core_extra, llm_extra) in cases {
        let path = write_config(
            &dir,
            &format!(
                "[core]\ndata_dir = \"{}\"\n{}\n\n[llm]\n{}\n",
                data_dir.display(),
                core_extra,
                llm_extra
            ),
        );
        assert!(
            Config::load_from_path(&path).is_err(),
            "accepted core={:?} llm={:?}",
            core_extra,
            llm_extra
        );
    }
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[core\nlog_level = ");

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_missing_file_is_a_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
