use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn council_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_council"))
}

const CORPUS: &str = r#"[
  {"id": "cannon", "content": "Cannon is a single target ground defense. Upgrade it early at town hall 9.",
   "metadata": {"name": "Cannon", "type": "defense", "category": "stats"}, "embedding": [1.0, 0.0]},
  {"id": "air_defense", "content": "Air Defense shoots down balloons and dragons.",
   "metadata": {"name": "Air Defense", "type": "defense", "category": "stats",
                "url": "https://wiki.example/air_defense"}, "embedding": [0.8, 0.2]},
  {"id": "balloon", "content": "Balloon is a slow air troop that targets defenses first.",
   "metadata": {"name": "Balloon", "type": "troop", "category": "stats"}, "embedding": [0.1, 0.9]},
  {"id": "balloon", "content": "Balloons were added in the original release.",
   "metadata": {"name": "Balloon", "type": "troop", "category": "basic_info"}, "embedding": [0.2, 0.8]},
  {"id": "hog_rider", "content": "Hog Rider jumps over walls and targets defenses.",
   "metadata": {"name": "Hog Rider", "type": "troop", "category": "stats"}, "embedding": [0.0, 1.0]},
  {"id": "gold_storage", "content": "Gold Storage protects gold from raids.",
   "metadata": {"name": "Gold Storage", "type": "resource", "category": "stats"}, "embedding": [0.5, 0.5]}
]"#;

fn setup_test_env() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path();

    let data_dir = root.join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("corpus.json"), CORPUS).unwrap();

    let config_dir = root.join("config");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("council.toml");
    fs::write(
        &config_path,
        r#"[corpus]
path = "../data"

[retrieval]
final_k = 4

[embedding]
provider = "disabled"
"#,
    )
    .unwrap();

    (tmp, config_path)
}

fn run_council(config_path: &Path, args: &[&str]) -> (String, String, bool) {
    let binary = council_binary();
    let output = Command::new(&binary)
        .arg("--config")
        .arg(config_path)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("Failed to run council binary at {:?}: {}", binary, e));

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

fn parse_json(stdout: &str) -> serde_json::Value {
    serde_json::from_str(stdout).unwrap_or_else(|e| panic!("invalid JSON ({}): {}", e, stdout))
}

#[test]
fn test_analyze_without_config() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("missing.toml");
    let (stdout, _, ok) = run_council(&missing, &["analyze", "best balloon attack for war at th8", "--json"]);
    assert!(ok);
    let json = parse_json(&stdout);
    assert_eq!(json["intent"], "attack_strategy");
    assert_eq!(json["tier_level"], 8);
}

#[test]
fn test_ask_degrades_to_keyword_retrieval() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_council(&config, &["ask", "which defense should I upgrade at th9", "--json"]);
    assert!(ok, "stderr: {}", stderr);

    let json = parse_json(&stdout);
    assert_eq!(json["intent"], "upgrade_priority");
    assert_eq!(json["tier_level"], 9);

    let docs = json["documents"].as_array().unwrap();
    assert!(!docs.is_empty());
    assert!(docs.len() <= 4);
    assert_eq!(docs[0]["rank"], 1);
    assert_eq!(docs[0]["type"], "defense");
    for d in docs {
        let pct = d["relevance_pct"].as_i64().unwrap();
        assert!((0..=100).contains(&pct));
    }
}

#[test]
fn test_ask_text_output() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_council(&config, &["ask", "hog rider attack"]);
    assert!(ok);
    assert!(stdout.starts_with("Intent: attack_strategy\n"));
    assert!(stdout.contains("Hog Rider (troop / stats)"));
}

#[test]
fn test_simulate_dedups_across_entities() {
    let (_tmp, config) = setup_test_env();
    let (stdout, stderr, ok) = run_council(
        &config,
        &[
            "simulate",
            "--attacker",
            "balloon",
            "--attacker",
            "balloon",
            "--defense",
            "air defense",
            "--tier",
            "7",
            "--json",
        ],
    );
    assert!(ok, "stderr: {}", stderr);

    let json = parse_json(&stdout);
    assert_eq!(json["scenario"]["attackers"].as_array().unwrap().len(), 2);
    assert_eq!(json["reference"]["tier_level"], 7);

    let docs = json["reference"]["documents"].as_array().unwrap();
    let keys: HashSet<(String, String)> = docs
        .iter()
        .map(|d| {
            (
                d["id"].as_str().unwrap().to_string(),
                d["category"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(keys.len(), docs.len());
    assert!(keys.contains(&("balloon".to_string(), "stats".to_string())));
    assert!(keys.contains(&("air_defense".to_string(), "stats".to_string())));
}

#[test]
fn test_stats() {
    let (_tmp, config) = setup_test_env();
    let (stdout, _, ok) = run_council(&config, &["stats", "--json"]);
    assert!(ok);
    let json = parse_json(&stdout);
    assert_eq!(json["documents"], 6);
    assert_eq!(json["dims"], 2);
    assert_eq!(json["by_type"]["troop"], 3);
    assert_eq!(json["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn test_stats_does_not_need_embedding_credentials() {
    let (_tmp, config) = setup_test_env();
    let text = fs::read_to_string(&config).unwrap().replace(
        "provider = \"disabled\"",
        "provider = \"openai\"\nmodel = \"text-embedding-3-small\"\ndims = 2",
    );
    fs::write(&config, text).unwrap();

    let output = Command::new(council_binary())
        .arg("--config")
        .arg(&config)
        .args(["stats", "--json"])
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let json = parse_json(&String::from_utf8_lossy(&output.stdout));
    assert_eq!(json["documents"], 6);

    // Retrieval still needs the key.
    let output = Command::new(council_binary())
        .arg("--config")
        .arg(&config)
        .args(["ask", "cannon"])
        .env_remove("OPENAI_API_KEY")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}

#[test]
fn test_configured_dims_mismatch_fails() {
    let (_tmp, config) = setup_test_env();
    let text = fs::read_to_string(&config).unwrap().replace(
        "provider = \"disabled\"",
        "provider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 768",
    );
    fs::write(&config, text).unwrap();

    let (_, stderr, ok) = run_council(&config, &["ask", "cannon"]);
    assert!(!ok);
    assert!(stderr.contains("embedding.dims is 768"), "stderr: {}", stderr);
}

#[test]
fn test_missing_corpus_fails() {
    let (tmp, config) = setup_test_env();
    fs::remove_dir_all(tmp.path().join("data")).unwrap();
    let (_, stderr, ok) = run_council(&config, &["ask", "anything"]);
    assert!(!ok);
    assert!(stderr.contains("does not exist"), "stderr: {}", stderr);
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    let (stdout, _, ok) = run_council(&tmp.path().join("none.toml"), &["completions", "bash"]);
    assert!(ok);
    assert!(stdout.contains("council"));
}
