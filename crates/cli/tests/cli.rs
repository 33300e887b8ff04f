//! End-to-end runs of the archgraph binary

use assert_cmd::Command;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ORDER: &str = r#"
package com.shop;

public class Order extends Entity {
    private Pricing pricing;

    public int total() {
        if (pricing != null) {
            return pricing.price(1) + pricing.price(2);
        }
        return 0;
    }

    public void audit() {
        total();
    }
}
"#;

const PRICING: &str = r#"
package com.shop;

public class Pricing {
    public int price(int qty) { return qty; }
    public int discount() { return 0; }
}
"#;

const ENTITY: &str = "package com.shop;\n\npublic class Entity {}\n";

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let package = dir.path().join("src/com/shop");
        fs::create_dir_all(&package).unwrap();
        fs::write(package.join("Order.java"), ORDER).unwrap();
        fs::write(package.join("Pricing.java"), PRICING).unwrap();
        fs::write(package.join("Entity.java"), ENTITY).unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn src(&self) -> PathBuf {
        self.path().join("src")
    }

    fn store(&self) -> PathBuf {
        self.path().join("state/graph.json")
    }

    fn archgraph(&self) -> Command {
        let mut cmd = Command::cargo_bin("archgraph").unwrap();
        cmd.current_dir(self.path())
            .env_remove("ARCHGRAPH_FILTER_PERCENTAGE")
            .env_remove("ARCHGRAPH_STORE")
            .env_remove("ARCHGRAPH_LIMIT")
            .env_remove("ARCHGRAPH_SYSTEM_NAME")
            .arg("--store")
            .arg(self.store());
        cmd
    }

    fn json(&self, args: &[&str]) -> Value {
        let output = self.archgraph().args(args).output().unwrap();
        assert!(
            output.status.success(),
            "stderr: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }

    fn build(&self) -> Value {
        let src = self.src();
        self.json(&["build", src.to_str().unwrap(), "--all"])
    }
}

fn class_names(structure: &Value) -> Vec<String> {
    structure["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

#[test]
fn test_build_projects_significant_structure() {
    let ws = Workspace::new();

    let structure = ws.build();

    assert!(ws.store().is_file());
    assert_eq!(structure["systemName"], Value::Null);
    assert_eq!(class_names(&structure), vec!["Entity", "Order", "Pricing"]);
    assert_eq!(
        structure["classes"][1],
        json!({
            "name": "Order",
            "extendedClasses": ["Entity"],
            "implementedInterfaces": [],
            "methods": [{
                "name": "total",
                "visibility": "public",
                "methodCalls": ["price"],
                "controlFlow": [{ "type": "if", "condition": "pricing != null" }]
            }],
            "fields": [{ "name": "pricing", "type": "Pricing", "visibility": "private" }],
            "imports": []
        })
    );
    // `discount` is never called, so it is not significant
    assert_eq!(
        structure["classes"][2]["methods"],
        json!([{ "name": "price", "visibility": "public", "methodCalls": [], "controlFlow": [] }])
    );
}

#[test]
fn test_project_reads_persisted_graph() {
    let ws = Workspace::new();
    ws.build();

    let top = ws.json(&["project", "--limit", "1"]);

    assert_eq!(class_names(&top), vec!["Order"]);
}

#[test]
fn test_reset_clears_graph() {
    let ws = Workspace::new();
    ws.build();

    ws.archgraph().arg("reset").assert().success();

    let all = ws.json(&["project", "--all"]);
    assert_eq!(all["classes"], json!([]));
    let rows = ws.json(&["dump"]);
    assert_eq!(rows, json!([]));
}

#[test]
fn test_analyze_prints_files_and_counts() {
    let ws = Workspace::new();
    let src = ws.src();

    let processed = ws.json(&["analyze", src.to_str().unwrap()]);

    assert_eq!(
        processed["counts"],
        json!({
            "com.shop.Order.total()": 1,
            "com.shop.Pricing.price(int)": 2
        })
    );
    let files: Vec<&str> = processed["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f.as_str().unwrap())
        .collect();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.ends_with(".java")));
}

#[test]
fn test_system_name_from_env() {
    let ws = Workspace::new();
    ws.build();

    let output = ws
        .archgraph()
        .env("ARCHGRAPH_SYSTEM_NAME", "shop")
        .args(["project", "--all"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let structure: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(structure["systemName"], "shop");
}

#[test]
fn test_out_of_range_filter_percentage_is_rejected() {
    let ws = Workspace::new();
    let src = ws.src();

    let output = ws
        .archgraph()
        .env("ARCHGRAPH_FILTER_PERCENTAGE", "1.5")
        .args(["analyze", src.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("filter_percentage"));

    fs::write(src.join("archgraph.toml"), "filter_percentage = 2.0\n").unwrap();
    ws.archgraph()
        .args(["analyze", src.to_str().unwrap()])
        .assert()
        .failure();
}
