//! Call-frequency analysis over a small on-disk Java project

use archgraph_analyzer::{CallCounts, CallFrequencyAnalyzer, ResultAggregator};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const CART: &str = r#"
package com.shop;

import com.shop.util.Strings;
import static com.shop.util.Strings.shout;

public class Cart {
    private Inventory inventory;
    private Pricing pricing = new Pricing();

    public int total(String label) {
        int sum = 0;
        sum = sum + pricing.price(2);
        sum = sum + this.inventory.count();
        check();
        this.check();
        Strings.trim(label);
        shout(label);
        inventory.describe();
        label.length();
        unknown.call();
        pricing.missing();
        return sum;
    }

    private void check() {}
}
"#;

const PRICING: &str = r#"
package com.shop;

public class Pricing {
    public int price(int qty) {
        return Math.max(qty, 1);
    }
}
"#;

const INVENTORY: &str = r#"
package com.shop;

public class Inventory extends Base {
    public int count() { return 0; }
}
"#;

const BASE: &str = r#"
package com.shop;

public class Base {
    public String describe() {
        return toString();
    }
}
"#;

const STRINGS: &str = r#"
package com.shop.util;

public class Strings {
    public static String trim(String s) { return s; }
    public static String shout(String s) { return s; }
}
"#;

struct Project {
    dir: TempDir,
    files: Vec<PathBuf>,
}

impl Project {
    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn file(&self, name: &str) -> PathBuf {
        self.files
            .iter()
            .find(|f| f.file_name().is_some_and(|n| n == name))
            .cloned()
            .unwrap()
    }
}

fn write(root: &Path, relative: &str, source: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, source).unwrap();
    path
}

fn project() -> Project {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    let files = vec![
        write(&src, "com/shop/Cart.java", CART),
        write(&src, "com/shop/Pricing.java", PRICING),
        write(&src, "com/shop/Inventory.java", INVENTORY),
        write(&src, "com/shop/Base.java", BASE),
        write(&src, "com/shop/util/Strings.java", STRINGS),
    ];
    Project { dir, files }
}

fn counts(entries: &[(&str, usize)]) -> CallCounts {
    entries.iter().map(|(s, c)| ((*s).to_string(), *c)).collect()
}

#[test]
fn test_resolves_project_calls() {
    let project = project();
    let results = CallFrequencyAnalyzer::new().analyze_files(&project.files, project.root());

    assert_eq!(results.len(), 5);
    let cart = &results[0];
    assert_eq!(cart.path, project.file("Cart.java"));
    assert_eq!(
        cart.counts,
        counts(&[
            ("com.shop.Base.describe()", 1),
            ("com.shop.Cart.check()", 2),
            ("com.shop.Inventory.count()", 1),
            ("com.shop.Pricing.price(int)", 1),
            ("com.shop.util.Strings.shout(java.lang.String)", 1),
            ("com.shop.util.Strings.trim(java.lang.String)", 1),
        ])
    );
    assert_eq!(cart.excluded, 1);
    assert_eq!(cart.unresolved, 2);
    assert!(cart.error.is_none());
}

#[test]
fn test_standard_library_calls_are_excluded() {
    let project = project();
    let results = CallFrequencyAnalyzer::new().analyze_files(&project.files, project.root());

    for name in ["Pricing.java", "Base.java"] {
        let file = results
            .iter()
            .find(|r| r.path == project.file(name))
            .unwrap();
        assert!(file.counts.is_empty(), "{name}: {:?}", file.counts);
        assert_eq!(file.excluded, 1);
    }
}

#[test]
fn test_custom_std_prefixes() {
    let project = project();
    let analyzer = CallFrequencyAnalyzer::new().with_std_prefixes(vec!["com.shop.util.".to_string()]);
    let total = analyzer.analyze(&project.files, project.root());

    assert!(!total.keys().any(|s| s.starts_with("com.shop.util.")));
    assert_eq!(total.get("java.lang.Math.max(int, int)"), Some(&1));
    assert_eq!(total.get("java.lang.Object.toString()"), Some(&1));
}

#[test]
fn test_parse_failure_is_reported_and_skipped() {
    let mut project = project();
    let broken = write(project.root(), "src/Broken.java", "public class Broken { void x( { }");
    project.files.push(broken.clone());

    let results = CallFrequencyAnalyzer::new().analyze_files(&project.files, project.root());

    let failed = results.iter().find(|r| r.path == broken).unwrap();
    assert!(failed.error.is_some());
    assert!(failed.counts.is_empty());
    assert_eq!(results.iter().filter(|r| r.error.is_some()).count(), 1);
}

#[test]
fn test_missing_file_is_reported() {
    let project = project();
    let missing = project.root().join("src/Missing.java");

    let results = CallFrequencyAnalyzer::new().analyze_files(&[missing], project.root());

    assert_eq!(results.len(), 1);
    assert!(results[0].error.is_some());
}

#[test]
fn test_aggregated_pipeline_keeps_top_methods() {
    let project = project();
    let results = CallFrequencyAnalyzer::new().analyze_files(&project.files, project.root());

    let processed = ResultAggregator::new().process(results);

    assert_eq!(processed.files, project.files);
    assert_eq!(
        processed.counts,
        counts(&[
            ("com.shop.Base.describe()", 1),
            ("com.shop.Cart.check()", 2),
            ("com.shop.Inventory.count()", 1),
            ("com.shop.Pricing.price(int)", 1),
            ("com.shop.util.Strings.shout(java.lang.String)", 1),
        ])
    );
}

#[test]
fn test_same_signature_counts_add_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write(
            dir.path(),
            "B.java",
            "public class B { public void m() {} void a() { m(); m(); } }",
        ),
        write(dir.path(), "C.java", "public class C { void c(B b) { b.m(); } }"),
    ];

    let total = CallFrequencyAnalyzer::new().analyze(&files, dir.path());

    assert_eq!(total, counts(&[("B.m()", 3)]));
}

#[test]
fn test_initializer_and_enum_calls_are_counted() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write(
            dir.path(),
            "app/Util.java",
            "package app;\n\npublic class Util { public static int f() { return 1; } }\n",
        ),
        write(
            dir.path(),
            "app/Config.java",
            r#"
package app;

public class Config {
    static int x = Util.f();
    static {
        Util.f();
    }
    int y = Util.f();
}
"#,
        ),
        write(
            dir.path(),
            "app/Mode.java",
            r#"
package app;

public enum Mode {
    ON;

    int level() { return Util.f(); }
}
"#,
        ),
    ];

    let total = CallFrequencyAnalyzer::new().analyze(&files, dir.path());

    assert_eq!(total, counts(&[("app.Util.f()", 4)]));
}

#[test]
fn test_overloads_and_created_receivers_resolve() {
    let dir = tempfile::tempdir().unwrap();
    let files = vec![
        write(
            dir.path(),
            "app/Log.java",
            r#"
package app;

public class Log {
    public void log(String message) {}
    public void log(int code) {}
    public Log with() { return this; }
}
"#,
        ),
        write(
            dir.path(),
            "app/Client.java",
            r#"
package app;

public class Client {
    void run(String name, Object raw) {
        Log l = new Log();
        l.log("x");
        l.log(3);
        l.log(name);
        new Log().with();
        ((Log) raw).with();
    }
}
"#,
        ),
    ];

    let total = CallFrequencyAnalyzer::new().analyze(&files, dir.path());

    assert_eq!(
        total,
        counts(&[
            ("app.Log.log(int)", 1),
            ("app.Log.log(java.lang.String)", 2),
            ("app.Log.with()", 2),
        ])
    );
}
