use rstest::rstest;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use tempfile::TempDir;
use tinypack_rs::bundler::{FnLoader, LoaderRegistry};
use tinypack_rs::config::RuleConfig;
use tinypack_rs::{BundleConfig, BundleError, Compiler, HookPoint};

fn fixture(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (file, content) in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn config(dir: &TempDir, json: serde_json::Value) -> BundleConfig {
    let mut config = BundleConfig::from_value(json).unwrap();
    config.context = Some(dir.path().to_path_buf());
    config
}

fn written_files(dir: &Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    let mut files: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    files.sort();
    files
}

#[test]
fn test_single_entry_with_hook_log() {
    let dir = fixture(&[
        ("index.js", "const util = require('./util');\nconsole.log(util.greet());\n"),
        ("util.js", "exports.greet = () => 'hello';\n"),
    ]);
    let config = config(
        &dir,
        serde_json::json!({
            "entry": { "main": "./index.js" },
            "resolve": { "extensions": [".js"] }
        }),
    );
    let bundle_path = dir.path().join("dist/main.js");

    let log = Rc::new(RefCell::new(Vec::new()));
    let mut compiler = Compiler::new(config).unwrap();
    for point in HookPoint::ALL {
        let log = log.clone();
        let bundle_path = bundle_path.clone();
        compiler.hooks_mut().tap(point, "Recorder", move || {
            log.borrow_mut().push((point, bundle_path.exists()));
            Ok(())
        });
    }
    let output = compiler.run().unwrap();

    assert_eq!(
        *log.borrow(),
        vec![
            (HookPoint::Run, false),
            (HookPoint::Emit, false),
            (HookPoint::Done, true)
        ]
    );
    assert_eq!(output.files, vec![bundle_path.clone()]);
    assert_eq!(output.assets.len(), 1);

    let bundle = fs::read_to_string(&bundle_path).unwrap();
    assert_eq!(bundle, output.assets[&bundle_path]);
    assert!(bundle.contains("exports.greet"));
    assert!(bundle.contains("console.log(util.greet());"));
    assert!(bundle.contains("./util.js"));
    assert!(!bundle.contains("require('./util')"));
    assert!(bundle.contains("function require(moduleId)"));

    let ids: Vec<&str> = output.modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["./index.js", "./util.js"]);
}

#[test]
fn test_missing_dependency_writes_nothing() {
    let dir = fixture(&[("index.js", "require('./missing');\n")]);
    let config = config(&dir, serde_json::json!({ "entry": "./index.js" }));

    let err = Compiler::new(config).unwrap().run().unwrap_err();
    match &err {
        BundleError::Resolution {
            specifier,
            directory,
        } => {
            assert_eq!(specifier, "./missing");
            assert!(!directory.contains('\\'));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("Module not found: Cannot resolve './missing' in '"));
    assert!(written_files(&dir.path().join("dist")).is_empty());
}

#[test]
fn test_builds_are_idempotent() {
    let dir = fixture(&[
        ("src/index.js", "const a = require('./a');\nconst data = require('./data');\n"),
        ("src/a.js", "// a\nmodule.exports = require('./b');\n"),
        ("src/b.js", "module.exports = require('./a');\n"),
        ("src/data.json", "{\"ok\": true}"),
    ]);
    let json = serde_json::json!({
        "module": { "rules": [{ "test": "\\.json$", "use": "json" }] },
        "resolve": { "extensions": [".js", ".json"] }
    });

    let first = Compiler::new(config(&dir, json.clone())).unwrap().run().unwrap();
    let second = Compiler::new(config(&dir, json)).unwrap().run().unwrap();
    assert_eq!(first.assets, second.assets);
    assert_eq!(first.modules, second.modules);
}

#[test]
fn test_shared_dependency_is_built_once() {
    let dir = fixture(&[
        (
            "index.js",
            "require('./one');\nrequire('./two');\nrequire('./three');\n",
        ),
        ("one.js", "module.exports = require('./shared');\n"),
        ("two.js", "module.exports = require('./shared.js');\n"),
        ("three.js", "module.exports = require('././shared');\n"),
        ("shared.js", "module.exports = {};\n"),
    ]);
    let builds = Rc::new(RefCell::new(Vec::new()));
    let mut registry = LoaderRegistry::empty();
    {
        let builds = builds.clone();
        registry.register(FnLoader::new("count", move |source: &str| {
            builds.borrow_mut().push(source.to_string());
            Ok(source.to_string())
        }));
    }
    let mut config = config(&dir, serde_json::json!({ "entry": "./index.js" }));
    config
        .module
        .rules
        .push(RuleConfig::new("shared\\.js$", &["count"]).unwrap());

    let output = Compiler::with_loaders(config, registry).unwrap().run().unwrap();

    assert_eq!(builds.borrow().len(), 1);
    let ids: Vec<&str> = output.modules.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(
        ids,
        vec!["./index.js", "./one.js", "./shared.js", "./two.js", "./three.js"]
    );
    let bundle = output.assets.values().next().unwrap();
    // three requires plus the registry key
    assert_eq!(bundle.matches("./shared.js").count(), 4);
}

#[rstest]
#[case(&[("a.json", "{}")], "./a.json")]
#[case(&[("a.js", ""), ("a.json", "{}")], "./a.js")]
#[case(&[("a", ""), ("a.js", "")], "./a")]
fn test_extension_probing(#[case] files: &[(&str, &str)], #[case] expected: &str) {
    let mut all_files = vec![("index.js", "require('./a');\n")];
    all_files.extend_from_slice(files);
    let dir = fixture(&all_files);
    let config = config(
        &dir,
        serde_json::json!({
            "entry": "./index.js",
            "module": { "rules": [{ "test": "\\.json$", "use": "json" }] },
            "resolve": { "extensions": [".js", ".json"] }
        }),
    );

    let output = Compiler::new(config).unwrap().run().unwrap();
    assert_eq!(output.modules[1].id, expected);
}

#[test]
fn test_directories_are_not_modules() {
    let dir = fixture(&[("index.js", "require('./lib');\n"), ("lib/x.js", ""), ("lib.js", "")]);
    let config = config(&dir, serde_json::json!({ "entry": "./index.js" }));
    let output = Compiler::new(config).unwrap().run().unwrap();
    assert_eq!(output.modules[1].id, "./lib.js");
}

#[test]
fn test_entries_share_a_module() {
    let dir = fixture(&[
        ("one.js", "require('./shared');\nrequire('./own');\n"),
        ("own.js", ""),
        ("two.js", "require('./shared');\n"),
        ("shared.js", "module.exports = 'shared';\n"),
    ]);
    let config = config(
        &dir,
        serde_json::json!({
            "entry": { "one": "./one.js", "two": "./two.js" },
            "output": { "path": "out", "filename": "[name].bundle.js" }
        }),
    );

    let output = Compiler::new(config).unwrap().run().unwrap();

    assert_eq!(
        written_files(&dir.path().join("out")),
        vec!["one.bundle.js", "two.bundle.js"]
    );
    let owners: Vec<(&str, &str)> = output
        .modules
        .iter()
        .map(|m| (m.id.as_str(), m.entry_name.as_str()))
        .collect();
    assert_eq!(
        owners,
        vec![
            ("./one.js", "one"),
            ("./shared.js", "one"),
            ("./own.js", "one"),
            ("./two.js", "two")
        ]
    );
    assert_eq!(output.chunks[0].modules, vec!["./one.js", "./shared.js", "./own.js"]);
    assert_eq!(output.chunks[1].modules, vec!["./shared.js", "./two.js"]);
    assert_eq!(output.chunks[1].entry, "./two.js");

    let two = &output.assets[&dir.path().join("out/two.bundle.js")];
    assert!(two.contains("module.exports = 'shared';"));
    assert!(!two.contains("./own.js"));
}

#[test]
fn test_loader_failure_writes_nothing() {
    let dir = fixture(&[("index.js", "require('./bad.json');\n"), ("bad.json", "{ nope")]);
    let config = config(
        &dir,
        serde_json::json!({
            "entry": "./index.js",
            "module": { "rules": [{ "test": "\\.json$", "use": ["json"] }] }
        }),
    );
    let err = Compiler::new(config).unwrap().run().unwrap_err();
    assert!(matches!(err, BundleError::Transform { ref loader, .. } if loader == "json"));
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_run_hook_failure_writes_nothing() {
    let dir = fixture(&[("src/index.js", "1;\n")]);
    let mut compiler = Compiler::new(config(&dir, serde_json::json!({}))).unwrap();
    compiler
        .hooks_mut()
        .tap(HookPoint::Run, "Broken", || Err(anyhow::anyhow!("boom")));
    let err = compiler.run().unwrap_err();
    assert_eq!(err.to_string(), "Plugin 'Broken' failed in the run hook: boom");
    assert!(!dir.path().join("dist").exists());
}

#[test]
fn test_missing_entry() {
    let dir = fixture(&[]);
    let err = Compiler::new(config(&dir, serde_json::json!({})))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, BundleError::Read { ref path, .. } if path.ends_with("src/index.js")));
}

#[test]
fn test_clean_output() {
    let dir = fixture(&[("src/index.js", "1;\n"), ("dist/stale.js", "old")]);

    Compiler::new(config(&dir, serde_json::json!({})))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(
        written_files(&dir.path().join("dist")),
        vec!["main.js", "stale.js"]
    );

    Compiler::new(config(&dir, serde_json::json!({ "output": { "clean": true } })))
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(written_files(&dir.path().join("dist")), vec!["main.js"]);
}

#[test]
fn test_entry_order_follows_config() {
    let dir = fixture(&[
        ("zeta.js", "require('./shared');\n"),
        ("alpha.js", "require('./shared');\n"),
        ("shared.js", "module.exports = 1;\n"),
    ]);
    let mut config = BundleConfig::from_json_str(
        r#"{ "entry": { "zeta": "./zeta.js", "alpha": "./alpha.js" } }"#,
    )
    .unwrap();
    config.context = Some(dir.path().to_path_buf());

    let output = Compiler::new(config).unwrap().run().unwrap();

    let chunks: Vec<&str> = output.chunks.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(chunks, vec!["zeta", "alpha"]);
    assert_eq!(
        output.files,
        vec![
            dir.path().join("dist/zeta.js"),
            dir.path().join("dist/alpha.js")
        ]
    );
    assert_eq!(output.modules[1].id, "./shared.js");
    assert_eq!(output.modules[1].entry_name, "zeta");
}

#[test]
fn test_json_is_not_probed_by_default() {
    let dir = fixture(&[("src/index.js", "require('./data');\n"), ("src/data.json", "{}")]);
    let err = Compiler::new(config(&dir, serde_json::json!({})))
        .unwrap()
        .run()
        .unwrap_err();
    assert!(matches!(err, BundleError::Resolution { ref specifier, .. } if specifier == "./data"));
}
