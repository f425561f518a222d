use std::collections::HashSet;
use std::io::Write;

use libdetect::{
    add_dex_to_database, detect_apk_libraries, run_update_library_database, AnalysisContext, Dex, DexClass,
    DexMethod, Error, InMemoryDatabase, Thresholds,
};

struct FakeMethod(Vec<String>);
impl DexMethod for FakeMethod {
    fn invoked_methods(&self) -> Box<dyn Iterator<Item = &str> + '_> {
        Box::new(self.0.iter().map(String::as_str))
    }
}
struct FakeClass {
    name: String,
    methods: Vec<FakeMethod>,
}
impl DexClass for FakeClass {
    fn name(&self) -> &str {
        &self.name
    }
    fn methods(&self) -> Box<dyn Iterator<Item = &dyn DexMethod> + '_> {
        Box::new(self.methods.iter().map(|m| m as &dyn DexMethod))
    }
}
struct FakeDex(Vec<FakeClass>);
impl Dex for FakeDex {
    fn classes(&self) -> Box<dyn Iterator<Item = &dyn DexClass> + '_> {
        Box::new(self.0.iter().map(|c| c as &dyn DexClass))
    }
}

fn gson_dex() -> FakeDex {
    FakeDex(vec![
        FakeClass {
            name: "Lcom/google/gson/Gson".to_string(),
            methods: vec![FakeMethod(vec!["A".into(), "B".into(), "C".into()])],
        },
        FakeClass {
            name: "Lcom/google/gson/JsonObject".to_string(),
            methods: vec![FakeMethod(vec!["D".into(), "E".into()])],
        },
    ])
}

fn allowlist() -> HashSet<String> {
    ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect()
}

/// Writes a zip with the given entries to a fresh temp file and returns the
/// directory (kept alive so the file isn't deleted) alongside its path.
fn make_apk(entries: &[(&str, &[u8])]) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.apk");
    let file = std::fs::File::create(&path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, contents) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
    (dir, path)
}

/// A failure in one `classes*.dex` entry is collected rather than aborting
/// the whole APK; the other entry's results still come through.
#[test]
fn apk_scan_collects_one_failure_and_still_reports_the_other_entry() {
    let (_dir, apk_path) = make_apk(&[("classes.dex", b"good"), ("classes2.dex", b"bad")]);

    let temp = tempfile::tempdir().unwrap();
    let db = InMemoryDatabase::new(temp.path(), allowlist(), HashSet::new());
    let mut ctx = AnalysisContext::new(Box::new(db), Thresholds {
        min_lib_count: 1,
        ..Thresholds::default()
    });

    for _ in 0..5 {
        add_dex_to_database(&mut ctx, &gson_dex()).unwrap();
    }
    run_update_library_database(&mut ctx).unwrap();

    let parse_dex = |bytes: &[u8]| -> libdetect::Result<Box<dyn Dex>> {
        if bytes == b"bad" {
            Err(Error::NoDexEntries)
        } else {
            Ok(Box::new(gson_dex()) as Box<dyn Dex>)
        }
    };

    let outcome = detect_apk_libraries(&ctx, &apk_path, &parse_dex).unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].entry_name, "classes2.dex");
    assert!(outcome.result.iter().any(|r| r.lib_name == "Lcom/google"));
}
