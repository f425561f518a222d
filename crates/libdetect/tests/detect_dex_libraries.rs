use std::collections::HashSet;

use libdetect::{
    add_dex_to_database, detect_dex_libraries, run_update_library_database, AnalysisContext, Dex, DexClass,
    DexMethod, InMemoryDatabase, Thresholds,
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

#[test]
fn ingesting_then_distilling_makes_a_later_dex_detectable() {
    let temp = tempfile::tempdir().unwrap();
    let db = InMemoryDatabase::new(temp.path(), allowlist(), HashSet::new());
    let mut ctx = AnalysisContext::new(Box::new(db), Thresholds {
        min_lib_count: 1,
        ..Thresholds::default()
    });

    // Observe the same package five times (default min_api_weight=3 is
    // satisfied since both classes combine to weight 5 >= 3).
    for _ in 0..5 {
        add_dex_to_database(&mut ctx, &gson_dex()).unwrap();
    }
    run_update_library_database(&mut ctx).unwrap();

    // The "Lcom/google" node is itself a perfect-fit exact match (it was
    // ingested and distilled just like its child), so completeness stops
    // descent there and "Lcom/google/gson" is never separately reported.
    let results = detect_dex_libraries(&ctx, &gson_dex()).unwrap();
    assert!(results.iter().any(|r| r.lib_name == "Lcom/google"));
}

#[test]
fn a_dex_never_ingested_reports_nothing() {
    let temp = tempfile::tempdir().unwrap();
    let db = InMemoryDatabase::new(temp.path(), allowlist(), HashSet::new());
    let ctx = AnalysisContext::new(Box::new(db), Thresholds::default());

    let results = detect_dex_libraries(&ctx, &gson_dex()).unwrap();
    assert!(results.is_empty());
}
