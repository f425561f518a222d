//! Public entry points (spec.md §6 "External interfaces").

use std::collections::BTreeMap;
use std::path::Path;

use libdetect_core::{
    apply_exact_matches, detect_exact_libs, detect_libs, propagate_partial_matches, Dex, PackageTree, PkgResult,
};
use libdetect_corpus::{extract_pkgs, update_library_database};

use crate::apk::read_dex_entries;
use crate::context::AnalysisContext;
use crate::error::{ApkOutcome, DexFailure, Error, Result};

/// A callback that turns raw DEX bytes (one `classes*.dex` entry) into a
/// [`Dex`] implementation. `libdetect` does not parse DEX bytecode itself
/// (spec.md §9 Non-goals); callers inject the parser they already have.
pub type DexParser<'a> = dyn Fn(&[u8]) -> Result<Box<dyn Dex>> + 'a;

fn build_tree(ctx: &AnalysisContext, dex: &dyn Dex) -> Result<PackageTree> {
    Ok(PackageTree::build(dex, ctx.database().api_allowlist())?)
}

/// `detect_dex_libraries`: exact + partial match report for one DEX.
pub fn detect_dex_libraries(ctx: &AnalysisContext, dex: &dyn Dex) -> Result<Vec<PkgResult>> {
    let mut tree = build_tree(ctx, dex)?;
    let matches = ctx.database().match_libs(&tree.fingerprints())?;
    apply_exact_matches(&mut tree, &matches);
    propagate_partial_matches(&mut tree);
    Ok(detect_libs(&tree, ctx.thresholds().lib_match_rate, ctx.include_subpkgs()))
}

/// `detect_exact_dex_libraries`: exact-match-only report for one DEX.
pub fn detect_exact_dex_libraries(ctx: &AnalysisContext, dex: &dyn Dex) -> Result<BTreeMap<String, String>> {
    let mut tree = build_tree(ctx, dex)?;
    let matches = ctx.database().match_libs(&tree.fingerprints())?;
    apply_exact_matches(&mut tree, &matches);
    Ok(detect_exact_libs(&tree))
}

/// `add_dex_to_database`: corpus ingestion for one DEX.
pub fn add_dex_to_database(ctx: &mut AnalysisContext, dex: &dyn Dex) -> Result<()> {
    let tree = build_tree(ctx, dex)?;
    let pkgs = extract_pkgs(&tree, ctx.thresholds());
    ctx.database_mut().add_pkgs(&pkgs)?;
    Ok(())
}

/// `remove_dex_from_database`: symmetric with [`add_dex_to_database`], used
/// when replacing an older version of the same APK.
pub fn remove_dex_from_database(ctx: &mut AnalysisContext, dex: &dyn Dex) -> Result<()> {
    let tree = build_tree(ctx, dex)?;
    let pkgs = extract_pkgs(&tree, ctx.thresholds());
    ctx.database_mut().remove_pkgs(&pkgs)?;
    Ok(())
}

/// `update_library_database`: run the distiller against whatever has been
/// ingested so far.
pub fn run_update_library_database(ctx: &mut AnalysisContext) -> Result<()> {
    let thresholds = ctx.thresholds().clone();
    update_library_database(ctx.database_mut(), &thresholds)?;
    Ok(())
}

/// `detect_apk_libraries`: union per-DEX [`detect_dex_libraries`] results
/// over every `classes*.dex` entry, continuing past a single DEX's failure
/// rather than aborting the whole APK (spec.md §7).
pub fn detect_apk_libraries(
    ctx: &AnalysisContext,
    apk_path: impl AsRef<Path>,
    parse_dex: &DexParser<'_>,
) -> Result<ApkOutcome<Vec<PkgResult>>> {
    let entries = read_dex_entries(apk_path)?;
    let mut result = Vec::new();
    let mut failures = Vec::new();

    for (entry_name, bytes) in entries {
        match parse_dex(&bytes).and_then(|dex| detect_dex_libraries(ctx, dex.as_ref())) {
            Ok(mut found) => result.append(&mut found),
            Err(error) => {
                tracing::warn!(target = "libdetect.apk", entry = %entry_name, %error, "failed to analyze dex entry");
                failures.push(DexFailure { entry_name, error });
            }
        }
    }

    Ok(ApkOutcome { result, failures })
}

/// `detect_exact_apk_libraries`: exact-match analogue of [`detect_apk_libraries`].
pub fn detect_exact_apk_libraries(
    ctx: &AnalysisContext,
    apk_path: impl AsRef<Path>,
    parse_dex: &DexParser<'_>,
) -> Result<ApkOutcome<BTreeMap<String, String>>> {
    let entries = read_dex_entries(apk_path)?;
    let mut result = BTreeMap::new();
    let mut failures = Vec::new();

    for (entry_name, bytes) in entries {
        match parse_dex(&bytes).and_then(|dex| detect_exact_dex_libraries(ctx, dex.as_ref())) {
            Ok(found) => result.extend(found),
            Err(error) => {
                tracing::warn!(target = "libdetect.apk", entry = %entry_name, %error, "failed to analyze dex entry");
                failures.push(DexFailure { entry_name, error });
            }
        }
    }

    Ok(ApkOutcome { result, failures })
}

/// `add_apk_to_database`: ingestion wrapper over every `classes*.dex` entry.
pub fn add_apk_to_database(
    ctx: &mut AnalysisContext,
    apk_path: impl AsRef<Path>,
    parse_dex: &DexParser<'_>,
) -> Result<Vec<DexFailure>> {
    apply_per_dex(ctx, apk_path, parse_dex, add_dex_to_database)
}

/// `remove_apk_from_database`: symmetric with [`add_apk_to_database`].
pub fn remove_apk_from_database(
    ctx: &mut AnalysisContext,
    apk_path: impl AsRef<Path>,
    parse_dex: &DexParser<'_>,
) -> Result<Vec<DexFailure>> {
    apply_per_dex(ctx, apk_path, parse_dex, remove_dex_from_database)
}

fn apply_per_dex(
    ctx: &mut AnalysisContext,
    apk_path: impl AsRef<Path>,
    parse_dex: &DexParser<'_>,
    op: fn(&mut AnalysisContext, &dyn Dex) -> Result<()>,
) -> Result<Vec<DexFailure>> {
    let entries = read_dex_entries(apk_path)?;
    let mut failures = Vec::new();

    for (entry_name, bytes) in entries {
        let outcome = parse_dex(&bytes).and_then(|dex| op(ctx, dex.as_ref()));
        if let Err(error) = outcome {
            tracing::warn!(target = "libdetect.apk", entry = %entry_name, %error, "failed to ingest dex entry");
            failures.push(DexFailure { entry_name, error });
        }
    }

    Ok(failures)
}

/// `dump_database`: persist the active backend, if it supports it.
pub fn dump_database(ctx: &AnalysisContext) -> Result<()> {
    ctx.database().dump().map_err(Error::from)
}

/// `load_database`: load the active backend's durable state, if it supports it.
pub fn load_database(ctx: &mut AnalysisContext) -> Result<()> {
    ctx.database_mut().load().map_err(Error::from)
}
