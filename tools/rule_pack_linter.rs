/// Rule Pack Linter: validates includes, symbols and root rules.
///
/// Usage: rule_pack_linter <rule_pack_dir_or_file> [--context <PREFIX_>]...

use callout_engine::core::events::CONTEXT_PREFIXES;
use callout_engine::core::grammar::{LintIssue, RulePackSet, ROOT_KEYWORD};
use std::path::Path;
use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: rule_pack_linter <rule_pack_dir_or_file> [--context <PREFIX_>]...");
        process::exit(0);
    }

    let pack_path = Path::new(&args[1]);
    let mut prefixes: Vec<String> = CONTEXT_PREFIXES.iter().map(|p| p.to_string()).collect();

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--context" && i + 1 < args.len() {
            i += 1;
            prefixes.push(args[i].clone());
        }
        i += 1;
    }

    let mut packs = RulePackSet::new();
    let mut load_failures = 0;
    if pack_path.is_file() {
        match RulePackSet::load_from_ron(pack_path) {
            Ok(set) => packs.merge(set),
            Err(e) => {
                eprintln!("ERROR: Failed to load rule pack file: {}", e);
                process::exit(1);
            }
        }
    } else if pack_path.is_dir() {
        load_failures = load_packs_recursive(pack_path, &mut packs);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", pack_path.display());
        process::exit(1);
    }

    println!("Loaded {} rule packs", packs.len());

    let prefix_refs: Vec<&str> = prefixes.iter().map(String::as_str).collect();
    let issues = packs.lint(&prefix_refs);
    let (errors, warnings): (Vec<&LintIssue>, Vec<&LintIssue>) =
        issues.iter().partition(|issue| is_error(issue));

    println!("\n=== Rule Pack Lint Report ===\n");

    let mut pools: Vec<_> = packs.pools().collect();
    pools.sort();
    for pool in pools {
        println!("  {}: {} '{}' rules", pool, packs.rule_count(pool, ROOT_KEYWORD), ROOT_KEYWORD);
    }
    println!();

    if issues.is_empty() && load_failures == 0 {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings, {} files failed to load",
        errors.len(),
        warnings.len(),
        load_failures
    );

    if errors.is_empty() && load_failures == 0 {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

/// Undefined and endless symbols fail at runtime; the rest only waste content.
fn is_error(issue: &LintIssue) -> bool {
    matches!(
        issue,
        LintIssue::UndefinedSymbol { .. }
            | LintIssue::UnknownInclude { .. }
            | LintIssue::EndlessSymbol { .. }
    )
}

fn load_packs_recursive(dir: &Path, packs: &mut RulePackSet) -> usize {
    let mut failures = 0;
    let Ok(entries) = std::fs::read_dir(dir) else {
        return failures;
    };
    let mut paths: Vec<_> = entries.flatten().map(|entry| entry.path()).collect();
    paths.sort();
    for path in paths {
        if path.is_dir() {
            failures += load_packs_recursive(&path, packs);
        } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
            match RulePackSet::load_from_ron(&path) {
                Ok(set) => {
                    println!("  Loaded: {}", path.display());
                    packs.merge(set);
                }
                Err(e) => {
                    eprintln!("  ERROR loading {}: {}", path.display(), e);
                    failures += 1;
                }
            }
        }
    }
    failures
}
