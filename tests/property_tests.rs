//! Property-based tests for authpatch
//!
//! This module uses proptest to verify core invariants of the patch pipeline.
//! Property-based testing generates hundreds of random inputs to verify
//! that certain properties always hold true.

use std::fs;
use tempfile::TempDir;

use authpatch::{builtin_rules, FileStatus, Patcher};

// Import proptest macro
use proptest::prelude::*;

/// Build a plausible DRF view module with `decl_count` AllowAny declarations
/// interleaved with harmless filler comments.
fn view_fixture(decl_count: usize, filler: &[String]) -> String {
    let mut source =
        String::from("from rest_framework.permissions import IsAuthenticated, AllowAny\n\n");

    for i in 0..decl_count {
        if let Some(line) = filler.get(i % filler.len().max(1)) {
            source.push_str(&format!("# {}\n", line));
        }
        source.push_str(&format!("class View{}(APIView):\n", i));
        if i % 2 == 0 {
            source.push_str("    permission_classes = [AllowAny]\n\n");
        } else {
            source.push_str("    permission_classes = [AllowAny]  # open endpoint\n\n");
        }
    }

    source
}

// ============================================================================
// Property 1: No match means no change
// ============================================================================
// Content without any of the fixed patterns passes through byte-for-byte

proptest! {
    /// Content that can't contain the patterns is returned unchanged
    #[test]
    fn prop_unrelated_content_is_untouched(
        text in "[a-m \\n]{0,200}"
    ) {
        let patcher = Patcher::new(builtin_rules());
        let (patched, passes) = patcher.apply_rules(&text).unwrap();

        prop_assert_eq!(patched, text);
        prop_assert!(passes.iter().all(|p| p.replacements == 0));
    }

    /// A no-op preview against a real file leaves the file alone
    #[test]
    fn prop_no_match_means_no_write(
        text in "[a-m \\n]{0,200}"
    ) {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("module.py");
        fs::write(&file_path, &text).unwrap();

        let patcher = Patcher::new(builtin_rules());
        let report = patcher.apply_to_file(&file_path).unwrap();

        prop_assert_eq!(report.status, FileStatus::Unchanged);
        prop_assert_eq!(fs::read_to_string(&file_path).unwrap(), text);
    }
}

// ============================================================================
// Property 2: Idempotence
// ============================================================================
// Running the pipeline twice gives the same result as running it once

proptest! {
    #[test]
    fn prop_pipeline_is_idempotent(
        filler in prop::collection::vec("[a-z ]{0,30}", 0..5),
        decl_count in 1usize..6
    ) {
        let source = view_fixture(decl_count, &filler);
        let patcher = Patcher::new(builtin_rules());

        let (once, _) = patcher.apply_rules(&source).unwrap();
        let (twice, passes) = patcher.apply_rules(&once).unwrap();

        prop_assert_eq!(&once, &twice);
        // Second run: the import guard fires and nothing is left to swap
        prop_assert!(passes[0].guard_hit);
        prop_assert_eq!(passes[1].replacements, 0);
    }
}

// ============================================================================
// Property 3: Exact substitution counts
// ============================================================================
// One replacement per occurrence, everything else preserved

proptest! {
    #[test]
    fn prop_every_declaration_is_rewritten(
        filler in prop::collection::vec("[a-z ]{0,30}", 0..5),
        decl_count in 1usize..8
    ) {
        let source = view_fixture(decl_count, &filler);
        let patcher = Patcher::new(builtin_rules());

        let (patched, passes) = patcher.apply_rules(&source).unwrap();

        prop_assert_eq!(passes[0].replacements, 1);
        prop_assert_eq!(passes[1].replacements, decl_count);

        prop_assert!(!patched.contains("[AllowAny]"));
        prop_assert_eq!(
            patched.matches("permission_classes = [IsAuthenticated]").count(),
            decl_count
        );
        prop_assert_eq!(
            patched.matches("authentication_classes = [SessionAuthentication]").count(),
            decl_count
        );
    }

    #[test]
    fn prop_surrounding_lines_survive(
        prefix in "[a-z ]{0,40}",
        suffix in "[a-z ]{0,40}"
    ) {
        let source = format!(
            "# {}\nfrom rest_framework.permissions import IsAuthenticated, AllowAny\n\n    permission_classes = [AllowAny]\n# {}\n",
            prefix, suffix
        );
        let patcher = Patcher::new(builtin_rules());

        let (patched, _) = patcher.apply_rules(&source).unwrap();

        let expected_prefix = format!("# {}\n", prefix);
        let expected_suffix = format!("# {}\n", suffix);
        prop_assert!(patched.starts_with(&expected_prefix));
        prop_assert!(patched.ends_with(&expected_suffix));
    }
}
