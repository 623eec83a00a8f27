//! Built-in substitution passes and default targets.
//!
//! Each pass is a fixed search pattern with a fixed replacement template.
//! Together they switch DRF views from `AllowAny` to session-backed
//! authentication: one pass injects the missing import, the other rewrites
//! every `permission_classes = [AllowAny]` declaration.

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use std::path::PathBuf;

/// Import line the guarded pass injects. Its presence makes re-runs a no-op.
pub const SESSION_AUTH_IMPORT: &str =
    "from rest_framework.authentication import SessionAuthentication";

/// A single substitution pass: fixed pattern, fixed replacement template,
/// optional containment guard.
#[derive(Debug, Clone)]
pub struct PatchRule {
    /// Short identifier used in log messages and pass reports
    pub name: &'static str,
    pub pattern: &'static str,
    pub replacement: &'static str,
    /// Skip the whole pass when this text is already present in the file
    pub skip_if: Option<&'static str>,
    /// Compile the pattern with `.` matching newlines (multi-line class bodies)
    pub dot_matches_newline: bool,
}

impl PatchRule {
    pub fn compile(&self) -> Result<Regex> {
        RegexBuilder::new(self.pattern)
            .dot_matches_new_line(self.dot_matches_newline)
            .build()
            .with_context(|| format!("Invalid pattern in rule '{}': {}", self.name, self.pattern))
    }
}

/// The default rule set applied to every target file, in order.
pub fn builtin_rules() -> Vec<PatchRule> {
    vec![
        PatchRule {
            name: "session-auth-import",
            pattern: r"from rest_framework\.permissions import IsAuthenticated, AllowAny",
            replacement: "from rest_framework.authentication import SessionAuthentication\n\
                          from rest_framework.permissions import IsAuthenticated, AllowAny",
            skip_if: Some(SESSION_AUTH_IMPORT),
            dot_matches_newline: false,
        },
        PatchRule {
            name: "allow-any-swap",
            // The optional tail swallows a trailing same-line comment so it
            // does not survive next to the rewritten declaration.
            pattern: r"permission_classes = \[AllowAny\](?:[ \t]*#[^\n]*)?",
            replacement: "# AUTHENTICATION ENABLED\n    \
                          authentication_classes = [SessionAuthentication]\n    \
                          permission_classes = [IsAuthenticated]",
            skip_if: None,
            dot_matches_newline: false,
        },
    ]
}

/// Older, broader variant of the permission swap: anchors on an APIView class
/// header plus its docstring and rewrites the declaration that follows. Kept
/// selectable for files the narrow rule misses, not part of the default set.
pub fn legacy_class_rule() -> PatchRule {
    PatchRule {
        name: "legacy-class-swap",
        pattern: r#"(class \w+APIView\(APIView\):.*?""".*?""")\s+permission_classes = \[AllowAny\]"#,
        replacement: "$1\n\n    # AUTHENTICATION ENABLED\n    \
                      authentication_classes = [SessionAuthentication]\n    \
                      permission_classes = [IsAuthenticated]",
        skip_if: None,
        dot_matches_newline: true,
    }
}

/// The view sources this tool exists to patch, relative to the base directory.
pub fn default_targets() -> Vec<PathBuf> {
    [
        "horilla_api/api_views/requisition/views.py",
        "horilla_api/api_views/requisition/enhanced_views.py",
        "horilla_api/api_views/requisition/workflow_status_views.py",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}
