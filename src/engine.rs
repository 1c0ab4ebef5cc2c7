//! The patch engine: sequential rule application over one text value.
//!
//! The engine owns no I/O. It consumes the current file text, runs the rule
//! pipeline, and reports the final text together with an aggregate changed
//! verdict and a per-rule outcome for the CLI to display.

use crate::rules::{default_rules, Rule, RuleError};

/// Outcome of one rule within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule fired and modified the text.
    Applied { via_fallback: bool },
    /// The rule's effect was already present; nothing to do.
    AlreadyApplied,
    /// Best-effort rule whose optional pattern did not match.
    Skipped,
}

/// Per-rule report, in pipeline order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleReport {
    pub rule: &'static str,
    pub outcome: RuleOutcome,
}

/// Accumulated result of running the full pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome carries the changed verdict and final text"]
pub struct PatchOutcome {
    /// Final text; byte-identical to the input when `changed` is false.
    pub text: String,
    /// True if any rule modified the text.
    pub changed: bool,
    pub reports: Vec<RuleReport>,
}

/// Applies the fixed rule pipeline to source text.
pub struct PatchEngine {
    rules: Vec<Box<dyn Rule>>,
}

impl PatchEngine {
    pub fn new() -> Self {
        Self::with_rules(default_rules())
    }

    /// Build an engine over a custom pipeline. Rules run in the given order.
    pub fn with_rules(rules: Vec<Box<dyn Rule>>) -> Self {
        Self { rules }
    }

    /// Run every rule in order over `source`.
    ///
    /// Each rule transitions at most once per run: already applied, primary
    /// anchor, fallback anchor, or (for best-effort rules) skip. An
    /// unresolvable required anchor aborts the whole run.
    pub fn run(&self, source: String) -> Result<PatchOutcome, RuleError> {
        let mut text = source;
        let mut changed = false;
        let mut reports = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let outcome = if rule.is_applied(&text) {
                RuleOutcome::AlreadyApplied
            } else if let Some(next) = rule.apply(&text) {
                text = next;
                changed = true;
                RuleOutcome::Applied { via_fallback: false }
            } else if let Some(next) = rule.apply_fallback(&text)? {
                text = next;
                changed = true;
                RuleOutcome::Applied { via_fallback: true }
            } else {
                RuleOutcome::Skipped
            };

            reports.push(RuleReport {
                rule: rule.id(),
                outcome,
            });
        }

        Ok(PatchOutcome {
            text,
            changed,
            reports,
        })
    }
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNPATCHED_PAGE: &str = r#"import { useMemo } from "react";
import Link from "next/link";

function getParam(searchParams: any) {
  return searchParams?.rid;
}

function normalizeRid(raw?: string) {
  return (raw ?? "").trim();
}

export default function ContractPage({ searchParams }: any) {
  const rid = normalizeRid(searchParams.get("rid"));
  return <div>{rid}</div>;
}
"#;

    #[test]
    fn full_pipeline_applies_all_three_rules() {
        let outcome = PatchEngine::new().run(UNPATCHED_PAGE.to_string()).unwrap();

        assert!(outcome.changed);
        assert!(outcome.text.contains("export const dynamic = \"force-dynamic\";"));
        assert!(outcome.text.contains("URLSearchParams-like"));
        assert!(outcome
            .text
            .contains("const rid = normalizeRid(getParam(searchParams, \"rid\"));"));
        assert_eq!(
            outcome
                .reports
                .iter()
                .map(|r| r.outcome)
                .collect::<Vec<_>>(),
            vec![
                RuleOutcome::Applied { via_fallback: false },
                RuleOutcome::Applied { via_fallback: false },
                RuleOutcome::Applied { via_fallback: false },
            ]
        );
    }

    #[test]
    fn second_run_is_a_no_op() {
        let engine = PatchEngine::new();
        let first = engine.run(UNPATCHED_PAGE.to_string()).unwrap();
        let second = engine.run(first.text.clone()).unwrap();

        assert!(!second.changed);
        assert_eq!(second.text, first.text);
        assert!(second
            .reports
            .iter()
            .take(2)
            .all(|r| r.outcome == RuleOutcome::AlreadyApplied));
    }

    #[test]
    fn missing_getparam_uses_fallback_insertion() {
        let source = "import x from \"y\";\n\nfunction normalizeRid(raw?: string) {\n  return raw ?? \"\";\n}\n";
        let outcome = PatchEngine::new().run(source.to_string()).unwrap();

        assert!(outcome.changed);
        assert_eq!(
            outcome.reports[1].outcome,
            RuleOutcome::Applied { via_fallback: true }
        );
        let helper_at = outcome.text.find("function getParam").unwrap();
        let anchor_at = outcome.text.find("function normalizeRid").unwrap();
        assert!(helper_at < anchor_at);
    }

    #[test]
    fn missing_both_anchors_aborts_the_run() {
        let source = "import x from \"y\";\n\nconst x = 1;\n";
        let err = PatchEngine::new().run(source.to_string()).unwrap_err();
        assert!(matches!(err, RuleError::UnresolvableAnchor { .. }));
    }

    #[test]
    fn absent_call_site_is_skipped_not_fatal() {
        let source = "import x from \"y\";\n\nfunction normalizeRid(raw?: string) {\n  return raw ?? \"\";\n}\n\nconst rid = normalizeRid(params.lookup(\"rid\"));\n";
        let outcome = PatchEngine::new().run(source.to_string()).unwrap();

        assert_eq!(outcome.reports[2].outcome, RuleOutcome::Skipped);
        assert!(outcome
            .text
            .contains("const rid = normalizeRid(params.lookup(\"rid\"));"));
    }

    #[test]
    fn fully_patched_input_reports_unchanged_identical_text() {
        let engine = PatchEngine::new();
        let patched = engine.run(UNPATCHED_PAGE.to_string()).unwrap().text;

        let rerun = engine.run(patched.clone()).unwrap();
        assert!(!rerun.changed);
        assert_eq!(rerun.text, patched);
    }
}
