//! The fixed transformation rules applied to the contract page.
//!
//! Each rule is a two-state machine: not applied -> applied. A rule checks its
//! own marker first (idempotency), then tries its primary anchor, then its
//! fallback anchor if it has one. Rules return new text instead of mutating;
//! the engine threads the text through the pipeline.

use thiserror::Error;

use crate::anchor::Anchor;

/// Directive block inserted after the leading import block so the query string
/// is not swallowed by static caching.
const DIRECTIVE_BLOCK: &str =
    "export const dynamic = \"force-dynamic\";\nexport const revalidate = 0;\n\n";

/// Marker proving the directive block is already present.
const DIRECTIVE_MARKER: &str = "export const dynamic";

/// The leading run of import lines; the directive block goes right after it.
const IMPORT_BLOCK: &str = r"(?m)^(?:import[^\n]*\n)+";

/// An existing `getParam` definition, up to the first body-closing brace at
/// column 0. Non-greedy so a second definition in the same file is not
/// swallowed into the match.
const GETPARAM_DEFINITION: &str = r"(?s)function\s+getParam\s*\(.*?\n\}";

/// Replacement `getParam` that handles URLSearchParams-like objects, plain
/// `Record` searchParams, and the Promise-typed variant some Next.js versions
/// hand to pages.
const NEW_GETPARAM: &str = r#"function getParam(searchParams: any, key: string): string | undefined {
  if (!searchParams) return undefined;

  // If a Promise was passed (some Next.js typings), we can't synchronously read it.
  if (typeof (searchParams as any)?.then === "function") return undefined;

  // URLSearchParams-like
  if (typeof (searchParams as any)?.get === "function") {
    const v = (searchParams as any).get(key);
    return typeof v === "string" ? v : undefined;
  }

  // Plain object (Next.js App Router): Record<string, string | string[]>
  const raw = (searchParams as any)[key];
  if (Array.isArray(raw)) return typeof raw[0] === "string" ? raw[0] : undefined;
  return typeof raw === "string" ? raw : undefined;
}"#;

/// A `rid` extraction that still calls `.get("rid")` directly instead of going
/// through `getParam`.
const RID_CALL: &str =
    r#"const\s+rid\s*=\s*normalizeRid\(\s*(?P<expr>[^)]+)\.get\(\s*["']rid["']\s*\)\s*\)\s*;"#;

const RID_CALL_REWRITE: &str = r#"const rid = normalizeRid(getParam(${expr}, "rid"));"#;

/// Errors raised by rule application.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// Neither the primary nor the fallback anchor exists, so there is no
    /// valid insertion point. Inserting anywhere else would produce invalid
    /// code, so this aborts the whole run instead of silently skipping.
    #[error("rule `{rule}` cannot resolve an insertion point: neither {primary} nor {fallback} was found")]
    UnresolvableAnchor {
        rule: &'static str,
        primary: String,
        fallback: String,
    },
}

/// A named transformation over source text.
pub trait Rule {
    /// Stable identifier, used in reports and diagnostics.
    fn id(&self) -> &'static str;

    /// Whether this rule's effect is already present in `source`.
    fn is_applied(&self, source: &str) -> bool;

    /// Primary transformation. `None` means the primary anchor is absent.
    fn apply(&self, source: &str) -> Option<String>;

    /// Alternate strategy when the primary anchor is absent. The default is a
    /// best-effort skip; rules with a required effect return an error instead.
    fn apply_fallback(&self, source: &str) -> Result<Option<String>, RuleError> {
        let _ = source;
        Ok(None)
    }
}

/// Rule 1: insert the dynamic-rendering directives after the import block.
pub struct DirectiveRule {
    marker: Anchor,
    import_block: Anchor,
}

impl DirectiveRule {
    pub fn new() -> Self {
        Self {
            marker: Anchor::Marker(DIRECTIVE_MARKER),
            import_block: Anchor::pattern(IMPORT_BLOCK),
        }
    }
}

impl Default for DirectiveRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for DirectiveRule {
    fn id(&self) -> &'static str {
        "dynamic-directives"
    }

    fn is_applied(&self, source: &str) -> bool {
        self.marker.is_present(source)
    }

    fn apply(&self, source: &str) -> Option<String> {
        // Insertion point resolution always succeeds: a file without imports
        // gets the directives at offset 0.
        let at = self
            .import_block
            .locate(source)
            .map(|span| span.end)
            .unwrap_or(0);
        Some(format!(
            "{}{}{}",
            &source[..at],
            DIRECTIVE_BLOCK,
            &source[at..]
        ))
    }
}

/// Rule 2: replace the `getParam` body, or insert the helper before
/// `normalizeRid` when no definition exists yet.
pub struct GetParamRule {
    definition: Anchor,
    fallback: Anchor,
}

impl GetParamRule {
    pub fn new() -> Self {
        Self {
            definition: Anchor::pattern(GETPARAM_DEFINITION),
            fallback: Anchor::Function("normalizeRid"),
        }
    }
}

impl Default for GetParamRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for GetParamRule {
    fn id(&self) -> &'static str {
        "getparam-helper"
    }

    fn is_applied(&self, source: &str) -> bool {
        source.contains(NEW_GETPARAM)
    }

    fn apply(&self, source: &str) -> Option<String> {
        // First matched definition only; a second occurrence stays untouched.
        self.definition.locate(source).map(|span| {
            format!(
                "{}{}{}",
                &source[..span.start],
                NEW_GETPARAM,
                &source[span.end..]
            )
        })
    }

    fn apply_fallback(&self, source: &str) -> Result<Option<String>, RuleError> {
        match self.fallback.locate(source) {
            Some(span) => Ok(Some(format!(
                "{}{}\n\n{}",
                &source[..span.start],
                NEW_GETPARAM,
                &source[span.start..]
            ))),
            None => Err(RuleError::UnresolvableAnchor {
                rule: self.id(),
                primary: self.definition.describe(),
                fallback: self.fallback.describe(),
            }),
        }
    }
}

/// Rule 3: rewrite a direct `.get("rid")` extraction to go through
/// `getParam`. Purely textual and best-effort: shapes the pattern does not
/// tolerate are left alone.
pub struct RidCallRule {
    call: regex::Regex,
}

impl RidCallRule {
    pub fn new() -> Self {
        Self {
            call: regex::Regex::new(RID_CALL).expect("rid call pattern must compile"),
        }
    }
}

impl Default for RidCallRule {
    fn default() -> Self {
        Self::new()
    }
}

impl Rule for RidCallRule {
    fn id(&self) -> &'static str {
        "rid-call-site"
    }

    fn is_applied(&self, source: &str) -> bool {
        source.contains("normalizeRid(getParam(")
    }

    fn apply(&self, source: &str) -> Option<String> {
        if !self.call.is_match(source) {
            return None;
        }
        Some(self.call.replace(source, RID_CALL_REWRITE).into_owned())
    }
}

/// The fixed rule pipeline, in application order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(DirectiveRule::new()),
        Box::new(GetParamRule::new()),
        Box::new(RidCallRule::new()),
    ]
}
