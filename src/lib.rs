//! tsx-patcher: targeted patcher for the contract page's searchParams handling.
//!
//! Applies a fixed, ordered set of textual transformations to one source file
//! (by default `src/app/contract/page.tsx`): insert the dynamic-rendering
//! directives, replace the `getParam` helper, and rewrite the `rid` call site
//! to go through it. A timestamped backup of the pre-patch content is written
//! before anything else happens.
//!
//! # Architecture
//!
//! The engine is purely textual: it consumes file content as a `String` and
//! returns the (possibly modified) text plus a changed verdict. Intelligence
//! lives in anchor location ([`Anchor`]), not in rule orchestration
//! ([`PatchEngine`]); file reads, backups, and atomic writes are the
//! [`TargetFile`] collaborator's job.
//!
//! # Safety
//!
//! - Every rule checks its own marker before applying (idempotent runs)
//! - Atomic file writes (tempfile + fsync + rename)
//! - A rule with no valid insertion point aborts the run instead of guessing
//!
//! # Example
//!
//! ```
//! use tsx_patcher::PatchEngine;
//!
//! let source = "function normalizeRid(raw?: string) {\n  return raw ?? \"\";\n}\n";
//! let outcome = PatchEngine::new().run(source.to_string()).unwrap();
//! assert!(outcome.changed);
//! ```

pub mod anchor;
pub mod engine;
pub mod rules;
pub mod target;

// Re-exports
pub use anchor::{Anchor, Span};
pub use engine::{PatchEngine, PatchOutcome, RuleOutcome, RuleReport};
pub use rules::{default_rules, Rule, RuleError};
pub use target::{BackupStamp, SystemClock, TargetError, TargetFile};
