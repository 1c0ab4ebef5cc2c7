//! Property test: running the pipeline twice never reports a change on the
//! second run, for any page shape the generator can produce.

use proptest::prelude::*;
use tsx_patcher::{PatchEngine, RuleError};

fn build_page(
    n_imports: usize,
    has_directives: bool,
    has_getparam: bool,
    has_normalize: bool,
    call_site: usize,
    filler: &str,
) -> String {
    let mut s = String::new();
    for i in 0..n_imports {
        s.push_str(&format!("import m{i} from \"m{i}\";\n"));
    }
    if has_directives {
        s.push_str("export const dynamic = \"force-dynamic\";\nexport const revalidate = 0;\n\n");
    }
    if has_getparam {
        s.push_str("function getParam(sp: any) {\n  return sp?.rid;\n}\n\n");
    }
    if has_normalize {
        s.push_str("function normalizeRid(raw?: string) {\n  return (raw ?? \"\").trim();\n}\n\n");
    }
    match call_site {
        0 => s.push_str("const rid = normalizeRid(searchParams.get(\"rid\"));\n"),
        1 => s.push_str("const rid = normalizeRid(params.lookup(\"rid\"));\n"),
        _ => {}
    }
    s.push_str(&format!("const note = \"{filler}\";\n"));
    s
}

proptest! {
    #[test]
    fn second_run_never_changes_anything(
        n_imports in 0usize..4,
        has_directives in any::<bool>(),
        has_getparam in any::<bool>(),
        has_normalize in any::<bool>(),
        call_site in 0usize..3,
        filler in "[a-z]{0,12}",
    ) {
        let page = build_page(
            n_imports,
            has_directives,
            has_getparam,
            has_normalize,
            call_site,
            &filler,
        );

        let engine = PatchEngine::new();
        match engine.run(page) {
            Ok(first) => {
                let second = engine.run(first.text.clone()).unwrap();
                prop_assert!(!second.changed);
                prop_assert_eq!(second.text, first.text);
            }
            Err(RuleError::UnresolvableAnchor { .. }) => {
                // Fatal only when the page offers no insertion point at all.
                prop_assert!(!has_getparam && !has_normalize);
            }
        }
    }
}
