//! End-to-end tests through the real front end.

use pretty_assertions::assert_eq;
use proptest::prelude::*;

use cedar_diagnostic::DiagCode;
use cedar_ir::Span;
use cedar_parse::parse;

use crate::{
    apply_edits, format_regions, format_unit, AlignFlags, FormatConfig, FormatOutcome, WrapMode,
};

fn format_with(source: &str, config: &FormatConfig) -> FormatOutcome {
    let parsed = parse(source);
    match format_unit(source, &parsed.root, &parsed.records, config) {
        Ok(outcome) => outcome,
        Err(err) => panic!("formatting failed: {err}"),
    }
}

fn reformat_with(source: &str, config: &FormatConfig) -> String {
    apply_edits(source, &format_with(source, config).edits)
}

fn reformat(source: &str) -> String {
    reformat_with(source, &FormatConfig::default())
}

#[test]
fn spacing_normalizes() {
    assert_eq!(
        reformat("int f(int a,int b){return a+b;}\n"),
        "int f(int a, int b) {\n    return a + b;\n}\n"
    );
}

#[test]
fn formatted_source_yields_no_edits() {
    let source = "\
int add(int a, int b) {
    if (a > b) {
        return a + b;
    } else {
        return b;
    }
}

int count(int n) {
    while (n > 0) {
        n = n - 1;
    }
    return n;
}
";
    let outcome = format_with(source, &FormatConfig::default());
    assert_eq!(outcome.edits, vec![]);
}

#[test]
fn one_pass_settles() {
    let messy = "int  f( int a,int b ){if(a>b){return a;}return b;}\n";
    let once = reformat(messy);
    assert_eq!(reformat(&once), once);
}

#[test]
fn operator_chain_wraps_before_operators() {
    let config = FormatConfig {
        page_width: 20,
        ..FormatConfig::default()
    };
    let source =
        "int x = 1 + 2 + 3 + 4 + 5 + 6 + 7 + 8 + 9 + 10 + 11 + 12 + 13 + 14 + 15;\n";
    let expected = "\
int x = 1 + 2 + 3
        + 4 + 5 + 6
        + 7 + 8 + 9
        + 10 + 11
        + 12 + 13
        + 14 + 15;
";
    assert_eq!(reformat_with(source, &config), expected);
    // The wrapped form is a fixed point.
    assert_eq!(reformat_with(expected, &config), expected);
}

#[test]
fn parameter_list_wraps_with_the_closing_paren_counted() {
    let config = FormatConfig {
        page_width: 20,
        ..FormatConfig::default()
    };
    // At the top level this is a prototype, so the parameter list wraps.
    let source = "f(alpha, beta, gamma);\n";
    assert_eq!(
        reformat_with(source, &config),
        "f(alpha, beta,\n        gamma);\n"
    );
}

#[test]
fn argument_list_wraps_inside_a_body() {
    let config = FormatConfig {
        page_width: 20,
        ..FormatConfig::default()
    };
    let source = "void g() {\n    f(alpha, beta, gamma);\n}\n";
    let expected = "\
void g() {
    f(alpha, beta,
            gamma);
}
";
    assert_eq!(reformat_with(source, &config), expected);
}

#[test]
fn one_per_line_arguments_commit_after_the_first_break() {
    let config = FormatConfig {
        page_width: 20,
        wrap_arguments: WrapMode::OnePerLine,
        ..FormatConfig::default()
    };
    let source = "void g() {\n    f(alpha, beta, gamma);\n}\n";
    let expected = "\
void g() {
    f(alpha,
            beta,
            gamma);
}
";
    assert_eq!(reformat_with(source, &config), expected);
}

#[test]
fn next_line_shifted_arguments_take_an_extra_indent_unit() {
    let config = FormatConfig {
        page_width: 20,
        wrap_arguments: WrapMode::NextLineShifted,
        ..FormatConfig::default()
    };
    let source = "void g() {\n    f(alpha, beta, gamma);\n}\n";
    let expected = "\
void g() {
    f(alpha, beta,
                gamma);
}
";
    assert_eq!(reformat_with(source, &config), expected);
}

#[test]
fn multi_column_arguments_anchor_under_the_first_argument() {
    let config = FormatConfig {
        page_width: 20,
        wrap_arguments: WrapMode::MultiColumn,
        ..FormatConfig::default()
    };
    let source = "void g() {\n    f(alpha, beta, gamma);\n}\n";
    let expected = "\
void g() {
    f(alpha, beta,
      gamma);
}
";
    assert_eq!(reformat_with(source, &config), expected);
    // The anchored form is a fixed point.
    assert_eq!(reformat_with(expected, &config), expected);
}

#[test]
fn indent_by_one_wraps_a_single_unit_past_the_statement() {
    let config = FormatConfig {
        page_width: 20,
        wrap_indent_arguments: AlignFlags::INDENT_BY_ONE,
        ..FormatConfig::default()
    };
    let source = "void g() {\n    f(alpha, beta, gamma);\n}\n";
    let expected = "\
void g() {
    f(alpha, beta,
        gamma);
}
";
    assert_eq!(reformat_with(source, &config), expected);
}

#[test]
fn empty_parens_space_is_exactly_one_insert() {
    let config = FormatConfig {
        space_between_empty_parens: true,
        ..FormatConfig::default()
    };
    let source = "int f();\n";
    let outcome = format_with(source, &config);
    assert_eq!(outcome.edits.len(), 1);
    assert_eq!(apply_edits(source, &outcome.edits), "int f( );\n");
}

#[test]
fn blank_lines_collapse_to_the_cap() {
    assert_eq!(reformat("int a;\n\n\n\nint b;\n"), "int a;\n\nint b;\n");
}

#[test]
fn trailing_comment_stays_attached() {
    let source = "int x = 1; // note\n";
    let outcome = format_with(source, &FormatConfig::default());
    assert_eq!(outcome.edits, vec![]);
}

#[test]
fn comment_in_a_block_is_indented() {
    assert_eq!(
        reformat("int f() {\n// local\nreturn 0;\n}\n"),
        "int f() {\n    // local\n    return 0;\n}\n"
    );
}

#[test]
fn inactive_branch_bytes_are_untouched() {
    let source = "#if 0\nint   weird = 1 ;\n#endif\nint y = 2;\n";
    let outcome = format_with(source, &FormatConfig::default());
    assert_eq!(outcome.edits, vec![]);
}

#[test]
fn format_off_markers_protect_a_region() {
    let source = "\
int a=1;
// cedar-format: off
int    b=2;
// cedar-format: on
int c=3;
";
    let expected = "\
int a = 1;
// cedar-format: off
int    b=2;
// cedar-format: on
int c = 3;
";
    assert_eq!(reformat(source), expected);
}

#[test]
fn macro_call_site_is_copied_verbatim() {
    let source = "#define SQ(x) ((x) * (x))\nint y=SQ( 3 );\n";
    assert_eq!(
        reformat(source),
        "#define SQ(x) ((x) * (x))\nint y = SQ( 3 );\n"
    );
}

#[test]
fn malformed_construct_is_contained() {
    let source = "int a=1;\nint x = (1;\nint b=2;\n";
    let outcome = format_with(source, &FormatConfig::default());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagCode::MalformedConstruct);
    assert_eq!(
        apply_edits(source, &outcome.edits),
        "int a = 1;\nint x = (1;\nint b = 2;\n"
    );
}

#[test]
fn bad_tokens_get_their_own_diagnostic_code() {
    let source = "int a=1;\n@ @ @;\nint b=2;\n";
    let outcome = format_with(source, &FormatConfig::default());
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(outcome.diagnostics[0].code, DiagCode::BadToken);
    assert_eq!(
        apply_edits(source, &outcome.edits),
        "int a = 1;\n@ @ @;\nint b = 2;\n"
    );
}

#[test]
fn edit_lists_are_deterministic() {
    let source = "int  f( int a,int b ){return a+b;}\nint   g=1;\n";
    let first = format_with(source, &FormatConfig::default());
    let second = format_with(source, &FormatConfig::default());
    assert_eq!(first.edits, second.edits);
}

#[test]
fn region_lists_scope_the_shared_pass() {
    let source = "int  a=1;\nint  b=2;\n";
    let parsed = parse(source);
    let config = FormatConfig::default();
    let lists = match format_regions(
        source,
        &parsed.root,
        &parsed.records,
        &config,
        &[Span::new(0, 10), Span::new(10, 20)],
    ) {
        Ok(lists) => lists,
        Err(err) => panic!("formatting failed: {err}"),
    };
    assert_eq!(lists.len(), 2);
    assert_eq!(apply_edits(source, &lists[0]), "int a = 1;\nint  b=2;\n");
    assert_eq!(apply_edits(source, &lists[1]), "int  a=1;\nint b = 2;\n");
}

#[test]
fn edits_never_touch_token_bytes() {
    let source = "int  value = compute( first,second );\n";
    let outcome = format_with(source, &FormatConfig::default());
    for edit in &outcome.edits {
        let replaced = &source[edit.offset as usize..(edit.offset + edit.length) as usize];
        assert!(
            replaced.chars().all(char::is_whitespace),
            "edit at {} replaces token bytes: {replaced:?}",
            edit.offset
        );
        assert!(edit.replacement.chars().all(char::is_whitespace));
    }
}

proptest! {
    #[test]
    fn one_pass_settles_on_generated_declarations(
        decls in proptest::collection::vec(("[a-z]{1,6}", 0u32..100, 0u32..100), 1..8)
    ) {
        let mut source = String::new();
        for (name, a, b) in &decls {
            source.push_str(&format!("int {name}={a}+  {b};\n"));
        }
        let once = reformat(&source);
        let twice = reformat(&once);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn applying_edits_preserves_token_text(value in 0u32..1000, pad in 1usize..6) {
        let source = format!("int x{}={value};\n", " ".repeat(pad));
        let formatted = reformat(&source);
        prop_assert!(formatted.contains(&value.to_string()));
        prop_assert_eq!(formatted.matches("int").count(), 1);
    }
}
