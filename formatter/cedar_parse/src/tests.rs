use pretty_assertions::assert_eq;

use cedar_ir::{DirectiveKind, NodeKind};

use crate::parse;

fn kinds(nodes: &[cedar_ir::SyntaxNode]) -> Vec<NodeKind> {
    nodes.iter().map(|n| n.kind).collect()
}

#[test]
fn simple_declaration() {
    let parsed = parse("int x = 1;\n");
    assert_eq!(parsed.root.kind, NodeKind::TranslationUnit);
    assert_eq!(kinds(&parsed.root.children), vec![NodeKind::Declaration]);
    let decl = &parsed.root.children[0];
    assert_eq!(kinds(&decl.children), vec![NodeKind::Literal]);
    assert_eq!(decl.span.to_range(), 0..10);
}

#[test]
fn function_definition_shape() {
    let parsed = parse("int add(int a, int b) {\n    return a + b;\n}\n");
    let func = &parsed.root.children[0];
    assert_eq!(func.kind, NodeKind::FunctionDef);
    assert_eq!(
        kinds(&func.children),
        vec![NodeKind::ParamList, NodeKind::CompoundStmt]
    );
    let params = &func.children[0];
    assert_eq!(kinds(&params.children), vec![NodeKind::Param, NodeKind::Param]);
    let body = &func.children[1];
    assert_eq!(kinds(&body.children), vec![NodeKind::ReturnStmt]);
    let chain = &body.children[0].children[0];
    assert_eq!(chain.kind, NodeKind::BinaryExpr);
    assert_eq!(kinds(&chain.children), vec![NodeKind::NameRef, NodeKind::NameRef]);
}

#[test]
fn same_precedence_chains_flatten() {
    let parsed = parse("int y = a + b + c + d;\n");
    let chain = &parsed.root.children[0].children[0];
    assert_eq!(chain.kind, NodeKind::BinaryExpr);
    assert_eq!(chain.children.len(), 4);
}

#[test]
fn mixed_precedence_nests() {
    let parsed = parse("int y = a + b * c;\n");
    let chain = &parsed.root.children[0].children[0];
    assert_eq!(chain.children.len(), 2);
    assert_eq!(chain.children[0].kind, NodeKind::NameRef);
    let product = &chain.children[1];
    assert_eq!(product.kind, NodeKind::BinaryExpr);
    assert_eq!(product.children.len(), 2);
}

#[test]
fn assignment_is_a_chain_head() {
    let parsed = parse("void f() {\n    x = y = 0;\n}\n");
    let stmt = &parsed.root.children[0].children[1].children[0];
    assert_eq!(stmt.kind, NodeKind::ExprStmt);
    let chain = &stmt.children[0];
    assert_eq!(chain.kind, NodeKind::BinaryExpr);
    // Right-associative chain flattens to one frame: x, y, 0.
    assert_eq!(chain.children.len(), 3);
}

#[test]
fn condition_span_excludes_parens() {
    let source = "int f() {\n    if (x) return 1;\n    return 0;\n}\n";
    let parsed = parse(source);
    let body = &parsed.root.children[0].children[1];
    let if_stmt = &body.children[0];
    assert_eq!(if_stmt.kind, NodeKind::IfStmt);
    let cond = &if_stmt.children[0];
    assert_eq!(&source[cond.span.to_range()], "x");
}

#[test]
fn inactive_branch_tokens_stay_out_of_the_tree() {
    let source = "#if 0\nint hidden;\n#endif\nint visible;\n";
    let parsed = parse(source);
    assert_eq!(kinds(&parsed.root.children), vec![NodeKind::Declaration]);
    let decl = &parsed.root.children[0];
    assert_eq!(&source[decl.span.to_range()], "int visible;");
    assert_eq!(parsed.records.directives.len(), 2);
    assert_eq!(parsed.records.directives[0].kind, DirectiveKind::If);
    assert!(!parsed.records.directives[0].taken);
}

#[test]
fn else_branch_taken_flags() {
    let source = "#define FOO\n#ifdef FOO\nint a;\n#else\nint b;\n#endif\n";
    let parsed = parse(source);
    let [ifdef, else_, endif] = &parsed.records.directives[..] else {
        panic!("expected three directive records");
    };
    assert_eq!(ifdef.kind, DirectiveKind::Ifdef);
    assert!(ifdef.taken);
    assert_eq!(else_.kind, DirectiveKind::Else);
    assert!(!else_.taken);
    assert_eq!(endif.kind, DirectiveKind::Endif);
    let decl = &parsed.root.children[0];
    assert_eq!(&source[decl.span.to_range()], "int a;");
}

#[test]
fn nested_groups_respect_enclosure() {
    let source = "#if 0\n#if 1\nint a;\n#endif\n#endif\nint b;\n";
    let parsed = parse(source);
    assert_eq!(parsed.root.children.len(), 1);
    // The inner branch matches on its own terms but cannot be active.
    assert!(!parsed.records.directives[1].taken);
}

#[test]
fn function_macro_call_is_an_expansion_site() {
    let source = "#define SQ(x) ((x) * (x))\nint y = SQ(3);\n";
    let parsed = parse(source);
    let init = &parsed.root.children[0].children[0];
    assert_eq!(init.kind, NodeKind::CallExpr);
    assert!(init.from_expansion);
    assert_eq!(&source[init.span.to_range()], "SQ(3)");
    let [record] = &parsed.records.expansions[..] else {
        panic!("expected one expansion record");
    };
    assert_eq!(record.name, "SQ");
    assert!(record.function_style);
    assert_eq!(record.param_count, 1);
}

#[test]
fn plain_calls_are_not_expansions() {
    let parsed = parse("int y = f(3);\n");
    let init = &parsed.root.children[0].children[0];
    assert_eq!(init.kind, NodeKind::CallExpr);
    assert!(!init.from_expansion);
    assert!(parsed.records.expansions.is_empty());
}

#[test]
fn garbage_becomes_a_contained_problem() {
    let source = "int a = 1;\n@ @ @;\nint b = 2;\n";
    let parsed = parse(source);
    assert_eq!(
        kinds(&parsed.root.children),
        vec![NodeKind::Declaration, NodeKind::Problem, NodeKind::Declaration]
    );
    let problem = &parsed.root.children[1];
    assert_eq!(&source[problem.span.to_range()], "@ @ @;");
}

#[test]
fn recovery_stops_at_a_fresh_line_declaration() {
    let source = "@@@\nint b = 2;\n";
    let parsed = parse(source);
    assert_eq!(
        kinds(&parsed.root.children),
        vec![NodeKind::Problem, NodeKind::Declaration]
    );
    assert_eq!(&source[parsed.root.children[0].span.to_range()], "@@@");
}

#[test]
fn comments_are_recorded_not_parsed() {
    let source = "// leading\nint x; /* trailing */\n";
    let parsed = parse(source);
    assert_eq!(kinds(&parsed.root.children), vec![NodeKind::Declaration]);
    assert_eq!(parsed.records.comments.len(), 2);
    assert!(!parsed.records.comments[0].block);
    assert!(parsed.records.comments[1].block);
}

#[test]
fn struct_definition_body_is_a_block() {
    let source = "struct point {\n    int x;\n    int y;\n};\n";
    let parsed = parse(source);
    let decl = &parsed.root.children[0];
    assert_eq!(decl.kind, NodeKind::Declaration);
    assert_eq!(kinds(&decl.children), vec![NodeKind::CompoundStmt]);
    assert_eq!(decl.children[0].children.len(), 2);
}

#[test]
fn variadic_prototypes_parse() {
    let parsed = parse("int printf(char *fmt, ...);\n");
    let decl = &parsed.root.children[0];
    assert_eq!(decl.kind, NodeKind::Declaration);
    let params = &decl.children[0];
    assert_eq!(params.kind, NodeKind::ParamList);
    assert_eq!(params.children.len(), 1);
}

#[test]
fn empty_input_parses_to_an_empty_unit() {
    let parsed = parse("");
    assert_eq!(parsed.root.kind, NodeKind::TranslationUnit);
    assert!(parsed.root.children.is_empty());
}
