//! Span tracking tests for the template parser

use parser::{parse_template, ExprKind, Node, ParseOptions};

#[test]
fn test_program_span_covers_input() {
    let input = "match $x isa person;\nget;";
    let result = parse_template(input, &ParseOptions::default());

    assert!(!result.has_errors());
    assert_eq!(result.program.span.start, 0);
    assert_eq!(result.program.span.end, input.len());
}

#[test]
fn test_macro_call_span() {
    let input = "name == @upper($user.name);";
    let result = parse_template(input, &ParseOptions::default());
    assert!(!result.has_errors());

    let call = result
        .program
        .nodes
        .iter()
        .find(|n| matches!(n, Node::Expr(e) if matches!(e.kind, ExprKind::Call(_))))
        .expect("macro call node");

    let span = call.span();
    assert_eq!(&input[span.start..span.end], "@upper($user.name)");
}

#[test]
fn test_block_spans_include_end() {
    let input = r#"start
#for (x in $xs)
  $x
#end
done"#;
    let result = parse_template(input, &ParseOptions::default());
    assert!(!result.has_errors(), "{}", result.format_diagnostics(false));

    let block = result
        .program
        .nodes
        .iter()
        .find(|n| matches!(n, Node::For { .. }))
        .expect("for node");
    let text = &input[block.span().start..block.span().end];
    assert!(text.starts_with("#for"));
    assert!(text.ends_with("#end"));
}

#[test]
fn test_let_span() {
    let input = "#let (who = @lower($name))rest";
    let result = parse_template(input, &ParseOptions::default());
    assert!(!result.has_errors());

    let Node::Let { name, span, .. } = &result.program.nodes[0] else {
        panic!("expected let");
    };
    assert_eq!(name, "who");
    assert_eq!(&input[span.start..span.end], "#let (who = @lower($name))");
}

#[test]
fn test_path_segments() {
    let input = "$rows[1].cells[0].value";
    let result = parse_template(input, &ParseOptions::default());
    assert!(!result.has_errors());
    assert_eq!(result.program.nodes.len(), 1);

    let Node::Expr(expr) = &result.program.nodes[0] else {
        panic!("expected expression");
    };
    let ExprKind::Path(path) = &expr.kind else {
        panic!("expected path");
    };
    assert_eq!(path.to_string(), input);
    assert_eq!(path.segments.len(), 4);
    assert_eq!(expr.span.end, input.len());
}
