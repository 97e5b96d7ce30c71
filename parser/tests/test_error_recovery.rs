//! Error collection and recovery tests for the template parser

use parser::{parse_template, Node, ParseOptions};

fn error_codes(input: &str) -> Vec<String> {
    let result = parse_template(input, &ParseOptions::default());
    result
        .errors
        .diagnostics()
        .iter()
        .filter_map(|d| d.code.clone())
        .collect()
}

#[test]
fn test_invalid_inputs_are_reported() {
    let invalid_inputs = vec![
        "#if ($x) never closed",     // Unclosed block
        "#for (x in $xs) body",      // Unclosed loop
        "#end",                      // Orphan end
        "#else",                     // Orphan else
        "@int",                      // Macro without arguments
        "@int(\"42)",                // Unterminated string
        "@concat($a, $b",            // Unclosed argument list
        "@concat($a $b)",            // Missing comma
        "#for (x $xs) #end",         // Missing 'in'
        "#let (x $y)",               // Missing '='
        "#if #end",                  // Missing header
        "#unknown",                  // Unknown directive
        "@f(%)",                     // Invalid character
    ];

    for input in invalid_inputs {
        let result = parse_template(input, &ParseOptions::default());
        assert!(
            result.has_errors(),
            "should fail to parse invalid input: '{}'",
            input
        );
    }
}

#[test]
fn test_valid_inputs_parse_cleanly() {
    let valid_inputs = vec![
        "",
        "plain text without directives",
        "escaped $$x and @@y and ##z",
        "price: 5$ and # comment and user@@example.com",
        "$a.b[0]",
        "@concat()",
        "#if (@equals($a, 'x'))yes#elif (true)maybe#else no#end",
        "#for (k, v in $map)$k=$v;#end",
        "#let (x = -1.5)$x",
        "@f(@g(@h(1, \"two\", null)))",
    ];

    for input in valid_inputs {
        let result = parse_template(input, &ParseOptions::default());
        assert!(
            !result.has_errors(),
            "'{}' should parse, got:\n{}",
            input,
            result.format_diagnostics(false)
        );
    }
}

#[test]
fn test_every_error_is_collected() {
    let input = "#bogus one\n@int two\n#end three\n@f(\"unterminated";
    assert_eq!(error_codes(input), vec!["E0010", "E0013", "E0015", "E0011"]);
}

#[test]
fn test_unclosed_if_points_at_opener() {
    let input = "line one\n  #if ($flag)\nbody";
    let result = parse_template(input, &ParseOptions::default());
    let diagnostics: Vec<_> = result.errors.diagnostics().iter().collect();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code.as_deref(), Some("E0003"));
    assert_eq!(diagnostics[0].span.start.line, 2);
    assert_eq!(diagnostics[0].span.start.column, 3);

    let rendered = result.format_diagnostics(false);
    assert!(rendered.contains("unclosed '#if' block"));
    assert!(rendered.contains("--> <template>:2:3"));
}

#[test]
fn test_parsing_continues_after_bad_header() {
    let input = "#if ($a $b)x#end after";
    let result = parse_template(input, &ParseOptions::default());

    assert_eq!(result.errors.error_count(), 1);
    // the broken block is dropped, the rest survives
    assert!(matches!(
        result.program.nodes.last(),
        Some(Node::Text { text, .. }) if text == " after"
    ));
}

#[test]
fn test_unterminated_string_reported_once() {
    // the header and the block are both cut short by the string
    assert_eq!(error_codes("#if (@equals($a, \"x)) yes #end"), vec!["E0011"]);
}

#[test]
fn test_deep_nesting_is_rejected() {
    let depth = 300;
    let input = "@f(".repeat(depth) + &")".repeat(depth);
    let codes = error_codes(&input);
    assert_eq!(codes, vec!["E0014"]);

    let options = ParseOptions {
        max_depth: 400,
        ..ParseOptions::default()
    };
    assert!(!parse_template(&input, &options).has_errors());
}
