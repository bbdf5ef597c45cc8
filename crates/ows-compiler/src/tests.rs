use super::*;
use ows_core::{
    AmbiguousOperator, CommandNode, CommandSignature, CommandSyntax, Comparator, ElementKind,
    MathOperator, Operation, OwsValue, Param, ParamKind, ValueKind,
};

struct TestCatalog {
    signatures: BTreeMap<String, CommandSignature>,
}

impl CommandCatalog for TestCatalog {
    fn signature(&self, name: &str) -> Option<&CommandSignature> {
        self.signatures.get(name)
    }

    fn command_names(&self) -> Vec<&str> {
        self.signatures.keys().map(String::as_str).collect()
    }
}

fn catalog() -> TestCatalog {
    let characters = ParamKind::Collection(ElementKind::Character);
    let signatures = vec![
        CommandSignature::new("SAY", vec![ParamKind::Any]),
        CommandSignature::new("END", vec![]),
        CommandSignature::new("RETURN", vec![ParamKind::Any]),
        CommandSignature::new("GO-TO", vec![ParamKind::Label, ParamKind::Line])
            .with_syntax(CommandSyntax::GoTo),
        CommandSignature::new("DO", vec![ParamKind::Label, ParamKind::Bindings, ParamKind::Line])
            .with_syntax(CommandSyntax::Do),
        CommandSignature::new(
            "IF",
            vec![ParamKind::Boolean, ParamKind::Command, ParamKind::Command],
        )
        .with_syntax(CommandSyntax::Conditional),
        CommandSignature::new("SET", vec![ParamKind::Name, ParamKind::Any])
            .with_syntax(CommandSyntax::Set),
        CommandSignature::new("SET-FOR-WORLD", vec![ParamKind::Name, ParamKind::Any])
            .with_syntax(CommandSyntax::Set),
        CommandSignature::new("SET-FOR", vec![characters, ParamKind::Name, ParamKind::Any])
            .with_syntax(CommandSyntax::SetFor),
        CommandSignature::new("UN-SET-FOR-PROGRAM", vec![ParamKind::Name])
            .with_syntax(CommandSyntax::Unset),
        CommandSignature::new("UN-SET-FOR", vec![characters, ParamKind::Name])
            .with_syntax(CommandSyntax::UnsetFor),
        CommandSignature::new("COUNT", vec![ParamKind::Collection(ElementKind::Any)])
            .returning(ValueKind::Number),
        CommandSignature::new(
            "WHILE",
            vec![ParamKind::Boolean, ParamKind::Command],
        ),
    ];
    TestCatalog {
        signatures: signatures
            .into_iter()
            .map(|signature| (signature.name.clone(), signature))
            .collect(),
    }
}

fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect()
}

fn line(text: &str) -> Rc<CommandNode> {
    compile_line(text, &catalog())
        .expect("line should compile")
        .command
        .expect("line should hold a command")
}

fn line_error(text: &str) -> OwsError {
    compile_line(text, &catalog()).expect_err("line should fail")
}

fn operation_of(param: &Param) -> &Operation {
    match param {
        Param::Operation(operation) => operation,
        other => panic!("expected an operation, got {:?}", other),
    }
}

fn number_of(param: &Param) -> f64 {
    match param {
        Param::Value(OwsValue::Number(number)) => number.float(),
        other => panic!("expected a number, got {:?}", other),
    }
}

#[test]
fn arithmetic_folds_left_to_right_without_precedence() {
    let command = line("SAY: 2 + 3 * 4");
    let Operation::Math { op, left, right } = operation_of(&command.params[0]) else {
        panic!("expected math");
    };
    assert_eq!(*op, MathOperator::Times);
    assert_eq!(number_of(right.as_ref().expect("right operand")), 4.0);
    let Operation::Math { op, left, right } = operation_of(left) else {
        panic!("expected inner math");
    };
    assert_eq!(*op, MathOperator::Plus);
    assert_eq!(number_of(left), 2.0);
    assert_eq!(number_of(right.as_ref().expect("right operand")), 3.0);
}

#[test]
fn word_operators_and_squared_fold_as_math() {
    let command = line("SAY: 3 squared minus 1 divided-by 2");
    let Operation::Math { op, left, .. } = operation_of(&command.params[0]) else {
        panic!("expected math");
    };
    assert_eq!(*op, MathOperator::Divide);
    let Operation::Math { op, left, .. } = operation_of(left) else {
        panic!("expected minus");
    };
    assert_eq!(*op, MathOperator::Minus);
    assert!(matches!(
        operation_of(left),
        Operation::Math {
            op: MathOperator::Squared,
            right: None,
            ..
        }
    ));
}

#[test]
fn negative_literals_parse_as_numbers() {
    let command = line("SAY: -2.5");
    assert_eq!(number_of(&command.params[0]), -2.5);
}

#[test]
fn string_literals_fold_concatenation() {
    let command = line(r#"SAY: "Hello " + NAME AND "!""#);
    let Operation::Concat { left, right } = operation_of(&command.params[0]) else {
        panic!("expected concat");
    };
    assert!(matches!(right, Param::Value(OwsValue::Text(text)) if text == "!"));
    assert!(matches!(operation_of(left), Operation::Concat { .. }));
}

#[test]
fn variables_with_ambiguous_operators_produce_unknown_nodes() {
    let command = line("SAY: SCORE + BONUS - 1");
    let Operation::Unknown { operator, left, .. } = operation_of(&command.params[0]) else {
        panic!("expected unknown");
    };
    assert_eq!(*operator, AmbiguousOperator::Minus);
    assert!(matches!(
        operation_of(left),
        Operation::Unknown {
            operator: AmbiguousOperator::Plus,
            ..
        }
    ));
}

#[test]
fn command_return_hint_selects_operator_family() {
    let command = line("SAY: COUNT: [1, 2] TIMES 2");
    let Operation::Math { op, left, .. } = operation_of(&command.params[0]) else {
        panic!("expected math from number hint");
    };
    assert_eq!(*op, MathOperator::Times);
    assert!(matches!(left, Param::Command(inner) if inner.name == "COUNT"));
}

#[test]
fn conditions_bind_comparisons_then_and_then_or() {
    let command = line("IF: A = 1 | B > 2 & NOT C : END");
    let Operation::Condition {
        comparator,
        left,
        right,
    } = operation_of(&command.params[0])
    else {
        panic!("expected condition");
    };
    assert_eq!(*comparator, Comparator::Or);
    assert!(matches!(
        operation_of(left),
        Operation::Condition {
            comparator: Comparator::Equals,
            ..
        }
    ));
    let Operation::Condition {
        comparator, right, ..
    } = operation_of(right.as_ref().expect("or has a right side"))
    else {
        panic!("expected and");
    };
    assert_eq!(*comparator, Comparator::And);
    assert!(matches!(
        operation_of(right.as_ref().expect("and has a right side")),
        Operation::Condition {
            comparator: Comparator::Not,
            ..
        }
    ));
}

#[test]
fn lone_boolean_operand_becomes_identity() {
    let command = line("WHILE: READY : END");
    assert!(matches!(
        operation_of(&command.params[0]),
        Operation::Condition {
            comparator: Comparator::Identity,
            right: None,
            ..
        }
    ));
}

#[test]
fn parenthesised_groups_nest() {
    let command = line("IF: (A = 1 | B = 2) & C : END");
    let Operation::Condition {
        comparator, left, ..
    } = operation_of(&command.params[0])
    else {
        panic!("expected condition");
    };
    assert_eq!(*comparator, Comparator::And);
    assert!(matches!(
        operation_of(left),
        Operation::Condition {
            comparator: Comparator::Or,
            ..
        }
    ));

    let error = line_error("IF: (A = 1 : END");
    assert_eq!(error.code, "COMPILE_UNTERMINATED_CONDITION");
}

#[test]
fn if_keeps_else_in_its_own_slot() {
    let command = line(r#"IF: A > 1 : SAY: "big" : ELSE: SAY: "small""#);
    assert_eq!(command.params.len(), 3);
    assert!(matches!(&command.params[1], Param::Command(then) if then.name == "SAY"));
    assert!(matches!(&command.params[2], Param::Command(other) if other.name == "SAY"));

    let command = line("IF: TRUE : END");
    assert!(command.params[2].is_absent());
}

#[test]
fn collections_accept_and_separators_and_fold_set_algebra() {
    let command = line(r#"SAY: ["A", "B" AND "C"] WITHOUT ["B"]"#);
    let Operation::CollectionSet {
        additive, left, ..
    } = operation_of(&command.params[0])
    else {
        panic!("expected set operation");
    };
    assert!(!additive);
    let Param::Collection(literal) = left else {
        panic!("expected literal");
    };
    assert_eq!(literal.items.len(), 3);
    assert!(!literal.implicit);
}

#[test]
fn all_wildcard_needs_object_collections() {
    let command = line("SET-FOR: [ALL] : MOOD = 1");
    let Param::Collection(targets) = &command.params[0] else {
        panic!("expected targets");
    };
    assert!(targets.all);
    assert_eq!(targets.element, ElementKind::Character);

    let error = line_error("SAY: [*]");
    assert_eq!(error.code, "COMPILE_ALL_UNSUPPORTED");
}

#[test]
fn set_for_world_selector_switches_command() {
    let command = line("SET-FOR: WORLD : LIMIT TO 3");
    assert_eq!(command.name, "SET-FOR-WORLD");
    assert_eq!(command.params[0].literal_text(), Some("LIMIT"));

    let command = line("UN-SET-FOR: PROGRAM : LIMIT");
    assert_eq!(command.name, "UN-SET-FOR-PROGRAM");

    let command = line("SET-FOR: BOB : MOOD IS \"happy\"");
    let Param::Collection(targets) = &command.params[0] else {
        panic!("expected implicit targets");
    };
    assert!(targets.implicit);
}

#[test]
fn set_names_are_checked_at_compile_time() {
    assert_eq!(line_error("SET: WITH = 1").code, "COMPILE_RESERVED_KEYWORD");
    assert_eq!(line_error("SET: SAY = 1").code, "COMPILE_NAME_CONFLICT");
    assert_eq!(line_error("SET: A 1").code, "COMPILE_UNEXPECTED_TOKEN");
}

#[test]
fn do_parses_with_bindings() {
    let command = line("DO: GREET WITH [NAME = \"Ann\", SCORE]");
    assert_eq!(command.params[0].literal_text(), Some("GREET"));
    let Param::Bindings(bindings) = &command.params[1] else {
        panic!("expected bindings");
    };
    assert_eq!(bindings.len(), 2);
    assert_eq!(bindings[1].0, "SCORE");
    assert_eq!(bindings[1].1.variable_name(), Some("SCORE"));

    let command = line("DO: GREET");
    assert!(matches!(&command.params[1], Param::Bindings(bindings) if bindings.is_empty()));
}

#[test]
fn unknown_commands_suggest_the_closest_name() {
    let error = line_error("SAYY: 1");
    assert_eq!(error.code, "COMPILE_UNKNOWN_COMMAND");
    assert!(error.message.contains("Did you mean \"SAY\"?"));
}

#[test]
fn leftover_text_and_missing_params_fail() {
    assert_eq!(line_error("END END").code, "COMPILE_TRAILING_TEXT");
    assert_eq!(line_error("RETURN").code, "COMPILE_PARAMETER_COUNT");
    assert_eq!(line_error("SAY: [1, 2").code, "COMPILE_UNTERMINATED_COLLECTION");
}

#[test]
fn compile_line_keeps_labels() {
    let compiled = compile_line("[greet]: say: \"hi\"", &catalog()).expect("line should compile");
    assert_eq!(compiled.label.as_deref(), Some("GREET"));
    assert_eq!(
        compiled.command.expect("command").name,
        "SAY"
    );
}

#[test]
fn build_indexes_lines_and_labels() {
    let sources = map(&[(
        "main.ows",
        "SAY: 1\n\n[LOOP]: SAY: 2\nGO-TO: LOOP\nEND",
    )]);
    let program = build(&sources, &catalog()).expect("build should pass");
    assert_eq!(program.line_count, 5);
    assert_eq!(program.start_line, 0);
    assert!(program.command_at(1).is_none());
    assert_eq!(program.label_line("LOOP"), Some(2));
    assert_eq!(program.label_at(2), Some("LOOP"));
    assert_eq!(program.label_at(0), Some("START"));
    let goto = program.command_at(3).expect("goto line");
    assert_eq!(goto.params[0].literal_text(), Some("LOOP"));
    assert_eq!(number_of(&goto.params[1]), 3.0);
}

#[test]
fn build_reports_the_failing_line() {
    let sources = map(&[("main.ows", "SAY: 1\nSAY: 1.2.3\nEND")]);
    let error = build(&sources, &catalog()).expect_err("build should fail");
    assert_eq!(error.code, "COMPILE_MALFORMED_NUMBER");
    assert_eq!(error.line, Some(1));
    assert!(error.message.contains("SAY: 1.2.3"));
}
