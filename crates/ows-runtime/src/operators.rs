use std::rc::Rc;

use ows_core::{
    AmbiguousOperator, Comparator, MathOperator, Operation, OwsError, OwsValue, Param,
    SpecializedOperator,
};

use crate::context::ExecutionContext;

pub(crate) fn evaluate_operation(
    context: &ExecutionContext<'_>,
    operation: &Operation,
) -> Result<OwsValue, OwsError> {
    match operation {
        Operation::Math { op, left, right } => {
            let left = context.evaluate(left)?;
            let right = match right {
                Some(right) => context.evaluate(right)?,
                None => OwsValue::Unit,
            };
            math(context, *op, &left, &right)
        }
        Operation::Concat { left, right } => {
            let left = context.evaluate(left)?;
            let right = context.evaluate(right)?;
            concat(context, &left, &right)
        }
        Operation::CollectionSet {
            additive,
            left,
            right,
        } => {
            let left = context.evaluate(left)?;
            let right = context.evaluate(right)?;
            let operator = if *additive {
                SpecializedOperator::Union
            } else {
                SpecializedOperator::Difference
            };
            collection_set(context, operator, &left, &right)
        }
        Operation::Condition {
            comparator,
            left,
            right,
        } => condition(context, *comparator, left, right.as_ref()).map(OwsValue::Boolean),
        Operation::Unknown {
            operator,
            left,
            right,
            specialized,
        } => {
            let left = context.evaluate(left)?;
            let chosen = match specialized.get() {
                Some(chosen) => *chosen,
                None => {
                    let chosen = specialize(context, *operator, &left)?;
                    let _ = specialized.set(chosen);
                    chosen
                }
            };
            let right = context.evaluate(right)?;
            apply(context, chosen, &left, &right)
        }
    }
}

/// Picks the concrete operator for `+`/`-` from the left operand's kind. The
/// choice is cached on the node, so later runs skip this step.
fn specialize(
    context: &ExecutionContext<'_>,
    operator: AmbiguousOperator,
    left: &OwsValue,
) -> Result<SpecializedOperator, OwsError> {
    let chosen = match (left, operator) {
        (OwsValue::Number(_), AmbiguousOperator::Plus) => {
            SpecializedOperator::Math(MathOperator::Plus)
        }
        (OwsValue::Number(_), AmbiguousOperator::Minus) => {
            SpecializedOperator::Math(MathOperator::Minus)
        }
        (OwsValue::Text(_), AmbiguousOperator::Plus) => SpecializedOperator::Concat,
        (OwsValue::Collection(_), AmbiguousOperator::Plus) => SpecializedOperator::Union,
        (OwsValue::Collection(_), AmbiguousOperator::Minus) => SpecializedOperator::Difference,
        (OwsValue::Boolean(_), AmbiguousOperator::Plus) => SpecializedOperator::And,
        (value, operator) => {
            return Err(unsupported(
                context,
                match operator {
                    AmbiguousOperator::Plus => "+",
                    AmbiguousOperator::Minus => "-",
                },
                value,
            ))
        }
    };
    Ok(chosen)
}

fn apply(
    context: &ExecutionContext<'_>,
    operator: SpecializedOperator,
    left: &OwsValue,
    right: &OwsValue,
) -> Result<OwsValue, OwsError> {
    match operator {
        SpecializedOperator::Math(op) => math(context, op, left, right),
        SpecializedOperator::Concat => concat(context, left, right),
        SpecializedOperator::Union | SpecializedOperator::Difference => {
            collection_set(context, operator, left, right)
        }
        SpecializedOperator::And => match (left, right) {
            (OwsValue::Boolean(left), OwsValue::Boolean(right)) => {
                Ok(OwsValue::Boolean(*left && *right))
            }
            _ => Err(unsupported(context, "AND", right)),
        },
    }
}

fn unsupported(context: &ExecutionContext<'_>, symbol: &str, value: &OwsValue) -> OwsError {
    context.error(
        "ENGINE_UNSUPPORTED_OPERATOR",
        format!("Operator {} cannot be applied to a {}.", symbol, value.type_name()),
    )
}

fn math(
    context: &ExecutionContext<'_>,
    op: MathOperator,
    left: &OwsValue,
    right: &OwsValue,
) -> Result<OwsValue, OwsError> {
    let Some(left) = left.as_number() else {
        return Err(unsupported(context, op.symbol(), left));
    };
    if op.is_unary() {
        return Ok(OwsValue::number(op.apply(left.float(), 0.0)));
    }
    let Some(right) = right.as_number() else {
        return Err(unsupported(context, op.symbol(), right));
    };
    Ok(OwsValue::number(op.apply(left.float(), right.float())))
}

fn concat(
    context: &ExecutionContext<'_>,
    left: &OwsValue,
    right: &OwsValue,
) -> Result<OwsValue, OwsError> {
    match left {
        OwsValue::Text(text) => Ok(OwsValue::Text(format!("{}{}", text, right))),
        other => Err(unsupported(context, "+", other)),
    }
}

fn collection_set(
    context: &ExecutionContext<'_>,
    operator: SpecializedOperator,
    left: &OwsValue,
    right: &OwsValue,
) -> Result<OwsValue, OwsError> {
    let symbol = if operator == SpecializedOperator::Union {
        "WITH"
    } else {
        "WITHOUT"
    };
    let (Some(left), Some(right)) = (left.as_collection(), right.as_collection()) else {
        let offending = if left.as_collection().is_none() {
            left
        } else {
            right
        };
        return Err(unsupported(context, symbol, offending));
    };
    let result = if operator == SpecializedOperator::Union {
        left.union(right)
            .map_err(|error| error.at_line(context.line()))?
    } else {
        left.difference(right)
    };
    Ok(OwsValue::Collection(result))
}

fn boolean_operand(
    context: &ExecutionContext<'_>,
    comparator: Comparator,
    param: &Param,
) -> Result<bool, OwsError> {
    let value = context.evaluate(param)?;
    if let Some(value) = value.as_bool() {
        return Ok(value);
    }
    let (code, expected) = match comparator {
        Comparator::Identity | Comparator::Not => ("ENGINE_TYPE_MISMATCH", "a condition"),
        _ => ("ENGINE_INVALID_COMPARISON", "AND/OR"),
    };
    Err(context.error(
        code,
        format!("Expected a boolean for {}, found {}.", expected, value.type_name()),
    ))
}

fn same_cell(context: &ExecutionContext<'_>, left: &Param, right: &Param) -> bool {
    let (Some(left), Some(right)) = (left.variable_name(), right.variable_name()) else {
        return false;
    };
    match (context.lookup(left), context.lookup(right)) {
        (Some(left), Some(right)) => Rc::ptr_eq(&left, &right),
        _ => false,
    }
}

fn condition(
    context: &ExecutionContext<'_>,
    comparator: Comparator,
    left: &Param,
    right: Option<&Param>,
) -> Result<bool, OwsError> {
    let right = right.unwrap_or(&Param::Absent);
    match comparator {
        Comparator::Identity => boolean_operand(context, comparator, left),
        Comparator::Not => Ok(!boolean_operand(context, comparator, left)?),
        Comparator::And => {
            Ok(boolean_operand(context, comparator, left)?
                && boolean_operand(context, comparator, right)?)
        }
        Comparator::Or => {
            Ok(boolean_operand(context, comparator, left)?
                || boolean_operand(context, comparator, right)?)
        }
        Comparator::Equals => {
            if same_cell(context, left, right) {
                return Ok(true);
            }
            Ok(context.evaluate(left)? == context.evaluate(right)?)
        }
        Comparator::GreaterThan | Comparator::LessThan => {
            let left = context.evaluate(left)?;
            let right = context.evaluate(right)?;
            let (Some(left), Some(right)) = (left.as_number(), right.as_number()) else {
                return Err(context.error(
                    "ENGINE_INVALID_COMPARISON",
                    format!(
                        "Cannot order a {} against a {}.",
                        left.type_name(),
                        right.type_name()
                    ),
                ));
            };
            Ok(if comparator == Comparator::GreaterThan {
                left.float() > right.float()
            } else {
                left.float() < right.float()
            })
        }
    }
}

#[cfg(test)]
mod operators_tests {
    use crate::engine::runtime_test_support::*;
    use ows_core::{Collection, ElementKind, OwsValue};

    fn value_of(script: &str) -> OwsValue {
        let (result, _) = run_script(script);
        result
            .expect("run should pass")
            .expect("script should return a value")
    }

    fn error_code(script: &str) -> String {
        let (result, _) = run_script(script);
        result.expect_err("script should fail").code
    }

    #[test]
    fn arithmetic_folds_left_to_right() {
        assert_eq!(value_of("RETURN: 2 + 3 * 4"), OwsValue::number(20.0));
        assert_eq!(value_of("RETURN: 3 SQUARED"), OwsValue::number(9.0));
        assert_eq!(value_of("RETURN: 7 MODULO 4"), OwsValue::number(3.0));
        assert_eq!(value_of("RETURN: 2 TO-THE-POWER-OF 3"), OwsValue::number(8.0));
        assert_eq!(value_of("RETURN: -2 TIMES 3"), OwsValue::number(-6.0));
    }

    #[test]
    fn plus_specializes_on_the_left_operand() {
        assert_eq!(
            value_of("SET: NAME = \"Bob\"\nRETURN: NAME + \" has \" + 3"),
            OwsValue::text("Bob has 3")
        );
        assert_eq!(value_of("SET: N = 4\nRETURN: N - 1"), OwsValue::number(3.0));
        assert_eq!(
            value_of("SET: ITEMS = [1, 2, 3]\nRETURN: ITEMS - [2]"),
            OwsValue::Collection(Collection::from(vec![
                OwsValue::number(1.0),
                OwsValue::number(3.0)
            ]))
        );
        assert_eq!(error_code("SET: NAME = \"A\"\nRETURN: NAME - 1"), "ENGINE_UNSUPPORTED_OPERATOR");
    }

    #[test]
    fn collection_algebra() {
        assert_eq!(
            value_of("RETURN: [\"A\", \"B\", \"C\"] WITHOUT [\"B\"]"),
            OwsValue::Collection(Collection::from(vec![OwsValue::text("A"), OwsValue::text("C")]))
        );
        assert_eq!(
            value_of("RETURN: [\"A\"] WITH [\"B\"]"),
            OwsValue::Collection(Collection::from(vec![OwsValue::text("A"), OwsValue::text("B")]))
        );
    }

    #[test]
    fn typed_collections_reject_other_kinds() {
        let (program, _) = program_from_sources(map(&[("main", "RETURN: ITEMS WITH [\"B\"]")]));
        let mut bindings = std::collections::BTreeMap::new();
        bindings.insert(
            "ITEMS".to_string(),
            OwsValue::Collection(
                Collection::typed(ElementKind::Number, vec![OwsValue::number(1.0)])
                    .expect("numbers fit"),
            ),
        );
        let error = program
            .run(&actor(), None, Some(bindings))
            .expect_err("text into a number collection should fail");
        assert_eq!(error.code, "ENGINE_COLLECTION_TYPE");
    }

    #[test]
    fn conditions_compare_and_short_circuit() {
        assert_eq!(value_of("RETURN: 1 < 2 AND 3 > 2"), OwsValue::Boolean(true));
        assert_eq!(value_of("RETURN: NOT (1 = 2) AND \"A\" = \"A\""), OwsValue::Boolean(true));
        assert_eq!(value_of("RETURN: FALSE AND MISSING"), OwsValue::Boolean(false));
        assert_eq!(value_of("RETURN: TRUE OR MISSING"), OwsValue::Boolean(true));
        assert_eq!(error_code("RETURN: 1 < 2 AND 5"), "ENGINE_INVALID_COMPARISON");
        assert_eq!(error_code("RETURN: [1] > 0"), "ENGINE_INVALID_COMPARISON");
    }

    #[test]
    fn all_lists_directory_objects() {
        let (program, _) = program_from_sources(map(&[(
            "main",
            "SET-FOR: [ALL] : TAG = 1\nRETURN: TAG",
        )]));
        let alice = ows_core::Character::new("c2", "ALICE");
        assert_eq!(
            program.run(&alice, None, None).expect("run should pass"),
            Some(OwsValue::number(1.0))
        );
    }
}
