use super::*;

impl Program {
    /// Runs lines from `start` until a signal ends the frame or the program
    /// runs out of lines. `from_line` is set for frames entered by a jump and
    /// is what GO-BACK returns to.
    pub(crate) fn run_frame(
        &self,
        start: usize,
        from_line: Option<usize>,
        scope: TempScope,
        actor: &Character,
        depth: usize,
    ) -> Result<FrameExit, OwsError> {
        if depth > self.options.max_frame_depth {
            return Err(OwsError::new(
                "ENGINE_CALL_DEPTH",
                format!(
                    "More than {} nested GO-TO/DO frames.",
                    self.options.max_frame_depth
                ),
            ));
        }
        debug!(start, ?from_line, depth, "enter frame");

        let mut line = start;
        let mut last = None;
        while line < self.compiled.line_count {
            let Some(command) = self.compiled.command_at(line).cloned() else {
                line += 1;
                continue;
            };
            trace!(line, command = %command.name, "execute line");

            let context =
                ExecutionContext::new(self, Rc::clone(&command), actor, scope.clone(), depth);
            let settled = context
                .settle(&command)
                .map_err(|error| error.at_line(line))?;

            let signal = match settled {
                Settled::Value(value) => {
                    if !value.is_unit() {
                        last = Some(value);
                    }
                    line += 1;
                    continue;
                }
                Settled::Signal(signal) => signal,
            };
            let exit = match signal {
                Signal::End => FrameExit::Ended,
                Signal::Return(value) => FrameExit::Returned(value),
                Signal::ReturnAll(value) => FrameExit::ReturnedAll(value),
                Signal::GoBack if from_line.is_some() => FrameExit::WentBack,
                Signal::GoBack => {
                    return Err(OwsError::with_line(
                        "ENGINE_NO_RETURN_TARGET",
                        "GO-BACK has no GO-TO or DO to return to.",
                        line,
                    ))
                }
                Signal::Exit(exit) => exit,
            };
            debug!(line, ?exit, depth, "leave frame");
            return Ok(exit);
        }

        debug!(depth, "frame ran past the last line");
        Ok(FrameExit::Completed(last))
    }
}

#[cfg(test)]
mod frame_tests {
    use super::*;
    use crate::engine::runtime_test_support::*;

    #[test]
    fn go_back_resumes_after_goto_and_second_go_back_fails() {
        let (result, log) = run_script(
            "SAY: \"before\"\nGO-TO: AWAY\nSAY: \"after\"\nGO-BACK\n[AWAY]: SAY: \"away\"\nGO-BACK",
        );
        let error = result.expect_err("unpaired GO-BACK should fail");
        assert_eq!(error.code, "ENGINE_NO_RETURN_TARGET");
        assert_eq!(error.kind(), ows_core::ErrorKind::ControlFlowMisuse);
        assert_eq!(error.line, Some(3));
        assert_eq!(log, vec!["before", "away", "after"]);
    }

    #[test]
    fn goto_without_go_back_never_returns() {
        let (result, log) = run_script(
            "GO-TO: FINISH\nSAY: \"skipped\"\n[FINISH]: SAY: \"done\"\nRETURN: 7",
        );
        assert_eq!(result.expect("run should pass"), Some(OwsValue::number(7.0)));
        assert_eq!(log, vec!["done"]);
    }

    #[test]
    fn end_short_circuits_before_return() {
        let (result, log) = run_script("SAY: \"one\"\nEND\nRETURN: 5");
        assert_eq!(result.expect("run should pass"), None);
        assert_eq!(log, vec!["one"]);
    }

    #[test]
    fn end_inside_a_do_ends_the_whole_run() {
        let (result, log) = run_script(
            "DO: HELPER\nSAY: \"unreachable\"\nEND\n[HELPER]: SAY: \"helper\"\nEND",
        );
        assert_eq!(result.expect("run should pass"), None);
        assert_eq!(log, vec!["helper"]);
    }

    #[test]
    fn do_returns_a_value_and_continues() {
        let (result, log) = run_script(
            "SET: TOTAL = DO: DOUBLE WITH [N = 4]\nSAY: TOTAL\nEND\n[DOUBLE]: RETURN: N * 2",
        );
        assert_eq!(result.expect("run should pass"), None);
        assert_eq!(log, vec!["8"]);
    }

    #[test]
    fn end_and_return_crosses_call_levels() {
        let (result, log) = run_script(
            "DO: OUTER\nSAY: \"unreachable\"\n[OUTER]: DO: INNER\nRETURN: 1\n[INNER]: END-AND-RETURN: \"deep\"",
        );
        assert_eq!(result.expect("run should pass"), Some(OwsValue::text("deep")));
        assert!(log.is_empty());
    }

    #[test]
    fn completion_keeps_the_last_value() {
        let (program, _) = program_from_sources(map(&[
            ("_library", "[SEVEN]: RETURN: 7"),
            ("main", "DO: SEVEN\nSET: A = 1"),
        ]));
        assert_eq!(
            program.run(&actor(), None, None).expect("run should pass"),
            Some(OwsValue::number(7.0))
        );

        let (result, _) = run_script("DO: PLAIN\nEND\n[PLAIN]: SET: A = 1");
        assert_eq!(result.expect("run should pass"), None);
    }

    #[test]
    fn errors_carry_the_lines_of_enclosing_frames() {
        let (result, _) = run_script("DO: BROKEN\nEND\n[BROKEN]: SAY: MISSING");
        let error = result.expect_err("missing variable should fail");
        assert_eq!(error.code, "ENGINE_UNRESOLVED_VARIABLE");
        assert_eq!(error.line, Some(2));
        assert_eq!(error.trace, vec![0]);
    }

    #[test]
    fn frame_depth_is_limited() {
        let (registry, _) = registry_with_log();
        let program = program_with(
            map(&[("main", "[AGAIN]: DO: AGAIN")]),
            registry,
            RuntimeWorld::new(),
            EngineOptions {
                max_frame_depth: 8,
                ..EngineOptions::default()
            },
        );
        let error = program
            .run(&actor(), None, None)
            .expect_err("unbounded recursion should fail");
        assert_eq!(error.code, "ENGINE_CALL_DEPTH");
    }

    #[test]
    fn tail_calls_are_limited_per_line() {
        let (registry, _) = registry_with_log();
        let program = program_with(
            map(&[("main", "IF: TRUE : IF: TRUE : IF: TRUE : RETURN: 1")]),
            registry,
            RuntimeWorld::new(),
            EngineOptions {
                max_tail_calls: 2,
                ..EngineOptions::default()
            },
        );
        let error = program
            .run(&actor(), None, None)
            .expect_err("tail call chain should hit the limit");
        assert_eq!(error.code, "ENGINE_TAIL_CALL_LIMIT");
    }
}
