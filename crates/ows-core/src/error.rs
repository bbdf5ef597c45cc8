use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{code}: {message}")]
pub struct OwsError {
    pub code: String,
    pub message: String,
    /// Innermost source line the failure was raised on.
    pub line: Option<usize>,
    /// Lines of the enclosing frames, innermost first.
    pub trace: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Compile,
    UnresolvedVariable,
    InvalidComparison,
    UnsupportedOperator,
    Type,
    ControlFlowMisuse,
    NotImplemented,
    Limit,
    Host,
}

impl OwsError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: None,
            trace: Vec::new(),
        }
    }

    pub fn with_line(code: impl Into<String>, message: impl Into<String>, line: usize) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            line: Some(line),
            trace: Vec::new(),
        }
    }

    /// Attaches line context while unwinding. The first call records the
    /// failing line, later calls record the frames it passed through.
    pub fn at_line(mut self, line: usize) -> Self {
        match self.line {
            None => self.line = Some(line),
            Some(current) if current == line && self.trace.is_empty() => {}
            Some(_) => self.trace.push(line),
        }
        self
    }

    pub fn kind(&self) -> ErrorKind {
        let code = self.code.as_str();
        if code.starts_with("COMPILE_") {
            return ErrorKind::Compile;
        }
        match code {
            "ENGINE_UNRESOLVED_VARIABLE" | "ENGINE_LOOP_INDEX_UNBOUND" => {
                ErrorKind::UnresolvedVariable
            }
            "ENGINE_INVALID_COMPARISON" => ErrorKind::InvalidComparison,
            "ENGINE_UNSUPPORTED_OPERATOR" => ErrorKind::UnsupportedOperator,
            "ENGINE_TYPE_MISMATCH" | "ENGINE_COLLECTION_TYPE" => ErrorKind::Type,
            "ENGINE_NO_RETURN_TARGET"
            | "ENGINE_ELSE_WITHOUT_IF"
            | "ENGINE_LABEL_NOT_FOUND"
            | "ENGINE_CONTROL_FLOW_IN_VALUE" => ErrorKind::ControlFlowMisuse,
            "ENGINE_NOT_IMPLEMENTED" => ErrorKind::NotImplemented,
            "ENGINE_TAIL_CALL_LIMIT" | "ENGINE_CALL_DEPTH" => ErrorKind::Limit,
            _ => ErrorKind::Host,
        }
    }

    /// Message with the line context appended, for reporting to script authors.
    pub fn describe(&self) -> String {
        let mut out = self.message.clone();
        if let Some(line) = self.line {
            out.push_str(&format!(" (line {})", line));
        }
        for line in &self.trace {
            out.push_str(&format!(" <- line {}", line));
        }
        out
    }
}

#[cfg(test)]
mod error_tests {
    use super::*;

    #[test]
    fn at_line_keeps_innermost_cause_and_records_frames() {
        let error = OwsError::new("ENGINE_UNRESOLVED_VARIABLE", "X is not set.")
            .at_line(7)
            .at_line(7)
            .at_line(2)
            .at_line(0);
        assert_eq!(error.code, "ENGINE_UNRESOLVED_VARIABLE");
        assert_eq!(error.line, Some(7));
        assert_eq!(error.trace, vec![2, 0]);
        assert_eq!(error.describe(), "X is not set. (line 7) <- line 2 <- line 0");
        assert_eq!(error.to_string(), "ENGINE_UNRESOLVED_VARIABLE: X is not set.");
    }

    #[test]
    fn kind_groups_codes() {
        assert_eq!(
            OwsError::new("COMPILE_UNKNOWN_COMMAND", "x").kind(),
            ErrorKind::Compile
        );
        assert_eq!(
            OwsError::new("ENGINE_NO_RETURN_TARGET", "x").kind(),
            ErrorKind::ControlFlowMisuse
        );
        assert_eq!(
            OwsError::new("ENGINE_ELSE_WITHOUT_IF", "x").kind(),
            ErrorKind::ControlFlowMisuse
        );
        assert_eq!(
            OwsError::new("ENGINE_INVALID_COMPARISON", "x").kind(),
            ErrorKind::InvalidComparison
        );
        assert_eq!(OwsError::new("CLI_SOURCE_READ", "x").kind(), ErrorKind::Host);
    }
}
