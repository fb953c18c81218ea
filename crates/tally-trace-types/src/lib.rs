use facet::Facet;
use std::error::Error;
use std::fmt;
use std::panic::Location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantError {
    EmptyField(&'static str),
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyField(field) => write!(f, "{field} must be non-empty"),
        }
    }
}

impl Error for InvariantError {}

/// Placeholder used when the unwinder produced a frame with no file information.
pub const UNKNOWN_FILE: &str = "<unknown>";

/// One frame of a captured call stack.
///
/// A frame renders as `function(file:line)` when the function path is known,
/// and as `file:line:column` when it only comes from a [`Location`].
#[derive(Facet, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Frame {
    function: Option<String>,
    file: String,
    line: u32,
    column: Option<u32>,
}

impl Frame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Result<Self, InvariantError> {
        let function = function.into();
        if function.is_empty() {
            return Err(InvariantError::EmptyField("function"));
        }
        Self::build(Some(function), file.into(), line, None)
    }

    pub fn from_parts(
        function: Option<String>,
        file: Option<String>,
        line: Option<u32>,
    ) -> Result<Self, InvariantError> {
        let function = function.filter(|name| !name.is_empty());
        let file = file.unwrap_or_else(|| UNKNOWN_FILE.to_owned());
        Self::build(function, file, line.unwrap_or(0), None)
    }

    fn build(function: Option<String>, file: String, line: u32, column: Option<u32>) -> Result<Self, InvariantError> {
        if file.is_empty() {
            return Err(InvariantError::EmptyField("file"));
        }
        Ok(Self {
            function,
            file,
            line,
            column,
        })
    }

    pub fn from_location(location: &Location<'_>) -> Self {
        Self {
            function: None,
            file: location.file().to_owned(),
            line: location.line(),
            column: Some(location.column()),
        }
    }

    #[track_caller]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> Option<u32> {
        self.column
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.function, self.column) {
            (Some(function), _) => write!(f, "{function}({}:{})", self.file, self.line),
            (None, Some(column)) => write!(f, "{}:{}:{column}", self.file, self.line),
            (None, None) => write!(f, "{}:{}", self.file, self.line),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_with_function_renders_like_a_stack_line() {
        let frame = Frame::new("app::init::run", "src/init.rs", 42).expect("valid frame");
        assert_eq!(frame.to_string(), "app::init::run(src/init.rs:42)");
    }

    #[test]
    fn frame_rejects_empty_file() {
        let err = Frame::new("app::run", "", 1).expect_err("empty file must fail");
        assert_eq!(err, InvariantError::EmptyField("file"));
    }

    #[test]
    fn frame_rejects_empty_function() {
        let err = Frame::new("", "src/main.rs", 1).expect_err("empty function must fail");
        assert_eq!(err, InvariantError::EmptyField("function"));
    }

    #[test]
    fn unresolved_parts_fall_back_to_unknown_file() {
        let frame = Frame::from_parts(None, None, None).expect("fallback frame");
        assert_eq!(frame.file(), UNKNOWN_FILE);
        assert_eq!(frame.to_string(), "<unknown>:0");
    }

    #[test]
    fn caller_frame_points_at_this_file() {
        let frame = Frame::caller();
        assert_eq!(frame.file(), file!());
        assert!(frame.function().is_none());
        assert!(frame.to_string().starts_with(file!()));
    }

    #[test]
    fn same_line_produces_identical_frames() {
        let frames: Vec<Frame> = (0..3).map(|_| Frame::caller()).collect();
        assert!(frames.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
