//! Recovery policy for planner output that could not be parsed.
//!
//! Without a policy an unparsable plan aborts the call. With one, the
//! parse error is turned into an observation and the planner gets another
//! round to correct itself.

use std::sync::Arc;

/// Turns a raw parse error message into the observation shown to the planner.
pub type Formatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone, Default)]
pub struct ParserErrorHandler {
    formatter: Option<Formatter>,
}

impl ParserErrorHandler {
    /// Feed the raw error message back as the observation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Format the error message with a custom function.
    pub fn with_formatter<F>(formatter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            formatter: Some(Arc::new(formatter)),
        }
    }

    /// Always use the same observation, whatever the error said.
    pub fn with_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::with_formatter(move |_| message.clone())
    }

    pub fn format(&self, raw: &str) -> String {
        match &self.formatter {
            Some(f) => f(raw),
            None => raw.to_string(),
        }
    }
}

impl std::fmt::Debug for ParserErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserErrorHandler")
            .field("formatter", &self.formatter.as_ref().map(|_| "<fn>"))
            .finish()
    }
}
