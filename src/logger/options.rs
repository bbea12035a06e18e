//! Optional fields of a log call.
use crate::record::CallSite;
use serde_json::Value;

/// Optional context attached to a log call.
///
/// Everything left unset falls back to a default: source `"Unknown"`,
/// category `"General"`, no payload, the calling thread and the caller's
/// file and line.
#[derive(Clone, Debug, Default)]
pub struct LogOptions {
    pub(crate) source: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) data: Option<Value>,
    pub(crate) thread_id: Option<u64>,
    pub(crate) callsite: Option<CallSite>,
}

impl LogOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Attaches a structured payload shown in the dashboard's details panel.
    pub fn data(mut self, data: impl Into<Value>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Overrides the thread identifier recorded with the event.
    pub fn thread_id(mut self, thread_id: u64) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Overrides the call site recorded with the event.
    pub fn callsite(mut self, callsite: CallSite) -> Self {
        self.callsite = Some(callsite);
        self
    }
}
