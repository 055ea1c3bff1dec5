use std::cell::RefCell;
use tracing::{debug, info};

use crate::envelope::ParseFailure;
use crate::models::EventKind;

/// Something worth reporting while dispatching a receipt. Never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    NotAFunctionCall {
        receipt_id: String,
        action_kind: &'static str,
    },
    UnrecognizedMethod {
        receipt_id: String,
        method_name: String,
    },
    MissingLog {
        receipt_id: String,
        kind: EventKind,
    },
    LogNotParsed {
        receipt_id: String,
        kind: EventKind,
        failure: ParseFailure,
    },
    FieldsSkipped {
        receipt_id: String,
        kind: EventKind,
        keys: Vec<String>,
    },
}

/// Sink for dispatcher notices.
pub trait Diagnostics {
    fn notice(&self, notice: Notice);
}

impl<D: Diagnostics + ?Sized> Diagnostics for &D {
    fn notice(&self, notice: Notice) {
        (**self).notice(notice)
    }
}

/// Forwards notices to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn notice(&self, notice: Notice) {
        match notice {
            Notice::NotAFunctionCall { receipt_id, action_kind } => {
                debug!(%receipt_id, action_kind, "Early return: not a function call");
            }
            Notice::UnrecognizedMethod { receipt_id, method_name } => {
                info!(%receipt_id, method = %method_name, "Not processed - FunctionCall is: {}", method_name);
            }
            Notice::MissingLog { receipt_id, kind } => {
                info!(%receipt_id, method = %kind, "No log line emitted, storing provenance only");
            }
            Notice::LogNotParsed { receipt_id, kind, failure } => {
                info!(%receipt_id, method = %kind, "Log line not parsed, storing provenance only: {}", failure);
            }
            Notice::FieldsSkipped { receipt_id, kind, keys } => {
                debug!(%receipt_id, method = %kind, "Skipped payload fields: {:?}", keys);
            }
        }
    }
}

/// Keeps every notice in memory.
#[derive(Debug, Default)]
pub struct CollectingDiagnostics {
    notices: RefCell<Vec<Notice>>,
}

impl CollectingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.borrow().clone()
    }

    pub fn take(&self) -> Vec<Notice> {
        self.notices.take()
    }
}

impl Diagnostics for CollectingDiagnostics {
    fn notice(&self, notice: Notice) {
        self.notices.borrow_mut().push(notice);
    }
}
