use serde::Deserialize;

use crate::diagnostics::{Diagnostics, Notice};
use crate::envelope::{classify, parse_log};
use crate::models::{EnvelopeFields, EventKind, EventRecord};
use crate::projector::{project, PartialRecord};
use crate::provenance::build_provenance;
use crate::store::EntityStore;
use crate::types::{ActionValue, ReceiptWithOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProcessorOptions {
    /// Let a `contract` payload key populate `methods` as well.
    pub contract_methods_fallthrough: bool,
    /// Only store a record when the outcome emitted at least one log line.
    pub require_log_line: bool,
}

/// Counters for one dispatched receipt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub actions: usize,
    pub function_calls: usize,
    pub records: usize,
    pub unrecognized: usize,
}

impl std::ops::AddAssign for ReceiptSummary {
    fn add_assign(&mut self, other: Self) {
        self.actions += other.actions;
        self.function_calls += other.function_calls;
        self.records += other.records;
        self.unrecognized += other.unrecognized;
    }
}

/// Routes function-call actions to their event kind and commits the resulting records.
pub struct EventProcessor<D> {
    options: ProcessorOptions,
    diagnostics: D,
}

impl<D: Diagnostics> EventProcessor<D> {
    pub fn new(options: ProcessorOptions, diagnostics: D) -> Self {
        Self { options, diagnostics }
    }

    pub fn options(&self) -> &ProcessorOptions {
        &self.options
    }

    pub fn handle_receipt<S: EntityStore>(
        &self,
        receipt: &ReceiptWithOutcome,
        store: &mut S,
    ) -> ReceiptSummary {
        let mut summary = ReceiptSummary::default();
        let receipt_id = receipt.receipt.id.to_base58();

        for action in &receipt.receipt.actions {
            summary.actions += 1;

            let ActionValue::FunctionCall(call) = action else {
                self.diagnostics.notice(Notice::NotAFunctionCall {
                    receipt_id: receipt_id.clone(),
                    action_kind: action.kind(),
                });
                continue;
            };
            summary.function_calls += 1;

            match EventKind::from_method_name(&call.method_name) {
                Some(kind) => {
                    if let Some(record) = self.build_record(kind, &receipt_id, receipt) {
                        store.upsert(record);
                        summary.records += 1;
                    }
                }
                None => {
                    self.diagnostics.notice(Notice::UnrecognizedMethod {
                        receipt_id: receipt_id.clone(),
                        method_name: call.method_name.clone(),
                    });
                    summary.unrecognized += 1;
                }
            }
        }

        summary
    }

    fn build_record(
        &self,
        kind: EventKind,
        receipt_id: &str,
        receipt: &ReceiptWithOutcome,
    ) -> Option<EventRecord> {
        let outcome = &receipt.outcome;
        let provenance = build_provenance(
            &receipt.receipt,
            &receipt.block.header,
            outcome,
            &receipt.receipt.signer_public_key,
        );

        let Some(raw) = outcome.first_log() else {
            if self.options.require_log_line {
                return None;
            }
            self.diagnostics.notice(Notice::MissingLog {
                receipt_id: receipt_id.to_string(),
                kind,
            });
            return Some(EventRecord::assemble(
                kind,
                receipt_id.to_string(),
                provenance,
                EnvelopeFields::default(),
                PartialRecord::default(),
            ));
        };

        let parsed = match parse_log(raw) {
            Ok(value) => value,
            Err(failure) => {
                self.diagnostics.notice(Notice::LogNotParsed {
                    receipt_id: receipt_id.to_string(),
                    kind,
                    failure,
                });
                return Some(EventRecord::assemble(
                    kind,
                    receipt_id.to_string(),
                    provenance,
                    EnvelopeFields::default(),
                    PartialRecord::default(),
                ));
            }
        };

        let envelope = classify(&parsed);
        let partial = envelope
            .payload
            .map(|data| project(data, kind.schema(self.options.contract_methods_fallthrough)))
            .unwrap_or_default();

        if !partial.skipped.is_empty() {
            self.diagnostics.notice(Notice::FieldsSkipped {
                receipt_id: receipt_id.to_string(),
                kind,
                keys: partial.skipped.clone(),
            });
        }

        Some(EventRecord::assemble(
            kind,
            receipt_id.to_string(),
            provenance,
            EnvelopeFields::from(&envelope),
            partial,
        ))
    }
}
