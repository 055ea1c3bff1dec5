use num_bigint::BigInt;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::envelope::Envelope;
use crate::projector::{
    Coercion, FieldRule, FieldValue, PartialRecord, INIT_SCHEMA,
    SET_CONTRACT_TO_FUND_FALLTHROUGH_SCHEMA, SET_CONTRACT_TO_FUND_SCHEMA, TRANSFER_ADMIN_SCHEMA,
};

/// The recognized contract methods, one record kind each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Init,
    SetContractToFund,
    TransferAdmin,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [EventKind::Init, EventKind::SetContractToFund, EventKind::TransferAdmin];

    pub fn from_method_name(method_name: &str) -> Option<Self> {
        match method_name {
            "init" => Some(EventKind::Init),
            "setContractToFund" => Some(EventKind::SetContractToFund),
            "transferAdmin" => Some(EventKind::TransferAdmin),
            _ => None,
        }
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::SetContractToFund => "setContractToFund",
            EventKind::TransferAdmin => "transferAdmin",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            EventKind::Init => "init",
            EventKind::SetContractToFund => "set_contract_to_fund",
            EventKind::TransferAdmin => "transfer_admin",
        }
    }

    pub fn schema(&self, contract_methods_fallthrough: bool) -> &'static [FieldRule] {
        match self {
            EventKind::Init => INIT_SCHEMA,
            EventKind::SetContractToFund if contract_methods_fallthrough => {
                SET_CONTRACT_TO_FUND_FALLTHROUGH_SCHEMA
            }
            EventKind::SetContractToFund => SET_CONTRACT_TO_FUND_SCHEMA,
            EventKind::TransferAdmin => TRANSFER_ADMIN_SCHEMA,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Payload fields across all event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    AdminId,
    AdminSet,
    AccountId,
    ContractPublicKey,
    Allowance,
    Contract,
    Methods,
    Time,
    Admin,
    TransferredFrom,
    Transferred,
    TransferredTo,
}

impl Field {
    pub const fn coercion(&self) -> Coercion {
        match self {
            Field::AdminSet | Field::Time | Field::Transferred => Coercion::BigInt,
            Field::Methods => Coercion::TextList,
            _ => Coercion::Text,
        }
    }
}

/// Receipt, block and outcome data shared by every record kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    pub block_time: u64, // milliseconds
    pub block_height: u64,
    pub block_hash: String,
    pub predecessor_id: String,
    pub receiver_id: String,
    pub signer_id: String,
    pub signer_public_key: String,
    pub gas_burned: u64,
    pub tokens_burned: u128,
    pub outcome_id: String,
    pub executor_id: String,
    pub outcome_block_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnvelopeFields {
    pub standard: Option<String>,
    pub event: Option<String>,
    pub version: Option<String>,
}

impl From<&Envelope<'_>> for EnvelopeFields {
    fn from(envelope: &Envelope<'_>) -> Self {
        Self {
            standard: envelope.standard.clone(),
            event: envelope.event.clone(),
            version: envelope.version.clone(),
        }
    }
}

/// A record kind populated from projected payload values.
pub trait EventEntity: Sized {
    const KIND: EventKind;

    fn new(id: String, provenance: Provenance, envelope: EnvelopeFields) -> Self;

    fn apply(&mut self, field: Field, value: FieldValue);

    fn apply_all(&mut self, partial: PartialRecord) {
        for (field, value) in partial.values {
            self.apply(field, value);
        }
    }
}

fn push_texts(target: &mut Option<Vec<String>>, items: Vec<String>) {
    target.get_or_insert_with(Vec::new).extend(items);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InitRecord {
    pub id: String,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub envelope: EnvelopeFields,
    pub admin_id: Option<String>,
    pub admin_set: Option<BigInt>,
    pub account_id: Option<String>,
}

impl EventEntity for InitRecord {
    const KIND: EventKind = EventKind::Init;

    fn new(id: String, provenance: Provenance, envelope: EnvelopeFields) -> Self {
        Self {
            id,
            provenance,
            envelope,
            admin_id: None,
            admin_set: None,
            account_id: None,
        }
    }

    fn apply(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::AdminId, FieldValue::Text(v)) => self.admin_id = Some(v),
            (Field::AdminSet, FieldValue::BigInt(v)) => self.admin_set = Some(v),
            (Field::AccountId, FieldValue::Text(v)) => self.account_id = Some(v),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetContractToFundRecord {
    pub id: String,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub envelope: EnvelopeFields,
    pub contract_public_key: Option<String>,
    pub allowance: Option<String>,
    pub contract: Option<String>,
    pub methods: Option<Vec<String>>,
    pub time: Option<BigInt>,
    pub admin: Option<String>,
}

impl EventEntity for SetContractToFundRecord {
    const KIND: EventKind = EventKind::SetContractToFund;

    fn new(id: String, provenance: Provenance, envelope: EnvelopeFields) -> Self {
        Self {
            id,
            provenance,
            envelope,
            contract_public_key: None,
            allowance: None,
            contract: None,
            methods: None,
            time: None,
            admin: None,
        }
    }

    fn apply(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::ContractPublicKey, FieldValue::Text(v)) => self.contract_public_key = Some(v),
            (Field::Allowance, FieldValue::Text(v)) => self.allowance = Some(v),
            (Field::Contract, FieldValue::Text(v)) => self.contract = Some(v),
            (Field::Methods, FieldValue::TextList(v)) => push_texts(&mut self.methods, v),
            (Field::Time, FieldValue::BigInt(v)) => self.time = Some(v),
            (Field::Admin, FieldValue::Text(v)) => self.admin = Some(v),
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferAdminRecord {
    pub id: String,
    #[serde(flatten)]
    pub provenance: Provenance,
    #[serde(flatten)]
    pub envelope: EnvelopeFields,
    pub transferred_from: Option<String>,
    pub transferred: Option<BigInt>,
    pub transferred_to: Option<String>,
}

impl EventEntity for TransferAdminRecord {
    const KIND: EventKind = EventKind::TransferAdmin;

    fn new(id: String, provenance: Provenance, envelope: EnvelopeFields) -> Self {
        Self {
            id,
            provenance,
            envelope,
            transferred_from: None,
            transferred: None,
            transferred_to: None,
        }
    }

    fn apply(&mut self, field: Field, value: FieldValue) {
        match (field, value) {
            (Field::TransferredFrom, FieldValue::Text(v)) => self.transferred_from = Some(v),
            (Field::Transferred, FieldValue::BigInt(v)) => self.transferred = Some(v),
            (Field::TransferredTo, FieldValue::Text(v)) => self.transferred_to = Some(v),
            _ => {}
        }
    }
}

/// Any persisted record, keyed by receipt id within its kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind")]
pub enum EventRecord {
    Init(InitRecord),
    SetContractToFund(SetContractToFundRecord),
    TransferAdmin(TransferAdminRecord),
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        match self {
            EventRecord::Init(_) => EventKind::Init,
            EventRecord::SetContractToFund(_) => EventKind::SetContractToFund,
            EventRecord::TransferAdmin(_) => EventKind::TransferAdmin,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            EventRecord::Init(r) => &r.id,
            EventRecord::SetContractToFund(r) => &r.id,
            EventRecord::TransferAdmin(r) => &r.id,
        }
    }

    pub fn provenance(&self) -> &Provenance {
        match self {
            EventRecord::Init(r) => &r.provenance,
            EventRecord::SetContractToFund(r) => &r.provenance,
            EventRecord::TransferAdmin(r) => &r.provenance,
        }
    }

    pub fn envelope(&self) -> &EnvelopeFields {
        match self {
            EventRecord::Init(r) => &r.envelope,
            EventRecord::SetContractToFund(r) => &r.envelope,
            EventRecord::TransferAdmin(r) => &r.envelope,
        }
    }

    /// Build a record of `kind` from its provenance, envelope and projected payload.
    pub fn assemble(
        kind: EventKind,
        id: String,
        provenance: Provenance,
        envelope: EnvelopeFields,
        partial: PartialRecord,
    ) -> Self {
        fn build<T: EventEntity>(
            id: String,
            provenance: Provenance,
            envelope: EnvelopeFields,
            partial: PartialRecord,
        ) -> T {
            let mut record = T::new(id, provenance, envelope);
            record.apply_all(partial);
            record
        }

        match kind {
            EventKind::Init => EventRecord::Init(build(id, provenance, envelope, partial)),
            EventKind::SetContractToFund => {
                EventRecord::SetContractToFund(build(id, provenance, envelope, partial))
            }
            EventKind::TransferAdmin => {
                EventRecord::TransferAdmin(build(id, provenance, envelope, partial))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_routing_is_exact() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_method_name(kind.method_name()), Some(kind));
        }
        assert_eq!(EventKind::from_method_name("Init"), None);
        assert_eq!(EventKind::from_method_name("transfer_admin"), None);
        assert_eq!(EventKind::from_method_name(""), None);
    }

    #[test]
    fn test_field_types_match_schema_table() {
        assert_eq!(Field::AdminSet.coercion(), Coercion::BigInt);
        assert_eq!(Field::Time.coercion(), Coercion::BigInt);
        assert_eq!(Field::Transferred.coercion(), Coercion::BigInt);
        assert_eq!(Field::Methods.coercion(), Coercion::TextList);
        assert_eq!(Field::Allowance.coercion(), Coercion::Text);
        assert_eq!(Field::ContractPublicKey.coercion(), Coercion::Text);
    }

    #[test]
    fn test_methods_accumulate() {
        let mut record = SetContractToFundRecord::new(
            "id".into(),
            Provenance {
                block_time: 0,
                block_height: 0,
                block_hash: String::new(),
                predecessor_id: String::new(),
                receiver_id: String::new(),
                signer_id: String::new(),
                signer_public_key: String::new(),
                gas_burned: 0,
                tokens_burned: 0,
                outcome_id: String::new(),
                executor_id: String::new(),
                outcome_block_hash: String::new(),
            },
            EnvelopeFields::default(),
        );
        record.apply(Field::Methods, FieldValue::TextList(vec!["a".into()]));
        record.apply(Field::Methods, FieldValue::TextList(vec!["b".into(), "c".into()]));
        // Mismatched value types are ignored.
        record.apply(Field::Time, FieldValue::Text("soon".into()));

        assert_eq!(record.methods, Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]));
        assert_eq!(record.time, None);
    }
}
