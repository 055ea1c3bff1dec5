//! Schema-driven projection of an event's `data` object onto typed record fields.

use num_bigint::BigInt;
use serde_json::{Map, Value};
use std::str::FromStr;

use crate::models::Field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    Text,
    BigInt,
    TextList,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    BigInt(BigInt),
    TextList(Vec<String>),
}

/// Maps one payload key to the record fields it populates.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub source_key: &'static str,
    pub targets: &'static [Field],
}

const fn rule(source_key: &'static str, targets: &'static [Field]) -> FieldRule {
    FieldRule { source_key, targets }
}

pub const INIT_SCHEMA: &[FieldRule] = &[
    rule("adminId", &[Field::AdminId]),
    rule("adminSet", &[Field::AdminSet]),
    rule("accountId", &[Field::AccountId]),
];

pub const SET_CONTRACT_TO_FUND_SCHEMA: &[FieldRule] = &[
    rule("contractPublicKey", &[Field::ContractPublicKey]),
    rule("allowance", &[Field::Allowance]),
    rule("contract", &[Field::Contract]),
    rule("methods", &[Field::Methods]),
    rule("time", &[Field::Time]),
    rule("admin", &[Field::Admin]),
];

/// Variant where a `contract` key also appends to `methods`.
pub const SET_CONTRACT_TO_FUND_FALLTHROUGH_SCHEMA: &[FieldRule] = &[
    rule("contractPublicKey", &[Field::ContractPublicKey]),
    rule("allowance", &[Field::Allowance]),
    rule("contract", &[Field::Contract, Field::Methods]),
    rule("methods", &[Field::Methods]),
    rule("time", &[Field::Time]),
    rule("admin", &[Field::Admin]),
];

pub const TRANSFER_ADMIN_SCHEMA: &[FieldRule] = &[
    rule("transferredFrom", &[Field::TransferredFrom]),
    rule("transferred", &[Field::Transferred]),
    rule("transferredTo", &[Field::TransferredTo]),
];

/// Coerced payload values in payload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub values: Vec<(Field, FieldValue)>,
    pub skipped: Vec<String>,
}

impl PartialRecord {
    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.values
            .iter()
            .rev()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Project `data` through `rules`. Unknown keys and values that fail to coerce are
/// recorded in `skipped` and otherwise ignored.
pub fn project(data: &Map<String, Value>, rules: &[FieldRule]) -> PartialRecord {
    let mut partial = PartialRecord::default();

    for (key, value) in data {
        let Some(rule) = rules.iter().find(|r| r.source_key == key.as_str()) else {
            partial.skipped.push(key.clone());
            continue;
        };

        for field in rule.targets {
            match coerce(value, field.coercion()) {
                Some(coerced) => partial.values.push((*field, coerced)),
                None => partial.skipped.push(key.clone()),
            }
        }
    }

    partial
}

pub fn coerce(value: &Value, coercion: Coercion) -> Option<FieldValue> {
    match coercion {
        Coercion::Text => coerce_text(value).map(FieldValue::Text),
        Coercion::BigInt => coerce_bigint(value).map(FieldValue::BigInt),
        Coercion::TextList => coerce_text_list(value).map(FieldValue::TextList),
    }
}

pub fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

pub fn coerce_bigint(value: &Value) -> Option<BigInt> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) if n.is_i64() || n.is_u64() => parse_decimal(&n.to_string()),
        _ => None,
    }
}

pub fn coerce_text_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().filter_map(coerce_text).collect()),
        other => coerce_text(other).map(|s| vec![s]),
    }
}

fn parse_decimal(s: &str) -> Option<BigInt> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigInt::from_str(s).ok()
}
