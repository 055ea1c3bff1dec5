use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;

/// 32-byte hash (receipt id, block hash, outcome id), base58 on the wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl FromStr for CryptoHash {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s).into_vec()?;
        let actual = bytes.len();
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| DecodeError::Length { expected: 32, actual })?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for CryptoHash {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CryptoHash> for String {
    fn from(value: CryptoHash) -> Self {
        value.to_base58()
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CryptoHash({})", self.to_base58())
    }
}

/// Signer public key. Accepts `ed25519:<base58>` or a bare base58 string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PublicKey {
    pub key_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl PublicKey {
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.bytes).into_string()
    }
}

impl FromStr for PublicKey {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_type, data) = match s.split_once(':') {
            Some((key_type, data)) => (Some(key_type.to_string()), data),
            None => (None, s),
        };
        Ok(Self {
            key_type,
            bytes: bs58::decode(data).into_vec()?,
        })
    }
}

impl TryFrom<String> for PublicKey {
    type Error = DecodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PublicKey> for String {
    fn from(value: PublicKey) -> Self {
        match &value.key_type {
            Some(key_type) => format!("{}:{}", key_type, value.to_base58()),
            None => value.to_base58(),
        }
    }
}

/// One line of the input stream: a receipt with its execution outcome and block.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptWithOutcome {
    pub receipt: ActionReceipt,
    pub outcome: ExecutionOutcome,
    pub block: Block,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockHeader {
    pub height: u64,
    pub hash: CryptoHash,
    #[serde(with = "dec_format")]
    pub timestamp_nanosec: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub id: CryptoHash,
    pub predecessor_id: String,
    pub receiver_id: String,
    pub signer_id: String,
    pub signer_public_key: PublicKey,
    #[serde(default)]
    pub actions: Vec<ActionValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub id: CryptoHash,
    pub executor_id: String,
    pub block_hash: CryptoHash,
    pub gas_burnt: u64,
    #[serde(with = "dec_format")]
    pub tokens_burnt: u128,
    #[serde(default)]
    pub logs: Vec<String>,
}

impl ExecutionOutcome {
    /// Only the first emitted log line carries the event.
    pub fn first_log(&self) -> Option<&str> {
        self.logs.first().map(String::as_str)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallAction {
    pub method_name: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub gas: u64,
    #[serde(default, with = "dec_format")]
    pub deposit: u128,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ActionValue {
    CreateAccount,
    DeployContract {
        #[serde(default)]
        code: String,
    },
    FunctionCall(FunctionCallAction),
    Transfer {
        #[serde(with = "dec_format")]
        deposit: u128,
    },
    Stake {
        #[serde(with = "dec_format")]
        stake: u128,
        public_key: PublicKey,
    },
    AddKey {
        public_key: PublicKey,
    },
    DeleteKey {
        public_key: PublicKey,
    },
    DeleteAccount {
        beneficiary_id: String,
    },
}

impl ActionValue {
    pub fn as_function_call(&self) -> Option<&FunctionCallAction> {
        match self {
            ActionValue::FunctionCall(call) => Some(call),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ActionValue::CreateAccount => "CreateAccount",
            ActionValue::DeployContract { .. } => "DeployContract",
            ActionValue::FunctionCall(_) => "FunctionCall",
            ActionValue::Transfer { .. } => "Transfer",
            ActionValue::Stake { .. } => "Stake",
            ActionValue::AddKey { .. } => "AddKey",
            ActionValue::DeleteKey { .. } => "DeleteKey",
            ActionValue::DeleteAccount { .. } => "DeleteAccount",
        }
    }
}

/// Integers that may exceed JSON number precision travel as decimal strings.
/// Plain JSON numbers are accepted too.
pub(crate) mod dec_format {
    use serde::{de, Deserialize, Deserializer, Serializer};
    use std::fmt::Display;
    use std::str::FromStr;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Text(String),
        Number(u64),
    }

    pub fn serialize<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Display,
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: Display,
        D: Deserializer<'de>,
    {
        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(de::Error::custom),
            Repr::Number(n) => n.to_string().parse().map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RECEIPT_JSON: &str = r#"{
        "receipt": {
            "id": "11111111111111111111111111111111",
            "predecessor_id": "alice.near",
            "receiver_id": "fund.near",
            "signer_id": "alice.near",
            "signer_public_key": "ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp",
            "actions": [
                "CreateAccount",
                {"Transfer": {"deposit": "1000000000000000000000000"}},
                {"FunctionCall": {"method_name": "init", "args": "e30=", "gas": 30000000000000, "deposit": "0"}}
            ]
        },
        "outcome": {
            "id": "11111111111111111111111111111111",
            "executor_id": "fund.near",
            "block_hash": "11111111111111111111111111111111",
            "gas_burnt": 2428395018008,
            "tokens_burnt": "242839501800800000000",
            "logs": ["first", "second"]
        },
        "block": {
            "header": {
                "height": 42,
                "hash": "11111111111111111111111111111111",
                "timestamp_nanosec": "1700000000123456789"
            }
        }
    }"#;

    #[test]
    fn test_receipt_deserialization() {
        let parsed: ReceiptWithOutcome = serde_json::from_str(RECEIPT_JSON).unwrap();

        assert_eq!(parsed.receipt.actions.len(), 3);
        assert_eq!(parsed.receipt.actions[0].kind(), "CreateAccount");
        assert!(parsed.receipt.actions[1].as_function_call().is_none());

        let call = parsed.receipt.actions[2].as_function_call().unwrap();
        assert_eq!(call.method_name, "init");
        assert_eq!(call.deposit, 0);

        assert_eq!(parsed.outcome.tokens_burnt, 242_839_501_800_800_000_000);
        assert_eq!(parsed.outcome.first_log(), Some("first"));
        assert_eq!(parsed.block.header.timestamp_nanosec, 1_700_000_000_123_456_789);
        assert_eq!(parsed.receipt.signer_public_key.key_type.as_deref(), Some("ed25519"));
        assert_eq!(parsed.receipt.signer_public_key.bytes.len(), 32);
    }

    #[test]
    fn test_crypto_hash_base58() {
        let hash = CryptoHash([0u8; 32]);
        assert_eq!(hash.to_base58(), "11111111111111111111111111111111");
        assert_eq!("11111111111111111111111111111111".parse::<CryptoHash>().unwrap(), hash);

        let err = "111".parse::<CryptoHash>().unwrap_err();
        assert_eq!(err, DecodeError::Length { expected: 32, actual: 3 });
        assert!("0OIl".parse::<CryptoHash>().is_err());
    }

    #[test]
    fn test_public_key_round_trip_keeps_prefix() {
        let key: PublicKey = "ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp".parse().unwrap();
        assert_eq!(key.to_base58(), "6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp");
        assert_eq!(
            String::from(key),
            "ed25519:6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp"
        );

        let bare: PublicKey = "6E8sCci9badyRkXb3JoRpBj5p8C6Tw41ELDZoiihKEtp".parse().unwrap();
        assert!(bare.key_type.is_none());
    }

    #[test]
    fn test_missing_logs_default_to_empty() {
        let json = r#"{
            "id": "11111111111111111111111111111111",
            "executor_id": "fund.near",
            "block_hash": "11111111111111111111111111111111",
            "gas_burnt": 1,
            "tokens_burnt": 7
        }"#;
        let outcome: ExecutionOutcome = serde_json::from_str(json).unwrap();
        assert!(outcome.logs.is_empty());
        assert_eq!(outcome.first_log(), None);
        assert_eq!(outcome.tokens_burnt, 7);
    }
}
