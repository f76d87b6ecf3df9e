/*
[INPUT]:  Transactions built by the embedding application
[OUTPUT]: Typed transaction model and the decoded function-call payload to sign
[POS]:    Data layer - transaction shapes handed to the remote signer
[UPDATE]: When supporting new action kinds or changing JSON encodings
*/

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, WalletError};

/// 32-byte transaction hash, base58 in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CryptoHash(pub [u8; 32]);

impl CryptoHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        CryptoHash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for CryptoHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl FromStr for CryptoHash {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| WalletError::MalformedTransaction(format!("invalid base58 hash: {e}")))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            WalletError::MalformedTransaction(format!("hash must be 32 bytes, got {}", v.len()))
        })?;
        Ok(CryptoHash(bytes))
    }
}

impl Serialize for CryptoHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for CryptoHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

/// A transaction as handed to the remote signer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub signer_id: String,
    pub receiver_id: String,
    #[serde(default)]
    pub nonce: u64,
    pub hash: CryptoHash,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    FunctionCall(FunctionCallAction),
    Transfer {
        #[serde(with = "u128_dec_str")]
        deposit: u128,
    },
}

/// Contract call: method name bytes plus JSON arguments encoded as bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCallAction {
    #[serde(with = "utf8_bytes")]
    pub method_name: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub args: Vec<u8>,
    #[serde(default)]
    pub gas: u64,
    #[serde(default, with = "u128_dec_str")]
    pub deposit: u128,
}

impl FunctionCallAction {
    /// Build a call from a method name and JSON arguments
    pub fn new(method_name: &str, args: &serde_json::Value) -> Result<Self> {
        Ok(Self {
            method_name: method_name.as_bytes().to_vec(),
            args: serde_json::to_vec(args)?,
            gas: 0,
            deposit: 0,
        })
    }
}

/// The part of a transaction the wallet needs to authorize a call
#[derive(Debug, Clone, PartialEq)]
pub struct SigningPayload {
    pub hash: CryptoHash,
    pub method_name: String,
    pub args: serde_json::Value,
}

impl Transaction {
    /// Decode the first action's function call into a signing payload
    pub fn signing_payload(&self) -> Result<SigningPayload> {
        let call = match self.actions.first() {
            Some(Action::FunctionCall(call)) => call,
            Some(_) => {
                return Err(WalletError::MalformedTransaction(
                    "first action is not a function call".to_string(),
                ));
            }
            None => {
                return Err(WalletError::MalformedTransaction(
                    "transaction has no actions".to_string(),
                ));
            }
        };

        let method_name = String::from_utf8(call.method_name.clone()).map_err(|e| {
            WalletError::MalformedTransaction(format!("method name is not utf-8: {e}"))
        })?;
        let args = serde_json::from_slice(&call.args).map_err(|e| {
            WalletError::MalformedTransaction(format!("arguments are not valid JSON: {e}"))
        })?;

        Ok(SigningPayload {
            hash: self.hash,
            method_name,
            args,
        })
    }
}

mod utf8_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let text = std::str::from_utf8(value).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        Ok(String::deserialize(deserializer)?.into_bytes())
    }
}

mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

// JSON has no 128-bit integers; deposits travel as decimal strings.
mod u128_dec_str {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
