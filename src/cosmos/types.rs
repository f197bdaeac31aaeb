//! Cosmos SDK REST wire types and the unsigned transaction handed to signers.

use serde::{Deserialize, Deserializer, Serialize};

use crate::engine::types::Coin;

/// `MsgExecuteContract` contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteMsg {
    pub sender: String,
    pub contract: String,
    /// The contract's JSON execute message.
    pub msg: serde_json::Value,
    pub funds: Vec<Coin>,
}

/// Fee section of an auth-info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fee {
    pub amount: Vec<Coin>,
    pub gas_limit: u64,
}

/// Everything a signer needs to produce `TxRaw` bytes for one attempt.
///
/// Account number and sequence are left to the signer, which usually tracks
/// or queries them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsignedTx {
    pub chain_id: String,
    pub msg: ExecuteMsg,
    pub memo: String,
    pub fee: Fee,
}

/// Body for `POST /cosmos/tx/v1beta1/txs`.
#[derive(Debug, Serialize)]
pub(crate) struct BroadcastTxRequest<'a> {
    pub tx_bytes: &'a str,
    pub mode: &'static str,
}

/// Body for `POST /cosmos/tx/v1beta1/simulate`.
#[derive(Debug, Serialize)]
pub(crate) struct SimulateRequest<'a> {
    pub tx_bytes: &'a str,
}

/// Envelope returned by broadcast and tx lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct TxResponseEnvelope {
    pub tx_response: TxResponse,
}

/// `cosmos.base.abci.v1beta1.TxResponse` as rendered by the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TxResponse {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub height: u64,
    pub txhash: String,
    pub code: u32,
    pub codespace: String,
    pub raw_log: String,
    /// Hex-encoded execution data.
    pub data: String,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub gas_wanted: u64,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub gas_used: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulateResponse {
    pub gas_info: GasInfo,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GasInfo {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub gas_wanted: u64,
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub gas_used: u64,
}

/// Response of a CosmWasm smart query.
#[derive(Debug, Clone, Deserialize)]
pub struct SmartQueryResponse {
    pub data: serde_json::Value,
}

/// Error body returned by the gateway on non-2xx responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GatewayError {
    pub code: u32,
    pub message: String,
}

/// The gateway renders 64-bit integers as strings; accept both forms.
fn u64_from_str_or_num<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StrOrNum {
        Str(String),
        Num(u64),
    }

    match StrOrNum::deserialize(deserializer)? {
        StrOrNum::Num(n) => Ok(n),
        StrOrNum::Str(s) if s.is_empty() => Ok(0),
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}
