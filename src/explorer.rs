/*
    Block explorer transport interface.

    The core does no I/O of its own. Anything that needs the network
    (unspent lookup, history, broadcasting) is expressed against this
    trait and the caller injects an implementation. Errors carry the
    explorer's response verbatim; the core never retries.
*/

use serde::{Deserialize, Serialize};

/// An unspent output as reported by an explorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utxo {
    pub txid: String,
    pub vout: u32,
    pub value: u64,
    #[serde(default)]
    pub segwit: bool
}

/// One entry of an address's transaction history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub txid: String,
    pub height: Option<u32>
}

/// Result of broadcasting a raw transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushResult {
    pub status: String,
    pub txid: Option<String>
}

/// The explorer was unreachable or answered with a non success status.
/// The response field is the explorer's answer, untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportError {
    pub response: String
}

impl TransportError {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into() }
    }
}

pub trait Explorer {
    /// Unspent outputs of an address.
    fn unspent(&self, coin: &str, address: &str) -> Result<Vec<Utxo>, TransportError>;

    /// Raw hex of a transaction by txid.
    fn fetchtx(&self, coin: &str, txid: &str) -> Result<String, TransportError>;

    /// Prior transactions touching an address.
    fn history(&self, coin: &str, address: &str) -> Result<Vec<HistoryItem>, TransportError>;

    /// Broadcast a raw transaction, hex encoded.
    fn pushtx(&self, coin: &str, rawtx: &str) -> Result<PushResult, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_keeps_the_response() {
        let err = TransportError::new("503 service unavailable");
        assert_eq!(err.response, "503 service unavailable");
    }
}
