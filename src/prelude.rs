/*
    Convenience re-exports for the common use cases.
*/

pub use crate::coin::{lookup, Coin, CoinPolicy};
pub use crate::electrum::ElectrumMaster;
pub use crate::explorer::{Explorer, PushResult, TransportError, Utxo};
pub use crate::hdwallet::{ChildOptions, ExtendedKey, Xprv, Xpub};
pub use crate::key::{PrivKey, PubKey};
pub use crate::script::Script;
pub use crate::tx::{
    InputKind, Outpoint, Tx, TxInput, TxOutput,
    SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_FORKID, SIGHASH_NONE, SIGHASH_SINGLE
};
