/*
    This module implements hierarchical deterministic key trees
    under the BIP 32 standard.

    Reference:
        https://github.com/bitcoin/bips/blob/master/bip-0032.mediawiki
*/

pub mod extended_keys;
pub mod ckd;

pub use extended_keys::{ExtendedKey, Xprv, Xpub};
pub use ckd::ChildOptions;

#[derive(Debug, PartialEq)]
pub enum HDWError {
    IndexTooLarge(u32),
    CantHarden(),
    BadKey(),
    BadChecksum(),
    BadPrefix(u32),
    BadChar(char),
    BadPath(String),
    ExhaustedSpace()
}
