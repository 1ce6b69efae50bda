/*
    Library to create keys, addresses and signed transactions
    for Bitcoin and the UTXO coins that forked from it
    (Bitcoin Cash, Litecoin, Dash and Dogecoin, plus their testnets).

    The per-coin differences (address prefixes, WIF prefixes, bech32
    human readable parts, BIP-32 magics, the Bitcoin Cash fork id)
    live in data records in the coin module. Everything else is a
    single set of algorithms that reads those records.

    References:
        - The Bitcoin Book (https://github.com/bitcoinbook/bitcoinbook/)
        - learn me a bitcoin (https://learnmeabitcoin.com/)
        - BIP-32, BIP-141, BIP-143 and BIP-173 for the derivation,
          witness serialization, witness sighash and bech32 details.
*/

//Outward facing modules
pub mod coin;
pub mod key;
pub mod encoding;
pub mod script;
pub mod hdwallet;
pub mod electrum;
pub mod tx;
pub mod explorer;
pub mod prelude;

//Modules for internal use
mod hash;
pub mod util;
mod impls;

//Dependencies
use secp256k1::rand::rngs::OsRng;
use secp256k1::recovery::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, Signature};
use hmac::{Hmac, Mac, NewMac};
use sha2::{Digest, Sha256, Sha512};
use ripemd160::Ripemd160;
