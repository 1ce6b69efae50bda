/**
    This module combines all the boilerplate
    implementations of fmt::Display for the error enums.
*/

use crate::{
    coin,
    electrum,
    encoding,
    explorer,
    hdwallet,
    key,
    script,
    tx
};
use std::fmt;

/*
    key module impls
*/
impl fmt::Display for key::KeyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::BadSlice() => "Bad slice input".to_string(),
            Self::BadArithmatic() => "Bad arithmatic".to_string(),
            Self::BadWif() => "Bad WIF".to_string(),
            Self::BadWifNetwork(x) => format!("WIF prefix {:#04x} belongs to another network", x),
            Self::BadString() => "Bad string".to_string(),
            Self::BadSignature() => "Bad signature".to_string()
        };

        write!(f, "{}", val)
    }
}

/*
    encoding module impls
*/
impl fmt::Display for encoding::Base58Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::BadChar(x) => format!("Character '{}' is not valid base58", x),
            Self::BadChecksum => "Checksum unequal".to_string(),
            Self::TooShort => "Not enough bytes for a checksum".to_string()
        };

        write!(f, "{}", val)
    }
}

impl fmt::Display for encoding::Bech32Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::BadChar(x) => format!("Character '{}' is not valid bech32", x),
            Self::BadChecksum => "Checksum unequal".to_string(),
            Self::BadSeparator => "No separator found".to_string(),
            Self::MixedCase => "Mixed case string".to_string(),
            Self::BadPadding => "Bad bit group padding".to_string(),
            Self::BadLength => "Bad length".to_string(),
            Self::BadWitnessVersion(x) => format!("Witness version {} is not supported", x),
            Self::BadProgramLength(x) => format!("Witness program of {} bytes", x)
        };

        write!(f, "{}", val)
    }
}

impl fmt::Display for encoding::VarIntError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::UnexpectedEnd => "Unexpected end of input".to_string(),
            Self::NonCanonical(x) => format!("Value {} is not minimally encoded", x)
        };

        write!(f, "{}", val)
    }
}

/*
    script module impls
*/
impl fmt::Display for script::ScriptErr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::KeyCountDoesNotMatch() => "Quorum is larger than the key count".to_string(),
            Self::MaxKeyCountExceeded() => "More than 15 keys".to_string(),
            Self::BadPush(x) => format!("Push at offset {} runs past the end", x),
            Self::NotMultisig() => "Not a multisig redeem script".to_string()
        };

        write!(f, "{}", val)
    }
}

/*
    hdwallet module impls
*/
impl fmt::Display for hdwallet::HDWError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val = match self {
            Self::IndexTooLarge(x) => format!("The index {} is too large.", x),
            Self::CantHarden() => "cannot produce hardened child public key".to_string(),
            Self::BadKey() => "Cannot use this key. Likely a bad slice.".to_string(),
            Self::BadChecksum() => "Checksum unequal.".to_string(),
            Self::BadPrefix(x) => format!("Got bad prefix: {:#010x}.", x),
            Self::BadChar(x) => format!("Bad character '{}'.", x),
            Self::BadPath(x) => format!("'{}' is not a valid path.", x),
            Self::ExhaustedSpace() => "Ran out of child indexes.".to_string()
        };

        write!(f, "{}", val)
    }
}

/*
    electrum module impls
*/
impl fmt::Display for electrum::ElectrumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val = match self {
            Self::BadSeed() => "Seed is not a 128 bit hex string",
            Self::BadMpk() => "Master public key is not a valid point",
            Self::BadArithmatic() => "Bad arithmatic"
        };

        write!(f, "{}", val)
    }
}

/*
    tx module impls
*/
impl fmt::Display for tx::TxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::UnexpectedEnd => "Unexpected end of input".to_string(),
            Self::BadWitnessFlag(x) => format!("Witness flag {:#04x} where 0x01 was expected", x),
            Self::WitnessMissing => "Witness marker present but every stack is empty".to_string(),
            Self::TrailingBytes(x) => format!("{} trailing bytes after the transaction", x),
            Self::BadHex => "Not a hex string".to_string(),
            Self::BadTxid => "Txid is not 32 bytes of hex".to_string()
        };

        write!(f, "{}", val)
    }
}

impl fmt::Display for tx::SignError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::InputOutOfRange(x) => format!("No input at index {}", x),
            Self::MissingAmount(x) => format!("Input {} needs its prevout amount to be signed", x),
            Self::MultisigInput(x) => format!("Input {} is multisig, use multisign", x),
            Self::ValueOverflow { inputs, outputs } =>
                format!("Outputs spend {} of {} available satoshis", outputs, inputs),
            Self::KeyNotInRedeemScript(x) => format!("Key {} has no slot in the redeem script", x),
            Self::BadRedeemScript() => "Bad redeem script".to_string(),
            Self::TooFewSignatures() => "No signatures to apply".to_string()
        };

        write!(f, "{}", val)
    }
}

/*
    explorer module impls
*/
impl fmt::Display for explorer::TransportError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Explorer error: {}", self.response)
    }
}

/*
    coin module impls
*/
impl fmt::Display for coin::CoinError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::BadBase58(x) => format!("{}", x),
            Self::BadBech32(x) => format!("{}", x),
            Self::WrongNetwork(x) => format!("Version byte {:#04x} belongs to another network", x),
            Self::WrongHrp(x) => format!("Prefix '{}' belongs to another network", x),
            Self::NoSegwit() => "This coin has no bech32 address format".to_string(),
            Self::NonStandardScript() => "Script matches no standard template".to_string(),
            Self::BadLength(x) => format!("Decoded to {} bytes", x)
        };

        write!(f, "{}", val)
    }
}

impl fmt::Display for coin::SendError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let val: String = match self {
            Self::Transport(x) => format!("{}", x),
            Self::Signing(x) => format!("{}", x),
            Self::Address(x) => format!("{}", x),
            Self::Codec(x) => format!("{}", x),
            Self::InsufficientFunds { available, required } =>
                format!("Insufficient funds: have {} of {} satoshis", available, required)
        };

        write!(f, "{}", val)
    }
}
