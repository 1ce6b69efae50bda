pub mod base58;
pub mod bech32;
pub mod varint;

pub use base58::Base58;
pub use base58::Base58Error;
pub use bech32::Bech32Error;
pub use varint::VarIntError;
