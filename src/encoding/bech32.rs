/*
    Module implements bech32 encoded segwit addresses as defined
    in BIP-173.

    The checksum and base32 regrouping come from the bech32 crate,
    which takes the human readable part as a plain string. The coin
    policy supplies it, so the same codec serves every coin that
    defines one (bc, tb, ltc, tltc, ...). Only witness version 0
    programs (P2WPKH) are supported.
*/

use bech32::{self, u5, FromBase32, ToBase32, Variant};

#[derive(Debug, PartialEq)]
pub enum Bech32Error {
    BadChar(char),
    BadChecksum,
    BadSeparator,
    MixedCase,
    BadPadding,
    BadLength,
    BadWitnessVersion(u8),
    BadProgramLength(usize)
}

impl From<bech32::Error> for Bech32Error {
    fn from(e: bech32::Error) -> Self {
        match e {
            bech32::Error::MissingSeparator => Self::BadSeparator,
            bech32::Error::InvalidChecksum => Self::BadChecksum,
            bech32::Error::InvalidChar(c) => Self::BadChar(c),
            bech32::Error::MixedCase => Self::MixedCase,
            bech32::Error::InvalidPadding => Self::BadPadding,
            bech32::Error::InvalidLength | bech32::Error::InvalidData(_) => Self::BadLength
        }
    }
}

/**
    Encode a witness version 0 program (a 20 byte pubkey hash) as a
    segwit address under the given human readable part.
*/
pub fn encode_address(hrp: &str, program: &[u8]) -> Result<String, Bech32Error> {
    if program.len() != 20 { return Err(Bech32Error::BadProgramLength(program.len())) }

    //The version symbol is carried as its own five bit group in front
    //of the regrouped program bytes.
    let mut data = vec![u5::try_from_u8(0x00).expect("zero fits five bits")];
    data.extend(program.to_base32());

    Ok(bech32::encode(hrp, data, Variant::Bech32)?)
}

/**
    Decode a segwit address. Returns the human readable part and the
    witness program. Only version 0 addresses pass.
*/
pub fn decode_address(address: &str) -> Result<(String, Vec<u8>), Bech32Error> {
    let (hrp, data, variant) = bech32::decode(address)?;
    //Version 0 addresses checksum under the original constant, not
    //the bech32m one.
    if variant != Variant::Bech32 { return Err(Bech32Error::BadChecksum) }
    if data.is_empty() { return Err(Bech32Error::BadLength) }

    let version = data[0].to_u8();
    if version != 0x00 { return Err(Bech32Error::BadWitnessVersion(version)) }

    let program = Vec::<u8>::from_base32(&data[1..])?;
    if program.len() != 20 { return Err(Bech32Error::BadProgramLength(program.len())) }

    Ok((hrp, program))
}
