/*
    This module implements child key derivation from parent extended
    private and public keys under the BIP32 standard.
*/

use crate::{
    hash::{hash160, hmac_sha512},
    hdwallet::{ExtendedKey, HDWError, Xprv, Xpub},
    util::try_into
};

/**
    Enum to pattern match child key derivation options.
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChildOptions {
    Normal(u32),
    Hardened(u32)
}

impl ChildOptions {
    /// The index as it appears on the wire, hardened bit included.
    pub fn raw_index(&self) -> Result<u32, HDWError> {
        match self {
            ChildOptions::Normal(x) => {
                if *x >= 1 << 31 { return Err(HDWError::IndexTooLarge(*x)) }
                Ok(*x)
            },
            ChildOptions::Hardened(x) => {
                if *x >= 1 << 31 { return Err(HDWError::IndexTooLarge(*x)) }
                Ok(x + (1 << 31))
            }
        }
    }
}

/**
    Derive a child xprv from a parent xprv.

    If the derived scalar falls outside the group order (or hits zero)
    the index is advanced by one and derivation retried, per the
    standard. Running off the end of the index space is an error.
*/
pub fn derive_xprv(parent: &Xprv, options: ChildOptions) -> Result<Xprv, HDWError> {
    let hardened = matches!(options, ChildOptions::Hardened(_));
    let mut index = options.raw_index()?;

    loop {
        //Normal children commit to the parent public key, hardened ones
        //to the padded parent private key.
        let mut data: Vec<u8> = if hardened {
            let mut d = vec![0x00];
            d.extend_from_slice(&parent.key().as_bytes());
            d
        } else {
            parent.get_pub().serialize_compressed().to_vec()
        };
        data.extend_from_slice(&index.to_be_bytes());

        let hash: [u8; 64] = hmac_sha512(&parent.chaincode(), &data);
        let left_bytes: [u8; 32] = try_into(hash[0..32].to_vec());
        let child_chaincode: [u8; 32] = try_into(hash[32..64].to_vec());

        match parent.key().add_scalar(&left_bytes) {
            Ok(child_key) => {
                let fingerprint: [u8; 4] =
                    try_into(hash160(&parent.get_pub().serialize_compressed())[0..4].to_vec());

                return Ok(Xprv::construct(
                    child_key,
                    child_chaincode,
                    parent.depth + 1,
                    fingerprint,
                    index.to_be_bytes()
                ));
            },
            //IL out of range. Move on to the next index.
            Err(_) => {
                let limit = if hardened { u32::MAX } else { (1 << 31) - 1 };
                if index == limit { return Err(HDWError::ExhaustedSpace()) }
                index += 1;
            }
        }
    }
}

/**
    Derive a child xpub from a parent xpub. Only normal indexes can be
    derived without the private key.
*/
pub fn derive_xpub(parent: &Xpub, options: ChildOptions) -> Result<Xpub, HDWError> {
    let mut index = match options {
        ChildOptions::Hardened(_) => return Err(HDWError::CantHarden()),
        ChildOptions::Normal(_) => options.raw_index()?
    };

    loop {
        let mut data = parent.key().serialize_compressed().to_vec();
        data.extend_from_slice(&index.to_be_bytes());

        let hash: [u8; 64] = hmac_sha512(&parent.chaincode(), &data);
        let left_bytes: [u8; 32] = try_into(hash[0..32].to_vec());
        let child_chaincode: [u8; 32] = try_into(hash[32..64].to_vec());

        match parent.key().add_exp(&left_bytes) {
            Ok(child_key) => {
                let fingerprint: [u8; 4] =
                    try_into(hash160(&parent.key().serialize_compressed())[0..4].to_vec());

                return Ok(Xpub::construct(
                    child_key.compress(),
                    child_chaincode,
                    parent.depth + 1,
                    fingerprint,
                    index.to_be_bytes()
                ));
            },
            Err(_) => {
                if index == (1 << 31) - 1 { return Err(HDWError::ExhaustedSpace()) }
                index += 1;
            }
        }
    }
}

/**
    Parse a derivation path string such as "m/44'/0'/0'/0" into child
    options. Both ' and h mark hardened steps.
*/
pub fn parse_path(path: &str) -> Result<Vec<ChildOptions>, HDWError> {
    let mut parts = path.split('/');
    match parts.next() {
        Some("m") | Some("M") => { },
        _ => return Err(HDWError::BadPath(path.to_string()))
    }

    let mut children = Vec::new();
    for part in parts {
        let (digits, hardened) = match part.strip_suffix('\'').or_else(|| part.strip_suffix('h')) {
            Some(x) => (x, true),
            None => (part, false)
        };
        let index: u32 = digits.parse().map_err(|_| HDWError::BadPath(path.to_string()))?;
        children.push(if hardened {
            ChildOptions::Hardened(index)
        } else {
            ChildOptions::Normal(index)
        });
    }

    Ok(children)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_parsing() {
        assert_eq!(
            parse_path("m/44'/0'/0'/0").unwrap(),
            vec![
                ChildOptions::Hardened(44),
                ChildOptions::Hardened(0),
                ChildOptions::Hardened(0),
                ChildOptions::Normal(0)
            ]
        );
        assert_eq!(parse_path("m").unwrap(), vec![]);
        assert!(parse_path("44'/0").is_err());
        assert!(parse_path("m/x").is_err());
    }

    #[test]
    fn reserved_indexes_rejected() {
        assert_eq!(
            ChildOptions::Normal(1 << 31).raw_index(),
            Err(HDWError::IndexTooLarge(1 << 31))
        );
        assert_eq!(ChildOptions::Hardened(5).raw_index(), Ok((1 << 31) + 5));
    }
}
