/*
    This module implements extended keys that are used in BIP32
    hierarchal deterministic wallets.

    An extended key is the key itself plus a 32 byte chaincode, with
    serialization metadata (depth, parent fingerprint, child index).
    The four byte version magic is not stored on the key. It belongs
    to the coin, so it is passed in at (de)serialization time.
*/

use crate::{
    encoding::base58::Base58,
    hash,
    hdwallet::{
        ckd::{derive_xprv, derive_xpub, parse_path, ChildOptions},
        HDWError
    },
    key::{PrivKey, PubKey},
    util::{as_u32_be, try_into}
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xprv {
    key: PrivKey,
    chaincode: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub index: [u8; 4]
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xpub {
    key: PubKey,
    chaincode: [u8; 32],
    pub depth: u8,
    pub parent_fingerprint: [u8; 4],
    pub index: [u8; 4]
}

pub trait ExtendedKey: Sized {
    /**
        Constructs the extended key from its parts.
    */
    fn construct(key_bytes: Vec<u8>, chaincode: [u8; 32], depth: u8, pf: [u8; 4], index: [u8; 4]) -> Result<Self, HDWError>;

    /**
        Returns the chaincode (right 32 bytes) of the extended key
    */
    fn chaincode(&self) -> [u8; 32];

    /**
        Serialize the extended key under the given version magic.
    */
    fn serialize(&self, magic: u32) -> String;

    /**
        Import an extended key from a base58 check string, validating
        checksum and version magic.
    */
    fn deserialize(encoded: &str, magic: u32) -> Result<Self, HDWError>;

    /**
        Derives the child key of self
    */
    fn derive_child(&self, options: ChildOptions) -> Result<Self, HDWError>;

    /**
        Derive the key at the given path string, eg. "m/44'/0'/0'/0".
    */
    fn derive_from_path(&self, path: &str) -> Result<Self, HDWError>
    where Self: Clone
    {
        let mut current: Self = self.clone();
        for options in parse_path(path)? {
            current = current.derive_child(options)?;
        }
        Ok(current)
    }
}

//Shared deserialization plumbing. Returns (depth, fingerprint, index, chaincode, key bytes).
fn decode_payload(encoded: &str, magic: u32) -> Result<(u8, [u8; 4], [u8; 4], [u8; 32], Vec<u8>), HDWError> {
    let bytes = match Base58::check_decode(encoded) {
        Ok(x) => x,
        Err(crate::encoding::Base58Error::BadChar(c)) => return Err(HDWError::BadChar(c)),
        Err(crate::encoding::Base58Error::BadChecksum) => return Err(HDWError::BadChecksum()),
        Err(_) => return Err(HDWError::BadKey())
    };
    //4 magic | 1 depth | 4 fingerprint | 4 index | 32 chaincode | 33 key
    if bytes.len() != 78 { return Err(HDWError::BadKey()) }

    let version = as_u32_be(&try_into(bytes[0..4].to_vec()));
    if version != magic { return Err(HDWError::BadPrefix(version)) }

    Ok((
        bytes[4],
        try_into(bytes[5..9].to_vec()),
        try_into(bytes[9..13].to_vec()),
        try_into(bytes[13..45].to_vec()),
        bytes[45..78].to_vec()
    ))
}

fn encode_payload(magic: u32, depth: u8, pf: &[u8; 4], index: &[u8; 4], chaincode: &[u8; 32], key_bytes: &[u8]) -> String {
    let mut payload: Vec<u8> = Vec::with_capacity(78);
    payload.extend_from_slice(&magic.to_be_bytes());
    payload.push(depth);
    payload.extend_from_slice(pf);
    payload.extend_from_slice(index);
    payload.extend_from_slice(chaincode);
    payload.extend_from_slice(key_bytes);

    Base58::new(&[], &payload).check_encode()
}

impl Xprv {
    /**
        Master key from arbitrary seed bytes, per BIP32: split the
        HMAC-SHA512 of the seed keyed "Bitcoin seed" into key and
        chaincode.
    */
    pub fn from_seed(seed: &[u8]) -> Result<Xprv, HDWError> {
        let hash: [u8; 64] = hash::hmac_sha512(b"Bitcoin seed", seed);

        Ok(Xprv {
            key: PrivKey::from_slice(&hash[0..32], true).map_err(|_| HDWError::BadKey())?,
            chaincode: try_into(hash[32..64].to_vec()),
            depth: 0x00,
            parent_fingerprint: [0x00; 4],
            index: [0x00; 4]
        })
    }

    pub(crate) fn construct(key: PrivKey, chaincode: [u8; 32], depth: u8, pf: [u8; 4], index: [u8; 4]) -> Self {
        Self { key, chaincode, depth, parent_fingerprint: pf, index }
    }

    /**
        Return the private key part of self
    */
    pub fn key(&self) -> &PrivKey {
        &self.key
    }

    pub fn get_pub(&self) -> PubKey {
        PubKey::from_priv_key(&self.key)
    }

    /**
        Find the corresponding xpub for self
    */
    pub fn get_xpub(&self) -> Xpub {
        Xpub {
            key: self.get_pub(),
            chaincode: self.chaincode,
            depth: self.depth,
            parent_fingerprint: self.parent_fingerprint,
            index: self.index
        }
    }
}

impl ExtendedKey for Xprv {
    fn construct(key_bytes: Vec<u8>, chaincode: [u8; 32], depth: u8, pf: [u8; 4], index: [u8; 4]) -> Result<Self, HDWError> {
        //Private keys serialize with a single zero pad byte in front
        if key_bytes.len() != 33 || key_bytes[0] != 0x00 { return Err(HDWError::BadKey()) }
        let key = PrivKey::from_slice(&key_bytes[1..33], true).map_err(|_| HDWError::BadKey())?;

        Ok(Xprv::construct(key, chaincode, depth, pf, index))
    }

    fn chaincode(&self) -> [u8; 32] {
        self.chaincode
    }

    fn serialize(&self, magic: u32) -> String {
        let mut key_bytes = vec![0x00];
        key_bytes.extend_from_slice(&self.key.as_bytes());

        encode_payload(magic, self.depth, &self.parent_fingerprint, &self.index, &self.chaincode, &key_bytes)
    }

    fn deserialize(encoded: &str, magic: u32) -> Result<Self, HDWError> {
        let (depth, pf, index, chaincode, key_bytes) = decode_payload(encoded, magic)?;
        <Xprv as ExtendedKey>::construct(key_bytes, chaincode, depth, pf, index)
    }

    fn derive_child(&self, options: ChildOptions) -> Result<Self, HDWError> {
        derive_xprv(self, options)
    }
}

impl Xpub {
    pub(crate) fn construct(key: PubKey, chaincode: [u8; 32], depth: u8, pf: [u8; 4], index: [u8; 4]) -> Self {
        Self { key, chaincode, depth, parent_fingerprint: pf, index }
    }

    pub fn key(&self) -> &PubKey {
        &self.key
    }

    /**
        Fingerprint of self, as used by children derived from self.
    */
    pub fn fingerprint(&self) -> [u8; 4] {
        try_into(hash::hash160(&self.key.serialize_compressed())[0..4].to_vec())
    }
}

impl ExtendedKey for Xpub {
    fn construct(key_bytes: Vec<u8>, chaincode: [u8; 32], depth: u8, pf: [u8; 4], index: [u8; 4]) -> Result<Self, HDWError> {
        let key = PubKey::from_slice(&key_bytes).map_err(|_| HDWError::BadKey())?;

        Ok(Xpub::construct(key, chaincode, depth, pf, index))
    }

    fn chaincode(&self) -> [u8; 32] {
        self.chaincode
    }

    fn serialize(&self, magic: u32) -> String {
        encode_payload(
            magic,
            self.depth,
            &self.parent_fingerprint,
            &self.index,
            &self.chaincode,
            &self.key.serialize_compressed()
        )
    }

    fn deserialize(encoded: &str, magic: u32) -> Result<Self, HDWError> {
        let (depth, pf, index, chaincode, key_bytes) = decode_payload(encoded, magic)?;
        <Xpub as ExtendedKey>::construct(key_bytes, chaincode, depth, pf, index)
    }

    fn derive_child(&self, options: ChildOptions) -> Result<Self, HDWError> {
        derive_xpub(self, options)
    }
}
