/*
    Electrum style deterministic key derivation, first generation.

    A 128 bit hex seed is stretched by 100,000 rounds of SHA-256 into a
    master scalar. The master public key (MPK) is the uncompressed
    point of that scalar without its 0x04 prefix. Child keys at
    (index, for_change) offset the master scalar by a double SHA-256 of
    "<index>:<change>:" followed by the MPK bytes, so the public side
    of the tree can be derived from the MPK alone.
*/

use crate::{
    hash,
    key::{PrivKey, PubKey},
    util::{decode_02x_checked, encode_02x, try_into}
};

#[derive(Debug, PartialEq)]
pub enum ElectrumError {
    BadSeed(),
    BadMpk(),
    BadArithmatic()
}

#[derive(Debug, Clone, Copy)]
pub struct ElectrumMaster {
    stretched: PrivKey,
    mpk: [u8; 64]
}

//The derivation offset for a child slot: sha256d("<i>:<change>:" || mpk)
fn child_offset(mpk: &[u8; 64], index: u32, for_change: bool) -> [u8; 32] {
    let mut data = format!("{}:{}:", index, if for_change { 1 } else { 0 }).into_bytes();
    data.extend_from_slice(mpk);
    hash::sha256d(&data)
}

/**
    Stretch a seed into the master scalar bytes. The seed must be a
    32 character hex string (128 bits).
*/
pub fn stretch_seed(seed: &str) -> Result<[u8; 32], ElectrumError> {
    let seed_bytes = decode_02x_checked(seed).ok_or(ElectrumError::BadSeed())?;
    if seed_bytes.len() != 16 { return Err(ElectrumError::BadSeed()) }

    //The hex string itself is the hashed material, matching the
    //historical clients.
    let ascii = seed.as_bytes();
    let mut x = ascii.to_vec();
    for _ in 0..100_000 {
        let mut next = x;
        next.extend_from_slice(ascii);
        x = hash::sha256(&next).to_vec();
    }

    Ok(try_into(x))
}

impl ElectrumMaster {
    pub fn from_seed(seed: &str) -> Result<Self, ElectrumError> {
        let stretched = PrivKey::from_slice(&stretch_seed(seed)?, false)
            .map_err(|_| ElectrumError::BadArithmatic())?;

        let uncompressed = PubKey::from_priv_key(&stretched).serialize_uncompressed();
        Ok(Self {
            stretched,
            mpk: try_into(uncompressed[1..65].to_vec())
        })
    }

    /**
        The master public key: the 64 byte uncompressed point without
        its prefix byte. This is what classic Electrum wallets exchange
        for watch-only use.
    */
    pub fn mpk(&self) -> [u8; 64] {
        self.mpk
    }

    pub fn mpk_hex(&self) -> String {
        encode_02x(&self.mpk)
    }

    /**
        Private key at the (index, for_change) slot. Electrum keys are
        uncompressed.
    */
    pub fn privkey(&self, index: u32, for_change: bool) -> Result<PrivKey, ElectrumError> {
        let offset = child_offset(&self.mpk, index, for_change);
        self.stretched
            .add_scalar(&offset)
            .map_err(|_| ElectrumError::BadArithmatic())
    }

    pub fn pubkey(&self, index: u32, for_change: bool) -> Result<PubKey, ElectrumError> {
        pubkey_from_mpk(&self.mpk, index, for_change)
    }
}

/**
    Public child derivation from the MPK alone: child = MPK + offset*G.
*/
pub fn pubkey_from_mpk(mpk: &[u8; 64], index: u32, for_change: bool) -> Result<PubKey, ElectrumError> {
    let mut uncompressed = vec![0x04];
    uncompressed.extend_from_slice(mpk);
    let master = PubKey::from_slice(&uncompressed).map_err(|_| ElectrumError::BadMpk())?;

    let offset = child_offset(mpk, index, for_change);
    master.add_exp(&offset).map_err(|_| ElectrumError::BadArithmatic())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SEED: &str = "484ccb566edb66c65dd0fd2e4d90ef65";

    #[test]
    fn stretching_is_stable() {
        let stretched = stretch_seed(TEST_SEED).unwrap();
        assert_eq!(
            encode_02x(&stretched),
            "1577cf85595de005f23860bb0a097a4dc6b623df09d4d0b88b2c3b77519cf07e"
        );
    }

    #[test]
    fn seed_must_be_128_bits() {
        assert_eq!(stretch_seed("484ccb56"), Err(ElectrumError::BadSeed()));
        assert_eq!(stretch_seed("not hex at all, not at all.."), Err(ElectrumError::BadSeed()));
    }

    #[test]
    fn known_child_key() {
        let master = ElectrumMaster::from_seed(TEST_SEED).unwrap();
        assert_eq!(
            master.mpk_hex(),
            "484e42865b8e9a6ea8262fd1cde666b557393258ed598d842e563ad9e5e6c70a\
             97e387eefdef123c1b8b4eb21fe210c6216ad7cc1e4186fbbba70f0e2c062c25"
        );

        let child = master.privkey(0, false).unwrap();
        assert_eq!(child.hex(), "593240c2205e7b7b5d7c13393b7c9553497854b75c7470b76aeca50cd4a894d7");
        assert!(!child.compressed);
    }

    #[test]
    fn public_derivation_matches_private() {
        let master = ElectrumMaster::from_seed(TEST_SEED).unwrap();
        for (i, change) in [(0u32, false), (0, true), (5, false), (73, true)].iter() {
            let from_priv = PubKey::from_priv_key(&master.privkey(*i, *change).unwrap());
            let from_mpk = pubkey_from_mpk(&master.mpk(), *i, *change).unwrap();
            assert_eq!(from_priv.hex(), from_mpk.hex());
        }
    }
}
