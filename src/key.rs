use crate::{
    Message, OsRng, PublicKey, RecoverableSignature, RecoveryId, Secp256k1, SecretKey, Signature,
    encoding::base58::Base58,
    hash,
    util::{decode_02x_checked, encode_02x, try_into}
};

#[derive(Debug, PartialEq)]
pub enum KeyError {
    BadSlice(),
    BadArithmatic(),
    BadWif(),
    BadWifNetwork(u8),
    BadString(),
    BadSignature()
}

/**
    A secp256k1 private key together with its compression hint.

    The hint comes from where the key was parsed from (raw hex is
    uncompressed, WIF with the trailing 0x01 byte is compressed) and
    decides how the derived public key serializes. That in turn changes
    addresses and signatures, so the hint travels with the key.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrivKey {
    key: SecretKey,
    pub compressed: bool
}

impl PrivKey {

    /**
        Generates a random private key from OS entropy.
    */
    pub fn new_rand() -> Self {
        let mut rng = OsRng::new().expect("OsRng");
        Self {
            key: SecretKey::new(&mut rng),
            compressed: true
        }
    }

    /**
        Use a predefined byte array as a secret key.
    */
    pub fn from_slice(byte_array: &[u8], compressed: bool) -> Result<Self, KeyError> {
        match SecretKey::from_slice(byte_array) {
            Ok(key) => Ok(Self { key, compressed }),
            Err(_) => Err(KeyError::BadSlice())
        }
    }

    /**
        Parse a private key from a hex string.

        64 digits is a raw scalar and derives an uncompressed public key.
        66 digits with a trailing "01" marks the key as compressed, the
        same convention WIF uses.
    */
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let bytes = decode_02x_checked(hex).ok_or(KeyError::BadString())?;
        match bytes.len() {
            32 => Self::from_slice(&bytes, false),
            33 if bytes[32] == 0x01 => Self::from_slice(&bytes[..32], true),
            _ => Err(KeyError::BadString())
        }
    }

    /**
        Import a private key from wallet import format.
        The prefix byte is the coin's WIF version and must match.
    */
    pub fn from_wif(wif: &str, wif_prefix: u8) -> Result<Self, KeyError> {
        let bytes = Base58::check_decode(wif).map_err(|_| KeyError::BadWif())?;

        //prefix | 32 key bytes | optional 0x01 compression marker
        let compressed = match bytes.len() {
            33 => false,
            34 if bytes[33] == 0x01 => true,
            _ => return Err(KeyError::BadWif())
        };
        if bytes[0] != wif_prefix { return Err(KeyError::BadWifNetwork(bytes[0])) }

        Self::from_slice(&bytes[1..33], compressed)
    }

    /**
        Export self as wallet import format under the given prefix.
    */
    pub fn to_wif(&self, wif_prefix: u8) -> String {
        let mut payload = self.as_bytes().to_vec();
        if self.compressed { payload.push(0x01); }

        Base58::new(&[wif_prefix], &payload).check_encode()
    }

    pub fn as_bytes(&self) -> [u8; 32] {
        try_into(self.key[..].to_vec())
    }

    pub fn hex(&self) -> String {
        encode_02x(&self.as_bytes())
    }

    /**
        Returns self with the scalar tweak added mod n. Used by BIP-32 and
        Electrum child derivation. Fails if the result is zero or not less
        than the curve order.
    */
    pub fn add_scalar(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let mut key = self.key.clone();
        key.add_assign(&tweak[..]).map_err(|_| KeyError::BadArithmatic())?;
        Ok(Self { key, compressed: self.compressed })
    }

    /**
        Sign a 32 byte message digest. The nonce is derived with RFC 6979
        so signing is deterministic, and s is always the low value.
        Returns the DER encoding of (r, s).
    */
    pub fn sign(&self, digest: &[u8; 32]) -> Vec<u8> {
        let secp = Secp256k1::new();
        let msg = Message::from_slice(digest).expect("digest is 32 bytes");
        secp.sign(&msg, &self.key).serialize_der().to_vec()
    }

    pub(crate) fn secret_key(&self) -> &SecretKey {
        &self.key
    }
}

/**
    A point on secp256k1, carrying the compression hint of the key it
    was derived from. Points are validated on parse.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PubKey {
    key: PublicKey,
    pub compressed: bool
}

impl PubKey {

    /**
        Finds the public key from a secret key.

        Is the result of static point G on the secp256k1 curve multiplied
        k times, where k is the private key.
    */
    pub fn from_priv_key(k: &PrivKey) -> Self {
        Self {
            key: PublicKey::from_secret_key(&Secp256k1::new(), k.secret_key()),
            compressed: k.compressed
        }
    }

    /**
        Use a predefined byte array as a public key.
        Accepts the 33 byte compressed and 65 byte uncompressed encodings
        and keeps the encoding as the hint.
    */
    pub fn from_slice(byte_array: &[u8]) -> Result<Self, KeyError> {
        let key = PublicKey::from_slice(byte_array).map_err(|_| KeyError::BadSlice())?;
        Ok(Self { key, compressed: byte_array.len() == 33 })
    }

    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let bytes = decode_02x_checked(hex).ok_or(KeyError::BadString())?;
        Self::from_slice(&bytes)
    }

    /**
        Serialize with the key's own compression hint.
    */
    pub fn as_bytes(&self) -> Vec<u8> {
        if self.compressed {
            self.key.serialize().to_vec()
        } else {
            self.key.serialize_uncompressed().to_vec()
        }
    }

    pub fn serialize_compressed(&self) -> [u8; 33] {
        self.key.serialize()
    }

    pub fn serialize_uncompressed(&self) -> [u8; 65] {
        self.key.serialize_uncompressed()
    }

    /**
        Returns self with the compressed hint set. Witness programs always
        commit to the compressed encoding regardless of key origin.
    */
    pub fn compress(&self) -> Self {
        Self { key: self.key, compressed: true }
    }

    pub fn hash160(&self) -> [u8; 20] {
        hash::hash160(&self.as_bytes())
    }

    pub fn hex(&self) -> String {
        encode_02x(&self.as_bytes())
    }

    /**
        Returns self plus tweak times the generator. The public half of
        PrivKey::add_scalar.
    */
    pub fn add_exp(&self, tweak: &[u8; 32]) -> Result<Self, KeyError> {
        let secp = Secp256k1::new();
        let mut key = self.key.clone();
        key.add_exp_assign(&secp, &tweak[..]).map_err(|_| KeyError::BadArithmatic())?;
        Ok(Self { key, compressed: self.compressed })
    }

    /**
        Verify a DER encoded signature over a 32 byte digest. When
        strict_low_s is not requested, high-s signatures are normalized
        before verification and accepted.
    */
    pub fn verify(&self, digest: &[u8; 32], der_sig: &[u8], strict_low_s: bool) -> Result<bool, KeyError> {
        let secp = Secp256k1::new();
        let msg = Message::from_slice(digest).expect("digest is 32 bytes");
        let mut sig = Signature::from_der(der_sig).map_err(|_| KeyError::BadSignature())?;
        if !strict_low_s {
            sig.normalize_s();
        }

        Ok(secp.verify(&msg, &sig, &self.key).is_ok())
    }
}

/**
    Reconstruct the public key that made a signature, given the compact
    64 byte (r, s) form, the recovery id and the signed digest.
*/
pub fn recover(digest: &[u8; 32], compact_sig: &[u8; 64], recid: u8) -> Result<PubKey, KeyError> {
    let secp = Secp256k1::new();
    let msg = Message::from_slice(digest).expect("digest is 32 bytes");
    let id = RecoveryId::from_i32(recid as i32).map_err(|_| KeyError::BadSignature())?;
    let sig = RecoverableSignature::from_compact(compact_sig, id).map_err(|_| KeyError::BadSignature())?;
    let key = secp.recover(&msg, &sig).map_err(|_| KeyError::BadSignature())?;

    Ok(PubKey { key, compressed: true })
}

/**
    Sign a digest recoverably and return the compact signature with its
    recovery id.
*/
pub fn sign_recoverable(digest: &[u8; 32], key: &PrivKey) -> ([u8; 64], u8) {
    let secp = Secp256k1::new();
    let msg = Message::from_slice(digest).expect("digest is 32 bytes");
    let (id, compact) = secp.sign_recoverable(&msg, key.secret_key()).serialize_compact();

    (compact, id.to_i32() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_PRIV_HEX: &str = "89d8d898b95addf569b458fbbd25620e9c9b19c9f730d5d60102abbabcb72678";

    #[test]
    fn hex_key_is_uncompressed() {
        let key = PrivKey::from_hex(TEST_PRIV_HEX).unwrap();
        assert!(!key.compressed);

        let pubkey = PubKey::from_priv_key(&key);
        assert_eq!(pubkey.as_bytes().len(), 65);
        assert!(pubkey.hex().starts_with("041f763d81010db8ba3026"));
    }

    #[test]
    fn hex_key_with_marker_is_compressed() {
        let key = PrivKey::from_hex(&(TEST_PRIV_HEX.to_string() + "01")).unwrap();
        assert!(key.compressed);

        let pubkey = PubKey::from_priv_key(&key);
        assert_eq!(
            pubkey.hex(),
            "031f763d81010db8ba3026fef4ac3dc1ad7ccc2543148041c61a29e883ee4499dc"
        );
    }

    #[test]
    fn wif_test_vectors() {
        //Secret key of value one, both hints, mainnet prefix
        let one = PrivKey::from_slice(&{
            let mut b = [0u8; 32]; b[31] = 1; b
        }, false).unwrap();
        assert_eq!(one.to_wif(0x80), "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf");

        let one_c = PrivKey { compressed: true, ..one };
        assert_eq!(one_c.to_wif(0x80), "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn");
    }

    #[test]
    fn wif_roundtrip() {
        let key = PrivKey::from_hex(TEST_PRIV_HEX).unwrap();

        let restored = PrivKey::from_wif(&key.to_wif(0x80), 0x80).unwrap();
        assert_eq!(restored, key);
        assert!(!restored.compressed);

        //Wrong network prefix is rejected
        assert_eq!(
            PrivKey::from_wif(&key.to_wif(0x80), 0xef),
            Err(KeyError::BadWifNetwork(0x80))
        );
    }

    #[test]
    fn known_wif_imports() {
        let key = PrivKey::from_wif("cSCf8nL4YLS8Tonuz5oJy3X57V96q3tf5xtp4GD4SparkbWd9bxL", 0xef).unwrap();
        assert!(key.compressed);
        assert_eq!(key.hex(), TEST_PRIV_HEX);

        let key = PrivKey::from_wif("5JrzhXSCMTDtGiXxeJtvc4BCSS7W3B9btsEu6dRNHUQ5RHafsZy", 0x80).unwrap();
        assert!(!key.compressed);
        assert_eq!(key.hex(), TEST_PRIV_HEX);
    }

    #[test]
    fn sign_is_deterministic_and_verifies() {
        let key = PrivKey::from_hex(TEST_PRIV_HEX).unwrap();
        let digest = crate::hash::sha256(b"message");

        let sig1 = key.sign(&digest);
        let sig2 = key.sign(&digest);
        assert_eq!(sig1, sig2);

        let pubkey = PubKey::from_priv_key(&key);
        assert!(pubkey.verify(&digest, &sig1, true).unwrap());
        assert!(!pubkey.verify(&crate::hash::sha256(b"other"), &sig1, true).unwrap());
    }

    #[test]
    fn recover_finds_the_signer() {
        let key = PrivKey::from_hex(TEST_PRIV_HEX).unwrap();
        let digest = crate::hash::sha256(b"recoverable");

        let (compact, recid) = sign_recoverable(&digest, &key);
        let recovered = recover(&digest, &compact, recid).unwrap();
        assert_eq!(
            recovered.serialize_compressed().to_vec(),
            PubKey::from_priv_key(&key).serialize_compressed().to_vec()
        );
    }

    #[test]
    fn bad_slices_are_rejected() {
        assert_eq!(PrivKey::from_slice(&[0u8; 32], true), Err(KeyError::BadSlice()));
        assert!(PrivKey::from_slice(&[0xffu8; 32], true).is_err()); //above curve order
        assert_eq!(PubKey::from_slice(&[0x03; 33]), Err(KeyError::BadSlice()));
        assert_eq!(PrivKey::from_hex("zzzz"), Err(KeyError::BadString()));
        let rand_key = PrivKey::new_rand();
        assert!(rand_key.compressed);
    }
}
