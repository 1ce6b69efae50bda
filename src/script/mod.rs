/*
    Script module.

    Covers the standard output templates this library can spend and pay
    to: P2PKH, P2SH, P2WPKH and P2WPKH nested in P2SH, plus m-of-n
    multisig redeem scripts. Anything else is classified as NonStandard.
*/

pub mod builder;

pub use builder::{Builder, Opcode, opcodes};

use crate::{
    hash,
    key::PubKey
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub code: Vec<u8>
}

#[derive(Debug, PartialEq)]
pub enum ScriptErr {
    KeyCountDoesNotMatch(),
    MaxKeyCountExceeded(),
    BadPush(usize),
    NotMultisig()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptKind {
    P2pkh,
    P2sh,
    P2wpkh,
    NonStandard
}

impl Script {
    /**
        Create a new instance of self
    */
    pub fn new(code: Vec<u8>) -> Self {
        Self { code }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.code
    }

    /**
        Hash the script with Hash160
    */
    pub fn hash(&self) -> [u8; 20] {
        hash::hash160(&self.code)
    }

    /**
        OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    */
    pub fn p2pkh(hash: &[u8; 20]) -> Self {
        Builder::new()
            .push_opcode(opcodes::OP_DUP)
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(hash)
            .push_opcode(opcodes::OP_EQUALVERIFY)
            .push_opcode(opcodes::OP_CHECKSIG)
            .into_script()
    }

    /**
        OP_HASH160 <20 bytes> OP_EQUAL
    */
    pub fn p2sh(hash: &[u8; 20]) -> Self {
        Builder::new()
            .push_opcode(opcodes::OP_HASH160)
            .push_slice(hash)
            .push_opcode(opcodes::OP_EQUAL)
            .into_script()
    }

    /**
        OP_0 <20 bytes>
    */
    pub fn p2wpkh(hash: &[u8; 20]) -> Self {
        Builder::new()
            .push_opcode(opcodes::OP_0)
            .push_slice(hash)
            .into_script()
    }

    /**
        The redeem script that nests a witness pubkey hash inside P2SH.
        Witness programs always use the compressed key encoding.
    */
    pub fn p2wpkh_redeem(key: &PubKey) -> Self {
        Self::p2wpkh(&hash::hash160(&key.serialize_compressed()))
    }

    /**
        Creates the redeem script for an m-of-n multisig wallet.
        Slot order inside the script is the order of the given keys.
    */
    pub fn multisig(m: u8, keys: &[PubKey]) -> Result<Self, ScriptErr> {
        let n = keys.len() as u8;
        if m > n { return Err(ScriptErr::KeyCountDoesNotMatch()) }
        if n > 15 { return Err(ScriptErr::MaxKeyCountExceeded()) }

        let mut b = Builder::new().push_opcode(Opcode::from(0x50 + m)); //m as OP_PUSHNUM
        for key in keys {
            b = b.push_slice(&key.as_bytes());
        }
        b = b.push_opcode(Opcode::from(0x50 + n)); //n as OP_PUSHNUM
        b = b.push_opcode(opcodes::OP_CHECKMULTISIG);

        Ok(b.into_script())
    }

    /**
        Pattern match the script pubkey against the exact byte shapes of
        the standard templates.
    */
    pub fn kind(&self) -> ScriptKind {
        let c = &self.code;
        if c.len() == 25
            && c[0] == 0x76 && c[1] == 0xa9 && c[2] == 0x14
            && c[23] == 0x88 && c[24] == 0xac
        {
            return ScriptKind::P2pkh;
        }
        if c.len() == 23 && c[0] == 0xa9 && c[1] == 0x14 && c[22] == 0x87 {
            return ScriptKind::P2sh;
        }
        if c.len() == 22 && c[0] == 0x00 && c[1] == 0x14 {
            return ScriptKind::P2wpkh;
        }

        ScriptKind::NonStandard
    }

    pub fn is_p2pkh(&self) -> bool {
        self.kind() == ScriptKind::P2pkh
    }

    pub fn is_p2sh(&self) -> bool {
        self.kind() == ScriptKind::P2sh
    }

    pub fn is_p2wpkh(&self) -> bool {
        self.kind() == ScriptKind::P2wpkh
    }

    /**
        The 20 byte payload of a standard template, if there is one.
    */
    pub fn payload(&self) -> Option<[u8; 20]> {
        let range = match self.kind() {
            ScriptKind::P2pkh => 3..23,
            ScriptKind::P2sh | ScriptKind::P2wpkh => 2..22,
            ScriptKind::NonStandard => return None
        };
        let mut out = [0u8; 20];
        out.copy_from_slice(&self.code[range]);
        Some(out)
    }

    /**
        Split the script into its plain data pushes, skipping non push
        opcodes. Used to find the pubkey slots of a redeem script.
    */
    pub fn pushes(&self) -> Result<Vec<Vec<u8>>, ScriptErr> {
        let mut pushes = Vec::new();
        let mut i = 0;
        while i < self.code.len() {
            let op = self.code[i];
            i += 1;
            if op >= 0x01 && op <= 0x4b {
                let len = op as usize;
                if i + len > self.code.len() { return Err(ScriptErr::BadPush(i - 1)) }
                pushes.push(self.code[i..i + len].to_vec());
                i += len;
            }
            //OP_PUSHDATA1/2/4 do not occur in the standard templates
        }
        Ok(pushes)
    }

    /**
        Extract (m, pubkeys) from a multisig redeem script.
    */
    pub fn multisig_parts(&self) -> Result<(u8, Vec<PubKey>), ScriptErr> {
        let c = &self.code;
        if c.len() < 3 || c[c.len() - 1] != 0xae { return Err(ScriptErr::NotMultisig()) }
        let m = c[0];
        if m < 0x51 || m > 0x5f { return Err(ScriptErr::NotMultisig()) }

        let mut keys = Vec::new();
        for push in self.pushes()? {
            if let Ok(key) = PubKey::from_slice(&push) {
                keys.push(key);
            }
        }
        if keys.is_empty() { return Err(ScriptErr::NotMultisig()) }

        Ok((m - 0x50, keys))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        key::PrivKey,
        util::{decode_02x, encode_02x}
    };

    fn test_key(fill: u8) -> PubKey {
        let mut bytes = [fill; 32];
        bytes[0] = 0x01;
        PubKey::from_priv_key(&PrivKey::from_slice(&bytes, true).unwrap())
    }

    #[test]
    fn p2pkh_template_bytes() {
        let hash: [u8; 20] = crate::util::try_into(decode_02x("751e76e8199196d454941c45d1b3a323f1433bd6"));
        let script = Script::p2pkh(&hash);

        assert_eq!(
            encode_02x(script.as_bytes()),
            "76a914751e76e8199196d454941c45d1b3a323f1433bd688ac"
        );
        assert_eq!(script.kind(), ScriptKind::P2pkh);
        assert_eq!(script.payload(), Some(hash));
    }

    #[test]
    fn p2sh_and_p2wpkh_templates() {
        let hash: [u8; 20] = [0xab; 20];

        let p2sh = Script::p2sh(&hash);
        assert_eq!(p2sh.code.len(), 23);
        assert!(p2sh.is_p2sh());
        assert_eq!(p2sh.payload(), Some(hash));

        let p2wpkh = Script::p2wpkh(&hash);
        assert_eq!(p2wpkh.code.len(), 22);
        assert!(p2wpkh.is_p2wpkh());
        assert_eq!(p2wpkh.payload(), Some(hash));
    }

    #[test]
    fn nested_redeem_commits_to_compressed_key() {
        let key = test_key(0x11);
        let redeem = Script::p2wpkh_redeem(&key);

        assert_eq!(redeem.code[0], 0x00);
        assert_eq!(redeem.code[1], 0x14);
        assert_eq!(&redeem.code[2..], &crate::hash::hash160(&key.serialize_compressed())[..]);
    }

    #[test]
    fn multisig_roundtrip() {
        let keys = vec![test_key(0x11), test_key(0x22), test_key(0x33)];
        let redeem = Script::multisig(2, &keys).unwrap();

        assert_eq!(redeem.code[0], 0x52); //OP_2
        assert_eq!(redeem.code[redeem.code.len() - 2], 0x53); //OP_3
        assert_eq!(redeem.code[redeem.code.len() - 1], 0xae); //OP_CHECKMULTISIG

        let (m, parsed) = redeem.multisig_parts().unwrap();
        assert_eq!(m, 2);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1].hex(), keys[1].hex());
    }

    #[test]
    fn multisig_rejects_bad_quorums() {
        let keys = vec![test_key(0x11), test_key(0x22)];
        assert_eq!(Script::multisig(3, &keys), Err(ScriptErr::KeyCountDoesNotMatch()));

        let many: Vec<PubKey> = (1..=16).map(|i| test_key(i as u8)).collect();
        assert_eq!(Script::multisig(2, &many), Err(ScriptErr::MaxKeyCountExceeded()));
    }

    #[test]
    fn nonstandard_scripts_classify_as_such() {
        assert_eq!(Script::new(vec![0x6a, 0x01, 0xff]).kind(), ScriptKind::NonStandard);
        assert_eq!(Script::new(vec![]).kind(), ScriptKind::NonStandard);
        assert_eq!(Script::new(vec![0x6a]).payload(), None);
    }
}
