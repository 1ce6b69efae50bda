/*
    Transaction model and wire codec.

    Both the legacy format and the BIP-141 layered witness format are
    supported. A transaction serializes with the witness marker and
    flag exactly when at least one of its inputs carries a witness
    stack. The txid always commits to the legacy form, the wtxid to
    the witness form.
*/

pub mod sighash;
pub mod sign;

pub use sighash::{SIGHASH_ALL, SIGHASH_ANYONECANPAY, SIGHASH_FORKID, SIGHASH_NONE, SIGHASH_SINGLE};
pub use sign::{apply_multisignatures, multisign, sign, signall, InputKind, SignError};

use crate::{
    encoding::varint,
    hash,
    util::{decode_02x_checked, encode_02x, try_into}
};

#[derive(Debug, PartialEq)]
pub enum TxError {
    UnexpectedEnd,
    BadWitnessFlag(u8),
    WitnessMissing,
    TrailingBytes(usize),
    BadHex,
    BadTxid
}

/**
    A reference to the output being spent. The hash is kept in wire
    order (little endian); txids display reversed.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outpoint {
    pub hash: [u8; 32],
    pub index: u32
}

impl Outpoint {
    /// Build from a display order txid hex string.
    pub fn new(txid: &str, index: u32) -> Result<Self, TxError> {
        let mut bytes = decode_02x_checked(txid).ok_or(TxError::BadTxid)?;
        if bytes.len() != 32 { return Err(TxError::BadTxid) }
        bytes.reverse();

        Ok(Self { hash: try_into(bytes), index })
    }

    /// The txid in display order.
    pub fn txid(&self) -> String {
        let mut bytes = self.hash;
        bytes.reverse();
        encode_02x(&bytes)
    }
}

#[derive(Debug, Clone)]
pub struct TxInput {
    pub outpoint: Outpoint,
    pub script_sig: Vec<u8>,
    pub sequence: u32,
    pub witness: Vec<Vec<u8>>,
    /// Value of the prevout in satoshis. Not part of the wire format,
    /// but required to sign witness (and fork-id) inputs.
    pub value: Option<u64>,
    /// What kind of prevout this input spends. Drives script assembly
    /// during signing. Not part of the wire format.
    pub kind: InputKind
}

impl TxInput {
    pub fn new(outpoint: Outpoint) -> Self {
        Self {
            outpoint,
            script_sig: Vec::new(),
            sequence: 0xffffffff,
            witness: Vec::new(),
            value: None,
            kind: InputKind::P2pkh
        }
    }

    pub fn with_value(outpoint: Outpoint, value: u64, kind: InputKind) -> Self {
        Self {
            value: Some(value),
            kind,
            ..Self::new(outpoint)
        }
    }

    pub fn is_signed(&self) -> bool {
        !self.script_sig.is_empty() || !self.witness.is_empty()
    }
}

//Equality is over wire data. The prevout value and input kind are
//signing state and do not survive a serialization roundtrip.
impl PartialEq for TxInput {
    fn eq(&self, other: &Self) -> bool {
        self.outpoint == other.outpoint
            && self.script_sig == other.script_sig
            && self.sequence == other.sequence
            && self.witness == other.witness
    }
}
impl Eq for TxInput { }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutput {
    pub value: i64,
    pub script_pubkey: Vec<u8>
}

impl TxOutput {
    pub fn new(value: i64, script_pubkey: Vec<u8>) -> Self {
        Self { value, script_pubkey }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tx {
    pub version: i32,
    pub ins: Vec<TxInput>,
    pub outs: Vec<TxOutput>,
    pub locktime: u32
}

impl Tx {
    pub fn new(ins: Vec<TxInput>, outs: Vec<TxOutput>) -> Self {
        Self {
            version: 1,
            ins,
            outs,
            locktime: 0
        }
    }

    pub fn has_witness(&self) -> bool {
        self.ins.iter().any(|i| !i.witness.is_empty())
    }

    fn write_inputs(&self, buf: &mut Vec<u8>) {
        varint::write_varint(buf, self.ins.len() as u64);
        for input in &self.ins {
            buf.extend_from_slice(&input.outpoint.hash);
            buf.extend_from_slice(&input.outpoint.index.to_le_bytes());
            varint::write_varint(buf, input.script_sig.len() as u64);
            buf.extend_from_slice(&input.script_sig);
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
    }

    pub(crate) fn write_outputs(&self, buf: &mut Vec<u8>) {
        varint::write_varint(buf, self.outs.len() as u64);
        for output in &self.outs {
            Self::write_output(buf, output);
        }
    }

    pub(crate) fn write_output(buf: &mut Vec<u8>, output: &TxOutput) {
        buf.extend_from_slice(&output.value.to_le_bytes());
        varint::write_varint(buf, output.script_pubkey.len() as u64);
        buf.extend_from_slice(&output.script_pubkey);
    }

    /**
        The legacy serialization. No marker, flag or witness data.
        This is the form the txid commits to.
    */
    pub fn serialize_legacy(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        self.write_inputs(&mut buf);
        self.write_outputs(&mut buf);
        buf.extend_from_slice(&self.locktime.to_le_bytes());
        buf
    }

    /**
        The wire serialization. Uses the BIP-141 layered format iff any
        input carries a witness stack.
    */
    pub fn serialize(&self) -> Vec<u8> {
        if !self.has_witness() {
            return self.serialize_legacy();
        }

        let mut buf = Vec::new();
        buf.extend_from_slice(&self.version.to_le_bytes());
        buf.push(0x00); //marker
        buf.push(0x01); //flag
        self.write_inputs(&mut buf);
        self.write_outputs(&mut buf);
        for input in &self.ins {
            varint::write_varint(&mut buf, input.witness.len() as u64);
            for item in &input.witness {
                varint::write_varint(&mut buf, item.len() as u64);
                buf.extend_from_slice(item);
            }
        }
        buf.extend_from_slice(&self.locktime.to_le_bytes());
        buf
    }

    pub fn hex(&self) -> String {
        encode_02x(&self.serialize())
    }

    pub fn deserialize(bytes: &[u8]) -> Result<Tx, TxError> {
        let mut r = Reader::new(bytes);

        let version = i32::from_le_bytes(try_into(r.take(4)?.to_vec()));

        //A zero where the input count belongs is the witness marker.
        let segwit = r.peek()? == 0x00;
        if segwit {
            r.take(1)?;
            let flag = r.take(1)?[0];
            if flag != 0x01 { return Err(TxError::BadWitnessFlag(flag)) }
        }

        let n_ins = r.varint()?;
        let mut ins = Vec::with_capacity(n_ins as usize);
        for _ in 0..n_ins {
            let hash: [u8; 32] = try_into(r.take(32)?.to_vec());
            let index = r.u32_le()?;
            let script_len = r.varint()?;
            let script_sig = r.take(script_len as usize)?.to_vec();
            let sequence = r.u32_le()?;

            let mut input = TxInput::new(Outpoint { hash, index });
            input.script_sig = script_sig;
            input.sequence = sequence;
            ins.push(input);
        }

        let n_outs = r.varint()?;
        let mut outs = Vec::with_capacity(n_outs as usize);
        for _ in 0..n_outs {
            let value = i64::from_le_bytes(try_into(r.take(8)?.to_vec()));
            let script_len = r.varint()?;
            let script_pubkey = r.take(script_len as usize)?.to_vec();
            outs.push(TxOutput { value, script_pubkey });
        }

        if segwit {
            let mut any = false;
            for input in ins.iter_mut() {
                let n_items = r.varint()?;
                let mut stack = Vec::with_capacity(n_items as usize);
                for _ in 0..n_items {
                    let len = r.varint()?;
                    stack.push(r.take(len as usize)?.to_vec());
                }
                if !stack.is_empty() {
                    any = true;
                    input.kind = InputKind::P2wpkh;
                }
                input.witness = stack;
            }
            if !any { return Err(TxError::WitnessMissing) }
        }

        let locktime = r.u32_le()?;
        if !r.done() { return Err(TxError::TrailingBytes(r.remaining())) }

        Ok(Tx { version, ins, outs, locktime })
    }

    pub fn from_hex(hex: &str) -> Result<Tx, TxError> {
        let bytes = decode_02x_checked(hex).ok_or(TxError::BadHex)?;
        Self::deserialize(&bytes)
    }

    /**
        Double sha256 of the legacy form, displayed reversed.
    */
    pub fn txid(&self) -> String {
        let mut hash = hash::sha256d(&self.serialize_legacy());
        hash.reverse();
        encode_02x(&hash)
    }

    /**
        Double sha256 of the witness form, displayed reversed. Equals
        the txid when no input has a witness.
    */
    pub fn wtxid(&self) -> String {
        let mut hash = hash::sha256d(&self.serialize());
        hash.reverse();
        encode_02x(&hash)
    }
}

//Byte cursor over the wire encoding.
struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], TxError> {
        if self.pos + n > self.bytes.len() { return Err(TxError::UnexpectedEnd) }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn peek(&self) -> Result<u8, TxError> {
        self.bytes.get(self.pos).copied().ok_or(TxError::UnexpectedEnd)
    }

    fn u32_le(&mut self) -> Result<u32, TxError> {
        Ok(u32::from_le_bytes(try_into(self.take(4)?.to_vec())))
    }

    fn varint(&mut self) -> Result<u64, TxError> {
        let (value, used) = varint::decode(&self.bytes[self.pos..])
            .map_err(|_| TxError::UnexpectedEnd)?;
        self.pos += used;
        Ok(value)
    }

    fn done(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}
