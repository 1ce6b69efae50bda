/*
    Signature hash construction.

    Three schemes live here. The legacy scheme rewrites a copy of the
    transaction (blank every script, place the subscript at the signed
    input, apply the masking rules) and hashes its serialization. The
    BIP-143 scheme hashes a fixed size preimage built from precomputed
    midstates, which is also what Bitcoin Cash signs for every input
    with the fork id folded into the appended hash type.
*/

use crate::{
    encoding::varint,
    hash,
    tx::{sign::SignError, Tx}
};

pub const SIGHASH_ALL: u32 = 0x01;
pub const SIGHASH_NONE: u32 = 0x02;
pub const SIGHASH_SINGLE: u32 = 0x03;
pub const SIGHASH_FORKID: u32 = 0x40;
pub const SIGHASH_ANYONECANPAY: u32 = 0x80;

/**
    The pre-segwit sighash. The subscript is the prevout script pubkey
    for P2PKH inputs and the redeem script for P2SH inputs.
*/
pub fn legacy_sighash(tx: &Tx, index: usize, subscript: &[u8], hashcode: u32) -> Result<[u8; 32], SignError> {
    if index >= tx.ins.len() { return Err(SignError::InputOutOfRange(index)) }

    let mut t = tx.clone();
    for input in t.ins.iter_mut() {
        input.script_sig.clear();
        input.witness.clear();
    }
    t.ins[index].script_sig = subscript.to_vec();

    match hashcode & 0x1f {
        SIGHASH_NONE => {
            t.outs.clear();
            for (j, input) in t.ins.iter_mut().enumerate() {
                if j != index { input.sequence = 0; }
            }
        },
        SIGHASH_SINGLE => {
            if index >= t.outs.len() { return Err(SignError::InputOutOfRange(index)) }
            t.outs.truncate(index + 1);
            for output in t.outs[..index].iter_mut() {
                output.value = -1;
                output.script_pubkey.clear();
            }
            for (j, input) in t.ins.iter_mut().enumerate() {
                if j != index { input.sequence = 0; }
            }
        },
        _ => { }
    }

    if hashcode & SIGHASH_ANYONECANPAY != 0 {
        let signed = t.ins.swap_remove(index);
        t.ins = vec![signed];
    }

    let mut preimage = t.serialize_legacy();
    preimage.extend_from_slice(&hashcode.to_le_bytes());

    Ok(hash::sha256d(&preimage))
}

/**
    The BIP-143 sighash. The script code for P2WPKH is the synthesized
    P2PKH script of the witness public key, and the prevout amount is
    committed to the preimage. The full 32 bit hashcode is appended,
    which is where the fork id travels for the Bitcoin Cash scheme.
*/
pub fn witness_sighash(tx: &Tx, index: usize, script_code: &[u8], value: u64, hashcode: u32) -> Result<[u8; 32], SignError> {
    if index >= tx.ins.len() { return Err(SignError::InputOutOfRange(index)) }

    let base = hashcode & 0x1f;
    let anyone_can_pay = hashcode & SIGHASH_ANYONECANPAY != 0;

    let hash_prevouts: [u8; 32] = if anyone_can_pay {
        [0; 32]
    } else {
        let mut buf = Vec::with_capacity(36 * tx.ins.len());
        for input in &tx.ins {
            buf.extend_from_slice(&input.outpoint.hash);
            buf.extend_from_slice(&input.outpoint.index.to_le_bytes());
        }
        hash::sha256d(&buf)
    };

    let hash_sequence: [u8; 32] = if anyone_can_pay || base == SIGHASH_NONE || base == SIGHASH_SINGLE {
        [0; 32]
    } else {
        let mut buf = Vec::with_capacity(4 * tx.ins.len());
        for input in &tx.ins {
            buf.extend_from_slice(&input.sequence.to_le_bytes());
        }
        hash::sha256d(&buf)
    };

    let hash_outputs: [u8; 32] = if base != SIGHASH_NONE && base != SIGHASH_SINGLE {
        let mut buf = Vec::new();
        tx.write_outputs(&mut buf);
        hash::sha256d(&buf)
    } else if base == SIGHASH_SINGLE && index < tx.outs.len() {
        let mut buf = Vec::new();
        Tx::write_output(&mut buf, &tx.outs[index]);
        hash::sha256d(&buf)
    } else {
        [0; 32]
    };

    let input = &tx.ins[index];
    let mut preimage = Vec::new();
    preimage.extend_from_slice(&tx.version.to_le_bytes());
    preimage.extend_from_slice(&hash_prevouts);
    preimage.extend_from_slice(&hash_sequence);
    preimage.extend_from_slice(&input.outpoint.hash);
    preimage.extend_from_slice(&input.outpoint.index.to_le_bytes());
    varint::write_varint(&mut preimage, script_code.len() as u64);
    preimage.extend_from_slice(script_code);
    preimage.extend_from_slice(&value.to_le_bytes());
    preimage.extend_from_slice(&input.sequence.to_le_bytes());
    preimage.extend_from_slice(&hash_outputs);
    preimage.extend_from_slice(&tx.locktime.to_le_bytes());
    preimage.extend_from_slice(&hashcode.to_le_bytes());

    Ok(hash::sha256d(&preimage))
}

/**
    Combine a hashcode with a coin's fork id into the 32 bit value the
    fork-id scheme appends to the preimage.
*/
pub fn fork_hashcode(hashcode: u32, fork_id: u32) -> u32 {
    (hashcode | SIGHASH_FORKID) | (fork_id << 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        tx::{Outpoint, TxInput, TxOutput},
        util::{decode_02x, encode_02x}
    };

    //The BIP-143 native P2WPKH example transaction.
    fn bip143_example() -> Tx {
        let mut in0 = TxInput::new(
            Outpoint::new("9f96ade4b41d5433f4eda31e1738ec2b36f6e7d1420d94a6af99801a88f7f7ff", 0).unwrap()
        );
        in0.sequence = 0xffffffee;
        let mut in1 = TxInput::new(
            Outpoint::new("8ac60eb9575db5b2d987e29f301b5b819ea83a5c6579d282d189cc04b8e151ef", 1).unwrap()
        );
        in1.sequence = 0xffffffff;

        let out0 = TxOutput::new(
            112_340_000,
            decode_02x("76a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac")
        );
        let out1 = TxOutput::new(
            223_450_000,
            decode_02x("76a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac")
        );

        let mut tx = Tx::new(vec![in0, in1], vec![out0, out1]);
        tx.locktime = 17;
        tx
    }

    #[test]
    fn bip143_reference_digest() {
        let tx = bip143_example();
        let script_code = decode_02x("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac");

        let digest = witness_sighash(&tx, 1, &script_code, 600_000_000, SIGHASH_ALL).unwrap();
        assert_eq!(
            encode_02x(&digest),
            "c37af31116d1b27caf68aae9e3ac82f1477929014d5b917657d0eb49478cb670"
        );
    }

    #[test]
    fn masked_midstates_zero_out() {
        let tx = bip143_example();
        let script_code = decode_02x("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac");

        let all = witness_sighash(&tx, 1, &script_code, 600_000_000, SIGHASH_ALL).unwrap();
        let none = witness_sighash(&tx, 1, &script_code, 600_000_000, SIGHASH_NONE).unwrap();
        let acp = witness_sighash(&tx, 1, &script_code, 600_000_000, SIGHASH_ALL | SIGHASH_ANYONECANPAY).unwrap();

        assert_ne!(all, none);
        assert_ne!(all, acp);
        assert_ne!(none, acp);
    }

    #[test]
    fn fork_id_lands_in_the_high_bytes() {
        assert_eq!(fork_hashcode(SIGHASH_ALL, 0x000000), 0x41);
        assert_eq!(fork_hashcode(SIGHASH_ALL, 0xdead), 0xdead41);

        let tx = bip143_example();
        let script_code = decode_02x("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac");
        let plain = witness_sighash(&tx, 1, &script_code, 600_000_000, SIGHASH_ALL).unwrap();
        let forked = witness_sighash(&tx, 1, &script_code, 600_000_000, fork_hashcode(SIGHASH_ALL, 0)).unwrap();
        assert_ne!(plain, forked);
    }

    #[test]
    fn legacy_sighash_masking() {
        let tx = bip143_example();
        let subscript = decode_02x("76a9141d0f172a0ecb48aee1be1f2687d2963ae33f71a188ac");

        let all = legacy_sighash(&tx, 0, &subscript, SIGHASH_ALL).unwrap();
        let single = legacy_sighash(&tx, 0, &subscript, SIGHASH_SINGLE).unwrap();
        let acp = legacy_sighash(&tx, 0, &subscript, SIGHASH_ALL | SIGHASH_ANYONECANPAY).unwrap();
        assert_ne!(all, single);
        assert_ne!(all, acp);

        //Signing input one must not depend on input zero's script sig
        let mut signed = tx.clone();
        signed.ins[0].script_sig = vec![0xde, 0xad];
        assert_eq!(
            legacy_sighash(&signed, 1, &subscript, SIGHASH_ALL).unwrap(),
            legacy_sighash(&tx, 1, &subscript, SIGHASH_ALL).unwrap()
        );
    }

    #[test]
    fn out_of_range_errors() {
        let tx = bip143_example();
        let subscript = [0u8; 1];

        assert_eq!(
            legacy_sighash(&tx, 9, &subscript, SIGHASH_ALL),
            Err(SignError::InputOutOfRange(9))
        );
        assert_eq!(
            witness_sighash(&tx, 9, &subscript, 0, SIGHASH_ALL),
            Err(SignError::InputOutOfRange(9))
        );
    }
}
