/*
    Signing engine.

    Computes the digest for an input, signs it and installs the result
    either in the script sig or the witness stack, depending on what
    kind of prevout the input spends. Coins that carry a fork id
    (Bitcoin Cash) sign the BIP-143 style digest for every input, with
    the fork id folded into the appended hashcode.

    Signing never mutates its argument. It returns a new transaction,
    and re-signing an input that already carries a signature returns
    the transaction unchanged.
*/

use crate::{
    key::{PrivKey, PubKey},
    script::{Builder, Script},
    tx::{
        sighash::{fork_hashcode, legacy_sighash, witness_sighash, SIGHASH_FORKID},
        Tx
    }
};

#[derive(Debug, PartialEq)]
pub enum SignError {
    InputOutOfRange(usize),
    MissingAmount(usize),
    MultisigInput(usize),
    ValueOverflow { inputs: u64, outputs: u64 },
    KeyNotInRedeemScript(String),
    BadRedeemScript(),
    TooFewSignatures()
}

/**
    What kind of prevout an input spends, carrying exactly what the
    signer needs to assemble the right scripts.
*/
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Pay to pubkey hash. The signature goes into the script sig.
    P2pkh,
    /// Native segwit v0 pubkey hash. The signature goes into the witness.
    P2wpkh,
    /// Segwit v0 pubkey hash nested in P2SH. Witness signature plus the
    /// pushed redeem script in the script sig.
    P2wpkhNested,
    /// Script hash multisig. Signed with multisign/apply_multisignatures.
    P2shMultisig
}

impl InputKind {
    pub fn is_segwit(&self) -> bool {
        matches!(self, InputKind::P2wpkh | InputKind::P2wpkhNested)
    }
}

//DER signature followed by the hashcode byte as it appears on the wire.
fn sig_blob(key: &PrivKey, digest: &[u8; 32], hashcode_byte: u8) -> Vec<u8> {
    let mut blob = key.sign(digest);
    blob.push(hashcode_byte);
    blob
}

/**
    Sign input `index` of the transaction with the given key and
    hashcode. `fork_id` is the coin's replay protection id; None for
    coins without one.
*/
pub fn sign(tx: &Tx, index: usize, key: &PrivKey, hashcode: u32, fork_id: Option<u32>) -> Result<Tx, SignError> {
    if index >= tx.ins.len() { return Err(SignError::InputOutOfRange(index)) }

    //Re-signing a signed input is a no-op.
    if tx.ins[index].is_signed() { return Ok(tx.clone()) }

    //Underflow is only detectable when every prevout amount is known.
    if tx.ins.iter().all(|i| i.value.is_some()) {
        let inputs: u64 = tx.ins.iter().map(|i| i.value.unwrap_or(0)).sum();
        let outputs: u64 = tx.outs.iter().map(|o| o.value.max(0) as u64).sum();
        if outputs > inputs {
            return Err(SignError::ValueOverflow { inputs, outputs });
        }
    }

    let pubkey = PubKey::from_priv_key(key);
    let mut out = tx.clone();

    match tx.ins[index].kind {
        InputKind::P2pkh => {
            let subscript = Script::p2pkh(&pubkey.hash160());

            let (digest, wire_byte) = match fork_id {
                Some(id) => {
                    //Fork-id coins sign the witness style digest for
                    //every input, so the prevout amount is required.
                    let value = tx.ins[index].value.ok_or(SignError::MissingAmount(index))?;
                    let digest = witness_sighash(tx, index, subscript.as_bytes(), value, fork_hashcode(hashcode, id))?;
                    (digest, (hashcode | SIGHASH_FORKID) as u8)
                },
                None => {
                    let digest = legacy_sighash(tx, index, subscript.as_bytes(), hashcode)?;
                    (digest, hashcode as u8)
                }
            };

            out.ins[index].script_sig = Builder::new()
                .push_slice(&sig_blob(key, &digest, wire_byte))
                .push_slice(&pubkey.as_bytes())
                .into_script()
                .code;
        },

        InputKind::P2wpkh | InputKind::P2wpkhNested => {
            let value = tx.ins[index].value.ok_or(SignError::MissingAmount(index))?;

            //Witness programs commit to the compressed key, whatever
            //the key's own hint says.
            let witness_key = pubkey.compress();
            let script_code = Script::p2pkh(&witness_key.hash160());

            let hashcode = match fork_id {
                Some(id) => fork_hashcode(hashcode, id),
                None => hashcode
            };
            let digest = witness_sighash(tx, index, script_code.as_bytes(), value, hashcode)?;

            out.ins[index].witness = vec![
                sig_blob(key, &digest, hashcode as u8),
                witness_key.serialize_compressed().to_vec()
            ];
            if tx.ins[index].kind == InputKind::P2wpkhNested {
                let redeem = Script::p2wpkh_redeem(&witness_key);
                out.ins[index].script_sig = Builder::new().push_slice(redeem.as_bytes()).into_script().code;
            }
        },

        InputKind::P2shMultisig => return Err(SignError::MultisigInput(index))
    }

    Ok(out)
}

/**
    Sign every input in index order. Equivalent to calling sign once
    per input.
*/
pub fn signall(tx: &Tx, key: &PrivKey, hashcode: u32, fork_id: Option<u32>) -> Result<Tx, SignError> {
    let mut out = tx.clone();
    for index in 0..out.ins.len() {
        out = sign(&out, index, key, hashcode, fork_id)?;
    }
    Ok(out)
}

/**
    Produce one signature blob for a multisig input. The redeem script
    is the subscript of the digest. The blob is handed to
    apply_multisignatures once enough cosigners have signed.
*/
pub fn multisign(tx: &Tx, index: usize, redeem: &Script, key: &PrivKey, hashcode: u32, fork_id: Option<u32>) -> Result<Vec<u8>, SignError> {
    if index >= tx.ins.len() { return Err(SignError::InputOutOfRange(index)) }

    let (digest, wire_byte) = match fork_id {
        Some(id) => {
            let value = tx.ins[index].value.ok_or(SignError::MissingAmount(index))?;
            let digest = witness_sighash(tx, index, redeem.as_bytes(), value, fork_hashcode(hashcode, id))?;
            (digest, (hashcode | SIGHASH_FORKID) as u8)
        },
        None => (legacy_sighash(tx, index, redeem.as_bytes(), hashcode)?, hashcode as u8)
    };

    Ok(sig_blob(key, &digest, wire_byte))
}

/**
    Build the final multisig script sig from collected signatures.

    Signatures are installed in the slot order of the redeem script's
    public keys, regardless of the order they were collected in. Each
    signature identifies its slot by the public key it came with; a
    key that is not part of the redeem script is an error.
*/
pub fn apply_multisignatures(tx: &Tx, index: usize, redeem: &Script, sigs: &[(PubKey, Vec<u8>)]) -> Result<Tx, SignError> {
    if index >= tx.ins.len() { return Err(SignError::InputOutOfRange(index)) }
    if sigs.is_empty() { return Err(SignError::TooFewSignatures()) }

    let (_, slot_keys) = redeem.multisig_parts().map_err(|_| SignError::BadRedeemScript())?;

    //Slot index for every collected signature
    let mut ordered: Vec<(usize, &Vec<u8>)> = Vec::with_capacity(sigs.len());
    for (key, sig) in sigs {
        let slot = slot_keys
            .iter()
            .position(|k| k.as_bytes() == key.as_bytes())
            .ok_or_else(|| SignError::KeyNotInRedeemScript(key.hex()))?;
        ordered.push((slot, sig));
    }
    ordered.sort_by_key(|(slot, _)| *slot);

    //OP_0 dummy for the CHECKMULTISIG off-by-one, then the signatures,
    //then the redeem script itself.
    let mut builder = Builder::new().push_opcode(crate::script::opcodes::OP_0);
    for (_, sig) in &ordered {
        builder = builder.push_slice(sig);
    }
    builder = builder.push_slice(redeem.as_bytes());

    let mut out = tx.clone();
    out.ins[index].script_sig = builder.into_script().code;
    out.ins[index].witness.clear();

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        tx::{Outpoint, TxInput, TxOutput, SIGHASH_ALL},
        util::decode_02x
    };

    const PRIV_HEX: &str = "89d8d898b95addf569b458fbbd25620e9c9b19c9f730d5d60102abbabcb72678";

    fn test_key() -> PrivKey {
        PrivKey::from_hex(PRIV_HEX).unwrap()
    }

    fn two_input_tx(kind: InputKind, value: Option<u64>) -> Tx {
        let mut in0 = TxInput::new(Outpoint::new(&"11".repeat(32), 0).unwrap());
        let mut in1 = TxInput::new(Outpoint::new(&"22".repeat(32), 1).unwrap());
        in0.kind = kind;
        in1.kind = kind;
        in0.value = value;
        in1.value = value;

        let pubkey_hash = PubKey::from_priv_key(&test_key()).hash160();
        let out = TxOutput::new(180_000_000, Script::p2pkh(&pubkey_hash).code);

        Tx::new(vec![in0, in1], vec![out])
    }

    #[test]
    fn p2pkh_signing_installs_sig_and_pubkey() {
        let key = test_key();
        let tx = two_input_tx(InputKind::P2pkh, None);

        let signed = sign(&tx, 0, &key, SIGHASH_ALL, None).unwrap();
        assert!(signed.ins[0].is_signed());
        assert!(!signed.ins[1].is_signed());
        assert!(signed.ins[0].witness.is_empty());

        //script sig is <sig blob> <pubkey>, both as plain pushes
        let script = &signed.ins[0].script_sig;
        let sig_len = script[0] as usize;
        assert_eq!(script[sig_len], SIGHASH_ALL as u8); //blob ends with the hashcode byte
        assert_eq!(script[1 + sig_len] as usize, 65); //uncompressed pubkey push
        assert_eq!(
            &script[2 + sig_len..],
            &PubKey::from_priv_key(&key).as_bytes()[..]
        );

        //the embedded signature verifies against the original digest
        let subscript = Script::p2pkh(&PubKey::from_priv_key(&key).hash160());
        let digest = legacy_sighash(&tx, 0, subscript.as_bytes(), SIGHASH_ALL).unwrap();
        let der = &script[1..sig_len]; //blob without the hashcode byte
        assert!(PubKey::from_priv_key(&key).verify(&digest, der, true).unwrap());
    }

    #[test]
    fn signing_is_deterministic_and_idempotent() {
        let key = test_key();
        let tx = two_input_tx(InputKind::P2pkh, None);

        let once = signall(&tx, &key, SIGHASH_ALL, None).unwrap();
        let twice = signall(&tx, &key, SIGHASH_ALL, None).unwrap();
        assert_eq!(once.hex(), twice.hex());

        //Re-signing a fully signed transaction changes nothing
        let again = sign(&once, 0, &key, SIGHASH_ALL, None).unwrap();
        assert_eq!(again.hex(), once.hex());

        //signall equals sequential sign calls
        let sequential = sign(&sign(&tx, 0, &key, SIGHASH_ALL, None).unwrap(), 1, &key, SIGHASH_ALL, None).unwrap();
        assert_eq!(sequential.hex(), once.hex());
    }

    #[test]
    fn p2wpkh_signing_builds_witness() {
        let key = test_key();
        let tx = two_input_tx(InputKind::P2wpkh, Some(90_000_000));

        let signed = sign(&tx, 0, &key, SIGHASH_ALL, None).unwrap();
        let witness = &signed.ins[0].witness;

        assert_eq!(witness.len(), 2);
        assert_eq!(*witness[0].last().unwrap(), SIGHASH_ALL as u8);
        //second element is always the compressed pubkey
        assert_eq!(
            witness[1],
            decode_02x("031f763d81010db8ba3026fef4ac3dc1ad7ccc2543148041c61a29e883ee4499dc")
        );
        //native segwit leaves the script sig empty
        assert!(signed.ins[0].script_sig.is_empty());
        //and the transaction now serializes with marker and flag
        assert_eq!(&signed.serialize()[4..6], &[0x00, 0x01]);
    }

    #[test]
    fn nested_p2wpkh_pushes_the_redeem_script() {
        let key = test_key();
        let tx = two_input_tx(InputKind::P2wpkhNested, Some(90_000_000));

        let signed = sign(&tx, 0, &key, SIGHASH_ALL, None).unwrap();
        assert_eq!(signed.ins[0].witness.len(), 2);

        //script sig is one push of the 22 byte witness program
        let script = &signed.ins[0].script_sig;
        assert_eq!(script.len(), 23);
        assert_eq!(script[0], 22);
        assert_eq!(script[1], 0x00);
        assert_eq!(script[2], 0x14);
    }

    #[test]
    fn segwit_input_requires_the_amount() {
        let key = test_key();
        let tx = two_input_tx(InputKind::P2wpkh, None);

        assert_eq!(
            sign(&tx, 0, &key, SIGHASH_ALL, None),
            Err(SignError::MissingAmount(0))
        );
    }

    #[test]
    fn fork_id_signing_uses_the_witness_digest() {
        let key = test_key();

        //Fork-id inputs need the prevout amount even when legacy shaped
        let without_amount = two_input_tx(InputKind::P2pkh, None);
        assert_eq!(
            sign(&without_amount, 0, &key, SIGHASH_ALL, Some(0)),
            Err(SignError::MissingAmount(0))
        );

        let tx = two_input_tx(InputKind::P2pkh, Some(90_000_000));
        let signed = sign(&tx, 0, &key, SIGHASH_ALL, Some(0)).unwrap();

        //wire hashcode byte carries the fork id bit
        let script = &signed.ins[0].script_sig;
        let sig_len = script[0] as usize;
        assert_eq!(script[sig_len], (SIGHASH_ALL | SIGHASH_FORKID) as u8);
        //no witness is involved
        assert!(signed.ins[0].witness.is_empty());
    }

    #[test]
    fn spending_more_than_the_inputs_hold() {
        let key = test_key();

        //Two 10M inputs cannot fund a 180M output
        let tx = two_input_tx(InputKind::P2wpkh, Some(10_000_000));
        assert_eq!(
            sign(&tx, 0, &key, SIGHASH_ALL, None),
            Err(SignError::ValueOverflow { inputs: 20_000_000, outputs: 180_000_000 })
        );

        //With any amount unknown the check cannot run
        let mut partial = two_input_tx(InputKind::P2pkh, Some(10_000_000));
        partial.ins[1].value = None;
        assert!(sign(&partial, 0, &key, SIGHASH_ALL, None).is_ok());
    }

    #[test]
    fn multisig_order_follows_the_redeem_script() {
        let keys: Vec<PrivKey> = [0x11u8, 0x22, 0x33]
            .iter()
            .map(|b| {
                let mut bytes = [*b; 32];
                bytes[0] = 0x01;
                PrivKey::from_slice(&bytes, true).unwrap()
            })
            .collect();
        let pubkeys: Vec<PubKey> = keys.iter().map(PubKey::from_priv_key).collect();
        let redeem = Script::multisig(2, &pubkeys).unwrap();

        let mut input = TxInput::new(Outpoint::new(&"33".repeat(32), 0).unwrap());
        input.kind = InputKind::P2shMultisig;
        let out = TxOutput::new(1_000_000, Script::p2sh(&redeem.hash()).code);
        let tx = Tx::new(vec![input], vec![out]);

        //plain sign refuses multisig inputs
        assert_eq!(
            sign(&tx, 0, &keys[0], SIGHASH_ALL, None),
            Err(SignError::MultisigInput(0))
        );

        let sig0 = multisign(&tx, 0, &redeem, &keys[0], SIGHASH_ALL, None).unwrap();
        let sig2 = multisign(&tx, 0, &redeem, &keys[2], SIGHASH_ALL, None).unwrap();

        //collect out of order, install in redeem order
        let final_tx = apply_multisignatures(
            &tx, 0, &redeem,
            &[(pubkeys[2], sig2.clone()), (pubkeys[0], sig0.clone())]
        ).unwrap();

        let script = &final_tx.ins[0].script_sig;
        assert_eq!(script[0], 0x00); //OP_0 dummy
        let first_len = script[1] as usize;
        assert_eq!(&script[2..2 + first_len], &sig0[..]);

        //an outsider key has no slot
        let outsider = PubKey::from_priv_key(&test_key());
        assert!(matches!(
            apply_multisignatures(&tx, 0, &redeem, &[(outsider, sig0)]),
            Err(SignError::KeyNotInRedeemScript(_))
        ));
    }
}
