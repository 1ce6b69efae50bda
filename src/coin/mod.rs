/*
    Coin policy records and the uniform per-coin facade.

    A CoinPolicy is a plain data record of everything that differs
    between the supported networks: address and WIF prefixes, the
    bech32 human readable part, BIP-32 version magics, the fork id of
    the Bitcoin Cash sighash scheme, the signed message prefix. The
    registry maps ticker symbols onto the ten built in policies.

    Coin binds one policy to the shared algorithms. There is no
    per-coin subclassing anywhere; a Dogecoin transaction is signed by
    the exact code that signs a Bitcoin one, reading different bytes
    out of the policy.
*/

use crate::{
    electrum::{ElectrumError, ElectrumMaster},
    encoding::{base58::Base58, bech32, varint, Base58Error, Bech32Error},
    explorer::{Explorer, HistoryItem, PushResult, TransportError, Utxo},
    hdwallet::{ExtendedKey, HDWError, Xprv, Xpub},
    key::{self, KeyError, PrivKey, PubKey},
    script::{Script, ScriptKind},
    tx::{self, InputKind, Outpoint, SignError, Tx, TxError, TxInput, TxOutput, SIGHASH_ALL},
    util::try_into
};

/// Outputs below this many satoshis are not worth creating.
pub const DUST_THRESHOLD: u64 = 546;

#[derive(Debug, Clone)]
pub struct CoinPolicy {
    pub name: &'static str,
    pub ticker: &'static str,
    pub p2pkh_prefix: u8,
    pub p2sh_prefix: u8,
    pub wif_prefix: u8,
    pub bech32_hrp: Option<&'static str>,
    pub xprv_magic: u32,
    pub xpub_magic: u32,
    /// Present on coins that sign with the replay protected fork-id
    /// scheme. The id occupies the high three bytes of the appended
    /// hashcode.
    pub fork_id: Option<u32>,
    pub message_magic: &'static str,
    pub strict_low_s: bool,
    pub testnet: bool,
    /// The name this coin goes by when talking to an explorer.
    pub explorer_code: &'static str
}

pub static BITCOIN: CoinPolicy = CoinPolicy {
    name: "Bitcoin",
    ticker: "btc",
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    wif_prefix: 0x80,
    bech32_hrp: Some("bc"),
    xprv_magic: 0x0488ade4,
    xpub_magic: 0x0488b21e,
    fork_id: None,
    message_magic: "Bitcoin Signed Message:\n",
    strict_low_s: true,
    testnet: false,
    explorer_code: "btc"
};

pub static BITCOIN_TESTNET: CoinPolicy = CoinPolicy {
    name: "Bitcoin Testnet",
    ticker: "btc",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xef,
    bech32_hrp: Some("tb"),
    xprv_magic: 0x04358394,
    xpub_magic: 0x043587cf,
    fork_id: None,
    message_magic: "Bitcoin Signed Message:\n",
    strict_low_s: true,
    testnet: true,
    explorer_code: "btc-testnet"
};

//Same base58 face as Bitcoin. What sets the fork apart is the
//mandatory fork-id sighash.
pub static BITCOIN_CASH: CoinPolicy = CoinPolicy {
    name: "Bitcoin Cash",
    ticker: "bch",
    p2pkh_prefix: 0x00,
    p2sh_prefix: 0x05,
    wif_prefix: 0x80,
    bech32_hrp: None,
    xprv_magic: 0x0488ade4,
    xpub_magic: 0x0488b21e,
    fork_id: Some(0x000000),
    message_magic: "Bitcoin Signed Message:\n",
    strict_low_s: true,
    testnet: false,
    explorer_code: "bch"
};

pub static BITCOIN_CASH_TESTNET: CoinPolicy = CoinPolicy {
    name: "Bitcoin Cash Testnet",
    ticker: "bch",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xef,
    bech32_hrp: None,
    xprv_magic: 0x04358394,
    xpub_magic: 0x043587cf,
    fork_id: Some(0x000000),
    message_magic: "Bitcoin Signed Message:\n",
    strict_low_s: true,
    testnet: true,
    explorer_code: "bch-testnet"
};

pub static LITECOIN: CoinPolicy = CoinPolicy {
    name: "Litecoin",
    ticker: "ltc",
    p2pkh_prefix: 0x30,
    p2sh_prefix: 0x32,
    wif_prefix: 0xb0,
    bech32_hrp: Some("ltc"),
    xprv_magic: 0x019d9cfe,
    xpub_magic: 0x019da462,
    fork_id: None,
    message_magic: "Litecoin Signed Message:\n",
    strict_low_s: true,
    testnet: false,
    explorer_code: "ltc"
};

pub static LITECOIN_TESTNET: CoinPolicy = CoinPolicy {
    name: "Litecoin Testnet",
    ticker: "ltc",
    p2pkh_prefix: 0x6f,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xef,
    bech32_hrp: Some("tltc"),
    xprv_magic: 0x0436ef7d,
    xpub_magic: 0x0436f6e1,
    fork_id: None,
    message_magic: "Litecoin Signed Message:\n",
    strict_low_s: true,
    testnet: true,
    explorer_code: "ltc-testnet"
};

pub static DASH: CoinPolicy = CoinPolicy {
    name: "Dash",
    ticker: "dash",
    p2pkh_prefix: 0x4c,
    p2sh_prefix: 0x10,
    wif_prefix: 0xcc,
    bech32_hrp: None,
    xprv_magic: 0x0488ade4,
    xpub_magic: 0x0488b21e,
    fork_id: None,
    message_magic: "DarkCoin Signed Message:\n",
    strict_low_s: true,
    testnet: false,
    explorer_code: "dash"
};

pub static DASH_TESTNET: CoinPolicy = CoinPolicy {
    name: "Dash Testnet",
    ticker: "dash",
    p2pkh_prefix: 0x8c,
    p2sh_prefix: 0x13,
    wif_prefix: 0xef,
    bech32_hrp: None,
    xprv_magic: 0x04358394,
    xpub_magic: 0x043587cf,
    fork_id: None,
    message_magic: "DarkCoin Signed Message:\n",
    strict_low_s: true,
    testnet: true,
    explorer_code: "dash-testnet"
};

pub static DOGECOIN: CoinPolicy = CoinPolicy {
    name: "Dogecoin",
    ticker: "doge",
    p2pkh_prefix: 0x1e,
    p2sh_prefix: 0x16,
    wif_prefix: 0x9e,
    bech32_hrp: None,
    xprv_magic: 0x02fac398,
    xpub_magic: 0x02facafd,
    fork_id: None,
    message_magic: "Dogecoin Signed Message:\n",
    strict_low_s: true,
    testnet: false,
    explorer_code: "doge"
};

//Parameters from the Dogecoin reference client chainparams.
pub static DOGECOIN_TESTNET: CoinPolicy = CoinPolicy {
    name: "Dogecoin Testnet",
    ticker: "doge",
    p2pkh_prefix: 0x71,
    p2sh_prefix: 0xc4,
    wif_prefix: 0xf1,
    bech32_hrp: None,
    xprv_magic: 0x04358394,
    xpub_magic: 0x043587cf,
    fork_id: None,
    message_magic: "Dogecoin Signed Message:\n",
    strict_low_s: true,
    testnet: true,
    explorer_code: "doge-testnet"
};

/**
    Find the policy for a ticker symbol.
*/
pub fn lookup(ticker: &str, testnet: bool) -> Option<&'static CoinPolicy> {
    let policy = match (ticker, testnet) {
        ("btc", false) => &BITCOIN,
        ("btc", true) => &BITCOIN_TESTNET,
        ("bch", false) => &BITCOIN_CASH,
        ("bch", true) => &BITCOIN_CASH_TESTNET,
        ("ltc", false) => &LITECOIN,
        ("ltc", true) => &LITECOIN_TESTNET,
        ("dash", false) => &DASH,
        ("dash", true) => &DASH_TESTNET,
        ("doge", false) => &DOGECOIN,
        ("doge", true) => &DOGECOIN_TESTNET,
        _ => return None
    };
    Some(policy)
}

#[derive(Debug, PartialEq)]
pub enum CoinError {
    BadBase58(Base58Error),
    BadBech32(Bech32Error),
    WrongNetwork(u8),
    WrongHrp(String),
    NoSegwit(),
    NonStandardScript(),
    BadLength(usize)
}

impl From<Base58Error> for CoinError {
    fn from(e: Base58Error) -> Self {
        CoinError::BadBase58(e)
    }
}

impl From<Bech32Error> for CoinError {
    fn from(e: Bech32Error) -> Self {
        CoinError::BadBech32(e)
    }
}

#[derive(Debug, PartialEq)]
pub enum SendError {
    Transport(TransportError),
    Signing(SignError),
    Address(CoinError),
    Codec(TxError),
    InsufficientFunds { available: u64, required: u64 }
}

impl From<TransportError> for SendError {
    fn from(e: TransportError) -> Self { SendError::Transport(e) }
}
impl From<SignError> for SendError {
    fn from(e: SignError) -> Self { SendError::Signing(e) }
}
impl From<CoinError> for SendError {
    fn from(e: CoinError) -> Self { SendError::Address(e) }
}
impl From<TxError> for SendError {
    fn from(e: TxError) -> Self { SendError::Codec(e) }
}

/**
    One coin, bound to the shared algorithms.
*/
#[derive(Debug, Clone)]
pub struct Coin {
    pub policy: &'static CoinPolicy
}

impl Coin {
    pub fn new(policy: &'static CoinPolicy) -> Self {
        Self { policy }
    }

    pub fn bitcoin(testnet: bool) -> Self {
        Self::new(if testnet { &BITCOIN_TESTNET } else { &BITCOIN })
    }

    pub fn bitcoin_cash(testnet: bool) -> Self {
        Self::new(if testnet { &BITCOIN_CASH_TESTNET } else { &BITCOIN_CASH })
    }

    pub fn litecoin(testnet: bool) -> Self {
        Self::new(if testnet { &LITECOIN_TESTNET } else { &LITECOIN })
    }

    pub fn dash(testnet: bool) -> Self {
        Self::new(if testnet { &DASH_TESTNET } else { &DASH })
    }

    pub fn dogecoin(testnet: bool) -> Self {
        Self::new(if testnet { &DOGECOIN_TESTNET } else { &DOGECOIN })
    }

    pub fn from_ticker(ticker: &str, testnet: bool) -> Option<Self> {
        lookup(ticker, testnet).map(Self::new)
    }

    /*
        Key material
    */

    /**
        Parse a private key from raw hex or from WIF under this coin's
        prefix. The compression hint follows the source format.
    */
    pub fn parse_privkey(&self, encoded: &str) -> Result<PrivKey, KeyError> {
        if encoded.len() == 64 || encoded.len() == 66 {
            if let Ok(key) = PrivKey::from_hex(encoded) {
                return Ok(key);
            }
        }
        PrivKey::from_wif(encoded, self.policy.wif_prefix)
    }

    pub fn encode_wif(&self, key: &PrivKey) -> String {
        key.to_wif(self.policy.wif_prefix)
    }

    pub fn privtopub(&self, encoded: &str) -> Result<String, KeyError> {
        Ok(PubKey::from_priv_key(&self.parse_privkey(encoded)?).hex())
    }

    /*
        Addresses
    */

    /**
        Base58Check( p2pkh prefix | hash160( pubkey ) )
    */
    pub fn pubtoaddr(&self, key: &PubKey) -> String {
        Base58::new(&[self.policy.p2pkh_prefix], &key.hash160()).check_encode()
    }

    pub fn privtoaddr(&self, key: &PrivKey) -> String {
        self.pubtoaddr(&PubKey::from_priv_key(key))
    }

    /**
        P2SH address of an arbitrary redeem script.
    */
    pub fn scripttoaddr(&self, script: &Script) -> String {
        Base58::new(&[self.policy.p2sh_prefix], &script.hash()).check_encode()
    }

    /**
        Segwit nested in P2SH: the address of the `0x00 0x14 hash160(pub)`
        redeem script. Spendable by every coin, segwit or not, since it
        is plain P2SH on the outside.
    */
    pub fn pubtop2w(&self, key: &PubKey) -> String {
        self.scripttoaddr(&Script::p2wpkh_redeem(key))
    }

    pub fn privtop2w(&self, key: &PrivKey) -> String {
        self.pubtop2w(&PubKey::from_priv_key(key))
    }

    /**
        Native segwit address, for coins with a bech32 prefix.
    */
    pub fn pubtosegwit(&self, key: &PubKey) -> Result<String, CoinError> {
        let hrp = self.policy.bech32_hrp.ok_or(CoinError::NoSegwit())?;
        let hash = crate::hash::hash160(&key.serialize_compressed());
        Ok(bech32::encode_address(hrp, &hash)?)
    }

    pub fn privtosegwit(&self, key: &PrivKey) -> Result<String, CoinError> {
        self.pubtosegwit(&PubKey::from_priv_key(key))
    }

    /**
        Standard address of an Electrum derived key slot.
    */
    pub fn electrum_address(&self, master: &ElectrumMaster, index: u32, for_change: bool) -> Result<String, ElectrumError> {
        Ok(self.pubtoaddr(&master.pubkey(index, for_change)?))
    }

    /**
        Decode an address into the script pubkey it pays to.
    */
    pub fn addr_to_script(&self, address: &str) -> Result<Script, CoinError> {
        if let Some(hrp) = self.policy.bech32_hrp {
            let lowered = address.to_lowercase();
            if lowered.starts_with(hrp) && lowered.as_bytes().get(hrp.len()) == Some(&b'1') {
                let (decoded_hrp, program) = bech32::decode_address(address)?;
                if decoded_hrp != hrp { return Err(CoinError::WrongHrp(decoded_hrp)) }
                return Ok(Script::p2wpkh(&try_into(program)));
            }
        }

        let payload = Base58::check_decode(address)?;
        if payload.len() != 21 { return Err(CoinError::BadLength(payload.len())) }
        let hash: [u8; 20] = try_into(payload[1..21].to_vec());

        if payload[0] == self.policy.p2pkh_prefix {
            Ok(Script::p2pkh(&hash))
        } else if payload[0] == self.policy.p2sh_prefix {
            Ok(Script::p2sh(&hash))
        } else {
            Err(CoinError::WrongNetwork(payload[0]))
        }
    }

    /**
        Encode a standard script pubkey as an address.
    */
    pub fn script_to_addr(&self, script: &Script) -> Result<String, CoinError> {
        let payload = script.payload().ok_or(CoinError::NonStandardScript())?;
        match script.kind() {
            ScriptKind::P2pkh => Ok(Base58::new(&[self.policy.p2pkh_prefix], &payload).check_encode()),
            ScriptKind::P2sh => Ok(Base58::new(&[self.policy.p2sh_prefix], &payload).check_encode()),
            ScriptKind::P2wpkh => {
                let hrp = self.policy.bech32_hrp.ok_or(CoinError::NoSegwit())?;
                Ok(bech32::encode_address(hrp, &payload)?)
            },
            ScriptKind::NonStandard => Err(CoinError::NonStandardScript())
        }
    }

    /**
        Whether the string is a well formed address of this coin.
    */
    pub fn is_address(&self, address: &str) -> bool {
        self.addr_to_script(address).is_ok()
    }

    /*
        Transactions
    */

    /**
        Assemble an unsigned transaction. Version 1, zero locktime,
        final sequences; signing happens separately.
    */
    pub fn mktx(&self, ins: Vec<TxInput>, outs: Vec<TxOutput>) -> Tx {
        Tx::new(ins, outs)
    }

    /**
        An output paying the given address.
    */
    pub fn pay_to(&self, address: &str, value: u64) -> Result<TxOutput, CoinError> {
        Ok(TxOutput::new(value as i64, self.addr_to_script(address)?.code))
    }

    pub fn sign(&self, tx: &Tx, index: usize, key: &PrivKey, hashcode: u32) -> Result<Tx, SignError> {
        tx::sign(tx, index, key, hashcode, self.policy.fork_id)
    }

    pub fn signall(&self, tx: &Tx, key: &PrivKey) -> Result<Tx, SignError> {
        tx::signall(tx, key, SIGHASH_ALL, self.policy.fork_id)
    }

    pub fn multisign(&self, tx: &Tx, index: usize, redeem: &Script, key: &PrivKey) -> Result<Vec<u8>, SignError> {
        tx::multisign(tx, index, redeem, key, SIGHASH_ALL, self.policy.fork_id)
    }

    pub fn apply_multisignatures(&self, tx: &Tx, index: usize, redeem: &Script, sigs: &[(PubKey, Vec<u8>)]) -> Result<Tx, SignError> {
        tx::apply_multisignatures(tx, index, redeem, sigs)
    }

    /**
        Verify a transaction signature under this coin's low-s policy.
        Coins without strict enforcement accept high-s signatures.
    */
    pub fn verify_signature(&self, key: &PubKey, digest: &[u8; 32], der_sig: &[u8]) -> Result<bool, KeyError> {
        key.verify(digest, der_sig, self.policy.strict_low_s)
    }

    /*
        Signed messages, in the reference client's signmessage format
    */

    /**
        The digest signmessage signs: the coin's magic prefix and the
        message, each length prefixed, double hashed.
    */
    pub fn message_digest(&self, message: &[u8]) -> [u8; 32] {
        let mut data = Vec::new();
        varint::write_varint(&mut data, self.policy.message_magic.len() as u64);
        data.extend_from_slice(self.policy.message_magic.as_bytes());
        varint::write_varint(&mut data, message.len() as u64);
        data.extend_from_slice(message);

        crate::hash::sha256d(&data)
    }

    /**
        The 65 byte recoverable signature signmessage emits: a header
        byte carrying the recovery id and the compression hint, then
        the compact (r, s) pair.
    */
    pub fn sign_message(&self, key: &PrivKey, message: &[u8]) -> Vec<u8> {
        let digest = self.message_digest(message);
        let (compact, recid) = key::sign_recoverable(&digest, key);

        let header = 27 + recid + if key.compressed { 4 } else { 0 };
        let mut signature = vec![header];
        signature.extend_from_slice(&compact);
        signature
    }

    /**
        Recover the signer of a message signature and check that it
        pays to the given address.
    */
    pub fn verify_message(&self, address: &str, signature: &[u8], message: &[u8]) -> Result<bool, KeyError> {
        if signature.len() != 65 { return Err(KeyError::BadSignature()) }
        let header = signature[0];
        if header < 27 || header > 34 { return Err(KeyError::BadSignature()) }

        let digest = self.message_digest(message);
        let compact: [u8; 64] = try_into(signature[1..65].to_vec());
        let mut signer = key::recover(&digest, &compact, (header - 27) & 0x03)?;
        signer.compressed = header >= 31;

        Ok(self.pubtoaddr(&signer) == address)
    }

    /*
        BIP-32, under this coin's version magics
    */

    pub fn master_key(&self, seed: &[u8]) -> Result<Xprv, HDWError> {
        Xprv::from_seed(seed)
    }

    pub fn encode_xprv(&self, key: &Xprv) -> String {
        key.serialize(self.policy.xprv_magic)
    }

    pub fn encode_xpub(&self, key: &Xpub) -> String {
        key.serialize(self.policy.xpub_magic)
    }

    pub fn parse_xprv(&self, encoded: &str) -> Result<Xprv, HDWError> {
        Xprv::deserialize(encoded, self.policy.xprv_magic)
    }

    pub fn parse_xpub(&self, encoded: &str) -> Result<Xpub, HDWError> {
        Xpub::deserialize(encoded, self.policy.xpub_magic)
    }

    /*
        Explorer backed operations. The transport is injected; the
        coin only contributes its explorer code.
    */

    pub fn unspent(&self, explorer: &dyn Explorer, address: &str) -> Result<Vec<Utxo>, TransportError> {
        explorer.unspent(self.policy.explorer_code, address)
    }

    pub fn history(&self, explorer: &dyn Explorer, address: &str) -> Result<Vec<HistoryItem>, TransportError> {
        explorer.history(self.policy.explorer_code, address)
    }

    pub fn fetchtx(&self, explorer: &dyn Explorer, txid: &str) -> Result<String, TransportError> {
        explorer.fetchtx(self.policy.explorer_code, txid)
    }

    pub fn pushtx(&self, explorer: &dyn Explorer, tx: &Tx) -> Result<PushResult, TransportError> {
        explorer.pushtx(self.policy.explorer_code, &tx.hex())
    }

    /**
        Compose an unsigned transaction paying `value` to `to` from the
        key's own address, spending the largest unspents first and
        returning change above the dust threshold.
    */
    pub fn preparetx(&self, explorer: &dyn Explorer, key: &PrivKey, to: &str, value: u64, fee: u64) -> Result<Tx, SendError> {
        let from = self.privtoaddr(key);
        let mut utxos = self.unspent(explorer, &from)?;
        utxos.sort_by(|a, b| b.value.cmp(&a.value));

        let required = value + fee;
        let mut gathered: u64 = 0;
        let mut ins: Vec<TxInput> = Vec::new();
        for utxo in &utxos {
            if gathered >= required { break; }
            let outpoint = Outpoint::new(&utxo.txid, utxo.vout)?;
            let kind = if utxo.segwit { InputKind::P2wpkh } else { InputKind::P2pkh };
            ins.push(TxInput::with_value(outpoint, utxo.value, kind));
            gathered += utxo.value;
        }
        if gathered < required {
            return Err(SendError::InsufficientFunds { available: gathered, required });
        }

        let mut outs = vec![self.pay_to(to, value)?];
        let change = gathered - required;
        if change >= DUST_THRESHOLD {
            outs.push(self.pay_to(&from, change)?);
        }

        Ok(self.mktx(ins, outs))
    }

    /**
        Prepare, sign and broadcast in one call.
    */
    pub fn send(&self, explorer: &dyn Explorer, key: &PrivKey, to: &str, value: u64, fee: u64) -> Result<PushResult, SendError> {
        let tx = self.preparetx(explorer, key, to, value, fee)?;
        let signed = self.signall(&tx, key)?;
        Ok(self.pushtx(explorer, &signed)?)
    }
}
