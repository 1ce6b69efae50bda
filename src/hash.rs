/*
    Hash module includes the hash functions needed for
    addresses, checksums, transaction ids and key derivation.
*/

use crate::{
    Digest, Hmac, Mac, NewMac, Ripemd160, Sha256, Sha512,
    util::try_into
};

/*
    Takes in a byte array and returns the sha256 hash of it as a byte array of length 32
*/
pub fn sha256<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    let mut r = Sha256::new();
    r.update(input);
    try_into(r.finalize().to_vec())
}

/*
    Double sha256. Used for checksums, txids and legacy sighashes.
*/
pub fn sha256d<T>(input: T) -> [u8; 32]
where T: AsRef<[u8]>
{
    sha256(sha256(input))
}

/*
    Takes in a byte array and returns the ripemd160 hash of it as a byte array of length 20
*/
pub fn ripemd160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    let mut r = Ripemd160::new();
    r.update(input);
    try_into(r.finalize().to_vec())
}

/*
    Hash160 = Ripemd160( Sha256( input ) )
*/
pub fn hash160<T>(input: T) -> [u8; 20]
where T: AsRef<[u8]>
{
    ripemd160(sha256(input))
}

/*
    HMAC-SHA512 keyed hash. Required by BIP-32.
*/
pub fn hmac_sha512(key: &[u8], data: &[u8]) -> [u8; 64] {
    let mut mac = Hmac::<Sha512>::new_from_slice(key).expect("HMAC accepts any key length");
    mac.update(data);
    try_into(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::encode_02x;

    #[test]
    fn sha256_test_vector() {
        //NIST vector for "abc"
        assert_eq!(
            encode_02x(&sha256(b"abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn hash160_of_known_pubkey() {
        //hash160 of the generator point's compressed encoding
        let pubkey = crate::util::decode_02x("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");
        assert_eq!(
            encode_02x(&hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn sha256d_checksum() {
        //Checksum bytes of a mainnet P2PKH payload
        let payload = crate::util::decode_02x("00751e76e8199196d454941c45d1b3a323f1433bd6");
        assert_eq!(&sha256d(&payload)[0..4], &crate::util::decode_02x("510d1634")[..]);
    }

    #[test]
    fn hmac_sha512_rfc4231_case_one() {
        let key = [0x0b; 20];
        let out = hmac_sha512(&key, b"Hi There");
        assert_eq!(
            encode_02x(&out),
            "87aa7cdea5ef619d4ff0b4241a1d6cb02379f4e2ce4ec2787ad0b30545e17cde\
             daa833b7d6b8a702038b274eaea3f4e4be9d914eeb61f1702e696c203a126854"
        );
    }
}
