use crate::hash;

const BASE58_ALPHABET: &'static [u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

const MAP_BASE58: [i8; 256] = [
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1, 0, 1, 2, 3, 4, 5, 6,  7, 8,-1,-1,-1,-1,-1,-1,
        -1, 9,10,11,12,13,14,15, 16,-1,17,18,19,20,21,-1,
        22,23,24,25,26,27,28,29, 30,31,32,-1,-1,-1,-1,-1,
        -1,33,34,35,36,37,38,39, 40,41,42,43,-1,44,45,46,
        47,48,49,50,51,52,53,54, 55,56,57,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
        -1,-1,-1,-1,-1,-1,-1,-1, -1,-1,-1,-1,-1,-1,-1,-1,
];

/// Base58 and Base58Check codec.
///
/// Version prefix bytes are supplied by the caller. Each coin carries its
/// own prefixes in its policy record, so the codec itself is prefix-agnostic.
#[derive(Debug)]
pub struct Base58 {
    prefix: Vec<u8>,
    payload: Vec<u8>
}

#[derive(Debug, PartialEq)]
pub enum Base58Error {
    BadChar(char),
    BadChecksum,
    TooShort
}

impl Base58 {
    pub fn new(prefix: &[u8], payload: &[u8]) -> Base58 {
        Base58 {
            prefix: prefix.to_vec(),
            payload: payload.to_vec()
        }
    }

    /// Check encode data by appending the checksum and then encoding it.
    pub fn check_encode(self) -> String {
        //Concatenate: prefix | payload | checksum, to calculate checksum
        let mut bytes: Vec<u8> = self.prefix;
        bytes.extend_from_slice(&self.payload);
        bytes.extend_from_slice(&hash::sha256d(&bytes)[0..4]);

        //Checksum is part of the payload now, so no further prefix.
        Self::new(&[], &bytes).encode()
    }

    /// Encode data in base58 format.
    pub fn encode(self) -> String {
        //Concatenate the prefix and payload
        let mut data = self.prefix;
        data.extend_from_slice(&self.payload);

        let mut result = Vec::new();
        let mut zcount = 0;
        let mut leading = true;

        for d in data {
            //Count the leading zero bytes. They map one-to-one onto '1' characters.
            let mut carry = d as usize;
            if leading && carry == 0 {
                zcount += 1;
                continue;
            } else {
                leading = false;
            }

            //Multiply the accumulated base58 digits by 256 and add the new byte,
            //propagating the carry upwards. Same scheme as the Bitcoin Core encoder.
            for ch in result.iter_mut() {
                let acc = *ch as usize * 256 + carry;
                *ch = (acc % 58) as u8;
                carry = acc / 58;
            }
            while carry > 0 {
                result.push((carry % 58) as u8);
                carry /= 58;
            }
        }

        for _ in 0..zcount {
            result.push(0);
        }
        result.iter().rev().map(|x| BASE58_ALPHABET[*x as usize] as char).collect()
    }

    /// Decodes a base58 string into a byte vector.
    /// DOES NOT remove the checksum or version prefix if present.
    pub fn decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
        //Count leading '1's. They decode to zero bytes.
        let mut zeroes = 0;
        let chars: Vec<char> = encoded.chars().collect();
        let mut i = 0;
        while i < chars.len() && chars[i] == '1' {
            zeroes += 1;
            i += 1;
        }

        //Big-endian base256 accumulator, log(58)/log(256) rounded up.
        let size = encoded.len() * 733 / 1000 + 1;
        let mut b256: Vec<u8> = vec![0; size];

        while i < chars.len() {
            let c = chars[i];
            if !c.is_ascii() { return Err(Base58Error::BadChar(c)); }
            let ch: i32 = MAP_BASE58[c as usize] as i32;
            if ch == -1 { return Err(Base58Error::BadChar(c)); }

            let mut carry = ch as u32;
            for byte in b256.iter_mut().rev() {
                carry += 58 * (*byte as u32);
                *byte = (carry % 256) as u8;
                carry /= 256;
            }
            i += 1;
        }

        //Skip leading zeroes in the accumulator and copy out.
        let mut j = 0;
        while j < b256.len() && b256[j] == 0 {
            j += 1;
        }
        let mut result: Vec<u8> = vec![0; zeroes];
        result.extend_from_slice(&b256[j..]);

        Ok(result)
    }

    /// Checks if a base58 check encoded string carries a valid checksum.
    pub fn validate_checksum(encoded: &str) -> Result<bool, Base58Error> {
        let bytes = Base58::decode(encoded)?;
        if bytes.len() < 4 { return Err(Base58Error::TooShort); }

        Ok(hash::sha256d(&bytes[..bytes.len()-4])[0..4] == bytes[bytes.len()-4..])
    }

    /// Returns the decoded payload with the checksum removed.
    /// Version prefix is NOT removed as it is variable length depending on context.
    pub fn check_decode(encoded: &str) -> Result<Vec<u8>, Base58Error> {
        if !Self::validate_checksum(encoded)? { return Err(Base58Error::BadChecksum); }

        let bytes = Base58::decode(encoded)?;
        Ok(bytes[..bytes.len()-4].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::decode_02x;

    #[test]
    /// Tests encoding of data without checksum
    /// Sourced from https://tools.ietf.org/id/draft-msporny-base58-01.html
    fn base58_ietf_test_vectors() {
        let hello_world = b"Hello World!";
        let fox = b"The quick brown fox jumps over the lazy dog.";
        let int = [0x00, 0x00, 0x28, 0x7f, 0xb4, 0xcd];

        assert_eq!(Base58::new(&[], hello_world).encode(), "2NEpo7TZRRrLZSi2U");
        assert_eq!(Base58::new(&[], fox).encode(), "USm3fpXnKG5EUBx2ndxBDMPVciP5hGey2Jh4NDv6gmeo1LkMeiKrLJUUBk6Z");
        assert_eq!(Base58::new(&[], &int).encode(), "11233QC4");
    }

    #[test]
    /// Tests encoding of data without checksum.
    /// Sourced from the Bitcoin Core repository (src/test/data/base58_encode_decode.json)
    fn base58_bitcoin_core_test_vectors() {
        let test_data: [(&str, &str); 12] = [
            ("", ""),
            ("61", "2g"),
            ("626262", "a3gV"),
            ("636363", "aPEr"),
            ("73696d706c792061206c6f6e6720737472696e67", "2cFupjhnEsSn59qHXstmK2ffpLv2"),
            ("00eb15231dfceb60925886b67d065299925915aeb172c06647", "1NS17iag9jJgTHD1VXjvLCEnZuQ3rJDE9L"),
            ("516b6fcd0f", "ABnLTmg"),
            ("bf4f89001e670274dd", "3SEo3LWLoPntC"),
            ("572e4794", "3EFU7m"),
            ("ecac89cad93923c02321", "EJDM8drfXA6uyA"),
            ("10c8511e", "Rt5zm"),
            ("00000000000000000000", "1111111111"),
        ];

        for case in test_data.iter() {
            assert_eq!(Base58::new(&[], &decode_02x(case.0)).encode(), case.1);
            assert_eq!(Base58::decode(case.1).unwrap(), decode_02x(case.0));
        }
    }

    #[test]
    fn base58_check_roundtrip() {
        let hash = decode_02x("751e76e8199196d454941c45d1b3a323f1433bd6");
        let encoded = Base58::new(&[0x00], &hash).check_encode();
        assert_eq!(encoded, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");

        let decoded = Base58::check_decode(&encoded).unwrap();
        assert_eq!(decoded[0], 0x00);
        assert_eq!(decoded[1..], hash[..]);
    }

    #[test]
    fn base58_bad_char() {
        //'0', 'O', 'I' and 'l' are not in the alphabet
        assert_eq!(Base58::decode("10Ol"), Err(Base58Error::BadChar('0')));
    }

    #[test]
    fn base58_corrupted_checksum() {
        //Flip the last character of a valid check encoded string
        let result = Base58::check_decode("1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMJ");
        assert_eq!(result, Err(Base58Error::BadChecksum));
    }
}
