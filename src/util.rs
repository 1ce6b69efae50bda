use std::convert::TryInto;

/*
    Decodes hex strings into a byte vector
*/
pub fn decode_02x(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Hex decode error"))
        .collect::<Vec<u8>>()
}

/*
    Fallible variant of decode_02x for user supplied strings.
    Returns None on odd length or non-hex characters.
*/
pub fn decode_02x_checked(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 { return None }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect::<Option<Vec<u8>>>()
}

/*
    Encodes byte slices into hex string
*/
pub fn encode_02x(bytes: &[u8]) -> String {
    bytes.iter().map(|x| {
        format!("{:02x}", x)
    }).collect::<String>()
}

/**
    Converts a vector into an array
*/
pub fn try_into<T, const N: usize>(v: Vec<T>) -> [T; N] {
    v.try_into()
        .unwrap_or_else(|v: Vec<T>| panic!("Expected {}, found {}", N, v.len()))
}

//Converts a byte array to int
pub fn as_u32_be(array: &[u8; 4]) -> u32 {
    ((array[0] as u32) << 24) +
    ((array[1] as u32) << 16) +
    ((array[2] as u32) <<  8) +
    ((array[3] as u32) <<  0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0xde, 0xad, 0xbe, 0xef, 0xff];
        assert_eq!(decode_02x(&encode_02x(&bytes)), bytes);
    }

    #[test]
    fn checked_decode_rejects_bad_input() {
        assert_eq!(decode_02x_checked("0xzz"), None);
        assert_eq!(decode_02x_checked("abc"), None);
        assert_eq!(decode_02x_checked("abcd"), Some(vec![0xab, 0xcd]));
    }

    #[test]
    fn u32_from_be_bytes() {
        assert_eq!(as_u32_be(&[0x04, 0x88, 0xad, 0xe4]), 0x0488ade4);
    }
}
