use crate::error::{Result, invalid};

/// Byte encodings accepted for text input.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextEncoding {
    Latin1,
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
}

/// Decodes `bytes` into code points. Malformed input is rejected as a whole.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> Result<Vec<char>> {
    match encoding {
        TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        TextEncoding::Utf8 => std::str::from_utf8(bytes)
            .map(|s| s.chars().collect())
            .map_err(|e| invalid(format!("malformed UTF-8 at byte {}", e.valid_up_to()))),
        TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
            if bytes.len() % 2 != 0 {
                return Err(invalid("UTF-16 input has an odd byte count"));
            }
            let units = bytes.chunks_exact(2).map(|c| {
                if encoding == TextEncoding::Utf16Le {
                    u16::from_le_bytes([c[0], c[1]])
                } else {
                    u16::from_be_bytes([c[0], c[1]])
                }
            });
            char::decode_utf16(units)
                .collect::<std::result::Result<Vec<char>, _>>()
                .map_err(|e| invalid(format!("unpaired UTF-16 surrogate {:#06x}", e.unpaired_surrogate())))
        }
        TextEncoding::Utf32Le => {
            if bytes.len() % 4 != 0 {
                return Err(invalid("UTF-32 input length is not a multiple of 4"));
            }
            bytes
                .chunks_exact(4)
                .map(|c| {
                    let v = u32::from_le_bytes([c[0], c[1], c[2], c[3]]);
                    char::from_u32(v).ok_or_else(|| invalid(format!("invalid code point {v:#x}")))
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latin1_maps_bytes_directly() {
        assert_eq!(decode(&[0x41, 0xe9], TextEncoding::Latin1).unwrap(), vec!['A', 'é']);
    }

    #[test]
    fn utf8_and_malformed_utf8() {
        assert_eq!(decode("hé".as_bytes(), TextEncoding::Utf8).unwrap(), vec!['h', 'é']);
        assert!(decode(&[0x68, 0xc3], TextEncoding::Utf8).is_err());
    }

    #[test]
    fn utf16_both_orders_with_surrogates() {
        let le: Vec<u8> = "a😀".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let be: Vec<u8> = "a😀".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        assert_eq!(decode(&le, TextEncoding::Utf16Le).unwrap(), vec!['a', '😀']);
        assert_eq!(decode(&be, TextEncoding::Utf16Be).unwrap(), vec!['a', '😀']);
        assert!(decode(&[0x00, 0xd8], TextEncoding::Utf16Le).is_err());
        assert!(decode(&[0x00], TextEncoding::Utf16Le).is_err());
    }

    #[test]
    fn utf32_rejects_surrogate_values() {
        assert_eq!(decode(&[0x42, 0, 0, 0], TextEncoding::Utf32Le).unwrap(), vec!['B']);
        assert!(decode(&[0x00, 0xd8, 0, 0], TextEncoding::Utf32Le).is_err());
    }
}
