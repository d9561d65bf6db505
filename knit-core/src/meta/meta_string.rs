// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Compact encodings for the short identifiers that name types on the wire.
//!
//! Namespaces and type names are mostly lowercase letters plus a couple of separator
//! characters, so they pack into 5 or 6 bits per char. The first bit of the packed
//! data flags whether the decoder must drop a trailing pad char.

use crate::ensure;
use crate::error::Error;
use num_enum::{IntoPrimitive, TryFromPrimitive};

const SHORT_MAX_VALUE: usize = i16::MAX as usize;

pub static NAMESPACE_ENCODER: MetaStringEncoder = MetaStringEncoder::new('.', '_');
pub static TYPE_NAME_ENCODER: MetaStringEncoder = MetaStringEncoder::new('$', '_');

pub static NAMESPACE_DECODER: MetaStringDecoder = MetaStringDecoder::new('.', '_');
pub static TYPE_NAME_DECODER: MetaStringDecoder = MetaStringDecoder::new('$', '_');

#[derive(Debug, PartialEq, Hash, Eq, Clone, Copy, Default, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Encoding {
    #[default]
    Utf8 = 0x00,
    LowerSpecial = 0x01,
    LowerUpperDigitSpecial = 0x02,
    FirstToLowerSpecial = 0x03,
    AllToLowerSpecial = 0x04,
}

impl Encoding {
    pub fn from_byte(byte: u8) -> Result<Encoding, Error> {
        Encoding::try_from(byte)
            .map_err(|_| Error::encoding_error(format!("unknown meta string encoding: {byte}")))
    }
}

/// An encoded meta string. Two meta strings are the same entry when their original
/// text and encoding agree.
#[derive(Debug, Clone, Default)]
pub struct MetaString {
    pub original: String,
    pub encoding: Encoding,
    pub bytes: Vec<u8>,
    pub strip_last_char: bool,
    pub special_char1: char,
    pub special_char2: char,
}

impl PartialEq for MetaString {
    fn eq(&self, other: &Self) -> bool {
        self.original == other.original && self.encoding == other.encoding
    }
}

impl Eq for MetaString {}

impl std::hash::Hash for MetaString {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.original.hash(state);
        self.encoding.hash(state);
    }
}

impl MetaString {
    pub fn new(
        original: String,
        encoding: Encoding,
        bytes: Vec<u8>,
        special_char1: char,
        special_char2: char,
    ) -> Result<Self, Error> {
        let mut strip_last_char = false;
        if encoding != Encoding::Utf8 {
            ensure!(
                !bytes.is_empty(),
                Error::encode_error("Encoded data cannot be empty")
            );
            strip_last_char = (bytes[0] & 0x80) != 0;
        }
        Ok(MetaString {
            original,
            encoding,
            bytes,
            strip_last_char,
            special_char1,
            special_char2,
        })
    }
}

#[derive(Clone, Debug)]
pub struct MetaStringEncoder {
    pub special_char1: char,
    pub special_char2: char,
}

#[derive(Clone, Debug)]
pub struct MetaStringDecoder {
    pub special_char1: char,
    pub special_char2: char,
}

#[derive(Debug, Default)]
struct StringStatistics {
    digit_count: usize,
    upper_count: usize,
    can_lower_upper_digit_special_encoded: bool,
    can_lower_special_encoded: bool,
}

impl MetaStringEncoder {
    pub const fn new(special_char1: char, special_char2: char) -> Self {
        Self {
            special_char1,
            special_char2,
        }
    }

    fn meta_string(
        &self,
        input: &str,
        encoding: Encoding,
        bytes: Vec<u8>,
    ) -> Result<MetaString, Error> {
        MetaString::new(
            input.to_string(),
            encoding,
            bytes,
            self.special_char1,
            self.special_char2,
        )
    }

    /// Picks the most compact encoding the input allows and encodes with it.
    pub fn encode(&self, input: &str) -> Result<MetaString, Error> {
        if input.is_empty() {
            return self.meta_string(input, Encoding::Utf8, vec![]);
        }
        ensure!(
            input.len() < SHORT_MAX_VALUE,
            Error::encode_error(format!(
                "Meta string is too long, max:{SHORT_MAX_VALUE}, current:{}",
                input.len()
            ))
        );
        if !input.is_ascii() {
            return self.meta_string(input, Encoding::Utf8, input.as_bytes().to_vec());
        }
        let encoding = self.compute_encoding(input);
        self.encode_with_encoding(input, encoding)
    }

    fn compute_encoding(&self, input: &str) -> Encoding {
        let statistics = self.compute_statistics(input);
        if statistics.can_lower_special_encoded {
            return Encoding::LowerSpecial;
        }
        if statistics.can_lower_upper_digit_special_encoded {
            if statistics.digit_count != 0 {
                return Encoding::LowerUpperDigitSpecial;
            }
            let upper_count = statistics.upper_count;
            let first_upper = input.chars().next().map_or(false, |c| c.is_ascii_uppercase());
            if upper_count == 1 && first_upper {
                return Encoding::FirstToLowerSpecial;
            }
            if (input.len() + upper_count) * 5 < input.len() * 6 {
                return Encoding::AllToLowerSpecial;
            }
            return Encoding::LowerUpperDigitSpecial;
        }
        Encoding::Utf8
    }

    fn compute_statistics(&self, input: &str) -> StringStatistics {
        let mut stats = StringStatistics {
            can_lower_upper_digit_special_encoded: true,
            can_lower_special_encoded: true,
            ..Default::default()
        };
        for c in input.chars() {
            if !(c.is_ascii_alphanumeric() || c == self.special_char1 || c == self.special_char2) {
                stats.can_lower_upper_digit_special_encoded = false;
            }
            if !(c.is_ascii_lowercase() || matches!(c, '.' | '_' | '$' | '|')) {
                stats.can_lower_special_encoded = false;
            }
            if c.is_ascii_digit() {
                stats.digit_count += 1;
            }
            if c.is_ascii_uppercase() {
                stats.upper_count += 1;
            }
        }
        stats
    }

    pub fn encode_with_encoding(
        &self,
        input: &str,
        encoding: Encoding,
    ) -> Result<MetaString, Error> {
        if input.is_empty() {
            return self.meta_string(input, Encoding::Utf8, vec![]);
        }
        ensure!(
            encoding == Encoding::Utf8 || input.is_ascii(),
            Error::encode_error("Non-ASCII characters in meta string are not allowed")
        );
        let bytes = match encoding {
            Encoding::LowerSpecial => self.encode_generic(input.chars(), 5)?,
            Encoding::LowerUpperDigitSpecial => self.encode_generic(input.chars(), 6)?,
            Encoding::FirstToLowerSpecial => {
                let mut chars = input.chars();
                let first = chars.next().map(|c| c.to_ascii_lowercase());
                self.encode_generic(first.into_iter().chain(chars), 5)?
            }
            Encoding::AllToLowerSpecial => {
                let escaped = input.chars().flat_map(|c| {
                    if c.is_ascii_uppercase() {
                        vec!['|', c.to_ascii_lowercase()]
                    } else {
                        vec![c]
                    }
                });
                self.encode_generic(escaped, 5)?
            }
            Encoding::Utf8 => input.as_bytes().to_vec(),
        };
        self.meta_string(input, encoding, bytes)
    }

    /// Packs chars MSB-first after a one-bit strip flag.
    fn encode_generic(
        &self,
        chars: impl Iterator<Item = char>,
        bits_per_char: usize,
    ) -> Result<Vec<u8>, Error> {
        let values = chars
            .map(|c| self.char_to_value(c, bits_per_char))
            .collect::<Result<Vec<u8>, Error>>()?;
        let total_bits = values.len() * bits_per_char + 1;
        let byte_length = (total_bits + 7) / 8;
        let mut bytes = vec![0u8; byte_length];
        let mut current_bit = 1;
        for value in values {
            for i in (0..bits_per_char).rev() {
                if (value & (1 << i)) != 0 {
                    bytes[current_bit / 8] |= 1 << (7 - current_bit % 8);
                }
                current_bit += 1;
            }
        }
        if byte_length * 8 >= total_bits + bits_per_char {
            bytes[0] |= 0x80;
        }
        Ok(bytes)
    }

    fn char_to_value(&self, c: char, bits_per_char: usize) -> Result<u8, Error> {
        let value = match (bits_per_char, c) {
            (5, 'a'..='z') => c as u8 - b'a',
            (5, '.') => 26,
            (5, '_') => 27,
            (5, '$') => 28,
            (5, '|') => 29,
            (6, 'a'..='z') => c as u8 - b'a',
            (6, 'A'..='Z') => c as u8 - b'A' + 26,
            (6, '0'..='9') => c as u8 - b'0' + 52,
            (6, _) if c == self.special_char1 => 62,
            (6, _) if c == self.special_char2 => 63,
            _ => {
                return Err(Error::encode_error(format!(
                    "Unsupported character {c:?} for {bits_per_char}-bit meta string encoding"
                )))
            }
        };
        Ok(value)
    }
}

impl MetaStringDecoder {
    pub const fn new(special_char1: char, special_char2: char) -> Self {
        MetaStringDecoder {
            special_char1,
            special_char2,
        }
    }

    pub fn decode(&self, encoded_data: &[u8], encoding: Encoding) -> Result<MetaString, Error> {
        let decoded = if encoded_data.is_empty() {
            String::new()
        } else {
            match encoding {
                Encoding::LowerSpecial => self.decode_generic(encoded_data, 5)?,
                Encoding::LowerUpperDigitSpecial => self.decode_generic(encoded_data, 6)?,
                Encoding::FirstToLowerSpecial => {
                    let lowered = self.decode_generic(encoded_data, 5)?;
                    let mut chars = lowered.chars();
                    match chars.next() {
                        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                        None => lowered,
                    }
                }
                Encoding::AllToLowerSpecial => {
                    let escaped = self.decode_generic(encoded_data, 5)?;
                    let mut result = String::with_capacity(escaped.len());
                    let mut chars = escaped.chars();
                    while let Some(c) = chars.next() {
                        if c == '|' {
                            if let Some(next) = chars.next() {
                                result.push(next.to_ascii_uppercase());
                            }
                        } else {
                            result.push(c);
                        }
                    }
                    result
                }
                Encoding::Utf8 => String::from_utf8(encoded_data.to_vec()).map_err(|e| {
                    Error::encoding_error(format!("invalid utf8 meta string: {e}"))
                })?,
            }
        };
        MetaString::new(
            decoded,
            encoding,
            encoded_data.to_vec(),
            self.special_char1,
            self.special_char2,
        )
    }

    fn decode_generic(&self, data: &[u8], bits_per_char: usize) -> Result<String, Error> {
        let total_bits = data.len() * 8;
        let strip_last_char = (data[0] & 0x80) != 0;
        let mask = (1usize << bits_per_char) - 1;
        let mut decoded = String::with_capacity(total_bits / bits_per_char);
        let mut bit_index = 1;
        while bit_index + bits_per_char <= total_bits
            && !(strip_last_char && bit_index + 2 * bits_per_char > total_bits)
        {
            let byte_index = bit_index / 8;
            let intra_byte_index = bit_index % 8;
            let hi = data[byte_index] as usize;
            let lo = data.get(byte_index + 1).copied().unwrap_or(0) as usize;
            let window = (hi << 8) | lo;
            let value = (window >> (16 - intra_byte_index - bits_per_char)) & mask;
            decoded.push(self.value_to_char(value as u8, bits_per_char)?);
            bit_index += bits_per_char;
        }
        Ok(decoded)
    }

    fn value_to_char(&self, value: u8, bits_per_char: usize) -> Result<char, Error> {
        let c = match (bits_per_char, value) {
            (_, 0..=25) => (b'a' + value) as char,
            (5, 26) => '.',
            (5, 27) => '_',
            (5, 28) => '$',
            (5, 29) => '|',
            (6, 26..=51) => (b'A' + value - 26) as char,
            (6, 52..=61) => (b'0' + value - 52) as char,
            (6, 62) => self.special_char1,
            (6, 63) => self.special_char2,
            _ => {
                return Err(Error::encoding_error(format!(
                    "Invalid value {value} for {bits_per_char}-bit meta string decoding"
                )))
            }
        };
        Ok(c)
    }
}
