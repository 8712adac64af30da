//! De-obfuscation of KakaoTalk animated sticker downloads.
//!
//! Kakao XORs the first 128 bytes of each animated WebP/GIF with a keystream
//! from three coupled LFSRs. The transform is its own inverse.

use crate::Result;
use std::path::Path;

/// Number of leading bytes covered by the keystream.
pub const OBFUSCATED_PREFIX: usize = 128;

const KEY: &[u8; 12] = b"a271730728cb";

/// Keystream generator state.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Lfsr([u32; 3]);

impl Lfsr {
    fn new() -> Self {
        let word = |k: usize| u32::from_be_bytes([KEY[4 * k], KEY[4 * k + 1], KEY[4 * k + 2], KEY[4 * k + 3]]);
        Self([word(0), word(1), word(2)])
    }

    fn next_byte(&mut self) -> u8 {
        let [s0, s1, s2] = &mut self.0;
        let mut flag1 = 1u8;
        let mut flag2 = 0u8;
        let mut out = 0u8;

        for _ in 0..8 {
            if *s0 & 1 == 1 {
                *s0 = (*s0 >> 1) ^ 0xC000_0031;
                if *s1 & 1 == 1 {
                    *s1 = ((*s1 >> 1) | 0xC000_0000) ^ 0x2000_0010;
                    flag1 = 1;
                } else {
                    *s1 = (*s1 >> 1) & 0x3FFF_FFFF;
                    flag1 = 0;
                }
            } else {
                *s0 >>= 1;
                if *s2 & 1 == 1 {
                    *s2 = ((*s2 >> 1) | 0xF000_0000) ^ 0x0800_0001;
                    flag2 = 1;
                } else {
                    *s2 = (*s2 >> 1) & 0x0FFF_FFFF;
                    flag2 = 0;
                }
            }
            out = (out << 1) | (flag1 ^ flag2);
        }
        out
    }
}

/// XOR the obfuscated prefix of `data` in place.
///
/// Inputs shorter than the prefix are transformed as far as they go.
pub fn decrypt_kakao(data: &mut [u8]) {
    let mut lfsr = Lfsr::new();
    for byte in data.iter_mut().take(OBFUSCATED_PREFIX) {
        *byte ^= lfsr.next_byte();
    }
}

/// Read `input`, de-obfuscate it, and write the result to `output`.
pub fn decrypt_file(input: &Path, output: &Path) -> Result<()> {
    let mut data = std::fs::read(input)?;
    decrypt_kakao(&mut data);
    std::fs::write(output, &data)?;
    tracing::debug!(input = %input.display(), output = %output.display(), bytes = data.len(), "decrypted");
    Ok(())
}
