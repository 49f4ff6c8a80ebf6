//! Traditional PKWARE ("ZipCrypto") decryption.
//!
//! Three 32-bit keys are seeded from the password bytes and advanced with
//! every plaintext byte. Each encrypted entry starts with a 12-byte header
//! whose last byte, once decrypted, must equal a check byte taken from the
//! entry's CRC (or from its DOS time when a data descriptor is used). That
//! byte is the only password verification the format offers.

/// Length of the encryption header in front of every encrypted entry
pub const HEADER_LEN: usize = 12;

const CRC_TABLE: [u32; 256] = crc_table();

const fn crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut c = i as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 { 0xEDB8_8320 ^ (c >> 1) } else { c >> 1 };
            k += 1;
        }
        table[i] = c;
        i += 1;
    }
    table
}

fn crc32_step(crc: u32, b: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ b as u32) & 0xFF) as usize]
}

/// ZipCrypto cipher state
#[derive(Debug, Clone)]
pub struct ZipCryptoKeys {
    k0: u32,
    k1: u32,
    k2: u32,
}

impl ZipCryptoKeys {
    pub fn new(password: &[u8]) -> Self {
        let mut keys = Self {
            k0: 0x1234_5678,
            k1: 0x2345_6789,
            k2: 0x3456_7890,
        };
        for &b in password {
            keys.update(b);
        }
        keys
    }

    /// Advance the keys with one plaintext byte
    pub fn update(&mut self, plain: u8) {
        self.k0 = crc32_step(self.k0, plain);
        self.k1 = self
            .k1
            .wrapping_add(self.k0 & 0xFF)
            .wrapping_mul(134_775_813)
            .wrapping_add(1);
        self.k2 = crc32_step(self.k2, (self.k1 >> 24) as u8);
    }

    /// Next key stream byte; does not advance the keys
    pub fn stream_byte(&self) -> u8 {
        let t = (self.k2 | 2) & 0xFFFF;
        (t.wrapping_mul(t ^ 1) >> 8) as u8
    }

    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.stream_byte();
        self.update(plain);
        plain
    }
}

/// Decrypt an encrypted entry body (header included).
///
/// Returns the payload without the header, or `None` when the header does not
/// verify against `check_byte`, which means the password is wrong.
pub fn decrypt(password: &[u8], mut data: Vec<u8>, check_byte: u8) -> Option<Vec<u8>> {
    if data.len() < HEADER_LEN {
        return None;
    }

    let mut keys = ZipCryptoKeys::new(password);
    for b in data.iter_mut() {
        *b = keys.decrypt_byte(*b);
    }

    if data[HEADER_LEN - 1] != check_byte {
        return None;
    }

    data.drain(..HEADER_LEN);
    Some(data)
}
