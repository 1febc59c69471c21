//! Adapter over the `qrcode` encoder.
//!
//! The styling layer only needs a finished grid of dark and light modules, so the encoder's
//! output is flattened into a [`ModuleMatrix`] right away.

use encoding_rs::SHIFT_JIS;
use qrcode::{
    bits::Bits,
    types::{Color, EcLevel, QrError, Version},
    QrCode,
};
use tracing::debug;

use crate::{
    error::StylingResult,
    options::{ErrorCorrectionLevel, Mode, QrOptions, MAX_TYPE_NUMBER},
};

// Module matrix
//------------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleMatrix {
    grid: Vec<bool>,
    w: usize,
    ver: u8,
    ecl: ErrorCorrectionLevel,
    mode: Mode,
}

impl ModuleMatrix {
    /// Builds a matrix from row-major module colors, `true` being dark.
    pub fn new(grid: Vec<bool>, ver: u8, ecl: ErrorCorrectionLevel, mode: Mode) -> Self {
        let w = (grid.len() as f64).sqrt() as usize;
        debug_assert_eq!(w * w, grid.len(), "Module grid is not square");
        Self { grid, w, ver, ecl, mode }
    }

    pub fn module_count(&self) -> usize {
        self.w
    }

    pub fn version(&self) -> u8 {
        self.ver
    }

    pub fn ec_level(&self) -> ErrorCorrectionLevel {
        self.ecl
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Modules outside the grid read as light.
    pub fn is_dark(&self, r: i32, c: i32) -> bool {
        let w = self.w as i32;
        if r < 0 || c < 0 || r >= w || c >= w {
            return false;
        }
        self.grid[(r * w + c) as usize]
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&&m| m).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.w as i32;
        let mut res = String::with_capacity(self.w * (self.w + 1) + 1);
        res.push('\n');
        for r in 0..w {
            for c in 0..w {
                res.push(if self.is_dark(r, c) { '#' } else { '.' });
            }
            res.push('\n');
        }
        res
    }
}

// Mode detection
//------------------------------------------------------------------------------

pub fn detect_mode(data: &str) -> Mode {
    if data.bytes().all(|b| b.is_ascii_digit()) {
        Mode::Numeric
    } else if data.bytes().all(is_alphanumeric) {
        Mode::Alphanumeric
    } else {
        Mode::Byte
    }
}

fn is_alphanumeric(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'A'..=b'Z' | b' ' | b'$' | b'%' | b'*' | b'+' | b'-' | b'.' | b'/' | b':')
}


// Encoder
//------------------------------------------------------------------------------

/// Encodes `data` with the explicit mode of `opts`, or the detected one. A type number of `0`
/// picks the smallest version that fits.
pub fn encode(data: &str, opts: &QrOptions) -> StylingResult<ModuleMatrix> {
    let mode = opts.mode.unwrap_or_else(|| detect_mode(data));
    let ecl = opts.error_correction_level;
    let payload = payload(data, mode)?;

    let versions = match opts.type_number {
        0 => 1..=MAX_TYPE_NUMBER,
        t => t..=t,
    };
    let mut last_err = QrError::DataTooLong;
    for ver in versions {
        match encode_with_version(&payload, mode, ver, ecl) {
            Ok(code) => {
                debug!(version = ver, ?ecl, ?mode, width = code.width(), "data encoded");
                let grid = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
                return Ok(ModuleMatrix::new(grid, ver, ecl, mode));
            }
            Err(QrError::DataTooLong) => last_err = QrError::DataTooLong,
            Err(err) => return Err(err.into()),
        }
    }
    Err(last_err.into())
}

fn payload(data: &str, mode: Mode) -> Result<Vec<u8>, QrError> {
    let bytes = match mode {
        Mode::Kanji => {
            let (bytes, _, had_errors) = SHIFT_JIS.encode(data);
            if had_errors {
                return Err(QrError::UnsupportedCharacterSet);
            }
            bytes.into_owned()
        }
        _ => data.as_bytes().to_vec(),
    };

    // The encoder trusts its input, characters outside the mode would corrupt the symbol
    let fits = match mode {
        Mode::Numeric => bytes.iter().all(u8::is_ascii_digit),
        Mode::Alphanumeric => bytes.iter().all(|&b| is_alphanumeric(b)),
        Mode::Byte => true,
        Mode::Kanji => bytes.len() % 2 == 0 && bytes.chunks_exact(2).all(|p| is_kanji(p[0], p[1])),
    };
    if !fits {
        return Err(QrError::InvalidCharacter);
    }
    Ok(bytes)
}

fn is_kanji(hi: u8, lo: u8) -> bool {
    let cp = u16::from_be_bytes([hi, lo]);
    matches!(cp, 0x8140..=0x9ffc | 0xe040..=0xebbf)
}

fn encode_with_version(payload: &[u8], mode: Mode, ver: u8, ecl: ErrorCorrectionLevel) -> Result<QrCode, QrError> {
    let ec_level = match ecl {
        ErrorCorrectionLevel::L => EcLevel::L,
        ErrorCorrectionLevel::M => EcLevel::M,
        ErrorCorrectionLevel::Q => EcLevel::Q,
        ErrorCorrectionLevel::H => EcLevel::H,
    };

    let mut bits = Bits::new(Version::Normal(ver as i16));
    match mode {
        Mode::Numeric => bits.push_numeric_data(payload)?,
        Mode::Alphanumeric => bits.push_alphanumeric_data(payload)?,
        Mode::Byte => bits.push_byte_data(payload)?,
        Mode::Kanji => bits.push_kanji_data(payload)?,
    }
    bits.push_terminator(ec_level)?;
    QrCode::with_bits(bits, ec_level)
}
