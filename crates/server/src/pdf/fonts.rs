//! Standard-14 Helvetica faces with WinAnsi encoding.
//!
//! Only the built-in faces are used, so no font program is embedded. Text is
//! therefore limited to the WinAnsi repertoire: caller text outside it is
//! rejected, static copy is encoded lossily.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
}

impl Font {
    pub const ALL: [Font; 2] = [Font::Regular, Font::Bold];

    pub fn resource_name(self) -> &'static str {
        match self {
            Self::Regular => "F1",
            Self::Bold => "F2",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Self::Regular => "Helvetica",
            Self::Bold => "Helvetica-Bold",
        }
    }

    /// Advance width of `text` in points at `size`.
    pub fn measure(self, text: &[u8], size: f32) -> f32 {
        let units: u32 = text.iter().map(|byte| u32::from(self.glyph_width(*byte))).sum();
        units as f32 * size / 1000.0
    }

    fn glyph_width(self, byte: u8) -> u16 {
        let table = match self {
            Self::Regular => &HELVETICA_WIDTHS,
            Self::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            0x20..=0x7e => table[usize::from(byte - 0x20)],
            // Accented Latin glyphs share the width of their base letters
            // closely enough for column fitting.
            _ => match self {
                Self::Regular => 556,
                Self::Bold => 611,
            },
        }
    }
}

/// AFM advance widths for 0x20..=0x7e.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// WinAnsi code for `ch`, if the encoding has one.
pub fn win_ansi(ch: char) -> Option<u8> {
    let code = match ch {
        '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{ff}' => return u8::try_from(u32::from(ch)).ok(),
        '\u{20ac}' => 0x80,
        '\u{201a}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201e}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02c6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8a,
        '\u{2039}' => 0x8b,
        '\u{0152}' => 0x8c,
        '\u{017d}' => 0x8e,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201c}' => 0x93,
        '\u{201d}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02dc}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9a,
        '\u{203a}' => 0x9b,
        '\u{0153}' => 0x9c,
        '\u{017e}' => 0x9e,
        '\u{0178}' => 0x9f,
        '\t' => b' ',
        _ => return None,
    };
    Some(code)
}

/// Encodes `text`, returning the first character WinAnsi cannot represent.
pub fn encode_strict(text: &str) -> Result<Vec<u8>, char> {
    text.chars().map(|ch| win_ansi(ch).ok_or(ch)).collect()
}

/// Encodes `text`, substituting `?` for unrepresentable characters.
pub fn encode_lossy(text: &str) -> Vec<u8> {
    text.chars().map(|ch| win_ansi(ch).unwrap_or(b'?')).collect()
}
