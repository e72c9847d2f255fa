//! TrueType font embedded as a CID-keyed Type0 font, for copy the Helvetica
//! faces cannot show such as the Malayalam service notice.
//!
//! Glyphs are looked up one character at a time and written as two-byte
//! glyph ids (`Identity-H`). No shaping is applied, so conjuncts come out as
//! their component glyphs.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::{info, warn};
use ttf_parser::{Face, Tag};

/// Tried in order when no font path is configured, or the configured one
/// cannot be used.
pub const FONT_CANDIDATES: [&str; 4] = [
    "fonts/NotoSansMalayalam.ttf",
    "fonts/NotoSansMalayalam-Regular.ttf",
    "/usr/share/fonts/truetype/noto/NotoSansMalayalam-Regular.ttf",
    "/usr/share/fonts/noto/NotoSansMalayalam-Regular.ttf",
];

pub(crate) const RESOURCE_NAME: &str = "F3";

#[derive(Debug, Error)]
pub enum FontError {
    #[error("could not read font `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("`{path}` is not a usable TrueType font: {reason}")]
    Parse { path: PathBuf, reason: String },
}

/// One glyph with its advance in thousandths of an em.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Glyph {
    pub id: u16,
    pub ch: char,
    pub width: u16,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphRun {
    glyphs: Vec<Glyph>,
}

impl GlyphRun {
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }

    pub fn width(&self, size: f32) -> f32 {
        let units: u32 = self.glyphs.iter().map(|glyph| u32::from(glyph.width)).sum();
        units as f32 * size / 1000.0
    }

    /// Big-endian glyph ids, the byte form `Identity-H` expects.
    pub fn codes(&self) -> Vec<u8> {
        self.glyphs.iter().flat_map(|glyph| glyph.id.to_be_bytes()).collect()
    }

    pub fn text(&self) -> String {
        self.glyphs.iter().map(|glyph| glyph.ch).collect()
    }

    fn extend(&mut self, other: &GlyphRun) {
        self.glyphs.extend_from_slice(&other.glyphs);
    }
}

#[derive(Debug)]
pub struct UnicodeFont {
    base_font: String,
    data: Vec<u8>,
    units_per_em: f32,
    ascent: i16,
    descent: i16,
    cap_height: i16,
    bbox: [i16; 4],
}

impl UnicodeFont {
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let data = std::fs::read(path)
            .map_err(|source| FontError::Read { path: path.to_path_buf(), source })?;
        let name = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or("Unicode");
        Self::from_bytes(name, data)
            .map_err(|reason| FontError::Parse { path: path.to_path_buf(), reason })
    }

    pub fn from_bytes(name: &str, data: Vec<u8>) -> Result<Self, String> {
        let (units_per_em, ascent, descent, cap_height, bbox) = {
            let face = Face::parse(&data, 0).map_err(|error| error.to_string())?;
            if face.raw_face().table(Tag::from_bytes(b"CFF ")).is_some() {
                return Err("CFF outlines cannot be embedded as a TrueType font program".to_string());
            }

            let units_per_em = f32::from(face.units_per_em());
            let scale = |value: i16| (f32::from(value) * 1000.0 / units_per_em).round() as i16;
            let bbox = face.global_bounding_box();
            let ascent = scale(face.ascender());
            let cap_height = face.capital_height().map(scale).unwrap_or(ascent);
            (
                units_per_em,
                ascent,
                scale(face.descender()),
                cap_height,
                [scale(bbox.x_min), scale(bbox.y_min), scale(bbox.x_max), scale(bbox.y_max)],
            )
        };

        let base_font: String = name
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-')
            .collect();
        let base_font = if base_font.is_empty() { "Unicode".to_string() } else { base_font };

        Ok(Self { base_font, data, units_per_em, ascent, descent, cap_height, bbox })
    }

    /// First usable font: `configured`, then [`FONT_CANDIDATES`].
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured.filter(|path| !path.exists()) {
            warn!(
                event_name = "pdf.font.missing",
                path = %path.display(),
                "configured render font does not exist"
            );
        }

        let candidates = configured
            .map(Path::to_path_buf)
            .into_iter()
            .chain(FONT_CANDIDATES.iter().map(PathBuf::from));
        for path in candidates.filter(|path| path.exists()) {
            match Self::load(&path) {
                Ok(font) => {
                    info!(
                        event_name = "pdf.font.registered",
                        path = %path.display(),
                        base_font = %font.base_font,
                        "unicode font registered"
                    );
                    return Some(font);
                }
                Err(error) => {
                    warn!(event_name = "pdf.font.rejected", error = %error, "unicode font skipped");
                }
            }
        }

        warn!(
            event_name = "pdf.font.unavailable",
            "no unicode font found; Malayalam copy falls back to Helvetica"
        );
        None
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    /// Glyphs for `text`, or `None` when the font lacks any of its characters.
    pub fn encode(&self, text: &str) -> Option<GlyphRun> {
        let face = Face::parse(&self.data, 0).ok()?;
        let glyphs = text
            .chars()
            .map(|ch| {
                let id = face.glyph_index(ch)?;
                let advance = face.glyph_hor_advance(id).unwrap_or(0);
                let width = (f32::from(advance) * 1000.0 / self.units_per_em).round() as u16;
                Some(Glyph { id: id.0, ch, width })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(GlyphRun { glyphs })
    }

    /// Greedy word wrap into `width` points at `size`. A word wider than the
    /// line keeps a line of its own.
    pub fn wrap(&self, text: &str, size: f32, width: f32) -> Option<Vec<GlyphRun>> {
        let space = self.encode(" ")?;
        let mut lines = Vec::new();
        let mut current = GlyphRun::default();

        for word in text.split(' ').filter(|word| !word.is_empty()) {
            let word = self.encode(word)?;
            if current.is_empty() {
                current = word;
                continue;
            }
            if current.width(size) + space.width(size) + word.width(size) > width {
                lines.push(std::mem::replace(&mut current, word));
            } else {
                current.extend(&space);
                current.extend(&word);
            }
        }

        if !current.is_empty() || lines.is_empty() {
            lines.push(current);
        }
        Some(lines)
    }

    /// Adds the font program, its descriptor, the descendant CID font and a
    /// ToUnicode map to `pdf`. Widths are written for `glyphs` only. Returns
    /// the Type0 font object.
    pub fn embed(&self, pdf: &mut Document, glyphs: &BTreeMap<u16, Glyph>) -> ObjectId {
        let file_id = pdf.add_object(Stream::new(
            dictionary! { "Length1" => self.data.len() as i64 },
            self.data.clone(),
        ));
        let descriptor_id = pdf.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => self.base_font.clone(),
            "Flags" => 4,
            "FontBBox" => self.bbox.iter().map(|value| Object::Integer(i64::from(*value))).collect::<Vec<_>>(),
            "ItalicAngle" => 0,
            "Ascent" => self.ascent,
            "Descent" => self.descent,
            "CapHeight" => self.cap_height,
            "StemV" => 80,
            "FontFile2" => file_id,
        });

        let widths: Vec<Object> = glyphs
            .values()
            .flat_map(|glyph| {
                [Object::Integer(i64::from(glyph.id)), vec![Object::Integer(i64::from(glyph.width))].into()]
            })
            .collect();
        let cid_font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => self.base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id =
            pdf.add_object(Stream::new(dictionary! {}, to_unicode_cmap(glyphs).into_bytes()));
        pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => self.base_font.clone(),
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::Reference(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        })
    }
}

/// CMap from glyph ids back to UTF-16, so the text stays searchable.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, Glyph>) -> String {
    let mut cmap = String::from(
        "/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
         /CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n\
         /CMapName /Adobe-Identity-UCS def\n/CMapType 2 def\n\
         1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n",
    );

    let entries: Vec<&Glyph> = glyphs.values().collect();
    // bfchar blocks hold at most 100 entries.
    for chunk in entries.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for glyph in chunk {
            let mut units = [0u16; 2];
            let utf16: String =
                glyph.ch.encode_utf16(&mut units).iter().map(|unit| format!("{unit:04X}")).collect();
            let _ = writeln!(cmap, "<{:04X}> <{utf16}>", glyph.id);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend\n");
    cmap
}
