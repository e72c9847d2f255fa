use std::collections::BTreeMap;

use lopdf::content::{Content, Operation};
use lopdf::{Object, StringFormat};

use super::fonts::Font;
use super::unicode::{Glyph, GlyphRun, RESOURCE_NAME as UNICODE_RESOURCE};

pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    pub const WHITE: Rgb = Rgb(1.0, 1.0, 1.0);
    pub const RED: Rgb = Rgb(1.0, 0.0, 0.0);
    pub const BLUE: Rgb = Rgb(0.0, 0.0, 1.0);
    /// #FF6B35
    pub const ORANGE: Rgb = Rgb(1.0, 0.4196, 0.2078);
    /// #D0D0D0
    pub const HEADER_GREY: Rgb = Rgb(0.8157, 0.8157, 0.8157);

    fn operands(self) -> Vec<Object> {
        vec![real(self.0), real(self.1), real(self.2)]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

/// Content stream for one page, addressed top-down: `top` is the distance
/// from the upper page edge, converted to PDF user space on emit.
#[derive(Debug, Default)]
pub struct PageCanvas {
    operations: Vec<Operation>,
    glyphs: BTreeMap<u16, Glyph>,
}

impl PageCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill_rect(&mut self, x: f32, top: f32, width: f32, height: f32, color: Rgb) {
        self.push("q", vec![]);
        self.push("rg", color.operands());
        self.push("re", vec![real(x), real(PAGE_HEIGHT - top - height), real(width), real(height)]);
        self.push("f", vec![]);
        self.push("Q", vec![]);
    }

    pub fn stroke_rect(&mut self, x: f32, top: f32, width: f32, height: f32, line_width: f32) {
        self.push("q", vec![]);
        self.push("w", vec![real(line_width)]);
        self.push("RG", Rgb::BLACK.operands());
        self.push("re", vec![real(x), real(PAGE_HEIGHT - top - height), real(width), real(height)]);
        self.push("S", vec![]);
        self.push("Q", vec![]);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), line_width: f32) {
        self.push("q", vec![]);
        self.push("w", vec![real(line_width)]);
        self.push("RG", Rgb::BLACK.operands());
        self.push("m", vec![real(from.0), real(PAGE_HEIGHT - from.1)]);
        self.push("l", vec![real(to.0), real(PAGE_HEIGHT - to.1)]);
        self.push("S", vec![]);
        self.push("Q", vec![]);
    }

    /// Draws already-encoded `text` with its baseline at `baseline`. `x` is
    /// the left edge, centre or right edge depending on `align`.
    pub fn text(
        &mut self,
        text: &[u8],
        x: f32,
        baseline: f32,
        style: TextStyle,
        align: Align,
    ) {
        if text.is_empty() {
            return;
        }
        let width = style.font.measure(text, style.size);
        let left = match align {
            Align::Left => x,
            Align::Center => x - width / 2.0,
            Align::Right => x - width,
        };

        self.push("BT", vec![]);
        self.push("rg", style.color.operands());
        self.push("Tf", vec![style.font.resource_name().into(), real(style.size)]);
        self.push("Td", vec![real(left), real(PAGE_HEIGHT - baseline)]);
        self.push("Tj", vec![Object::String(text.to_vec(), StringFormat::Literal)]);
        self.push("ET", vec![]);
    }

    /// Draws a run in the embedded Unicode font, left edge at `x`.
    pub fn glyph_text(&mut self, run: &GlyphRun, x: f32, baseline: f32, size: f32, color: Rgb) {
        if run.is_empty() {
            return;
        }
        for glyph in run.glyphs() {
            self.glyphs.entry(glyph.id).or_insert(*glyph);
        }

        self.push("BT", vec![]);
        self.push("rg", color.operands());
        self.push("Tf", vec![UNICODE_RESOURCE.into(), real(size)]);
        self.push("Td", vec![real(x), real(PAGE_HEIGHT - baseline)]);
        self.push("Tj", vec![Object::String(run.codes(), StringFormat::Hexadecimal)]);
        self.push("ET", vec![]);
    }

    /// Embedded-font glyphs drawn on this page so far.
    pub fn glyphs(&self) -> &BTreeMap<u16, Glyph> {
        &self.glyphs
    }

    pub fn into_content(self) -> Content {
        Content { operations: self.operations }
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.operations.push(Operation::new(operator, operands));
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    pub const fn new(font: Font, size: f32) -> Self {
        Self { font, size, color: Rgb::BLACK }
    }

    pub const fn colored(self, color: Rgb) -> Self {
        Self { color, ..self }
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}
