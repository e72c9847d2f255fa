use rust_decimal::Decimal;

use camquote_core::domain::line_item::QuotationLineItem;

use super::canvas::{Align, PageCanvas, Rgb, TextStyle, PAGE_HEIGHT, PAGE_WIDTH};
use super::fonts::{encode_strict, Font};
use super::RenderError;

pub const INCH: f32 = 72.0;
pub const MARGIN_TOP: f32 = 1.5 * INCH;
pub const MARGIN_BOTTOM: f32 = INCH;
pub const MARGIN_SIDE: f32 = 0.5 * INCH;
pub const FRAME_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN_SIDE;

pub const COLUMN_COUNT: usize = 5;
pub const COLUMN_HEADINGS: [&str; COLUMN_COUNT] = ["Sl", "DESCRIPTION", "RATE", "QTY", "AMOUNT"];
pub const COLUMN_WIDTHS: [f32; COLUMN_COUNT] =
    [0.5 * INCH, 3.5 * INCH, 1.0 * INCH, 0.8 * INCH, 1.2 * INCH];

/// Body rows shown before the spacer and total, padded with blanks.
pub const MIN_BODY_ROWS: usize = 10;

const CELL_PADDING_X: f32 = 6.0;
const HEADER_PADDING_Y: f32 = 12.0;
const BODY_PADDING_Y: f32 = 8.0;
const BODY_LEADING: f32 = 12.0;
const GRID_WIDTH: f32 = 1.0;
const BOX_WIDTH: f32 = 1.5;

const HEADER_STYLE: TextStyle = TextStyle::new(Font::Bold, 11.0);
const BODY_STYLE: TextStyle = TextStyle::new(Font::Regular, 10.0);
const TOTAL_STYLE: TextStyle = TextStyle::new(Font::Bold, 12.0);

/// Prints whole numbers without a fractional part and keeps any other
/// fraction in its shortest form: `6000.0` is "6000", `6000.50` is "6000.5".
pub fn format_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Encodes caller-provided text, naming `field` when a character is outside
/// the font encoding.
pub fn encode_field(field: &str, text: &str) -> Result<Vec<u8>, RenderError> {
    encode_strict(text)
        .map_err(|character| RenderError::UnsupportedCharacter { field: field.to_string(), character })
}

/// Greedy word wrap of one encoded line into `width` points. Words wider than
/// the column are broken between characters.
pub fn wrap_line(line: &[u8], font: Font, size: f32, width: f32) -> Vec<Vec<u8>> {
    let space = font.measure(b" ", size);
    let mut lines = Vec::new();
    let mut current: Vec<u8> = Vec::new();

    for word in line.split(|byte| *byte == b' ').filter(|word| !word.is_empty()) {
        let word_width = font.measure(word, size);
        let needed = if current.is_empty() {
            word_width
        } else {
            font.measure(&current, size) + space + word_width
        };
        if needed <= width {
            if !current.is_empty() {
                current.push(b' ');
            }
            current.extend_from_slice(word);
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        let mut rest = word;
        while font.measure(rest, size) > width {
            let split = fitting_prefix(rest, font, size, width).max(1);
            lines.push(rest[..split].to_vec());
            rest = &rest[split..];
        }
        current.extend_from_slice(rest);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encodes caller text for `field` and wraps it, honoring forced `\n` breaks.
fn wrap_text(
    field: &str,
    text: &str,
    style: TextStyle,
    width: f32,
) -> Result<Vec<Vec<u8>>, RenderError> {
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let encoded = encode_field(field, line)?;
        lines.extend(wrap_line(&encoded, style.font, style.size, width));
    }
    Ok(lines)
}

fn fitting_prefix(text: &[u8], font: Font, size: f32, width: f32) -> usize {
    let mut used = 0.0;
    for (index, byte) in text.iter().enumerate() {
        used += font.measure(&[*byte], size);
        if used > width {
            return index;
        }
    }
    text.len()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowKind {
    Header,
    Item,
    Blank,
    Spacer,
    Total,
}

/// One table row with each cell already encoded and split into lines.
#[derive(Clone, Debug, PartialEq)]
pub struct TableRow {
    pub kind: RowKind,
    pub cells: [Vec<Vec<u8>>; COLUMN_COUNT],
    pub height: f32,
}

impl TableRow {
    fn new(kind: RowKind, cells: [Vec<Vec<u8>>; COLUMN_COUNT]) -> Self {
        let lines = cells.iter().map(Vec::len).max().unwrap_or(0).max(1) as f32;
        let height = match kind {
            RowKind::Header => 2.0 * HEADER_PADDING_Y + HEADER_STYLE.size * 1.2,
            RowKind::Total => 2.0 * BODY_PADDING_Y + TOTAL_STYLE.size * 1.2,
            _ => 2.0 * BODY_PADDING_Y + lines * BODY_LEADING,
        };
        Self { kind, cells, height }
    }

    pub fn header() -> Self {
        Self::new(RowKind::Header, COLUMN_HEADINGS.map(|heading| vec![heading.as_bytes().to_vec()]))
    }

    fn empty(kind: RowKind) -> Self {
        Self::new(kind, Default::default())
    }

    fn item(serial: usize, item: &QuotationLineItem, index: usize) -> Result<Self, RenderError> {
        let description_width = COLUMN_WIDTHS[1] - 2.0 * CELL_PADDING_X;
        let field = format!("items[{index}].description");
        let description = wrap_text(&field, &item.description, BODY_STYLE, description_width)?;

        Ok(Self::new(
            RowKind::Item,
            [
                vec![serial.to_string().into_bytes()],
                description,
                vec![format_amount(item.rate).into_bytes()],
                vec![item.quantity.to_string().into_bytes()],
                vec![format_amount(item.amount).into_bytes()],
            ],
        ))
    }

    fn total(total: Decimal) -> Self {
        Self::new(
            RowKind::Total,
            [
                Vec::new(),
                Vec::new(),
                Vec::new(),
                vec![b"TOTAL".to_vec()],
                vec![format_amount(total).into_bytes()],
            ],
        )
    }

    fn cell_style(&self, column: usize) -> (TextStyle, Align) {
        match self.kind {
            RowKind::Header => (HEADER_STYLE, Align::Center),
            RowKind::Total if column == 3 => (TOTAL_STYLE, Align::Center),
            RowKind::Total => (TOTAL_STYLE, Align::Right),
            _ => match column {
                0 => (BODY_STYLE, Align::Center),
                1 => (BODY_STYLE, Align::Left),
                _ => (BODY_STYLE, Align::Right),
            },
        }
    }

    fn padding_top(&self) -> f32 {
        match self.kind {
            RowKind::Header => HEADER_PADDING_Y,
            _ => BODY_PADDING_Y,
        }
    }
}

/// Body rows for `items`: one row per item, blanks up to [`MIN_BODY_ROWS`],
/// one spacer and the total row.
pub fn body_rows(items: &[QuotationLineItem], total: Decimal) -> Result<Vec<TableRow>, RenderError> {
    let mut rows = items
        .iter()
        .enumerate()
        .map(|(index, item)| TableRow::item(index + 1, item, index))
        .collect::<Result<Vec<_>, _>>()?;

    let padding = MIN_BODY_ROWS.saturating_sub(rows.len());
    rows.extend(std::iter::repeat_with(|| TableRow::empty(RowKind::Blank)).take(padding));
    rows.push(TableRow::empty(RowKind::Spacer));
    rows.push(TableRow::total(total));
    Ok(rows)
}

/// The part of the table that lands on one page, header row included.
#[derive(Clone, Debug, PartialEq)]
pub struct TableSegment {
    pub top: f32,
    pub rows: Vec<TableRow>,
}

impl TableSegment {
    pub fn height(&self) -> f32 {
        self.rows.iter().map(|row| row.height).sum()
    }

    pub fn draw(&self, canvas: &mut PageCanvas) {
        let width: f32 = COLUMN_WIDTHS.iter().sum();
        let left = (PAGE_WIDTH - width) / 2.0;

        let mut row_top = self.top;
        for row in &self.rows {
            if row.kind == RowKind::Header {
                canvas.fill_rect(left, row_top, width, row.height, Rgb::HEADER_GREY);
            }
            let mut column_left = left;
            for (column, lines) in row.cells.iter().enumerate() {
                let (style, align) = row.cell_style(column);
                let column_width = COLUMN_WIDTHS[column];
                let anchor = match align {
                    Align::Left => column_left + CELL_PADDING_X,
                    Align::Center => column_left + column_width / 2.0,
                    Align::Right => column_left + column_width - CELL_PADDING_X,
                };
                let leading = if row.kind == RowKind::Item { BODY_LEADING } else { style.size * 1.2 };
                for (index, line) in lines.iter().enumerate() {
                    let baseline = row_top + row.padding_top() + style.size + index as f32 * leading;
                    canvas.text(line, anchor, baseline, style, align);
                }
                column_left += column_width;
            }
            row_top += row.height;
        }

        let bottom = row_top;
        let mut boundary = self.top;
        for row in &self.rows[..self.rows.len().saturating_sub(1)] {
            boundary += row.height;
            canvas.line((left, boundary), (left + width, boundary), GRID_WIDTH);
        }
        let mut column_left = left;
        for column_width in &COLUMN_WIDTHS[..COLUMN_COUNT - 1] {
            column_left += column_width;
            canvas.line((column_left, self.top), (column_left, bottom), GRID_WIDTH);
        }
        canvas.stroke_rect(left, self.top, width, bottom - self.top, BOX_WIDTH);
    }
}

/// Splits `body` over pages. The first segment starts at `first_top`; every
/// later one starts at the top margin and repeats the header row. A row that
/// does not fit above the bottom margin moves to the next page unless it
/// would be the only body row there.
pub fn paginate(body: Vec<TableRow>, first_top: f32) -> Vec<TableSegment> {
    let limit = PAGE_HEIGHT - MARGIN_BOTTOM;
    let header = TableRow::header();

    let mut segments = Vec::new();
    let mut segment = TableSegment { top: first_top, rows: vec![header.clone()] };
    let mut cursor = first_top + header.height;

    for row in body {
        if cursor + row.height > limit && segment.rows.len() > 1 {
            segments.push(segment);
            segment = TableSegment { top: MARGIN_TOP, rows: vec![header.clone()] };
            cursor = MARGIN_TOP + header.height;
        }
        cursor += row.height;
        segment.rows.push(row);
    }
    segments.push(segment);
    segments
}
