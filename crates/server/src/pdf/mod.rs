//! Quotation PDF rendering.
//!
//! Pages are drawn straight into `lopdf` content streams using the built-in
//! Helvetica faces, plus an embedded TrueType font for the Malayalam notice
//! when one is available. Every page gets the letterhead and footer; the
//! optional informational page comes first, then the estimate with its item
//! table, which continues onto further pages when it outgrows the first.

pub mod branding;
pub mod canvas;
pub mod fonts;
pub mod layout;
pub mod unicode;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use chrono::Local;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;
use tracing::debug;

use camquote_core::domain::document::QuotationDocument;
use camquote_core::errors::ApplicationError;

use self::canvas::{Align, PageCanvas, Rgb, TextStyle, PAGE_HEIGHT, PAGE_WIDTH};
use self::fonts::Font;
use self::layout::{body_rows, encode_field, paginate, INCH, MARGIN_SIDE, MARGIN_TOP};
use self::unicode::UnicodeFont;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("{field} contains `{character}`, which the document fonts cannot encode")]
    UnsupportedCharacter { field: String, character: char },
    #[error("quotation total exceeds the representable amount")]
    TotalOverflow,
    #[error("pdf assembly failed: {0}")]
    Pdf(String),
    #[error("i/o error on `{path}`: {source}")]
    Io { path: PathBuf, source: std::io::Error },
}

impl From<RenderError> for ApplicationError {
    fn from(error: RenderError) -> Self {
        ApplicationError::Render(error.to_string())
    }
}

const ESTIMATE_WIDTH: f32 = 6.5 * INCH;

/// Renders `document` into an in-memory PDF positioned at the start.
/// `unicode` is embedded only when the informational page draws with it.
pub fn render(
    document: &QuotationDocument,
    unicode: Option<&UnicodeFont>,
) -> Result<Cursor<Vec<u8>>, RenderError> {
    let mut pages = Vec::new();

    if document.include_info_page {
        let mut canvas = PageCanvas::new();
        branding::draw_info_page(&mut canvas, unicode);
        pages.push(canvas);
    }

    let mut first = PageCanvas::new();
    let table_top = draw_estimate_heading(&mut first, document)?;
    let total = document.total().ok_or(RenderError::TotalOverflow)?;
    let rows = body_rows(&document.items, total)?;
    let segments = paginate(rows, table_top);

    let mut segments = segments.into_iter();
    if let Some(segment) = segments.next() {
        segment.draw(&mut first);
    }
    pages.push(first);
    for segment in segments {
        let mut canvas = PageCanvas::new();
        segment.draw(&mut canvas);
        pages.push(canvas);
    }

    debug!(
        event_name = "quotation.render.completed",
        pages = pages.len(),
        items = document.items.len(),
        "quotation rendered"
    );
    let bytes = assemble(pages, unicode)?;
    Ok(Cursor::new(bytes))
}

/// Renders `document` and writes it to `path`.
pub fn render_to_path(
    document: &QuotationDocument,
    unicode: Option<&UnicodeFont>,
    path: &Path,
) -> Result<(), RenderError> {
    let rendered = render(document, unicode)?;
    std::fs::write(path, rendered.into_inner())
        .map_err(|source| RenderError::Io { path: path.to_path_buf(), source })
}

/// Title, validity notice, date and reference, and customer lines. Returns
/// where the item table starts.
fn draw_estimate_heading(
    canvas: &mut PageCanvas,
    document: &QuotationDocument,
) -> Result<f32, RenderError> {
    let now = Local::now();
    let date = match &document.date {
        Some(date) => date.clone(),
        None => now.format("%d/%m/%Y").to_string(),
    };
    let reference = match &document.reference {
        Some(reference) => reference.clone(),
        None => now.format("%M%S").to_string(),
    };
    let date_line = encode_field("date", &format!("DATE :{date}"))?;
    let reference_line = encode_field("reference", &format!("REF  : {reference}"))?;
    let customer_lines = [
        ("customer_name", "Customer", &document.customer_name),
        ("customer_location", "Location", &document.customer_location),
    ]
    .into_iter()
    .filter_map(|(field, label, value)| {
        value.as_ref().map(|value| encode_field(field, &format!("{label}: {value}")))
    })
    .collect::<Result<Vec<_>, _>>()?;

    let title = TextStyle::new(Font::Bold, 24.0);
    let mut cursor = MARGIN_TOP + 10.0;
    canvas.text(b"ESTIMATE", PAGE_WIDTH / 2.0, cursor + title.size, title, Align::Center);
    cursor += title.size * 1.2 + 30.0 + 0.3 * INCH;

    let body = TextStyle::new(Font::Regular, 10.0);
    let left = (PAGE_WIDTH - ESTIMATE_WIDTH) / 2.0;
    let right = left + ESTIMATE_WIDTH - 6.0;
    let row_height = body.size * 1.2 + 11.0;
    canvas.text(
        b"Date valid only 5 days",
        left + 6.0,
        cursor + body.size + 3.0,
        body.colored(Rgb::RED),
        Align::Left,
    );
    canvas.text(&date_line, right, cursor + body.size + 3.0, body, Align::Right);
    cursor += row_height;
    canvas.text(&reference_line, right, cursor + body.size + 3.0, body, Align::Right);
    cursor += row_height + 0.3 * INCH;

    if !customer_lines.is_empty() {
        let customer = TextStyle::new(Font::Bold, 11.0);
        for line in &customer_lines {
            canvas.text(line, MARGIN_SIDE, cursor + customer.size, customer, Align::Left);
            cursor += customer.size * 1.2 + 8.0;
        }
        cursor += 0.2 * INCH;
    }

    Ok(cursor)
}

fn assemble(pages: Vec<PageCanvas>, unicode: Option<&UnicodeFont>) -> Result<Vec<u8>, RenderError> {
    let mut pdf = Document::with_version("1.5");
    let pages_id = pdf.new_object_id();

    let mut fonts = lopdf::Dictionary::new();
    for font in Font::ALL {
        let font_id = pdf.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(font.resource_name(), font_id);
    }
    let glyphs: BTreeMap<_, _> = pages
        .iter()
        .flat_map(|canvas| canvas.glyphs().iter().map(|(id, glyph)| (*id, *glyph)))
        .collect();
    if let Some(font) = unicode.filter(|_| !glyphs.is_empty()) {
        let font_id = font.embed(&mut pdf, &glyphs);
        fonts.set(unicode::RESOURCE_NAME, font_id);
    }
    let resources_id = pdf.add_object(dictionary! { "Font" => fonts });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for mut canvas in pages {
        branding::draw_header(&mut canvas);
        branding::draw_footer(&mut canvas);
        let content =
            canvas.into_content().encode().map_err(|error| RenderError::Pdf(error.to_string()))?;
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content));
        let page_id: ObjectId = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(PAGE_WIDTH.into()),
                Object::Real(PAGE_HEIGHT.into()),
            ],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    pdf.save_to(&mut bytes).map_err(|error| RenderError::Pdf(error.to_string()))?;
    Ok(bytes)
}
