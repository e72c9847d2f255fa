//! Shop letterhead and the informational page that precedes the estimate.

use super::canvas::{Align, PageCanvas, Rgb, TextStyle, PAGE_HEIGHT, PAGE_WIDTH};
use super::fonts::{encode_lossy, Font};
use super::layout::{wrap_line, FRAME_WIDTH, INCH, MARGIN_SIDE, MARGIN_TOP};
use super::unicode::{GlyphRun, UnicodeFont};

pub const COMPANY_NAME: &str = "HDC SECURITY SOLUTIONZ";
pub const LOCATION: &str = "MOKERI";
pub const ADDRESS: &str = "NEAR BHARAT PETROLEUM";
pub const PHONE_DISPLAY: &str = "PH: 6235 15 3938";
pub const PHONE: &str = "6235153938";
pub const EMAIL: &str = "hdc3078@gmail.com";

const HEADER_BAND_HEIGHT: f32 = 1.3 * INCH;
const LOGO_LEFT: f32 = 0.6 * INCH;

const INFO_TITLE: &str = "\u{2022} How is hdc cctv hub different from the others ?";
const INFO_POINTS_BEFORE_NOTICE: [&str; 5] = [
    "1) First ai controlled self service office in kerala",
    "2) Fast and proper service",
    "3) 10 year + experienced technicians",
    "4) Mainly deals with banking sector (federalbank,sib amc)",
    "5) 24*7 customer support",
];
pub(crate) const SERVICE_NOTICE: &str = "6) hdc ചെയ്ത വർക്കിൽ എചെങ്കില ും COMPLAINT വന്നാൽ പകരും കയാമറ അചെങ്കിൽ dvr ചവച്ച്തന്നതിന്ശേഷും മാത്തും COMPLAINT ആയ Materials സർവീസിന ചകാണ്ട ശപാക കയ ള്ളൂ . ( company SERVICE late ആവ ന്ന ണ്ട്, അത ചകാണ്ടാണ്hdc ഈ സർവീസ്ചകാട ക്ക ന്നത്, ഈസർവീസ്മചറാര കമ്പനിയ ും നൽക ന്നിെ)";
const INFO_POINTS_AFTER_NOTICE: [&str; 2] =
    ["7) deals with quality products", "8) more details please visit our Instagram hdc_cctv_hub"];
const FREE_SERVICE: &str = "9) 1 YEAR FREE SERVICE ";
const FREE_SERVICE_TERMS: &str = "(ONLY FOR COMPLAINTS T&C APPLIED)";

const POINT_INDENT: f32 = 20.0;
const POINT_STYLE: TextStyle = TextStyle::new(Font::Regular, 11.0);
const NOTICE_STYLE: TextStyle = TextStyle::new(Font::Regular, 10.0).colored(Rgb::RED);
const POINT_SPACE_AFTER: f32 = 12.0;

/// Black band with the logo on the left and the shop address on the right.
pub fn draw_header(canvas: &mut PageCanvas) {
    canvas.fill_rect(0.0, 0.0, PAGE_WIDTH, HEADER_BAND_HEIGHT, Rgb::BLACK);

    let logo = TextStyle::new(Font::Bold, 48.0);
    let logo_baseline = 0.75 * INCH;
    canvas.text(b"HD", LOGO_LEFT, logo_baseline, logo.colored(Rgb::WHITE), Align::Left);
    let c_left = LOGO_LEFT + Font::Bold.measure(b"HD", logo.size);
    canvas.text(b"C", c_left, logo_baseline, logo.colored(Rgb::ORANGE), Align::Left);
    canvas.text(
        b"SECURITY SOLUTIONZ",
        LOGO_LEFT,
        1.05 * INCH,
        TextStyle::new(Font::Regular, 10.0).colored(Rgb::WHITE),
        Align::Left,
    );

    let right = PAGE_WIDTH - MARGIN_SIDE;
    let detail = TextStyle::new(Font::Regular, 10.0).colored(Rgb::WHITE);
    canvas.text(
        LOCATION.as_bytes(),
        right,
        0.5 * INCH,
        TextStyle::new(Font::Bold, 12.0).colored(Rgb::WHITE),
        Align::Right,
    );
    canvas.text(ADDRESS.as_bytes(), right, 0.7 * INCH, detail, Align::Right);
    canvas.text(PHONE_DISPLAY.as_bytes(), right, 0.9 * INCH, detail, Align::Right);
}

pub fn draw_footer(canvas: &mut PageCanvas) {
    let left = 0.75 * INCH;
    canvas.text(
        COMPANY_NAME.as_bytes(),
        left,
        PAGE_HEIGHT - 0.75 * INCH,
        TextStyle::new(Font::Bold, 10.0),
        Align::Left,
    );
    let contact = TextStyle::new(Font::Regular, 9.0);
    canvas.text(EMAIL.as_bytes(), left, PAGE_HEIGHT - 0.55 * INCH, contact.colored(Rgb::BLUE), Align::Left);
    canvas.text(PHONE.as_bytes(), left, PAGE_HEIGHT - 0.35 * INCH, contact, Align::Left);
}

/// Draws the informational page body below the header. The service notice
/// uses `unicode` when it covers the notice, Helvetica otherwise.
pub fn draw_info_page(canvas: &mut PageCanvas, unicode: Option<&UnicodeFont>) {
    let title = TextStyle::new(Font::Bold, 18.0).colored(Rgb::RED);
    let mut cursor = MARGIN_TOP + title.size;
    canvas.text(&encode_lossy(INFO_TITLE), MARGIN_SIDE, cursor, title, Align::Left);
    cursor += title.size * 0.2 + 20.0 + 0.3 * INCH;

    for point in INFO_POINTS_BEFORE_NOTICE {
        cursor = draw_point(canvas, point, POINT_STYLE, cursor);
    }
    let notice_width = FRAME_WIDTH - POINT_INDENT;
    cursor = match unicode.and_then(|font| font.wrap(SERVICE_NOTICE, NOTICE_STYLE.size, notice_width)) {
        Some(lines) => draw_glyph_point(canvas, &lines, NOTICE_STYLE, cursor),
        None => draw_point(canvas, SERVICE_NOTICE, NOTICE_STYLE, cursor),
    };
    for point in INFO_POINTS_AFTER_NOTICE {
        cursor = draw_point(canvas, point, POINT_STYLE, cursor);
    }

    let baseline = cursor + POINT_STYLE.size;
    let left = MARGIN_SIDE + POINT_INDENT;
    canvas.text(FREE_SERVICE.as_bytes(), left, baseline, POINT_STYLE, Align::Left);
    let terms_left = left + POINT_STYLE.font.measure(FREE_SERVICE.as_bytes(), POINT_STYLE.size);
    canvas.text(
        FREE_SERVICE_TERMS.as_bytes(),
        terms_left,
        baseline,
        POINT_STYLE.colored(Rgb::RED),
        Align::Left,
    );
}

// Static copy is encoded lossily; glyphs outside the font become `?`.
fn draw_point(canvas: &mut PageCanvas, text: &str, style: TextStyle, top: f32) -> f32 {
    let leading = style.size * 1.2;
    let width = FRAME_WIDTH - POINT_INDENT;
    let lines = wrap_line(&encode_lossy(text), style.font, style.size, width);

    let mut baseline = top + style.size;
    for line in &lines {
        canvas.text(line, MARGIN_SIDE + POINT_INDENT, baseline, style, Align::Left);
        baseline += leading;
    }
    top + lines.len() as f32 * leading + POINT_SPACE_AFTER
}

fn draw_glyph_point(canvas: &mut PageCanvas, lines: &[GlyphRun], style: TextStyle, top: f32) -> f32 {
    let leading = style.size * 1.2;
    let mut baseline = top + style.size;
    for line in lines {
        canvas.glyph_text(line, MARGIN_SIDE + POINT_INDENT, baseline, style.size, style.color);
        baseline += leading;
    }
    top + lines.len() as f32 * leading + POINT_SPACE_AFTER
}
