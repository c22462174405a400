//! Strategy report: the exportable PDF for the strategist persona.
//!
//! Page 1 is the cover (title, address, photo or blank box, byline).
//! Page 2 opens with "Market Diagnostics" and continues with "Analysis & Strategy";
//! long narratives flow onto further pages. Header and footer repeat on every page.
//!
//! `build_report_layout` is pure geometry and fully testable; `pdf::render_report_pdf`
//! turns it into bytes and owns photo decoding and its fallback.

pub mod pdf;
pub mod sanitize;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::layout::{Align, DocumentFlow, PageChrome, PageConfig, PageLayout, ReportFont, TextStyle};
use crate::listings::MarketMetrics;
use crate::report::sanitize::{encode_for_pdf, is_heading, strip_markup};

pub use pdf::{render_report_pdf, RenderedReport, ReportError};

pub const REPORT_TITLE: &str = "Listing Strategy Report";
pub const HEADER_TEXT: &str = "Listings Department  |  Strategy Desk";
pub const FOOTER_TEXT: &str = "Confidential - prepared for the listing agent";
pub const BYLINE: &str = "Prepared by Rick, Listing Strategist";

/// Photo box on the cover, in millimetres.
pub const PHOTO_BOX_WIDTH_MM: f32 = 150.0;
pub const PHOTO_BOX_HEIGHT_MM: f32 = 100.0;

const TITLE_STYLE: TextStyle = TextStyle::new(ReportFont::HelveticaBold, 24.0);
const ADDRESS_STYLE: TextStyle = TextStyle::new(ReportFont::Helvetica, 14.0);
const BYLINE_STYLE: TextStyle = TextStyle::new(ReportFont::HelveticaOblique, 11.0);
const SECTION_STYLE: TextStyle = TextStyle::new(ReportFont::HelveticaBold, 15.0);
const SUBHEADING_STYLE: TextStyle = TextStyle::new(ReportFont::HelveticaBold, 12.0);
const BODY_STYLE: TextStyle = TextStyle::new(ReportFont::Helvetica, 11.0);

/// Everything the report needs, posted back by the client after `/plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportContent {
    pub address: String,
    pub metrics: MarketMetrics,
    pub narrative: String,
    pub generated_on: NaiveDate,
}

/// Pixel size of a successfully decoded cover photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoDimensions {
    pub width_px: u32,
    pub height_px: u32,
}

/// Scales a photo to fit the cover box, preserving aspect ratio.
pub fn fit_photo(dims: PhotoDimensions) -> (f32, f32) {
    if dims.width_px == 0 || dims.height_px == 0 {
        return (PHOTO_BOX_WIDTH_MM, PHOTO_BOX_HEIGHT_MM);
    }
    let aspect = dims.width_px as f32 / dims.height_px as f32;
    if aspect >= PHOTO_BOX_WIDTH_MM / PHOTO_BOX_HEIGHT_MM {
        (PHOTO_BOX_WIDTH_MM, PHOTO_BOX_WIDTH_MM / aspect)
    } else {
        (PHOTO_BOX_HEIGHT_MM * aspect, PHOTO_BOX_HEIGHT_MM)
    }
}

/// One-line metrics summary for the diagnostics section.
pub fn metrics_line(metrics: &MarketMetrics) -> String {
    format!(
        "MOI: {:.2} months  |  Absorption: {:.2} sales/month  |  Success ratio: {:.1}%  |  \
         Subject list price: {}  |  Avg sold price: {}  |  Window: {} months",
        metrics.months_of_inventory,
        metrics.absorption_rate,
        metrics.success_ratio,
        metrics.subject_price_found,
        metrics.avg_sold_price,
        metrics.lookback_months,
    )
}

/// Lays out the full report. `photo` is `None` when no usable photo exists.
pub fn build_report_layout(
    content: &ReportContent,
    photo: Option<PhotoDimensions>,
    config: PageConfig,
) -> Vec<PageLayout> {
    let mut flow = DocumentFlow::new(
        config,
        PageChrome {
            header: HEADER_TEXT.to_string(),
            footer: FOOTER_TEXT.to_string(),
        },
    );

    // Cover
    flow.add_space(25.0);
    flow.add_paragraph(REPORT_TITLE, TITLE_STYLE, Align::Center);
    flow.add_space(6.0);
    flow.add_paragraph(&encode_for_pdf(content.address.trim()), ADDRESS_STYLE, Align::Center);
    flow.add_space(10.0);
    match photo {
        Some(dims) => {
            let (w, h) = fit_photo(dims);
            flow.add_box(w, h, true);
        }
        None => flow.add_box(PHOTO_BOX_WIDTH_MM, PHOTO_BOX_HEIGHT_MM, false),
    }
    flow.add_space(10.0);
    flow.add_paragraph(BYLINE, BYLINE_STYLE, Align::Center);
    flow.add_paragraph(
        &content.generated_on.format("%B %-d, %Y").to_string(),
        BYLINE_STYLE,
        Align::Center,
    );

    // Diagnostics + narrative
    flow.new_page();
    flow.add_paragraph("Market Diagnostics", SECTION_STYLE, Align::Left);
    flow.add_space(2.0);
    flow.add_paragraph(&encode_for_pdf(&metrics_line(&content.metrics)), BODY_STYLE, Align::Left);
    flow.add_space(8.0);
    flow.add_paragraph("Analysis & Strategy", SECTION_STYLE, Align::Left);
    flow.add_space(2.0);

    for paragraph in crate::llm_client::split_paragraphs(&content.narrative) {
        for raw_line in paragraph.lines().filter(|l| !l.trim().is_empty()) {
            let style = if is_heading(raw_line) {
                SUBHEADING_STYLE
            } else {
                BODY_STYLE
            };
            let line = encode_for_pdf(&strip_markup(raw_line));
            flow.add_paragraph(&line, style, Align::Left);
        }
        flow.add_space(3.0);
    }

    flow.finish()
}

/// `Strategy_<address>.pdf` with runs of non-alphanumerics collapsed to `_`.
pub fn report_filename(address: &str) -> String {
    let mut slug = String::with_capacity(address.len());
    for c in address.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "Strategy_Report.pdf".to_string()
    } else {
        format!("Strategy_{slug}.pdf")
    }
}
