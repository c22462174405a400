//! PDF writer for the strategy report.
//!
//! Draws the pages produced by `build_report_layout` with printpdf's built-in
//! Helvetica family. CPU-bound: call from `tokio::task::spawn_blocking`.

use std::path::Path;

use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::layout::{Element, PageConfig, PageLayout, ReportFont};
use crate::report::{build_report_layout, PhotoDimensions, ReportContent, REPORT_TITLE};

/// Resolution the cover photo is placed at before scaling into its box.
const PHOTO_DPI: f32 = 300.0;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("PDF backend error: {0}")]
    Pdf(#[from] printpdf::Error),
}

#[derive(Debug)]
pub struct RenderedReport {
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub photo_embedded: bool,
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    oblique: IndirectFontRef,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ReportError> {
        Ok(Self {
            regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
            bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
            oblique: doc.add_builtin_font(BuiltinFont::HelveticaOblique)?,
        })
    }

    fn get(&self, font: ReportFont) -> &IndirectFontRef {
        match font {
            ReportFont::Helvetica => &self.regular,
            ReportFont::HelveticaBold => &self.bold,
            ReportFont::HelveticaOblique => &self.oblique,
        }
    }
}

/// Renders the report. A missing or undecodable photo leaves a blank box on the cover.
pub fn render_report_pdf(
    content: &ReportContent,
    photo_path: Option<&Path>,
    config: PageConfig,
) -> Result<RenderedReport, ReportError> {
    let photo = photo_path.and_then(decode_photo);
    let dims = photo.as_ref().map(|img| {
        let (width_px, height_px) = img.dimensions();
        PhotoDimensions {
            width_px,
            height_px,
        }
    });

    let pages = build_report_layout(content, dims, config.clone());

    let (doc, first_page, first_layer) = PdfDocument::new(
        REPORT_TITLE,
        Mm(config.width_mm),
        Mm(config.height_mm),
        "Layer 1",
    );
    let fonts = Fonts::load(&doc)?;

    let mut photo_embedded = false;
    for (i, page) in pages.iter().enumerate() {
        let layer = if i == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (p, l) = doc.add_page(Mm(config.width_mm), Mm(config.height_mm), "Layer 1");
            doc.get_page(p).get_layer(l)
        };
        photo_embedded |= draw_page(&layer, page, &fonts, photo.as_ref(), &config);
    }

    let bytes = doc.save_to_bytes()?;
    debug!(
        "Report rendered: {} pages, {} bytes, photo={}",
        pages.len(),
        bytes.len(),
        photo_embedded
    );

    Ok(RenderedReport {
        bytes,
        page_count: pages.len(),
        photo_embedded,
    })
}

fn decode_photo(path: &Path) -> Option<DynamicImage> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Cover photo {} unreadable, using blank box: {e}", path.display());
            return None;
        }
    };
    match image_crate::load_from_memory(&bytes) {
        Ok(img) => Some(DynamicImage::ImageRgb8(img.to_rgb8())),
        Err(e) => {
            warn!("Cover photo could not be decoded, using blank box: {e}");
            None
        }
    }
}

/// Returns true when a photo was placed on this page.
fn draw_page(
    layer: &PdfLayerReference,
    page: &PageLayout,
    fonts: &Fonts,
    photo: Option<&DynamicImage>,
    config: &PageConfig,
) -> bool {
    let flip = |y_top: f32| Mm(config.height_mm - y_top);
    let mut placed = false;

    layer.set_fill_color(Color::Rgb(Rgb::new(0.1, 0.1, 0.1, None)));
    layer.set_outline_color(Color::Rgb(Rgb::new(0.6, 0.6, 0.6, None)));
    layer.set_outline_thickness(0.5);

    for element in &page.elements {
        match element {
            Element::Text {
                text,
                style,
                x_mm,
                y_mm,
            } => {
                layer.use_text(text.as_str(), style.size_pt, Mm(*x_mm), flip(*y_mm), fonts.get(style.font));
            }
            Element::Rule { x1_mm, x2_mm, y_mm } => {
                layer.add_line(Line {
                    points: vec![
                        (Point::new(Mm(*x1_mm), flip(*y_mm)), false),
                        (Point::new(Mm(*x2_mm), flip(*y_mm)), false),
                    ],
                    is_closed: false,
                });
            }
            Element::Image {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            } => match photo {
                Some(img) => {
                    place_photo(layer, img, *x_mm, config.height_mm - (y_mm + height_mm), *width_mm, *height_mm);
                    placed = true;
                }
                None => outline_box(layer, *x_mm, *y_mm, *width_mm, *height_mm, config),
            },
            Element::Placeholder {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            } => outline_box(layer, *x_mm, *y_mm, *width_mm, *height_mm, config),
        }
    }
    placed
}

fn place_photo(
    layer: &PdfLayerReference,
    img: &DynamicImage,
    x_mm: f32,
    bottom_mm: f32,
    width_mm: f32,
    height_mm: f32,
) {
    let (width_px, height_px) = img.dimensions();
    let natural_w = width_px.max(1) as f32 * 25.4 / PHOTO_DPI;
    let natural_h = height_px.max(1) as f32 * 25.4 / PHOTO_DPI;

    Image::from_dynamic_image(img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x_mm)),
            translate_y: Some(Mm(bottom_mm)),
            scale_x: Some(width_mm / natural_w),
            scale_y: Some(height_mm / natural_h),
            dpi: Some(PHOTO_DPI),
            ..Default::default()
        },
    );
}

fn outline_box(layer: &PdfLayerReference, x_mm: f32, y_mm: f32, width_mm: f32, height_mm: f32, config: &PageConfig) {
    let top = config.height_mm - y_mm;
    let bottom = top - height_mm;
    layer.add_line(Line {
        points: vec![
            (Point::new(Mm(x_mm), Mm(top)), false),
            (Point::new(Mm(x_mm + width_mm), Mm(top)), false),
            (Point::new(Mm(x_mm + width_mm), Mm(bottom)), false),
            (Point::new(Mm(x_mm), Mm(bottom)), false),
        ],
        is_closed: true,
    });
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use chrono::NaiveDate;
    use printpdf::image_crate::{ImageOutputFormat, RgbImage};

    use super::*;
    use crate::layout::default_page_config;
    use crate::listings::MarketMetrics;

    fn content() -> ReportContent {
        ReportContent {
            address: "742 Evergreen Terrace".into(),
            metrics: MarketMetrics {
                months_of_inventory: 99.0,
                absorption_rate: 0.0,
                success_ratio: 0.0,
                subject_price_found: "N/A".into(),
                avg_sold_price: "N/A".into(),
                sold_count: 0,
                active_count: 4,
                failed_count: 0,
                lookback_months: 6,
            },
            narrative: "## Outlook\n\nNo closed sales in the window \u{2014} price conservatively.".into(),
            generated_on: NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        }
    }

    #[test]
    fn test_renders_without_photo() {
        let report = render_report_pdf(&content(), None, default_page_config()).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
        assert_eq!(report.page_count, 2);
        assert!(!report.photo_embedded);
    }

    #[test]
    fn test_corrupt_photo_falls_back_to_blank_box() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a jpeg").unwrap();

        let report = render_report_pdf(&content(), Some(file.path()), default_page_config()).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
        assert!(!report.photo_embedded);
    }

    #[test]
    fn test_missing_photo_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let report =
            render_report_pdf(&content(), Some(&dir.path().join("gone.jpg")), default_page_config()).unwrap();
        assert!(!report.photo_embedded);
    }

    #[test]
    fn test_embeds_decodable_photo() {
        let mut png = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(60, 40))
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&png).unwrap();

        let report = render_report_pdf(&content(), Some(file.path()), default_page_config()).unwrap();
        assert!(report.bytes.starts_with(b"%PDF"));
        assert!(report.photo_embedded);
    }
}
