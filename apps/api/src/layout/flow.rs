//! Document flow: places text lines and boxes top-down across pages.
//!
//! Produces a backend-neutral list of positioned elements per page. All y
//! coordinates are millimetres from the TOP edge; the PDF writer flips them.
//! Every page gets the same running header and footer when it is opened.

use serde::Serialize;

use crate::layout::font_metrics::{get_metrics, PageConfig, ReportFont, PT_TO_MM};

/// Baseline offset below the top of a line box, as a fraction of font size.
const ASCENT_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TextStyle {
    pub font: ReportFont,
    pub size_pt: f32,
}

impl TextStyle {
    pub const fn new(font: ReportFont, size_pt: f32) -> Self {
        Self { font, size_pt }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
}

/// Something to draw on a page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Element {
    /// `y_mm` is the text baseline.
    Text {
        text: String,
        style: TextStyle,
        x_mm: f32,
        y_mm: f32,
    },
    /// Where the cover photo goes; `y_mm` is the top edge.
    Image {
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
    /// Outlined empty box standing in for a missing photo.
    Placeholder {
        x_mm: f32,
        y_mm: f32,
        width_mm: f32,
        height_mm: f32,
    },
    Rule { x1_mm: f32, x2_mm: f32, y_mm: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLayout {
    pub number: usize,
    pub elements: Vec<Element>,
}

#[cfg(test)]
impl PageLayout {
    /// All text on the page in draw order.
    pub fn text_lines(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Running header and footer drawn on every page.
#[derive(Debug, Clone)]
pub struct PageChrome {
    pub header: String,
    pub footer: String,
}

const CHROME_STYLE: TextStyle = TextStyle::new(ReportFont::HelveticaOblique, 8.0);

pub struct DocumentFlow {
    config: PageConfig,
    chrome: PageChrome,
    pages: Vec<PageLayout>,
    cursor_mm: f32,
}

impl DocumentFlow {
    /// Opens the first page.
    pub fn new(config: PageConfig, chrome: PageChrome) -> Self {
        let mut flow = Self {
            cursor_mm: config.body_top_mm(),
            config,
            chrome,
            pages: Vec::new(),
        };
        flow.open_page();
        flow
    }

    /// Starts a new page and moves the cursor to the top of its body.
    pub fn new_page(&mut self) {
        self.open_page();
    }

    fn open_page(&mut self) {
        let number = self.pages.len() + 1;
        let c = &self.config;
        let left = c.margin_mm;
        let right = c.width_mm - c.margin_mm;
        let header_baseline = c.margin_mm + CHROME_STYLE.size_pt * PT_TO_MM;
        let footer_baseline = c.height_mm - c.margin_mm;

        let mut elements = vec![
            Element::Text {
                text: self.chrome.header.clone(),
                style: CHROME_STYLE,
                x_mm: left,
                y_mm: header_baseline,
            },
            Element::Rule {
                x1_mm: left,
                x2_mm: right,
                y_mm: header_baseline + 2.0,
            },
            Element::Rule {
                x1_mm: left,
                x2_mm: right,
                y_mm: footer_baseline - CHROME_STYLE.size_pt * PT_TO_MM - 1.5,
            },
        ];

        let footer = format!("{}  |  Page {number}", self.chrome.footer);
        let footer_x = centered_x(&footer, CHROME_STYLE, c);
        elements.push(Element::Text {
            text: footer,
            style: CHROME_STYLE,
            x_mm: footer_x,
            y_mm: footer_baseline,
        });

        self.pages.push(PageLayout { number, elements });
        self.cursor_mm = self.config.body_top_mm();
    }

    fn current(&mut self) -> &mut PageLayout {
        let idx = self.pages.len() - 1;
        &mut self.pages[idx]
    }

    /// Moves the cursor down; a move past the body bottom simply clamps (the next line breaks the page).
    pub fn add_space(&mut self, mm: f32) {
        self.cursor_mm = (self.cursor_mm + mm).min(self.config.body_bottom_mm());
    }

    /// Wraps `text` to the body width and places each line, breaking pages as needed.
    pub fn add_paragraph(&mut self, text: &str, style: TextStyle, align: Align) {
        let lines = get_metrics(style.font).wrap(text, style.size_pt, self.config.text_width_mm());
        for line in lines {
            self.add_line(line, style, align);
        }
    }

    fn add_line(&mut self, line: String, style: TextStyle, align: Align) {
        let line_height = self.config.line_height_mm(style.size_pt);
        if self.cursor_mm + line_height > self.config.body_bottom_mm() {
            self.open_page();
        }

        let x_mm = match align {
            Align::Left => self.config.margin_mm,
            Align::Center => centered_x(&line, style, &self.config),
        };
        let y_mm = self.cursor_mm + style.size_pt * PT_TO_MM * ASCENT_RATIO;

        self.current().elements.push(Element::Text {
            text: line,
            style,
            x_mm,
            y_mm,
        });
        self.cursor_mm += line_height;
    }

    /// Reserves a horizontally centered box; `photo` decides whether it is an image slot or a blank placeholder.
    pub fn add_box(&mut self, width_mm: f32, height_mm: f32, photo: bool) {
        if self.cursor_mm + height_mm > self.config.body_bottom_mm() {
            self.open_page();
        }
        let x_mm = (self.config.width_mm - width_mm) / 2.0;
        let y_mm = self.cursor_mm;
        let element = if photo {
            Element::Image {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            }
        } else {
            Element::Placeholder {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            }
        };
        self.current().elements.push(element);
        self.cursor_mm += height_mm;
    }

    pub fn finish(self) -> Vec<PageLayout> {
        self.pages
    }
}

fn centered_x(text: &str, style: TextStyle, config: &PageConfig) -> f32 {
    let width = get_metrics(style.font).measure_mm(text, style.size_pt);
    ((config.width_mm - width) / 2.0).max(config.margin_mm)
}
