//! Static font-metric tables for the PDF base-14 fonts used in reports.
//!
//! Character widths are in em units (AFM widths / 1000). The report writer uses
//! built-in fonts, which have no embedded metrics we can query at runtime, so
//! word wrapping measures text against these tables instead.
//! All tables cover ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

/// Points to millimetres.
pub const PT_TO_MM: f32 = 25.4 / 72.0;

// ────────────────────────────────────────────────────────────────────────────
// Font enum
// ────────────────────────────────────────────────────────────────────────────

/// Fonts the report renderer draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportFont {
    Helvetica,
    HelveticaBold,
    /// Same advance widths as regular Helvetica.
    HelveticaOblique,
}

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry for a report, all lengths in millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageConfig {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    /// Space reserved at the top of every page for the running header.
    pub header_band_mm: f32,
    /// Space reserved at the bottom of every page for the running footer.
    pub footer_band_mm: f32,
    /// Line pitch as a multiple of font size.
    pub line_spacing: f32,
}

impl PageConfig {
    pub fn text_width_mm(&self) -> f32 {
        self.width_mm - 2.0 * self.margin_mm
    }

    /// First usable y (from the top edge) below the header band.
    pub fn body_top_mm(&self) -> f32 {
        self.margin_mm + self.header_band_mm
    }

    /// Last usable y (from the top edge) above the footer band.
    pub fn body_bottom_mm(&self) -> f32 {
        self.height_mm - self.margin_mm - self.footer_band_mm
    }

    pub fn line_height_mm(&self, font_size_pt: f32) -> f32 {
        font_size_pt * PT_TO_MM * self.line_spacing
    }
}

/// US letter (215.9 × 279.4 mm) with 20 mm margins.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        width_mm: 215.9,
        height_mm: 279.4,
        margin_mm: 20.0,
        header_band_mm: 12.0,
        footer_band_mm: 10.0,
        line_spacing: 1.35,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a font.
///
/// `widths[i]` = width of ASCII character `(i + 32)` in em, covering 0x20 (space) through 0x7E (~).
pub struct FontMetricTable {
    widths: [f32; 95],
    /// Fallback width for non-ASCII characters (codepoints > 0x7E).
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    /// Measures the rendered width of a string in em units.
    ///
    /// Non-ASCII characters fall back to `average_char_width`.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    self.widths[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum()
    }

    /// Rendered width in millimetres at `font_size_pt`.
    pub fn measure_mm(&self, s: &str, font_size_pt: f32) -> f32 {
        self.measure_str(s) * font_size_pt * PT_TO_MM
    }

    /// Greedy word wrap at `max_width_mm`. Words wider than a full line are split by character.
    pub fn wrap(&self, s: &str, font_size_pt: f32, max_width_mm: f32) -> Vec<String> {
        let max_em = max_width_mm / (font_size_pt * PT_TO_MM);
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in s.split_whitespace() {
            for piece in self.split_oversized(word, max_em) {
                let piece_w = self.measure_str(&piece);
                if current.is_empty() {
                    current_width = piece_w;
                    current = piece;
                } else if current_width + self.space_width + piece_w > max_em {
                    lines.push(std::mem::take(&mut current));
                    current_width = piece_w;
                    current = piece;
                } else {
                    current.push(' ');
                    current.push_str(&piece);
                    current_width += self.space_width + piece_w;
                }
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn split_oversized(&self, word: &str, max_em: f32) -> Vec<String> {
        if self.measure_str(word) <= max_em {
            return vec![word.to_string()];
        }
        let mut pieces = Vec::new();
        let mut piece = String::new();
        let mut width = 0.0_f32;
        for c in word.chars() {
            let w = self.measure_str(c.encode_utf8(&mut [0; 4]));
            if !piece.is_empty() && width + w > max_em {
                pieces.push(std::mem::take(&mut piece));
                width = 0.0;
            }
            piece.push(c);
            width += w;
        }
        if !piece.is_empty() {
            pieces.push(piece);
        }
        pieces
    }
}

/// Returns the metric table for a font.
pub fn get_metrics(font: ReportFont) -> &'static FontMetricTable {
    match font {
        ReportFont::Helvetica | ReportFont::HelveticaOblique => &HELVETICA_TABLE,
        ReportFont::HelveticaBold => &HELVETICA_BOLD_TABLE,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width tables  (95 ASCII printable characters each)
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

static HELVETICA_BOLD_TABLE: FontMetricTable = FontMetricTable {
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.333, 0.474, 0.556, 0.556, 0.889, 0.722, 0.238, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.333, 0.333, 0.584, 0.584, 0.584, 0.611, 0.975,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.722, 0.722, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.556, 0.722, 0.611, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.333, 0.278, 0.333, 0.584, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.611, 0.556, 0.611, 0.556, 0.333, 0.611, 0.611, 0.278, 0.278, 0.556, 0.278, 0.889,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.611, 0.611, 0.611, 0.611, 0.389, 0.556, 0.333, 0.611, 0.556, 0.778, 0.556, 0.556, 0.500,
        // {      |      }      ~
        0.389, 0.280, 0.389, 0.584,
    ],
    average_char_width: 0.611,
    space_width: 0.278,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_known_widths() {
        let m = get_metrics(ReportFont::Helvetica);
        assert!((m.measure_str("ii") - 0.444).abs() < 1e-6);
        assert!((m.measure_str("W") - 0.944).abs() < 1e-6);
        // non-ASCII falls back to average width
        assert!((m.measure_str("é") - m.average_char_width).abs() < 1e-6);
    }

    #[test]
    fn test_bold_is_wider_than_regular() {
        let text = "Market Diagnostics";
        assert!(
            get_metrics(ReportFont::HelveticaBold).measure_str(text)
                > get_metrics(ReportFont::Helvetica).measure_str(text)
        );
    }

    #[test]
    fn test_wrap_respects_width() {
        let m = get_metrics(ReportFont::Helvetica);
        let text = "Inventory is tight and well priced homes are going under contract within two weeks of listing.";
        let lines = m.wrap(text, 11.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(m.measure_mm(line, 11.0) <= 60.0 + 1e-3, "line too wide: {line:?}");
        }
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn test_wrap_splits_oversized_word() {
        let m = get_metrics(ReportFont::Helvetica);
        let url = "https://example.com/".repeat(10);
        let lines = m.wrap(&url, 11.0, 40.0);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), url);
    }

    #[test]
    fn test_wrap_empty_is_no_lines() {
        assert!(get_metrics(ReportFont::Helvetica).wrap("   ", 11.0, 100.0).is_empty());
    }

    #[test]
    fn test_default_page_geometry() {
        let config = default_page_config();
        assert!((config.text_width_mm() - 175.9).abs() < 1e-3);
        assert!(config.body_top_mm() < config.body_bottom_mm());
    }
}
