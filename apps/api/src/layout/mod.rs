// Report layout: static font metrics for word wrapping and a top-down page flow.
// Pure geometry, no PDF types; report::pdf draws the result.

pub mod flow;
pub mod font_metrics;

pub use flow::{Align, DocumentFlow, Element, PageChrome, PageLayout, TextStyle};
pub use font_metrics::{default_page_config, PageConfig, ReportFont};
