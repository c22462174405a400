//! Prompt composition: renders each persona's template from its request and the
//! data gathered for it. Pure string work: no I/O, no business rules beyond formatting.

use bytes::Bytes;
use thiserror::Error;

use crate::listings::MarketMetrics;
use crate::llm_client::prompts::{FORMAT_INSTRUCTION, GROUNDING_INSTRUCTION};
use crate::llm_client::{PromptPart, PromptPayload};
use crate::personas::prompts::{
    ANALYST_DEFAULT_QUESTION, ANALYST_SYSTEM_TEMPLATE, COPYWRITER_PROMPT_TEMPLATE,
    COPYWRITER_SYSTEM, NO_VELOCITY_READING, STRATEGIST_PROMPT_TEMPLATE, STRATEGIST_SYSTEM,
};
use crate::personas::Persona;

const EMPTY_KNOWLEDGE_BASE: &str = "(no house notes on file)";

// ────────────────────────────────────────────────────────────────────────────
// Requests
// ────────────────────────────────────────────────────────────────────────────

/// A photo uploaded by the agent.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub media_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone)]
pub struct StrategistRequest {
    pub address: String,
    pub csv: Bytes,
    pub lookback_months: u32,
}

#[derive(Debug, Clone)]
pub struct AnalystRequest {
    pub image: Option<UploadedImage>,
    pub location: String,
    pub question: String,
}

#[derive(Debug, Clone)]
pub struct CopywriterRequest {
    pub specs: String,
}

/// One persona's inputs, built from user input and consumed once by the composer.
#[derive(Debug, Clone)]
pub enum PersonaRequest {
    Strategist(StrategistRequest),
    Analyst(AnalystRequest),
    Copywriter(CopywriterRequest),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MissingInput {
    #[error("{0} is required")]
    Field(&'static str),
}

impl PersonaRequest {
    pub fn persona(&self) -> Persona {
        match self {
            PersonaRequest::Strategist(_) => Persona::Strategist,
            PersonaRequest::Analyst(_) => Persona::Analyst,
            PersonaRequest::Copywriter(_) => Persona::Copywriter,
        }
    }
}

// Required-field checks, run by workflows before any collaborator is called.

impl StrategistRequest {
    pub fn validate(&self) -> Result<(), MissingInput> {
        if self.address.trim().is_empty() {
            return Err(MissingInput::Field("address"));
        }
        if self.csv.is_empty() {
            return Err(MissingInput::Field("csv"));
        }
        if self.lookback_months == 0 {
            return Err(MissingInput::Field("lookback_months (> 0)"));
        }
        Ok(())
    }
}

impl AnalystRequest {
    pub fn validate(&self) -> Result<(), MissingInput> {
        if self.image.as_ref().map_or(true, |i| i.data.is_empty()) {
            return Err(MissingInput::Field("image"));
        }
        Ok(())
    }
}

impl CopywriterRequest {
    pub fn validate(&self) -> Result<(), MissingInput> {
        if self.specs.trim().is_empty() {
            return Err(MissingInput::Field("specs"));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Composition
// ────────────────────────────────────────────────────────────────────────────

/// Everything gathered by the workflow before composing.
#[derive(Debug, Clone, Default)]
pub struct PromptContext {
    pub metrics: Option<MarketMetrics>,
    pub web_intel: String,
    pub knowledge_base: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ComposeError {
    #[error("strategist prompt needs computed market metrics")]
    MissingMetrics,
}

pub fn compose(request: &PersonaRequest, context: &PromptContext) -> Result<PromptPayload, ComposeError> {
    match request {
        PersonaRequest::Strategist(r) => {
            let metrics = context.metrics.as_ref().ok_or(ComposeError::MissingMetrics)?;
            Ok(compose_strategist(&r.address, metrics, &context.web_intel))
        }
        PersonaRequest::Analyst(r) => Ok(compose_analyst(r, &context.web_intel, &context.knowledge_base)),
        PersonaRequest::Copywriter(r) => Ok(compose_copywriter(r)),
    }
}

pub fn compose_strategist(address: &str, metrics: &MarketMetrics, web_intel: &str) -> PromptPayload {
    let lookback = metrics.lookback_months.to_string();
    let moi = format!("{:.2}", metrics.months_of_inventory);
    let absorption = format!("{:.2}", metrics.absorption_rate);
    let success = format!("{:.1}", metrics.success_ratio);
    let failure = format!("{:.1}", metrics.failure_rate());
    let sold = metrics.sold_count.to_string();
    let active = metrics.active_count.to_string();
    let failed = metrics.failed_count.to_string();

    let prompt = fill_template(
        STRATEGIST_PROMPT_TEMPLATE,
        &[
            ("address", address.trim()),
            ("lookback_months", &lookback),
            ("moi", &moi),
            ("absorption_rate", &absorption),
            ("success_ratio", &success),
            ("failure_rate", &failure),
            ("sold_count", &sold),
            ("active_count", &active),
            ("failed_count", &failed),
            ("subject_price", &metrics.subject_price_found),
            ("avg_sold_price", &metrics.avg_sold_price),
            ("market_reading", market_reading(metrics)),
            ("web_intel", web_intel),
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("format_instruction", FORMAT_INSTRUCTION),
        ],
    );

    PromptPayload::text(STRATEGIST_SYSTEM, prompt)
}

/// Parts in order: question text, then the photo when one was uploaded.
pub fn compose_analyst(request: &AnalystRequest, web_intel: &str, knowledge_base: &str) -> PromptPayload {
    let location = match request.location.trim() {
        "" => "an unspecified location",
        loc => loc,
    };
    let knowledge_base = match knowledge_base.trim() {
        "" => EMPTY_KNOWLEDGE_BASE,
        kb => kb,
    };

    let system = fill_template(
        ANALYST_SYSTEM_TEMPLATE,
        &[
            ("location", location),
            ("web_intel", web_intel),
            ("knowledge_base", knowledge_base),
            ("grounding_instruction", GROUNDING_INSTRUCTION),
            ("format_instruction", FORMAT_INSTRUCTION),
        ],
    );

    let question = match request.question.trim() {
        "" => ANALYST_DEFAULT_QUESTION.to_string(),
        q => q.to_string(),
    };

    let mut parts = vec![PromptPart::Text(question)];
    if let Some(image) = &request.image {
        parts.push(PromptPart::Image {
            media_type: image.media_type.clone(),
            data: image.data.clone(),
        });
    }

    PromptPayload { system, parts }
}

pub fn compose_copywriter(request: &CopywriterRequest) -> PromptPayload {
    let prompt = fill_template(
        COPYWRITER_PROMPT_TEMPLATE,
        &[("specs", request.specs.trim()), ("format_instruction", FORMAT_INSTRUCTION)],
    );
    PromptPayload::text(COPYWRITER_SYSTEM, prompt)
}

/// Fills `{name}` markers in one left-to-right pass. Substituted text is never
/// rescanned, so braces inside user input or search results stay literal.
/// Unknown markers are kept as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let filled = tail.find('}').and_then(|end| {
            let key = &tail[1..end];
            values
                .iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (end, *value))
        });
        match filled {
            Some((end, value)) => {
                out.push_str(value);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Conventional MOI bands: under 4 favors sellers, over 6 favors buyers.
pub fn market_reading(metrics: &MarketMetrics) -> &'static str {
    if !metrics.has_sales_velocity() {
        return NO_VELOCITY_READING;
    }
    match metrics.months_of_inventory {
        moi if moi < 4.0 => "Seller's market (under 4 months of inventory).",
        moi if moi <= 6.0 => "Balanced market (4 to 6 months of inventory).",
        _ => "Buyer's market (over 6 months of inventory).",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::personas::prompts::SECTION_HEADERS;

    fn metrics() -> MarketMetrics {
        MarketMetrics {
            months_of_inventory: 3.0,
            absorption_rate: 1.67,
            success_ratio: 83.3,
            subject_price_found: "$725,000".to_string(),
            avg_sold_price: "$445,000.00".to_string(),
            sold_count: 10,
            active_count: 5,
            failed_count: 2,
            lookback_months: 6,
        }
    }

    fn only_text(payload: &PromptPayload) -> &str {
        match payload.parts.as_slice() {
            [PromptPart::Text(t)] => t,
            other => panic!("expected a single text part, got {other:?}"),
        }
    }

    fn assert_headers_in_order(text: &str) {
        let mut last = 0;
        for header in SECTION_HEADERS {
            let pos = text[last..]
                .find(header)
                .unwrap_or_else(|| panic!("missing header {header}"));
            last += pos + header.len();
        }
    }

    #[test]
    fn test_strategist_prompt_interpolates_metrics() {
        let payload = compose_strategist(" 123 Oak Ave ", &metrics(), "- Rates: easing");
        let text = only_text(&payload);
        assert_eq!(payload.system, STRATEGIST_SYSTEM);
        assert!(text.contains("listing strategy for 123 Oak Ave."));
        assert!(text.contains("Months of inventory (MOI): 3.00"));
        assert!(text.contains("Success ratio: 83.3% (failure rate 16.7%)"));
        assert!(text.contains("Sold: 10 | Active: 5 | Expired/withdrawn/cancelled: 2"));
        assert!(text.contains("Average sold price: $445,000.00"));
        assert!(text.contains("Seller's market"));
        assert!(text.contains("- Rates: easing"));
        assert!(!text.contains('{'), "all placeholders must be filled");
        assert_headers_in_order(text);
    }

    #[test]
    fn test_compose_strategist_without_metrics_fails() {
        let request = PersonaRequest::Strategist(StrategistRequest {
            address: "1 Main".into(),
            csv: Bytes::from_static(b"status\nsold\n"),
            lookback_months: 6,
        });
        assert_eq!(
            compose(&request, &PromptContext::default()).unwrap_err(),
            ComposeError::MissingMetrics
        );
    }

    #[test]
    fn test_analyst_parts_are_question_then_image() {
        let request = AnalystRequest {
            image: Some(UploadedImage {
                media_type: "image/jpeg".into(),
                data: Bytes::from_static(b"jpg"),
            }),
            location: "Austin, TX".into(),
            question: "Is the roof original?".into(),
        };
        let payload = compose_analyst(&request, "- Austin: hot", "--- pricing.md ---\nNotes");

        assert!(payload.system.contains("a home in Austin, TX"));
        assert!(payload.system.contains("--- pricing.md ---"));
        assert_headers_in_order(&payload.system);
        assert!(payload.has_image());
        assert_eq!(payload.parts[0], PromptPart::Text("Is the roof original?".into()));
        assert!(matches!(&payload.parts[1], PromptPart::Image { media_type, .. } if media_type == "image/jpeg"));
    }

    #[test]
    fn test_analyst_defaults_question_and_knowledge_base() {
        let request = AnalystRequest {
            image: None,
            location: "  ".into(),
            question: "".into(),
        };
        let payload = compose_analyst(&request, "none", "");
        assert_eq!(payload.parts, vec![PromptPart::Text(ANALYST_DEFAULT_QUESTION.into())]);
        assert!(payload.system.contains(EMPTY_KNOWLEDGE_BASE));
        assert!(payload.system.contains("an unspecified location"));
    }

    #[test]
    fn test_copywriter_prompt_contains_specs() {
        let payload = compose_copywriter(&CopywriterRequest {
            specs: "4 bed, 3 bath, new quartz kitchen".into(),
        });
        let text = only_text(&payload);
        assert!(text.contains("4 bed, 3 bath, new quartz kitchen"));
        assert_headers_in_order(text);
    }

    #[test]
    fn test_validation_catches_missing_inputs() {
        let strategist = StrategistRequest {
            address: "  ".into(),
            csv: Bytes::from_static(b"x"),
            lookback_months: 6,
        };
        assert_eq!(strategist.validate(), Err(MissingInput::Field("address")));

        let no_csv = StrategistRequest {
            address: "1 Main".into(),
            csv: Bytes::new(),
            lookback_months: 6,
        };
        assert_eq!(no_csv.validate(), Err(MissingInput::Field("csv")));

        let no_window = StrategistRequest {
            address: "1 Main".into(),
            csv: Bytes::from_static(b"x"),
            lookback_months: 0,
        };
        assert_eq!(no_window.validate(), Err(MissingInput::Field("lookback_months (> 0)")));

        let copy = CopywriterRequest { specs: "\n".into() };
        assert_eq!(copy.validate(), Err(MissingInput::Field("specs")));
        assert_eq!(PersonaRequest::Copywriter(copy).persona(), Persona::Copywriter);

        let analyst = AnalystRequest {
            image: Some(UploadedImage {
                media_type: "image/png".into(),
                data: Bytes::new(),
            }),
            location: "Austin".into(),
            question: "Any water damage?".into(),
        };
        assert_eq!(analyst.validate(), Err(MissingInput::Field("image")));
    }

    #[test]
    fn test_braces_in_user_text_stay_literal() {
        let payload = compose_strategist("12 {sold_count} Loop", &metrics(), "- Tip: ask about {address}");
        let text = only_text(&payload);
        assert!(text.contains("listing strategy for 12 {sold_count} Loop."));
        assert!(text.contains("- Tip: ask about {address}"));

        let payload = compose_copywriter(&CopywriterRequest {
            specs: "3 bed; note {format_instruction}".into(),
        });
        let text = only_text(&payload);
        assert!(text.contains("3 bed; note {format_instruction}"));
        assert_eq!(text.matches(FORMAT_INSTRUCTION).count(), 1);

        let analyst = AnalystRequest {
            image: None,
            location: "{knowledge_base} Heights".into(),
            question: "".into(),
        };
        let payload = compose_analyst(&analyst, "none", "--- notes.md ---\nPrivate");
        assert!(payload.system.contains("a home in {knowledge_base} Heights"));
        assert_eq!(payload.system.matches("Private").count(), 1);
    }

    #[test]
    fn test_fill_template_keeps_unknown_and_unclosed_markers() {
        assert_eq!(
            fill_template("{a} and {b} and {a", &[("a", "x{b}")]),
            "x{b} and {b} and {a"
        );
    }

    #[test]
    fn test_market_reading_bands() {
        let mut m = metrics();
        m.months_of_inventory = 5.0;
        assert!(market_reading(&m).starts_with("Balanced"));
        m.months_of_inventory = 8.2;
        assert!(market_reading(&m).starts_with("Buyer's"));
        m.absorption_rate = 0.0;
        m.months_of_inventory = 99.0;
        assert_eq!(market_reading(&m), NO_VELOCITY_READING);
    }
}
