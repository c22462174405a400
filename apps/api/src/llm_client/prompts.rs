// Shared prompt fragments used by more than one persona.
// Each persona's full template lives in personas/prompts.rs.

/// Appended to every persona: keeps the model inside the data it was given.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every figure you cite on the DATA INTELLIGENCE section. \
    If a figure is marked N/A or missing, say so plainly instead of estimating it. \
    Do NOT invent comparable sales, addresses, or prices.";

/// Appended to every persona: output formatting the report renderer can handle.
pub const FORMAT_INSTRUCTION: &str = "\
    Write in plain paragraphs separated by blank lines. \
    Use short markdown headings for sections. Do not use tables.";
