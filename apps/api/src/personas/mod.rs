// Persona workflows: Rick (strategist), Sherlock (visual analyst), Ava (copywriter).
// Each workflow is a straight line: validate → collaborators → compose → LLM.
// All LLM calls go through llm_client; nothing here talks to a provider directly.

pub mod composer;
pub mod handlers;
pub mod prompts;
pub mod workflow;

use serde::{Deserialize, Serialize};

/// The three fixed assistant roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Strategist,
    Analyst,
    Copywriter,
}

/// Display metadata for a persona.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaProfile {
    pub persona: Persona,
    pub name: &'static str,
    pub title: &'static str,
    pub tone: &'static str,
    pub inputs: &'static [&'static str],
}

pub const PERSONAS: [Persona; 3] = [Persona::Strategist, Persona::Analyst, Persona::Copywriter];

impl Persona {
    pub fn profile(&self) -> PersonaProfile {
        match self {
            Persona::Strategist => PersonaProfile {
                persona: *self,
                name: "Rick",
                title: "Listing Strategist",
                tone: "Direct, numbers-first, and candid about pricing risk.",
                inputs: &["address", "csv", "lookback_months"],
            },
            Persona::Analyst => PersonaProfile {
                persona: *self,
                name: "Sherlock",
                title: "Visual Property Analyst",
                tone: "Observant and forensic; names what the photo shows before judging it.",
                inputs: &["image", "location", "question"],
            },
            Persona::Copywriter => PersonaProfile {
                persona: *self,
                name: "Ava",
                title: "Listing Copywriter",
                tone: "Warm, aspirational, and specific; no clichés, no fair-housing red flags.",
                inputs: &["specs"],
            },
        }
    }

    pub fn name(&self) -> &'static str {
        self.profile().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_serde_is_snake_case() {
        assert_eq!(serde_json::to_string(&Persona::Strategist).unwrap(), r#""strategist""#);
        let p: Persona = serde_json::from_str(r#""copywriter""#).unwrap();
        assert_eq!(p, Persona::Copywriter);
    }

    #[test]
    fn test_profiles_are_distinct() {
        let names: Vec<_> = PERSONAS.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Rick", "Sherlock", "Ava"]);
        assert!(Persona::Strategist.profile().inputs.contains(&"csv"));
        assert!(Persona::Analyst.profile().inputs.contains(&"image"));
    }
}
