//! `How`, `Why`, `Citations` and the shared `Reference` element

use chrono::{DateTime, Utc};

use crate::definitions::{CiteType, IntoUtc};

/// External resource attached to a section
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    pub uri: String,
    pub ref_type: Option<String>,
    pub mimetype: Option<String>,
    pub meaning: Option<String>,
}

impl Reference {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, ref_type: impl Into<String>) -> Self {
        self.ref_type = Some(ref_type.into());
        self
    }

    pub fn with_mimetype(mut self, mimetype: impl Into<String>) -> Self {
        self.mimetype = Some(mimetype.into());
        self
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }
}

/// Replace the first entry of `list`, or push when it is empty
pub(crate) fn set_first(list: &mut Vec<String>, text: impl Into<String>) {
    let text = text.into();
    match list.first_mut() {
        Some(first) => *first = text,
        None => list.push(text),
    }
}

/// How the event was detected: instrument descriptions and references
#[derive(Debug, Clone, PartialEq, Default)]
pub struct How {
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl How {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn add_reference(&mut self, reference: Reference) -> &mut Self {
        self.references.push(reference);
        self
    }
}

/// Scientific interpretation of the event
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Why {
    /// Author's estimate of the event's importance, 0..=1
    pub importance: Option<f64>,
    pub expires: Option<DateTime<Utc>>,
    pub names: Vec<String>,
    pub concepts: Vec<String>,
    pub inferences: Vec<Inference>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl Why {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_importance(&mut self, importance: f64) -> &mut Self {
        self.importance = Some(importance);
        self
    }

    pub fn set_expires(&mut self, expires: impl IntoUtc) -> &mut Self {
        self.expires = Some(expires.into_utc());
        self
    }

    /// Replace the first description, adding one when there is none
    pub fn set_description(&mut self, text: impl Into<String>) -> &mut Self {
        set_first(&mut self.descriptions, text);
        self
    }

    pub fn add_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn add_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.names.push(name.into());
        self
    }

    pub fn add_concept(&mut self, concept: impl Into<String>) -> &mut Self {
        self.concepts.push(concept.into());
        self
    }

    pub fn add_inference(&mut self, inference: Inference) -> &mut Self {
        self.inferences.push(inference);
        self
    }

    pub fn add_reference(&mut self, reference: Reference) -> &mut Self {
        self.references.push(reference);
        self
    }
}

/// A classification hypothesis within `Why`
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Inference {
    pub probability: Option<f64>,
    pub relation: Option<String>,
    pub names: Vec<String>,
    pub concepts: Vec<String>,
    pub descriptions: Vec<String>,
    pub references: Vec<Reference>,
}

impl Inference {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = Some(probability);
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn with_concept(mut self, concept: impl Into<String>) -> Self {
        self.concepts.push(concept.into());
        self
    }

    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.descriptions.push(text.into());
        self
    }

    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }
}

/// A cited packet and how this packet relates to it
#[derive(Debug, Clone, PartialEq)]
pub struct EventIvorn {
    pub ivorn: String,
    pub cite: CiteType,
}

impl EventIvorn {
    pub fn new(ivorn: impl Into<String>, cite: CiteType) -> Self {
        Self {
            ivorn: ivorn.into(),
            cite,
        }
    }
}

/// Packets this one follows up, supersedes or retracts
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Citations {
    pub event_ivorns: Vec<EventIvorn>,
    pub description: Option<String>,
}

impl Citations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event_ivorn(&mut self, event_ivorn: EventIvorn) -> &mut Self {
        self.event_ivorns.push(event_ivorn);
        self
    }

    pub fn set_description(&mut self, text: impl Into<String>) -> &mut Self {
        self.description = Some(text.into());
        self
    }
}
