use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed dependency between two components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    Uses,
    Requires,
    Extends,
    Calls,
    DependsOn,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Uses => "uses",
            RelationshipKind::Requires => "requires",
            RelationshipKind::Extends => "extends",
            RelationshipKind::Calls => "calls",
            RelationshipKind::DependsOn => "depends_on",
        }
    }

    /// Human label ("depends on" rather than "depends_on")
    pub fn label(&self) -> &'static str {
        match self {
            RelationshipKind::DependsOn => "depends on",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse evidentiary weight of an inferred relationship. Not a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Confidence {
    /// Bare name co-occurrence, may be a false positive
    Low = 1,
    /// Implicit syntactic invocation such as `/deploy`
    Medium = 2,
    /// Explicit structured declaration
    High = 3,
}

impl Confidence {
    pub fn level(self) -> u8 {
        self as u8
    }

    /// Low-tier links only surface loose couplings; a human should confirm
    /// them before anything acts on them.
    pub fn needs_review(self) -> bool {
        self == Confidence::Low
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.level()
    }
}

impl TryFrom<u8> for Confidence {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Confidence::Low),
            2 => Ok(Confidence::Medium),
            3 => Ok(Confidence::High),
            other => Err(format!("confidence must be 1, 2 or 3 (got {})", other)),
        }
    }
}

/// Uniqueness key: at most one relationship per `(from, to, kind)`
pub type RelationshipKey = (String, String, RelationshipKind);

/// An inferred edge between two components of the same snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    pub from_component_id: String,
    pub to_component_id: String,
    pub kind: RelationshipKind,
    pub confidence: Confidence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Relationship {
    pub fn new(
        from: impl Into<String>,
        to: impl Into<String>,
        kind: RelationshipKind,
        confidence: Confidence,
    ) -> Self {
        Self {
            from_component_id: from.into(),
            to_component_id: to.into(),
            kind,
            confidence,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn key(&self) -> RelationshipKey {
        (
            self.from_component_id.clone(),
            self.to_component_id.clone(),
            self.kind,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_serializes_as_integer() {
        let rel = Relationship::new("a", "b", RelationshipKind::DependsOn, Confidence::High);
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["confidence"], 3);
        assert_eq!(json["kind"], "depends_on");
        assert!(json.get("note").is_none());
    }

    #[test]
    fn test_confidence_rejects_out_of_range() {
        let json = r#"{"from_component_id":"a","to_component_id":"b","kind":"uses","confidence":4}"#;
        assert!(serde_json::from_str::<Relationship>(json).is_err());
    }

    #[test]
    fn test_only_low_tier_needs_review() {
        assert!(Confidence::Low.needs_review());
        assert!(!Confidence::Medium.needs_review());
        assert!(!Confidence::High.needs_review());
    }
}
