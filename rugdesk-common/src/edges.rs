//! Rug edge selection and AI edge suggestions
//!
//! Edge-bound services (binding, fringe, overcasting) are priced by linear
//! footage over a selection of edges. The AI analysis collaborator proposes
//! an edge selection per service as loosely shaped JSON; this module turns
//! that JSON into strict [`EdgeSuggestion`] values and matches them to
//! service names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dimensions::RugDimensions;

/// One of the four symmetric rug edges
///
/// Ends run across the width, sides run along the length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeTag {
    End1,
    End2,
    Side1,
    Side2,
}

impl EdgeTag {
    pub const ALL: [EdgeTag; 4] = [EdgeTag::End1, EdgeTag::End2, EdgeTag::Side1, EdgeTag::Side2];

    /// Wire name (`"end1"`, `"side2"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeTag::End1 => "end1",
            EdgeTag::End2 => "end2",
            EdgeTag::Side1 => "side1",
            EdgeTag::Side2 => "side2",
        }
    }

    /// Parse an exact wire name; anything else is `None`
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == name)
    }

    pub fn is_end(&self) -> bool {
        matches!(self, EdgeTag::End1 | EdgeTag::End2)
    }

    /// Length of this edge on the given rug
    pub fn length_on(&self, dimensions: &RugDimensions) -> f64 {
        if self.is_end() {
            dimensions.width_ft
        } else {
            dimensions.length_ft
        }
    }
}

/// Validated edge suggestion for services whose name contains `service_pattern`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSuggestion {
    /// Lower-cased service name fragment
    pub service_pattern: String,
    pub edges: Vec<EdgeTag>,
    pub rationale: String,
}

/// Why a raw suggestion entry was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionRejection {
    NotAnObject,
    MissingServiceType,
    MissingEdges,
}

impl std::fmt::Display for SuggestionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuggestionRejection::NotAnObject => write!(f, "entry is not an object"),
            SuggestionRejection::MissingServiceType => {
                write!(f, "serviceType missing or not a string")
            }
            SuggestionRejection::MissingEdges => write!(f, "edges missing or not an array"),
        }
    }
}

/// Convert one untyped suggestion entry into a strict [`EdgeSuggestion`].
///
/// The pattern is lower-cased as given, surrounding whitespace included.
/// Unknown edge names inside an otherwise valid entry are dropped without
/// rejecting the entry. A missing `rationale` becomes an empty string.
pub fn validate_edge_suggestion(value: &Value) -> Result<EdgeSuggestion, SuggestionRejection> {
    let entry = value.as_object().ok_or(SuggestionRejection::NotAnObject)?;

    let service_pattern = entry
        .get("serviceType")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .ok_or(SuggestionRejection::MissingServiceType)?;

    let edges = entry
        .get("edges")
        .and_then(Value::as_array)
        .ok_or(SuggestionRejection::MissingEdges)?
        .iter()
        .filter_map(Value::as_str)
        .filter_map(EdgeTag::from_name)
        .collect();

    let rationale = entry
        .get("rationale")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Ok(EdgeSuggestion {
        service_pattern,
        edges,
        rationale,
    })
}

/// Validate a list of raw suggestions, keeping the well-formed ones in order.
///
/// Never fails: input that is not an array yields an empty list and
/// rejected entries are logged and skipped.
pub fn parse_edge_suggestions(raw: &Value) -> Vec<EdgeSuggestion> {
    let Some(entries) = raw.as_array() else {
        debug!("Edge suggestions payload is not an array, ignoring");
        return Vec::new();
    };

    entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match validate_edge_suggestion(entry) {
            Ok(suggestion) => Some(suggestion),
            Err(reason) => {
                debug!(index, %reason, "Dropping edge suggestion");
                None
            }
        })
        .collect()
}

/// First suggestion whose pattern occurs in `service_name` (case-insensitive)
///
/// An empty pattern is a substring of every name and so matches anything.
pub fn get_suggested_edges_for_service<'a>(
    service_name: &str,
    suggestions: &'a [EdgeSuggestion],
) -> Option<&'a EdgeSuggestion> {
    let service_name = service_name.to_lowercase();
    suggestions
        .iter()
        .find(|suggestion| service_name.contains(&suggestion.service_pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_edge_tag_names() {
        for tag in EdgeTag::ALL {
            assert_eq!(EdgeTag::from_name(tag.as_str()), Some(tag));
            assert_eq!(serde_json::to_value(tag).unwrap(), json!(tag.as_str()));
        }
        assert_eq!(EdgeTag::from_name("END1"), None);
        assert_eq!(EdgeTag::from_name("corner"), None);
    }

    #[test]
    fn test_parse_keeps_only_well_formed_entries() {
        let raw = json!([
            {
                "serviceType": "Binding",
                "edges": ["side1", "side2", "corner", 7],
                "rationale": "Sides are frayed"
            },
            { "serviceType": "Fringe" }
        ]);

        let suggestions = parse_edge_suggestions(&raw);

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].service_pattern, "binding");
        assert_eq!(suggestions[0].edges, vec![EdgeTag::Side1, EdgeTag::Side2]);
        assert_eq!(suggestions[0].rationale, "Sides are frayed");
    }

    #[test]
    fn test_parse_defaults_rationale() {
        let raw = json!([{ "serviceType": "Overcasting", "edges": ["end1"] }]);
        let suggestions = parse_edge_suggestions(&raw);
        assert_eq!(suggestions[0].rationale, "");
        assert_eq!(suggestions[0].edges, vec![EdgeTag::End1]);
    }

    #[test]
    fn test_parse_never_fails_on_garbage() {
        assert!(parse_edge_suggestions(&json!(null)).is_empty());
        assert!(parse_edge_suggestions(&json!({"serviceType": "x"})).is_empty());
        assert!(parse_edge_suggestions(&json!([1, "two", null, []])).is_empty());
    }

    #[test]
    fn test_validate_reports_rejection_reason() {
        assert_eq!(
            validate_edge_suggestion(&json!("binding")),
            Err(SuggestionRejection::NotAnObject)
        );
        assert_eq!(
            validate_edge_suggestion(&json!({"serviceType": 3, "edges": []})),
            Err(SuggestionRejection::MissingServiceType)
        );
        assert_eq!(
            validate_edge_suggestion(&json!({"edges": ["end1"]})),
            Err(SuggestionRejection::MissingServiceType)
        );
        assert_eq!(
            validate_edge_suggestion(&json!({"serviceType": "fringe", "edges": "end1"})),
            Err(SuggestionRejection::MissingEdges)
        );
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let suggestions = parse_edge_suggestions(&json!([
            { "serviceType": "fringe", "edges": ["end1", "end2"] },
            { "serviceType": "binding", "edges": ["side1", "side2"] }
        ]));

        let matched = get_suggested_edges_for_service("Hand FRINGE Repair", &suggestions);
        assert_eq!(matched.map(|s| s.service_pattern.as_str()), Some("fringe"));

        assert!(get_suggested_edges_for_service("Wash", &suggestions).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let suggestions = parse_edge_suggestions(&json!([
            { "serviceType": "binding", "edges": ["side1"] },
            { "serviceType": "side binding", "edges": ["side1", "side2"] }
        ]));

        let matched = get_suggested_edges_for_service("Side Binding", &suggestions).unwrap();
        assert_eq!(matched.edges, vec![EdgeTag::Side1]);
    }

    #[test]
    fn test_blank_service_type_is_kept() {
        let suggestions = parse_edge_suggestions(&json!([
            { "serviceType": "", "edges": ["end1"] },
            { "serviceType": "  ", "edges": ["side1"] }
        ]));

        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].service_pattern, "");
        assert_eq!(suggestions[1].service_pattern, "  ");
    }

    #[test]
    fn test_pattern_whitespace_is_preserved() {
        let suggestions = parse_edge_suggestions(&json!([
            { "serviceType": " Binding ", "edges": ["side1", "side2"] }
        ]));
        assert_eq!(suggestions[0].service_pattern, " binding ");

        assert!(get_suggested_edges_for_service("Rebinding", &suggestions).is_none());
        assert!(get_suggested_edges_for_service("Side Binding Repair", &suggestions).is_some());
    }

    #[test]
    fn test_empty_pattern_matches_in_list_order() {
        let suggestions = parse_edge_suggestions(&json!([
            { "serviceType": "fringe", "edges": ["end1", "end2"] },
            { "serviceType": "", "edges": ["side1"] }
        ]));

        let fringe = get_suggested_edges_for_service("Fringe Repair", &suggestions).unwrap();
        assert_eq!(fringe.service_pattern, "fringe");

        let fallback = get_suggested_edges_for_service("Wash", &suggestions).unwrap();
        assert_eq!(fallback.edges, vec![EdgeTag::Side1]);
    }

    #[test]
    fn test_edge_length_on_rug() {
        let rug = RugDimensions::new(10.0, 6.0);
        assert_eq!(EdgeTag::End2.length_on(&rug), 6.0);
        assert_eq!(EdgeTag::Side2.length_on(&rug), 10.0);
    }
}
