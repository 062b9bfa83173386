//! Tolerant parsing of `/identify` payloads.
//!
//! The recognition service has changed its response shape across versions,
//! so the payload is classified into the shapes seen so far and the
//! best-guess identity is pulled out with a fixed key priority.

use serde_json::{Map, Value};

/// Keys that may carry the matched person, highest priority first.
pub const IDENTITY_KEYS: [&str; 4] = ["person_name", "person", "name", "label"];

const CONFIDENCE_KEYS: [&str; 2] = ["confidence", "score"];

/// One entry of a `matches` / `results` list.
#[derive(Debug, Clone, PartialEq)]
pub enum Candidate {
    Labeled {
        identity: String,
        confidence: Option<f64>,
    },
    /// A bare string entry, taken as the identity itself.
    Bare(String),
    Other(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentifyResult {
    /// Identity found directly on the top-level object.
    Labeled {
        identity: String,
        confidence: Option<f64>,
    },
    /// Identity carried by a non-empty `matches` or `results` list.
    Candidates(Vec<Candidate>),
    /// Body was not JSON and got wrapped under `raw` by the client.
    Raw(String),
    Unrecognized(Value),
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

fn label_of(fields: &Map<String, Value>) -> Option<String> {
    IDENTITY_KEYS.iter().find_map(|key| match fields.get(*key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(value @ Value::Number(n)) if is_truthy(value) => Some(n.to_string()),
        _ => None,
    })
}

fn confidence_of(fields: &Map<String, Value>) -> Option<f64> {
    CONFIDENCE_KEYS
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_f64))
}

impl From<&Value> for Candidate {
    fn from(value: &Value) -> Self {
        match value {
            Value::String(s) => Candidate::Bare(s.clone()),
            Value::Object(fields) => match label_of(fields) {
                Some(identity) => Candidate::Labeled {
                    identity,
                    confidence: confidence_of(fields),
                },
                None => Candidate::Other(value.clone()),
            },
            other => Candidate::Other(other.clone()),
        }
    }
}

impl From<&Value> for IdentifyResult {
    fn from(payload: &Value) -> Self {
        let Value::Object(fields) = payload else {
            return IdentifyResult::Unrecognized(payload.clone());
        };

        if let Some(identity) = label_of(fields) {
            return IdentifyResult::Labeled {
                identity,
                confidence: confidence_of(fields),
            };
        }

        // `matches` wins when it is truthy, even if it turns out not to be a list
        let listed = match fields.get("matches") {
            Some(matches) if is_truthy(matches) => Some(matches),
            _ => fields.get("results"),
        };
        if let Some(Value::Array(items)) = listed {
            if !items.is_empty() {
                return IdentifyResult::Candidates(items.iter().map(Candidate::from).collect());
            }
        }

        match fields.get("raw") {
            Some(Value::String(raw)) if fields.len() == 1 => IdentifyResult::Raw(raw.clone()),
            _ => IdentifyResult::Unrecognized(payload.clone()),
        }
    }
}

impl IdentifyResult {
    pub fn best_guess(&self) -> Option<&str> {
        match self {
            IdentifyResult::Labeled { identity, .. } => Some(identity),
            IdentifyResult::Candidates(candidates) => match candidates.first()? {
                Candidate::Labeled { identity, .. } => Some(identity),
                Candidate::Bare(identity) => Some(identity),
                Candidate::Other(_) => None,
            },
            IdentifyResult::Raw(_) | IdentifyResult::Unrecognized(_) => None,
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            IdentifyResult::Labeled { confidence, .. } => *confidence,
            IdentifyResult::Candidates(candidates) => match candidates.first()? {
                Candidate::Labeled { confidence, .. } => *confidence,
                _ => None,
            },
            _ => None,
        }
    }
}

/// Most likely identity label in a recognition response, if any.
pub fn extract_best_guess_identity(payload: &Value) -> Option<String> {
    IdentifyResult::from(payload).best_guess().map(str::to_string)
}
