//! Invoice form state captured by autosave
//!
//! Every field is optional: the editor may be half filled in, and payloads
//! written by other versions of the form may carry fields this schema does
//! not know about. Unknown fields are kept in `extra` so they survive a
//! save/load cycle untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Number of characters of the first item description shown in summaries
pub const ITEM_PREVIEW_CHARS: usize = 30;

/// Summary used when nothing identifying has been entered yet
pub const FALLBACK_DESCRIPTION: &str = "New invoice draft";

/// Placeholder for a first line item without a description
pub const UNTITLED_ITEM: &str = "Untitled item";

/// In-progress invoice edit form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    /// Selected client reference
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub client_id: Option<String>,
    /// Selected project reference
    #[serde(
        default,
        deserialize_with = "lenient::reference",
        skip_serializing_if = "Option::is_none"
    )]
    pub project_id: Option<String>,
    /// Line items in form order
    #[serde(
        default,
        deserialize_with = "lenient::items",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<LineItem>,
    /// Free-form notes
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
    /// Payment terms
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub terms: Option<String>,
    /// Fields not covered by this schema
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single invoice line
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(
        default,
        deserialize_with = "lenient::text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient::number",
        skip_serializing_if = "Option::is_none"
    )]
    pub rate: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LineItem {
    /// Create a fully populated line item
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: Some(description.into()),
            quantity: Some(quantity),
            rate: Some(rate),
            extra: Map::new(),
        }
    }

    /// Description, if it contains anything besides whitespace
    pub fn description(&self) -> Option<&str> {
        non_blank(self.description.as_deref())
    }

    /// Whether the user has typed anything meaningful into this line
    pub fn has_content(&self) -> bool {
        self.description().is_some()
            || self.quantity.is_some_and(|q| q > 0.0)
            || self.rate.is_some_and(|r| r > 0.0)
    }
}

impl InvoicePayload {
    /// Create an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the client reference
    #[must_use]
    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the project reference
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Append a line item
    #[must_use]
    pub fn with_item(mut self, item: LineItem) -> Self {
        self.items.push(item);
        self
    }

    /// Set the notes
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Set the payment terms
    #[must_use]
    pub fn with_terms(mut self, terms: impl Into<String>) -> Self {
        self.terms = Some(terms.into());
        self
    }

    /// Client reference, ignoring blank values
    pub fn client(&self) -> Option<&str> {
        non_blank(self.client_id.as_deref())
    }

    /// Project reference, ignoring blank values
    pub fn project(&self) -> Option<&str> {
        non_blank(self.project_id.as_deref())
    }

    /// Whether the form holds nothing worth keeping
    ///
    /// Any single populated signal (client, project, a non-empty line item,
    /// notes or terms) makes the payload non-empty.
    pub fn is_empty(&self) -> bool {
        self.client().is_none()
            && self.project().is_none()
            && !self.items.iter().any(LineItem::has_content)
            && non_blank(self.notes.as_deref()).is_none()
            && non_blank(self.terms.as_deref()).is_none()
    }

    /// Short human-readable summary for draft listings
    pub fn describe(&self) -> String {
        match (self.client(), self.project()) {
            (Some(client), Some(project)) => {
                return format!("Invoice for client {client} - {project}");
            },
            (Some(client), None) => return format!("Invoice for client {client}"),
            _ => {},
        }

        match self.items.first() {
            Some(first) => {
                let preview = first.description().map_or_else(
                    || UNTITLED_ITEM.to_string(),
                    |d| truncate_with_ellipsis(d, ITEM_PREVIEW_CHARS),
                );
                format!("Invoice with {} item(s) - {preview}", self.items.len())
            },
            None => FALLBACK_DESCRIPTION.to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Tolerant field decoders: a value of the wrong type reads as absent
/// instead of failing the whole draft.
mod lenient {
    use super::{Deserialize, Deserializer, LineItem, Value};

    pub fn reference<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }

    pub fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::String(s)) => Some(s),
            _ => None,
        })
    }

    pub fn number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn items<'de, D>(deserializer: D) -> Result<Vec<LineItem>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<Value>::deserialize(deserializer)? {
            Some(Value::Array(values)) => values
                .into_iter()
                .map(|v| serde_json::from_value(v).unwrap_or_default())
                .collect(),
            _ => Vec::new(),
        })
    }
}
