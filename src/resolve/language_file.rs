use super::liquibase::unite;
use super::xml::{XmlNode, parse_fragment};
use super::{DeltaRef, Resolve, ResolveContext};
use crate::delta::{ChangeDelta, ChangeSide, DeltaTextChangeEvent};
use crate::file_diff::FileDiffError;
use crate::merge::ConflictSide;
use std::collections::HashMap;

const STRING_ENTRY: &str = "<stringEntry>";

/// Both sides added translation entries
/// (`<stringEntry><name/><value/></stringEntry>`) that do not contradict
/// each other
#[derive(Debug, Clone, Copy, Default)]
pub struct LanguageFileResolve;

/// Key/value pairs of the string entries in `text`.
///
/// The lines are trimmed and joined first. A conflict that starts inside an
/// entry and ends with the opening tag of the next one is rotated so the
/// tag leads. Anything besides string entries gives `None`, an entry
/// without a name or a value spoils the whole text.
pub fn language_entries(text: &str) -> Option<HashMap<String, String>> {
    let mut cleaned: String = text.split('\n').map(str::trim).collect();
    if let Some(rest) = cleaned.strip_suffix(STRING_ENTRY) {
        cleaned = format!("{STRING_ENTRY}{rest}");
    }

    let mut entries = HashMap::new();
    for node in parse_fragment(&cleaned)? {
        let XmlNode::Element(element) = node else {
            return None;
        };
        if element.name != "stringEntry" {
            return None;
        }
        let name = element.child("name").map(|name| name.text_content());
        let value = element.child("value").map(|value| value.text_content());
        match (name, value) {
            (Some(name), Some(value)) => {
                entries.insert(name, value);
            }
            _ => return Some(HashMap::new()),
        }
    }
    Some(entries)
}

impl Resolve for LanguageFileResolve {
    fn position(&self) -> u32 {
        400
    }

    fn can_resolve_conflict(&self, own: &DeltaRef<'_>, other: &DeltaRef<'_>, _side: ConflictSide) -> bool {
        let (Some(own_entries), Some(other_entries)) = (
            language_entries(own.text(ChangeSide::New)),
            language_entries(other.text(ChangeSide::New)),
        ) else {
            return false;
        };
        !own_entries.is_empty()
            && !other_entries.is_empty()
            && other_entries
                .iter()
                .all(|(key, value)| own_entries.get(key).is_none_or(|own| own == value))
    }

    /// The first side replaces the conflicting range, the second one is
    /// added behind it
    fn resolve_conflict(
        &self,
        delta: &ChangeDelta,
        context: &mut ResolveContext<'_>,
    ) -> Result<Vec<DeltaTextChangeEvent>, FileDiffError> {
        Ok(vec![unite(delta, context)])
    }
}
