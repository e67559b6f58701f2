use super::ChangeSide;

/// A text substitution for an editable document: remove `length` bytes at
/// `offset`, then insert `text` there.
///
/// An empty `text` is a pure deletion, `length == 0` a pure insertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaTextChangeEvent {
    pub offset: usize,
    pub length: usize,
    pub text: String,
    pub side: ChangeSide,
}

impl DeltaTextChangeEvent {
    pub fn new(offset: usize, length: usize, text: impl Into<String>, side: ChangeSide) -> Self {
        Self {
            offset,
            length,
            text: text.into(),
            side,
        }
    }

    /// The zero-effect event
    pub fn empty(side: ChangeSide) -> Self {
        Self::new(0, 0, String::new(), side)
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0 && self.text.is_empty()
    }

    /// `document` with this event applied: prefix + text + postfix.
    ///
    /// Offsets past the end are clamped to the document length.
    pub fn apply(&self, document: &str) -> String {
        let start = self.offset.min(document.len());
        let end = (self.offset + self.length).min(document.len());
        let mut result = String::with_capacity(document.len() - (end - start) + self.text.len());
        result.push_str(&document[..start]);
        result.push_str(&self.text);
        result.push_str(&document[end..]);
        result
    }

    /// The same substitution without the prefix and suffix shared by the
    /// replaced text (`replaced`) and the inserted text
    pub fn trimmed(&self, replaced: &str) -> Self {
        let prefix = replaced
            .char_indices()
            .zip(self.text.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((index, c), _)| index + c.len_utf8());

        let replaced_rest = &replaced[prefix..];
        let text_rest = &self.text[prefix..];
        let suffix = replaced_rest
            .char_indices()
            .rev()
            .zip(text_rest.chars().rev())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((index, _), _)| replaced_rest.len() - index);

        Self {
            offset: self.offset + prefix,
            length: replaced.len() - prefix - suffix,
            text: text_rest[..text_rest.len() - suffix].to_string(),
            side: self.side,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn apply_replaces_range() {
        let event = DeltaTextChangeEvent::new(2, 2, "b\n", ChangeSide::New);
        assert_eq!(event.apply("a\nX\nc\n"), "a\nb\nc\n");
    }

    #[test]
    fn apply_pure_insert_and_delete() {
        let insert = DeltaTextChangeEvent::new(1, 0, "xy", ChangeSide::Old);
        assert_eq!(insert.apply("ab"), "axyb");
        let delete = DeltaTextChangeEvent::new(0, 1, "", ChangeSide::Old);
        assert_eq!(delete.apply("ab"), "b");
    }

    #[test]
    fn trimmed_drops_shared_affixes() {
        let event = DeltaTextChangeEvent::new(2, 2, "b\n", ChangeSide::New);
        assert_eq!(
            event.trimmed("X\n"),
            DeltaTextChangeEvent::new(2, 1, "b", ChangeSide::New)
        );
    }

    #[test]
    fn trimmed_does_not_overlap_prefix_and_suffix() {
        // "aa" -> "aaa": prefix takes both chars, the rest is a pure insert
        let event = DeltaTextChangeEvent::new(0, 2, "aaa", ChangeSide::New);
        assert_eq!(
            event.trimmed("aa"),
            DeltaTextChangeEvent::new(2, 0, "a", ChangeSide::New)
        );
    }

    #[test]
    fn trimmed_respects_char_boundaries() {
        let event = DeltaTextChangeEvent::new(0, 3, "éb", ChangeSide::New);
        assert_eq!(
            event.trimmed("éa"),
            DeltaTextChangeEvent::new(2, 1, "b", ChangeSide::New)
        );
    }

    #[test]
    fn empty_event() {
        assert!(DeltaTextChangeEvent::empty(ChangeSide::New).is_empty());
        assert!(!DeltaTextChangeEvent::new(0, 0, "x", ChangeSide::New).is_empty());
    }
}
