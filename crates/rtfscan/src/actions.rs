//! The control words the scanner reacts to.

use std::collections::HashMap;

/// Something a recognised control word asks the scanner to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Action {
    /// `\object`: the current group describes an embedded object.
    Object,
    /// `\objdata`: the current group carries the object's hex payload.
    ObjectData,
}

/// Control words we act on, as the lexer presents them: the letters followed
/// by the single terminator byte that ended the word, if that byte was
/// whitespace.
const ACTIONS: [(&[u8], Action); 2] = [(b"object", Action::Object), (b"objdata ", Action::ObjectData)];

/// Lookup from accumulated control words to actions.
///
/// Built fresh for every scan; it holds no shared state.
#[derive(Debug)]
pub(crate) struct ActionTable {
    entries: HashMap<&'static [u8], Action>,
}

impl ActionTable {
    pub(crate) fn new() -> Self {
        let mut entries = HashMap::with_capacity(ACTIONS.len());
        for (word, action) in ACTIONS {
            entries.insert(word, action);
        }
        Self { entries }
    }

    pub(crate) fn lookup(&self, word: &[u8]) -> Option<Action> {
        self.entries.get(word).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_both_words() {
        let table = ActionTable::new();
        assert_eq!(table.lookup(b"object"), Some(Action::Object));
        assert_eq!(table.lookup(b"objdata "), Some(Action::ObjectData));
    }

    #[test]
    fn terminator_is_part_of_the_key() {
        let table = ActionTable::new();
        assert_eq!(table.lookup(b"objdata"), None);
        assert_eq!(table.lookup(b"object "), None);
        assert_eq!(table.lookup(b"objdata\n"), None);
        assert_eq!(table.lookup(b"objemb"), None);
    }
}
