//! Layered trie dictionary base.
//!
//! Both the pinyin and the table dictionaries are a stack of double-array
//! tries sharing one key scheme: layer 0 is the read-mostly system
//! dictionary, layer 1 the user dictionary, and layers 2+ are optional
//! extras (add-on dictionaries the host loads at runtime). A word is
//! present if any layer contains it; costs are per layer.
//!
//! Every mutation announces itself on the `dictionary_changed` signal so
//! match-state caches can invalidate the affected layer.

use crate::error::{Error, Result};
use crate::signal::{Connection, Signal};
use crate::trie::{DatTrie, TrieValue};

pub const SYSTEM_DICT: usize = 0;
pub const USER_DICT: usize = 1;

#[derive(Debug)]
pub struct TrieDictionary<V: TrieValue> {
    tries: Vec<DatTrie<V>>,
    changed: Signal<usize>,
}

impl<V: TrieValue> Default for TrieDictionary<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: TrieValue> TrieDictionary<V> {
    /// A dictionary with the two fixed layers (system, user) empty.
    pub fn new() -> Self {
        Self {
            tries: vec![DatTrie::new(), DatTrie::new()],
            changed: Signal::new(),
        }
    }

    pub fn dict_size(&self) -> usize {
        self.tries.len()
    }

    /// Append an extra layer and return its index.
    pub fn add_empty_dict(&mut self) -> usize {
        self.tries.push(DatTrie::new());
        self.tries.len() - 1
    }

    /// Remove an extra layer. The system and user layers are fixed.
    pub fn remove(&mut self, idx: usize) -> Result<()> {
        if idx <= USER_DICT {
            return Err(Error::invalid_argument(
                "system and user dictionaries cannot be removed",
            ));
        }
        if idx >= self.tries.len() {
            return Err(Error::out_of_range(format!("no dictionary layer {idx}")));
        }
        self.tries.remove(idx);
        Ok(())
    }

    /// Drop every extra layer.
    pub fn remove_all(&mut self) {
        self.tries.truncate(USER_DICT + 1);
    }

    pub fn clear(&mut self, idx: usize) -> Result<()> {
        self.trie_mut(idx)?.clear();
        self.emit_changed(idx);
        Ok(())
    }

    pub fn trie(&self, idx: usize) -> Result<&DatTrie<V>> {
        self.tries
            .get(idx)
            .ok_or_else(|| Error::out_of_range(format!("no dictionary layer {idx}")))
    }

    /// Mutable layer access. Callers that change keys must follow up with
    /// [`TrieDictionary::emit_changed`].
    pub fn trie_mut(&mut self, idx: usize) -> Result<&mut DatTrie<V>> {
        self.tries
            .get_mut(idx)
            .ok_or_else(|| Error::out_of_range(format!("no dictionary layer {idx}")))
    }

    pub fn tries(&self) -> &[DatTrie<V>] {
        &self.tries
    }

    /// Replace a whole layer (used by binary loads).
    pub fn replace_trie(&mut self, idx: usize, trie: DatTrie<V>) -> Result<()> {
        *self.trie_mut(idx)? = trie;
        self.emit_changed(idx);
        Ok(())
    }

    pub fn connect_changed(&self, f: impl Fn(&usize) + 'static) -> Connection {
        self.changed.connect(f)
    }

    pub fn disconnect_changed(&self, conn: Connection) {
        self.changed.disconnect(conn);
    }

    pub fn emit_changed(&self, idx: usize) {
        self.changed.emit(&idx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_user_dict_cannot_be_removed() {
        let mut dict: TrieDictionary<f32> = TrieDictionary::new();
        assert!(matches!(
            dict.remove(USER_DICT),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            dict.remove(SYSTEM_DICT),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_remove_all_keeps_fixed_layers() {
        let mut dict: TrieDictionary<f32> = TrieDictionary::new();
        let extra = dict.add_empty_dict();
        assert_eq!(extra, 2);
        dict.add_empty_dict();
        assert_eq!(dict.dict_size(), 4);
        dict.remove_all();
        assert_eq!(dict.dict_size(), 2);
    }

    #[test]
    fn test_changed_signal_fires_on_clear() {
        let mut dict: TrieDictionary<f32> = TrieDictionary::new();
        dict.trie_mut(USER_DICT).unwrap().set(b"k", 1.0);
        let seen: Rc<RefCell<Vec<usize>>> = Rc::new(RefCell::new(Vec::new()));
        let seen2 = Rc::clone(&seen);
        dict.connect_changed(move |idx| seen2.borrow_mut().push(*idx));
        dict.clear(USER_DICT).unwrap();
        assert_eq!(*seen.borrow(), vec![USER_DICT]);
    }
}
