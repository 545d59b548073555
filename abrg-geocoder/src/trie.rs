//! Longest-prefix matching trie over normalized names
//!
//! Every hierarchy stage owns one [`PrefixTrie`] built from its reference
//! table at startup. A search walks the trie along the head of the residual
//! query text and returns the deepest entry whose row passes the caller's
//! scope filter. A fuzzy wildcard character in the query text matches any
//! single trie edge, which makes the walk a depth-first search rather than
//! a single path.
//!
//! Tie-break at equal depth: entries inserted as canonical beat alias
//! spellings; insertion order decides the rest deterministically.

use std::collections::HashMap;

#[derive(Debug, Default)]
struct Node {
    children: HashMap<char, Node>,
    /// Indices into `PrefixTrie::entries` of rows whose name ends here
    leaves: Vec<usize>,
}

#[derive(Debug)]
struct Entry<T> {
    value: T,
    canonical: bool,
}

/// A successful longest-prefix match
#[derive(Debug)]
pub struct TrieMatch<'a, T> {
    /// Number of query characters the matched name covers
    pub len: usize,
    pub value: &'a T,
}

/// Prefix trie mapping normalized names to reference rows.
#[derive(Debug)]
pub struct PrefixTrie<T> {
    root: Node,
    entries: Vec<Entry<T>>,
}

impl<T> Default for PrefixTrie<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            entries: Vec::new(),
        }
    }
}

impl<T> PrefixTrie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a canonical name form.
    pub fn insert(&mut self, key: &[char], value: T) {
        self.insert_entry(key, value, true);
    }

    /// Insert a variant spelling; loses ties against canonical entries.
    pub fn insert_alias(&mut self, key: &[char], value: T) {
        self.insert_entry(key, value, false);
    }

    fn insert_entry(&mut self, key: &[char], value: T, canonical: bool) {
        if key.is_empty() {
            return;
        }
        let index = self.entries.len();
        self.entries.push(Entry { value, canonical });
        let mut node = &mut self.root;
        for &c in key {
            node = node.children.entry(c).or_default();
        }
        node.leaves.push(index);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the longest prefix of `text` that names an entry accepted by
    /// `scope`. A `fuzzy` character in `text` matches any single edge.
    pub fn find_longest<'a, F>(
        &'a self,
        text: &[char],
        fuzzy: Option<char>,
        scope: F,
    ) -> Option<TrieMatch<'a, T>>
    where
        F: Fn(&T) -> bool,
    {
        let mut best: Option<(usize, usize)> = None; // (depth, entry index)
        self.walk(&self.root, text, 0, fuzzy, &scope, &mut best);
        best.map(|(len, index)| TrieMatch {
            len,
            value: &self.entries[index].value,
        })
    }

    fn walk<F>(
        &self,
        node: &Node,
        text: &[char],
        depth: usize,
        fuzzy: Option<char>,
        scope: &F,
        best: &mut Option<(usize, usize)>,
    ) where
        F: Fn(&T) -> bool,
    {
        for &index in &node.leaves {
            let entry = &self.entries[index];
            if !scope(&entry.value) {
                continue;
            }
            let better = match *best {
                None => true,
                Some((best_depth, best_index)) => {
                    depth > best_depth
                        || (depth == best_depth
                            && entry.canonical
                            && !self.entries[best_index].canonical)
                }
            };
            if better {
                *best = Some((depth, index));
            }
        }

        let Some(&c) = text.get(depth) else { return };
        if Some(c) == fuzzy {
            // Wildcard: try every outgoing edge
            for child in node.children.values() {
                self.walk(child, text, depth + 1, fuzzy, scope, best);
            }
        } else if let Some(child) = node.children.get(&c) {
            self.walk(child, text, depth + 1, fuzzy, scope, best);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn longest_prefix_wins() {
        let mut trie = PrefixTrie::new();
        trie.insert(&chars("府中"), 1);
        trie.insert(&chars("府中市"), 2);
        let m = trie.find_longest(&chars("府中市宮町"), None, |_| true).unwrap();
        assert_eq!((m.len, *m.value), (3, 2));
    }

    #[test]
    fn no_match_returns_none() {
        let mut trie = PrefixTrie::new();
        trie.insert(&chars("千代田区"), 1);
        assert!(trie.find_longest(&chars("港区"), None, |_| true).is_none());
    }

    #[test]
    fn scope_filter_hides_out_of_scope_rows() {
        let mut trie = PrefixTrie::new();
        trie.insert(&chars("府中市"), 13); // Tokyo
        trie.insert(&chars("府中市"), 34); // Hiroshima
        let m = trie
            .find_longest(&chars("府中市"), None, |&v| v == 34)
            .unwrap();
        assert_eq!(*m.value, 34);
    }

    #[test]
    fn wildcard_matches_any_single_edge() {
        let mut trie = PrefixTrie::new();
        trie.insert(&chars("千代田区"), 1);
        let m = trie
            .find_longest(&chars("千代?区紀尾井町"), Some('?'), |_| true)
            .unwrap();
        assert_eq!((m.len, *m.value), (4, 1));
    }

    #[test]
    fn canonical_beats_alias_at_equal_depth() {
        let mut trie = PrefixTrie::new();
        trie.insert_alias(&chars("三鷹"), 1);
        trie.insert(&chars("三鷹"), 2);
        let m = trie.find_longest(&chars("三鷹"), None, |_| true).unwrap();
        assert_eq!(*m.value, 2);
    }

    #[test]
    fn deeper_alias_beats_shallow_canonical() {
        let mut trie = PrefixTrie::new();
        trie.insert(&chars("府中"), 1);
        trie.insert_alias(&chars("府中町"), 2);
        let m = trie.find_longest(&chars("府中町大通"), None, |_| true).unwrap();
        assert_eq!((m.len, *m.value), (3, 2));
    }
}
