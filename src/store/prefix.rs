// Prefix index: a char trie shared by every stored version.
//
// Nodes live in a single arena owned by the index and are addressed by
// position; children are kept in an ordered map so traversal order is fixed.
// The index is never used to rebuild text. It answers two questions only:
// "which versions have exactly this text" and "how much prefix sharing is
// there".

use std::collections::BTreeMap;

use serde::Serialize;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone, Default)]
struct Node {
    children: BTreeMap<char, NodeId>,
    /// Versions whose text ends at this node, ascending.
    ends: Vec<usize>,
}

/// Space accounting for a [`PrefixIndex`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefixStats {
    /// Trie nodes excluding the root (one per distinct prefix char).
    pub nodes: usize,
    /// Versions inserted.
    pub versions: usize,
    /// Sum of the lengths (in chars) of every inserted version.
    pub total_chars: usize,
}

impl PrefixStats {
    /// Chars that did not need a node of their own.
    pub fn shared_chars(&self) -> usize {
        self.total_chars.saturating_sub(self.nodes)
    }
}

/// Arena-backed char trie tagging the versions that end at each node.
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    nodes: Vec<Node>,
    versions: usize,
    total_chars: usize,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::default()],
            versions: 0,
            total_chars: 0,
        }
    }

    /// Record that `version` has text `text`.
    pub fn insert(&mut self, text: &str, version: usize) {
        let mut node = ROOT;
        let mut len = 0usize;
        for c in text.chars() {
            len += 1;
            let next = self.nodes[node].children.get(&c).copied();
            node = match next {
                Some(child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes.push(Node::default());
                    self.nodes[node].children.insert(c, child);
                    child
                }
            };
        }

        let ends = &mut self.nodes[node].ends;
        if let Err(pos) = ends.binary_search(&version) {
            ends.insert(pos, version);
            self.versions += 1;
            self.total_chars += len;
        }
    }

    /// Versions whose text is exactly `text`, ascending. Empty if none.
    pub fn lookup(&self, text: &str) -> &[usize] {
        let mut node = ROOT;
        for c in text.chars() {
            match self.nodes[node].children.get(&c) {
                Some(&child) => node = child,
                None => return &[],
            }
        }
        &self.nodes[node].ends
    }

    /// Lowest version whose text is exactly `text`.
    pub fn first_version(&self, text: &str) -> Option<usize> {
        self.lookup(text).first().copied()
    }

    pub fn stats(&self) -> PrefixStats {
        PrefixStats {
            nodes: self.nodes.len() - 1,
            versions: self.versions,
            total_chars: self.total_chars,
        }
    }

}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
