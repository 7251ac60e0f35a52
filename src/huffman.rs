//! Deterministic Huffman trees and code tables.
//!
//! Both ends of the stream rebuild the tree from the same frequency table, so
//! construction must be reproducible bit for bit. Every node gets a creation
//! sequence number the moment it is made: leaves first, in ascending symbol
//! order, then internal nodes in merge order. The priority queue orders by
//! `(freq, seq)`, which settles every tie without depending on the queue's
//! internal layout.
//!
//! # Historical Context
//!
//! David Huffman (1952) developed this algorithm as a term paper at MIT.
//! It was the first practical algorithm for constructing optimal prefix codes.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// Huffman tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A symbol and its frequency.
    Leaf {
        /// Byte value.
        symbol: u8,
        /// Occurrence count.
        freq: u64,
    },
    /// Two exclusively owned subtrees; `left` is reached by a 0 bit.
    Internal {
        /// Subtree taken on a 0 bit.
        left: Box<Node>,
        /// Subtree taken on a 1 bit.
        right: Box<Node>,
        /// Sum of both subtrees' frequencies.
        freq: u64,
    },
}

impl Node {
    /// Frequency carried by this node.
    pub fn freq(&self) -> u64 {
        match self {
            Node::Leaf { freq, .. } => *freq,
            Node::Internal { freq, .. } => *freq,
        }
    }

    /// Follow one edge: `false` goes left, `true` goes right.
    ///
    /// # Errors
    /// Returns `Error::BitstreamCorrupt` when called on a leaf.
    #[inline]
    pub fn child(&self, bit: bool) -> Result<&Node> {
        match self {
            Node::Internal { left, right, .. } => Ok(if bit { right } else { left }),
            Node::Leaf { .. } => Err(Error::BitstreamCorrupt),
        }
    }
}

/// Priority-queue entry: a node plus its creation sequence number.
#[derive(Debug)]
struct Pending {
    seq: u32,
    node: Node,
}

impl Pending {
    fn key(&self) -> (u64, u32) {
        (self.node.freq(), self.seq)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key()) // Min-priority queue
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A Huffman tree with at least one leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HuffmanTree {
    root: Node,
}

impl HuffmanTree {
    /// Build the tree for `table`.
    ///
    /// Returns `Ok(None)` for an empty table. A single-symbol table yields a
    /// tree whose root is that leaf.
    ///
    /// # Errors
    /// Returns `Error::MalformedHeader` if merged frequencies overflow a
    /// `u64`, which only a corrupt header can cause.
    pub fn build(table: &FrequencyTable) -> Result<Option<Self>> {
        let mut pq = BinaryHeap::with_capacity(256);
        let mut seq = 0u32;
        for (symbol, freq) in table.iter() {
            pq.push(Pending {
                seq,
                node: Node::Leaf { symbol, freq },
            });
            seq += 1;
        }

        loop {
            let (left, right) = match (pq.pop(), pq.pop()) {
                (None, _) => return Ok(None),
                (Some(root), None) => return Ok(Some(Self { root: root.node })),
                (Some(a), Some(b)) => (a.node, b.node),
            };
            let freq = left
                .freq()
                .checked_add(right.freq())
                .ok_or(Error::MalformedHeader("frequency total overflows u64"))?;
            pq.push(Pending {
                seq,
                node: Node::Internal {
                    left: Box::new(left),
                    right: Box::new(right),
                    freq,
                },
            });
            seq += 1;
        }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The symbol of a single-leaf tree, or `None` if the root is internal.
    pub fn single_symbol(&self) -> Option<u8> {
        match self.root {
            Node::Leaf { symbol, .. } => Some(symbol),
            Node::Internal { .. } => None,
        }
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 1,
                Node::Internal { left, right, .. } => count(left) + count(right),
            }
        }
        count(&self.root)
    }

    /// Number of internal nodes.
    pub fn internal_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            match node {
                Node::Leaf { .. } => 0,
                Node::Internal { left, right, .. } => 1 + count(left) + count(right),
            }
        }
        count(&self.root)
    }
}

/// A prefix code: the low `len` bits of `value`, most significant first.
///
/// Code lengths are bounded by the Fibonacci growth of Huffman depth: a code
/// of length `L` needs a total weight of at least `Fib(L + 2)`, so with
/// weights summing to at most `u64::MAX` no code is longer than 91 bits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Code {
    /// Code bits, right-aligned.
    pub value: u128,
    /// Number of significant bits; zero marks an absent symbol.
    pub len: u32,
}

/// Symbol → code lookup for all 256 byte values.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeTable {
    codes: [Code; 256],
}

impl CodeTable {
    /// Assign codes by walking `tree` depth first.
    ///
    /// A root leaf gets the placeholder code `(0, 1)`. `None` yields a table
    /// with no codes.
    pub fn new(tree: Option<&HuffmanTree>) -> Self {
        let mut codes = [Code::default(); 256];
        match tree.map(HuffmanTree::root) {
            None => {}
            Some(Node::Leaf { symbol, .. }) => {
                codes[*symbol as usize] = Code { value: 0, len: 1 };
            }
            Some(root) => Self::build_codes(root, 0, 0, &mut codes),
        }
        Self { codes }
    }

    fn build_codes(node: &Node, value: u128, depth: u32, codes: &mut [Code; 256]) {
        match node {
            Node::Leaf { symbol, .. } => {
                codes[*symbol as usize] = Code { value, len: depth };
            }
            Node::Internal { left, right, .. } => {
                Self::build_codes(left, value << 1, depth + 1, codes);
                Self::build_codes(right, (value << 1) | 1, depth + 1, codes);
            }
        }
    }

    /// Code for `symbol`; `len == 0` if the symbol has none.
    #[inline]
    pub fn get(&self, symbol: u8) -> Code {
        self.codes[symbol as usize]
    }

    /// `(symbol, code)` for every coded symbol, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (u8, Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter(|(_, c)| c.len > 0)
            .map(|(s, c)| (s as u8, *c))
    }

    /// Payload length in bits for an input with frequencies `table`.
    pub fn total_bits(&self, table: &FrequencyTable) -> u128 {
        table
            .iter()
            .map(|(s, f)| f as u128 * self.get(s).len as u128)
            .sum()
    }
}

/// Zero bits needed to fill the last byte of a `total_bits` payload.
pub fn padding_bits(total_bits: u128) -> u8 {
    ((8 - total_bits % 8) % 8) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn table(pairs: &[(u8, u64)]) -> FrequencyTable {
        pairs.iter().copied().collect()
    }

    fn codes_for(pairs: &[(u8, u64)]) -> CodeTable {
        let tree = HuffmanTree::build(&table(pairs)).unwrap();
        CodeTable::new(tree.as_ref())
    }

    fn is_prefix(a: Code, b: Code) -> bool {
        a.len <= b.len && (b.value >> (b.len - a.len)) == a.value
    }

    #[test]
    fn test_empty_table_has_no_tree() {
        assert!(HuffmanTree::build(&FrequencyTable::new()).unwrap().is_none());
        assert_eq!(CodeTable::new(None).iter().count(), 0);
    }

    #[test]
    fn test_single_symbol_tree() {
        let tree = HuffmanTree::build(&table(&[(0x41, 1 << 20)]))
            .unwrap()
            .unwrap();
        assert_eq!(tree.single_symbol(), Some(0x41));
        assert_eq!(tree.internal_count(), 0);

        let codes = CodeTable::new(Some(&tree));
        assert_eq!(codes.get(0x41), Code { value: 0, len: 1 });
        assert_eq!(codes.iter().count(), 1);
    }

    #[test]
    fn test_equal_leaves_tie_break_by_symbol() {
        // a, b merge first (lowest symbols). c and the new internal node
        // then tie at 2; c was created earlier, so it is extracted first.
        let codes = codes_for(&[(b'a', 1), (b'b', 1), (b'c', 2)]);
        assert_eq!(codes.get(b'c'), Code { value: 0b0, len: 1 });
        assert_eq!(codes.get(b'a'), Code { value: 0b10, len: 2 });
        assert_eq!(codes.get(b'b'), Code { value: 0b11, len: 2 });
    }

    #[test]
    fn test_internal_nodes_tie_break_by_merge_order() {
        // Four equal leaves: (a,b) then (c,d) merge; the earlier internal
        // node becomes the left child of the root.
        let codes = codes_for(&[(b'a', 1), (b'b', 1), (b'c', 1), (b'd', 1)]);
        assert_eq!(codes.get(b'a'), Code { value: 0b00, len: 2 });
        assert_eq!(codes.get(b'b'), Code { value: 0b01, len: 2 });
        assert_eq!(codes.get(b'c'), Code { value: 0b10, len: 2 });
        assert_eq!(codes.get(b'd'), Code { value: 0b11, len: 2 });
    }

    #[test]
    fn test_abracadabra_lengths() {
        let mut t = FrequencyTable::new();
        t.record(b"abracadabra");
        let tree = HuffmanTree::build(&t).unwrap().unwrap();
        let codes = CodeTable::new(Some(&tree));
        assert_eq!(codes.get(b'a').len, 1);
        assert_eq!(codes.total_bits(&t), 23);
        assert_eq!(padding_bits(codes.total_bits(&t)), 1);
    }

    #[test]
    fn test_fibonacci_weights_give_deep_codes() {
        // Fibonacci weights produce a maximally skewed tree.
        let mut fib = vec![1u64, 1];
        while fib.len() < 80 {
            let n = fib[fib.len() - 1] + fib[fib.len() - 2];
            fib.push(n);
        }
        let pairs: Vec<(u8, u64)> = fib.iter().enumerate().map(|(i, &f)| (i as u8, f)).collect();
        let codes = codes_for(&pairs);
        let max_len = codes.iter().map(|(_, c)| c.len).max().unwrap();
        assert_eq!(max_len, 79);
        let all: Vec<Code> = codes.iter().map(|(_, c)| c).collect();
        for (i, &a) in all.iter().enumerate() {
            for (j, &b) in all.iter().enumerate() {
                if i != j {
                    assert!(!is_prefix(a, b));
                }
            }
        }
    }

    #[test]
    fn test_overflowing_frequencies_rejected() {
        let t = table(&[(0, u64::MAX), (1, 1)]);
        assert!(matches!(
            HuffmanTree::build(&t),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn test_child_of_leaf_is_corrupt() {
        let leaf = Node::Leaf { symbol: 1, freq: 1 };
        assert!(matches!(leaf.child(false), Err(Error::BitstreamCorrupt)));
    }

    proptest! {
        #[test]
        fn prop_codes_are_prefix_free(
            pairs in prop::collection::btree_map(any::<u8>(), 1u64..10_000, 2..64),
        ) {
            let pairs: Vec<(u8, u64)> = pairs.into_iter().collect();
            let codes = codes_for(&pairs);
            let all: Vec<Code> = codes.iter().map(|(_, c)| c).collect();
            prop_assert_eq!(all.len(), pairs.len());
            for (i, &a) in all.iter().enumerate() {
                for (j, &b) in all.iter().enumerate() {
                    if i != j {
                        prop_assert!(!is_prefix(a, b));
                    }
                }
            }
        }

        #[test]
        fn prop_tree_shape_invariants(
            pairs in prop::collection::btree_map(any::<u8>(), 1u64..1_000_000, 1..128),
        ) {
            let t: FrequencyTable = pairs.iter().map(|(&s, &f)| (s, f)).collect();
            let tree = HuffmanTree::build(&t).unwrap().unwrap();
            prop_assert_eq!(tree.leaf_count(), pairs.len());
            prop_assert_eq!(tree.internal_count(), pairs.len() - 1);
            prop_assert_eq!(tree.root().freq(), t.total());
            prop_assert_eq!(HuffmanTree::build(&t).unwrap().unwrap(), tree);
        }
    }
}
