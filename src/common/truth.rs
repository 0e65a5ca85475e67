//! Ordered truth tables with don't-care patterns.
//!
//! The decode tables of the control unit are data, not control flow: each
//! row is a tuple of `0`/`1`/`X` patterns (written MSB-first) mapped to a
//! value. Lookup scans rows in insertion order and the first row whose every
//! pattern matches wins, so specific rows go above catch-alls. Patterns are
//! parsed once at construction and matched as mask/value pairs.

use super::bits::Bits;

#[derive(Clone, Copy)]
struct Pattern {
    care: u64,
    want: u64,
}

impl Pattern {
    /// Parses an MSB-first `0`/`1`/`X` string of exactly `width` characters.
    fn parse(text: &str, width: u32) -> Self {
        assert_eq!(
            text.len() as u32,
            width,
            "pattern {:?} does not match column width {}",
            text,
            width
        );
        let mut care = 0u64;
        let mut want = 0u64;
        for ch in text.chars() {
            care <<= 1;
            want <<= 1;
            match ch {
                '0' => care |= 1,
                '1' => {
                    care |= 1;
                    want |= 1;
                }
                'X' => {}
                _ => panic!("pattern {:?} contains invalid character {:?}", text, ch),
            }
        }
        Self { care, want }
    }

    fn matches(&self, key: &Bits) -> bool {
        key.to_u64() & self.care == self.want
    }
}

/// An insertion-ordered pattern-matching table.
pub struct TruthTable<V> {
    columns: Vec<u32>,
    rows: Vec<(Vec<Pattern>, V)>,
}

impl<V> TruthTable<V> {
    /// An empty table whose rows match keys of the given column widths.
    pub fn new(columns: &[u32]) -> Self {
        assert!(!columns.is_empty(), "truth table needs at least one column");
        assert!(columns.iter().all(|w| (1..=64).contains(w)));
        Self {
            columns: columns.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; builder style so tables read like the tables they are.
    pub fn row(mut self, patterns: &[&str], value: V) -> Self {
        assert_eq!(
            patterns.len(),
            self.columns.len(),
            "row has {} patterns, table has {} columns",
            patterns.len(),
            self.columns.len()
        );
        let parsed = patterns
            .iter()
            .zip(&self.columns)
            .map(|(text, width)| Pattern::parse(text, *width))
            .collect();
        self.rows.push((parsed, value));
        self
    }

    /// First-match lookup. Key widths must equal the column widths.
    pub fn lookup(&self, keys: &[Bits]) -> Option<&V> {
        assert_eq!(keys.len(), self.columns.len(), "lookup key arity mismatch");
        for (key, width) in keys.iter().zip(&self.columns) {
            assert_eq!(key.width(), *width, "lookup key width mismatch");
        }
        self.rows
            .iter()
            .find(|(patterns, _)| patterns.iter().zip(keys).all(|(p, k)| p.matches(k)))
            .map(|(_, value)| value)
    }
}
