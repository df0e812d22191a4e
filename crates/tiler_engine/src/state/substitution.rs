//! Instance substitution tables
//!
//! A table rewrites list names while instances are resolved. Merging keeps it
//! closed under chaining: substituting `A→B` and later `B→C` resolves `A` to `C`.

use crate::foundation::collections::BoundedVec;
use crate::scene::Name;

/// `(original, replacement)` pairs in effect for the current subtree
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionTable {
    pairs: BoundedVec<(Name, Name)>,
}

impl SubstitutionTable {
    /// Empty table holding at most `capacity` pairs
    pub fn new(capacity: usize) -> Self {
        Self {
            pairs: BoundedVec::new(capacity),
        }
    }

    /// Merge a batch of pairs.
    ///
    /// For each new `(c, d)`: a pair `(a, b)` with `a == c` becomes `(a, d)`;
    /// failing that, every pair with `b == c` becomes `(a, d)`; failing that,
    /// `(c, d)` is appended if there is room and dropped otherwise.
    pub fn merge(&mut self, batch: &[(Name, Name)]) {
        for &(original, replacement) in batch {
            if let Some(pair) = self
                .pairs
                .as_mut_slice()
                .iter_mut()
                .find(|(from, _)| *from == original)
            {
                pair.1 = replacement;
                continue;
            }

            let mut chained = false;
            for pair in self.pairs.as_mut_slice() {
                if pair.1 == original {
                    pair.1 = replacement;
                    chained = true;
                }
            }
            if chained {
                continue;
            }

            if self.pairs.try_push((original, replacement)).is_err() {
                log::debug!("Substitution table full, dropping {original} -> {replacement}");
            }
        }
    }

    /// Name to use in place of `name`
    pub fn resolve(&self, name: Name) -> Name {
        self.pairs
            .iter()
            .find(|(from, _)| *from == name)
            .map_or(name, |(_, to)| *to)
    }

    /// Pairs currently held
    pub fn pairs(&self) -> &[(Name, Name)] {
        self.pairs.as_slice()
    }

    /// True when nothing is substituted
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
