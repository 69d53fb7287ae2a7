//! The two traversals of a page synchronization.
//!
//! Both passes visit the block tree depth-first in document order and act on
//! every leaf whose normalized source text equals a key's canonical text.
//!
//! - [`BlockWalker::match_pass`] finds inline values that differ from the
//!   stored ones. When several matching leaves carry different values for the
//!   same locale, the leaf visited last wins; every overridden value is
//!   reported as a [`Divergence`].
//! - [`BlockWalker::propagate_pass`] writes the stored value into every
//!   matching leaf so duplicate embeddings converge.

use std::collections::BTreeMap;

use crate::content::{
    Block,
    BlockSchema,
    LeafBlock,
};
use crate::locale_store::LocaleSnapshot;
use crate::markup::normalize_text;
use crate::registry::TranslationKey;

/// Inline values to write back for one key: locale → value.
pub type KeyUpdates = BTreeMap<String, String>;

/// Two matching leaves disagreed on a locale; `discarded` came first in
/// document order and lost to `kept`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Divergence {
    pub key: TranslationKey,
    pub locale: String,
    pub discarded: String,
    pub kept: String,
}

/// Result of the match pass for one key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// Locales whose inline value differs from the store
    pub updates: KeyUpdates,
    pub divergences: Vec<Divergence>,
    /// Number of leaves that matched the key
    pub matched: usize,
}

/// Matches and merges translation leaves of a block tree.
#[derive(Debug, Clone, Copy)]
pub struct BlockWalker<'a> {
    /// Configured locales, in order
    locales: &'a [String],
    /// Leaf layout
    schema: &'a BlockSchema,
}

impl<'a> BlockWalker<'a> {
    #[must_use]
    pub const fn new(locales: &'a [String], schema: &'a BlockSchema) -> Self {
        Self { locales, schema }
    }

    /// Pass 1: inline values of `key` that differ from `snapshot`.
    ///
    /// Leaves without an inline value for a locale contribute nothing.
    #[must_use]
    pub fn match_pass(
        &self,
        root: &Block,
        key: &TranslationKey,
        canonical: &str,
        snapshot: &LocaleSnapshot,
    ) -> MatchOutcome {
        let mut outcome = MatchOutcome::default();

        visit_matches(root, canonical, &mut |leaf| {
            outcome.matched += 1;
            for locale in self.locales {
                let Some(inline) = leaf.inline_value(&self.schema.inline_key(locale)) else {
                    continue;
                };
                if snapshot.get(locale, key) == Some(inline) {
                    continue;
                }

                if let Some(previous) = outcome.updates.insert(locale.clone(), inline.to_string())
                    && previous != inline
                {
                    outcome.divergences.push(Divergence {
                        key: key.clone(),
                        locale: locale.clone(),
                        discarded: previous,
                        kept: inline.to_string(),
                    });
                }
            }
        });

        outcome
    }

    /// Pass 2: overwrites every matching leaf's inline values with the
    /// stored ones. Locales with no stored value are left as they are.
    ///
    /// Returns the number of matching leaves.
    pub fn propagate_pass(
        &self,
        root: &mut Block,
        key: &TranslationKey,
        canonical: &str,
        snapshot: &LocaleSnapshot,
    ) -> usize {
        let mut matched = 0;

        visit_matches_mut(root, canonical, &mut |leaf| {
            matched += 1;
            for locale in self.locales {
                if let Some(stored) = snapshot.get(locale, key) {
                    leaf.set_inline_value(&self.schema.inline_key(locale), stored);
                }
            }
        });

        matched
    }
}

fn is_match(leaf: &LeafBlock, canonical: &str) -> bool {
    normalize_text(leaf.source_text()) == canonical
}

fn visit_matches(block: &Block, canonical: &str, visit: &mut impl FnMut(&LeafBlock)) {
    match block {
        Block::Container(container) => {
            for child in container.children() {
                visit_matches(child, canonical, visit);
            }
        }
        Block::Leaf(leaf) if is_match(leaf, canonical) => visit(leaf),
        Block::Leaf(_) | Block::Scalar(_) => {}
    }
}

fn visit_matches_mut(block: &mut Block, canonical: &str, visit: &mut impl FnMut(&mut LeafBlock)) {
    match block {
        Block::Container(container) => {
            for child in container.children_mut() {
                visit_matches_mut(child, canonical, visit);
            }
        }
        Block::Leaf(leaf) if is_match(&*leaf, canonical) => visit(leaf),
        Block::Leaf(_) | Block::Scalar(_) => {}
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;
    use crate::test_utils::{
        block_tree,
        locale_snapshot as snapshot,
    };

    #[fixture]
    fn locales() -> Vec<String> {
        vec!["fr".to_string(), "de".to_string()]
    }

    fn tree(yaml: &str) -> Block {
        block_tree(yaml, &BlockSchema::default())
    }

    fn inline_values(root: &Block, locale: &str) -> Vec<Option<String>> {
        root.leaves().iter().map(|leaf| leaf.inline_value(locale).map(String::from)).collect()
    }

    const DUPLICATES: &str = r"
content_blocks:
  - heading:
      original: Hello
      fr: X
  - section:
      items:
        - original: Hello
          fr: Y
";

    #[rstest]
    fn match_pass_last_leaf_wins(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let root = tree(DUPLICATES);

        let outcome =
            walker.match_pass(&root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Z")]));

        assert_that!(outcome.updates.get("fr"), some(eq("Y")));
        assert_that!(outcome.updates.get("de"), none());
        assert_that!(outcome.matched, eq(2));
        assert_that!(
            outcome.divergences,
            elements_are![all![
                field!(Divergence.locale, eq("fr")),
                field!(Divergence.discarded, eq("X")),
                field!(Divergence.kept, eq("Y"))
            ]]
        );
    }

    #[rstest]
    fn match_pass_keeps_earlier_value_when_later_leaf_equals_store(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let root = tree(DUPLICATES);

        let outcome =
            walker.match_pass(&root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Y")]));

        assert_that!(outcome.updates.get("fr"), some(eq("X")));
        assert_that!(outcome.divergences, is_empty());
    }

    #[rstest]
    fn match_pass_ignores_leaves_without_inline_value(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let root = tree("content_blocks:\n  - original: Hello\n    fr: ~\n");

        let outcome =
            walker.match_pass(&root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Bonjour")]));

        assert_that!(outcome.updates, is_empty());
        assert_that!(outcome.matched, eq(1));
    }

    #[rstest]
    fn match_pass_reports_values_missing_from_store(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let root = tree("content_blocks:\n  - original: Hello\n    fr: Bonjour\n    de: Hallo\n");

        let outcome =
            walker.match_pass(&root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Bonjour")]));

        assert_that!(outcome.updates.len(), eq(1));
        assert_that!(outcome.updates.get("de"), some(eq("Hallo")));
    }

    #[rstest]
    #[case::crlf_and_padding("content_blocks:\n  - original: \"  Hello\\r\\nWorld \"\n    fr: Salut\n")]
    #[case::block_scalar("content_blocks:\n  - original: |\n      Hello\n      World\n    fr: Salut\n")]
    fn match_pass_normalizes_source_text(locales: Vec<String>, #[case] yaml: &str) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);

        let outcome =
            walker.match_pass(&tree(yaml), &"k1".into(), "Hello\nWorld", &LocaleSnapshot::new());

        assert_that!(outcome.updates.get("fr"), some(eq("Salut")));
    }

    #[rstest]
    fn match_pass_skips_other_keys(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let root = tree("content_blocks:\n  - original: Goodbye\n    fr: Au revoir\n");

        let outcome = walker.match_pass(&root, &"k1".into(), "Hello", &LocaleSnapshot::new());

        assert_that!(outcome, eq(&MatchOutcome::default()));
    }

    #[rstest]
    fn propagate_pass_converges_all_duplicates(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let mut root = tree(DUPLICATES);

        let matched = walker.propagate_pass(
            &mut root,
            &"k1".into(),
            "Hello",
            &snapshot(&[("fr", "k1", "Y"), ("de", "k1", "Hallo")]),
        );

        assert_that!(matched, eq(2));
        assert_that!(
            inline_values(&root, "fr"),
            elements_are![some(eq("Y")), some(eq("Y"))]
        );
        assert_that!(
            inline_values(&root, "de"),
            elements_are![some(eq("Hallo")), some(eq("Hallo"))]
        );
    }

    #[rstest]
    fn propagate_pass_leaves_locales_without_stored_value(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let mut root = tree("content_blocks:\n  - original: Hello\n    de: Hallo\n");

        walker.propagate_pass(&mut root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Bonjour")]));

        assert_that!(inline_values(&root, "fr"), elements_are![some(eq("Bonjour"))]);
        assert_that!(inline_values(&root, "de"), elements_are![some(eq("Hallo"))]);
    }

    #[rstest]
    fn propagate_pass_is_idempotent(locales: Vec<String>) {
        let schema = BlockSchema::default();
        let walker = BlockWalker::new(&locales, &schema);
        let stored = snapshot(&[("fr", "k1", "Y")]);
        let mut root = tree(DUPLICATES);

        walker.propagate_pass(&mut root, &"k1".into(), "Hello", &stored);
        let once = root.clone();
        walker.propagate_pass(&mut root, &"k1".into(), "Hello", &stored);

        assert_that!(root, eq(&once));
    }

    #[rstest]
    fn propagate_pass_uses_locale_key_prefix(locales: Vec<String>) {
        let schema = BlockSchema { locale_key_prefix: "t_".to_string(), ..BlockSchema::default() };
        let walker = BlockWalker::new(&locales, &schema);
        let mut root = block_tree("content_blocks:\n  - original: Hello\n", &schema);

        walker.propagate_pass(&mut root, &"k1".into(), "Hello", &snapshot(&[("fr", "k1", "Bonjour")]));

        assert_that!(inline_values(&root, "t_fr"), elements_are![some(eq("Bonjour"))]);
        assert_that!(inline_values(&root, "fr"), elements_are![none()]);
    }
}
