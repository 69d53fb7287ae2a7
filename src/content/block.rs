use serde_yaml::{
    Mapping,
    Value,
};

use crate::config::BlocksConfig;

/// Where translation leaves live inside a page's front matter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSchema {
    /// Front matter field holding the block tree
    pub field: String,
    /// Key whose string value makes a mapping a leaf
    pub source_key: String,
    /// Prefix of inline per-locale value keys
    pub locale_key_prefix: String,
}

impl BlockSchema {
    /// Key of a leaf's inline value for `locale`.
    #[must_use]
    pub fn inline_key(&self, locale: &str) -> String {
        format!("{}{locale}", self.locale_key_prefix)
    }
}

impl Default for BlockSchema {
    fn default() -> Self {
        Self::from(&BlocksConfig::default())
    }
}

impl From<&BlocksConfig> for BlockSchema {
    fn from(config: &BlocksConfig) -> Self {
        Self {
            field: config.field.clone(),
            source_key: config.source_key.clone(),
            locale_key_prefix: config.locale_key_prefix.clone(),
        }
    }
}

/// One node of a content block tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Ordered children
    Container(Container),
    /// Translatable unit
    Leaf(LeafBlock),
    /// Any other value, kept verbatim
    Scalar(Value),
}

/// Children of a sequence or of a mapping that is not a leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Container {
    Sequence(Vec<Block>),
    /// Keys are kept so the mapping round-trips in order
    Mapping(Vec<(Value, Block)>),
}

impl Container {
    pub fn children(&self) -> Box<dyn Iterator<Item = &Block> + '_> {
        match self {
            Self::Sequence(items) => Box::new(items.iter()),
            Self::Mapping(entries) => Box::new(entries.iter().map(|(_, block)| block)),
        }
    }

    pub fn children_mut(&mut self) -> Box<dyn Iterator<Item = &mut Block> + '_> {
        match self {
            Self::Sequence(items) => Box::new(items.iter_mut()),
            Self::Mapping(entries) => Box::new(entries.iter_mut().map(|(_, block)| block)),
        }
    }
}

/// A mapping carrying source text and inline per-locale translations.
///
/// All fields of the original mapping are kept in order; inline values are
/// read and written in place.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafBlock {
    /// Raw value of the source key
    source_text: String,
    /// The whole mapping, source key included
    fields: Mapping,
}

impl LeafBlock {
    #[must_use]
    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    /// Inline value stored under `key`. Null and non-string values count as absent.
    #[must_use]
    pub fn inline_value(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn set_inline_value(&mut self, key: &str, value: &str) {
        self.fields.insert(Value::String(key.to_string()), Value::String(value.to_string()));
    }
}

impl Block {
    /// Classifies a YAML value. A mapping holding `schema.source_key` as a
    /// string becomes a leaf and is not searched further.
    #[must_use]
    pub fn from_value(value: Value, schema: &BlockSchema) -> Self {
        match value {
            Value::Sequence(items) => Self::Container(Container::Sequence(
                items.into_iter().map(|item| Self::from_value(item, schema)).collect(),
            )),
            Value::Mapping(fields) => {
                if let Some(source_text) =
                    fields.get(schema.source_key.as_str()).and_then(Value::as_str)
                {
                    return Self::Leaf(LeafBlock { source_text: source_text.to_string(), fields });
                }
                Self::Container(Container::Mapping(
                    fields
                        .into_iter()
                        .map(|(key, child)| (key, Self::from_value(child, schema)))
                        .collect(),
                ))
            }
            other => Self::Scalar(other),
        }
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Container(Container::Sequence(items)) => {
                Value::Sequence(items.into_iter().map(Self::into_value).collect())
            }
            Self::Container(Container::Mapping(entries)) => Value::Mapping(
                entries.into_iter().map(|(key, block)| (key, block.into_value())).collect(),
            ),
            Self::Leaf(leaf) => Value::Mapping(leaf.fields),
            Self::Scalar(value) => value,
        }
    }

    /// Leaves in document order.
    #[must_use]
    pub fn leaves(&self) -> Vec<&LeafBlock> {
        let mut leaves = Vec::new();
        collect_leaves(self, &mut leaves);
        leaves
    }
}

fn collect_leaves<'a>(block: &'a Block, leaves: &mut Vec<&'a LeafBlock>) {
    match block {
        Block::Container(container) => {
            for child in container.children() {
                collect_leaves(child, leaves);
            }
        }
        Block::Leaf(leaf) => leaves.push(leaf),
        Block::Scalar(_) => {}
    }
}

/// The block tree of one page plus the rest of its front matter.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentTree {
    /// Front matter; the blocks field holds `Null` while the tree is detached
    header: Mapping,
    /// Name of the blocks field
    field: String,
    root: Block,
}

impl ContentTree {
    /// Detaches the blocks field from a page header. `None` when the header
    /// has no such field.
    #[must_use]
    pub fn from_header(mut header: Mapping, schema: &BlockSchema) -> Option<Self> {
        let slot = header.get_mut(schema.field.as_str())?;
        let value = std::mem::replace(slot, Value::Null);
        let root = Block::from_value(value, schema);
        Some(Self { header, field: schema.field.clone(), root })
    }

    #[must_use]
    pub const fn root(&self) -> &Block {
        &self.root
    }

    pub const fn root_mut(&mut self) -> &mut Block {
        &mut self.root
    }

    /// Re-attaches the block tree at its original position in the header.
    #[must_use]
    pub fn into_header(self) -> Mapping {
        let mut header = self.header;
        header.insert(Value::String(self.field), self.root.into_value());
        header
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    fn header(yaml: &str) -> Mapping {
        serde_yaml::from_str(yaml).unwrap()
    }

    const PAGE: &str = r"
title: Home
content_blocks:
  - _name: hero
    heading:
      original: Hello
      fr: Bonjour
    tagline: Plain text
  - _name: columns
    columns:
      - original: Left
      - original: Right
        de: ~
after: 1
";

    #[googletest::test]
    fn from_header_finds_nested_leaves_in_document_order() {
        let tree = ContentTree::from_header(header(PAGE), &BlockSchema::default()).unwrap();

        let leaves = tree.root().leaves();

        expect_that!(
            leaves.iter().map(|leaf| leaf.source_text().to_string()).collect::<Vec<_>>(),
            elements_are![eq("Hello"), eq("Left"), eq("Right")]
        );
        expect_that!(leaves[0].inline_value("fr"), some(eq("Bonjour")));
        expect_that!(leaves[2].inline_value("de"), none());
    }

    #[googletest::test]
    fn from_header_without_blocks_field() {
        let tree = ContentTree::from_header(header("title: Home\n"), &BlockSchema::default());

        expect_that!(tree, none());
    }

    #[rstest]
    fn round_trip_preserves_field_order() {
        let tree = ContentTree::from_header(header(PAGE), &BlockSchema::default()).unwrap();

        let keys: Vec<String> = tree
            .into_header()
            .keys()
            .filter_map(|key| key.as_str().map(String::from))
            .collect();

        assert_that!(keys, elements_are![eq("title"), eq("content_blocks"), eq("after")]);
    }

    #[rstest]
    fn round_trip_without_changes_is_identity() {
        let original = header(PAGE);
        let tree = ContentTree::from_header(original.clone(), &BlockSchema::default()).unwrap();

        assert_that!(tree.into_header(), eq(&original));
    }

    #[rstest]
    fn set_inline_value_replaces_in_place_and_appends_new_keys() {
        let value = serde_yaml::from_str("original: Hi\nfr: Salut\nnote: x\n").unwrap();
        let Block::Leaf(mut leaf) = Block::from_value(value, &BlockSchema::default()) else {
            panic!("expected a leaf");
        };

        leaf.set_inline_value("fr", "Bonjour");
        leaf.set_inline_value("de", "Hallo");

        let text = serde_yaml::to_string(&Block::Leaf(leaf).into_value()).unwrap();
        assert_that!(text, eq("original: Hi\nfr: Bonjour\nnote: x\nde: Hallo\n"));
    }

    #[rstest]
    fn custom_schema_prefix_and_source_key() {
        let schema = BlockSchema {
            field: "blocks".to_string(),
            source_key: "text".to_string(),
            locale_key_prefix: "t_".to_string(),
        };
        let yaml = "blocks:\n  - text: Hi\n    t_fr: Salut\n";
        let tree = ContentTree::from_header(header(yaml), &schema).unwrap();

        let leaves = tree.root().leaves();

        assert_that!(leaves, len(eq(1)));
        assert_that!(leaves[0].inline_value(&schema.inline_key("fr")), some(eq("Salut")));
    }
}
