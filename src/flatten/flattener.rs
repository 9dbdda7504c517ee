use crate::error::FlattenError;
use crate::path::{FlatPath, PathSegment};
use crate::types::{ContentTree, FieldMap, FlatEntrySet, FlatValue, Scalar};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

// Only strings that look like a JSON container (or a JSON-encoded string) are
// worth handing to the parser.
static DOCUMENT_START: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^\s*[\[{"]"#).unwrap());

/// Depth limits applied while flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenLimits {
    /// Serialized sub-documents that may be unwrapped inside one another
    pub max_nesting_depth: usize,
    /// Structural depth of the tree, counting unwrapped documents
    pub max_tree_depth: usize,
}

impl Default for FlattenLimits {
    fn default() -> Self {
        FlattenLimits {
            max_nesting_depth: 32,
            max_tree_depth: 512,
        }
    }
}

/// Position of a string leaf that held a serialized sub-document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    pub path: FlatPath,
    /// How many times the document was JSON-encoded (2 for a double-encoded string)
    pub layers: usize,
}

/// Entries of a tree plus the serialization boundaries crossed to reach them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Flattened {
    pub entries: FlatEntrySet,
    pub boundaries: Vec<Boundary>,
}

/// Walks content trees depth-first and emits one entry per leaf
#[derive(Debug, Clone, Default)]
pub struct TreeFlattener {
    limits: FlattenLimits,
}

impl TreeFlattener {
    pub fn new(limits: FlattenLimits) -> Self {
        TreeFlattener { limits }
    }

    pub fn limits(&self) -> FlattenLimits {
        self.limits
    }

    /// Flatten a tree into ordered `(path, scalar)` entries
    pub fn flatten(&self, tree: &ContentTree) -> Result<FlatEntrySet, FlattenError> {
        Ok(self.flatten_with_boundaries(tree)?.entries)
    }

    /// Flatten a tree and remember where sub-documents were unwrapped
    pub fn flatten_with_boundaries(&self, tree: &ContentTree) -> Result<Flattened, FlattenError> {
        let mut out = Flattened::default();
        let mut path = Vec::new();
        self.walk(tree, &mut path, 0, 0, &mut out)?;
        Ok(out)
    }

    /// Rebuild a tree from entries, refusing paths deeper than `max_tree_depth`
    pub fn structurize(&self, entries: &FlatEntrySet) -> Result<ContentTree, FlattenError> {
        super::structurize::structurize_within(entries, &self.limits)
    }

    /// Widen hook output: every value is flattened below its own path
    pub fn flatten_fields(&self, fields: &FieldMap) -> Result<FlatEntrySet, FlattenError> {
        let mut out = Flattened::default();
        for (prefix, subtree) in fields {
            let mut path = prefix.segments().to_vec();
            let depth = path.len();
            self.walk(subtree, &mut path, depth, 0, &mut out)?;
        }
        Ok(out.entries)
    }

    fn walk(
        &self,
        node: &ContentTree,
        path: &mut Vec<PathSegment>,
        depth: usize,
        nesting: usize,
        out: &mut Flattened,
    ) -> Result<(), FlattenError> {
        if depth > self.limits.max_tree_depth {
            return Err(FlattenError::ExcessiveNesting {
                path: FlatPath::from(path.as_slice()).encode(),
                limit: self.limits.max_tree_depth,
            });
        }

        match node {
            ContentTree::List(items) if items.is_empty() => {
                out.entries.insert(FlatPath::from(path.as_slice()), FlatValue::EmptyList);
            }
            ContentTree::Object(fields) if fields.is_empty() => {
                out.entries.insert(FlatPath::from(path.as_slice()), FlatValue::EmptyObject);
            }
            ContentTree::List(items) => {
                for (index, item) in items.iter().enumerate() {
                    path.push(PathSegment::Index(index));
                    self.walk(item, path, depth + 1, nesting, out)?;
                    path.pop();
                }
            }
            ContentTree::Object(fields) => {
                for (key, value) in fields {
                    path.push(PathSegment::Key(key.clone()));
                    self.walk(value, path, depth + 1, nesting, out)?;
                    path.pop();
                }
            }
            ContentTree::Leaf(Scalar::String(text)) => {
                match self.unwrap_document(text, path, nesting)? {
                    Some((document, layers)) => {
                        out.boundaries.push(Boundary {
                            path: FlatPath::from(path.as_slice()),
                            layers,
                        });
                        self.walk(&document, path, depth, nesting + layers, out)?;
                    }
                    None => {
                        out.entries.insert(
                            FlatPath::from(path.as_slice()),
                            Scalar::String(text.clone()).into(),
                        );
                    }
                }
            }
            ContentTree::Leaf(scalar) => {
                out.entries.insert(FlatPath::from(path.as_slice()), scalar.clone().into());
            }
        }

        Ok(())
    }

    /// Decode a string leaf that holds a serialized, non-empty JSON container
    ///
    /// JSON-encoded strings are peeled one layer at a time. Strings that decode
    /// to a bare scalar (`"12"`, `"true"`) or to an empty container stay leaves.
    fn unwrap_document(
        &self,
        text: &str,
        path: &[PathSegment],
        nesting: usize,
    ) -> Result<Option<(ContentTree, usize)>, FlattenError> {
        let mut current = Cow::Borrowed(text);
        let mut layers = 0;

        loop {
            if !DOCUMENT_START.is_match(&current) {
                return Ok(None);
            }
            let Ok(value) = serde_json::from_str::<Value>(&current) else {
                return Ok(None);
            };
            layers += 1;

            let is_container = match &value {
                Value::Array(items) => !items.is_empty(),
                Value::Object(fields) => !fields.is_empty(),
                _ => false,
            };
            if is_container {
                return self.accept(value, layers, path, nesting);
            }

            match value {
                Value::String(inner) => current = Cow::Owned(inner),
                _ => return Ok(None),
            }
        }
    }

    fn accept(
        &self,
        value: Value,
        layers: usize,
        path: &[PathSegment],
        nesting: usize,
    ) -> Result<Option<(ContentTree, usize)>, FlattenError> {
        if nesting + layers > self.limits.max_nesting_depth {
            return Err(FlattenError::ExcessiveNesting {
                path: FlatPath::from(path).encode(),
                limit: self.limits.max_nesting_depth,
            });
        }
        Ok(Some((ContentTree::from(value), layers)))
    }
}

/// Re-encode the subtrees at `boundaries` as JSON string leaves
///
/// Deeper boundaries are re-encoded first so an outer document embeds the
/// already-serialized inner one. Boundaries whose subtree is gone (pruned or
/// filtered away) are skipped.
pub fn reserialize(tree: ContentTree, boundaries: &[Boundary]) -> ContentTree {
    let mut ordered: Vec<&Boundary> = boundaries.iter().collect();
    ordered.sort_by(|a, b| b.path.len().cmp(&a.path.len()));

    let mut tree = tree;
    for boundary in ordered {
        let Some(node) = tree.get_mut(&boundary.path) else {
            continue;
        };
        if node.is_leaf() {
            continue;
        }

        let subtree = std::mem::replace(node, ContentTree::Leaf(Scalar::Null));
        let mut text = Value::from(subtree).to_string();
        for _ in 1..boundary.layers {
            text = Value::String(text).to_string();
        }
        *node = ContentTree::Leaf(Scalar::String(text));
    }
    tree
}
