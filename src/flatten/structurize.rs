//! Rebuilding a content tree from flat entries
//!
//! Entries are accumulated into a draft tree first and the final
//! [`ContentTree`] is built once at the end, so list positions can arrive in
//! any order and later entries can overwrite earlier leaves.

use super::FlattenLimits;
use crate::error::FlattenError;
use crate::path::{FlatPath, PathSegment};
use crate::types::{ContentTree, FlatEntrySet, FlatValue, Scalar};
use indexmap::IndexMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Accumulator for one node of the tree being rebuilt
#[derive(Debug)]
enum Draft {
    Leaf(Scalar),
    List(BTreeMap<usize, Draft>),
    Object(IndexMap<String, Draft>),
}

impl Draft {
    /// Empty container matching the kind of `segment`
    fn container_for(segment: &PathSegment) -> Self {
        match segment {
            PathSegment::Index(_) => Draft::List(BTreeMap::new()),
            PathSegment::Key(_) => Draft::Object(IndexMap::new()),
        }
    }

    /// Node a fresh entry value starts out as
    fn fresh(value: &FlatValue) -> Self {
        match value {
            FlatValue::Scalar(scalar) => Draft::Leaf(scalar.clone()),
            FlatValue::EmptyList => Draft::List(BTreeMap::new()),
            FlatValue::EmptyObject => Draft::Object(IndexMap::new()),
        }
    }

    /// Child slot for `segment`, created with `fresh` on first use
    ///
    /// A container that is still empty takes whichever kind its first child
    /// needs, so `"settings": []` can later receive named keys.
    fn child(
        &mut self,
        segment: &PathSegment,
        fresh: impl FnOnce() -> Draft,
        path: &FlatPath,
        at: usize,
    ) -> Result<&mut Draft, FlattenError> {
        if self.is_empty_container() {
            *self = Draft::container_for(segment);
        }

        match self {
            Draft::List(items) => match segment {
                PathSegment::Index(index) => Ok(items.entry(*index).or_insert_with(fresh)),
                PathSegment::Key(_) => Err(ambiguous(path, at, "named key where other entries put a list")),
            },
            Draft::Object(fields) => match segment {
                PathSegment::Key(key) => Ok(fields.entry(key.clone()).or_insert_with(fresh)),
                PathSegment::Index(_) => {
                    Err(ambiguous(path, at, "list index where other entries put an object"))
                }
            },
            Draft::Leaf(_) => Err(ambiguous(path, at, "path continues below a leaf")),
        }
    }

    fn is_empty_container(&self) -> bool {
        match self {
            Draft::List(items) => items.is_empty(),
            Draft::Object(fields) => fields.is_empty(),
            Draft::Leaf(_) => false,
        }
    }

    /// Store `value` at this node
    ///
    /// An empty-container entry only asks for a container here; children set
    /// by other entries take precedence over its kind.
    fn settle(&mut self, value: &FlatValue, path: &FlatPath) -> Result<(), FlattenError> {
        let at = path.len().saturating_sub(1);
        match (self, value) {
            (Draft::Leaf(slot), FlatValue::Scalar(scalar)) => {
                *slot = scalar.clone();
                Ok(())
            }
            (Draft::Leaf(_), _) => Err(ambiguous(path, at, "container collides with a leaf")),
            (_, FlatValue::Scalar(_)) => Err(ambiguous(path, at, "leaf collides with a container")),
            _ => Ok(()),
        }
    }

    fn build(self) -> ContentTree {
        match self {
            Draft::Leaf(scalar) => ContentTree::Leaf(scalar),
            Draft::List(items) => {
                let sparse = items.keys().enumerate().any(|(position, index)| position != *index);
                if sparse {
                    debug!(len = items.len(), "compacting list with missing indices");
                }
                ContentTree::List(items.into_values().map(Draft::build).collect())
            }
            Draft::Object(fields) => ContentTree::Object(
                fields
                    .into_iter()
                    .map(|(key, draft)| (key, draft.build()))
                    .collect(),
            ),
        }
    }
}

fn ambiguous(path: &FlatPath, at: usize, reason: &str) -> FlattenError {
    let end = (at + 1).min(path.len());
    FlattenError::AmbiguousStructure {
        path: FlatPath::from(&path.segments()[..end]).encode(),
        reason: reason.to_string(),
    }
}

/// Rebuild a nested tree from flat entries, with the default limits
///
/// Entries are applied in set order; a later entry for an already-set leaf
/// replaces it. An empty set yields an empty object. Entries that disagree on
/// whether a position holds a list, an object or a leaf are rejected.
pub fn structurize(entries: &FlatEntrySet) -> Result<ContentTree, FlattenError> {
    structurize_within(entries, &FlattenLimits::default())
}

/// [`structurize`] with paths limited to `limits.max_tree_depth` segments
pub fn structurize_within(entries: &FlatEntrySet, limits: &FlattenLimits) -> Result<ContentTree, FlattenError> {
    let mut root: Option<Draft> = None;

    for (path, value) in entries.iter() {
        let segments = path.segments();
        if segments.len() > limits.max_tree_depth {
            return Err(FlattenError::ExcessiveNesting {
                path: FlatPath::from(&segments[..=limits.max_tree_depth]).encode(),
                limit: limits.max_tree_depth,
            });
        }

        let node = match segments.first() {
            None => root.get_or_insert_with(|| Draft::fresh(value)),
            Some(first) => {
                let mut node = root.get_or_insert_with(|| Draft::container_for(first));
                for (at, segment) in segments.iter().enumerate() {
                    node = match segments.get(at + 1) {
                        Some(next) => node.child(segment, || Draft::container_for(next), path, at)?,
                        None => node.child(segment, || Draft::fresh(value), path, at)?,
                    };
                }
                node
            }
        };
        node.settle(value, path)?;
    }

    Ok(root.map(Draft::build).unwrap_or_else(ContentTree::empty_object))
}
