use crate::error::PathError;
use crate::path::{FlatPath, PathCodec, PathSegment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A translatable leaf value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Scalar::Bool(b)
    }
}

impl From<i64> for Scalar {
    fn from(n: i64) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Number(n.into())
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Number(n) => Value::Number(n),
            Scalar::String(s) => Value::String(s),
        }
    }
}

/// Converts scalars to the plain text used for transport and back
///
/// Every leaf travels to the translation connector as text. Decoding takes the
/// original leaf as a hint so numbers and booleans that come back unchanged keep
/// their type; anything that no longer fits the hint stays a string.
pub struct ScalarCodec;

impl ScalarCodec {
    pub fn to_text(scalar: &Scalar) -> String {
        match scalar {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Number(n) => n.to_string(),
            Scalar::String(s) => s.clone(),
        }
    }

    pub fn from_text(text: &str, hint: Option<&Scalar>) -> Scalar {
        match hint {
            Some(Scalar::Null) if text.is_empty() => Scalar::Null,
            Some(Scalar::Bool(_)) => match text {
                "true" => Scalar::Bool(true),
                "false" => Scalar::Bool(false),
                _ => Scalar::String(text.to_string()),
            },
            Some(Scalar::Number(_)) => text
                .parse::<Number>()
                .map(Scalar::Number)
                .unwrap_or_else(|_| Scalar::String(text.to_string())),
            _ => Scalar::String(text.to_string()),
        }
    }
}

/// A nested unit of translatable content
///
/// Objects keep their keys in insertion order, so flattening and rebuilding a
/// tree never reorders widgets or settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentTree {
    List(Vec<ContentTree>),
    Object(IndexMap<String, ContentTree>),
    Leaf(Scalar),
}

impl ContentTree {
    pub fn empty_object() -> Self {
        ContentTree::Object(IndexMap::new())
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, ContentTree::Leaf(_))
    }

    /// Look up the node at `path`
    pub fn get(&self, path: &FlatPath) -> Option<&ContentTree> {
        path.segments()
            .iter()
            .try_fold(self, |node, segment| match (node, segment) {
                (ContentTree::List(items), PathSegment::Index(i)) => items.get(*i),
                (ContentTree::Object(fields), PathSegment::Key(k)) => fields.get(k),
                _ => None,
            })
    }

    pub(crate) fn get_mut(&mut self, path: &FlatPath) -> Option<&mut ContentTree> {
        let mut node = self;
        for segment in path.segments() {
            node = match node {
                ContentTree::List(items) => match segment {
                    PathSegment::Index(i) => items.get_mut(*i)?,
                    PathSegment::Key(_) => return None,
                },
                ContentTree::Object(fields) => match segment {
                    PathSegment::Key(k) => fields.get_mut(k)?,
                    PathSegment::Index(_) => return None,
                },
                ContentTree::Leaf(_) => return None,
            };
        }
        Some(node)
    }
}

impl From<Value> for ContentTree {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => ContentTree::Leaf(Scalar::Null),
            Value::Bool(b) => ContentTree::Leaf(Scalar::Bool(b)),
            Value::Number(n) => ContentTree::Leaf(Scalar::Number(n)),
            Value::String(s) => ContentTree::Leaf(Scalar::String(s)),
            Value::Array(items) => ContentTree::List(items.into_iter().map(ContentTree::from).collect()),
            Value::Object(fields) => ContentTree::Object(
                fields
                    .into_iter()
                    .map(|(key, value)| (key, ContentTree::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<ContentTree> for Value {
    fn from(tree: ContentTree) -> Self {
        match tree {
            ContentTree::Leaf(scalar) => scalar.into(),
            ContentTree::List(items) => Value::Array(items.into_iter().map(Value::from).collect()),
            ContentTree::Object(fields) => Value::Object(
                fields
                    .into_iter()
                    .map(|(key, node)| (key, Value::from(node)))
                    .collect(),
            ),
        }
    }
}

/// Hook output: each path may carry a whole subtree, widened by re-flattening
pub type FieldMap = IndexMap<FlatPath, ContentTree>;

/// Value of one flat entry
///
/// Empty lists and objects have no leaves of their own, so they get an entry
/// of their own to survive the trip back to a tree.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatValue {
    Scalar(Scalar),
    EmptyList,
    EmptyObject,
}

impl FlatValue {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            FlatValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn is_empty_container(&self) -> bool {
        !matches!(self, FlatValue::Scalar(_))
    }
}

impl From<Scalar> for FlatValue {
    fn from(scalar: Scalar) -> Self {
        FlatValue::Scalar(scalar)
    }
}

impl From<&str> for FlatValue {
    fn from(s: &str) -> Self {
        FlatValue::Scalar(s.into())
    }
}

impl From<String> for FlatValue {
    fn from(s: String) -> Self {
        FlatValue::Scalar(s.into())
    }
}

impl From<bool> for FlatValue {
    fn from(b: bool) -> Self {
        FlatValue::Scalar(b.into())
    }
}

impl From<i64> for FlatValue {
    fn from(n: i64) -> Self {
        FlatValue::Scalar(n.into())
    }
}

impl From<i32> for FlatValue {
    fn from(n: i32) -> Self {
        FlatValue::Scalar(n.into())
    }
}

impl From<FlatValue> for ContentTree {
    fn from(value: FlatValue) -> Self {
        match value {
            FlatValue::Scalar(scalar) => ContentTree::Leaf(scalar),
            FlatValue::EmptyList => ContentTree::List(Vec::new()),
            FlatValue::EmptyObject => ContentTree::empty_object(),
        }
    }
}

impl From<FlatValue> for Value {
    fn from(value: FlatValue) -> Self {
        ContentTree::from(value).into()
    }
}

/// Ordered, path-addressed entries of one content tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatEntrySet {
    entries: IndexMap<FlatPath, FlatValue>,
}

impl FlatEntrySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Set the value at `path`; an existing path keeps its position
    pub fn insert(&mut self, path: FlatPath, value: FlatValue) -> Option<FlatValue> {
        self.entries.insert(path, value)
    }

    pub fn get(&self, path: &FlatPath) -> Option<&FlatValue> {
        self.entries.get(path)
    }

    /// Look up by encoded key, e.g. `"items/0"`
    pub fn get_encoded(&self, key: &str) -> Result<Option<&FlatValue>, PathError> {
        let path = PathCodec::decode(key)?;
        Ok(self.entries.get(&path))
    }

    pub fn contains(&self, path: &FlatPath) -> bool {
        self.entries.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FlatPath, &FlatValue)> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FlatPath> {
        self.entries.keys()
    }

    /// Drop empty-container entries, keeping only the leaves
    pub fn into_scalars(self) -> Self {
        self.entries
            .into_iter()
            .filter(|(_, value)| !value.is_empty_container())
            .collect()
    }

    /// Each entry as a single-node subtree, the shape field hooks work on
    pub fn into_field_map(self) -> FieldMap {
        self.entries
            .into_iter()
            .map(|(path, value)| (path, ContentTree::from(value)))
            .collect()
    }

    /// Encoded keys mapped to text values, ready for the translation connector
    ///
    /// Empty containers carry no text and are left out.
    pub fn to_transport(&self) -> IndexMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(path, value)| Some((path.encode(), ScalarCodec::to_text(value.as_scalar()?))))
            .collect()
    }

    /// Decode a transport map; `hints` restores the original leaf types
    pub fn from_transport(
        map: &IndexMap<String, String>,
        hints: Option<&FlatEntrySet>,
    ) -> Result<Self, PathError> {
        let mut entries = IndexMap::with_capacity(map.len());
        for (key, text) in map {
            let path = PathCodec::decode(key)?;
            let hint = hints.and_then(|h| h.get(&path)).and_then(FlatValue::as_scalar);
            entries.insert(path, FlatValue::Scalar(ScalarCodec::from_text(text, hint)));
        }
        Ok(FlatEntrySet { entries })
    }
}

impl FromIterator<(FlatPath, FlatValue)> for FlatEntrySet {
    fn from_iter<I: IntoIterator<Item = (FlatPath, FlatValue)>>(iter: I) -> Self {
        FlatEntrySet {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FlatEntrySet {
    type Item = (FlatPath, FlatValue);
    type IntoIter = indexmap::map::IntoIter<FlatPath, FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Extend<(FlatPath, FlatValue)> for FlatEntrySet {
    fn extend<I: IntoIterator<Item = (FlatPath, FlatValue)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tree_from_value_keeps_key_order() {
        let tree = ContentTree::from(json!({"zeta": 1, "alpha": [true, null], "mid": "x"}));

        let ContentTree::Object(fields) = &tree else {
            panic!("Expected object, got: {:?}", tree);
        };
        let keys: Vec<&str> = fields.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);

        let back = Value::from(tree);
        assert_eq!(back, json!({"zeta": 1, "alpha": [true, null], "mid": "x"}));
    }

    #[test]
    fn test_tree_deserializes_untagged() {
        let tree: ContentTree = serde_json::from_str(r#"{"a": [1, "b"], "c": null}"#).unwrap();
        assert_eq!(tree, ContentTree::from(json!({"a": [1, "b"], "c": null})));
    }

    #[test]
    fn test_get_by_path() {
        let tree = ContentTree::from(json!({"items": [{"title": "Hi"}]}));
        let path: FlatPath = "items/0/title".parse().unwrap();
        assert_eq!(tree.get(&path), Some(&ContentTree::Leaf("Hi".into())));

        let missing: FlatPath = "items/3/title".parse().unwrap();
        assert_eq!(tree.get(&missing), None);
    }

    #[test]
    fn test_scalar_text_codec() {
        assert_eq!(ScalarCodec::to_text(&Scalar::Null), "");
        assert_eq!(ScalarCodec::to_text(&Scalar::Bool(true)), "true");
        assert_eq!(ScalarCodec::to_text(&Scalar::from(42)), "42");
        assert_eq!(ScalarCodec::to_text(&Scalar::from("Hi")), "Hi");
    }

    #[test]
    fn test_scalar_from_text_uses_hint() {
        let number = Scalar::from(7);
        assert_eq!(ScalarCodec::from_text("12", Some(&number)), Scalar::from(12));
        assert_eq!(ScalarCodec::from_text("douze", Some(&number)), Scalar::from("douze"));
        assert_eq!(ScalarCodec::from_text("false", Some(&Scalar::Bool(true))), Scalar::Bool(false));
        assert_eq!(ScalarCodec::from_text("", Some(&Scalar::Null)), Scalar::Null);
        assert_eq!(ScalarCodec::from_text("12", None), Scalar::from("12"));
    }

    #[test]
    fn test_transport_round_trip() {
        let mut entries = FlatEntrySet::new();
        entries.insert("title".parse().unwrap(), "Hi".into());
        entries.insert("count".parse().unwrap(), 3.into());
        entries.insert("items/0".parse().unwrap(), "a".into());

        let transport = entries.to_transport();
        let keys: Vec<&str> = transport.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "count", "items/0"]);
        assert_eq!(transport["count"], "3");

        let decoded = FlatEntrySet::from_transport(&transport, Some(&entries)).unwrap();
        assert_eq!(decoded, entries);
    }

    #[test]
    fn test_transport_leaves_out_empty_containers() {
        let mut entries = FlatEntrySet::new();
        entries.insert("title".parse().unwrap(), "Hi".into());
        entries.insert("elements".parse().unwrap(), FlatValue::EmptyList);
        entries.insert("settings".parse().unwrap(), FlatValue::EmptyObject);

        let transport = entries.to_transport();
        assert_eq!(transport.len(), 1);
        assert_eq!(transport["title"], "Hi");

        let scalars = entries.into_scalars();
        let keys: Vec<String> = scalars.paths().map(|p| p.encode()).collect();
        assert_eq!(keys, vec!["title"]);
    }

    #[test]
    fn test_empty_containers_as_trees() {
        assert_eq!(ContentTree::from(FlatValue::EmptyList), ContentTree::from(json!([])));
        assert_eq!(Value::from(FlatValue::EmptyObject), json!({}));
        assert_eq!(Value::from(FlatValue::from("Hi")), json!("Hi"));
    }

    #[test]
    fn test_from_transport_rejects_malformed_keys() {
        let mut transport = IndexMap::new();
        transport.insert("a//b".to_string(), "x".to_string());
        assert!(FlatEntrySet::from_transport(&transport, None).is_err());
    }

    #[test]
    fn test_insert_existing_path_keeps_position() {
        let mut entries = FlatEntrySet::new();
        entries.insert("a".parse().unwrap(), "1".into());
        entries.insert("b".parse().unwrap(), "2".into());
        let previous = entries.insert("a".parse().unwrap(), "3".into());

        assert_eq!(previous, Some("1".into()));
        let order: Vec<String> = entries.paths().map(|p| p.encode()).collect();
        assert_eq!(order, vec!["a", "b"]);
        assert_eq!(entries.get_encoded("a").unwrap(), Some(&FlatValue::from("3")));
    }
}
