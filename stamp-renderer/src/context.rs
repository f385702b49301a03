//! Template context — the named values a header can reference.

use serde::Serialize;
use serde_json::{Map, Value};

use stamp_core::File;

use crate::error::RenderError;

/// String-keyed rendering payload.
///
/// Built fresh for every file by [`TemplateContext::for_file`]; a static
/// context supplied at stage construction is layered on top.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TemplateContext(Map<String, Value>);

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from any value that serializes to a mapping.
    pub fn from_serialize<T: Serialize>(value: &T) -> Result<Self, RenderError> {
        match serde_json::to_value(value)? {
            Value::Object(map) => Ok(TemplateContext(map)),
            other => Err(RenderError::ContextNotAMapping {
                kind: kind_of(&other),
            }),
        }
    }

    /// Per-file context. Later layers win:
    ///
    /// 1. the file's `data` entries, as top-level keys
    /// 2. `file` (see [`stamp_core::FileView`]) and `filename`
    /// 3. `statics`
    pub fn for_file(file: &File, statics: &TemplateContext) -> Result<Self, RenderError> {
        let mut map = file.data().clone();
        map.insert("file".to_string(), serde_json::to_value(file.view())?);
        map.insert("filename".to_string(), Value::String(file.basename()));
        for (key, value) in &statics.0 {
            map.insert(key.clone(), value.clone());
        }
        Ok(TemplateContext(map))
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Resolve a dotted path such as `file.path` or `authors.0.name`.
    pub fn lookup(&self, path: &str) -> Option<&Value> {
        let segments: Vec<&str> = path.split('.').collect();
        self.resolve(&segments)
    }

    /// [`lookup`](Self::lookup) rendered as text; missing values become `""`.
    pub fn get_or_empty(&self, path: &str) -> String {
        self.lookup(path).map(value_to_string).unwrap_or_default()
    }

    pub(crate) fn resolve<S: AsRef<str>>(&self, segments: &[S]) -> Option<&Value> {
        let (first, rest) = segments.split_first()?;
        let mut current = self.0.get(first.as_ref())?;
        for segment in rest {
            let segment = segment.as_ref();
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Convert to a [`tera::Context`] for expression placeholders.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(&self.0).map_err(RenderError::from)
    }
}

impl From<Map<String, Value>> for TemplateContext {
    fn from(map: Map<String, Value>) -> Self {
        TemplateContext(map)
    }
}

/// Text substituted for a resolved value: strings verbatim, null as nothing,
/// arrays and objects as compact JSON.
pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn file_with_data() -> File {
        let mut file = File::new("test/fixture/file.txt")
            .with_base("test/fixture")
            .with_contents("Hello world");
        file.insert_data("license", "WTFPL");
        file.insert_data("filename", "from-data");
        file
    }

    #[test]
    fn file_fields_are_exposed() {
        let ctx = TemplateContext::for_file(&file_with_data(), &TemplateContext::new()).unwrap();
        assert_eq!(ctx.get_or_empty("file.relative"), "file.txt");
        assert_eq!(ctx.get_or_empty("file.path"), "test/fixture/file.txt");
        assert_eq!(ctx.get_or_empty("license"), "WTFPL");
    }

    #[test]
    fn file_binding_overrides_data_and_statics_override_both() {
        let statics = TemplateContext::from_serialize(&json!({ "license": "MIT" })).unwrap();
        let ctx = TemplateContext::for_file(&file_with_data(), &statics).unwrap();
        assert_eq!(ctx.get_or_empty("filename"), "file.txt");
        assert_eq!(ctx.get_or_empty("license"), "MIT");
    }

    #[test]
    fn missing_paths_render_empty() {
        let ctx = TemplateContext::from_serialize(&json!({ "pkg": { "name": "demo" } })).unwrap();
        assert_eq!(ctx.get_or_empty("nope"), "");
        assert_eq!(ctx.get_or_empty("pkg.version"), "");
        assert_eq!(ctx.get_or_empty("pkg.name.deeper"), "");
    }

    #[test]
    fn array_indices_resolve() {
        let ctx = TemplateContext::from_serialize(&json!({ "authors": ["ada", "grace"] })).unwrap();
        assert_eq!(ctx.get_or_empty("authors.1"), "grace");
        assert_eq!(ctx.get_or_empty("authors.9"), "");
        assert_eq!(ctx.get_or_empty("authors"), r#"["ada","grace"]"#);
    }

    #[test]
    fn scalars_stringify() {
        let ctx = TemplateContext::from_serialize(&json!({ "n": 3, "ok": true, "none": null })).unwrap();
        assert_eq!(ctx.get_or_empty("n"), "3");
        assert_eq!(ctx.get_or_empty("ok"), "true");
        assert_eq!(ctx.get_or_empty("none"), "");
    }

    #[test]
    fn non_mapping_context_is_rejected() {
        let err = TemplateContext::from_serialize(&json!(["a"])).unwrap_err();
        assert!(matches!(err, RenderError::ContextNotAMapping { kind: "an array" }));
    }

    #[test]
    fn to_tera_context_succeeds() {
        let ctx = TemplateContext::for_file(&file_with_data(), &TemplateContext::new()).unwrap();
        let tera_ctx = ctx.to_tera_context().expect("context conversion");
        assert!(tera_ctx.contains_key("file"));
    }
}
