//! Field descriptor tables for record targets, built once per Rust type.

use std::any::TypeId;
use std::fmt;
use std::sync::{Arc, LazyLock, OnceLock, PoisonError, RwLock};

use ahash::AHashMap;

use crate::shape::{Shape, Shaped};

/// One record field.
pub struct Field {
    name: &'static str,
    external: String,
    shape_fn: fn() -> Shape,
    shape: OnceLock<Shape>,
    pub(crate) omit_empty: bool,
    pub(crate) ignored: bool,
    pub(crate) as_string: bool,
}

impl Field {
    /// Field named `name` whose slot has the shape of `F`.
    ///
    /// `name` is the native field name, which is also the key serde sees when the
    /// bound record is turned into the Rust type. The external (YAML) name defaults to it.
    pub fn of<F: Shaped>(name: &'static str) -> Self {
        Field {
            name,
            external: name.to_string(),
            shape_fn: F::shape,
            shape: OnceLock::new(),
            omit_empty: false,
            ignored: false,
            as_string: false,
        }
    }

    /// Use a different key in documents.
    pub fn rename(mut self, external: impl Into<String>) -> Self {
        self.external = external.into();
        self
    }

    /// Skip the field on output when it holds an empty value.
    pub fn omit_empty(mut self) -> Self {
        self.omit_empty = true;
        self
    }

    /// Never bind or emit this field; it keeps its zero value.
    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Numbers and booleans are written quoted and also accepted quoted.
    pub fn as_string(mut self) -> Self {
        self.as_string = true;
        self
    }

    /// Parse a struct tag in the `name,omitempty,string` / `-` convention.
    pub fn tagged(self, tag: &str) -> Self {
        let mut parts = tag.split(',');
        let mut field = match parts.next() {
            Some("-") => return self.ignored(),
            Some("") | None => self,
            Some(name) => self.rename(name),
        };
        for flag in parts {
            match flag {
                "omitempty" => field.omit_empty = true,
                "string" => field.as_string = true,
                _ => {}
            }
        }
        field
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn external_name(&self) -> &str {
        &self.external
    }

    pub fn shape(&self) -> &Shape {
        self.shape.get_or_init(self.shape_fn)
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("external", &self.external)
            .field("omit_empty", &self.omit_empty)
            .field("ignored", &self.ignored)
            .field("as_string", &self.as_string)
            .finish()
    }
}

/// Precomputed field table of one record type.
pub struct RecordInfo {
    type_id: TypeId,
    name: &'static str,
    fields: Vec<Field>,
    by_name: AHashMap<String, usize>,
    // Lowercased external name -> field; `None` when two fields fold to the same name.
    folded: AHashMap<String, Option<usize>>,
}

impl RecordInfo {
    fn build(type_id: TypeId, name: &'static str, fields: Vec<Field>) -> Self {
        let mut by_name = AHashMap::with_capacity(fields.len());
        let mut folded: AHashMap<String, Option<usize>> = AHashMap::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            if field.ignored {
                continue;
            }
            by_name.entry(field.external.clone()).or_insert(idx);
            folded
                .entry(field.external.to_ascii_lowercase())
                .and_modify(|slot| *slot = None)
                .or_insert(Some(idx));
        }
        RecordInfo {
            type_id,
            name,
            fields,
            by_name,
            folded,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Short type name used in diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Index of the field bound by `key`: exact external name first, then a
    /// case-insensitive match if it is unambiguous. Ignored fields never match.
    pub fn field_by_name(&self, key: &str) -> Option<usize> {
        if let Some(idx) = self.by_name.get(key) {
            return Some(*idx);
        }
        self.folded
            .get(&key.to_ascii_lowercase())
            .copied()
            .flatten()
    }
}

impl fmt::Debug for RecordInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordInfo")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .finish()
    }
}

static CACHE: LazyLock<RwLock<AHashMap<TypeId, Arc<RecordInfo>>>> =
    LazyLock::new(|| RwLock::new(AHashMap::new()));

/// Cached field table for `T`, building it with `fields` on first use.
///
/// The table is built outside the lock; if two threads race, the first insert wins and
/// both get the same `Arc`.
pub(crate) fn record_info<T: 'static>(fields: impl FnOnce() -> Vec<Field>) -> Arc<RecordInfo> {
    let type_id = TypeId::of::<T>();
    if let Some(info) = CACHE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
    {
        return Arc::clone(info);
    }
    let info = Arc::new(RecordInfo::build(type_id, short_type_name::<T>(), fields()));
    let mut cache = CACHE.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(cache.entry(type_id).or_insert(info))
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    match base.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    fn sample() -> Arc<RecordInfo> {
        record_info::<Sample>(|| {
            vec![
                Field::of::<String>("name"),
                Field::of::<u16>("port").rename("listenPort"),
                Field::of::<String>("secret").ignored(),
                Field::of::<Option<String>>("note").tagged("comment,omitempty"),
            ]
        })
    }

    #[test]
    fn exact_then_case_insensitive() {
        let info = sample();
        assert_eq!(info.field_by_name("name"), Some(0));
        assert_eq!(info.field_by_name("listenPort"), Some(1));
        assert_eq!(info.field_by_name("LISTENPORT"), Some(1));
        assert_eq!(info.field_by_name("port"), None);
        assert_eq!(info.field_by_name("secret"), None);
        assert_eq!(info.field_by_name("comment"), Some(3));
        assert!(info.fields()[3].omit_empty);
    }

    #[test]
    fn cached_once_per_type() {
        let a = sample();
        let b = record_info::<Sample>(|| panic!("must come from the cache"));
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.name(), "Sample");
    }

    #[test]
    fn ambiguous_fold_does_not_match() {
        struct Twins;
        let info = record_info::<Twins>(|| vec![Field::of::<i32>("a"), Field::of::<i32>("A")]);
        assert_eq!(info.field_by_name("a"), Some(0));
        assert_eq!(info.field_by_name("A"), Some(1));
    }
}
