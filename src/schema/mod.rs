//! Schemas and the process-wide schema registry.
//!
//! A schema is a named, prioritized bundle of tag handlers plus implicit typing rules.
//! Documents pick one at `DocumentStart` through [`SchemaRegistry::select`].

mod handlers;
mod resolve;
mod yaml;

use std::cmp::Reverse;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

use ahash::AHashMap;

use crate::binding::Slot;
use crate::error::{Error, Location};
use crate::event::{DocumentMeta, Event, EventKind};
use crate::path::Path;
use crate::shape::Shape;

pub use handlers::{
    AliasTag, BoolTag, FloatTag, HandlerKind, IntTag, MapTag, NullTag, SeqTag, StrTag, TagHandler,
};
pub use resolve::{Flavor, Resolved, bool_literal, implicit_resolve, is_null_literal};
pub use yaml::{AutoSchema, YamlSchema};

pub(crate) use handlers::mismatch;

/// A YAML type-resolution profile.
///
/// Built-ins are [`YamlSchema`] (failsafe, json, core, 1.1, 1.3) and [`AutoSchema`].
/// External schemas implement the required methods and usually keep the provided
/// `find_tag_handler`.
pub trait Schema: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    /// Extra names the schema is registered under.
    fn aliases(&self) -> &[String] {
        &[]
    }

    fn description(&self) -> &str;

    /// Higher wins when selecting `auto`; ties go to the earlier registration.
    fn priority(&self) -> i32;

    /// Literal sets used by the scalar handlers.
    fn flavor(&self) -> Flavor {
        Flavor::Core
    }

    /// Hook run once the document metadata is known.
    ///
    /// Returns the schema that handles the document, or `None` to handle it itself.
    /// `auto` uses this to delegate to a concrete schema.
    fn selected(
        &self,
        meta: &DocumentMeta,
        registry: &SchemaRegistry,
    ) -> Result<Option<Arc<dyn Schema>>, Error> {
        let _ = (meta, registry);
        Ok(None)
    }

    fn supports_aliases(&self) -> bool {
        true
    }

    /// Handler for an explicit (normalized) tag, if the schema knows it.
    fn lookup_tag_handler(&self, tag: &str) -> Option<Arc<dyn TagHandler>>;

    /// The schema's handler of a given kind, if it has one.
    fn tag_handler(&self, kind: HandlerKind) -> Option<Arc<dyn TagHandler>>;

    /// Handler for an untagged plain scalar bound into a generic slot.
    fn implicit_resolve(&self, text: Option<&str>) -> Arc<dyn TagHandler>;

    /// Pick the handler that owns `event` when bound into `slot`.
    ///
    /// Precedence: a known explicit tag; the sequence/mapping handler for collections;
    /// string for quoted or block scalars; the slot's own kind for typed slots; implicit
    /// resolution for generic slots; the alias handler for aliases.
    fn find_tag_handler(
        &self,
        event: &Event,
        path: &Path,
        slot: &Slot,
    ) -> Result<Arc<dyn TagHandler>, Error> {
        if let Some(handler) = event.tag.as_deref().and_then(|t| self.lookup_tag_handler(t)) {
            return Ok(handler);
        }
        let found = match event.kind {
            EventKind::SequenceStart => self.tag_handler(HandlerKind::Seq),
            EventKind::MappingStart => self.tag_handler(HandlerKind::Map),
            EventKind::Scalar if !event.style.is_plain() && !slot.as_string => {
                self.tag_handler(HandlerKind::Str)
            }
            EventKind::Scalar => match &slot.shape {
                Shape::Any => Some(self.implicit_resolve(event.text())),
                Shape::Str => self.tag_handler(HandlerKind::Str),
                Shape::Bool => self.tag_handler(HandlerKind::Bool),
                Shape::Option(_) => self.tag_handler(HandlerKind::Null),
                s if s.is_int() => self.tag_handler(HandlerKind::Int),
                s if s.is_float() => self.tag_handler(HandlerKind::Float),
                _ => None,
            },
            EventKind::Alias if self.supports_aliases() => self.tag_handler(HandlerKind::Alias),
            _ => None,
        };
        found.ok_or_else(|| Error::CannotInferType {
            path: path.to_string(),
            event: event.kind.name(),
            target: slot.shape.clone(),
            location: Location::UNKNOWN,
        })
    }
}

struct Entry {
    generation: u64,
    schema: Arc<dyn Schema>,
}

#[derive(Default)]
struct Registry {
    entries: AHashMap<String, Entry>,
    next_generation: u64,
}

/// Named schemas, shared by every document processed in the process.
///
/// Registration is rare and takes the write lock; lookups and selection only read.
pub struct SchemaRegistry {
    inner: RwLock<Registry>,
}

static GLOBAL: LazyLock<Arc<SchemaRegistry>> =
    LazyLock::new(|| Arc::new(SchemaRegistry::with_builtins()));

impl Default for SchemaRegistry {
    fn default() -> Self {
        SchemaRegistry::new()
    }
}

impl fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("names", &self.list())
            .finish()
    }
}

impl SchemaRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        SchemaRegistry {
            inner: RwLock::new(Registry::default()),
        }
    }

    /// Registry holding failsafe, core (`1.2`), 1.3, 1.1, json and auto.
    pub fn with_builtins() -> Self {
        let registry = SchemaRegistry::new();
        let builtins: [Arc<dyn Schema>; 6] = [
            Arc::new(YamlSchema::failsafe()),
            Arc::new(YamlSchema::core()),
            Arc::new(YamlSchema::yaml_1_3()),
            Arc::new(YamlSchema::yaml_1_1()),
            Arc::new(YamlSchema::json()),
            Arc::new(AutoSchema::new()),
        ];
        for schema in builtins {
            // Names are distinct in a fresh registry.
            let _ = registry.register(schema);
        }
        registry
    }

    /// The process-wide registry, created with the built-ins on first use.
    pub fn global() -> &'static Arc<SchemaRegistry> {
        &GLOBAL
    }

    /// Register a schema under its name and aliases.
    ///
    /// Fails with `DuplicateName` without registering anything if any name is taken.
    pub fn register(&self, schema: Arc<dyn Schema>) -> Result<(), Error> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let names: Vec<String> = std::iter::once(schema.name().to_string())
            .chain(schema.aliases().iter().cloned())
            .collect();
        for (i, name) in names.iter().enumerate() {
            if inner.entries.contains_key(name) || names[..i].contains(name) {
                return Err(Error::DuplicateName { name: name.clone() });
            }
        }
        for name in names {
            let generation = inner.next_generation;
            inner.next_generation += 1;
            tracing::debug!(schema = %name, generation, "registered schema");
            inner.entries.insert(
                name,
                Entry {
                    generation,
                    schema: Arc::clone(&schema),
                },
            );
        }
        Ok(())
    }

    /// Remove every name of `schema`.
    pub fn unregister(&self, schema: &dyn Schema) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.entries.remove(schema.name());
        for alias in schema.aliases() {
            inner.entries.remove(alias);
        }
    }

    /// All registered names, by descending priority then registration order.
    pub fn list(&self) -> Vec<String> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<(&String, &Entry)> = inner.entries.iter().collect();
        names.sort_by_key(|(_, e)| (Reverse(e.schema.priority()), e.generation));
        names.into_iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Schema>, Error> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .get(name)
            .map(|e| Arc::clone(&e.schema))
            .ok_or_else(|| Error::SchemaNotFound {
                name: name.to_string(),
            })
    }

    fn highest_priority(&self) -> Option<Arc<dyn Schema>> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        inner
            .entries
            .values()
            .min_by_key(|e| (Reverse(e.schema.priority()), e.generation))
            .map(|e| Arc::clone(&e.schema))
    }

    /// Schema that handles a document.
    ///
    /// `""` and `"auto"` mean the highest-priority schema. An unknown name falls back to
    /// `failsafe`. The chosen schema's `selected` hook gets the final word.
    pub fn select(&self, name: &str, meta: &DocumentMeta) -> Result<Arc<dyn Schema>, Error> {
        let chosen = if name.is_empty() || name == "auto" {
            self.highest_priority()
                .ok_or_else(|| Error::NoSchemaAvailable {
                    requested: name.to_string(),
                })?
        } else {
            match self.lookup(name) {
                Ok(schema) => schema,
                Err(err) => {
                    tracing::warn!(%err, "falling back to failsafe schema");
                    self.lookup("failsafe").map_err(|_| Error::NoSchemaAvailable {
                        requested: name.to_string(),
                    })?
                }
            }
        };
        // The read lock is released here; `selected` may look up other schemas.
        let schema = match chosen.selected(meta, self)? {
            Some(delegate) => delegate,
            None => chosen,
        };
        tracing::debug!(
            requested = name,
            schema = schema.name(),
            version = %meta.version,
            json = meta.json,
            "selected schema"
        );
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Version;

    #[test]
    fn list_orders_by_priority_then_registration() {
        let registry = SchemaRegistry::new();
        registry.register(Arc::new(YamlSchema::failsafe())).unwrap();
        registry.register(Arc::new(YamlSchema::yaml_1_1())).unwrap();
        registry.register(Arc::new(YamlSchema::core())).unwrap();
        assert_eq!(registry.list(), ["core", "1.2", "1.1", "failsafe"]);
    }

    #[test]
    fn builtins_are_listed_auto_first() {
        let registry = SchemaRegistry::with_builtins();
        assert_eq!(
            registry.list(),
            ["auto", "core", "1.2", "1.3", "1.1", "failsafe", "json"]
        );
    }

    #[test]
    fn duplicate_names_are_rejected_atomically() {
        let registry = SchemaRegistry::with_builtins();
        let clash = YamlSchema::custom("mine", &["1.1"], 5, Flavor::V1_1);
        let err = registry.register(Arc::new(clash)).unwrap_err();
        assert!(matches!(err, Error::DuplicateName { name } if name == "1.1"));
        assert!(registry.lookup("mine").is_err());
    }

    #[test]
    fn unregister_removes_aliases() {
        let registry = SchemaRegistry::with_builtins();
        let core = registry.lookup("core").unwrap();
        registry.unregister(core.as_ref());
        assert!(matches!(registry.lookup("1.2"), Err(Error::SchemaNotFound { .. })));
        assert!(registry.lookup("core").is_err());
    }

    #[test]
    fn select_falls_back_to_failsafe() {
        let registry = SchemaRegistry::with_builtins();
        let meta = DocumentMeta::default();
        assert_eq!(registry.select("nope", &meta).unwrap().name(), "failsafe");

        let empty = SchemaRegistry::new();
        assert!(matches!(
            empty.select("nope", &meta),
            Err(Error::NoSchemaAvailable { .. })
        ));
    }

    #[test]
    fn auto_follows_document_metadata() {
        let registry = SchemaRegistry::with_builtins();
        let pick = |meta: DocumentMeta| registry.select("auto", &meta).unwrap().name().to_string();
        assert_eq!(pick(DocumentMeta::default()), "core");
        assert_eq!(
            pick(DocumentMeta {
                version: Version::V1_1,
                json: false
            }),
            "1.1"
        );
        assert_eq!(
            pick(DocumentMeta {
                version: Version::V1_3,
                json: false
            }),
            "1.3"
        );
        assert_eq!(
            pick(DocumentMeta {
                version: Version::V1_2,
                json: true
            }),
            "json"
        );
        assert_eq!(registry.select("", &DocumentMeta::default()).unwrap().name(), "core");
    }
}
