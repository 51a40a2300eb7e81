use std::sync::Arc;

use crate::error::Error;
use crate::event::DocumentMeta;
use crate::schema::handlers::{
    AliasTag, BoolTag, FloatTag, HandlerKind, IntTag, MapTag, NullTag, SeqTag, StrTag, TagHandler,
};
use crate::schema::resolve::{self, Flavor, Resolved};
use crate::schema::{Schema, SchemaRegistry};

#[derive(Debug)]
struct Handlers {
    str_: Arc<dyn TagHandler>,
    bool_: Arc<dyn TagHandler>,
    null: Arc<dyn TagHandler>,
    int: Arc<dyn TagHandler>,
    float: Arc<dyn TagHandler>,
    seq: Arc<dyn TagHandler>,
    map: Arc<dyn TagHandler>,
    alias: Arc<dyn TagHandler>,
}

impl Handlers {
    fn new() -> Self {
        Handlers {
            str_: Arc::new(StrTag),
            bool_: Arc::new(BoolTag),
            null: Arc::new(NullTag),
            int: Arc::new(IntTag),
            float: Arc::new(FloatTag),
            seq: Arc::new(SeqTag),
            map: Arc::new(MapTag),
            alias: Arc::new(AliasTag),
        }
    }
}

/// One of the YAML schemas: failsafe, json, core (1.2), 1.1 or 1.3.
///
/// They share handlers and differ in the literal sets and numeric rules of their
/// [`Flavor`].
#[derive(Debug)]
pub struct YamlSchema {
    name: String,
    aliases: Vec<String>,
    description: String,
    priority: i32,
    flavor: Flavor,
    handlers: Handlers,
}

impl YamlSchema {
    /// A YAML schema under a custom name, e.g. to register a flavor at another priority.
    pub fn custom(name: &str, aliases: &[&str], priority: i32, flavor: Flavor) -> Self {
        YamlSchema {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            description: format!("YAML schema '{name}'"),
            priority,
            flavor,
            handlers: Handlers::new(),
        }
    }

    fn described(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn failsafe() -> Self {
        YamlSchema::custom("failsafe", &[], 0, Flavor::Failsafe)
            .described("Failsafe schema: strings, sequences and mappings only")
    }

    pub fn json() -> Self {
        YamlSchema::custom("json", &[], 0, Flavor::Json)
            .described("JSON schema: JSON literals only, no aliases")
    }

    pub fn core() -> Self {
        YamlSchema::custom("core", &["1.2"], 10, Flavor::Core)
            .described("YAML 1.2 core schema")
    }

    pub fn yaml_1_1() -> Self {
        YamlSchema::custom("1.1", &[], 1, Flavor::V1_1)
            .described("YAML 1.1 types, including yes/no/on/off booleans")
    }

    pub fn yaml_1_3() -> Self {
        YamlSchema::custom("1.3", &[], 9, Flavor::V1_3).described("YAML 1.3 schema")
    }
}

impl Schema for YamlSchema {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn flavor(&self) -> Flavor {
        self.flavor
    }

    fn supports_aliases(&self) -> bool {
        self.flavor != Flavor::Json
    }

    fn lookup_tag_handler(&self, tag: &str) -> Option<Arc<dyn TagHandler>> {
        let h = &self.handlers;
        let candidates = if self.flavor == Flavor::Failsafe {
            vec![&h.str_, &h.seq, &h.map]
        } else {
            vec![&h.str_, &h.bool_, &h.null, &h.int, &h.float, &h.seq, &h.map]
        };
        candidates
            .into_iter()
            .find(|handler| handler.tag() == tag)
            .map(Arc::clone)
    }

    fn tag_handler(&self, kind: HandlerKind) -> Option<Arc<dyn TagHandler>> {
        let h = &self.handlers;
        let failsafe = self.flavor == Flavor::Failsafe;
        let handler = match kind {
            HandlerKind::Str => &h.str_,
            HandlerKind::Seq => &h.seq,
            HandlerKind::Map => &h.map,
            HandlerKind::Alias if self.supports_aliases() => &h.alias,
            HandlerKind::Alias => return None,
            _ if failsafe => return None,
            HandlerKind::Bool => &h.bool_,
            HandlerKind::Null => &h.null,
            HandlerKind::Int => &h.int,
            HandlerKind::Float => &h.float,
        };
        Some(Arc::clone(handler))
    }

    fn implicit_resolve(&self, text: Option<&str>) -> Arc<dyn TagHandler> {
        let h = &self.handlers;
        let handler = match resolve::implicit_resolve(self.flavor, text) {
            Resolved::Null => &h.null,
            Resolved::Bool => &h.bool_,
            Resolved::Int => &h.int,
            Resolved::Float => &h.float,
            Resolved::Str => &h.str_,
        };
        Arc::clone(handler)
    }
}

/// Defers to a concrete schema once the document's version and JSON mode are known.
///
/// JSON documents get `json`; others get the schema registered under their version
/// (`1.1`, `1.2`, `1.3`). Missing schemas fall back to `failsafe`.
#[derive(Debug)]
pub struct AutoSchema {
    fallback: YamlSchema,
}

impl AutoSchema {
    pub fn new() -> Self {
        AutoSchema {
            fallback: YamlSchema::core(),
        }
    }
}

impl Default for AutoSchema {
    fn default() -> Self {
        AutoSchema::new()
    }
}

impl Schema for AutoSchema {
    fn name(&self) -> &str {
        "auto"
    }

    fn description(&self) -> &str {
        "Selects the schema from the document version and JSON mode"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn selected(
        &self,
        meta: &DocumentMeta,
        registry: &SchemaRegistry,
    ) -> Result<Option<Arc<dyn Schema>>, Error> {
        let wanted = if meta.json {
            "json".to_string()
        } else {
            meta.version.to_string()
        };
        let schema = registry
            .lookup(&wanted)
            .or_else(|_| {
                tracing::warn!(wanted = %wanted, "no schema for document, using failsafe");
                registry.lookup("failsafe")
            })
            .map_err(|_| Error::NoSchemaAvailable { requested: wanted })?;
        Ok(Some(schema))
    }

    // Only reached if a caller uses `auto` without going through `select`.
    fn lookup_tag_handler(&self, tag: &str) -> Option<Arc<dyn TagHandler>> {
        self.fallback.lookup_tag_handler(tag)
    }

    fn tag_handler(&self, kind: HandlerKind) -> Option<Arc<dyn TagHandler>> {
        self.fallback.tag_handler(kind)
    }

    fn implicit_resolve(&self, text: Option<&str>) -> Arc<dyn TagHandler> {
        self.fallback.implicit_resolve(text)
    }
}
