//! Binding engine: drives binding objects from an event stream.
//!
//! One event at a time, with an explicit path stack:
//! - `DocumentStart` selects the schema and opens the root binding over the target.
//! - Collection starts ask the innermost binding for a child slot, pick the tag handler
//!   for the node and push a new binding.
//! - Scalars and aliases are bound and closed immediately.
//! - Collection ends tighten generic containers, splice the value into the parent and
//!   register anchors.
//! - `DocumentEnd` closes the root and stops: only the first document is bound.
//!
//! The first error aborts the document. The caller's target is written only on success.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::anchors::{Address, AnchorEntry, AnchorTable};
use crate::binding::{Arena, BindContext, Binding, Finished, RootBinding, Slot, new_binding_object};
use crate::budget::{BudgetBreach, BudgetEnforcer};
use crate::error::{Error, budget_error};
use crate::event::{DocumentMeta, Event, EventKind, EventSource, IterEvents};
use crate::options::{JsonMode, Options};
use crate::path::{BindingId, Path};
use crate::schema::{Schema, SchemaRegistry, is_null_literal};
use crate::shape::{Shape, Shaped};
use crate::tags;
use crate::value::Value;

/// Binds event streams to declared shapes.
///
/// Holds the options and the schema registry; each decode call runs on fresh
/// document-local state, so one decoder may be shared by reference across threads.
///
/// ```rust
/// use std::sync::Arc;
/// use saphyr_bind::{Decoder, Event, IterEvents, Options, SchemaRegistry, Shape, Value};
///
/// let registry = Arc::new(SchemaRegistry::with_builtins());
/// let decoder = Decoder::with_registry(Options::default(), registry);
/// let events = IterEvents::new(vec![
///     Event::stream_start(),
///     Event::document_start(Default::default()),
///     Event::sequence_start(),
///     Event::scalar("1"),
///     Event::scalar("2"),
///     Event::sequence_end(),
///     Event::document_end(),
///     Event::stream_end(),
/// ]);
/// let value = decoder.decode_value(events, &Shape::Any).unwrap();
/// assert_eq!(value.as_seq().map(|s| s.elem_shape().clone()), Some(Shape::I64));
/// ```
#[derive(Clone, Debug)]
pub struct Decoder {
    options: Options,
    registry: Arc<SchemaRegistry>,
}

impl Decoder {
    /// Decoder over the process-wide registry.
    pub fn new(options: Options) -> Self {
        Decoder::with_registry(options, Arc::clone(SchemaRegistry::global()))
    }

    pub fn with_registry(options: Options, registry: Arc<SchemaRegistry>) -> Self {
        Decoder { options, registry }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Bind the first document of `source` into a fresh slot of shape `shape`.
    ///
    /// A stream with no document yields `Value::Null`.
    pub fn decode_value<S: EventSource>(&self, source: S, shape: &Shape) -> Result<Value, Error> {
        let mut value = Value::Null;
        self.decode_into(source, shape, &mut value)?;
        Ok(value)
    }

    /// Bind the first document of `source` into `target`, declared as `shape`.
    ///
    /// A record target that already holds a record of the same type keeps the fields the
    /// document does not mention. `target` is left untouched on error.
    pub fn decode_into<S: EventSource>(
        &self,
        mut source: S,
        shape: &Shape,
        target: &mut Value,
    ) -> Result<(), Error> {
        let mut binder = Binder::new(self, shape.clone(), target.clone());
        *target = binder.run(&mut source)?;
        Ok(())
    }

    /// Bind the first document of `source` and extract a `T` from it.
    pub fn decode<T, S>(&self, source: S) -> Result<T, Error>
    where
        T: Shaped + DeserializeOwned,
        S: EventSource,
    {
        let value = self.decode_value(source, &T::shape())?;
        T::from_bound(value)
    }
}

/// Document-local engine state.
struct Binder<'d> {
    options: &'d Options,
    registry: &'d SchemaRegistry,
    ctx: BindContext,
    budget: Option<BudgetEnforcer>,
    /// Cap on nodes copied by aliases; the budget's node limit.
    alias_node_limit: Option<usize>,
    copied_nodes: usize,
    target: Shape,
    initial: Option<Value>,
    result: Option<Value>,
    schema: Option<Arc<dyn Schema>>,
    path: Path,
    arena: Arena,
    anchors: AnchorTable,
}

impl<'d> Binder<'d> {
    fn new(decoder: &'d Decoder, target: Shape, initial: Value) -> Self {
        let options = &decoder.options;
        Binder {
            options,
            registry: &*decoder.registry,
            ctx: BindContext {
                ignore_unknown_fields: options.ignore_unknown_fields,
            },
            budget: options.budget.clone().map(BudgetEnforcer::new),
            alias_node_limit: options.budget.as_ref().map(|b| b.max_nodes),
            copied_nodes: 0,
            target,
            initial: Some(initial),
            result: None,
            schema: None,
            path: Path::new(),
            arena: Arena::default(),
            anchors: AnchorTable::new(),
        }
    }

    /// Source errors know where they happened but not which slot was being filled.
    fn at_path(&self, err: Error) -> Error {
        match err {
            Error::UnresolvedAlias {
                path,
                anchor,
                location,
            } if path.is_empty() => Error::UnresolvedAlias {
                path: self.path.to_string(),
                anchor,
                location,
            },
            other => other,
        }
    }

    fn run<S: EventSource>(&mut self, source: &mut S) -> Result<Value, Error> {
        while let Some(event) = source.next_event().map_err(|err| self.at_path(err))? {
            if let Some(budget) = &mut self.budget {
                budget
                    .observe(&event)
                    .map_err(|breach| budget_error(breach).with_location(event.location))?;
            }
            let done = self
                .handle(&event)
                .map_err(|err| err.with_location(event.location))?;
            if done {
                break;
            }
        }
        if self.schema.is_some() {
            return Err(Error::structure("event stream ended inside a document"));
        }
        Ok(self
            .result
            .take()
            .or_else(|| self.initial.take())
            .unwrap_or_default())
    }

    /// Process one event. Returns true once the engine should stop.
    fn handle(&mut self, event: &Event) -> Result<bool, Error> {
        tracing::trace!(event = event.kind.name(), path = %self.path, "binding event");
        match event.kind {
            EventKind::StreamStart => Ok(false),
            EventKind::StreamEnd => Ok(true),
            EventKind::DocumentStart => {
                self.document_start(event)?;
                Ok(false)
            }
            EventKind::DocumentEnd => {
                self.document_end()?;
                Ok(true)
            }
            EventKind::SequenceStart | EventKind::MappingStart => {
                self.collection_create(event)?;
                Ok(false)
            }
            EventKind::SequenceEnd | EventKind::MappingEnd => {
                self.collection_destroy(event)?;
                Ok(false)
            }
            EventKind::Scalar | EventKind::Alias => {
                self.scalar(event)?;
                Ok(false)
            }
        }
    }

    fn schema(&self) -> Result<Arc<dyn Schema>, Error> {
        self.schema.clone().ok_or_else(|| {
            Error::structure("node event outside a document (missing DocumentStart)")
        })
    }

    fn document_meta(&self, event: &Event) -> DocumentMeta {
        let mut meta = event.document.unwrap_or_default();
        if let Some(version) = self.options.version {
            meta.version = version;
        }
        match self.options.json {
            JsonMode::Auto => {}
            JsonMode::None => meta.json = false,
            JsonMode::Force => meta.json = true,
        }
        meta
    }

    fn document_start(&mut self, event: &Event) -> Result<(), Error> {
        if self.schema.is_some() {
            return Err(Error::structure("DocumentStart inside a document"));
        }
        let meta = self.document_meta(event);
        let schema = self.registry.select(&self.options.schema, &meta)?;
        tracing::debug!(schema = schema.name(), version = %meta.version, json = meta.json, "document start");

        let mut root = Binding::Root(RootBinding::new(self.target.clone(), Value::Null));
        root.collection_start(self.initial.take().unwrap_or_default(), &self.path)?;
        let id = self.arena.insert(root);
        self.path.set_root_slot(Some(id));
        self.schema = Some(schema);
        Ok(())
    }

    fn document_end(&mut self) -> Result<(), Error> {
        self.schema()?;
        if !self.path.in_root() {
            return Err(Error::structure(format!(
                "DocumentEnd with {} open collection(s)",
                self.path.depth()
            )));
        }
        let id = self
            .path
            .root_slot()
            .ok_or_else(|| Error::structure("document has no root binding"))?;
        let root = self.arena.remove(id)?;
        self.result = Some(root.finish().value);
        tracing::debug!(anchors = self.anchors.len(), "document end");

        self.schema = None;
        self.path.set_root_slot(None);
        self.arena.clear();
        Ok(())
    }

    /// Parent binding of the node that is starting.
    fn parent(&self) -> Result<BindingId, Error> {
        self.path
            .last_slot()
            .ok_or_else(|| Error::structure("no open binding to receive the node"))
    }

    /// Open the child slot in the parent and build the binding that owns `event`.
    fn open_child(&mut self, event: &Event, schema: &Arc<dyn Schema>) -> Result<(Binding, Value), Error> {
        let parent = self.parent()?;
        self.path.enter_child();
        let (slot, initial) = self.arena.get_mut(parent)?.obj_start_in(&self.path)?;
        let slot = effective_slot(slot, event, schema.as_ref());
        let handler = schema.find_tag_handler(event, &self.path, &slot)?;
        let binding = new_binding_object(handler, event, &self.path, slot, Arc::clone(schema), self.ctx)?;
        tracing::trace!(tag = binding.tag(), anchor = binding.anchor(), path = %self.path, "binding opened");
        Ok((binding, initial))
    }

    fn collection_create(&mut self, event: &Event) -> Result<(), Error> {
        let schema = self.schema()?;
        let (mut binding, initial) = self.open_child(event, &schema)?;
        binding.collection_start(initial, &self.path)?;
        let id = self.arena.insert(binding);
        if event.kind == EventKind::SequenceStart {
            self.path.push_sequence(id);
        } else {
            self.path.push_mapping(id);
        }
        Ok(())
    }

    fn collection_destroy(&mut self, event: &Event) -> Result<(), Error> {
        self.schema()?;
        let closes_kind = match event.kind {
            EventKind::SequenceEnd => self.path.in_sequence(),
            _ => self.path.in_mapping(),
        };
        if !closes_kind {
            return Err(Error::structure(format!(
                "{} does not match the open collection at {}",
                event.kind.name(),
                self.path
            )));
        }
        if self.path.in_mapping_value() {
            return Err(Error::structure(format!(
                "{}: mapping ended after a key without a value",
                self.path
            )));
        }
        let id = self.parent()?;
        self.arena.get_mut(id)?.collection_end(&self.path)?;
        self.path.pop();
        let binding = self.arena.remove(id)?;
        self.finish_child(binding.finish())
    }

    fn scalar(&mut self, event: &Event) -> Result<(), Error> {
        let schema = self.schema()?;
        let (mut binding, _) = self.open_child(event, &schema)?;
        if event.kind == EventKind::Alias {
            self.charge_alias(event)?;
        }
        binding.set_scalar(event, &self.path, &self.anchors)?;
        self.finish_child(binding.finish())
    }

    /// Count the nodes an alias copies against the budget.
    fn charge_alias(&mut self, event: &Event) -> Result<(), Error> {
        let Some(limit) = self.alias_node_limit else {
            return Ok(());
        };
        let Some(entry) = event.text().and_then(|name| self.anchors.find_reference(name)) else {
            return Ok(());
        };
        self.copied_nodes = self.copied_nodes.saturating_add(entry.nodes);
        if self.copied_nodes > limit {
            return Err(budget_error(BudgetBreach::Nodes {
                nodes: self.copied_nodes,
            }));
        }
        Ok(())
    }

    /// Splice a finished node into the innermost open binding, then register its anchor
    /// and advance the path.
    fn finish_child(&mut self, child: Finished) -> Result<(), Error> {
        let in_key = self.path.in_mapping_key();
        let key_text = in_key.then(|| key_text(&child.value));
        let anchored = child.anchor.clone().map(|name| {
            let entry = AnchorEntry {
                nodes: count_nodes(&child.value),
                value: child.value.clone(),
                slot: child.slot.clone(),
                collection: self.path.to_string(),
                address: self.address(),
            };
            (name, entry)
        });

        let parent = self.parent()?;
        self.arena.get_mut(parent)?.obj_end_in(child, &self.path)?;
        if let Some((name, entry)) = anchored {
            self.anchors.register_anchor(&name, entry);
        }
        self.path.leave_child(key_text);
        Ok(())
    }

    fn address(&self) -> Address {
        if self.path.in_root() {
            return Address::Root;
        }
        if self.path.in_mapping_key() {
            return Address::Key;
        }
        match self.path.last_component() {
            Some(component) => match component.sequence_index() {
                Some(index) => Address::Index(index),
                None => Address::Value(component.mapping_key().unwrap_or_default().to_string()),
            },
            None => Address::Root,
        }
    }
}

/// Text of a finished mapping key, used for the path and for stringified complex keys.
fn key_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn count_nodes(value: &Value) -> usize {
    match value {
        Value::Seq(seq) => 1 + seq.items().iter().map(count_nodes).sum::<usize>(),
        Value::Map(map) => {
            1 + map
                .iter()
                .map(|(k, v)| count_nodes(k) + count_nodes(v))
                .sum::<usize>()
        }
        Value::Record(record) => 1 + record.fields().iter().map(count_nodes).sum::<usize>(),
        _ => 1,
    }
}

/// Null scalars bind into an `Option` slot itself; everything else binds into the
/// wrapped shape. Aliases keep the declared slot so both sides compare as declared.
fn effective_slot(slot: Slot, event: &Event, schema: &dyn Schema) -> Slot {
    let Shape::Option(inner) = &slot.shape else {
        return slot;
    };
    let keep = match event.kind {
        EventKind::Alias => true,
        EventKind::Scalar => is_null_event(event, schema),
        _ => false,
    };
    if keep {
        return slot;
    }
    let unwrapped = Slot {
        shape: (**inner).clone(),
        as_string: slot.as_string,
    };
    effective_slot(unwrapped, event, schema)
}

fn is_null_event(event: &Event, schema: &dyn Schema) -> bool {
    match event.tag.as_deref() {
        Some(tag) => tag == tags::TAG_NULL,
        None => event.style.is_plain() && is_null_literal(schema.flavor(), event.text()),
    }
}

/// Deserialize the first YAML document of `input` into `T`.
///
/// ```rust
/// use saphyr_bind::{Field, Shape, Shaped};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// impl Shaped for Server {
///     fn shape() -> Shape {
///         Shape::record::<Self>(|| vec![Field::of::<String>("host"), Field::of::<u16>("port")])
///     }
/// }
///
/// let server: Server = saphyr_bind::from_str("host: localhost\nport: 8080\n").unwrap();
/// assert_eq!(server.port, 8080);
/// ```
#[cfg(feature = "deserialize")]
pub fn from_str<T: Shaped + DeserializeOwned>(input: &str) -> Result<T, Error> {
    from_str_with_options(input, Options::default())
}

/// Deserialize the first YAML document of `input` into `T` with configurable [`Options`].
#[cfg(feature = "deserialize")]
pub fn from_str_with_options<T: Shaped + DeserializeOwned>(
    input: &str,
    options: Options,
) -> Result<T, Error> {
    let source = crate::live_events::LiveEvents::new(input, &options);
    Decoder::new(options).decode(source)
}

/// Bind an already produced event sequence into `T`.
pub fn from_events<T, I>(events: I) -> Result<T, Error>
where
    T: Shaped + DeserializeOwned,
    I: IntoIterator<Item = Event>,
{
    from_events_with_options(events, Options::default())
}

pub fn from_events_with_options<T, I>(events: I, options: Options) -> Result<T, Error>
where
    T: Shaped + DeserializeOwned,
    I: IntoIterator<Item = Event>,
{
    Decoder::new(options).decode(IterEvents::new(events))
}
