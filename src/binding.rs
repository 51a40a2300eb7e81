//! Binding objects: one per open node, connecting it to its storage slot.
//!
//! Parents open child slots (`obj_start_in`) and splice finished children back
//! (`obj_end_in`); collections get `collection_start`/`collection_end` hooks; scalars
//! and aliases get `set_scalar`. The engine drives these in event order.

use std::sync::Arc;

use crate::anchors::AnchorTable;
use crate::error::{Error, Location};
use crate::event::{Event, EventKind};
use crate::path::{BindingId, Path};
use crate::schema::{HandlerKind, Schema, TagHandler, mismatch};
use crate::shape::Shape;
use crate::type_cache::RecordInfo;
use crate::value::{Mapping, Record, Sequence, Value};

/// Declared target of a child node.
#[derive(Clone, Debug, PartialEq)]
pub struct Slot {
    pub shape: Shape,
    /// The slot is a record field flagged render-as-string: quoted scalars keep the
    /// field's own kind instead of becoming strings.
    pub as_string: bool,
}

impl Slot {
    pub fn new(shape: Shape) -> Self {
        Slot {
            shape,
            as_string: false,
        }
    }
}

/// Engine settings that affect individual bindings.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct BindContext {
    pub ignore_unknown_fields: bool,
}

/// A node that has been fully bound and is handed to its parent.
#[derive(Debug)]
pub(crate) struct Finished {
    pub value: Value,
    pub anchor: Option<String>,
    pub slot: Shape,
}

/// Parts every non-root binding shares.
#[derive(Debug)]
pub(crate) struct Common {
    pub slot: Slot,
    pub anchor: Option<String>,
    pub handler: Arc<dyn TagHandler>,
    pub schema: Arc<dyn Schema>,
}

#[derive(Debug)]
pub(crate) struct RootBinding {
    target: Shape,
    value: Value,
    bound: bool,
}

#[derive(Debug)]
pub(crate) struct SequenceBinding {
    common: Common,
    seq: Sequence,
    generic: bool,
}

#[derive(Debug)]
enum FieldTarget {
    None,
    Field(usize),
    Skip,
}

#[derive(Debug)]
enum MapStorage {
    Map {
        map: Mapping,
        pending_key: Option<Value>,
    },
    Record {
        record: Record,
        seen: Vec<bool>,
        field: FieldTarget,
    },
}

#[derive(Debug)]
pub(crate) struct MappingBinding {
    common: Common,
    storage: MapStorage,
    generic: bool,
    ignore_unknown: bool,
}

#[derive(Debug)]
pub(crate) struct ScalarBinding {
    common: Common,
    value: Value,
}

#[derive(Debug)]
pub(crate) struct AliasBinding {
    common: Common,
    value: Value,
}

#[derive(Debug)]
pub(crate) enum Binding {
    Root(RootBinding),
    Sequence(SequenceBinding),
    Mapping(MappingBinding),
    Scalar(ScalarBinding),
    Alias(AliasBinding),
}

fn not_a_parent(path: &Path) -> Error {
    Error::structure(format!("{path}: a scalar node cannot contain children"))
}

impl RootBinding {
    pub fn new(target: Shape, value: Value) -> Self {
        RootBinding {
            target,
            value,
            bound: false,
        }
    }
}

/// Instantiate the binding for a node owned by `handler`.
///
/// Checks that the handler may own this event kind and that the slot can hold the
/// handler's kind (`specify`), then builds the matching variant.
pub(crate) fn new_binding_object(
    handler: Arc<dyn TagHandler>,
    event: &Event,
    path: &Path,
    slot: Slot,
    schema: Arc<dyn Schema>,
    ctx: BindContext,
) -> Result<Binding, Error> {
    let kind = handler.kind();
    let owns_event = match event.kind {
        EventKind::SequenceStart => kind == HandlerKind::Seq,
        EventKind::MappingStart => kind == HandlerKind::Map,
        EventKind::Scalar => kind.is_scalar(),
        EventKind::Alias => kind == HandlerKind::Alias,
        _ => false,
    };
    if !owns_event {
        return Err(mismatch(path, handler.tag(), &slot.shape));
    }
    let concrete = handler
        .specify(&slot.shape)
        .ok_or_else(|| mismatch(path, handler.tag(), &slot.shape))?;

    let generic = slot.shape.is_any();
    let anchor = event.anchor_name().map(str::to_string);
    let common = Common {
        slot,
        anchor,
        handler,
        schema,
    };
    let binding = match (kind, concrete) {
        (HandlerKind::Seq, Shape::Seq(elem)) => Binding::Sequence(SequenceBinding {
            common,
            seq: Sequence::new(*elem),
            generic,
        }),
        (HandlerKind::Map, Shape::Record(info)) => Binding::Mapping(MappingBinding {
            common,
            storage: MapStorage::Record {
                record: Record::zero(Arc::clone(&info)),
                seen: vec![false; info.fields().len()],
                field: FieldTarget::None,
            },
            generic,
            ignore_unknown: ctx.ignore_unknown_fields,
        }),
        (HandlerKind::Map, Shape::Map(k, v)) => Binding::Mapping(MappingBinding {
            common,
            storage: MapStorage::Map {
                map: Mapping::new(*k, *v),
                pending_key: None,
            },
            generic,
            ignore_unknown: ctx.ignore_unknown_fields,
        }),
        (HandlerKind::Alias, _) => Binding::Alias(AliasBinding {
            common,
            value: Value::Null,
        }),
        (k, _) if k.is_scalar() => Binding::Scalar(ScalarBinding {
            common,
            value: Value::Null,
        }),
        (_, concrete) => {
            return Err(Error::structure(format!(
                "{path}: handler {} specified unusable shape {concrete}",
                common.handler.tag()
            )));
        }
    };
    Ok(binding)
}

impl Binding {
    pub fn id_label(&self) -> &'static str {
        match self {
            Binding::Root(_) => "root",
            Binding::Sequence(_) => "sequence",
            Binding::Mapping(_) => "mapping",
            Binding::Scalar(_) => "scalar",
            Binding::Alias(_) => "alias",
        }
    }

    fn common(&self) -> Option<&Common> {
        match self {
            Binding::Root(_) => None,
            Binding::Sequence(b) => Some(&b.common),
            Binding::Mapping(b) => Some(&b.common),
            Binding::Scalar(b) => Some(&b.common),
            Binding::Alias(b) => Some(&b.common),
        }
    }

    /// Tag of the handler that produced the binding.
    pub fn tag(&self) -> &str {
        self.common().map_or("", |c| c.handler.tag())
    }

    pub fn anchor(&self) -> Option<&str> {
        self.common().and_then(|c| c.anchor.as_deref())
    }

    /// Open the slot for the next child and return its declared target together with
    /// the value it starts from.
    pub fn obj_start_in(&mut self, path: &Path) -> Result<(Slot, Value), Error> {
        match self {
            Binding::Root(root) => {
                if root.bound {
                    return Err(Error::structure("document has more than one root node"));
                }
                Ok((
                    Slot::new(root.target.clone()),
                    std::mem::take(&mut root.value),
                ))
            }
            Binding::Sequence(seq) => {
                seq.grow();
                Ok((Slot::new(seq.seq.elem_shape().clone()), Value::Null))
            }
            Binding::Mapping(map) => map.start_child(path),
            Binding::Scalar(_) | Binding::Alias(_) => Err(not_a_parent(path)),
        }
    }

    /// Splice a finished child into this binding's container.
    pub fn obj_end_in(&mut self, child: Finished, path: &Path) -> Result<(), Error> {
        match self {
            Binding::Root(root) => {
                root.value = child.value;
                root.bound = true;
                Ok(())
            }
            Binding::Sequence(seq) => {
                seq.seq.items_mut().push(child.value);
                Ok(())
            }
            Binding::Mapping(map) => map.end_child(child, path),
            Binding::Scalar(_) | Binding::Alias(_) => Err(not_a_parent(path)),
        }
    }

    /// Prepare the container. `initial` is what the slot held before.
    pub fn collection_start(&mut self, initial: Value, _path: &Path) -> Result<(), Error> {
        match self {
            Binding::Root(root) => {
                if !initial.is_null() && !initial.conforms_to(&root.target) {
                    return Err(Error::InvalidRootTarget {
                        target: root.target.clone(),
                        reason: "the slot holds a value of another shape".to_string(),
                    });
                }
                root.value = initial;
                Ok(())
            }
            // Sequences and maps always start empty.
            Binding::Sequence(_) => Ok(()),
            Binding::Mapping(map) => {
                // A record slot that already holds the same record keeps unmentioned fields.
                if let MapStorage::Record { record, .. } = &mut map.storage {
                    if let Value::Record(existing) = initial {
                        if existing.info().type_id() == record.info().type_id() {
                            *record = existing;
                        }
                    }
                }
                Ok(())
            }
            Binding::Scalar(_) | Binding::Alias(_) => Ok(()),
        }
    }

    /// Finish the container; generic containers are tightened here.
    pub fn collection_end(&mut self, _path: &Path) -> Result<(), Error> {
        match self {
            Binding::Sequence(seq) if seq.generic => {
                if let Some(elem) = uniform_shape(seq.seq.items().iter()) {
                    tracing::debug!(elem = %elem, len = seq.seq.len(), "tightened generic sequence");
                    seq.seq.set_elem_shape(elem);
                }
                Ok(())
            }
            Binding::Mapping(map) if map.generic => {
                if let MapStorage::Map { map, .. } = &mut map.storage {
                    let key = uniform_shape(map.keys());
                    let value = uniform_shape(map.values());
                    if key.is_some() || value.is_some() {
                        let key = key.unwrap_or(Shape::Any);
                        let value = value.unwrap_or(Shape::Any);
                        tracing::debug!(key = %key, value = %value, len = map.len(), "tightened generic mapping");
                        map.set_shapes(key, value);
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Populate a scalar or alias binding from its event.
    pub fn set_scalar(
        &mut self,
        event: &Event,
        path: &Path,
        anchors: &AnchorTable,
    ) -> Result<(), Error> {
        match self {
            Binding::Scalar(scalar) => {
                let c = &scalar.common;
                scalar.value =
                    c.handler
                        .set_scalar(event.text(), &c.slot.shape, c.schema.flavor(), path)?;
                Ok(())
            }
            Binding::Alias(alias) => alias.resolve(event, path, anchors),
            _ => Err(Error::structure(format!(
                "{path}: {} binding cannot take a scalar",
                self.id_label()
            ))),
        }
    }

    /// Hand the finished node to its parent.
    pub fn finish(self) -> Finished {
        match self {
            Binding::Root(root) => Finished {
                value: root.value,
                anchor: None,
                slot: root.target,
            },
            Binding::Sequence(b) => Finished {
                value: Value::Seq(b.seq),
                anchor: b.common.anchor,
                slot: b.common.slot.shape,
            },
            Binding::Mapping(b) => Finished {
                value: match b.storage {
                    MapStorage::Map { map, .. } => Value::Map(map),
                    MapStorage::Record { record, .. } => Value::Record(record),
                },
                anchor: b.common.anchor,
                slot: b.common.slot.shape,
            },
            Binding::Scalar(b) => Finished {
                value: b.value,
                anchor: b.common.anchor,
                slot: b.common.slot.shape,
            },
            // Aliases are never anchorable.
            Binding::Alias(b) => Finished {
                value: b.value,
                anchor: None,
                slot: b.common.slot.shape,
            },
        }
    }
}

impl SequenceBinding {
    /// Grow the backing storage by half its capacity when full.
    fn grow(&mut self) {
        let items = self.seq.items_mut();
        if items.len() == items.capacity() {
            let cap = items.capacity();
            let wanted = (cap + cap / 2).max(4);
            items.reserve_exact(wanted - items.len());
        }
    }
}

impl MappingBinding {
    fn start_child(&mut self, path: &Path) -> Result<(Slot, Value), Error> {
        let in_key = path.in_mapping_key();
        match &mut self.storage {
            MapStorage::Map { map, .. } => {
                let shape = if in_key {
                    map.key_shape()
                } else {
                    map.value_shape()
                };
                Ok((Slot::new(shape.clone()), Value::Null))
            }
            MapStorage::Record { .. } if in_key => Ok((Slot::new(Shape::Str), Value::Null)),
            MapStorage::Record { record, field, .. } => match field {
                FieldTarget::Field(idx) => {
                    let idx = *idx;
                    let info = Arc::clone(record.info());
                    let descriptor = &info.fields()[idx];
                    let slot = Slot {
                        shape: descriptor.shape().clone(),
                        as_string: descriptor.as_string,
                    };
                    Ok((slot, std::mem::take(&mut record.fields_mut()[idx])))
                }
                FieldTarget::Skip => Ok((Slot::new(Shape::Any), Value::Null)),
                FieldTarget::None => Err(Error::structure(format!(
                    "{path}: mapping value without a key"
                ))),
            },
        }
    }

    fn end_child(&mut self, child: Finished, path: &Path) -> Result<(), Error> {
        let in_key = path.in_mapping_key();
        let ignore_unknown = self.ignore_unknown;
        match &mut self.storage {
            MapStorage::Map { pending_key, .. } if in_key => {
                *pending_key = Some(child.value);
                Ok(())
            }
            MapStorage::Map { map, pending_key } => {
                let key = pending_key
                    .take()
                    .ok_or_else(|| Error::structure(format!("{path}: mapping value without a key")))?;
                // Collections cannot key a generic map; their path text stands in for them.
                let key = if key.is_hashable() || !matches!(map.key_shape(), Shape::Any) {
                    key
                } else {
                    Value::String(key.to_string())
                };
                map.insert(key, child.value)
                    .map_err(|(key, _)| duplicate_key(path, &key))
            }
            MapStorage::Record { record, field, .. } if in_key => {
                let name = match &child.value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                *field = match record.info().field_by_name(&name) {
                    Some(idx) => FieldTarget::Field(idx),
                    None if ignore_unknown => {
                        tracing::debug!(key = %name, record = record.info().name(), "skipping unknown field");
                        FieldTarget::Skip
                    }
                    None => {
                        return Err(Error::UnknownField {
                            path: path.to_string(),
                            key: name,
                            record: record.info().name(),
                            location: Location::UNKNOWN,
                        });
                    }
                };
                Ok(())
            }
            MapStorage::Record {
                record,
                seen,
                field,
            } => {
                match std::mem::replace(field, FieldTarget::None) {
                    FieldTarget::Field(idx) => {
                        if seen[idx] {
                            let info: &RecordInfo = record.info();
                            return Err(Error::DuplicateKey {
                                path: path.to_string(),
                                key: info.fields()[idx].external_name().to_string(),
                                location: Location::UNKNOWN,
                            });
                        }
                        seen[idx] = true;
                        record.fields_mut()[idx] = child.value;
                    }
                    FieldTarget::Skip => {}
                    FieldTarget::None => {
                        return Err(Error::structure(format!(
                            "{path}: mapping value without a key"
                        )));
                    }
                }
                Ok(())
            }
        }
    }
}

fn duplicate_key(path: &Path, key: &Value) -> Error {
    Error::DuplicateKey {
        path: path.to_string(),
        key: match key {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
        location: Location::UNKNOWN,
    }
}

fn strip_option(shape: &Shape) -> &Shape {
    match shape {
        Shape::Option(inner) => strip_option(inner),
        other => other,
    }
}

impl AliasBinding {
    fn resolve(&mut self, event: &Event, path: &Path, anchors: &AnchorTable) -> Result<(), Error> {
        let name = event.text().unwrap_or_default();
        let entry = anchors
            .find_reference(name)
            .ok_or_else(|| Error::UnresolvedAlias {
                path: path.to_string(),
                anchor: name.to_string(),
                location: Location::UNKNOWN,
            })?;
        let slot = &self.common.slot.shape;
        let nullable = matches!(slot, Shape::Any | Shape::Option(_));
        if strip_option(&entry.slot) != strip_option(slot) || (entry.value.is_null() && !nullable) {
            return Err(Error::AliasTypeMismatch {
                path: path.to_string(),
                anchor: name.to_string(),
                expected: slot.clone(),
                found: entry.slot.clone(),
                location: Location::UNKNOWN,
            });
        }
        tracing::trace!(anchor = name, at = %entry.address, "resolved alias");
        self.value = entry.value.clone();
        Ok(())
    }
}

/// Shape shared by every value, if there is one worth narrowing to.
///
/// Null or fully generic members, mixed shapes and empty input all yield `None`.
fn uniform_shape<'a>(values: impl Iterator<Item = &'a Value>) -> Option<Shape> {
    let mut found: Option<Shape> = None;
    for value in values {
        let shape = value.shape()?;
        if shape.is_fully_generic() {
            return None;
        }
        match &found {
            None => found = Some(shape),
            Some(f) if *f == shape => {}
            Some(_) => return None,
        }
    }
    found
}

/// Owner of every live binding of one document; path nodes hold handles into it.
#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Option<Binding>>,
    free: Vec<usize>,
}

impl Arena {
    pub fn insert(&mut self, binding: Binding) -> BindingId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(binding);
                BindingId(idx)
            }
            None => {
                self.slots.push(Some(binding));
                BindingId(self.slots.len() - 1)
            }
        }
    }

    pub fn get_mut(&mut self, id: BindingId) -> Result<&mut Binding, Error> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::structure("dangling binding handle"))
    }

    pub fn remove(&mut self, id: BindingId) -> Result<Binding, Error> {
        let binding = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| Error::structure("dangling binding handle"))?;
        self.free.push(id.0);
        Ok(binding)
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Number;

    #[test]
    fn uniform_items_narrow() {
        let ints = [Value::from(1i64), Value::from(2i64)];
        assert_eq!(uniform_shape(ints.iter()), Some(Shape::I64));

        let mixed = [Value::from(1i64), Value::from("x")];
        assert_eq!(uniform_shape(mixed.iter()), None);

        let with_null = [Value::from(1i64), Value::Null];
        assert_eq!(uniform_shape(with_null.iter()), None);

        assert_eq!(uniform_shape(std::iter::empty()), None);

        let generic = [Value::Seq(Sequence::new(Shape::Any))];
        assert_eq!(uniform_shape(generic.iter()), None);

        let narrowed = [
            Value::Seq(Sequence::from_items(Shape::I64, vec![Value::from(1i64)])),
            Value::Seq(Sequence::from_items(Shape::I64, vec![])),
        ];
        assert_eq!(uniform_shape(narrowed.iter()), Some(Shape::seq(Shape::I64)));
    }

    #[test]
    fn precision_matters_for_uniformity() {
        let items = [
            Value::Number(Number::I64(1)),
            Value::Number(Number::U64(u64::MAX)),
        ];
        assert_eq!(uniform_shape(items.iter()), None);
    }

    #[test]
    fn arena_reuses_freed_slots() {
        let mut arena = Arena::default();
        let a = arena.insert(Binding::Root(RootBinding::new(Shape::Any, Value::Null)));
        let b = arena.insert(Binding::Root(RootBinding::new(Shape::Any, Value::Null)));
        arena.remove(a).unwrap();
        assert!(arena.get_mut(a).is_err());
        let c = arena.insert(Binding::Root(RootBinding::new(Shape::Any, Value::Null)));
        assert_eq!(a, c);
        assert!(arena.get_mut(b).is_ok());
    }
}
