//! Schema-driven YAML binding.
//!
//! YAML text is parsed into an event stream; a binding engine walks the stream and fills
//! a target of a declared [`Shape`], resolving tags through a pluggable [`Schema`]. The
//! bound [`Value`] is then handed to serde, so `from_str::<T>` works for any
//! `T: Shaped + DeserializeOwned`. The reverse direction turns values back into events.
//!
//! ```rust
//! use saphyr_bind::{Field, Shape, Shaped};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize)]
//! struct Service {
//!     name: String,
//!     replicas: u8,
//! }
//!
//! impl Shaped for Service {
//!     fn shape() -> Shape {
//!         Shape::record::<Self>(|| {
//!             vec![Field::of::<String>("name"), Field::of::<u8>("replicas")]
//!         })
//!     }
//! }
//!
//! let svc: Service = saphyr_bind::from_str("name: web\nreplicas: 3\n").unwrap();
//! assert_eq!(svc.name, "web");
//! assert_eq!(svc.replicas, 3);
//! ```

pub mod anchors;
mod binding;
pub mod budget;
pub mod de;
pub mod error;
pub mod event;
#[cfg(feature = "deserialize")]
pub mod live_events;
mod macros;
pub mod options;
pub mod parse_scalars;
pub mod path;
pub mod schema;
#[cfg(feature = "serialize")]
pub mod ser;
#[cfg(feature = "serialize")]
mod ser_quoting;
pub mod serializer_options;
pub mod shape;
pub mod tags;
pub mod type_cache;
pub mod value;
pub mod value_de;
#[cfg(feature = "serialize")]
mod zmij_format;

pub use anchors::{Address, AnchorEntry, AnchorTable};
pub use budget::{Budget, BudgetBreach, BudgetEnforcer, BudgetReport};
pub use de::{Decoder, from_events, from_events_with_options};
#[cfg(feature = "deserialize")]
pub use de::{from_str, from_str_with_options};
pub use error::{Error, Location};
pub use event::{DocumentMeta, Event, EventKind, EventSource, IterEvents, ScalarStyle, Version};
#[cfg(feature = "deserialize")]
pub use live_events::LiveEvents;
pub use options::{JsonMode, Options};
pub use path::{BindingId, Path, PathComponent};
pub use schema::{AutoSchema, Flavor, HandlerKind, Resolved, Schema, SchemaRegistry, TagHandler, YamlSchema};
#[cfg(feature = "serialize")]
pub use ser::{to_events, to_events_with_options, value_to_events};
pub use serializer_options::SerializerOptions;
pub use shape::{Shape, Shaped};
pub use type_cache::{Field, RecordInfo};
pub use value::{Mapping, Number, Record, Sequence, Value};
pub use value_de::{ValueDeserializer, from_value};
