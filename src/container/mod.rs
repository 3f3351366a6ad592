//! Object Container: one record in hand, keyed by ROMID, with JSON
//! import/export built directly onto it (no separate wire format module —
//! the container's own storage layout drives serialization).

mod object_container;

pub use object_container::ObjectContainer;
