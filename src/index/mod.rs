//! Member value indexes: unique-key, enum/categorical, and text.

mod enum_index;
mod key;
mod text_index;
mod unique_index;

pub use enum_index::EnumIndex;
pub use key::{key_for, IndexKey};
pub use text_index::{Criteria, TextIndex};
pub use unique_index::UniqueIndex;
