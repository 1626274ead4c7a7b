//! Entity mapping: registration tables, metadata and accessor caches

pub mod accessor;
pub mod cache;
pub mod info;
pub mod mapping;

pub use accessor::{Accessor, AccessorCache};
pub use cache::{Catalog, EntityCache};
pub use info::{EntityInfo, MemberInfo};
pub use mapping::{Entity, Mapping, MemberKind};
