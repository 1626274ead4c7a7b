//! Explicit registration table for a mapped type

use super::accessor::Accessor;
use crate::{FromValue, Value};

/// How a member takes part in persistence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// Plain persisted column
    Column,
    /// Key column supplied by the application
    Key,
    /// Key column generated by the database on insert
    AutoKey,
    /// Read from result sets but never written
    Computed,
}

impl MemberKind {
    pub fn is_key(&self) -> bool {
        matches!(self, MemberKind::Key | MemberKind::AutoKey)
    }

    pub fn is_persisted(&self) -> bool {
        !matches!(self, MemberKind::Computed)
    }
}

pub(crate) struct MemberDef<E> {
    pub(crate) name: String,
    pub(crate) column: String,
    pub(crate) kind: MemberKind,
    pub(crate) accessor: Accessor<E>,
}

/// Table name plus one typed getter/setter pair per member, in declaration
/// order.
///
/// # Examples
/// ```
/// use rowmap_core::{Entity, Mapping};
///
/// #[derive(Default)]
/// struct User {
///     id: i64,
///     name: String,
///     email: Option<String>,
/// }
///
/// impl Entity for User {
///     fn mapping() -> Mapping<Self> {
///         Mapping::<Self>::table("T_USER")
///             .auto_key("id", "USER_ID", |u| &u.id, |u| &mut u.id)
///             .column("name", "USER_NAME", |u| &u.name, |u| &mut u.name)
///             .field("email", |u| &u.email, |u| &mut u.email)
///     }
/// }
/// ```
pub struct Mapping<E> {
    pub(crate) table: String,
    pub(crate) members: Vec<MemberDef<E>>,
}

impl<E: 'static> Mapping<E> {
    /// Start a mapping for the given table
    pub fn table(name: impl Into<String>) -> Self {
        Self {
            table: name.into(),
            members: Vec::new(),
        }
    }

    /// Persisted member stored under a different column name
    pub fn column<T>(
        self,
        member: impl Into<String>,
        column: impl Into<String>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.member(member.into(), Some(column.into()), MemberKind::Column, get, get_mut)
    }

    /// Persisted member whose column shares its name
    pub fn field<T>(
        self,
        member: impl Into<String>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.member(member.into(), None, MemberKind::Column, get, get_mut)
    }

    /// Key member supplied by the application
    pub fn key<T>(
        self,
        member: impl Into<String>,
        column: impl Into<String>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.member(member.into(), Some(column.into()), MemberKind::Key, get, get_mut)
    }

    /// Key member generated by the database
    pub fn auto_key<T>(
        self,
        member: impl Into<String>,
        column: impl Into<String>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.member(member.into(), Some(column.into()), MemberKind::AutoKey, get, get_mut)
    }

    /// Member filled from result sets only
    pub fn computed<T>(
        self,
        member: impl Into<String>,
        column: impl Into<String>,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        self.member(member.into(), Some(column.into()), MemberKind::Computed, get, get_mut)
    }

    fn member<T>(
        mut self,
        name: String,
        column: Option<String>,
        kind: MemberKind,
        get: fn(&E) -> &T,
        get_mut: fn(&mut E) -> &mut T,
    ) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        let column = column.unwrap_or_else(|| name.clone());
        let accessor = Accessor::typed(name.clone(), get, get_mut);
        self.members.push(MemberDef {
            name,
            column,
            kind,
            accessor,
        });
        self
    }
}

/// A type mapped onto one database table
pub trait Entity: Default + 'static {
    /// The registration table, evaluated once per catalog
    fn mapping() -> Mapping<Self>;

    /// Short type name used in error messages
    fn entity_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }
}
