//! Typed get/set accessors and their per-member cache

use super::Entity;
use crate::{Error, FromValue, Result, Value};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

type Getter<E> = Box<dyn Fn(&E) -> Value + Send + Sync>;
type Setter<E> = Box<dyn Fn(&mut E, Value) -> Result<()> + Send + Sync>;

/// Get/set capability bound to one member of `E`
pub struct Accessor<E> {
    member: String,
    getter: Getter<E>,
    setter: Setter<E>,
}

impl<E: 'static> Accessor<E> {
    pub(crate) fn typed<T>(member: String, get: fn(&E) -> &T, get_mut: fn(&mut E) -> &mut T) -> Self
    where
        T: Clone + Into<Value> + FromValue + 'static,
    {
        Self {
            member,
            getter: Box::new(move |entity: &E| -> Value { get(entity).clone().into() }),
            setter: Box::new(move |entity: &mut E, value: Value| -> Result<()> {
                *get_mut(entity) = T::from_value(value)?;
                Ok(())
            }),
        }
    }
}

impl<E> Accessor<E> {
    pub fn member(&self) -> &str {
        &self.member
    }

    /// Read the member as a database value
    pub fn get(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }

    /// Write a database value into the member, coercing it to the member type
    pub fn set(&self, entity: &mut E, value: Value) -> Result<()> {
        (self.setter)(entity, value)
    }
}

impl<E> fmt::Debug for Accessor<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").field("member", &self.member).finish()
    }
}

type AccessorKey = (TypeId, String);

/// Memoizes one accessor per (type, member)
#[derive(Default)]
pub struct AccessorCache {
    entries: RwLock<HashMap<AccessorKey, Arc<dyn Any + Send + Sync>>>,
}

impl AccessorCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accessor for `member` of `E`; the first miss for a type registers
    /// every member of that type at once
    pub fn get<E: Entity>(&self, member: &str) -> Result<Arc<Accessor<E>>> {
        let key = (TypeId::of::<E>(), member.to_string());
        {
            let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(found) = entries.get(&key) {
                return downcast::<E>(found.clone());
            }
        }

        let mapping = E::mapping();
        let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        for def in mapping.members {
            let accessor: Arc<dyn Any + Send + Sync> = Arc::new(def.accessor);
            entries.entry((TypeId::of::<E>(), def.name)).or_insert(accessor);
        }
        log::trace!("registered accessors for {}", E::entity_name());

        match entries.get(&key) {
            Some(found) => downcast::<E>(found.clone()),
            None => Err(Error::mapping(
                E::entity_name(),
                format!("unknown member '{}'", member),
            )),
        }
    }

    /// Accessors for several members, in the given order
    pub fn get_many<'a, E, I>(&self, members: I) -> Result<Vec<Arc<Accessor<E>>>>
    where
        E: Entity,
        I: IntoIterator<Item = &'a str>,
    {
        members.into_iter().map(|member| self.get::<E>(member)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<E: Entity>(entry: Arc<dyn Any + Send + Sync>) -> Result<Arc<Accessor<E>>> {
    entry
        .downcast::<Accessor<E>>()
        .map_err(|_| Error::mapping(E::entity_name(), "accessor registered with a different type"))
}
