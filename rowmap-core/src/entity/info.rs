//! Table and column metadata derived from a mapping

use super::mapping::{Mapping, MemberKind};
use crate::{Error, Result};
use std::collections::HashSet;

/// One mapped member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    pub column: String,
    pub kind: MemberKind,
}

/// Immutable mapping metadata for one entity type
#[derive(Debug, Clone)]
pub struct EntityInfo {
    entity: &'static str,
    table: String,
    members: Vec<MemberInfo>,
    auto_key: Option<usize>,
    select_fields: String,
}

impl EntityInfo {
    pub(crate) fn from_mapping<E>(entity: &'static str, mapping: Mapping<E>) -> Result<Self> {
        if mapping.table.trim().is_empty() {
            return Err(Error::mapping(entity, "table name is empty"));
        }

        let mut seen = HashSet::new();
        let mut auto_key = None;
        let mut members = Vec::with_capacity(mapping.members.len());
        for (index, def) in mapping.members.into_iter().enumerate() {
            if !seen.insert(def.name.to_ascii_lowercase()) {
                return Err(Error::mapping(
                    entity,
                    format!("member '{}' is declared more than once", def.name),
                ));
            }
            if def.column.trim().is_empty() {
                return Err(Error::mapping(
                    entity,
                    format!("member '{}' has an empty column name", def.name),
                ));
            }
            if def.kind == MemberKind::AutoKey {
                if auto_key.is_some() {
                    return Err(Error::mapping(
                        entity,
                        "at most one auto-generated key is allowed",
                    ));
                }
                auto_key = Some(index);
            }
            members.push(MemberInfo {
                name: def.name,
                column: def.column,
                kind: def.kind,
            });
        }

        let select_fields = members
            .iter()
            .filter(|m| m.kind.is_persisted())
            .map(|m| m.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Ok(Self {
            entity,
            table: mapping.table,
            members,
            auto_key,
            select_fields,
        })
    }

    /// Short name of the mapped type
    pub fn entity(&self) -> &'static str {
        self.entity
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Every member, computed ones included, in declaration order
    pub fn members(&self) -> &[MemberInfo] {
        &self.members
    }

    /// Persisted members
    pub fn column_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.kind.is_persisted())
    }

    pub fn key_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.members.iter().filter(|m| m.kind.is_key())
    }

    pub fn non_key_column_members(&self) -> impl Iterator<Item = &MemberInfo> {
        self.column_members().filter(|m| !m.kind.is_key())
    }

    pub fn has_keys(&self) -> bool {
        self.key_members().next().is_some()
    }

    /// Fails with `KeyRequired` when the type declares no key member
    pub fn require_keys(&self, operation: &'static str) -> Result<()> {
        if self.has_keys() {
            Ok(())
        } else {
            Err(Error::key_required(self.entity, operation))
        }
    }

    pub fn auto_key(&self) -> Option<&MemberInfo> {
        self.auto_key.map(|index| &self.members[index])
    }

    /// Comma-joined list of persisted columns
    pub fn select_fields(&self) -> &str {
        &self.select_fields
    }

    /// Member by name, ignoring ASCII case
    pub fn member(&self, name: &str) -> Option<&MemberInfo> {
        self.members
            .iter()
            .find(|m| m.name == name)
            .or_else(|| self.members.iter().find(|m| m.name.eq_ignore_ascii_case(name)))
    }

    /// Column mapped to `member`
    pub fn column(&self, member: &str) -> Option<&str> {
        self.member(member).map(|m| m.column.as_str())
    }

    /// Reverse lookup from a column name to its member, ignoring ASCII case
    pub fn member_for_column(&self, column: &str) -> Option<&MemberInfo> {
        self.members
            .iter()
            .find(|m| m.column.eq_ignore_ascii_case(column))
    }

    /// Member for a result column: literal member name first, then the
    /// mapped column name
    pub fn resolve_result_column(&self, column: &str) -> Option<&MemberInfo> {
        self.member(column).or_else(|| self.member_for_column(column))
    }
}
