//! Token resolution and the memoized member cache.
//!
//! Resolving a token more than once must hand back the *same* member
//! instance: callers hold `Arc`s and compare identity, and linking passes
//! append relations that every holder must observe. The cache therefore
//! publishes members through a first-insert-wins concurrent map keyed by
//! token; racers that lose the insert adopt the published instance.

use std::sync::Arc;

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;

use crate::metadata::{
    streams::TablesHeader,
    tables::{RowData, TableId},
    token::Token,
};

/// A resolved metadata member: one table row wrapped with its identity and
/// the relation lists the linking passes populate.
pub struct Member {
    /// The token this member was resolved from
    pub token: Token,
    /// The decoded row, tagged by table kind
    pub row: RowData,
    /// Types nested inside this one (`NestedClass` linking)
    pub nested_types: boxcar::Vec<Token>,
    /// Generic parameters owned by this type or method
    pub generic_params: boxcar::Vec<Token>,
    /// Custom attributes attached to this member
    pub custom_attributes: boxcar::Vec<Token>,
}

/// Reference-counted handle to a cached [`Member`].
pub type MemberRc = Arc<Member>;

/// Memoizing token → member resolver, scoped to one metadata view.
///
/// Unbounded: every member resolved through this cache stays alive as long
/// as the cache does. Cross-member edges are stored as tokens and looked up
/// back through the cache, never as owning pointers, so cyclic structures
/// (nested types, mutually generic types) cannot leak.
pub struct MemberCache {
    members: SkipMap<Token, MemberRc>,
    by_table: DashMap<TableId, Vec<Token>>,
}

impl MemberCache {
    #[must_use]
    pub fn new() -> Self {
        MemberCache {
            members: SkipMap::new(),
            by_table: DashMap::new(),
        }
    }

    /// Resolves `token` against `tables`, memoizing the result.
    ///
    /// Returns `None` for the null token, an unknown table byte, or a rid
    /// past the table's row count — dangling references are an expected
    /// input, not an error. Concurrent callers racing on the same token all
    /// receive the identical instance.
    #[must_use]
    pub fn resolve(&self, token: Token, tables: &TablesHeader<'_>) -> Option<MemberRc> {
        if token.is_null() {
            return None;
        }

        if let Some(entry) = self.members.get(&token) {
            return Some(entry.value().clone());
        }

        let table_id = token.table_id()?;
        let row = tables.row(table_id, token.row())?;

        let candidate = Arc::new(Member {
            token,
            row,
            nested_types: boxcar::Vec::new(),
            generic_params: boxcar::Vec::new(),
            custom_attributes: boxcar::Vec::new(),
        });

        let entry = self.members.get_or_insert(token, candidate.clone());
        let published = entry.value().clone();

        // Only the racer whose instance got published may record the token,
        // otherwise concurrent first-resolutions duplicate it in the index.
        if Arc::ptr_eq(&published, &candidate) {
            self.by_table.entry(table_id).or_default().push(token);
        }
        Some(published)
    }

    /// Returns the already-resolved member for `token`, without resolving.
    #[must_use]
    pub fn get(&self, token: Token) -> Option<MemberRc> {
        self.members.get(&token).map(|entry| entry.value().clone())
    }

    /// The number of members resolved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Tokens resolved from `table_id`, in resolution order.
    #[must_use]
    pub fn tokens_for(&self, table_id: TableId) -> Vec<Token> {
        self.by_table
            .get(&table_id)
            .map(|tokens| tokens.clone())
            .unwrap_or_default()
    }

    /// Records `nested` as a type nested inside `enclosing`. Both members
    /// must already be resolved; returns false otherwise.
    pub fn link_nested(&self, enclosing: Token, nested: Token) -> bool {
        match self.members.get(&enclosing) {
            Some(entry) => {
                entry.value().nested_types.push(nested);
                true
            }
            None => false,
        }
    }

    /// Records `param` as a generic parameter of `owner`.
    pub fn link_generic_param(&self, owner: Token, param: Token) -> bool {
        match self.members.get(&owner) {
            Some(entry) => {
                entry.value().generic_params.push(param);
                true
            }
            None => false,
        }
    }

    /// Records `attribute` as a custom attribute of `parent`.
    pub fn link_custom_attribute(&self, parent: Token, attribute: Token) -> bool {
        match self.members.get(&parent) {
            Some(entry) => {
                entry.value().custom_attributes.push(attribute);
                true
            }
            None => false,
        }
    }
}

impl Default for MemberCache {
    fn default() -> Self {
        MemberCache::new()
    }
}
