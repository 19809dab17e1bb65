//! Relationship mapping
//!
//! Tells the SQL sink how a relationship name used in rules maps onto tables
//! and keys, so `where_has` can be rendered as a correlated subquery.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::param::quote_ident;

/// How related rows are reached from the parent row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RelationDef {
    /// `related.foreign_key = parent.local_key`
    HasMany {
        table: String,
        foreign_key: String,
        #[serde(default = "default_key")]
        local_key: String,
    },
    /// `related.owner_key = parent.foreign_key`
    BelongsTo {
        table: String,
        foreign_key: String,
        #[serde(default = "default_key")]
        owner_key: String,
    },
    /// Through a pivot table
    BelongsToMany {
        table: String,
        pivot: String,
        foreign_pivot_key: String,
        related_pivot_key: String,
        #[serde(default = "default_key")]
        parent_key: String,
        #[serde(default = "default_key")]
        related_key: String,
    },
}

fn default_key() -> String {
    "id".to_string()
}

impl RelationDef {
    pub fn has_many(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::HasMany {
            table: table.into(),
            foreign_key: foreign_key.into(),
            local_key: default_key(),
        }
    }

    pub fn belongs_to(table: impl Into<String>, foreign_key: impl Into<String>) -> Self {
        Self::BelongsTo {
            table: table.into(),
            foreign_key: foreign_key.into(),
            owner_key: default_key(),
        }
    }

    pub fn belongs_to_many(
        table: impl Into<String>,
        pivot: impl Into<String>,
        foreign_pivot_key: impl Into<String>,
        related_pivot_key: impl Into<String>,
    ) -> Self {
        Self::BelongsToMany {
            table: table.into(),
            pivot: pivot.into(),
            foreign_pivot_key: foreign_pivot_key.into(),
            related_pivot_key: related_pivot_key.into(),
            parent_key: default_key(),
            related_key: default_key(),
        }
    }

    pub fn table(&self) -> &str {
        match self {
            Self::HasMany { table, .. } | Self::BelongsTo { table, .. } | Self::BelongsToMany { table, .. } => table,
        }
    }

    /// `FROM ... WHERE <correlation>` for a related alias under `parent`
    pub fn subquery_source(&self, alias: &str, parent: &str) -> (String, String) {
        let col = |a: &str, c: &str| format!("{}.{}", quote_ident(a), quote_ident(c));
        match self {
            Self::HasMany {
                table,
                foreign_key,
                local_key,
            } => (
                format!("{} AS {}", quote_ident(table), quote_ident(alias)),
                format!("{} = {}", col(alias, foreign_key), col(parent, local_key)),
            ),
            Self::BelongsTo {
                table,
                foreign_key,
                owner_key,
            } => (
                format!("{} AS {}", quote_ident(table), quote_ident(alias)),
                format!("{} = {}", col(alias, owner_key), col(parent, foreign_key)),
            ),
            Self::BelongsToMany {
                table,
                pivot,
                foreign_pivot_key,
                related_pivot_key,
                parent_key,
                related_key,
            } => {
                let pivot_alias = format!("{}_pivot", alias);
                (
                    format!(
                        "{} AS {} JOIN {} AS {} ON {} = {}",
                        quote_ident(table),
                        quote_ident(alias),
                        quote_ident(pivot),
                        quote_ident(&pivot_alias),
                        col(&pivot_alias, related_pivot_key),
                        col(alias, related_key),
                    ),
                    format!("{} = {}", col(&pivot_alias, foreign_pivot_key), col(parent, parent_key)),
                )
            }
        }
    }
}

/// Relationship definitions by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationMap {
    relations: HashMap<String, RelationDef>,
}

impl RelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, relation: RelationDef) -> Self {
        self.relations.insert(name.into(), relation);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, relation: RelationDef) {
        self.relations.insert(name.into(), relation);
    }

    pub fn get(&self, name: &str) -> Option<&RelationDef> {
        self.relations.get(name)
    }

    /// Mapped relation, or a has-many guess: table named after the relation,
    /// foreign key `<singular parent>_id`
    pub fn resolve(&self, name: &str, parent_table: &str) -> RelationDef {
        match self.relations.get(name) {
            Some(relation) => relation.clone(),
            None => {
                let singular = parent_table.strip_suffix('s').unwrap_or(parent_table);
                tracing::debug!(relation = name, parent_table, "Unmapped relation, assuming has-many");
                RelationDef::has_many(name, format!("{}_id", singular))
            }
        }
    }
}
