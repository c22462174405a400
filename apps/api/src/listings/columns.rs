//! Column resolution: maps loosely-named MLS headers to the fields metrics need.
//!
//! Detection is a declarative rule table: a column qualifies for a field when its
//! normalized name contains every required substring. The first qualifying column
//! in original order wins. Unresolved fields are simply absent.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listings::dataset::normalize_column_name;

/// The semantic fields the metrics engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Status,
    ListPrice,
    StreetNumber,
    StreetName,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::Status => "status",
            CanonicalField::ListPrice => "list_price",
            CanonicalField::StreetNumber => "street_number",
            CanonicalField::StreetName => "street_name",
        }
    }
}

impl std::fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detection rule: `field` resolves to the first column containing all `required` substrings.
#[derive(Debug, Clone, Copy)]
pub struct ColumnRule {
    pub field: CanonicalField,
    pub required: &'static [&'static str],
}

pub const COLUMN_RULES: &[ColumnRule] = &[
    ColumnRule {
        field: CanonicalField::Status,
        required: &["status"],
    },
    ColumnRule {
        field: CanonicalField::ListPrice,
        required: &["list", "price"],
    },
    ColumnRule {
        field: CanonicalField::StreetNumber,
        required: &["street", "number"],
    },
    ColumnRule {
        field: CanonicalField::StreetName,
        required: &["street", "name"],
    },
];

/// A column chosen for a canonical field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub name: String,
}

/// Canonical field → matched column. Derived fresh per dataset, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMapping {
    fields: BTreeMap<CanonicalField, ResolvedColumn>,
}

impl ColumnMapping {
    pub fn get(&self, field: CanonicalField) -> Option<&ResolvedColumn> {
        self.fields.get(&field)
    }

    pub fn index_of(&self, field: CanonicalField) -> Option<usize> {
        self.get(field).map(|c| c.index)
    }
}

/// Resolves every rule in [`COLUMN_RULES`] against `columns`.
pub fn resolve_columns(columns: &[String]) -> ColumnMapping {
    resolve_with_rules(columns, COLUMN_RULES)
}

pub fn resolve_with_rules(columns: &[String], rules: &[ColumnRule]) -> ColumnMapping {
    let normalized: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();

    let fields = rules
        .iter()
        .filter_map(|rule| {
            normalized
                .iter()
                .position(|name| rule.required.iter().all(|needle| name.contains(needle)))
                .map(|index| {
                    (
                        rule.field,
                        ResolvedColumn {
                            index,
                            name: normalized[index].clone(),
                        },
                    )
                })
        })
        .collect();

    ColumnMapping { fields }
}
