//! Typed table descriptions and DDL generation.
//!
//! A [`Schema`] is a passive description: it never opens a database. DDL is
//! generated on demand with tables ordered before the tables that reference
//! them. Every foreign key cascades on delete and update.

use crate::error::SchemaError;
use std::collections::HashSet;
use std::fmt;

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Integer,
    Text,
    Blob,
}

impl SqlType {
    pub fn as_str(self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Text => "TEXT",
            SqlType::Blob => "BLOB",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target of a cascading foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: &'static str,
    pub column: &'static str,
}

impl ForeignKey {
    /// Clause appended to every reference.
    pub const CASCADE: &'static str = "ON DELETE CASCADE ON UPDATE CASCADE";
}

/// A column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub sql_type: SqlType,
    pub nullable: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub nocase: bool,
    /// Single-column index named `ix_<table>_<column>`.
    pub indexed: bool,
    pub default: Option<&'static str>,
    pub references: Option<ForeignKey>,
}

impl Column {
    fn new(name: &'static str, sql_type: SqlType) -> Self {
        Self {
            name,
            sql_type,
            nullable: true,
            primary_key: false,
            unique: false,
            nocase: false,
            indexed: false,
            default: None,
            references: None,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, SqlType::Integer)
    }

    /// A text column with case-insensitive collation.
    pub fn text(name: &'static str) -> Self {
        Self {
            nocase: true,
            ..Self::new(name, SqlType::Text)
        }
    }

    /// A text column with the default binary collation.
    pub fn plain_text(name: &'static str) -> Self {
        Self::new(name, SqlType::Text)
    }

    pub fn blob(name: &'static str) -> Self {
        Self::new(name, SqlType::Blob)
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn default_value(mut self, value: &'static str) -> Self {
        self.default = Some(value);
        self
    }

    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some(ForeignKey { table, column });
        self
    }
}

/// A named index over one or more columns of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub unique: bool,
}

impl Index {
    pub fn ddl(&self) -> String {
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            self.name,
            self.table,
            self.columns.join(", ")
        )
    }
}

/// A table definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: &'static str,
    pub columns: Vec<Column>,
    /// Integer primary key never reuses values of deleted rows.
    pub autoincrement: bool,
    /// Named composite indexes; single-column indexes come from [`Column::indexed`].
    pub indexes: Vec<Index>,
}

impl Table {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            columns: Vec::new(),
            autoincrement: false,
            indexes: Vec::new(),
        }
    }

    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    pub fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    pub fn index(mut self, name: &str, columns: &[&'static str]) -> Self {
        self.push_index(name, columns, false);
        self
    }

    pub fn unique_index(mut self, name: &str, columns: &[&'static str]) -> Self {
        self.push_index(name, columns, true);
        self
    }

    fn push_index(&mut self, name: &str, columns: &[&'static str], unique: bool) {
        self.indexes.push(Index {
            name: name.to_string(),
            table: self.name,
            columns: columns.to_vec(),
            unique,
        });
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Names of the primary key columns in declaration order.
    pub fn primary_key(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name)
            .collect()
    }

    /// Tables referenced by this table, excluding itself.
    pub fn dependencies(&self) -> Vec<&'static str> {
        let mut deps: Vec<&'static str> = Vec::new();
        for fk in self.columns.iter().filter_map(|c| c.references.as_ref()) {
            if fk.table != self.name && !deps.contains(&fk.table) {
                deps.push(fk.table);
            }
        }
        deps
    }

    /// All indexes of the table: named ones first, then single-column ones.
    pub fn all_indexes(&self) -> Vec<Index> {
        let mut indexes = self.indexes.clone();
        indexes.extend(self.columns.iter().filter(|c| c.indexed).map(|c| Index {
            name: format!("ix_{}_{}", self.name, c.name),
            table: self.name,
            columns: vec![c.name],
            unique: false,
        }));
        indexes
    }

    /// Returns the `CREATE TABLE` statement.
    ///
    /// A single integer primary key is declared inline so it aliases the
    /// rowid; composite keys become a table constraint.
    pub fn create_statement(&self) -> String {
        let primary_key = self.primary_key();
        let inline_pk = primary_key.len() == 1;

        let mut lines: Vec<String> = self
            .columns
            .iter()
            .map(|column| self.column_definition(column, inline_pk))
            .collect();
        if primary_key.len() > 1 {
            lines.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        }

        format!("CREATE TABLE {} (\n\t{}\n)", self.name, lines.join(",\n\t"))
    }

    fn column_definition(&self, column: &Column, inline_pk: bool) -> String {
        let mut def = format!("{} {}", column.name, column.sql_type);
        if column.nocase {
            def.push_str(" COLLATE NOCASE");
        }
        if !column.nullable {
            def.push_str(" NOT NULL");
        }
        if column.primary_key && inline_pk {
            def.push_str(" PRIMARY KEY");
            if self.autoincrement && column.sql_type == SqlType::Integer {
                def.push_str(" AUTOINCREMENT");
            }
        }
        if column.unique {
            def.push_str(" UNIQUE");
        }
        if let Some(default) = column.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        if let Some(fk) = &column.references {
            def.push_str(&format!(
                " REFERENCES {} ({}) {}",
                fk.table,
                fk.column,
                ForeignKey::CASCADE
            ));
        }
        def
    }
}

/// Database shape served by the exmdb server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Public store of a domain.
    Domain,
    /// Private store of a user.
    User,
}

impl Variant {
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Domain => "domain",
            Variant::User => "user",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A complete database description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    variant: Variant,
    tables: Vec<Table>,
}

impl Schema {
    /// Builds a schema from tables, rejecting duplicates and dangling references.
    pub fn from_tables(variant: Variant, tables: Vec<Table>) -> Result<Self, SchemaError> {
        let schema = Self { variant, tables };
        schema.validate()?;
        Ok(schema)
    }

    pub(crate) fn new_unchecked(variant: Variant, tables: Vec<Table>) -> Self {
        Self { variant, tables }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// Tables in declaration order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Result<&Table, SchemaError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| SchemaError::UnknownTable {
                table: name.to_string(),
            })
    }

    /// Checks that table names are unique and every reference resolves.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        for table in &self.tables {
            if !seen.insert(table.name) {
                return Err(SchemaError::DuplicateTable {
                    table: table.name.to_string(),
                });
            }
        }

        for table in &self.tables {
            for column in &table.columns {
                let Some(fk) = &column.references else {
                    continue;
                };
                let resolved = self
                    .tables
                    .iter()
                    .find(|t| t.name == fk.table)
                    .and_then(|t| t.get_column(fk.column))
                    .is_some();
                if !resolved {
                    return Err(SchemaError::DanglingReference {
                        table: table.name.to_string(),
                        column: column.name.to_string(),
                        target_table: fk.table.to_string(),
                        target_column: fk.column.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Tables ordered so that referenced tables precede their referrers.
    ///
    /// Reference cycles are broken at the cycle member with the most
    /// remaining referrers; that table is emitted before its own targets.
    pub fn creation_order(&self) -> Vec<&Table> {
        let mut remaining: Vec<&Table> = self.tables.iter().collect();
        let mut emitted: HashSet<&str> = HashSet::new();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let ready = remaining
                .iter()
                .position(|t| t.dependencies().iter().all(|d| emitted.contains(d)));

            let pos = match ready {
                Some(pos) => pos,
                None => {
                    let pos = break_cycle(&remaining, &emitted);
                    tracing::debug!(
                        "Breaking reference cycle at table {}",
                        remaining[pos].name
                    );
                    pos
                }
            };

            let table = remaining.remove(pos);
            emitted.insert(table.name);
            order.push(table);
        }
        order
    }

    /// Returns the `CREATE TABLE` and `CREATE INDEX` statements in creation order.
    pub fn ddl(&self) -> Vec<String> {
        let mut statements = Vec::new();
        for table in self.creation_order() {
            statements.push(table.create_statement());
            statements.extend(table.all_indexes().iter().map(Index::ddl));
        }
        statements
    }

    /// Returns the DDL as a single script.
    pub fn ddl_script(&self) -> String {
        let mut script = self.ddl().join(";\n");
        script.push_str(";\n");
        script
    }
}

/// Picks the position of the table to emit when no table is ready.
fn break_cycle(remaining: &[&Table], emitted: &HashSet<&str>) -> usize {
    let unresolved = |table: &Table| -> Vec<&'static str> {
        table
            .dependencies()
            .into_iter()
            .filter(|d| !emitted.contains(d))
            .collect()
    };

    let in_cycle = |start: &Table| -> bool {
        let mut stack = unresolved(start);
        let mut visited: HashSet<&str> = HashSet::new();
        while let Some(name) = stack.pop() {
            if name == start.name {
                return true;
            }
            if !visited.insert(name) {
                continue;
            }
            if let Some(table) = remaining.iter().find(|t| t.name == name) {
                stack.extend(unresolved(table));
            }
        }
        false
    };

    let referrers = |name: &'static str| -> usize {
        remaining
            .iter()
            .filter(|t| t.name != name && t.dependencies().contains(&name))
            .count()
    };

    let mut best: Option<(usize, usize)> = None;
    for (pos, table) in remaining.iter().enumerate() {
        if !in_cycle(table) {
            continue;
        }
        let score = referrers(table.name);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((pos, score));
        }
    }
    best.map_or(0, |(pos, _)| pos)
}
