//! Mutable per-compile state.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlweave_core::{EntityMetadata, Result, Value};

use crate::dialect::Dialect;
use crate::options::CompileOptions;

/// A bound parameter: generated name plus value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlParameter {
    /// Positional name (`p0`, `p1`, ...), without the dialect prefix
    pub name: String,
    pub value: Value,
}

/// Rows collected while translating an INSERT.
///
/// Columns are keyed by their position in entity metadata so the shared
/// column list always renders in declaration order.
#[derive(Debug, Default)]
pub(crate) struct InsertRows {
    columns: BTreeMap<usize, String>,
    rows: Vec<BTreeMap<usize, String>>,
}

impl InsertRows {
    pub(crate) fn push_row(&mut self, row: Vec<(usize, String, String)>) {
        let mut values = BTreeMap::new();
        for (position, column, fragment) in row {
            self.columns.entry(position).or_insert(column);
            values.insert(position, fragment);
        }
        self.rows.push(values);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Shared column list.
    pub(crate) fn column_list(&self) -> String {
        self.columns.values().cloned().collect::<Vec<_>>().join(",")
    }

    /// One value list per row; columns a row did not contribute are `NULL`.
    pub(crate) fn value_lists(&self) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .keys()
                    .map(|position| row.get(position).map_or("NULL", String::as_str))
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect()
    }
}

/// State for one compilation unit.
///
/// Created at the start of a builder's `build` and discarded once the SQL is
/// read out. Never shared between compiles.
#[derive(Debug)]
pub struct SqlBuildContext {
    buffer: String,
    parameters: Vec<SqlParameter>,
    aliases: HashMap<String, String>,
    next_alias: usize,
    options: CompileOptions,
    auto_alias: bool,
    default_entity: Option<Arc<EntityMetadata>>,
    negated: bool,
    operand: bool,
    pub(crate) insert_rows: InsertRows,
}

impl SqlBuildContext {
    pub fn new(options: CompileOptions) -> Self {
        Self {
            buffer: String::new(),
            parameters: Vec::new(),
            aliases: HashMap::new(),
            next_alias: 1,
            options,
            auto_alias: false,
            default_entity: None,
            negated: false,
            operand: false,
            insert_rows: InsertRows::default(),
        }
    }

    /// Set the entity used when a node carries no owner of its own.
    pub fn with_default_entity(mut self, entity: Arc<EntityMetadata>) -> Self {
        self.default_entity = Some(entity);
        self
    }

    /// Give unnamed table references generated aliases (`t1`, `t2`, ...).
    pub fn with_auto_alias(mut self, enabled: bool) -> Self {
        self.auto_alias = enabled;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn dialect(&self) -> Dialect {
        self.options.dialect
    }

    pub fn default_entity(&self) -> Option<&Arc<EntityMetadata>> {
        self.default_entity.as_ref()
    }

    // ==================== Buffer ====================

    pub fn push(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    pub fn sql(&self) -> &str {
        &self.buffer
    }

    /// Current end of the buffer.
    pub fn mark(&self) -> usize {
        self.buffer.len()
    }

    /// Drop everything written after `mark`.
    pub fn truncate(&mut self, mark: usize) {
        self.buffer.truncate(mark);
    }

    /// Remove and return everything written after `mark`.
    pub fn take_since(&mut self, mark: usize) -> String {
        self.buffer.split_off(mark)
    }

    /// Run `f` and return the text it wrote instead of keeping it in the
    /// buffer. Parameters it bound stay bound.
    pub fn capture(&mut self, f: impl FnOnce(&mut Self) -> Result<()>) -> Result<String> {
        let mark = self.mark();
        let outcome = f(self);
        let text = self.take_since(mark);
        outcome.map(|()| text)
    }

    /// Strip a trailing separator.
    pub fn trim_trailing(&mut self, separator: char) {
        if self.buffer.ends_with(separator) {
            self.buffer.pop();
        }
    }

    // ==================== Parameters ====================

    /// Bind a value and return its placeholder.
    pub fn add_parameter(&mut self, value: Value) -> String {
        let name = format!("p{}", self.parameters.len());
        let placeholder = self.dialect().placeholder(&name);
        self.parameters.push(SqlParameter { name, value });
        placeholder
    }

    /// Bind a value and write its placeholder.
    pub fn push_parameter(&mut self, value: Value) {
        let placeholder = self.add_parameter(value);
        self.push(&placeholder);
    }

    pub fn parameters(&self) -> &[SqlParameter] {
        &self.parameters
    }

    // ==================== Identifiers ====================

    /// Quote an identifier when formatting is enabled.
    pub fn quote<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.options.enable_format {
            Cow::Owned(self.dialect().quote_identifier(name))
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Table reference with its schema, quoted as configured.
    pub fn table_reference(&self, entity: &EntityMetadata) -> String {
        match &entity.schema {
            Some(schema) => format!("{}.{}", self.quote(schema), self.quote(&entity.table_name)),
            None => self.quote(&entity.table_name).into_owned(),
        }
    }

    /// Table reference followed by its alias, if it has one.
    pub fn aliased_table(&mut self, entity: &EntityMetadata) -> String {
        let alias = self.alias_for(entity, None);
        let table = self.table_reference(entity);
        if alias.is_empty() {
            table
        } else {
            format!("{}{}{}", table, self.dialect().alias_separator(), alias)
        }
    }

    /// Alias of a table, assigned on first reference and reused after.
    ///
    /// The first reference decides: its explicit name, a generated `tN` when
    /// auto aliasing is on, or the empty alias.
    pub fn alias_for(&mut self, entity: &EntityMetadata, name: Option<&str>) -> String {
        if let Some(alias) = self.aliases.get(&entity.table_name) {
            return alias.clone();
        }
        let alias = match name {
            Some(name) => name.to_string(),
            None if self.auto_alias => {
                let generated = format!("t{}", self.next_alias);
                self.next_alias += 1;
                generated
            }
            None => String::new(),
        };
        tracing::trace!(table = %entity.table_name, alias = %alias, "Assigned table alias");
        self.aliases
            .insert(entity.table_name.clone(), alias.clone());
        alias
    }

    /// Fix the alias of a table before translation starts.
    pub fn register_alias(&mut self, table: &str, alias: &str) {
        self.aliases.insert(table.to_string(), alias.to_string());
    }

    /// `alias.column`, or just `column` for the empty alias.
    pub fn qualified_column(&self, alias: &str, column: &str) -> String {
        let column = self.quote(column);
        if alias.is_empty() {
            column.into_owned()
        } else {
            format!("{alias}.{column}")
        }
    }

    // ==================== Translation state ====================

    /// Whether the current predicate is being emitted in negated form.
    pub fn negated(&self) -> bool {
        self.negated
    }

    /// Whether the current node is an operand (inside a comparison or a
    /// function argument) rather than a predicate.
    pub fn in_operand(&self) -> bool {
        self.operand
    }

    /// Run `f` with the given negation and operand flags, restoring the
    /// previous flags afterwards.
    pub fn scoped<T>(
        &mut self,
        negated: bool,
        operand: bool,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let saved = (self.negated, self.operand);
        self.negated = negated;
        self.operand = operand;
        let outcome = f(self);
        (self.negated, self.operand) = saved;
        outcome
    }

    /// Consume the context, returning SQL text and parameters.
    pub fn into_parts(self) -> (String, Vec<SqlParameter>) {
        (self.buffer, self.parameters)
    }
}
