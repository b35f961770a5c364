//! Statement compiler
//!
//! Turns a model's accumulated clauses into parameterized statement text.
//! Identifiers are always quoted, every scalar filter value travels as a
//! named `:param`, and list values are inlined as quoted literals.

use crate::backend::Row;
use crate::errors::{ModelhausError, Result};
use crate::field_definition::FieldDefinition;
use crate::model::ModelDefinition;
use crate::query_builder::filter::Filter;
use crate::query_builder::query::{Parameters, Query};
use crate::query_builder::state::QueryNode;
use crate::validation::{qualified, quote_identifier, quote_literal};
use serde_json::Value;
use type_mapping::value_to_text;

pub struct Slang;

/// A model taking part in a search, with the name its clauses refer to
struct Scope<'a> {
    node: &'a QueryNode,
    reference: String,
}

impl Slang {
    /// Compile a search over `root` and its joined models.
    ///
    /// Clauses are gathered pre-order: the root model's own clauses first,
    /// then each joined model's, depth-first. Joined tables are aliased
    /// `<table>_j<n>` in the same order.
    pub fn search(root: &QueryNode, max_join_depth: usize) -> Result<Query> {
        let scopes = Self::collect_scopes(root, max_join_depth)?;
        let table = root.definition.table();

        let select = if root.state.fields.is_empty() {
            "*".to_string()
        } else {
            root.state
                .fields
                .iter()
                .map(|f| qualified(table, &f.name))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut text = format!("SELECT {} FROM {}", select, quote_identifier(table));

        for scope in scopes.iter().skip(1) {
            let definition = &scope.node.definition;
            text.push_str(&format!(
                " JOIN {} AS {} USING ({})",
                quote_identifier(definition.table()),
                quote_identifier(&scope.reference),
                quote_identifier(definition.primary_key())
            ));
        }

        let mut parameters = Parameters::new();
        text.push_str(&Self::where_clause(
            scopes
                .iter()
                .map(|s| (s.reference.as_str(), s.node.state.filters.as_slice())),
            &mut parameters,
        ));

        let orders: Vec<String> = scopes
            .iter()
            .flat_map(|scope| {
                scope.node.state.orders.iter().map(move |order| {
                    format!(
                        "{} {}",
                        qualified(&scope.reference, &order.field_name),
                        order.direction.to_sql()
                    )
                })
            })
            .collect();
        if !orders.is_empty() {
            text.push_str(" ORDER BY ");
            text.push_str(&orders.join(", "));
        }

        // OFFSET is only meaningful together with LIMIT
        if let Some(limit) = root.state.limit.filter(|l| l.value() > 0) {
            text.push_str(&format!(" LIMIT {}", limit.value()));
            if let Some(offset) = root.state.offset.filter(|o| o.value() > 0) {
                text.push_str(&format!(" OFFSET {}", offset.value()));
            }
        }

        Ok(Query::new(text, parameters))
    }

    /// `INSERT` of every writable field present in `data`
    pub fn insert(definition: &ModelDefinition, data: &Row) -> Query {
        let table = quote_identifier(definition.table());
        let mut parameters = Parameters::new();
        let mut columns = Vec::new();
        let mut placeholders = Vec::new();

        for (field, value) in Self::writable_values(definition, data) {
            let key = parameters.bind(
                &format!("SETFIELD_{}", field.name),
                Self::storage_value(value),
                Some(field.data_type),
            );
            columns.push(quote_identifier(&field.name));
            placeholders.push(format!(":{}", key));
        }

        if columns.is_empty() {
            return Query::new(format!("INSERT INTO {} DEFAULT VALUES", table), parameters);
        }

        Query::new(
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(", "),
                placeholders.join(", ")
            ),
            parameters,
        )
    }

    /// `UPDATE` of every writable field present in `data`, restricted by the
    /// primary-key filter. Fails when there is nothing to write.
    pub fn update(definition: &ModelDefinition, primary: &Filter, data: &Row) -> Result<Query> {
        let mut parameters = Parameters::new();
        let mut assignments = Vec::new();

        for (field, value) in Self::writable_values(definition, data) {
            let key = parameters.bind(
                &format!("SETFIELD_{}", field.name),
                Self::storage_value(value),
                Some(field.data_type),
            );
            assignments.push(format!("{} = :{}", quote_identifier(&field.name), key));
        }

        if assignments.is_empty() {
            return Err(ModelhausError::QueryCompilation(format!(
                "no writable fields to update on '{}'",
                definition.table()
            )));
        }

        let mut text = format!(
            "UPDATE {} SET {}",
            quote_identifier(definition.table()),
            assignments.join(", ")
        );
        text.push_str(&Self::where_clause(
            [(definition.table(), std::slice::from_ref(primary))],
            &mut parameters,
        ));

        Ok(Query::new(text, parameters))
    }

    pub fn delete(definition: &ModelDefinition, filters: &[Filter]) -> Query {
        let mut parameters = Parameters::new();
        let mut text = format!("DELETE FROM {}", quote_identifier(definition.table()));
        text.push_str(&Self::where_clause(
            [(definition.table(), filters)],
            &mut parameters,
        ));
        Query::new(text, parameters)
    }

    /// Fields written by insert/update: present in `data`, declared, and
    /// neither the primary key nor an audit stamp
    pub fn writable_values<'a, 'd>(
        definition: &'a ModelDefinition,
        data: &'d Row,
    ) -> Vec<(&'a FieldDefinition, &'d Value)> {
        definition
            .fields()
            .iter()
            .filter(|f| f.name != definition.primary_key() && !definition.is_audit_field(&f.name))
            .filter_map(|f| data.get(&f.name).map(|value| (f, value)))
            .collect()
    }

    fn collect_scopes(root: &QueryNode, max_join_depth: usize) -> Result<Vec<Scope<'_>>> {
        let mut scopes = vec![Scope {
            node: root,
            reference: root.definition.table().to_string(),
        }];
        let mut counter = 0;
        Self::collect_joined(root, 1, max_join_depth, &mut counter, &mut scopes)?;
        Ok(scopes)
    }

    fn collect_joined<'a>(
        node: &'a QueryNode,
        depth: usize,
        max_join_depth: usize,
        counter: &mut usize,
        scopes: &mut Vec<Scope<'a>>,
    ) -> Result<()> {
        for joined in &node.state.joined {
            if depth > max_join_depth {
                return Err(ModelhausError::QueryCompilation(format!(
                    "joined models nest deeper than {} levels",
                    max_join_depth
                )));
            }

            *counter += 1;
            scopes.push(Scope {
                node: joined,
                reference: format!("{}_j{}", joined.definition.table(), counter),
            });
            Self::collect_joined(joined, depth + 1, max_join_depth, counter, scopes)?;
        }
        Ok(())
    }

    fn where_clause<'a>(
        groups: impl IntoIterator<Item = (&'a str, &'a [Filter])>,
        parameters: &mut Parameters,
    ) -> String {
        let mut clause = String::from(" WHERE TRUE");
        for (reference, filters) in groups {
            for filter in filters {
                clause.push_str(" AND ");
                clause.push_str(&Self::condition(reference, filter, parameters));
            }
        }
        clause
    }

    fn condition(reference: &str, filter: &Filter, parameters: &mut Parameters) -> String {
        let column = qualified(reference, filter.field_name());

        match filter.rendered_value() {
            Value::Array(items) => format!("{} IN ({})", column, Self::literal_list(&items)),
            _ if filter.matches_null() => format!("{} IS NULL", column),
            value => {
                let key = parameters.bind(
                    &format!("{}_FILTER_{}", reference, filter.field_name()),
                    value,
                    Some(filter.data_type()),
                );
                format!("{} {} :{}", column, filter.operator_token(), key)
            }
        }
    }

    fn literal_list(items: &[Value]) -> String {
        // IN () is not valid SQL; IN (NULL) matches nothing
        if items.is_empty() {
            return "NULL".to_string();
        }

        items
            .iter()
            .map(|item| match item {
                Value::Null => "NULL".to_string(),
                other => quote_literal(&value_to_text(other)),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Structured values are stored as JSON text
    fn storage_value(value: &Value) -> Value {
        match value {
            Value::Object(_) | Value::Array(_) => Value::String(value.to_string()),
            other => other.clone(),
        }
    }
}
