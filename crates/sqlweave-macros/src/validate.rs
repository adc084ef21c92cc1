//! Compile-time validation for the Entity derive macro.
//!
//! Problems are collected and reported together rather than stopping at the
//! first one.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{Error, GenericArgument, PathArguments, Type};

use crate::parse::{EntityDef, FieldDef};

/// Validate a parsed entity definition.
pub fn validate_entity(entity: &EntityDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    validate_has_fields(entity, &mut errors);
    if let Some(table) = &entity.table_name {
        validate_identifier("table", table, entity.name.span(), &mut errors);
    }
    if let Some(schema) = &entity.schema {
        validate_identifier("schema", schema, entity.name.span(), &mut errors);
    }
    validate_no_duplicate_columns(entity, &mut errors);

    for field in entity.mapped_fields() {
        validate_field(field, &mut errors);
    }

    if entity.mapped_fields().filter(|f| f.identity).count() > 1 {
        errors.push(Error::new(
            entity.name.span(),
            "an entity can declare at most one identity column",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        let mut combined = errors.remove(0);
        for err in errors {
            combined.combine(err);
        }
        Err(combined)
    }
}

/// Validate that at least one field is mapped.
fn validate_has_fields(entity: &EntityDef, errors: &mut Vec<Error>) {
    if entity.mapped_fields().next().is_none() {
        errors.push(Error::new(
            entity.name.span(),
            "Entity struct must map at least one field",
        ));
    }
}

/// Validate that a table/schema name doesn't contain SQL injection characters.
fn validate_identifier(what: &str, name: &str, span: Span, errors: &mut Vec<Error>) {
    const DANGEROUS_CHARS: &[char] = &[';', '\'', '"', '`', '-', '/', '*', '\\', '\0', '\n', '\r'];

    if let Some(ch) = name.chars().find(|ch| DANGEROUS_CHARS.contains(ch)) {
        errors.push(Error::new(
            span,
            format!(
                "{what} name contains invalid character '{ch}'; \
                 names should only contain alphanumeric characters and underscores"
            ),
        ));
        return;
    }

    if name.trim().is_empty() {
        errors.push(Error::new(span, format!("{what} name cannot be empty or whitespace")));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_alphabetic() && first != '_' {
            errors.push(Error::new(
                span,
                format!("{what} name must start with a letter or underscore, got '{first}'"),
            ));
        }
    }
}

/// Validate that no two mapped fields resolve to the same column name.
fn validate_no_duplicate_columns(entity: &EntityDef, errors: &mut Vec<Error>) {
    let mut seen_columns: HashSet<String> = HashSet::new();

    for field in entity.mapped_fields() {
        let column = field.column_name();
        if !seen_columns.insert(column.clone()) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate column name '{}'; another field already maps to this column",
                    column
                ),
            ));
        }
    }
}

fn validate_field(field: &FieldDef, errors: &mut Vec<Error>) {
    let span = field.name.span();

    if is_nested_option(&field.ty) {
        errors.push(Error::new(
            span,
            "nested Option<Option<T>> is ambiguous and not supported; \
             use a single Option<T> or a custom type",
        ));
    }

    if matches!(field.ty, Type::Reference(_)) {
        errors.push(Error::new(
            span,
            "reference types (&T) are not supported; use owned types instead",
        ));
    }

    if let Some(column) = &field.column {
        validate_identifier("column", column, span, errors);
    }
}

/// Check if a type is Option<Option<T>> (nested Option).
fn is_nested_option(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        return false;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Option" {
        return false;
    }
    if let PathArguments::AngleBracketed(args) = &segment.arguments {
        if let Some(GenericArgument::Type(Type::Path(inner_path))) = args.args.first() {
            if let Some(inner_seg) = inner_path.path.segments.last() {
                return inner_seg.ident == "Option";
            }
        }
    }
    false
}
