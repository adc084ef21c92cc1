//! Parsing logic for the Entity derive macro.
//!
//! This module extracts struct-level and field-level attributes from the
//! derive input to build `EntityDef` and `FieldDef` structures used for
//! code generation.

use proc_macro2::Span;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Data, DeriveInput, Error, Field, Fields, Generics, Ident, Lit, Result, Type};

/// Parsed entity definition from a struct with `#[derive(Entity)]`.
#[derive(Debug)]
pub struct EntityDef {
    /// The struct name (e.g., `User`).
    pub name: Ident,
    /// Explicit table name, if overridden.
    pub table_name: Option<String>,
    /// Optional schema qualifier.
    pub schema: Option<String>,
    /// Parsed field definitions, including skipped ones.
    pub fields: Vec<FieldDef>,
    /// Generic parameters from the struct.
    pub generics: Generics,
}

/// Parsed field definition from a struct field.
#[derive(Debug)]
pub struct FieldDef {
    /// The Rust field name.
    pub name: Ident,
    /// Explicit column name, if overridden.
    pub column: Option<String>,
    /// The Rust type of the field.
    pub ty: Type,
    pub primary_key: bool,
    pub identity: bool,
    /// Sequence feeding the identity value.
    pub sequence: Option<String>,
    /// Explicit database type (e.g. `"NVARCHAR(50)"`).
    pub db_type: Option<String>,
    /// Explicit insert eligibility; `None` applies the defaults.
    pub insertable: Option<bool>,
    /// Explicit update eligibility; `None` applies the defaults.
    pub updatable: Option<bool>,
    /// Field is not mapped at all.
    pub skip: bool,
}

impl EntityDef {
    /// Fields that map to columns.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &FieldDef> {
        self.fields.iter().filter(|f| !f.skip)
    }
}

impl FieldDef {
    /// The property name as written in metadata (raw identifiers unwrapped).
    pub fn property(&self) -> String {
        self.name.unraw().to_string()
    }

    /// The column name after applying the override.
    pub fn column_name(&self) -> String {
        self.column.clone().unwrap_or_else(|| self.property())
    }
}

/// Parse a `#[derive(Entity)]` input.
pub fn parse_entity(input: &DeriveInput) -> Result<EntityDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();

    let StructAttrs { table_name, schema } = parse_struct_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => parse_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Entity can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Entity can only be derived for structs, not unions",
            ));
        }
    };

    Ok(EntityDef {
        name,
        table_name,
        schema,
        fields,
        generics,
    })
}

/// Parsed struct-level attributes result.
struct StructAttrs {
    table_name: Option<String>,
    schema: Option<String>,
}

/// Parse struct-level `#[sqlweave(...)]` attributes.
///
/// Supported keys:
/// - `table = "name"` (overrides the type name)
/// - `schema = "name"`
fn parse_struct_attrs(attrs: &[Attribute]) -> Result<StructAttrs> {
    let mut table_name: Option<String> = None;
    let mut schema: Option<String> = None;

    for attr in attrs {
        if !attr.path().is_ident("sqlweave") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                set_once(&meta, &mut table_name, "table")
            } else if meta.path.is_ident("schema") {
                set_once(&meta, &mut schema, "schema")
            } else {
                Err(Error::new_spanned(
                    meta.path,
                    "unknown sqlweave struct attribute (supported: table, schema)",
                ))
            }
        })?;
    }

    Ok(StructAttrs { table_name, schema })
}

fn parse_fields(fields: &Fields) -> Result<Vec<FieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_field).collect(),
        Fields::Unnamed(_) => Err(Error::new(
            Span::call_site(),
            "Entity requires a struct with named fields, not a tuple struct",
        )),
        Fields::Unit => Err(Error::new(
            Span::call_site(),
            "Entity requires a struct with fields, not a unit struct",
        )),
    }
}

/// Parse a single field and its attributes.
fn parse_field(field: &Field) -> Result<FieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let attrs = parse_field_attrs(&field.attrs)?;
    validate_field_attrs(&attrs, &name)?;

    Ok(FieldDef {
        name,
        column: attrs.column,
        ty: field.ty.clone(),
        primary_key: attrs.primary_key,
        identity: attrs.identity,
        sequence: attrs.sequence,
        db_type: attrs.db_type,
        insertable: attrs.insertable,
        updatable: attrs.updatable,
        skip: attrs.skip,
    })
}

/// Intermediate struct for collecting field attributes.
#[derive(Default)]
struct FieldAttrs {
    column: Option<String>,
    primary_key: bool,
    identity: bool,
    sequence: Option<String>,
    db_type: Option<String>,
    insertable: Option<bool>,
    updatable: Option<bool>,
    skip: bool,
    skip_insert: bool,
    skip_update: bool,
}

/// Parse all `#[sqlweave(...)]` attributes on a field.
fn parse_field_attrs(attrs: &[Attribute]) -> Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("sqlweave") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            let path = &meta.path;

            if path.is_ident("primary_key") {
                result.primary_key = true;
            } else if path.is_ident("identity") {
                result.identity = true;
            } else if path.is_ident("skip") {
                result.skip = true;
            } else if path.is_ident("skip_insert") {
                result.skip_insert = true;
                result.insertable = Some(false);
            } else if path.is_ident("skip_update") {
                result.skip_update = true;
                result.updatable = Some(false);
            } else if path.is_ident("column") {
                set_once(&meta, &mut result.column, "column")?;
            } else if path.is_ident("sequence") {
                set_once(&meta, &mut result.sequence, "sequence")?;
            } else if path.is_ident("db_type") {
                set_once(&meta, &mut result.db_type, "db_type")?;
            } else if path.is_ident("insertable") {
                result.insertable = Some(parse_bool(&meta, "insertable")?);
            } else if path.is_ident("updatable") {
                result.updatable = Some(parse_bool(&meta, "updatable")?);
            } else {
                return Err(Error::new_spanned(
                    path,
                    "unknown sqlweave field attribute (supported: column, primary_key, identity, \
                     sequence, db_type, skip_insert, skip_update, insertable, updatable, skip)",
                ));
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Read `key = "value"` into a slot, rejecting duplicates.
fn set_once(meta: &ParseNestedMeta<'_>, slot: &mut Option<String>, key: &str) -> Result<()> {
    if slot.is_some() {
        return Err(Error::new_spanned(
            &meta.path,
            format!("duplicate sqlweave attribute: {key}"),
        ));
    }
    let value: Lit = meta.value()?.parse()?;
    if let Lit::Str(lit_str) = value {
        *slot = Some(lit_str.value());
        Ok(())
    } else {
        Err(Error::new_spanned(
            value,
            format!("expected string literal for {key}"),
        ))
    }
}

fn parse_bool(meta: &ParseNestedMeta<'_>, key: &str) -> Result<bool> {
    let value: Lit = meta.value()?.parse()?;
    if let Lit::Bool(lit_bool) = value {
        Ok(lit_bool.value)
    } else {
        Err(Error::new_spanned(
            value,
            format!("expected `true` or `false` for {key}"),
        ))
    }
}

/// Validate that attribute combinations make sense.
fn validate_field_attrs(attrs: &FieldAttrs, field_name: &Ident) -> Result<()> {
    if attrs.skip && attrs.primary_key {
        return Err(Error::new_spanned(
            field_name,
            "cannot use both `skip` and `primary_key` on the same field",
        ));
    }

    if attrs.skip && (attrs.skip_insert || attrs.skip_update) {
        return Err(Error::new_spanned(
            field_name,
            "`skip` already excludes the field from all operations; \
             `skip_insert` and `skip_update` are redundant",
        ));
    }

    if attrs.sequence.is_some() && !attrs.identity {
        return Err(Error::new_spanned(
            field_name,
            "`sequence` names the generator of an identity column; add `identity`",
        ));
    }

    Ok(())
}

/// Check if a type is `Option<T>`.
pub fn is_option_type(ty: &Type) -> bool {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            return segment.ident == "Option";
        }
    }
    false
}
