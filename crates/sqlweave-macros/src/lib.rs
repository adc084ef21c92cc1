//! Procedural macros for sqlweave.
//!
//! `sqlweave-macros` is the **compile-time metadata layer**. `#[derive(Entity)]`
//! turns a plain struct into an `Entity` implementation whose static column
//! declarations feed the metadata resolver in `sqlweave-core`. The query
//! compiler never inspects types at runtime; everything it knows about a
//! table comes from the code generated here.

use proc_macro::TokenStream;

mod parse;
mod validate;

use parse::{EntityDef, FieldDef, parse_entity};

/// Derive macro for the `Entity` trait.
///
/// # Attributes
///
/// Struct level:
/// - `#[sqlweave(table = "name")]` - Override table name (defaults to the struct name)
/// - `#[sqlweave(schema = "name")]` - Schema qualifier
///
/// Field level:
/// - `#[sqlweave(column = "name")]` - Override column name
/// - `#[sqlweave(primary_key)]` - Mark as (part of) the primary key; implies not updatable
/// - `#[sqlweave(identity)]` - Database-generated value; implies not insertable
/// - `#[sqlweave(sequence = "SEQ")]` - Sequence feeding an identity column
/// - `#[sqlweave(db_type = "NVARCHAR(50)")]` - Explicit database type
/// - `#[sqlweave(skip_insert)]` / `#[sqlweave(skip_update)]`
/// - `#[sqlweave(insertable = bool)]` / `#[sqlweave(updatable = bool)]` - Override the defaults
/// - `#[sqlweave(skip)]` - Field is not mapped
///
/// # Example
///
/// ```ignore
/// use sqlweave::Entity;
///
/// #[derive(Entity)]
/// #[sqlweave(table = "Users")]
/// struct User {
///     #[sqlweave(primary_key, identity)]
///     id: Option<i64>,
///
///     #[sqlweave(column = "UserName")]
///     name: String,
///
///     age: Option<i32>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(sqlweave))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as syn::DeriveInput);

    let entity = match parse_entity(&input) {
        Ok(e) => e,
        Err(e) => return e.to_compile_error().into(),
    };

    if let Err(e) = validate::validate_entity(&entity) {
        return e.to_compile_error().into();
    }

    generate_entity_impl(&entity).into()
}

/// Generate the Entity trait implementation from a parsed definition.
fn generate_entity_impl(entity: &EntityDef) -> proc_macro2::TokenStream {
    let name = &entity.name;
    let type_name = name.to_string();
    let (impl_generics, ty_generics, where_clause) = entity.generics.split_for_impl();

    let table_ts = option_str(entity.table_name.as_deref());
    let schema_ts = option_str(entity.schema.as_deref());

    let column_infos: Vec<_> = entity.mapped_fields().map(generate_column_info).collect();
    let to_row = generate_to_row(entity);

    quote::quote! {
        impl #impl_generics sqlweave_core::Entity for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = #type_name;
            const TABLE_NAME: Option<&'static str> = #table_ts;
            const SCHEMA: Option<&'static str> = #schema_ts;

            fn columns() -> &'static [sqlweave_core::ColumnInfo] {
                static COLUMNS: &[sqlweave_core::ColumnInfo] = &[#(#column_infos),*];
                COLUMNS
            }

            fn to_row(&self) -> Vec<(&'static str, sqlweave_core::Value)> {
                #to_row
            }
        }
    }
}

fn option_str(value: Option<&str>) -> proc_macro2::TokenStream {
    match value {
        Some(v) => quote::quote! { Some(#v) },
        None => quote::quote! { None },
    }
}

/// Generate one `ColumnInfo` const expression.
///
/// Explicit `insertable`/`updatable` settings are applied last so they win
/// over the defaults implied by `primary_key` and `identity`.
fn generate_column_info(field: &FieldDef) -> proc_macro2::TokenStream {
    let property = field.property();
    let mut ts = quote::quote! { sqlweave_core::ColumnInfo::new(#property) };

    if let Some(column) = &field.column {
        ts = quote::quote! { #ts.column(#column) };
    }
    if field.primary_key {
        ts = quote::quote! { #ts.primary_key() };
    }
    if field.identity {
        ts = quote::quote! { #ts.identity() };
    }
    if let Some(sequence) = &field.sequence {
        ts = quote::quote! { #ts.sequence(#sequence) };
    }
    if let Some(db_type) = &field.db_type {
        ts = quote::quote! { #ts.db_type_opt(Some(#db_type)) };
    }
    if let Some(insertable) = field.insertable {
        ts = quote::quote! { #ts.insertable(#insertable) };
    }
    if let Some(updatable) = field.updatable {
        ts = quote::quote! { #ts.updatable(#updatable) };
    }
    ts
}

/// Generate the to_row method body.
fn generate_to_row(entity: &EntityDef) -> proc_macro2::TokenStream {
    let mut conversions = Vec::new();

    for field in entity.mapped_fields() {
        let field_name = &field.name;
        let property = field.property();

        if parse::is_option_type(&field.ty) {
            conversions.push(quote::quote! {
                (#property, match &self.#field_name {
                    Some(v) => sqlweave_core::Value::from(v.clone()),
                    None => sqlweave_core::Value::Null,
                })
            });
        } else {
            conversions.push(quote::quote! {
                (#property, sqlweave_core::Value::from(self.#field_name.clone()))
            });
        }
    }

    quote::quote! {
        vec![#(#conversions),*]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{DeriveInput, parse_quote};

    fn compact(ts: &proc_macro2::TokenStream) -> String {
        ts.to_string().replace(' ', "")
    }

    #[test]
    fn test_column_info_applies_overrides_last() {
        let input: DeriveInput = parse_quote! {
            struct Code {
                #[sqlweave(primary_key, updatable = true, column = "CodeNo")]
                code: String,
            }
        };
        let def = parse_entity(&input).unwrap();
        let field = def.mapped_fields().next().unwrap();
        assert_eq!(
            compact(&generate_column_info(field)),
            "sqlweave_core::ColumnInfo::new(\"code\").column(\"CodeNo\").primary_key().updatable(true)"
        );
    }

    #[test]
    fn test_to_row_maps_options_to_null() {
        let input: DeriveInput = parse_quote! {
            struct User {
                age: Option<i32>,
                name: String,
            }
        };
        let def = parse_entity(&input).unwrap();
        let body = compact(&generate_to_row(&def));
        assert!(body.contains("None=>sqlweave_core::Value::Null"));
        assert!(body.contains("(\"name\",sqlweave_core::Value::from(self.name.clone()))"));
    }

    #[test]
    fn test_impl_names_table_and_schema() {
        let input: DeriveInput = parse_quote! {
            #[sqlweave(table = "tb_user", schema = "dbo")]
            struct User {
                id: i64,
            }
        };
        let def = parse_entity(&input).unwrap();
        let out = compact(&generate_entity_impl(&def));
        assert!(out.contains("constTABLE_NAME:Option<&'staticstr>=Some(\"tb_user\")"));
        assert!(out.contains("constSCHEMA:Option<&'staticstr>=Some(\"dbo\")"));
        assert!(out.contains("constTYPE_NAME:&'staticstr=\"User\""));
    }
}
