//! Derive macros for tessera table definitions.
//!
//! This crate provides the `#[derive(Table)]` macro, which turns a struct into
//! a table row type with typed column references.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr, Meta,
    Path, PathArguments, Type,
};

/// Derives the `Table` trait for a struct, generating typed column references.
///
/// # Attributes
///
/// - `#[table(name = "TABLE_NAME")]` - Specifies the SQL table name (optional,
///   defaults to the database's naming strategy applied to the struct name)
/// - `#[table(schema = "SCHEMA")]` - Specifies the schema (optional, defaults
///   to the database's default schema)
///
/// # Field Attributes
///
/// - `#[column(primary_key)]` - Marks the field as part of the primary key
/// - `#[column(name = "COLUMN_NAME")]` - Specifies the SQL column name
/// - `#[column(nullable)]` - Marks the column as nullable; `Option` fields
///   are nullable without it
/// - `#[column(references = "Parent::field")]` - Declares a foreign key
///   column referencing a field of another table
/// - `#[column(foreign_key = "FK_NAME")]` - Names the foreign key; columns
///   sharing a name form one composite key
///
/// # Generated Items
///
/// For a struct `Salesperson`, this macro generates:
///
/// - `impl Table for Salesperson` with the static metadata and `from_row`
/// - `SalespersonColumns` - A module containing one column type per field
///   (`Id`, `FirstName`, etc.)
/// - Associated functions `Salesperson::first_name()` returning an unresolved
///   `ColumnRef` for each field
#[proc_macro_derive(Table, attributes(table, column))]
pub fn derive_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    derive_table_impl(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn derive_table_impl(input: DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Table derive does not support generic structs",
        ));
    }
    let table_attrs = parse_table_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Table derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Table derive only supports structs",
            ));
        }
    };

    // Collect field information
    let mut column_infos: Vec<ColumnInfo> = Vec::new();
    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "expected a named field"));
        };
        let column_attrs = parse_column_attrs(&field.attrs)?;

        column_infos.push(ColumnInfo {
            field_name: field_name.clone(),
            field_type: field.ty.clone(),
            column_name: column_attrs.name,
            is_primary_key: column_attrs.primary_key,
            is_nullable: column_attrs.nullable || is_option(&field.ty),
            references: column_attrs.references,
            foreign_key: column_attrs.foreign_key,
        });
    }

    let columns_mod_name = format_ident!("{}Columns", struct_name);
    let column_type_names: Vec<Ident> = column_infos
        .iter()
        .map(|c| format_ident!("{}", to_pascal_case(&c.field_name.to_string())))
        .collect();

    // Generate column structs
    let column_structs: Vec<TokenStream2> = column_infos
        .iter()
        .zip(column_type_names.iter())
        .map(|(info, type_name)| {
            let property = info.field_name.to_string();
            let field_type = &info.field_type;
            let column_name = option_str(info.column_name.as_deref());
            let is_nullable = info.is_nullable;
            let is_primary_key = info.is_primary_key;

            quote! {
                /// Column type for typed column references.
                #[derive(Debug, Clone, Copy)]
                pub struct #type_name;

                impl ::tessera_core::schema::Column for #type_name {
                    type Table = super::#struct_name;
                    type Type = #field_type;

                    const PROPERTY: &'static str = #property;
                    const NAME: Option<&'static str> = #column_name;
                    const NULLABLE: bool = #is_nullable;
                    const PRIMARY_KEY: bool = #is_primary_key;
                }
            }
        })
        .collect();

    // Generate column accessor functions
    let column_accessors: Vec<TokenStream2> = column_infos
        .iter()
        .zip(column_type_names.iter())
        .map(|(info, type_name)| {
            let method_name = &info.field_name;
            quote! {
                /// Returns an unresolved reference to this column.
                #[inline]
                #[must_use]
                pub const fn #method_name() -> ::tessera_core::expr::ColumnRef<#columns_mod_name::#type_name> {
                    ::tessera_core::expr::ColumnRef::unresolved()
                }
            }
        })
        .collect();

    // Generate ColumnSchema entries
    let schema_entries: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let property = info.field_name.to_string();
            let column_name = option_str(info.column_name.as_deref());
            let is_nullable = info.is_nullable;
            let is_primary_key = info.is_primary_key;

            quote! {
                ::tessera_core::schema::ColumnSchema {
                    property: #property,
                    name: #column_name,
                    nullable: #is_nullable,
                    primary_key: #is_primary_key,
                }
            }
        })
        .collect();

    let foreign_keys = foreign_key_entries(&column_infos)?;

    let field_reads: Vec<TokenStream2> = column_infos
        .iter()
        .map(|info| {
            let field_name = &info.field_name;
            let property = field_name.to_string();
            quote! { #field_name: reader.get(#property)? }
        })
        .collect();

    let type_name = struct_name.to_string();
    let table_name = option_str(table_attrs.name.as_deref());
    let schema = option_str(table_attrs.schema.as_deref());

    let mod_doc = format!("Column types for the `{struct_name}` table.");

    let expanded = quote! {
        #[doc = #mod_doc]
        #[allow(non_snake_case)]
        pub mod #columns_mod_name {
            #[allow(unused_imports)]
            use super::*;

            #(#column_structs)*
        }

        impl ::tessera_core::schema::Table for #struct_name {
            const TYPE_NAME: &'static str = #type_name;
            const NAME: Option<&'static str> = #table_name;
            const SCHEMA: Option<&'static str> = #schema;
            const COLUMNS: &'static [::tessera_core::schema::ColumnSchema] = &[
                #(#schema_entries),*
            ];
            const FOREIGN_KEYS: &'static [::tessera_core::schema::ForeignKeySchema] = &[
                #(#foreign_keys),*
            ];

            fn from_row(
                reader: &::tessera_core::row::RowReader<'_>,
            ) -> ::tessera_core::error::Result<Self> {
                Ok(Self {
                    #(#field_reads),*
                })
            }
        }

        impl #struct_name {
            #(#column_accessors)*
        }
    };

    Ok(expanded)
}

struct ColumnInfo {
    field_name: Ident,
    field_type: Type,
    column_name: Option<String>,
    is_primary_key: bool,
    is_nullable: bool,
    references: Option<(Path, Ident)>,
    foreign_key: Option<String>,
}

#[derive(Default)]
struct TableAttrs {
    name: Option<String>,
    schema: Option<String>,
}

#[derive(Default)]
struct ColumnAttrs {
    name: Option<String>,
    primary_key: bool,
    nullable: bool,
    references: Option<(Path, Ident)>,
    foreign_key: Option<String>,
}

fn parse_table_attrs(attrs: &[Attribute]) -> syn::Result<TableAttrs> {
    let mut result = TableAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    result.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("schema") {
                    result.schema = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    return Err(meta.error("unknown table attribute"));
                }
                Ok(())
            })?;
        }
    }
    Ok(result)
}

fn parse_column_attrs(attrs: &[Attribute]) -> syn::Result<ColumnAttrs> {
    let mut result = ColumnAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("column") {
            // Handle empty attribute like #[column]
            if matches!(attr.meta, Meta::Path(_)) {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("primary_key") {
                    result.primary_key = true;
                } else if meta.path.is_ident("nullable") {
                    result.nullable = true;
                } else if meta.path.is_ident("name") {
                    result.name = Some(meta.value()?.parse::<LitStr>()?.value());
                } else if meta.path.is_ident("references") {
                    let lit = meta.value()?.parse::<LitStr>()?;
                    result.references = Some(parse_reference(&lit)?);
                } else if meta.path.is_ident("foreign_key") {
                    result.foreign_key = Some(meta.value()?.parse::<LitStr>()?.value());
                } else {
                    return Err(meta.error("unknown column attribute"));
                }
                Ok(())
            })?;
        }
    }

    if result.foreign_key.is_some() && result.references.is_none() {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`foreign_key` requires `references`",
        ));
    }
    Ok(result)
}

/// Splits `"path::to::Parent::field"` into the parent type path and field.
fn parse_reference(lit: &LitStr) -> syn::Result<(Path, Ident)> {
    let mut path: Path = lit.parse()?;
    let Some(field) = path.segments.pop() else {
        return Err(syn::Error::new_spanned(lit, "expected `Parent::field`"));
    };
    let field = field.into_value().ident;
    if path.segments.is_empty() {
        return Err(syn::Error::new_spanned(lit, "expected `Parent::field`"));
    }
    // Drop the trailing `::` left by the pop
    let parent = Path {
        leading_colon: path.leading_colon,
        segments: path.segments.into_pairs().map(syn::punctuated::Pair::into_value).collect(),
    };
    Ok((parent, field))
}

/// Groups referencing columns into keys: by key name when given, otherwise
/// by referenced table.
fn foreign_key_entries(columns: &[ColumnInfo]) -> syn::Result<Vec<TokenStream2>> {
    struct Key<'a> {
        name: Option<&'a str>,
        parent: &'a Path,
        parent_key: String,
        pairs: Vec<(String, String)>,
    }

    let mut keys: Vec<Key<'_>> = Vec::new();
    for info in columns {
        let Some((parent, parent_field)) = &info.references else {
            continue;
        };
        let parent_key = quote!(#parent).to_string();
        let name = info.foreign_key.as_deref();
        let pair = (info.field_name.to_string(), parent_field.to_string());

        let existing = keys.iter_mut().find(|k| match (k.name, name) {
            (Some(a), Some(b)) => a == b,
            (None, None) => k.parent_key == parent_key,
            _ => false,
        });
        match existing {
            Some(key) if key.parent_key != parent_key => {
                return Err(syn::Error::new_spanned(
                    &info.field_name,
                    "columns of one foreign key must reference the same table",
                ));
            }
            Some(key) => key.pairs.push(pair),
            None => keys.push(Key {
                name,
                parent,
                parent_key,
                pairs: vec![pair],
            }),
        }
    }

    Ok(keys
        .iter()
        .map(|key| {
            let name = option_str(key.name);
            let parent = key.parent;
            let parent_name = key
                .parent
                .segments
                .last()
                .map(|s| s.ident.to_string())
                .unwrap_or_default();
            let pairs = key.pairs.iter().map(|(child, parent)| quote! { (#child, #parent) });
            quote! {
                ::tessera_core::schema::ForeignKeySchema {
                    name: #name,
                    parent_name: #parent_name,
                    parent: ::std::any::TypeId::of::<#parent>,
                    columns: &[#(#pairs),*],
                }
            }
        })
        .collect())
}

fn option_str(value: Option<&str>) -> TokenStream2 {
    match value {
        Some(value) => quote! { Some(#value) },
        None => quote! { None },
    }
}

fn is_option(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|segment| {
        segment.ident == "Option"
            && matches!(
                &segment.arguments,
                PathArguments::AngleBracketed(args)
                    if matches!(args.args.first(), Some(GenericArgument::Type(_)))
            )
    })
}

fn to_pascal_case(s: &str) -> String {
    let mut result = String::new();
    let mut capitalize_next = true;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("first_name"), "FirstName");
        assert_eq!(to_pascal_case("id"), "Id");
    }

    #[test]
    fn test_is_option() {
        let ty: Type = syn::parse_quote!(Option<String>);
        assert!(is_option(&ty));
        let ty: Type = syn::parse_quote!(std::option::Option<i64>);
        assert!(is_option(&ty));
        let ty: Type = syn::parse_quote!(String);
        assert!(!is_option(&ty));
    }

    #[test]
    fn test_parse_reference() {
        let lit: LitStr = syn::parse_quote!("Manufacturer::id");
        let (parent, field) = parse_reference(&lit).unwrap();
        assert_eq!(quote!(#parent).to_string(), "Manufacturer");
        assert_eq!(field.to_string(), "id");

        let lit: LitStr = syn::parse_quote!("id");
        assert!(parse_reference(&lit).is_err());
    }
}
