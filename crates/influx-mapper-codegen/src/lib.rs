// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, LitStr,
    PathArguments, Type,
};

/// How a field type is bound to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    /// bool, i32, i64, f64, String, DateTime<Utc> (optionally wrapped in Option)
    Supported,
    /// Any other type: kept in the schema, rejected when encoded or decoded
    Unsupported,
}

/// Type-level `#[measurement(...)]` options.
#[derive(Default)]
struct MeasurementAttr {
    name: Option<LitStr>,
    database: Option<LitStr>,
    retention_policy: Option<LitStr>,
    time_unit: Option<TokenStream2>,
}

/// Field-level `#[column(...)]` options.
#[derive(Default)]
struct ColumnAttr {
    name: Option<LitStr>,
    tag: bool,
}

/// `#[derive(Measurement)]` macro: generates the `Measurement` impl describing
/// the measurement, destination and columns of a struct.
///
/// Only fields carrying `#[column]` are mapped. The column name defaults to
/// the field name.
///
/// Example:
/// ```ignore
/// use influx_mapper::Measurement;
///
/// #[derive(Default, Measurement)]
/// #[measurement(name = "cpu", database = "telegraf", time_unit = "seconds")]
/// struct Cpu {
///     #[column(tag)]
///     host: String,
///     #[column(name = "usage_idle")]
///     idle: f64,
///     #[column]
///     time: Option<DateTime<Utc>>,
///     scratch: Vec<u8>,    // not mapped
/// }
/// ```
#[proc_macro_derive(Measurement, attributes(measurement, column))]
pub fn derive_measurement(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(f) => &f.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Measurement requires a struct with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Measurement can only be derived for structs",
            ))
        }
    };

    let options = parse_measurement_attr(&input.attrs)?;

    let mut columns = Vec::new();
    for field in fields {
        let Some(attr) = field.attrs.iter().find(|a| a.path().is_ident("column")) else {
            continue;
        };
        let Some(field_name) = field.ident.as_ref() else {
            return Err(syn::Error::new_spanned(field, "Field must have a name"));
        };
        let column = parse_column_attr(attr)?;
        let attribute = field_name.to_string();
        let column_name = column
            .name
            .map_or_else(|| attribute.clone(), |lit| lit.value());
        let ty = &field.ty;
        let tag = column.tag;

        let def = match classify(ty) {
            FieldKind::Supported => {
                let ctor = if tag {
                    quote! { tag }
                } else {
                    quote! { field }
                };
                quote! {
                    ::influx_mapper::ColumnDef::<Self>::#ctor::<#ty>(
                        #column_name,
                        #attribute,
                        |record: &Self| -> ::core::option::Option<::influx_mapper::Value> {
                            ::influx_mapper::ColumnValue::to_value(&record.#field_name)
                        },
                        |record: &mut Self, value: ::influx_mapper::Value|
                            -> ::core::result::Result<(), ::influx_mapper::Value> {
                            record.#field_name =
                                <#ty as ::influx_mapper::ColumnValue>::from_value(value)?;
                            ::core::result::Result::Ok(())
                        },
                    )
                }
            }
            FieldKind::Unsupported => quote! {
                ::influx_mapper::ColumnDef::<Self>::unsupported(
                    #column_name,
                    #attribute,
                    ::core::any::type_name::<#ty>(),
                    #tag,
                )
            },
        };
        columns.push(def);
    }

    let measurement = options.name.map(|lit| quote! { .measurement(#lit) });
    let database = options.database.map(|lit| quote! { .database(#lit) });
    let retention_policy = options
        .retention_policy
        .map(|lit| quote! { .retention_policy(#lit) });
    let time_unit = options
        .time_unit
        .map(|unit| quote! { .time_unit(::influx_mapper::TimeUnit::#unit) });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::influx_mapper::Measurement for #name #ty_generics #where_clause {
            fn describe() -> ::influx_mapper::TypeMetadata<Self> {
                ::influx_mapper::TypeMetadata::<Self>::new(::core::any::type_name::<Self>())
                    #measurement
                    #database
                    #retention_policy
                    #time_unit
                    #( .column(#columns) )*
            }
        }
    })
}

fn parse_measurement_attr(attrs: &[Attribute]) -> syn::Result<MeasurementAttr> {
    let mut options = MeasurementAttr::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("measurement")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                options.name = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("database") {
                options.database = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("retention_policy") {
                options.retention_policy = Some(meta.value()?.parse()?);
            } else if meta.path.is_ident("time_unit") {
                let lit: LitStr = meta.value()?.parse()?;
                let Some(variant) = time_unit_variant(&lit.value()) else {
                    return Err(syn::Error::new_spanned(
                        &lit,
                        "unknown time unit, expected one of: nanos, micros, millis, seconds, minutes, hours",
                    ));
                };
                let ident = syn::Ident::new(variant, lit.span());
                options.time_unit = Some(quote! { #ident });
            } else {
                return Err(meta.error(
                    "unknown measurement option, expected name, database, retention_policy or time_unit",
                ));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

fn parse_column_attr(attr: &Attribute) -> syn::Result<ColumnAttr> {
    let mut column = ColumnAttr::default();
    // Bare `#[column]`
    if matches!(attr.meta, syn::Meta::Path(_)) {
        return Ok(column);
    }
    attr.parse_nested_meta(|meta| {
        if meta.path.is_ident("name") {
            column.name = Some(meta.value()?.parse()?);
        } else if meta.path.is_ident("tag") {
            column.tag = true;
        } else {
            return Err(meta.error("unknown column option, expected name or tag"));
        }
        Ok(())
    })?;
    Ok(column)
}

/// Map a `time_unit` string to its `TimeUnit` variant.
fn time_unit_variant(unit: &str) -> Option<&'static str> {
    let variant = match unit {
        "nanos" | "ns" => "Nanos",
        "micros" | "u" | "us" => "Micros",
        "millis" | "ms" => "Millis",
        "seconds" | "s" => "Seconds",
        "minutes" | "m" => "Minutes",
        "hours" | "h" => "Hours",
        _ => return None,
    };
    Some(variant)
}

/// Classify a field type by its path.
fn classify(ty: &Type) -> FieldKind {
    match last_segment(ty) {
        Some(segment) if segment.ident == "Option" => match first_type_arg(segment) {
            Some(inner) if is_scalar(inner) => FieldKind::Supported,
            _ => FieldKind::Unsupported,
        },
        _ if is_scalar(ty) => FieldKind::Supported,
        _ => FieldKind::Unsupported,
    }
}

fn is_scalar(ty: &Type) -> bool {
    let Some(segment) = last_segment(ty) else {
        return false;
    };
    match segment.ident.to_string().as_str() {
        "bool" | "i32" | "i64" | "f64" | "String" => segment.arguments.is_empty(),
        // Only the UTC timezone has a column binding
        "DateTime" => first_type_arg(segment)
            .and_then(last_segment)
            .is_some_and(|tz| tz.ident == "Utc"),
        _ => false,
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path.path.segments.last(),
        _ => None,
    }
}

fn first_type_arg(segment: &syn::PathSegment) -> Option<&Type> {
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        }),
        _ => None,
    }
}
