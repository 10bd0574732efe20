//! Implementation of the Record derive macro.
//!
//! This module generates the field-map mapping at compile time based on
//! `#[record(...)]` attributes.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, Lit, Path, Result, Type};

/// Parsed definition of a struct with `#[derive(Record)]`.
#[derive(Debug)]
pub struct RecordDef {
    /// The struct name.
    pub name: Ident,
    /// Parsed field mappings.
    pub fields: Vec<RecordFieldDef>,
    /// Generics from the struct.
    pub generics: syn::Generics,
    /// Path of the core crate in generated code.
    pub crate_path: Path,
}

/// Parsed mapping of a single struct field.
#[derive(Debug)]
pub struct RecordFieldDef {
    /// The struct field name.
    pub name: Ident,
    /// The field type.
    pub ty: Type,
    /// Field-map key (column or model field name).
    pub column: String,
    /// Whether the field is left out of the mapping.
    pub skip: bool,
}

/// Parse a `DeriveInput` into a `RecordDef`.
pub fn parse_record(input: &DeriveInput) -> Result<RecordDef> {
    let name = input.ident.clone();
    let generics = input.generics.clone();
    let crate_path = parse_crate_path(input)?;

    let fields = match &input.data {
        Data::Struct(data) => parse_record_fields(&data.fields)?,
        Data::Enum(_) => {
            return Err(Error::new_spanned(
                input,
                "Record can only be derived for structs, not enums",
            ));
        }
        Data::Union(_) => {
            return Err(Error::new_spanned(
                input,
                "Record can only be derived for structs, not unions",
            ));
        }
    };

    Ok(RecordDef {
        name,
        fields,
        generics,
        crate_path,
    })
}

/// Parse the optional struct-level `#[record(crate = "...")]`.
fn parse_crate_path(input: &DeriveInput) -> Result<Path> {
    let mut path: Path = syn::parse_quote!(::recordset_core);
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("crate") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit) = value {
                    path = lit.parse()?;
                    Ok(())
                } else {
                    Err(Error::new_spanned(value, "crate path must be a string"))
                }
            } else {
                Err(meta.error("unknown record attribute"))
            }
        })?;
    }
    Ok(path)
}

/// Parse all fields from a struct.
fn parse_record_fields(fields: &Fields) -> Result<Vec<RecordFieldDef>> {
    match fields {
        Fields::Named(named) => named.named.iter().map(parse_record_field).collect(),
        Fields::Unnamed(_) => Err(Error::new_spanned(
            fields,
            "Record requires a struct with named fields",
        )),
        Fields::Unit => Ok(Vec::new()),
    }
}

/// Parse a single field and its `#[record(...)]` attributes.
fn parse_record_field(field: &Field) -> Result<RecordFieldDef> {
    let name = field
        .ident
        .clone()
        .ok_or_else(|| Error::new_spanned(field, "expected named field"))?;

    let mut column = name.to_string();
    let mut skip = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("column") {
                let value: Lit = meta.value()?.parse()?;
                if let Lit::Str(lit) = value {
                    column = lit.value();
                    Ok(())
                } else {
                    Err(Error::new_spanned(value, "column must be a string literal"))
                }
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unknown record field attribute"))
            }
        })?;
    }

    if column.is_empty() {
        return Err(Error::new_spanned(field, "column name must not be empty"));
    }

    Ok(RecordFieldDef {
        name,
        ty: field.ty.clone(),
        column,
        skip,
    })
}

/// Generate the `Record` implementation.
pub fn generate_record_impl(def: &RecordDef) -> TokenStream {
    let name = &def.name;
    let krate = &def.crate_path;
    let (impl_generics, ty_generics, where_clause) = def.generics.split_for_impl();

    let mapped: Vec<&RecordFieldDef> = def.fields.iter().filter(|f| !f.skip).collect();
    let columns = mapped.iter().map(|f| f.column.as_str());

    let readers = def.fields.iter().map(|f| {
        let ident = &f.name;
        let ty = &f.ty;
        if f.skip {
            quote! { #ident: ::core::default::Default::default() }
        } else {
            let column = &f.column;
            quote! { #ident: #krate::take_field::<#ty>(map, #column)? }
        }
    });

    let writers = mapped.iter().map(|f| {
        let ident = &f.name;
        let column = &f.column;
        quote! {
            map.insert(
                ::std::string::String::from(#column),
                #krate::Value::from(::core::clone::Clone::clone(&self.#ident)),
            );
        }
    });

    quote! {
        impl #impl_generics #krate::Record for #name #ty_generics #where_clause {
            const FIELDS: &'static [&'static str] = &[#(#columns),*];

            fn from_field_map(map: &#krate::FieldMap) -> #krate::Result<Self> {
                ::core::result::Result::Ok(Self {
                    #(#readers),*
                })
            }

            fn to_field_map(&self) -> #krate::FieldMap {
                let mut map = #krate::FieldMap::new();
                #(#writers)*
                map
            }
        }
    }
}
