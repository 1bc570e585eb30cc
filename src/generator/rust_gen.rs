use proc_macro2::{Ident, Span, TokenStream};
use quote::{quote, ToTokens};

use crate::{
    error::{GeneratorError, Result},
    parser::{
        Entity, EntityDef, EnumDef, Field, FieldType, Primitive, StructDef, UnionVariant, Variant,
    },
    routes::{escape_format, Argument, CallShape, Route},
};

/// Identifier tokens for a normalized name; `r#` names become raw identifiers.
/// Panics on invalid names, callers go through [`check_ident`] first.
pub(crate) fn ident(name: &str) -> Ident {
    match name.strip_prefix("r#") {
        Some(raw) => Ident::new_raw(raw, Span::call_site()),
        None => Ident::new(name, Span::call_site()),
    }
}

/// Fails with [`GeneratorError::InvalidCode`] when `name` cannot become an identifier
pub(crate) fn check_ident(tag: &str, name: &str) -> Result<()> {
    syn::parse_str::<Ident>(name)
        .map(drop)
        .map_err(|e| GeneratorError::InvalidCode {
            tag: tag.to_string(),
            message: format!("'{name}' is not a valid identifier: {e}"),
        })
}

impl ToTokens for FieldType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        let expanded = match self {
            FieldType::Named(name) => ident(name).into_token_stream(),
            FieldType::Array(inner) => quote!(Vec<#inner>),
            FieldType::Map => quote!(HashMap<String, Value>),
            FieldType::Simple(primitive) => match primitive {
                Primitive::Int => quote!(i32),
                Primitive::Long => quote!(i64),
                Primitive::Float => quote!(f32),
                Primitive::Double => quote!(f64),
                Primitive::String => quote!(String),
                Primitive::Bool => quote!(bool),
                Primitive::Bytes => quote!(Vec<u8>),
            },
            FieldType::Optional(inner) => quote!(Option<#inner>),
            FieldType::Boxed(inner) => quote!(Box<#inner>),
            FieldType::Dynamic => quote!(Value),
            FieldType::Unit => quote!(()),
        };
        tokens.extend(expanded);
    }
}

/// `#[doc = " line"]` per line, rendered as `///` comments
pub(crate) fn doc_attrs<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> TokenStream {
    let lines = lines.into_iter().map(|line| {
        let line = line.as_ref().trim_end();
        if line.is_empty() {
            String::new()
        } else {
            format!(" {line}")
        }
    });
    quote!(#(#[doc = #lines])*)
}

fn description_docs(description: Option<&str>, fallback: &str) -> TokenStream {
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => doc_attrs(description.lines()),
        None => doc_attrs([fallback]),
    }
}

fn generate_field(field: &Field) -> TokenStream {
    let name = ident(&field.name);
    let field_type = &field.field_type;
    let docs = field
        .description
        .as_deref()
        .map(|d| doc_attrs(d.trim().lines()));
    let flatten = field.flatten.then(|| quote!(#[serde(flatten)]));
    let rename = field.rename.as_ref().map(|wire| quote!(#[serde(rename = #wire)]));
    let skip = field
        .optional
        .then(|| quote!(#[serde(skip_serializing_if = "Option::is_none")]));
    quote! {
        #docs
        #flatten
        #rename
        #skip
        pub #name: #field_type
    }
}

fn generate_struct(entity: &Entity, def: &StructDef) -> TokenStream {
    let identifier = ident(&entity.name);
    let docs = description_docs(entity.description.as_deref(), &entity.name);
    let rename_all = def.camel_case.then(|| quote!(#[serde(rename_all = "camelCase")]));
    let fields = def.fields.iter().map(generate_field);
    let extension = ident(&def.extension_field);
    quote! {
        #docs
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #rename_all
        pub struct #identifier {
            #(#fields,)*
            #[doc = " Additional fields from the API"]
            #[serde(flatten)]
            pub #extension: HashMap<String, Value>,
        }
    }
}

fn generate_enum(entity: &Entity, def: &EnumDef) -> TokenStream {
    let identifier = ident(&entity.name);
    let docs = description_docs(entity.description.as_deref(), &entity.name);
    let rename_all = def.case.map(|case| {
        let case = case.serde_name();
        quote!(#[serde(rename_all = #case)])
    });
    let variants = def.variants.iter().map(|Variant { name, rename, .. }| {
        let name = ident(name);
        let rename = rename.as_ref().map(|value| quote!(#[serde(rename = #value)]));
        quote! {
            #rename
            #name
        }
    });
    quote! {
        #docs
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        #rename_all
        pub enum #identifier {
            #(#variants,)*
        }
    }
}

fn generate_union(
    entity: &Entity,
    discriminant: Option<&str>,
    variants: &[UnionVariant],
) -> TokenStream {
    let identifier = ident(&entity.name);
    let docs = description_docs(entity.description.as_deref(), &entity.name);
    let tagging = match discriminant {
        Some(discriminant) => quote!(#[serde(tag = #discriminant)]),
        None => quote!(#[serde(untagged)]),
    };
    let variants = variants.iter().map(|variant| {
        let name = ident(&variant.name);
        let variant_type = &variant.variant_type;
        let rename = variant
            .rename
            .as_ref()
            .map(|value| quote!(#[serde(rename = #value)]));
        quote! {
            #rename
            #name(#variant_type)
        }
    });
    quote! {
        #docs
        #[derive(Debug, Clone, Serialize, Deserialize)]
        #tagging
        pub enum #identifier {
            #(#variants,)*
        }
    }
}

pub fn generate_entity(entity: &Entity) -> TokenStream {
    match &entity.def {
        EntityDef::Struct(def) => generate_struct(entity, def),
        EntityDef::Enum(def) => generate_enum(entity, def),
        EntityDef::OneOf {
            discriminant,
            variants,
        } => generate_union(entity, discriminant.as_deref(), variants),
        EntityDef::Alias(field_type) => {
            let identifier = ident(&entity.name);
            let docs = description_docs(entity.description.as_deref(), &entity.name);
            quote! {
                #docs
                pub type #identifier = #field_type;
            }
        }
    }
}

/// Arrays are formatted into URLs as comma-separated values
fn url_value(argument: &Argument, value: TokenStream) -> TokenStream {
    if argument.arg_type.is_array() {
        quote!(#value.iter().map(ToString::to_string).collect::<Vec<_>>().join(","))
    } else {
        value
    }
}

fn query_push(argument: &Argument) -> TokenStream {
    let name = ident(&argument.name);
    let format = format!("{}={{}}", escape_format(&argument.wire_name));
    let render = |value: TokenStream| url_value(argument, value);
    if argument.arg_type.is_optional() {
        let value = render(quote!(value));
        quote! {
            if let Some(value) = #name {
                query.push(format!(#format, #value));
            }
        }
    } else {
        let value = render(quote!(#name));
        quote! {
            query.push(format!(#format, #value));
        }
    }
}

pub fn generate_route(route: &Route, result: &Ident) -> TokenStream {
    let docs = doc_attrs(&route.docs);
    let name = ident(&route.name);
    let params = route
        .path_params
        .iter()
        .chain(&route.query_params)
        .map(|argument| {
            let name = ident(&argument.name);
            let arg_type = &argument.arg_type;
            quote!(#name: #arg_type)
        });
    let body = route.body.as_ref().map(|(body_name, body_type)| {
        let body_name = ident(body_name);
        quote!(#body_name: &#body_type)
    });
    let return_type = &route.return_type;

    let query = (!route.query_params.is_empty()).then(|| {
        let pushes = route.query_params.iter().map(query_push);
        quote! {
            let mut query: Vec<String> = Vec::new();
            #(#pushes)*
            let query_string = if query.is_empty() {
                String::new()
            } else {
                format!("?{}", query.join("&"))
            };
        }
    });

    let url = if route.needs_format() {
        let mut format = route.template.format.clone();
        let query_arg = query.is_some().then(|| {
            format.push_str("{}");
            quote!(query_string)
        });
        let args = route.template.args.iter().map(|arg| {
            let name = ident(arg);
            match route.path_params.iter().find(|p| &p.name == arg) {
                Some(argument) => url_value(argument, quote!(#name)),
                None => quote!(#name),
            }
        });
        quote!(&format!(#format, #(#args,)* #query_arg))
    } else {
        let path = &route.path;
        quote!(#path)
    };

    let verb = ident(route.method.as_str());
    let body_name = route.body.as_ref().map(|(body_name, _)| ident(body_name));
    let discard = route
        .unsupported_body
        .then_some(body_name.as_ref())
        .flatten()
        .map(|body_name| quote!(let _ = #body_name;));
    let call = match (route.call, &body_name) {
        (CallShape::WithBody, Some(body_name)) => {
            quote!(self.client.#verb(#url, #body_name).await)
        }
        (CallShape::WithBody | CallShape::EmptyBody, _) => {
            quote!(self.client.#verb(#url, &serde_json::json!({})).await)
        }
        (CallShape::Plain, _) => quote!(self.client.#verb(#url).await),
        (CallShape::DecodeRaw, _) => quote! {
            let response = self.client.delete_raw(#url).await?;
            serde_json::from_value(response).map_err(Into::into)
        },
    };

    quote! {
        #docs
        pub async fn #name(&self, #(#params,)* #body) -> #result<#return_type> {
            #query
            #discard
            #call
        }
    }
}

pub fn generate_header(
    tag: &str,
    description: Option<&str>,
    crate_path: &syn::Path,
    client: &Ident,
    result: &Ident,
) -> TokenStream {
    let mut docs = vec![format!(" {tag} operations and models")];
    if let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) {
        docs.push(String::new());
        docs.extend(description.lines().map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                String::new()
            } else {
                format!(" {line}")
            }
        }));
    }
    quote! {
        #(#![doc = #docs])*

        use #crate_path::{#client, #result};
        use serde::{Deserialize, Serialize};
        use serde_json::Value;
        use std::collections::HashMap;
    }
}

pub fn generate_handler(
    tag: &str,
    handler: &str,
    client: &Ident,
    result: &Ident,
    routes: &[Route],
) -> TokenStream {
    let handler_docs = doc_attrs([format!("Handler for {tag} operations")]);
    let handler = ident(handler);
    let methods = routes.iter().map(|route| generate_route(route, result));
    quote! {
        #handler_docs
        pub struct #handler {
            client: #client,
        }

        impl #handler {
            #[doc = " Create a new handler"]
            pub fn new(client: #client) -> Self {
                Self { client }
            }

            #(#methods)*
        }
    }
}

/// Parses the tokens as a whole file and pretty prints them
pub fn unparse(tag: &str, tokens: TokenStream) -> Result<String> {
    let file = syn::parse2::<syn::File>(tokens).map_err(|e| GeneratorError::InvalidCode {
        tag: tag.to_string(),
        message: e.to_string(),
    })?;
    Ok(prettyplease::unparse(&file))
}
