//! Derive macros for contextual-injector
//!
//! `#[derive(Component)]` writes the `Component` impl of a unit struct or a
//! struct with named fields: one constructor whose parameters are the
//! `#[inject]` fields, in declaration order. Fields without `#[inject]` start
//! from `Default`. Unit structs get a constructor without parameters.
//!
//! Every injected field is a constructor parameter, so a field that leads
//! back to its own component must be `#[inject(lazy)]`; an eager one is
//! reported as a circular reference.
//!
//! # Example
//!
//! ```rust,ignore
//! use contextual_injector::{Component, Container, Context, Lazy};
//! use std::sync::Arc;
//!
//! #[derive(Component)]
//! #[component(qualifiers("locale"))]
//! struct Checkout {
//!     #[inject]
//!     prices: Arc<dyn PriceList>,
//!     #[inject(qualifier(kind = "channel", value = "email"))]
//!     notifier: Arc<dyn Notifier>,
//!     #[inject(optional)]
//!     audit: Option<Arc<AuditLog>>,
//!     #[inject(group)]
//!     discounts: Vec<Arc<dyn Discount>>,
//!     #[inject(lazy)]
//!     orders: Lazy<OrderService>,
//!     #[inject]
//!     context: Context,
//!     // Not injected
//!     attempts: u32,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Fields, GenericArgument, Ident, LitStr,
    PathArguments, Token, Type,
};

/// Derive `contextual_injector::Component`.
///
/// # Field attributes
///
/// - `#[inject]` - inject the field. The kind follows the field type:
///   `Arc<T>` (mandatory), `Option<Arc<T>>` (optional), `Vec<Arc<T>>` (group),
///   `Lazy<T>` (reference) or `Context`.
/// - `#[inject(optional)]`, `#[inject(group)]`, `#[inject(lazy)]` - spell the
///   kind out; it must agree with the field type.
/// - `#[inject(qualifier(kind = "..", value = ".."))]` - add a qualifier at
///   this injection site. May be repeated.
///
/// # Struct attributes
///
/// - `#[component(stateful)]` - never cache.
/// - `#[component(scoped)]` - scope root with a fresh nested cache per instance.
/// - `#[component(qualifiers("a", "b"))]` or `#[component(qualifiers(all))]` -
///   qualifier types the component observes.
/// - `#[component(ignore("a"))]` - qualifier types withheld from dependencies.
#[proc_macro_derive(Component, attributes(inject, component))]
pub fn derive_component(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Some(&fields.named),
            Fields::Unit => None,
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Component can only be derived for unit structs or structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Component can only be derived for structs",
            ));
        }
    };

    let options = ComponentOptions::parse(&input.attrs)?;

    let mut params = Vec::new();
    let mut field_inits = Vec::new();
    for field in fields.into_iter().flatten() {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        match InjectAttr::parse(&field.attrs)? {
            Some(attr) => {
                let kind = Kind::resolve(&field.ty, attr.kind)?;
                let qualifiers = attr.qualifiers.iter().map(|(kind, value)| {
                    quote! {
                        .qualified(::contextual_injector::QualifierType::new(#kind).value(#value))
                    }
                });
                let dependency = kind.dependency();
                params.push(quote! { #dependency #(#qualifiers)* });
                let take = kind.take();
                field_inits.push(quote! { #field_name: #take });
            }
            None => field_inits.push(quote! {
                #field_name: ::std::default::Default::default()
            }),
        }
    }

    let value = match fields {
        Some(_) => quote! { Self { #(#field_inits),* } },
        None => quote! { Self },
    };

    let descriptor = options.apply(quote! {
        ::contextual_injector::Descriptor::new()
    });

    Ok(quote! {
        impl #impl_generics ::contextual_injector::Component for #name #ty_generics #where_clause {
            fn descriptor() -> ::contextual_injector::Descriptor<Self> {
                #descriptor.constructor(::contextual_injector::Constructor::new(
                    "derive",
                    ::std::vec![#(#params),*],
                    |#[allow(unused_variables)] args: &mut ::contextual_injector::Arguments| {
                        ::std::result::Result::Ok(#value)
                    },
                ))
            }
        }
    })
}

// =============================================================================
// Struct attributes
// =============================================================================

#[derive(Default)]
struct ComponentOptions {
    stateful: bool,
    scoped: bool,
    qualifiers: Option<Accepted>,
    ignored: Vec<LitStr>,
}

enum Accepted {
    All,
    Only(Vec<LitStr>),
}

impl ComponentOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut options = Self::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("component")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("stateful") {
                    options.stateful = true;
                } else if meta.path.is_ident("scoped") {
                    options.scoped = true;
                } else if meta.path.is_ident("qualifiers") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    if content.peek(Ident) {
                        let all: Ident = content.parse()?;
                        if all != "all" {
                            return Err(syn::Error::new_spanned(
                                all,
                                "expected `all` or a list of qualifier type names",
                            ));
                        }
                        options.qualifiers = Some(Accepted::All);
                    } else {
                        let names = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                        options.qualifiers = Some(Accepted::Only(names.into_iter().collect()));
                    }
                } else if meta.path.is_ident("ignore") {
                    let content;
                    syn::parenthesized!(content in meta.input);
                    let names = Punctuated::<LitStr, Token![,]>::parse_terminated(&content)?;
                    options.ignored.extend(names);
                } else {
                    return Err(meta.error("unsupported component attribute"));
                }
                Ok(())
            })?;
        }
        Ok(options)
    }

    fn apply(&self, mut descriptor: TokenStream2) -> TokenStream2 {
        if self.stateful {
            descriptor = quote! { #descriptor.stateful() };
        }
        if self.scoped {
            descriptor = quote! { #descriptor.scoped() };
        }
        match &self.qualifiers {
            Some(Accepted::All) => {
                descriptor = quote! {
                    #descriptor.qualifiers(::contextual_injector::Qualifiers::All)
                };
            }
            Some(Accepted::Only(names)) => {
                descriptor = quote! {
                    #descriptor.qualifiers(::contextual_injector::Qualifiers::only([
                        #(::contextual_injector::QualifierType::new(#names)),*
                    ]))
                };
            }
            None => {}
        }
        if !self.ignored.is_empty() {
            let names = &self.ignored;
            descriptor = quote! {
                #descriptor.ignore([#(::contextual_injector::QualifierType::new(#names)),*])
            };
        }
        descriptor
    }
}

// =============================================================================
// Field attributes
// =============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Declared {
    Optional,
    Group,
    Lazy,
}

struct InjectAttr {
    kind: Option<Declared>,
    qualifiers: Vec<(LitStr, LitStr)>,
}

impl InjectAttr {
    fn parse(attrs: &[Attribute]) -> syn::Result<Option<Self>> {
        let Some(attr) = attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
            return Ok(None);
        };
        let mut parsed = Self {
            kind: None,
            qualifiers: Vec::new(),
        };
        if attr.meta.require_path_only().is_ok() {
            return Ok(Some(parsed));
        }

        attr.parse_nested_meta(|meta| {
            let declared = if meta.path.is_ident("optional") {
                Declared::Optional
            } else if meta.path.is_ident("group") {
                Declared::Group
            } else if meta.path.is_ident("lazy") {
                Declared::Lazy
            } else if meta.path.is_ident("qualifier") {
                let mut kind = None;
                let mut value = None;
                meta.parse_nested_meta(|inner| {
                    if inner.path.is_ident("kind") {
                        kind = Some(inner.value()?.parse::<LitStr>()?);
                    } else if inner.path.is_ident("value") {
                        value = Some(inner.value()?.parse::<LitStr>()?);
                    } else {
                        return Err(inner.error("expected `kind` or `value`"));
                    }
                    Ok(())
                })?;
                match (kind, value) {
                    (Some(kind), Some(value)) => parsed.qualifiers.push((kind, value)),
                    _ => return Err(meta.error("qualifier needs both `kind` and `value`")),
                }
                return Ok(());
            } else {
                return Err(meta.error("unsupported inject attribute"));
            };

            if parsed.kind.is_some_and(|kind| kind != declared) {
                return Err(meta.error("conflicting injection kinds"));
            }
            parsed.kind = Some(declared);
            Ok(())
        })?;
        Ok(Some(parsed))
    }
}

/// How a field is injected, with the API type it names.
enum Kind<'a> {
    Component(&'a Type),
    Optional(&'a Type),
    Group(&'a Type),
    Lazy(&'a Type),
    Context,
}

impl<'a> Kind<'a> {
    fn resolve(ty: &'a Type, declared: Option<Declared>) -> syn::Result<Self> {
        let kind = if let Some(inner) = generic_arg(ty, "Option").and_then(|t| generic_arg(t, "Arc")) {
            Kind::Optional(inner)
        } else if let Some(inner) = generic_arg(ty, "Vec").and_then(|t| generic_arg(t, "Arc")) {
            Kind::Group(inner)
        } else if let Some(inner) = generic_arg(ty, "Lazy") {
            Kind::Lazy(inner)
        } else if let Some(inner) = generic_arg(ty, "Arc") {
            Kind::Component(inner)
        } else if last_ident(ty).is_some_and(|ident| ident == "Context") {
            Kind::Context
        } else {
            return Err(syn::Error::new_spanned(
                ty,
                "injected fields must be Arc<T>, Option<Arc<T>>, Vec<Arc<T>>, Lazy<T> or Context",
            ));
        };

        let agrees = match (declared, &kind) {
            (None, _) => true,
            (Some(Declared::Optional), Kind::Optional(_)) => true,
            (Some(Declared::Group), Kind::Group(_)) => true,
            (Some(Declared::Lazy), Kind::Lazy(_)) => true,
            _ => false,
        };
        if !agrees {
            return Err(syn::Error::new_spanned(
                ty,
                "field type does not match the declared injection kind",
            ));
        }
        Ok(kind)
    }

    fn dependency(&self) -> TokenStream2 {
        match self {
            Kind::Component(api) => quote! { ::contextual_injector::Dependency::component::<#api>() },
            Kind::Optional(api) => quote! { ::contextual_injector::Dependency::optional::<#api>() },
            Kind::Group(api) => quote! { ::contextual_injector::Dependency::group::<#api>() },
            Kind::Lazy(api) => quote! { ::contextual_injector::Dependency::lazy::<#api>() },
            Kind::Context => quote! { ::contextual_injector::Dependency::context() },
        }
    }

    fn take(&self) -> TokenStream2 {
        match self {
            Kind::Component(api) => quote! { args.take::<#api>()? },
            Kind::Optional(api) => quote! { args.take_optional::<#api>()? },
            Kind::Group(api) => quote! { args.take_group::<#api>()? },
            Kind::Lazy(api) => quote! { args.take_lazy::<#api>()? },
            Kind::Context => quote! { args.take_context()? },
        }
    }
}

fn last_ident(ty: &Type) -> Option<&Ident> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|segment| &segment.ident),
        _ => None,
    }
}

/// `T` from `Wrapper<T>`, matching the wrapper by its last path segment.
fn generic_arg<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => args.args.iter().find_map(|arg| match arg {
            GenericArgument::Type(inner) => Some(inner),
            _ => None,
        }),
        _ => None,
    }
}
