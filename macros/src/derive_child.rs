use quote::{format_ident, quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    parse_quote,
    punctuated::Punctuated,
    spanned::Spanned,
    DeriveInput, Generics, Ident, LitStr, Path, Token, Type,
};

pub struct DeriveChild {
    attrs: DeriveChildAttrs,
    ident: Ident,
    generics: Generics,
}

impl ToTokens for DeriveChild {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let Self {
            attrs,
            ident,
            generics,
        } = self;
        let DeriveChildAttrs {
            base,
            args,
            name,
            constructor,
        } = attrs;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

        let name_expanded = match name {
            Some(name) => quote! { ::std::option::Option::Some(#name) },
            None => quote! { ::std::option::Option::None },
        };

        // Tuple arguments are spread over the constructor's parameters, anything else is passed as one.
        let params: Vec<Ident> = match args {
            Type::Tuple(tuple) => (0..tuple.elems.len())
                .map(|i| format_ident!("__arg{}", i))
                .collect(),
            _ => vec![format_ident!("__arg0")],
        };
        let destructure = match args {
            Type::Tuple(_) => quote! { let (#(#params,)*) = args; },
            _ => quote! { let __arg0 = args; },
        };
        let constructor = match constructor {
            Some(path) => quote! { #path },
            None if params.is_empty() => quote! { <Self as ::std::default::Default>::default },
            None => quote! { Self::new },
        };

        tokens.extend(quote! {
            #[automatically_derived]
            impl #impl_generics ::registrar::Child<#base, #args> for #ident #ty_generics #where_clause {
                const NAME: ::std::option::Option<&'static str> = #name_expanded;

                fn construct(args: #args) -> ::std::boxed::Box<#base> {
                    #destructure
                    ::std::boxed::Box::new(#constructor(#(#params),*))
                }
            }
        });

        // Generic children have no single type to collect, they register on first use only.
        if name.is_some() && generics.params.is_empty() {
            tokens.extend(quote! {
                ::registrar::__enroll!(#ident, #base, #args);
            });
        }
    }
}

impl Parse for DeriveChild {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let input: DeriveInput = input.parse()?;
        let span = input.ident.span();
        let ident = input.ident;
        let generics = input.generics;
        let mut attrs = None;
        for attr in input.attrs {
            if attr.path().is_ident("child") {
                if attrs.is_some() {
                    return Err(syn::Error::new(
                        attr.span(),
                        "child attribute already specified",
                    ));
                }
                attrs = Some(attr.parse_args_with(DeriveChildAttrs::parse)?);
            }
        }

        let attrs = attrs.ok_or_else(|| {
            syn::Error::new(span, "missing #[child(base = ...)] attribute")
        })?;

        Ok(DeriveChild {
            attrs,
            ident,
            generics,
        })
    }
}

struct DeriveChildAttrs {
    base: Type,
    args: Type,
    name: Option<LitStr>,
    constructor: Option<Path>,
}

impl Parse for DeriveChildAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        #[derive(Debug)]
        enum Attr {
            Base(kw::base, Type),
            Args(kw::args, Type),
            Name(kw::name, Option<LitStr>),
            Constructor(kw::constructor, Path),
        }
        let span = input.span();
        let attrs: Punctuated<Attr, Token![,]> =
            Punctuated::parse_terminated_with(input, |input| {
                let lookahead = input.lookahead1();
                if lookahead.peek(kw::base) {
                    let key: kw::base = input.parse()?;
                    let _: Token![=] = input.parse()?;
                    Ok(Attr::Base(key, input.parse()?))
                } else if lookahead.peek(kw::args) {
                    let key: kw::args = input.parse()?;
                    let _: Token![=] = input.parse()?;
                    Ok(Attr::Args(key, input.parse()?))
                } else if lookahead.peek(kw::name) {
                    let key: kw::name = input.parse()?;
                    let _: Token![=] = input.parse()?;
                    if input.peek(kw::none) {
                        let _: kw::none = input.parse()?;
                        Ok(Attr::Name(key, None))
                    } else {
                        let name: LitStr = input.parse()?;
                        if name.value().is_empty() {
                            return Err(syn::Error::new(
                                name.span(),
                                "child name cannot be empty, use `name = none` for an unnamed child",
                            ));
                        }
                        Ok(Attr::Name(key, Some(name)))
                    }
                } else if lookahead.peek(kw::constructor) {
                    let key: kw::constructor = input.parse()?;
                    let _: Token![=] = input.parse()?;
                    Ok(Attr::Constructor(key, input.parse()?))
                } else {
                    Err(lookahead.error())
                }
            })?;

        let mut base = None;
        let mut args = None;
        let mut name = None;
        let mut constructor = None;

        for attr in attrs {
            match attr {
                Attr::Base(key, ty) => {
                    if base.is_none() {
                        base = Some(ty);
                    } else {
                        return Err(syn::Error::new(key.span, "base already set"));
                    }
                }
                Attr::Args(key, ty) => {
                    if args.is_none() {
                        args = Some(ty);
                    } else {
                        return Err(syn::Error::new(key.span, "args already set"));
                    }
                }
                Attr::Name(key, lit) => {
                    if name.is_none() {
                        name = Some(lit);
                    } else {
                        return Err(syn::Error::new(key.span, "name already set"));
                    }
                }
                Attr::Constructor(key, path) => {
                    if constructor.is_none() {
                        constructor = Some(path);
                    } else {
                        return Err(syn::Error::new(key.span, "constructor already set"));
                    }
                }
            }
        }

        Ok(DeriveChildAttrs {
            base: base.ok_or_else(|| syn::Error::new(span, "base must be set"))?,
            args: args.unwrap_or_else(|| parse_quote!(())),
            name: name.flatten(),
            constructor,
        })
    }
}

mod kw {
    syn::custom_keyword!(base);
    syn::custom_keyword!(args);
    syn::custom_keyword!(name);
    syn::custom_keyword!(none);
    syn::custom_keyword!(constructor);
}
