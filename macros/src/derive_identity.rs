use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    spanned::Spanned,
    DeriveInput, Generics, Ident, LitStr, Token,
};

pub struct DeriveIdentity {
    info: Option<LitStr>,
    ident: Ident,
    generics: Generics,
}

impl ToTokens for DeriveIdentity {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let Self {
            info,
            ident,
            generics,
        } = self;
        let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

        let describe = info.as_ref().map(|info| {
            quote! {
                fn describe(&self) -> ::std::option::Option<::std::borrow::Cow<'static, str>> {
                    ::std::option::Option::Some(::std::borrow::Cow::Borrowed(#info))
                }
            }
        });

        tokens.extend(quote! {
            #[automatically_derived]
            impl #impl_generics ::registrar::Identity for #ident #ty_generics #where_clause {
                #[inline]
                fn type_key(&self) -> ::std::any::TypeId {
                    ::std::any::TypeId::of::<Self>()
                }

                #[inline]
                fn type_label(&self) -> &'static str {
                    ::std::any::type_name::<Self>()
                }

                #describe
            }
        });
    }
}

impl Parse for DeriveIdentity {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let input: DeriveInput = input.parse()?;
        let mut info = None;
        for attr in input.attrs {
            if attr.path().is_ident("identity") {
                if info.is_some() {
                    return Err(syn::Error::new(
                        attr.span(),
                        "identity attribute already specified",
                    ));
                }
                info = Some(attr.parse_args_with(|input: ParseStream<'_>| {
                    let _: kw::info = input.parse()?;
                    let _: Token![=] = input.parse()?;
                    let info: LitStr = input.parse()?;
                    let _: Option<Token![,]> = input.parse()?;
                    Ok(info)
                })?);
            }
        }

        Ok(DeriveIdentity {
            info,
            ident: input.ident,
            generics: input.generics,
        })
    }
}

mod kw {
    syn::custom_keyword!(info);
}
