mod derive_child;
mod derive_identity;

use derive_child::DeriveChild;
use derive_identity::DeriveIdentity;
use proc_macro::TokenStream;
use quote::ToTokens;
use syn::parse_macro_input;

/// Derive macro implementing the [Child](https://docs.rs/registrar/latest/registrar/child/trait.Child.html) trait.
///
/// The `#[child(...)]` attribute configures the implementation:
///  - `base = dyn Trait` (required): the base the child is constructed through.
///  - `args = (T1, T2)`: the argument signature, defaulting to `()`. Tuple arguments are spread over the
///    constructor's parameters.
///  - `name = "..."`: the fixed name the child registers itself under on first use. `name = none`, the
///    default, leaves the child unregistered until it is named at runtime.
///  - `constructor = path`: the function constructing the child. Defaults to `Default::default` when there
///    are no arguments, and `Self::new` otherwise.
///
/// Non-generic children with a fixed name are also enrolled at link time when the `enroll` feature is
/// enabled, registering them as soon as their base's table is first used.
///
/// # Example
///
/// ```ignore
/// use registrar::{Child, Identity};
///
/// #[derive(Identity, Child)]
/// #[child(base = dyn Shape, args = (i32, i32), name = "rect")]
/// struct Rectangle { width: i32, height: i32 }
///
/// impl Rectangle {
///     fn new(width: i32, height: i32) -> Self {
///         Rectangle { width, height }
///     }
/// }
/// ```
#[proc_macro_derive(Child, attributes(child))]
pub fn derive_child(input: TokenStream) -> TokenStream {
    let derive_child = parse_macro_input!(input as DeriveChild);
    TokenStream::from(derive_child.into_token_stream())
}

/// Derive macro implementing the [Identity](https://docs.rs/registrar/latest/registrar/base/trait.Identity.html) trait.
///
/// The `#[identity(info = "...")]` attribute can be specified to give the type its own description,
/// reported by `Factory::info` instead of the one derived from its registered name.
///
/// # Example
///
/// ```ignore
/// use registrar::Identity;
///
/// #[derive(Identity)]
/// #[identity(info = "A crunchy fruit.")]
/// struct Apple;
/// ```
#[proc_macro_derive(Identity, attributes(identity))]
pub fn derive_identity(input: TokenStream) -> TokenStream {
    let derive_identity = parse_macro_input!(input as DeriveIdentity);
    TokenStream::from(derive_identity.into_token_stream())
}
