#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]
#![deny(unused_must_use)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod base;
pub mod child;
pub mod creator;
#[cfg(feature = "enroll")]
pub mod enroll;
pub mod error;
pub mod registry;

pub use base::{Base, Factory, Identity};
pub use child::Child;
pub use creator::Creator;
pub use error::RegistryError;
#[cfg(feature = "macros")]
pub use registrar_macros::{Child, Identity};
pub use registry::{Entry, Registry};

#[doc(hidden)]
pub mod __private {
    #[cfg(feature = "enroll")]
    pub use crate::enroll::{Enrollment, ENROLLMENTS};
    #[cfg(feature = "enroll")]
    pub use linkme;
    pub use once_cell::sync::Lazy;
}

/// Enrolls a child type. Without the `enroll` feature children register on first use only.
#[cfg(not(feature = "enroll"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __enroll {
    ($child:ty, $base:ty, $args:ty) => {};
}

/// Declares a trait object type as a [`Base`] with its own process-wide registry table.
///
/// The trait must have [`Identity`] as a supertrait.
///
/// - `base!(dyn Trait)` declares a base whose children are constructed without arguments.
/// - `base!(dyn Trait, default = Type)` additionally constructs a default `Type` when
///   [`Factory::create`] is called with an empty name.
/// - `base!(dyn Trait, args = (T1, T2))` declares a base whose children are constructed from the given
///   arguments, forwarded verbatim to the child's constructor.
///
/// Each form accepts a trailing `info = "..."` replacing the generic [`Base::INFO`] description.
/// A trait may be declared more than once with different `args`, giving it one independent table per
/// argument signature.
///
/// # Example
///
/// ```
/// use registrar::{base, Identity};
///
/// trait Fruit: Identity {}
/// trait Shape: Identity {}
///
/// base!(dyn Fruit, info = "Something edible.");
/// base!(dyn Shape, args = (i32, i32));
/// ```
#[macro_export]
macro_rules! base {
    ($base:ty $(, info = $info:expr)? $(,)?) => {
        $crate::__base_impl!($base, (), [] $(, $info)?);
    };
    ($base:ty, default = $fallback:ty $(, info = $info:expr)? $(,)?) => {
        $crate::__base_impl!($base, (), [$fallback] $(, $info)?);
    };
    ($base:ty, args = $args:ty $(, info = $info:expr)? $(,)?) => {
        $crate::__base_impl!($base, $args, [] $(, $info)?);
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __base_impl {
    ($base:ty, $args:ty, [$($fallback:ty)?] $(, $info:expr)?) => {
        impl $crate::Base<$args> for $base {
            $(const INFO: &'static str = $info;)?

            fn registry() -> &'static $crate::Registry<Self, $args> {
                static REGISTRY: $crate::__private::Lazy<$crate::Registry<$base, $args>> =
                    $crate::__private::Lazy::new($crate::Registry::enrolled);
                &REGISTRY
            }

            $(
                fn fallback(_args: ()) -> ::std::option::Option<::std::boxed::Box<Self>> {
                    ::std::option::Option::Some(::std::boxed::Box::new(
                        <$fallback as ::std::default::Default>::default(),
                    ))
                }
            )?
        }
    };
}
