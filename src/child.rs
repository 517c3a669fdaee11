//! Children: concrete implementations registrable under a base.
//!
//! A child usually declares its base, constructor arguments and fixed name with `#[derive(Child)]`:
//!
//! ```
//! use registrar::{base, Child, Factory, Identity};
//!
//! trait Shape: Identity {
//!     fn area(&self) -> i32;
//! }
//!
//! base!(dyn Shape, args = (i32, i32));
//!
//! #[derive(Identity, Child)]
//! #[child(base = dyn Shape, args = (i32, i32), name = "rect")]
//! struct Rectangle {
//!     width: i32,
//!     height: i32,
//! }
//!
//! impl Rectangle {
//!     fn new(width: i32, height: i32) -> Self {
//!         Rectangle { width, height }
//!     }
//! }
//!
//! impl Shape for Rectangle {
//!     fn area(&self) -> i32 {
//!         self.width * self.height
//!     }
//! }
//!
//! assert_eq!(<Rectangle as Child<dyn Shape, _>>::get_name(), "rect");
//! assert_eq!(<dyn Shape>::create("rect", (3, 4)).unwrap().area(), 12);
//! ```
//!
//! # Self registration
//!
//! A child with a fixed [`NAME`](Child::NAME) registers itself the first time it is used through this trait,
//! for example by [`get_name`](Child::get_name) or [`activate`](Child::activate). With the `enroll` feature,
//! derived non-generic children are also collected at link time and registered the first time their base's
//! table is used, so they can be constructed by name before anything refers to the child type. Either way
//! registration happens at most once per child and name, and never depends on the order in which statics
//! are initialized.

use std::any::TypeId;

use crate::{
    base::{Base, Identity},
    creator::Creator,
    error::RegistryError,
};

/// A concrete implementation of the base `B`, constructed from arguments `A`.
pub trait Child<B, A = ()>: Identity + Sized
where
    B: Base<A> + ?Sized,
    A: 'static,
{
    /// Name the child registers itself under on first use, or `None` to stay unregistered until
    /// [`set_name`](Child::set_name) is called.
    const NAME: Option<&'static str> = None;

    /// Constructs a new instance from `args`, upcast to the base.
    fn construct(args: A) -> Box<B>;

    /// Returns the creator for this child.
    #[inline]
    fn creator() -> Creator<B, A> {
        Creator::of::<Self>()
    }

    /// Registers the child under [`NAME`](Child::NAME), unless this has already happened.
    ///
    /// Registration runs at most once per process. If the name has since been removed or the child
    /// renamed, activating again does nothing. A name already taken by another child is left untouched.
    #[inline]
    fn activate() {
        B::registry().activate::<Self>();
    }

    /// Returns the name the child is currently registered under, or an empty string.
    fn get_name() -> String {
        Self::activate();
        B::registry()
            .name_of(TypeId::of::<Self>())
            .unwrap_or_default()
    }

    /// Re-registers the child under `name`.
    ///
    /// The child's current name is unbound first. If `name` is empty or taken by another child the new
    /// registration fails, this returns `false`, and the removal is not undone: the child loses its previous
    /// name and stays registered only under other names it was bound to with
    /// [`Factory::set_child`](crate::Factory::set_child), if any. A warning is logged when a name is lost
    /// this way.
    #[inline]
    fn set_name(name: &str) -> bool {
        Self::try_set_name(name).is_ok()
    }

    /// Re-registers the child under `name`, returning why the new registration failed.
    ///
    /// See [`set_name`](Child::set_name) for how a failure affects the previous registration.
    fn try_set_name(name: &str) -> Result<(), RegistryError> {
        Self::activate();
        B::registry().rename::<Self>(name)
    }
}
