//! Base abstractions and the factory interface exposed on them.
//!
//! A base is a trait used as a trait object, such as `dyn Fruit`. Declaring it with [`base!`](crate::base)
//! implements [`Base`] for the trait object type, which gives it a process-wide [`Registry`] and, through the
//! blanket [`Factory`] implementation, the ability to construct any registered child by name:
//!
//! ```
//! use registrar::{base, Child, Factory, Identity};
//!
//! trait Fruit: Identity {
//!     fn color(&self) -> &'static str;
//! }
//!
//! base!(dyn Fruit);
//!
//! #[derive(Default, Identity, Child)]
//! #[child(base = dyn Fruit, name = "Apple")]
//! struct Apple;
//!
//! impl Fruit for Apple {
//!     fn color(&self) -> &'static str {
//!         "red"
//!     }
//! }
//!
//! <Apple as Child<dyn Fruit>>::activate();
//!
//! let apple = <dyn Fruit>::create("Apple", ()).unwrap();
//! assert_eq!(apple.color(), "red");
//! assert_eq!(apple.name(), "Apple");
//! assert!(<dyn Fruit>::create("BadApple", ()).is_none());
//! ```

use std::{any::TypeId, borrow::Cow, ptr::NonNull, sync::Arc};

use tracing::trace;

use crate::{child::Child, creator::Creator, error::RegistryError, registry::Registry};

/// Runtime identity of a concrete type behind a base handle.
///
/// Every base trait must have `Identity` as a supertrait, so that an instance reached through `dyn Base`
/// can report which registered child it is. Implement it with `#[derive(Identity)]`.
pub trait Identity: 'static {
    /// The [`TypeId`] of the concrete type.
    fn type_key(&self) -> TypeId;

    /// The type name of the concrete type.
    fn type_label(&self) -> &'static str;

    /// A short human readable description of the concrete type.
    ///
    /// # Default Implementation
    /// Returns `None`, letting [`Factory::info`] describe the instance from its registration.
    fn describe(&self) -> Option<Cow<'static, str>> {
        None
    }
}

/// A base abstraction children are registered under and constructed through.
///
/// `Base` is implemented for trait object types by the [`base!`](crate::base) macro, once per argument
/// signature `A` the base's children are constructed from. Most code uses the [`Factory`] methods rather
/// than this trait directly.
pub trait Base<A: 'static = ()>: Identity {
    /// Generic description of the base, reported by [`Factory::info`] for unregistered instances.
    const INFO: &'static str = "Register base class.";

    /// The process-wide table of children for this base and argument signature.
    ///
    /// The table is created on first use and lives for the remainder of the process.
    fn registry() -> &'static Registry<Self, A>;

    /// Instance constructed by [`Factory::create`] when called with an empty name.
    ///
    /// # Default Implementation
    /// Returns `None`. Bases declared with `base!(dyn Trait, default = Type)` return a default `Type`.
    #[allow(unused_variables)]
    fn fallback(args: A) -> Option<Box<Self>> {
        None
    }
}

/// Operations for registering and constructing the children of a base.
///
/// This trait is implemented for every [`Base`], and is the surface callers use:
///
/// - [`create`], [`create_unique`], [`create_shared`] and [`create_raw`] construct a child by name,
///   differing only in how ownership of the new instance is handed over.
/// - [`set_child`], [`remove_child`], [`has_child`] and [`children`] manage and query the registry table.
/// - [`name`] and [`info`] describe an existing instance.
///
/// [`create`]: Factory::create
/// [`create_unique`]: Factory::create_unique
/// [`create_shared`]: Factory::create_shared
/// [`create_raw`]: Factory::create_raw
/// [`set_child`]: Factory::set_child
/// [`remove_child`]: Factory::remove_child
/// [`has_child`]: Factory::has_child
/// [`children`]: Factory::children
/// [`name`]: Factory::name
/// [`info`]: Factory::info
pub trait Factory<A: 'static = ()>: Base<A> {
    /// Constructs the child registered under `name` from `args`.
    ///
    /// Returns `None` if no child is registered under `name`. An empty `name` returns [`Base::fallback`].
    /// The caller takes full ownership of the returned instance.
    fn create(name: &str, args: A) -> Option<Box<Self>> {
        if name.is_empty() {
            return Self::fallback(args);
        }

        match Self::registry().lookup(name) {
            Some(creator) => Some(creator.create(args)),
            None => {
                trace!(name, "no child registered");
                None
            }
        }
    }

    /// Constructs the child registered under `name`, returning an error if there is none.
    fn try_create(name: &str, args: A) -> Result<Box<Self>, RegistryError> {
        Self::create(name, args).ok_or_else(|| RegistryError::NotRegistered(name.to_string()))
    }

    /// Constructs the child registered under `name` behind an exclusively owned handle.
    ///
    /// The instance is released exactly once when the handle goes out of scope. The handle can be moved
    /// but not duplicated.
    #[inline]
    fn create_unique(name: &str, args: A) -> Option<Box<Self>> {
        Self::create(name, args)
    }

    /// Constructs the child registered under `name` behind a reference counted handle.
    ///
    /// The instance is released when the last clone of the handle is dropped.
    #[inline]
    fn create_shared(name: &str, args: A) -> Option<Arc<Self>> {
        Self::create(name, args).map(Arc::from)
    }

    /// Constructs the child registered under `name` and hands it over as a raw pointer.
    ///
    /// The caller is responsible for releasing the instance, by reconstructing the box with
    /// [`Box::from_raw`] exactly once. Failing to do so leaks the instance.
    #[inline]
    fn create_raw(name: &str, args: A) -> Option<NonNull<Self>> {
        Self::create(name, args).map(|instance| NonNull::from(Box::leak(instance)))
    }

    /// Returns `true` if a child is registered under `name`.
    #[inline]
    fn has_child(name: &str) -> bool {
        Self::registry().contains(name)
    }

    /// Removes the child registered under `name`, returning `true` if there was one.
    #[inline]
    fn remove_child(name: &str) -> bool {
        Self::registry().unbind(name)
    }

    /// Registers the child `C` under `name`.
    ///
    /// Returns `false` if `name` is empty or already registered, in which case nothing changes.
    #[inline]
    fn set_child<C>(name: &str) -> bool
    where
        C: Child<Self, A>,
    {
        Self::try_set_child::<C>(name).is_ok()
    }

    /// Registers the child `C` under `name`, returning why the registration was refused.
    fn try_set_child<C>(name: &str) -> Result<(), RegistryError>
    where
        C: Child<Self, A>,
    {
        Self::registry().try_bind(name, Creator::of::<C>())
    }

    /// Returns the names of all registered children in lexicographic order.
    #[inline]
    fn children() -> Vec<String> {
        Self::registry().names()
    }

    /// Returns the name this instance's concrete type is registered under, or an empty string.
    fn name(&self) -> String {
        Self::registry()
            .name_of(self.type_key())
            .unwrap_or_default()
    }

    /// Returns a short human readable description of this instance's concrete type.
    ///
    /// Types providing their own description through [`Identity::describe`] report it. Other registered
    /// types are described by their registered name, and unregistered ones by the base's [`Base::INFO`].
    fn info(&self) -> String {
        if let Some(description) = self.describe() {
            return description.into_owned();
        }

        match Self::registry().name_of(self.type_key()) {
            Some(name) => format!("Registered sub-class \"{name}\"."),
            None => Self::INFO.to_string(),
        }
    }
}

impl<B, A> Factory<A> for B
where
    B: Base<A> + ?Sized,
    A: 'static,
{
}
