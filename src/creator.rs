//! Type-erased constructors for registered children.

use std::{any::TypeId, fmt};

use crate::{base::Base, child::Child};

/// Constructs one concrete child type for a base `B` from arguments `A`.
///
/// A creator is a function pointer plus the identity of the child it builds. It is `Copy`,
/// so registry tables hand out copies and release their lock before the child's constructor runs.
pub struct Creator<B: ?Sized, A> {
    type_id: TypeId,
    type_name: &'static str,
    construct: fn(A) -> Box<B>,
}

impl<B, A> Creator<B, A>
where
    B: Base<A> + ?Sized,
    A: 'static,
{
    /// Returns the creator for the child `C`.
    pub fn of<C>() -> Self
    where
        C: Child<B, A>,
    {
        Creator {
            type_id: TypeId::of::<C>(),
            type_name: std::any::type_name::<C>(),
            construct: C::construct,
        }
    }
}

impl<B: ?Sized, A> Creator<B, A> {
    /// Constructs a new instance of the child, upcast to the base.
    ///
    /// The caller receives exclusive ownership of the instance.
    #[inline]
    pub fn create(&self, args: A) -> Box<B> {
        (self.construct)(args)
    }

    /// The [`TypeId`] of the child this creator constructs.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The type name of the child this creator constructs.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl<B: ?Sized, A> Clone for Creator<B, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B: ?Sized, A> Copy for Creator<B, A> {}

impl<B: ?Sized, A> PartialEq for Creator<B, A> {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl<B: ?Sized, A> Eq for Creator<B, A> {}

impl<B: ?Sized, A> fmt::Debug for Creator<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creator")
            .field("type_name", &self.type_name)
            .finish()
    }
}
