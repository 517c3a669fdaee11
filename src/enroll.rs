//! Link-time collection of children with fixed names.
//!
//! `#[derive(Child)]` places an [`Enrollment`] for every non-generic child with a fixed name into the
//! [`ENROLLMENTS`] distributed slice. The slice is assembled by the linker, so no code runs at startup.
//! Each registry table walks the slice once, the first time it is used, and activates the children that
//! belong to it.

use std::any::Any;

use linkme::distributed_slice;

use crate::{base::Base, child::Child, registry::Registry};

/// Every enrolled child in the program, across all bases.
#[distributed_slice]
pub static ENROLLMENTS: [Enrollment];

/// Activates one child in the registry table it belongs to.
pub struct Enrollment {
    enroll: fn(&dyn Any),
}

impl Enrollment {
    /// Enrollment of the child `C` into the table for base `B` and arguments `A`.
    pub const fn new<C, B, A>() -> Self
    where
        C: Child<B, A>,
        B: Base<A> + ?Sized,
        A: 'static,
    {
        Enrollment {
            enroll: Registry::<B, A>::enroll_erased::<C>,
        }
    }

    /// Activates the child if `registry` is the table it belongs to.
    pub(crate) fn enroll(&self, registry: &dyn Any) {
        (self.enroll)(registry)
    }
}

impl std::fmt::Debug for Enrollment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enrollment").finish_non_exhaustive()
    }
}

/// Enrolls a child type. Used by `#[derive(Child)]`.
#[doc(hidden)]
#[macro_export]
macro_rules! __enroll {
    ($child:ty, $base:ty, $args:ty) => {
        const _: () = {
            #[$crate::__private::linkme::distributed_slice($crate::__private::ENROLLMENTS)]
            #[linkme(crate = $crate::__private::linkme)]
            static ENROLLMENT: $crate::__private::Enrollment =
                $crate::__private::Enrollment::new::<$child, $base, $args>();
        };
    };
}
