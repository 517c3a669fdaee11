//! Registry tables mapping names to child creators.
//!
//! Every (base, argument signature) pair owns exactly one [`Registry`], created lazily by the [`base!`](crate::base)
//! macro the first time the base is used and kept for the remainder of the process. All operations on a table
//! take its lock for their whole duration, so a table may be shared freely between threads.

use std::{
    any::TypeId,
    collections::{HashMap, HashSet},
    fmt,
    sync::{Mutex, MutexGuard, Once, PoisonError},
};

use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, warn};

use crate::{base::Base, child::Child, creator::Creator, error::RegistryError};

/// A registered name and the child type bound to it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// The registered name.
    pub name: String,
    /// Type name of the child constructed under the name.
    pub type_name: &'static str,
}

/// A process-wide table of children for one base `B` and argument signature `A`.
pub struct Registry<B: ?Sized, A> {
    table: Mutex<Table<B, A>>,
    #[cfg_attr(not(feature = "enroll"), allow(dead_code))]
    enrolled: bool,
    #[cfg_attr(not(feature = "enroll"), allow(dead_code))]
    seeded: Once,
}

struct Table<B: ?Sized, A> {
    creators: HashMap<String, Creator<B, A>>,
    /// Preferred name per child type. Always bound to that type while present.
    identities: HashMap<TypeId, String>,
    /// Consumed one-shot activation flags, keyed by child and fixed name.
    activated: HashSet<(TypeId, &'static str)>,
}

impl<B: ?Sized, A> Table<B, A> {
    fn bind(&mut self, name: &str, creator: Creator<B, A>) -> Result<(), RegistryError> {
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if let Some(existing) = self.creators.get(name) {
            return Err(RegistryError::NameAlreadyRegistered {
                name: name.to_string(),
                type_name: existing.type_name(),
            });
        }

        // A type keeps its preferred name only while no older binding of it remains.
        let type_id = creator.type_id();
        if !self.identities.contains_key(&type_id)
            && !self.creators.values().any(|bound| bound.type_id() == type_id)
        {
            self.identities.insert(type_id, name.to_string());
        }
        self.creators.insert(name.to_string(), creator);
        Ok(())
    }

    fn unbind(&mut self, name: &str) -> Option<Creator<B, A>> {
        let creator = self.creators.remove(name)?;
        if self
            .identities
            .get(&creator.type_id())
            .is_some_and(|preferred| preferred == name)
        {
            self.identities.remove(&creator.type_id());
        }
        Some(creator)
    }

    fn name_of(&self, type_id: TypeId) -> Option<String> {
        self.identities.get(&type_id).cloned().or_else(|| {
            self.creators
                .iter()
                .filter(|(_, creator)| creator.type_id() == type_id)
                .map(|(name, _)| name)
                .min()
                .cloned()
        })
    }
}

impl<B: ?Sized, A> Registry<B, A> {
    /// Creates a new empty registry table.
    ///
    /// Bases normally get their table from [`Base::registry`], which the [`base!`](crate::base) macro backs
    /// with a lazily created static. Standalone tables are useful for scoped registries and tests, and only
    /// ever hold the children bound to them explicitly.
    pub fn new() -> Self {
        Self::with_enrollment(false)
    }

    /// Creates a registry table that registers every enrolled child of its base on first use.
    ///
    /// This is the table [`base!`](crate::base) declares for each base. Without the `enroll` feature it is
    /// the same as [`Registry::new`].
    pub fn enrolled() -> Self {
        Self::with_enrollment(true)
    }

    fn with_enrollment(enrolled: bool) -> Self {
        Registry {
            table: Mutex::new(Table {
                creators: HashMap::new(),
                identities: HashMap::new(),
                activated: HashSet::new(),
            }),
            enrolled,
            seeded: Once::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Table<B, A>> {
        // No operation leaves the maps half updated, so a panic elsewhere cannot poison the data itself.
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B, A> Registry<B, A>
where
    B: ?Sized + 'static,
    A: 'static,
{
    /// Binds `name` to `creator`.
    ///
    /// Returns `false` without modifying the table if the name is empty or already bound.
    pub fn bind(&self, name: &str, creator: Creator<B, A>) -> bool {
        self.try_bind(name, creator).is_ok()
    }

    /// Binds `name` to `creator`, returning why the binding was refused.
    pub fn try_bind(&self, name: &str, creator: Creator<B, A>) -> Result<(), RegistryError> {
        self.seed();
        let res = self.lock().bind(name, creator);
        match &res {
            Ok(()) => debug!(name, child = creator.type_name(), "bound child"),
            Err(err) => warn!(name, child = creator.type_name(), %err, "refused child binding"),
        }
        res
    }

    /// Removes the binding for `name`, returning `true` if one existed.
    pub fn unbind(&self, name: &str) -> bool {
        self.seed();
        match self.lock().unbind(name) {
            Some(creator) => {
                debug!(name, child = creator.type_name(), "unbound child");
                true
            }
            None => false,
        }
    }

    /// Returns the creator bound to `name`. Nothing is constructed.
    pub fn lookup(&self, name: &str) -> Option<Creator<B, A>> {
        self.seed();
        self.lock().creators.get(name).copied()
    }

    /// Returns `true` if a child is bound to `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.seed();
        self.lock().creators.contains_key(name)
    }

    /// Returns every bound name in lexicographic order.
    pub fn names(&self) -> Vec<String> {
        self.seed();
        self.lock().creators.keys().cloned().sorted().collect()
    }

    /// Returns every binding, ordered by name.
    pub fn entries(&self) -> Vec<Entry> {
        self.seed();
        self.lock()
            .creators
            .iter()
            .map(|(name, creator)| Entry {
                name: name.clone(),
                type_name: creator.type_name(),
            })
            .sorted_by(|a, b| a.name.cmp(&b.name))
            .collect()
    }

    /// Returns the name the child type `type_id` is currently registered under.
    ///
    /// A child bound under several names reports the name it was renamed to, or else the first name it was
    /// bound or activated under. Once that name is removed it reports the lexicographically smallest remaining
    /// one, even if the child is bound under new names later.
    pub fn name_of(&self, type_id: TypeId) -> Option<String> {
        self.seed();
        self.lock().name_of(type_id)
    }

    /// The number of bound names.
    pub fn len(&self) -> usize {
        self.seed();
        self.lock().creators.len()
    }

    /// Returns `true` if no names are bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes every binding.
    ///
    /// Consumed activation flags are kept, so children with a fixed name do not register themselves again.
    pub fn clear(&self) {
        self.seed();
        let mut table = self.lock();
        table.creators.clear();
        table.identities.clear();
    }

    /// Registers the child `C` under its fixed name, once per process.
    pub(crate) fn activate<C>(&self)
    where
        B: Base<A>,
        C: Child<B, A>,
    {
        self.seed();
        self.enroll::<C>();
    }

    /// Moves the child `C` from its current name to `name`.
    ///
    /// The old binding is not restored when `name` cannot be bound. `C` is then left registered only under
    /// the other names it may have been bound to, if any.
    pub(crate) fn rename<C>(&self, name: &str) -> Result<(), RegistryError>
    where
        B: Base<A>,
        C: Child<B, A>,
    {
        self.seed();
        let type_id = TypeId::of::<C>();
        let mut table = self.lock();
        let previous = table.name_of(type_id);
        if let Some(previous) = &previous {
            table.unbind(previous);
        }

        match table.bind(name, Creator::of::<C>()) {
            Ok(()) => {
                table.identities.insert(type_id, name.to_string());
                debug!(name, previous = ?previous, child = std::any::type_name::<C>(), "renamed child");
                Ok(())
            }
            Err(err) => {
                if let Some(previous) = previous {
                    match table.name_of(type_id) {
                        Some(remaining) => warn!(
                            name,
                            previous = %previous,
                            remaining = %remaining,
                            child = std::any::type_name::<C>(),
                            %err,
                            "rename failed after removing previous name",
                        ),
                        None => warn!(
                            name,
                            previous = %previous,
                            child = std::any::type_name::<C>(),
                            %err,
                            "rename failed after removing previous name, child is no longer registered",
                        ),
                    }
                }
                Err(err)
            }
        }
    }

    fn enroll<C>(&self)
    where
        B: Base<A>,
        C: Child<B, A>,
    {
        let Some(name) = C::NAME else {
            return;
        };

        let mut table = self.lock();
        if !table.activated.insert((TypeId::of::<C>(), name)) {
            return;
        }
        match table.bind(name, Creator::of::<C>()) {
            Ok(()) => debug!(name, child = std::any::type_name::<C>(), "activated child"),
            Err(err) => warn!(name, child = std::any::type_name::<C>(), %err, "child activation refused"),
        }
    }

    fn seed(&self) {
        #[cfg(feature = "enroll")]
        if self.enrolled {
            self.seeded.call_once(|| {
                for enrollment in crate::enroll::ENROLLMENTS {
                    enrollment.enroll(self);
                }
            });
        }
    }

    #[cfg(feature = "enroll")]
    pub(crate) fn enroll_erased<C>(registry: &dyn std::any::Any)
    where
        B: Base<A>,
        C: Child<B, A>,
    {
        if let Some(registry) = registry.downcast_ref::<Self>() {
            registry.enroll::<C>();
        }
    }
}

impl<B: ?Sized, A> Default for Registry<B, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ?Sized, A> fmt::Debug for Registry<B, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let table = self.lock();
        f.debug_struct("Registry")
            .field("creators", &table.creators)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        borrow::Cow,
        sync::{Arc, Barrier},
        thread,
    };

    use super::*;
    use crate::{base::Identity, Factory};

    trait Animal: Identity {
        fn sound(&self) -> &'static str;
    }

    crate::base!(dyn Animal);

    struct Dog;
    struct Cat;

    impl Identity for Dog {
        fn type_key(&self) -> TypeId {
            TypeId::of::<Self>()
        }

        fn type_label(&self) -> &'static str {
            std::any::type_name::<Self>()
        }

        fn describe(&self) -> Option<Cow<'static, str>> {
            Some(Cow::Borrowed("Barks."))
        }
    }

    impl Identity for Cat {
        fn type_key(&self) -> TypeId {
            TypeId::of::<Self>()
        }

        fn type_label(&self) -> &'static str {
            std::any::type_name::<Self>()
        }
    }

    impl Animal for Dog {
        fn sound(&self) -> &'static str {
            "woof"
        }
    }

    impl Animal for Cat {
        fn sound(&self) -> &'static str {
            "meow"
        }
    }

    impl Child<dyn Animal> for Dog {
        const NAME: Option<&'static str> = Some("dog");

        fn construct(_args: ()) -> Box<dyn Animal> {
            Box::new(Dog)
        }
    }

    impl Child<dyn Animal> for Cat {
        fn construct(_args: ()) -> Box<dyn Animal> {
            Box::new(Cat)
        }
    }

    #[test]
    fn bind_rejects_empty_and_duplicate_names() {
        let registry: Registry<dyn Animal, ()> = Registry::new();

        assert!(registry.bind("cat", Creator::of::<Cat>()));
        assert!(!registry.bind("", Creator::of::<Dog>()));
        assert_eq!(
            registry.try_bind("cat", Creator::of::<Dog>()),
            Err(RegistryError::NameAlreadyRegistered {
                name: "cat".to_string(),
                type_name: std::any::type_name::<Cat>(),
            })
        );

        let creator = registry.lookup("cat").unwrap();
        assert_eq!(creator.type_id(), TypeId::of::<Cat>());
        assert_eq!(creator.create(()).sound(), "meow");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unbind_frees_the_name() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.bind("pet", Creator::of::<Cat>());

        assert!(registry.unbind("pet"));
        assert!(!registry.unbind("pet"));
        assert!(!registry.contains("pet"));
        assert!(registry.lookup("pet").is_none());
        assert!(registry.is_empty());

        assert!(registry.bind("pet", Creator::of::<Dog>()));
        assert_eq!(registry.lookup("pet").unwrap().type_id(), TypeId::of::<Dog>());
    }

    #[test]
    fn names_are_sorted_regardless_of_insertion_order() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        for name in ["Banana", "Apple", "Cherry", "apple", "Apple2"] {
            registry.bind(name, Creator::of::<Cat>());
        }

        assert_eq!(
            registry.names(),
            vec!["Apple", "Apple2", "Banana", "Cherry", "apple"]
        );
    }

    #[test]
    fn name_of_prefers_first_binding_then_falls_back() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.bind("tom", Creator::of::<Cat>());
        registry.bind("felix", Creator::of::<Cat>());

        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("tom"));
        registry.unbind("tom");
        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("felix"));
        registry.unbind("felix");
        assert_eq!(registry.name_of(TypeId::of::<Cat>()), None);
    }

    #[test]
    fn entries_serialize_in_name_order() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.bind("whiskers", Creator::of::<Cat>());
        registry.bind("rex", Creator::of::<Dog>());

        let json = serde_json::to_value(registry.entries()).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "name": "rex", "type_name": std::any::type_name::<Dog>() },
                { "name": "whiskers", "type_name": std::any::type_name::<Cat>() },
            ])
        );
    }

    #[test]
    fn activation_runs_once_per_child() {
        let registry: Registry<dyn Animal, ()> = Registry::new();

        registry.activate::<Dog>();
        assert!(registry.contains("dog"));

        registry.unbind("dog");
        registry.activate::<Dog>();
        assert!(!registry.contains("dog"));

        // Unnamed children never register themselves.
        registry.activate::<Cat>();
        assert!(registry.is_empty());
    }

    #[test]
    fn name_of_keeps_older_bindings_over_later_ones() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.bind("tom", Creator::of::<Cat>());
        registry.bind("felix", Creator::of::<Cat>());
        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("tom"));

        registry.unbind("tom");
        registry.bind("zzz", Creator::of::<Cat>());
        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("felix"));

        registry.unbind("felix");
        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("zzz"));
    }

    #[test]
    fn failed_rename_keeps_other_bindings() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.activate::<Dog>();
        registry.bind("a", Creator::of::<Cat>());
        registry.bind("b", Creator::of::<Cat>());

        assert!(registry.rename::<Cat>("dog").is_err());
        assert_eq!(registry.name_of(TypeId::of::<Cat>()).as_deref(), Some("b"));
        assert_eq!(registry.names(), vec!["b", "dog"]);
    }

    #[test]
    fn clear_keeps_activation_flags() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.activate::<Dog>();
        registry.bind("whiskers", Creator::of::<Cat>());
        assert_eq!(registry.len(), 2);

        registry.clear();
        assert!(registry.is_empty());
        assert_eq!(registry.name_of(TypeId::of::<Cat>()), None);

        registry.activate::<Dog>();
        assert!(registry.is_empty());
    }

    #[test]
    fn rename_without_conflict_moves_the_binding() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.activate::<Dog>();

        assert!(registry.rename::<Dog>("hound").is_ok());
        assert_eq!(registry.names(), vec!["hound"]);
        assert_eq!(registry.name_of(TypeId::of::<Dog>()).as_deref(), Some("hound"));
    }

    #[test]
    fn rename_into_taken_name_leaves_child_unregistered() {
        let registry: Registry<dyn Animal, ()> = Registry::new();
        registry.activate::<Dog>();
        registry.bind("cat", Creator::of::<Cat>());

        let err = registry.rename::<Dog>("cat").unwrap_err();
        assert!(matches!(err, RegistryError::NameAlreadyRegistered { .. }));
        assert_eq!(registry.name_of(TypeId::of::<Dog>()), None);
        assert_eq!(registry.names(), vec!["cat"]);
    }

    #[test]
    fn concurrent_binds_have_a_single_winner() {
        let registry: Arc<Registry<dyn Animal, ()>> = Arc::new(Registry::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = Arc::clone(&registry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    if i % 2 == 0 {
                        registry.bind("contested", Creator::of::<Cat>())
                    } else {
                        registry.bind("contested", Creator::of::<Dog>())
                    }
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn poisoned_lock_is_recovered() {
        let registry: Arc<Registry<dyn Animal, ()>> = Arc::new(Registry::new());
        registry.bind("cat", Creator::of::<Cat>());

        let poisoner = Arc::clone(&registry);
        let _ = thread::spawn(move || {
            let _guard = poisoner.table.lock().unwrap();
            panic!("poison the table");
        })
        .join();

        assert!(registry.contains("cat"));
        assert!(registry.bind("dog", Creator::of::<Dog>()));
    }

    #[test]
    fn static_table_backs_the_factory() {
        <dyn Animal>::set_child::<Cat>("static-cat");
        let animal = <dyn Animal>::create("static-cat", ()).unwrap();
        assert_eq!(animal.sound(), "meow");
        assert_eq!(animal.name(), "static-cat");
        assert_eq!(animal.info(), "Registered sub-class \"static-cat\".");
    }
}
