//! Per-state behavior tables.
//!
//! Every gameplay entity is a small state machine. Instead of branching on
//! state and on the other body's category inside each entity, an entity
//! owns a [`BehaviorTable`] that maps:
//!
//! - each state to an optional **update handler**, run once per tick
//! - each state to an ordered list of **contact entries**, each a
//!   [`Category`] mask paired with a handler, consulted on every contact
//!
//! Adding a new category response means adding one table entry. Tables are
//! built once by the [`EntityRegistry`](crate::registry::EntityRegistry) and
//! shared between every entity of a kind through an `Arc`.
//!
//! # Dispatch Rules
//!
//! - The active state selects both the update handler and the contact list.
//! - The first contact entry whose mask intersects the other body's category
//!   wins. If none matches, the contact is ignored for this entity.
//! - States without entries (for example a terminal dying state) ignore all
//!   contacts and run no update logic.
//!
//! # Example
//!
//! ```
//! use brickfall_core::behavior::{Behavior, BehaviorTable};
//! use brickfall_core::category::Category;
//! use brickfall_core::entity::{Body, Contact, UpdateContext};
//!
//! #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
//! enum Lamp { Off, On }
//!
//! struct Switch { state: Lamp, table: BehaviorTable<Lamp, Switch> }
//!
//! impl Behavior for Switch {
//!     type State = Lamp;
//!     fn state(&self) -> Lamp { self.state }
//!     fn table(&self) -> &BehaviorTable<Lamp, Self> { &self.table }
//! }
//!
//! fn flip(switch: &mut Switch, _: &mut Body, _: &Contact) {
//!     switch.state = Lamp::On;
//! }
//!
//! let table = BehaviorTable::new().on_contact(Lamp::Off, Category::PLAYER, flip);
//! assert!(table.contact_handler(Lamp::Off, Category::SMALL_PLAYER).is_some());
//! assert!(table.contact_handler(Lamp::On, Category::SMALL_PLAYER).is_none());
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::category::Category;
use crate::entity::{Body, Contact, UpdateContext};

/// Per-tick handler for one state.
pub type UpdateHandler<E> = fn(&mut E, &mut Body, &mut UpdateContext<'_>);

/// Contact handler for one (state, category) entry.
pub type ContactHandler<E> = fn(&mut E, &mut Body, &Contact);

/// Read-only dispatch table for an entity kind `E` with states `S`.
pub struct BehaviorTable<S, E> {
    updates: HashMap<S, UpdateHandler<E>>,
    contacts: HashMap<S, Vec<(Category, ContactHandler<E>)>>,
}

impl<S, E> BehaviorTable<S, E>
where
    S: Copy + Eq + Hash,
{
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            updates: HashMap::new(),
            contacts: HashMap::new(),
        }
    }

    /// Sets the update handler for `state`, replacing any previous one.
    #[must_use]
    pub fn on_update(mut self, state: S, handler: UpdateHandler<E>) -> Self {
        self.updates.insert(state, handler);
        self
    }

    /// Appends a contact entry for `state`.
    ///
    /// # Arguments
    ///
    /// * `state` - State in which the entry is active
    /// * `mask` - Categories of the other body this entry responds to
    /// * `handler` - Response invoked with this entity's own manifold
    #[must_use]
    pub fn on_contact(mut self, state: S, mask: Category, handler: ContactHandler<E>) -> Self {
        self.contacts.entry(state).or_default().push((mask, handler));
        self
    }

    /// Returns the update handler for `state`.
    #[must_use]
    pub fn update_handler(&self, state: S) -> Option<UpdateHandler<E>> {
        self.updates.get(&state).copied()
    }

    /// Returns the first contact handler in `state` whose mask intersects
    /// `other`.
    #[must_use]
    pub fn contact_handler(&self, state: S, other: Category) -> Option<ContactHandler<E>> {
        self.contacts
            .get(&state)?
            .iter()
            .find(|(mask, _)| mask.intersects(other))
            .map(|(_, handler)| *handler)
    }

    /// Number of contact entries registered for `state`.
    #[must_use]
    pub fn contact_entries(&self, state: S) -> usize {
        self.contacts.get(&state).map_or(0, Vec::len)
    }
}

impl<S, E> Default for BehaviorTable<S, E>
where
    S: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug, E> fmt::Debug for BehaviorTable<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut updates: Vec<String> = self.updates.keys().map(|s| format!("{s:?}")).collect();
        updates.sort();
        let mut contacts: Vec<String> = self
            .contacts
            .iter()
            .map(|(s, entries)| format!("{s:?}: {}", entries.len()))
            .collect();
        contacts.sort();
        f.debug_struct("BehaviorTable")
            .field("updates", &updates)
            .field("contacts", &contacts)
            .finish()
    }
}

/// An entity driven by a [`BehaviorTable`].
///
/// Implementors expose their active state and table; the provided methods
/// perform the lookup and invoke the handler.
pub trait Behavior: Sized {
    /// Closed set of states for this entity kind.
    type State: Copy + Eq + Hash + fmt::Debug;

    /// Currently active state.
    fn state(&self) -> Self::State;

    /// Dispatch table for this entity kind.
    fn table(&self) -> &BehaviorTable<Self::State, Self>;

    /// Runs the update handler of the active state, if any.
    fn tick(&mut self, body: &mut Body, ctx: &mut UpdateContext<'_>) {
        let handler = self.table().update_handler(self.state());
        if let Some(handler) = handler {
            handler(self, body, ctx);
        }
    }

    /// Runs the contact handler of the active state for the other body's
    /// category.
    ///
    /// # Returns
    ///
    /// `true` if an entry matched and its handler ran.
    fn react(&mut self, body: &mut Body, contact: &Contact) -> bool {
        let handler = self
            .table()
            .contact_handler(self.state(), contact.other.category);
        match handler {
            Some(handler) => {
                handler(self, body, contact);
                true
            }
            None => false,
        }
    }
}
