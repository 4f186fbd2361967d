use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::Application;

/// The closed set of execution phases.
///
/// The discriminants are load-bearing: the scene-bookkeeping guard in the
/// application loop compares the live context against `DirectLevelSelect`
/// numerically, so every phase at or before the level select must keep a
/// smaller value than everything after it. Do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AppContext {
    GameBoot = 1,
    GameBootLogo = 2,
    GameIntro = 3,
    DirectStage = 4,
    DirectMovie = 5,
    DirectShineSelect = 6,
    DirectLevelSelect = 7,
    DirectSettingsMenu = 8,
    GameShutdown = 9,
}

impl AppContext {
    /// Every phase the dispatch table must cover before the loop starts.
    /// Shutdown is absent: the loop exits before ever dispatching it.
    pub const DISPATCHABLE: [AppContext; 8] = [
        AppContext::GameBoot,
        AppContext::GameBootLogo,
        AppContext::GameIntro,
        AppContext::DirectStage,
        AppContext::DirectMovie,
        AppContext::DirectShineSelect,
        AppContext::DirectLevelSelect,
        AppContext::DirectSettingsMenu,
    ];

    pub fn id(self) -> ContextId {
        ContextId(self as u8)
    }
}

/// Raw context identifier indexing the dispatch table. Extension contexts
/// beyond the closed enum live in the same 256-slot space.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContextId(pub u8);

impl ContextId {
    /// True when this context sits at or before `context` in phase order.
    pub fn at_or_before(self, context: AppContext) -> bool {
        self.0 <= context as u8
    }
}

impl From<AppContext> for ContextId {
    fn from(context: AppContext) -> Self {
        context.id()
    }
}

impl PartialEq<AppContext> for ContextId {
    fn eq(&self, other: &AppContext) -> bool {
        self.0 == *other as u8
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("context {0:?} has no registered handler")]
    MissingHandler(AppContext),
}

/// A context handler runs once per activation. Returning `true` skips the
/// per-frame body for that activation; it does not end the loop.
pub type ContextHandler = Box<dyn FnMut(&mut Application) -> bool>;

pub struct ContextDispatchTable {
    slots: Vec<Option<ContextHandler>>,
}

impl ContextDispatchTable {
    pub const CAPACITY: usize = 256;

    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(Self::CAPACITY);
        slots.resize_with(Self::CAPACITY, || None);
        ContextDispatchTable { slots }
    }

    /// Registers a handler. Returns false, leaving the slot untouched, when
    /// the context already has one; registration is append-only for the
    /// process lifetime.
    pub fn register(&mut self, context: impl Into<ContextId>, handler: ContextHandler) -> bool {
        let slot = &mut self.slots[context.into().0 as usize];
        if slot.is_some() {
            return false;
        }
        *slot = Some(handler);
        true
    }

    pub fn is_registered(&self, context: impl Into<ContextId>) -> bool {
        self.slots[context.into().0 as usize].is_some()
    }

    /// A reachable context without a handler is a missing registration, not
    /// bad input; dispatch refuses to guess and aborts.
    pub fn lookup_mut(&mut self, context: ContextId) -> &mut ContextHandler {
        match &mut self.slots[context.0 as usize] {
            Some(handler) => handler,
            None => panic!(
                "application attempted to fetch context handler {} but it wasn't found",
                context
            ),
        }
    }

    /// One-shot startup completeness check over the closed contexts.
    pub fn ensure_registered(&self, required: &[AppContext]) -> Result<(), DispatchError> {
        for &context in required {
            if !self.is_registered(context) {
                return Err(DispatchError::MissingHandler(context));
            }
        }
        Ok(())
    }
}

impl Default for ContextDispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_registration_for_a_context_is_rejected() {
        let mut table = ContextDispatchTable::new();
        assert!(table.register(AppContext::DirectStage, Box::new(|_| false)));
        assert!(!table.register(AppContext::DirectStage, Box::new(|_| true)));
        assert!(table.is_registered(AppContext::DirectStage));
    }

    #[test]
    fn rejected_registration_keeps_the_first_handler() {
        let mut table = ContextDispatchTable::new();
        table.register(AppContext::GameBoot, Box::new(|_| false));
        table.register(AppContext::GameBoot, Box::new(|_| true));

        // The surviving handler is the first one; its return value says so.
        // Calling through the slot needs an Application, so inspect the slot
        // indirectly: a fresh context is still free, the boot slot is not.
        assert!(table.is_registered(AppContext::GameBoot));
        assert!(!table.is_registered(AppContext::GameShutdown));
    }

    #[test]
    #[should_panic(expected = "context handler 9")]
    fn lookup_of_an_unregistered_context_aborts() {
        let mut table = ContextDispatchTable::new();
        table.lookup_mut(AppContext::GameShutdown.into());
    }

    #[test]
    fn completeness_check_names_the_missing_context() {
        let mut table = ContextDispatchTable::new();
        for context in AppContext::DISPATCHABLE {
            if context != AppContext::DirectMovie {
                table.register(context, Box::new(|_| false));
            }
        }

        let err = table
            .ensure_registered(&AppContext::DISPATCHABLE)
            .unwrap_err();
        assert_eq!(err, DispatchError::MissingHandler(AppContext::DirectMovie));
    }

    #[test]
    fn phase_ordering_tracks_the_level_select_boundary() {
        assert!(AppContext::GameBoot.id().at_or_before(AppContext::DirectLevelSelect));
        assert!(AppContext::DirectStage.id().at_or_before(AppContext::DirectLevelSelect));
        assert!(AppContext::DirectLevelSelect
            .id()
            .at_or_before(AppContext::DirectLevelSelect));
        assert!(!AppContext::DirectSettingsMenu
            .id()
            .at_or_before(AppContext::DirectLevelSelect));
        assert!(!AppContext::GameShutdown.id().at_or_before(AppContext::DirectLevelSelect));
    }

    #[test]
    fn extension_contexts_share_the_table() {
        let mut table = ContextDispatchTable::new();
        assert!(table.register(ContextId(200), Box::new(|_| false)));
        assert!(!table.register(ContextId(200), Box::new(|_| false)));
    }
}
