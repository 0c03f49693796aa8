//! Optimistic mutation engine.
//!
//! A mutation moves through `Idle -> Optimistic -> {Reconciled | RolledBack}`:
//!   1. [`Optimistic::apply`] captures the current state and computes the
//!      optimistic one, which the caller publishes right away.
//!   2. The caller awaits the remote call.
//!   3. [`Optimistic::settle`] turns the remote outcome into the state to
//!      publish next: on success the remote value is merged into whatever is
//!      published at that moment, on failure the captured state comes back.
//!
//! Both steps produce a whole state value, so observers never see a
//! half-applied change. Nothing here orders concurrent mutations on the same
//! entity: when two are in flight the last one to settle wins.

/// A locally applied change waiting for its remote confirmation.
#[derive(Debug, Clone)]
pub struct Optimistic<S> {
    previous: S,
    applied: S,
}

/// Terminal state of a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settled<S, E> {
    /// Remote confirmed; `S` carries any server-assigned fields.
    Reconciled(S),
    /// Remote rejected; `state` is the value captured before the mutation.
    RolledBack { state: S, error: E },
}

impl<S: Clone> Optimistic<S> {
    /// Apply a fallible transformation. A structural error leaves nothing to
    /// publish and is returned as-is.
    pub fn apply<E, F>(current: &S, mutate: F) -> Result<Self, E>
    where
        F: FnOnce(&S) -> Result<S, E>,
    {
        let applied = mutate(current)?;
        Ok(Self {
            previous: current.clone(),
            applied,
        })
    }

    pub fn map<F>(current: &S, mutate: F) -> Self
    where
        F: FnOnce(&S) -> S,
    {
        Self {
            previous: current.clone(),
            applied: mutate(current),
        }
    }

    /// A mutation with no local effect until the remote answers, e.g. one
    /// that needs a server-assigned id.
    pub fn unchanged(current: &S) -> Self {
        Self {
            previous: current.clone(),
            applied: current.clone(),
        }
    }

    pub fn previous(&self) -> &S {
        &self.previous
    }

    /// State to publish while the remote call is in flight.
    pub fn applied(&self) -> &S {
        &self.applied
    }

    /// Resolve against the remote outcome. `published` is the state observers
    /// see at completion time; `reconcile` merges the remote value into it.
    pub fn settle<T, E, F>(self, published: S, outcome: Result<T, E>, reconcile: F) -> Settled<S, E>
    where
        F: FnOnce(S, T) -> S,
    {
        match outcome {
            Ok(value) => Settled::Reconciled(reconcile(published, value)),
            Err(error) => Settled::RolledBack {
                state: self.previous,
                error,
            },
        }
    }

    /// Settle a mutation whose remote call returns nothing to merge.
    pub fn confirm<E>(self, published: S, outcome: Result<(), E>) -> Settled<S, E> {
        self.settle(published, outcome, |state, ()| state)
    }
}

impl<S, E> Settled<S, E> {
    pub fn state(&self) -> &S {
        match self {
            Settled::Reconciled(state) => state,
            Settled::RolledBack { state, .. } => state,
        }
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Settled::RolledBack { .. })
    }

    pub fn into_parts(self) -> (S, Result<(), E>) {
        match self {
            Settled::Reconciled(state) => (state, Ok(())),
            Settled::RolledBack { state, error } => (state, Err(error)),
        }
    }
}
