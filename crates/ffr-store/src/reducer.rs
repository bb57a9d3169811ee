//! Reducer composition.
//!
//! A reducer is a pure function `(state, action) -> state`. Small reducers
//! each own one concern (a loading flag, a payload slot) and are chained with
//! [`serial_reducer`] so that every stage sees the previous stage's output.

use crate::action::PayloadOf;

/// A pure state transition.
pub trait Reducer<S, A: ?Sized> {
    fn reduce(&self, state: S, action: &A) -> S;
}

impl<S, A: ?Sized, R> Reducer<S, A> for R
where
    R: Fn(S, &A) -> S,
{
    fn reduce(&self, state: S, action: &A) -> S {
        self(state, action)
    }
}

/// Replaces the state with the payload of one action type.
#[derive(Debug, Clone)]
pub struct PayloadReducer<S> {
    action_type: &'static str,
    initial: S,
}

impl<S: Clone> PayloadReducer<S> {
    pub fn action_type(&self) -> &'static str {
        self.action_type
    }

    /// State before any matching action was seen.
    pub fn initial_state(&self) -> S {
        self.initial.clone()
    }

    pub fn reduce<A: PayloadOf<S> + ?Sized>(&self, state: S, action: &A) -> S {
        if action.action_type() != self.action_type {
            return state;
        }
        action.payload_of().unwrap_or(state)
    }
}

/// Reducer that takes the payload of `action_type` as the new state.
///
/// Any other action leaves the state untouched. The payload replaces the
/// state as a whole; nothing is merged.
pub fn reduce_to_payload<S: Clone>(
    action_type: impl Into<&'static str>,
    initial: S,
) -> PayloadReducer<S> {
    PayloadReducer {
        action_type: action_type.into(),
        initial,
    }
}

/// Boxed reducer stage.
pub type BoxReducer<S, A> = Box<dyn Fn(S, &A) -> S>;

/// Reducers applied one after another over the same state.
pub struct SerialReducer<S, A: ?Sized> {
    stages: Vec<BoxReducer<S, A>>,
}

impl<S, A: ?Sized> SerialReducer<S, A> {
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Append another stage.
    #[must_use]
    pub fn then(mut self, stage: impl Fn(S, &A) -> S + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }
}

impl<S, A: ?Sized> Reducer<S, A> for SerialReducer<S, A> {
    fn reduce(&self, state: S, action: &A) -> S {
        self.stages
            .iter()
            .fold(state, |state, stage| stage(state, action))
    }
}

/// Compose reducers: `serial_reducer(r1, [r2])` reduces as `r2(r1(s, a), a)`.
pub fn serial_reducer<S, A: ?Sized>(
    first: impl Fn(S, &A) -> S + 'static,
    rest: impl IntoIterator<Item = BoxReducer<S, A>>,
) -> SerialReducer<S, A> {
    let mut stages: Vec<BoxReducer<S, A>> = vec![Box::new(first)];
    stages.extend(rest);
    SerialReducer { stages }
}

/// Lift a [`PayloadReducer`] that owns one field of a larger state into a stage.
pub fn payload_stage<S, P, A>(
    reducer: PayloadReducer<P>,
    get: impl Fn(&mut S) -> &mut P + 'static,
) -> BoxReducer<S, A>
where
    P: Clone + 'static,
    A: PayloadOf<P> + ?Sized + 'static,
    S: 'static,
{
    Box::new(move |mut state: S, action: &A| {
        let slot = get(&mut state);
        let current = slot.clone();
        *slot = reducer.reduce(current, action);
        state
    })
}
