//! Action types and the dispatch boundary.
//!
//! Action type names come from a compile-time constant table: each symbolic
//! tag maps to its own name, so there is exactly one spelling of every
//! action type in the program.

/// Declare an enum of action types whose names are their own identifiers.
///
/// ```
/// ffr_store::action_constants! {
///     pub enum PodAction {
///         Refresh,
///         Delete,
///     }
/// }
///
/// assert_eq!(PodAction::Refresh.name(), "Refresh");
/// assert_eq!(PodAction::ALL.len(), 2);
/// ```
#[macro_export]
macro_rules! action_constants {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$variant_meta:meta])* $variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($(#[$variant_meta])* $variant),+
        }

        impl $name {
            /// Every action type, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name of the action type.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.name())
            }
        }

        impl From<$name> for &'static str {
            fn from(value: $name) -> Self {
                value.name()
            }
        }
    };
}

action_constants! {
    /// Action types understood by a list model.
    pub enum ListActionType {
        /// Merge a partial query and fetch if the fingerprint changed.
        SetQuery,
        /// Fetch the current query again.
        Refetch,
        /// A fetch completed with data.
        FetchSucceeded,
        /// A fetch completed with an error.
        FetchFailed,
        /// Replace the single selection.
        SetSelection,
        /// Replace the multi selection.
        SetSelections,
    }
}

/// Anything that can be dispatched to a reducer.
pub trait Action {
    fn action_type(&self) -> &'static str;
}

/// An action that can hand out a payload of type `P`.
///
/// Returns `None` when this action kind carries no `P`.
pub trait PayloadOf<P>: Action {
    fn payload_of(&self) -> Option<P>;
}

/// A `{ type, payload }` action for ad-hoc state slices.
#[derive(Debug, Clone, PartialEq)]
pub struct PayloadAction<P> {
    pub action_type: &'static str,
    pub payload: P,
}

impl<P> PayloadAction<P> {
    pub fn new(action_type: impl Into<&'static str>, payload: P) -> Self {
        Self {
            action_type: action_type.into(),
            payload,
        }
    }
}

impl<P> Action for PayloadAction<P> {
    fn action_type(&self) -> &'static str {
        self.action_type
    }
}

impl<P: Clone> PayloadOf<P> for PayloadAction<P> {
    fn payload_of(&self) -> Option<P> {
        Some(self.payload.clone())
    }
}
