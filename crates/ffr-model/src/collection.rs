//! Pure operations over ordered record sequences.
//!
//! None of these functions mutate their input. Lookups return `None` rather
//! than failing, and paging past the end yields an empty slice.
//!
//! `other_member` and the lookups are linear scans; they are meant for the
//! page-sized collections a list screen holds, not for large data sets.

use std::borrow::Cow;
use std::cmp::Ordering;

use serde_json::Value;

use crate::query::{Paging, SortDirection, SortSpec};

/// A record with a unique identity field.
pub trait Identified {
    type Id: PartialEq;

    fn id(&self) -> &Self::Id;
}

/// Read access to a record's fields by name, for search and sort.
pub trait FieldAccess {
    /// Text of the named field, or `None` if the record has no such field.
    fn field_text(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Names of the fields this record carries.
    fn field_names(&self) -> Vec<String>;
}

static JSON_NULL: Value = Value::Null;

impl Identified for Value {
    type Id = Value;

    /// The `id` member of a JSON object (`null` when absent).
    fn id(&self) -> &Value {
        self.get("id").unwrap_or(&JSON_NULL)
    }
}

impl FieldAccess for Value {
    fn field_text(&self, name: &str) -> Option<Cow<'_, str>> {
        json_text(self.get(name)?)
    }

    fn field_names(&self) -> Vec<String> {
        self.as_object()
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Text form of a JSON scalar; `null` has none.
pub fn json_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        other => Some(Cow::Owned(other.to_string())),
    }
}

/// First record whose identity equals `id`.
pub fn find_by_id<'a, T: Identified>(seq: &'a [T], id: &T::Id) -> Option<&'a T> {
    seq.iter().find(|record| record.id() == id)
}

/// First record satisfying `predicate`.
pub fn find_by_condition<T, P>(seq: &[T], predicate: P) -> Option<&T>
where
    P: FnMut(&&T) -> bool,
{
    seq.iter().find(predicate)
}

/// Records satisfying `predicate`, in their original order.
pub fn collection_where<T, P>(seq: &[T], mut predicate: P) -> Vec<T>
where
    T: Clone,
    P: FnMut(&T) -> bool,
{
    seq.iter().filter(|record| predicate(record)).cloned().collect()
}

/// Members of `all` that do not appear in `exclude`, keeping `all`'s order.
pub fn other_member<T: PartialEq + Clone>(all: &[T], exclude: &[T]) -> Vec<T> {
    all.iter()
        .filter(|member| !exclude.contains(member))
        .cloned()
        .collect()
}

/// Records where any of `fields` contains `term` (case-sensitive).
///
/// An absent or empty term returns the input itself.
pub fn search_list<'a, T, S>(seq: &'a [T], term: Option<&str>, fields: &[S]) -> Cow<'a, [T]>
where
    T: FieldAccess + Clone,
    S: AsRef<str>,
{
    let Some(term) = term.filter(|t| !t.is_empty()) else {
        return Cow::Borrowed(seq);
    };
    Cow::Owned(collection_where(seq, |record| {
        fields.iter().any(|field| {
            record
                .field_text(field.as_ref())
                .is_some_and(|text| text.contains(term))
        })
    }))
}

/// Field names across `seq` in first-seen order.
pub fn field_union<T: FieldAccess>(seq: &[T]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for record in seq {
        for name in record.field_names() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }
    names
}

/// The records on the given 1-based page.
pub fn page_list<'a, T>(seq: &'a [T], paging: &Paging) -> &'a [T] {
    let start = paging.offset();
    if start >= seq.len() {
        return &[];
    }
    let end = start.saturating_add(paging.page_size()).min(seq.len());
    &seq[start..end]
}

/// Stable sort by the text of a named field. Records missing the field sort last.
pub fn sort_list<T: FieldAccess + Clone>(seq: &[T], sort: &SortSpec) -> Vec<T> {
    let mut sorted = seq.to_vec();
    sorted.sort_by(|a, b| {
        match (a.field_text(&sort.field), b.field_text(&sort.field)) {
            (Some(x), Some(y)) => {
                let ordering = compare_text(&x, &y);
                match sort.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    sorted
}

// Numbers compare numerically, everything else lexically.
fn compare_text(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}
