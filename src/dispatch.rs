//! Search dispatch decisions and request ordering.
//!
//! Given the filter state after an event, [`plan`] decides whether the
//! people search goes to the directory, is answered locally with an empty
//! list, or is held back because the typed text is still too short.
//!
//! Overlapping requests are not cancelled. Every request takes a token from
//! its class's [`RequestSequence`]; a response is applied only while its
//! token is still the latest one issued for that class.

use serde::Serialize;

use crate::filters::{FilterChange, FilterState, SearchQuery, MIN_SEARCH_CHARS};

/// Where the search box state machine sits for a given filter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DispatchPhase {
    /// No text, no facet: results cleared locally.
    Idle,
    /// No text but some facet active: query the directory with facets only.
    FilteredNoText,
    /// 1-2 characters typed: nothing is sent, results stay as they are.
    PendingText,
    /// Enough text typed: query the directory with it.
    Searching,
}

pub fn phase(state: &FilterState) -> DispatchPhase {
    match state.search_len() {
        0 if !state.has_facet() => DispatchPhase::Idle,
        0 => DispatchPhase::FilteredNoText,
        len if len < MIN_SEARCH_CHARS => DispatchPhase::PendingText,
        _ => DispatchPhase::Searching,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPlan {
    /// Empty the result list without calling the directory.
    ClearLocal,
    /// Leave the result list untouched and send nothing.
    Hold,
    /// Send this query to the directory.
    Issue(SearchQuery),
}

/// Decide what a filter change triggers.
///
/// Search-box edits follow the [`DispatchPhase`] machine. Facet changes
/// (department, location, title, letter) always forward whatever narrowing
/// is left, including short text kept from the search box, unless nothing is
/// left at all.
pub fn plan(change: FilterChange, state: &FilterState) -> DispatchPlan {
    match change {
        FilterChange::SearchEdited | FilterChange::SearchCleared => match phase(state) {
            DispatchPhase::Idle => DispatchPlan::ClearLocal,
            DispatchPhase::PendingText => DispatchPlan::Hold,
            DispatchPhase::FilteredNoText | DispatchPhase::Searching => {
                DispatchPlan::Issue(state.to_query())
            }
        },
        _ => {
            let query = state.to_query();
            if query.is_empty() {
                DispatchPlan::ClearLocal
            } else {
                DispatchPlan::Issue(query)
            }
        }
    }
}

/// Independent request streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestClass {
    Tree,
    Search,
    Metadata,
}

impl RequestClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestClass::Tree => "tree",
            RequestClass::Search => "search",
            RequestClass::Metadata => "metadata",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic token source for one request class.
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: u64,
}

impl RequestSequence {
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    /// Invalidate every outstanding token without starting a request, e.g.
    /// when results are cleared locally.
    pub fn supersede(&mut self) {
        self.latest += 1;
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 == self.latest
    }
}
