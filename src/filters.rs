//! Filter state and its cross-dimension reset rules.
//!
//! Five dimensions narrow the people listing: free-text search, department,
//! office location, job title and starting letter. Each change event first
//! resets the dimensions listed for it in [`RESET_RULES`], then writes the
//! changed dimension. The state is a plain value: `apply` returns the next
//! state and never mutates the old one.

use serde::Serialize;

/// Free-text input shorter than this never reaches the directory.
pub const MIN_SEARCH_CHARS: usize = 3;

/// Letters offered by the alphabet strip.
pub const ALPHABET: [char; 26] = [
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R',
    'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Dimension {
    Department,
    Location,
    Title,
    SearchText,
    Letter,
}

/// Kind of change, used to look up the reset set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterChange {
    DepartmentSelected,
    LocationSelected,
    TitleSelected,
    SearchEdited,
    SearchCleared,
    LetterToggled,
}

/// Dimensions reset by each change, before the changed dimension is written.
/// Evaluated first-match.
pub const RESET_RULES: &[(FilterChange, &[Dimension])] = &[
    (
        FilterChange::DepartmentSelected,
        &[
            Dimension::Location,
            Dimension::Title,
            Dimension::SearchText,
            Dimension::Letter,
        ],
    ),
    (FilterChange::LocationSelected, &[Dimension::Department]),
    (FilterChange::TitleSelected, &[]),
    (
        FilterChange::SearchEdited,
        &[Dimension::Department, Dimension::Letter],
    ),
    (FilterChange::SearchCleared, &[]),
    (FilterChange::LetterToggled, &[Dimension::SearchText]),
];

pub fn resets_for(change: FilterChange) -> &'static [Dimension] {
    RESET_RULES
        .iter()
        .find(|(c, _)| *c == change)
        .map(|(_, dims)| *dims)
        .unwrap_or(&[])
}

/// A user interaction on the filter bar.
///
/// `None` selections are the "All ..." choices and clear their dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterEvent {
    DepartmentSelected(Option<String>),
    LocationSelected(Option<String>),
    TitleSelected(Option<String>),
    /// New content of the search box, empty when cleared.
    SearchInput(String),
    LetterToggled(Option<char>),
}

impl FilterEvent {
    pub fn change(&self) -> FilterChange {
        match self {
            FilterEvent::DepartmentSelected(_) => FilterChange::DepartmentSelected,
            FilterEvent::LocationSelected(_) => FilterChange::LocationSelected,
            FilterEvent::TitleSelected(_) => FilterChange::TitleSelected,
            FilterEvent::SearchInput(text) if text.is_empty() => FilterChange::SearchCleared,
            FilterEvent::SearchInput(_) => FilterChange::SearchEdited,
            FilterEvent::LetterToggled(_) => FilterChange::LetterToggled,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub search_text: String,
    pub department: Option<String>,
    pub location: Option<String>,
    pub title: Option<String>,
    pub letter: Option<char>,
}

impl FilterState {
    /// Reducer: old state + event -> new state.
    pub fn apply(&self, event: &FilterEvent) -> FilterState {
        let mut next = self.clone();
        for dim in resets_for(event.change()) {
            next.clear(*dim);
        }
        match event {
            FilterEvent::DepartmentSelected(value) => next.department = non_empty(value),
            FilterEvent::LocationSelected(value) => next.location = non_empty(value),
            FilterEvent::TitleSelected(value) => next.title = non_empty(value),
            FilterEvent::SearchInput(text) => next.search_text = text.clone(),
            FilterEvent::LetterToggled(letter) => {
                let letter = letter.map(|c| c.to_ascii_uppercase());
                next.letter = if letter.is_some() && letter == self.letter {
                    None
                } else {
                    letter
                };
            }
        }
        next
    }

    pub fn clear(&mut self, dim: Dimension) {
        match dim {
            Dimension::Department => self.department = None,
            Dimension::Location => self.location = None,
            Dimension::Title => self.title = None,
            Dimension::SearchText => self.search_text.clear(),
            Dimension::Letter => self.letter = None,
        }
    }

    /// Number of characters typed in the search box.
    pub fn search_len(&self) -> usize {
        self.search_text.chars().count()
    }

    /// Free text when present, otherwise the selected letter.
    pub fn effective_query(&self) -> Option<String> {
        if !self.search_text.is_empty() {
            Some(self.search_text.clone())
        } else {
            self.letter.map(|c| c.to_string())
        }
    }

    /// Any narrowing besides free text.
    pub fn has_facet(&self) -> bool {
        self.department.is_some()
            || self.location.is_some()
            || self.title.is_some()
            || self.letter.is_some()
    }

    /// True when the listing shows search results rather than the whole tree.
    pub fn is_narrowed(&self) -> bool {
        self.search_len() >= MIN_SEARCH_CHARS
            || self.letter.is_some()
            || self.department.is_some()
            || self.location.is_some()
            || self.title.is_some()
    }

    /// Parameters for the remote people search.
    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            query: self.effective_query(),
            department: self.department.clone(),
            location: self.location.clone(),
            title: self.title.clone(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Arguments of a flat people search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl SearchQuery {
    pub fn is_empty(&self) -> bool {
        self.query.is_none()
            && self.department.is_none()
            && self.location.is_none()
            && self.title.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_state() -> FilterState {
        FilterState {
            search_text: "mar".to_string(),
            department: Some("Sales".to_string()),
            location: Some("Rome".to_string()),
            title: Some("Manager".to_string()),
            letter: Some('M'),
        }
    }

    #[test]
    fn test_every_change_has_a_rule() {
        for change in [
            FilterChange::DepartmentSelected,
            FilterChange::LocationSelected,
            FilterChange::TitleSelected,
            FilterChange::SearchEdited,
            FilterChange::SearchCleared,
            FilterChange::LetterToggled,
        ] {
            assert!(RESET_RULES.iter().any(|(c, _)| *c == change), "{:?}", change);
        }
    }

    #[test]
    fn test_department_resets_everything_else() {
        let next = full_state().apply(&FilterEvent::DepartmentSelected(Some("IT".into())));
        assert_eq!(
            next,
            FilterState {
                department: Some("IT".to_string()),
                ..FilterState::default()
            }
        );
    }

    #[test]
    fn test_all_departments_clears_to_default() {
        let next = full_state().apply(&FilterEvent::DepartmentSelected(None));
        assert_eq!(next, FilterState::default());
        let next = full_state().apply(&FilterEvent::DepartmentSelected(Some(String::new())));
        assert_eq!(next, FilterState::default());
    }

    #[test]
    fn test_location_resets_department_keeps_text_and_letter() {
        let prior = full_state();
        let next = prior.apply(&FilterEvent::LocationSelected(Some("Milan".into())));
        assert_eq!(next.department, None);
        assert_eq!(next.location.as_deref(), Some("Milan"));
        assert_eq!(next.title, prior.title);
        assert_eq!(next.search_text, prior.search_text);
        assert_eq!(next.letter, prior.letter);
    }

    #[test]
    fn test_sales_then_rome() {
        let state = FilterState::default()
            .apply(&FilterEvent::DepartmentSelected(Some("Sales".into())))
            .apply(&FilterEvent::LocationSelected(Some("Rome".into())));
        assert_eq!(state.department, None);
        assert_eq!(state.location.as_deref(), Some("Rome"));
    }

    #[test]
    fn test_title_is_additive() {
        let prior = full_state();
        let next = prior.apply(&FilterEvent::TitleSelected(Some("Director".into())));
        assert_eq!(next.title.as_deref(), Some("Director"));
        assert_eq!(next.department, prior.department);
        assert_eq!(next.location, prior.location);
        assert_eq!(next.search_text, prior.search_text);
        assert_eq!(next.letter, prior.letter);
    }

    #[test]
    fn test_search_edit_resets_department_and_letter() {
        let next = full_state().apply(&FilterEvent::SearchInput("anna".into()));
        assert_eq!(next.search_text, "anna");
        assert_eq!(next.department, None);
        assert_eq!(next.letter, None);
        assert_eq!(next.location.as_deref(), Some("Rome"));
        assert_eq!(next.title.as_deref(), Some("Manager"));
    }

    #[test]
    fn test_search_cleared_keeps_facets() {
        let next = full_state().apply(&FilterEvent::SearchInput(String::new()));
        assert_eq!(next.search_text, "");
        assert_eq!(next.department.as_deref(), Some("Sales"));
        assert_eq!(next.letter, Some('M'));
    }

    #[test]
    fn test_letter_toggle_clears_text_and_toggles() {
        let state = full_state().apply(&FilterEvent::LetterToggled(Some('b')));
        assert_eq!(state.letter, Some('B'));
        assert_eq!(state.search_text, "");
        assert_eq!(state.department.as_deref(), Some("Sales"));

        let state = state.apply(&FilterEvent::LetterToggled(Some('B')));
        assert_eq!(state.letter, None);
    }

    #[test]
    fn test_toggle_same_letter_twice_returns_to_none() {
        let state = FilterState::default()
            .apply(&FilterEvent::LetterToggled(Some('K')))
            .apply(&FilterEvent::LetterToggled(Some('K')));
        assert_eq!(state.letter, None);
    }

    #[test]
    fn test_apply_leaves_old_state_untouched() {
        let prior = full_state();
        let _ = prior.apply(&FilterEvent::DepartmentSelected(None));
        assert_eq!(prior, full_state());
    }

    #[test]
    fn test_effective_query_precedence() {
        let mut state = FilterState::default();
        assert_eq!(state.effective_query(), None);
        state.letter = Some('C');
        assert_eq!(state.effective_query().as_deref(), Some("C"));
        state.search_text = "carla".to_string();
        assert_eq!(state.effective_query().as_deref(), Some("carla"));
    }

    #[test]
    fn test_is_narrowed_ignores_short_text() {
        let mut state = FilterState::default();
        state.search_text = "ab".to_string();
        assert!(!state.is_narrowed());
        state.search_text = "abc".to_string();
        assert!(state.is_narrowed());
        let state = FilterState {
            title: Some("CFO".into()),
            ..FilterState::default()
        };
        assert!(state.is_narrowed());
    }

    #[test]
    fn test_to_query() {
        let query = full_state().to_query();
        assert_eq!(query.query.as_deref(), Some("mar"));
        assert_eq!(query.department.as_deref(), Some("Sales"));
        assert!(!query.is_empty());
        assert!(FilterState::default().to_query().is_empty());
    }

    #[test]
    fn test_search_len_counts_chars() {
        let state = FilterState {
            search_text: "Zoë".to_string(),
            ..FilterState::default()
        };
        assert_eq!(state.search_len(), 3);
    }
}
