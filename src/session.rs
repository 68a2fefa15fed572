//! One org chart session: filter state, view state, the loaded tree and the
//! current result set, driven against a [`DirectoryService`].
//!
//! All methods take `&self`. State sits behind a mutex that is never held
//! across an `.await`, so several operations can be in flight at once (a
//! tree load next to a search, or two searches from fast typing). Each
//! request class has its own [`RequestSequence`]; only the response to the
//! most recently started request of a class is applied.
//!
//! No failure escapes: a failed directory call is logged, recorded against
//! its request class until that class next succeeds, and leaves the state
//! inert.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::diagnostics::{CallDiagnostics, DiagnosticsSnapshot};
use crate::directory::DirectoryService;
use crate::dispatch::{
    self, DispatchPhase, DispatchPlan, RequestClass, RequestSequence, RequestToken,
};
use crate::error::{DirectoryError, FailureReport};
use crate::filters::{FilterEvent, FilterState, SearchQuery};
use crate::flatten::{all_nodes, visible_rows};
use crate::types::{CompanyMetadata, Config, OrgNode, OrgUser, Scope, UserId, ViewMode};
use crate::view::{ViewEvent, ViewState};

/// Latency budget for tree and metadata loads.
const LOAD_BUDGET_MS: u128 = 3000;

/// What the result header should say.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "count")]
pub enum ListingSummary {
    Searching,
    /// Narrowed, finished, nothing matched.
    NoResults,
    Matches(usize),
    /// Not narrowed: everyone in the loaded tree.
    Total(usize),
}

/// One row of the tree view, detached from the session lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub user: OrgUser,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub hovered: bool,
}

/// Read-only copy of the session for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub filters: FilterState,
    pub view: ViewState,
    pub phase: DispatchPhase,
    pub loading: bool,
    pub searching: bool,
    pub has_tree: bool,
    pub result_count: usize,
    pub summary: ListingSummary,
    pub tree_loaded_at: Option<DateTime<Utc>>,
    pub metadata_loaded_at: Option<DateTime<Utc>>,
    /// Outstanding failures, at most one per request class.
    pub failures: Vec<FailureReport>,
}

#[derive(Debug, Default)]
struct SessionState {
    filters: FilterState,
    view: ViewState,
    tree: Option<Arc<OrgNode>>,
    results: Vec<OrgUser>,
    metadata: CompanyMetadata,
    loading: bool,
    searching: bool,
    tree_seq: RequestSequence,
    search_seq: RequestSequence,
    metadata_seq: RequestSequence,
    tree_loaded_at: Option<DateTime<Utc>>,
    metadata_loaded_at: Option<DateTime<Utc>>,
    failures: BTreeMap<RequestClass, FailureReport>,
}

impl SessionState {
    fn sequence(&mut self, class: RequestClass) -> &mut RequestSequence {
        match class {
            RequestClass::Tree => &mut self.tree_seq,
            RequestClass::Search => &mut self.search_seq,
            RequestClass::Metadata => &mut self.metadata_seq,
        }
    }

    /// Latest request of `class` failed; replaces any older failure of it.
    fn record_failure(&mut self, class: RequestClass, operation: &str, err: &DirectoryError) {
        self.failures.insert(class, FailureReport::new(operation, err));
    }

    fn clear_results(&mut self) {
        self.results.clear();
        self.searching = false;
        self.search_seq.supersede();
    }

    fn summary(&self) -> ListingSummary {
        if self.filters.is_narrowed() {
            if self.searching {
                ListingSummary::Searching
            } else if self.results.is_empty() {
                ListingSummary::NoResults
            } else {
                ListingSummary::Matches(self.results.len())
            }
        } else {
            ListingSummary::Total(self.tree.as_deref().map(|t| all_nodes(t).len()).unwrap_or(0))
        }
    }
}

pub struct OrgChartSession {
    id: Uuid,
    directory: Arc<dyn DirectoryService>,
    config: Mutex<Config>,
    state: Mutex<SessionState>,
    diagnostics: CallDiagnostics,
}

impl OrgChartSession {
    pub fn new(directory: Arc<dyn DirectoryService>, config: Config) -> Self {
        let id = Uuid::new_v4();
        log::info!("OrgChart[{}]: session created", id);
        Self {
            id,
            directory,
            config: Mutex::new(config),
            state: Mutex::new(SessionState::default()),
            diagnostics: CallDiagnostics::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> Config {
        self.config.lock().clone()
    }

    /// Swap in a new configuration. Takes effect from the next request.
    pub fn update_config(&self, config: Config) {
        log::info!("OrgChart[{}]: configuration updated", self.id);
        *self.config.lock() = config;
    }

    /// Initial load: tree and facet metadata side by side.
    pub async fn init(&self) {
        tokio::join!(self.load_tree(None, false), self.load_metadata());
    }

    // ---------------------------------------------------------------------
    // Tree loading
    // ---------------------------------------------------------------------

    /// Fetch a fresh tree and make it current.
    ///
    /// Without a target on the company scope, the configured root identity
    /// is resolved first and pinned as a fixed root; when it cannot be
    /// resolved the directory picks the top itself.
    pub async fn load_tree(&self, target_id: Option<&str>, only_subtree: bool) {
        let token = {
            let mut state = self.state.lock();
            state.loading = true;
            state.tree_seq.issue()
        };

        let mut target: Option<UserId> = target_id.map(str::to_string);
        let mut is_fixed_root = false;
        let root_email = self.config.lock().root_user_email.clone();
        if !only_subtree && target.is_none() {
            if let Some(email) = root_email.as_deref() {
                let lookup = self
                    .timed("get_user_by_email", LOAD_BUDGET_MS, self.directory.get_user_by_email(email))
                    .await;
                match lookup {
                    Ok(Some(id)) => {
                        target = Some(id);
                        is_fixed_root = true;
                    }
                    Ok(None) => {
                        log::warn!("OrgChart[{}]: root user {} not found, using directory top", self.id, email);
                    }
                    Err(e) => {
                        log::warn!("OrgChart[{}]: root user lookup failed: {}", self.id, e);
                    }
                }
            }
        }

        let result = self
            .timed(
                "get_org_tree",
                LOAD_BUDGET_MS,
                self.directory
                    .get_org_tree(target.as_deref(), only_subtree, is_fixed_root),
            )
            .await;

        let mut state = self.state.lock();
        if !state.sequence(RequestClass::Tree).is_latest(token) {
            self.discard_stale(RequestClass::Tree, "get_org_tree");
            return;
        }
        state.loading = false;
        match result {
            Ok(tree) => {
                let scope = if only_subtree { Scope::Subtree } else { Scope::Company };
                log::info!(
                    "OrgChart[{}]: tree loaded, root={} scope={:?} fixed_root={}",
                    self.id,
                    tree.id,
                    scope,
                    is_fixed_root
                );
                state.view = state.view.reloaded(&tree, scope);
                state.filters = FilterState::default();
                state.clear_results();
                state.tree = Some(Arc::new(tree));
                state.tree_loaded_at = Some(Utc::now());
                state.failures.remove(&RequestClass::Tree);
            }
            Err(e) => {
                log::warn!("OrgChart[{}]: tree load failed: {}", self.id, e);
                state.record_failure(RequestClass::Tree, "get_org_tree", &e);
            }
        }
    }

    pub async fn show_company(&self) {
        self.load_tree(None, false).await
    }

    pub async fn show_my_team(&self) {
        self.load_tree(None, true).await
    }

    /// Re-root the company view on someone's reporting chain.
    pub async fn focus_on(&self, id: &str) {
        self.load_tree(Some(id), false).await
    }

    pub async fn load_metadata(&self) {
        let token = self.state.lock().metadata_seq.issue();
        let result = self
            .timed("get_company_metadata", LOAD_BUDGET_MS, self.directory.get_company_metadata())
            .await;

        let mut state = self.state.lock();
        if !state.sequence(RequestClass::Metadata).is_latest(token) {
            self.discard_stale(RequestClass::Metadata, "get_company_metadata");
            return;
        }
        match result {
            Ok(metadata) => {
                log::debug!(
                    "OrgChart[{}]: metadata loaded ({} departments, {} locations)",
                    self.id,
                    metadata.departments.len(),
                    metadata.locations.len()
                );
                state.metadata = metadata;
                state.metadata_loaded_at = Some(Utc::now());
                state.failures.remove(&RequestClass::Metadata);
            }
            Err(e) => {
                log::warn!("OrgChart[{}]: metadata load failed: {}", self.id, e);
                state.record_failure(RequestClass::Metadata, "get_company_metadata", &e);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Filters and search dispatch
    // ---------------------------------------------------------------------

    /// Apply a filter event and run whatever search it calls for.
    pub async fn apply_filter(&self, event: FilterEvent) {
        if let Some((token, query)) = self.stage_filter(&event) {
            self.run_search(token, query).await;
        }
    }

    /// Reduce the event and claim a search token in one critical section, so
    /// the newest token always belongs to the newest filter state.
    fn stage_filter(&self, event: &FilterEvent) -> Option<(RequestToken, SearchQuery)> {
        let mut state = self.state.lock();
        state.filters = state.filters.apply(event);
        match dispatch::plan(event.change(), &state.filters) {
            DispatchPlan::ClearLocal => {
                log::debug!("OrgChart[{}]: nothing to search, clearing results", self.id);
                state.clear_results();
                None
            }
            DispatchPlan::Hold => None,
            DispatchPlan::Issue(query) => {
                state.searching = true;
                Some((state.search_seq.issue(), query))
            }
        }
    }

    pub async fn search_input(&self, text: &str) {
        self.apply_filter(FilterEvent::SearchInput(text.to_string())).await
    }

    pub async fn select_department(&self, department: Option<&str>) {
        self.apply_filter(FilterEvent::DepartmentSelected(department.map(str::to_string)))
            .await
    }

    pub async fn select_location(&self, location: Option<&str>) {
        self.apply_filter(FilterEvent::LocationSelected(location.map(str::to_string)))
            .await
    }

    pub async fn select_title(&self, title: Option<&str>) {
        self.apply_filter(FilterEvent::TitleSelected(title.map(str::to_string)))
            .await
    }

    pub async fn toggle_letter(&self, letter: Option<char>) {
        self.apply_filter(FilterEvent::LetterToggled(letter)).await
    }

    async fn run_search(&self, token: RequestToken, query: SearchQuery) {
        log::debug!("OrgChart[{}]: search #{} {:?}", self.id, token.value(), query);

        let budget = u128::from(self.config.lock().search_latency_budget_ms);
        let result = self
            .timed("get_users", budget, self.directory.get_users(&query))
            .await;

        let mut state = self.state.lock();
        if !state.sequence(RequestClass::Search).is_latest(token) {
            self.discard_stale(RequestClass::Search, "get_users");
            return;
        }
        state.searching = false;
        match result {
            Ok(users) => {
                state.results = users;
                state.failures.remove(&RequestClass::Search);
            }
            Err(e) => {
                log::warn!("OrgChart[{}]: search failed, keeping previous results: {}", self.id, e);
                state.record_failure(RequestClass::Search, "get_users", &e);
            }
        }
    }

    // ---------------------------------------------------------------------
    // View state
    // ---------------------------------------------------------------------

    pub fn toggle_expand(&self, id: &str) {
        self.apply_view(ViewEvent::ToggleExpand(id.to_string()));
    }

    pub fn set_hovered(&self, id: Option<&str>) {
        self.apply_view(ViewEvent::SetHovered(id.map(str::to_string)));
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.apply_view(ViewEvent::SetViewMode(mode));
    }

    fn apply_view(&self, event: ViewEvent) {
        let mut state = self.state.lock();
        let tree = state.tree.clone();
        state.view = state.view.apply(&event, tree.as_deref());
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    pub fn filters(&self) -> FilterState {
        self.state.lock().filters.clone()
    }

    pub fn view(&self) -> ViewState {
        self.state.lock().view.clone()
    }

    pub fn tree(&self) -> Option<Arc<OrgNode>> {
        self.state.lock().tree.clone()
    }

    pub fn results(&self) -> Vec<OrgUser> {
        self.state.lock().results.clone()
    }

    pub fn metadata(&self) -> CompanyMetadata {
        self.state.lock().metadata.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn is_searching(&self) -> bool {
        self.state.lock().searching
    }

    /// Failure of the latest request of `class`, cleared once one succeeds.
    pub fn failure(&self, class: RequestClass) -> Option<FailureReport> {
        self.state.lock().failures.get(&class).cloned()
    }

    pub fn failures(&self) -> Vec<FailureReport> {
        self.state.lock().failures.values().cloned().collect()
    }

    /// Whether the flat listing replaces the tree on screen.
    pub fn shows_listing(&self) -> bool {
        let state = self.state.lock();
        state.filters.is_narrowed() || state.view.view_mode == ViewMode::Grid
    }

    /// Grid entries: search results while narrowed, otherwise everyone in
    /// the loaded tree.
    pub fn listing(&self) -> Vec<OrgUser> {
        let state = self.state.lock();
        if state.filters.is_narrowed() {
            state.results.clone()
        } else {
            state.tree.as_deref().map(all_nodes).unwrap_or_default()
        }
    }

    pub fn summary(&self) -> ListingSummary {
        self.state.lock().summary()
    }

    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let state = self.state.lock();
        let Some(tree) = state.tree.as_deref() else {
            return Vec::new();
        };
        visible_rows(tree, &state.view.expanded)
            .into_iter()
            .map(|row| TreeRow {
                user: row.node.to_user(),
                depth: row.depth,
                has_children: row.node.has_children(),
                expanded: state.view.is_expanded(&row.node.id),
                hovered: state.view.is_hovered(&row.node.id),
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.lock();
        SessionSnapshot {
            session_id: self.id.to_string(),
            filters: state.filters.clone(),
            view: state.view.clone(),
            phase: dispatch::phase(&state.filters),
            loading: state.loading,
            searching: state.searching,
            has_tree: state.tree.is_some(),
            result_count: state.results.len(),
            summary: state.summary(),
            tree_loaded_at: state.tree_loaded_at,
            metadata_loaded_at: state.metadata_loaded_at,
            failures: state.failures.values().cloned().collect(),
        }
    }

    pub fn diagnostics(&self) -> DiagnosticsSnapshot {
        self.diagnostics.snapshot()
    }

    // ---------------------------------------------------------------------
    // Helpers
    // ---------------------------------------------------------------------

    async fn timed<T, F>(&self, operation: &str, budget_ms: u128, call: F) -> Result<T, DirectoryError>
    where
        F: Future<Output = Result<T, DirectoryError>>,
    {
        let started = Instant::now();
        let result = call.await;
        self.diagnostics
            .record_call(operation, started.elapsed().as_millis(), budget_ms, result.is_ok());
        result
    }

    fn discard_stale(&self, class: RequestClass, operation: &str) {
        log::debug!(
            "OrgChart[{}]: discarding stale {} response from {}",
            self.id,
            class.as_str(),
            operation
        );
        self.diagnostics.record_stale(operation);
    }
}
