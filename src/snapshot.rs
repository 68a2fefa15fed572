//! JSON-file backed directory.
//!
//! Serves the [`DirectoryService`] contract from a flat export of the
//! company directory where every entry names its manager. Used by the
//! console front end and as realistic test data.
//!
//! File format:
//! ```json
//! { "currentUserId": "u2",
//!   "users": [ { "id": "u1", "displayName": "Ada Rossi", "managerId": null, ... } ] }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::directory::DirectoryService;
use crate::error::DirectoryError;
use crate::filters::SearchQuery;
use crate::types::{CompanyMetadata, DepartmentCount, OrgNode, OrgUser, UserId};

/// One exported directory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub job_title: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub office_location: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub manager_id: Option<UserId>,
}

impl DirectoryEntry {
    fn to_user(&self) -> OrgUser {
        OrgUser {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            job_title: self.job_title.clone(),
            office_location: self.office_location.clone(),
            mail: self.mail.clone(),
            user_principal_name: self.user_principal_name.clone(),
            photo_url: self.photo_url.clone(),
        }
    }

    fn to_node(&self, children: Vec<OrgNode>) -> OrgNode {
        OrgNode {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            job_title: self.job_title.clone(),
            office_location: self.office_location.clone(),
            mail: self.mail.clone(),
            user_principal_name: self.user_principal_name.clone(),
            photo_url: self.photo_url.clone(),
            children,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryExport {
    #[serde(default)]
    pub current_user_id: Option<UserId>,
    #[serde(default)]
    pub users: Vec<DirectoryEntry>,
}

pub struct SnapshotDirectory {
    entries: HashMap<UserId, DirectoryEntry>,
    reports: HashMap<UserId, Vec<UserId>>,
    current_user_id: Option<UserId>,
}

impl SnapshotDirectory {
    pub fn from_export(export: DirectoryExport) -> Self {
        let mut entries = HashMap::new();
        for entry in export.users {
            if entries.contains_key(&entry.id) {
                log::warn!("SnapshotDirectory: duplicate id {} ignored", entry.id);
                continue;
            }
            entries.insert(entry.id.clone(), entry);
        }

        let mut reports: HashMap<UserId, Vec<UserId>> = HashMap::new();
        for entry in entries.values() {
            if let Some(manager) = entry.manager_id.as_ref().filter(|m| entries.contains_key(*m)) {
                reports.entry(manager.clone()).or_default().push(entry.id.clone());
            }
        }
        for ids in reports.values_mut() {
            ids.sort_by(|a, b| sort_key(&entries[a]).cmp(&sort_key(&entries[b])));
        }

        Self {
            entries,
            reports,
            current_user_id: export.current_user_id,
        }
    }

    /// Load an export from disk.
    pub fn load(path: &Path) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path)?;
        let export: DirectoryExport = serde_json::from_str(&content)?;
        log::info!(
            "SnapshotDirectory: loaded {} entries from {}",
            export.users.len(),
            path.display()
        );
        Ok(Self::from_export(export))
    }

    pub fn with_current_user(mut self, id: Option<UserId>) -> Self {
        if id.is_some() {
            self.current_user_id = id;
        }
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &str) -> Result<&DirectoryEntry, DirectoryError> {
        self.entries
            .get(id)
            .ok_or_else(|| DirectoryError::NotFound(id.to_string()))
    }

    fn manager_of(&self, id: &str) -> Option<&DirectoryEntry> {
        self.entries
            .get(id)
            .and_then(|e| e.manager_id.as_deref())
            .and_then(|m| self.entries.get(m))
    }

    /// Walk up the manager chain to its top. Stops on a cycle.
    fn top_of_chain<'a>(&'a self, start: &'a DirectoryEntry) -> &'a DirectoryEntry {
        let mut seen = HashSet::new();
        let mut current = start;
        seen.insert(current.id.as_str());
        while let Some(manager) = self.manager_of(&current.id) {
            if !seen.insert(manager.id.as_str()) {
                break;
            }
            current = manager;
        }
        current
    }

    /// The entry without a manager that has the most people below it.
    fn organic_root(&self) -> Option<&DirectoryEntry> {
        let mut tops: Vec<&DirectoryEntry> = self
            .entries
            .values()
            .filter(|e| self.manager_of(&e.id).is_none())
            .collect();
        if tops.is_empty() {
            // Every entry sits on a manager cycle; pick a stable one.
            tops = self.entries.values().collect();
        }
        tops.into_iter().max_by(|a, b| {
            self.count_below(&a.id)
                .cmp(&self.count_below(&b.id))
                .then_with(|| sort_key(b).cmp(&sort_key(a)))
        })
    }

    fn count_below(&self, id: &str) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![id.to_string()];
        while let Some(current) = stack.pop() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(ids) = self.reports.get(&current) {
                stack.extend(ids.iter().cloned());
            }
        }
        seen.len() - 1
    }

    fn build(&self, id: &str, seen: &mut HashSet<UserId>) -> Option<OrgNode> {
        let entry = self.entries.get(id)?;
        if !seen.insert(entry.id.clone()) {
            return None;
        }
        let children = self
            .reports
            .get(id)
            .map(|ids| ids.iter().filter_map(|child| self.build(child, seen)).collect())
            .unwrap_or_default();
        Some(entry.to_node(children))
    }

    fn tree_from(&self, root: &DirectoryEntry) -> OrgNode {
        let mut seen = HashSet::new();
        self.build(&root.id, &mut seen)
            .unwrap_or_else(|| root.to_node(Vec::new()))
    }

    fn matches(&self, entry: &DirectoryEntry, query: &SearchQuery) -> bool {
        if let Some(q) = query.query.as_deref().map(fold).filter(|q| !q.is_empty()) {
            let hit = if q.chars().count() == 1 {
                let mut words: Vec<String> = entry.display_name.split_whitespace().map(fold).collect();
                words.extend(entry.given_name.as_deref().map(fold));
                words.extend(entry.surname.as_deref().map(fold));
                words.iter().any(|w| w.starts_with(&q))
            } else {
                fold(&entry.display_name).contains(&q)
                    || entry.mail.as_deref().map(fold).is_some_and(|m| m.contains(&q))
            };
            if !hit {
                return false;
            }
        }
        if let Some(dept) = query.department.as_deref() {
            if !same(entry.department.as_deref(), dept) {
                return false;
            }
        }
        if let Some(loc) = query.location.as_deref() {
            if !same(entry.office_location.as_deref(), loc) {
                return false;
            }
        }
        if let Some(title) = query.title.as_deref() {
            if !fold(&entry.job_title).contains(&fold(title)) {
                return false;
            }
        }
        true
    }
}

#[async_trait]
impl DirectoryService for SnapshotDirectory {
    async fn get_org_tree(
        &self,
        target_id: Option<&str>,
        only_subtree: bool,
        is_fixed_root: bool,
    ) -> Result<OrgNode, DirectoryError> {
        let root = match (target_id, only_subtree, is_fixed_root) {
            (Some(id), true, _) | (Some(id), _, true) => self.entry(id)?,
            (None, true, _) => {
                let me = self.current_user_id.as_deref().ok_or_else(|| {
                    DirectoryError::Configuration("no current user for team view".to_string())
                })?;
                self.entry(me)?
            }
            (Some(id), false, false) => self.top_of_chain(self.entry(id)?),
            (None, false, _) => self
                .organic_root()
                .ok_or_else(|| DirectoryError::NotFound("directory is empty".to_string()))?,
        };
        Ok(self.tree_from(root))
    }

    async fn get_users(&self, query: &SearchQuery) -> Result<Vec<OrgUser>, DirectoryError> {
        let mut hits: Vec<&DirectoryEntry> = self
            .entries
            .values()
            .filter(|e| self.matches(e, query))
            .collect();
        hits.sort_by_key(|e| sort_key(e));
        Ok(hits.into_iter().map(DirectoryEntry::to_user).collect())
    }

    async fn get_company_metadata(&self) -> Result<CompanyMetadata, DirectoryError> {
        let mut departments: BTreeMap<&str, u32> = BTreeMap::new();
        let mut locations: BTreeSet<&str> = BTreeSet::new();
        for entry in self.entries.values() {
            if let Some(dept) = entry.department.as_deref().filter(|d| !d.is_empty()) {
                *departments.entry(dept).or_default() += 1;
            }
            if let Some(loc) = entry.office_location.as_deref().filter(|l| !l.is_empty()) {
                locations.insert(loc);
            }
        }
        Ok(CompanyMetadata {
            departments: departments
                .into_iter()
                .map(|(name, count)| DepartmentCount {
                    name: name.to_string(),
                    count,
                })
                .collect(),
            locations: locations.into_iter().map(str::to_string).collect(),
        })
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserId>, DirectoryError> {
        let wanted = email.trim().to_lowercase();
        let mut found: Vec<&DirectoryEntry> = self
            .entries
            .values()
            .filter(|e| {
                e.mail.as_deref().map(str::to_lowercase).as_deref() == Some(wanted.as_str())
                    || e.user_principal_name.as_deref().map(str::to_lowercase).as_deref()
                        == Some(wanted.as_str())
            })
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found.first().map(|e| e.id.clone()))
    }
}

/// Lowercase and strip combining marks: "Élodie" -> "elodie".
fn fold(value: &str) -> String {
    value
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

fn same(value: Option<&str>, wanted: &str) -> bool {
    value.is_some_and(|v| fold(v) == fold(wanted))
}

fn sort_key(entry: &DirectoryEntry) -> (String, String) {
    (fold(&entry.display_name), entry.id.clone())
}
