use serde::{Deserialize, Serialize};

/// Stable unique identifier of a directory identity.
pub type UserId = String;

/// One employee inside the reporting tree.
///
/// Trees arrive whole from the directory service and are never mutated in
/// place; a reload replaces the previous tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgNode {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub children: Vec<OrgNode>,
}

impl OrgNode {
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Flat projection without the hierarchy.
    pub fn to_user(&self) -> OrgUser {
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
}

/// Flat employee record, as returned by search and by flattening.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgUser {
    pub id: UserId,
    pub display_name: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub office_location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_principal_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub name: String,
    pub count: u32,
}

/// Facet values offered by the filter bar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyMetadata {
    #[serde(default)]
    pub departments: Vec<DepartmentCount>,
    #[serde(default)]
    pub locations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Tree,
    Grid,
}

/// Whether the loaded tree is the whole company or a subtree rooted at the
/// current user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Company,
    Subtree,
}

/// Configuration stored in ~/.orgchart/config.json.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Identity the company tree is pinned to. The directory never ascends above it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_user_email: Option<String>,
    /// Identity used for the "my team" subtree.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot_path: Option<String>,
    #[serde(default = "default_office_label")]
    pub default_office_label: String,
    #[serde(default = "default_search_latency_budget_ms")]
    pub search_latency_budget_ms: u64,
}

fn default_office_label() -> String {
    "Head Office".to_string()
}

fn default_search_latency_budget_ms() -> u64 {
    800
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root_user_email: None,
            current_user_email: None,
            snapshot_path: None,
            default_office_label: default_office_label(),
            search_latency_budget_ms: default_search_latency_budget_ms(),
        }
    }
}
