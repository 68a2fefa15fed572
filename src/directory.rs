//! Contract of the remote people directory.
//!
//! The org chart never builds trees or runs searches itself; it asks an
//! implementation of [`DirectoryService`]. Every call may fail, and an empty
//! result is a success.

use async_trait::async_trait;

use crate::error::DirectoryError;
use crate::filters::SearchQuery;
use crate::types::{CompanyMetadata, OrgNode, OrgUser, UserId};

#[async_trait]
pub trait DirectoryService: Send + Sync {
    /// Build the reporting tree.
    ///
    /// - `only_subtree`: root at `target_id`, or at the signed-in user when absent.
    /// - `is_fixed_root`: `target_id` is the top; never ascend above it.
    /// - otherwise the directory picks the top of the hierarchy.
    async fn get_org_tree(
        &self,
        target_id: Option<&str>,
        only_subtree: bool,
        is_fixed_root: bool,
    ) -> Result<OrgNode, DirectoryError>;

    /// Flat people search.
    async fn get_users(&self, query: &SearchQuery) -> Result<Vec<OrgUser>, DirectoryError>;

    async fn get_company_metadata(&self) -> Result<CompanyMetadata, DirectoryError>;

    /// Resolve an email address to an identity, `None` when nobody has it.
    async fn get_user_by_email(&self, email: &str) -> Result<Option<UserId>, DirectoryError>;
}
