//! Helpers that chain group and component calls into a denormalized view.
//!
//! Calls run strictly in sequence. The first failing sub-call aborts the
//! helper and its error is returned; nothing fetched so far is kept.

use crate::client::Client;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::{Component, Group};

impl<T: Transport> Client<T> {
    /// List every group on the page with `full_components` filled in.
    pub fn get_all_groups_and_components(&self, page_id: &str) -> Result<Vec<Group>> {
        let mut groups = self.groups().list(page_id)?;
        for group in &mut groups {
            let components = self.fetch_components(page_id, &group.components)?;
            group.full_components = Some(components);
        }
        Ok(groups)
    }

    /// Fetch one group, then each of its components, in group order.
    pub fn get_components_from_group(
        &self,
        page_id: &str,
        group_id: &str,
    ) -> Result<Vec<Component>> {
        let group = self.groups().get(page_id, group_id)?;
        self.fetch_components(page_id, &group.components)
    }

    fn fetch_components(&self, page_id: &str, ids: &[String]) -> Result<Vec<Component>> {
        let components = self.components();
        ids.iter().map(|id| components.get(page_id, id)).collect()
    }
}
