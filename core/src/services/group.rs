use crate::client::Client;
use crate::error::Result;
use crate::transport::Transport;
use crate::types::Group;

/// Read-only operations on `pages/{page}/component-groups`.
#[derive(Debug, Clone, Copy)]
pub struct GroupService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> GroupService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// The group with its member component ids; `full_components` stays empty.
    pub fn get(&self, page_id: &str, group_id: &str) -> Result<Group> {
        let url = self.client.page_url(page_id, &["component-groups", group_id])?;
        self.client.get(url)
    }

    pub fn list(&self, page_id: &str) -> Result<Vec<Group>> {
        let url = self.client.page_url(page_id, &["component-groups"])?;
        self.client.get_list(url)
    }
}
