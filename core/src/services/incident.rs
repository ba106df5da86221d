//! Incident operations.
//!
//! The API does not diff component states on incident writes: every create or
//! update must restate the target status of each affected component in the
//! `components` map. The three write methods below differ only in how that
//! map is filled in.

use std::collections::BTreeMap;

use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::transport::Transport;
use crate::types::{ComponentStatus, Incident, IncidentEnvelope, IncidentStatus, IncidentUpdate};

/// Operations on `pages/{page}/incidents`.
#[derive(Debug, Clone, Copy)]
pub struct IncidentService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> IncidentService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    /// Create `incident`, setting every id in `incident.component_ids` to
    /// `component_status`.
    pub fn create(
        &self,
        page_id: &str,
        component_status: ComponentStatus,
        incident: &Incident,
    ) -> Result<Incident> {
        let components = incident
            .component_ids
            .iter()
            .map(|id| (id.clone(), component_status))
            .collect();
        let update = IncidentUpdate::from_incident(incident, components);
        let url = self.client.page_url(page_id, &["incidents"])?;
        self.client
            .send(HttpMethod::Post, url, Some(&IncidentEnvelope { incident: &update }))
    }

    pub fn get(&self, page_id: &str, incident_id: &str) -> Result<Incident> {
        let url = self.client.page_url(page_id, &["incidents", incident_id])?;
        self.client.get(url)
    }

    pub fn list(&self, page_id: &str) -> Result<Vec<Incident>> {
        let url = self.client.page_url(page_id, &["incidents"])?;
        self.client.get_list(url)
    }

    pub fn delete(&self, page_id: &str, incident_id: &str) -> Result<()> {
        let url = self.client.page_url(page_id, &["incidents", incident_id])?;
        self.client.send_unit(HttpMethod::Delete, url)
    }

    /// Set every component attached to `incident` to `status`. The incident
    /// record itself is resubmitted as-is.
    pub fn update_component_status(
        &self,
        page_id: &str,
        status: ComponentStatus,
        incident: &Incident,
    ) -> Result<Incident> {
        let components = incident
            .components
            .iter()
            .map(|component| (component.id.clone(), status))
            .collect();
        self.put(page_id, incident, IncidentUpdate::from_incident(incident, components))
    }

    /// Move `incident` to `status`, keeping each attached component at its
    /// current health. `body` replaces the incident body only when non-empty.
    ///
    /// Attached components whose `status` is `None` are left out of the
    /// `components` map, so the server keeps whatever status they have.
    pub fn update_status(
        &self,
        page_id: &str,
        status: IncidentStatus,
        body: Option<&str>,
        incident: &Incident,
    ) -> Result<Incident> {
        let components: BTreeMap<_, _> = incident
            .components
            .iter()
            .filter_map(|component| component.status.map(|s| (component.id.clone(), s)))
            .collect();
        let mut update = IncidentUpdate::from_incident(incident, components);
        update.status = Some(status);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            update.body = Some(body.to_string());
        }
        self.put(page_id, incident, update)
    }

    fn put(&self, page_id: &str, incident: &Incident, update: IncidentUpdate) -> Result<Incident> {
        let url = self.client.page_url(page_id, &["incidents", &incident.id])?;
        self.client
            .send(HttpMethod::Put, url, Some(&IncidentEnvelope { incident: &update }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testing::MockTransport;
    use crate::types::Component;
    use crate::{Client, Config, Error};

    use super::*;

    fn client(transport: MockTransport) -> Client<MockTransport> {
        let config = Config::new("test-token")
            .with_base_url("http://localhost:3000")
            .with_default_page("default-page");
        Client::with_transport(config, transport).unwrap()
    }

    fn component(id: &str, status: ComponentStatus) -> Component {
        Component {
            id: id.to_string(),
            status: Some(status),
            ..Component::default()
        }
    }

    fn existing() -> Incident {
        Incident {
            id: "inc1".to_string(),
            name: Some("Database latency".to_string()),
            body: Some("Looking into it".to_string()),
            status: Some(IncidentStatus::Identified),
            components: vec![
                component("a", ComponentStatus::MajorOutage),
                component("b", ComponentStatus::DegradedPerformance),
            ],
            deliver_notifications: Some(true),
            ..Incident::default()
        }
    }

    #[test]
    fn create_maps_ids_to_component_status() {
        let c = client(
            MockTransport::new().respond(201, r#"{"id":"inc1","status":"investigating"}"#),
        );
        let incident = Incident {
            name: Some("Test Incident".to_string()),
            body: Some("There is something going on.".to_string()),
            status: Some(IncidentStatus::Investigating),
            component_ids: vec!["qw1nh8v4gxsv".to_string()],
            deliver_notifications: Some(false),
            ..Incident::default()
        };
        let created = c
            .incidents()
            .create("", ComponentStatus::DegradedPerformance, &incident)
            .unwrap();
        assert_eq!(created.id, "inc1");
        assert_eq!(created.status, Some(IncidentStatus::Investigating));

        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/v1/pages/default-page/incidents");
        assert_eq!(
            c.transport().body(0),
            json!({
                "incident": {
                    "name": "Test Incident",
                    "body": "There is something going on.",
                    "status": "investigating",
                    "components": {"qw1nh8v4gxsv": "degraded_performance"},
                    "component_ids": ["qw1nh8v4gxsv"],
                    "deliver_notifications": false
                }
            })
        );
    }

    #[test]
    fn create_without_any_page_fails_before_sending() {
        let config = Config::new("t").with_base_url("http://localhost:3000");
        let c = Client::with_transport(config, MockTransport::new()).unwrap();
        let err = c
            .incidents()
            .create("", ComponentStatus::Operational, &Incident::default())
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn get_uses_single_incident_path() {
        let c = client(MockTransport::new().respond(200, r#"{"id":"inc1"}"#));
        let incident = c.incidents().get("p1", "inc1").unwrap();
        assert_eq!(incident.id, "inc1");
        assert_eq!(
            c.transport().requests()[0].url,
            "http://localhost:3000/v1/pages/p1/incidents/inc1"
        );
    }

    #[test]
    fn update_component_status_applies_status_uniformly() {
        let c = client(MockTransport::new().respond(200, r#"{"id":"inc1"}"#));
        c.incidents()
            .update_component_status("p1", ComponentStatus::Operational, &existing())
            .unwrap();

        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Put);
        assert_eq!(req.url, "http://localhost:3000/v1/pages/p1/incidents/inc1");
        let body = c.transport().body(0);
        assert_eq!(
            body["incident"]["components"],
            json!({"a": "operational", "b": "operational"})
        );
        assert_eq!(body["incident"]["component_ids"], json!(["a", "b"]));
        assert_eq!(body["incident"]["status"], "identified");
        assert_eq!(body["incident"]["body"], "Looking into it");
    }

    #[test]
    fn update_status_keeps_each_component_status() {
        let c = client(
            MockTransport::new().respond(200, r#"{"id":"inc1","status":"monitoring"}"#),
        );
        let updated = c
            .incidents()
            .update_status(
                "p1",
                IncidentStatus::Monitoring,
                Some("A fix is deployed"),
                &existing(),
            )
            .unwrap();
        assert_eq!(updated.status, Some(IncidentStatus::Monitoring));

        let body = c.transport().body(0);
        assert_eq!(
            body["incident"]["components"],
            json!({"a": "major_outage", "b": "degraded_performance"})
        );
        assert_eq!(body["incident"]["status"], "monitoring");
        assert_eq!(body["incident"]["body"], "A fix is deployed");
    }

    #[test]
    fn update_status_with_empty_body_keeps_existing_body() {
        let c = client(
            MockTransport::new()
                .respond(200, r#"{"id":"inc1"}"#)
                .respond(200, r#"{"id":"inc1"}"#),
        );
        c.incidents()
            .update_status("p1", IncidentStatus::Resolved, Some(""), &existing())
            .unwrap();
        c.incidents()
            .update_status("p1", IncidentStatus::Resolved, None, &existing())
            .unwrap();

        for i in 0..2 {
            let body = c.transport().body(i);
            assert_eq!(body["incident"]["body"], "Looking into it");
            assert_eq!(body["incident"]["status"], "resolved");
        }
    }

    #[test]
    fn update_status_leaves_out_components_without_status() {
        let c = client(MockTransport::new().respond(200, r#"{"id":"inc1"}"#));
        let mut incident = existing();
        incident.components.push(Component {
            id: "c".to_string(),
            ..Component::default()
        });
        c.incidents()
            .update_status("p1", IncidentStatus::Monitoring, None, &incident)
            .unwrap();

        let body = c.transport().body(0);
        assert_eq!(
            body["incident"]["components"],
            json!({"a": "major_outage", "b": "degraded_performance"})
        );
        assert_eq!(body["incident"]["component_ids"], json!(["a", "b", "c"]));
    }

    #[test]
    fn incident_without_id_fails_before_sending() {
        let c = client(MockTransport::new());
        let mut incident = existing();
        incident.id.clear();

        let err = c
            .incidents()
            .update_status("p1", IncidentStatus::Resolved, None, &incident)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        let err = c
            .incidents()
            .update_component_status("p1", ComponentStatus::Operational, &incident)
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(matches!(c.incidents().delete("p1", ""), Err(Error::Config(_))));
        assert!(matches!(c.incidents().get("p1", ".."), Err(Error::Config(_))));
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn list_and_delete() {
        let c = client(
            MockTransport::new()
                .respond(200, r#"[{"id":"i1"},{"id":"i2"}]"#)
                .respond(204, ""),
        );
        let incidents = c.incidents().list("p1").unwrap();
        assert_eq!(incidents.len(), 2);
        c.incidents().delete("p1", "i1").unwrap();
        assert_eq!(c.transport().requests()[1].method, HttpMethod::Delete);
    }
}
