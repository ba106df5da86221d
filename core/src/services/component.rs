use crate::client::Client;
use crate::error::Result;
use crate::http::HttpMethod;
use crate::transport::Transport;
use crate::types::{Component, ComponentEnvelope, NewComponent, UpdateComponent};

/// Operations on `pages/{page}/components`.
#[derive(Debug, Clone, Copy)]
pub struct ComponentService<'a, T> {
    client: &'a Client<T>,
}

impl<'a, T: Transport> ComponentService<'a, T> {
    pub(crate) fn new(client: &'a Client<T>) -> Self {
        Self { client }
    }

    pub fn get(&self, page_id: &str, component_id: &str) -> Result<Component> {
        let url = self.client.page_url(page_id, &["components", component_id])?;
        self.client.get(url)
    }

    pub fn list(&self, page_id: &str) -> Result<Vec<Component>> {
        let url = self.client.page_url(page_id, &["components"])?;
        self.client.get_list(url)
    }

    pub fn create(&self, page_id: &str, component: &NewComponent) -> Result<Component> {
        let url = self.client.page_url(page_id, &["components"])?;
        let body = ComponentEnvelope { component };
        self.client.send(HttpMethod::Post, url, Some(&body))
    }

    /// PATCH only the fields set in `fields`.
    pub fn update(
        &self,
        page_id: &str,
        component_id: &str,
        fields: &UpdateComponent,
    ) -> Result<Component> {
        let url = self.client.page_url(page_id, &["components", component_id])?;
        let body = ComponentEnvelope { component: fields };
        self.client.send(HttpMethod::Patch, url, Some(&body))
    }

    /// Any 2xx response counts as deleted; the body is ignored.
    pub fn delete(&self, page_id: &str, component_id: &str) -> Result<()> {
        let url = self.client.page_url(page_id, &["components", component_id])?;
        self.client.send_unit(HttpMethod::Delete, url)
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::MockTransport;
    use crate::types::ComponentStatus;
    use crate::{Client, Config, Error, HttpMethod};

    use super::*;

    fn client(transport: MockTransport) -> Client<MockTransport> {
        let config = Config::new("test-token").with_base_url("http://localhost:3000/test/");
        Client::with_transport(config, transport).unwrap()
    }

    #[test]
    fn get_decodes_minimal_component() {
        let c = client(MockTransport::new().respond(200, r#"{"id":"2"}"#));
        let component = c.components().get("1", "2").unwrap();
        assert_eq!(
            component,
            Component {
                id: "2".to_string(),
                ..Component::default()
            }
        );

        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/test/v1/pages/1/components/2");
    }

    #[test]
    fn get_not_found_is_api_error() {
        let c = client(MockTransport::new().respond(404, r#"{"error":"not found"}"#));
        let err = c.components().get("1", "missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn list_preserves_order() {
        let c = client(MockTransport::new().respond(200, r#"[{"id":"1"}, {"id":"2"}]"#));
        let components = c.components().list("1").unwrap();
        let ids: Vec<_> = components.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["1", "2"]);
    }

    #[test]
    fn list_empty_and_null_yield_empty_vec() {
        let c = client(MockTransport::new().respond(200, "[]").respond(200, "null"));
        assert!(c.components().list("1").unwrap().is_empty());
        assert!(c.components().list("1").unwrap().is_empty());
    }

    #[test]
    fn delete_ignores_body() {
        let c = client(
            MockTransport::new()
                .respond(200, "{}")
                .respond(204, "")
                .respond(200, "garbage"),
        );
        for _ in 0..3 {
            c.components().delete("1", "2").unwrap();
        }
        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Delete);
        assert!(req.body.is_none());
    }

    #[test]
    fn second_delete_surfaces_not_found() {
        let c = client(
            MockTransport::new()
                .respond(204, "")
                .respond(404, r#"{"error":"not found"}"#),
        );
        c.components().delete("1", "2").unwrap();
        let err = c.components().delete("1", "2").unwrap_err();
        assert!(matches!(err, Error::Api { status: 404, .. }));
    }

    #[test]
    fn update_sends_only_set_fields() {
        let c = client(
            MockTransport::new().respond(200, r#"{"id":"2", "status": "major_outage"}"#),
        );
        let updated = c
            .components()
            .update("1", "2", &UpdateComponent::status(ComponentStatus::MajorOutage))
            .unwrap();
        assert_eq!(updated.id, "2");
        assert_eq!(updated.status, Some(ComponentStatus::MajorOutage));

        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Patch);
        assert_eq!(
            c.transport().body(0),
            serde_json::json!({"component": {"status": "major_outage"}})
        );
    }

    #[test]
    fn create_posts_component_envelope() {
        let c = client(MockTransport::new().respond(201, r#"{"id":"new","name":"API"}"#));
        let input = NewComponent {
            name: "API".to_string(),
            status: Some(ComponentStatus::Operational),
            ..NewComponent::default()
        };
        let created = c.components().create("1", &input).unwrap();
        assert_eq!(created.id, "new");

        let req = &c.transport().requests()[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "http://localhost:3000/test/v1/pages/1/components");
        assert_eq!(
            c.transport().body(0),
            serde_json::json!({"component": {"name": "API", "status": "operational"}})
        );
    }

    #[test]
    fn ids_with_path_syntax_stay_under_components() {
        let c = client(
            MockTransport::new()
                .respond(204, "")
                .respond(200, r#"{"id":"a?b#c"}"#)
                .respond(204, ""),
        );
        c.components().delete("p1", "../../p2/components/victim").unwrap();
        c.components().get("p1", "a?b#c").unwrap();
        c.components().delete("p1", "../x").unwrap();

        let urls: Vec<_> = c.transport().requests().into_iter().map(|r| r.url).collect();
        let base = "http://localhost:3000/test/v1/pages/p1/components/";
        assert_eq!(
            urls,
            [
                format!("{base}..%2F..%2Fp2%2Fcomponents%2Fvictim"),
                format!("{base}a%3Fb%23c"),
                format!("{base}..%2Fx"),
            ]
        );
    }

    #[test]
    fn empty_or_dot_id_fails_before_sending() {
        let c = client(MockTransport::new());
        let fields = UpdateComponent::status(ComponentStatus::Operational);
        for id in ["", ".", ".."] {
            assert!(matches!(c.components().delete("p1", id), Err(Error::Config(_))), "{id:?}");
            assert!(matches!(c.components().get("p1", id), Err(Error::Config(_))), "{id:?}");
            let err = c.components().update("p1", id, &fields).unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{id:?}");
        }
        assert!(c.transport().requests().is_empty());
    }

    #[test]
    fn unknown_status_in_response_is_decode_error() {
        let c = client(MockTransport::new().respond(200, r#"{"id":"2","status":"exploded"}"#));
        let err = c.components().get("1", "2").unwrap_err();
        assert!(matches!(err, Error::Decode { status: 200, .. }));
    }

    #[test]
    fn transport_failure_is_network_error() {
        let c = client(MockTransport::new());
        let err = c.components().list("1").unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
