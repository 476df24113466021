//! Tests for `KubeResourceClient` against a scripted API server

#[cfg(test)]
mod tests {
    use crate::client::KubeResourceClient;
    use crate::client_trait::ResourceClientTrait;
    use crate::models::{BundleKind, BundleObject, CreateOutcome, DeleteOutcome};
    use crds::{DummySite, DummySiteSpec, DummySiteStatus};
    use http::{Method, Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use kube::client::Body;
    use kube::Client;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower_test::mock::{self, Handle, SendResponse};

    type ApiServerHandle = Handle<Request<Body>, Response<Body>>;

    fn test_client() -> (KubeResourceClient, ApiServerHandle) {
        let (service, handle) = mock::pair::<Request<Body>, Response<Body>>();
        (KubeResourceClient::new(Client::new(service, "default")), handle)
    }

    /// A request as the API server received it
    struct Received {
        method: Method,
        uri: String,
        content_type: Option<String>,
        body: Value,
        send: SendResponse<Response<Body>>,
    }

    impl Received {
        fn respond(self, code: u16, body: &Value) {
            let response = Response::builder()
                .status(StatusCode::from_u16(code).unwrap())
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).unwrap()))
                .unwrap();
            self.send.send_response(response);
        }

        fn respond_echo(self, code: u16) {
            let body = self.body.clone();
            self.respond(code, &body);
        }
    }

    async fn next_request(server: &mut ApiServerHandle) -> Received {
        let (request, send) = tokio::time::timeout(Duration::from_secs(1), server.next_request())
            .await
            .expect("timeout waiting for API request")
            .expect("service not called");

        let method = request.method().clone();
        let uri = request.uri().to_string();
        let content_type = request
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = request.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        Received {
            method,
            uri,
            content_type,
            body,
            send,
        }
    }

    fn failure(code: u16, reason: &str) -> Value {
        json!({
            "kind": "Status",
            "apiVersion": "v1",
            "metadata": {},
            "status": "Failure",
            "message": format!("{reason} in test"),
            "reason": reason,
            "code": code,
        })
    }

    fn config_map(name: &str) -> BundleObject {
        BundleObject::ConfigMap(
            serde_json::from_value(json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": { "name": name, "namespace": "demo" },
                "data": { "index.html": "<h1>hi</h1>" },
            }))
            .unwrap(),
        )
    }

    fn service(name: &str) -> BundleObject {
        BundleObject::Service(
            serde_json::from_value(json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": { "name": name, "namespace": "demo" },
                "spec": { "type": "ClusterIP", "ports": [{ "port": 80, "targetPort": 80 }] },
            }))
            .unwrap(),
        )
    }

    fn site_json(name: &str) -> Value {
        let site = DummySite::new(
            name,
            DummySiteSpec {
                website_url: "http://example.com".to_string(),
            },
        );
        serde_json::to_value(site).unwrap()
    }

    #[tokio::test]
    async fn test_create_posts_object_and_reports_created() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.create("demo", &config_map("site-foo")).await });

        let request = next_request(&mut server).await;
        assert_eq!(request.method, Method::POST);
        assert!(request.uri.starts_with("/api/v1/namespaces/demo/configmaps"), "{}", request.uri);
        assert_eq!(request.body["metadata"]["name"], "site-foo");
        assert_eq!(request.body["data"]["index.html"], "<h1>hi</h1>");
        request.respond_echo(201);

        assert_eq!(call.await.unwrap().unwrap(), CreateOutcome::Created);
    }

    #[tokio::test]
    async fn test_create_maps_conflict_to_already_exists() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.create("demo", &config_map("site-foo")).await });

        next_request(&mut server)
            .await
            .respond(409, &failure(409, "AlreadyExists"));

        assert_eq!(call.await.unwrap().unwrap(), CreateOutcome::AlreadyExists);
    }

    #[tokio::test]
    async fn test_create_surfaces_other_rejections() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.create("demo", &config_map("site-foo")).await });

        next_request(&mut server)
            .await
            .respond(403, &failure(403, "Forbidden"));

        let err = call.await.unwrap().unwrap_err();
        assert_eq!(err.code(), Some(403));
    }

    #[tokio::test]
    async fn test_delete_maps_not_found_to_outcome() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.delete("demo", BundleKind::Deployment, "site-foo").await });

        let request = next_request(&mut server).await;
        assert_eq!(request.method, Method::DELETE);
        assert!(
            request.uri.starts_with("/apis/apps/v1/namespaces/demo/deployments/site-foo"),
            "{}",
            request.uri
        );
        request.respond(404, &failure(404, "NotFound"));

        assert_eq!(call.await.unwrap().unwrap(), DeleteOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_delete_reports_deleted() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.delete("demo", BundleKind::Ingress, "site-foo").await });

        let request = next_request(&mut server).await;
        assert!(
            request
                .uri
                .starts_with("/apis/networking.k8s.io/v1/namespaces/demo/ingresses/site-foo"),
            "{}",
            request.uri
        );
        request.respond(
            200,
            &json!({
                "apiVersion": "networking.k8s.io/v1",
                "kind": "Ingress",
                "metadata": { "name": "site-foo", "namespace": "demo" },
            }),
        );

        assert_eq!(call.await.unwrap().unwrap(), DeleteOutcome::Deleted);
    }

    #[tokio::test]
    async fn test_replace_carries_resource_version_and_cluster_ip() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.replace("demo", &service("site-foo")).await });

        let read = next_request(&mut server).await;
        assert_eq!(read.method, Method::GET);
        assert!(read.uri.starts_with("/api/v1/namespaces/demo/services/site-foo"), "{}", read.uri);
        read.respond(
            200,
            &json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": { "name": "site-foo", "namespace": "demo", "resourceVersion": "42" },
                "spec": {
                    "type": "ClusterIP",
                    "clusterIP": "10.0.0.12",
                    "clusterIPs": ["10.0.0.12"],
                    "ports": [{ "port": 80, "targetPort": 80 }],
                },
            }),
        );

        let write = next_request(&mut server).await;
        assert_eq!(write.method, Method::PUT);
        assert!(write.uri.starts_with("/api/v1/namespaces/demo/services/site-foo"), "{}", write.uri);
        assert_eq!(write.body["metadata"]["resourceVersion"], "42");
        assert_eq!(write.body["spec"]["clusterIP"], "10.0.0.12");
        write.respond_echo(200);

        call.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_replace_surfaces_stale_write() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.replace("demo", &config_map("site-foo")).await });

        next_request(&mut server).await.respond(
            200,
            &json!({
                "apiVersion": "v1",
                "kind": "ConfigMap",
                "metadata": { "name": "site-foo", "namespace": "demo", "resourceVersion": "7" },
            }),
        );

        let write = next_request(&mut server).await;
        assert_eq!(write.body["metadata"]["resourceVersion"], "7");
        write.respond(409, &failure(409, "Conflict"));

        let err = call.await.unwrap().unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_patch_finalizers_sends_resource_version_precondition() {
        let (client, mut server) = test_client();
        let finalizers = vec!["other/keep".to_string(), "stable.dwk/finalizer".to_string()];
        let call = tokio::spawn(async move {
            client
                .patch_finalizers("demo", "foo", &finalizers, Some("100"))
                .await
        });

        let request = next_request(&mut server).await;
        assert_eq!(request.method, Method::PATCH);
        assert!(
            request.uri.starts_with("/apis/stable.dwk/v1/namespaces/demo/dummysites/foo"),
            "{}",
            request.uri
        );
        assert_eq!(request.content_type.as_deref(), Some("application/merge-patch+json"));
        assert_eq!(
            request.body,
            json!({
                "metadata": {
                    "finalizers": ["other/keep", "stable.dwk/finalizer"],
                    "resourceVersion": "100",
                },
            })
        );
        request.respond(200, &site_json("foo"));

        call.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_patch_finalizers_without_version_and_conflict() {
        let (client, mut server) = test_client();
        let call = tokio::spawn(async move { client.patch_finalizers("demo", "foo", &[], None).await });

        let request = next_request(&mut server).await;
        assert_eq!(request.body, json!({ "metadata": { "finalizers": [] } }));
        request.respond(409, &failure(409, "Conflict"));

        let err = call.await.unwrap().unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_patch_status_targets_status_subresource() {
        let (client, mut server) = test_client();
        let status = DummySiteStatus::deployed("All resources created successfully.", "http://foo.dummysite.io");
        let call = tokio::spawn(async move { client.patch_status("demo", "foo", &status).await });

        let request = next_request(&mut server).await;
        assert_eq!(request.method, Method::PATCH);
        assert!(
            request
                .uri
                .starts_with("/apis/stable.dwk/v1/namespaces/demo/dummysites/foo/status"),
            "{}",
            request.uri
        );
        assert_eq!(request.body["status"]["phase"], "Deployed");
        assert_eq!(request.body["status"]["url"], "http://foo.dummysite.io");
        request.respond(200, &site_json("foo"));

        call.await.unwrap().unwrap();
    }
}
