//! Resolve-and-fetch façade used by the front door.

use std::sync::Arc;
use std::time::Duration;

use tracing::instrument;

use crate::client::{HttpApiClient, RemoteApi};
use crate::credential::Credential;
use crate::error::{ApiError, GatewayError};
use crate::fetcher::ContentFetcher;
use crate::resolver::Resolver;

/// Owns the resolver (and its cache) and the fetcher for one upstream.
#[derive(Debug)]
pub struct Gateway {
    resolver: Resolver,
    fetcher: ContentFetcher,
}

impl Gateway {
    /// Build a gateway over any [`RemoteApi`].
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            resolver: Resolver::new(Arc::clone(&api)),
            fetcher: ContentFetcher::new(api),
        }
    }

    /// Build a gateway talking HTTP to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Client`] if the HTTP client cannot be built.
    pub fn http(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = HttpApiClient::new(base_url, timeout)?;
        Ok(Self::new(Arc::new(client)))
    }

    /// The underlying resolver.
    #[must_use]
    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Resolve `project` in `group` and fetch `{path}.html` from it.
    ///
    /// `path` defaults to the project name.
    ///
    /// # Errors
    ///
    /// Any [`GatewayError`] from resolution or fetching.
    #[instrument(skip_all, fields(group = %group, project = %project))]
    pub async fn resolve_and_fetch(
        &self,
        group: &str,
        project: &str,
        path: Option<&str>,
        credential: &Credential,
    ) -> Result<String, GatewayError> {
        let path = path.filter(|p| !p.is_empty()).unwrap_or(project);
        let project_id = self
            .resolver
            .resolve_project(project, group, credential)
            .await?;
        self.fetcher
            .fetch_file(project_id, project, path, credential)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::{ApiResponse, ApiStatus};
    use crate::testing::FakeApi;

    const TOKEN: &str = "glpat-valid";
    const HEALTHCHECK_HTML: &str =
        "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<title>healthcheck</title>\n</head>\n<body></body></html>\n";

    fn pncks() -> FakeApi {
        FakeApi::new()
            .accept(TOKEN)
            .respond("/groups?search=PNCKS", ApiResponse::ok(r#"[{"id":14660398}]"#))
            .respond(
                "/groups/14660398/projects/",
                ApiResponse::ok(
                    r#"[{"id":33978260,"name":"healthcheck"},{"id":33978261,"name":"limit_up"}]"#,
                ),
            )
            .respond(
                "/projects/33978260/repository/files/healthcheck.html/raw",
                ApiResponse::ok(HEALTHCHECK_HTML),
            )
            .respond(
                "/projects/33978260/repository/files/docs%2Fguide.html/raw",
                ApiResponse::ok("<p>guide</p>"),
            )
            .status(
                "/projects/33978261/repository/files/limit_up.html/raw",
                ApiStatus::NotFound,
            )
    }

    #[tokio::test]
    async fn healthcheck_page_is_served_verbatim() {
        let gateway = Gateway::new(Arc::new(pncks()));
        let body = gateway
            .resolve_and_fetch("PNCKS", "healthcheck", None, &Credential::new(TOKEN))
            .await
            .unwrap();
        assert_eq!(body, HEALTHCHECK_HTML);
        assert!(body.contains("<title>healthcheck</title>"));
    }

    #[tokio::test]
    async fn sub_path_overrides_project_name() {
        let gateway = Gateway::new(Arc::new(pncks()));
        let body = gateway
            .resolve_and_fetch("PNCKS", "healthcheck", Some("docs/guide"), &Credential::new(TOKEN))
            .await
            .unwrap();
        assert_eq!(body, "<p>guide</p>");
    }

    #[tokio::test]
    async fn limit_up_is_file_missing() {
        let gateway = Gateway::new(Arc::new(pncks()));
        let err = gateway
            .resolve_and_fetch("PNCKS", "limit_up", None, &Credential::new(TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::FileMissing { ref path, .. } if path == "limit_up"));
    }

    #[tokio::test]
    async fn rejected_credential_is_invalid_credential() {
        let gateway = Gateway::new(Arc::new(pncks()));
        let err = gateway
            .resolve_and_fetch("PNCKS", "healthcheck", None, &Credential::new("glpat-revoked"))
            .await
            .unwrap_err();
        assert!(err.invalidates_credential());
    }

    #[tokio::test]
    async fn second_request_only_fetches_the_file() {
        let api = Arc::new(pncks());
        let gateway = Gateway::new(Arc::clone(&api) as Arc<dyn RemoteApi>);
        let cred = Credential::new(TOKEN);

        gateway.resolve_and_fetch("PNCKS", "healthcheck", None, &cred).await.unwrap();
        gateway.resolve_and_fetch("PNCKS", "healthcheck", None, &cred).await.unwrap();

        assert_eq!(api.call_count("/groups?search=PNCKS"), 1);
        assert_eq!(api.call_count("/groups/14660398/projects/"), 1);
        assert_eq!(
            api.call_count("/projects/33978260/repository/files/healthcheck.html/raw"),
            2
        );
        // Group and project ids.
        assert_eq!(gateway.resolver().cache().len(), 2);
    }
}
