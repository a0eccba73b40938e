//! Raw file retrieval.

use std::sync::Arc;

use tracing::info;

use crate::ProjectId;
use crate::client::{ApiStatus, RemoteApi};
use crate::credential::Credential;
use crate::error::{ApiError, GatewayError};

/// Suffix appended to every requested path.
pub const FILE_SUFFIX: &str = ".html";

/// Fetches `{path}.html` from a project's default branch.
pub struct ContentFetcher {
    api: Arc<dyn RemoteApi>,
}

impl ContentFetcher {
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self { api }
    }

    /// Fetch the raw file body, unmodified.
    ///
    /// `project` is only used to describe a missing file.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::FileMissing`] on 404.
    /// - [`GatewayError::InvalidCredential`] on 401.
    /// - [`GatewayError::Upstream`] on transport failure or unexpected status.
    pub async fn fetch_file(
        &self,
        project_id: ProjectId,
        project: &str,
        path: &str,
        credential: &Credential,
    ) -> Result<String, GatewayError> {
        let target = file_target(project_id, path);
        let resp = self.api.get(&target, credential).await?;

        match resp.status {
            ApiStatus::Ok => {
                info!(project_id, path = %path, bytes = resp.body.len(), "file fetched");
                Ok(resp.body)
            }
            ApiStatus::NotFound => {
                info!(project_id, path = %path, "file missing");
                Err(GatewayError::FileMissing {
                    project: project.to_owned(),
                    path: path.to_owned(),
                })
            }
            ApiStatus::Unauthorized => Err(GatewayError::InvalidCredential),
            ApiStatus::Other(status) => Err(ApiError::UnexpectedStatus {
                url: target,
                status,
            }
            .into()),
        }
    }
}

impl std::fmt::Debug for ContentFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentFetcher").finish_non_exhaustive()
    }
}

/// `/projects/{id}/repository/files/{encoded path}.html/raw`
fn file_target(project_id: ProjectId, path: &str) -> String {
    format!(
        "/projects/{project_id}/repository/files/{}{FILE_SUFFIX}/raw",
        urlencoding::encode(path)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::client::ApiResponse;
    use crate::testing::FakeApi;

    const TOKEN: &str = "glpat-valid";

    fn fetcher(api: FakeApi) -> ContentFetcher {
        ContentFetcher::new(Arc::new(api))
    }

    #[test]
    fn nested_paths_are_fully_encoded() {
        assert_eq!(
            file_target(7, "docs/intro page"),
            "/projects/7/repository/files/docs%2Fintro%20page.html/raw"
        );
        assert_eq!(
            file_target(33_978_260, "healthcheck"),
            "/projects/33978260/repository/files/healthcheck.html/raw"
        );
    }

    #[tokio::test]
    async fn body_is_returned_verbatim() {
        let html = "<!DOCTYPE HTML>\n<html lang=\"en\">\n<head>\n<title>healthcheck</title>\n</head></html>\n";
        let f = fetcher(FakeApi::new().accept(TOKEN).respond(
            "/projects/33978260/repository/files/healthcheck.html/raw",
            ApiResponse::ok(html),
        ));

        let body = f
            .fetch_file(33_978_260, "healthcheck", "healthcheck", &Credential::new(TOKEN))
            .await
            .unwrap();
        assert_eq!(body, html);
    }

    #[tokio::test]
    async fn not_found_is_file_missing_with_requested_path() {
        let f = fetcher(FakeApi::new().accept(TOKEN).status(
            "/projects/5/repository/files/limit_up.html/raw",
            ApiStatus::NotFound,
        ));

        let err = f
            .fetch_file(5, "limit_up", "limit_up", &Credential::new(TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GatewayError::FileMissing { ref project, ref path } if project == "limit_up" && path == "limit_up"
        ));
    }

    #[tokio::test]
    async fn unauthorized_is_invalid_credential() {
        let f = fetcher(FakeApi::new());
        let err = f
            .fetch_file(5, "p", "p", &Credential::new("nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::InvalidCredential));
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let f = fetcher(FakeApi::new().accept(TOKEN).status(
            "/projects/5/repository/files/p.html/raw",
            ApiStatus::Other(503),
        ));
        let err = f
            .fetch_file(5, "p", "p", &Credential::new(TOKEN))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upstream(_)));
    }
}
