//! Name → id resolution against the upstream API.
//!
//! Group names are resolved through the search endpoint; project names are
//! resolved by listing every project of the group, following `next` links
//! until the listing is exhausted. Successful resolutions go through the
//! [`ResolutionCache`] owned by the resolver.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use crate::cache::{CacheKey, ResolutionCache};
use crate::client::{ApiStatus, RemoteApi};
use crate::credential::Credential;
use crate::error::{ApiError, GatewayError};
use crate::{GroupId, ProjectId};

#[derive(Debug, Deserialize)]
struct GroupRecord {
    id: GroupId,
}

#[derive(Debug, Deserialize)]
struct ProjectRecord {
    id: ProjectId,
    name: String,
}

/// Resolves group and project names to upstream ids, per credential.
pub struct Resolver {
    api: Arc<dyn RemoteApi>,
    cache: ResolutionCache,
}

impl Resolver {
    /// Create a resolver with an empty cache.
    #[must_use]
    pub fn new(api: Arc<dyn RemoteApi>) -> Self {
        Self {
            api,
            cache: ResolutionCache::new(),
        }
    }

    /// The resolver's cache.
    #[must_use]
    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Resolve `group` to its id.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidCredential`] if the search call returns 401.
    /// - [`GatewayError::UnknownGroup`] if the search result is empty.
    /// - [`GatewayError::Upstream`] on transport failure or unexpected status.
    pub async fn resolve_group(
        &self,
        group: &str,
        credential: &Credential,
    ) -> Result<GroupId, GatewayError> {
        self.cache
            .get_or_resolve(CacheKey::group(group, credential), || {
                self.search_group(group, credential)
            })
            .await
    }

    /// Resolve `project` inside `group` to its id.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::InvalidCredential`] if any call returns 401.
    /// - [`GatewayError::UnknownGroup`] if the group cannot be resolved.
    /// - [`GatewayError::UnknownProject`] if no page lists a project with
    ///   exactly this name.
    /// - [`GatewayError::Upstream`] on transport failure or unexpected status.
    pub async fn resolve_project(
        &self,
        project: &str,
        group: &str,
        credential: &Credential,
    ) -> Result<ProjectId, GatewayError> {
        self.cache
            .get_or_resolve(CacheKey::project(project, group, credential), || async {
                let group_id = self.resolve_group(group, credential).await?;
                self.find_project(group_id, project, group, credential).await
            })
            .await
    }

    async fn search_group(
        &self,
        group: &str,
        credential: &Credential,
    ) -> Result<GroupId, GatewayError> {
        let target = format!("/groups?search={}", urlencoding::encode(group));
        let resp = self.api.get(&target, credential).await?;
        expect_ok(resp.status, &target, || GatewayError::UnknownGroup {
            group: group.to_owned(),
        })?;

        let groups: Vec<GroupRecord> = resp.json(&target)?;
        let Some(found) = groups.first() else {
            info!(group = %group, "group search returned no match");
            return Err(GatewayError::UnknownGroup {
                group: group.to_owned(),
            });
        };

        info!(group = %group, group_id = found.id, "group resolved");
        Ok(found.id)
    }

    /// List every project of `group_id` across all pages, then pick the
    /// exact name match.
    async fn find_project(
        &self,
        group_id: GroupId,
        project: &str,
        group: &str,
        credential: &Credential,
    ) -> Result<ProjectId, GatewayError> {
        let mut target = format!("/groups/{group_id}/projects/");
        let mut visited = HashSet::new();
        let mut by_name: HashMap<String, ProjectId> = HashMap::new();
        let mut pages: u32 = 0;

        loop {
            if !visited.insert(target.clone()) {
                warn!(group_id, url = %target, "pagination revisited a page, stopping");
                break;
            }

            let resp = self.api.get(&target, credential).await?;
            expect_ok(resp.status, &target, || GatewayError::UnknownGroup {
                group: group.to_owned(),
            })?;

            let records: Vec<ProjectRecord> = resp.json(&target)?;
            pages = pages.saturating_add(1);
            for record in records {
                by_name.entry(record.name).or_insert(record.id);
            }

            match resp.next_link {
                Some(next) => target = next,
                None => break,
            }
        }

        match by_name.get(project) {
            Some(&id) => {
                info!(project = %project, project_id = id, pages, "project resolved");
                Ok(id)
            }
            None => {
                info!(project = %project, group_id, pages, seen = by_name.len(), "project not found");
                Err(GatewayError::UnknownProject {
                    project: project.to_owned(),
                })
            }
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("cache", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Map a non-OK status to the matching error.
fn expect_ok(
    status: ApiStatus,
    url: &str,
    not_found: impl FnOnce() -> GatewayError,
) -> Result<(), GatewayError> {
    match status {
        ApiStatus::Ok => Ok(()),
        ApiStatus::Unauthorized => Err(GatewayError::InvalidCredential),
        ApiStatus::NotFound => Err(not_found()),
        ApiStatus::Other(code) => Err(ApiError::UnexpectedStatus {
            url: url.to_owned(),
            status: code,
        }
        .into()),
    }
}
