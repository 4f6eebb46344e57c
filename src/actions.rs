//! Outbound collaborators: bulk operations on the selection and user-facing
//! notifications.

use crate::core::config::FetchConfig;
use crate::data::parcel::{ListingId, ParcelId};
use crate::fetch::source::{check_status, join_url, prepare, HTTP_CLIENT};
use crate::Result;
use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fields of a new listing created from the selection
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListingDraft {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtor_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<u64>,
    #[serde(default)]
    pub is_published: bool,
}

impl ListingDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// Bulk operations the admin map offers on the selection
#[async_trait]
pub trait BulkActions: Send + Sync {
    /// Binds parcels to a listing, returning how many were updated
    async fn bulk_assign(&self, ids: &[ParcelId], listing: ListingId) -> Result<u64>;
    /// Deletes parcels, returning how many were deleted
    async fn bulk_delete(&self, ids: &[ParcelId]) -> Result<u64>;
    /// Creates a listing holding the parcels
    async fn create_listing(&self, draft: &ListingDraft, ids: &[ParcelId]) -> Result<ListingId>;
}

/// A bulk operation requested by the host
#[derive(Debug, Clone, PartialEq)]
pub enum BulkAction {
    Assign { listing: ListingId },
    Delete,
    CreateListing(ListingDraft),
}

/// What a completed bulk operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    Assigned(u64),
    Deleted(u64),
    Created(ListingId),
}

impl BulkAction {
    pub async fn execute(&self, actions: &dyn BulkActions, ids: &[ParcelId]) -> Result<BulkOutcome> {
        match self {
            BulkAction::Assign { listing } => {
                actions.bulk_assign(ids, *listing).await.map(BulkOutcome::Assigned)
            }
            BulkAction::Delete => actions.bulk_delete(ids).await.map(BulkOutcome::Deleted),
            BulkAction::CreateListing(draft) => actions
                .create_listing(draft, ids)
                .await
                .map(BulkOutcome::Created),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            BulkAction::Assign { .. } => "assign parcels",
            BulkAction::Delete => "delete parcels",
            BulkAction::CreateListing(_) => "create listing",
        }
    }
}

impl BulkOutcome {
    /// Toast text for a successful operation
    pub fn message(&self) -> String {
        match self {
            BulkOutcome::Assigned(n) => format!("Assigned {n} parcels"),
            BulkOutcome::Deleted(n) => format!("Deleted {n} parcels"),
            BulkOutcome::Created(id) => format!("Created listing #{id}"),
        }
    }
}

/// Toast-style notifications for the user
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
}

/// [`Notifier`] that writes to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        log::info!("{message}");
    }

    fn error(&self, message: &str) {
        log::error!("{message}");
    }
}

#[derive(Serialize)]
struct AssignBody<'a> {
    plot_ids: &'a [ParcelId],
    listing_id: ListingId,
}

#[derive(Serialize)]
struct DeleteBody<'a> {
    ids: &'a [ParcelId],
}

#[derive(Serialize)]
struct CreateListingBody<'a> {
    #[serde(flatten)]
    draft: &'a ListingDraft,
    plot_ids: &'a [ParcelId],
}

#[derive(Deserialize)]
struct UpdatedCount {
    updated_count: u64,
}

#[derive(Deserialize)]
struct DeletedCount {
    deleted_count: u64,
}

#[derive(Deserialize)]
struct CreatedListing {
    id: ListingId,
}

/// [`BulkActions`] against the admin API
#[derive(Debug, Clone)]
pub struct HttpBulkActions {
    assign_url: Url,
    delete_url: Url,
    listings_url: Url,
    auth_token: Option<String>,
    timeout: Option<Duration>,
}

impl HttpBulkActions {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self {
            assign_url: join_url(&config.base_url, "/api/admin/plots/bulk-assign")?,
            delete_url: join_url(&config.base_url, "/api/admin/plots/bulk-delete/")?,
            listings_url: join_url(&config.base_url, "/api/admin/listings/")?,
            auth_token: config.auth_token.clone(),
            timeout: config.request_timeout(),
        })
    }

    async fn post<B, R>(&self, url: &Url, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: serde::de::DeserializeOwned,
    {
        log::debug!("POST {url}");
        let request = prepare(
            HTTP_CLIENT.post(url.clone()).json(body),
            self.auth_token.as_deref(),
            self.timeout,
        );
        let response = check_status(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl BulkActions for HttpBulkActions {
    async fn bulk_assign(&self, ids: &[ParcelId], listing: ListingId) -> Result<u64> {
        let body = AssignBody {
            plot_ids: ids,
            listing_id: listing,
        };
        let reply: UpdatedCount = self.post(&self.assign_url, &body).await?;
        Ok(reply.updated_count)
    }

    async fn bulk_delete(&self, ids: &[ParcelId]) -> Result<u64> {
        let reply: DeletedCount = self.post(&self.delete_url, &DeleteBody { ids }).await?;
        Ok(reply.deleted_count)
    }

    async fn create_listing(&self, draft: &ListingDraft, ids: &[ParcelId]) -> Result<ListingId> {
        let body = CreateListingBody {
            draft,
            plot_ids: ids,
        };
        let reply: CreatedListing = self.post(&self.listings_url, &body).await?;
        Ok(reply.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_bodies_match_admin_api() {
        let ids = [ParcelId(3), ParcelId(7)];

        let assign = serde_json::to_value(AssignBody {
            plot_ids: &ids,
            listing_id: ListingId(12),
        })
        .unwrap();
        assert_eq!(assign, json!({"plot_ids": [3, 7], "listing_id": 12}));

        let delete = serde_json::to_value(DeleteBody { ids: &ids }).unwrap();
        assert_eq!(delete, json!({"ids": [3, 7]}));

        let draft = ListingDraft {
            realtor_id: Some(2),
            ..ListingDraft::new("Lots near Zelenogradsk")
        };
        let create = serde_json::to_value(CreateListingBody {
            draft: &draft,
            plot_ids: &ids,
        })
        .unwrap();
        assert_eq!(
            create,
            json!({
                "title": "Lots near Zelenogradsk",
                "realtor_id": 2,
                "is_published": false,
                "plot_ids": [3, 7]
            })
        );
    }

    #[test]
    fn test_endpoints() {
        let actions = HttpBulkActions::new(&FetchConfig::default()).unwrap();
        assert_eq!(actions.assign_url.path(), "/api/admin/plots/bulk-assign");
        assert_eq!(actions.delete_url.path(), "/api/admin/plots/bulk-delete/");
        assert_eq!(actions.listings_url.path(), "/api/admin/listings/");
    }

    #[test]
    fn test_outcome_messages() {
        assert_eq!(BulkOutcome::Assigned(4).message(), "Assigned 4 parcels");
        assert_eq!(BulkOutcome::Created(ListingId(9)).message(), "Created listing #9");
        assert_eq!(BulkAction::Delete.describe(), "delete parcels");
    }
}
