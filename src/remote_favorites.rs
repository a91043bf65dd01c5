//! Favorites kept in the remote `favourites` table for signed-in users.

use std::sync::Arc;

use chrono::Utc;

use crate::bookmarks::BookmarkStore;
use crate::error::SyncError;
use crate::gateway::{select_as, upsert_as, Filter, Query, RemoteGateway};
use crate::models::{Favorite, FavoriteRow, FavoriteViewRow};
use crate::session::{OwnerId, Session};

const FAVORITES_TABLE: &str = "favourites";
const FAVORITES_VIEW: &str = "v_favourites_with_text";
const CONFLICT_KEYS: [&str; 3] = ["user_id", "surah", "ayah"];

/// Remote favorite operations. Every call needs an authenticated session.
pub struct RemoteFavorites {
    gateway: Arc<dyn RemoteGateway>,
}

impl RemoteFavorites {
    pub fn new(gateway: Arc<dyn RemoteGateway>) -> Self {
        Self { gateway }
    }

    fn owner(session: Session) -> Result<OwnerId, SyncError> {
        session.owner().ok_or(SyncError::Unauthenticated)
    }

    fn ayah_filters(owner: OwnerId, surah: u32, ayah: u32) -> Vec<Filter> {
        vec![
            Filter::eq("user_id", owner.to_string()),
            Filter::eq("surah", surah),
            Filter::eq("ayah", ayah),
        ]
    }

    pub async fn is_favorite(&self, session: Session, surah: u32, ayah: u32) -> Result<bool, SyncError> {
        let owner = Self::owner(session)?;
        let query = Query {
            filters: Self::ayah_filters(owner, surah, ayah),
            order: Vec::new(),
        };
        let rows = self.gateway.select(FAVORITES_TABLE, &query).await?;
        Ok(!rows.is_empty())
    }

    /// Flips the remote state and returns the new state.
    pub async fn toggle(&self, session: Session, surah: u32, ayah: u32) -> Result<bool, SyncError> {
        let owner = Self::owner(session)?;
        if self.is_favorite(session, surah, ayah).await? {
            self.gateway
                .delete(FAVORITES_TABLE, &Self::ayah_filters(owner, surah, ayah))
                .await?;
            tracing::debug!(surah, ayah, "Removed remote favorite");
            Ok(false)
        } else {
            let row = FavoriteRow::insert(owner.as_uuid(), surah, ayah);
            let _: Vec<FavoriteRow> =
                upsert_as(self.gateway.as_ref(), FAVORITES_TABLE, &[row], &CONFLICT_KEYS).await?;
            tracing::debug!(surah, ayah, "Added remote favorite");
            Ok(true)
        }
    }

    /// The owner's favorites, newest first.
    pub async fn list(&self, session: Session) -> Result<Vec<Favorite>, SyncError> {
        let owner = Self::owner(session)?;
        let query = Query::new()
            .eq("user_id", owner.to_string())
            .order("created_at", false);
        let rows: Vec<FavoriteRow> = select_as(self.gateway.as_ref(), FAVORITES_TABLE, &query).await?;
        Ok(rows
            .into_iter()
            .map(|r| Favorite::at(r.surah, r.ayah, r.created_at.unwrap_or_else(Utc::now)))
            .collect())
    }

    /// The owner's favorites joined with their Arabic and Albanian text.
    pub async fn list_with_text(&self, session: Session) -> Result<Vec<FavoriteViewRow>, SyncError> {
        let owner = Self::owner(session)?;
        let query = Query::new()
            .eq("user_id", owner.to_string())
            .order("created_at", false);
        Ok(select_as(self.gateway.as_ref(), FAVORITES_VIEW, &query).await?)
    }

    /// Toggles a favorite remotely while keeping `store` in step.
    ///
    /// The local flip is applied first. After the remote toggle the remote
    /// state is read back and written into `store`. If any remote step fails
    /// the local favorite is restored exactly, timestamp included, and the
    /// error is returned.
    pub async fn toggle_and_reconcile(
        &self,
        store: &mut BookmarkStore,
        session: Session,
        surah: u32,
        ayah: u32,
    ) -> Result<bool, SyncError> {
        Self::owner(session)?;

        let prior = store.favorite(surah, ayah).map(|f| f.created_at);
        let was_favorite = prior.is_some();
        store.set_favorite(surah, ayah, !was_favorite, None).await;

        let confirmed: Result<bool, SyncError> = async {
            self.toggle(session, surah, ayah).await?;
            self.is_favorite(session, surah, ayah).await
        }
        .await;

        match confirmed {
            Ok(is_favorite) => {
                store.set_favorite(surah, ayah, is_favorite, None).await;
                Ok(is_favorite)
            }
            Err(e) => {
                tracing::warn!(surah, ayah, "Favorite toggle failed, rolling back: {}", e);
                store.set_favorite(surah, ayah, was_favorite, prior).await;
                Err(e)
            }
        }
    }
}
