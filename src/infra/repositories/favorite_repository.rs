//! Favorite repository. Pair writes and the activity counter move together.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IsolationLevel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use std::collections::HashSet;
use uuid::Uuid;

use super::entities::activity::{self, Entity as ActivityEntity};
use super::entities::favorite::{self, ActiveModel, Entity as FavoriteEntity};
use crate::domain::{Activity, Favorite};
use crate::errors::{AppError, AppResult};
use crate::infra::unit_of_work::execute_transaction;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Favorite repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Insert the pair and bump the activity's favorite count in one transaction.
    /// A second insert of the same pair is a `Conflict`.
    async fn add(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Favorite>;

    /// Delete the pair and decrement the count, never below zero.
    /// `false` when the pair did not exist.
    async fn remove(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<bool>;

    /// Every activity id the user has saved
    async fn activity_ids_for_user(&self, user_id: Uuid) -> AppResult<HashSet<Uuid>>;

    /// One page of the user's favorites, newest first, with the total
    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<(Favorite, Activity)>, u64)>;
}

/// Concrete implementation of FavoriteRepository
pub struct FavoriteStore {
    db: DatabaseConnection,
}

impl FavoriteStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl FavoriteRepository for FavoriteStore {
    async fn add(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Favorite> {
        execute_transaction(&self.db, IsolationLevel::ReadCommitted, |txn| {
            Box::pin(async move {
                let inserted = ActiveModel {
                    id: Set(Uuid::new_v4()),
                    usuario_id: Set(user_id),
                    actividad_id: Set(activity_id),
                    fecha_guardado: Set(Utc::now()),
                }
                .insert(txn)
                .await
                .map_err(AppError::from);

                let model = match inserted {
                    Ok(model) => model,
                    Err(e) if e.is_unique_violation() => {
                        return Err(AppError::conflict("Activity is already in favorites"))
                    }
                    Err(e) => return Err(e),
                };

                ActivityEntity::update_many()
                    .col_expr(
                        activity::Column::PopularidadFavoritos,
                        Expr::col(activity::Column::PopularidadFavoritos).add(1),
                    )
                    .filter(activity::Column::Id.eq(activity_id))
                    .exec(txn)
                    .await?;

                Ok(Favorite::from(model))
            })
        })
        .await
    }

    async fn remove(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<bool> {
        execute_transaction(&self.db, IsolationLevel::ReadCommitted, |txn| {
            Box::pin(async move {
                let deleted = FavoriteEntity::delete_many()
                    .filter(favorite::Column::UsuarioId.eq(user_id))
                    .filter(favorite::Column::ActividadId.eq(activity_id))
                    .exec(txn)
                    .await?;

                if deleted.rows_affected == 0 {
                    return Ok(false);
                }

                ActivityEntity::update_many()
                    .col_expr(
                        activity::Column::PopularidadFavoritos,
                        Expr::col(activity::Column::PopularidadFavoritos).sub(1),
                    )
                    .filter(activity::Column::Id.eq(activity_id))
                    .filter(activity::Column::PopularidadFavoritos.gt(0))
                    .exec(txn)
                    .await?;

                Ok(true)
            })
        })
        .await
    }

    async fn activity_ids_for_user(&self, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
        let ids = FavoriteEntity::find()
            .select_only()
            .column(favorite::Column::ActividadId)
            .filter(favorite::Column::UsuarioId.eq(user_id))
            .into_tuple::<Uuid>()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().collect())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<(Favorite, Activity)>, u64)> {
        let paginator = FavoriteEntity::find()
            .filter(favorite::Column::UsuarioId.eq(user_id))
            .order_by_desc(favorite::Column::FechaGuardado)
            .find_also_related(ActivityEntity)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.page_index()).await?;

        let items = rows
            .into_iter()
            .filter_map(|(fav, activity)| activity.map(|a| (fav, a)))
            .map(|(fav, activity)| Ok((Favorite::from(fav), Activity::try_from(activity)?)))
            .collect::<AppResult<Vec<_>>>()?;

        Ok((items, total))
    }
}
