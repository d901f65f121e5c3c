//! Unit of Work pattern implementation.
//!
//! Centralizes access to the repositories so services receive a single
//! dependency. Multi-statement writes go through `execute_transaction`.

use sea_orm::{AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::repositories::{
    ActivityRepository, ActivityStore, EtlExecutionRepository, EtlExecutionStore,
    FavoriteRepository, FavoriteStore, ProfileRepository, ProfileStore,
};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Integration tests provide an in-memory implementation.
pub trait UnitOfWork: Send + Sync {
    fn activities(&self) -> Arc<dyn ActivityRepository>;

    fn favorites(&self) -> Arc<dyn FavoriteRepository>;

    fn executions(&self) -> Arc<dyn EtlExecutionRepository>;

    fn profiles(&self) -> Arc<dyn ProfileRepository>;
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    activities: Arc<ActivityStore>,
    favorites: Arc<FavoriteStore>,
    executions: Arc<EtlExecutionStore>,
    profiles: Arc<ProfileStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            activities: Arc::new(ActivityStore::new(db.clone())),
            favorites: Arc::new(FavoriteStore::new(db.clone())),
            executions: Arc::new(EtlExecutionStore::new(db.clone())),
            profiles: Arc::new(ProfileStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn activities(&self) -> Arc<dyn ActivityRepository> {
        self.activities.clone()
    }

    fn favorites(&self) -> Arc<dyn FavoriteRepository> {
        self.favorites.clone()
    }

    fn executions(&self) -> Arc<dyn EtlExecutionRepository> {
        self.executions.clone()
    }

    fn profiles(&self) -> Arc<dyn ProfileRepository> {
        self.profiles.clone()
    }
}

/// Run `f` inside a read-write transaction at the given isolation level.
///
/// Commits when `f` returns `Ok`, rolls back otherwise. A failed rollback is
/// logged and the original error is returned.
pub(crate) async fn execute_transaction<F, T>(
    db: &DatabaseConnection,
    isolation: IsolationLevel,
    f: F,
) -> AppResult<T>
where
    F: for<'a> FnOnce(
            &'a DatabaseTransaction,
        ) -> Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>
        + Send,
    T: Send,
{
    let txn = db
        .begin_with_config(Some(isolation), Some(AccessMode::ReadWrite))
        .await
        .map_err(AppError::from)?;

    match f(&txn).await {
        Ok(result) => {
            txn.commit().await.map_err(AppError::from)?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}
