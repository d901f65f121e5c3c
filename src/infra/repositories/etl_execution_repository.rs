//! ETL execution repository.

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};
use uuid::Uuid;

use super::entities::etl_execution::{self, ActiveModel, Entity as EtlExecutionEntity};
use crate::domain::EtlExecution;
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Execution record repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait EtlExecutionRepository: Send + Sync {
    async fn create(&self, execution: EtlExecution) -> AppResult<EtlExecution>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<EtlExecution>>;

    /// Persist the whole record; each call is its own short transaction
    async fn save(&self, execution: EtlExecution) -> AppResult<EtlExecution>;

    /// One page of executions, newest first, with the total
    async fn list_recent(&self, page: PaginationParams) -> AppResult<(Vec<EtlExecution>, u64)>;
}

/// Concrete implementation of EtlExecutionRepository
pub struct EtlExecutionStore {
    db: DatabaseConnection,
}

impl EtlExecutionStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EtlExecutionRepository for EtlExecutionStore {
    async fn create(&self, execution: EtlExecution) -> AppResult<EtlExecution> {
        let model = ActiveModel::from(&execution).insert(&self.db).await?;
        EtlExecution::try_from(model)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<EtlExecution>> {
        EtlExecutionEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(EtlExecution::try_from)
            .transpose()
    }

    async fn save(&self, execution: EtlExecution) -> AppResult<EtlExecution> {
        let model = ActiveModel::from(&execution).update(&self.db).await?;
        EtlExecution::try_from(model)
    }

    async fn list_recent(&self, page: PaginationParams) -> AppResult<(Vec<EtlExecution>, u64)> {
        let paginator = EtlExecutionEntity::find()
            .order_by_desc(etl_execution::Column::CreatedAt)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let executions = paginator
            .fetch_page(page.page_index())
            .await?
            .into_iter()
            .map(EtlExecution::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        Ok((executions, total))
    }
}
