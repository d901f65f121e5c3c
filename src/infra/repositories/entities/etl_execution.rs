//! ETL execution database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::EtlExecution;
use crate::errors::AppError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "etl_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: String,
    pub source: String,
    pub started_at: Option<DateTimeUtc>,
    pub finished_at: Option<DateTimeUtc>,
    pub records_extracted: i32,
    pub records_transformed: i32,
    pub records_loaded: i32,
    pub records_failed: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub triggered_by: String,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub config: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub details: Option<Json>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for EtlExecution {
    type Error = AppError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(EtlExecution {
            id: model.id,
            status: model.status.parse()?,
            source: model.source,
            started_at: model.started_at,
            finished_at: model.finished_at,
            records_extracted: model.records_extracted,
            records_transformed: model.records_transformed,
            records_loaded: model.records_loaded,
            records_failed: model.records_failed,
            error_message: model.error_message,
            triggered_by: model.triggered_by,
            config: model.config,
            details: model.details,
            created_at: model.created_at,
        })
    }
}

/// Full-row active model, used for both insert and save.
impl From<&EtlExecution> for ActiveModel {
    fn from(execution: &EtlExecution) -> Self {
        use sea_orm::Set;

        ActiveModel {
            id: Set(execution.id),
            status: Set(execution.status.as_str().to_string()),
            source: Set(execution.source.clone()),
            started_at: Set(execution.started_at),
            finished_at: Set(execution.finished_at),
            records_extracted: Set(execution.records_extracted),
            records_transformed: Set(execution.records_transformed),
            records_loaded: Set(execution.records_loaded),
            records_failed: Set(execution.records_failed),
            error_message: Set(execution.error_message.clone()),
            triggered_by: Set(execution.triggered_by.clone()),
            config: Set(execution.config.clone()),
            details: Set(execution.details.clone()),
            created_at: Set(execution.created_at),
        }
    }
}
