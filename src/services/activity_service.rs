//! Activity administration: manual creation, editing, moderation, soft
//! delete, the public listing and detail views and the synchronous strict
//! import.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{STATUS_ACTIVE, VIEW_INCREMENT};
use crate::domain::{
    Activity, ActivitySearch, ActivityStatus, ActivitySummary, ActivityUpdate, NewActivity,
};
use crate::errors::{format_validation_errors, AppError, AppResult, OptionExt};
use crate::etl::{extract, parse_import_row, SourceFormat};
use crate::infra::{InsertOutcome, UnitOfWork};
use crate::types::{Paginated, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// One rejected import row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportRowError {
    /// 1-based row number
    pub fila: usize,
    pub error: String,
}

/// Outcome of a synchronous import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportResult {
    pub total_procesados: usize,
    pub exitosos: usize,
    pub duplicados: usize,
    pub errores: usize,
    pub errores_detalle: Vec<ImportRowError>,
}

impl ImportResult {
    fn reject(&mut self, fila: usize, error: impl Into<String>) {
        self.errores += 1;
        self.errores_detalle.push(ImportRowError {
            fila,
            error: error.into(),
        });
    }
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivityService: Send + Sync {
    /// Validate strictly and store as active
    async fn create(&self, input: NewActivity) -> AppResult<Activity>;

    /// Public catalog listing: active activities only
    async fn list(
        &self,
        search: ActivitySearch,
        page: PaginationParams,
    ) -> AppResult<Paginated<ActivitySummary>>;

    /// Public detail of an active activity. Registers one view.
    async fn get_detail(&self, id: Uuid) -> AppResult<Activity>;

    /// Activities waiting for moderation, oldest first
    async fn list_pending(&self, page: PaginationParams) -> AppResult<Paginated<Activity>>;

    /// Partial edit of an activity in any status. The merged record must
    /// pass the same strict validation as a creation.
    async fn update(&self, id: Uuid, changes: ActivityUpdate) -> AppResult<Activity>;

    async fn approve(&self, id: Uuid) -> AppResult<Activity>;

    async fn reject(&self, id: Uuid) -> AppResult<Activity>;

    /// active -> inactive. Rows are never physically removed.
    async fn soft_delete(&self, id: Uuid) -> AppResult<()>;

    /// Strict row-by-row import. Only an unreadable payload fails the call.
    async fn import(&self, format: SourceFormat, payload: String) -> AppResult<ImportResult>;
}

pub struct ActivityManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ActivityManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn transition(&self, id: Uuid, next: ActivityStatus) -> AppResult<Activity> {
        let activity = self.uow.activities().find_by_id(id).await?.ok_or_not_found()?;

        if !activity.status.can_transition_to(next) {
            return Err(AppError::invalid_state(format!(
                "Activity cannot move from {} to {}",
                activity.status, next
            )));
        }

        let updated = self.uow.activities().update_status(id, next).await?;
        tracing::info!(activity_id = %id, from = %activity.status, to = %next, "Activity status changed");
        Ok(updated)
    }

    /// Validate one parsed import row and load it, updating the tally.
    async fn import_row(&self, fila: usize, record: NewActivity, result: &mut ImportResult) -> AppResult<()> {
        let record = record.normalized();
        if let Err(errors) = record.validate() {
            result.reject(fila, format_validation_errors(&errors));
            return Ok(());
        }

        if let Some((title, start, address)) = record.catalog_key() {
            if self.uow.activities().exists_in_catalog(title, start, address).await? {
                result.duplicados += 1;
                return Ok(());
            }
        }

        match self.uow.activities().insert(record).await {
            Ok(InsertOutcome::Inserted(_)) => result.exitosos += 1,
            Ok(InsertOutcome::Duplicate) => result.duplicados += 1,
            Err(e) => {
                tracing::warn!(fila, error = %e, "Import row failed to load");
                result.reject(fila, e.user_message());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> ActivityService for ActivityManager<U> {
    async fn create(&self, input: NewActivity) -> AppResult<Activity> {
        let mut record = input.normalized();
        record.status = STATUS_ACTIVE.to_string();
        record
            .validate()
            .map_err(|errors| AppError::validation(format_validation_errors(&errors)))?;

        match self.uow.activities().insert(record).await? {
            InsertOutcome::Inserted(activity) => {
                tracing::info!(activity_id = %activity.id, "Activity created");
                Ok(activity)
            }
            InsertOutcome::Duplicate => Err(AppError::conflict(
                "An activity with the same title, start and address already exists",
            )),
        }
    }

    async fn list(
        &self,
        search: ActivitySearch,
        page: PaginationParams,
    ) -> AppResult<Paginated<ActivitySummary>> {
        search
            .validate()
            .map_err(|errors| AppError::validation(format_validation_errors(&errors)))?;

        let (items, total) = self.uow.activities().search(search, page.clone()).await?;
        let items: Vec<ActivitySummary> = items.into_iter().map(ActivitySummary::from).collect();
        Ok(Paginated::new(items, &page, total))
    }

    async fn get_detail(&self, id: Uuid) -> AppResult<Activity> {
        let mut activity = self
            .uow
            .activities()
            .find_by_id(id)
            .await?
            .filter(Activity::is_active)
            .ok_or_not_found()?;

        if self.uow.activities().increment_views(id).await? {
            activity.view_score += VIEW_INCREMENT;
        }
        Ok(activity)
    }

    async fn list_pending(&self, page: PaginationParams) -> AppResult<Paginated<Activity>> {
        let (items, total) = self
            .uow
            .activities()
            .list_by_status(ActivityStatus::PendienteValidacion, page.clone())
            .await?;
        Ok(Paginated::new(items, &page, total))
    }

    async fn update(&self, id: Uuid, changes: ActivityUpdate) -> AppResult<Activity> {
        if changes.is_empty() {
            return Err(AppError::validation("No fields to update"));
        }
        let activity = self.uow.activities().find_by_id(id).await?.ok_or_not_found()?;

        let mut record = activity.to_record();
        changes.apply(&mut record);
        let record = record.normalized();
        record
            .validate()
            .map_err(|errors| AppError::validation(format_validation_errors(&errors)))?;

        let updated = self.uow.activities().update(id, record).await?;
        tracing::info!(activity_id = %id, "Activity updated");
        Ok(updated)
    }

    async fn approve(&self, id: Uuid) -> AppResult<Activity> {
        self.transition(id, ActivityStatus::Activa).await
    }

    async fn reject(&self, id: Uuid) -> AppResult<Activity> {
        self.transition(id, ActivityStatus::Rechazada).await
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        self.transition(id, ActivityStatus::Inactiva).await.map(|_| ())
    }

    async fn import(&self, format: SourceFormat, payload: String) -> AppResult<ImportResult> {
        let rows = extract(format, &payload)?;
        let mut result = ImportResult {
            total_procesados: rows.len(),
            ..Default::default()
        };

        for (position, row) in rows.iter().enumerate() {
            let fila = position + 1;
            match parse_import_row(row) {
                Ok(record) => self.import_row(fila, record, &mut result).await?,
                Err(reason) => result.reject(fila, reason),
            }
        }

        tracing::info!(
            format = %format,
            total = result.total_procesados,
            loaded = result.exitosos,
            duplicates = result.duplicados,
            errors = result.errores,
            "Import finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::activity::fixtures::valid_record;
    use crate::infra::{
        ActivityRepository, EtlExecutionRepository, FavoriteRepository, MockActivityRepository,
        ProfileRepository,
    };
    use chrono::Utc;

    struct MockUow {
        activities: Arc<MockActivityRepository>,
    }

    impl UnitOfWork for MockUow {
        fn activities(&self) -> Arc<dyn ActivityRepository> {
            self.activities.clone()
        }
        fn favorites(&self) -> Arc<dyn FavoriteRepository> {
            unreachable!("favorites not used")
        }
        fn executions(&self) -> Arc<dyn EtlExecutionRepository> {
            unreachable!("executions not used")
        }
        fn profiles(&self) -> Arc<dyn ProfileRepository> {
            unreachable!("profiles not used")
        }
    }

    fn service(repo: MockActivityRepository) -> ActivityManager<MockUow> {
        ActivityManager::new(Arc::new(MockUow {
            activities: Arc::new(repo),
        }))
    }

    fn stored(status: ActivityStatus) -> Activity {
        let record = valid_record();
        Activity {
            id: Uuid::new_v4(),
            title: record.title,
            description: record.description,
            category: crate::domain::Category::Cultura,
            start: Utc::now(),
            end: None,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            locality: crate::domain::Locality::Chapinero,
            price: 0.0,
            is_free: true,
            level: None,
            tags: record.tags,
            contact: None,
            external_link: None,
            imagen_url: None,
            source: "manual".into(),
            status,
            favorite_count: 0,
            view_score: 0.0,
            normalized_popularity: 0.0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn create_rejects_free_activity_with_price() {
        let mut record = valid_record();
        record.is_free = true;
        record.price = 15000.0;

        let result = service(MockActivityRepository::new()).create(record).await;

        match result {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("Una actividad gratuita no puede tener precio > 0"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn create_stores_as_active() {
        let mut repo = MockActivityRepository::new();
        repo.expect_insert()
            .withf(|record| record.status == STATUS_ACTIVE)
            .returning(|_| Ok(InsertOutcome::Inserted(stored(ActivityStatus::Activa))));

        let activity = service(repo).create(valid_record()).await.unwrap();
        assert_eq!(activity.status, ActivityStatus::Activa);
    }

    #[tokio::test]
    async fn approving_an_active_activity_is_an_invalid_state() {
        let activity = stored(ActivityStatus::Activa);
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(activity.clone())));
        repo.expect_update_status().never();

        let result = service(repo).approve(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn detail_registers_a_view() {
        let activity = stored(ActivityStatus::Activa);
        let id = activity.id;
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(activity.clone())));
        repo.expect_increment_views()
            .withf(move |candidate| *candidate == id)
            .times(1)
            .returning(|_| Ok(true));

        let detail = service(repo).get_detail(id).await.unwrap();
        assert!((detail.view_score - VIEW_INCREMENT).abs() < 1e-9);
    }

    #[tokio::test]
    async fn pending_activities_are_hidden_from_detail() {
        let activity = stored(ActivityStatus::PendienteValidacion);
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(activity.clone())));
        repo.expect_increment_views().never();

        let result = service(repo).get_detail(Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn list_maps_matches_into_summaries() {
        let activity = stored(ActivityStatus::Activa);
        let id = activity.id;
        let mut repo = MockActivityRepository::new();
        repo.expect_search()
            .withf(|search, page| search.text().as_deref() == Some("jazz") && page.page_index() == 1)
            .returning(move |_, _| Ok((vec![activity.clone()], 21)));

        let search = ActivitySearch {
            q: Some("  Jazz ".to_string()),
            ..Default::default()
        };
        let page = PaginationParams::new(2, 20);
        let listed = service(repo).list(search, page).await.unwrap();

        assert_eq!(listed.data.len(), 1);
        assert_eq!(listed.data[0].id, id);
        assert_eq!(listed.meta.total, 21);
    }

    #[tokio::test]
    async fn list_rejects_inverted_price_range() {
        let mut repo = MockActivityRepository::new();
        repo.expect_search().never();

        let search = ActivitySearch {
            precio_min: Some(50000.0),
            precio_max: Some(1000.0),
            ..Default::default()
        };
        let result = service(repo).list(search, PaginationParams::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_merges_and_keeps_the_status() {
        let activity = stored(ActivityStatus::PendienteValidacion);
        let id = activity.id;
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(activity.clone())));
        repo.expect_update()
            .withf(|_, record| {
                record.title == "Jazz en la plaza"
                    && record.status == "pendiente_validacion"
                    && record.tags == vec!["jazz"]
            })
            .times(1)
            .returning(|_, _| Ok(stored(ActivityStatus::PendienteValidacion)));

        let changes = ActivityUpdate {
            title: Some("  Jazz en la plaza ".to_string()),
            tags: Some(vec!["JAZZ".to_string()]),
            ..Default::default()
        };
        assert!(service(repo).update(id, changes).await.is_ok());
    }

    #[tokio::test]
    async fn update_revalidates_the_merged_record() {
        let activity = stored(ActivityStatus::Activa);
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id()
            .returning(move |_| Ok(Some(activity.clone())));
        repo.expect_update().never();

        let changes = ActivityUpdate { price: Some(12000.0), ..Default::default() };
        let result = service(repo).update(Uuid::new_v4(), changes).await;

        match result {
            Err(AppError::Validation(msg)) => {
                assert!(msg.contains("Una actividad gratuita no puede tener precio > 0"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn update_of_unknown_activity_is_not_found() {
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id().returning(|_| Ok(None));
        repo.expect_update().never();

        let changes = ActivityUpdate { contact: Some("info@example.org".to_string()), ..Default::default() };
        let result = service(repo).update(Uuid::new_v4(), changes).await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[tokio::test]
    async fn empty_update_is_rejected_before_any_lookup() {
        let mut repo = MockActivityRepository::new();
        repo.expect_find_by_id().never();

        let result = service(repo).update(Uuid::new_v4(), ActivityUpdate::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn import_reports_rows_individually() {
        let payload = "\
titulo,descripcion,tipo,fecha_inicio,ubicacion_direccion,ubicacion_lat,ubicacion_lng,localidad,etiquetas,es_gratis,precio
Concierto en el parque,Concierto gratuito al aire libre,cultura,2025-12-01,Calle 60 # 5-20,4.64,-74.06,Chapinero,musica,true,0
Sin coordenadas,Falta la latitud en esta fila,cultura,2025-12-01,Calle 60 # 5-20,x,-74.06,Chapinero,musica,true,0
Ya existe,Actividad repetida del catalogo,cultura,2025-12-02,Carrera 7 # 12-30,4.6,-74.07,Santa Fe,arte,true,0
Con precio,Gratuita con precio es invalida,cultura,2025-12-03,Carrera 7 # 12-30,4.6,-74.07,Santa Fe,arte,true,5000
";
        let mut repo = MockActivityRepository::new();
        repo.expect_exists_in_catalog()
            .returning(|title, _, _| Ok(title == "Ya existe"));
        repo.expect_insert()
            .times(1)
            .returning(|_| Ok(InsertOutcome::Inserted(stored(ActivityStatus::PendienteValidacion))));

        let result = service(repo)
            .import(SourceFormat::Csv, payload.to_string())
            .await
            .unwrap();

        assert_eq!(result.total_procesados, 4);
        assert_eq!(result.exitosos, 1);
        assert_eq!(result.duplicados, 1);
        assert_eq!(result.errores, 2);
        assert_eq!(result.errores_detalle[0].fila, 2);
        assert_eq!(result.errores_detalle[0].error, "Invalid coordinates format");
        assert_eq!(result.errores_detalle[1].fila, 4);
    }

    #[tokio::test]
    async fn unreadable_import_payload_fails_the_call() {
        let result = service(MockActivityRepository::new())
            .import(SourceFormat::Json, "{\"not\": \"an array\"}".to_string())
            .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
