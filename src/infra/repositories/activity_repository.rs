//! Activity catalog repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use super::entities::activity::{self, ActiveModel, Entity as ActivityEntity};
use crate::config::{STATUS_ACTIVE, VIEW_INCREMENT};
use crate::domain::{
    Activity, ActivitySearch, ActivityStatus, Category, Locality, NewActivity, PopularityInput,
    SortField, SortOrder,
};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Filters for the recommendation candidate scan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityFilter {
    pub category: Option<Category>,
    pub locality: Option<Locality>,
    pub exclude_ids: Vec<Uuid>,
}

/// Result of a catalog insert.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
    Inserted(Activity),
    /// The (title, start, address) triple is already in the catalog
    Duplicate,
}

/// Activity repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// Find an activity in any status
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>>;

    /// Active activities matching the filter, in insertion order
    async fn list_active(&self, filter: ActivityFilter) -> AppResult<Vec<Activity>>;

    /// One page of activities in a given status, oldest first, with the total
    async fn list_by_status(
        &self,
        status: ActivityStatus,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)>;

    /// One page of active activities matching the public search, with the total
    async fn search(
        &self,
        search: ActivitySearch,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)>;

    /// Whether the (title, start, address) triple is already stored
    async fn exists_in_catalog(
        &self,
        title: &str,
        start: DateTime<Utc>,
        address: &str,
    ) -> AppResult<bool>;

    /// Insert a validated record. A unique-index hit reports `Duplicate`.
    async fn insert(&self, record: NewActivity) -> AppResult<InsertOutcome>;

    /// Replace the editable fields of an activity in any status
    async fn update(&self, id: Uuid, record: NewActivity) -> AppResult<Activity>;

    /// Overwrite the lifecycle status
    async fn update_status(&self, id: Uuid, status: ActivityStatus) -> AppResult<Activity>;

    /// Add one view increment to an active activity. `false` if none matched.
    async fn increment_views(&self, id: Uuid) -> AppResult<bool>;

    /// Counters of every active activity
    async fn popularity_inputs(&self) -> AppResult<Vec<PopularityInput>>;

    /// Store one normalized popularity value
    async fn set_normalized_popularity(&self, id: Uuid, value: f64) -> AppResult<()>;
}

/// Concrete implementation of ActivityRepository
pub struct ActivityStore {
    db: DatabaseConnection,
}

impl ActivityStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(models: Vec<activity::Model>) -> AppResult<Vec<Activity>> {
    models.into_iter().map(Activity::try_from).collect()
}

fn sort_column(field: SortField) -> activity::Column {
    match field {
        SortField::FechaInicio => activity::Column::FechaInicio,
        SortField::Popularidad => activity::Column::PopularidadNormalizada,
        SortField::Precio => activity::Column::Precio,
        SortField::Titulo => activity::Column::Titulo,
        SortField::Tipo => activity::Column::Tipo,
        SortField::Localidad => activity::Column::Localidad,
    }
}

/// Text search over title, description and the joined tag array.
fn text_condition(text: &str) -> Condition {
    let pattern = format!("%{}%", text);
    Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(activity::Column::Titulo))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(activity::Column::Descripcion))).like(pattern.clone()))
        .add(Expr::cust_with_values(
            "array_to_string(etiquetas, ' ') ILIKE $1",
            [pattern],
        ))
}

fn any_tag_condition(tags: Vec<String>) -> Condition {
    tags.into_iter().fold(Condition::any(), |condition, tag| {
        condition.add(Expr::cust_with_values("$1 = ANY(etiquetas)", [tag]))
    })
}

#[async_trait]
impl ActivityRepository for ActivityStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>> {
        ActivityEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Activity::try_from)
            .transpose()
    }

    async fn list_active(&self, filter: ActivityFilter) -> AppResult<Vec<Activity>> {
        let mut query = ActivityEntity::find().filter(activity::Column::Estado.eq(STATUS_ACTIVE));

        if let Some(category) = filter.category {
            query = query.filter(activity::Column::Tipo.eq(category.as_str()));
        }
        if let Some(locality) = filter.locality {
            query = query.filter(activity::Column::Localidad.eq(locality.as_str()));
        }
        if !filter.exclude_ids.is_empty() {
            query = query.filter(activity::Column::Id.is_not_in(filter.exclude_ids));
        }

        let models = query
            .order_by_asc(activity::Column::CreatedAt)
            .order_by_asc(activity::Column::Id)
            .all(&self.db)
            .await?;
        to_domain(models)
    }

    async fn list_by_status(
        &self,
        status: ActivityStatus,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)> {
        let paginator = ActivityEntity::find()
            .filter(activity::Column::Estado.eq(status.as_str()))
            .order_by_asc(activity::Column::CreatedAt)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page_index()).await?;
        Ok((to_domain(models)?, total))
    }

    async fn search(
        &self,
        search: ActivitySearch,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)> {
        let mut query = ActivityEntity::find().filter(activity::Column::Estado.eq(STATUS_ACTIVE));

        if let Some(text) = search.text() {
            query = query.filter(text_condition(&text));
        }
        if let Some(category) = search.tipo {
            query = query.filter(activity::Column::Tipo.eq(category.as_str()));
        }
        if let Some(locality) = search.localidad {
            query = query.filter(activity::Column::Localidad.eq(locality.as_str()));
        }
        if let Some(from) = search.fecha_desde {
            query = query.filter(activity::Column::FechaInicio.gte(from));
        }
        if let Some(to) = search.fecha_hasta {
            query = query.filter(activity::Column::FechaInicio.lte(to));
        }
        if let Some(min) = search.precio_min {
            query = query.filter(activity::Column::Precio.gte(min));
        }
        if let Some(max) = search.precio_max {
            query = query.filter(activity::Column::Precio.lte(max));
        }
        if let Some(is_free) = search.es_gratis {
            query = query.filter(activity::Column::EsGratis.eq(is_free));
        }
        if let Some(level) = search.nivel_actividad {
            query = query.filter(activity::Column::NivelActividad.eq(level.as_str()));
        }
        let tags = search.tags();
        if !tags.is_empty() {
            query = query.filter(any_tag_condition(tags));
        }

        let order = match search.sort_order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        };
        let paginator = query
            .order_by(sort_column(search.sort_by), order)
            .order_by_asc(activity::Column::Id)
            .paginate(&self.db, page.limit());

        let total = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page_index()).await?;
        Ok((to_domain(models)?, total))
    }

    async fn exists_in_catalog(
        &self,
        title: &str,
        start: DateTime<Utc>,
        address: &str,
    ) -> AppResult<bool> {
        let found = ActivityEntity::find()
            .select_only()
            .column(activity::Column::Id)
            .filter(activity::Column::Titulo.eq(title))
            .filter(activity::Column::FechaInicio.eq(start))
            .filter(activity::Column::UbicacionDireccion.eq(address))
            .into_tuple::<Uuid>()
            .one(&self.db)
            .await?;
        Ok(found.is_some())
    }

    async fn insert(&self, record: NewActivity) -> AppResult<InsertOutcome> {
        let start = record
            .start
            .ok_or_else(|| AppError::validation("start: is required"))?;
        let now = Utc::now();

        let active_model = ActiveModel {
            id: Set(Uuid::new_v4()),
            titulo: Set(record.title),
            descripcion: Set(record.description),
            tipo: Set(record.category),
            fecha_inicio: Set(start),
            fecha_fin: Set(record.end),
            ubicacion_direccion: Set(record.address),
            ubicacion_lat: Set(record.latitude),
            ubicacion_lng: Set(record.longitude),
            localidad: Set(record.locality),
            precio: Set(record.price),
            es_gratis: Set(record.is_free),
            nivel_actividad: Set(record.level),
            etiquetas: Set(record.tags),
            contacto: Set(record.contact),
            enlace_externo: Set(record.external_link),
            imagen_url: Set(record.imagen_url),
            fuente: Set(record.source),
            estado: Set(record.status),
            popularidad_favoritos: Set(0),
            popularidad_vistas: Set(0.0),
            popularidad_normalizada: Set(0.0),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active_model.insert(&self.db).await.map_err(AppError::from) {
            Ok(model) => Ok(InsertOutcome::Inserted(Activity::try_from(model)?)),
            Err(e) if e.is_unique_violation() => Ok(InsertOutcome::Duplicate),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, id: Uuid, record: NewActivity) -> AppResult<Activity> {
        let start = record
            .start
            .ok_or_else(|| AppError::validation("start: is required"))?;
        let model = ActivityEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.titulo = Set(record.title);
        active.descripcion = Set(record.description);
        active.tipo = Set(record.category);
        active.fecha_inicio = Set(start);
        active.fecha_fin = Set(record.end);
        active.ubicacion_direccion = Set(record.address);
        active.ubicacion_lat = Set(record.latitude);
        active.ubicacion_lng = Set(record.longitude);
        active.localidad = Set(record.locality);
        active.precio = Set(record.price);
        active.es_gratis = Set(record.is_free);
        active.nivel_actividad = Set(record.level);
        active.etiquetas = Set(record.tags);
        active.contacto = Set(record.contact);
        active.enlace_externo = Set(record.external_link);
        active.imagen_url = Set(record.imagen_url);
        active.updated_at = Set(Utc::now());

        match active.update(&self.db).await.map_err(AppError::from) {
            Ok(model) => Activity::try_from(model),
            Err(e) if e.is_unique_violation() => Err(AppError::conflict(
                "Another activity already has this title, start and address",
            )),
            Err(e) => Err(e),
        }
    }

    async fn update_status(&self, id: Uuid, status: ActivityStatus) -> AppResult<Activity> {
        let model = ActivityEntity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        let mut active: ActiveModel = model.into();
        active.estado = Set(status.as_str().to_string());
        active.updated_at = Set(Utc::now());

        let model = active.update(&self.db).await?;
        Activity::try_from(model)
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        let result = ActivityEntity::update_many()
            .col_expr(
                activity::Column::PopularidadVistas,
                Expr::col(activity::Column::PopularidadVistas).add(VIEW_INCREMENT),
            )
            .filter(activity::Column::Id.eq(id))
            .filter(activity::Column::Estado.eq(STATUS_ACTIVE))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn popularity_inputs(&self) -> AppResult<Vec<PopularityInput>> {
        let rows = ActivityEntity::find()
            .select_only()
            .column(activity::Column::Id)
            .column(activity::Column::PopularidadFavoritos)
            .column(activity::Column::PopularidadVistas)
            .filter(activity::Column::Estado.eq(STATUS_ACTIVE))
            .order_by_asc(activity::Column::CreatedAt)
            .into_tuple::<(Uuid, i64, f64)>()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(activity_id, favorite_count, view_score)| PopularityInput {
                activity_id,
                favorite_count,
                view_score,
            })
            .collect())
    }

    async fn set_normalized_popularity(&self, id: Uuid, value: f64) -> AppResult<()> {
        ActivityEntity::update_many()
            .col_expr(activity::Column::PopularidadNormalizada, Expr::value(value))
            .filter(activity::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
