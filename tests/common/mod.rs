//! In-memory unit of work and helpers shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use triqueta_api::config::VIEW_INCREMENT;
use triqueta_api::domain::{
    Activity, ActivitySearch, ActivityStatus, Category, EtlExecution, Favorite, Locality,
    NewActivity, PopularityInput, SortField, SortOrder, UserProfile,
};
use triqueta_api::errors::{AppError, AppResult};
use triqueta_api::infra::{
    ActivityFilter, ActivityRepository, EtlExecutionRepository, FavoriteRepository,
    InsertOutcome, ProfileRepository, UnitOfWork,
};
use triqueta_api::jobs::{EtlDispatcher, EtlJob};
use triqueta_api::types::PaginationParams;

fn page_slice<T: Clone>(items: &[T], page: &PaginationParams) -> Vec<T> {
    items
        .iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect()
}

fn compare_by(field: SortField, a: &Activity, b: &Activity) -> CmpOrdering {
    match field {
        SortField::FechaInicio => a.start.cmp(&b.start),
        SortField::Popularidad => a
            .normalized_popularity
            .partial_cmp(&b.normalized_popularity)
            .unwrap_or(CmpOrdering::Equal),
        SortField::Precio => a.price.partial_cmp(&b.price).unwrap_or(CmpOrdering::Equal),
        SortField::Titulo => a.title.cmp(&b.title),
        SortField::Tipo => a.category.as_str().cmp(b.category.as_str()),
        SortField::Localidad => a.locality.as_str().cmp(b.locality.as_str()),
    }
}

#[derive(Default)]
pub struct MemoryActivities {
    pub rows: Mutex<Vec<Activity>>,
    /// Titles whose catalog lookup errors
    lookup_faults: Mutex<HashSet<String>>,
    /// Titles whose insert errors
    insert_faults: Mutex<HashSet<String>>,
}

impl MemoryActivities {
    pub fn fail_lookup_of(&self, title: &str) {
        self.lookup_faults.lock().unwrap().insert(title.to_string());
    }

    pub fn fail_insert_of(&self, title: &str) {
        self.insert_faults.lock().unwrap().insert(title.to_string());
    }

    pub fn get(&self, id: Uuid) -> Option<Activity> {
        self.rows.lock().unwrap().iter().find(|a| a.id == id).cloned()
    }

    pub fn all(&self) -> Vec<Activity> {
        self.rows.lock().unwrap().clone()
    }

    pub fn push(&self, activity: Activity) {
        self.rows.lock().unwrap().push(activity);
    }
}

#[async_trait]
impl ActivityRepository for MemoryActivities {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Activity>> {
        Ok(self.get(id))
    }

    async fn list_active(&self, filter: ActivityFilter) -> AppResult<Vec<Activity>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|a| a.is_active())
            .filter(|a| filter.category.map_or(true, |c| a.category == c))
            .filter(|a| filter.locality.map_or(true, |l| a.locality == l))
            .filter(|a| !filter.exclude_ids.contains(&a.id))
            .collect())
    }

    async fn list_by_status(
        &self,
        status: ActivityStatus,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)> {
        let matching: Vec<Activity> = self
            .all()
            .into_iter()
            .filter(|a| a.status == status)
            .collect();
        Ok((page_slice(&matching, &page), matching.len() as u64))
    }

    async fn search(
        &self,
        search: ActivitySearch,
        page: PaginationParams,
    ) -> AppResult<(Vec<Activity>, u64)> {
        let mut matching: Vec<Activity> =
            self.all().into_iter().filter(|a| search.matches(a)).collect();
        matching.sort_by(|a, b| {
            let primary = match search.sort_order {
                SortOrder::Asc => compare_by(search.sort_by, a, b),
                SortOrder::Desc => compare_by(search.sort_by, b, a),
            };
            primary.then(a.id.cmp(&b.id))
        });
        Ok((page_slice(&matching, &page), matching.len() as u64))
    }

    async fn exists_in_catalog(
        &self,
        title: &str,
        start: DateTime<Utc>,
        address: &str,
    ) -> AppResult<bool> {
        if self.lookup_faults.lock().unwrap().contains(title) {
            return Err(AppError::Internal("connection reset".into()));
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .any(|a| a.title == title && a.start == start && a.address == address))
    }

    async fn insert(&self, record: NewActivity) -> AppResult<InsertOutcome> {
        if self.insert_faults.lock().unwrap().contains(&record.title) {
            return Err(AppError::Internal("value too long for column".into()));
        }
        let start = record
            .start
            .ok_or_else(|| AppError::validation("start: is required"))?;
        let mut rows = self.rows.lock().unwrap();
        if rows
            .iter()
            .any(|a| a.title == record.title && a.start == start && a.address == record.address)
        {
            return Ok(InsertOutcome::Duplicate);
        }

        let now = Utc::now();
        let activity = Activity {
            id: Uuid::new_v4(),
            title: record.title,
            description: record.description,
            category: record.category.parse()?,
            start,
            end: record.end,
            address: record.address,
            latitude: record.latitude,
            longitude: record.longitude,
            locality: record.locality.parse()?,
            price: record.price,
            is_free: record.is_free,
            level: record.level.as_deref().map(str::parse).transpose()?,
            tags: record.tags,
            contact: record.contact,
            external_link: record.external_link,
            imagen_url: record.imagen_url,
            source: record.source,
            status: record.status.parse()?,
            favorite_count: 0,
            view_score: 0.0,
            normalized_popularity: 0.0,
            created_at: now,
            updated_at: now,
        };
        rows.push(activity.clone());
        Ok(InsertOutcome::Inserted(activity))
    }

    async fn update(&self, id: Uuid, record: NewActivity) -> AppResult<Activity> {
        let start = record
            .start
            .ok_or_else(|| AppError::validation("start: is required"))?;
        let mut rows = self.rows.lock().unwrap();
        if rows.iter().any(|a| {
            a.id != id && a.title == record.title && a.start == start && a.address == record.address
        }) {
            return Err(AppError::conflict(
                "Another activity already has this title, start and address",
            ));
        }
        let activity = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound)?;
        activity.title = record.title;
        activity.description = record.description;
        activity.category = record.category.parse()?;
        activity.start = start;
        activity.end = record.end;
        activity.address = record.address;
        activity.latitude = record.latitude;
        activity.longitude = record.longitude;
        activity.locality = record.locality.parse()?;
        activity.price = record.price;
        activity.is_free = record.is_free;
        activity.level = record.level.as_deref().map(str::parse).transpose()?;
        activity.tags = record.tags;
        activity.contact = record.contact;
        activity.external_link = record.external_link;
        activity.imagen_url = record.imagen_url;
        activity.updated_at = Utc::now();
        Ok(activity.clone())
    }

    async fn update_status(&self, id: Uuid, status: ActivityStatus) -> AppResult<Activity> {
        let mut rows = self.rows.lock().unwrap();
        let activity = rows
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppError::NotFound)?;
        activity.status = status;
        Ok(activity.clone())
    }

    async fn increment_views(&self, id: Uuid) -> AppResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|a| a.id == id && a.is_active()) {
            Some(activity) => {
                activity.view_score += VIEW_INCREMENT;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn popularity_inputs(&self) -> AppResult<Vec<PopularityInput>> {
        Ok(self
            .all()
            .into_iter()
            .filter(|a| a.is_active())
            .map(|a| PopularityInput {
                activity_id: a.id,
                favorite_count: a.favorite_count,
                view_score: a.view_score,
            })
            .collect())
    }

    async fn set_normalized_popularity(&self, id: Uuid, value: f64) -> AppResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(activity) = rows.iter_mut().find(|a| a.id == id) {
            activity.normalized_popularity = value;
        }
        Ok(())
    }
}

pub struct MemoryFavorites {
    pub rows: Mutex<Vec<Favorite>>,
    activities: Arc<MemoryActivities>,
}

impl MemoryFavorites {
    fn adjust_count(&self, activity_id: Uuid, delta: i64) {
        let mut rows = self.activities.rows.lock().unwrap();
        if let Some(activity) = rows.iter_mut().find(|a| a.id == activity_id) {
            activity.favorite_count = (activity.favorite_count + delta).max(0);
        }
    }
}

#[async_trait]
impl FavoriteRepository for MemoryFavorites {
    async fn add(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<Favorite> {
        let favorite = {
            let mut rows = self.rows.lock().unwrap();
            if rows
                .iter()
                .any(|f| f.user_id == user_id && f.activity_id == activity_id)
            {
                return Err(AppError::conflict("Activity already in favorites"));
            }
            let favorite = Favorite {
                id: Uuid::new_v4(),
                user_id,
                activity_id,
                saved_at: Utc::now(),
            };
            rows.push(favorite.clone());
            favorite
        };
        self.adjust_count(activity_id, 1);
        Ok(favorite)
    }

    async fn remove(&self, user_id: Uuid, activity_id: Uuid) -> AppResult<bool> {
        let removed = {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|f| !(f.user_id == user_id && f.activity_id == activity_id));
            rows.len() != before
        };
        if removed {
            self.adjust_count(activity_id, -1);
        }
        Ok(removed)
    }

    async fn activity_ids_for_user(&self, user_id: Uuid) -> AppResult<HashSet<Uuid>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .map(|f| f.activity_id)
            .collect())
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        page: PaginationParams,
    ) -> AppResult<(Vec<(Favorite, Activity)>, u64)> {
        let mut owned: Vec<(Favorite, Activity)> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.user_id == user_id)
            .filter_map(|f| self.activities.get(f.activity_id).map(|a| (f.clone(), a)))
            .collect();
        owned.reverse();
        Ok((page_slice(&owned, &page), owned.len() as u64))
    }
}

#[derive(Default)]
pub struct MemoryExecutions {
    pub rows: Mutex<Vec<EtlExecution>>,
    saves: AtomicUsize,
    /// 1-based `save` calls that error
    save_faults: Mutex<HashSet<usize>>,
}

impl MemoryExecutions {
    pub fn fail_saves(&self, calls: &[usize]) {
        self.save_faults.lock().unwrap().extend(calls.iter().copied());
    }

    pub fn get(&self, id: Uuid) -> Option<EtlExecution> {
        self.rows.lock().unwrap().iter().find(|e| e.id == id).cloned()
    }
}

#[async_trait]
impl EtlExecutionRepository for MemoryExecutions {
    async fn create(&self, execution: EtlExecution) -> AppResult<EtlExecution> {
        self.rows.lock().unwrap().push(execution.clone());
        Ok(execution)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<EtlExecution>> {
        Ok(self.get(id))
    }

    async fn save(&self, execution: EtlExecution) -> AppResult<EtlExecution> {
        let call = self.saves.fetch_add(1, Ordering::SeqCst) + 1;
        if self.save_faults.lock().unwrap().contains(&call) {
            return Err(AppError::Internal("disk full".into()));
        }
        let mut rows = self.rows.lock().unwrap();
        let slot = rows
            .iter_mut()
            .find(|e| e.id == execution.id)
            .ok_or(AppError::NotFound)?;
        *slot = execution.clone();
        Ok(execution)
    }

    async fn list_recent(&self, page: PaginationParams) -> AppResult<(Vec<EtlExecution>, u64)> {
        let mut rows = self.rows.lock().unwrap().clone();
        rows.reverse();
        Ok((page_slice(&rows, &page), rows.len() as u64))
    }
}

#[derive(Default)]
pub struct MemoryProfiles {
    pub rows: Mutex<Vec<UserProfile>>,
}

#[async_trait]
impl ProfileRepository for MemoryProfiles {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn upsert(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let mut rows = self.rows.lock().unwrap();
        rows.retain(|p| p.user_id != profile.user_id);
        rows.push(profile.clone());
        Ok(profile)
    }
}

pub struct MemoryUow {
    pub activities: Arc<MemoryActivities>,
    pub favorites: Arc<MemoryFavorites>,
    pub executions: Arc<MemoryExecutions>,
    pub profiles: Arc<MemoryProfiles>,
}

impl MemoryUow {
    pub fn new() -> Arc<Self> {
        let activities = Arc::new(MemoryActivities::default());
        Arc::new(Self {
            favorites: Arc::new(MemoryFavorites {
                rows: Mutex::new(Vec::new()),
                activities: activities.clone(),
            }),
            activities,
            executions: Arc::new(MemoryExecutions::default()),
            profiles: Arc::new(MemoryProfiles::default()),
        })
    }
}

impl UnitOfWork for MemoryUow {
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

/// Records dispatched jobs instead of queueing them.
#[derive(Default)]
pub struct RecordingDispatcher {
    pub jobs: Mutex<Vec<EtlJob>>,
    pub fail: bool,
}

impl RecordingDispatcher {
    pub fn failing() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn take(&self) -> Vec<EtlJob> {
        std::mem::take(&mut *self.jobs.lock().unwrap())
    }
}

#[async_trait]
impl EtlDispatcher for RecordingDispatcher {
    async fn dispatch(&self, job: EtlJob) -> AppResult<()> {
        if self.fail {
            return Err(AppError::Queue("queue offline".into()));
        }
        self.jobs.lock().unwrap().push(job);
        Ok(())
    }
}

/// An active activity with the given identity and counters.
pub fn active_activity(
    title: &str,
    category: Category,
    locality: Locality,
    tags: &[&str],
) -> Activity {
    let now = Utc::now();
    Activity {
        id: Uuid::new_v4(),
        title: title.to_string(),
        description: format!("{} en Bogotá para toda la familia", title),
        category,
        start: Utc.with_ymd_and_hms(2025, 12, 1, 10, 0, 0).unwrap(),
        end: None,
        address: format!("Carrera 7 # {}", title.len()),
        latitude: 4.6,
        longitude: -74.07,
        locality,
        price: 0.0,
        is_free: true,
        level: None,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        contact: None,
        external_link: None,
        imagen_url: None,
        source: "manual".to_string(),
        status: ActivityStatus::Activa,
        favorite_count: 0,
        view_score: 0.0,
        normalized_popularity: 0.0,
        created_at: now,
        updated_at: now,
    }
}
