//! End-to-end ETL batches over the in-memory unit of work.

mod common;

use std::sync::Arc;

use common::{MemoryUow, RecordingDispatcher};
use triqueta_api::domain::{ActivityStatus, Category, EtlStatus, Locality};
use triqueta_api::etl::{IssueKind, SourceFormat};
use triqueta_api::services::{EtlManager, EtlService, EtlUpload};
use uuid::Uuid;

const HEADER: &str =
    "titulo,descripcion,tipo,fecha_inicio,ubicacion_direccion,ubicacion_lat,ubicacion_lng,localidad,precio,es_gratis,etiquetas";

fn csv(rows: &[&str]) -> String {
    let mut out = String::from(HEADER);
    for row in rows {
        out.push('\n');
        out.push_str(row);
    }
    out
}

fn manager(uow: &Arc<MemoryUow>, dispatcher: Arc<RecordingDispatcher>) -> EtlManager<MemoryUow> {
    EtlManager::new(uow.clone(), dispatcher)
}

#[tokio::test]
async fn messy_rows_are_mapped_and_loaded_for_moderation() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let payload = csv(&[
        "Cine,Proyección de cine colombiano al aire libre,cultural,01/12/2025,Calle 45 # 13-20,bad,,Chapi,abc,true,",
    ]);
    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, payload, "cli".into())
        .await
        .unwrap();

    assert_eq!(execution.status, EtlStatus::Success);
    assert_eq!(report.loaded, 1);
    assert!(execution.error_message.is_none());

    let stored = uow.activities.all();
    assert_eq!(stored.len(), 1);
    let cine = &stored[0];
    assert_eq!(cine.category, Category::Cultura);
    assert_eq!(cine.locality, Locality::Chapinero);
    assert_eq!(cine.latitude, 4.6097);
    assert_eq!(cine.longitude, -74.0817);
    assert_eq!(cine.price, 0.0);
    assert_eq!(cine.tags, vec!["cultura".to_string()]);
    assert_eq!(cine.status, ActivityStatus::PendienteValidacion);
}

#[tokio::test]
async fn batch_duplicates_are_not_counted_as_invalid() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let row = "Maratón,Carrera atlética por la séptima,deporte,2025-12-07,Carrera 7 # 32-16,4.61,-74.07,Santa Fe,0,true,correr";
    let payload = csv(&[
        row,
        row,
        "Taller,corta,recreacion,2025-12-08,Calle 10 # 3-50,4.59,-74.07,La Candelaria,0,true,arte",
    ]);
    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, payload, "cli".into())
        .await
        .unwrap();

    assert_eq!(report.extracted, 3);
    assert_eq!(report.valid, 1);
    assert_eq!(report.invalid, 1);
    assert_eq!(report.batch_duplicates, 1);
    assert_eq!(report.loaded, 1);
    assert_eq!(execution.records_failed, 1);
    assert_eq!(execution.status, EtlStatus::Success);

    let message = execution.error_message.unwrap();
    assert!(message.starts_with("1 errors occurred. First: Record 3 ('Taller')"));

    let details = execution.details.unwrap();
    assert_eq!(details["batch_duplicates"], 1);
}

#[tokio::test]
async fn batch_without_valid_records_fails() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let payload = csv(&["X,corta,cultura,2025-12-01,Calle,4.6,-74.0,Chapinero,0,true,a"]);
    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, payload, "cli".into())
        .await
        .unwrap();

    assert_eq!(report.invalid, 1);
    assert_eq!(execution.status, EtlStatus::Failed);
    assert_eq!(
        execution.error_message.as_deref(),
        Some("No valid records after validation")
    );
    assert!(uow.activities.all().is_empty());
}

#[tokio::test]
async fn header_only_csv_fails_with_nothing_extracted() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let (execution, _) = service
        .run_inline("csv".into(), SourceFormat::Csv, csv(&[]), "cli".into())
        .await
        .unwrap();

    assert_eq!(execution.status, EtlStatus::Failed);
    assert_eq!(
        execution.error_message.as_deref(),
        Some("No records extracted from CSV")
    );
}

#[tokio::test]
async fn second_batch_reports_catalog_duplicates() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));
    let payload = csv(&[
        "Festival,Festival de música en el parque,cultura,2025-12-14,Parque Simón Bolívar,4.65,-74.09,Chapinero,0,true,musica",
    ]);

    service
        .run_inline("csv".into(), SourceFormat::Csv, payload.clone(), "cli".into())
        .await
        .unwrap();
    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, payload, "cli".into())
        .await
        .unwrap();

    assert_eq!(report.loaded, 0);
    assert_eq!(report.catalog_duplicates, 1);
    assert_eq!(report.issues[0].kind, IssueKind::CatalogDuplicate);
    assert_eq!(execution.status, EtlStatus::Success);
    assert!(execution.error_message.is_none());
    assert_eq!(uow.activities.all().len(), 1);
}

#[tokio::test]
async fn queued_upload_runs_once_and_cancelled_jobs_are_skipped() {
    let uow = MemoryUow::new();
    let dispatcher = Arc::new(RecordingDispatcher::default());
    let service = manager(&uow, dispatcher.clone());
    let admin = Uuid::new_v4();

    let upload = |name: &str| EtlUpload {
        admin_id: admin,
        format: SourceFormat::Json,
        filename: Some(name.to_string()),
        source: "idartes".into(),
        payload: r#"[{"nombre":"Teatro","descripcion":"Obra de teatro para niños","tipo":"teatro","fecha_inicio":"2025-12-20","direccion":"Calle 26 # 5-30","lat":4.61,"lng":-74.07,"localidad":"Santa Fe","etiquetas":"teatro, niños"}]"#.into(),
    };

    let first = service.trigger(upload("a.json")).await.unwrap();
    let second = service.trigger(upload("b.json")).await.unwrap();
    assert_eq!(first.triggered_by, format!("admin:{}", admin));
    assert_eq!(first.config.as_ref().unwrap()["filename"], "a.json");

    service.cancel(second.id).await.unwrap();

    for job in dispatcher.take() {
        service.run(job).await.unwrap();
    }

    assert_eq!(uow.executions.get(first.id).unwrap().status, EtlStatus::Success);
    assert_eq!(uow.executions.get(second.id).unwrap().status, EtlStatus::Cancelled);

    let stored = uow.activities.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source, "idartes");
    assert_eq!(stored[0].tags, vec!["teatro".to_string(), "niños".to_string()]);
}

#[tokio::test]
async fn failed_enqueue_leaves_a_failed_execution() {
    let uow = MemoryUow::new();
    let service = manager(&uow, Arc::new(RecordingDispatcher::failing()));

    let result = service
        .trigger(EtlUpload {
            admin_id: Uuid::new_v4(),
            format: SourceFormat::Csv,
            filename: None,
            source: "csv".into(),
            payload: csv(&["a,b,c,d,e,f,g,h,i,j,k"]),
        })
        .await;

    assert!(result.is_err());
    let executions = uow.executions.rows.lock().unwrap();
    assert_eq!(executions.len(), 1);
    assert_eq!(executions[0].status, EtlStatus::Failed);
}

fn two_concerts() -> String {
    csv(&[
        "Roto evento,Concierto de cámara en el teatro,cultura,2025-12-10,Calle 71 # 10-20,4.65,-74.06,Chapinero,0,true,musica",
        "Concierto sinfónico,Orquesta filarmónica en el parque,cultura,2025-12-11,Parque Nacional,4.62,-74.06,Santa Fe,0,true,musica",
    ])
}

#[tokio::test]
async fn catalog_lookup_error_only_loses_that_record() {
    let uow = MemoryUow::new();
    uow.activities.fail_lookup_of("Roto evento");
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, two_concerts(), "cli".into())
        .await
        .unwrap();

    assert_eq!(execution.status, EtlStatus::Success);
    assert_eq!(report.loaded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.issues[0].kind, IssueKind::LoadFailed);
    assert_eq!(execution.records_loaded, 1);
    assert_eq!(execution.records_failed, 1);

    let stored = uow.activities.all();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Concierto sinfónico");
}

#[tokio::test]
async fn insert_error_is_isolated_and_summarized() {
    let uow = MemoryUow::new();
    uow.activities.fail_insert_of("Roto evento");
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let (execution, report) = service
        .run_inline("csv".into(), SourceFormat::Csv, two_concerts(), "cli".into())
        .await
        .unwrap();

    assert_eq!(execution.status, EtlStatus::Success);
    assert_eq!(report.loaded, 1);
    assert_eq!(execution.records_failed, 1);
    let message = execution.error_message.unwrap();
    assert!(
        message.starts_with("1 errors occurred. First: Failed to load 'Roto evento'"),
        "unexpected summary: {}",
        message
    );
    assert!(message.contains("value too long for column"));
    assert_eq!(execution.details.unwrap()["failed"], 1);
}

#[tokio::test]
async fn unsaveable_progress_still_leaves_a_failed_execution() {
    let uow = MemoryUow::new();
    // Saves: 1 start, 2 extraction, 3 transformation, 4 in-memory failure mark.
    uow.executions.fail_saves(&[3, 4]);
    let service = manager(&uow, Arc::new(RecordingDispatcher::default()));

    let result = service
        .run_inline("csv".into(), SourceFormat::Csv, two_concerts(), "cli".into())
        .await;
    assert!(result.is_err());

    let executions = uow.executions.rows.lock().unwrap();
    assert_eq!(executions.len(), 1);
    let stored = &executions[0];
    assert_eq!(stored.status, EtlStatus::Failed);
    assert!(stored.finished_at.is_some());
    assert!(stored.error_message.as_deref().unwrap().contains("disk full"));
    // Written from the re-read row, which never saw the transformation counters.
    assert_eq!(stored.records_extracted, 2);
    assert_eq!(stored.records_transformed, 0);
    assert!(uow.activities.all().is_empty());
}
