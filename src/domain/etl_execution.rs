//! ETL execution record and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::ETL_ERROR_MESSAGE_MAX_LEN;
use crate::errors::{AppError, AppResult};

/// Execution status. `Success`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EtlStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl EtlStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EtlStatus::Pending => "pending",
            EtlStatus::Running => "running",
            EtlStatus::Success => "success",
            EtlStatus::Failed => "failed",
            EtlStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EtlStatus::Success | EtlStatus::Failed | EtlStatus::Cancelled
        )
    }

    pub fn can_transition_to(&self, next: EtlStatus) -> bool {
        use EtlStatus::*;
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Failed)
                | (Pending, Cancelled)
                | (Running, Success)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

impl fmt::Display for EtlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EtlStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EtlStatus::Pending),
            "running" => Ok(EtlStatus::Running),
            "success" => Ok(EtlStatus::Success),
            "failed" => Ok(EtlStatus::Failed),
            "cancelled" => Ok(EtlStatus::Cancelled),
            other => Err(AppError::internal(format!("Unknown ETL status '{}'", other))),
        }
    }
}

/// One ETL batch run, from trigger to terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EtlExecution {
    pub id: Uuid,
    pub status: EtlStatus,
    pub source: String,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub records_extracted: i32,
    pub records_transformed: i32,
    pub records_loaded: i32,
    pub records_failed: i32,
    pub error_message: Option<String>,
    pub triggered_by: String,
    #[schema(value_type = Object)]
    pub config: Option<serde_json::Value>,
    /// Full run report: counters plus every per-record issue
    #[schema(value_type = Object)]
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl EtlExecution {
    /// A fresh execution in `pending`, as created at trigger time.
    pub fn new(
        source: impl Into<String>,
        triggered_by: impl Into<String>,
        config: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            status: EtlStatus::Pending,
            source: source.into(),
            started_at: None,
            finished_at: None,
            records_extracted: 0,
            records_transformed: 0,
            records_loaded: 0,
            records_failed: 0,
            error_message: None,
            triggered_by: triggered_by.into(),
            config,
            details: None,
            created_at: Utc::now(),
        }
    }

    fn transition(&mut self, next: EtlStatus) -> AppResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::invalid_state(format!(
                "ETL execution {} cannot move from {} to {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        if next == EtlStatus::Running {
            self.started_at = Some(Utc::now());
        }
        if next.is_terminal() {
            self.finished_at = Some(Utc::now());
        }
        Ok(())
    }

    /// pending -> running, stamping the start time.
    pub fn start(&mut self) -> AppResult<()> {
        self.transition(EtlStatus::Running)
    }

    /// running -> success. `error_summary` carries per-record failures, if any.
    pub fn succeed(&mut self, error_summary: Option<String>) -> AppResult<()> {
        self.transition(EtlStatus::Success)?;
        self.error_message = error_summary;
        Ok(())
    }

    /// Move to failed with a message truncated to the storable length.
    pub fn fail(&mut self, message: &str) -> AppResult<()> {
        self.transition(EtlStatus::Failed)?;
        self.error_message = Some(truncate_chars(message, ETL_ERROR_MESSAGE_MAX_LEN));
        Ok(())
    }

    pub fn cancel(&mut self) -> AppResult<()> {
        self.transition(EtlStatus::Cancelled)
    }
}

/// Truncate on a character boundary.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
