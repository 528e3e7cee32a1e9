use crate::domain::model::{DetailKey, ServiceDetail};
use crate::utils::error::{DashboardError, Result};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const LOADING_MESSAGE: &str = "Carregando detalhes...";
pub const NO_DETAILS_MESSAGE: &str = "Nenhum detalhe encontrado para este serviço";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    CloseButton,
    Backdrop,
    Escape,
}

/// Drill-down popup lifecycle.
///
/// `Idle → Loading → {Loaded | Error}`, `Loaded → Saving → {Saved | SaveError}`,
/// and every state returns to `Idle` on dismissal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PopupState {
    #[default]
    Idle,
    Loading {
        key: DetailKey,
    },
    Loaded {
        key: DetailKey,
        details: Vec<ServiceDetail>,
    },
    Error {
        key: DetailKey,
        message: String,
    },
    Saving {
        key: DetailKey,
        details: Vec<ServiceDetail>,
        os_id: i64,
        rework: bool,
    },
    Saved {
        key: DetailKey,
        details: Vec<ServiceDetail>,
    },
    SaveError {
        key: DetailKey,
        details: Vec<ServiceDetail>,
        message: String,
    },
}

impl PopupState {
    pub fn name(&self) -> &'static str {
        match self {
            PopupState::Idle => "idle",
            PopupState::Loading { .. } => "loading",
            PopupState::Loaded { .. } => "loaded",
            PopupState::Error { .. } => "error",
            PopupState::Saving { .. } => "saving",
            PopupState::Saved { .. } => "saved",
            PopupState::SaveError { .. } => "save-error",
        }
    }

    pub fn key(&self) -> Option<&DetailKey> {
        match self {
            PopupState::Idle => None,
            PopupState::Loading { key }
            | PopupState::Loaded { key, .. }
            | PopupState::Error { key, .. }
            | PopupState::Saving { key, .. }
            | PopupState::Saved { key, .. }
            | PopupState::SaveError { key, .. } => Some(key),
        }
    }
}

/// Pending rework update produced by [`DetailPopup::begin_save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRequest {
    pub key: DetailKey,
    pub os_id: i64,
    pub rework: bool,
}

fn set_rework(details: &mut [ServiceDetail], os_id: i64, rework: bool) -> bool {
    match details.iter_mut().find(|d| d.id == os_id) {
        Some(detail) => {
            detail.rework = rework;
            true
        }
        None => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct DetailPopup {
    state: PopupState,
}

impl DetailPopup {
    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != PopupState::Idle
    }

    /// 開啟新的彈窗前會先移除既有的
    pub fn open(&mut self, key: DetailKey) {
        if self.is_open() {
            tracing::debug!("Replacing open popup ({})", self.state.name());
        }
        self.state = PopupState::Loading { key };
    }

    /// Opens directly into `Loaded` with details that are already known.
    pub fn open_loaded(&mut self, key: DetailKey, details: Vec<ServiceDetail>) {
        self.state = PopupState::Loaded {
            key,
            details: sort_details(details),
        };
    }

    /// Applies a detail fetch result. Results for a key that is no longer loading are dropped.
    pub fn finish_load(&mut self, key: &DetailKey, result: Result<Vec<ServiceDetail>>) -> bool {
        match &self.state {
            PopupState::Loading { key: pending } if pending == key => {}
            _ => {
                tracing::debug!("Dropping detail response for {:?}", key);
                return false;
            }
        }

        self.state = match result {
            Ok(details) => PopupState::Loaded {
                key: key.clone(),
                details: sort_details(details),
            },
            Err(e) => {
                tracing::error!("Failed to load service details: {}", e);
                PopupState::Error {
                    key: key.clone(),
                    message: e.user_friendly_message(),
                }
            }
        };
        true
    }

    pub fn begin_save(&mut self, rework: bool) -> Result<SaveRequest> {
        let (key, details) = match std::mem::take(&mut self.state) {
            PopupState::Loaded { key, details } => (key, details),
            other => {
                let state = other.name();
                self.state = other;
                return Err(DashboardError::InvalidTransition {
                    state,
                    action: "save rework flag",
                });
            }
        };

        let Some(os_id) = details.first().map(|d| d.id) else {
            self.state = PopupState::Loaded { key, details };
            return Err(DashboardError::InvalidTransition {
                state: "loaded",
                action: "save rework flag without details",
            });
        };

        let request = SaveRequest {
            key: key.clone(),
            os_id,
            rework,
        };
        self.state = PopupState::Saving {
            key,
            details,
            os_id,
            rework,
        };
        Ok(request)
    }

    /// Whether the popup is still waiting on `request`.
    pub fn is_saving(&self, request: &SaveRequest) -> bool {
        matches!(&self.state, PopupState::Saving { key, os_id, .. }
            if key == &request.key && *os_id == request.os_id)
    }

    /// Applies the update result to the popup if it still shows the saved key.
    ///
    /// Returns `false` when the popup was dismissed or moved to another key
    /// while the request was in flight.
    pub fn finish_save(&mut self, request: &SaveRequest, result: Result<()>) -> bool {
        if !self.is_saving(request) {
            if result.is_ok() {
                if let PopupState::Loaded { key, details }
                | PopupState::Saved { key, details }
                | PopupState::SaveError { key, details, .. } = &mut self.state
                {
                    if *key == request.key {
                        return set_rework(details, request.os_id, request.rework);
                    }
                }
            }
            tracing::debug!("Popup left {:?} before the rework update finished", request.key);
            return false;
        }

        let (key, mut details) = match std::mem::take(&mut self.state) {
            PopupState::Saving { key, details, .. } => (key, details),
            other => {
                self.state = other;
                return false;
            }
        };

        self.state = match result {
            Ok(()) => {
                set_rework(&mut details, request.os_id, request.rework);
                PopupState::Saved { key, details }
            }
            Err(e) => {
                tracing::error!(
                    "Failed to update rework flag for OS {}: {}",
                    request.os_id,
                    e
                );
                PopupState::SaveError {
                    key,
                    details,
                    message: e.user_friendly_message(),
                }
            }
        };
        true
    }

    pub fn dismiss(&mut self, reason: DismissReason) {
        if self.is_open() {
            tracing::debug!("Popup dismissed via {:?} from {}", reason, self.state.name());
        }
        self.state = PopupState::Idle;
    }

    pub fn view(&self) -> Option<PopupView> {
        let view = match &self.state {
            PopupState::Idle => return None,
            PopupState::Loading { key } => PopupView::message(key, LOADING_MESSAGE, false),
            PopupState::Error { key, message } => PopupView::message(key, message, true),
            PopupState::Loaded { key, details } | PopupState::Saved { key, details } => {
                PopupView::details(key, details, None)
            }
            PopupState::Saving { key, details, .. } => {
                PopupView::details(key, details, Some("Salvando..."))
            }
            PopupState::SaveError {
                key,
                details,
                message,
            } => {
                let mut view = PopupView::details(key, details, None);
                view.error = Some(message.clone());
                view
            }
        };
        Some(view)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailLine {
    pub id: i64,
    pub description: String,
    pub resolution: String,
    pub completed_at: String,
    pub rework: bool,
    pub editable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupView {
    pub title: String,
    pub lines: Vec<DetailLine>,
    pub message: Option<String>,
    pub error: Option<String>,
}

impl PopupView {
    fn title(key: &DetailKey) -> String {
        format!(
            "Contrato {} - OS {} / {}",
            key.contract, key.first_service_id, key.second_service_id
        )
    }

    fn message(key: &DetailKey, message: &str, is_error: bool) -> Self {
        Self {
            title: Self::title(key),
            lines: Vec::new(),
            message: (!is_error).then(|| message.to_string()),
            error: is_error.then(|| message.to_string()),
        }
    }

    fn details(key: &DetailKey, details: &[ServiceDetail], message: Option<&str>) -> Self {
        let lines: Vec<DetailLine> = details
            .iter()
            .enumerate()
            .map(|(position, detail)| DetailLine {
                id: detail.id,
                description: detail.description.clone().unwrap_or_else(|| "N/A".to_string()),
                resolution: detail.resolution.clone().unwrap_or_else(|| "N/A".to_string()),
                completed_at: detail
                    .completed_at
                    .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
                    .unwrap_or_else(|| "N/A".to_string()),
                rework: detail.rework,
                editable: position == 0,
            })
            .collect();
        let message = if lines.is_empty() {
            Some(NO_DETAILS_MESSAGE.to_string())
        } else {
            message.map(str::to_string)
        };

        Self {
            title: Self::title(key),
            lines,
            message,
            error: None,
        }
    }
}

/// 依完成時間由新到舊；沒有時間的排在後面，再依 id 由大到小
pub fn sort_details(mut details: Vec<ServiceDetail>) -> Vec<ServiceDetail> {
    details.sort_by(|a, b| match (a.completed_at, b.completed_at) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| b.id.cmp(&a.id)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => b.id.cmp(&a.id),
    });
    details
}

/// Details already fetched during the current dashboard load.
#[derive(Debug, Clone, Default)]
pub struct DetailCache {
    entries: HashMap<DetailKey, Vec<ServiceDetail>>,
}

impl DetailCache {
    pub fn get(&self, key: &DetailKey) -> Option<&Vec<ServiceDetail>> {
        self.entries.get(key)
    }

    pub fn store(&mut self, key: DetailKey, details: Vec<ServiceDetail>) {
        self.entries.insert(key, details);
    }

    /// Patches a persisted rework flag into the cached details of `request.key`.
    pub fn apply_rework(&mut self, request: &SaveRequest) -> bool {
        self.entries
            .get_mut(&request.key)
            .is_some_and(|details| set_rework(details, request.os_id, request.rework))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
