use crate::core::charts::{chart_views, ChartId, ChartView};
use crate::core::debounce::Debouncer;
use crate::core::detail::{DetailCache, DetailPopup, DismissReason, PopupState, PopupView};
use crate::core::grouper::group_by_contract;
use crate::core::paginator::{paginate, PaginationState};
use crate::core::render::{
    footer_text, metric_cards, render_table, Breakpoint, ErrorBanner, ExpansionState, MetricCard,
    TableView,
};
use crate::core::sequence::RequestSequence;
use crate::core::sorter::sort_records;
use crate::domain::model::{
    AvailableMonth, ContractGroup, DashboardFilters, DashboardLoad, DashboardMetrics,
    DashboardPayload, DetailKey, Period, RepeatedServiceRecord,
};
use crate::domain::ports::{ConfigProvider, DashboardApi};
use crate::utils::error::{ErrorSeverity, Result};
use crate::utils::validation::validate_period;
use chrono::{Datelike, NaiveDate};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Everything the dashboard screen shows, held in one place.
#[derive(Debug, Default)]
pub struct DashboardState {
    pub period: Option<Period>,
    pub available_years: Vec<i32>,
    pub selected_year: Option<i32>,
    pub metrics: DashboardMetrics,
    pub charts: Vec<(ChartId, ChartView)>,
    pub filters: Option<DashboardFilters>,
    pub sorted: Vec<RepeatedServiceRecord>,
    pub groups: Vec<ContractGroup>,
    pub pagination: PaginationState,
    pub expansion: ExpansionState,
    pub breakpoint: Option<Breakpoint>,
    pub popup: DetailPopup,
    pub details: DetailCache,
    pub banner: Option<ErrorBanner>,
    pub loading: bool,
}

impl DashboardState {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            breakpoint: Some(Breakpoint::from_width(viewport_width)),
            charts: chart_views(&Default::default()),
            ..Default::default()
        }
    }

    /// 新資料到達：重新排序、分組，並收合所有群組
    pub fn apply_payload(&mut self, payload: DashboardPayload) {
        let DashboardPayload { data, filters } = payload;
        self.metrics = data.metrics;
        self.charts = chart_views(&data);
        self.sorted = sort_records(&data.repeated_services_list);
        self.groups = group_by_contract(&self.sorted);
        self.filters = filters;
        self.reset_presentation();
        tracing::info!(
            "Dashboard updated: {} repeated services in {} contracts",
            self.sorted.len(),
            self.groups.len()
        );
    }

    pub fn apply_empty(&mut self, reason: Option<&str>) {
        tracing::warn!(
            "Dashboard returned no data: {}",
            reason.unwrap_or("no reason given")
        );
        self.metrics = DashboardMetrics::default();
        self.charts = chart_views(&Default::default());
        self.sorted.clear();
        self.groups.clear();
        self.filters = None;
        self.reset_presentation();
    }

    fn reset_presentation(&mut self) {
        self.expansion.collapse_all();
        self.details.clear();
        self.popup.dismiss(DismissReason::CloseButton);
        self.pagination.clamp(self.groups.len());
    }

    pub fn show_error(&mut self, message: impl Into<String>) {
        self.banner = Some(ErrorBanner::new(message));
    }

    /// Current banner, dropping it once its timeout has passed.
    pub fn active_banner(&mut self, now: Instant) -> Option<&ErrorBanner> {
        if self
            .banner
            .as_ref()
            .is_some_and(|banner| banner.is_expired_at(now))
        {
            self.banner = None;
        }
        self.banner.as_ref()
    }

    pub fn breakpoint(&self) -> Breakpoint {
        self.breakpoint.unwrap_or(Breakpoint::Desktop)
    }

    pub fn set_viewport(&mut self, width: u32) {
        self.breakpoint = Some(Breakpoint::from_width(width));
    }

    pub fn toggle_group(&mut self, contract: &str) -> bool {
        self.expansion.toggle(contract)
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        self.pagination.go_to(page, self.groups.len())
    }

    pub fn next_page(&mut self) -> bool {
        self.pagination.next(self.groups.len())
    }

    pub fn previous_page(&mut self) -> bool {
        self.pagination.previous(self.groups.len())
    }

    pub fn table(&mut self) -> TableView {
        let breakpoint = self.breakpoint();
        let page = paginate(&self.groups, &mut self.pagination);
        render_table(&page, self.sorted.len(), &self.expansion, breakpoint)
    }

    pub fn view(&mut self) -> DashboardView {
        let error = self
            .active_banner(Instant::now())
            .map(|banner| banner.message.clone());
        DashboardView {
            period: self.period,
            metrics: metric_cards(&self.metrics),
            charts: self.charts.clone(),
            table: self.table(),
            footer: footer_text(self.filters.as_ref()),
            popup: self.popup.view(),
            error,
            loading: self.loading,
        }
    }
}

/// Render instructions for one dashboard frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    pub period: Option<Period>,
    pub metrics: [MetricCard; 4],
    pub charts: Vec<(ChartId, ChartView)>,
    pub table: TableView,
    pub footer: Option<String>,
    pub popup: Option<PopupView>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied(DashboardView),
    Empty(DashboardView),
    /// A newer request was issued while this one was in flight.
    Stale,
    Failed {
        message: String,
        severity: ErrorSeverity,
    },
}

/// 年份下拉選單：去重後由新到舊
pub fn available_years(months: &[AvailableMonth]) -> Vec<i32> {
    let mut years: Vec<i32> = months.iter().map(|m| m.year).collect();
    years.sort_unstable_by(|a, b| b.cmp(a));
    years.dedup();
    years
}

pub struct DashboardEngine<A: DashboardApi> {
    api: A,
    state: Mutex<DashboardState>,
    sequence: RequestSequence,
    debouncer: Debouncer,
}

impl<A: DashboardApi> DashboardEngine<A> {
    pub fn new(api: A, viewport_width: u32, resize_debounce: Duration) -> Self {
        Self {
            api,
            state: Mutex::new(DashboardState::new(viewport_width)),
            sequence: RequestSequence::new(),
            debouncer: Debouncer::new(resize_debounce),
        }
    }

    pub fn from_config<C: ConfigProvider>(api: A, config: &C) -> Self {
        Self::new(api, config.viewport_width(), config.resize_debounce())
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Populates the year selector and loads the month containing `today`.
    pub async fn initialize(&self, today: NaiveDate) -> LoadOutcome {
        let period = Period::new(today.month(), today.year());

        match self.api.available_months().await {
            Ok(months) => {
                let years = available_years(&months);
                tracing::debug!("Available years: {:?}", years);
                let mut state = self.state.lock().await;
                state.available_years = years;
                state.selected_year = Some(period.year);
            }
            Err(e) => {
                // 取得年份失敗時仍載入當月資料
                tracing::error!("Failed to load available months: {}", e);
            }
        }

        self.load(period).await
    }

    pub async fn load(&self, period: Period) -> LoadOutcome {
        if let Err(e) = validate_period(period.month, period.year) {
            let message = e.user_friendly_message();
            self.state.lock().await.show_error(message.clone());
            return LoadOutcome::Failed {
                message,
                severity: e.severity(),
            };
        }

        let token = self.sequence.issue();
        {
            let mut state = self.state.lock().await;
            state.loading = true;
        }
        tracing::info!(
            "Loading dashboard for {:02}/{} (request #{})",
            period.month,
            period.year,
            token
        );

        let result = self.api.dashboard_data(period).await;

        if !self.sequence.is_latest(token) {
            tracing::debug!("Discarding stale dashboard response #{}", token);
            return LoadOutcome::Stale;
        }

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok(DashboardLoad::Loaded(payload)) => {
                state.period = Some(period);
                state.selected_year = Some(period.year);
                state.apply_payload(payload);
                LoadOutcome::Applied(state.view())
            }
            Ok(DashboardLoad::Empty { reason }) => {
                state.period = Some(period);
                state.apply_empty(reason.as_deref());
                LoadOutcome::Empty(state.view())
            }
            Err(e) => {
                tracing::error!("Dashboard request failed: {}", e);
                let message = e.user_friendly_message();
                state.show_error(message.clone());
                LoadOutcome::Failed {
                    message,
                    severity: e.severity(),
                }
            }
        }
    }

    pub async fn view(&self) -> DashboardView {
        self.state.lock().await.view()
    }

    pub async fn table(&self) -> TableView {
        self.state.lock().await.table()
    }

    pub async fn sorted_records(&self) -> Vec<RepeatedServiceRecord> {
        self.state.lock().await.sorted.clone()
    }

    pub async fn toggle_group(&self, contract: &str) -> bool {
        self.state.lock().await.toggle_group(contract)
    }

    pub async fn go_to_page(&self, page: usize) -> bool {
        self.state.lock().await.go_to_page(page)
    }

    pub async fn next_page(&self) -> bool {
        self.state.lock().await.next_page()
    }

    pub async fn previous_page(&self) -> bool {
        self.state.lock().await.previous_page()
    }

    /// Opens the drill-down popup, reusing details fetched earlier in this load.
    pub async fn open_detail(&self, key: DetailKey) -> Option<PopupView> {
        {
            let mut state = self.state.lock().await;
            if let Some(details) = state.details.get(&key).cloned() {
                tracing::debug!("Using cached details for {:?}", key);
                state.popup.open_loaded(key, details);
                return state.popup.view();
            }
            state.popup.open(key.clone());
        }

        let result = self.api.service_details(&key).await;

        let mut state = self.state.lock().await;
        if state.popup.finish_load(&key, result) {
            if let PopupState::Loaded { details, .. } = state.popup.state() {
                let details = details.clone();
                state.details.store(key, details);
            }
        }
        state.popup.view()
    }

    /// Persists the rework flag for the most recent service in the open popup.
    ///
    /// A successful update always reaches the detail cache, even if the popup was
    /// dismissed meanwhile; the returned view is `None` in that case.
    pub async fn save_rework(&self, rework: bool) -> Result<Option<PopupView>> {
        let request = self.state.lock().await.popup.begin_save(rework)?;

        let result = self.api.update_rework(request.os_id, request.rework).await;

        let mut state = self.state.lock().await;
        match result {
            Ok(()) => {
                tracing::info!("Rework flag for OS {} set to {}", request.os_id, request.rework);
                if !state.details.apply_rework(&request) {
                    tracing::debug!("No cached details for {:?}", request.key);
                }
                state.popup.finish_save(&request, Ok(()));
            }
            Err(e) if state.popup.is_saving(&request) => {
                state.popup.finish_save(&request, Err(e));
            }
            Err(e) => {
                tracing::error!("Failed to update rework flag for OS {}: {}", request.os_id, e);
                return Err(e);
            }
        }
        Ok(state.popup.view())
    }

    pub async fn dismiss_detail(&self, reason: DismissReason) {
        self.state.lock().await.popup.dismiss(reason);
    }

    pub async fn popup_state(&self) -> PopupState {
        self.state.lock().await.popup.state().clone()
    }

    /// Debounced resize: only the last event of a burst re-lays out and re-fetches.
    pub async fn on_resize(&self, width: u32) -> Option<LoadOutcome> {
        if !self.debouncer.settle().await {
            return None;
        }

        let period = {
            let mut state = self.state.lock().await;
            state.set_viewport(width);
            state.period
        };
        tracing::debug!("Viewport settled at {}px", width);

        match period {
            Some(period) => Some(self.load(period).await),
            None => Some(LoadOutcome::Applied(self.view().await)),
        }
    }

    pub async fn with_state<R>(&self, f: impl FnOnce(&mut DashboardState) -> R) -> R {
        let mut state = self.state.lock().await;
        f(&mut state)
    }
}
