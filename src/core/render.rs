use crate::core::paginator::Page;
use crate::domain::model::{ContractGroup, DashboardFilters, DashboardMetrics, DetailKey, RepeatedServiceRecord};
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

pub const SMALL_MOBILE_MAX_WIDTH: u32 = 480;
pub const MOBILE_MAX_WIDTH: u32 = 768;
pub const ERROR_BANNER_TTL: Duration = Duration::from_secs(5);
pub const NOT_AVAILABLE: &str = "N/A";
pub const EMPTY_TABLE_MESSAGE: &str = "Nenhum serviço repetido encontrado para o período selecionado";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    SmallMobile,
    Mobile,
    Desktop,
}

impl Breakpoint {
    pub fn from_width(width: u32) -> Self {
        if width < SMALL_MOBILE_MAX_WIDTH {
            Breakpoint::SmallMobile
        } else if width < MOBILE_MAX_WIDTH {
            Breakpoint::Mobile
        } else {
            Breakpoint::Desktop
        }
    }

    fn limits(self) -> Option<TruncationLimits> {
        match self {
            Breakpoint::SmallMobile => Some(TruncationLimits {
                contract: 10,
                category: 12,
                experts: 15,
            }),
            Breakpoint::Mobile => Some(TruncationLimits {
                contract: 15,
                category: 20,
                experts: 25,
            }),
            Breakpoint::Desktop => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct TruncationLimits {
    contract: usize,
    category: usize,
    experts: usize,
}

/// ≤7 天 pending，≤15 天 in-progress，其餘 completed
pub fn badge_class(days_between: u32) -> &'static str {
    match days_between {
        0..=7 => "status-pending",
        8..=15 => "status-in-progress",
        _ => "status-completed",
    }
}

pub fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Cuts `text` to `max_chars` characters, ending with `...` when shortened.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", kept.trim_end())
}

fn or_not_available(text: &str) -> &str {
    if text.is_empty() {
        NOT_AVAILABLE
    } else {
        text
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    pub contract: String,
    pub category: String,
    pub experts: String,
    pub first_service_date: String,
    pub second_service_date: String,
    pub days_label: String,
    pub badge_class: &'static str,
    pub detail_key: Option<DetailKey>,
}

impl RecordRow {
    pub fn from_record(record: &RepeatedServiceRecord, breakpoint: Breakpoint) -> Self {
        let experts = if record.experts.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            record.experts.join(", ")
        };
        let mut contract = or_not_available(&record.contract).to_string();
        let mut category = or_not_available(&record.category).to_string();
        let mut experts_text = experts;

        if let Some(limits) = breakpoint.limits() {
            contract = truncate(&contract, limits.contract);
            category = truncate(&category, limits.category);
            experts_text = truncate(&experts_text, limits.experts);
        }

        Self {
            contract,
            category,
            experts: experts_text,
            first_service_date: format_date(record.first_service_date),
            second_service_date: format_date(record.second_service_date),
            days_label: format!("{} dias", record.days_between),
            badge_class: badge_class(record.days_between),
            detail_key: record.detail_key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    pub contract: String,
    pub count: usize,
    pub expanded: bool,
    pub children: Vec<RecordRow>,
}

impl GroupRow {
    pub fn indicator(&self) -> char {
        if self.expanded {
            '▼'
        } else {
            '▶'
        }
    }

    /// Children that are currently shown.
    pub fn visible_children(&self) -> &[RecordRow] {
        if self.expanded {
            &self.children
        } else {
            &[]
        }
    }
}

/// 展開中的合約，純顯示狀態
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: HashSet<String>,
}

impl ExpansionState {
    /// Flips a group and returns its new expanded flag.
    pub fn toggle(&mut self, contract: &str) -> bool {
        if self.expanded.remove(contract) {
            false
        } else {
            self.expanded.insert(contract.to_string());
            true
        }
    }

    pub fn is_expanded(&self, contract: &str) -> bool {
        self.expanded.contains(contract)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub rows: Vec<GroupRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_groups: usize,
    pub total_records: usize,
    pub empty_message: Option<&'static str>,
}

impl TableView {
    pub fn page_label(&self) -> String {
        format!("Página {} de {}", self.page, self.total_pages)
    }
}

pub fn render_table(
    page: &Page<'_, ContractGroup>,
    total_records: usize,
    expansion: &ExpansionState,
    breakpoint: Breakpoint,
) -> TableView {
    let rows = page
        .items
        .iter()
        .map(|group| GroupRow {
            contract: group.contract.clone(),
            count: group.len(),
            expanded: expansion.is_expanded(&group.contract),
            children: group
                .items
                .iter()
                .map(|record| RecordRow::from_record(record, breakpoint))
                .collect(),
        })
        .collect();

    TableView {
        rows,
        page: page.page,
        total_pages: page.total_pages,
        total_groups: page.total_items,
        total_records,
        empty_message: (page.total_items == 0).then_some(EMPTY_TABLE_MESSAGE),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricCard {
    pub label: &'static str,
    pub value: u64,
}

pub fn metric_cards(metrics: &DashboardMetrics) -> [MetricCard; 4] {
    [
        MetricCard {
            label: "Total de Serviços",
            value: metrics.total_services,
        },
        MetricCard {
            label: "Técnicos",
            value: metrics.total_experts,
        },
        MetricCard {
            label: "Serviços com Auxílio",
            value: metrics.services_with_assist,
        },
        MetricCard {
            label: "Serviços Repetidos",
            value: metrics.repeated_services,
        },
    ]
}

pub fn footer_text(filters: Option<&DashboardFilters>) -> Option<String> {
    let filters = filters?;
    let month_name = filters.month_name.as_deref()?;
    let year = filters
        .year
        .map(|y| y.to_string())
        .unwrap_or_default();
    Some(format!(
        "Dashboard atualizado - Dados referentes a {}/{}",
        month_name, year
    ))
}

/// 錯誤橫幅，固定時間後自動消失
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorBanner {
    pub message: String,
    shown_at: Instant,
    ttl: Duration,
}

impl ErrorBanner {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_ttl(message, ERROR_BANNER_TTL)
    }

    pub fn with_ttl(message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.ttl
    }
}

pub fn render_table_text(view: &TableView) -> String {
    let mut out = String::new();
    if let Some(message) = view.empty_message {
        let _ = writeln!(out, "{}", message);
        return out;
    }

    for row in &view.rows {
        let _ = writeln!(
            out,
            "{} {} ({} {})",
            row.indicator(),
            or_not_available(&row.contract),
            row.count,
            if row.count == 1 { "registro" } else { "registros" }
        );
        for child in row.visible_children() {
            let _ = writeln!(
                out,
                "    {} | {} | {} -> {} | {} [{}]",
                child.category,
                child.experts,
                child.first_service_date,
                child.second_service_date,
                child.days_label,
                child.badge_class
            );
        }
    }
    let _ = writeln!(
        out,
        "{} ({} contratos, {} serviços repetidos)",
        view.page_label(),
        view.total_groups,
        view.total_records
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::paginator::{paginate, PaginationState};

    #[test]
    fn test_badge_boundaries() {
        assert_eq!(badge_class(5), "status-pending");
        assert_eq!(badge_class(7), "status-pending");
        assert_eq!(badge_class(10), "status-in-progress");
        assert_eq!(badge_class(15), "status-in-progress");
        assert_eq!(badge_class(20), "status-completed");
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(NaiveDate::from_ymd_opt(2024, 3, 2)), "02/03/2024");
        assert_eq!(format_date(None), "N/A");
    }

    #[test]
    fn test_breakpoints() {
        assert_eq!(Breakpoint::from_width(375), Breakpoint::SmallMobile);
        assert_eq!(Breakpoint::from_width(480), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(767), Breakpoint::Mobile);
        assert_eq!(Breakpoint::from_width(768), Breakpoint::Desktop);
    }

    #[test]
    fn test_truncation_only_below_desktop() {
        let record = RepeatedServiceRecord {
            contract: "CONTRATO-0001-ABCDEF".to_string(),
            category: "Manutenção preventiva".to_string(),
            experts: vec!["Ana Souza".to_string(), "Bruno Lima".to_string()],
            days_between: 12,
            ..Default::default()
        };

        let desktop = RecordRow::from_record(&record, Breakpoint::Desktop);
        assert_eq!(desktop.contract, "CONTRATO-0001-ABCDEF");
        assert_eq!(desktop.experts, "Ana Souza, Bruno Lima");

        let small = RecordRow::from_record(&record, Breakpoint::SmallMobile);
        assert_eq!(small.contract, "CONTRAT...");
        assert!(small.contract.chars().count() <= 10);
        assert!(small.experts.ends_with("..."));
        assert_eq!(small.days_label, "12 dias");
        assert_eq!(small.badge_class, "status-in-progress");
    }

    #[test]
    fn test_truncate_keeps_short_text() {
        assert_eq!(truncate("Fibra", 12), "Fibra");
        assert_eq!(truncate("Instalação", 10), "Instalação");
    }

    #[test]
    fn test_toggle_expansion() {
        let mut expansion = ExpansionState::default();
        assert!(expansion.toggle("C-1"));
        assert!(expansion.is_expanded("C-1"));
        assert!(!expansion.toggle("C-1"));
        assert!(!expansion.is_expanded("C-1"));

        expansion.toggle("C-2");
        expansion.collapse_all();
        assert!(!expansion.is_expanded("C-2"));
    }

    #[test]
    fn test_render_table_marks_expanded_groups() {
        let groups = vec![
            ContractGroup {
                contract: "B".to_string(),
                items: vec![RepeatedServiceRecord {
                    contract: "B".to_string(),
                    days_between: 20,
                    ..Default::default()
                }],
            },
            ContractGroup {
                contract: "A".to_string(),
                items: vec![RepeatedServiceRecord {
                    contract: "A".to_string(),
                    days_between: 5,
                    ..Default::default()
                }],
            },
        ];
        let mut state = PaginationState::new();
        let page = paginate(&groups, &mut state);
        let mut expansion = ExpansionState::default();
        expansion.toggle("A");

        let view = render_table(&page, 2, &expansion, Breakpoint::Desktop);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].indicator(), '▶');
        assert!(view.rows[0].visible_children().is_empty());
        assert_eq!(view.rows[1].indicator(), '▼');
        assert_eq!(view.rows[1].visible_children().len(), 1);
        assert!(view.empty_message.is_none());

        let text = render_table_text(&view);
        assert!(text.contains("▼ A (1 registro)"));
        assert!(text.contains("5 dias [status-pending]"));
        assert!(text.contains("Página 1 de 1"));
    }

    #[test]
    fn test_render_empty_table() {
        let groups: Vec<ContractGroup> = Vec::new();
        let mut state = PaginationState::new();
        let page = paginate(&groups, &mut state);

        let view = render_table(&page, 0, &ExpansionState::default(), Breakpoint::Desktop);
        assert_eq!(view.empty_message, Some(EMPTY_TABLE_MESSAGE));
        assert_eq!(view.page_label(), "Página 0 de 0");
        assert_eq!(render_table_text(&view).trim(), EMPTY_TABLE_MESSAGE);
    }

    #[test]
    fn test_footer_requires_month_name() {
        let filters = DashboardFilters {
            month: Some(3),
            year: Some(2024),
            month_name: Some("Março".to_string()),
        };
        assert_eq!(
            footer_text(Some(&filters)).as_deref(),
            Some("Dashboard atualizado - Dados referentes a Março/2024")
        );
        assert_eq!(footer_text(Some(&DashboardFilters::default())), None);
        assert_eq!(footer_text(None), None);
    }

    #[test]
    fn test_error_banner_expires() {
        let banner = ErrorBanner::with_ttl("Erro de conexão com o servidor", Duration::from_secs(5));
        let now = Instant::now();
        assert!(!banner.is_expired_at(now));
        assert!(banner.is_expired_at(now + Duration::from_secs(6)));
    }
}
