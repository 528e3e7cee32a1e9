use crate::domain::model::{ChartDataset, ChartSeries, DashboardData, MultiSeriesChart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartId {
    ServicesByExpert,
    ServicesByCategory,
    ServicesWithAssist,
    AssistanceNetwork,
}

impl ChartId {
    pub const ALL: [ChartId; 4] = [
        ChartId::ServicesByExpert,
        ChartId::ServicesByCategory,
        ChartId::ServicesWithAssist,
        ChartId::AssistanceNetwork,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartId::ServicesByExpert => "Serviços por Técnico",
            ChartId::ServicesByCategory => "Serviços por Categoria",
            ChartId::ServicesWithAssist => "Serviços com Auxílio",
            ChartId::AssistanceNetwork => "Rede de Assistência",
        }
    }

    pub fn no_data_message(self) -> &'static str {
        match self {
            ChartId::ServicesByExpert => "Nenhum dado disponível para serviços por técnico",
            ChartId::ServicesByCategory => "Nenhum dado disponível para serviços por categoria",
            ChartId::ServicesWithAssist => "Nenhum dado disponível para serviços com auxílio",
            ChartId::AssistanceNetwork => "Nenhum dado disponível para rede de assistência",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Doughnut,
    Pie,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartView {
    Series {
        kind: ChartKind,
        labels: Vec<String>,
        datasets: Vec<ChartDataset>,
        /// 圓餅圖每一片的提示文字，其他圖表為空
        tooltips: Vec<String>,
    },
    NoData {
        message: &'static str,
    },
}

impl ChartView {
    pub fn is_empty(&self) -> bool {
        matches!(self, ChartView::NoData { .. })
    }
}

/// 每張圖表各自決定要畫圖還是顯示「無資料」
pub fn chart_views(data: &DashboardData) -> Vec<(ChartId, ChartView)> {
    ChartId::ALL
        .iter()
        .map(|&id| {
            let view = match id {
                ChartId::ServicesByExpert => single_series(
                    id,
                    ChartKind::Bar,
                    data.services_by_expert.as_ref(),
                    "Serviços Realizados",
                ),
                ChartId::ServicesByCategory => single_series(
                    id,
                    ChartKind::Doughnut,
                    data.services_by_category.as_ref(),
                    "",
                ),
                ChartId::ServicesWithAssist => single_series(
                    id,
                    ChartKind::Pie,
                    data.services_with_assist_chart.as_ref(),
                    "",
                ),
                ChartId::AssistanceNetwork => {
                    multi_series(id, data.assistance_network.as_ref())
                }
            };
            (id, view)
        })
        .collect()
}

fn single_series(
    id: ChartId,
    kind: ChartKind,
    series: Option<&ChartSeries>,
    label: &str,
) -> ChartView {
    match series {
        Some(series) if !series.labels.is_empty() => ChartView::Series {
            kind,
            labels: series.labels.clone(),
            datasets: vec![ChartDataset {
                label: label.to_string(),
                data: series.data.clone(),
                background_color: None,
            }],
            tooltips: if kind == ChartKind::Pie {
                pie_tooltips(series)
            } else {
                Vec::new()
            },
        },
        _ => {
            tracing::debug!("No data for chart {:?}", id);
            ChartView::NoData {
                message: id.no_data_message(),
            }
        }
    }
}

fn multi_series(id: ChartId, chart: Option<&MultiSeriesChart>) -> ChartView {
    match chart {
        Some(chart) if !chart.labels.is_empty() => ChartView::Series {
            kind: ChartKind::Bar,
            labels: chart.labels.clone(),
            datasets: chart.datasets.clone(),
            tooltips: Vec::new(),
        },
        _ => {
            tracing::debug!("No data for chart {:?}", id);
            ChartView::NoData {
                message: id.no_data_message(),
            }
        }
    }
}

/// Tooltip text for a pie slice: `"<label>: <value> (<pct>%)"`.
pub fn pie_tooltip(label: &str, value: f64, values: &[f64]) -> String {
    let total: f64 = values.iter().sum();
    let percentage = if total > 0.0 {
        (value / total * 100.0).round()
    } else {
        0.0
    };
    format!("{}: {} ({}%)", label, value, percentage)
}

fn pie_tooltips(series: &ChartSeries) -> Vec<String> {
    series
        .labels
        .iter()
        .zip(&series.data)
        .map(|(label, &value)| pie_tooltip(label, value, &series.data))
        .collect()
}
