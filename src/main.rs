use chrono::Datelike;
use clap::Parser;
use service_dashboard::adapters::export::CsvExporter;
use service_dashboard::core::charts::ChartView;
use service_dashboard::core::detail::{DismissReason, PopupView};
use service_dashboard::core::render::render_table_text;
use service_dashboard::domain::model::Period;
use service_dashboard::utils::error::{DashboardError, ErrorSeverity};
use service_dashboard::utils::{logger, validation::Validate};
use service_dashboard::{
    CliConfig, DashboardConfig, DashboardEngine, DashboardView, HttpDashboardApi, LoadOutcome,
    LocalStorage,
};
use std::path::Path;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliConfig::parse();

    // 初始化日誌
    if args.log_json {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting service-dashboard CLI");
    if args.verbose {
        tracing::debug!("CLI config: {:?}", args);
    }

    let config = match args.validate().and_then(|_| args.resolve()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&args, &config).await {
        tracing::error!(
            "❌ Dashboard failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = exit_code(e.severity());
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }

    Ok(())
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn run(args: &CliConfig, config: &DashboardConfig) -> service_dashboard::Result<()> {
    let api = HttpDashboardApi::from_config(config)?;
    let engine = DashboardEngine::from_config(api, config);
    let today = chrono::Local::now().date_naive();

    let outcome = match (args.month, args.year) {
        (None, None) => engine.initialize(today).await,
        (month, year) => {
            let period = Period::new(
                month.unwrap_or_else(|| today.month()),
                year.unwrap_or_else(|| today.year()),
            );
            engine.load(period).await
        }
    };

    match outcome {
        LoadOutcome::Applied(_) | LoadOutcome::Empty(_) => {}
        LoadOutcome::Stale => tracing::warn!("Dashboard response superseded"),
        LoadOutcome::Failed { message, severity } => {
            eprintln!("❌ {}", message);
            std::process::exit(exit_code(severity).max(1));
        }
    }

    if args.page > 1 && !engine.go_to_page(args.page).await {
        tracing::warn!("Page {} is out of range, showing page 1", args.page);
    }

    let table = engine.table().await;
    for row in &table.rows {
        if args.expand_all || args.expand.iter().any(|c| c == &row.contract) {
            engine.toggle_group(&row.contract).await;
        }
    }

    print_view(&engine.view().await);

    if let Some(path) = &args.export_csv {
        let path = Path::new(path);
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| DashboardError::ValidationError {
                message: format!("Invalid export path: {}", path.display()),
            })?;

        let exporter = CsvExporter::new(LocalStorage::new(directory));
        let count = exporter
            .export(filename, &engine.sorted_records().await)
            .await?;
        println!("📁 {} serviços repetidos exportados para {}", count, path.display());
    }

    if let Some(key) = args.detail_key()? {
        if let Some(popup) = engine.open_detail(key).await {
            print_popup(&popup);
        }

        if let Some(rework) = args.rework {
            if let Some(popup) = engine.save_rework(rework).await? {
                print_popup(&popup);
                if let Some(error) = popup.error {
                    return Err(DashboardError::ValidationError { message: error });
                }
            }
        }
        engine.dismiss_detail(DismissReason::CloseButton).await;
    }

    Ok(())
}

fn print_view(view: &DashboardView) {
    if let Some(error) = &view.error {
        println!("⚠️  {}", error);
    }

    for card in &view.metrics {
        println!("{:<22} {}", card.label, card.value);
    }
    println!();

    for (chart, chart_view) in &view.charts {
        match chart_view {
            ChartView::Series {
                labels,
                datasets,
                tooltips,
                ..
            } => {
                println!("📊 {}", chart.title());
                if !tooltips.is_empty() {
                    for tooltip in tooltips {
                        println!("    {}", tooltip);
                    }
                    continue;
                }
                for (index, label) in labels.iter().enumerate() {
                    let values: Vec<String> = datasets
                        .iter()
                        .filter_map(|dataset| dataset.data.get(index))
                        .map(|value| value.to_string())
                        .collect();
                    println!("    {:<24} {}", label, values.join(" / "));
                }
            }
            ChartView::NoData { message } => println!("📊 {}: {}", chart.title(), message),
        }
    }
    println!();

    print!("{}", render_table_text(&view.table));
    if let Some(footer) = &view.footer {
        println!("{}", footer);
    }
}

fn print_popup(popup: &PopupView) {
    println!();
    println!("🔎 {}", popup.title);
    if let Some(message) = &popup.message {
        println!("    {}", message);
    }
    for line in &popup.lines {
        println!(
            "    OS {} | {} | {} | {} | retrabalho: {}{}",
            line.id,
            line.completed_at,
            line.description,
            line.resolution,
            if line.rework { "sim" } else { "não" },
            if line.editable { " (editável)" } else { "" }
        );
    }
    if let Some(error) = &popup.error {
        println!("    ❌ {}", error);
    }
}
