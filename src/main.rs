use clap::Parser;
use prospectx_reports::config::cli::{Command, GenerateArgs, LogFormat};
use prospectx_reports::core::ReportService;
use prospectx_reports::domain::model::SubjectKind;
use prospectx_reports::utils::error::ErrorSeverity;
use prospectx_reports::utils::{logger, validation::Validate};
use prospectx_reports::{
    CliConfig, GenerationState, HttpReportService, PollOptions, ReportGenerator, ReportView,
    ReportsConfig, Result,
};
use std::io::Read;

const EXIT_JOB_FAILED: i32 = 4;
const EXIT_UPGRADE_REQUIRED: i32 = 5;
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    match cli.log_format {
        LogFormat::Json => logger::init_json_logger(),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
    }

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            }
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: CliConfig) -> Result<i32> {
    let config = cli.resolve_config()?;
    config.validate()?;

    match &cli.command {
        Command::Parse { input, json } => {
            let text = match input {
                Some(path) => std::fs::read_to_string(path)?,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let view = ReportView::from_text(&text, &config.section_parser(), &config.section_labels());
            print_view(&view, *json)?;
            Ok(0)
        }
        Command::Generate(args) => generate(&config, args).await,
        Command::Status { report_id } => {
            let service = HttpReportService::from_config(&config)?;
            let status = service.status(report_id).await?;
            println!("{}: {:?}", report_id, status.status);
            if let Some(message) = status.error_message {
                println!("{}", message);
            }
            Ok(0)
        }
        Command::Show { report_id, json } => {
            let service = HttpReportService::from_config(&config)?;
            let report = service.fetch_report(report_id).await?;
            let view = ReportView::from_report(&report, &config.section_parser(), &config.section_labels());
            print_view(&view, *json)?;
            Ok(0)
        }
        Command::ReportTypes => {
            let catalog = config.report_type_catalog();
            for kind in [SubjectKind::Player, SubjectKind::Team] {
                println!("{} reports:", kind);
                for report_type in catalog.report_types(kind) {
                    println!("  {:<24} {}", report_type, catalog.display_name(report_type));
                }
            }
            Ok(0)
        }
    }
}

async fn generate(config: &ReportsConfig, args: &GenerateArgs) -> Result<i32> {
    let request = args.to_request()?;
    config.report_type_catalog().validate_request(&request)?;

    let service = HttpReportService::from_config(config)?;
    let mut generator = ReportGenerator::new(service.clone(), PollOptions::from_config(config));

    let mut updates = generator.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            match &state {
                GenerationState::Submitting => eprintln!("⏳ Submitting report request..."),
                GenerationState::Polling { report_id } => {
                    eprintln!("⏳ Generating report {} ...", report_id)
                }
                _ => {}
            }
        }
    });

    let submitted = generator.submit(&request).await?;
    if !submitted.is_terminal() {
        let teardown = generator.teardown_token();
        let interrupted = tokio::select! {
            _ = generator.wait_for_outcome() => false,
            _ = tokio::signal::ctrl_c() => true,
        };
        if interrupted {
            tracing::warn!("interrupted, stopping status polling");
            teardown.cancel();
        }
    }

    let outcome = generator.state();
    generator.teardown();
    progress.abort();

    match outcome {
        GenerationState::Complete { report_id } => {
            tracing::info!("✅ Report {} completed", report_id);
            let report = service.fetch_report(&report_id).await?;
            let view = ReportView::from_report(&report, &config.section_parser(), &config.section_labels());
            print_view(&view, args.json)?;
            Ok(0)
        }
        GenerationState::Failed(failure) => {
            eprintln!("❌ {}", failure.message());
            if let Some((used, limit)) = failure.quota() {
                eprintln!("💡 Upgrade required ({} of {} reports used)", used, limit);
                Ok(EXIT_UPGRADE_REQUIRED)
            } else {
                eprintln!("💡 Try again with the same options");
                Ok(EXIT_JOB_FAILED)
            }
        }
        other => {
            eprintln!("Stopped while {}", other.name());
            if let Some(report_id) = other.report_id() {
                eprintln!("💡 Check on it later with: prospectx status {}", report_id);
            }
            Ok(EXIT_INTERRUPTED)
        }
    }
}

fn print_view(view: &ReportView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        print!("{}", view.render_text());
    }
    Ok(())
}
