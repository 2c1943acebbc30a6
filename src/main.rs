use std::process;

use readalong::{
    application::{
        align::{Alignment, ContentKind, ReadAlongContext},
        error::AppError,
        playback::active_segment_id,
        segments::load_segments,
    },
    config::{self, ActiveArgs, AlignArgs, OutputFormat},
    infra::{error::InfraError, segments::RoutedSegmentSource, telemetry},
};
use serde::Serialize;
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, kind = error.kind(), "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, kind = error.kind(), "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    match cli_args.command {
        config::Command::Align(args) => run_align(settings, *args).await,
        config::Command::Active(args) => run_active(settings, args).await,
    }
}

#[derive(Debug, Serialize)]
struct AlignReport<'a> {
    kind: &'static str,
    segments: usize,
    active_segment_id: Option<i64>,
    #[serde(flatten)]
    alignment: &'a Alignment,
}

async fn run_align(settings: config::Settings, args: AlignArgs) -> Result<(), AppError> {
    if args.at.is_some_and(|at| !at.is_finite()) {
        return Err(AppError::validation("--at must be a finite number of seconds"));
    }

    let content = tokio::fs::read_to_string(&args.content)
        .await
        .map_err(InfraError::from)?;
    let source = RoutedSegmentSource::new(&settings.fetch)?;
    let segments = load_segments(&source, &args.segments).await;
    let context = ReadAlongContext::from(&settings);
    let active = args.at.and_then(|at| active_segment_id(&segments, at));
    let kind = if args.inline {
        ContentKind::Inline
    } else {
        ContentKind::Html
    };

    info!(
        target = "readalong::align",
        content = %args.content.display(),
        kind = kind.as_str(),
        segments = segments.len(),
        "Aligning content"
    );

    let output = match (args.format, kind) {
        (OutputFormat::Json, _) => {
            let alignment = context.ranges(kind, &content, &segments);
            let report = AlignReport {
                kind: kind.as_str(),
                segments: segments.len(),
                active_segment_id: active,
                alignment: &alignment,
            };
            to_json(&report)?
        }
        (OutputFormat::Html, ContentKind::Html) => context.render_html(&content, &segments, active),
        (OutputFormat::Html, ContentKind::Inline) => {
            to_json(&context.render_inline(&content, &segments, active))?
        }
    };

    println!("{output}");
    Ok(())
}

async fn run_active(settings: config::Settings, args: ActiveArgs) -> Result<(), AppError> {
    if !args.at.is_finite() {
        return Err(AppError::validation("--at must be a finite number of seconds"));
    }

    let source = RoutedSegmentSource::new(&settings.fetch)?;
    let segments = load_segments(&source, &args.segments).await;
    let active = active_segment_id(&segments, args.at);

    println!("{}", to_json(&active)?);
    Ok(())
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::unexpected(format!("failed to encode output: {err}")))
}
