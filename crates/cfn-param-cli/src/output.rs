use std::fmt;

use cfn_param_core::types::ParameterValue;
use cfn_param_core::{Plan, Settings};
use serde::Serialize;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Message prefixes
// ---------------------------------------------------------------------------

/// Prefix for a message at `level`. Under GitHub Actions these are workflow
/// commands so the runner turns them into annotations.
pub fn prefix(settings: &Settings, level: Level) -> &'static str {
    if settings.github_actions {
        workflow_command(level)
    } else if level == Level::ERROR {
        "error: "
    } else if level == Level::WARN {
        "warning: "
    } else {
        ""
    }
}

fn workflow_command(level: Level) -> &'static str {
    if level == Level::ERROR {
        "::error::"
    } else if level == Level::WARN {
        "::warning::"
    } else if level == Level::INFO {
        ""
    } else {
        "::debug::"
    }
}

pub fn warning(settings: &Settings, message: impl fmt::Display) {
    eprintln!("{}{message}", prefix(settings, Level::WARN));
}

pub fn error(settings: &Settings, message: impl fmt::Display) {
    eprintln!("{}{message}", prefix(settings, Level::ERROR));
}

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Formats each event as a single GitHub workflow command line.
pub struct GithubFormat;

impl<S, N> FormatEvent<S, N> for GithubFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(writer, "{}", workflow_command(*event.metadata().level()))?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Targets whose debug output makes up the diagnostic trace.
const DIAGNOSTIC_TARGETS: &[&str] = &["cfn_param_core", "update_cloudformation_stack"];

/// Build the log filter from `rust_log` (the `RUST_LOG` value, possibly
/// empty). The default level is INFO; diagnostics raise only this tool's own
/// targets to DEBUG so SDK and transport crates stay quiet.
pub fn env_filter(settings: &Settings, rust_log: &str) -> EnvFilter {
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(rust_log);
    if settings.diagnostics {
        for target in DIAGNOSTIC_TARGETS {
            if let Ok(directive) = format!("{target}=debug").parse() {
                filter = filter.add_directive(directive);
            }
        }
    }
    filter
}

pub fn init_tracing(settings: &Settings) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_default();
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings, &rust_log))
        .with_writer(std::io::stderr);
    if settings.github_actions {
        builder.event_format(GithubFormat).init();
    } else {
        builder.with_target(false).init();
    }
}

// ---------------------------------------------------------------------------
// Plan rendering
// ---------------------------------------------------------------------------

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    stack: &'a str,
    #[serde(flatten)]
    plan: &'a Plan,
}

pub fn print_plan(stack: &str, plan: &Plan, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&PlanOutput { stack, plan });
    }
    println!("Stack: {stack}");
    print_table(&["PARAMETER", "VALUE"], plan_rows(plan));
    if !plan.capabilities.is_empty() {
        println!("Capabilities: {}", plan.capabilities.join(", "));
    }
    if !plan.notification_targets.is_empty() {
        println!("Notifications: {}", plan.notification_targets.join(", "));
    }
    Ok(())
}

fn plan_rows(plan: &Plan) -> Vec<Vec<String>> {
    plan.parameters
        .iter()
        .map(|p| {
            let value = match &p.value {
                ParameterValue::Explicit(v) => v.clone(),
                ParameterValue::UsePrevious => "(use previous value)".to_string(),
            };
            vec![p.key.clone(), value]
        })
        .collect()
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    print!("{}", render_table(headers, &rows));
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.len());
            }
        }
    }

    let line = |cells: Vec<&str>| -> String {
        let padded: Vec<String> = cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(headers.to_vec());
    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    out.push_str(&format!("{}\n", sep.join("  ")));
    for row in rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
    }
    out
}
