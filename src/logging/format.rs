//! The fixed record layout shared by every sink
//!
//! `<Mon> <DD> <HH:MM:SS> <app_name> [<pid>]: [<LEVEL>] <message>`

use std::fmt;
use std::sync::Arc;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use super::level::Severity;

/// Local time, abbreviated month, no year
pub const TIMESTAMP_FORMAT: &str = "%b %d %H:%M:%S";

/// Event formatter producing the record layout
#[derive(Debug, Clone)]
pub struct RecordFormat {
    app_name: Arc<str>,
    pid: u32,
}

impl RecordFormat {
    /// Format for the current process
    pub fn new(app_name: &str) -> Self {
        Self::with_pid(app_name, std::process::id())
    }

    pub fn with_pid(app_name: &str, pid: u32) -> Self {
        Self {
            app_name: Arc::from(app_name),
            pid,
        }
    }
}

impl<S, N> FormatEvent<S, N> for RecordFormat
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
        let severity = Severity::from(*event.metadata().level());
        write!(
            writer,
            "{} {} [{}]: [{}] ",
            Local::now().format(TIMESTAMP_FORMAT),
            self.app_name,
            self.pid,
            severity
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
