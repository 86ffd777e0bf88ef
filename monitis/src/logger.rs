//! Tracing formatter that prefixes every line with the seconds elapsed since
//! the formatter was created.
//!
//! # Format
//!
//! ```text
//! <elapsed, 5 wide, 1 decimal> <message>[ <field value>]*
//! ```
//!
//! Field keys are dropped and only values are printed. An empty value is
//! printed as `''` so it stays visible:
//!
//! ```text
//!   0.0 Requesting auth token
//!   0.4 Editing monitor 1234 3
//!   0.9 Monitor updated 1234 ''
//! ```

use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};
use thiserror::Error;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::filter::{EnvFilter, ParseError};
use tracing_subscriber::fmt::format::{self, FormatEvent, FormatFields};
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::registry::LookupSpan;

/// Marker printed in place of a field whose value renders as an empty string.
const EMPTY_VALUE: &str = "''";

/// Returned by [`ElapsedFormatter::try_clone`]. Treat as a configuration bug.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("ElapsedFormatter does not support cloning; construct a new formatter instead")]
pub struct CloneUnsupported;

#[derive(Error, Debug)]
pub enum InitError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error(transparent)]
    Global(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Event formatter with a start time fixed at construction.
///
/// Not `Clone`; [`ElapsedFormatter::try_clone`] always fails.
#[derive(Debug)]
pub struct ElapsedFormatter {
    started_at: DateTime<Utc>,
}

impl ElapsedFormatter {
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    pub fn starting_at(started_at: DateTime<Utc>) -> Self {
        Self { started_at }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn try_clone(&self) -> Result<Self, CloneUnsupported> {
        Err(CloneUnsupported)
    }

    /// Render one line for an event logged at `at`.
    pub fn format_line<V: AsRef<str>>(
        &self,
        at: DateTime<Utc>,
        message: &str,
        fields: &[V],
    ) -> String {
        render_line(self.started_at, at, message, fields)
    }
}

impl Default for ElapsedFormatter {
    fn default() -> Self {
        Self::new()
    }
}

/// `"{elapsed:5.1} {message}[ {value}]*\n"`, with `''` for empty values.
pub fn render_line<V: AsRef<str>>(
    started_at: DateTime<Utc>,
    at: DateTime<Utc>,
    message: &str,
    fields: &[V],
) -> String {
    let delta = at - started_at;
    let elapsed = delta
        .num_microseconds()
        .map(|us| us as f64 / 1_000_000.0)
        .unwrap_or_else(|| delta.num_milliseconds() as f64 / 1_000.0);

    let mut line = format!("{:5.1} {}", elapsed, message);
    for value in fields {
        let value = value.as_ref();
        line.push(' ');
        line.push_str(if value.is_empty() { EMPTY_VALUE } else { value });
    }
    line.push('\n');
    line
}

impl<S, N> FormatEvent<S, N> for ElapsedFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut fields = FieldCollector::default();
        event.record(&mut fields);
        writer.write_str(&self.format_line(Utc::now(), &fields.message, &fields.values))
    }
}

/// Splits the `message` field from the rest, keeping field order.
#[derive(Default)]
struct FieldCollector {
    message: String,
    values: Vec<String>,
}

impl FieldCollector {
    fn push(&mut self, field: &Field, value: String) {
        if field.name() == "message" {
            self.message = value;
        } else {
            self.values.push(value);
        }
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

/// Install a global subscriber that writes elapsed-time lines to stderr.
pub fn init(filter: &str) -> Result<(), InitError> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter)?)
        .with_writer(std::io::stderr)
        .event_format(ElapsedFormatter::new())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::io;
    use std::sync::{Arc, Mutex};

    const NO_FIELDS: [&str; 0] = [];

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .event_format(ElapsedFormatter::new())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn message_without_fields() {
        let at = t0() + Duration::milliseconds(3140);
        assert_eq!(render_line(t0(), at, "starting", &NO_FIELDS), "  3.1 starting\n");
    }

    #[test]
    fn elapsed_is_right_justified_to_five_columns() {
        assert_eq!(render_line(t0(), t0(), "m", &NO_FIELDS), "  0.0 m\n");
        let later = t0() + Duration::milliseconds(12_345_600);
        assert_eq!(render_line(t0(), later, "m", &NO_FIELDS), "12345.6 m\n");
    }

    #[test]
    fn field_values_follow_message_in_order() {
        let at = t0() + Duration::seconds(2);
        assert_eq!(
            render_line(t0(), at, "edited", &["1234", "homepage"]),
            "  2.0 edited 1234 homepage\n"
        );
    }

    #[test]
    fn empty_value_renders_marker() {
        let line = render_line(t0(), t0(), "edited", &["1234", ""]);
        assert_eq!(line, "  0.0 edited 1234 ''\n");
    }

    #[test]
    fn elapsed_never_decreases_for_ordered_timestamps() {
        let formatter = ElapsedFormatter::starting_at(t0());
        let mut previous = f64::MIN;
        for ms in [0, 49, 50, 51, 999, 1_000, 1_049, 60_000, 60_001] {
            let at = t0() + Duration::milliseconds(ms);
            let line = formatter.format_line(at, "tick", &NO_FIELDS);
            let elapsed: f64 = line.split_whitespace().next().unwrap().parse().unwrap();
            assert!(elapsed >= previous, "{} went backwards in {:?}", elapsed, line);
            previous = elapsed;
        }
    }

    #[test]
    fn start_time_is_fixed_at_construction() {
        let formatter = ElapsedFormatter::starting_at(t0());
        assert_eq!(formatter.started_at(), t0());
        let at = t0() + Duration::milliseconds(500);
        assert_eq!(
            formatter.format_line(at, "a", &NO_FIELDS),
            formatter.format_line(at, "a", &NO_FIELDS)
        );
    }

    #[test]
    fn clone_is_rejected() {
        let err = ElapsedFormatter::new().try_clone().unwrap_err();
        assert_eq!(err, CloneUnsupported);
        assert!(err.to_string().contains("does not support cloning"));
    }

    #[test]
    fn formats_tracing_events() {
        let out = capture(|| {
            tracing::info!(test_id = 1234, name = "homepage", sni = true, "Editing monitor");
        });
        assert!(out.ends_with(" Editing monitor 1234 homepage true\n"), "{:?}", out);
        assert_eq!(out.lines().count(), 1);
    }

    #[test]
    fn formats_empty_tracing_field_as_marker() {
        let out = capture(|| {
            tracing::info!(reason = "", detail = %"", "Monitor updated");
        });
        assert!(out.ends_with(" Monitor updated '' ''\n"), "{:?}", out);
    }

    #[test]
    fn event_without_fields_is_prefix_and_message() {
        let out = capture(|| tracing::info!("Requesting auth token"));
        let (prefix, rest) = out.split_at(6);
        assert_eq!(rest, "Requesting auth token\n");
        assert!(prefix.ends_with(' '));
        assert!(prefix.trim().parse::<f64>().is_ok());
    }

    #[test]
    fn init_rejects_invalid_filter() {
        assert!(matches!(init("monitis=notalevel"), Err(InitError::Filter(_))));
    }
}
