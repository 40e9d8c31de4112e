//! Message rendering for decoded status entries.
//!
//! Lookup tables are supplied by the caller through [`MessageCatalog`]. A
//! template uses `@1`..`@9` to refer to the entry's string and numeric
//! arguments in order. Without a template the entry renders as
//! `ISC error <code>: <arg>, <arg>`.
//!
//! Lines for chained entries are joined with `"\n-"`, the way the client
//! tools print a status vector. Numeric OS errors get their own line and are
//! rendered with the platform's text when the error came from this platform.

use crate::codes::{StatusCode, StatusWord, gds};
use crate::record::{Severity, StatusArg, StatusEntry};
use smallvec::SmallVec;
use std::fmt::{self, Write};

/// Source of message templates keyed by status code.
pub trait MessageCatalog {
    fn template(&self, code: StatusCode) -> Option<&str>;
}

/// Catalog without templates; everything renders generically.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCatalog;

impl MessageCatalog for NoCatalog {
    fn template(&self, _code: StatusCode) -> Option<&str> {
        None
    }
}

/// Catalog over a static `(code, template)` table.
#[derive(Debug, Clone, Copy)]
pub struct StaticCatalog {
    entries: &'static [(StatusWord, &'static str)],
}

impl StaticCatalog {
    pub const fn new(entries: &'static [(StatusWord, &'static str)]) -> Self {
        Self { entries }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageCatalog for StaticCatalog {
    fn template(&self, code: StatusCode) -> Option<&str> {
        self.entries
            .iter()
            .find(|(raw, _)| *raw == code.raw())
            .map(|(_, template)| *template)
    }
}

/// Templates for the codes in [`gds`].
pub static ENGINE_MESSAGES: StaticCatalog = StaticCatalog::new(&[
    (gds::ARITH_EXCEPT.raw(), "arithmetic exception, numeric overflow, or string truncation"),
    (gds::BUG_CHECK.raw(), "internal consistency check (@1)"),
    (gds::IO_ERROR.raw(), "I/O error during \"@1\" operation for file \"@2\""),
    (gds::SYS_REQUEST.raw(), "operating system directive @1 failed"),
    (gds::UNAVAILABLE.raw(), "unavailable database"),
    (gds::RANDOM.raw(), "@1"),
    (gds::VIRMEMEXH.raw(), "unable to allocate memory from operating system"),
    (gds::NETWORK_ERROR.raw(), "Unable to complete network request to host \"@1\"."),
    (gds::NET_READ_ERR.raw(), "Error reading data from the connection."),
    (gds::NET_WRITE_ERR.raw(), "Error writing data to the connection."),
    (gds::CANCELLED.raw(), "operation was cancelled"),
]);

/// Write the message lines for a sequence of entries.
pub fn write_entries<'e, W>(
    out: &mut W,
    entries: impl IntoIterator<Item = &'e StatusEntry>,
    catalog: &dyn MessageCatalog,
) -> fmt::Result
where
    W: Write + ?Sized,
{
    let mut first = true;
    for entry in entries {
        separate(out, &mut first)?;
        write_entry(out, entry, catalog)?;
        for arg in entry.args() {
            if let StatusArg::Os { .. } = arg {
                separate(out, &mut first)?;
                write!(out, "{arg}")?;
            }
        }
    }
    Ok(())
}

/// Write the main line of one entry.
pub fn write_entry<W>(out: &mut W, entry: &StatusEntry, catalog: &dyn MessageCatalog) -> fmt::Result
where
    W: Write + ?Sized,
{
    let interpreted = entry.args().iter().find_map(|arg| match arg {
        StatusArg::Interpreted(text) => Some(text.as_ref()),
        _ => None,
    });
    if let Some(text) = interpreted {
        return out.write_str(text);
    }
    match catalog.template(entry.code()) {
        Some(template) => interpolate(out, template, entry.args()),
        None => write_generic(out, entry),
    }
}

fn separate<W: Write + ?Sized>(out: &mut W, first: &mut bool) -> fmt::Result {
    if !*first {
        out.write_str("\n-")?;
    }
    *first = false;
    Ok(())
}

fn is_parameter(arg: &StatusArg) -> bool {
    matches!(arg, StatusArg::Str(_) | StatusArg::Number(_))
}

fn interpolate<W: Write + ?Sized>(out: &mut W, template: &str, args: &[StatusArg]) -> fmt::Result {
    let params: SmallVec<[&StatusArg; 4]> = args.iter().filter(|a| is_parameter(a)).collect();
    let mut rest = template;
    while let Some(at) = rest.find('@') {
        out.write_str(&rest[..at])?;
        let tail = &rest[at + 1..];
        match tail.chars().next().and_then(|c| c.to_digit(10)) {
            Some(n) if n >= 1 => {
                if let Some(arg) = params.get(n as usize - 1) {
                    write!(out, "{arg}")?;
                }
                rest = &tail[1..];
            }
            _ => {
                out.write_char('@')?;
                rest = tail;
            }
        }
    }
    out.write_str(rest)
}

fn write_generic<W: Write + ?Sized>(out: &mut W, entry: &StatusEntry) -> fmt::Result {
    let label = match entry.severity() {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    write!(out, "ISC {label} {}", entry.code())?;
    let mut params = entry.args().iter().filter(|a| is_parameter(a));
    if let Some(first) = params.next() {
        write!(out, ": {first}")?;
        for arg in params {
            write!(out, ", {arg}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{OsErrorKind, markers::*};
    use crate::record::ErrorRecord;
    use crate::status::RawStatus;

    fn render(words: &[StatusWord], strings: &[&str], catalog: &dyn MessageCatalog) -> String {
        let record = ErrorRecord::parse(RawStatus::new(words, &strings));
        record.render(catalog)
    }

    #[test]
    fn generic_rendering_lists_parameters() {
        let text = render(
            &[ARG_GDS, 335544321, ARG_STRING, 0, ARG_NUMBER, 7],
            &["connection lost"],
            &NoCatalog,
        );
        assert_eq!(text, "ISC error 335544321: connection lost, 7");
    }

    #[test]
    fn template_substitutes_in_order() {
        let text = render(
            &[ARG_GDS, gds::IO_ERROR.raw(), ARG_STRING, 0, ARG_STRING, 1],
            &["open", "/db/employee.fdb"],
            &ENGINE_MESSAGES,
        );
        assert_eq!(text, "I/O error during \"open\" operation for file \"/db/employee.fdb\"");
    }

    #[test]
    fn missing_parameters_render_empty_and_stray_at_survives() {
        let catalog = StaticCatalog::new(&[(42, "mail @ host @2 @0")]);
        let text = render(&[ARG_GDS, 42, ARG_STRING, 0], &["x"], &catalog);
        assert_eq!(text, "mail @ host  @0");
    }

    #[test]
    fn interpreted_text_replaces_lookup() {
        let text = render(
            &[ARG_GDS, gds::RANDOM.raw(), ARG_INTERPRETED, 0],
            &["already formatted"],
            &ENGINE_MESSAGES,
        );
        assert_eq!(text, "already formatted");
    }

    #[test]
    fn chained_entries_and_os_errors_get_own_lines() {
        let os = OsErrorKind::Vms.marker();
        let text = render(
            &[ARG_GDS, gds::SYS_REQUEST.raw(), ARG_STRING, 0, os, 12, ARG_GDS, gds::UNAVAILABLE.raw()],
            &["open"],
            &ENGINE_MESSAGES,
        );
        assert_eq!(
            text,
            "operating system directive open failed\n-VMS error 12\n-unavailable database"
        );
    }

    #[test]
    fn catalog_lookup_misses_unknown_codes() {
        assert!(ENGINE_MESSAGES.template(StatusCode::new(1)).is_none());
        assert!(!ENGINE_MESSAGES.is_empty());
    }
}
