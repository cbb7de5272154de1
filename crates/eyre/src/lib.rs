//! Shared `eyre` error plumbing for binaries and test harnesses built on top
//! of `evmtrace-core`.
//!
//! `evmtrace-core` itself never returns an [`eyre::Report`] — its public
//! API is a closed `thiserror` enum so library callers can match on it.
//! Application-level code that just wants one ergonomic error type to
//! propagate with `?` pulls in this crate instead.

pub use eyre::{Report, Result, WrapErr, eyre};

use std::fmt;

/// Installs the workspace's default `eyre` report hook.
///
/// Indents chained error causes so multi-line sources (e.g. a `LayoutError`
/// wrapping a slot/type id) stay readable instead of running together on one
/// line. Safe to call more than once; later calls are no-ops.
pub fn install() {
    let _ = eyre::set_hook(Box::new(|_| Box::new(IndentedHandler)));
}

struct IndentedHandler;

impl eyre::EyreHandler for IndentedHandler {
    fn debug(
        &self,
        error: &(dyn std::error::Error + 'static),
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{error}")?;

        let mut source = error.source();
        if source.is_some() {
            writeln!(f)?;
        }
        let mut index = 0;
        while let Some(cause) = source {
            writeln!(f)?;
            let mut indented = indenter::indented(f).with_format(indenter::Format::Numbered {
                ind: index,
            });
            write!(indented, "{cause}")?;
            source = cause.source();
            index += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        install();
        install();
    }

    #[test]
    fn eyre_macro_builds_a_report() {
        let report: Report = eyre!("slot {} not in diff", "0x00");
        assert!(report.to_string().contains("not in diff"));
    }
}
