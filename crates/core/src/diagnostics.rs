//! The two observability switches every load carries.
//! They only decide what reaches the `log` facade; results never depend on them.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Diagnostics {
    /// Progress messages and non-fatal anomaly reports.
    pub progress: bool,
    /// The final report of a fatal load error.
    pub errors: bool,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            progress: true,
            errors: true,
        }
    }
}

impl Diagnostics {
    pub const fn silent() -> Self {
        Self {
            progress: false,
            errors: false,
        }
    }

    pub const fn new(progress: bool, errors: bool) -> Self {
        Self { progress, errors }
    }

    #[inline]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        if self.progress {
            log::info!("{args}");
        }
    }

    /// Skipped or unexpected input that does not abort the load.
    #[inline]
    pub fn anomaly(&self, line: usize, args: fmt::Arguments<'_>) {
        if self.progress {
            log::warn!("line {line}: {args}");
        }
    }

    #[inline]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        if self.errors {
            log::error!("{args}");
        }
    }
}
