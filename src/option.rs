use crate::logging::LogContext;

/// Tuning knobs for a [`ScanEvaluator`](crate::scan::ScanEvaluator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOption {
    pub(crate) prune_unsatisfiable: bool,
    pub(crate) log_context: LogContext,
}

impl Default for ScanOption {
    fn default() -> Self {
        ScanOption {
            prune_unsatisfiable: true,
            log_context: LogContext::default(),
        }
    }
}

impl ScanOption {
    /// Skip record evaluation entirely when the expression can be proven false from its
    /// resolved filters alone (e.g. an equality on a value missing from the dictionary).
    pub fn prune_unsatisfiable(self, prune_unsatisfiable: bool) -> Self {
        ScanOption {
            prune_unsatisfiable,
            ..self
        }
    }

    /// Key/value pairs appended to every log line of the evaluator.
    pub fn log_context(self, log_context: LogContext) -> Self {
        ScanOption {
            log_context,
            ..self
        }
    }
}
