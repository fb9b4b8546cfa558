//! Progress reporting for delegations

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use relay_application::DelegationProgress;
use relay_domain::{BackendKind, ExecutionResult, SelectionReason, SessionRef, SessionState};
use std::sync::Mutex;
use std::time::Duration;

/// Reports progress with a spinner that follows the session state
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    /// Run `f` against the current spinner, creating one if needed.
    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut guard) = self.spinner.lock() else {
            return;
        };
        let spinner = guard.get_or_insert_with(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(Self::spinner_style());
            pb.enable_steady_tick(Duration::from_millis(120));
            pb
        });
        f(spinner);
    }

    /// Stop the spinner so the terminal is free for other output.
    fn clear(&self) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DelegationProgress for ProgressReporter {
    fn on_backend_selected(&self, kind: BackendKind, reason: SelectionReason) {
        self.with_spinner(|pb| {
            pb.set_prefix(kind.to_string());
            pb.set_message(format!("selected ({})", reason));
        });
    }

    fn on_session_created(&self, session: &SessionRef) {
        self.with_spinner(|pb| {
            pb.set_prefix(session.to_string());
            pb.set_message("created");
        });
    }

    fn on_state_change(&self, session: &SessionRef, _from: SessionState, to: SessionState) {
        if to == SessionState::HandedOff {
            // The interactive CLI owns the terminal from here on.
            self.clear();
            eprintln!("{} handing {} to the terminal", "->".cyan(), session);
            return;
        }
        self.with_spinner(|pb| {
            pb.set_prefix(session.to_string());
            pb.set_message(to.to_string());
        });
    }

    fn on_plan_ready(&self, _session: &SessionRef, steps: &[String]) {
        // The approval prompt needs a quiet terminal.
        self.clear();
        eprintln!("{}", "Proposed plan:".cyan().bold());
        for (i, step) in steps.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, step);
        }
    }

    fn on_finished(&self, result: &ExecutionResult) {
        if let Ok(mut guard) = self.spinner.lock()
            && let Some(pb) = guard.take()
        {
            let mark = if result.success { "v".green() } else { "x".red() };
            pb.finish_with_message(format!("{} {}", mark, result.state));
        }
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl DelegationProgress for SimpleProgress {
    fn on_backend_selected(&self, kind: BackendKind, reason: SelectionReason) {
        eprintln!("{} {} ({})", "->".cyan(), kind.to_string().bold(), reason);
    }

    fn on_session_created(&self, session: &SessionRef) {
        eprintln!("  session {}", session);
    }

    fn on_state_change(&self, _session: &SessionRef, from: SessionState, to: SessionState) {
        eprintln!("  {} -> {}", from, to);
    }

    fn on_plan_ready(&self, _session: &SessionRef, steps: &[String]) {
        eprintln!("  plan:");
        for (i, step) in steps.iter().enumerate() {
            eprintln!("    {}. {}", i + 1, step);
        }
    }

    fn on_finished(&self, result: &ExecutionResult) {
        if result.success {
            eprintln!("  {} {}", "v".green(), result.state);
        } else {
            eprintln!("  {} {}", "x".red(), result.state);
        }
    }
}
