//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn RoadmapProgressCallback>`] via
//! [`crate::config::RoadmapConfigBuilder::progress_callback`] to receive
//! events as the pipeline moves through its stages. The library knows
//! nothing about how the host reports progress (spinner, log line, web
//! socket).
//!
//! # Example
//!
//! ```rust
//! use pdf2roadmap::{RoadmapConfig, RoadmapProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl RoadmapProgressCallback for Printer {
//!     fn on_stage_start(&self, stage: Stage) {
//!         eprintln!("{} …", stage);
//!     }
//! }
//!
//! let config = RoadmapConfig::builder()
//!     .progress_callback(Arc::new(Printer) as Arc<dyn RoadmapProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the roadmap pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// PDF → plain text.
    ExtractText,
    /// Text → content steps (LLM call #1).
    ExtractSteps,
    /// Steps → diagram description (LLM call #2).
    GenerateDiagram,
    /// Description → image (external renderer).
    Render,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [
        Stage::ExtractText,
        Stage::ExtractSteps,
        Stage::GenerateDiagram,
        Stage::Render,
    ];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::ExtractText => "Extracting text",
            Stage::ExtractSteps => "Extracting research steps",
            Stage::GenerateDiagram => "Generating Mermaid diagram",
            Stage::Render => "Rendering SVG",
        };
        f.write_str(label)
    }
}

/// Called by the pipeline as it moves through each [`Stage`].
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait RoadmapProgressCallback: Send + Sync {
    /// Called just before a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes.
    ///
    /// # Arguments
    /// * `stage`   — the finished stage
    /// * `summary` — short human-readable result, e.g. "6 content steps"
    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        let _ = (stage, summary);
    }

    /// Called when a stage fails. The run stops after this event.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RoadmapProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RoadmapConfig`].
pub type ProgressCallback = Arc<dyn RoadmapProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl RoadmapProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, summary: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {stage:?}: {summary}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage:?}: {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        for stage in Stage::ALL {
            cb.on_stage_start(stage);
            cb.on_stage_complete(stage, "ok");
            cb.on_stage_error(stage, "boom");
        }
    }

    #[test]
    fn recorder_sees_events_in_order() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::ExtractText);
        rec.on_stage_complete(Stage::ExtractText, "1234 chars");
        rec.on_stage_start(Stage::ExtractSteps);
        rec.on_stage_error(Stage::ExtractSteps, "no JSON");

        let events = rec.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "start ExtractText",
                "done ExtractText: 1234 chars",
                "start ExtractSteps",
                "error ExtractSteps: no JSON",
            ]
        );
    }

    #[test]
    fn stage_labels_are_human_readable() {
        assert_eq!(Stage::Render.to_string(), "Rendering SVG");
        assert_eq!(Stage::ALL.len(), 4);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::GenerateDiagram);
    }
}
