use docklift::config::{EngineConfig, Verbosity};

use crate::ui::terminal::{detect_capabilities, use_color, TerminalCapabilities};

/// Resolved output settings for one CLI invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiContext {
    pub json: bool,
    pub verbosity: Verbosity,
    pub color: bool,
    pub unicode: bool,
}

impl UiContext {
    pub fn new(json: bool, verbose: u8, config: &EngineConfig) -> Self {
        Self::from_caps(json, verbose, config, detect_capabilities())
    }

    pub(crate) fn from_caps(
        json: bool,
        verbose: u8,
        config: &EngineConfig,
        caps: TerminalCapabilities,
    ) -> Self {
        // Each -v raises the configured level by one step.
        let verbosity = (0..verbose).fold(config.output.verbosity, |level, _| match level {
            Verbosity::Quiet => Verbosity::Normal,
            Verbosity::Normal => Verbosity::Verbose,
            Verbosity::Verbose | Verbosity::Debug => Verbosity::Debug,
        });

        Self {
            json,
            verbosity,
            color: !json && use_color(config.output.color, &caps),
            unicode: caps.supports_unicode,
        }
    }
}
