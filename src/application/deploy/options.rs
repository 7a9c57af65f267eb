//! Deploy Options

/// Options for the deploy use case
#[derive(Debug, Clone, Default)]
pub struct DeployOptions {
    /// Do not probe the application after starting it
    pub skip_health_check: bool,
}

impl DeployOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_health_check(mut self, skip: bool) -> Self {
        self.skip_health_check = skip;
        self
    }
}
