use super::config::ProcessingConfig;
use super::progress::ProgressReporter;
use crate::core::models::connectivity::ConnectivityCriteria;

/// Shared, read-only inputs of the post-processing tasks.
#[derive(Clone, Copy)]
pub struct ProcessingContext<'a> {
    pub config: &'a ProcessingConfig,
    pub reporter: &'a ProgressReporter<'a>,
}

impl<'a> ProcessingContext<'a> {
    pub fn new(config: &'a ProcessingConfig, reporter: &'a ProgressReporter<'a>) -> Self {
        Self { config, reporter }
    }

    pub fn criteria(&self) -> ConnectivityCriteria {
        self.config.bonding.criteria()
    }
}
