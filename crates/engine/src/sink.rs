//! Result sink contract and an in-memory implementation.

use std::convert::Infallible;
use std::fmt;

use crate::output::{IndexOutput, OutputMetadata};

/// Destination of a finished run.
pub trait ResultSink {
    /// Value returned for a written result, such as a path.
    type Handle;
    /// Error returned by the sink.
    type Error: fmt::Display;

    /// Fails early if the destination cannot be written.
    ///
    /// Called before any data is read.
    fn check_writable(&self) -> Result<(), Self::Error>;

    /// Writes one result.
    fn write(&mut self, output: &IndexOutput, metadata: &OutputMetadata) -> Result<Self::Handle, Self::Error>;
}

/// Keeps every written result in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    results: Vec<(IndexOutput, OutputMetadata)>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the written results in order.
    pub fn results(&self) -> &[(IndexOutput, OutputMetadata)] {
        &self.results
    }
}

impl ResultSink for MemorySink {
    type Handle = usize;
    type Error = Infallible;

    fn check_writable(&self) -> Result<(), Infallible> {
        Ok(())
    }

    fn write(&mut self, output: &IndexOutput, metadata: &OutputMetadata) -> Result<usize, Infallible> {
        self.results.push((output.clone(), metadata.clone()));
        Ok(self.results.len() - 1)
    }
}
