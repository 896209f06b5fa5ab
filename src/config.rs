//! Output configuration for [`run_root_suite`](crate::engine::run_root_suite).

use crate::tap::pretty::PrettySink;
use crate::tap::{LineSink, StdoutSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Raw TAP 13, for piping into other tools.
    Tap,
    /// Headings, check marks and a summary.
    Pretty,
}

#[derive(Debug, Clone)]
pub struct SuiteConfig {
    pub format: OutputFormat,
    pub use_colors: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        let interactive = atty::is(atty::Stream::Stdout);
        Self {
            format: if interactive {
                OutputFormat::Pretty
            } else {
                OutputFormat::Tap
            },
            use_colors: interactive,
        }
    }
}

impl SuiteConfig {
    pub fn tap() -> Self {
        Self {
            format: OutputFormat::Tap,
            use_colors: false,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    /// The stdout sink matching this configuration.
    pub fn sink(&self) -> Box<dyn LineSink> {
        match self.format {
            OutputFormat::Tap => Box::new(StdoutSink),
            OutputFormat::Pretty => Box::new(PrettySink::stdout(self.use_colors)),
        }
    }
}
