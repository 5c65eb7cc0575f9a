use crate::error::{BenchError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub(crate) struct ProgressBarBuilder {
    style_template: &'static str,
    message: String,
    length: Option<u64>,
    enable_tick: bool,
}

impl ProgressBarBuilder {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            style_template: "{spinner:.green} {msg}",
            message: message.into(),
            length: None,
            enable_tick: false,
        }
    }

    pub(crate) fn with_template(mut self, template: &'static str) -> Self {
        self.style_template = template;
        self
    }

    /// Bounded bar instead of a spinner.
    pub(crate) fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub(crate) fn with_tick(mut self) -> Self {
        self.enable_tick = true;
        self
    }

    pub(crate) fn build(self) -> Result<ProgressBar> {
        let (pb, style) = match self.length {
            Some(len) => (ProgressBar::new(len), ProgressStyle::default_bar()),
            None => (ProgressBar::new_spinner(), ProgressStyle::default_spinner()),
        };

        let style = style
            .template(self.style_template)
            .map_err(|e| BenchError::parameter(format!("bad progress template: {}", e)))?;
        pb.set_style(style.progress_chars("#>-"));
        pb.set_message(self.message);

        if self.enable_tick {
            pb.enable_steady_tick(Duration::from_millis(250));
        }

        Ok(pb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_spinner_and_bar() {
        let spinner = ProgressBarBuilder::new("working").build().unwrap();
        assert_eq!(spinner.message(), "working");
        let bar = ProgressBarBuilder::new("runs")
            .with_template("{bar:40} {pos}/{len}")
            .with_length(10)
            .build()
            .unwrap();
        assert_eq!(bar.length(), Some(10));
    }
}
