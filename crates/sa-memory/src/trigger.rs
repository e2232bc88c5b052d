//! Threshold trigger for memory extraction (Section 4.6).
//!
//! Same ANY/ALL threshold-combination shape as
//! `sa_sessions::ThresholdSummarizer`, evaluated against message-count and
//! wall-clock signals instead of session state directly, since the
//! extraction queue only sees "N messages since the last extraction" at
//! enqueue time.

use sa_domain::config::{ExtractorConfig, TriggerPolicy};

pub trait ExtractionTrigger: Send + Sync {
    fn should_extract(&self, messages_since_last: usize, seconds_since_last: u64) -> bool;
}

pub struct ThresholdExtractionTrigger {
    config: ExtractorConfig,
}

impl ThresholdExtractionTrigger {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }
}

impl ExtractionTrigger for ThresholdExtractionTrigger {
    fn should_extract(&self, messages_since_last: usize, seconds_since_last: u64) -> bool {
        if !self.config.enabled {
            return false;
        }

        let mut signals = Vec::new();
        if let Some(threshold) = self.config.message_count_threshold {
            signals.push(messages_since_last >= threshold);
        }
        if let Some(threshold) = self.config.interval_seconds_threshold {
            signals.push(seconds_since_last >= threshold);
        }
        if signals.is_empty() {
            return false;
        }

        match self.config.policy {
            TriggerPolicy::Any => signals.iter().any(|&fired| fired),
            TriggerPolicy::All => signals.iter().all(|&fired| fired),
        }
    }
}
