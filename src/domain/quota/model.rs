use crate::domain::settings::UserSettings;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monthly free tier of premium (WaveNet and friends) voices
pub const FREE_PREMIUM_CHARS: u64 = 1_000_000;

/// Monthly free tier of standard voices
pub const FREE_STANDARD_CHARS: u64 = 4_000_000;

const WARNING_LEVELS: [u8; 3] = [95, 80, 50];

/// Characters billed against one api key since its last reset, summed across installs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaTotals {
    pub char_count_std: u64,
    pub char_count_wave: u64,
    pub last_reset: Option<DateTime<Utc>>,
}

/// Highest warning percentage (50, 80 or 95) reached by `used` out of `limit`
pub fn warning_level(used: u64, limit: u64) -> Option<u8> {
    if limit == 0 {
        return None;
    }
    let percent = used.saturating_mul(100) / limit;
    WARNING_LEVELS
        .iter()
        .copied()
        .find(|level| percent >= *level as u64)
}

/// Response for GET /api/quota
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaReport {
    pub char_count_std: u64,
    pub char_count_wave: u64,
    pub limit_std: u64,
    pub limit_wave: u64,
    pub warning_std: Option<u8>,
    pub warning_wave: Option<u8>,
    pub last_reset: Option<DateTime<Utc>>,
}

impl QuotaReport {
    pub fn new(totals: QuotaTotals, settings: &UserSettings) -> Self {
        let limit_std = settings.quota_stop_at_size_std;
        let limit_wave = settings.quota_stop_at_size_wave;
        let (warning_std, warning_wave) = if settings.quota_size_warnings {
            (
                warning_level(totals.char_count_std, limit_std),
                warning_level(totals.char_count_wave, limit_wave),
            )
        } else {
            (None, None)
        };

        Self {
            char_count_std: totals.char_count_std,
            char_count_wave: totals.char_count_wave,
            limit_std,
            limit_wave,
            warning_std,
            warning_wave,
            last_reset: totals.last_reset,
        }
    }
}
