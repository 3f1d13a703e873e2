use std::env;
use std::path::PathBuf;

use crate::criteria::Criteria;

const DEFAULT_STATE_PATH: &str = "seen_apartments.json";

/// Runtime configuration, read once at startup. Criteria thresholds default
/// to the values the monitor was originally tuned with; every knob can be
/// overridden through the environment so tests and one-off runs never touch
/// process-wide state.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub telegram_chat_id: String,
    pub state_path: PathBuf,
    pub criteria: Criteria,
}

impl Config {
    pub fn from_env() -> Self {
        let mut criteria = Criteria::default();
        if let Some(v) = env_f64("MAX_WARM_RENT") {
            criteria.market_rate.price_max = Some(v);
        }
        if let Some(v) = env_f64("WBS_MAX_SIZE") {
            criteria.subsidized.size_max = Some(v);
        }
        if let Some(v) = env_f64("WBS_ROOMS_MIN") {
            criteria.subsidized.rooms_min = Some(v);
        }
        if let Some(v) = env_f64("WBS_ROOMS_MAX") {
            criteria.subsidized.rooms_max = Some(v);
        }

        Config {
            telegram_token: env::var("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").unwrap_or_default(),
            state_path: env::var("SEEN_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_PATH)),
            criteria,
        }
    }
}

fn env_f64(key: &str) -> Option<f64> {
    env::var(key).ok()?.trim().parse().ok()
}
