//! Default value functions used by serde for config deserialization.

pub fn default_name() -> String {
    "Concierge".to_string()
}

pub fn default_data_dir() -> String {
    "~/.concierge".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}

pub fn default_timezone() -> String {
    "UTC".to_string()
}

pub fn default_provider() -> String {
    "none".to_string()
}

pub fn default_true() -> bool {
    true
}

pub fn default_anthropic_model() -> String {
    "claude-sonnet-4-20250514".to_string()
}

pub fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

pub fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

pub fn default_classifier_timeout() -> u64 {
    8
}

pub fn default_db_path() -> String {
    "~/.concierge/data/concierge.db".to_string()
}

pub fn default_history_turns() -> usize {
    6
}

pub fn default_task_page_size() -> usize {
    10
}

pub fn default_pending_ttl_secs() -> i64 {
    300
}

pub fn default_search_window_days() -> i64 {
    30
}

pub fn default_event_minutes() -> i64 {
    30
}

pub fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

pub fn default_api_port() -> u16 {
    3000
}

pub fn default_capability_timeout() -> u64 {
    20
}
