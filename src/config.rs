use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
    pub file_logs: bool,
    pub log_dir: PathBuf,
    pub backup_retention: usize,
    pub confirmation_window: Duration,
    pub tick_interval: Duration,
    pub mastery_per_study_minute: i64,
    pub smoothing_window: usize,
    pub camera_interval: Duration,
    pub camera_join_timeout: Duration,
}

const SAVE_FILE_NAME: &str = "save_data.json";

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("STUDYPET_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_data_dir());

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let file_logs = std::env::var("ENABLE_FILE_LOGS")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let log_dir = std::env::var("LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./logs"));

        let backup_retention = std::env::var("SAVE_BACKUP_RETENTION")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(3);

        let confirmation_window = std::env::var("SESSION_CONFIRM_WINDOW_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(300));

        let tick_interval = std::env::var("SESSION_TICK_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(1000));

        let mastery_per_study_minute = std::env::var("MASTERY_PER_STUDY_MINUTE")
            .ok()
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(1);

        let smoothing_window = std::env::var("CAMERA_SMOOTHING_WINDOW")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|window| *window > 0)
            .unwrap_or(10);

        let camera_interval = std::env::var("CAMERA_INTERVAL_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(200));

        let camera_join_timeout = std::env::var("CAMERA_JOIN_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(2000));

        Self {
            data_dir,
            log_level,
            file_logs,
            log_dir,
            backup_retention,
            confirmation_window,
            tick_interval,
            mastery_per_study_minute,
            smoothing_window,
            camera_interval,
            camera_join_timeout,
        }
    }

    pub fn save_file_path(&self) -> PathBuf {
        self.data_dir.join(SAVE_FILE_NAME)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("studypet"))
        .unwrap_or_else(|| PathBuf::from("./user_data"))
}
