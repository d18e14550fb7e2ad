// Fundamental configuration constants
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const WS_PATH: &str = "ws";
pub const HEALTH_PATH: &str = "health";
pub const API_PATH: &str = "api";

// Peer connection tuning
pub const DEFAULT_WRITE_WAIT_SECS: u64 = 10;
pub const DEFAULT_PONG_WAIT_SECS: u64 = 60;
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 512 * 1024;
pub const DEFAULT_OUTBOX_CAPACITY: usize = 256;

// Wire constants
pub const RANKING_UPDATE_TYPE: &str = "ranking_update";
pub const DEFAULT_AVATAR: &str = "👤";
