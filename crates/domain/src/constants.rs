//! Domain constants

/// Upper bound on items requested per change-feed page.
pub const MAX_PAGE_SIZE: u32 = 2500;

/// Default directory holding one state record per resource.
pub const DEFAULT_STATE_DIR: &str = "calendar_states";

/// Default aggregate subscription registry file.
pub const DEFAULT_CHANNELS_FILE: &str = "channels.json";

/// Default gateway bind address.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Google Calendar v3 REST base URL.
pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

/// Default timeout for change-feed and watch calls, in seconds.
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 30;

/// Default timeout for diff delivery, in seconds.
pub const DEFAULT_SINK_TIMEOUT_SECS: u64 = 10;
