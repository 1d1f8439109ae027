pub mod api;
pub mod app;
pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod fetch;
pub mod filter;
pub mod line;
pub mod schedule;
pub mod theme;

#[cfg(feature = "display")]
pub mod display;

pub use api::{parse_lines, LineSource, SupabaseSource};
pub use app::{App, AppEvent, LoadState, ScheduleView, View};
pub use clock::{Clock, ClockTicker, SystemClock};
pub use config::SourceConfig;
pub use error::{AppError, ConfigError, FetchError, PreferenceError};
pub use fetch::PendingFetch;
pub use filter::{LineFilter, StatusFilter};
pub use line::{BusLine, DepartureRow, LineStatus, OrderedMap};
pub use schedule::{
    find_next_departure, select_default_period, time_to_minutes, DepartureBoard, PeriodKind, RowState,
};
pub use theme::{Palette, Theme, ThemePreference};

#[cfg(feature = "display")]
pub use display::{DisplayConfig, StopSign};
