//! Job domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Mode a strategy job runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TradingMode {
    Backtesting,
    PaperTrading,
    RealTrading,
}

impl TradingMode {
    /// Numeric value the API expects in `tradingType` fields
    pub fn wire_value(self) -> u8 {
        match self {
            TradingMode::RealTrading => 0,
            TradingMode::PaperTrading => 1,
            TradingMode::Backtesting => 2,
        }
    }

    /// Tag the remote service prefixes to every log line of this mode
    pub fn log_tag(self) -> &'static str {
        match self {
            TradingMode::Backtesting => "BT",
            TradingMode::PaperTrading => "PT",
            TradingMode::RealTrading => "RT",
        }
    }

    /// Name the API expects in the `mode` field of an execute config
    pub fn wire_name(self) -> &'static str {
        match self {
            TradingMode::Backtesting => "BACKTESTING",
            TradingMode::PaperTrading => "PAPERTRADING",
            TradingMode::RealTrading => "REALTRADING",
        }
    }

    /// Resolve a log line tag (`BT`, `PT`, `RT`) back to its mode
    pub fn from_log_tag(tag: &str) -> Option<Self> {
        match tag {
            "BT" => Some(TradingMode::Backtesting),
            "PT" => Some(TradingMode::PaperTrading),
            "RT" => Some(TradingMode::RealTrading),
            _ => None,
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TradingMode::Backtesting => "backtesting",
            TradingMode::PaperTrading => "paper trading",
            TradingMode::RealTrading => "real trading",
        };
        f.write_str(name)
    }
}

impl FromStr for TradingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bt" | "backtest" | "backtesting" => Ok(TradingMode::Backtesting),
            "pt" | "paper" | "papertrading" | "paper-trading" => Ok(TradingMode::PaperTrading),
            "rt" | "real" | "live" | "realtrading" | "real-trading" => {
                Ok(TradingMode::RealTrading)
            }
            other => Err(format!("unknown trading mode '{}'", other)),
        }
    }
}

/// Identifies one remote job
///
/// Created once a job has been submitted and kept unchanged for the lifetime
/// of any monitoring session watching it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobHandle {
    job_key: String,
    mode: TradingMode,
}

impl JobHandle {
    pub fn new(job_key: impl Into<String>, mode: TradingMode) -> Self {
        Self {
            job_key: job_key.into(),
            mode,
        }
    }

    /// Opaque key of the job (the strategy code it was submitted under)
    pub fn job_key(&self) -> &str {
        &self.job_key
    }

    pub fn mode(&self) -> TradingMode {
        self.mode
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.job_key, self.mode.log_tag())
    }
}

/// Lifecycle status of a remote job
///
/// `Unknown` stands for any status text the client does not recognize. It is
/// never terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ExecutionStatus {
    Starting,
    Started,
    Stopping,
    Stopped,
    Unknown,
}

impl ExecutionStatus {
    /// Map raw status text returned by the remote service
    pub fn from_status_text(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "STARTING" => ExecutionStatus::Starting,
            "STARTED" => ExecutionStatus::Started,
            "STOPPING" => ExecutionStatus::Stopping,
            "STOPPED" => ExecutionStatus::Stopped,
            _ => ExecutionStatus::Unknown,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Stopped)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ExecutionStatus::Starting => "STARTING",
            ExecutionStatus::Started => "STARTED",
            ExecutionStatus::Stopping => "STOPPING",
            ExecutionStatus::Stopped => "STOPPED",
            ExecutionStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared time window of a job
///
/// Backtests cover a historical range; paper and real trading sessions run
/// between a start and an (optional) end instant. Live sessions usually have
/// no end, in which case no completion fraction can be derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl JobWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// A window with a start but no declared end
    pub fn open_ended(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Whether both bounds are known
    pub fn is_bounded(&self) -> bool {
        self.start.is_some() && self.end.is_some()
    }

    /// A window is invalid only when both bounds are known and end precedes start
    pub fn is_valid(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => end >= start,
            _ => true,
        }
    }

    /// Fraction of the window elapsed at `at`, clamped to `[0, 1]`
    ///
    /// Returns `None` unless both bounds are known and the window has a
    /// positive length.
    pub fn fraction_at(&self, at: DateTime<Utc>) -> Option<f64> {
        let (start, end) = (self.start?, self.end?);
        let total = (end - start).num_milliseconds();
        if total <= 0 {
            return None;
        }
        let elapsed = (at - start).num_milliseconds();
        Some((elapsed as f64 / total as f64).clamp(0.0, 1.0))
    }
}

/// Parameters a job is started with
///
/// The launch window is the window the job is later monitored against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobLaunch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Lot multiplier applied to every order
    pub lots: u32,
    /// Exchange region the job trades in
    pub location: String,
    /// Virtual capital for backtests and paper trading
    pub initial_funds_virtual: f64,
    /// Broker credentials, passed through untouched
    pub broker_details: Option<serde_json::Value>,
}

impl JobLaunch {
    pub const DEFAULT_LOCATION: &'static str = "India";
    pub const DEFAULT_INITIAL_FUNDS: f64 = 1e9;

    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            lots: 1,
            location: Self::DEFAULT_LOCATION.to_string(),
            initial_funds_virtual: Self::DEFAULT_INITIAL_FUNDS,
            broker_details: None,
        }
    }

    pub fn window(&self) -> JobWindow {
        JobWindow::new(self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_status_text_mapping() {
        assert_eq!(
            ExecutionStatus::from_status_text("STARTING"),
            ExecutionStatus::Starting
        );
        assert_eq!(
            ExecutionStatus::from_status_text(" started "),
            ExecutionStatus::Started
        );
        assert_eq!(
            ExecutionStatus::from_status_text("STOPPING"),
            ExecutionStatus::Stopping
        );
        assert_eq!(
            ExecutionStatus::from_status_text("Stopped"),
            ExecutionStatus::Stopped
        );
    }

    #[test]
    fn test_unrecognized_status_is_unknown_and_not_terminal() {
        for text in ["", "STOPPED_WITH_ERRORS", "PAUSED", "stop"] {
            let status = ExecutionStatus::from_status_text(text);
            assert_eq!(status, ExecutionStatus::Unknown, "text {:?}", text);
            assert_ne!(status, ExecutionStatus::Stopped);
            assert!(!status.is_terminal());
        }
    }

    #[test]
    fn test_only_stopped_is_terminal() {
        assert!(ExecutionStatus::Stopped.is_terminal());
        assert!(!ExecutionStatus::Starting.is_terminal());
        assert!(!ExecutionStatus::Started.is_terminal());
        assert!(!ExecutionStatus::Stopping.is_terminal());
    }

    #[test]
    fn test_status_ordering_follows_lifecycle() {
        assert!(ExecutionStatus::Starting < ExecutionStatus::Started);
        assert!(ExecutionStatus::Started < ExecutionStatus::Stopping);
        assert!(ExecutionStatus::Stopping < ExecutionStatus::Stopped);
    }

    #[test]
    fn test_trading_mode_wire_values_and_tags() {
        assert_eq!(TradingMode::RealTrading.wire_value(), 0);
        assert_eq!(TradingMode::PaperTrading.wire_value(), 1);
        assert_eq!(TradingMode::Backtesting.wire_value(), 2);

        for mode in [
            TradingMode::Backtesting,
            TradingMode::PaperTrading,
            TradingMode::RealTrading,
        ] {
            assert_eq!(TradingMode::from_log_tag(mode.log_tag()), Some(mode));
        }
        assert_eq!(TradingMode::from_log_tag("XX"), None);
    }

    #[test]
    fn test_launch_defaults_and_window() {
        let launch = JobLaunch::new(at(9, 0), at(17, 0));
        assert_eq!(launch.lots, 1);
        assert_eq!(launch.location, JobLaunch::DEFAULT_LOCATION);
        assert_eq!(launch.broker_details, None);
        assert_eq!(launch.window(), JobWindow::new(at(9, 0), at(17, 0)));
        assert_eq!(TradingMode::PaperTrading.wire_name(), "PAPERTRADING");
    }

    #[test]
    fn test_trading_mode_from_str() {
        assert_eq!("bt".parse::<TradingMode>(), Ok(TradingMode::Backtesting));
        assert_eq!("Paper".parse::<TradingMode>(), Ok(TradingMode::PaperTrading));
        assert_eq!("live".parse::<TradingMode>(), Ok(TradingMode::RealTrading));
        assert!("futures".parse::<TradingMode>().is_err());
    }

    #[test]
    fn test_job_handle_display() {
        let handle = JobHandle::new("strat-42", TradingMode::PaperTrading);
        assert_eq!(handle.job_key(), "strat-42");
        assert_eq!(handle.mode(), TradingMode::PaperTrading);
        assert_eq!(handle.to_string(), "strat-42 [PT]");
    }

    #[test]
    fn test_window_fraction() {
        let window = JobWindow::new(at(9, 0), at(10, 0));
        assert_eq!(window.fraction_at(at(9, 0)), Some(0.0));
        assert_eq!(window.fraction_at(at(9, 30)), Some(0.5));
        assert_eq!(window.fraction_at(at(10, 0)), Some(1.0));
        assert_eq!(window.fraction_at(at(8, 0)), Some(0.0));
        assert_eq!(window.fraction_at(at(11, 0)), Some(1.0));
    }

    #[test]
    fn test_window_fraction_unknown_without_end() {
        let window = JobWindow::open_ended(at(9, 0));
        assert!(!window.is_bounded());
        assert_eq!(window.fraction_at(at(9, 30)), None);
        assert_eq!(JobWindow::default().fraction_at(at(9, 30)), None);
    }

    #[test]
    fn test_window_validity() {
        assert!(JobWindow::new(at(9, 0), at(10, 0)).is_valid());
        assert!(!JobWindow::new(at(10, 0), at(9, 0)).is_valid());
        assert!(JobWindow::default().is_valid());
        assert_eq!(JobWindow::new(at(9, 0), at(9, 0)).fraction_at(at(9, 0)), None);
    }
}
