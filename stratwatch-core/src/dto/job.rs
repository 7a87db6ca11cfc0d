//! Job DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::job::{JobLaunch, TradingMode};

/// Timestamp layout of launch windows: naive UTC, ISO 8601
const WINDOW_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Request for the server-side key of a strategy in a given mode
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyKeyRequest {
    pub strategy_id: String,
    pub trading_type: u8,
}

impl StrategyKeyRequest {
    pub fn new(strategy_code: &str, mode: TradingMode) -> Self {
        Self {
            strategy_id: strategy_code.to_string(),
            trading_type: mode.wire_value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyKeyResponse {
    pub key: String,
}

/// Job status as returned by the status endpoint; `message` holds the raw status text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StopRecord {
    pub status: u8,
}

/// Request that asks the service to stop a running job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopJobRequest {
    pub method: String,
    pub new_val: u8,
    pub key: String,
    pub record: StopRecord,
    pub data_index: String,
}

impl StopJobRequest {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            method: "update".to_string(),
            new_val: 0,
            key: key.into(),
            record: StopRecord { status: 2 },
            data_index: "executeConfig".to_string(),
        }
    }
}

/// Execution settings sent when starting a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteConfig {
    /// Historical range, for backtests and paper trading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub back_data_date: Option<[String; 2]>,
    /// Trading session range, for real trading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_data_time: Option<[String; 2]>,
    pub is_live_data_test_mode: bool,
    pub customizations_quantity: u32,
    pub broking_details: Option<serde_json::Value>,
    pub mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_funds_virtual: Option<f64>,
}

impl ExecuteConfig {
    pub fn new(mode: TradingMode, launch: &JobLaunch) -> Self {
        let range = [window_bound(launch.start), window_bound(launch.end)];
        let live = mode == TradingMode::RealTrading;

        Self {
            back_data_date: (!live).then(|| range.clone()),
            live_data_time: live.then_some(range),
            is_live_data_test_mode: live,
            customizations_quantity: launch.lots,
            broking_details: launch.broker_details.clone(),
            mode: mode.wire_name().to_string(),
            initial_funds_virtual: (!live).then_some(launch.initial_funds_virtual),
        }
    }
}

fn window_bound(at: DateTime<Utc>) -> String {
    at.naive_utc().format(WINDOW_FORMAT).to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecord {
    pub status: u8,
    pub lots: u32,
    pub execute_config: ExecuteConfig,
}

/// Request that asks the service to start a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobRequest {
    pub method: String,
    pub new_val: u8,
    pub key: String,
    pub record: StartRecord,
    pub data_index: String,
}

impl StartJobRequest {
    pub fn new(key: impl Into<String>, mode: TradingMode, launch: &JobLaunch) -> Self {
        Self {
            method: "update".to_string(),
            new_val: 1,
            key: key.into(),
            record: StartRecord {
                status: 0,
                lots: launch.lots,
                execute_config: ExecuteConfig::new(mode, launch),
            },
            data_index: "executeConfig".to_string(),
        }
    }
}

/// Query string of a start request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartJobQuery {
    pub is_python_build: bool,
    pub is_live: bool,
    pub location: String,
}

impl StartJobQuery {
    pub fn new(mode: TradingMode, launch: &JobLaunch) -> Self {
        Self {
            is_python_build: true,
            is_live: mode == TradingMode::RealTrading,
            location: launch.location.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn launch() -> JobLaunch {
        let mut launch = JobLaunch::new(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 15, 30, 0).unwrap(),
        );
        launch.lots = 10;
        launch
    }

    #[test]
    fn test_key_request_shape() {
        let req = StrategyKeyRequest::new("strat-1", TradingMode::PaperTrading);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"strategyId": "strat-1", "tradingType": 1})
        );
    }

    #[test]
    fn test_stop_request_shape() {
        let req = StopJobRequest::new("k-1");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "method": "update",
                "newVal": 0,
                "key": "k-1",
                "record": {"status": 2},
                "dataIndex": "executeConfig"
            })
        );
    }

    #[test]
    fn test_backtest_start_request_shape() {
        let req = StartJobRequest::new("k-1", TradingMode::Backtesting, &launch());
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "method": "update",
                "newVal": 1,
                "key": "k-1",
                "record": {
                    "status": 0,
                    "lots": 10,
                    "executeConfig": {
                        "backDataDate": ["2024-03-01T09:15:00", "2024-03-04T15:30:00"],
                        "isLiveDataTestMode": false,
                        "customizationsQuantity": 10,
                        "brokingDetails": null,
                        "mode": "BACKTESTING",
                        "initialFundsVirtual": 1e9
                    }
                },
                "dataIndex": "executeConfig"
            })
        );
    }

    #[test]
    fn test_real_trading_start_request_uses_live_window() {
        let req = StartJobRequest::new("k-1", TradingMode::RealTrading, &launch());
        assert_eq!(
            serde_json::to_value(&req.record.execute_config).unwrap(),
            json!({
                "liveDataTime": ["2024-03-01T09:15:00", "2024-03-04T15:30:00"],
                "isLiveDataTestMode": true,
                "customizationsQuantity": 10,
                "brokingDetails": null,
                "mode": "REALTRADING"
            })
        );

        let query = StartJobQuery::new(TradingMode::RealTrading, &launch());
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({"isPythonBuild": true, "isLive": true, "location": "India"})
        );
    }
}
