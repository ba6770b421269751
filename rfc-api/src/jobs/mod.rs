//! Background jobs

pub mod status_refresh;

pub use status_refresh::{
    run_pass, status_refresh_task, StatusRefreshMetrics, StatusRefreshSnapshot,
};
