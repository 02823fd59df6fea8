//! View-model derivation
//!
//! Pure, synchronous functions over the latest snapshots:
//! - Reconciliation of full and summary snapshots into one metrics view
//! - Rolling chart series synthesis
//! - Normalization of dual-shape incident and recommendation records

mod merge;
mod normalize;
mod series;

pub use merge::{merge, savings_percent};
pub use normalize::{
    action_text, categorize, issue_title, map_recommendation_severity, map_severity,
    normalize_incident, normalize_incidents, normalize_recommendation,
    normalize_recommendations, parse_timestamp, NOT_AVAILABLE,
};
pub use series::{build_series, SyntheticProfile, POINT_INTERVAL_SECS, SERIES_LEN};
