//! Reader-facing views over instruments and observations.

use crate::model::instrument::Instrument;
use crate::model::observation::PriceObservation;
use serde::{Deserialize, Serialize};

/// Timestamp layout used when presenting a price to readers.
pub const SUMMARY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The latest price of a symbol, as served to readers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSummary {
    pub symbol: String,
    pub price: f64,
    pub time: String,
}

impl From<&PriceObservation> for PriceSummary {
    fn from(observation: &PriceObservation) -> Self {
        Self {
            symbol: observation.symbol().to_string(),
            price: observation.price(),
            time: observation
                .timestamp()
                .format(SUMMARY_TIME_FORMAT)
                .to_string(),
        }
    }
}

/// Symbol and display name of a configured instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentSummary {
    pub symbol: String,
    pub name: String,
}

impl From<&Instrument> for InstrumentSummary {
    fn from(instrument: &Instrument) -> Self {
        Self {
            symbol: instrument.symbol().to_string(),
            name: instrument.name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_price_summary_formats_time() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let summary = PriceSummary::from(&PriceObservation::new("CLD", ts, 1337.0));
        assert_eq!(summary.time, "2024-01-02 03:04:05");
        assert_eq!(summary.symbol, "CLD");
    }
}
