use std::sync::Arc;

use super::{Error, Vehicle};
use crate::BaseFeeData;

pub struct RateTable {
    store: Arc<dyn BaseFeeData>,
}

impl RateTable {
    pub fn new(store: Arc<dyn BaseFeeData>) -> Self {
        Self { store }
    }

    /// Base rate for `vehicle` in `city`. The city is matched case-insensitively;
    /// a vehicle outside the known set is charged nothing here.
    pub async fn base_fee(&self, city: &str, vehicle: &str) -> Result<f64, Error> {
        let city = city.to_lowercase();
        let row = self
            .store
            .find_base_fee(&city)
            .await?
            .ok_or_else(|| Error::CityNotFound(city.clone()))?;

        Ok(vehicle
            .parse::<Vehicle>()
            .map(|v| row.fee_for(v))
            .unwrap_or(0.0))
    }
}
