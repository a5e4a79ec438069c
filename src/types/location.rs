use serde::{Deserialize, Serialize};

/// The single location whose weather is loaded.
///
/// The text fields are copied verbatim into every staged row; `timezone` is the
/// IANA zone the API uses to cut days and to report sunrise and sunset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub city: String,
    pub zip: String,
    pub state: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone: String,
}

impl Location {
    /// Returns a description of the first problem found, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("latitude {} is outside [-90, 90]", self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("longitude {} is outside [-180, 180]", self.longitude));
        }
        for (name, value) in [
            ("city", &self.city),
            ("zip", &self.zip),
            ("state", &self.state),
            ("country", &self.country),
            ("timezone", &self.timezone),
        ] {
            if value.trim().is_empty() {
                return Err(format!("location {name} must not be empty"));
            }
        }
        Ok(())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            city: "Cleveland".to_string(),
            zip: "37312".to_string(),
            state: "TN".to_string(),
            country: "United States".to_string(),
            latitude: 35.1595,
            longitude: -84.8766,
            timezone: "America/New_York".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_is_valid() {
        let location = Location::default();
        assert!(location.validate().is_ok());
        assert_eq!((location.latitude, location.longitude), (35.1595, -84.8766));
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let location = Location {
            latitude: 95.0,
            ..Location::default()
        };
        assert!(location.validate().unwrap_err().contains("latitude"));

        let location = Location {
            longitude: -181.0,
            ..Location::default()
        };
        assert!(location.validate().unwrap_err().contains("longitude"));
    }

    #[test]
    fn test_empty_city() {
        let location = Location {
            city: "  ".to_string(),
            ..Location::default()
        };
        assert_eq!(
            location.validate().unwrap_err(),
            "location city must not be empty"
        );
    }
}
