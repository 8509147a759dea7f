use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Half-width of the box, in degrees, that counts a report as nearby (~1 km)
pub const NEARBY_RADIUS_DEG: f64 = 0.01;

/// Flood sighting submitted by a resident
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReport {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub message: Option<String>,
}

impl NewReport {
    pub fn validate(&self) -> Result<()> {
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::Validation(format!("lat out of range: {}", self.lat)));
        }
        if !self.lon.is_finite() || !(-180.0..=180.0).contains(&self.lon) {
            return Err(AppError::Validation(format!("lon out of range: {}", self.lon)));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserReport {
    pub lat: f64,
    pub lon: f64,
    pub message: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// In-memory log of user reports; cleared on restart
#[derive(Debug, Default)]
pub struct ReportBook {
    reports: RwLock<Vec<UserReport>>,
}

impl ReportBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report and return the running total
    pub fn submit(&self, report: NewReport) -> Result<usize> {
        report.validate()?;
        let message = report
            .message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty());

        let mut reports = self.reports.write();
        reports.push(UserReport {
            lat: report.lat,
            lon: report.lon,
            message,
            received_at: Utc::now(),
        });
        Ok(reports.len())
    }

    pub fn len(&self) -> usize {
        self.reports.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports strictly within [`NEARBY_RADIUS_DEG`] of the point on both axes
    pub fn nearby(&self, lat: f64, lon: f64) -> usize {
        self.reports
            .read()
            .iter()
            .filter(|r| {
                (r.lat - lat).abs() < NEARBY_RADIUS_DEG && (r.lon - lon).abs() < NEARBY_RADIUS_DEG
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(lat: f64, lon: f64) -> NewReport {
        NewReport {
            lat,
            lon,
            message: None,
        }
    }

    #[test]
    fn test_submit_counts_running_total() {
        let book = ReportBook::new();
        assert!(book.is_empty());
        assert_eq!(book.submit(report(-6.2, 106.8)).unwrap(), 1);
        assert_eq!(book.submit(report(-6.3, 106.9)).unwrap(), 2);
        assert_eq!(book.len(), 2);
    }

    #[test]
    fn test_nearby_uses_box_radius() {
        let book = ReportBook::new();
        book.submit(report(-6.200, 106.800)).unwrap();
        book.submit(report(-6.205, 106.809)).unwrap();
        book.submit(report(-6.300, 106.800)).unwrap();

        assert_eq!(book.nearby(-6.2, 106.8), 2);
        assert_eq!(book.nearby(-6.3, 106.8), 1);
        assert_eq!(book.nearby(0.0, 0.0), 0);
    }

    #[test]
    fn test_invalid_coordinates_rejected() {
        let book = ReportBook::new();
        for (lat, lon) in [(91.0, 0.0), (0.0, -181.0), (f64::NAN, 0.0)] {
            assert!(matches!(
                book.submit(report(lat, lon)),
                Err(AppError::Validation(_))
            ));
        }
        assert!(book.is_empty());
    }

    #[test]
    fn test_blank_message_dropped() {
        let book = ReportBook::new();
        book.submit(NewReport {
            lat: 1.0,
            lon: 1.0,
            message: Some("   ".to_string()),
        })
        .unwrap();
        assert!(book.reports.read()[0].message.is_none());
    }
}
