//! CSV / JSON rendering of report rows

use serde::Serialize;
use shared::analytics::EarningRow;
use shared::models::{Booking, ExportFormat, Payment, Review};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv encoding failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("json encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("buffer flush failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Rows of one report, ready to render
pub enum ExportRows {
    Payments(Vec<Payment>),
    Earnings(Vec<EarningRow>),
    Reviews(Vec<Review>),
    Bookings(Vec<Booking>),
}

impl ExportRows {
    pub fn len(&self) -> usize {
        match self {
            Self::Payments(r) => r.len(),
            Self::Earnings(r) => r.len(),
            Self::Reviews(r) => r.len(),
            Self::Bookings(r) => r.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
        match self {
            Self::Payments(r) => render_rows(r, format),
            Self::Earnings(r) => render_rows(r, format),
            Self::Reviews(r) => render_rows(r, format),
            Self::Bookings(r) => render_rows(r, format),
        }
    }
}

fn render_rows<T: Serialize>(rows: &[T], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_vec(rows)?),
        ExportFormat::Csv => {
            let mut writer = csv::Writer::from_writer(Vec::new());
            for row in rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
            writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
        }
    }
}
