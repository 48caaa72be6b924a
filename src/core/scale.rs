use crate::error::{TimelineError, TimelineResult};

/// Affine map between a numeric domain and `[0, width]` pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> TimelineResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(TimelineError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    /// Maps a domain value to pixels. Non-finite input propagates as non-finite output.
    #[must_use]
    pub fn domain_to_pixel(self, value: f64, width: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        (value - self.domain_start) / span * width
    }

    #[must_use]
    pub fn pixel_to_domain(self, pixel: f64, width: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        self.domain_start + pixel / width * span
    }
}
