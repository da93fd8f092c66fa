//! Project Id Synthesis
//!
//! Ids are deterministic so the same session asking about the same place
//! lands on the same project. Coordinates are rounded to a configurable
//! number of decimals before naming; that precision is the near-duplicate
//! policy.

use sha2::{Digest, Sha256};
use windsite_core::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocationNaming {
    precision: u32,
}

impl LocationNaming {
    pub fn new(precision: u32) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    /// Location-derived id, scoped to the session, e.g.
    /// `site-35.07n-101.40w-1a2b3c4d`.
    pub fn project_id(&self, session_id: &str, location: &Location) -> String {
        let (lat, ns) = self.hemisphere(location.lat, 'n', 's');
        let (lon, ew) = self.hemisphere(location.lon, 'e', 'w');
        format!(
            "site-{}{}-{}{}-{}",
            lat,
            ns,
            lon,
            ew,
            session_tag(session_id)
        )
    }

    /// Human-readable name, e.g. `Wind Site 35.07°N, 101.40°W`.
    pub fn display_name(&self, location: &Location) -> String {
        let (lat, ns) = self.hemisphere(location.lat, 'N', 'S');
        let (lon, ew) = self.hemisphere(location.lon, 'E', 'W');
        format!("Wind Site {}°{}, {}°{}", lat, ns, lon, ew)
    }

    /// Rounded magnitude and hemisphere letter. The hemisphere follows the
    /// rounded value so `-0.001` and `0.001` name the same site.
    fn hemisphere(&self, value: f64, positive: char, negative: char) -> (String, char) {
        let scale = 10f64.powi(self.precision as i32);
        let rounded = (value * scale).round() / scale;
        let letter = if rounded < 0.0 { negative } else { positive };
        (format!("{:.*}", self.precision as usize, rounded.abs()), letter)
    }
}

/// Counter-derived id for sessions that never mentioned a location.
pub fn session_project_id(session_id: &str, ordinal: u64) -> String {
    format!("project-{}-{}", session_tag(session_id), ordinal)
}

pub fn session_display_name(ordinal: u64) -> String {
    format!("Wind Project {}", ordinal)
}

/// First eight hex digits of the session id's SHA-256.
fn session_tag(session_id: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(session_id.as_bytes()));
    digest[..8].to_string()
}
