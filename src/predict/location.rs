#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Location {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

impl Location {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Option<Self> {
        let lat_ok = (-90.0..=90.0).contains(&latitude_deg);
        let lon_ok = (-180.0..=180.0).contains(&longitude_deg);
        (lat_ok && lon_ok).then_some(Self {
            latitude_deg,
            longitude_deg,
        })
    }
}
