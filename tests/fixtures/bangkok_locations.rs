//! Bangkok-area delivery locations for realistic fixtures.
//!
//! Approximate coordinates of well-known places, spread over the city so
//! clustering has real geography to work with.

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Cold-chain warehouse used as the depot.
pub const DEPOT: Location = Location::new("Bang Sue Cold Storage", 13.8027, 100.5384);

// ============================================================================
// North (Chatuchak / Don Mueang)
// ============================================================================

pub const NORTH: &[Location] = &[
    Location::new("Chatuchak Clinic", 13.7999, 100.5506),
    Location::new("Lat Phrao Pharmacy", 13.8160, 100.5610),
    Location::new("Kasetsart Hospital", 13.8476, 100.5696),
    Location::new("Don Mueang Health Center", 13.9126, 100.6068),
    Location::new("Lak Si Clinic", 13.8870, 100.5790),
    Location::new("Bang Khen Pharmacy", 13.8730, 100.5960),
];

// ============================================================================
// Central (Silom / Sukhumvit)
// ============================================================================

pub const CENTRAL: &[Location] = &[
    Location::new("Silom Medical", 13.7278, 100.5241),
    Location::new("Chulalongkorn Hospital", 13.7325, 100.5357),
    Location::new("Asok Pharmacy", 13.7370, 100.5603),
    Location::new("Thong Lo Clinic", 13.7246, 100.5783),
    Location::new("Siam Drugstore", 13.7460, 100.5340),
    Location::new("Ratchathewi Clinic", 13.7590, 100.5340),
];

// ============================================================================
// East (Bang Na / Lat Krabang)
// ============================================================================

pub const EAST: &[Location] = &[
    Location::new("Bang Na Hospital", 13.6680, 100.6040),
    Location::new("Udom Suk Pharmacy", 13.6795, 100.6095),
    Location::new("Lat Krabang Clinic", 13.7230, 100.7590),
    Location::new("Suan Luang Clinic", 13.7260, 100.6480),
    Location::new("Prawet Health Center", 13.7170, 100.6860),
    Location::new("Bearing Pharmacy", 13.6620, 100.6130),
];

/// Every delivery location, north then central then east.
pub fn all_customers() -> Vec<Location> {
    NORTH
        .iter()
        .chain(CENTRAL)
        .chain(EAST)
        .cloned()
        .collect()
}
