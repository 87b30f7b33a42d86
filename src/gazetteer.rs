//! Built-in gazetteer of common place names
//!
//! A fixed name-to-coordinate table consulted before any network call.
//! Lookups are exact-match only (callers normalize first); the table is the
//! zero-latency, zero-cost fallback that keeps the service usable without a
//! geocoding credential.

use std::collections::HashMap;
use std::sync::LazyLock;

static LOCAL_LOCATIONS: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    HashMap::from([
        ("india", (20.5937, 78.9629)),
        ("usa", (37.0902, -95.7129)),
        ("uk", (55.3781, -3.4360)),
        ("tamil nadu", (11.1271, 78.6569)),
        ("tamilnadu", (11.1271, 78.6569)),
        ("delhi", (28.6139, 77.2090)),
        ("london", (51.5074, -0.1278)),
        ("new york", (40.7128, -74.0060)),
        ("beijing", (39.9042, 116.4074)),
        ("tokyo", (35.6762, 139.6503)),
        ("mumbai", (19.0760, 72.8777)),
        ("paris", (48.8566, 2.3522)),
        ("berlin", (52.5200, 13.4050)),
        ("chennai", (13.0827, 80.2707)),
        ("bangalore", (12.9716, 77.5946)),
    ])
});

/// Look up a normalized (trimmed, lowercased) place name.
///
/// Returns `(latitude, longitude)` on an exact match. No fuzzy matching.
#[must_use]
pub fn lookup(normalized: &str) -> Option<(f64, f64)> {
    LOCAL_LOCATIONS.get(normalized).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_entry() {
        assert_eq!(lookup("chennai"), Some((13.0827, 80.2707)));
        assert_eq!(lookup("new york"), Some((40.7128, -74.0060)));
    }

    #[test]
    fn test_spelling_variant() {
        assert_eq!(lookup("tamil nadu"), lookup("tamilnadu"));
    }

    #[test]
    fn test_exact_match_only() {
        // Callers are responsible for normalization
        assert_eq!(lookup("Chennai"), None);
        assert_eq!(lookup(" chennai"), None);
        assert_eq!(lookup("chenai"), None);
    }
}
