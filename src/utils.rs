use std::collections::HashMap;

use regex::Regex;

/// Cached coordinates match on exact value, so two geocode responses for
/// the same address must produce the same key. Four decimal places
/// (~11 m) is plenty for a neighborhood-radius search.
pub fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Parses the provider's structured `adr` address markup into a
/// class -> text map. The markup is a flat list of
/// `<span class="...">value</span>` fragments, not general HTML.
pub fn parse_adr_spans(adr_address: &str) -> HashMap<String, String> {
    let span = Regex::new(r#"<span class="([a-z-]+)">([^<]*)</span>"#).unwrap();

    span.captures_iter(adr_address)
        .map(|capture| (capture[1].to_string(), capture[2].trim().to_string()))
        .collect()
}

/// Pulls the `locality` field out of `adr` markup. A missing or empty
/// tag yields `None`, never an error.
pub fn extract_locality(adr_address: Option<&str>) -> Option<String> {
    let spans = parse_adr_spans(adr_address?);

    spans
        .get("locality")
        .filter(|value| !value.is_empty())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::{extract_locality, parse_adr_spans, round_coordinate};

    const ADR: &str = r#"<span class="street-address">221B Baker St</span>, <span class="locality">London</span> <span class="postal-code">NW1 6XE</span>, <span class="country-name">UK</span>"#;

    #[test]
    fn test_parses_all_spans() {
        let spans = parse_adr_spans(ADR);

        assert_eq!(spans.get("street-address").unwrap(), "221B Baker St");
        assert_eq!(spans.get("locality").unwrap(), "London");
        assert_eq!(spans.get("postal-code").unwrap(), "NW1 6XE");
        assert_eq!(spans.get("country-name").unwrap(), "UK");
    }

    #[test]
    fn test_locality_extracted() {
        assert_eq!(extract_locality(Some(ADR)), Some("London".to_string()));
    }

    #[test]
    fn test_missing_locality_is_none() {
        let adr = r#"<span class="street-address">1 Main St</span>"#;

        assert_eq!(extract_locality(Some(adr)), None);
        assert_eq!(extract_locality(None), None);
        assert_eq!(extract_locality(Some("")), None);
    }

    #[test]
    fn test_empty_locality_is_none() {
        let adr = r#"<span class="locality"></span>"#;

        assert_eq!(extract_locality(Some(adr)), None);
    }

    #[test]
    fn test_rounding_is_stable() {
        assert_eq!(round_coordinate(51.52376283), 51.5238);
        assert_eq!(round_coordinate(-0.15849931), -0.1585);
        assert_eq!(round_coordinate(51.5238), round_coordinate(51.52380001));
        assert_eq!(round_coordinate(0.0), 0.0);
    }
}
