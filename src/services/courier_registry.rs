use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::models::courier::Courier;

/// One auto-detection rule: a courier slug and the tracking-id format
/// it claims. Order matters; detection is first-match-wins, not
/// most-specific-wins.
#[derive(Debug, Clone)]
pub struct CourierPattern {
    pub slug: &'static str,
    pub regex: Regex,
}

/// The stock detection rules, in evaluation order.
pub static DEFAULT_PATTERNS: Lazy<Vec<CourierPattern>> = Lazy::new(|| {
    [
        ("ups", r"^1Z[0-9A-Z]{16}$"),
        ("fedex", r"^[0-9]{12,14}$"),
        ("dhl", r"^[0-9]{10,11}$"),
        ("usps", r"^[0-9]{20,22}$"),
        ("canada-post", r"^[A-Z0-9]{16}$"),
        ("royal-mail", r"^[A-Z0-9]{9,13}$"),
        ("dpd", r"^[0-9]{11,14}$"),
        ("hermes", r"^[0-9]{16}$"),
    ]
    .into_iter()
    .map(|(slug, pattern)| CourierPattern {
        slug,
        // The stock patterns are literals known to compile.
        regex: Regex::new(pattern).unwrap(),
    })
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// A tracking-format regex matched.
    Exact,
    /// Nothing matched; this is the first active courier by name and
    /// must be treated as a best guess.
    Fallback,
}

#[derive(Debug, Clone)]
pub struct CourierMatch<'a> {
    pub courier: &'a Courier,
    pub confidence: Confidence,
}

/// Matches tracking ids against an ordered pattern list. The list is
/// injected at construction so tests can substitute their own rules.
pub struct CourierRegistry {
    patterns: Vec<(String, Regex)>,
}

impl CourierRegistry {
    pub fn new(patterns: Vec<(String, Regex)>) -> Self {
        Self { patterns }
    }

    pub fn with_default_patterns() -> Self {
        Self::new(
            DEFAULT_PATTERNS
                .iter()
                .map(|p| (p.slug.to_string(), p.regex.clone()))
                .collect(),
        )
    }

    /// Build a registry from stored courier definitions, keeping their
    /// iteration order. Couriers whose stored format does not compile
    /// are left out of the pattern list but still eligible as fallback.
    pub fn from_couriers(couriers: &[Courier]) -> Self {
        Self::new(
            couriers
                .iter()
                .filter_map(|c| {
                    Regex::new(&c.tracking_format)
                        .ok()
                        .map(|re| (c.slug.clone(), re))
                })
                .collect(),
        )
    }

    /// Detect the courier for a tracking id: first pattern (in
    /// registration order) whose regex matches and whose courier is
    /// active. When no pattern matches, the first active courier by
    /// name is returned tagged `Fallback`; `None` means no courier is
    /// active at all.
    pub fn detect<'a>(&self, tracking_id: &str, couriers: &'a [Courier]) -> Option<CourierMatch<'a>> {
        for (slug, regex) in &self.patterns {
            if !regex.is_match(tracking_id) {
                continue;
            }
            if let Some(courier) = couriers.iter().find(|c| c.is_active && c.slug == *slug) {
                return Some(CourierMatch {
                    courier,
                    confidence: Confidence::Exact,
                });
            }
        }

        couriers
            .iter()
            .filter(|c| c.is_active)
            .min_by(|a, b| a.name.cmp(&b.name))
            .map(|courier| CourierMatch {
                courier,
                confidence: Confidence::Fallback,
            })
    }
}

/// Literal `{tracking_id}` substitution into the courier's URL
/// template. No encoding; callers validate the template at write time.
pub fn tracking_url(courier: &Courier, tracking_id: &str) -> String {
    courier.url_pattern.replace("{tracking_id}", tracking_id)
}

#[cfg(test)]
mod courier_registry_tests {
    use super::*;
    use std::collections::BTreeMap;

    fn courier(id: i64, slug: &str, name: &str, active: bool) -> Courier {
        Courier {
            id,
            slug: slug.to_string(),
            name: name.to_string(),
            url_pattern: format!("https://track.example.com/{slug}/{{tracking_id}}"),
            tracking_format: DEFAULT_PATTERNS
                .iter()
                .find(|p| p.slug == slug)
                .map(|p| p.regex.as_str().to_string())
                .unwrap_or_else(|| "^$".to_string()),
            settings: BTreeMap::new(),
            is_active: active,
        }
    }

    fn stock_couriers() -> Vec<Courier> {
        vec![
            courier(1, "ups", "UPS", true),
            courier(2, "fedex", "FedEx", true),
            courier(3, "dhl", "DHL", true),
            courier(4, "usps", "USPS", true),
        ]
    }

    #[test]
    fn test_ups_tracking_id_detects_ups() {
        let couriers = stock_couriers();
        let registry = CourierRegistry::with_default_patterns();

        let found = registry.detect("1Z999AA10123456784", &couriers).unwrap();
        assert_eq!(found.courier.slug, "ups");
        assert_eq!(found.confidence, Confidence::Exact);
    }

    #[test]
    fn test_list_order_breaks_ties_not_specificity() {
        // A 12-digit id matches both the FedEx and DPD formats; FedEx
        // comes first in the registration order.
        let mut couriers = stock_couriers();
        couriers.push(courier(7, "dpd", "DPD", true));
        let registry = CourierRegistry::with_default_patterns();

        let found = registry.detect("123456789012", &couriers).unwrap();
        assert_eq!(found.courier.slug, "fedex");
    }

    #[test]
    fn test_inactive_courier_is_passed_over() {
        let mut couriers = stock_couriers();
        couriers[0].is_active = false;
        let registry = CourierRegistry::with_default_patterns();

        let found = registry.detect("1Z999AA10123456784", &couriers).unwrap();
        assert_ne!(found.courier.slug, "ups");
        assert_eq!(found.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_unmatched_id_falls_back_to_first_active_by_name() {
        let couriers = stock_couriers();
        let registry = CourierRegistry::with_default_patterns();

        let found = registry.detect("???", &couriers).unwrap();
        assert_eq!(found.courier.name, "DHL");
        assert_eq!(found.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_no_active_couriers_yields_none() {
        let couriers: Vec<Courier> = stock_couriers()
            .into_iter()
            .map(|mut c| {
                c.is_active = false;
                c
            })
            .collect();
        let registry = CourierRegistry::with_default_patterns();

        assert!(registry.detect("1Z999AA10123456784", &couriers).is_none());
    }

    #[test]
    fn test_injected_patterns_override_the_stock_list() {
        let couriers = vec![courier(1, "ups", "UPS", true)];
        let registry = CourierRegistry::new(vec![(
            "ups".to_string(),
            Regex::new(r"^TEST[0-9]{4}$").unwrap(),
        )]);

        let found = registry.detect("TEST1234", &couriers).unwrap();
        assert_eq!(found.confidence, Confidence::Exact);
    }

    #[test]
    fn test_tracking_url_substitutes_literally() {
        let c = courier(1, "ups", "UPS", true);
        assert_eq!(
            tracking_url(&c, "1Z999AA10123456784"),
            "https://track.example.com/ups/1Z999AA10123456784"
        );
    }
}
