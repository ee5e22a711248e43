// wweb Engine: Phone Normalizer
//
// raw MSISDN (national or international form) -> wire address
// "<country code><national number>@c.us".
//
// Numbers that parse but fail the region's numbering rules are still
// formatted (best effort) and flagged, so callers can warn and proceed.

use crate::atoms::constants::WIRE_USER_SUFFIX;
use crate::atoms::error::{EngineError, EngineResult};
use phonenumber::{country, Mode};
use std::fmt;

/// Protocol recipient identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WireAddress(String);

impl WireAddress {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for WireAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for WireAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedNumber {
    pub address: WireAddress,
    /// False when the number does not satisfy the hint region's rules.
    pub valid_for_region: bool,
}

#[derive(Debug, Clone)]
pub struct PhoneNormalizer {
    region: country::Id,
}

impl PhoneNormalizer {
    /// `region` is an ISO 3166-1 alpha-2 code such as "ID".
    pub fn new(region: &str) -> EngineResult<Self> {
        let region = region
            .trim()
            .to_ascii_uppercase()
            .parse::<country::Id>()
            .map_err(|_| EngineError::Config(format!("Unknown region {:?}", region)))?;
        Ok(PhoneNormalizer { region })
    }

    pub fn normalize(&self, raw: &str) -> EngineResult<NormalizedNumber> {
        let trimmed = raw.trim();

        // Already a wire address (e.g. copied from an inbound message).
        if trimmed.contains('@') {
            return Ok(NormalizedNumber {
                address: WireAddress(trimmed.to_string()),
                valid_for_region: true,
            });
        }

        let number = phonenumber::parse(Some(self.region.clone()), trimmed)
            .map_err(|e| EngineError::invalid_number(trimmed, e.to_string()))?;
        let valid_for_region = phonenumber::is_valid(&number);
        let e164 = number.format().mode(Mode::E164).to_string();

        Ok(NormalizedNumber {
            address: to_wire_address(&e164),
            valid_for_region,
        })
    }
}

/// `normalize(raw, region_hint)` without keeping a normalizer around.
pub fn normalize(raw: &str, region: &str) -> EngineResult<NormalizedNumber> {
    PhoneNormalizer::new(region)?.normalize(raw)
}

/// "+6281234567890" -> "6281234567890@c.us"
fn to_wire_address(e164: &str) -> WireAddress {
    WireAddress(format!("{}{}", e164.trim_start_matches('+'), WIRE_USER_SUFFIX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indonesian_local_number() {
        let n = normalize("81234567890", "ID").unwrap();
        let addr = n.address.as_str();
        assert!(addr.ends_with("@c.us"));
        assert!(addr.starts_with("62"));
        assert!(!addr.starts_with('+'));
        assert_eq!(addr, "6281234567890@c.us");
    }

    #[test]
    fn trunk_prefix_is_dropped() {
        let n = normalize("081234567890", "ID").unwrap();
        assert_eq!(n.address.as_str(), "6281234567890@c.us");
    }

    #[test]
    fn international_form_ignores_hint() {
        let n = normalize("+1 650-253-0000", "ID").unwrap();
        assert_eq!(n.address.as_str(), "16502530000@c.us");
        assert!(n.valid_for_region);
    }

    #[test]
    fn wire_address_passes_through() {
        let n = normalize("628111@c.us", "ID").unwrap();
        assert_eq!(n.address.as_str(), "628111@c.us");
    }

    #[test]
    fn garbage_is_invalid_number() {
        let err = normalize("not a number", "ID").unwrap_err();
        assert!(matches!(err, EngineError::InvalidNumber { .. }));
    }

    #[test]
    fn implausible_number_still_formats() {
        let n = normalize("12", "ID");
        // Either rejected outright or formatted and flagged; never silently valid.
        if let Ok(n) = n {
            assert!(!n.valid_for_region);
            assert!(n.address.as_str().ends_with("@c.us"));
        }
    }

    #[test]
    fn unknown_region_is_config_error() {
        assert!(matches!(PhoneNormalizer::new("ZZZ"), Err(EngineError::Config(_))));
    }
}
