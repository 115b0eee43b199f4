//! Business rules for the derived fact columns.
//!
//! Everything here is a pure per-record function; the DataFusion UDFs in
//! [`crate::processor::udf`] apply them column-wise.

use thiserror::Error;

/// Offer flag column and the discount percentage it grants, in column order.
pub const OFFER_TIERS: [(&str, i32); 5] = [
    ("offer_1", 5),
    ("offer_2", 10),
    ("offer_3", 15),
    ("offer_4", 20),
    ("offer_5", 25),
];

pub const ADDRESS_DELIMITER: char = '/';

/// Highest tier among the active offers, 0 when none is active.
///
/// `offers` is positional against [`OFFER_TIERS`]; a missing (NULL) flag
/// counts as inactive.
pub fn discount_for(offers: &[Option<bool>]) -> i32 {
    OFFER_TIERS
        .iter()
        .zip(offers)
        .filter(|(_, active)| active.unwrap_or(false))
        .map(|((_, tier), _)| *tier)
        .max()
        .unwrap_or(0)
}

pub fn total_price(units: i32, unit_price: f64, discount: i32) -> f64 {
    f64::from(units) * unit_price * (1.0 - f64::from(discount) / 100.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPart {
    Street,
    City,
    State,
    PostalCode,
}

impl AddressPart {
    pub const ALL: [AddressPart; 4] = [
        AddressPart::Street,
        AddressPart::City,
        AddressPart::State,
        AddressPart::PostalCode,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            AddressPart::Street => "street",
            AddressPart::City => "city",
            AddressPart::State => "state",
            AddressPart::PostalCode => "postal_code",
        }
    }

    pub fn udf_name(&self) -> &'static str {
        match self {
            AddressPart::Street => "address_street",
            AddressPart::City => "address_city",
            AddressPart::State => "address_state",
            AddressPart::PostalCode => "address_postal_code",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

impl ShippingAddress {
    pub fn part(&self, part: AddressPart) -> &str {
        match part {
            AddressPart::Street => &self.street,
            AddressPart::City => &self.city,
            AddressPart::State => &self.state,
            AddressPart::PostalCode => &self.postal_code,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    #[error("expected 4 '/'-separated segments, found {found}")]
    SegmentCount { found: usize },
}

/// Splits `street/city/state/postal_code`. Any other segment count is rejected.
pub fn decompose_address(raw: &str) -> Result<ShippingAddress, AddressError> {
    let segments: Vec<&str> = raw.split(ADDRESS_DELIMITER).collect();
    match segments.as_slice() {
        [street, city, state, postal_code] => Ok(ShippingAddress {
            street: street.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: postal_code.to_string(),
        }),
        _ => Err(AddressError::SegmentCount {
            found: segments.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(mask: u8) -> [Option<bool>; 5] {
        std::array::from_fn(|i| Some(mask & (1 << i) != 0))
    }

    #[test]
    fn test_no_active_offer_means_no_discount() {
        assert_eq!(discount_for(&flags(0)), 0);
        assert_eq!(discount_for(&[None; 5]), 0);
    }

    #[test]
    fn test_single_offer_tiers() {
        assert_eq!(discount_for(&flags(0b00001)), 5);
        assert_eq!(discount_for(&flags(0b00010)), 10);
        assert_eq!(discount_for(&flags(0b00100)), 15);
        assert_eq!(discount_for(&flags(0b01000)), 20);
        assert_eq!(discount_for(&flags(0b10000)), 25);
    }

    #[test]
    fn test_highest_active_tier_wins() {
        // offer_1 and offer_3 active
        assert_eq!(discount_for(&flags(0b00101)), 15);
        // offer_5 listed last still beats offer_2
        assert_eq!(discount_for(&flags(0b10010)), 25);
        assert_eq!(discount_for(&[Some(true), None, Some(false), Some(true), None]), 20);
    }

    #[test]
    fn test_every_flag_combination_yields_max_tier() {
        for mask in 0u8..32 {
            let offers = flags(mask);
            let expected = OFFER_TIERS
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, (_, tier))| *tier)
                .max()
                .unwrap_or(0);
            let discount = discount_for(&offers);
            assert_eq!(discount, expected, "mask {:05b}", mask);
            assert!([0, 5, 10, 15, 20, 25].contains(&discount));
        }
    }

    #[test]
    fn test_total_price_applies_discount() {
        assert_eq!(total_price(2, 50.0, 0), 100.0);
        assert!((total_price(3, 10.0, 15) - 25.5).abs() < 1e-9);
        assert!((total_price(4, 12.5, 25) - 37.5).abs() < 1e-9);
        assert_eq!(total_price(0, 99.0, 10), 0.0);
    }

    #[test]
    fn test_total_price_non_negative_for_non_negative_inputs() {
        for units in [0, 1, 7, 1000] {
            for price in [0.0, 0.01, 3.75, 1999.99] {
                for (_, tier) in OFFER_TIERS {
                    assert!(total_price(units, price, tier) >= 0.0);
                }
            }
        }
    }

    #[test]
    fn test_decompose_address() {
        let address = decompose_address("123 Main St/Springfield/IL/62704").unwrap();
        assert_eq!(address.street, "123 Main St");
        assert_eq!(address.city, "Springfield");
        assert_eq!(address.state, "IL");
        assert_eq!(address.postal_code, "62704");
        assert_eq!(address.part(AddressPart::PostalCode), "62704");
    }

    #[test]
    fn test_decompose_keeps_empty_segments() {
        let address = decompose_address("/Springfield/IL/").unwrap();
        assert_eq!(address.street, "");
        assert_eq!(address.postal_code, "");
    }

    #[test]
    fn test_decompose_rejects_wrong_segment_count() {
        assert_eq!(
            decompose_address("123 Main St/Springfield"),
            Err(AddressError::SegmentCount { found: 2 })
        );
        assert_eq!(
            decompose_address("a/b/c/d/e"),
            Err(AddressError::SegmentCount { found: 5 })
        );
        assert!(decompose_address("").is_err());
    }
}
