//! Macro for implementing Display and FromStr for label enums
//!
//! Report cells and log fields carry human-readable labels such as
//! `"Data Missing"`. The macro keeps the label table in one place and parses
//! it back case-insensitively.
//!
//! # Example
//!
//! ```rust
//! use altoro_domain::impl_label_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Outcome {
//!     Passed,
//!     NeedsReview,
//! }
//!
//! impl_label_conversions!(Outcome {
//!     Passed => "Passed",
//!     NeedsReview => "Needs Review",
//! });
//!
//! assert_eq!(Outcome::NeedsReview.to_string(), "Needs Review");
//! assert_eq!("needs review".parse::<Outcome>(), Ok(Outcome::NeedsReview));
//! ```

/// Implements Display and FromStr for enums with fixed text labels
///
/// - Display writes the label verbatim
/// - FromStr trims and compares case-insensitively
#[macro_export]
macro_rules! impl_label_conversions {
    ($enum_name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        impl $enum_name {
            /// The display label.
            pub fn label(&self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.label())
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let needle = s.trim();
                $(
                    if needle.eq_ignore_ascii_case($label) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(format!("Invalid {}: {}", stringify!($enum_name), s))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        FlashingAmber,
    }

    impl_label_conversions!(Light {
        Green => "Green",
        FlashingAmber => "Flashing Amber",
    });

    #[test]
    fn test_display_uses_label() {
        assert_eq!(Light::FlashingAmber.to_string(), "Flashing Amber");
        assert_eq!(Light::Green.label(), "Green");
    }

    #[test]
    fn test_fromstr_ignores_case_and_padding() {
        assert_eq!(Light::from_str("  flashing AMBER "), Ok(Light::FlashingAmber));
        assert_eq!(Light::from_str("GREEN"), Ok(Light::Green));
    }

    #[test]
    fn test_fromstr_rejects_unknown() {
        let err = Light::from_str("red").unwrap_err();
        assert_eq!(err, "Invalid Light: red");
    }
}
