//! Input validation for token creation and freemint.

use crate::error::InputError;
use crate::MAX_SYMBOL_LEN;

/// Validated `createToken` arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenDraft {
    name: String,
    symbol: String,
}

impl TokenDraft {
    /// Trim and check a name/symbol pair.
    ///
    /// The symbol is submitted as typed; only its display form is uppercased.
    pub fn new(name: &str, symbol: &str) -> Result<Self, InputError> {
        let name = name.trim();
        let symbol = symbol.trim();

        if name.is_empty() {
            return Err(InputError::EmptyName);
        }
        if symbol.is_empty() {
            return Err(InputError::EmptySymbol);
        }
        let len = symbol.chars().count();
        if len > MAX_SYMBOL_LEN {
            return Err(InputError::SymbolTooLong {
                len,
                max: MAX_SYMBOL_LEN,
            });
        }

        Ok(Self {
            name: name.to_string(),
            symbol: symbol.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn display_symbol(&self) -> String {
        self.symbol.to_uppercase()
    }
}

/// Parse a freemint amount: ASCII digits only, fitting the token's 64-bit
/// confidential amount type.
pub fn parse_mint_amount(input: &str) -> Result<u64, InputError> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(InputError::InvalidAmount(input.to_string()));
    }
    input
        .parse::<u64>()
        .map_err(|_| InputError::InvalidAmount(input.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn mint_amount_examples() {
        assert_eq!(parse_mint_amount("0"), Ok(0));
        assert_eq!(parse_mint_amount("5000"), Ok(5000));
        assert_eq!(parse_mint_amount("007"), Ok(7));
        for bad in ["", "12.5", "-3", " 5", "5 ", "1e3", "+1", "abc"] {
            assert!(parse_mint_amount(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn mint_amount_beyond_u64_is_rejected() {
        assert!(parse_mint_amount("18446744073709551615").is_ok());
        assert!(parse_mint_amount("18446744073709551616").is_err());
    }

    #[test]
    fn draft_trims_and_keeps_symbol_case() {
        let draft = TokenDraft::new("  Prime USDT ", " pUSDT ").unwrap();
        assert_eq!(draft.name(), "Prime USDT");
        assert_eq!(draft.symbol(), "pUSDT");
        assert_eq!(draft.display_symbol(), "PUSDT");
    }

    #[test]
    fn draft_rejects_blank_fields_and_long_symbols() {
        assert_eq!(TokenDraft::new("   ", "PUSD"), Err(InputError::EmptyName));
        assert_eq!(TokenDraft::new("Prime", "\t"), Err(InputError::EmptySymbol));
        assert_eq!(
            TokenDraft::new("Prime", "ABCDEFGHI"),
            Err(InputError::SymbolTooLong { len: 9, max: 8 })
        );
        assert!(TokenDraft::new("Prime", "ABCDEFGH").is_ok());
    }

    proptest! {
        #[test]
        fn any_u64_in_decimal_is_accepted(n in any::<u64>()) {
            prop_assert_eq!(parse_mint_amount(&n.to_string()), Ok(n));
        }

        #[test]
        fn strings_with_a_non_digit_are_rejected(
            prefix in "[0-9]{0,5}",
            bad in "[^0-9]",
            suffix in "[0-9]{0,5}",
        ) {
            let input = format!("{}{}{}", prefix, bad, suffix);
            prop_assert!(parse_mint_amount(&input).is_err());
        }

        #[test]
        fn non_blank_pairs_within_limit_are_valid(
            name in "[A-Za-z][A-Za-z0-9 ]{0,20}",
            symbol in "[A-Za-z]{1,8}",
        ) {
            let draft = TokenDraft::new(&name, &symbol).unwrap();
            prop_assert_eq!(draft.name(), name.trim());
            prop_assert_eq!(draft.symbol(), symbol.as_str());
        }
    }
}
