//! Dice expression grammar.
//!
//! Grammar: `[N]d[S][(+|-)M]`. A bare numeral is a flat modifier; a `d`
//! without a leading count rolls one die. The parser is a single-pass
//! lenient character scanner: characters it does not understand are skipped
//! and the output shape is always a well-formed [`DieExpression`]. Malformed
//! input therefore degrades instead of erroring.

/// Sign of the trailing modifier in a dice expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierSign {
    #[default]
    None,
    Plus,
    Minus,
}

/// Parsed, immutable form of a dice expression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DieExpression {
    /// Number of dice to roll. Zero for flat-modifier expressions.
    pub count: u32,

    /// Die size; `0` marks a flat modifier with no die at all.
    pub sides: u32,

    /// Sign of the modifier term.
    pub sign: ModifierSign,

    /// Magnitude of the modifier term.
    pub modifier_value: i64,
}

impl DieExpression {
    /// Signed modifier applied after summing kept die values.
    #[must_use]
    pub const fn modifier(&self) -> i64 {
        match self.sign {
            ModifierSign::Minus => -self.modifier_value,
            ModifierSign::None | ModifierSign::Plus => self.modifier_value,
        }
    }

    /// True when the expression carries no die, only a flat value.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.sides == 0
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Initial,
    DieType,
    Modifier,
}

/// Parse a dice expression.
///
/// `"2d6+2"`, `"d20"`, `"1d8-1"`, and bare numerals like `"5"` all parse;
/// anything unrecognized inside the string is skipped. A string with no `d`
/// and no explicit `+` is treated entirely as a flat modifier (`count == 0`,
/// `sides == 0`).
#[must_use]
pub fn parse(expr: &str) -> DieExpression {
    let mut count_digits = String::new();
    let mut sides_digits = String::new();
    let mut modifier_digits = String::new();
    let mut sign = ModifierSign::None;
    let mut state = ScanState::Initial;

    for c in expr.trim().chars() {
        match state {
            ScanState::Initial => {
                if c.is_ascii_digit() {
                    count_digits.push(c);
                } else if c == 'd' {
                    state = ScanState::DieType;
                } else if c == '+' {
                    sign = ModifierSign::Plus;
                    state = ScanState::Modifier;
                }
            }
            ScanState::DieType => {
                if c.is_ascii_digit() {
                    sides_digits.push(c);
                } else if c == '+' {
                    sign = ModifierSign::Plus;
                    state = ScanState::Modifier;
                } else if c == '-' {
                    sign = ModifierSign::Minus;
                    state = ScanState::Modifier;
                }
            }
            ScanState::Modifier => {
                if c.is_ascii_digit() {
                    modifier_digits.push(c);
                }
            }
        }
    }

    // A pure numeral never leaves the initial state: the digits belong to
    // the modifier and the expression has no die.
    if state == ScanState::Initial {
        modifier_digits = core::mem::take(&mut count_digits);
        count_digits.push('0');
    }

    let count = if count_digits.is_empty() {
        1
    } else {
        count_digits.parse().unwrap_or(0)
    };
    let sides = sides_digits.parse().unwrap_or(0);
    let modifier_value = modifier_digits.parse().unwrap_or(0);

    DieExpression {
        count,
        sides,
        sign,
        modifier_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_expression() {
        let expr = parse("2d6+2");
        assert_eq!(expr.count, 2);
        assert_eq!(expr.sides, 6);
        assert_eq!(expr.sign, ModifierSign::Plus);
        assert_eq!(expr.modifier(), 2);
    }

    #[test]
    fn count_defaults_to_one() {
        let expr = parse("d20");
        assert_eq!(expr.count, 1);
        assert_eq!(expr.sides, 20);
        assert_eq!(expr.modifier(), 0);
    }

    #[test]
    fn negative_modifier() {
        let expr = parse("1d8-1");
        assert_eq!(expr.sign, ModifierSign::Minus);
        assert_eq!(expr.modifier(), -1);
    }

    #[test]
    fn bare_numeral_is_flat_modifier() {
        let expr = parse("5");
        assert!(expr.is_flat());
        assert_eq!(expr.count, 0);
        assert_eq!(expr.modifier(), 5);
    }

    #[test]
    fn whitespace_and_garbage_are_skipped() {
        let expr = parse("  2d6 + 2 ");
        assert_eq!((expr.count, expr.sides, expr.modifier()), (2, 6, 2));

        // Lenient scan: unknown characters degrade, never error.
        let expr = parse("2xd6z+q2");
        assert_eq!((expr.count, expr.sides, expr.modifier()), (2, 6, 2));
    }

    #[test]
    fn empty_string_is_flat_zero() {
        let expr = parse("");
        assert!(expr.is_flat());
        assert_eq!(expr.modifier(), 0);
        assert_eq!(expr.count, 0);
    }
}
