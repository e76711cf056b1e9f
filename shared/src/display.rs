//! Display formatting for dashboard figures
//!
//! Currency strings follow the en-US convention (`$1,234.56`, `-$10.00`).

use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::decimal_to_f64;

/// Sign classification of a profit/loss figure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
}

impl Tone {
    pub fn of(value: f64) -> Self {
        if value > 0.0 {
            Tone::Positive
        } else if value < 0.0 {
            Tone::Negative
        } else {
            Tone::Neutral
        }
    }

    /// CSS class used by the templates
    pub fn css_class(&self) -> &'static str {
        match self {
            Tone::Positive => "text-profit",
            Tone::Negative => "text-loss",
            Tone::Neutral => "text-muted",
        }
    }
}

/// Rendered profit/loss text with its tone
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitLossDisplay {
    pub text: String,
    pub tone: Tone,
    pub class: &'static str,
}

/// Format a stored profit/loss for display.
///
/// Positive values get a `+` prefix, negative values a `-` prefix with the
/// magnitude shown, and zero or missing values render as `$0.00`.
pub fn format_profit_loss(value: Option<Decimal>, percentage: Option<Decimal>) -> ProfitLossDisplay {
    // Tone follows what is shown, so sub-cent amounts read as zero
    let pl = round_cents(decimal_to_f64(value).unwrap_or(0.0));
    let tone = Tone::of(pl);

    let text = match tone {
        Tone::Neutral => "$0.00".to_string(),
        Tone::Positive | Tone::Negative => {
            let sign = if tone == Tone::Positive { "+" } else { "-" };
            let amount = format!("{}${}", sign, group_thousands(pl.abs()));
            match percentage {
                Some(pct) => format!("{} ({}%)", amount, pct.normalize()),
                None => amount,
            }
        }
    };

    ProfitLossDisplay {
        text,
        tone,
        class: tone.css_class(),
    }
}

/// Format a float as US dollars, e.g. `$1,234.56` or `-$10.00`
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "$0.00".to_string();
    }
    let rounded = round_cents(value);
    if rounded < 0.0 {
        format!("-${}", group_thousands(rounded.abs()))
    } else {
        format!("${}", group_thousands(rounded.abs()))
    }
}

/// Format a change percentage with a direction arrow, e.g. `↑ 2.00%`
pub fn format_change_percent(value: f64) -> String {
    let arrow = if value > 0.0 { '↑' } else { '↓' };
    format!("{} {:.2}%", arrow, value.abs())
}

/// Format a signed percentage, e.g. `+3.10%` or `-1.25%`
pub fn format_signed_percent(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}%", value)
    } else {
        format!("{:.2}%", value)
    }
}

/// Format a decimal price with two fraction digits
pub fn format_price(value: Decimal) -> String {
    format_usd(decimal_to_f64(Some(value)).unwrap_or(0.0))
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn group_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value);
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}.{}", grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_zero_and_missing_are_neutral() {
        for value in [Some(dec!(0)), Some(dec!(0.00)), None] {
            let display = format_profit_loss(value, None);
            assert_eq!(display.text, "$0.00");
            assert_eq!(display.tone, Tone::Neutral);
            assert_eq!(display.class, "text-muted");
        }
    }

    #[test]
    fn test_positive_and_negative() {
        let gain = format_profit_loss(Some(dec!(1099.68)), Some(dec!(2.99)));
        assert_eq!(gain.text, "+$1,099.68 (2.99%)");
        assert_eq!(gain.tone, Tone::Positive);

        let loss = format_profit_loss(Some(dec!(-12.5)), None);
        assert_eq!(loss.text, "-$12.50");
        assert_eq!(loss.tone, Tone::Negative);
        assert_eq!(loss.class, "text-loss");
    }

    #[test]
    fn test_sub_cent_amounts_are_neutral() {
        for value in [dec!(0.001), dec!(-0.004)] {
            let display = format_profit_loss(Some(value), Some(dec!(0.01)));
            assert_eq!(display.text, "$0.00");
            assert_eq!(display.tone, Tone::Neutral);
        }
        assert_eq!(format_profit_loss(Some(dec!(0.005)), None).text, "+$0.01");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0.00");
        assert_eq!(format_usd(1234567.891), "$1,234,567.89");
        assert_eq!(format_usd(-10.0), "-$10.00");
        assert_eq!(format_usd(999.999), "$1,000.00");
        assert_eq!(format_usd(f64::NAN), "$0.00");
    }

    #[test]
    fn test_change_percent_arrows() {
        assert_eq!(format_change_percent(2.0), "↑ 2.00%");
        assert_eq!(format_change_percent(-3.456), "↓ 3.46%");
        assert_eq!(format_change_percent(0.0), "↓ 0.00%");
    }

    #[test]
    fn test_signed_percent() {
        assert_eq!(format_signed_percent(3.1), "+3.10%");
        assert_eq!(format_signed_percent(-1.25), "-1.25%");
    }
}
