//! Input validation for currency codes and dates.
//!
//! Every check is pure: the caller passes the evaluation date (`today`) and the
//! backend's earliest supported date, if it has one.

use super::currency::is_allowable;
use super::error::{ExchangeRateError, Result};
use super::rates::Target;
use chrono::NaiveDate;

pub fn validate_currency_code(code: &str) -> Result<()> {
    if !is_allowable(code) {
        return Err(ExchangeRateError::InvalidCurrency(code.to_string()));
    }
    Ok(())
}

/// Validates each code in order, failing on the first invalid one.
pub fn validate_currency_codes<'a, I>(codes: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    codes.into_iter().try_for_each(validate_currency_code)
}

/// Every target code must be allowable, and a set must not be empty.
pub fn validate_target(target: &Target) -> Result<()> {
    if target.codes().is_empty() {
        return Err(ExchangeRateError::InvalidCurrency("[]".to_string()));
    }
    validate_currency_codes(target.codes())
}

/// A date is valid when it is strictly before `today` and not before `earliest`.
pub fn validate_date(date: NaiveDate, today: NaiveDate, earliest: Option<NaiveDate>) -> Result<()> {
    if date >= today {
        return Err(ExchangeRateError::InvalidDate(
            "The date must be in the past.".to_string(),
        ));
    }

    if let Some(earliest) = earliest {
        if date < earliest {
            return Err(ExchangeRateError::InvalidDate(format!(
                "The date cannot be before {}.",
                earliest.format("%-d %B %Y")
            )));
        }
    }

    Ok(())
}

pub fn validate_date_range(
    start: NaiveDate,
    end: NaiveDate,
    today: NaiveDate,
    earliest: Option<NaiveDate>,
) -> Result<()> {
    validate_date(start, today, earliest)?;
    validate_date(end, today, earliest)?;

    if start > end {
        return Err(ExchangeRateError::InvalidDate(
            "The start date must be before the end date.".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_currency_code_validation() {
        assert!(validate_currency_code("GBP").is_ok());
        assert!(matches!(
            validate_currency_code("INVALID"),
            Err(ExchangeRateError::InvalidCurrency(code)) if code == "INVALID"
        ));
    }

    #[test]
    fn test_currency_codes_fail_on_first_invalid() {
        assert!(validate_currency_codes(["GBP", "USD", "EUR"]).is_ok());
        let result = validate_currency_codes(["GBP", "AAA", "BBB"]);
        assert!(matches!(
            result,
            Err(ExchangeRateError::InvalidCurrency(code)) if code == "AAA"
        ));
    }

    #[test]
    fn test_target_validation() {
        assert!(validate_target(&Target::single("EUR")).is_ok());
        assert!(validate_target(&Target::many(["EUR", "USD"])).is_ok());
        assert!(validate_target(&Target::many(["EUR", "XXX"])).is_err());
        assert!(matches!(
            validate_target(&Target::many(Vec::<String>::new())),
            Err(ExchangeRateError::InvalidCurrency(_))
        ));
        assert!(validate_target(&Target::Many(vec![])).is_err());
    }

    #[test]
    fn test_date_must_be_strictly_in_the_past() {
        let today = date(2019, 11, 10);

        let result = validate_date(today, today, None);
        assert!(matches!(result, Err(ExchangeRateError::InvalidDate(_))));
        assert_eq!(result.unwrap_err().to_string(), "The date must be in the past.");

        assert!(validate_date(date(2019, 11, 11), today, None).is_err());
        assert!(validate_date(date(2019, 11, 9), today, None).is_ok());
    }

    #[test]
    fn test_date_earliest_floor() {
        let today = date(2019, 11, 10);
        let earliest = Some(date(1999, 1, 4));

        assert!(validate_date(date(1999, 1, 4), today, earliest).is_ok());

        let result = validate_date(date(1999, 1, 3), today, earliest);
        assert_eq!(
            result.unwrap_err().to_string(),
            "The date cannot be before 4 January 1999."
        );

        // Backends without a floor accept older dates
        assert!(validate_date(date(1990, 1, 1), today, None).is_ok());
    }

    #[test]
    fn test_date_range_validation() {
        let today = date(2019, 11, 10);

        assert!(validate_date_range(date(2019, 11, 4), date(2019, 11, 8), today, None).is_ok());
        assert!(validate_date_range(date(2019, 11, 8), date(2019, 11, 8), today, None).is_ok());

        let result = validate_date_range(date(2019, 11, 8), date(2019, 11, 4), today, None);
        assert_eq!(
            result.unwrap_err().to_string(),
            "The start date must be before the end date."
        );

        // The end date is validated on its own as well
        assert!(validate_date_range(date(2019, 11, 4), today, today, None).is_err());
    }
}
