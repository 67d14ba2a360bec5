use super::ui;
use crate::AppCommand;
use crate::core::{ExchangeRateDriver, Rates, Target, TimeSeries};
use anyhow::Result;
use comfy_table::Cell;
use tracing::debug;

const RATE_PRECISION: usize = 6;
const VALUE_PRECISION: usize = 2;

/// Builds a target from command line codes: one code is a single target.
pub fn target_from_args(codes: &[String]) -> Target {
    let codes: Vec<String> = codes.iter().map(|code| code.trim().to_uppercase()).collect();
    match codes.as_slice() {
        [code] => Target::single(code.clone()),
        _ => Target::many(codes),
    }
}

/// Executes a rate command against `driver` and prints the result.
pub async fn run(command: AppCommand, driver: &dyn ExchangeRateDriver) -> Result<()> {
    let spinner = ui::new_spinner("Fetching exchange rates...");
    let output = render_command(command, driver).await;
    spinner.finish_and_clear();

    println!("{}", output?);
    Ok(())
}

async fn render_command(command: AppCommand, driver: &dyn ExchangeRateDriver) -> Result<String> {
    debug!(?command, "Running command");
    let output = match command {
        AppCommand::Currencies => render_currencies(&driver.currencies().await?),
        AppCommand::Rate { from, to, date } => {
            let from = from.to_uppercase();
            let target = target_from_args(&to);
            let rates = driver.exchange_rate(&from, &target, date).await?;
            let when = date.map_or("latest".to_string(), |d| d.to_string());
            render_rates(
                &format!("Exchange rates from {from} ({when})"),
                &target,
                &rates,
                RATE_PRECISION,
            )
        }
        AppCommand::Convert {
            value,
            from,
            to,
            date,
        } => {
            let from = from.to_uppercase();
            let target = target_from_args(&to);
            let converted = driver.convert(value, &from, &target, date).await?;
            let when = date.map_or("latest".to_string(), |d| d.to_string());
            render_rates(
                &format!("{value:.2} {from} converted ({when})"),
                &target,
                &converted,
                VALUE_PRECISION,
            )
        }
        AppCommand::Range {
            from,
            to,
            start,
            end,
        } => {
            let from = from.to_uppercase();
            let target = target_from_args(&to);
            let series = driver
                .exchange_rate_between_date_range(&from, &target, start, end)
                .await?;
            render_series(
                &format!("Exchange rates from {from} ({start} to {end})"),
                &target,
                &series,
                RATE_PRECISION,
            )
        }
        AppCommand::ConvertRange {
            value,
            from,
            to,
            start,
            end,
        } => {
            let from = from.to_uppercase();
            let target = target_from_args(&to);
            let series = driver
                .convert_between_date_range(value, &from, &target, start, end)
                .await?;
            render_series(
                &format!("{value:.2} {from} converted ({start} to {end})"),
                &target,
                &series,
                VALUE_PRECISION,
            )
        }
    };
    Ok(output)
}

pub fn render_currencies(currencies: &[String]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency")]);
    for currency in currencies {
        table.add_row(vec![Cell::new(currency)]);
    }

    format!(
        "{}\n\n{}\n\n{} {}",
        ui::style_text("Supported currencies", ui::StyleType::Title),
        table,
        ui::style_text("Total:", ui::StyleType::Label),
        ui::style_text(&currencies.len().to_string(), ui::StyleType::Value)
    )
}

pub fn render_rates(title: &str, target: &Target, rates: &Rates, precision: usize) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell("Currency"), ui::header_cell("Value")]);

    for code in target.codes() {
        let cell =
            value_for(rates, code).map_or_else(ui::na_cell, |v| ui::number_cell(v, precision));
        table.add_row(vec![Cell::new(code), cell]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text(title, ui::StyleType::Title),
        table
    )
}

pub fn render_series(
    title: &str,
    target: &Target,
    series: &TimeSeries,
    precision: usize,
) -> String {
    let codes = target.codes();
    let mut table = ui::new_styled_table();
    let mut header = vec![ui::header_cell("Date")];
    header.extend(codes.iter().map(|code| ui::header_cell(code)));
    table.set_header(header);

    for (date, rates) in series {
        let mut row = vec![Cell::new(date.to_string())];
        row.extend(codes.iter().map(|code| {
            value_for(rates, code).map_or_else(ui::na_cell, |v| ui::number_cell(v, precision))
        }));
        table.add_row(row);
    }

    let footer = if series.is_empty() {
        ui::style_text("No rates available for this range", ui::StyleType::Subtle)
    } else {
        format!(
            "{} {}",
            ui::style_text("Days:", ui::StyleType::Label),
            ui::style_text(&series.len().to_string(), ui::StyleType::Value)
        )
    };

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text(title, ui::StyleType::Title),
        table,
        footer
    )
}

fn value_for(rates: &Rates, code: &str) -> Option<f64> {
    match rates {
        Rates::Single(value) => Some(*value),
        Rates::Many(values) => values.get(code).copied(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[test]
    fn test_target_from_args() {
        assert_eq!(
            target_from_args(&["eur".to_string()]),
            Target::Single("EUR".to_string())
        );
        assert_eq!(
            target_from_args(&["usd".to_string(), "GBP".to_string()]),
            Target::many(["USD", "GBP"])
        );
    }

    #[test]
    fn test_render_rates_lists_each_target() {
        let target = Target::many(["USD", "GBP"]);
        let rates = Rates::Many(BTreeMap::from([("GBP".to_string(), 0.86158)]));

        let output = render_rates("Rates", &target, &rates, 4);

        assert!(output.contains("0.8616"));
        assert!(output.contains("USD"));
        assert!(output.contains("N/A"));
    }

    #[test]
    fn test_render_series_rows_in_date_order() {
        let target = Target::single("EUR");
        let series = TimeSeries::from([
            (NaiveDate::from_ymd_opt(2019, 11, 5).unwrap(), Rates::Single(116.2)),
            (NaiveDate::from_ymd_opt(2019, 11, 4).unwrap(), Rates::Single(115.9)),
        ]);

        let output = render_series("Converted", &target, &series, 2);

        let first = output.find("2019-11-04").unwrap();
        let second = output.find("2019-11-05").unwrap();
        assert!(first < second);
        assert!(output.contains("115.90"));
    }

    #[test]
    fn test_render_empty_series() {
        let output = render_series("Converted", &Target::single("EUR"), &TimeSeries::new(), 2);
        assert!(output.contains("No rates available"));
    }

    #[test]
    fn test_render_currencies() {
        let output = render_currencies(&["EUR".to_string(), "GBP".to_string()]);
        assert!(output.contains("EUR"));
        assert!(output.contains("GBP"));
    }
}
