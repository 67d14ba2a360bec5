//! Per-backend request and response conventions.
//!
//! The supported APIs share one request flow and differ only in endpoint
//! paths, query parameter names, where the api key goes and where rates sit
//! in the response. Each difference is a field of [`BackendSpec`].

use crate::core::error::ExchangeRateError;
use chrono::NaiveDate;
use std::fmt::Display;
use std::str::FromStr;

/// Where the api key is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPlacement {
    None,
    QueryParam(&'static str),
    Header(&'static str),
}

/// How a rate for a past date is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoricalEndpoint {
    /// The date is the path, e.g. `/2019-11-08`.
    DatePath,
    /// A fixed path with the date as a query parameter.
    DateParam {
        path: &'static str,
        param: &'static str,
    },
}

/// How the list of supported currencies is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrenciesEndpoint {
    /// Base currency plus every quoted currency of the latest rates.
    Latest,
    /// Keys of an object, e.g. `{"currencies": {"EUR": "Euro"}}`.
    ObjectKeys {
        path: &'static str,
        field: &'static str,
    },
    /// One field of every element of an array.
    ArrayField {
        path: &'static str,
        query: &'static [(&'static str, &'static str)],
        list: &'static str,
        field: &'static str,
    },
}

/// Query parameter names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryParams {
    pub base: &'static str,
    pub symbols: &'static str,
    pub start_date: &'static str,
    pub end_date: &'static str,
}

/// Where rates live in a decoded response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseShape {
    /// Dotted path to the currency → rate object.
    pub rates: &'static str,
    /// Dotted path to the date → rates object of a time series.
    pub time_series: &'static str,
    /// Rate keys are prefixed with the source currency, e.g. `USDEUR`.
    pub source_prefixed_keys: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendSpec {
    /// Host and base path, without protocol.
    pub host: &'static str,
    pub auth: AuthPlacement,
    pub latest: &'static str,
    pub historical: HistoricalEndpoint,
    pub time_series: &'static str,
    pub params: QueryParams,
    pub response: ResponseShape,
    pub currencies: CurrenciesEndpoint,
}

const BASE_SYMBOLS: QueryParams = QueryParams {
    base: "base",
    symbols: "symbols",
    start_date: "start_date",
    end_date: "end_date",
};

const RATES: ResponseShape = ResponseShape {
    rates: "rates",
    time_series: "rates",
    source_prefixed_keys: false,
};

static EXCHANGE_RATES_API_IO: BackendSpec = BackendSpec {
    host: "api.exchangeratesapi.io/v1",
    auth: AuthPlacement::QueryParam("access_key"),
    latest: "/latest",
    historical: HistoricalEndpoint::DatePath,
    time_series: "/timeseries",
    params: BASE_SYMBOLS,
    response: RATES,
    currencies: CurrenciesEndpoint::Latest,
};

static EXCHANGE_RATES_DATA_API: BackendSpec = BackendSpec {
    host: "api.apilayer.com/exchangerates_data",
    auth: AuthPlacement::Header("apiKey"),
    latest: "/latest",
    historical: HistoricalEndpoint::DatePath,
    time_series: "/timeseries",
    params: BASE_SYMBOLS,
    response: RATES,
    currencies: CurrenciesEndpoint::Latest,
};

static EXCHANGE_RATE_HOST: BackendSpec = BackendSpec {
    host: "api.exchangerate.host",
    auth: AuthPlacement::QueryParam("access_key"),
    latest: "/live",
    historical: HistoricalEndpoint::DateParam {
        path: "/historical",
        param: "date",
    },
    time_series: "/timeframe",
    params: QueryParams {
        base: "source",
        symbols: "currencies",
        start_date: "start_date",
        end_date: "end_date",
    },
    response: ResponseShape {
        rates: "quotes",
        time_series: "quotes",
        source_prefixed_keys: true,
    },
    currencies: CurrenciesEndpoint::ObjectKeys {
        path: "/list",
        field: "currencies",
    },
};

static CURRENCY_BEACON: BackendSpec = BackendSpec {
    host: "api.currencybeacon.com/v1",
    auth: AuthPlacement::QueryParam("api_key"),
    latest: "/latest",
    historical: HistoricalEndpoint::DateParam {
        path: "/historical",
        param: "date",
    },
    time_series: "/timeseries",
    params: BASE_SYMBOLS,
    response: ResponseShape {
        rates: "response.rates",
        time_series: "response",
        source_prefixed_keys: false,
    },
    currencies: CurrenciesEndpoint::ArrayField {
        path: "/currencies",
        query: &[("type", "fiat")],
        list: "response",
        field: "short_code",
    },
};

static EXCHANGE_RATES_API_LEGACY: BackendSpec = BackendSpec {
    host: "api.exchangeratesapi.io",
    auth: AuthPlacement::None,
    latest: "/latest",
    historical: HistoricalEndpoint::DatePath,
    time_series: "/history",
    params: QueryParams {
        base: "base",
        symbols: "symbols",
        start_date: "start_at",
        end_date: "end_at",
    },
    response: RATES,
    currencies: CurrenciesEndpoint::Latest,
};

/// The supported exchange rate APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// <https://exchangeratesapi.io>
    ExchangeRatesApiIo,
    /// <https://apilayer.com/marketplace/exchangerates_data-api>
    ExchangeRatesDataApi,
    /// <https://exchangerate.host>
    ExchangeRateHost,
    /// <https://currencybeacon.com>
    CurrencyBeacon,
    /// The original keyless exchangeratesapi.io service.
    ExchangeRatesApiLegacy,
}

impl Backend {
    pub const ALL: [Backend; 5] = [
        Backend::ExchangeRatesApiIo,
        Backend::ExchangeRatesDataApi,
        Backend::ExchangeRateHost,
        Backend::CurrencyBeacon,
        Backend::ExchangeRatesApiLegacy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::ExchangeRatesApiIo => "exchange-rates-api-io",
            Backend::ExchangeRatesDataApi => "exchange-rates-data-api",
            Backend::ExchangeRateHost => "exchange-rate-host",
            Backend::CurrencyBeacon => "currency-beacon",
            Backend::ExchangeRatesApiLegacy => "exchange-rates-api-legacy",
        }
    }

    pub fn spec(&self) -> &'static BackendSpec {
        match self {
            Backend::ExchangeRatesApiIo => &EXCHANGE_RATES_API_IO,
            Backend::ExchangeRatesDataApi => &EXCHANGE_RATES_DATA_API,
            Backend::ExchangeRateHost => &EXCHANGE_RATE_HOST,
            Backend::CurrencyBeacon => &CURRENCY_BEACON,
            Backend::ExchangeRatesApiLegacy => &EXCHANGE_RATES_API_LEGACY,
        }
    }

    /// Earliest date the backend has rates for. The ECB based services start
    /// on 4 January 1999.
    pub fn earliest_date(&self) -> Option<NaiveDate> {
        match self {
            Backend::ExchangeRatesApiIo
            | Backend::ExchangeRatesDataApi
            | Backend::ExchangeRatesApiLegacy => NaiveDate::from_ymd_opt(1999, 1, 4),
            Backend::ExchangeRateHost | Backend::CurrencyBeacon => None,
        }
    }
}

impl Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = ExchangeRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Backend::ALL
            .into_iter()
            .find(|backend| backend.name() == s)
            .ok_or_else(|| ExchangeRateError::UnsupportedDriver(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_names_round_trip() {
        for backend in Backend::ALL {
            assert_eq!(backend.name().parse::<Backend>().unwrap(), backend);
            assert_eq!(backend.to_string(), backend.name());
        }
    }

    #[test]
    fn test_unknown_backend_is_unsupported() {
        let result = "fixer".parse::<Backend>();
        assert!(matches!(
            result,
            Err(ExchangeRateError::UnsupportedDriver(name)) if name == "fixer"
        ));
    }

    #[test]
    fn test_only_exchange_rate_host_uses_prefixed_keys() {
        for backend in Backend::ALL {
            assert_eq!(
                backend.spec().response.source_prefixed_keys,
                backend == Backend::ExchangeRateHost
            );
        }
    }

    #[test]
    fn test_earliest_dates() {
        let floor = NaiveDate::from_ymd_opt(1999, 1, 4);
        assert_eq!(Backend::ExchangeRatesApiIo.earliest_date(), floor);
        assert_eq!(Backend::ExchangeRatesApiLegacy.earliest_date(), floor);
        assert_eq!(Backend::CurrencyBeacon.earliest_date(), None);
    }
}
