//! Exchange Definition Macros
//!
//! Provides macros to reduce boilerplate code in exchange definitions.
//!
//! # Available Macros
//!
//! - [`capabilities!`] - Create Capabilities with supported features listed
//! - [`api_urls!`] - Create API URL HashMap

/// Creates [`Capabilities`](crate::types::Capabilities) from a list of
/// capability names.
///
/// Listed names are `Supported` unless a level is given. Unlisted names are
/// unsupported.
///
/// # Example
///
/// ```
/// use ccxt_runtime::capabilities;
/// use ccxt_runtime::types::Capability;
///
/// let has = capabilities! {
///     fetchCurrencies,
///     fetchMarkets,
///     fetchStatus = Emulated,
/// };
/// assert!(has.has("fetchCurrencies"));
/// assert_eq!(has.get("fetchStatus"), Some(Capability::Emulated));
/// assert!(!has.has("fetchTicker"));
/// ```
#[macro_export]
macro_rules! capabilities {
    (@level) => {
        $crate::types::Capability::Supported
    };
    (@level $level:ident) => {
        $crate::types::Capability::$level
    };
    ($($name:ident $(= $level:ident)?),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut capabilities = $crate::types::Capabilities::new();
        $(
            capabilities.set(stringify!($name), $crate::capabilities!(@level $($level)?));
        )*
        capabilities
    }};
}

/// Creates an API URLs HashMap for [`HttpClient`](crate::client::HttpClient).
///
/// # Example
///
/// ```
/// use ccxt_runtime::api_urls;
///
/// let api_urls = api_urls! {
///     "public" => "https://api.exchange.com",
///     "private" => "https://api.exchange.com",
/// };
/// assert_eq!(api_urls.len(), 2);
/// ```
#[macro_export]
macro_rules! api_urls {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map: std::collections::HashMap<String, String> = std::collections::HashMap::new();
        $(
            map.insert($key.into(), $value.into());
        )*
        map
    }};
}
