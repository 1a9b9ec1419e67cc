use crate::domain_age::DomainAgeChecker;
use crate::error::PhishguardError;
use url::Url;

/// Column order the classifier was trained against. Training input and
/// inference input must agree on this exact set and order; a silent
/// mismatch would misalign features with model weights.
pub const FEATURE_COLUMNS: [&str; 31] = [
    "Index",
    "UsingIP",
    "LongURL",
    "ShortURL",
    "Symbol@",
    "Redirecting//",
    "PrefixSuffix-",
    "SubDomains",
    "HTTPS",
    "DomainRegLen",
    "Favicon",
    "NonStdPort",
    "HTTPSDomainURL",
    "RequestURL",
    "AnchorURL",
    "LinksInScriptTags",
    "ServerFormHandler",
    "InfoEmail",
    "AbnormalURL",
    "WebsiteForwarding",
    "StatusBarCust",
    "DisableRightClick",
    "UsingPopupWindow",
    "IframeRedirection",
    "AgeofDomain",
    "DNSRecording",
    "WebsiteTraffic",
    "PageRank",
    "GoogleIndex",
    "LinksPointingToPage",
    "StatsReport",
];

/// Substituted for `DomainRegLen`/`AgeofDomain` when WHOIS gives nothing.
pub const DEFAULT_DOMAIN_AGE_YEARS: i64 = 12;

/// Feature values in `FEATURE_COLUMNS` order.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFeatures {
    values: Vec<i64>,
}

impl UrlFeatures {
    pub fn get(&self, name: &str) -> Option<i64> {
        let idx = FEATURE_COLUMNS.iter().position(|&c| c == name)?;
        self.values.get(idx).copied()
    }

    /// Reorder values to the given column order (the order the model was
    /// trained with). Fails on any column not in the schema.
    pub fn ordered(&self, order: &[String]) -> Result<Vec<f64>, PhishguardError> {
        order
            .iter()
            .map(|name| {
                self.get(name).map(|v| v as f64).ok_or_else(|| {
                    PhishguardError::Internal(anyhow::anyhow!(
                        "model expects unknown feature column: {name}"
                    ))
                })
            })
            .collect()
    }
}

/// Turns a raw URL string into the fixed-order feature vector.
///
/// Columns that would need live page content or third-party ranking data
/// (favicon, anchors, page rank, traffic, iframes, ...) are constant zero
/// placeholders; only the syntactic indicators and the WHOIS-derived age
/// carry signal.
pub struct FeatureExtractor {
    whois: DomainAgeChecker,
}

impl FeatureExtractor {
    pub fn new(whois: DomainAgeChecker) -> Self {
        Self { whois }
    }

    pub async fn extract(&self, raw_url: &str) -> Result<UrlFeatures, PhishguardError> {
        let parsed = Url::parse(raw_url)
            .map_err(|e| PhishguardError::InvalidUrl(format!("{raw_url}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PhishguardError::InvalidUrl(format!(
                "unsupported scheme: {}",
                parsed.scheme()
            )));
        }

        let host = parsed
            .host_str()
            .filter(|h| h.contains('.'))
            .ok_or_else(|| PhishguardError::InvalidUrl(format!("no valid host in {raw_url}")))?
            .to_string();

        let age_years = match self.whois.age_years(&host).await {
            Ok(age) => age as i64,
            Err(e) => {
                log::debug!("WHOIS age unavailable for {host}, using default: {e}");
                0
            }
        };
        let reg_len = if age_years > 0 {
            age_years
        } else {
            DEFAULT_DOMAIN_AGE_YEARS
        };

        let url_len = raw_url.len();
        let non_std_port = match parsed.port() {
            Some(p) => p != 80 && p != 443,
            None => false,
        };

        let values = vec![
            0,                                                              // Index
            i64::from(host.chars().next().is_some_and(|c| c.is_ascii_digit())), // UsingIP
            i64::from(url_len > 75),                                        // LongURL
            i64::from(url_len < 20),                                        // ShortURL
            i64::from(raw_url.contains('@')),                               // Symbol@
            i64::from(raw_url.matches("//").count() > 1),                   // Redirecting//
            i64::from(host.contains('-')),                                  // PrefixSuffix-
            host.matches('.').count() as i64 - 1,                           // SubDomains
            i64::from(parsed.scheme() == "https"),                          // HTTPS
            reg_len,                                                        // DomainRegLen
            0,                                                              // Favicon
            i64::from(non_std_port),                                        // NonStdPort
            i64::from(host.contains("https")),                              // HTTPSDomainURL
            0,                                                              // RequestURL
            0,                                                              // AnchorURL
            0,                                                              // LinksInScriptTags
            0,                                                              // ServerFormHandler
            i64::from(raw_url.contains("info@")),                           // InfoEmail
            0,                                                              // AbnormalURL
            0,                                                              // WebsiteForwarding
            0,                                                              // StatusBarCust
            0,                                                              // DisableRightClick
            0,                                                              // UsingPopupWindow
            0,                                                              // IframeRedirection
            reg_len,                                                        // AgeofDomain
            0,                                                              // DNSRecording
            0,                                                              // WebsiteTraffic
            0,                                                              // PageRank
            0,                                                              // GoogleIndex
            0,                                                              // LinksPointingToPage
            0,                                                              // StatsReport
        ];
        debug_assert_eq!(values.len(), FEATURE_COLUMNS.len());

        Ok(UrlFeatures { values })
    }
}
