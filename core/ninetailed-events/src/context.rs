//! Page and campaign context parsed from the current URL.

use ninetailed_types::{Campaign, Page};
use tracing::debug;
use url::Url;

/// What the host knows about the page an event is built on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildContext {
    pub url: String,
    pub referrer: String,
    pub locale: String,
    pub user_agent: Option<String>,
    pub document_title: Option<String>,
}

impl BuildContext {
    /// Context for `url` with no referrer and the `en-US` locale.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            locale: "en-US".to_string(),
            ..Default::default()
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = referrer.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_document_title(mut self, title: impl Into<String>) -> Self {
        self.document_title = Some(title.into());
        self
    }
}

/// Parses page information from `url`.
///
/// A URL that cannot be parsed yields a default page carrying only the
/// referrer.
#[must_use]
pub fn parse_page(url: &str, referrer: &str) -> Page {
    let parsed = match Url::parse(url) {
        Ok(u) => u,
        Err(e) => {
            debug!(url, error = %e, "unparseable page url");
            return Page {
                referrer: referrer.to_string(),
                ..Default::default()
            };
        }
    };

    Page {
        path: parsed.path().to_string(),
        query: parsed.query_pairs().into_owned().collect(),
        referrer: referrer.to_string(),
        search: parsed.query().map(|q| format!("?{q}")).unwrap_or_default(),
        url: parsed.to_string(),
    }
}

/// Extracts UTM campaign parameters from `url`.
///
/// `utm_campaign` maps to `name`; the other parameters keep their suffix.
#[must_use]
pub fn parse_campaign(url: &str) -> Campaign {
    let Ok(parsed) = Url::parse(url) else {
        return Campaign::default();
    };

    let mut campaign = Campaign::default();
    for (key, value) in parsed.query_pairs() {
        let slot = match key.as_ref() {
            "utm_source" => &mut campaign.source,
            "utm_medium" => &mut campaign.medium,
            "utm_campaign" => &mut campaign.name,
            "utm_term" => &mut campaign.term,
            "utm_content" => &mut campaign.content,
            _ => continue,
        };
        // First occurrence wins.
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }
    campaign
}
