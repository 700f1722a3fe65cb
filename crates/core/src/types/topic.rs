//! Webhook topic type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when parsing an unrecognized webhook topic.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown webhook topic: {topic}")]
pub struct UnknownTopicError {
    /// The unrecognized topic string.
    pub topic: String,
}

/// A Shopify webhook topic this service subscribes to.
///
/// Topics use Shopify's `resource/event` notation both on the wire (the
/// `x-shopify-topic` header) and in serialized form.
///
/// ## Examples
///
/// ```
/// use adstem_core::WebhookTopic;
///
/// let topic: WebhookTopic = "customers/redact".parse().unwrap();
/// assert_eq!(topic, WebhookTopic::CustomersRedact);
/// assert_eq!(topic.as_str(), "customers/redact");
/// assert!(topic.is_mandatory());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookTopic {
    /// A customer requested an export of their personal data.
    #[serde(rename = "customers/data_request")]
    CustomersDataRequest,
    /// A customer requested erasure of their personal data.
    #[serde(rename = "customers/redact")]
    CustomersRedact,
    /// A shop uninstalled the app more than 48 hours ago; erase its data.
    #[serde(rename = "shop/redact")]
    ShopRedact,
    /// The merchant uninstalled the app.
    #[serde(rename = "app/uninstalled")]
    AppUninstalled,
    /// The access scopes granted to the app changed.
    #[serde(rename = "app/scopes_update")]
    AppScopesUpdate,
}

impl WebhookTopic {
    /// The privacy topics every public Shopify app must handle.
    pub const MANDATORY: [Self; 3] = [
        Self::CustomersDataRequest,
        Self::CustomersRedact,
        Self::ShopRedact,
    ];

    /// Returns the topic in Shopify's `resource/event` notation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CustomersDataRequest => "customers/data_request",
            Self::CustomersRedact => "customers/redact",
            Self::ShopRedact => "shop/redact",
            Self::AppUninstalled => "app/uninstalled",
            Self::AppScopesUpdate => "app/scopes_update",
        }
    }

    /// Returns true for the privacy topics Shopify requires every app to handle.
    #[must_use]
    pub const fn is_mandatory(self) -> bool {
        matches!(
            self,
            Self::CustomersDataRequest | Self::CustomersRedact | Self::ShopRedact
        )
    }
}

impl fmt::Display for WebhookTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for WebhookTopic {
    type Err = UnknownTopicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customers/data_request" => Ok(Self::CustomersDataRequest),
            "customers/redact" => Ok(Self::CustomersRedact),
            "shop/redact" => Ok(Self::ShopRedact),
            "app/uninstalled" => Ok(Self::AppUninstalled),
            "app/scopes_update" => Ok(Self::AppScopesUpdate),
            _ => Err(UnknownTopicError {
                topic: s.to_owned(),
            }),
        }
    }
}
