//! Payment provider configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Stripe credentials and redirect URLs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// Secret API key (sk_test_... or sk_live_...)
    pub stripe_api_key: String,

    /// Webhook signing secret (whsec_...)
    pub stripe_webhook_secret: String,

    /// URL the hosted checkout redirects to on success
    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,

    /// URL the hosted checkout redirects to on cancel
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,

    /// URL the billing portal returns to
    #[serde(default = "default_portal_return_url")]
    pub portal_return_url: String,
}

impl PaymentConfig {
    /// Whether the configured key targets Stripe's test environment.
    pub fn is_test_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_test_")
    }

    /// Whether the configured key targets live billing.
    pub fn is_live_mode(&self) -> bool {
        self.stripe_api_key.starts_with("sk_live_")
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.stripe_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_API_KEY"));
        }
        if self.stripe_webhook_secret.is_empty() {
            return Err(ValidationError::MissingRequired("STRIPE_WEBHOOK_SECRET"));
        }

        // A publishable key here would silently break every provider call
        if !self.stripe_api_key.starts_with("sk_") {
            return Err(ValidationError::InvalidStripeKey);
        }
        if !self.stripe_webhook_secret.starts_with("whsec_") {
            return Err(ValidationError::InvalidStripeWebhookSecret);
        }

        for url in [
            &self.checkout_success_url,
            &self.checkout_cancel_url,
            &self.portal_return_url,
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ValidationError::InvalidCheckoutUrl);
            }
        }

        Ok(())
    }
}

fn default_success_url() -> String {
    "https://app.caseprep.io/dashboard?success=true".to_string()
}

fn default_cancel_url() -> String {
    "https://app.caseprep.io/?canceled=true".to_string()
}

fn default_portal_return_url() -> String {
    "https://app.caseprep.io/dashboard".to_string()
}
