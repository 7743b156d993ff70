use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::{FeaturedListingId, Money, PaymentId, PropertyId, SubscriptionId, UserId};

/// Length of a paid or trial billing period.
pub const BILLING_PERIOD_DAYS: i64 = 30;
/// Length of a featured-listing boost.
pub const BOOST_DURATION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "free" => Some(Self::Free),
            "basic" => Some(Self::Basic),
            "premium" => Some(Self::Premium),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free",
            SubscriptionPlan::Basic => "Basic",
            SubscriptionPlan::Premium => "Premium",
            SubscriptionPlan::Enterprise => "Enterprise",
        }
    }

    pub fn limits(self) -> FeatureLimits {
        match self {
            SubscriptionPlan::Free => FeatureLimits {
                properties: Some(1),
                featured_listings: Some(0),
            },
            SubscriptionPlan::Basic => FeatureLimits {
                properties: Some(5),
                featured_listings: Some(1),
            },
            SubscriptionPlan::Premium => FeatureLimits {
                properties: Some(50),
                featured_listings: Some(5),
            },
            SubscriptionPlan::Enterprise => FeatureLimits {
                properties: None,
                featured_listings: None,
            },
        }
    }
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Countable things a plan caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Properties,
    FeaturedListings,
}

impl Feature {
    pub fn key(self) -> &'static str {
        match self {
            Feature::Properties => "properties",
            Feature::FeaturedListings => "featured_listings",
        }
    }
}

/// Per-plan caps; `None` means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureLimits {
    pub properties: Option<usize>,
    pub featured_listings: Option<usize>,
}

impl FeatureLimits {
    pub fn limit(&self, feature: Feature) -> Option<usize> {
        match feature {
            Feature::Properties => self.properties,
            Feature::FeaturedListings => self.featured_listings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub plan: SubscriptionPlan,
    pub price: Money,
    pub description: String,
}

impl PlanConfig {
    pub fn seeded() -> Vec<PlanConfig> {
        vec![
            PlanConfig {
                plan: SubscriptionPlan::Basic,
                price: Money::from_major(5_000),
                description: "Up to 5 listings and 1 featured boost".to_string(),
            },
            PlanConfig {
                plan: SubscriptionPlan::Premium,
                price: Money::from_major(15_000),
                description: "Up to 50 listings and 5 featured boosts".to_string(),
            },
            PlanConfig {
                plan: SubscriptionPlan::Enterprise,
                price: Money::from_major(50_000),
                description: "Unlimited listings and featured boosts".to_string(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSubscription {
    pub id: SubscriptionId,
    pub agent: UserId,
    pub plan: SubscriptionPlan,
    pub is_trial: bool,
    pub is_active: bool,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub amount_paid: Money,
    pub transaction_id: Option<String>,
}

impl AgentSubscription {
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date.map_or(true, |end| end > now)
    }

    /// Extend by one period from whichever is later: now or the current end.
    pub fn renew(&mut self, reference: &str, amount: Money, now: DateTime<Utc>) {
        let base = self.end_date.map_or(now, |end| end.max(now));
        self.is_active = true;
        self.start_date = now;
        self.end_date = Some(base + Duration::days(BILLING_PERIOD_DAYS));
        self.transaction_id = Some(reference.to_string());
        self.amount_paid = amount;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn from_gateway(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "success" => Self::Success,
            "failed" | "abandoned" | "reversed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

pub const PAYMENT_CURRENCY: &str = "NGN";
pub const PAYMENT_METHOD: &str = "paystack";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user: Option<UserId>,
    pub subscription: Option<SubscriptionId>,
    pub reference: String,
    pub amount: Money,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturedListing {
    pub id: FeaturedListingId,
    pub property: PropertyId,
    pub agent: UserId,
    pub boost_duration_days: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub is_active: bool,
}

impl FeaturedListing {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.end_date >= now
    }
}

/// Response of `GET /subscriptions/start`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum StartOutcome {
    AlreadySubscribed { subscription: AgentSubscription },
    ChoosePlan { plans: Vec<PlanConfig> },
}

/// Response of `POST /subscriptions/initiate/:plan`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum InitiateOutcome {
    TrialStarted { subscription: AgentSubscription },
    Redirect {
        authorization_url: String,
        reference: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyQuery {
    #[serde(default)]
    pub reference: Option<String>,
}
