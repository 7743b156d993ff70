use chrono::{Duration, Utc};
use clap::Args;
use estate_market::accounts::{AccountRepository, SignupRequest, User, UserRole};
use estate_market::billing::{PaystackClient, PlanConfig, SubscriptionPlan};
use estate_market::config::AppConfig;
use estate_market::error::AppError;
use estate_market::leads::{LeadRequest, ViewingRequest};
use estate_market::listings::PropertyDraft;
use estate_market::shared::{Money, UserId};
use estate_market::store::{MemoryMailer, MemoryStore};
use estate_market::Marketplace;
use serde::Serialize;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Name of the listing agent
    #[arg(long, default_value = "Tunde Bello")]
    pub(crate) agent: String,
    /// Name of the house-hunting customer
    #[arg(long, default_value = "Ada Obi")]
    pub(crate) customer: String,
    /// Title of the demo listing
    #[arg(long, default_value = "Garden flat in Lekki")]
    pub(crate) title: String,
    /// Asking price in whole naira
    #[arg(long, default_value_t = 2_500_000)]
    pub(crate) price: i64,
    /// Days from now until the viewing
    #[arg(long, default_value_t = 2)]
    pub(crate) viewing_in_days: i64,
    /// Print the summary as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct DemoSummary {
    pub(crate) property_slug: String,
    pub(crate) price: String,
    pub(crate) lead_status: &'static str,
    pub(crate) viewing_at: String,
    pub(crate) agent_plan: SubscriptionPlan,
    pub(crate) agent_unread_notifications: usize,
    pub(crate) customer_unread_notifications: usize,
    pub(crate) emails: Vec<String>,
}

pub(crate) fn print_plans() {
    println!("{:<11} {:>14}  {:>9}  {:>7}", "Plan", "Price/month", "Listings", "Boosts");
    let free = PlanConfig {
        plan: SubscriptionPlan::Free,
        price: Money::ZERO,
        description: "One listing, no boosts".to_string(),
    };
    for config in std::iter::once(free).chain(PlanConfig::seeded()) {
        let limits = config.plan.limits();
        println!(
            "{:<11} {:>14}  {:>9}  {:>7}",
            config.plan.label(),
            config.price.to_string(),
            cap(limits.properties),
            cap(limits.featured_listings),
        );
    }
}

fn cap(limit: Option<usize>) -> String {
    limit.map_or_else(|| "unlimited".to_string(), |limit| limit.to_string())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let summary = walkthrough(&config, &args)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&summary)
            .map_err(|err| AppError::Marketplace(Box::new(err)))?;
        println!("{rendered}");
        return Ok(());
    }

    println!("Listing      : {} ({})", summary.property_slug, summary.price);
    println!("Lead status  : {}", summary.lead_status);
    println!("Viewing at   : {}", summary.viewing_at);
    println!("Agent plan   : {}", summary.agent_plan);
    println!(
        "Unread       : agent {}, customer {}",
        summary.agent_unread_notifications, summary.customer_unread_notifications
    );
    println!("Emails sent  :");
    for subject in &summary.emails {
        println!("  - {subject}");
    }
    Ok(())
}

fn walkthrough(config: &AppConfig, args: &DemoArgs) -> Result<DemoSummary, AppError> {
    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    let mailer = Arc::new(MemoryMailer::default());
    let gateway = Arc::new(PaystackClient::new(&config.paystack)?);
    let market = Marketplace::from_config(config, store.clone(), mailer.clone(), gateway);

    let staff = store
        .insert_user(User {
            id: UserId::new(),
            email: "staff@example.com".to_string(),
            name: "Site Staff".to_string(),
            role: None,
            is_staff: true,
            created_at: now,
        })?
        .actor();

    let agent = market
        .accounts()
        .signup(signup(&args.agent, UserRole::Agent), now)?
        .user
        .actor();
    let customer = market
        .accounts()
        .signup(signup(&args.customer, UserRole::Customer), now)?
        .user
        .actor();
    market
        .accounts()
        .verify_agent(&staff, agent.user_id, true)?;

    let property = market.listings().create_property(
        &agent,
        PropertyDraft {
            title: args.title.clone(),
            description: "Two bedrooms, fitted kitchen and a small garden.".to_string(),
            property_type: Some("apartment".to_string()),
            new_property_type: None,
            price: args.price,
            location: "Lekki, Lagos".to_string(),
            bedrooms: 2,
            bathrooms: 2,
            sqft: 1100,
            amenities: Vec::new(),
            is_available: true,
        },
        now,
    )?;

    let lead = market
        .leads()
        .create_lead(
            &customer,
            LeadRequest {
                property_id: property.id,
                message: "Is the flat still available this month?".to_string(),
                notes: String::new(),
            },
            now,
        )?
        .lead;
    let viewing = market.leads().schedule_viewing(
        &agent,
        lead.id,
        ViewingRequest {
            scheduled_time: now + Duration::days(args.viewing_in_days.max(1)),
            notes: "Meet at the estate gate".to_string(),
        },
        now,
    )?;
    let detail = market.leads().lead_detail(&customer, lead.id, now)?;

    Ok(DemoSummary {
        property_slug: property.slug,
        price: property.price.to_string(),
        lead_status: detail.lead.status.label(),
        viewing_at: viewing.scheduled_time.format("%Y-%m-%d %H:%M UTC").to_string(),
        agent_plan: market.billing().current_plan(agent.user_id, now)?,
        agent_unread_notifications: market.messaging().unread_count(agent.user_id)?,
        customer_unread_notifications: market.messaging().unread_count(customer.user_id)?,
        emails: mailer.subjects(),
    })
}

fn signup(name: &str, role: UserRole) -> SignupRequest {
    SignupRequest {
        email: format!(
            "{}@example.com",
            name.trim().to_ascii_lowercase().replace(' ', ".")
        ),
        name: name.to_string(),
        role: Some(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estate_market::config::{
        AppEnvironment, AuthConfig, MailConfig, PaystackConfig, ServerConfig, TelemetryConfig,
    };

    fn config() -> AppConfig {
        AppConfig {
            environment: AppEnvironment::Test,
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            telemetry: TelemetryConfig {
                log_level: "warn".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "demo-secret".to_string(),
                token_ttl_hours: 1,
            },
            paystack: PaystackConfig {
                secret_key: "sk_test_demo".to_string(),
                base_url: "https://api.paystack.test".to_string(),
                timeout: std::time::Duration::from_secs(1),
                callback_url: "http://localhost:3000/api/v1/subscriptions/verify".to_string(),
            },
            mail: MailConfig::default(),
        }
    }

    fn args() -> DemoArgs {
        DemoArgs {
            agent: "Tunde Bello".to_string(),
            customer: "Ada Obi".to_string(),
            title: "Garden flat in Lekki".to_string(),
            price: 2_500_000,
            viewing_in_days: 2,
            json: false,
        }
    }

    #[test]
    fn walkthrough_reaches_a_scheduled_viewing() {
        let summary = walkthrough(&config(), &args()).expect("demo runs");

        assert_eq!(summary.property_slug, "garden-flat-in-lekki");
        assert_eq!(summary.lead_status, "Viewing Scheduled");
        assert_eq!(summary.agent_plan, SubscriptionPlan::Basic);
        assert!(summary.agent_unread_notifications >= 2);
        assert!(summary
            .emails
            .iter()
            .any(|subject| subject.ends_with("New Lead: Garden flat in Lekki")));
    }

    #[test]
    fn unlimited_caps_render_as_words() {
        assert_eq!(cap(None), "unlimited");
        assert_eq!(cap(Some(5)), "5");
    }
}
