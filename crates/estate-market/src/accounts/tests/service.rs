use super::common::*;

use crate::accounts::{AccountError, SignupRequest, UserProfileUpdate, UserRole};
use crate::billing::SubscriptionPlan;
use crate::listings::AlertRequest;
use crate::shared::UserId;
use crate::store::RepositoryError;

#[test]
fn agent_signup_creates_profile_and_basic_trial() {
    let fixture = Fixture::new();
    let agent = fixture.pending_agent("Tunde Bello");

    let overview = fixture.market.accounts().get_user(&agent).unwrap();
    let profile = overview.agent_profile.expect("agent profile");
    assert!(!profile.verified);
    assert!(profile.current_subscription.is_some());
    assert!(overview.profile.is_none());

    let plan = fixture
        .market
        .billing()
        .current_plan(agent.user_id, now())
        .unwrap();
    assert_eq!(plan, SubscriptionPlan::Basic);
}

#[test]
fn customer_signup_creates_user_profile_only() {
    let fixture = Fixture::new();
    let customer = fixture.customer("Ada Obi");

    let overview = fixture.market.accounts().get_user(&customer).unwrap();
    assert!(overview.profile.is_some());
    assert!(overview.agent_profile.is_none());
    assert_eq!(overview.user.email, "ada.obi@example.com");
}

#[test]
fn duplicate_email_is_rejected() {
    let fixture = Fixture::new();
    fixture.customer("Ada Obi");

    let result = fixture.market.accounts().signup(
        SignupRequest {
            email: "ADA.OBI@example.com".to_string(),
            name: "Another Ada".to_string(),
            role: Some(UserRole::Customer),
        },
        now(),
    );

    match result {
        Err(AccountError::Repository(RepositoryError::Conflict(_))) => {}
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn only_staff_can_verify_agents() {
    let fixture = Fixture::new();
    let agent = fixture.pending_agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");

    match fixture
        .market
        .accounts()
        .verify_agent(&customer, agent.user_id, true)
    {
        Err(AccountError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let staff = fixture.staff();
    let profile = fixture
        .market
        .accounts()
        .verify_agent(&staff, agent.user_id, true)
        .unwrap();
    assert!(profile.verified);
    fixture
        .market
        .accounts()
        .verify_agent(&staff, agent.user_id, true)
        .unwrap();

    let approvals = fixture
        .subjects()
        .into_iter()
        .filter(|subject| subject.ends_with("Agent Profile Approved"))
        .count();
    assert_eq!(approvals, 1);
}

#[test]
fn verifying_an_unknown_agent_is_not_found() {
    let fixture = Fixture::new();
    let staff = fixture.staff();

    match fixture
        .market
        .accounts()
        .verify_agent(&staff, UserId::new(), true)
    {
        Err(AccountError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn directory_lists_only_verified_agents() {
    let fixture = Fixture::new();
    let approved = fixture.agent("Tunde Bello");
    fixture.pending_agent("Kemi Ade");

    let page = fixture.market.accounts().list_verified_agents(None).unwrap();
    assert_eq!(page.total_items, 1);
    assert_eq!(page.items[0].user_id, approved.user_id);
}

#[test]
fn agent_detail_counts_every_listing_but_shows_available_ones() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    fixture.property(&agent, "Garden flat");
    let mut hidden = crate::test_support::draft("Let out studio");
    hidden.is_available = false;
    fixture
        .market
        .listings()
        .create_property(&agent, hidden, now())
        .unwrap();

    let detail = fixture
        .market
        .accounts()
        .agent_detail(agent.user_id, None, now())
        .unwrap();
    assert_eq!(detail.property_count, 2);
    assert_eq!(detail.properties.total_items, 1);
    assert_eq!(detail.properties.items[0].title, "Garden flat");
}

#[test]
fn contacting_an_agent_emails_them_with_reply_to() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let sent = fixture
        .market
        .accounts()
        .contact_agent(agent.user_id, &contact_request())
        .unwrap();
    assert!(sent);

    let email = fixture
        .mailer
        .sent()
        .into_iter()
        .find(|email| email.subject.ends_with("New inquiry from Ngozi Eze"))
        .expect("inquiry email");
    assert_eq!(email.to, vec!["tunde.bello@example.com".to_string()]);
    assert_eq!(email.reply_to.as_deref(), Some("ngozi@example.com"));
}

#[test]
fn contact_form_validates_email() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let mut request = contact_request();
    request.email = "ngozi".to_string();

    match fixture
        .market
        .accounts()
        .contact_agent(agent.user_id, &request)
    {
        Err(AccountError::Validation(field)) => assert_eq!(field.field, "email"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn agent_profile_update_trims_fields_and_rejects_customers() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");

    let profile = fixture
        .market
        .accounts()
        .update_agent_profile(&agent, office_update())
        .unwrap();
    assert_eq!(profile.company_name.as_deref(), Some("Harbor Homes"));
    assert_eq!(profile.description, None);
    assert!(profile.verified);

    match fixture
        .market
        .accounts()
        .update_agent_profile(&customer, office_update())
    {
        Err(AccountError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn user_profile_rejects_long_phone_numbers() {
    let fixture = Fixture::new();
    let customer = fixture.customer("Ada Obi");

    let result = fixture.market.accounts().update_user_profile(
        &customer,
        UserProfileUpdate {
            phone_number: Some("1".repeat(16)),
            ..UserProfileUpdate::default()
        },
    );
    match result {
        Err(AccountError::Validation(field)) => assert_eq!(field.field, "phone_number"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn dashboards_summarize_activity() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let property = fixture.property(&agent, "Garden flat");

    fixture
        .market
        .listings()
        .toggle_favorite(&customer, property.id, now())
        .unwrap();
    fixture
        .market
        .listings()
        .subscribe(
            &customer,
            AlertRequest {
                location: Some("Lekki".to_string()),
                property_type: None,
            },
            now(),
        )
        .unwrap();

    let customer_view = fixture
        .market
        .accounts()
        .customer_dashboard(&customer)
        .unwrap();
    assert_eq!(customer_view.favorite_count, 1);
    assert_eq!(customer_view.alert_subscriptions, 1);
    assert_eq!(customer_view.lead_count, 0);

    let agent_view = fixture
        .market
        .accounts()
        .agent_dashboard(&agent, now())
        .unwrap();
    assert_eq!(agent_view.property_count, 1);
    assert_eq!(agent_view.current_plan, SubscriptionPlan::Basic);
    assert!(agent_view.verified);
    assert!(agent_view
        .leads_by_status
        .iter()
        .all(|(_, count)| *count == 0));
}
