use super::common::*;

use crate::accounts::AccountError;
use crate::billing::BillingError;
use crate::listings::{
    FavoriteToggle, ListingError, ListingRepository, ListingType, PropertyType, SearchFilter,
};
use crate::messaging::NotificationKind;
use crate::shared::Money;

#[test]
fn pending_agents_and_customers_cannot_list() {
    let fixture = Fixture::new();
    let pending = fixture.pending_agent("Kemi Ade");
    let customer = fixture.customer("Ada Obi");

    match fixture
        .market
        .listings()
        .create_property(&pending, draft("Garden flat"), now())
    {
        Err(ListingError::Account(AccountError::AgentNotApproved)) => {}
        other => panic!("expected agent not approved, got {other:?}"),
    }
    match fixture
        .market
        .listings()
        .create_property(&customer, draft("Garden flat"), now())
    {
        Err(ListingError::Account(AccountError::Forbidden)) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
}

#[test]
fn repeated_titles_get_numbered_slugs() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let first = fixture.property(&agent, "Garden Flat!");
    let second = fixture.property(&agent, "Garden flat");
    let third = fixture.property(&agent, "garden   flat");

    assert_eq!(first.slug, "garden-flat");
    assert_eq!(second.slug, "garden-flat-2");
    assert_eq!(third.slug, "garden-flat-3");
    assert_eq!(first.listing_type, ListingType::Rent);
}

#[test]
fn trial_plan_caps_listing_count() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    for n in 0..5 {
        fixture.property(&agent, &format!("Unit {n}"));
    }

    match fixture
        .market
        .listings()
        .create_property(&agent, draft("Unit 6"), now())
    {
        Err(ListingError::Billing(BillingError::LimitReached { limit, .. })) => {
            assert_eq!(limit, 5)
        }
        other => panic!("expected limit reached, got {other:?}"),
    }
}

#[test]
fn typed_property_types_are_created_once_and_browsable() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");

    let mut custom = draft("Riverside storage");
    custom.property_type = None;
    custom.new_property_type = Some("Warehouse".to_string());
    let listed = fixture
        .market
        .listings()
        .create_property(&agent, custom.clone(), now())
        .unwrap();
    assert_eq!(listed.property_type, PropertyType::Custom("Warehouse".to_string()));

    custom.new_property_type = Some("warehouse".to_string());
    let again = fixture
        .market
        .listings()
        .create_property(&agent, custom, now())
        .unwrap();
    assert_eq!(again.property_type, PropertyType::Custom("Warehouse".to_string()));

    let page = fixture
        .market
        .listings()
        .properties_by_type("WAREHOUSE", None, now())
        .unwrap();
    assert_eq!(page.total_items, 2);

    match fixture
        .market
        .listings()
        .properties_by_type("castle", None, now())
    {
        Err(ListingError::NotFound) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn listing_validation_names_the_field() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let cases = [
        ("price", {
            let mut bad = draft("Garden flat");
            bad.price = -1;
            bad
        }),
        ("property_type", {
            let mut bad = draft("Garden flat");
            bad.property_type = Some("castle".to_string());
            bad
        }),
        ("new_property_type", {
            let mut bad = draft("Garden flat");
            bad.new_property_type = Some("ab".to_string());
            bad
        }),
        ("location", {
            let mut bad = draft("Garden flat");
            bad.location = "  ".to_string();
            bad
        }),
    ];

    for (field, bad) in cases {
        match fixture.market.listings().create_property(&agent, bad, now()) {
            Err(ListingError::Validation(error)) => assert_eq!(error.field, field),
            other => panic!("expected {field} validation error, got {other:?}"),
        }
    }
}

#[test]
fn new_listings_notify_matching_alert_subscribers() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let interested = fixture.customer("Ada Obi");
    let elsewhere = fixture.customer("Bayo Musa");

    fixture
        .market
        .listings()
        .subscribe(&interested, alert(Some("lekki"), Some("Apartment")), now())
        .unwrap();
    fixture
        .market
        .listings()
        .subscribe(&elsewhere, alert(Some("Abuja"), None), now())
        .unwrap();

    fixture.property(&agent, "Garden flat");

    let received = notifications(&fixture, &interested);
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].kind, NotificationKind::NewListing);
    assert_eq!(received[0].title, "New Property Listing");
    assert!(notifications(&fixture, &elsewhere).is_empty());
}

#[test]
fn price_changes_reach_favoriting_subscribers_only() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let watcher = fixture.customer("Ada Obi");
    let casual = fixture.customer("Bayo Musa");
    let property = fixture.property(&agent, "Garden flat");

    for customer in [&watcher, &casual] {
        fixture
            .market
            .listings()
            .toggle_favorite(customer, property.id, now())
            .unwrap();
    }
    fixture
        .market
        .listings()
        .subscribe(&watcher, alert(Some("Lagos"), None), now())
        .unwrap();

    reprice(&fixture, &agent, &property, 1_000_000);

    let updates: Vec<_> = notifications(&fixture, &watcher)
        .into_iter()
        .filter(|notification| notification.kind == NotificationKind::PriceChange)
        .collect();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].title, "Price Update: Garden flat");
    assert!(notifications(&fixture, &casual).is_empty());
}

#[test]
fn unreachable_alert_audience_does_not_fail_the_write() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    fixture
        .market
        .listings()
        .subscribe(&customer, alert(Some("Lekki"), None), now())
        .unwrap();
    let listings = listings_without_audience(&fixture);

    let property = listings
        .create_property(&agent, draft("Garden flat"), now())
        .unwrap();
    assert_eq!(property.slug, "garden-flat");
    assert!(notifications(&fixture, &customer).is_empty());

    let mut update = draft("Garden flat");
    update.price = 900_000;
    let updated = listings
        .update_property(&agent, property.id, update, now())
        .unwrap();
    assert_eq!(updated.price, Money::from_major(900_000));
    assert_eq!(
        fixture
            .store
            .property(property.id)
            .unwrap()
            .expect("stored")
            .price,
        Money::from_major(900_000)
    );
}

#[test]
fn only_the_owner_can_change_a_listing() {
    let fixture = Fixture::new();
    let owner = fixture.agent("Tunde Bello");
    let rival = fixture.agent("Kemi Ade");
    let property = fixture.property(&owner, "Garden flat");

    match fixture
        .market
        .listings()
        .update_property(&rival, property.id, draft("Mine now"), now())
    {
        Err(ListingError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    match fixture.market.listings().delete_property(&rival, property.id) {
        Err(ListingError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let updated = reprice(&fixture, &owner, &property, 900_000);
    assert_eq!(updated.slug, property.slug);
    fixture
        .market
        .listings()
        .delete_property(&owner, property.id)
        .unwrap();
}

#[test]
fn favorites_toggle_and_tell_the_agent() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let property = fixture.property(&agent, "Garden flat");
    let listings = fixture.market.listings();

    assert_eq!(
        listings.toggle_favorite(&customer, property.id, now()).unwrap(),
        FavoriteToggle::Added
    );
    assert_eq!(listings.favorite_count(&customer).unwrap(), 1);
    assert!(fixture.mailed("Your property was favorited"));
    assert!(notifications(&fixture, &agent)
        .iter()
        .any(|notification| notification.title == "Property Favorited"));

    assert_eq!(
        listings.toggle_favorite(&customer, property.id, now()).unwrap(),
        FavoriteToggle::Removed
    );
    assert!(listings.favorites(&customer, now()).unwrap().is_empty());
}

#[test]
fn favorites_belong_to_their_owner() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let owner = fixture.customer("Ada Obi");
    let other = fixture.customer("Bayo Musa");
    let property = fixture.property(&agent, "Garden flat");
    let listings = fixture.market.listings();

    listings.toggle_favorite(&owner, property.id, now()).unwrap();
    let favorite = listings.favorites(&owner, now()).unwrap().remove(0).favorite;

    match listings.delete_favorite(&other, favorite.id) {
        Err(ListingError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }
    listings.delete_favorite(&owner, favorite.id).unwrap();
}

#[test]
fn featured_listings_rank_first_in_search() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let older = fixture.property(&agent, "Garden flat");
    fixture.property(&agent, "Penthouse suite");

    fixture
        .market
        .billing()
        .feature_property(&agent, older.id, now())
        .unwrap();

    let page = fixture
        .market
        .listings()
        .search(&SearchFilter::default(), now())
        .unwrap();
    assert_eq!(page.total_items, 2);
    assert_eq!(page.items[0].id, older.id);
    assert!(page.items[0].is_featured);
    assert!(!page.items[1].is_featured);

    let sales = fixture
        .market
        .listings()
        .search_listing_type(SearchFilter::default(), ListingType::ForSale, now())
        .unwrap();
    assert_eq!(sales.total_items, 0);
}

#[test]
fn detail_reports_favorite_state_and_similar_listings() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let customer = fixture.customer("Ada Obi");
    let property = fixture.property(&agent, "Garden flat");
    fixture.property(&agent, "Second flat");
    fixture
        .market
        .listings()
        .toggle_favorite(&customer, property.id, now())
        .unwrap();

    let detail = fixture
        .market
        .listings()
        .property_detail(&property.slug, Some(&customer), now())
        .unwrap();
    assert!(detail.is_favorited);
    assert_eq!(detail.similar.len(), 1);
    assert_eq!(
        detail.agent.map(|agent| agent.name),
        Some("Tunde Bello".to_string())
    );

    let anonymous = fixture
        .market
        .listings()
        .property_detail(&property.slug, None, now())
        .unwrap();
    assert!(!anonymous.is_favorited);
}

#[test]
fn images_must_be_images() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let property = fixture.property(&agent, "Garden flat");
    let listings = fixture.market.listings();

    let image = listings
        .add_image(&agent, property.id, photo("front.JPG"), now())
        .unwrap();
    assert_eq!(image.content_type, "image/jpeg");

    match listings.add_image(&agent, property.id, photo("notes.txt"), now()) {
        Err(ListingError::Validation(error)) => assert_eq!(error.field, "image"),
        other => panic!("expected image validation error, got {other:?}"),
    }

    assert_eq!(listings.gallery(property.id, None).unwrap().total_items, 1);
    listings.delete_image(&agent, property.id, image.id).unwrap();
    assert_eq!(listings.gallery(property.id, None).unwrap().total_items, 0);
}

#[test]
fn alert_subscriptions_are_idempotent() {
    let fixture = Fixture::new();
    let customer = fixture.customer("Ada Obi");
    let listings = fixture.market.listings();

    let first = listings
        .subscribe(&customer, alert(Some("Lekki"), Some("house")), now())
        .unwrap();
    let repeat = listings
        .subscribe(&customer, alert(Some("lekki"), Some("House")), now())
        .unwrap();

    assert!(first.created);
    assert!(!repeat.created);
    assert_eq!(first.alert.id, repeat.alert.id);
    assert_eq!(listings.alerts(&customer).unwrap().len(), 1);
}

#[test]
fn amenities_are_staff_managed() {
    let fixture = Fixture::new();
    let agent = fixture.agent("Tunde Bello");
    let staff = fixture.staff();
    let listings = fixture.market.listings();

    match listings.create_amenity(
        &agent,
        crate::listings::AmenityDraft {
            name: "Pool".to_string(),
            description: None,
        },
    ) {
        Err(ListingError::Forbidden) => {}
        other => panic!("expected forbidden, got {other:?}"),
    }

    let pool = listings
        .create_amenity(
            &staff,
            crate::listings::AmenityDraft {
                name: "Pool".to_string(),
                description: Some("  ".to_string()),
            },
        )
        .unwrap();
    assert_eq!(pool.description, None);

    let mut with_pool = draft("Pool house");
    with_pool.amenities = vec![pool.id, pool.id];
    let property = listings.create_property(&agent, with_pool, now()).unwrap();
    assert_eq!(property.amenities, vec![pool.id]);
}
