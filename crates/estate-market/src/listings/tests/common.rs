pub(super) use crate::test_support::*;

use std::sync::Arc;

use crate::accounts::Actor;
use crate::config::MailConfig;
use crate::listings::{
    AlertRequest, Amenity, FavoriteProperty, ImageUpload, ListingRepository, ListingService,
    Property, PropertyImage, PropertySubscription, PropertyType,
};
use crate::mail::Postman;
use crate::messaging::{MessagingRepository, Notification, Notifier};
use crate::shared::{AlertSubscriptionId, FavoriteId, ImageId, PropertyId, UserId};
use crate::store::RepositoryError;

pub(super) fn alert(location: Option<&str>, property_type: Option<&str>) -> AlertRequest {
    AlertRequest {
        location: location.map(str::to_string),
        property_type: property_type.map(str::to_string),
    }
}

pub(super) fn photo(file_name: &str) -> ImageUpload {
    ImageUpload {
        file_name: file_name.to_string(),
        content_type: None,
        storage_key: format!("properties/{file_name}"),
    }
}

pub(super) fn notifications(fixture: &Fixture, actor: &Actor) -> Vec<Notification> {
    fixture
        .store
        .notifications_for(actor.user_id)
        .expect("notifications")
}

pub(super) fn reprice(
    fixture: &Fixture,
    agent: &Actor,
    property: &Property,
    price: i64,
) -> Property {
    let mut update = draft(&property.title);
    update.price = price;
    fixture
        .market
        .listings()
        .update_property(agent, property.id, update, now())
        .expect("update property")
}

/// Listing storage whose alert and favorite lookups are down while writes
/// still succeed.
pub(super) struct AudienceDown {
    inner: Arc<dyn ListingRepository>,
}

fn audience_down<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("audience index offline".to_string()))
}

impl ListingRepository for AudienceDown {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        self.inner.insert_property(property)
    }
    fn update_property(&self, property: Property) -> Result<(), RepositoryError> {
        self.inner.update_property(property)
    }
    fn property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError> {
        self.inner.property(id)
    }
    fn property_by_slug(&self, slug: &str) -> Result<Option<Property>, RepositoryError> {
        self.inner.property_by_slug(slug)
    }
    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        self.inner.properties()
    }
    fn delete_property(&self, id: PropertyId) -> Result<Property, RepositoryError> {
        self.inner.delete_property(id)
    }
    fn custom_property_types(&self) -> Result<Vec<PropertyType>, RepositoryError> {
        self.inner.custom_property_types()
    }
    fn insert_custom_property_type(&self, kind: PropertyType) -> Result<(), RepositoryError> {
        self.inner.insert_custom_property_type(kind)
    }
    fn insert_image(&self, image: PropertyImage) -> Result<PropertyImage, RepositoryError> {
        self.inner.insert_image(image)
    }
    fn image(&self, id: ImageId) -> Result<Option<PropertyImage>, RepositoryError> {
        self.inner.image(id)
    }
    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError> {
        self.inner.delete_image(id)
    }
    fn images_for(&self, property: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError> {
        self.inner.images_for(property)
    }
    fn insert_amenity(&self, amenity: Amenity) -> Result<Amenity, RepositoryError> {
        self.inner.insert_amenity(amenity)
    }
    fn amenities(&self) -> Result<Vec<Amenity>, RepositoryError> {
        self.inner.amenities()
    }
    fn insert_favorite(
        &self,
        favorite: FavoriteProperty,
    ) -> Result<FavoriteProperty, RepositoryError> {
        self.inner.insert_favorite(favorite)
    }
    fn favorite(&self, id: FavoriteId) -> Result<Option<FavoriteProperty>, RepositoryError> {
        self.inner.favorite(id)
    }
    fn favorite_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<FavoriteProperty>, RepositoryError> {
        self.inner.favorite_for(user, property)
    }
    fn delete_favorite(&self, id: FavoriteId) -> Result<(), RepositoryError> {
        self.inner.delete_favorite(id)
    }
    fn favorites_for_user(&self, user: UserId) -> Result<Vec<FavoriteProperty>, RepositoryError> {
        self.inner.favorites_for_user(user)
    }
    fn favorites_for_property(
        &self,
        _property: PropertyId,
    ) -> Result<Vec<FavoriteProperty>, RepositoryError> {
        audience_down()
    }
    fn insert_alert(
        &self,
        alert: PropertySubscription,
    ) -> Result<PropertySubscription, RepositoryError> {
        self.inner.insert_alert(alert)
    }
    fn update_alert(&self, alert: PropertySubscription) -> Result<(), RepositoryError> {
        self.inner.update_alert(alert)
    }
    fn alert(
        &self,
        id: AlertSubscriptionId,
    ) -> Result<Option<PropertySubscription>, RepositoryError> {
        self.inner.alert(id)
    }
    fn delete_alert(&self, id: AlertSubscriptionId) -> Result<(), RepositoryError> {
        self.inner.delete_alert(id)
    }
    fn alerts(&self) -> Result<Vec<PropertySubscription>, RepositoryError> {
        audience_down()
    }
}

/// A listing service over the fixture's store with the alert audience
/// unavailable.
pub(super) fn listings_without_audience(fixture: &Fixture) -> ListingService {
    let notifier = Arc::new(Notifier::new(
        fixture.store.clone(),
        fixture.store.clone(),
        Postman::new(fixture.mailer.clone(), MailConfig::default()),
    ));
    ListingService::new(
        Arc::new(AudienceDown {
            inner: fixture.store.clone(),
        }),
        fixture.store.clone(),
        fixture.market.billing().clone(),
        notifier,
    )
}
