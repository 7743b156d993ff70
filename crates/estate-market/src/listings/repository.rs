use super::domain::{
    Amenity, FavoriteProperty, Property, PropertyImage, PropertySubscription, PropertyType,
};
use crate::shared::{AlertSubscriptionId, FavoriteId, ImageId, PropertyId, UserId};
use crate::store::RepositoryError;

/// Storage abstraction for listings and the rows hanging off them.
pub trait ListingRepository: Send + Sync {
    /// Fails with `Conflict` when the slug is taken.
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn update_property(&self, property: Property) -> Result<(), RepositoryError>;
    fn property(&self, id: PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn property_by_slug(&self, slug: &str) -> Result<Option<Property>, RepositoryError>;
    fn properties(&self) -> Result<Vec<Property>, RepositoryError>;
    /// Removes the property along with its images, favorites, leads, viewings
    /// and featured boosts.
    fn delete_property(&self, id: PropertyId) -> Result<Property, RepositoryError>;

    fn custom_property_types(&self) -> Result<Vec<PropertyType>, RepositoryError>;
    fn insert_custom_property_type(&self, kind: PropertyType) -> Result<(), RepositoryError>;

    fn insert_image(&self, image: PropertyImage) -> Result<PropertyImage, RepositoryError>;
    fn image(&self, id: ImageId) -> Result<Option<PropertyImage>, RepositoryError>;
    fn delete_image(&self, id: ImageId) -> Result<(), RepositoryError>;
    fn images_for(&self, property: PropertyId) -> Result<Vec<PropertyImage>, RepositoryError>;

    fn insert_amenity(&self, amenity: Amenity) -> Result<Amenity, RepositoryError>;
    fn amenities(&self) -> Result<Vec<Amenity>, RepositoryError>;

    /// Fails with `Conflict` when the user already favorited the property.
    fn insert_favorite(
        &self,
        favorite: FavoriteProperty,
    ) -> Result<FavoriteProperty, RepositoryError>;
    fn favorite(&self, id: FavoriteId) -> Result<Option<FavoriteProperty>, RepositoryError>;
    fn favorite_for(
        &self,
        user: UserId,
        property: PropertyId,
    ) -> Result<Option<FavoriteProperty>, RepositoryError>;
    fn delete_favorite(&self, id: FavoriteId) -> Result<(), RepositoryError>;
    fn favorites_for_user(&self, user: UserId) -> Result<Vec<FavoriteProperty>, RepositoryError>;
    fn favorites_for_property(
        &self,
        property: PropertyId,
    ) -> Result<Vec<FavoriteProperty>, RepositoryError>;

    /// Fails with `Conflict` when the user holds an alert with the same criteria.
    fn insert_alert(
        &self,
        alert: PropertySubscription,
    ) -> Result<PropertySubscription, RepositoryError>;
    fn update_alert(&self, alert: PropertySubscription) -> Result<(), RepositoryError>;
    fn alert(
        &self,
        id: AlertSubscriptionId,
    ) -> Result<Option<PropertySubscription>, RepositoryError>;
    fn delete_alert(&self, id: AlertSubscriptionId) -> Result<(), RepositoryError>;
    fn alerts(&self) -> Result<Vec<PropertySubscription>, RepositoryError>;
}
