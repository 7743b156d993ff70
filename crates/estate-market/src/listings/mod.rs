//! Property listings and everything customers do with them: search, detail
//! pages, galleries, favorites and saved-search alerts.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    AlertReceipt, AlertRequest, Amenity, AmenityDraft, FavoriteEntry, FavoriteProperty,
    FavoriteToggle, FavoriteToggleRequest, HomeFeed, ImageUpload, ListingType, Property,
    PropertyCard, PropertyDetail, PropertyDraft, PropertyImage, PropertySubscription,
    PropertyType, SearchFilter,
};
pub use repository::ListingRepository;
pub use router::listing_router;
pub use service::{ListingError, ListingService};
