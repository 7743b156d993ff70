use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AgentSummary;
use crate::shared::{
    AlertSubscriptionId, AmenityId, FavoriteId, ImageId, Money, PropertyId, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingType {
    Rent,
    ForSale,
}

impl ListingType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rent" => Some(Self::Rent),
            "for_sale" | "sale" | "buy" => Some(Self::ForSale),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ListingType::Rent => "For Rent",
            ListingType::ForSale => "For Sale",
        }
    }
}

/// Built-in property categories plus agent-defined ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PropertyType {
    Apartment,
    House,
    Studio,
    Office,
    EventHall,
    Custom(String),
}

impl PropertyType {
    pub const BUILT_IN: [PropertyType; 5] = [
        PropertyType::Apartment,
        PropertyType::House,
        PropertyType::Studio,
        PropertyType::Office,
        PropertyType::EventHall,
    ];

    /// Resolve a built-in key or label case-insensitively; anything else is
    /// kept as a custom type with its original spelling.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let normalized = trimmed.to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "apartment" => Self::Apartment,
            "house" => Self::House,
            "studio" => Self::Studio,
            "office" => Self::Office,
            "event_hall" | "eventhall" => Self::EventHall,
            _ => Self::Custom(trimmed.to_string()),
        }
    }

    pub fn key(&self) -> String {
        match self {
            PropertyType::Apartment => "apartment".to_string(),
            PropertyType::House => "house".to_string(),
            PropertyType::Studio => "studio".to_string(),
            PropertyType::Office => "office".to_string(),
            PropertyType::EventHall => "event_hall".to_string(),
            PropertyType::Custom(name) => name.clone(),
        }
    }

    pub fn label(&self) -> String {
        match self {
            PropertyType::Apartment => "Apartment".to_string(),
            PropertyType::House => "House".to_string(),
            PropertyType::Studio => "Studio".to_string(),
            PropertyType::Office => "Office".to_string(),
            PropertyType::EventHall => "Event Hall".to_string(),
            PropertyType::Custom(name) => name.clone(),
        }
    }

    pub fn same_as(&self, other: &PropertyType) -> bool {
        self.key().eq_ignore_ascii_case(&other.key())
    }
}

impl From<String> for PropertyType {
    fn from(value: String) -> Self {
        PropertyType::parse(&value)
    }
}

impl From<PropertyType> for String {
    fn from(value: PropertyType) -> Self {
        value.key()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub agent_id: UserId,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub price: Money,
    pub location: String,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub amenities: Vec<AmenityId>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_available() -> bool {
    true
}

/// Create/update payload. Numbers arrive signed so negative input is reported
/// as a field error instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct PropertyDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub new_property_type: Option<String>,
    /// Whole naira.
    pub price: i64,
    pub location: String,
    #[serde(default)]
    pub bedrooms: i64,
    #[serde(default)]
    pub bathrooms: i64,
    #[serde(default)]
    pub sqft: i64,
    #[serde(default)]
    pub amenities: Vec<AmenityId>,
    #[serde(default = "default_available")]
    pub is_available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub id: ImageId,
    pub property_id: PropertyId,
    pub file_name: String,
    pub content_type: String,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

/// Descriptor of an already-stored upload.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageUpload {
    pub file_name: String,
    #[serde(default)]
    pub content_type: Option<String>,
    pub storage_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenity {
    pub id: AmenityId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AmenityDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteProperty {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub property_id: PropertyId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteToggle {
    Added,
    Removed,
}

/// Saved search: "tell me about new listings like this".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySubscription {
    pub id: AlertSubscriptionId,
    pub user_id: UserId,
    pub location: Option<String>,
    pub property_type: Option<PropertyType>,
    pub created_at: DateTime<Utc>,
}

impl PropertySubscription {
    pub fn matches(&self, property: &Property) -> bool {
        let type_matches = self
            .property_type
            .as_ref()
            .map_or(true, |wanted| wanted.same_as(&property.property_type));
        let location_matches = self.location.as_deref().map_or(true, |wanted| {
            property
                .location
                .to_lowercase()
                .contains(&wanted.to_lowercase())
        });
        type_matches && location_matches
    }

    pub(crate) fn same_criteria(&self, other: &PropertySubscription) -> bool {
        self.user_id == other.user_id
            && self.location.as_deref().map(str::to_lowercase)
                == other.location.as_deref().map(str::to_lowercase)
            && match (&self.property_type, &other.property_type) {
                (Some(left), Some(right)) => left.same_as(right),
                (None, None) => true,
                _ => false,
            }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlertRequest {
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
}

/// Search query. Numeric filters are parsed leniently; unparseable values are
/// ignored rather than rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub listing_type: Option<String>,
    #[serde(default)]
    pub min_price: Option<String>,
    #[serde(default)]
    pub max_price: Option<String>,
    #[serde(default)]
    pub min_bedrooms: Option<String>,
    #[serde(default)]
    pub min_bathrooms: Option<String>,
    /// Comma separated amenity ids; a property must carry all of them.
    #[serde(default)]
    pub amenities: Option<String>,
    #[serde(default)]
    pub page: Option<String>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|raw| !raw.is_empty())
}

impl SearchFilter {
    pub fn matches(&self, property: &Property) -> bool {
        if let Some(q) = non_blank(&self.q) {
            let q = q.to_lowercase();
            if !property.title.to_lowercase().contains(&q)
                && !property.description.to_lowercase().contains(&q)
            {
                return false;
            }
        }
        if let Some(location) = non_blank(&self.location) {
            if !property
                .location
                .to_lowercase()
                .contains(&location.to_lowercase())
            {
                return false;
            }
        }
        if let Some(kind) = non_blank(&self.property_type) {
            if !PropertyType::parse(kind).same_as(&property.property_type) {
                return false;
            }
        }
        if let Some(listing) = non_blank(&self.listing_type).and_then(ListingType::parse) {
            if listing != property.listing_type {
                return false;
            }
        }
        if let Some(min) = parse_number(&self.min_price) {
            if property.price < Money::from_major(min) {
                return false;
            }
        }
        if let Some(max) = parse_number(&self.max_price) {
            if property.price > Money::from_major(max) {
                return false;
            }
        }
        if let Some(min) = parse_number(&self.min_bedrooms) {
            if u64::from(property.bedrooms) < min {
                return false;
            }
        }
        if let Some(min) = parse_number(&self.min_bathrooms) {
            if u64::from(property.bathrooms) < min {
                return false;
            }
        }
        self.amenity_ids()
            .iter()
            .all(|wanted| property.amenities.contains(wanted))
    }

    pub fn amenity_ids(&self) -> Vec<AmenityId> {
        non_blank(&self.amenities)
            .map(|raw| {
                raw.split(',')
                    .filter_map(|part| part.parse::<AmenityId>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn parse_number(value: &Option<String>) -> Option<u64> {
    non_blank(value).and_then(|raw| raw.parse::<u64>().ok())
}

/// Compact listing row used by search results and feeds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyCard {
    pub id: PropertyId,
    pub slug: String,
    pub title: String,
    pub price: Money,
    pub price_display: String,
    pub location: String,
    pub property_type: PropertyType,
    pub listing_type: ListingType,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub sqft: u32,
    pub is_available: bool,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl PropertyCard {
    pub fn new(property: &Property, is_featured: bool) -> Self {
        Self {
            id: property.id,
            slug: property.slug.clone(),
            title: property.title.clone(),
            price: property.price,
            price_display: property.price.to_string(),
            location: property.location.clone(),
            property_type: property.property_type.clone(),
            listing_type: property.listing_type,
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            sqft: property.sqft,
            is_available: property.is_available,
            is_featured,
            created_at: property.created_at,
        }
    }
}

/// A favorite with the card of the property it points at.
#[derive(Debug, Clone, Serialize)]
pub struct FavoriteEntry {
    pub favorite: FavoriteProperty,
    pub property: PropertyCard,
}

/// Outcome of subscribing to alerts; `created` is false for a repeat.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReceipt {
    pub alert: PropertySubscription,
    pub created: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FavoriteToggleRequest {
    pub property_id: PropertyId,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyDetail {
    pub property: Property,
    pub price_display: String,
    pub images: Vec<PropertyImage>,
    pub amenities: Vec<Amenity>,
    pub agent: Option<AgentSummary>,
    pub is_featured: bool,
    pub is_favorited: bool,
    pub similar: Vec<PropertyCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HomeFeed {
    pub properties: Vec<PropertyCard>,
    pub agents: Vec<AgentSummary>,
}
