use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::domain::{
    AlertReceipt, AlertRequest, Amenity, AmenityDraft, FavoriteEntry, FavoriteProperty,
    FavoriteToggle, HomeFeed, ImageUpload, ListingType, Property, PropertyCard, PropertyDetail,
    PropertyDraft, PropertyImage, PropertySubscription, PropertyType, SearchFilter,
};
use super::repository::ListingRepository;
use crate::accounts::domain::clean_optional;
use crate::accounts::service::{approved_agent, verified_agents};
use crate::accounts::{AccountError, AccountRepository, Actor, AgentSummary, AgentType};
use crate::billing::{BillingError, BillingService, Feature};
use crate::error::FieldError;
use crate::messaging::{NotificationDraft, NotificationKind, Notifier};
use crate::shared::{
    slugify, AlertSubscriptionId, AmenityId, FavoriteId, ImageId, Money, Page, PropertyId,
};
use crate::store::RepositoryError;

pub const MY_PROPERTIES_PER_PAGE: usize = 10;
pub const SEARCH_PER_PAGE: usize = 6;
pub const TYPE_PER_PAGE: usize = 12;
pub const GALLERY_PER_PAGE: usize = 12;
pub const HOME_FEED_SIZE: usize = 6;
const SIMILAR_LIMIT: usize = 3;
const MAX_TITLE_LEN: usize = 255;
const MIN_CUSTOM_TYPE_LEN: usize = 3;

/// Validated property fields ready to be written.
struct ListingFields {
    title: String,
    description: String,
    property_type: PropertyType,
    new_custom_type: bool,
    price: Money,
    location: String,
    bedrooms: u32,
    bathrooms: u32,
    sqft: u32,
    amenities: Vec<AmenityId>,
    is_available: bool,
}

/// Service backing listings, images, amenities, favorites and search alerts.
pub struct ListingService {
    repository: Arc<dyn ListingRepository>,
    accounts: Arc<dyn AccountRepository>,
    billing: Arc<BillingService>,
    notifier: Arc<Notifier>,
}

impl ListingService {
    pub fn new(
        repository: Arc<dyn ListingRepository>,
        accounts: Arc<dyn AccountRepository>,
        billing: Arc<BillingService>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            repository,
            accounts,
            billing,
            notifier,
        }
    }

    pub fn create_property(
        &self,
        actor: &Actor,
        draft: PropertyDraft,
        now: DateTime<Utc>,
    ) -> Result<Property, ListingError> {
        let profile = approved_agent(self.accounts.as_ref(), actor)?;
        let owned = self
            .repository
            .properties()?
            .iter()
            .filter(|property| property.agent_id == actor.user_id)
            .count();
        self.billing
            .check_feature_limit(actor.user_id, Feature::Properties, owned, now)?;

        let fields = self.validate(draft)?;
        if fields.new_custom_type {
            self.repository
                .insert_custom_property_type(fields.property_type.clone())?;
        }

        let mut property = Property {
            id: PropertyId::new(),
            agent_id: actor.user_id,
            title: fields.title,
            slug: String::new(),
            description: fields.description,
            property_type: fields.property_type,
            listing_type: listing_type_for(profile.agent_type),
            price: fields.price,
            location: fields.location,
            bedrooms: fields.bedrooms,
            bathrooms: fields.bathrooms,
            sqft: fields.sqft,
            amenities: fields.amenities,
            is_available: fields.is_available,
            created_at: now,
            updated_at: now,
        };

        let base = slug_base(&property.title);
        let mut attempt = 1;
        let property = loop {
            property.slug = self.free_slug(&base, attempt)?;
            match self.repository.insert_property(property.clone()) {
                Ok(saved) => break saved,
                Err(RepositoryError::Conflict(_)) => attempt += 1,
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            agent = %actor.user_id,
            property = %property.id,
            slug = %property.slug,
            "property listed"
        );
        if property.is_available {
            self.notify_new_listing(&property, now);
        }
        Ok(property)
    }

    pub fn update_property(
        &self,
        actor: &Actor,
        id: PropertyId,
        draft: PropertyDraft,
        now: DateTime<Utc>,
    ) -> Result<Property, ListingError> {
        let mut property = self.owned_property(actor, id)?;
        let profile = self
            .accounts
            .agent_profile(actor.user_id)?
            .ok_or(ListingError::Forbidden)?;
        let fields = self.validate(draft)?;
        if fields.new_custom_type {
            self.repository
                .insert_custom_property_type(fields.property_type.clone())?;
        }

        let old_price = property.price;
        property.title = fields.title;
        property.description = fields.description;
        property.property_type = fields.property_type;
        property.listing_type = listing_type_for(profile.agent_type);
        property.price = fields.price;
        property.location = fields.location;
        property.bedrooms = fields.bedrooms;
        property.bathrooms = fields.bathrooms;
        property.sqft = fields.sqft;
        property.amenities = fields.amenities;
        property.is_available = fields.is_available;
        property.updated_at = now;
        self.repository.update_property(property.clone())?;

        if property.is_available && property.price != old_price {
            self.notify_price_change(&property, old_price, now);
        }
        Ok(property)
    }

    pub fn delete_property(&self, actor: &Actor, id: PropertyId) -> Result<(), ListingError> {
        self.owned_property(actor, id)?;
        let removed = self.repository.delete_property(id)?;
        info!(agent = %actor.user_id, property = %removed.id, "property deleted");
        Ok(())
    }

    /// The agent's own listings, newest first.
    pub fn agent_properties(
        &self,
        actor: &Actor,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Page<PropertyCard>, ListingError> {
        if !actor.is_agent() {
            return Err(ListingError::Forbidden);
        }
        let mut owned: Vec<_> = self
            .repository
            .properties()?
            .into_iter()
            .filter(|property| property.agent_id == actor.user_id)
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let featured = self.billing.featured_property_ids(now)?;
        Ok(Page::paginate(cards(&owned, &featured), page, MY_PROPERTIES_PER_PAGE))
    }

    pub fn property_detail(
        &self,
        slug: &str,
        viewer: Option<&Actor>,
        now: DateTime<Utc>,
    ) -> Result<PropertyDetail, ListingError> {
        let property = self
            .repository
            .property_by_slug(slug)?
            .ok_or(ListingError::NotFound)?;
        let featured = self.billing.featured_property_ids(now)?;

        let mut images = self.repository.images_for(property.id)?;
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let amenities = self
            .repository
            .amenities()?
            .into_iter()
            .filter(|amenity| property.amenities.contains(&amenity.id))
            .collect();
        let agent = match (
            self.accounts.user(property.agent_id)?,
            self.accounts.agent_profile(property.agent_id)?,
        ) {
            (Some(user), Some(profile)) => Some(AgentSummary::from_parts(&user, &profile)),
            _ => None,
        };
        let is_favorited = match viewer {
            Some(viewer) => self
                .repository
                .favorite_for(viewer.user_id, property.id)?
                .is_some(),
            None => false,
        };

        let location = property.location.to_lowercase();
        let mut similar: Vec<_> = self
            .repository
            .properties()?
            .into_iter()
            .filter(|other| other.is_available && other.id != property.id)
            .filter(|other| {
                other.location.to_lowercase().contains(&location)
                    || other.property_type.same_as(&property.property_type)
            })
            .collect();
        similar.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        similar.truncate(SIMILAR_LIMIT);

        Ok(PropertyDetail {
            price_display: property.price.to_string(),
            images,
            amenities,
            agent,
            is_featured: featured.contains(&property.id),
            is_favorited,
            similar: cards(&similar, &featured),
            property,
        })
    }

    /// Available listings matching the filter, featured first then newest.
    pub fn search(
        &self,
        filter: &SearchFilter,
        now: DateTime<Utc>,
    ) -> Result<Page<PropertyCard>, ListingError> {
        let matching = self.ranked(|property| filter.matches(property), now)?;
        Ok(Page::paginate(
            matching,
            filter.page.as_deref(),
            SEARCH_PER_PAGE,
        ))
    }

    /// Search restricted to rentals or sales.
    pub fn search_listing_type(
        &self,
        filter: SearchFilter,
        listing_type: ListingType,
        now: DateTime<Utc>,
    ) -> Result<Page<PropertyCard>, ListingError> {
        let matching = self.ranked(
            |property| property.listing_type == listing_type && filter.matches(property),
            now,
        )?;
        Ok(Page::paginate(
            matching,
            filter.page.as_deref(),
            SEARCH_PER_PAGE,
        ))
    }

    pub fn properties_by_type(
        &self,
        raw_type: &str,
        page: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Page<PropertyCard>, ListingError> {
        let wanted = self
            .known_type(raw_type)?
            .ok_or(ListingError::NotFound)?;
        let matching = self.ranked(
            |property| property.property_type.same_as(&wanted),
            now,
        )?;
        Ok(Page::paginate(matching, page, TYPE_PER_PAGE))
    }

    pub fn home_feed(&self, now: DateTime<Utc>) -> Result<HomeFeed, ListingError> {
        let mut properties = self.ranked(|_| true, now)?;
        properties.truncate(HOME_FEED_SIZE);
        let mut agents = verified_agents(self.accounts.as_ref())?;
        agents.truncate(HOME_FEED_SIZE);
        Ok(HomeFeed { properties, agents })
    }

    pub fn add_image(
        &self,
        actor: &Actor,
        property: PropertyId,
        upload: ImageUpload,
        now: DateTime<Utc>,
    ) -> Result<PropertyImage, ListingError> {
        self.owned_property(actor, property)?;
        let file_name = upload.file_name.trim();
        if file_name.is_empty() {
            return Err(FieldError::new("file_name", "File name is required.").into());
        }
        let storage_key = upload.storage_key.trim();
        if storage_key.is_empty() {
            return Err(FieldError::new("storage_key", "Storage key is required.").into());
        }

        let content_type = match upload
            .content_type
            .as_deref()
            .map(str::trim)
            .filter(|raw| !raw.is_empty())
        {
            Some(declared) => declared.parse::<mime::Mime>().ok(),
            None => mime_guess::from_path(file_name).first(),
        };
        let content_type = content_type
            .filter(|mime| mime.type_() == mime::IMAGE)
            .ok_or_else(|| FieldError::new("image", "Upload a valid image."))?;

        let image = self.repository.insert_image(PropertyImage {
            id: ImageId::new(),
            property_id: property,
            file_name: file_name.to_string(),
            content_type: content_type.essence_str().to_string(),
            storage_key: storage_key.to_string(),
            created_at: now,
        })?;
        debug!(%property, image = %image.id, "image attached");
        Ok(image)
    }

    pub fn delete_image(
        &self,
        actor: &Actor,
        property: PropertyId,
        image: ImageId,
    ) -> Result<(), ListingError> {
        self.owned_property(actor, property)?;
        match self.repository.image(image)? {
            Some(found) if found.property_id == property => {
                self.repository.delete_image(image)?;
                Ok(())
            }
            _ => Err(ListingError::NotFound),
        }
    }

    pub fn gallery(
        &self,
        property: PropertyId,
        page: Option<&str>,
    ) -> Result<Page<PropertyImage>, ListingError> {
        self.repository
            .property(property)?
            .ok_or(ListingError::NotFound)?;
        let mut images = self.repository.images_for(property)?;
        images.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(Page::paginate(images, page, GALLERY_PER_PAGE))
    }

    pub fn list_amenities(&self) -> Result<Vec<Amenity>, ListingError> {
        let mut amenities = self.repository.amenities()?;
        amenities.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(amenities)
    }

    pub fn create_amenity(
        &self,
        actor: &Actor,
        draft: AmenityDraft,
    ) -> Result<Amenity, ListingError> {
        if !actor.is_staff {
            return Err(ListingError::Forbidden);
        }
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(FieldError::new("name", "Name is required.").into());
        }
        Ok(self.repository.insert_amenity(Amenity {
            id: AmenityId::new(),
            name: name.to_string(),
            description: draft
                .description
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()),
        })?)
    }

    /// Add or remove the caller's favorite. Adding tells the listing agent.
    pub fn toggle_favorite(
        &self,
        actor: &Actor,
        property: PropertyId,
        now: DateTime<Utc>,
    ) -> Result<FavoriteToggle, ListingError> {
        let listing = self
            .repository
            .property(property)?
            .ok_or(ListingError::NotFound)?;

        if let Some(existing) = self.repository.favorite_for(actor.user_id, property)? {
            self.repository.delete_favorite(existing.id)?;
            return Ok(FavoriteToggle::Removed);
        }

        match self.repository.insert_favorite(FavoriteProperty {
            id: FavoriteId::new(),
            user_id: actor.user_id,
            property_id: property,
            created_at: now,
        }) {
            Ok(_) => {}
            Err(RepositoryError::Conflict(_)) => return Ok(FavoriteToggle::Added),
            Err(err) => return Err(err.into()),
        }

        self.notify_favorite(actor, &listing, now);
        Ok(FavoriteToggle::Added)
    }

    pub fn favorite_count(&self, actor: &Actor) -> Result<usize, ListingError> {
        Ok(self.repository.favorites_for_user(actor.user_id)?.len())
    }

    /// Newest favorites first.
    pub fn favorites(
        &self,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Vec<FavoriteEntry>, ListingError> {
        let featured = self.billing.featured_property_ids(now)?;
        let mut favorites = self.repository.favorites_for_user(actor.user_id)?;
        favorites.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut entries = Vec::with_capacity(favorites.len());
        for favorite in favorites {
            if let Some(property) = self.repository.property(favorite.property_id)? {
                entries.push(FavoriteEntry {
                    property: PropertyCard::new(&property, featured.contains(&property.id)),
                    favorite,
                });
            }
        }
        Ok(entries)
    }

    pub fn favorite_ids(&self, actor: &Actor) -> Result<Vec<PropertyId>, ListingError> {
        Ok(self
            .repository
            .favorites_for_user(actor.user_id)?
            .into_iter()
            .map(|favorite| favorite.property_id)
            .collect())
    }

    pub fn delete_favorite(&self, actor: &Actor, id: FavoriteId) -> Result<(), ListingError> {
        let favorite = self
            .repository
            .favorite(id)?
            .ok_or(ListingError::NotFound)?;
        if favorite.user_id != actor.user_id {
            return Err(ListingError::Forbidden);
        }
        self.repository.delete_favorite(id)?;
        Ok(())
    }

    /// Idempotent: repeating the same criteria returns the existing alert.
    pub fn subscribe(
        &self,
        actor: &Actor,
        request: AlertRequest,
        now: DateTime<Utc>,
    ) -> Result<AlertReceipt, ListingError> {
        let candidate = PropertySubscription {
            id: AlertSubscriptionId::new(),
            user_id: actor.user_id,
            location: clean_optional(request.location),
            property_type: clean_optional(request.property_type)
                .map(|raw| PropertyType::parse(&raw)),
            created_at: now,
        };

        if let Some(existing) = self.matching_alert(&candidate)? {
            return Ok(AlertReceipt {
                alert: existing,
                created: false,
            });
        }
        match self.repository.insert_alert(candidate.clone()) {
            Ok(alert) => Ok(AlertReceipt {
                alert,
                created: true,
            }),
            Err(RepositoryError::Conflict(_)) => {
                let alert = self
                    .matching_alert(&candidate)?
                    .ok_or(ListingError::NotFound)?;
                Ok(AlertReceipt {
                    alert,
                    created: false,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn alerts(&self, actor: &Actor) -> Result<Vec<PropertySubscription>, ListingError> {
        let mut alerts: Vec<_> = self
            .repository
            .alerts()?
            .into_iter()
            .filter(|alert| alert.user_id == actor.user_id)
            .collect();
        alerts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(alerts)
    }

    pub fn update_alert(
        &self,
        actor: &Actor,
        id: AlertSubscriptionId,
        request: AlertRequest,
    ) -> Result<PropertySubscription, ListingError> {
        let mut alert = self.owned_alert(actor, id)?;
        alert.location = clean_optional(request.location);
        alert.property_type =
            clean_optional(request.property_type).map(|raw| PropertyType::parse(&raw));
        self.repository.update_alert(alert.clone())?;
        Ok(alert)
    }

    pub fn delete_alert(&self, actor: &Actor, id: AlertSubscriptionId) -> Result<(), ListingError> {
        self.owned_alert(actor, id)?;
        self.repository.delete_alert(id)?;
        Ok(())
    }

    fn validate(&self, draft: PropertyDraft) -> Result<ListingFields, ListingError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(FieldError::new("title", "Title is required.").into());
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(FieldError::new(
                "title",
                format!("Ensure this value has at most {MAX_TITLE_LEN} characters."),
            )
            .into());
        }
        let location = draft.location.trim().to_string();
        if location.is_empty() {
            return Err(FieldError::new("location", "Location is required.").into());
        }

        let price = u64::try_from(draft.price)
            .map_err(|_| FieldError::new("price", "Price cannot be negative."))?;
        let bedrooms = non_negative("bedrooms", draft.bedrooms)?;
        let bathrooms = non_negative("bathrooms", draft.bathrooms)?;
        let sqft = non_negative("sqft", draft.sqft)?;

        let (property_type, new_custom_type) =
            self.resolve_type(draft.property_type, draft.new_property_type)?;

        let known: HashSet<AmenityId> = self
            .repository
            .amenities()?
            .into_iter()
            .map(|amenity| amenity.id)
            .collect();
        let mut amenities = Vec::with_capacity(draft.amenities.len());
        for amenity in draft.amenities {
            if !known.contains(&amenity) {
                return Err(
                    FieldError::new("amenities", format!("Unknown amenity {amenity}.")).into(),
                );
            }
            if !amenities.contains(&amenity) {
                amenities.push(amenity);
            }
        }

        Ok(ListingFields {
            title,
            description: draft.description.trim().to_string(),
            property_type,
            new_custom_type,
            price: Money::from_major(price),
            location,
            bedrooms,
            bathrooms,
            sqft,
            amenities,
            is_available: draft.is_available,
        })
    }

    /// A typed-in type wins over the selected one and is matched
    /// case-insensitively against every known type before a new one is made.
    fn resolve_type(
        &self,
        selected: Option<String>,
        typed: Option<String>,
    ) -> Result<(PropertyType, bool), ListingError> {
        if let Some(typed) = clean_optional(typed) {
            if typed.chars().count() < MIN_CUSTOM_TYPE_LEN {
                return Err(FieldError::new(
                    "new_property_type",
                    "Property type must be at least 3 characters.",
                )
                .into());
            }
            return Ok(match self.known_type(&typed)? {
                Some(existing) => (existing, false),
                None => (PropertyType::Custom(typed), true),
            });
        }

        let selected = clean_optional(selected).ok_or_else(|| {
            FieldError::new(
                "property_type",
                "Please select a property type or enter a new one.",
            )
        })?;
        let resolved = self.known_type(&selected)?.ok_or_else(|| {
            FieldError::new("property_type", "Select a valid property type.")
        })?;
        Ok((resolved, false))
    }

    fn known_type(&self, raw: &str) -> Result<Option<PropertyType>, RepositoryError> {
        let parsed = PropertyType::parse(raw);
        if !matches!(parsed, PropertyType::Custom(_)) {
            return Ok(Some(parsed));
        }
        Ok(self
            .repository
            .custom_property_types()?
            .into_iter()
            .find(|known| known.same_as(&parsed)))
    }

    fn free_slug(&self, base: &str, start: usize) -> Result<String, RepositoryError> {
        let mut suffix = start;
        loop {
            let candidate = if suffix == 1 {
                base.to_string()
            } else {
                format!("{base}-{suffix}")
            };
            if self.repository.property_by_slug(&candidate)?.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    fn ranked(
        &self,
        keep: impl Fn(&Property) -> bool,
        now: DateTime<Utc>,
    ) -> Result<Vec<PropertyCard>, ListingError> {
        let featured = self.billing.featured_property_ids(now)?;
        let mut matching: Vec<_> = self
            .repository
            .properties()?
            .into_iter()
            .filter(|property| property.is_available && keep(property))
            .collect();
        matching.sort_by(|a, b| {
            featured
                .contains(&b.id)
                .cmp(&featured.contains(&a.id))
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(cards(&matching, &featured))
    }

    fn owned_property(&self, actor: &Actor, id: PropertyId) -> Result<Property, ListingError> {
        if !actor.is_agent() {
            return Err(ListingError::Forbidden);
        }
        let property = self
            .repository
            .property(id)?
            .ok_or(ListingError::NotFound)?;
        if property.agent_id != actor.user_id {
            return Err(ListingError::Forbidden);
        }
        Ok(property)
    }

    fn owned_alert(
        &self,
        actor: &Actor,
        id: AlertSubscriptionId,
    ) -> Result<PropertySubscription, ListingError> {
        let alert = self.repository.alert(id)?.ok_or(ListingError::NotFound)?;
        if alert.user_id != actor.user_id {
            return Err(ListingError::Forbidden);
        }
        Ok(alert)
    }

    fn matching_alert(
        &self,
        candidate: &PropertySubscription,
    ) -> Result<Option<PropertySubscription>, RepositoryError> {
        Ok(self
            .repository
            .alerts()?
            .into_iter()
            .find(|alert| alert.same_criteria(candidate)))
    }

    fn notify_new_listing(&self, property: &Property, now: DateTime<Utc>) {
        let alerts = match self.repository.alerts() {
            Ok(alerts) => alerts,
            Err(err) => {
                warn!(property = %property.id, error = %err, "could not load listing alerts");
                return;
            }
        };
        let mut notified = HashSet::new();
        for alert in alerts {
            if !alert.matches(property) || !notified.insert(alert.user_id) {
                continue;
            }
            let draft = NotificationDraft::new(
                alert.user_id,
                NotificationKind::NewListing,
                "New Property Listing",
                format!(
                    "A new {} is available in {}.",
                    property.property_type, property.location
                ),
            )
            .property(property.id)
            .link(format!("/properties/{}", property.slug))
            .meta("property_id", property.id);
            self.notifier.notify_quietly(draft, now);
        }
    }

    /// Favoriting users hear about it only when one of their alerts matches.
    fn notify_price_change(
        &self,
        property: &Property,
        old_price: Money,
        now: DateTime<Utc>,
    ) {
        let lookup = || -> Result<_, RepositoryError> {
            Ok((
                self.repository.alerts()?,
                self.repository.favorites_for_property(property.id)?,
            ))
        };
        let (alerts, favorites) = match lookup() {
            Ok(rows) => rows,
            Err(err) => {
                warn!(property = %property.id, error = %err, "price change audience unavailable");
                return;
            }
        };
        for favorite in favorites {
            let subscribed = alerts
                .iter()
                .any(|alert| alert.user_id == favorite.user_id && alert.matches(property));
            if !subscribed {
                continue;
            }
            let draft = NotificationDraft::new(
                favorite.user_id,
                NotificationKind::PriceChange,
                format!("Price Update: {}", property.title),
                format!("Price changed from {old_price} to {}.", property.price),
            )
            .property(property.id)
            .link(format!("/properties/{}", property.slug))
            .meta("old_price", old_price.major());
            self.notifier.notify_quietly(draft, now);
        }
    }

    fn notify_favorite(
        &self,
        actor: &Actor,
        property: &Property,
        now: DateTime<Utc>,
    ) {
        let lookup = || -> Result<_, RepositoryError> {
            Ok((
                self.accounts.user(property.agent_id)?,
                self.accounts.user(actor.user_id)?,
            ))
        };
        let (agent, email) = match lookup() {
            Ok((Some(agent), fan)) => (agent, fan.map(|user| user.email).unwrap_or_default()),
            Ok((None, _)) => {
                warn!(property = %property.id, "listing agent missing");
                return;
            }
            Err(err) => {
                warn!(property = %property.id, error = %err, "could not load favorite parties");
                return;
            }
        };
        let message = format!(
            "user with email {email} has favorited your listing: {}",
            property.title
        );

        let draft = NotificationDraft::new(
            agent.id,
            NotificationKind::Favorite,
            "Property Favorited",
            message.clone(),
        )
        .property(property.id)
        .meta("property_id", property.id);
        self.notifier.notify_quietly(draft, now);
        self.notifier
            .postman()
            .deliver(&agent.email, "Your property was favorited", message);
    }
}

fn listing_type_for(agent_type: AgentType) -> ListingType {
    match agent_type {
        AgentType::RealEstateAgent => ListingType::ForSale,
        AgentType::PropertyManager => ListingType::Rent,
    }
}

fn slug_base(title: &str) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        "property".to_string()
    } else {
        slug
    }
}

fn non_negative(field: &'static str, value: i64) -> Result<u32, FieldError> {
    u32::try_from(value).map_err(|_| FieldError::new(field, "Ensure this value is not negative."))
}

fn cards(properties: &[Property], featured: &HashSet<PropertyId>) -> Vec<PropertyCard> {
    properties
        .iter()
        .map(|property| PropertyCard::new(property, featured.contains(&property.id)))
        .collect()
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error(transparent)]
    Validation(#[from] FieldError),
    #[error("only the listing agent may change this property")]
    Forbidden,
    #[error("property not found")]
    NotFound,
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Billing(#[from] BillingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
