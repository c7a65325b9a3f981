use crate::{Category, FetchState, Listing, ListingId};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BrowseViewModel {
    pub category: Option<Category>,
    pub header: Option<&'static str>,
    pub fetch_state: FetchState,
    pub listings: Vec<ListingRowView>,
    /// "Load More" is offered only when ready with a continuation cursor.
    pub can_load_more: bool,
    pub empty_message: Option<String>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRowView {
    pub id: ListingId,
    pub category: Category,
    pub name: Option<String>,
    pub location: Option<String>,
    /// Discounted price when the listing is on offer, else the regular price.
    pub price: Option<u64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub image_url: Option<String>,
    pub listed_at_micros: i64,
}

impl ListingRowView {
    pub(crate) fn from_listing(listing: &Listing) -> Self {
        let payload = &listing.payload;
        let price = if payload.offer {
            payload.discounted_price.or(payload.regular_price)
        } else {
            payload.regular_price
        };
        Self {
            id: listing.id.clone(),
            category: listing.category,
            name: payload.name.clone(),
            location: payload.location.clone(),
            price,
            bedrooms: payload.bedrooms,
            bathrooms: payload.bathrooms,
            image_url: payload.image_urls.first().cloned(),
            listed_at_micros: listing.ordering_key,
        }
    }
}
