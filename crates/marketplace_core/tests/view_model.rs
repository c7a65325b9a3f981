use marketplace_core::{
    update, BrowseState, Category, KeyEncoding, Listing, ListingId, ListingPayload, Msg, Page,
    PageSize,
};

fn loaded_state(payload: ListingPayload) -> BrowseState {
    let listing = Listing {
        id: ListingId::new("house-1"),
        category: Category::Sale,
        ordering_key: 1_700_000_000_000_000,
        key_encoding: KeyEncoding::Integer,
        payload,
    };
    let (state, _) = update(BrowseState::new(), Msg::CategorySelected(Category::Sale));
    let (state, _) = update(
        state,
        Msg::PageLoaded {
            epoch: 1,
            page: Page::from_items(vec![listing], PageSize::default()),
        },
    );
    state
}

#[test]
fn offer_rows_show_discounted_price() {
    let state = loaded_state(ListingPayload {
        name: Some("Cottage".to_string()),
        regular_price: Some(250_000),
        discounted_price: Some(240_000),
        offer: true,
        image_urls: vec!["a.jpg".to_string(), "b.jpg".to_string()],
        ..ListingPayload::default()
    });

    let row = &state.view().listings[0];
    assert_eq!(row.price, Some(240_000));
    assert_eq!(row.image_url.as_deref(), Some("a.jpg"));
    assert_eq!(row.name.as_deref(), Some("Cottage"));
    assert_eq!(row.listed_at_micros, 1_700_000_000_000_000);
}

#[test]
fn rows_without_offer_use_regular_price() {
    let state = loaded_state(ListingPayload {
        regular_price: Some(250_000),
        discounted_price: Some(240_000),
        offer: false,
        ..ListingPayload::default()
    });

    assert_eq!(state.view().listings[0].price, Some(250_000));
}

#[test]
fn offer_without_discount_falls_back_to_regular_price() {
    let state = loaded_state(ListingPayload {
        regular_price: Some(99),
        offer: true,
        ..ListingPayload::default()
    });

    let row = &state.view().listings[0];
    assert_eq!(row.price, Some(99));
    assert_eq!(row.image_url, None);
}
