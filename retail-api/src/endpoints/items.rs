use super::{Page, PageQuery};
use crate::macros::setter;
use crate::request::{Endpoint, RequestData};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    /// Price in cents
    pub price: i64,
    pub quantity: Option<i64>,
    pub store_id: Option<Uuid>,
}

// Requests

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_id: Option<Uuid>,
    #[serde(flatten)]
    paging: PageQuery,
}

#[derive(Default, Debug, Clone)]
pub struct ListItems {
    filter: ItemFilter,
}

impl ListItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search(mut self, search: impl Into<String>) -> Self {
        self.filter.search = Some(search.into());
        self
    }

    pub fn store(mut self, store_id: Uuid) -> Self {
        self.filter.store_id = Some(store_id);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.filter.paging.page = Some(page);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.filter.paging.page_size = Some(page_size);
        self
    }
}

impl Endpoint for ListItems {
    type Data = ItemFilter;
    type Response = Page<Item>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/items".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        if self.filter == ItemFilter::default() {
            RequestData::Empty
        } else {
            RequestData::Query(&self.filter)
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetItem {
    item_id: Uuid,
}

impl GetItem {
    pub fn new(item_id: Uuid) -> Self {
        Self { item_id }
    }
}

impl Endpoint for GetItem {
    type Data = ();
    type Response = Item;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/items/{}", self.item_id).into()
    }
}

/// Partial update of an item; unset fields are left alone
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItem {
    #[serde(skip)]
    item_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<i64>,
}

impl UpdateItem {
    pub fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            name: None,
            price: None,
            quantity: None,
        }
    }

    setter!(opt name: String);
    setter!(opt price: i64);
    setter!(opt quantity: i64);
}

impl Endpoint for UpdateItem {
    type Data = Self;
    type Response = Item;

    fn method(&self) -> Method {
        Method::PATCH
    }

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/items/{}", self.item_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}

#[derive(Default, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItem {
    sku: String,
    name: String,
    price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    store_id: Option<Uuid>,
}

impl CreateItem {
    pub fn new(sku: impl Into<String>, name: impl Into<String>, price: i64) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    setter!(opt quantity: i64);
    setter!(opt store_id: Uuid);
}

impl Endpoint for CreateItem {
    type Data = Self;
    type Response = Item;

    fn method(&self) -> Method {
        Method::POST
    }

    fn endpoint(&self) -> Cow<'_, str> {
        "/items".into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Json(self)
    }
}
