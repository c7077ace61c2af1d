use crate::request::{Endpoint, RequestData};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use uuid::Uuid;

// Common

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
}

// Requests

#[derive(Default, Debug, Clone)]
pub struct ListStores;

impl Endpoint for ListStores {
    type Data = ();
    type Response = Vec<Store>;

    fn endpoint(&self) -> Cow<'_, str> {
        "/stores".into()
    }
}

#[derive(Debug, Clone)]
pub struct GetStore {
    store_id: Uuid,
}

impl GetStore {
    pub fn new(store_id: Uuid) -> Self {
        Self { store_id }
    }
}

impl Endpoint for GetStore {
    type Data = ();
    type Response = Store;

    fn endpoint(&self) -> Cow<'_, str> {
        format!("/stores/{}", self.store_id).into()
    }

    fn data(&self) -> RequestData<&Self::Data> {
        RequestData::Empty
    }
}
