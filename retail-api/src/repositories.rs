use crate::endpoints::{
    items::{CreateItem, GetItem, ListItems, UpdateItem},
    stores::{GetStore, ListStores},
    users::CurrentUser,
};
use uuid::Uuid;

pub struct StoreRepository;

impl StoreRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListStores {
        ListStores
    }

    pub fn get(&self, store_id: Uuid) -> GetStore {
        GetStore::new(store_id)
    }
}

#[derive(Default)]
pub struct ItemRepository {
    store_id: Option<Uuid>,
}

impl ItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(mut self, store_id: Uuid) -> Self {
        self.store_id = Some(store_id);
        self
    }

    pub fn list(&self) -> ListItems {
        match self.store_id {
            Some(store_id) => ListItems::new().store(store_id),
            None => ListItems::new(),
        }
    }

    pub fn get(&self, item_id: Uuid) -> GetItem {
        GetItem::new(item_id)
    }

    pub fn create(&self, sku: impl Into<String>, name: impl Into<String>, price: i64) -> CreateItem {
        let item = CreateItem::new(sku, name, price);
        match self.store_id {
            Some(store_id) => item.store_id(store_id),
            None => item,
        }
    }

    pub fn update(&self, item_id: Uuid) -> UpdateItem {
        UpdateItem::new(item_id)
    }
}

pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn me(&self) -> CurrentUser {
        CurrentUser
    }
}
