//! Fixtures shared by the service tests

use crate::core_store::{ClubStore, StoreResult, User, UserId};
use std::sync::Arc;

pub fn store() -> Arc<ClubStore> {
    Arc::new(ClubStore::memory().unwrap())
}

pub fn seed_user(store: &ClubStore, email: &str, name: &str) -> UserId {
    let user = User::new(
        email.to_string(),
        name.to_string(),
        "$argon2id$unused".to_string(),
        "INST-01".to_string(),
    );
    let id = user.id;
    store.write(|c| -> StoreResult<()> { c.insert_user(&user) }).unwrap();
    id
}

pub fn load_user(store: &ClubStore, id: &UserId) -> User {
    store.read(|c| c.find_user(id)).unwrap().unwrap()
}
