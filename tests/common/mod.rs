// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::sync::Arc;

use balance_manager::models::reserve::ReservationKey;
use balance_manager::services::Coordinator;
use balance_manager::store::memory::MemoryStore;
use rust_decimal::Decimal;

/// Coordinator over a fresh in-memory store, plus the store itself for
/// fault injection.
pub fn test_coordinator() -> (Coordinator, MemoryStore) {
    let store = MemoryStore::new();
    let coordinator = Coordinator::new(Arc::new(store.clone()));
    (coordinator, store)
}

/// Coordinator with users already funded.
pub async fn funded(balances: &[(i32, Decimal)]) -> (Coordinator, MemoryStore) {
    let (coordinator, store) = test_coordinator();
    for (user_id, amount) in balances {
        coordinator
            .increment_balance(*user_id, *amount)
            .await
            .unwrap();
    }
    (coordinator, store)
}

pub fn key(user_id: i32, service_id: i32, order_id: i32) -> ReservationKey {
    ReservationKey {
        user_id,
        service_id,
        order_id,
    }
}
