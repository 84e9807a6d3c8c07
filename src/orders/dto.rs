use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub product_id: String,
}

#[derive(Debug, Serialize)]
pub struct RevenueResponse {
    pub revenue: u64,
}

/// Admin dashboard counters.
#[derive(Debug, Serialize)]
pub struct Overview {
    pub users: usize,
    pub active_products: usize,
    pub orders: usize,
    pub open_tickets: usize,
    pub revenue: u64,
}
