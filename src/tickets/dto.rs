use serde::Deserialize;

use crate::store::model::TicketPriority;

#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default)]
    pub priority: TicketPriority,
}
