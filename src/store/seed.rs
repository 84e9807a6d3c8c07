use time::macros::datetime;

use super::credentials::PasswordScheme;
use super::model::{
    Category, LicenseType, Order, OrderStatus, Product, Ticket, TicketPriority, TicketStatus,
    User, UserRole, UserStatus,
};

/// Bootstrap super-admin credentials.
pub const SUPER_ADMIN_EMAIL: &str = "admin@tallypro.in";
pub const SUPER_ADMIN_PASSWORD: &str = "Admin@123";

pub fn users(scheme: PasswordScheme) -> anyhow::Result<Vec<User>> {
    Ok(vec![
        User {
            id: "u1".into(),
            name: "Rajesh Kumar".into(),
            email: "user@tallypro.in".into(),
            password: Some(scheme.seal("password123")?),
            role: UserRole::Customer,
            status: UserStatus::Active,
            joined_at: datetime!(2023-11-15 0:00 UTC),
            purchased_products: vec!["1".into()],
        },
        User {
            id: "u2".into(),
            name: "Amit Patel".into(),
            email: "amit@business.com".into(),
            password: Some(scheme.seal("password123")?),
            role: UserRole::Customer,
            status: UserStatus::Active,
            joined_at: datetime!(2024-01-10 0:00 UTC),
            purchased_products: vec![],
        },
        User {
            id: "admin_1".into(),
            name: "Super Admin".into(),
            email: SUPER_ADMIN_EMAIL.into(),
            password: Some(scheme.seal(SUPER_ADMIN_PASSWORD)?),
            role: UserRole::SuperAdmin,
            status: UserStatus::Active,
            joined_at: datetime!(2023-01-01 0:00 UTC),
            purchased_products: vec![],
        },
    ])
}

fn product(
    id: &str,
    name: &str,
    description: &str,
    price: u64,
    category: Category,
    image_seed: &str,
    features: [&str; 3],
) -> Product {
    Product {
        id: id.into(),
        name: name.into(),
        description: description.into(),
        price,
        category,
        image_url: format!("https://picsum.photos/seed/{image_seed}/400/300"),
        features: features.iter().map(|f| f.to_string()).collect(),
        active: true,
        version: None,
        license_type: LicenseType::SingleUser,
        file: None,
        demo_file: None,
    }
}

pub fn products() -> Vec<Product> {
    vec![
        product(
            "1",
            "Auto-GST Reconciliation Pro",
            "Slash compliance time by 90%. Auto-match GSTR-2B with Tally books instantly.",
            4999,
            Category::Gst,
            "gst1",
            ["1-Click 2B Matching", "Smart Error Detection", "Excel Export"],
        ),
        product(
            "2",
            "Dynamic Digital Signature",
            "Legally compliant invoices with one click. No more printing and signing manually.",
            2499,
            Category::Security,
            "sig1",
            ["DSC Token Support", "Custom Coordinates", "Bulk Signing"],
        ),
        product(
            "3",
            "WhatsApp Automation Toolkit",
            "Send invoices, ledgers, and reminders directly from Tally to client WhatsApp.",
            3500,
            Category::Automation,
            "wa1",
            ["Auto-Payment Reminders", "Bulk Messaging", "PDF Attachments"],
        ),
        product(
            "4",
            "Smart Inventory Aging",
            "Identify slow-moving stock and optimize cash flow with visual dashboards.",
            1999,
            Category::Inventory,
            "inv1",
            ["Visual Aging Graphs", "Expiry Alerts", "Re-order Logic"],
        ),
    ]
}

pub fn orders() -> Vec<Order> {
    vec![Order {
        id: "ord_1".into(),
        user_id: "u1".into(),
        user_name: "Rajesh Kumar".into(),
        product_id: "1".into(),
        product_name: "Auto-GST Reconciliation Pro".into(),
        amount: 4999,
        status: OrderStatus::Success,
        date: datetime!(2023-11-15 0:00 UTC),
    }]
}

pub fn tickets() -> Vec<Ticket> {
    vec![Ticket {
        id: "tkt_1".into(),
        user_id: "u1".into(),
        subject: "Installation issue with GST TDL".into(),
        status: TicketStatus::Open,
        priority: TicketPriority::High,
        created_at: datetime!(2024-05-20 0:00 UTC),
    }]
}
