pub mod billing_customer;
pub mod plan;
pub mod proration;
pub mod webhook_event;
