//! Order fulfillment saga constants and customer email templates.

use domain::OrderCreatedEvent;

use crate::services::Notification;

/// The saga type identifier for order fulfillment.
pub const SAGA_TYPE: &str = "OrderFulfillment";

/// Step name: Decode the incoming order-created event.
pub const STEP_PARSE_EVENT: &str = "parse_event";

/// Step name: Reserve stock for every line item.
pub const STEP_RESERVE_INVENTORY: &str = "reserve_inventory";

/// Step name: Release the stock reserved before a failure.
pub const STEP_RELEASE_INVENTORY: &str = "release_inventory";

/// Step name: Set the order's terminal status.
pub const STEP_UPDATE_STATUS: &str = "update_status";

/// Step name: Email the customer.
pub const STEP_NOTIFY_CUSTOMER: &str = "notify_customer";

/// Address a customer's notifications are sent to.
pub fn recipient(event: &OrderCreatedEvent) -> String {
    format!("{}@example.com", event.customer_id)
}

/// Email sent once every item of the order was reserved.
pub fn confirmation_email(event: &OrderCreatedEvent) -> Notification {
    Notification {
        to: recipient(event),
        subject: format!("Order Confirmation: {}", event.order_id),
        body: format!(
            "Your order {} has been confirmed with {} items.",
            event.order_id,
            event.items.len()
        ),
    }
}

/// Email sent when the order was cancelled for lack of stock.
pub fn cancellation_email(event: &OrderCreatedEvent) -> Notification {
    Notification {
        to: recipient(event),
        subject: format!("Order Cancelled: {}", event.order_id),
        body: format!(
            "Your order {} has been cancelled due to insufficient stock. You will be reimbursed.",
            event.order_id
        ),
    }
}
