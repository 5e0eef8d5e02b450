//! Header names used by the Eventbrite reporting exports.

/// "Orders" export, one row per order.
pub mod orders {
    pub const ORDER_ID: &str = "Order ID";
    pub const ORDER_DATE: &str = "Order date";
    pub const EVENT_ID: &str = "Event ID";
    pub const EVENT_NAME: &str = "Event name";
    pub const EVENT_START_DATE: &str = "Event start date";
    pub const EVENT_START_TIME: &str = "Event start time";
    pub const EVENT_TIMEZONE: &str = "Event timezone";
    pub const EVENT_LOCATION: &str = "Event location";
    pub const TICKET_QUANTITY: &str = "Ticket quantity";
    pub const PURCHASER_COUNTRY: &str = "Purchaser country";
    pub const CURRENCY: &str = "Currency";
    pub const PAYMENT_STATUS: &str = "Payment status";
    pub const PAYMENT_TYPE: &str = "Payment type";
    pub const BUYER_FIRST_NAME: &str = "Buyer first name";
    pub const BUYER_LAST_NAME: &str = "Buyer last name";
    pub const BUYER_EMAIL: &str = "Buyer email";

    pub const GROSS_SALES: &str = "Gross sales";
    pub const NET_SALES: &str = "Net sales";
    pub const TICKET_ADDONS_REVENUE: &str = "Ticket + add-ons revenue";
    pub const TICKET_REVENUE: &str = "Ticket revenue";
    pub const SERVICE_FEE: &str = "Eventbrite service fee";
    pub const PROCESSING_FEE: &str = "Eventbrite payment processing fee";
    pub const ROYALTY: &str = "Royalty";
    pub const EVENTBRITE_TAX: &str = "Eventbrite tax";
    pub const ORGANISER_TAX: &str = "Organiser tax";
}

/// "Attendees" export, one row per ticket.
pub mod attendees {
    pub const ORDER_ID: &str = "Order ID";
    pub const EVENT_ID: &str = "Event ID";
    pub const BARCODE: &str = "Barcode number";
    pub const TICKET_PRICE: &str = "Ticket price";
    pub const TICKET_TIER: &str = "Ticket tier";
    pub const TICKET_TYPE: &str = "Ticket type";
    pub const FIRST_NAME: &str = "Attendee first name";
    pub const LAST_NAME: &str = "Attendee last name";
    pub const EMAIL: &str = "Attendee email";
}

/// "Sales" summary export, one row per event name.
pub mod sales {
    pub const EVENT_NAME: &str = "Event name";
    pub const GROSS_SALES: &str = "Gross sales";
    pub const NET_SALES: &str = "Net sales";
    pub const TICKETS_SOLD: &str = "Tickets sold";
}
