//! Per-type notification templates and message rendering.

use rentdesk_protocol::{Booking, InboundEnvelope, MessageType, Order, Quote};

use crate::types::{NotificationKind, Priority};

/// Fixed presentation of one event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub kind: NotificationKind,
    pub title: &'static str,
    pub icon: &'static str,
    pub priority: Priority,
    pub sound: bool,
}

const fn template(
    kind: NotificationKind,
    title: &'static str,
    icon: &'static str,
    priority: Priority,
    sound: bool,
) -> Template {
    Template {
        kind,
        title,
        icon,
        priority,
        sound,
    }
}

/// Template for a domain event type, `None` for control and unknown types.
pub fn template_for(msg_type: MessageType) -> Option<Template> {
    use NotificationKind::{Info, Success, Warning};
    use Priority::{High, Low, Medium};

    let t = match msg_type {
        MessageType::NewBooking => template(Success, "New Booking", "📅", High, true),
        MessageType::BookingStatusUpdate => template(Info, "Booking Updated", "🔄", Medium, false),
        MessageType::BookingDeleted => template(Warning, "Booking Deleted", "🗑️", Low, false),
        MessageType::NewOrder => template(Success, "New Order", "🛒", High, true),
        MessageType::OrderStatusUpdated => {
            template(Info, "Order Status Updated", "📦", Medium, false)
        }
        MessageType::OrderUpdated => template(Info, "Order Updated", "✏️", Low, false),
        MessageType::OrderDeleted => template(Warning, "Order Deleted", "🗑️", Low, false),
        MessageType::NewQuote => template(Info, "New Quote Request", "💬", High, true),
        MessageType::QuoteStatusUpdated => {
            template(Info, "Quote Status Updated", "🔄", Medium, false)
        }
        MessageType::QuoteDeleted => template(Warning, "Quote Deleted", "🗑️", Low, false),
        MessageType::QuoteResponseCreated => {
            template(Success, "Quote Response Sent", "✉️", Medium, false)
        }
        _ => return None,
    };
    Some(t)
}

const UNKNOWN_CUSTOMER: &str = "a customer";

fn record<T: Default + for<'de> serde::Deserialize<'de>>(envelope: &InboundEnvelope) -> T {
    envelope.parse_data::<T>().ok().flatten().unwrap_or_default()
}

fn amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!(" (${v:.2})"),
        None => String::new(),
    }
}

fn numbered(noun: &str, reference: Option<&str>) -> String {
    match reference {
        Some(r) => format!("{noun} #{r}"),
        None => noun.to_string(),
    }
}

/// Fills the message text for an event from its `data`. Missing fields fall
/// back to neutral wording instead of failing.
pub fn render_message(envelope: &InboundEnvelope) -> String {
    match envelope.message_type() {
        MessageType::NewBooking => {
            let b: Booking = record(envelope);
            let who = b.customer_name().unwrap_or(UNKNOWN_CUSTOMER);
            match (b.event_type.as_deref(), b.event_date.as_deref()) {
                (Some(kind), Some(date)) => format!("{who} booked a {kind} on {date}"),
                (None, Some(date)) => format!("{who} booked an event on {date}"),
                (Some(kind), None) => format!("{who} booked a {kind}"),
                (None, None) => format!("New booking from {who}"),
            }
        }
        MessageType::BookingStatusUpdate => {
            let b: Booking = record(envelope);
            let status = b.status.as_deref().unwrap_or("updated");
            format!("{} is now {status}", numbered("Booking", b.id()))
        }
        MessageType::BookingDeleted => {
            let b: Booking = record(envelope);
            format!("{} was deleted", numbered("Booking", b.id()))
        }
        MessageType::NewOrder => {
            let o: Order = record(envelope);
            let who = o.customer_name().unwrap_or(UNKNOWN_CUSTOMER);
            format!(
                "{} from {who}{}",
                numbered("Order", o.reference()),
                amount(o.amount())
            )
        }
        MessageType::OrderStatusUpdated => {
            let o: Order = record(envelope);
            let status = o.status.as_deref().unwrap_or("updated");
            format!("{} is now {status}", numbered("Order", o.reference()))
        }
        MessageType::OrderUpdated => {
            let o: Order = record(envelope);
            format!("{} was updated", numbered("Order", o.reference()))
        }
        MessageType::OrderDeleted => {
            let o: Order = record(envelope);
            format!("{} was deleted", numbered("Order", o.reference()))
        }
        MessageType::NewQuote => {
            let q: Quote = record(envelope);
            let who = q.customer_name().unwrap_or(UNKNOWN_CUSTOMER);
            let what = q.category_name.as_deref().unwrap_or("rental items");
            format!("{who} requested a quote for {what}")
        }
        MessageType::QuoteStatusUpdated => {
            let q: Quote = record(envelope);
            let status = q.status.as_deref().unwrap_or("updated");
            format!("{} is now {status}", numbered("Quote", q.reference()))
        }
        MessageType::QuoteDeleted => {
            let q: Quote = record(envelope);
            format!("{} was deleted", numbered("Quote", q.reference()))
        }
        MessageType::QuoteResponseCreated => {
            let q: Quote = record(envelope);
            let quote = numbered("quote", q.reference());
            match q.customer_name() {
                Some(who) => format!("Response to {quote} sent to {who}{}", amount(q.amount())),
                None => format!("Response to {quote} sent{}", amount(q.amount())),
            }
        }
        other => other.as_str().to_string(),
    }
}

/// Entity id used for deduplication: `data.id` or `data._id`, string or number.
pub fn entity_id(envelope: &InboundEnvelope) -> Option<String> {
    let data = envelope.data.as_ref()?;
    let id = data.get("id").or_else(|| data.get("_id"))?;
    match id {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
