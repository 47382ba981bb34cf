fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Arc;

    use rentdesk_notifications::{NoopAlerts, NotificationConfig, NotificationCenter, Priority};
    use rentdesk_protocol::{
        BookingEvent, ClientFrame, CustomerRef, InboundEnvelope, MessageType, Module, ModuleEvent,
        OrderEvent, QuoteEvent,
    };
    use rentdesk_realtime::{MessageRouter, Routed};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture file as text.
    fn load_text(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Loads a fixture JSON file and returns it as a `serde_json::Value`.
    fn load_fixture(name: &str) -> serde_json::Value {
        serde_json::from_str(&load_text(name))
            .unwrap_or_else(|e| panic!("failed to parse fixture {name}: {e}"))
    }

    fn inbound(name: &str) -> InboundEnvelope {
        InboundEnvelope::parse(&load_text(&format!("inbound/{name}")))
            .unwrap_or_else(|e| panic!("failed to parse envelope {name}: {e}"))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => serde_json::json!(f),
                None => v.clone(),
            },
            serde_json::Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect(),
            ),
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture into a Rust type, re-serializes it, and compares
    /// the JSON values (order-independent, float-normalized comparison).
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_value(fixture.clone())
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_value(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        assert_eq!(
            normalize_value(&fixture),
            normalize_value(&reserialized),
            "roundtrip mismatch for {name}:\n  server: {fixture}\n  client: {reserialized}"
        );
    }

    // --- Outbound frames ---

    #[test]
    fn outbound_frames_roundtrip() {
        for name in [
            "outbound/identify.json",
            "outbound/subscribe_orders.json",
            "outbound/unsubscribe_quotes.json",
            "outbound/ping.json",
        ] {
            roundtrip_test::<ClientFrame>(name);
        }
    }

    #[test]
    fn outbound_frames_match_fixtures() {
        let subscribe = serde_json::to_value(ClientFrame::Subscribe {
            module: Module::Orders,
        })
        .unwrap();
        assert_eq!(subscribe, load_fixture("outbound/subscribe_orders.json"));

        let unsubscribe = serde_json::to_value(ClientFrame::Unsubscribe {
            module: Module::Quotes,
        })
        .unwrap();
        assert_eq!(unsubscribe, load_fixture("outbound/unsubscribe_quotes.json"));

        let ping = serde_json::to_value(ClientFrame::Ping).unwrap();
        assert_eq!(ping, load_fixture("outbound/ping.json"));
    }

    #[test]
    fn identify_has_fixture_keys() {
        let ours = serde_json::to_value(ClientFrame::identify_admin()).unwrap();
        let fixture = load_fixture("outbound/identify.json");

        let keys = |v: &serde_json::Value| {
            let mut k: Vec<String> = v.as_object().unwrap().keys().cloned().collect();
            k.sort();
            k
        };
        assert_eq!(keys(&ours), keys(&fixture));
        assert_eq!(ours["type"], fixture["type"]);
        assert_eq!(ours["clientType"], fixture["clientType"]);
    }

    // --- Inbound classification ---

    #[test]
    fn inbound_types_are_recognized() {
        let cases = [
            ("connection_established.json", MessageType::ConnectionEstablished),
            ("identification_confirmed.json", MessageType::IdentificationConfirmed),
            ("subscription_confirmed.json", MessageType::SubscriptionConfirmed),
            ("pong.json", MessageType::Pong),
            ("error.json", MessageType::Error),
            ("server_shutdown.json", MessageType::ServerShutdown),
            ("new_booking.json", MessageType::NewBooking),
            ("booking_status_update.json", MessageType::BookingStatusUpdate),
            ("new_order.json", MessageType::NewOrder),
            ("order_status_updated.json", MessageType::OrderStatusUpdated),
            ("new_quote.json", MessageType::NewQuote),
            ("quote_response_created.json", MessageType::QuoteResponseCreated),
            ("quote_status_updated.json", MessageType::QuoteStatusUpdated),
            ("unknown_future_event.json", MessageType::Unknown),
        ];
        for (name, expected) in cases {
            assert_eq!(inbound(name).message_type(), expected, "{name}");
        }
    }

    #[test]
    fn control_frames_carry_their_fields() {
        let est = inbound("connection_established.json");
        assert_eq!(est.client_id.as_deref(), Some("c-7f3a9e"));

        let confirmed = inbound("subscription_confirmed.json");
        assert_eq!(confirmed.declared_module(), Some(Module::Orders));

        let err = inbound("error.json");
        assert_eq!(err.message.as_deref(), Some("Invalid module: inventory"));
    }

    #[test]
    fn router_classifies_fixtures() {
        let router = MessageRouter::new();

        assert!(matches!(
            router.route(&load_text("inbound/pong.json")),
            Routed::Control(_)
        ));
        assert!(matches!(
            router.route(&load_text("inbound/server_shutdown.json")),
            Routed::Control(_)
        ));
        match router.route(&load_text("inbound/new_order.json")) {
            Routed::Domain(d) => assert_eq!(d.module, Module::Orders),
            _ => panic!("new_order should route to orders"),
        }
        match router.route(&load_text("inbound/unknown_future_event.json")) {
            Routed::Unknown(t) => assert_eq!(t, "unknown_future_event"),
            _ => panic!("unknown type should not route"),
        }
    }

    // --- Typed domain records ---

    #[test]
    fn booking_fixtures_decode() {
        match BookingEvent::from_envelope(&inbound("new_booking.json")) {
            Some(BookingEvent::Created(b)) => {
                assert_eq!(b.id(), Some("65f2c1d4e8a9b70012ab34cd"));
                assert_eq!(b.customer_name(), Some("Lin"));
                assert_eq!(b.event_type.as_deref(), Some("wedding"));
                assert_eq!(b.extra["guestCount"], 120);
            }
            other => panic!("unexpected {other:?}"),
        }
        match BookingEvent::from_envelope(&inbound("booking_status_update.json")) {
            Some(BookingEvent::StatusUpdated(b)) => {
                assert_eq!(b.status.as_deref(), Some("confirmed"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn order_fixtures_decode() {
        match OrderEvent::from_envelope(&inbound("new_order.json")) {
            Some(OrderEvent::Created(o)) => {
                assert_eq!(o.reference(), Some("ORD-1042"));
                assert_eq!(o.customer_name(), Some("Grace"));
                assert_eq!(o.amount(), Some(1250.5));
                assert!(o.extra["items"].is_array());
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            OrderEvent::from_envelope(&inbound("order_status_updated.json")),
            Some(OrderEvent::StatusUpdated(_))
        ));
        // Events of another module never decode here.
        assert!(OrderEvent::from_envelope(&inbound("new_quote.json")).is_none());
    }

    #[test]
    fn quote_fixtures_decode() {
        match QuoteEvent::from_envelope(&inbound("new_quote.json")) {
            Some(QuoteEvent::Created(q)) => {
                assert_eq!(q.customer_name(), Some("Ada"));
                assert_eq!(q.category_name.as_deref(), Some("Tents"));
            }
            other => panic!("unexpected {other:?}"),
        }
        match QuoteEvent::from_envelope(&inbound("quote_response_created.json")) {
            Some(QuoteEvent::ResponseCreated(q)) => {
                assert_eq!(q.reference(), Some("Q-2210"));
                assert_eq!(q.amount(), Some(840.0));
            }
            other => panic!("unexpected {other:?}"),
        }
        // Duplicate id keys, a numeric quote number, an unpopulated customer and a
        // formatted string total.
        match QuoteEvent::from_envelope(&inbound("quote_status_updated.json")) {
            Some(QuoteEvent::StatusUpdated(q)) => {
                assert_eq!(q.id(), Some("65f2c4b7e8a9b70012ab3590"));
                assert_eq!(q.reference(), Some("2211"));
                assert_eq!(
                    q.customer,
                    Some(CustomerRef::Ref("65f2c0aae8a9b70012ab3301".into()))
                );
                assert_eq!(q.customer_name(), Some("Ada"));
                assert_eq!(q.amount(), Some(1320.0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    // --- Notification rendering from real payloads ---

    #[test]
    fn fixtures_render_notifications() {
        let mut center = NotificationCenter::new(NotificationConfig::default(), Arc::new(NoopAlerts));
        let cases = [
            ("new_booking.json", "Lin booked a wedding on 2026-06-20", Priority::High),
            ("booking_status_update.json", "Booking #65f2c1d4e8a9b70012ab34cd is now confirmed", Priority::Medium),
            ("new_order.json", "Order #ORD-1042 from Grace ($1250.50)", Priority::High),
            ("order_status_updated.json", "Order #ORD-1042 is now delivered", Priority::Medium),
            ("new_quote.json", "Ada requested a quote for Tents", Priority::High),
            ("quote_response_created.json", "Response to quote #Q-2210 sent to Ada ($840.00)", Priority::Medium),
        ];
        for (name, message, priority) in cases {
            let id = center
                .ingest(&inbound(name))
                .unwrap_or_else(|| panic!("{name} produced no notification"));
            let n = center.get(&id).unwrap();
            assert_eq!(n.message, message, "{name}");
            assert_eq!(n.priority, priority, "{name}");
        }

        let counts = center.unread_counts();
        assert_eq!((counts.bookings, counts.orders, counts.quotes), (2, 2, 2));
        assert_eq!(counts.total, 6);

        for name in ["pong.json", "error.json", "unknown_future_event.json"] {
            assert!(center.ingest(&inbound(name)).is_none(), "{name}");
        }
        assert_eq!(center.len(), 6);
    }
}
