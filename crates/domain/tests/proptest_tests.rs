//! Property-based tests for the draft domain
//!
//! These tests use proptest to verify invariants across many random inputs.

use chrono::{DateTime, TimeZone, Utc};
use domain::{
    Draft, DraftCollection, DraftId, ITEM_PREVIEW_CHARS, InvoicePayload, LineItem,
};
use proptest::prelude::*;

fn at(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).unwrap()
}

// ============================================================================
// Emptiness Property Tests
// ============================================================================

mod emptiness_tests {
    use super::*;

    proptest! {
        #[test]
        fn client_alone_is_never_empty(client in "[A-Za-z0-9]{1,12}") {
            prop_assert!(!InvoicePayload::new().with_client(client).is_empty());
        }

        #[test]
        fn whitespace_only_fields_are_empty(
            client in "[ \t\n]{0,4}",
            notes in "[ \t\n]{0,4}",
            terms in "[ \t\n]{0,4}",
        ) {
            let payload = InvoicePayload::new()
                .with_client(client)
                .with_notes(notes)
                .with_terms(terms);
            prop_assert!(payload.is_empty());
        }

        #[test]
        fn positive_quantity_is_content(quantity in 0.001f64..10_000.0) {
            let item = LineItem { quantity: Some(quantity), ..LineItem::default() };
            prop_assert!(!InvoicePayload::new().with_item(item).is_empty());
        }

        #[test]
        fn non_positive_numbers_are_not_content(
            quantity in -10_000.0f64..=0.0,
            rate in -10_000.0f64..=0.0,
        ) {
            let item = LineItem { quantity: Some(quantity), rate: Some(rate), ..LineItem::default() };
            prop_assert!(InvoicePayload::new().with_item(item).is_empty());
        }
    }
}

// ============================================================================
// Description Property Tests
// ============================================================================

mod description_tests {
    use super::*;

    proptest! {
        #[test]
        fn item_preview_never_exceeds_limit(description in "\\PC{1,80}") {
            prop_assume!(!description.trim().is_empty());
            let payload = InvoicePayload::new().with_item(LineItem::new(description.clone(), 1.0, 1.0));
            let summary = payload.describe();
            let preview = summary
                .strip_prefix("Invoice with 1 item(s) - ")
                .unwrap()
                .to_string();

            if description.chars().count() > ITEM_PREVIEW_CHARS {
                prop_assert!(preview.ends_with("..."));
                prop_assert_eq!(preview.chars().count(), ITEM_PREVIEW_CHARS + 3);
            } else {
                prop_assert_eq!(preview, description);
            }
        }

        #[test]
        fn client_summary_wins_over_items(
            client in "[A-Z][0-9]{1,4}",
            items in 0usize..5,
        ) {
            let mut payload = InvoicePayload::new().with_client(client.clone());
            for i in 0..items {
                payload = payload.with_item(LineItem::new(format!("item {i}"), 1.0, 1.0));
            }
            prop_assert_eq!(payload.describe(), format!("Invoice for client {client}"));
        }

        #[test]
        fn item_count_is_reported(items in 1usize..20) {
            let mut payload = InvoicePayload::new();
            for _ in 0..items {
                payload = payload.with_item(LineItem::default());
            }
            prop_assert_eq!(
                payload.describe(),
                format!("Invoice with {items} item(s) - Untitled item")
            );
        }
    }
}

// ============================================================================
// DraftCollection Property Tests
// ============================================================================

mod collection_tests {
    use super::*;

    proptest! {
        #[test]
        fn collection_never_exceeds_limit(
            saves in proptest::collection::vec(0u8..20, 1..60),
            max in 1usize..12,
        ) {
            let mut collection = DraftCollection::new();
            for (tick, key) in saves.iter().enumerate() {
                let id = DraftId::new(format!("draft-{key}")).unwrap();
                let draft = Draft::capture(id, InvoicePayload::new().with_notes("x"), at(tick as i64));
                collection.upsert_front(draft, max);
                prop_assert!(collection.len() <= max);
            }
        }

        #[test]
        fn ids_stay_unique_and_most_recent_first(
            saves in proptest::collection::vec(0u8..8, 1..40),
        ) {
            let mut collection = DraftCollection::new();
            for (tick, key) in saves.iter().enumerate() {
                let id = DraftId::new(format!("draft-{key}")).unwrap();
                let draft = Draft::capture(id, InvoicePayload::new().with_notes("x"), at(tick as i64));
                collection.upsert_front(draft, usize::MAX);
            }

            let ids: Vec<_> = collection.iter().map(|d| d.id.clone()).collect();
            let mut deduped = ids.clone();
            deduped.sort();
            deduped.dedup();
            prop_assert_eq!(deduped.len(), ids.len());

            let timestamps: Vec<_> = collection.iter().map(|d| d.timestamp).collect();
            prop_assert!(timestamps.windows(2).all(|w| w[0] > w[1]));
        }

        #[test]
        fn retain_since_partitions_on_cutoff(
            stamps in proptest::collection::vec(0i64..1_000, 0..30),
            cutoff in 0i64..1_000,
        ) {
            let drafts: Vec<Draft> = stamps
                .iter()
                .enumerate()
                .map(|(i, ms)| {
                    Draft::capture(
                        DraftId::new(format!("d{i}")).unwrap(),
                        InvoicePayload::new().with_notes("x"),
                        at(*ms),
                    )
                })
                .collect();
            let mut collection = DraftCollection::from(drafts);
            let expected_removed = stamps.iter().filter(|ms| **ms < cutoff).count();

            let removed = collection.retain_since(at(cutoff));
            prop_assert_eq!(removed, expected_removed);
            prop_assert!(collection.iter().all(|d| d.timestamp >= at(cutoff)));
        }
    }
}
