use std::collections::BTreeSet;

use litper_parsing::{ParseDefaults, normalize_status, parse_report};
use proptest::prelude::*;

proptest! {
    #[test]
    fn arbitrary_text_never_panics(text in "\\PC{0,80}") {
        let _ = normalize_status(&text);
        let outcome = parse_report(&text, &ParseDefaults::default());
        prop_assert!(outcome.shipments.len() <= text.lines().count());
    }

    #[test]
    fn guide_only_lines_are_kept(guides in prop::collection::vec("[1-9][0-9]{7,11}", 1..20)) {
        let text = guides.join("\n");
        let outcome = parse_report(&text, &ParseDefaults::default());

        let expected: BTreeSet<&str> = guides.iter().map(String::as_str).collect();
        let parsed: BTreeSet<&str> = outcome.shipments.iter().map(|s| s.id.as_str()).collect();
        prop_assert_eq!(parsed, expected);
        prop_assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn phone_never_replaces_guide(
        guide in "[12][0-9]{8,11}",
        phone in "3[0-9]{9}",
        phone_first in any::<bool>(),
        delimited in any::<bool>(),
    ) {
        let sep = if delimited { " | " } else { " " };
        let line = if phone_first {
            format!("{phone}{sep}{guide}{sep}ENTREGADO")
        } else {
            format!("{guide}{sep}{phone}{sep}ENTREGADO")
        };
        let outcome = parse_report(&line, &ParseDefaults::default());
        prop_assert_eq!(outcome.shipments.len(), 1);
        prop_assert_eq!(&outcome.shipments[0].id, &guide);
        prop_assert_eq!(outcome.shipments[0].phone.as_deref(), Some(phone.as_str()));
    }
}
