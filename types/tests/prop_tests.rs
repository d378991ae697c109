use proptest::prelude::*;

use presence_types::{
    CheckinId, CheckinRecord, ComponentScores, Coordinate, Timestamp, UserId, VenueId,
    GPS_WEIGHT, PASS_THRESHOLD, QR_WEIGHT, RECEIPT_WEIGHT,
};

proptest! {
    /// Every in-range finite pair is a coordinate.
    #[test]
    fn in_range_coordinates_accepted(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
        let c = Coordinate::new(lat, lon).unwrap();
        prop_assert_eq!(c.latitude(), lat);
        prop_assert_eq!(c.longitude(), lon);
    }

    /// Latitudes beyond the poles are refused.
    #[test]
    fn out_of_range_latitude_rejected(lat in 90.000_001f64..1e6, lon in -180.0f64..=180.0) {
        prop_assert!(Coordinate::new(lat, lon).is_err());
        prop_assert!(Coordinate::new(-lat, lon).is_err());
    }

    /// Printable identifiers round-trip through serde unchanged.
    #[test]
    fn ids_roundtrip_json(raw in "[a-zA-Z0-9_-]{1,64}") {
        let user = UserId::parse(raw.clone()).unwrap();
        let json = serde_json::to_string(&user).unwrap();
        let back: UserId = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back.as_str(), raw.as_str());
    }

    /// A record built from in-weight scores with derived fields always validates.
    #[test]
    fn derived_records_validate(
        gps in 0u8..=GPS_WEIGHT,
        qr in 0u8..=QR_WEIGHT,
        receipt in 0u8..=RECEIPT_WEIGHT,
    ) {
        let scores = ComponentScores::new(gps, qr, receipt);
        let record = CheckinRecord {
            id: CheckinId::new([9; 32]),
            user_id: UserId::new("u"),
            venue_id: VenueId::new("v"),
            gps_score: gps,
            qr_score: qr,
            receipt_score: receipt,
            total_score: scores.total(),
            passed: scores.total() >= PASS_THRESHOLD,
            verified_at: Timestamp::new(0),
        };
        prop_assert!(record.validate().is_ok());
    }

    /// Timestamp ordering: new(a) <= new(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::new(a);
        let tb = Timestamp::new(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }
}
