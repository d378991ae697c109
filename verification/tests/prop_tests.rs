use proptest::prelude::*;

use presence_types::{
    ComponentScores, Coordinate, Timestamp, VenueId, VenueSecret, VerificationParams, GPS_WEIGHT,
    PASS_THRESHOLD, QR_WEIGHT, RECEIPT_WEIGHT,
};
use presence_verification::{haversine_meters, CodeRotationService, GeoVerifier, VerificationAggregator};

const WINDOW: u64 = 30;

fn service() -> CodeRotationService {
    CodeRotationService::new(&VerificationParams::default()).unwrap()
}

proptest! {
    /// Moving further along a meridian never shortens the distance, and never
    /// earns more credit.
    #[test]
    fn distance_is_monotone_along_meridian(
        lat in -60.0f64..60.0,
        lon in -179.0f64..179.0,
        near in 0.0f64..0.01,
        extra in 0.0f64..0.01,
    ) {
        let venue = Coordinate::new(lat, lon).unwrap();
        let a = Coordinate::new(lat + near, lon).unwrap();
        let b = Coordinate::new(lat + near + extra, lon).unwrap();
        let da = haversine_meters(venue, a);
        let db = haversine_meters(venue, b);
        prop_assert!(da <= db + 1e-6);

        let geo = GeoVerifier::new(100.0);
        let sa = geo.verify(Some(a), venue, None).unwrap().score;
        let sb = geo.verify(Some(b), venue, None).unwrap().score;
        prop_assert!(sa >= sb);
    }

    /// A radius equal to the measured distance still gives full credit.
    #[test]
    fn range_boundary_is_inclusive(
        lat in -60.0f64..60.0,
        lon in -179.0f64..179.0,
        offset in 0.000_01f64..0.01,
    ) {
        let venue = Coordinate::new(lat, lon).unwrap();
        let user = Coordinate::new(lat + offset, lon).unwrap();
        let distance = haversine_meters(venue, user);
        let check = GeoVerifier::new(100.0).verify(Some(user), venue, Some(distance)).unwrap();
        prop_assert!(check.within_range);
        prop_assert_eq!(check.score, GPS_WEIGHT);
    }

    /// A code shown at t is accepted at t + w - 1 and t + w + 1 and reported
    /// expired at t + 2w + 1, as long as t + 1 stays in t's window.
    #[test]
    fn code_survives_one_window(
        bucket in 1_000u64..100_000_000,
        offset in 0u64..WINDOW - 1,
        secret in prop::collection::vec(any::<u8>(), 16..48),
    ) {
        let svc = service();
        let venue = VenueId::new("V1");
        let secret = VenueSecret::new(secret).unwrap();
        let t = bucket * WINDOW + offset;
        let code = svc.current_code(&venue, &secret, Timestamp::new(t)).unwrap().code;

        // Skip the rare secrets whose neighbouring windows share a code.
        let later = |dt: u64| svc.current_code(&venue, &secret, Timestamp::new(t + dt)).unwrap().code;
        prop_assume!(code != later(WINDOW + 1));
        prop_assume!(code != later(2 * WINDOW + 1));

        for dt in [0, WINDOW - 1, WINDOW + 1] {
            let check = svc.verify(&code, &venue, &secret, Timestamp::new(t + dt)).unwrap();
            prop_assert!(check.matched, "rejected at t + {}", dt);
            prop_assert_eq!(check.score, QR_WEIGHT);
        }

        let stale = svc.verify(&code, &venue, &secret, Timestamp::new(t + 2 * WINDOW + 1)).unwrap();
        prop_assert!(!stale.matched);
        prop_assert!(stale.expired);
        prop_assert_eq!(stale.score, 0);
    }

    /// `passed` is exactly `total >= PASS_THRESHOLD` for every in-weight triple.
    #[test]
    fn threshold_decides_pass(
        gps in 0u8..=GPS_WEIGHT,
        qr in 0u8..=QR_WEIGHT,
        receipt in 0u8..=RECEIPT_WEIGHT,
    ) {
        let agg = VerificationAggregator
            .aggregate(&ComponentScores::new(gps, qr, receipt))
            .unwrap();
        let total = gps + qr + receipt;
        prop_assert_eq!(agg.total_score, total);
        prop_assert_eq!(agg.passed, total >= PASS_THRESHOLD);
    }
}

#[test]
fn weighted_aggregation_examples() {
    let cases = [
        ((40, 40, 20), 100, true),
        ((0, 0, 20), 20, false),
        ((40, 40, 0), 80, true),
        ((40, 0, 20), 60, true),
        ((40, 0, 19), 59, false),
    ];
    for ((gps, qr, receipt), total, passed) in cases {
        let agg = VerificationAggregator
            .aggregate(&ComponentScores::new(gps, qr, receipt))
            .unwrap();
        assert_eq!(agg.total_score, total);
        assert_eq!(agg.passed, passed);
    }
}
