use chrono::{DateTime, Utc};
use rand::Rng;

use crate::errors::FormatError;
use crate::models::profile::DeviceProfile;
use crate::services::formatter::{self, MockResponse, RpcContext};
use crate::services::synthesizer;

/// One synthesis-and-format cycle. Stateless; safe to call concurrently.
pub fn respond<R: Rng + ?Sized>(
    now: DateTime<Utc>,
    profile: &DeviceProfile,
    ctx: &RpcContext,
    rng: &mut R,
) -> Result<MockResponse, FormatError> {
    let snapshot = synthesizer::synthesize(now, profile, rng);
    formatter::format_response(&snapshot, profile.envelope, ctx)
}

/// Wall-clock variant with a thread-local entropy source.
pub fn respond_now(profile: &DeviceProfile, ctx: &RpcContext) -> Result<MockResponse, FormatError> {
    respond(Utc::now(), profile, ctx, &mut rand::thread_rng())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::Value;

    #[test]
    fn seeded_calls_at_same_instant_are_identical() {
        let profile = DeviceProfile::shelly_pro_em();
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 7, 45, 12).unwrap();
        let ctx = RpcContext::default();
        let a = respond(now, &profile, &ctx, &mut StdRng::seed_from_u64(8)).unwrap();
        let b = respond(now, &profile, &ctx, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a.body, b.body);
    }

    #[test]
    fn envelope_follows_profile() {
        let ctx = RpcContext { id: 42, dst: "test_runner".to_string() };
        let rpc = respond_now(&DeviceProfile::shelly_pm_g3(), &ctx).unwrap();
        let body: Value = serde_json::from_str(&rpc.body).unwrap();
        assert_eq!(body["id"], 42);
        assert_eq!(body["dst"], "test_runner");
        assert!(body["result"].get("pm1:0").is_some());

        let flat = respond_now(&DeviceProfile::shelly_pro_em(), &ctx).unwrap();
        let body: Value = serde_json::from_str(&flat.body).unwrap();
        assert!(body.get("result").is_none());
        assert!(body.get("em1:1").is_some());
    }

    #[test]
    fn concurrent_calls_need_no_coordination() {
        let profile = std::sync::Arc::new(DeviceProfile::shelly_pm_g3());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let profile = profile.clone();
                std::thread::spawn(move || respond_now(&profile, &RpcContext::default()))
            })
            .collect();
        for handle in handles {
            let response = handle.join().unwrap().unwrap();
            assert_eq!(response.status_code, 200);
        }
    }
}
