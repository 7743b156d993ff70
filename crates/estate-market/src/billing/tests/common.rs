pub(super) use crate::test_support::*;

use serde_json::json;

use crate::accounts::Actor;
use crate::billing::{sign, BillingRepository};

/// Lapse the signup trial so the agent falls back to the Free plan.
pub(super) fn expire_trial(fixture: &Fixture, agent: &Actor) {
    let mut trial = fixture
        .market
        .billing()
        .current_subscription(agent.user_id, now())
        .expect("lookup")
        .expect("trial on signup");
    trial.is_active = false;
    fixture.store.update_subscription(trial).expect("expire");
}

/// A signed `charge.success` delivery as the gateway would post it.
pub(super) fn charge_success(
    agent: &Actor,
    reference: &str,
    amount: u64,
    plan: &str,
) -> (Vec<u8>, String) {
    let body = serde_json::to_vec(&json!({
        "event": "charge.success",
        "data": {
            "reference": reference,
            "status": "success",
            "amount": amount,
            "metadata": {
                "agent_id": agent.user_id.to_string(),
                "plan": plan
            }
        }
    }))
    .expect("encode event");
    let signature = sign(WEBHOOK_SECRET, &body);
    (body, signature)
}
