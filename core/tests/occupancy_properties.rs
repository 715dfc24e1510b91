//! Property: any sequence of workflow calls leaves beds and allocations in
//! agreement, whichever calls succeed or fail.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use accommodation_core::ReleasePolicy;
use accommodation_testing::fixtures::{TestHarness, confirmation, soft_request};
use accommodation_testing::properties::{WorkflowOp, check_occupancy, workflow_ops};
use proptest::prelude::*;

const BED_POOL: usize = 4;

fn run(policy: ReleasePolicy, ops: Vec<WorkflowOp>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    runtime.block_on(async move {
        let harness = TestHarness::with_policy(BED_POOL, policy).await.unwrap();

        for op in ops {
            match op {
                WorkflowOp::SoftAllocate { party, beds } => {
                    let (pnr, reg) = WorkflowOp::party_identity(party);
                    let requests = beds
                        .into_iter()
                        .map(|index| soft_request(harness.beds[index].id, &pnr, &reg))
                        .collect();
                    let _ = harness.service.soft_allocate(requests).await;
                },
                WorkflowOp::Confirm { party } => {
                    let (pnr, _) = WorkflowOp::party_identity(party);
                    let _ = harness
                        .service
                        .confirm_soft_allocation(confirmation(&pnr, "RCPT", 100.0))
                        .await;
                },
            }

            let beds = harness.store.beds().await;
            let allocations = harness.store.allocations().await;
            if let Err(violation) = check_occupancy(&beds, &allocations) {
                return Err(TestCaseError::fail(violation));
            }
        }
        Ok(())
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn atomic_policy_keeps_occupancy_consistent(ops in workflow_ops(BED_POOL, 12)) {
        run(ReleasePolicy::Atomic, ops)?;
    }

    #[test]
    fn commit_first_policy_keeps_occupancy_consistent(ops in workflow_ops(BED_POOL, 12)) {
        run(ReleasePolicy::CommitFirst, ops)?;
    }
}
