//! The top-level event loop: receive, filter, run the check, vote.

use std::convert::Infallible;

use tracing::{info, warn};

use gavel_core::{Result, WatchPolicy};
use gavel_runner::{report, ActionRunner};

use crate::connection::{Connection, Connector};
use crate::filter;
use crate::supervisor::Supervisor;

/// Drives the whole bot: pulls events off the supervised connection and
/// dispatches the matching ones, one at a time, in receipt order.
///
/// Error policy mirrors the two failure classes:
/// - a failed receive or dispatch is logged and the event dropped; the
///   loop carries on with the next event
/// - when, after such a failure, the transport reports itself dead, the
///   connection is marked so and rebuilt before the next receive
///
/// There is no clean-shutdown path; the process runs until killed.
pub struct Watcher<C: Connector> {
    supervisor: Supervisor<C>,
    policy: WatchPolicy,
    runner: ActionRunner,
}

impl<C: Connector> Watcher<C> {
    pub fn new(supervisor: Supervisor<C>, policy: WatchPolicy, runner: ActionRunner) -> Self {
        Self {
            supervisor,
            policy,
            runner,
        }
    }

    /// Run forever.
    pub async fn run(mut self) -> Infallible {
        info!(
            projects = ?self.policy.projects,
            voting = self.policy.voting,
            "event loop started"
        );
        loop {
            self.step().await;
        }
    }

    /// One iteration: ensure connected, then receive and dispatch a single
    /// event. Public so tests can drive the loop without `run`'s infinity.
    pub async fn step(&mut self) {
        let conn = self.supervisor.ensure_connected().await;
        if let Err(err) = Self::serve_one(&self.policy, &self.runner, conn).await {
            warn!(error = %err, "event dropped");
            if !conn.is_alive() {
                self.supervisor.mark_dead();
            }
        }
    }

    async fn serve_one(
        policy: &WatchPolicy,
        runner: &ActionRunner,
        conn: &mut C::Conn,
    ) -> Result<()> {
        let event = conn.next_event().await?;
        if !filter::matches(&event, policy) {
            return Ok(());
        }

        // Filter guarantees the event carries a change and patchset.
        let (Some(change), Some(patch_set)) = (event.change(), event.patch_set()) else {
            return Ok(());
        };
        info!(
            kind = event.kind(),
            project = %change.project,
            change = %change.number,
            patchset = %patch_set.number,
            "event matched, running check"
        );

        let result = runner.run(change, patch_set).await?;
        let report = report::format(&result);

        if policy.voting {
            let change_spec = format!("{},{}", change.number, patch_set.number);
            conn.submit_review(&change.project, &change_spec, &report.message, report.vote)
                .await?;
        } else {
            info!(
                message = %report.message,
                vote = report.vote,
                "voting disabled, review not submitted"
            );
        }
        Ok(())
    }
}
