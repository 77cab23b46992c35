//! Fan-out of one send attempt per round.
//!
//! All attempts are polled concurrently on the calling task with
//! `join_all`. There is no admission limit and no cancellation; each
//! attempt only borrows the tables and template.

use futures::future::join_all;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::RoundError;
use crate::mail::{Mailer, OutboundMessage, SendReceipt};
use crate::pairing::{MessageTemplate, compose, resolve};
use crate::records::{AFF_COLUMN, NEG_COLUMN, Record, Table};

/// Result of one round's attempt.
#[derive(Debug)]
pub struct RoundOutcome {
    /// Position of the round in the round table.
    pub index: usize,
    pub aff: String,
    pub neg: String,
    /// Number of distinct addresses the message was sent to.
    pub recipients: usize,
    pub result: Result<SendReceipt, RoundError>,
}

impl RoundOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-round outcomes of one submission, in round-table order.
#[derive(Debug)]
pub struct DispatchReport {
    pub submission_id: Uuid,
    outcomes: Vec<RoundOutcome>,
}

impl DispatchReport {
    pub fn outcomes(&self) -> &[RoundOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &RoundOutcome> {
        self.outcomes.iter().filter(|o| o.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RoundOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RoundOutcome::is_success)
    }

    /// Recipients reached across all successful rounds.
    pub fn participants(&self) -> usize {
        self.succeeded().map(|o| o.recipients).sum()
    }

    /// The first failure in round order.
    pub fn first_error(&self) -> Option<&RoundError> {
        self.outcomes.iter().find_map(|o| o.result.as_ref().err())
    }

    /// Collapse to "all succeeded, or the first error".
    pub fn into_result(self) -> Result<Vec<SendReceipt>, RoundError> {
        self.outcomes.into_iter().map(|o| o.result).collect()
    }
}

fn team_names(round: &Record) -> (String, String) {
    (
        round.get(AFF_COLUMN).unwrap_or_default().to_string(),
        round.get(NEG_COLUMN).unwrap_or_default().to_string(),
    )
}

/// Resolve and compose one round without sending it.
pub fn prepare(
    round: &Record,
    teams: &Table,
    template: &MessageTemplate,
    round_number: &str,
) -> Result<OutboundMessage, RoundError> {
    let pairing = resolve(round, teams, round_number)?;
    compose(&pairing, template)
}

/// Compose every round without sending, for previews.
pub fn preview(
    rounds: &Table,
    teams: &Table,
    template: &MessageTemplate,
    round_number: &str,
) -> Vec<Result<OutboundMessage, RoundError>> {
    rounds
        .iter()
        .map(|round| prepare(round, teams, template, round_number))
        .collect()
}

async fn attempt(
    index: usize,
    round: &Record,
    teams: &Table,
    template: &MessageTemplate,
    round_number: &str,
    mailer: &dyn Mailer,
) -> RoundOutcome {
    let (aff, neg) = team_names(round);

    let (recipients, result) = match prepare(round, teams, template, round_number) {
        Ok(message) => {
            let recipients = message.to.len();
            let result = mailer.send(&message).await.map_err(RoundError::from);
            (recipients, result)
        }
        Err(e) => (0, Err(e)),
    };

    match &result {
        Ok(receipt) => tracing::info!(
            round = index,
            %aff,
            %neg,
            recipients,
            status = receipt.status,
            "Round sent"
        ),
        Err(e) => tracing::warn!(round = index, %aff, %neg, "Round failed: {e}"),
    }

    RoundOutcome {
        index,
        aff,
        neg,
        recipients,
        result,
    }
}

/// Attempt every round concurrently and wait for all of them.
pub async fn dispatch(
    rounds: &Table,
    teams: &Table,
    template: &MessageTemplate,
    round_number: &str,
    mailer: &dyn Mailer,
) -> DispatchReport {
    let submission_id = Uuid::new_v4();
    let span = tracing::info_span!("submission", id = %submission_id, transport = mailer.name());

    async move {
        tracing::info!(rooms = rounds.len(), teams = teams.len(), "Dispatching");

        let futures: Vec<_> = rounds
            .iter()
            .enumerate()
            .map(|(index, round)| attempt(index, round, teams, template, round_number, mailer))
            .collect();
        let outcomes = join_all(futures).await;

        let report = DispatchReport {
            submission_id,
            outcomes,
        };
        tracing::info!(
            sent = report.succeeded().count(),
            failed = report.failed().count(),
            participants = report.participants(),
            "Dispatch finished"
        );
        report
    }
    .instrument(span)
    .await
}
