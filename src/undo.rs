//! Undo Manager: single-level undo of the most recent removal.
//!
//! Two states, idle and pending. A removal moves to pending with a deadline
//! `window` after the clock's current time; reaching the deadline, an undo,
//! or a newer removal ends the pending record. Deadlines are checked against
//! the injected clock whenever the manager is consulted, so a superseded or
//! cancelled record can never come back.

use crate::clock::Clock;
use crate::collections::Removal;
use crate::model::ProductId;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UndoTicket {
  pub id: Uuid,
  pub product_id: ProductId,
  pub source_collections: Vec<String>,
  pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
enum UndoState {
  Idle,
  Pending { ticket: UndoTicket, removal: Removal },
}

#[derive(Debug)]
pub struct UndoManager {
  clock: Arc<dyn Clock>,
  window: Duration,
  state: UndoState,
}

impl UndoManager {
  pub fn new(clock: Arc<dyn Clock>, window: Duration) -> Self {
    Self {
      clock,
      window,
      state: UndoState::Idle,
    }
  }

  /// Starts a new undo window, discarding any earlier pending removal.
  pub fn record(&mut self, removal: Removal) -> UndoTicket {
    if let UndoState::Pending { ticket, .. } = &self.state {
      log::debug!("undo ticket {} superseded by a newer removal", ticket.id);
    }

    let ticket = UndoTicket {
      id: Uuid::new_v4(),
      product_id: removal.product.id,
      source_collections: removal.source_collection_names(),
      expires_at: self.clock.now() + self.window,
    };
    self.state = UndoState::Pending {
      ticket: ticket.clone(),
      removal,
    };
    ticket
  }

  /// The timer transition: drops the pending record once its deadline has
  /// passed. Returns true when a record was dropped.
  pub fn expire(&mut self) -> bool {
    let due = match &self.state {
      UndoState::Pending { ticket, .. } => self.clock.now() >= ticket.expires_at,
      UndoState::Idle => false,
    };
    if due {
      self.state = UndoState::Idle;
    }
    due
  }

  /// Hands back the pending removal for replay, if still inside its window.
  pub fn take(&mut self) -> Option<Removal> {
    self.expire();
    match std::mem::replace(&mut self.state, UndoState::Idle) {
      UndoState::Pending { removal, .. } => Some(removal),
      UndoState::Idle => None,
    }
  }

  pub fn pending(&mut self) -> Option<&UndoTicket> {
    self.expire();
    match &self.state {
      UndoState::Pending { ticket, .. } => Some(ticket),
      UndoState::Idle => None,
    }
  }
}
