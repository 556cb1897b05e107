//! Ordered history of acquisition jobs.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use atlas_types::{LoadQueueItem, LoadStatus};

use crate::error::{QueueError, QueueResult};

/// Position of a job in the queue. Only valid for the queue that issued it,
/// and only until the queue is cleared.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueTicket(usize);

#[derive(Debug, Default)]
pub struct LoadQueue {
    items: RwLock<Vec<LoadQueueItem>>,
}

impl LoadQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> QueueResult<RwLockReadGuard<'_, Vec<LoadQueueItem>>> {
        self.items
            .read()
            .map_err(|e| QueueError::Poisoned(e.to_string()))
    }

    fn write(&self) -> QueueResult<RwLockWriteGuard<'_, Vec<LoadQueueItem>>> {
        self.items
            .write()
            .map_err(|e| QueueError::Poisoned(e.to_string()))
    }

    pub fn push(&self, item: LoadQueueItem) -> QueueResult<QueueTicket> {
        let mut items = self.write()?;
        debug!(model = %item.id, url = %item.url, "queued");
        items.push(item);
        Ok(QueueTicket(items.len() - 1))
    }

    pub fn advance(&self, ticket: QueueTicket, next: LoadStatus) -> QueueResult<()> {
        let mut items = self.write()?;
        advance_in(&mut items, ticket, next)
    }

    /// Run `commit` and record its outcome on `ticket` under one lock
    /// acquisition, so no reader sees the effect without the status.
    pub fn settle_with<T, E>(
        &self,
        ticket: QueueTicket,
        commit: impl FnOnce() -> Result<T, E>,
    ) -> QueueResult<Result<T, E>> {
        let mut items = self.write()?;
        let outcome = commit();
        let next = if outcome.is_ok() {
            LoadStatus::Completed
        } else {
            LoadStatus::Error
        };
        advance_in(&mut items, ticket, next)?;
        Ok(outcome)
    }

    pub fn get(&self, ticket: QueueTicket) -> QueueResult<Option<LoadQueueItem>> {
        Ok(self.read()?.get(ticket.0).cloned())
    }

    /// Copy of every job in submission order.
    pub fn snapshot(&self) -> QueueResult<Vec<LoadQueueItem>> {
        Ok(self.read()?.clone())
    }

    pub fn len(&self) -> QueueResult<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> QueueResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Drop every settled job. Tickets of jobs still running would be
    /// invalidated, so this refuses while any job is active and returns
    /// `false`.
    pub fn clear(&self) -> QueueResult<bool> {
        let mut items = self.write()?;
        if items.iter().any(|i| !i.status.is_terminal()) {
            return Ok(false);
        }
        items.clear();
        Ok(true)
    }
}

fn advance_in(items: &mut [LoadQueueItem], ticket: QueueTicket, next: LoadStatus) -> QueueResult<()> {
    let item = items
        .get_mut(ticket.0)
        .ok_or(QueueError::UnknownTicket(ticket.0))?;
    item.advance(next)?;
    debug!(model = %item.id, status = %next, "queue item advanced");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_types::ModelId;

    fn item(id: &str) -> LoadQueueItem {
        LoadQueueItem::downloading(format!("http://cdn/{id}.glb"), ModelId::from(id))
    }

    #[test]
    fn push_and_advance() {
        let q = LoadQueue::new();
        let t = q.push(item("a")).unwrap();
        q.advance(t, LoadStatus::Loading).unwrap();
        assert_eq!(q.get(t).unwrap().unwrap().status, LoadStatus::Loading);
        assert!(q.advance(t, LoadStatus::Downloading).is_err());
    }

    #[test]
    fn settle_records_outcome() {
        let q = LoadQueue::new();
        let ok = q.push(item("a")).unwrap();
        let bad = q.push(item("b")).unwrap();
        assert_eq!(q.settle_with(ok, || Ok::<_, ()>(1)).unwrap(), Ok(1));
        assert_eq!(q.settle_with(bad, || Err::<(), _>("boom")).unwrap(), Err("boom"));
        let snap = q.snapshot().unwrap();
        assert_eq!(snap[0].status, LoadStatus::Completed);
        assert_eq!(snap[1].status, LoadStatus::Error);
    }

    #[test]
    fn terminal_items_stay_terminal() {
        let q = LoadQueue::new();
        let t = q.push(item("a")).unwrap();
        q.advance(t, LoadStatus::Error).unwrap();
        let err = q.advance(t, LoadStatus::Completed).unwrap_err();
        assert!(matches!(err, QueueError::Transition(_)));
    }

    #[test]
    fn unknown_ticket() {
        let q = LoadQueue::new();
        assert_eq!(
            q.advance(QueueTicket(3), LoadStatus::Loading),
            Err(QueueError::UnknownTicket(3))
        );
    }

    #[test]
    fn clear_refuses_while_active() {
        let q = LoadQueue::new();
        let t = q.push(item("a")).unwrap();
        assert!(!q.clear().unwrap());
        q.advance(t, LoadStatus::Completed).unwrap();
        assert!(q.clear().unwrap());
        assert!(q.is_empty().unwrap());
    }
}
