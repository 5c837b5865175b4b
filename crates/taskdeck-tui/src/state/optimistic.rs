use taskdeck_shared::Identified;

use super::generation::Generation;

/// A mutation shown before the remote confirms it.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingOp<T> {
    Create(T),
    Update(T),
    Delete(String),
}

/// The list to render: the authoritative rows with pending operations
/// applied in the order they were made.
pub fn reconcile<'a, T>(authoritative: &[T], pending: impl IntoIterator<Item = &'a PendingOp<T>>) -> Vec<T>
where
    T: Identified + Clone + 'a,
{
    let mut view = authoritative.to_vec();

    for op in pending {
        match op {
            PendingOp::Create(item) => {
                if !view.iter().any(|row| row.id() == item.id()) {
                    view.push(item.clone());
                }
            }
            PendingOp::Update(item) => {
                if let Some(row) = view.iter_mut().find(|row| row.id() == item.id()) {
                    *row = item.clone();
                }
            }
            PendingOp::Delete(id) => view.retain(|row| row.id() != id),
        }
    }

    view
}

/// Pending operations stamped with the newest request generation at the time
/// they were made. A committed result only settles operations made before its
/// request was issued. A failed mutation is never rolled back here; it lingers
/// until a later refetch commits.
#[derive(Debug)]
pub struct Optimistic<T> {
    entries: Vec<(Generation, PendingOp<T>)>,
}

impl<T> Default for Optimistic<T> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<T: Identified + Clone> Optimistic<T> {
    pub fn record(&mut self, stamp: Generation, op: PendingOp<T>) {
        self.entries.push((stamp, op));
    }

    pub fn settle(&mut self, committed: Generation) {
        self.entries.retain(|(stamp, _)| *stamp >= committed);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn view(&self, authoritative: &[T]) -> Vec<T> {
        reconcile(authoritative, self.entries.iter().map(|(_, op)| op))
    }
}
